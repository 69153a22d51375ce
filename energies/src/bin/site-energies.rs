use std::path::PathBuf;
use std::process::exit;

use energies::*;
use multipoles::{TemplateTable, Templates};

fn main() {
    let mut args = std::env::args().skip(1);
    let options_path = PathBuf::from(args.next().unwrap_or("options.toml".into()));
    let system_path = PathBuf::from(args.next().unwrap_or("system.toml".into()));

    let options = unwrap_or_exit(Options::from_file(&options_path));

    let Some(table_path) = options.multipoles.clone() else {
        eprintln!("No multipole template table configured in {}", options_path.display());
        exit(2);
    };
    let table = unwrap_or_exit(TemplateTable::from_file(&table_path).map_err(EnergiesError::from));
    let templates = unwrap_or_exit(Templates::load(&table).map_err(EnergiesError::from));

    let system = unwrap_or_exit(SystemTable::from_file(&system_path));
    let top = unwrap_or_exit(system.to_topology(&templates));

    eprintln!(
        "Evaluating {} segments with {} threads.",
        top.len(),
        rayon::current_num_threads()
    );

    let results = unwrap_or_exit(run(&top, &options, rayon::current_num_threads()));
    dbg!(&results);

    if let Some(out) = &options.control.output {
        unwrap_or_exit(write_table(out, &results));
        eprintln!("Energy table written to {}", out.display());
    }
}

fn unwrap_or_exit<T>(result: Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            eprintln!("{err}");
            exit(2);
        }
    }
}
