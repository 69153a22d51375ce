use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use config::PBAR_STYLE;
use induction::{SiteEvaluator, SiteResult};
use topology::Topology;

use crate::{Options, Result, SweepResults};

/// Hands out segments one at a time to the requesting workers, honoring the
/// configured inclusive id range.
struct Dispatcher<'a> {
    top: &'a Topology,
    next: Mutex<usize>,
    last: Option<usize>,
}

impl<'a> Dispatcher<'a> {
    fn new(top: &'a Topology, first: usize, last: Option<usize>) -> Self {
        // Forward to the first segment in range.
        let start = top
            .segments
            .iter()
            .position(|seg| seg.id >= first)
            .unwrap_or(top.segments.len());

        Self {
            top,
            next: Mutex::new(start),
            last,
        }
    }

    /// The next segment index to work on, or `None` when drained.
    fn next_site(&self) -> Option<usize> {
        let mut cursor = self.next.lock().expect("dispatch mutex poisoned");

        let idx = *cursor;
        if idx >= self.top.segments.len() {
            return None;
        }
        if let Some(last) = self.last
            && self.top.segments[idx].id > last
        {
            return None;
        }

        *cursor += 1;
        Some(idx)
    }

    /// How many segments the sweep will process in total.
    fn remaining(&self) -> usize {
        let next = *self.next.lock().expect("dispatch mutex poisoned");
        self.top.segments[next..]
            .iter()
            .filter(|seg| self.last.is_none_or(|last| seg.id <= last))
            .count()
    }
}

/// Sweeps over all segments in range with `nthreads` parallel workers and
/// collects the per-segment results.
///
/// Each worker builds its private [`SiteEvaluator`] once and reuses it for
/// every segment it is handed; the topology stays read-only throughout.
/// Fatal configuration errors surface before any worker starts.
pub fn run(top: &Topology, options: &Options, nthreads: usize) -> Result<SweepResults> {
    let thole = options.thole_params()?;
    let conv = options.conv_params();
    let induce = options.control.induce;

    let dispatcher = Dispatcher::new(top, options.control.first, options.control.last);
    let pbar = ProgressBar::new(dispatcher.remaining() as u64).with_style(
        ProgressStyle::with_template(PBAR_STYLE).unwrap_or(ProgressStyle::default_bar()),
    );
    let log: Mutex<Vec<SiteResult>> = Mutex::new(Vec::new());

    (0..nthreads.max(1))
        .into_par_iter()
        .map(|_| -> Result<()> {
            let mut evaluator = SiteEvaluator::new(top, &thole, &conv, induce)?;
            while let Some(idx) = dispatcher.next_site() {
                let result = evaluator.eval_site(idx)?;
                log.lock().expect("log mutex poisoned").push(result);
                pbar.inc(1);
            }
            Ok(())
        })
        .collect::<Result<Vec<()>>>()?;

    pbar.finish_and_clear();

    let results = log.into_inner().expect("log mutex poisoned");
    Ok(SweepResults::new(results))
}
