/// Generates getters that return \[f64\] fields as `Array1<f64>`.
///
/// Useful for handing result columns to plotting or analysis code without
/// exposing the backing `Vec`s.
#[macro_export]
macro_rules! array1d_getter_impl {
    ($fun_name:ident, $vec_name:ident) => {
        pub fn $fun_name(&self) -> Array1<f64> {
            Array1::from(self.$vec_name.clone())
        }
    };
}
