#[cfg(feature = "gurobi")]
use shuttle_search::binary_main;

#[cfg(feature = "gurobi")]
binary_main!(algo::GurobiIlp);

#[cfg(not(feature = "gurobi"))]
fn main() {
    eprintln!("This binary requires the `gurobi` feature to be enabled.");
}
