use crate::core::Synchronizer;

mod earliest;
mod exact;
#[cfg(feature = "gurobi")]
mod gurobi;
mod ilp;
mod sieve;

pub use earliest::earliest_bus;
pub use exact::CongruenceBackend;
#[cfg(feature = "gurobi")]
pub use gurobi::{GurobiBackend, GurobiIlp};
pub use ilp::{build_model, solve_model, ExactIlp, Ilp, ShuttleModel};
pub use sieve::Sieve;

/// Constructors of every available synchronizer.
#[allow(unsafe_code)]
#[linkme::distributed_slice]
pub static SOLVERS: [fn() -> Box<dyn Synchronizer>];
