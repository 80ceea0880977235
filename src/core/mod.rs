mod departure;
mod error;
mod model;
mod schedule;
mod util;

pub use departure::*;
pub use error::*;
pub use model::*;
pub use schedule::*;
pub use util::*;

/// Finds the earliest synchronized departure of a schedule.
pub trait Synchronizer {
    /// Returns the smallest timestamp `t >= 1` at which every bus departs `position`
    /// minutes after `t`.
    ///
    /// # Errors
    /// - If the schedule has no real buses.
    /// - If no such timestamp exists or the solver fails.
    fn synchronize(&mut self, schedule: &Schedule) -> Result<Departure, SolveError>;

    /// Returns the name of the synchronizer.
    fn name(&self) -> &'static str;
}
