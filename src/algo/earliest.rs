use crate::core::{EarliestBus, Notes, SolveError};

/// Finds the bus departing first at or after the earliest timestamp of the notes.
/// Ties go to the bus listed first.
///
/// A bus leaving exactly at the earliest timestamp is taken with a wait of `0`,
/// not a full period later.
///
/// # Errors
/// - If the notes have no earliest timestamp.
/// - If the schedule has no real buses.
pub fn earliest_bus(notes: &Notes) -> Result<EarliestBus, SolveError> {
    let earliest = notes.earliest.ok_or(SolveError::MissingTimestamp)?;

    notes
        .schedule
        .buses()
        .map(|bus| EarliestBus {
            bus,
            wait: (bus.period - earliest % bus.period) % bus.period,
        })
        .min_by_key(|candidate| candidate.wait)
        .ok_or(SolveError::NoBuses)
}
