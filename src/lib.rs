#![deny(clippy::all, clippy::cargo, clippy::expect_used, clippy::unwrap_used)]
#![deny(clippy::pedantic, clippy::nursery, unsafe_code)]
#![warn(clippy::unimplemented, clippy::redundant_type_annotations)]

use anyhow::Result;
use std::io::BufRead;

pub mod algo;
pub mod core;
pub mod data;

/// Schedule solved when no input is given.
pub const DEFAULT_SCHEDULE: &str = "1789,37,47,1889";

/// Reads notes from the reader, synchronizes the schedule and writes the departure to stdout.
///
/// # Errors
/// - If the notes could not be read or parsed.
/// - If the synchronizer fails to find a departure.
///
/// # Panics
/// - If the departure is invalid in debug mode.
pub fn run_reader(
    synchronizer: &mut dyn core::Synchronizer,
    reader: &mut impl BufRead,
) -> Result<()> {
    let notes = data::deserialize(reader)?;
    let departure = synchronizer.synchronize(&notes.schedule)?;

    debug_assert!(
        departure.verify(&notes.schedule),
        "Departure is invalid: {departure:?}"
    );

    println!("{departure}");
    Ok(())
}

/// Defines a `main` function running a single synchronizer on stdin.
#[macro_export]
macro_rules! binary_main {
    ($($synchronizer:ident)::+) => {
        fn main() -> anyhow::Result<()> {
            let mut synchronizer = $crate::$($synchronizer)::+::default();
            $crate::run_reader(&mut synchronizer, &mut std::io::stdin().lock())
        }
    };
}

#[cfg(not(target_pointer_width = "64"))]
compile_error!("Must be 64-bit system!");

/// Casts the given value to `usize`.
/// It should never fail on 64-bit systems.
///
/// # Panics
/// - If the value cannot be cast to `usize`.
#[must_use]
pub fn cast_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or_else(|_| unreachable!("Must be 64-bit system!"))
}

/// Casts the given value to `u64`.
/// It should never fail on 64-bit systems.
///
/// # Panics
/// - If the value cannot be cast to `u64`.
#[must_use]
pub fn cast_u64(value: usize) -> u64 {
    u64::try_from(value).unwrap_or_else(|_| unreachable!("Must be 64-bit system!"))
}

/// Casts the given value to `u128`.
#[must_use]
pub fn cast_u128(value: usize) -> u128 {
    u128::from(cast_u64(value))
}

/// Casts the given value to `i128`.
#[must_use]
pub fn cast_i128(value: usize) -> i128 {
    i128::from(cast_u64(value))
}
