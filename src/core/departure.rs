use super::{Bus, Schedule};
use crate::{cast_u128, cast_u64};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result};

/// Indentation between printed variable assignments.
const INDENT: &str = "          ";

/// A synchronized departure: the timestamp and, per bus position, the number of
/// full periods elapsed at `timestamp + position`.
#[non_exhaustive]
#[derive(Clone, Debug, Deserialize, Eq, Serialize, PartialEq)]
pub struct Departure {
    pub timestamp: u64,
    pub multipliers: BTreeMap<usize, u64>,
}

impl Departure {
    /// Creates a departure from a timestamp and the multipliers of every bus.
    #[must_use]
    pub const fn new(timestamp: u64, multipliers: BTreeMap<usize, u64>) -> Self {
        Self {
            timestamp,
            multipliers,
        }
    }

    /// Derives the multipliers of every bus from a timestamp.
    /// The timestamp is expected to be synchronized with the schedule.
    #[must_use]
    pub fn from_timestamp(schedule: &Schedule, timestamp: u64) -> Self {
        let multipliers = schedule
            .buses()
            .map(|bus| {
                let departs = timestamp + cast_u64(bus.position);
                (bus.position, departs / bus.period)
            })
            .collect();
        Self::new(timestamp, multipliers)
    }

    /// Returns the multiplier of the bus at `position`.
    #[must_use]
    pub fn multiplier(&self, position: usize) -> Option<u64> {
        self.multipliers.get(&position).copied()
    }

    /// Checks that every bus has a multiplier `x >= 1` with `timestamp == period * x - position`
    /// and that no placeholder carries one.
    #[must_use]
    pub fn verify(&self, schedule: &Schedule) -> bool {
        let buses: Vec<Bus> = schedule.buses().collect();
        self.timestamp >= 1
            && self.multipliers.len() == buses.len()
            && buses.iter().all(|bus| {
                self.multiplier(bus.position).is_some_and(|x| {
                    x >= 1
                        && u128::from(bus.period) * u128::from(x)
                            == u128::from(self.timestamp) + cast_u128(bus.position)
                })
            })
    }
}

impl Display for Departure {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        writeln!(f, "Objective value: {}", self.timestamp)?;
        write!(f, "Solution: t = {}", self.timestamp)?;
        for (position, x) in self.multipliers.iter().filter(|(_, &x)| x > 0) {
            write!(f, "\n{INDENT}x_{position} = {x}")?;
        }
        Ok(())
    }
}

/// The bus to take first when arriving at the earliest timestamp.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Deserialize, Eq, Serialize, PartialEq)]
pub struct EarliestBus {
    pub bus: Bus,
    pub wait: u64,
}

impl EarliestBus {
    /// Bus id multiplied by the waiting time, widened so that no period overflows it.
    #[must_use]
    pub fn product(&self) -> u128 {
        u128::from(self.bus.period) * u128::from(self.wait)
    }
}

impl Display for EarliestBus {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(
            f,
            "{} * {} = {}",
            self.bus.period,
            self.wait,
            self.product()
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn departure_from_timestamp() -> anyhow::Result<()> {
        let schedule: Schedule = "17,x,13,19".parse()?;
        let departure = Departure::from_timestamp(&schedule, 3417);
        assert_eq!(departure.multiplier(0), Some(201));
        assert_eq!(departure.multiplier(1), None);
        assert_eq!(departure.multiplier(2), Some(263));
        assert_eq!(departure.multiplier(3), Some(180));
        assert!(departure.verify(&schedule));
        Ok(())
    }

    #[test]
    fn verify_rejects_wrong_values() -> anyhow::Result<()> {
        let schedule: Schedule = "17,x,13,19".parse()?;
        let late = Departure::from_timestamp(&schedule, 3418);
        assert!(!late.verify(&schedule));

        let mut departure = Departure::from_timestamp(&schedule, 3417);
        departure.multipliers.insert(1, 5);
        assert!(!departure.verify(&schedule));

        let zero = Departure::new(0, BTreeMap::from([(0, 0)]));
        assert!(!zero.verify(&"5".parse()?));
        Ok(())
    }

    #[test]
    fn departure_display() -> anyhow::Result<()> {
        let schedule: Schedule = "17,x,13,19".parse()?;
        let departure = Departure::from_timestamp(&schedule, 3417);
        assert_eq!(
            departure.to_string(),
            "Objective value: 3417\n\
             Solution: t = 3417\n          \
             x_0 = 201\n          \
             x_2 = 263\n          \
             x_3 = 180"
        );
        Ok(())
    }

    #[test]
    fn departure_should_serialize() -> anyhow::Result<()> {
        let schedule: Schedule = "7,13,x,x,59,x,31,19".parse()?;
        let departure = Departure::from_timestamp(&schedule, 1_068_781);
        let serialized = serde_yaml::to_string(&departure)?;
        let deserialized: Departure = serde_yaml::from_str(&serialized)?;
        assert_eq!(departure, deserialized);
        Ok(())
    }
}
