use super::util::gcd;
use super::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Token marking a position without timing constraint.
pub const PLACEHOLDER: &str = "x";

/// A single position of the schedule.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Slot {
    /// A bus departing every `period` minutes.
    Bus(u64),
    /// A position without constraint.
    Placeholder,
}

/// A real bus together with its position in the schedule.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Serialize, PartialEq)]
pub struct Bus {
    pub position: usize,
    pub period: u64,
}

impl Bus {
    /// Creates a new bus.
    #[must_use]
    pub const fn new(position: usize, period: u64) -> Self {
        Self { position, period }
    }

    /// Returns whether the bus departs exactly `position` minutes after `timestamp`.
    #[must_use]
    pub fn departs_after(&self, timestamp: u128) -> bool {
        (timestamp + crate::cast_u128(self.position)) % u128::from(self.period) == 0
    }
}

/// A bus schedule: periods and placeholders in sequence order.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Serialize, PartialEq)]
#[serde(try_from = "String", into = "String")]
pub struct Schedule {
    slots: Vec<Slot>,
}

impl Schedule {
    /// Creates a schedule from slots.
    #[must_use]
    pub const fn new(slots: Vec<Slot>) -> Self {
        Self { slots }
    }

    /// Returns all slots, placeholders included.
    #[must_use]
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Returns the real buses in sequence order.
    pub fn buses(&self) -> impl Iterator<Item = Bus> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(position, slot)| match slot {
                Slot::Bus(period) => Some(Bus::new(position, *period)),
                Slot::Placeholder => None,
            })
    }

    /// Returns whether there is at least one real bus.
    #[must_use]
    pub fn has_buses(&self) -> bool {
        self.buses().next().is_some()
    }

    /// Product of all real periods, `None` on overflow.
    #[must_use]
    pub fn period_product(&self) -> Option<u128> {
        self.buses()
            .try_fold(1u128, |acc, bus| acc.checked_mul(u128::from(bus.period)))
    }

    /// Returns every pair of buses whose periods share a factor, with the factor.
    #[must_use]
    pub fn shared_factors(&self) -> Vec<(Bus, Bus, u64)> {
        let buses: Vec<_> = self.buses().collect();
        let mut result = Vec::new();
        for (i, first) in buses.iter().enumerate() {
            for second in &buses[i + 1..] {
                let factor = gcd(first.period, second.period);
                if factor > 1 {
                    result.push((*first, *second, factor));
                }
            }
        }
        result
    }

    /// Checks whether every real bus departs at its offset after `timestamp`.
    #[must_use]
    pub fn is_synchronized(&self, timestamp: u128) -> bool {
        self.buses().all(|bus| bus.departs_after(timestamp))
    }
}

impl FromStr for Schedule {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let slots = s
            .trim()
            .split(',')
            .map(str::trim)
            .enumerate()
            .map(|(position, token)| parse_slot(position, token))
            .collect::<Result<_, _>>()?;
        Ok(Self { slots })
    }
}

fn parse_slot(position: usize, token: &str) -> Result<Slot, ParseError> {
    if token == PLACEHOLDER {
        return Ok(Slot::Placeholder);
    }

    match token.parse::<u64>() {
        Ok(0) => Err(ParseError::ZeroPeriod { position }),
        Ok(period) => Ok(Slot::Bus(period)),
        Err(_) => Err(ParseError::InvalidToken {
            token: token.into(),
            position,
        }),
    }
}

impl TryFrom<String> for Schedule {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Schedule> for String {
    fn from(schedule: Schedule) -> Self {
        schedule.to_string()
    }
}

impl Display for Schedule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, slot) in self.slots.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            match slot {
                Slot::Bus(period) => write!(f, "{period}")?,
                Slot::Placeholder => write!(f, "{PLACEHOLDER}")?,
            }
        }
        Ok(())
    }
}

/// Puzzle notes: the earliest possible departure and the bus schedule.
#[non_exhaustive]
#[derive(Clone, Debug, Deserialize, Eq, Serialize, PartialEq)]
pub struct Notes {
    pub earliest: Option<u64>,
    pub schedule: Schedule,
}

impl Notes {
    /// Creates new notes.
    #[must_use]
    pub const fn new(earliest: Option<u64>, schedule: Schedule) -> Self {
        Self { earliest, schedule }
    }
}

impl FromStr for Notes {
    type Err = ParseError;

    /// Two non-empty lines are read as timestamp and schedule, a single line as schedule only.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut lines = s.lines().map(str::trim).filter(|line| !line.is_empty());
        let first = lines.next().ok_or(ParseError::MissingSchedule)?;

        match lines.next() {
            Some(schedule) => {
                let earliest = first
                    .parse()
                    .map_err(|_| ParseError::InvalidTimestamp(first.into()))?;
                Ok(Self::new(Some(earliest), schedule.parse()?))
            }
            None => Ok(Self::new(None, first.parse()?)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn schedule_should_parse_placeholders() -> anyhow::Result<()> {
        let schedule: Schedule = "7,13,x,x,59,x,31,19".parse()?;
        assert_eq!(schedule.slots().len(), 8);
        assert_eq!(schedule.slots()[2], Slot::Placeholder);

        let buses: Vec<_> = schedule.buses().collect();
        assert_eq!(buses.len(), 5);
        assert_eq!(buses[2], Bus::new(4, 59));
        assert_eq!(buses[4], Bus::new(7, 19));
        Ok(())
    }

    #[test]
    fn schedule_should_reject_malformed_token() {
        let err = "17,x,abc,19".parse::<Schedule>().unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidToken {
                token: "abc".into(),
                position: 2
            }
        );
        assert!(err.to_string().contains("'abc'"));
        assert!("".parse::<Schedule>().is_err());
        assert!("7,,13".parse::<Schedule>().is_err());
        assert!("-7".parse::<Schedule>().is_err());
    }

    #[test]
    fn schedule_should_reject_zero_period() {
        let err = "7,0".parse::<Schedule>().unwrap_err();
        assert_eq!(err, ParseError::ZeroPeriod { position: 1 });
    }

    #[test]
    fn placeholder_only_schedule_has_no_buses() -> anyhow::Result<()> {
        let schedule: Schedule = "x,x,x".parse()?;
        assert!(!schedule.has_buses());
        assert_eq!(schedule.period_product(), Some(1));
        Ok(())
    }

    #[test]
    fn product_excludes_placeholders() -> anyhow::Result<()> {
        let schedule: Schedule = "17,x,13,19".parse()?;
        assert_eq!(schedule.period_product(), Some(17 * 13 * 19));
        Ok(())
    }

    #[test]
    fn shared_factors_are_detected() -> anyhow::Result<()> {
        let schedule: Schedule = "4,x,6,7".parse()?;
        let shared = schedule.shared_factors();
        assert_eq!(shared, vec![(Bus::new(0, 4), Bus::new(2, 6), 2)]);

        let coprime: Schedule = "7,13,x,x,59".parse()?;
        assert!(coprime.shared_factors().is_empty());
        Ok(())
    }

    #[test]
    fn schedule_should_serialize() -> anyhow::Result<()> {
        let schedule: Schedule = "7,13,x,x,59,x,31,19".parse()?;
        assert_eq!(schedule.to_string(), "7,13,x,x,59,x,31,19");

        let serialized = serde_yaml::to_string(&schedule)?;
        let deserialized: Schedule = serde_yaml::from_str(&serialized)?;
        assert_eq!(schedule, deserialized);
        Ok(())
    }

    #[test]
    fn notes_should_parse_both_forms() -> anyhow::Result<()> {
        let notes: Notes = "939\n7,13,x,x,59,x,31,19\n".parse()?;
        assert_eq!(notes.earliest, Some(939));
        assert_eq!(notes.schedule.buses().count(), 5);

        let notes: Notes = "17,x,13,19".parse()?;
        assert_eq!(notes.earliest, None);

        assert_eq!("".parse::<Notes>(), Err(ParseError::MissingSchedule));
        assert!(matches!(
            "soon\n7,13".parse::<Notes>(),
            Err(ParseError::InvalidTimestamp(_))
        ));
        Ok(())
    }

    #[test]
    fn synchronized_check() -> anyhow::Result<()> {
        let schedule: Schedule = "17,x,13,19".parse()?;
        assert!(schedule.is_synchronized(3417));
        assert!(!schedule.is_synchronized(3418));
        Ok(())
    }
}
