use crate::core::{gcd_u128, lcm, Departure, Schedule, SolveError, Synchronizer};
use tracing::{debug, info};

/// Constructive sieve over the Chinese remainder theorem.
///
/// Buses are matched one after another. The candidate timestamp advances by the
/// lcm of the periods matched so far, which keeps every earlier bus in sync.
/// Does not need a solver.
#[derive(Clone, Debug, Default)]
pub struct Sieve;

impl Synchronizer for Sieve {
    fn synchronize(&mut self, schedule: &Schedule) -> Result<Departure, SolveError> {
        if !schedule.has_buses() {
            return Err(SolveError::NoBuses);
        }
        let bound = schedule.period_product().ok_or(SolveError::Overflow)?;

        let (mut time, mut step) = (0u128, 1u128);
        for bus in schedule.buses() {
            let period = u128::from(bus.period);
            // residues reachable with the current step before the candidates repeat
            let attempts = period / gcd_u128(step, period);
            let mut tried = 0;
            while !bus.departs_after(time) {
                tried += 1;
                if tried >= attempts {
                    return Err(SolveError::Infeasible { bound });
                }
                time = time.checked_add(step).ok_or(SolveError::Overflow)?;
            }
            step = lcm(step, bus.period)?;
            debug!(
                position = bus.position,
                time = %time,
                step = %step,
                "Bus matched"
            );
        }

        if time == 0 {
            time = step;
        }

        let timestamp = u64::try_from(time).map_err(|_| SolveError::Overflow)?;
        info!(timestamp, "Schedule synchronized");
        Ok(Departure::from_timestamp(schedule, timestamp))
    }

    fn name(&self) -> &'static str {
        "Sieve"
    }
}

#[allow(unsafe_code)]
#[linkme::distributed_slice(super::SOLVERS)]
static INSTANCE: fn() -> Box<dyn Synchronizer> = || Box::new(Sieve);

#[cfg(test)]
mod test {
    use super::*;
    use crate::data::samples;

    fn synchronize(schedule: &str) -> anyhow::Result<u64> {
        let schedule: Schedule = schedule.parse()?;
        let departure = Sieve.synchronize(&schedule)?;
        assert!(departure.verify(&schedule));
        Ok(departure.timestamp)
    }

    #[test]
    fn reference_schedules() -> anyhow::Result<()> {
        assert_eq!(synchronize("7,13,x,x,59,x,31,19")?, 1_068_781);
        assert_eq!(synchronize("17,x,13,19")?, 3417);
        assert_eq!(synchronize("67,7,59,61")?, 754_018);
        assert_eq!(synchronize("67,7,x,59,61")?, 1_261_476);
        assert_eq!(synchronize("1789,37,47,1889")?, 1_202_161_486);
        Ok(())
    }

    #[test]
    fn timestamp_is_positive() -> anyhow::Result<()> {
        assert_eq!(synchronize("7")?, 7);
        assert_eq!(synchronize("3,x,x,x,x,5")?, 15);
        assert_eq!(synchronize("x,7")?, 6);
        Ok(())
    }

    #[test]
    fn result_is_minimal() -> anyhow::Result<()> {
        for input in ["17,x,13,19", "5,x,7,x,x,3", "4,x,6", "2,3,5"] {
            let schedule: Schedule = input.parse()?;
            let found = synchronize(input)?;
            let smaller = (1..found).find(|&t| schedule.is_synchronized(u128::from(t)));
            assert_eq!(smaller, None, "{input}: {smaller:?} < {found}");
        }
        Ok(())
    }

    #[test]
    fn inconsistent_or_empty() -> anyhow::Result<()> {
        assert_eq!(
            Sieve.synchronize(&"4,6".parse()?).err(),
            Some(SolveError::Infeasible { bound: 24 })
        );
        assert_eq!(
            Sieve.synchronize(&"x".parse()?).err(),
            Some(SolveError::NoBuses)
        );
        Ok(())
    }

    #[test]
    fn test_sieve() {
        assert!(samples(true, &mut Sieve).is_ok());
    }
}
