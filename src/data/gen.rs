use super::sample_filename;
use crate::algo::Sieve;
use crate::core::{Notes, Schedule, Slot, Synchronizer};
use anyhow::{bail, Context, Result};
use rand::prelude::*;
use std::path::Path;

/// Longest run of placeholders inserted before a bus.
const MAX_GAP: usize = 8;

/// Latest generated earliest departure timestamp.
const MAX_EARLIEST: u64 = 1_000_000;

/// Settings of generated instances.
#[derive(Clone, Debug)]
pub struct Generator {
    /// Number of real buses.
    pub buses: usize,
    /// Largest period.
    pub max_period: u64,
    /// Probability of another placeholder before a bus.
    pub gap_ratio: f64,
}

/// Primes up to `limit`, by the sieve of Eratosthenes.
fn primes(limit: u64) -> Vec<u64> {
    let limit = crate::cast_usize(limit);
    let mut composite = vec![false; limit + 1];
    let mut result = Vec::new();
    for n in 2..=limit {
        if !composite[n] {
            result.push(crate::cast_u64(n));
            (n * n..=limit).step_by(n).for_each(|m| composite[m] = true);
        }
    }
    result
}

impl Generator {
    /// Generates notes with pairwise coprime periods.
    ///
    /// # Errors
    /// - If there are fewer primes up to `max_period` than buses.
    /// - If the gap ratio is outside `0..1`.
    pub fn notes(&self, rng: &mut impl Rng) -> Result<Notes> {
        if !(0.0..1.0).contains(&self.gap_ratio) {
            bail!("Gap ratio must be in 0..1, got {}", self.gap_ratio);
        }

        let primes = primes(self.max_period);
        if primes.len() < self.buses {
            bail!(
                "Only {} prime periods up to {}, {} buses requested",
                primes.len(),
                self.max_period,
                self.buses
            );
        }

        let mut periods: Vec<u64> = primes
            .choose_multiple(&mut *rng, self.buses)
            .copied()
            .collect();
        periods.shuffle(&mut *rng);

        let mut slots = Vec::new();
        for (i, period) in periods.into_iter().enumerate() {
            if i > 0 {
                let gap = (0..MAX_GAP)
                    .take_while(|_| rng.gen_bool(self.gap_ratio))
                    .count();
                slots.extend(std::iter::repeat(Slot::Placeholder).take(gap));
            }
            slots.push(Slot::Bus(period));
        }

        let earliest = rng.gen_range(1..=MAX_EARLIEST);
        Ok(Notes::new(Some(earliest), Schedule::new(slots)))
    }

    /// Writes `amount` generated instances into `output`, named after their solution.
    ///
    /// # Errors
    /// - If generation or solving fails.
    /// - If the files cannot be written.
    pub fn write(&self, rng: &mut impl Rng, amount: u64, output: &Path) -> Result<()> {
        if !output.try_exists()? {
            std::fs::create_dir_all(output)?;
        }

        for i in 0..amount {
            let notes = self.notes(&mut *rng)?;
            let departure = Sieve
                .synchronize(&notes.schedule)
                .with_context(|| format!("Generated schedule {} failed", notes.schedule))?;
            let earliest = notes.earliest.unwrap_or_default();
            std::fs::write(
                output.join(sample_filename(departure.timestamp, i)),
                format!("{earliest}\n{}\n", notes.schedule),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::data::run;

    #[test]
    fn primes_up_to() {
        assert_eq!(primes(20), vec![2, 3, 5, 7, 11, 13, 17, 19]);
        assert!(primes(1).is_empty());
    }

    #[test]
    fn generated_periods_are_coprime() -> Result<()> {
        let generator = Generator {
            buses: 5,
            max_period: 100,
            gap_ratio: 0.5,
        };
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let notes = generator.notes(&mut rng)?;
            assert_eq!(notes.schedule.buses().count(), 5);
            assert!(notes.schedule.shared_factors().is_empty());
            assert!(!matches!(notes.schedule.slots()[0], Slot::Placeholder));
        }
        Ok(())
    }

    #[test]
    fn invalid_settings() {
        let mut rng = StdRng::seed_from_u64(7);
        let too_many = Generator {
            buses: 9,
            max_period: 20,
            gap_ratio: 0.0,
        };
        assert!(too_many.notes(&mut rng).is_err());

        let bad_ratio = Generator {
            buses: 2,
            max_period: 20,
            gap_ratio: 1.0,
        };
        assert!(bad_ratio.notes(&mut rng).is_err());
    }

    #[test]
    fn written_samples_validate() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let generator = Generator {
            buses: 4,
            max_period: 60,
            gap_ratio: 0.3,
        };
        generator.write(&mut StdRng::seed_from_u64(11), 3, dir.path())?;

        let report = run(dir.path(), true, &mut crate::algo::ExactIlp::default())?;
        assert_eq!(report.entries().len(), 3);
        Ok(())
    }
}
