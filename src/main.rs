use anyhow::Context;
use clap::{Parser, ValueEnum};
use rand::prelude::*;
use shuttle_search::core::{Schedule, Synchronizer};
use shuttle_search::{algo, data, DEFAULT_SCHEDULE};
use std::fs::File;
use std::io::BufReader;
use std::num::NonZero;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug)]
struct Algorithm(usize, &'static str);

impl From<Algorithm> for Box<dyn Synchronizer> {
    fn from(value: Algorithm) -> Box<dyn Synchronizer> {
        algo::SOLVERS[value.0]()
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.1)
    }
}

impl ValueEnum for Algorithm {
    fn value_variants<'a>() -> &'a [Self] {
        static ALGORITHMS: std::sync::LazyLock<Vec<Algorithm>> = std::sync::LazyLock::new(|| {
            let iter = algo::SOLVERS.iter().enumerate();
            iter.map(|(i, init)| Algorithm(i, init().name())).collect()
        });

        ALGORITHMS.as_slice()
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(self.1))
    }
}

/// Application finding the earliest synchronized bus departure.
#[derive(Debug, Parser)]
#[command(version, about)]
enum Application {
    /// Find the earliest timestamp at which every bus departs at its offset.
    Solve {
        /// The algorithm to use.
        #[clap(short, long, default_value = "ILP")]
        algorithm: Algorithm,
        /// The bus schedule, e.g. `7,13,x,x,59`. Defaults to the built-in schedule.
        #[clap(short, long, conflicts_with = "input")]
        schedule: Option<String>,
        /// Notes file whose last line is the bus schedule.
        #[clap(short, long)]
        input: Option<PathBuf>,
        /// Print the departure as YAML.
        #[clap(long, default_value = "false")]
        yaml: bool,
    },
    /// Find the first bus departing after the earliest timestamp of the notes.
    Earliest {
        /// The notes file.
        input: PathBuf,
    },
    /// Run benchmarks on a set of instances.
    Bench {
        /// The input directory.
        input: PathBuf,
        /// Exclude algorithms.
        #[clap(short, long, value_delimiter = ',')]
        exclude: Vec<Algorithm>,
        /// Check the results against the expected timestamps in the file names.
        #[clap(short, long, default_value = "false")]
        valid: bool,
        /// Print the reports as YAML.
        #[clap(long, default_value = "false")]
        yaml: bool,
    },
    /// Generate instances with pairwise coprime periods.
    Gen {
        /// The number of buses.
        buses: NonZero<usize>,
        /// The largest bus period.
        max_period: NonZero<u64>,
        /// Probability of each further placeholder between two buses.
        #[clap(short, long, default_value = "0.3")]
        gap_ratio: f64,
        /// Number of instances to generate.
        #[clap(short, long, default_value = "1")]
        amount: NonZero<u64>,
        /// Seed of the random generator.
        #[clap(long)]
        seed: Option<u64>,
        /// Output directory, created if missing.
        #[clap(short, long, default_value = "output")]
        output: PathBuf,
    },
}

fn synchronizers(exclude: &[Algorithm]) -> impl Iterator<Item = Box<dyn Synchronizer>> + '_ {
    let iter = algo::SOLVERS.iter().map(|init| init());
    iter.filter(|synchronizer| {
        let name = synchronizer.name();
        !exclude.iter().any(|algorithm| algorithm.1 == name)
    })
}

fn read_notes(path: &Path) -> anyhow::Result<shuttle_search::core::Notes> {
    let file = File::open(path).with_context(|| format!("Cannot open {}", path.display()))?;
    data::deserialize(&mut BufReader::new(file))
        .with_context(|| format!("Cannot read notes from {}", path.display()))
}

fn read_schedule(schedule: Option<String>, input: Option<PathBuf>) -> anyhow::Result<Schedule> {
    match (schedule, input) {
        (Some(schedule), _) => schedule.parse().context("Cannot parse schedule"),
        (None, Some(path)) => Ok(read_notes(&path)?.schedule),
        (None, None) => Ok(DEFAULT_SCHEDULE.parse()?),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Application::parse() {
        Application::Solve {
            algorithm,
            schedule,
            input,
            yaml,
        } => {
            let schedule = read_schedule(schedule, input)?;
            let mut synchronizer = Box::<dyn Synchronizer>::from(algorithm);
            info!(%schedule, algorithm = synchronizer.name(), "Solving");

            let departure = synchronizer
                .synchronize(&schedule)
                .with_context(|| format!("{algorithm} failed to synchronize {schedule}"))?;

            if yaml {
                print!("{}", data::to_string(&departure)?);
            } else {
                println!();
                println!("{departure}");
            }
            Ok(())
        }
        Application::Earliest { input } => {
            let notes = read_notes(&input)?;
            println!("{}", algo::earliest_bus(&notes)?);
            Ok(())
        }
        Application::Bench {
            input,
            exclude,
            valid,
            yaml,
        } => {
            for mut synchronizer in synchronizers(&exclude) {
                let report = data::run(&input, valid, synchronizer.as_mut())?;
                if yaml {
                    print!("{}", data::to_string(&report)?);
                } else {
                    println!("{report}");
                }
            }
            Ok(())
        }
        Application::Gen {
            buses,
            max_period,
            gap_ratio,
            amount,
            seed,
            output,
        } => {
            let generator = data::Generator {
                buses: buses.get(),
                max_period: max_period.get(),
                gap_ratio,
            };
            let mut rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
            generator.write(&mut rng, amount.get(), &output)
        }
    }
}
