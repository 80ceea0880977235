use crate::core::Synchronizer;
use crate::data::deserialize;
use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Directory with the bundled samples.
pub const SAMPLES_DIR: &str = "samples";

/// Report of running a directory of samples.
#[derive(Debug, Deserialize, Serialize)]
pub struct Report {
    synchronizer: String,
    entries: Vec<ReportEntry>,
}

impl Report {
    /// Create a new report.
    const fn new(synchronizer: String) -> Self {
        let entries = Vec::new();
        Self {
            synchronizer,
            entries,
        }
    }

    /// Get the synchronizer name.
    #[must_use]
    pub fn synchronizer_name(&self) -> &str {
        &self.synchronizer
    }

    /// Get the entries.
    #[must_use]
    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        writeln!(f, "Synchronizer: {}", self.synchronizer)?;
        for entry in &self.entries {
            writeln!(f, "{entry}")?;
        }
        writeln!(f, "-------------------")
    }
}

/// Report of running a single sample.
#[non_exhaustive]
#[derive(Debug, Deserialize, Serialize)]
pub struct ReportEntry {
    pub name: String,
    pub timestamp: u64,
    pub time: f64,
}

impl Display for ReportEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(
            f,
            "{}: {} in {:.4} sec",
            self.name, self.timestamp, self.time
        )
    }
}

/// Run all samples in the `samples` directory.
/// Print the report to stdout.
///
/// # Arguments
/// - `valid` is true, check if the timestamp is correct.
/// - `synchronizer` is the synchronizer to run.
///
/// # Errors
/// - If a file cannot be read or solved.
/// - If no samples are found.
///
/// # Panics
/// - If a departure is invalid.
/// - If the timestamp is incorrect and `valid` is true.
pub fn samples(valid: bool, synchronizer: &mut dyn Synchronizer) -> anyhow::Result<()> {
    run(SAMPLES_DIR, valid, synchronizer).and_then(|report| {
        if report.entries.is_empty() {
            Err(anyhow!("No samples found"))
        } else {
            println!("{report}");
            Ok(())
        }
    })
}

/// Run all samples in the `dir` directory.
///
/// # Arguments
/// - `valid` is true, check if the timestamp is correct.
/// - `synchronizer` is the synchronizer to run.
///
/// # Errors
/// - If a file cannot be read or solved.
///
/// # Panics
/// - If a departure is invalid.
/// - If the timestamp is incorrect and `valid` is true.
pub fn run(
    dir: impl AsRef<Path>,
    valid: bool,
    synchronizer: &mut dyn Synchronizer,
) -> anyhow::Result<Report> {
    let mut report = Report::new(synchronizer.name().into());

    let mut files: Vec<_> = std::fs::read_dir(dir)?.collect::<std::io::Result<_>>()?;
    files.sort_by_key(std::fs::DirEntry::file_name);

    for file in files {
        let (name, expected) = parse_filename(&file.file_name())?;
        let notes = deserialize(&mut BufReader::new(File::open(file.path())?))?;

        let time = std::time::Instant::now();
        let departure = synchronizer
            .synchronize(&notes.schedule)
            .map_err(|err| anyhow!("{name}: {err}"))?;
        let time = time.elapsed().as_secs_f64();
        debug!(name = %name, timestamp = departure.timestamp, time, "Sample solved");

        assert!(
            departure.verify(&notes.schedule),
            "Invalid departure created"
        );

        if valid {
            assert_eq!(departure.timestamp, expected, "Invalid timestamp {name}");
        }

        report.entries.push(ReportEntry {
            name,
            timestamp: departure.timestamp,
            time,
        });
    }

    Ok(report)
}

/// Splits a sample filename of the form `<expected>_<id>.in`.
fn parse_filename(filename: &std::ffi::OsStr) -> anyhow::Result<(String, u64)> {
    static NAME_ERR: &str = "Cannot read filename";

    let name = filename.to_str().ok_or_else(|| anyhow!(NAME_ERR))?;
    let mut parts = name.split('.');
    let mut parts = parts.next().ok_or_else(|| anyhow!(NAME_ERR))?.split('_');
    let expected = parts.next().ok_or_else(|| anyhow!(NAME_ERR))?.parse()?;
    let _: usize = parts.next().ok_or_else(|| anyhow!(NAME_ERR))?.parse()?;
    Ok((name.into(), expected))
}

/// Builds the sample filename for an instance.
#[must_use]
pub fn sample_filename(expected: u64, id: u64) -> String {
    format!("{expected}_{id}.in")
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::algo::Sieve;
    use std::ffi::OsStr;

    #[test]
    fn test_parse_filename() -> anyhow::Result<()> {
        let (name, expected) = parse_filename(OsStr::new("1068781_0.in"))?;
        assert_eq!(name, "1068781_0.in");
        assert_eq!(expected, 1_068_781);

        let (_, expected) = parse_filename(OsStr::new(&sample_filename(3417, 12)))?;
        assert_eq!(expected, 3417);
        Ok(())
    }

    #[test]
    fn test_parse_filename_errors() {
        assert!(parse_filename(OsStr::new("")).is_err());
        assert!(parse_filename(OsStr::new(".in")).is_err());
        assert!(parse_filename(OsStr::new("10.in")).is_err());
        assert!(parse_filename(OsStr::new("1a0_2.in")).is_err());
        assert!(parse_filename(OsStr::new("10_2a.in")).is_err());
    }

    #[test]
    fn run_reports_every_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("3417_0.in"), "17,x,13,19\n")?;
        std::fs::write(dir.path().join("295_1.in"), "939\n7,13,x,x,59,x,31,19\n")?;

        let report = run(dir.path(), false, &mut Sieve)?;
        assert_eq!(report.synchronizer_name(), "Sieve");
        let timestamps: Vec<_> = report.entries().iter().map(|e| e.timestamp).collect();
        assert_eq!(timestamps, vec![1_068_781, 3417]);
        Ok(())
    }

    #[test]
    fn run_fails_on_unsolvable_sample() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("1_0.in"), "x,x\n")?;
        let err = run(dir.path(), false, &mut Sieve).unwrap_err();
        assert!(err.to_string().contains("no real buses"));
        Ok(())
    }

    #[test]
    fn report_should_serialize() -> anyhow::Result<()> {
        let report = run(SAMPLES_DIR, true, &mut Sieve)?;
        let serialized = crate::data::to_string(&report)?;
        assert!(serialized.contains("synchronizer: Sieve"));
        Ok(())
    }
}
