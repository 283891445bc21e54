//! Symbol-transition statistics for text corpora.
//!
//! This crate scans a streamed text corpus and builds a normalized
//! joint-probability table of adjacent symbols, including:
//! - A byte classifier over a 97-symbol alphabet (line feed, tab, printable ASCII)
//! - Per-record transition and marginal counting
//! - Budgeted scanning of any `CorpusSource`
//! - Finalization into a fixed-size binary probability table
//!
//! ```no_run
//! use pairfreq_core::corpus::JsonLinesSource;
//! use pairfreq_core::{run, ScanConfig};
//!
//! let config = ScanConfig::default();
//! let mut source = JsonLinesSource::open("corpus.jsonl", "code")?;
//! run(&config, &mut source)?;
//! # Ok::<(), pairfreq_core::Error>(())
//! ```

use log::info;

/// Core classifier, counters, scanner and finalizer.
pub mod model;

/// Corpus sources (JSON lines, text files, in-memory iterators).
pub mod corpus;

/// Run configuration (defaults, TOML file, validation).
pub mod config;

mod error;

/// File helpers (directory listing, atomic writes).
///
/// Not exposed
pub(crate) mod io;

pub use config::ScanConfig;
pub use error::{Error, Result};

use corpus::CorpusSource;
use model::count_matrix::CountMatrix;
use model::probability_table::ProbabilityTable;
use model::scanner::{ScanProgress, ScanSummary, Scanner};

/// Outcome of a full scan + finalize run.
#[derive(Debug)]
pub struct RunOutput {
	pub summary: ScanSummary,
	pub counts: CountMatrix,
	pub table: ProbabilityTable,
}

/// Scans `source` and writes the probability table to `config.output_path`.
pub fn run<S>(config: &ScanConfig, source: &mut S) -> Result<RunOutput>
where
	S: CorpusSource + ?Sized,
{
	run_with_progress(config, source, |_| {})
}

/// Same as [`run`], reporting progress after every record.
///
/// # Errors
/// - invalid configuration
/// - any corpus failure (fatal, not retried)
/// - `Error::EmptyMatrix` if nothing was counted
/// - failure to write the output file
pub fn run_with_progress<S, F>(config: &ScanConfig, source: &mut S, observer: F) -> Result<RunOutput>
where
	S: CorpusSource + ?Sized,
	F: FnMut(&ScanProgress),
{
	config.validate()?;

	let mut counts = CountMatrix::new();
	let summary = Scanner::new(config.size_budget).scan_with_progress(source, &mut counts, observer)?;
	let table = finalize(&counts, config)?;

	Ok(RunOutput { summary, counts, table })
}

/// Finalizes `counts` and writes the table to `config.output_path`.
pub fn finalize(counts: &CountMatrix, config: &ScanConfig) -> Result<ProbabilityTable> {
	config.validate()?;
	info!(
		"Finalizing {} transitions and {} symbols (deletion rate {})",
		counts.total_transitions(),
		counts.total_marginals(),
		config.deletion_rate
	);
	let table = ProbabilityTable::from_counts(counts, config.deletion_rate)?;
	table.write(&config.output_path)?;
	Ok(table)
}
