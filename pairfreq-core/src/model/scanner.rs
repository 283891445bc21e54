use log::{debug, info, warn};

use super::accumulator::accumulate_record;
use super::count_matrix::CountMatrix;
use crate::corpus::CorpusSource;
use crate::error::Result;

/// Snapshot passed to the progress observer after every record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScanProgress {
	/// Records processed so far.
	pub records: u64,
	/// Transitions recorded so far.
	pub transitions: u64,
	/// Transitions recorded by the record that was just processed.
	pub last_record: u64,
}

/// Result of a completed scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanSummary {
	pub records: u64,
	pub transitions: u64,
	/// `true` if scanning stopped because the budget was exceeded, `false`
	/// if the corpus ran out first.
	pub budget_exceeded: bool,
}

/// Pulls records from a corpus into a [`CountMatrix`] until a transition
/// budget is exceeded.
///
/// # Behavior
/// - Each record starts with a fresh chain state
/// - After each record, its transition count is added to a running total
/// - No further record is requested once the total is strictly greater than
///   `size_budget`; the record that crosses the threshold is kept whole, so
///   the final total may overshoot the budget
/// - An exhausted corpus ends the scan normally
/// - A corpus error aborts the scan and is returned as-is
pub struct Scanner {
	size_budget: u64,
}

impl Scanner {
	pub fn new(size_budget: u64) -> Self {
		Self { size_budget }
	}

	pub fn size_budget(&self) -> u64 {
		self.size_budget
	}

	/// Scans `source` into `counts`.
	pub fn scan<S>(&self, source: &mut S, counts: &mut CountMatrix) -> Result<ScanSummary>
	where
		S: CorpusSource + ?Sized,
	{
		self.scan_with_progress(source, counts, |_| {})
	}

	/// Same as [`Scanner::scan`], calling `observer` after every record.
	pub fn scan_with_progress<S, F>(&self, source: &mut S, counts: &mut CountMatrix, mut observer: F) -> Result<ScanSummary>
	where
		S: CorpusSource + ?Sized,
		F: FnMut(&ScanProgress),
	{
		info!("Scanning corpus (size budget: {} transitions)", self.size_budget);

		let mut progress = ScanProgress::default();
		let mut budget_exceeded = false;

		while let Some(record) = source.next_record()? {
			let recorded = accumulate_record(counts, record.as_bytes());

			progress.records += 1;
			progress.transitions += recorded;
			progress.last_record = recorded;
			debug!(
				"record {}: {} bytes, {} transitions (total {})",
				progress.records,
				record.text.len(),
				recorded,
				progress.transitions
			);
			observer(&progress);

			if progress.transitions > self.size_budget {
				budget_exceeded = true;
				break;
			}
		}

		if budget_exceeded {
			info!(
				"Size budget exceeded after {} records ({} transitions)",
				progress.records, progress.transitions
			);
		} else {
			warn!(
				"Corpus exhausted before the size budget was reached ({} records, {} of {} transitions)",
				progress.records, progress.transitions, self.size_budget
			);
		}

		Ok(ScanSummary {
			records: progress.records,
			transitions: progress.transitions,
			budget_exceeded,
		})
	}
}
