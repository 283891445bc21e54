use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use super::symbol::{Symbol, META_INDEX, SYMBOL_COUNT, TABLE_DIM};
use crate::error::{Error, Result};
use crate::io::write_atomic;

/// Row-major index of the `(row, col)` cell in a `TABLE_DIM`-square table.
pub fn index_pair(row: usize, col: usize) -> usize {
	(row * TABLE_DIM) + col
}

/// Raw counters gathered while scanning a corpus.
///
/// Two uses are packed into one 98×98 table:
/// - `[prev, curr]` for `prev, curr < 97`: ordered transition counts
/// - `[symbol, 97]`: marginal occurrence count of `symbol`
///
/// Row 97 is never written.
///
/// # Invariants
/// - `cells.len() == TABLE_DIM * TABLE_DIM`
/// - Counts only ever increase
/// - Every transition increment into `[p, v]` is paired with one marginal
///   increment into `[v, 97]`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CountMatrix {
	cells: Vec<u64>,
}

impl Default for CountMatrix {
	fn default() -> Self {
		Self::new()
	}
}

impl CountMatrix {
	/// Creates a zeroed matrix.
	pub fn new() -> Self {
		Self { cells: vec![0; TABLE_DIM * TABLE_DIM] }
	}

	/// Raw cell value. Panics if `row` or `col` is `>= TABLE_DIM`.
	pub fn get(&self, row: usize, col: usize) -> u64 {
		assert!(row < TABLE_DIM && col < TABLE_DIM, "cell ({row}, {col}) out of range");
		self.cells[index_pair(row, col)]
	}

	pub fn transition(&self, prev: Symbol, curr: Symbol) -> u64 {
		self.cells[index_pair(prev.index(), curr.index())]
	}

	pub fn marginal(&self, symbol: Symbol) -> u64 {
		self.cells[index_pair(symbol.index(), META_INDEX)]
	}

	pub(crate) fn record_transition(&mut self, prev: Symbol, curr: Symbol) {
		self.cells[index_pair(prev.index(), curr.index())] += 1;
	}

	pub(crate) fn record_marginal(&mut self, symbol: Symbol) {
		self.cells[index_pair(symbol.index(), META_INDEX)] += 1;
	}

	/// Sum of all transition cells.
	pub fn total_transitions(&self) -> u64 {
		(0..SYMBOL_COUNT)
			.map(|row| self.cells[index_pair(row, 0)..index_pair(row, SYMBOL_COUNT)].iter().sum::<u64>())
			.sum()
	}

	/// Sum of all marginal cells, i.e. the number of symbols observed.
	pub fn total_marginals(&self) -> u64 {
		(0..SYMBOL_COUNT).map(|row| self.cells[index_pair(row, META_INDEX)]).sum()
	}

	/// `true` when nothing has been recorded yet.
	pub fn is_empty(&self) -> bool {
		self.cells.iter().all(|&count| count == 0)
	}

	/// All cells in row-major order.
	pub fn cells(&self) -> &[u64] {
		&self.cells
	}

	/// Adds another matrix into this one, cell by cell.
	///
	/// Chain state never crosses record boundaries, so matrices built from
	/// disjoint sets of records merge into exactly the matrix a single scan
	/// over all of them would have produced.
	pub fn merge(&mut self, other: &Self) {
		for (cell, count) in self.cells.iter_mut().zip(&other.cells) {
			*cell += count;
		}
	}

	/// Serializes the counters with `postcard`.
	pub fn to_cache_bytes(&self) -> Result<Vec<u8>> {
		postcard::to_stdvec(self).map_err(|e| Error::CountCache(e.to_string()))
	}

	/// Restores counters written by [`CountMatrix::to_cache_bytes`].
	///
	/// # Errors
	/// Returns `Error::CountCache` if the bytes do not decode or the decoded
	/// table does not have `TABLE_DIM * TABLE_DIM` cells.
	pub fn from_cache_bytes(bytes: &[u8]) -> Result<Self> {
		let matrix: Self = postcard::from_bytes(bytes).map_err(|e| Error::CountCache(e.to_string()))?;
		if matrix.cells.len() != TABLE_DIM * TABLE_DIM {
			return Err(Error::CountCache(format!(
				"expected {} cells, found {}",
				TABLE_DIM * TABLE_DIM,
				matrix.cells.len()
			)));
		}
		Ok(matrix)
	}

	/// Saves the counters to a cache file so the scan can be finalized again
	/// later without touching the corpus.
	pub fn save_cache<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		let path = path.as_ref();
		let bytes = self.to_cache_bytes()?;
		write_atomic(path, &bytes).map_err(|source| Error::Write { path: path.to_path_buf(), source })?;
		info!("Saved count cache to {}", path.display());
		Ok(())
	}

	pub fn load_cache<P: AsRef<Path>>(path: P) -> Result<Self> {
		let path = path.as_ref();
		let bytes = std::fs::read(path).map_err(|source| Error::Read { path: path.to_path_buf(), source })?;
		Self::from_cache_bytes(&bytes)
	}
}
