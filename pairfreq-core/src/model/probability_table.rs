use std::path::Path;

use log::info;

use super::count_matrix::{index_pair, CountMatrix};
use super::symbol::{Symbol, META_INDEX, SYMBOL_COUNT, TABLE_DIM};
use crate::error::{Error, Result};
use crate::io::write_atomic;

/// Size in bytes of a serialized table: 98 × 98 little-endian `f64`s.
pub const ARTIFACT_SIZE: usize = TABLE_DIM * TABLE_DIM * size_of::<f64>();

/// Normalized joint-probability table derived from a [`CountMatrix`].
///
/// Row index is the previous symbol, column index the current symbol, with
/// the meta column `97` holding the scaled marginal share of each symbol.
/// All cells sum to 1.0.
///
/// # Invariants
/// - `cells.len() == TABLE_DIM * TABLE_DIM`
#[derive(Clone, Debug, PartialEq)]
pub struct ProbabilityTable {
	cells: Vec<f64>,
}

impl ProbabilityTable {
	/// Finalizes raw counts into probabilities.
	///
	/// 1. Every marginal cell `[v, 97]` is multiplied by `deletion_rate` and
	///    truncated back to an integer count. Transition cells are untouched.
	/// 2. The grand sum of the scaled integer matrix is computed.
	/// 3. Every cell is divided by that sum.
	///
	/// # Errors
	/// Returns `Error::EmptyMatrix` if the scaled matrix sums to zero.
	pub fn from_counts(counts: &CountMatrix, deletion_rate: f64) -> Result<Self> {
		let mut scaled = counts.cells().to_vec();
		for row in 0..TABLE_DIM {
			let cell = &mut scaled[index_pair(row, META_INDEX)];
			*cell = (*cell as f64 * deletion_rate) as u64;
		}

		let total: u64 = scaled.iter().sum();
		if total == 0 {
			return Err(Error::EmptyMatrix);
		}

		let total = total as f64;
		Ok(Self { cells: scaled.into_iter().map(|count| count as f64 / total).collect() })
	}

	/// Raw cell value. Panics if `row` or `col` is `>= TABLE_DIM`.
	pub fn get(&self, row: usize, col: usize) -> f64 {
		assert!(row < TABLE_DIM && col < TABLE_DIM, "cell ({row}, {col}) out of range");
		self.cells[index_pair(row, col)]
	}

	/// Joint probability of `curr` directly following `prev`.
	pub fn pair(&self, prev: Symbol, curr: Symbol) -> f64 {
		self.cells[index_pair(prev.index(), curr.index())]
	}

	/// Scaled marginal share of `symbol` (meta column).
	pub fn deletion(&self, symbol: Symbol) -> f64 {
		self.cells[index_pair(symbol.index(), META_INDEX)]
	}

	pub fn sum(&self) -> f64 {
		self.cells.iter().sum()
	}

	pub fn cells(&self) -> &[f64] {
		&self.cells
	}

	/// The `n` most probable transition cells as `(prev, curr, probability)`.
	///
	/// Meta-column cells are excluded. Ties are ordered by row, then column.
	pub fn top_pairs(&self, n: usize) -> Vec<(Symbol, Symbol, f64)> {
		let mut pairs: Vec<(Symbol, Symbol, f64)> = (0..SYMBOL_COUNT)
			.flat_map(|row| (0..SYMBOL_COUNT).map(move |col| (row, col)))
			.filter_map(|(row, col)| {
				let probability = self.cells[index_pair(row, col)];
				Some((Symbol::from_index(row)?, Symbol::from_index(col)?, probability))
			})
			.collect();

		// Stable sort keeps row-major order among equal probabilities.
		pairs.sort_by(|a, b| b.2.total_cmp(&a.2));
		pairs.truncate(n);
		pairs
	}

	/// Row-major little-endian encoding, exactly `ARTIFACT_SIZE` bytes.
	pub fn to_bytes(&self) -> Vec<u8> {
		let mut bytes = Vec::with_capacity(ARTIFACT_SIZE);
		for cell in &self.cells {
			bytes.extend_from_slice(&cell.to_le_bytes());
		}
		bytes
	}

	/// Decodes a table written by [`ProbabilityTable::to_bytes`].
	///
	/// # Errors
	/// `Error::ArtifactSize` if `bytes` is not exactly `ARTIFACT_SIZE` long.
	pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
		if bytes.len() != ARTIFACT_SIZE {
			return Err(Error::ArtifactSize { expected: ARTIFACT_SIZE, found: bytes.len() });
		}

		let cells = bytes
			.chunks_exact(size_of::<f64>())
			.map(|chunk| {
				let mut raw = [0u8; size_of::<f64>()];
				raw.copy_from_slice(chunk);
				f64::from_le_bytes(raw)
			})
			.collect();
		Ok(Self { cells })
	}

	/// Writes the table to `path`.
	///
	/// The file is replaced atomically: on failure, whatever was at `path`
	/// before is left as it was and no partial table is ever visible.
	pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		let path = path.as_ref();
		write_atomic(path, &self.to_bytes()).map_err(|source| Error::Write { path: path.to_path_buf(), source })?;
		info!("Wrote probability table to {} ({} bytes)", path.display(), ARTIFACT_SIZE);
		Ok(())
	}

	/// Reads a table from `path`.
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
		let path = path.as_ref();
		let bytes = std::fs::read(path).map_err(|source| Error::Read { path: path.to_path_buf(), source })?;
		Self::from_bytes(&bytes)
	}
}
