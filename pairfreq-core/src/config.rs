//! Run configuration.
//!
//! Values come from, in increasing priority: built-in defaults, an optional
//! TOML file, then whatever the caller overrides (command-line flags).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_OUTPUT_PATH: &str = "data/code.data";
pub const DEFAULT_SIZE_BUDGET: u64 = 1_000_000_000;
pub const DEFAULT_DELETION_RATE: f64 = 0.2;

/// Parameters of one scan + finalize run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
	/// Where the probability table is written.
	pub output_path: PathBuf,

	/// Scanning stops once the accumulated transition count strictly exceeds
	/// this value.
	pub size_budget: u64,

	/// Factor applied to the marginal column before normalization, in `[0, 1]`.
	pub deletion_rate: f64,
}

impl Default for ScanConfig {
	fn default() -> Self {
		Self {
			output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
			size_budget: DEFAULT_SIZE_BUDGET,
			deletion_rate: DEFAULT_DELETION_RATE,
		}
	}
}

impl ScanConfig {
	/// Parses a TOML document; missing keys keep their defaults.
	pub fn from_toml_str(content: &str, path: &Path) -> Result<Self> {
		let config: Self = toml::from_str(content).map_err(|source| Error::ConfigParse {
			path: path.to_path_buf(),
			source,
		})?;
		config.validate()?;
		Ok(config)
	}

	pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path).map_err(|source| Error::Read {
			path: path.to_path_buf(),
			source,
		})?;
		Self::from_toml_str(&content, path)
	}

	/// Checks value ranges.
	///
	/// # Errors
	/// `Error::InvalidConfig` if the deletion rate is NaN or outside `[0, 1]`.
	pub fn validate(&self) -> Result<()> {
		if !(0.0..=1.0).contains(&self.deletion_rate) {
			return Err(Error::InvalidConfig(format!(
				"deletion_rate must be between 0.0 and 1.0, got {}",
				self.deletion_rate
			)));
		}
		Ok(())
	}
}
