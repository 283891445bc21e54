use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the scan / finalize pipeline.
///
/// Classification and accumulation never fail: every byte always has a
/// defined outcome. Only the edges of the pipeline (the corpus source,
/// configuration and the artifact on disk) can produce an `Error`, and all of
/// them are fatal for the run.
#[derive(Debug, Error)]
pub enum Error {
	/// The corpus source could not deliver its next record.
	#[error("failed to read corpus record from {origin}: {source}")]
	CorpusIo {
		origin: String,
		#[source]
		source: io::Error,
	},

	/// A JSON-lines record could not be parsed.
	#[error("malformed corpus record at {origin}:{line}: {source}")]
	CorpusJson {
		origin: String,
		line: u64,
		#[source]
		source: serde_json::Error,
	},

	/// A JSON-lines record has no string field with the configured name.
	#[error("corpus record at {origin}:{line} has no string field `{field}`")]
	MissingField { origin: String, line: u64, field: String },

	#[error("invalid configuration: {0}")]
	InvalidConfig(String),

	#[error("failed to parse configuration file {path}: {source}")]
	ConfigParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	/// The scaled count matrix sums to zero, so it cannot be normalized.
	#[error("cannot normalize an empty count matrix (no symbols were recorded)")]
	EmptyMatrix,

	#[error("failed to write {path}: {source}")]
	Write {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("failed to read {path}: {source}")]
	Read {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	/// A probability table file does not have the fixed artifact size.
	#[error("probability table must be exactly {expected} bytes, found {found}")]
	ArtifactSize { expected: usize, found: usize },

	#[error("count cache is corrupt: {0}")]
	CountCache(String),
}

pub type Result<T> = std::result::Result<T, Error>;
