use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{Error, Result};
use crate::io::list_files;

/// Field read from JSON-lines records when none is configured.
pub const DEFAULT_TEXT_FIELD: &str = "text";

/// One text record pulled from a corpus.
///
/// The text is kept as raw bytes: the classifier works on bytes and handles
/// malformed UTF-8 permissively, so nothing is validated here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
	pub text: Vec<u8>,
}

impl Record {
	pub fn as_bytes(&self) -> &[u8] {
		&self.text
	}
}

impl From<String> for Record {
	fn from(text: String) -> Self {
		Self { text: text.into_bytes() }
	}
}

impl From<&str> for Record {
	fn from(text: &str) -> Self {
		Self { text: text.as_bytes().to_vec() }
	}
}

impl From<Vec<u8>> for Record {
	fn from(text: Vec<u8>) -> Self {
		Self { text }
	}
}

/// A lazy, in-order, single-pass supply of text records.
///
/// # Contract
/// - `Ok(Some(record))`: the next record
/// - `Ok(None)`: the corpus is exhausted
/// - `Err(_)`: the record could not be fetched; the caller treats this as
///   fatal and never retries
pub trait CorpusSource {
	fn next_record(&mut self) -> Result<Option<Record>>;
}

impl<S: CorpusSource + ?Sized> CorpusSource for &mut S {
	fn next_record(&mut self) -> Result<Option<Record>> {
		(**self).next_record()
	}
}

impl<S: CorpusSource + ?Sized> CorpusSource for Box<S> {
	fn next_record(&mut self) -> Result<Option<Record>> {
		(**self).next_record()
	}
}

/// Adapts any iterator of record-like values into a [`CorpusSource`].
///
/// Never fails.
pub struct IterSource<I> {
	inner: I,
}

impl<I> IterSource<I>
where
	I: Iterator,
	I::Item: Into<Record>,
{
	pub fn new<T: IntoIterator<IntoIter = I>>(records: T) -> Self {
		Self { inner: records.into_iter() }
	}
}

impl<I> CorpusSource for IterSource<I>
where
	I: Iterator,
	I::Item: Into<Record>,
{
	fn next_record(&mut self) -> Result<Option<Record>> {
		Ok(self.inner.next().map(Into::into))
	}
}

/// Reads one JSON object per line and extracts a string field from each.
///
/// Blank lines are skipped. A line that is not valid JSON, or whose object
/// lacks the configured string field, is a fatal corpus error.
pub struct JsonLinesSource<R> {
	reader: R,
	origin: String,
	field: String,
	line: u64,
	buffer: String,
}

impl<R: BufRead> JsonLinesSource<R> {
	/// Wraps a reader. `origin` is only used in error messages.
	pub fn new(reader: R, origin: impl Into<String>, field: impl Into<String>) -> Self {
		Self {
			reader,
			origin: origin.into(),
			field: field.into(),
			line: 0,
			buffer: String::new(),
		}
	}

	/// Number of lines consumed so far.
	pub fn line(&self) -> u64 {
		self.line
	}
}

impl JsonLinesSource<BufReader<File>> {
	/// Opens a JSON-lines file.
	pub fn open<P: AsRef<Path>>(path: P, field: impl Into<String>) -> Result<Self> {
		let path = path.as_ref();
		let file = File::open(path).map_err(|source| Error::Read { path: path.to_path_buf(), source })?;
		Ok(Self::new(BufReader::new(file), path.display().to_string(), field))
	}
}

impl<R: BufRead> CorpusSource for JsonLinesSource<R> {
	fn next_record(&mut self) -> Result<Option<Record>> {
		loop {
			self.buffer.clear();
			let read = self.reader.read_line(&mut self.buffer).map_err(|source| Error::CorpusIo {
				origin: self.origin.clone(),
				source,
			})?;
			if read == 0 {
				return Ok(None);
			}
			self.line += 1;

			let line = self.buffer.trim();
			if line.is_empty() {
				continue;
			}

			let mut value: Value = serde_json::from_str(line).map_err(|source| Error::CorpusJson {
				origin: self.origin.clone(),
				line: self.line,
				source,
			})?;

			return match value.get_mut(&self.field).map(Value::take) {
				Some(Value::String(text)) => Ok(Some(Record::from(text))),
				_ => Err(Error::MissingField {
					origin: self.origin.clone(),
					line: self.line,
					field: self.field.clone(),
				}),
			};
		}
	}
}

/// Treats every file with a given extension in a directory as one record.
///
/// Files are visited in name order and read as raw bytes.
pub struct TextFileSource {
	files: VecDeque<PathBuf>,
}

impl TextFileSource {
	/// Lists the matching files in `dir` up front; the files themselves are
	/// read lazily, one per call to `next_record`.
	pub fn new<P: AsRef<Path>>(dir: P, extension: &str) -> Result<Self> {
		let dir = dir.as_ref();
		let files = list_files(dir, extension).map_err(|source| Error::CorpusIo {
			origin: dir.display().to_string(),
			source,
		})?;
		Ok(Self { files: files.into() })
	}

	/// Files not yet read.
	pub fn remaining(&self) -> usize {
		self.files.len()
	}
}

impl CorpusSource for TextFileSource {
	fn next_record(&mut self) -> Result<Option<Record>> {
		let Some(path) = self.files.pop_front() else {
			return Ok(None);
		};
		let text = std::fs::read(&path).map_err(|source| Error::CorpusIo {
			origin: path.display().to_string(),
			source,
		})?;
		Ok(Some(Record::from(text)))
	}
}

/// Opens standard input as a JSON-lines corpus.
pub fn stdin_json_lines(field: impl Into<String>) -> JsonLinesSource<io::StdinLock<'static>> {
	JsonLinesSource::new(io::stdin().lock(), "<stdin>", field)
}
