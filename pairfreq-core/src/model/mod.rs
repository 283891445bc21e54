//! Top-level module for the symbol-transition pipeline.
//!
//! Data flows strictly downstream:
//! corpus → classifier (`symbol`) → accumulator → scanner → finalizer
//! (`probability_table`).

/// Byte classifier and the 97-symbol alphabet.
///
/// Maps one byte, given the pending UTF-8 lookahead, to a symbol, a chain
/// break, a lead byte, a skipped continuation byte or a transparent byte.
pub mod symbol;

/// The 98×98 table of transition and marginal counters.
///
/// Supports cell access, element-wise merging and a compact `postcard`
/// cache encoding.
pub mod count_matrix;

/// Per-record chain state and transition accumulation.
pub mod accumulator;

/// Budgeted corpus scanning.
///
/// Drives records from a `CorpusSource` through the accumulator until the
/// transition budget is exceeded or the corpus runs out.
pub mod scanner;

/// Scaling, normalization and (de)serialization of the final table.
pub mod probability_table;
