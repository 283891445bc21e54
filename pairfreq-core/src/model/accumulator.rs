use super::count_matrix::CountMatrix;
use super::symbol::{classify, Class, Symbol};

/// Chain state carried from one byte to the next within a single record.
///
/// A fresh `ChainState` must be used for every record: nothing is carried
/// across record boundaries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChainState {
	/// Last symbol seen, if the chain has not been broken since.
	previous: Option<Symbol>,
	/// Continuation bytes still to skip.
	lookahead: u8,
}

impl ChainState {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn previous(&self) -> Option<Symbol> {
		self.previous
	}

	pub fn lookahead(&self) -> u8 {
		self.lookahead
	}

	/// Feeds one byte through the classifier and applies the outcome.
	///
	/// Returns `true` if a transition was recorded in `counts`.
	pub fn step(&mut self, counts: &mut CountMatrix, byte: u8) -> bool {
		match classify(byte, &mut self.lookahead) {
			Class::Skip | Class::Transparent => false,
			Class::Break | Class::Lead(_) => {
				self.previous = None;
				false
			}
			Class::Symbol(current) => {
				let recorded = match self.previous {
					Some(previous) => {
						counts.record_transition(previous, current);
						true
					}
					None => false,
				};
				counts.record_marginal(current);
				self.previous = Some(current);
				recorded
			}
		}
	}
}

/// Runs one record through the classifier, updating `counts`.
///
/// Returns the number of transitions recorded for this record. A multi-byte
/// character cut short by the end of the record is silently dropped.
pub fn accumulate_record(counts: &mut CountMatrix, text: &[u8]) -> u64 {
	let mut chain = ChainState::new();
	let mut recorded = 0;
	for &byte in text {
		if chain.step(counts, byte) {
			recorded += 1;
		}
	}
	recorded
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::symbol::META_INDEX;
	use rand::rngs::StdRng;
	use rand::{Rng, SeedableRng};

	const A: usize = 67;
	const B: usize = 68;
	const LF: usize = 0;

	fn scan(text: &[u8]) -> (CountMatrix, u64) {
		let mut counts = CountMatrix::new();
		let recorded = accumulate_record(&mut counts, text);
		(counts, recorded)
	}

	#[test]
	fn line_feed_between_letters() {
		let (counts, recorded) = scan(b"a\nb");
		assert_eq!(recorded, 2);
		assert_eq!(counts.get(A, LF), 1);
		assert_eq!(counts.get(LF, B), 1);
		assert_eq!(counts.get(A, META_INDEX), 1);
		assert_eq!(counts.get(LF, META_INDEX), 1);
		assert_eq!(counts.get(B, META_INDEX), 1);
		assert_eq!(counts.total_transitions(), 2);
		assert_eq!(counts.total_marginals(), 3);
	}

	#[test]
	fn carriage_returns_are_transparent() {
		let (expected, expected_recorded) = scan(b"a\nb");
		for text in [&b"a\r\nb"[..], b"a\n\rb", b"\ra\r\r\nb\r"] {
			let (counts, recorded) = scan(text);
			assert_eq!(recorded, expected_recorded);
			assert_eq!(counts, expected);
		}
	}

	#[test]
	fn carriage_returns_are_transparent_anywhere() {
		let mut rng = StdRng::seed_from_u64(42);
		for _ in 0..200 {
			let len = rng.random_range(0..64);
			// Printable ASCII, tabs and line feeds, plus the odd break byte.
			let text: Vec<u8> = (0..len)
				.map(|_| match rng.random_range(0..10) {
					0 => b'\t',
					1 => b'\n',
					2 => 0x07,
					_ => rng.random_range(32..=126),
				})
				.collect();

			let mut with_cr = Vec::with_capacity(text.len() * 2);
			for &byte in &text {
				if rng.random_bool(0.3) {
					with_cr.push(b'\r');
				}
				with_cr.push(byte);
			}

			assert_eq!(scan(&text), scan(&with_cr));
		}
	}

	#[test]
	fn multi_byte_character_breaks_the_chain() {
		// "a€b"
		let (counts, recorded) = scan(&[0x61, 0xE2, 0x82, 0xAC, 0x62]);
		assert_eq!(recorded, 0);
		assert_eq!(counts.total_transitions(), 0);
		assert_eq!(counts.get(A, META_INDEX), 1);
		assert_eq!(counts.get(B, META_INDEX), 1);
	}

	#[test]
	fn continuation_bytes_are_skipped_whatever_they_are() {
		// A two-byte lead swallows the following 'x' even though it is ASCII.
		let (counts, recorded) = scan(b"a\xC3xb");
		assert_eq!(recorded, 0);
		assert_eq!(counts.get(A, META_INDEX), 1);
		assert_eq!(counts.get(B, META_INDEX), 1);
		assert_eq!(counts.get(b'x' as usize - 30, META_INDEX), 0);
	}

	#[test]
	fn truncated_sequence_at_end_of_record() {
		let (counts, recorded) = scan(b"ab\xF0\x9F");
		assert_eq!(recorded, 1);
		assert_eq!(counts.get(A, B), 1);
	}

	#[test]
	fn break_byte_resets_previous_symbol() {
		let (counts, recorded) = scan(b"a\x00b");
		assert_eq!(recorded, 0);
		assert_eq!(counts.total_marginals(), 2);
	}

	#[test]
	fn transparent_byte_keeps_chain_state() {
		let mut counts = CountMatrix::new();
		let mut chain = ChainState::new();
		chain.step(&mut counts, b'a');
		let before = chain;
		assert!(!chain.step(&mut counts, b'\r'));
		assert_eq!(chain, before);
	}

	#[test]
	fn lead_byte_sets_lookahead_and_clears_previous() {
		let mut counts = CountMatrix::new();
		let mut chain = ChainState::new();
		chain.step(&mut counts, b'a');
		chain.step(&mut counts, 0xF0);
		assert_eq!(chain.previous(), None);
		assert_eq!(chain.lookahead(), 3);
	}

	#[test]
	fn records_split_lose_exactly_the_boundary_transition() {
		let first = b"int x;\n";
		let second = b"\treturn x;";

		let mut split = CountMatrix::new();
		let split_recorded = accumulate_record(&mut split, first) + accumulate_record(&mut split, second);

		let joined_text = [&first[..], &second[..]].concat();
		let (joined, joined_recorded) = scan(&joined_text);

		assert_eq!(joined_recorded, split_recorded + 1);

		// Adding the boundary transition back makes the matrices identical.
		let boundary_row = Symbol::LINE_FEED.index();
		let boundary_col = Symbol::TAB.index();
		assert_eq!(joined.get(boundary_row, boundary_col), split.get(boundary_row, boundary_col) + 1);
		let mut boundary = CountMatrix::new();
		boundary.record_transition(Symbol::LINE_FEED, Symbol::TAB);
		split.merge(&boundary);
		assert_eq!(joined, split);
	}
}
