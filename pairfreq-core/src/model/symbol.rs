use std::fmt;

/// Number of distinct symbols in the alphabet (line feed, tab and the 95
/// printable ASCII characters).
pub const SYMBOL_COUNT: usize = 97;

/// Index of the meta column/row holding per-symbol occurrence counts.
///
/// It is never the target of a transition.
pub const META_INDEX: usize = 97;

/// Side length of the count matrix and of the probability table.
pub const TABLE_DIM: usize = SYMBOL_COUNT + 1;

/// Glyph printed for the meta index.
const META_GLYPH: char = '←';

/// One of the 97 alphabet classes a byte can map to.
///
/// - `0` = line feed
/// - `1` = horizontal tab
/// - `2..=96` = printable ASCII `32..=126` (`value = byte - 30`)
///
/// # Invariants
/// - The wrapped value is always `< SYMBOL_COUNT`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u8);

impl Symbol {
	pub const LINE_FEED: Symbol = Symbol(0);
	pub const TAB: Symbol = Symbol(1);

	/// Builds a symbol from its table index.
	///
	/// Returns `None` for any index outside the alphabet, including `META_INDEX`.
	pub fn from_index(index: usize) -> Option<Self> {
		if index < SYMBOL_COUNT {
			Some(Self(index as u8))
		} else {
			None
		}
	}

	/// Row/column of this symbol in the count matrix.
	pub fn index(self) -> usize {
		self.0 as usize
	}

	/// Printable glyph for this symbol.
	///
	/// Line feed and tab are shown as `↲` and `→`, every other symbol is the
	/// ASCII character it was classified from.
	pub fn glyph(self) -> char {
		match self.0 {
			0 => '↲',
			1 => '→',
			v => (v + 30) as char,
		}
	}
}

impl fmt::Display for Symbol {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.glyph())
	}
}

/// Glyph for any table index, including the meta index.
///
/// Returns `None` past the end of the table.
pub fn index_glyph(index: usize) -> Option<char> {
	if index == META_INDEX {
		return Some(META_GLYPH);
	}
	Symbol::from_index(index).map(Symbol::glyph)
}

/// Outcome of classifying a single byte.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Class {
	/// Continuation byte of a multi-byte character, consumed silently.
	Skip,
	/// Carriage return: no effect at all on the chain.
	Transparent,
	/// Byte outside the alphabet: the chain is broken.
	Break,
	/// Lead byte of a multi-byte character followed by `n` continuation bytes.
	/// The chain is broken as well.
	Lead(u8),
	/// Byte maps directly onto an alphabet symbol.
	Symbol(Symbol),
}

/// Classifies `byte` given the number of continuation bytes still expected.
///
/// Rules are evaluated in order, the first match wins:
/// 1. pending lookahead → `Skip` (the counter is decremented)
/// 2. `110xxxxx` → `Lead(1)`
/// 3. `1110xxxx` → `Lead(2)`
/// 4. `11110xxx` → `Lead(3)`
/// 5. `32..=126` → `Symbol(byte - 30)`
/// 6. tab → `Symbol(1)`
/// 7. line feed → `Symbol(0)`
/// 8. carriage return → `Transparent`
/// 9. anything else → `Break`
///
/// A `Lead` sets `lookahead` to its continuation count. Nothing checks that
/// the declared continuation bytes actually follow: they are skipped whatever
/// they are.
pub fn classify(byte: u8, lookahead: &mut u8) -> Class {
	if *lookahead > 0 {
		*lookahead -= 1;
		return Class::Skip;
	}

	let lead = match byte {
		b if b & 0b1110_0000 == 0b1100_0000 => 1,
		b if b & 0b1111_0000 == 0b1110_0000 => 2,
		b if b & 0b1111_1000 == 0b1111_0000 => 3,
		32..=126 => return Class::Symbol(Symbol(byte - 30)),
		b'\t' => return Class::Symbol(Symbol::TAB),
		b'\n' => return Class::Symbol(Symbol::LINE_FEED),
		b'\r' => return Class::Transparent,
		_ => return Class::Break,
	};

	*lookahead = lead;
	Class::Lead(lead)
}
