//! core::codec
//!
//! Arbitrary-base numeral conversion.
//!
//! # Overview
//!
//! An [`Alphabet`] is an ordered set of distinct symbols; a symbol's position
//! is its digit value. [`convert`] reinterprets a numeral written in one
//! alphabet as a numeral in another, using arbitrary-precision arithmetic so
//! that codes for busy domains never overflow.
//!
//! [`Codec`] binds a single configured alphabet and is what the allocator
//! uses to render counter values as scope ids.
//!
//! # Example
//!
//! ```
//! use linkcode::core::codec::{convert, Alphabet, Codec, BASE62, DECIMAL};
//!
//! let decimal = Alphabet::new(DECIMAL).unwrap();
//! let base62 = Alphabet::new(BASE62).unwrap();
//! assert_eq!(convert("61", &decimal, &base62).unwrap(), "z");
//! assert_eq!(convert("62", &decimal, &base62).unwrap(), "10");
//!
//! let codec = Codec::base62();
//! assert_eq!(codec.render(3843), "zz");
//! ```

use std::collections::HashSet;
use std::fmt;

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use thiserror::Error;

/// Decimal digits, the alphabet counters are kept in.
pub const DECIMAL: &str = "0123456789";

/// Upper-case hexadecimal digits.
pub const HEX: &str = "0123456789ABCDEF";

/// Digits followed by upper-case letters.
pub const BASE36: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Digits, upper-case, then lower-case letters. The default code alphabet.
pub const BASE62: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Errors from numeral conversion.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    /// The alphabet repeats a symbol or is too small to be positional.
    #[error("invalid alphabet: {0}")]
    InvalidAlphabet(String),

    /// The value contains a symbol outside the source alphabet.
    #[error("invalid digit '{digit}' at position {position}")]
    InvalidDigit {
        /// The offending symbol
        digit: char,
        /// Zero-based symbol position in the value
        position: usize,
    },
}

/// An ordered set of pairwise-distinct symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Vec<char>,
}

impl Alphabet {
    /// Build an alphabet from its symbols in digit order.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidAlphabet`] if a symbol repeats or the
    /// alphabet has fewer than two symbols.
    pub fn new(symbols: &str) -> Result<Self, CodecError> {
        let symbols: Vec<char> = symbols.chars().collect();

        if symbols.len() < 2 {
            return Err(CodecError::InvalidAlphabet(format!(
                "need at least 2 symbols, got {}",
                symbols.len()
            )));
        }

        for (i, sym) in symbols.iter().enumerate() {
            if symbols[..i].contains(sym) {
                return Err(CodecError::InvalidAlphabet(format!(
                    "symbol '{}' appears more than once",
                    sym
                )));
            }
        }

        Ok(Self { symbols })
    }

    /// Number of symbols, i.e. the numeric base.
    pub fn base(&self) -> usize {
        self.symbols.len()
    }

    /// Digit value of a symbol, if it belongs to the alphabet.
    pub fn digit_of(&self, symbol: char) -> Option<usize> {
        self.symbols.iter().position(|s| *s == symbol)
    }

    /// Whether the symbol belongs to the alphabet.
    pub fn contains(&self, symbol: char) -> bool {
        self.symbols.contains(&symbol)
    }

    /// The symbol for digit zero.
    pub fn zero(&self) -> char {
        self.symbols[0]
    }

    /// Parse a numeral in this alphabet into an integer.
    ///
    /// The empty string parses as zero.
    pub fn parse(&self, value: &str) -> Result<BigUint, CodecError> {
        let base = BigUint::from(self.base());
        let mut num = BigUint::zero();

        for (position, digit) in value.chars().enumerate() {
            let d = self
                .digit_of(digit)
                .ok_or(CodecError::InvalidDigit { digit, position })?;
            num = num * &base + BigUint::from(d);
        }

        Ok(num)
    }

    /// Render an integer as a numeral in this alphabet.
    pub fn render(&self, value: &BigUint) -> String {
        if value.is_zero() {
            return self.zero().to_string();
        }

        let base = BigUint::from(self.base());
        let mut num = value.clone();
        let mut digits = Vec::new();

        while !num.is_zero() {
            let rem = (&num % &base).to_usize().unwrap_or_default();
            digits.push(self.symbols[rem]);
            num /= &base;
        }

        digits.iter().rev().collect()
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for sym in &self.symbols {
            write!(f, "{}", sym)?;
        }
        Ok(())
    }
}

/// Convert a numeral between two alphabets.
///
/// Zero renders as the first symbol of `to`. No leading zero symbols are
/// emitted for non-zero values.
///
/// # Errors
///
/// Returns [`CodecError::InvalidDigit`] if `value` contains a symbol outside
/// `from`.
pub fn convert(value: &str, from: &Alphabet, to: &Alphabet) -> Result<String, CodecError> {
    let num = from.parse(value)?;
    Ok(to.render(&num))
}

/// Convert a numeral between two alphabets given as raw symbol strings.
///
/// # Errors
///
/// Returns [`CodecError::InvalidAlphabet`] if either alphabet is invalid, and
/// [`CodecError::InvalidDigit`] if `value` contains a symbol outside `from`.
pub fn convert_str(value: &str, from: &str, to: &str) -> Result<String, CodecError> {
    let from = Alphabet::new(from)?;
    let to = Alphabet::new(to)?;
    convert(value, &from, &to)
}

/// Why a candidate alphabet does not describe a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The candidate lists a symbol twice.
    DuplicateSymbol(char),
    /// The value contains a symbol the candidate lacks.
    ForeignSymbol(char),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::DuplicateSymbol(c) => write!(f, "symbol '{}' appears more than once", c),
            Rejection::ForeignSymbol(c) => write!(f, "symbol '{}' not in alphabet", c),
        }
    }
}

/// Outcome of testing one candidate alphabet against a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateOutcome {
    /// Position of the candidate in the input list
    pub index: usize,
    /// The candidate as given
    pub candidate: String,
    /// `Ok` with the candidate's base when every symbol of the value belongs to it
    pub verdict: Result<usize, Rejection>,
}

impl CandidateOutcome {
    /// Whether the candidate describes the value.
    pub fn is_accepted(&self) -> bool {
        self.verdict.is_ok()
    }
}

/// A candidate alphabet that describes a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detected {
    /// The matching candidate's symbols
    pub candidate: String,
    /// Position of the candidate in the input list
    pub index: usize,
}

/// Test every candidate alphabet against a value.
///
/// Detection only asks whether the value could be written in the candidate,
/// so a candidate is rejected for repeated symbols or for missing one of the
/// value's symbols. Candidates too small to convert with (one symbol, or
/// none when the value is empty) are still accepted.
///
/// Returns one outcome per candidate, in candidate order.
pub fn examine_candidates<S: AsRef<str>>(value: &str, candidates: &[S]) -> Vec<CandidateOutcome> {
    candidates
        .iter()
        .enumerate()
        .map(|(index, candidate)| {
            let candidate = candidate.as_ref();
            CandidateOutcome {
                index,
                candidate: candidate.to_string(),
                verdict: judge_candidate(value, candidate),
            }
        })
        .collect()
}

fn judge_candidate(value: &str, candidate: &str) -> Result<usize, Rejection> {
    let mut symbols = HashSet::new();
    for symbol in candidate.chars() {
        if !symbols.insert(symbol) {
            return Err(Rejection::DuplicateSymbol(symbol));
        }
    }
    match value.chars().find(|c| !symbols.contains(c)) {
        Some(foreign) => Err(Rejection::ForeignSymbol(foreign)),
        None => Ok(symbols.len()),
    }
}

/// Candidate alphabets that could have produced a value.
///
/// Rejected candidates are skipped rather than reported.
pub fn detect_alphabets<S: AsRef<str>>(value: &str, candidates: &[S]) -> Vec<Detected> {
    examine_candidates(value, candidates)
        .into_iter()
        .filter(CandidateOutcome::is_accepted)
        .map(|outcome| Detected {
            candidate: outcome.candidate,
            index: outcome.index,
        })
        .collect()
}

/// A configured code alphabet.
///
/// Counter values are decimal; ids are their rendering in the code alphabet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Codec {
    decimal: Alphabet,
    alphabet: Alphabet,
}

impl Codec {
    /// Create a codec for the given code alphabet.
    pub fn new(alphabet: Alphabet) -> Self {
        Self {
            decimal: Alphabet::new(DECIMAL).expect("decimal alphabet is valid"),
            alphabet,
        }
    }

    /// Create a codec from raw alphabet symbols.
    pub fn from_symbols(symbols: &str) -> Result<Self, CodecError> {
        Ok(Self::new(Alphabet::new(symbols)?))
    }

    /// The base62 codec.
    pub fn base62() -> Self {
        Self::new(Alphabet::new(BASE62).expect("base62 alphabet is valid"))
    }

    /// The code alphabet.
    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// Render a counter value as an id.
    pub fn render(&self, value: u64) -> String {
        self.alphabet.render(&BigUint::from(value))
    }

    /// Render a decimal numeral of any length as an id.
    pub fn render_decimal(&self, value: &str) -> Result<String, CodecError> {
        convert(value, &self.decimal, &self.alphabet)
    }

    /// Decode an id back into its decimal numeral.
    pub fn to_decimal(&self, id: &str) -> Result<String, CodecError> {
        convert(id, &self.alphabet, &self.decimal)
    }

    /// Numeric value of an id, for ordering.
    pub fn value_of(&self, id: &str) -> Result<BigUint, CodecError> {
        self.alphabet.parse(id)
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::base62()
    }
}
