// ── Voucher code generation ──
//
// Codes look like `PREFIX_BODY` or `PREFIX_BODY_SUFFIX`. The body is
// drawn uniformly from a validated charset, so generation itself cannot
// fail. Uniqueness is the caller's problem (see `issue`).

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use thiserror::Error;

pub const DEFAULT_CHARSET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
pub const DEFAULT_BODY_LENGTH: usize = 6;
pub const SEPARATOR: char = '_';

// ── Charset ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CharsetError {
    #[error("charset is empty")]
    Empty,

    #[error("charset symbol {0:?} is not a printable ASCII character")]
    Unprintable(char),

    #[error("charset symbol {0:?} is reserved")]
    Reserved(char),
}

/// Non-empty set of distinct printable ASCII symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Charset(Vec<u8>);

impl Charset {
    /// Validate and deduplicate `symbols`, keeping first-seen order.
    ///
    /// The separator, quotes, and commas are rejected so codes survive
    /// export unquoted.
    pub fn new(symbols: &str) -> Result<Self, CharsetError> {
        let mut set = Vec::new();
        for ch in symbols.chars() {
            if !ch.is_ascii_graphic() {
                return Err(CharsetError::Unprintable(ch));
            }
            if matches!(ch, SEPARATOR | '"' | ',') {
                return Err(CharsetError::Reserved(ch));
            }
            // is_ascii_graphic guarantees a single byte
            let byte = u8::try_from(u32::from(ch)).map_err(|_| CharsetError::Unprintable(ch))?;
            if !set.contains(&byte) {
                set.push(byte);
            }
        }
        if set.is_empty() {
            return Err(CharsetError::Empty);
        }
        Ok(Self(set))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true for a constructed charset.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        // Only ASCII bytes are ever stored.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }

    /// Number of distinct bodies of `length` symbols, saturating.
    pub fn code_space(&self, length: usize) -> u128 {
        let base = u128::try_from(self.len()).unwrap_or(u128::MAX);
        let exp = u32::try_from(length).unwrap_or(u32::MAX);
        base.saturating_pow(exp)
    }

    fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> char {
        let idx = rng.gen_range(0..self.0.len());
        char::from(self.0[idx])
    }
}

impl Default for Charset {
    fn default() -> Self {
        Self(DEFAULT_CHARSET.as_bytes().to_vec())
    }
}

impl FromStr for Charset {
    type Err = CharsetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Template ────────────────────────────────────────────────────────

/// Shape of a generated code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeTemplate {
    pub prefix: String,
    pub body_length: usize,
    pub charset: Charset,
    pub suffix: Option<String>,
}

impl CodeTemplate {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            body_length: DEFAULT_BODY_LENGTH,
            charset: Charset::default(),
            suffix: None,
        }
    }

    pub fn with_suffix(mut self, suffix: Option<String>) -> Self {
        self.suffix = suffix.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn with_body(mut self, charset: Charset, body_length: usize) -> Self {
        self.charset = charset;
        self.body_length = body_length;
        self
    }

    /// How many distinct codes this template can produce.
    pub fn code_space(&self) -> u128 {
        self.charset.code_space(self.body_length)
    }

    pub fn generate(&self) -> String {
        self.generate_with(&mut rand::thread_rng())
    }

    /// Generate with a caller-supplied RNG (seeded in tests).
    pub fn generate_with<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let mut code = String::with_capacity(self.prefix.len() + self.body_length + 8);
        if !self.prefix.is_empty() {
            code.push_str(&self.prefix);
            code.push(SEPARATOR);
        }
        for _ in 0..self.body_length {
            code.push(self.charset.pick(rng));
        }
        if let Some(suffix) = &self.suffix {
            code.push(SEPARATOR);
            code.push_str(suffix);
        }
        code
    }
}

/// Generate one code from `template` using the thread-local RNG.
pub fn generate(template: &CodeTemplate) -> String {
    template.generate()
}
