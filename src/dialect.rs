//! Dialect parameters produced by the sniffers.

use std::fmt;

use crate::table_metadata::Params;

/// Quote character configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quote {
    /// No quoting.
    None,
    /// Quote with the specified character.
    Some(u8),
}

impl Default for Quote {
    fn default() -> Self {
        Quote::Some(b'"')
    }
}

impl Quote {
    /// Returns the quote byte if set.
    pub fn byte(&self) -> Option<u8> {
        match self {
            Quote::None => None,
            Quote::Some(c) => Some(*c),
        }
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quote::None => write!(f, "none"),
            Quote::Some(c) => write!(f, "{}", *c as char),
        }
    }
}

/// Line terminator sequences.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineTerminator {
    /// Unix-style line ending (\n).
    #[default]
    LF,
    /// Windows-style line ending (\r\n).
    CRLF,
    /// Old Mac-style line ending (\r).
    CR,
}

impl LineTerminator {
    /// Returns the byte sequence for this line terminator.
    pub const fn as_bytes(&self) -> &'static [u8] {
        match self {
            LineTerminator::LF => b"\n",
            LineTerminator::CRLF => b"\r\n",
            LineTerminator::CR => b"\r",
        }
    }

    /// Returns the escaped string representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            LineTerminator::LF => "\\n",
            LineTerminator::CRLF => "\\r\\n",
            LineTerminator::CR => "\\r",
        }
    }
}

impl fmt::Display for LineTerminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect the most likely line terminator from data.
///
/// CRLF wins when present and not outnumbered, then LF, then CR. Data with no
/// line terminator at all reports LF.
pub fn detect_line_terminator(data: &[u8]) -> LineTerminator {
    let mut crlf_count = 0usize;
    let mut lf_count = 0usize;
    let mut cr_count = 0usize;

    let mut bytes = data.iter().peekable();
    while let Some(&b) = bytes.next() {
        match b {
            b'\r' if bytes.peek() == Some(&&b'\n') => {
                bytes.next();
                crlf_count += 1;
            }
            b'\r' => cr_count += 1,
            b'\n' => lf_count += 1,
            _ => {}
        }
    }

    if crlf_count > 0 && crlf_count >= lf_count && crlf_count >= cr_count {
        LineTerminator::CRLF
    } else if lf_count >= cr_count {
        LineTerminator::LF
    } else {
        LineTerminator::CR
    }
}

/// Which dialect strategy produced a [`DetectionResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// Frequency-based baseline sniffer.
    Simple,
    /// Table Uniformity Method sniffer.
    Advanced,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Simple => write!(f, "simple"),
            StrategyKind::Advanced => write!(f, "advanced"),
        }
    }
}

/// The outcome of one sniff call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionResult {
    /// Field delimiter character.
    pub delimiter: char,
    /// Quote character configuration.
    pub quote: Quote,
    /// Line terminator, always taken from [`detect_line_terminator`].
    pub line_terminator: LineTerminator,
    /// Whether the first row looks like a header.
    pub has_header: bool,
    /// Whether fields are padded with a space after the delimiter.
    pub skip_initial_space: bool,
    /// The strategy that produced this result.
    pub strategy_used: StrategyKind,
}

impl DetectionResult {
    /// Returns the quote character, if quoting was detected.
    pub fn quote_char(&self) -> Option<char> {
        self.quote.byte().map(char::from)
    }

    /// Returns the delimiter as a byte, for use with byte-oriented CSV readers.
    ///
    /// Every candidate delimiter is ASCII, so this never loses information.
    pub fn delimiter_byte(&self) -> u8 {
        u8::try_from(self.delimiter).unwrap_or(b',')
    }

    /// Flatten the dialect into string parameters for [`crate::TableMetadata`].
    pub fn to_params(&self) -> Params {
        let mut params = Params::new();
        params.insert("delimiter".to_string(), self.delimiter.to_string());
        params.insert("quote_char".to_string(), self.quote.to_string());
        params.insert(
            "line_terminator".to_string(),
            self.line_terminator.as_str().to_string(),
        );
        params.insert("has_header".to_string(), self.has_header.to_string());
        params.insert(
            "skip_initial_space".to_string(),
            self.skip_initial_space.to_string(),
        );
        params.insert("strategy".to_string(), self.strategy_used.to_string());
        params
    }
}
