//! Dialect sniffing entry points.
//!
//! [`detect_csv_type`] and the [`Sniffer`] builder truncate the sample, detect
//! the line terminator, and hand the rest of the work to whichever
//! [`DialectStrategy`] the capabilities select.

use std::borrow::Cow;

use crate::capability::Capabilities;
use crate::dialect::{DetectionResult, LineTerminator, Quote, StrategyKind, detect_line_terminator};
use crate::encoding::skip_bom;
use crate::error::{CommaError, Result};
use crate::sample::SampleCap;

/// What a strategy infers from a sample. The line terminator is not part of it:
/// it always comes from [`detect_line_terminator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SniffedDialect {
    /// Field delimiter byte.
    pub delimiter: u8,
    /// Quote character configuration.
    pub quote: Quote,
    /// Whether the first row looks like a header.
    pub has_header: bool,
    /// Whether fields are padded with a space after the delimiter.
    pub skip_initial_space: bool,
}

/// A delimiter/quote/header inference strategy.
pub trait DialectStrategy: Send + Sync {
    /// Which strategy this is.
    fn kind(&self) -> StrategyKind;

    /// Infer the dialect of `sample`.
    ///
    /// `sample` is already truncated and stripped of any UTF-8 BOM. When
    /// `delimiters` is given, only those bytes are delimiter candidates.
    fn sniff(
        &self,
        sample: &[u8],
        line_terminator: LineTerminator,
        delimiters: Option<&[u8]>,
    ) -> Result<SniffedDialect>;
}

/// Infer the dialect of `sample` with the process-wide strategy and the
/// default sample cap.
///
/// # Example
///
/// ```
/// use comma_sniff::{LineTerminator, detect_csv_type};
///
/// let result = detect_csv_type(b"a,b,c\n1,2,3\n", None).unwrap();
/// assert_eq!(result.delimiter, ',');
/// assert_eq!(result.line_terminator, LineTerminator::LF);
/// ```
pub fn detect_csv_type(sample: &[u8], delimiters: Option<&[u8]>) -> Result<DetectionResult> {
    let mut sniffer = Sniffer::new();
    if let Some(delimiters) = delimiters {
        sniffer.delimiters(delimiters);
    }
    sniffer.sniff(sample)
}

/// Configurable dialect sniffer.
///
/// # Example
///
/// ```
/// use comma_sniff::{Capabilities, Sniffer, StrategyKind};
///
/// let mut sniffer = Sniffer::new();
/// sniffer
///     .sample_cap(4096)
///     .delimiters(b";|")
///     .capabilities(Capabilities::baseline());
///
/// let result = sniffer.sniff(b"a;b\n1;2\n3;4\n").unwrap();
/// assert_eq!(result.delimiter, ';');
/// assert_eq!(result.strategy_used, StrategyKind::Simple);
/// ```
#[derive(Debug, Clone)]
pub struct Sniffer {
    /// Maximum number of bytes examined.
    sample_cap: SampleCap,
    /// Optional restriction of the delimiter candidates.
    delimiters: Option<Vec<u8>>,
    /// Implementations to use.
    capabilities: Capabilities,
}

impl Default for Sniffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Sniffer {
    /// Create a new Sniffer with the default cap and the resolved capabilities.
    pub fn new() -> Self {
        Self {
            sample_cap: SampleCap::default(),
            delimiters: None,
            capabilities: *Capabilities::resolved(),
        }
    }

    /// Set the maximum number of bytes examined.
    pub fn sample_cap(&mut self, bytes: usize) -> &mut Self {
        self.sample_cap = SampleCap::new(bytes);
        self
    }

    /// Restrict the delimiter candidates.
    pub fn delimiters(&mut self, delimiters: &[u8]) -> &mut Self {
        self.delimiters = Some(delimiters.to_vec());
        self
    }

    /// Use explicit capabilities instead of the process-wide ones.
    pub fn capabilities(&mut self, capabilities: Capabilities) -> &mut Self {
        self.capabilities = capabilities;
        self
    }

    /// Sniff the dialect of `sample`.
    pub fn sniff(&self, sample: &[u8]) -> Result<DetectionResult> {
        let sample = skip_bom(self.sample_cap.truncate(sample));

        if sample.iter().all(u8::is_ascii_whitespace) {
            return Err(CommaError::EmptyData);
        }

        if let Some(delimiters) = &self.delimiters {
            if delimiters.is_empty() {
                return Err(CommaError::InvalidConfig(
                    "delimiter candidates must not be empty".to_string(),
                ));
            }
            if let Some(bad) = delimiters.iter().find(|&&d| !d.is_ascii() || is_line_byte(d)) {
                return Err(CommaError::InvalidConfig(format!(
                    "delimiter {bad:#04x} is not a usable ASCII delimiter"
                )));
            }
        }

        let line_terminator = detect_line_terminator(sample);
        let strategy = self.capabilities.dialect_strategy;
        let sniffed = strategy.sniff(sample, line_terminator, self.delimiters.as_deref())?;

        tracing::debug!(
            strategy = %strategy.kind(),
            delimiter = ?(sniffed.delimiter as char),
            quote = %sniffed.quote,
            has_header = sniffed.has_header,
            %line_terminator,
            "sniffed dialect"
        );

        Ok(DetectionResult {
            delimiter: char::from(sniffed.delimiter),
            quote: sniffed.quote,
            line_terminator,
            has_header: sniffed.has_header,
            skip_initial_space: sniffed.skip_initial_space,
            strategy_used: strategy.kind(),
        })
    }
}

fn is_line_byte(b: u8) -> bool {
    b == b'\n' || b == b'\r'
}

/// Normalize line endings to LF for consistent parsing.
///
/// Returns `Cow::Borrowed` for LF data and `Cow::Owned` for CR/CRLF.
pub(crate) fn normalize_line_endings(
    data: &[u8],
    line_terminator: LineTerminator,
) -> Cow<'_, [u8]> {
    match line_terminator {
        LineTerminator::LF => Cow::Borrowed(data),
        LineTerminator::CRLF => {
            let mut result = Vec::with_capacity(data.len());
            let mut bytes = data.iter().peekable();
            while let Some(&b) = bytes.next() {
                if b == b'\r' && bytes.peek() == Some(&&b'\n') {
                    continue;
                }
                result.push(b);
            }
            Cow::Owned(result)
        }
        LineTerminator::CR => Cow::Owned(
            data.iter()
                .map(|&b| if b == b'\r' { b'\n' } else { b })
                .collect(),
        ),
    }
}
