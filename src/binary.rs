//! Binary-versus-text classification of byte buffers.

use crate::encoding::{detect_encoding_by_bom, is_utf8_prefix};
use crate::sample::SampleCap;

/// Bytes considered text, following file(1): BEL, BS, TAB, LF, FF, CR, ESC and
/// everything from 0x20 upwards except DEL.
static TEXT_BYTES: [bool; 256] = {
    let mut table = [false; 256];
    let mut b = 0x20;
    while b < 256 {
        table[b] = b != 0x7F;
        b += 1;
    }
    table[0x07] = true;
    table[0x08] = true;
    table[b'\t' as usize] = true;
    table[b'\n' as usize] = true;
    table[0x0C] = true;
    table[b'\r' as usize] = true;
    table[0x1B] = true;
    table
};

/// Returns true if `byte` belongs to the text allow-set.
#[inline]
pub fn is_text_byte(byte: u8) -> bool {
    TEXT_BYTES[byte as usize]
}

/// Decides whether a sample of bytes is binary data.
pub trait BinaryClassifier: Send + Sync {
    /// Short name of the implementation, used in logs.
    fn name(&self) -> &'static str;

    /// Returns true if `sample` looks like binary data.
    fn is_binary(&self, sample: &[u8]) -> bool;
}

/// The built-in classifier: any byte outside the text allow-set means binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowSetClassifier;

impl BinaryClassifier for AllowSetClassifier {
    fn name(&self) -> &'static str {
        "allow-set"
    }

    fn is_binary(&self, sample: &[u8]) -> bool {
        sample.iter().any(|&b| !is_text_byte(b))
    }
}

/// Ratio-based classifier that tolerates Unicode text containing control bytes,
/// loosely modelled on binaryornot.
///
/// Looks at the share of non-printable ASCII bytes and of high bytes, then
/// lets a BOM or valid UTF-8 vouch for the sample before falling back to the
/// presence of NUL or 0xFF bytes.
#[cfg(feature = "heuristic-binary")]
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicClassifier;

#[cfg(feature = "heuristic-binary")]
impl HeuristicClassifier {
    /// Printable ASCII as understood by the heuristic, plus backspace.
    fn is_printable_ascii(byte: u8) -> bool {
        matches!(byte, 0x08 | b'\t' | b'\n' | 0x0B | 0x0C | b'\r' | 0x20..=0x7E)
    }
}

#[cfg(feature = "heuristic-binary")]
impl BinaryClassifier for HeuristicClassifier {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn is_binary(&self, sample: &[u8]) -> bool {
        if sample.is_empty() {
            return false;
        }

        let len = sample.len() as f64;
        let control = sample
            .iter()
            .filter(|&&b| b < 0x80 && !Self::is_printable_ascii(b))
            .count() as f64
            / len;
        let high = sample.iter().filter(|&&b| b >= 0x80).count() as f64 / len;

        if control > 0.9 && high > 0.9 {
            return true;
        }

        let likely_binary = (control > 0.3 && high < 0.05) || (control > 0.8 && high > 0.8);
        let decodable = detect_encoding_by_bom(sample).is_some_and(|name| name.has_bom())
            || (control < 0.3 && is_utf8_prefix(sample));

        if likely_binary {
            return !decodable;
        }
        if decodable {
            return false;
        }

        sample.contains(&0x00) || sample.contains(&0xFF)
    }
}

/// Classify `data` against the text allow-set with the default sample cap.
///
/// With `truncate`, only the first sample-cap bytes are examined. The result
/// does not depend on enabled features; [`Pipeline`](crate::Pipeline) and
/// [`is_binary_with`] use the other classifiers.
pub fn is_binary(data: &[u8], truncate: bool) -> bool {
    is_binary_with(data, truncate, &AllowSetClassifier, SampleCap::default())
}

/// Like [`is_binary`], but a missing buffer counts as text.
pub fn is_binary_opt(data: Option<&[u8]>, truncate: bool) -> bool {
    data.is_some_and(|data| is_binary(data, truncate))
}

/// Classify `data` with an explicit classifier and sample cap.
pub fn is_binary_with(
    data: &[u8],
    truncate: bool,
    classifier: &dyn BinaryClassifier,
    cap: SampleCap,
) -> bool {
    let sample = if truncate { cap.truncate(data) } else { data };
    let binary = classifier.is_binary(sample);
    tracing::debug!(
        classifier = classifier.name(),
        bytes = sample.len(),
        binary,
        "classified sample"
    );
    binary
}
