//! Encoding detection and transcoding.
//!
//! Detection runs in two stages: a deterministic byte-order-mark and NUL-pattern
//! check over the first four bytes, then an optional statistical guess (backed by
//! chardetng) over the sample. When neither stage has an answer the caller's
//! default is returned.

use std::borrow::Cow;
use std::fmt;

use simdutf8::basic::from_utf8;

use crate::capability::Capabilities;
use crate::sample::SampleCap;

/// Encoding assumed when nothing in the data says otherwise.
pub const DEFAULT_ENCODING: &str = "utf-8";

const BOM_UTF8: &[u8] = &[0xEF, 0xBB, 0xBF];
const BOM_UTF16_LE: &[u8] = &[0xFF, 0xFE];
const BOM_UTF16_BE: &[u8] = &[0xFE, 0xFF];
const BOM_UTF32_LE: &[u8] = &[0xFF, 0xFE, 0x00, 0x00];
const BOM_UTF32_BE: &[u8] = &[0x00, 0x00, 0xFE, 0xFF];

/// Name of a text encoding, such as `"utf-8"` or `"utf-16-le"`.
///
/// Names produced by the BOM stage come from a closed set (the associated
/// constants); names produced by the statistical stage are lower-cased WHATWG
/// encoding names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EncodingName(Cow<'static, str>);

impl EncodingName {
    pub const UTF_8: EncodingName = EncodingName(Cow::Borrowed("utf-8"));
    pub const UTF_8_SIG: EncodingName = EncodingName(Cow::Borrowed("utf-8-sig"));
    pub const UTF_16: EncodingName = EncodingName(Cow::Borrowed("utf-16"));
    pub const UTF_16_LE: EncodingName = EncodingName(Cow::Borrowed("utf-16-le"));
    pub const UTF_16_BE: EncodingName = EncodingName(Cow::Borrowed("utf-16-be"));
    pub const UTF_32: EncodingName = EncodingName(Cow::Borrowed("utf-32"));
    pub const UTF_32_LE: EncodingName = EncodingName(Cow::Borrowed("utf-32-le"));
    pub const UTF_32_BE: EncodingName = EncodingName(Cow::Borrowed("utf-32-be"));
    pub const ASCII: EncodingName = EncodingName(Cow::Borrowed("ascii"));

    /// Create an encoding name. Names are stored lower-cased.
    pub fn new(name: impl Into<String>) -> Self {
        EncodingName(Cow::Owned(name.into().to_ascii_lowercase()))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode `data` to text according to this encoding.
    ///
    /// A leading byte-order mark is stripped and malformed sequences are replaced
    /// with U+FFFD. Unknown names fall back to lossy UTF-8.
    pub fn decode<'a>(&self, data: &'a [u8]) -> Cow<'a, str> {
        match self.as_str() {
            "utf-8" | "utf8" | "ascii" | "us-ascii" => decode_utf8(skip_bom(data)),
            "utf-8-sig" => decode_utf8(skip_bom(data)),
            "utf-16" => encoding_rs::UTF_16LE.decode(data).0,
            "utf-16-le" | "utf-16le" => encoding_rs::UTF_16LE.decode(data).0,
            "utf-16-be" | "utf-16be" => encoding_rs::UTF_16BE.decode(data).0,
            "utf-32" => {
                if data.starts_with(BOM_UTF32_BE) {
                    Cow::Owned(decode_utf32(&data[4..], false))
                } else {
                    let data = data.strip_prefix(BOM_UTF32_LE).unwrap_or(data);
                    Cow::Owned(decode_utf32(data, true))
                }
            }
            "utf-32-le" | "utf-32le" => {
                let data = data.strip_prefix(BOM_UTF32_LE).unwrap_or(data);
                Cow::Owned(decode_utf32(data, true))
            }
            "utf-32-be" | "utf-32be" => {
                let data = data.strip_prefix(BOM_UTF32_BE).unwrap_or(data);
                Cow::Owned(decode_utf32(data, false))
            }
            label => match encoding_rs::Encoding::for_label(label.as_bytes()) {
                Some(encoding) => encoding.decode(data).0,
                None => String::from_utf8_lossy(data),
            },
        }
    }

    /// Returns true for the names whose BOM is part of the data stream.
    pub fn has_bom(&self) -> bool {
        matches!(self.as_str(), "utf-8-sig" | "utf-16" | "utf-32")
    }
}

impl Default for EncodingName {
    fn default() -> Self {
        EncodingName::UTF_8
    }
}

impl fmt::Display for EncodingName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EncodingName {
    fn from(name: &str) -> Self {
        EncodingName::new(name)
    }
}

impl From<String> for EncodingName {
    fn from(name: String) -> Self {
        EncodingName::new(name)
    }
}

impl PartialEq<&str> for EncodingName {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl PartialEq<str> for EncodingName {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

/// A statistical encoding guesser, consulted when the BOM stage is inconclusive.
pub trait EncodingGuesser: Send + Sync {
    /// Short name of the implementation, used in logs.
    fn name(&self) -> &'static str;

    /// Guess the encoding of `sample`, or `None` when there is no signal.
    fn guess(&self, sample: &[u8]) -> Option<EncodingName>;
}

/// Guesser backed by chardetng.
#[cfg(feature = "chardet")]
#[derive(Debug, Clone, Copy, Default)]
pub struct ChardetGuesser;

#[cfg(feature = "chardet")]
impl EncodingGuesser for ChardetGuesser {
    fn name(&self) -> &'static str {
        "chardetng"
    }

    fn guess(&self, sample: &[u8]) -> Option<EncodingName> {
        if sample.is_empty() {
            return None;
        }
        if sample.is_ascii() {
            return Some(EncodingName::ASCII);
        }
        if is_utf8_prefix(sample) {
            return Some(EncodingName::UTF_8);
        }

        let mut detector = chardetng::EncodingDetector::new();
        detector.feed(sample, true);
        let encoding = detector.guess(None, true);
        Some(EncodingName::new(encoding.name()))
    }
}

/// Check if the given bytes are valid UTF-8.
///
/// Uses SIMD-accelerated validation for performance.
pub fn is_utf8(data: &[u8]) -> bool {
    from_utf8(data).is_ok()
}

/// Check if the bytes are valid UTF-8 except for a multi-byte sequence cut
/// short at the very end, as happens when a sample is truncated.
pub fn is_utf8_prefix(data: &[u8]) -> bool {
    match simdutf8::compat::from_utf8(data) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none() && data.len() - e.valid_up_to() < 4,
    }
}

/// Check if the data starts with a UTF-8 BOM (Byte Order Mark).
///
/// The UTF-8 BOM is the byte sequence: EF BB BF
pub fn has_utf8_bom(data: &[u8]) -> bool {
    data.starts_with(BOM_UTF8)
}

/// Skip the UTF-8 BOM if present and return the remaining data.
pub fn skip_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(BOM_UTF8).unwrap_or(data)
}

/// Detect the encoding from a byte-order mark or the NUL pattern of the first
/// four bytes.
///
/// Returns `None` when the first four bytes carry no signal.
pub fn detect_encoding_by_bom(data: &[u8]) -> Option<EncodingName> {
    let sample = &data[..data.len().min(4)];

    // The UTF-32 LE mark starts with the UTF-16 LE mark, so it goes first.
    if sample == BOM_UTF32_LE || sample == BOM_UTF32_BE {
        return Some(EncodingName::UTF_32);
    }
    if sample.starts_with(BOM_UTF8) {
        return Some(EncodingName::UTF_8_SIG);
    }
    if sample.starts_with(BOM_UTF16_LE) || sample.starts_with(BOM_UTF16_BE) {
        return Some(EncodingName::UTF_16);
    }

    let all_null = |bytes: &[u8]| bytes.iter().all(|&b| b == 0);
    match count_nulls(sample) {
        2 => {
            let even: Vec<u8> = sample.iter().step_by(2).copied().collect();
            let odd: Vec<u8> = sample.iter().skip(1).step_by(2).copied().collect();
            if even == [0, 0] {
                Some(EncodingName::UTF_16_BE)
            } else if odd == [0, 0] {
                Some(EncodingName::UTF_16_LE)
            } else {
                None
            }
        }
        3 => {
            if sample.len() >= 3 && all_null(&sample[..3]) {
                Some(EncodingName::UTF_32_BE)
            } else if sample.len() == 4 && all_null(&sample[1..]) {
                Some(EncodingName::UTF_32_LE)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn count_nulls(sample: &[u8]) -> usize {
    sample.iter().filter(|&&b| b == 0).count()
}

/// Detect the encoding of `data`, returning `default` when there is no signal.
///
/// Uses the process-wide capabilities and the default sample cap. This never
/// fails: empty or short input simply yields `default`.
pub fn detect_encoding(data: &[u8], default: &str) -> EncodingName {
    detect_encoding_with(
        data,
        default,
        Capabilities::resolved().encoding_guesser,
        SampleCap::default(),
    )
}

/// Detect the encoding with an explicit guesser and sample cap.
pub fn detect_encoding_with(
    data: &[u8],
    default: &str,
    guesser: Option<&dyn EncodingGuesser>,
    cap: SampleCap,
) -> EncodingName {
    if let Some(name) = detect_encoding_by_bom(data) {
        tracing::debug!(encoding = %name, "encoding detected from byte pattern");
        return name;
    }

    if let Some(guesser) = guesser
        && let Some(name) = guesser.guess(cap.truncate(data))
    {
        tracing::debug!(encoding = %name, guesser = guesser.name(), "encoding guessed");
        return name;
    }

    EncodingName::new(default)
}

/// Transcode `data` to UTF-8 bytes according to `encoding`.
///
/// Returns `Cow::Borrowed` when the data is already BOM-less valid UTF-8.
pub fn transcode<'a>(data: &'a [u8], encoding: &EncodingName) -> Cow<'a, [u8]> {
    match encoding.decode(data) {
        Cow::Borrowed(text) => Cow::Borrowed(text.as_bytes()),
        Cow::Owned(text) => Cow::Owned(text.into_bytes()),
    }
}

fn decode_utf8(data: &[u8]) -> Cow<'_, str> {
    match from_utf8(data) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => String::from_utf8_lossy(data),
    }
}

fn decode_utf32(data: &[u8], little_endian: bool) -> String {
    let chunks = data.chunks_exact(4);
    let has_tail = !chunks.remainder().is_empty();

    let mut text: String = chunks
        .map(|chunk| {
            let bytes = [chunk[0], chunk[1], chunk[2], chunk[3]];
            let code = if little_endian {
                u32::from_le_bytes(bytes)
            } else {
                u32::from_be_bytes(bytes)
            };
            char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
        })
        .collect();

    if has_tail {
        text.push(char::REPLACEMENT_CHARACTER);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_utf8() {
        assert!(is_utf8(b"Hello, World!"));
        assert!(is_utf8("こんにちは".as_bytes()));
        assert!(is_utf8(b""));
        assert!(!is_utf8(&[0xFF, 0xFE]));
        assert!(!is_utf8(&[0x80, 0x81, 0x82]));
    }

    #[test]
    fn test_is_utf8_prefix() {
        let text = "añb".as_bytes();
        // Cut inside the two-byte 'ñ'.
        assert!(!is_utf8(&text[..2]));
        assert!(is_utf8_prefix(&text[..2]));
        assert!(!is_utf8_prefix(&[b'a', 0xFF, b'b']));
    }

    #[test]
    fn test_utf8_bom() {
        let with_bom = [0xEF, 0xBB, 0xBF, b'a', b'b', b'c'];
        assert!(has_utf8_bom(&with_bom));
        assert!(!has_utf8_bom(b"abc"));
        assert_eq!(skip_bom(&with_bom), b"abc");
        assert_eq!(skip_bom(b"abc"), b"abc");
    }

    #[test]
    fn test_bom_detection() {
        assert_eq!(
            detect_encoding_by_bom(&[0xFF, 0xFE, 0x00, 0x00, b'a']),
            Some(EncodingName::UTF_32)
        );
        assert_eq!(
            detect_encoding_by_bom(&[0x00, 0x00, 0xFE, 0xFF]),
            Some(EncodingName::UTF_32)
        );
        assert_eq!(
            detect_encoding_by_bom(&[0xEF, 0xBB, 0xBF, b'a']),
            Some(EncodingName::UTF_8_SIG)
        );
        assert_eq!(
            detect_encoding_by_bom(&[0xFF, 0xFE, 0x00, b'a', 0x00, b'b']),
            Some(EncodingName::UTF_16)
        );
        assert_eq!(
            detect_encoding_by_bom(&[0xFE, 0xFF, b'a', 0x00]),
            Some(EncodingName::UTF_16)
        );
    }

    #[test]
    fn test_null_pattern_detection() {
        assert_eq!(
            detect_encoding_by_bom(&[0x00, b'a', 0x00, b'b']),
            Some(EncodingName::UTF_16_BE)
        );
        assert_eq!(
            detect_encoding_by_bom(&[b'a', 0x00, b'b', 0x00]),
            Some(EncodingName::UTF_16_LE)
        );
        assert_eq!(
            detect_encoding_by_bom(&[0x00, 0x00, 0x00, b'a']),
            Some(EncodingName::UTF_32_BE)
        );
        assert_eq!(
            detect_encoding_by_bom(&[b'a', 0x00, 0x00, 0x00]),
            Some(EncodingName::UTF_32_LE)
        );
    }

    #[test]
    fn test_inconclusive_patterns() {
        assert_eq!(detect_encoding_by_bom(b"abcd"), None);
        assert_eq!(detect_encoding_by_bom(b""), None);
        // Two NULs side by side fit neither UTF-16 byte order.
        assert_eq!(detect_encoding_by_bom(&[0x00, 0x00, b'a', b'b']), None);
        // Three NULs in the middle fit neither UTF-32 byte order.
        assert_eq!(detect_encoding_by_bom(&[0x00, 0x00, b'a', 0x00]), None);
        assert_eq!(detect_encoding_by_bom(&[0x00]), None);
    }

    #[test]
    fn test_default_when_no_signal() {
        assert_eq!(
            detect_encoding_with(b"", "latin-1", None, SampleCap::default()),
            "latin-1"
        );
        assert_eq!(
            detect_encoding_with(b"abc", "utf-8", None, SampleCap::default()),
            "utf-8"
        );
        assert_eq!(detect_encoding(b"", "cp1252"), "cp1252");
    }

    #[test]
    fn test_bom_wins_over_default() {
        let data = [0xFF, 0xFE, 0x00, b'a', 0x00, b'b'];
        assert_eq!(detect_encoding(&data, "latin-1"), "utf-16");
        assert_eq!(
            detect_encoding_with(&data, "latin-1", None, SampleCap::default()),
            "utf-16"
        );
    }

    #[cfg(feature = "chardet")]
    #[test]
    fn test_chardet_guesser() {
        let guesser = ChardetGuesser;
        assert_eq!(guesser.guess(b""), None);
        assert_eq!(guesser.guess(b"a,b\n1,2\n"), Some(EncodingName::ASCII));
        assert_eq!(
            guesser.guess("name\nMünchen\n".as_bytes()),
            Some(EncodingName::UTF_8)
        );

        // Windows-1251 encoded Cyrillic text: "Привет"
        let cp1251: &[u8] = &[0xCF, 0xF0, 0xE8, 0xE2, 0xE5, 0xF2];
        let guessed = guesser.guess(cp1251).unwrap();
        assert_ne!(guessed, EncodingName::UTF_8);
        assert_eq!(guessed.as_str(), guessed.as_str().to_ascii_lowercase());
    }

    #[test]
    fn test_decode_utf16() {
        let data: &[u8] = &[0xFF, 0xFE, b'H', 0x00, b'i', 0x00];
        assert_eq!(EncodingName::UTF_16.decode(data), "Hi");

        let be: &[u8] = &[0x00, b'H', 0x00, b'i'];
        assert_eq!(EncodingName::UTF_16_BE.decode(be), "Hi");
    }

    #[test]
    fn test_decode_utf32() {
        let le: &[u8] = &[0xFF, 0xFE, 0x00, 0x00, b'a', 0, 0, 0, b',', 0, 0, 0];
        assert_eq!(EncodingName::UTF_32.decode(le), "a,");

        let be: &[u8] = &[0, 0, 0, b'x', 0, 0, 0, b'y'];
        assert_eq!(EncodingName::UTF_32_BE.decode(be), "xy");

        let truncated: &[u8] = &[b'z', 0, 0, 0, b'q'];
        assert_eq!(EncodingName::UTF_32_LE.decode(truncated), "z\u{FFFD}");
    }

    #[test]
    fn test_decode_legacy_label() {
        // "Привет" in Windows-1251.
        let data: &[u8] = &[0xCF, 0xF0, 0xE8, 0xE2, 0xE5, 0xF2];
        assert_eq!(EncodingName::new("windows-1251").decode(data), "Привет");
    }

    #[test]
    fn test_transcode() {
        let data = b"Hello, World!";
        let result = transcode(data, &EncodingName::UTF_8);
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(&result[..], data);

        let with_bom = [0xEF, 0xBB, 0xBF, b'a'];
        assert_eq!(&transcode(&with_bom, &EncodingName::UTF_8_SIG)[..], b"a");

        let utf16: &[u8] = &[0xFF, 0xFE, b'H', 0x00, b'i', 0x00];
        let result = transcode(utf16, &EncodingName::UTF_16);
        assert!(is_utf8(&result));
        assert_eq!(&result[..], b"Hi");
    }
}
