//! Cell value classification.

use std::sync::LazyLock;

use regex::Regex;

/// The kind of value a cell holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellType {
    Null,
    Unsigned,
    Signed,
    Boolean,
    Float,
    Date,
    DateTime,
    Text,
}

impl CellType {
    pub const COUNT: usize = 8;

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Unsigned | Self::Signed | Self::Float)
    }
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static cell pattern must compile")
}

static FLOAT: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^[-+]?(?:\d+\.?\d*|\d*\.?\d+)(?:[eE][-+]?\d+)?$"));
static FLOAT_THOUSANDS: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^[-+]?\d{1,3}(?:,\d{3})+(?:\.\d+)?$"));
static DATE: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"^(?:\d{4}[-/]\d{1,2}[-/]\d{1,2}|\d{1,2}[-/]\d{1,2}[-/]\d{2,4}|\d{1,2}\.\d{1,2}\.\d{2,4})$")
});
static DATETIME: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"^\d{1,4}[-/.]\d{1,2}[-/.]\d{1,4}[T ]\d{1,2}:\d{2}(?::\d{2})?(?:\.\d+)?(?:Z|[+-]\d{2}:?\d{2}|\s*(?i:am|pm))?$",
    )
});

/// Patterns for values that are not one of the base types but still carry a
/// recognizable shape, with how much each says about a correct split.
static SHAPES: LazyLock<Vec<(Regex, f64)>> = LazyLock::new(|| {
    [
        (r"^[-+]?\d+,\d+$", 0.9),
        (r"^\d{1,2}:\d{2}(?::\d{2})?(?:\.\d+)?(?:\s*(?i:am|pm))?$", 0.8),
        (r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$", 0.8),
        (r"^(?:https?|ftp)://[^\s/$.?#].[^\s]*$", 0.8),
        (r"^\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}$", 0.8),
        (r"^[$€£¥₹]\s*[-+]?[\d,]+\.?\d*$|^[-+]?[\d,]+\.?\d*\s*[$€£¥₹]$", 0.9),
        (r"^[-+]?\d+\.?\d*\s*%$", 0.9),
        (
            r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
            0.8,
        ),
        (r"^[A-Za-z0-9_-]+$", 0.3),
    ]
    .into_iter()
    .map(|(pattern, weight)| (compile(pattern), weight))
    .collect()
});

fn is_null(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "-" | "--"
            | "."
            | ".."
            | "?"
            | "null"
            | "nil"
            | "none"
            | "na"
            | "n/a"
            | "nan"
            | "#n/a"
            | "#value!"
            | "#ref!"
            | "#div/0!"
    )
}

/// Digits only, at most 19 of them so the value fits in 64 bits.
fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.len() <= 19 && s.bytes().all(|b| b.is_ascii_digit())
}

fn is_boolean(s: &str) -> bool {
    ["t", "f", "y", "n", "on", "no", "yes", "off", "true", "false"]
        .iter()
        .any(|b| s.eq_ignore_ascii_case(b))
}

/// Classify a single cell value.
pub fn detect_cell_type(value: &str) -> CellType {
    let s = value.trim();

    if s.is_empty() || is_null(s) {
        return CellType::Null;
    }
    if is_digits(s.strip_prefix('+').unwrap_or(s)) {
        return CellType::Unsigned;
    }
    if s.strip_prefix('-').is_some_and(is_digits) {
        return CellType::Signed;
    }
    if is_boolean(s) {
        return CellType::Boolean;
    }
    if (FLOAT.is_match(s) && s.contains(['.', 'e', 'E'])) || FLOAT_THOUSANDS.is_match(s) {
        return CellType::Float;
    }
    if DATETIME.is_match(s) {
        return CellType::DateTime;
    }
    if DATE.is_match(s) {
        return CellType::Date;
    }
    CellType::Text
}

/// How specific the shape of `value` is, from 0.0 (empty) to 1.0.
pub fn pattern_weight(value: &str) -> f64 {
    let s = value.trim();
    match detect_cell_type(s) {
        CellType::Null if s.is_empty() => 0.0,
        CellType::Null => 0.5,
        CellType::Text => SHAPES
            .iter()
            .find(|(pattern, _)| pattern.is_match(s))
            .map_or(0.1, |&(_, weight)| weight),
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_cell_type() {
        assert_eq!(detect_cell_type("123"), CellType::Unsigned);
        assert_eq!(detect_cell_type("+7"), CellType::Unsigned);
        assert_eq!(detect_cell_type("-123"), CellType::Signed);
        assert_eq!(detect_cell_type("12.34"), CellType::Float);
        assert_eq!(detect_cell_type("1,234,567.5"), CellType::Float);
        assert_eq!(detect_cell_type("1e6"), CellType::Float);
        assert_eq!(detect_cell_type("TRUE"), CellType::Boolean);
        assert_eq!(detect_cell_type("2023-12-31"), CellType::Date);
        assert_eq!(detect_cell_type("31.12.2023"), CellType::Date);
        assert_eq!(detect_cell_type("2023-12-31T12:30:45Z"), CellType::DateTime);
        assert_eq!(detect_cell_type("12/31/2023 10:15 PM"), CellType::DateTime);
        assert_eq!(detect_cell_type("hello"), CellType::Text);
        assert_eq!(detect_cell_type("  "), CellType::Null);
        assert_eq!(detect_cell_type("N/A"), CellType::Null);
    }

    #[test]
    fn test_is_numeric() {
        assert!(CellType::Float.is_numeric());
        assert!(CellType::Signed.is_numeric());
        assert!(!CellType::Boolean.is_numeric());
        assert!(!CellType::Date.is_numeric());
    }

    #[test]
    fn test_pattern_weight() {
        assert_eq!(pattern_weight(""), 0.0);
        assert_eq!(pattern_weight("NULL"), 0.5);
        assert_eq!(pattern_weight("42"), 1.0);
        assert_eq!(pattern_weight("12,5"), 0.9);
        assert_eq!(pattern_weight("user@example.com"), 0.8);
        assert_eq!(pattern_weight("item_42"), 0.3);
        assert_eq!(pattern_weight("two words"), 0.1);
    }
}
