//! Frequency-based baseline dialect sniffer.
//!
//! Quoted fields are looked for first, since the characters around them give
//! away both the quote and the delimiter. Otherwise every ASCII character gets
//! a per-line frequency table, and the characters whose modal frequency holds
//! on (nearly) every line are the delimiter candidates.

use crate::dialect::{LineTerminator, Quote, StrategyKind};
use crate::error::{CommaError, Result};
use crate::sniffer::{DialectStrategy, SniffedDialect, normalize_line_endings};

/// Delimiters preferred when several are equally consistent.
const PREFERRED: &[u8] = b",\t; :";

/// Lines examined per round of the frequency analysis.
const CHUNK_LINES: usize = 10;

/// Data rows examined when deciding on a header.
const HEADER_CHECK_ROWS: usize = 20;

/// The baseline strategy, always available.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleStrategy;

impl DialectStrategy for SimpleStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Simple
    }

    fn sniff(
        &self,
        sample: &[u8],
        line_terminator: LineTerminator,
        delimiters: Option<&[u8]>,
    ) -> Result<SniffedDialect> {
        let data = normalize_line_endings(sample, line_terminator);
        let text = String::from_utf8_lossy(&data);

        let quoted = guess_quote_and_delimiter(&text, delimiters);
        let (delimiter, skip_initial_space) = match quoted.delimiter {
            Some(delimiter) => (delimiter, quoted.skip_initial_space),
            None => guess_delimiter(&text, delimiters).ok_or_else(|| {
                CommaError::DetectionFailure("could not determine delimiter".to_string())
            })?,
        };
        let quote = Quote::Some(quoted.quote.unwrap_or(b'"'));
        let has_header = has_header(&data, delimiter, quote, skip_initial_space);

        Ok(SniffedDialect {
            delimiter,
            quote,
            has_header,
            skip_initial_space,
        })
    }
}

/// Evidence gathered from quoted fields.
#[derive(Debug, Default, PartialEq, Eq)]
struct QuoteGuess {
    quote: Option<u8>,
    delimiter: Option<u8>,
    skip_initial_space: bool,
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// A character that may sit next to a quoted field as its delimiter.
fn is_delimiter_like(c: char) -> bool {
    !is_word(c) && c != '\n' && c != '"' && c != '\''
}

/// Look for quoted fields and the delimiters around them.
fn guess_quote_and_delimiter(text: &str, delimiters: Option<&[u8]>) -> QuoteGuess {
    let mut quote_counts = [0usize; 2];
    let mut delimiter_counts: Vec<(u8, usize)> = Vec::new();
    // Openings preceded by a delimiter, and how many of those had a space too.
    let mut openings = 0usize;
    let mut spaces = 0usize;

    let allowed = |c: char| c.is_ascii() && delimiters.is_none_or(|d| d.contains(&(c as u8)));

    for line in text.split('\n') {
        let chars: Vec<char> = line.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let q = chars[i];
            if q != '"' && q != '\'' {
                i += 1;
                continue;
            }

            // An opening quote sits at the start of the line, or after a
            // delimiter optionally followed by a single space.
            let (before, space) = match i {
                0 => (None, false),
                _ if chars[i - 1] == ' ' && i >= 2 && is_delimiter_like(chars[i - 2]) => {
                    (Some(chars[i - 2]), true)
                }
                _ if is_delimiter_like(chars[i - 1]) => (Some(chars[i - 1]), false),
                _ => {
                    i += 1;
                    continue;
                }
            };

            let Some(close) = chars[i + 1..]
                .iter()
                .position(|&c| c == q)
                .map(|p| p + i + 1)
            else {
                break;
            };

            // A closing quote must end the field.
            let after = chars.get(close + 1).copied();
            if after.is_some_and(|a| !is_delimiter_like(a)) {
                i += 1;
                continue;
            }

            let delimiter = match (before, after) {
                (Some(b), Some(a)) => (a == b).then_some(b),
                (Some(b), None) => Some(b),
                (None, Some(a)) => Some(a),
                (None, None) => None,
            };

            quote_counts[usize::from(q == '\'')] += 1;
            if let Some(d) = delimiter.filter(|&d| allowed(d)) {
                let d = d as u8;
                match delimiter_counts.iter_mut().find(|(c, _)| *c == d) {
                    Some((_, n)) => *n += 1,
                    None => delimiter_counts.push((d, 1)),
                }
            }
            if before.is_some() {
                openings += 1;
                if space {
                    spaces += 1;
                }
            }
            i = close + 1;
        }
    }

    if quote_counts == [0, 0] {
        return QuoteGuess::default();
    }

    let quote = if quote_counts[1] > quote_counts[0] {
        b'\''
    } else {
        b'"'
    };

    let best = delimiter_counts
        .iter()
        .fold(None::<(u8, usize)>, |best, &(d, n)| match best {
            Some((_, m)) if m >= n => best,
            _ => Some((d, n)),
        });

    QuoteGuess {
        quote: Some(quote),
        delimiter: best.map(|(d, _)| d),
        skip_initial_space: best.is_some() && openings > 0 && spaces == openings,
    }
}

/// Characters considered as delimiters when the caller gives no candidates.
fn is_default_candidate(c: u8) -> bool {
    (c.is_ascii_punctuation() && c != b'"' && c != b'\'') || c == b'\t' || c == b' '
}

/// Modal frequency of one character: how often it appears per line, and on
/// how many more lines than any other frequency.
#[derive(Debug, Clone, Copy)]
struct Mode {
    frequency: usize,
    weight: isize,
}

/// Pick the delimiter from per-line character frequencies.
fn guess_delimiter(text: &str, delimiters: Option<&[u8]>) -> Option<(u8, bool)> {
    let lines: Vec<&str> = text.split('\n').filter(|l| !l.is_empty()).collect();
    if lines.is_empty() {
        return None;
    }

    let chunk = CHUNK_LINES.min(lines.len());
    // For every ASCII char: (frequency, number of lines), in first-seen order.
    let mut frequencies: Vec<Vec<(usize, usize)>> = vec![Vec::new(); 128];
    let mut found: Vec<(u8, Mode)> = Vec::new();
    let mut start = 0;
    let mut iteration = 0;

    while start < lines.len() {
        iteration += 1;
        let end = (start + chunk).min(lines.len());

        for line in &lines[start..end] {
            let mut counts = [0usize; 128];
            for b in line.bytes().filter(u8::is_ascii) {
                counts[b as usize] += 1;
            }
            for (c, &freq) in counts.iter().enumerate() {
                let table = &mut frequencies[c];
                match table.iter_mut().find(|(f, _)| *f == freq) {
                    Some((_, n)) => *n += 1,
                    None => table.push((freq, 1)),
                }
            }
        }

        let modes: Vec<(u8, Mode)> = frequencies
            .iter()
            .enumerate()
            .filter_map(|(c, table)| {
                let c = u8::try_from(c).ok()?;
                mode_of(table).map(|m| (c, m))
            })
            .collect();

        let total = (chunk * iteration).min(lines.len()) as f64;
        let mut consistency = 1.0;
        while found.is_empty() && consistency >= 0.9 {
            for &(c, mode) in &modes {
                if mode.frequency > 0
                    && mode.weight > 0
                    && mode.weight as f64 / total >= consistency
                    && delimiters.map_or(is_default_candidate(c), |d| d.contains(&c))
                {
                    found.push((c, mode));
                }
            }
            consistency -= 0.01;
        }

        if let [(delimiter, _)] = found.as_slice() {
            return Some((*delimiter, skips_initial_space(lines[0], *delimiter)));
        }

        start = end;
    }

    if found.is_empty() {
        return None;
    }

    let delimiter = PREFERRED
        .iter()
        .copied()
        .find(|p| found.iter().any(|(c, _)| c == p))
        .or_else(|| {
            found
                .iter()
                .max_by_key(|(c, m)| (m.frequency, m.weight, *c))
                .map(|(c, _)| *c)
        })?;

    Some((delimiter, skips_initial_space(lines[0], delimiter)))
}

/// The modal frequency, weighted by how clearly it dominates.
fn mode_of(table: &[(usize, usize)]) -> Option<Mode> {
    match table {
        [] | [(0, _)] => None,
        [(frequency, n)] => Some(Mode {
            frequency: *frequency,
            weight: *n as isize,
        }),
        _ => {
            let (idx, &(frequency, n)) = table
                .iter()
                .enumerate()
                .fold(None::<(usize, &(usize, usize))>, |best, (i, entry)| match best {
                    Some((_, b)) if b.1 >= entry.1 => best,
                    _ => Some((i, entry)),
                })?;
            let others: usize = table
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != idx)
                .map(|(_, (_, count))| count)
                .sum();
            Some(Mode {
                frequency,
                weight: n as isize - others as isize,
            })
        }
    }
}

fn skips_initial_space(line: &str, delimiter: u8) -> bool {
    let delimiter = delimiter as char;
    let padded = format!("{delimiter} ");
    line.matches(delimiter).count() == line.matches(padded.as_str()).count()
}

/// What a column looks like across data rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnProfile {
    Numeric,
    Length(usize),
}

fn profile(cell: &str) -> ColumnProfile {
    if cell.trim().parse::<f64>().is_ok() {
        ColumnProfile::Numeric
    } else {
        ColumnProfile::Length(cell.chars().count())
    }
}

/// Vote on whether the first row is a header.
///
/// Columns whose data rows agree on a profile (numeric, or a fixed length) vote
/// for a header when the first row breaks that profile and against it when it
/// fits.
fn has_header(data: &[u8], delimiter: u8, quote: Quote, skip_initial_space: bool) -> bool {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true);
    if skip_initial_space {
        builder.trim(csv::Trim::Fields);
    }
    match quote {
        Quote::None => {
            builder.quoting(false);
        }
        Quote::Some(q) => {
            builder.quote(q);
        }
    }

    let mut records = builder.from_reader(data).into_records().map_while(|r| r.ok());
    let Some(header) = records.next() else {
        return false;
    };

    let mut columns: Vec<Option<Option<ColumnProfile>>> = vec![Some(None); header.len()];
    for row in records.take(HEADER_CHECK_ROWS + 1) {
        if row.len() != header.len() {
            continue;
        }
        for (column, cell) in columns.iter_mut().zip(row.iter()) {
            let this = profile(cell);
            match column {
                Some(None) => *column = Some(Some(this)),
                Some(Some(seen)) if *seen != this => *column = None,
                _ => {}
            }
        }
    }

    let votes: isize = columns
        .iter()
        .zip(header.iter())
        .map(|(column, name)| match column {
            Some(Some(ColumnProfile::Length(len))) if name.chars().count() != *len => 1,
            Some(Some(ColumnProfile::Length(_))) => -1,
            Some(Some(ColumnProfile::Numeric)) if profile(name) == ColumnProfile::Numeric => -1,
            Some(Some(ColumnProfile::Numeric)) => 1,
            _ => 0,
        })
        .sum();

    votes > 0
}
