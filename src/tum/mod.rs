//! Table Uniformity Method (TUM) dialect sniffing.
//!
//! Every delimiter/quote pair is tried: the sample is parsed with it and the
//! resulting table scored on how uniform its rows are and how consistently
//! typed its columns are. The best-scoring pair wins. Based on "Wrangling
//! Messy CSV Files by Detecting Row and Type Patterns" by van den Burg,
//! Nazábal, and Sutton (2019).

pub mod cell;
pub mod score;
pub mod table;

use foldhash::HashSet;

use self::cell::{CellType, detect_cell_type};
use self::score::{QuoteCounts, find_best, score_candidate};
use self::table::{Candidate, Table, parse_table};
use crate::dialect::{LineTerminator, Quote, StrategyKind};
use crate::error::{CommaError, Result};
use crate::sniffer::{DialectStrategy, SniffedDialect, normalize_line_endings};

/// Delimiters tried when the caller does not restrict them, most common
/// first. Colon is left out since it shows up in every time value.
pub const DEFAULT_DELIMITERS: &[u8] = b",;\t| ^~#&/";

/// Quote configurations tried for every delimiter.
pub const QUOTES: &[Quote] = &[Quote::Some(b'"'), Quote::Some(b'\''), Quote::None];

/// Records parsed per candidate.
const MAX_ROWS: usize = 1000;

/// Average per-check score above which the first row is a header.
const HEADER_THRESHOLD: f64 = 0.4;

/// The advanced strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct TumStrategy;

impl DialectStrategy for TumStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Advanced
    }

    fn sniff(
        &self,
        sample: &[u8],
        line_terminator: LineTerminator,
        delimiters: Option<&[u8]>,
    ) -> Result<SniffedDialect> {
        let data = normalize_line_endings(sample, line_terminator);
        let quotes = QuoteCounts::new(&data);

        let scores: Vec<_> = delimiters
            .unwrap_or(DEFAULT_DELIMITERS)
            .iter()
            .flat_map(|&d| QUOTES.iter().map(move |&q| Candidate::new(d, q)))
            .map(|candidate| score_candidate(&data, candidate, MAX_ROWS, &quotes))
            .collect();

        let best = find_best(&scores).ok_or_else(|| {
            CommaError::DetectionFailure("no candidate dialect parsed the sample".to_string())
        })?;
        tracing::debug!(
            delimiter = ?(best.candidate.delimiter as char),
            quote = %best.candidate.quote,
            gamma = best.gamma,
            candidates = scores.len(),
            "best candidate dialect"
        );

        let table = parse_table(&data, best.candidate, MAX_ROWS);
        if table.is_empty() {
            return Err(CommaError::EmptyData);
        }

        Ok(SniffedDialect {
            delimiter: best.candidate.delimiter,
            quote: best.candidate.quote,
            has_header: detect_header(&table),
            skip_initial_space: skips_initial_space(&table),
        })
    }
}

/// Score the first row against the second on four header traits:
/// more text cells, more text than numbers, unique values, and values no
/// longer than the data below.
fn detect_header(table: &Table) -> bool {
    let [first, second, ..] = table.rows.as_slice() else {
        return false;
    };

    let first_types: Vec<CellType> = first.iter().map(|s| detect_cell_type(s)).collect();
    let count_text =
        |types: &[CellType]| types.iter().filter(|&&t| t == CellType::Text).count();
    let first_text = count_text(&first_types);
    let second_text = count_text(
        &second
            .iter()
            .map(|s| detect_cell_type(s))
            .collect::<Vec<_>>(),
    );
    let first_numeric = first_types.iter().filter(|t| t.is_numeric()).count();

    let mut seen = HashSet::default();
    let unique = first.iter().all(|s| seen.insert(s.as_str()));

    let avg_len = |row: &[String]| {
        row.iter().map(String::len).sum::<usize>() as f64 / row.len().max(1) as f64
    };

    let checks = [
        (first_text > second_text, 1.0),
        (first_text > first_numeric, 0.5),
        (unique, 0.5),
        (avg_len(first) <= avg_len(second), 0.3),
    ];
    let score: f64 = checks.iter().filter(|(hit, _)| *hit).map(|(_, w)| w).sum();

    score / checks.len() as f64 > HEADER_THRESHOLD
}

/// True when every field after the first, on every multi-field row, starts
/// with a space.
fn skips_initial_space(table: &Table) -> bool {
    let mut fields = table
        .rows
        .iter()
        .filter(|row| row.len() > 1)
        .flat_map(|row| &row[1..])
        .peekable();
    fields.peek().is_some() && fields.all(|f| f.starts_with(' '))
}
