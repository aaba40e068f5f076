//! Scoring candidate dialects.
//!
//! A candidate's gamma combines how uniform the parsed table is (`tau_0`,
//! `tau_1`) with how consistently typed its columns are, then applies
//! penalties for implausible shapes and a small adjustment for quote evidence.

use std::cmp::Ordering;

use super::cell::{CellType, detect_cell_type, pattern_weight};
use super::table::{Candidate, Table, parse_table};
use crate::dialect::Quote;

/// Two gammas closer than this ratio count as a tie.
const TIE_RATIO: f64 = 0.90;

/// Quote characters per 1000 bytes needed before quoting counts as evidence.
const QUOTE_DENSITY_THRESHOLD: usize = 5;

/// Quote characters counted once per sample.
#[derive(Debug, Clone, Copy)]
pub struct QuoteCounts {
    double: usize,
    single: usize,
    data_len: usize,
}

impl QuoteCounts {
    pub fn new(data: &[u8]) -> Self {
        Self {
            double: bytecount::count(data, b'"'),
            single: bytecount::count(data, b'\''),
            data_len: data.len(),
        }
    }

    /// Multiplier rewarding candidates whose quote character the data
    /// actually uses. Apostrophes in text are common, so single quotes need
    /// twice the density and no competing double quotes.
    fn multiplier(&self, quote: Quote) -> f64 {
        if self.data_len == 0 {
            return 1.0;
        }
        let double = self.double * 1000 / self.data_len;
        let single = self.single * 1000 / self.data_len;
        let quoted = double >= QUOTE_DENSITY_THRESHOLD;

        match quote {
            Quote::Some(b'"') if quoted => 1.03,
            Quote::Some(b'\'') if single >= QUOTE_DENSITY_THRESHOLD * 2 && !quoted => 1.05,
            Quote::Some(b'\'') if quoted => 0.95,
            Quote::None if quoted => 0.90,
            _ => 1.0,
        }
    }
}

/// The outcome of scoring one candidate.
#[derive(Debug, Clone)]
pub struct Score {
    pub candidate: Candidate,
    /// Combined score, higher is better.
    pub gamma: f64,
    /// Modal field count of the parsed table.
    pub num_fields: usize,
}

/// Consistency: `1 / (1 + 2σ)` over the field counts.
pub fn tau_0(table: &Table) -> f64 {
    if table.is_empty() {
        return 0.0;
    }
    let n = table.field_counts.len() as f64;
    let mean = table.field_counts.iter().sum::<usize>() as f64 / n;
    let variance = table
        .field_counts
        .iter()
        .map(|&fc| (fc as f64 - mean).powi(2))
        .sum::<f64>()
        / n;
    1.0 / 2.0f64.mul_add(variance.sqrt(), 1.0)
}

/// Dispersion: a blend of the field count range, the number of changes
/// between consecutive rows and the share of rows at the modal count.
pub fn tau_1(table: &Table) -> f64 {
    let n = table.field_counts.len();
    match n {
        0 => return 0.0,
        1 => return 1.0,
        _ => {}
    }

    let max = table.max_field_count();
    let range_score = if max == 0 {
        0.0
    } else {
        1.0 - ((max - table.min_field_count()) as f64 / max as f64).min(1.0)
    };

    let transitions = table.field_counts.windows(2).filter(|w| w[0] != w[1]).count();
    let transition_score = 1.0 - transitions as f64 / (n - 1) as f64;

    let mode_score = table.modal_field_count_freq() as f64 / n as f64;

    mode_score.mul_add(0.4, range_score * 0.3 + transition_score * 0.3)
}

/// Average per-column share of the dominant non-null type.
pub fn type_score(table: &Table) -> f64 {
    let num_cols = table.modal_field_count();
    if table.is_empty() || num_cols == 0 {
        return 0.0;
    }

    let mut counts = vec![[0usize; CellType::COUNT]; num_cols];
    for row in &table.rows {
        for (col, cell) in row.iter().enumerate().take(num_cols) {
            counts[col][detect_cell_type(cell).index()] += 1;
        }
    }

    let scores: Vec<f64> = counts
        .iter()
        .filter_map(|col| {
            let nulls = col[CellType::Null.index()];
            let total: usize = col.iter().sum();
            if total == 0 {
                return None;
            }
            if total == nulls {
                return Some(0.5);
            }
            let dominant = col
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != CellType::Null.index())
                .map(|(_, &c)| c)
                .max()
                .unwrap_or(0);
            Some(dominant as f64 / (total - nulls) as f64)
        })
        .filter(|&s| s > 0.0)
        .collect();

    if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}

/// Average pattern weight over every cell.
pub fn pattern_score(table: &Table) -> f64 {
    let (total, count) = table
        .rows
        .iter()
        .flatten()
        .fold((0.0, 0usize), |(total, count), cell| {
            (total + pattern_weight(cell), count + 1)
        });
    if count == 0 { 0.0 } else { total / count as f64 }
}

/// Penalty for delimiters that rarely separate fields in practice.
const fn delimiter_penalty(delimiter: u8) -> f64 {
    match delimiter {
        b',' | b';' | b'\t' => 1.0,
        b'|' => 0.98,
        b':' => 0.90,
        b'^' | b'~' => 0.80,
        b' ' => 0.75,
        b'/' => 0.65,
        b'#' | b'&' => 0.60,
        _ => 0.70,
    }
}

/// Higher is preferred when two candidates score about the same.
const fn delimiter_priority(delimiter: u8) -> u8 {
    match delimiter {
        b',' => 10,
        b';' => 9,
        b'\t' => 8,
        b'|' => 7,
        b':' => 4,
        b'^' | b'~' => 3,
        b'/' | b' ' => 2,
        b'#' | b'&' => 1,
        _ => 0,
    }
}

const fn quote_priority(quote: Quote) -> u8 {
    match quote {
        Quote::Some(b'"') => 3,
        Quote::Some(b'\'') => 2,
        Quote::None => 1,
        Quote::Some(_) => 0,
    }
}

/// Combined gamma score of a parsed table.
pub fn gamma(table: &Table, delimiter: u8) -> f64 {
    if table.is_empty() {
        return 0.0;
    }

    let uniformity = (tau_0(table) * tau_1(table)).sqrt();
    let rows = table.num_rows();
    let fields = table.modal_field_count();

    let row_bonus = (rows.min(20) as f64 / 20.0) * 0.1;
    let field_bonus = if fields >= 2 {
        (fields.min(10) as f64 / 10.0) * 0.2
    } else {
        0.0
    };

    let single_field = if fields == 1 { 0.5 } else { 1.0 };
    let wide = match fields {
        f if f > 100 => 0.5,
        f if f > 50 => 0.8,
        _ => 1.0,
    };
    let small_sample = match rows {
        r if r < 3 => 0.70,
        r if r < 5 => 0.85,
        _ => 1.0,
    };

    let raw = uniformity.mul_add(0.5, type_score(table) * 0.3)
        + pattern_score(table) * 0.1
        + row_bonus
        + field_bonus;

    raw * single_field * wide * small_sample * delimiter_penalty(delimiter)
}

/// Parse `data` with `candidate` and score the result.
pub fn score_candidate(
    data: &[u8],
    candidate: Candidate,
    max_rows: usize,
    quotes: &QuoteCounts,
) -> Score {
    let table = parse_table(data, candidate, max_rows);
    let gamma = if table.is_empty() {
        0.0
    } else {
        gamma(&table, candidate.delimiter) * quotes.multiplier(candidate.quote)
    };
    Score {
        candidate,
        gamma,
        num_fields: table.modal_field_count(),
    }
}

fn by_priority(a: &Score, b: &Score) -> Ordering {
    delimiter_priority(a.candidate.delimiter)
        .cmp(&delimiter_priority(b.candidate.delimiter))
        .then_with(|| quote_priority(a.candidate.quote).cmp(&quote_priority(b.candidate.quote)))
}

/// Pick the winning candidate.
///
/// When every candidate yields a single column, or two gammas are within
/// [`TIE_RATIO`] of each other, the more common delimiter and quote win.
pub fn find_best(scores: &[Score]) -> Option<&Score> {
    let all_single_field = scores
        .iter()
        .filter(|s| s.gamma > 0.0)
        .all(|s| s.num_fields <= 1);

    scores.iter().filter(|s| s.gamma > 0.0).max_by(|a, b| {
        if all_single_field {
            return by_priority(a, b);
        }
        let ratio = a.gamma.min(b.gamma) / a.gamma.max(b.gamma);
        if ratio > TIE_RATIO {
            by_priority(a, b).then_with(|| a.gamma.total_cmp(&b.gamma))
        } else {
            a.gamma.total_cmp(&b.gamma)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DQ: Quote = Quote::Some(b'"');

    fn score(data: &[u8], delimiter: u8, quote: Quote) -> Score {
        score_candidate(
            data,
            Candidate::new(delimiter, quote),
            100,
            &QuoteCounts::new(data),
        )
    }

    fn table(field_counts: &[usize]) -> Table {
        Table::from_rows(
            field_counts
                .iter()
                .map(|&n| vec!["x".to_string(); n])
                .collect(),
        )
    }

    #[test]
    fn test_tau_uniform() {
        let t = table(&[3, 3, 3, 3, 3]);
        assert!((tau_0(&t) - 1.0).abs() < 1e-9);
        assert!((tau_1(&t) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_tau_varied() {
        let t = table(&[3, 4, 3, 5, 3]);
        assert!(tau_0(&t) < 1.0 && tau_0(&t) > 0.0);
        assert!(tau_1(&t) < 1.0);
        assert_eq!(tau_0(&table(&[])), 0.0);
    }

    #[test]
    fn test_type_score() {
        let t = Table::from_rows(vec![
            vec!["1".into(), "a".into()],
            vec!["2".into(), "b".into()],
            vec!["x".into(), "".into()],
        ]);
        let s = type_score(&t);
        // First column two of three integers, second column all text.
        assert!((s - (2.0 / 3.0 + 1.0) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_wrong_delimiter_scores_lower() {
        let data = b"a,b,c\n1,2,3\n4,5,6\n";
        assert!(score(data, b',', DQ).gamma > score(data, b';', DQ).gamma);
    }

    #[test]
    fn test_quote_evidence() {
        let counts = QuoteCounts::new(b"\"a\",\"b\"\n\"1\",\"2\"\n");
        assert_eq!(counts.multiplier(DQ), 1.03);
        assert_eq!(counts.multiplier(Quote::Some(b'\'')), 0.95);
        assert_eq!(counts.multiplier(Quote::None), 0.90);

        let plain = QuoteCounts::new(b"a,b\n1,2\n");
        assert_eq!(plain.multiplier(DQ), 1.0);
        assert_eq!(plain.multiplier(Quote::None), 1.0);
    }

    #[test]
    fn test_find_best() {
        let data = b"a,b,c\n1,2,3\n4,5,6\n";
        let scores: Vec<Score> = [b',', b';', b'\t']
            .into_iter()
            .flat_map(|d| [DQ, Quote::Some(b'\''), Quote::None].map(|q| score(data, d, q)))
            .collect();

        let best = find_best(&scores).unwrap();
        assert_eq!(best.candidate, Candidate::new(b',', DQ));
    }

    #[test]
    fn test_find_best_single_column_prefers_comma() {
        let data = b"alpha\nbeta\ngamma\n";
        let scores: Vec<Score> = [b'|', b';', b',']
            .into_iter()
            .map(|d| score(data, d, DQ))
            .collect();

        assert_eq!(find_best(&scores).unwrap().candidate.delimiter, b',');
        assert!(find_best(&[]).is_none());
    }
}
