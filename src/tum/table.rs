//! Parsing a sample into a table under one candidate dialect.

use foldhash::{HashMap, HashMapExt};

use crate::dialect::Quote;

/// A delimiter/quote pair under evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Candidate {
    /// Field delimiter byte.
    pub delimiter: u8,
    /// Quote character configuration.
    pub quote: Quote,
}

impl Candidate {
    pub const fn new(delimiter: u8, quote: Quote) -> Self {
        Self { delimiter, quote }
    }
}

/// A sample parsed with one candidate.
#[derive(Debug, Clone, Default)]
pub struct Table {
    /// Field values, one vector per record.
    pub rows: Vec<Vec<String>>,
    /// Number of fields in each record.
    pub field_counts: Vec<usize>,
    /// Most common field count, and how many records have it.
    modal: (usize, usize),
}

impl Table {
    /// Build a table from already split rows.
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        let field_counts = rows.iter().map(Vec::len).collect();
        let mut table = Self {
            rows,
            field_counts,
            modal: (0, 0),
        };
        table.modal = modal_field_count(&table.field_counts);
        table
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[inline]
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// The most common field count.
    #[inline]
    pub fn modal_field_count(&self) -> usize {
        self.modal.0
    }

    /// How many records have the modal field count.
    #[inline]
    pub fn modal_field_count_freq(&self) -> usize {
        self.modal.1
    }

    pub fn min_field_count(&self) -> usize {
        self.field_counts.iter().copied().min().unwrap_or(0)
    }

    pub fn max_field_count(&self) -> usize {
        self.field_counts.iter().copied().max().unwrap_or(0)
    }
}

/// Ties go to the larger field count so the result does not depend on map
/// iteration order.
fn modal_field_count(field_counts: &[usize]) -> (usize, usize) {
    let mut counts: HashMap<usize, usize> = HashMap::with_capacity(field_counts.len());
    for &fc in field_counts {
        *counts.entry(fc).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .max_by(|(fc_a, n_a), (fc_b, n_b)| n_a.cmp(n_b).then_with(|| fc_a.cmp(fc_b)))
        .unwrap_or((0, 0))
}

/// Parse at most `max_rows` records of LF-terminated `data` with `candidate`.
///
/// Parsing stops quietly at the first malformed record. Invalid UTF-8 in a
/// field is replaced rather than rejected.
pub fn parse_table(data: &[u8], candidate: Candidate, max_rows: usize) -> Table {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .delimiter(candidate.delimiter)
        .has_headers(false)
        .flexible(true);
    match candidate.quote {
        Quote::None => {
            builder.quoting(false);
        }
        Quote::Some(q) => {
            builder.quoting(true).quote(q);
        }
    }

    let mut reader = builder.from_reader(data);
    let mut record = csv::ByteRecord::new();
    let mut rows = Vec::new();

    while rows.len() < max_rows {
        match reader.read_byte_record(&mut record) {
            Ok(true) => rows.push(
                record
                    .iter()
                    .map(|field| String::from_utf8_lossy(field).into_owned())
                    .collect(),
            ),
            Ok(false) | Err(_) => break,
        }
    }

    Table::from_rows(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMMA: Candidate = Candidate::new(b',', Quote::Some(b'"'));

    #[test]
    fn test_parse_simple_csv() {
        let table = parse_table(b"a,b,c\n1,2,3\n4,5,6\n", COMMA, 100);
        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.field_counts, vec![3, 3, 3]);
        assert_eq!(table.rows[0], vec!["a", "b", "c"]);
        assert_eq!(table.min_field_count(), table.max_field_count());
    }

    #[test]
    fn test_parse_quoted_csv() {
        let table = parse_table(b"\"a,b\",c,d\n1,2,3\n", COMMA, 100);
        assert_eq!(table.rows[0], vec!["a,b", "c", "d"]);

        let unquoted = parse_table(
            b"\"a,b\",c,d\n1,2,3\n",
            Candidate::new(b',', Quote::None),
            100,
        );
        assert_eq!(unquoted.rows[0].len(), 4);
    }

    #[test]
    fn test_row_limit() {
        let table = parse_table(b"1\n2\n3\n4\n", COMMA, 2);
        assert_eq!(table.num_rows(), 2);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let table = parse_table(b"caf\xe9,ok\n", COMMA, 10);
        assert_eq!(table.rows[0][0], "caf\u{FFFD}");
    }

    #[test]
    fn test_modal_field_count() {
        let table = Table::from_rows(vec![
            vec!["a".into(); 3],
            vec!["a".into(); 3],
            vec!["a".into(); 4],
            vec!["a".into(); 3],
        ]);
        assert_eq!(table.modal_field_count(), 3);
        assert_eq!(table.modal_field_count_freq(), 3);
        assert_eq!(table.min_field_count(), 3);
        assert_eq!(table.max_field_count(), 4);

        // Equal frequency: the wider row wins.
        let tied = Table::from_rows(vec![vec!["a".into(); 2], vec!["a".into(); 5]]);
        assert_eq!(tied.modal_field_count(), 5);
    }
}
