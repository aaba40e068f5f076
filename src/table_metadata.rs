//! Header and primary-key metadata of a loaded table.

use std::collections::BTreeMap;

use crate::error::{CommaError, Result};

/// Free-form parameters carried alongside a table (dialect facts, encoding).
pub type Params = BTreeMap<String, String>;

/// Column names and the optional primary-key column of a table.
///
/// A primary key is only ever set while a header is present and names one of
/// its columns. Clearing the header, or replacing it with one that lacks the
/// key column, also clears the primary key.
///
/// # Example
///
/// ```
/// use comma_sniff::{CommaError, TableMetadata};
///
/// let mut meta = TableMetadata::new(Some(["id", "name"]), Some("id"), None).unwrap();
/// assert_eq!(meta.primary_key(), Some("id"));
///
/// let err = meta.set_primary_key(Some("missing")).unwrap_err();
/// assert!(matches!(err, CommaError::KeyLookup { .. }));
/// assert_eq!(meta.primary_key(), Some("id"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableMetadata {
    header: Option<Vec<String>>,
    primary_key: Option<String>,
    params: Params,
}

impl TableMetadata {
    /// Create metadata, validating the header and the primary key.
    pub fn new<I, S>(
        header: Option<I>,
        primary_key: Option<&str>,
        params: Option<Params>,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut meta = Self {
            header: header.map(validate_header).transpose()?,
            primary_key: None,
            params: params.unwrap_or_default(),
        };
        meta.set_primary_key(primary_key)?;
        Ok(meta)
    }

    /// The column names, if known.
    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    /// Replace the header, or clear it with `None`.
    ///
    /// Replacing a header with one of a different length is allowed but
    /// logged. A primary key the new header does not contain is cleared.
    pub fn set_header<I, S>(&mut self, header: Option<I>) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let Some(header) = header else {
            self.clear_header();
            return Ok(());
        };
        let header = validate_header(header)?;

        if let Some(old) = &self.header
            && old.len() != header.len()
        {
            tracing::warn!(
                "changing length of header; was {}, now is {}",
                old.len(),
                header.len()
            );
        }

        if let Some(key) = &self.primary_key
            && !header.contains(key)
        {
            tracing::warn!(primary_key = %key, "new header lacks the primary key; clearing it");
            self.primary_key = None;
        }

        self.header = Some(header);
        Ok(())
    }

    /// Remove the header, and with it the primary key.
    pub fn clear_header(&mut self) {
        self.header = None;
        self.primary_key = None;
    }

    /// The primary-key column, if set.
    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }

    /// Set the primary key to a column of the header. `None` or an empty
    /// name clears it.
    ///
    /// # Errors
    ///
    /// [`CommaError::NoHeader`] without a header, [`CommaError::KeyLookup`]
    /// when `key` is not a column. The previous key is kept on failure.
    pub fn set_primary_key(&mut self, key: Option<&str>) -> Result<()> {
        let Some(key) = key.filter(|k| !k.is_empty()) else {
            self.clear_primary_key();
            return Ok(());
        };

        let header = self.header.as_ref().ok_or(CommaError::NoHeader)?;
        if !header.iter().any(|column| column == key) {
            return Err(CommaError::KeyLookup {
                key: key.to_string(),
                header: format!("{header:?}"),
            });
        }

        self.primary_key = Some(key.to_string());
        Ok(())
    }

    pub fn clear_primary_key(&mut self) {
        self.primary_key = None;
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    pub fn set_params(&mut self, params: Params) {
        self.params = params;
    }

    /// Position of the first column called `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.as_ref()?.iter().position(|column| column == name)
    }

    /// Position of the primary-key column.
    pub fn primary_key_index(&self) -> Option<usize> {
        self.column_index(self.primary_key.as_deref()?)
    }
}

/// Normalize a header into owned column names.
///
/// # Errors
///
/// [`CommaError::InvalidHeader`] if the header has no columns or a column
/// name is empty.
pub fn validate_header<I, S>(header: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let header: Vec<String> = header.into_iter().map(Into::into).collect();
    if header.is_empty() {
        return Err(CommaError::InvalidHeader(
            "a header needs at least one column".to_string(),
        ));
    }
    if let Some(i) = header.iter().position(String::is_empty) {
        return Err(CommaError::InvalidHeader(format!("column {i} is empty")));
    }
    Ok(header)
}

/// Like [`validate_header`], for raw cells as read from a CSV record.
///
/// # Errors
///
/// [`CommaError::InvalidHeader`] if the header is empty, or a cell is empty
/// or not valid UTF-8.
pub fn validate_header_bytes<I, B>(header: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = B>,
    B: AsRef<[u8]>,
{
    let columns = header
        .into_iter()
        .enumerate()
        .map(|(i, cell)| {
            simdutf8::basic::from_utf8(cell.as_ref())
                .map(str::to_string)
                .map_err(|_| {
                    CommaError::InvalidHeader(format!("column {i} is not valid UTF-8"))
                })
        })
        .collect::<Result<Vec<_>>>()?;
    validate_header(columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(header: &[&str], key: Option<&str>) -> TableMetadata {
        TableMetadata::new(Some(header.iter().copied()), key, None).unwrap()
    }

    #[test]
    fn test_new_defaults() {
        let empty = TableMetadata::new(None::<Vec<String>>, None, None).unwrap();
        assert_eq!(empty, TableMetadata::default());
        assert!(empty.header().is_none());
        assert!(empty.params().is_empty());
    }

    #[test]
    fn test_header_round_trip() {
        let mut m = TableMetadata::default();
        m.set_header(Some(vec!["a".to_string(), "b".to_string()]))
            .unwrap();
        assert_eq!(m.header(), Some(&["a".to_string(), "b".to_string()][..]));
    }

    #[test]
    fn test_new_rejects_bad_primary_key() {
        assert!(matches!(
            TableMetadata::new(None::<Vec<&str>>, Some("id"), None),
            Err(CommaError::NoHeader)
        ));
        assert!(matches!(
            TableMetadata::new(Some(["a"]), Some("id"), None),
            Err(CommaError::KeyLookup { .. })
        ));
        assert!(matches!(
            TableMetadata::new(Some(Vec::<String>::new()), None, None),
            Err(CommaError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_primary_key_lookup_failure_keeps_key() {
        let mut m = meta(&["id", "name"], Some("id"));
        let err = m.set_primary_key(Some("missing")).unwrap_err();

        match err {
            CommaError::KeyLookup { key, header } => {
                assert_eq!(key, "missing");
                assert!(header.contains("\"id\""));
                assert!(header.contains("\"name\""));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(m.primary_key(), Some("id"));
    }

    #[test]
    fn test_primary_key_without_header() {
        let mut m = TableMetadata::default();
        assert!(matches!(
            m.set_primary_key(Some("id")),
            Err(CommaError::NoHeader)
        ));
        assert!(m.primary_key().is_none());
    }

    #[test]
    fn test_empty_primary_key_clears() {
        let mut m = meta(&["id", "name"], Some("name"));
        m.set_primary_key(Some("")).unwrap();
        assert!(m.primary_key().is_none());

        m.set_primary_key(Some("id")).unwrap();
        m.set_primary_key(None).unwrap();
        assert!(m.primary_key().is_none());
    }

    #[test]
    fn test_clearing_paths_are_equivalent() {
        let mut a = meta(&["id", "name"], Some("id"));
        let mut b = a.clone();

        a.clear_header();
        b.set_header(None::<Vec<String>>).unwrap();

        assert_eq!(a, b);
        assert!(a.header().is_none());
        assert!(a.primary_key().is_none());
    }

    #[test]
    fn test_replacing_header() {
        let mut m = meta(&["id", "name"], Some("id"));

        // Keeps the key when the new header still has it, even if longer.
        m.set_header(Some(["id", "name", "age"])).unwrap();
        assert_eq!(m.primary_key(), Some("id"));

        m.set_header(Some(["key", "value"])).unwrap();
        assert!(m.primary_key().is_none());
    }

    #[test]
    fn test_failed_set_header_keeps_state() {
        let mut m = meta(&["id"], Some("id"));
        assert!(m.set_header(Some(Vec::<&str>::new())).is_err());
        assert_eq!(m.header().map(<[String]>::len), Some(1));
        assert_eq!(m.primary_key(), Some("id"));
    }

    #[test]
    fn test_indexes() {
        let m = meta(&["id", "name", "id"], Some("name"));
        assert_eq!(m.column_index("id"), Some(0));
        assert_eq!(m.column_index("nope"), None);
        assert_eq!(m.primary_key_index(), Some(1));
        assert_eq!(TableMetadata::default().column_index("id"), None);
    }

    #[test]
    fn test_params() {
        let mut m = TableMetadata::default();
        m.params_mut()
            .insert("delimiter".to_string(), ",".to_string());
        assert_eq!(m.params()["delimiter"], ",");

        m.set_params(Params::new());
        assert!(m.params().is_empty());
    }

    #[test]
    fn test_validate_header_bytes() {
        assert_eq!(
            validate_header_bytes([&b"a"[..], &b"b"[..]]).unwrap(),
            vec!["a", "b"]
        );
        assert!(matches!(
            validate_header_bytes([&b"ok"[..], &b"\xff"[..]]),
            Err(CommaError::InvalidHeader(_))
        ));
        assert!(matches!(
            validate_header_bytes(Vec::<Vec<u8>>::new()),
            Err(CommaError::InvalidHeader(_))
        ));
        assert!(matches!(
            validate_header_bytes([&b"id"[..], &b""[..]]),
            Err(CommaError::InvalidHeader(ref reason)) if reason == "column 1 is empty"
        ));
    }

    #[test]
    fn test_empty_column_name_rejected() {
        assert!(matches!(
            TableMetadata::new(Some([""]), None, None),
            Err(CommaError::InvalidHeader(_))
        ));

        let mut m = meta(&["id", "name"], Some("id"));
        let before = m.clone();
        let err = m.set_header(Some(["id", ""])).unwrap_err();
        assert!(err.to_string().contains("column 1 is empty"));
        assert_eq!(m, before);
    }
}
