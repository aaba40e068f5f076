//! End-to-end inspection of a delimiter-separated text sample.
//!
//! The pipeline rejects binary input, detects the encoding, decodes the
//! sample to UTF-8, sniffs the dialect and finally reads the header row into
//! a [`TableMetadata`].

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::binary::is_binary_with;
use crate::capability::Capabilities;
use crate::dialect::{DetectionResult, Quote};
use crate::encoding::{DEFAULT_ENCODING, EncodingName, detect_encoding_with, transcode};
use crate::error::{CommaError, Result};
use crate::sample::SampleCap;
use crate::sniffer::Sniffer;
use crate::table_metadata::{TableMetadata, validate_header_bytes};

/// Everything learned about one input.
#[derive(Debug, Clone)]
pub struct Inspection {
    /// Detected (or default) encoding of the raw bytes.
    pub encoding: EncodingName,
    /// Dialect of the decoded sample.
    pub detection: DetectionResult,
    /// Header, primary key and parameters, with `encoding` and every
    /// dialect field recorded in the parameters.
    pub metadata: TableMetadata,
}

/// Configurable inspection pipeline.
///
/// # Example
///
/// ```
/// use comma_sniff::Pipeline;
///
/// let mut pipeline = Pipeline::new();
/// pipeline.sample_cap(4096).primary_key("id");
///
/// let inspection = pipeline.inspect(b"id,name\n1,alice\n2,bob\n").unwrap();
/// assert_eq!(inspection.detection.delimiter, ',');
/// assert_eq!(inspection.metadata.primary_key_index(), Some(0));
/// assert_eq!(inspection.metadata.params()["delimiter"], ",");
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    sample_cap: SampleCap,
    default_encoding: EncodingName,
    delimiters: Option<Vec<u8>>,
    primary_key: Option<String>,
    capabilities: Capabilities,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            sample_cap: SampleCap::default(),
            default_encoding: EncodingName::new(DEFAULT_ENCODING),
            delimiters: None,
            primary_key: None,
            capabilities: *Capabilities::resolved(),
        }
    }

    /// Set the maximum number of bytes read and examined.
    pub fn sample_cap(&mut self, bytes: usize) -> &mut Self {
        self.sample_cap = SampleCap::new(bytes);
        self
    }

    /// Encoding reported when no detector finds a signal.
    pub fn default_encoding(&mut self, encoding: &str) -> &mut Self {
        self.default_encoding = EncodingName::new(encoding);
        self
    }

    /// Restrict the delimiter candidates.
    pub fn delimiters(&mut self, delimiters: &[u8]) -> &mut Self {
        self.delimiters = Some(delimiters.to_vec());
        self
    }

    /// Column to set as the primary key of the resulting metadata.
    pub fn primary_key(&mut self, key: &str) -> &mut Self {
        self.primary_key = Some(key.to_string());
        self
    }

    /// Use explicit capabilities instead of the process-wide ones.
    pub fn capabilities(&mut self, capabilities: Capabilities) -> &mut Self {
        self.capabilities = capabilities;
        self
    }

    /// Whether the leading sample of `data` is binary.
    pub fn is_binary(&self, data: &[u8]) -> bool {
        is_binary_with(
            data,
            true,
            self.capabilities.binary_classifier,
            self.sample_cap,
        )
    }

    /// Whether the leading sample of `reader` is binary. Read errors count as
    /// text, leaving the failure to whoever reads the data next.
    pub fn is_binary_reader<R: Read>(&self, reader: R) -> bool {
        match read_sample(reader, self.sample_cap) {
            Ok(sample) => self.is_binary(&sample),
            Err(err) => {
                tracing::warn!(error = %err, "could not read sample for binary check");
                false
            }
        }
    }

    /// Inspect an in-memory buffer.
    ///
    /// # Errors
    ///
    /// [`CommaError::BinaryData`] for binary input, sniffing failures, and
    /// metadata errors when the configured primary key is not a column.
    pub fn inspect(&self, data: &[u8]) -> Result<Inspection> {
        if self.is_binary(data) {
            return Err(CommaError::BinaryData);
        }

        let encoding = detect_encoding_with(
            data,
            self.default_encoding.as_str(),
            self.capabilities.encoding_guesser,
            self.sample_cap,
        );
        let text = transcode(self.sample_cap.truncate(data), &encoding);

        let mut sniffer = Sniffer::new();
        sniffer
            .sample_cap(self.sample_cap.bytes())
            .capabilities(self.capabilities);
        if let Some(delimiters) = &self.delimiters {
            sniffer.delimiters(delimiters);
        }
        let detection = sniffer.sniff(&text)?;

        let header = if detection.has_header {
            match read_header(&text, &detection) {
                Ok(header) => header,
                Err(CommaError::InvalidHeader(reason)) => {
                    tracing::warn!(%reason, "ignoring unusable header row");
                    None
                }
                Err(err) => return Err(err),
            }
        } else {
            None
        };

        let mut params = detection.to_params();
        params.insert("encoding".to_string(), encoding.to_string());
        let metadata = TableMetadata::new(header, self.primary_key.as_deref(), Some(params))?;

        tracing::debug!(
            %encoding,
            delimiter = ?detection.delimiter,
            has_header = detection.has_header,
            "inspected sample"
        );

        Ok(Inspection {
            encoding,
            detection,
            metadata,
        })
    }

    /// Inspect the leading sample of `reader`.
    pub fn inspect_reader<R: Read>(&self, reader: R) -> Result<Inspection> {
        let sample = read_sample(reader, self.sample_cap)?;
        self.inspect(&sample)
    }

    /// Inspect the leading sample of the file at `path`.
    pub fn inspect_path<P: AsRef<Path>>(&self, path: P) -> Result<Inspection> {
        let file = File::open(path.as_ref())?;
        self.inspect_reader(BufReader::new(file))
    }
}

/// Read at most one sample cap of bytes.
fn read_sample<R: Read>(reader: R, cap: SampleCap) -> std::io::Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(cap.bytes());
    reader.take(cap.bytes() as u64).read_to_end(&mut buffer)?;
    Ok(buffer)
}

/// Parse the first record of `text` under the detected dialect.
fn read_header(text: &[u8], detection: &DetectionResult) -> Result<Option<Vec<String>>> {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .delimiter(detection.delimiter_byte())
        .has_headers(false)
        .flexible(true);
    match detection.quote {
        Quote::None => {
            builder.quoting(false);
        }
        Quote::Some(q) => {
            builder.quote(q);
        }
    }
    if detection.skip_initial_space {
        builder.trim(csv::Trim::Fields);
    }

    let mut reader = builder.from_reader(text);
    let mut record = csv::ByteRecord::new();
    if !reader.read_byte_record(&mut record)? {
        return Ok(None);
    }
    validate_header_bytes(record.iter()).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{LineTerminator, StrategyKind};

    #[test]
    fn test_inspect_basic() {
        let inspection = Pipeline::new()
            .inspect(b"id,name,score\n1,alice,9.5\n2,bob,7.25\n3,carol,8\n")
            .unwrap();

        assert_eq!(inspection.detection.delimiter, ',');
        assert_eq!(inspection.detection.line_terminator, LineTerminator::LF);
        assert_eq!(
            inspection.metadata.header(),
            Some(&["id".to_string(), "name".to_string(), "score".to_string()][..])
        );
        assert!(inspection.metadata.primary_key().is_none());
        assert_eq!(inspection.metadata.params()["delimiter"], ",");
        assert_eq!(inspection.metadata.params()["has_header"], "true");
    }

    #[test]
    fn test_inspect_baseline_capabilities() {
        let mut pipeline = Pipeline::new();
        pipeline.capabilities(Capabilities::baseline());

        let inspection = pipeline.inspect(b"a;b\r\n1;2\r\n3;4\r\n").unwrap();
        assert_eq!(inspection.detection.strategy_used, StrategyKind::Simple);
        assert_eq!(inspection.detection.line_terminator, LineTerminator::CRLF);
        // No statistical guesser: ASCII input falls back to the default.
        assert_eq!(inspection.encoding, "utf-8");
    }

    #[test]
    fn test_inspect_rejects_binary() {
        let err = Pipeline::new()
            .inspect(b"\x00\x01\x02\x03binary\x00\x00")
            .unwrap_err();
        assert!(matches!(err, CommaError::BinaryData));
    }

    #[test]
    fn test_inspect_missing_primary_key() {
        let mut pipeline = Pipeline::new();
        pipeline.primary_key("nope");
        assert!(matches!(
            pipeline.inspect(b"id,name\n1,a\n2,b\n"),
            Err(CommaError::KeyLookup { .. })
        ));
    }

    #[test]
    fn test_inspect_blank_header_column() {
        let inspection = Pipeline::new()
            .inspect(b"id,,score\n1,2.5,3\n2,3.5,4\n3,1.5,5\n")
            .unwrap();

        assert_eq!(inspection.detection.delimiter, ',');
        assert!(inspection.metadata.header().is_none());
    }

    #[test]
    fn test_inspect_utf8_bom() {
        let mut data = b"\xEF\xBB\xBF".to_vec();
        data.extend_from_slice("city;pop\nZürich;421878\nGenève;203856\nBern;134591\n".as_bytes());

        let inspection = Pipeline::new().inspect(&data).unwrap();
        assert_eq!(inspection.encoding, "utf-8-sig");
        assert_eq!(inspection.detection.delimiter, ';');
        assert_eq!(inspection.metadata.column_index("city"), Some(0));
    }

    #[test]
    fn test_inspect_utf16_heuristic() {
        let text = "a,b\n1,2\n3,4\n";
        let mut data = vec![0xFF, 0xFE];
        data.extend(text.encode_utf16().flat_map(u16::to_le_bytes));

        let mut pipeline = Pipeline::new();
        pipeline.capabilities(Capabilities {
            binary_classifier: &crate::binary::AllowSetClassifier,
            ..Capabilities::baseline()
        });
        // The allow-set classifier sees the NUL bytes of UTF-16.
        assert!(matches!(
            pipeline.inspect(&data),
            Err(CommaError::BinaryData)
        ));

        #[cfg(feature = "heuristic-binary")]
        {
            pipeline.capabilities(Capabilities {
                binary_classifier: &crate::binary::HeuristicClassifier,
                ..Capabilities::baseline()
            });
            let inspection = pipeline.inspect(&data).unwrap();
            assert_eq!(inspection.encoding, "utf-16");
            assert_eq!(inspection.detection.delimiter, ',');
        }
    }

    #[test]
    fn test_is_binary_reader() {
        let pipeline = Pipeline::new();
        assert!(!pipeline.is_binary_reader(&b"a,b\n1,2\n"[..]));
        assert!(pipeline.is_binary_reader(&b"\x7FELF\x02\x01\x01\x00"[..]));
    }

    #[test]
    fn test_read_sample_respects_cap() {
        let data = vec![b'x'; 100];
        let sample = read_sample(&data[..], SampleCap::new(10)).unwrap();
        assert_eq!(sample.len(), 10);
    }
}
