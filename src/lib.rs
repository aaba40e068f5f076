//! comma-sniff: ingestion front-end for delimiter-separated text
//!
//! Given the raw bytes of something that claims to be a CSV-like file, this
//! crate decides whether it is text at all, detects its encoding, sniffs its
//! dialect (delimiter, quote character, line terminator, header presence)
//! and keeps the table's header and primary-key metadata consistent.
//!
//! # Quick Start
//!
//! ```
//! use comma_sniff::{LineTerminator, detect_csv_type, detect_encoding, is_binary};
//!
//! let data = b"id,name\n1,alice\n2,bob\n";
//!
//! assert!(!is_binary(data, true));
//! assert_eq!(detect_encoding(b"\xEF\xBB\xBFid,name\n", "utf-8"), "utf-8-sig");
//!
//! let dialect = detect_csv_type(data, None).unwrap();
//! assert_eq!(dialect.delimiter, ',');
//! assert_eq!(dialect.line_terminator, LineTerminator::LF);
//! assert!(dialect.has_header);
//! ```
//!
//! # Pipeline
//!
//! [`Pipeline`] chains the detectors over a buffer, a reader or a file and
//! returns an [`Inspection`] with a populated [`TableMetadata`]:
//!
//! ```no_run
//! use comma_sniff::Pipeline;
//!
//! let mut pipeline = Pipeline::new();
//! pipeline.sample_cap(64 * 1024).primary_key("id");
//!
//! let inspection = pipeline.inspect_path("data.csv").unwrap();
//! println!("Encoding: {}", inspection.encoding);
//! println!("Header: {:?}", inspection.metadata.header());
//! ```
//!
//! # Capabilities
//!
//! Three detectors have an optional upgrade behind a cargo feature, all
//! enabled by default:
//!
//! - `tum`: the Table Uniformity Method dialect sniffer, from "Wrangling
//!   Messy CSV Files by Detecting Row and Type Patterns" (van den Burg,
//!   Nazábal, and Sutton, 2019). Without it a frequency-based sniffer is used.
//! - `heuristic-binary`: a ratio-based binary classifier that accepts
//!   UTF-16 text, used by [`Pipeline`]. Without it any byte outside the
//!   file(1) text set is binary. [`is_binary`] always uses the text set.
//! - `chardet`: statistical encoding guessing with `chardetng`. Without it
//!   only byte-order marks and NUL patterns are recognized.
//!
//! The choice is made once per process, see [`Capabilities::resolved`].

mod binary;
mod capability;
mod dialect;
mod encoding;
mod error;
mod pipeline;
mod sample;
mod simple;
mod sniffer;
mod table_metadata;
#[cfg(feature = "tum")]
mod tum;

pub use binary::{
    AllowSetClassifier, BinaryClassifier, is_binary, is_binary_opt, is_binary_with, is_text_byte,
};
#[cfg(feature = "heuristic-binary")]
pub use binary::HeuristicClassifier;
pub use capability::Capabilities;
pub use dialect::{DetectionResult, LineTerminator, Quote, StrategyKind, detect_line_terminator};
#[cfg(feature = "chardet")]
pub use encoding::ChardetGuesser;
pub use encoding::{
    DEFAULT_ENCODING, EncodingGuesser, EncodingName, detect_encoding, detect_encoding_by_bom,
    detect_encoding_with, has_utf8_bom, is_utf8, skip_bom, transcode,
};
pub use error::{CommaError, Result};
pub use pipeline::{Inspection, Pipeline};
pub use sample::{DEFAULT_SAMPLE_CAP, MIN_SAMPLE_CAP, SampleCap};
pub use simple::SimpleStrategy;
pub use sniffer::{DialectStrategy, SniffedDialect, Sniffer, detect_csv_type};
pub use table_metadata::{Params, TableMetadata, validate_header, validate_header_bytes};
#[cfg(feature = "tum")]
pub use tum::TumStrategy;
