//! comma-sniff CLI - inspect delimiter-separated text files

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use comma_sniff::{Capabilities, DEFAULT_ENCODING, DEFAULT_SAMPLE_CAP, Inspection, Pipeline, Quote};

/// Detect the encoding, dialect and header of CSV-like files.
///
/// Binary files are rejected. Only the first --sample-cap bytes of each file
/// are read.
#[derive(Parser, Debug)]
#[command(name = "comma-sniff")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input file(s) to inspect
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Number of leading bytes to read and examine
    #[arg(short = 'n', long, env = "COMMA_SNIFF_SAMPLE_CAP", default_value_t = DEFAULT_SAMPLE_CAP)]
    sample_cap: usize,

    /// Restrict delimiter candidates to these characters (e.g. ",;|")
    #[arg(short = 'd', long)]
    delimiters: Option<String>,

    /// Encoding reported when nothing can be detected
    #[arg(short = 'e', long, default_value = DEFAULT_ENCODING)]
    default_encoding: String,

    /// Column to use as primary key; must be part of the detected header
    #[arg(short = 'k', long)]
    primary_key: Option<String>,

    /// Use only the built-in detectors
    #[arg(long)]
    baseline: bool,

    /// Output format
    #[arg(short = 'f', long, default_value = "text")]
    format: OutputFormat,

    /// Also show the header columns and all metadata parameters
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Only output the detected delimiter character
    #[arg(long)]
    delimiter_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let pipeline = match build_pipeline(&args) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut exit_code = ExitCode::SUCCESS;

    for file in &args.files {
        match pipeline.inspect_path(file) {
            Ok(inspection) => print_inspection(file, &inspection, &args),
            Err(e) => {
                eprintln!("Error processing {}: {}", file.display(), e);
                exit_code = ExitCode::FAILURE;
            }
        }
    }

    exit_code
}

fn build_pipeline(args: &Args) -> Result<Pipeline, String> {
    let mut pipeline = Pipeline::new();
    pipeline
        .sample_cap(args.sample_cap)
        .default_encoding(&args.default_encoding);

    if let Some(delimiters) = &args.delimiters {
        if !delimiters.is_ascii() {
            return Err(format!("delimiters must be ASCII characters: {delimiters:?}"));
        }
        pipeline.delimiters(delimiters.as_bytes());
    }
    if let Some(key) = &args.primary_key {
        pipeline.primary_key(key);
    }
    if args.baseline {
        pipeline.capabilities(Capabilities::baseline());
    }

    Ok(pipeline)
}

fn print_inspection(path: &Path, inspection: &Inspection, args: &Args) {
    if args.delimiter_only {
        println!("{}", inspection.detection.delimiter);
        return;
    }

    match args.format {
        OutputFormat::Text => print_text_output(path, inspection, args.verbose),
        OutputFormat::Json => print_json_output(path, inspection, args.verbose),
    }
}

fn print_text_output(path: &Path, inspection: &Inspection, verbose: bool) {
    let detection = &inspection.detection;
    let metadata = &inspection.metadata;

    println!("File: {}", path.display());
    println!("  Encoding: {}", inspection.encoding);
    println!("  Delimiter: {:?}", detection.delimiter);
    println!(
        "  Quote: {}",
        match detection.quote {
            Quote::None => "none".to_string(),
            Quote::Some(q) => format!("{:?}", q as char),
        }
    );
    println!("  Line terminator: {}", detection.line_terminator);
    println!("  Has header: {}", detection.has_header);
    println!("  Skip initial space: {}", detection.skip_initial_space);
    println!("  Strategy: {}", detection.strategy_used);
    if let Some(key) = metadata.primary_key() {
        println!("  Primary key: {key}");
    }

    if verbose {
        if let Some(header) = metadata.header() {
            println!("  Columns:");
            for (i, name) in header.iter().enumerate() {
                println!("    {}: {}", i + 1, name);
            }
        }
        println!("  Params:");
        for (key, value) in metadata.params() {
            println!("    {key} = {value}");
        }
    }

    println!();
}

/// Quote `s` as a JSON string.
fn json_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn print_json_output(path: &Path, inspection: &Inspection, verbose: bool) {
    let detection = &inspection.detection;
    let metadata = &inspection.metadata;

    let quote = detection
        .quote_char()
        .map_or_else(|| "null".to_string(), |q| json_string(&q.to_string()));
    let primary_key = metadata
        .primary_key()
        .map_or_else(|| "null".to_string(), json_string);

    print!(
        r#"{{"file":{},"encoding":{},"dialect":{{"delimiter":{},"quote":{},"line_terminator":{},"has_header":{},"skip_initial_space":{},"strategy":"{}"}},"primary_key":{}"#,
        json_string(&path.display().to_string()),
        json_string(inspection.encoding.as_str()),
        json_string(&detection.delimiter.to_string()),
        quote,
        json_string(detection.line_terminator.as_str()),
        detection.has_header,
        detection.skip_initial_space,
        detection.strategy_used,
        primary_key,
    );

    if verbose {
        let header = metadata.header().map_or_else(
            || "null".to_string(),
            |columns| {
                let columns: Vec<String> = columns.iter().map(|c| json_string(c)).collect();
                format!("[{}]", columns.join(","))
            },
        );
        let params: Vec<String> = metadata
            .params()
            .iter()
            .map(|(k, v)| format!("{}:{}", json_string(k), json_string(v)))
            .collect();
        print!(r#","header":{},"params":{{{}}}"#, header, params.join(","));
    }

    println!("}}");
}
