use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use findings_docx::{export_docx, records, ExportConfig, ExportRequest, FindingStore};
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Docx,
    Json,
    Csv,
}

impl Format {
    fn extension(self) -> &'static str {
        match self {
            Format::Docx => "docx",
            Format::Json => "json",
            Format::Csv => "csv",
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Export request as posted by the findings tracker (JSON).
    #[arg(long)]
    request: PathBuf,

    /// Stored finding records (JSON array) used for ids without an edited copy.
    #[arg(long)]
    findings: PathBuf,

    /// Findings import file (JSON array, tracker or capitalized keys) added
    /// to the stored records. May be given more than once.
    #[arg(long)]
    import: Vec<PathBuf>,

    /// Output path. Defaults to the configured file name.
    #[arg(long)]
    out: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Format::Docx)]
    format: Format,

    /// Optional TOML export configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn setup_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match verbosity {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn read_to_string(path: &PathBuf) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);

    let config = match &args.config {
        Some(path) => {
            ExportConfig::load(path).with_context(|| format!("load config {}", path.display()))?
        }
        None => ExportConfig::default(),
    };

    let request_json = read_to_string(&args.request)?;
    if request_json.trim().is_empty() {
        return Err(anyhow!("empty export request"));
    }
    let request = ExportRequest::from_json(&request_json)
        .with_context(|| format!("parse {}", args.request.display()))?;
    let mut store = FindingStore::from_json(&read_to_string(&args.findings)?)
        .with_context(|| format!("parse {}", args.findings.display()))?;
    for path in &args.import {
        let imported = store
            .import_json(&read_to_string(path)?)
            .with_context(|| format!("import {}", path.display()))?;
        info!(path = %path.display(), imported, "import file read");
    }

    let bytes = match args.format {
        Format::Docx => export_docx(&request, &store, &config)?,
        Format::Json => records::to_json(&request, &store)?.into_bytes(),
        Format::Csv => records::to_csv(&request, &store)?.into_bytes(),
    };

    let out = args.out.unwrap_or_else(|| {
        PathBuf::from(&config.file_name).with_extension(args.format.extension())
    });
    fs::write(&out, &bytes).with_context(|| format!("write {}", out.display()))?;
    info!(path = %out.display(), bytes = bytes.len(), "export written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_format_and_verbosity() {
        let args = Args::parse_from([
            "findings-docx",
            "--request",
            "req.json",
            "--findings",
            "db.json",
            "--format",
            "csv",
            "-vv",
        ]);
        assert_eq!(args.format, Format::Csv);
        assert_eq!(args.verbose, 2);
        assert!(args.out.is_none());
        assert!(args.import.is_empty());
    }

    #[test]
    fn import_flag_repeats() {
        let args = Args::parse_from([
            "findings-docx",
            "--request",
            "req.json",
            "--findings",
            "db.json",
            "--import",
            "a.json",
            "--import",
            "b.json",
        ]);
        assert_eq!(args.import, vec![PathBuf::from("a.json"), PathBuf::from("b.json")]);
    }
}
