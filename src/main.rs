use anyhow::Result;
use clap::Parser;
use recnorm::report::{self, SummaryFormat};
use recnorm::{Normalizer, NormalizerConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Normalize JSON records for vector-database ingestion", long_about = None)]
struct Args {
    /// Directory holding the JSON files [default: Complete]
    #[arg(value_name = "DIR")]
    dir: Option<PathBuf>,

    /// JSON config file; CLI flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Glob matched against file names in DIR [default: *.json]
    #[arg(long)]
    pattern: Option<String>,

    /// Top-level key marking a wrapped document [default: collectionName]
    #[arg(long)]
    collection_key: Option<String>,

    #[arg(long)]
    collection_name: Option<String>,

    /// Key holding the records list
    #[arg(long)]
    data_key: Option<String>,

    #[arg(long)]
    persona_id: Option<String>,

    #[arg(long)]
    created_ym: Option<String>,

    #[arg(long)]
    status: Option<String>,

    #[arg(long)]
    author: Option<String>,

    /// Default for version_info.version
    #[arg(long)]
    version_default: Option<String>,

    #[arg(long)]
    created_date: Option<String>,

    #[arg(long)]
    last_updated: Option<String>,

    /// Default for version_info.status
    #[arg(long)]
    version_status: Option<String>,

    #[arg(long)]
    approved_by: Option<String>,

    /// Report changes without writing files
    #[arg(long)]
    dry_run: bool,

    #[arg(long, value_enum, default_value_t = SummaryFormat::Text)]
    format: SummaryFormat,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Log debug events
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> Result<NormalizerConfig> {
        let mut cfg = match &self.config {
            Some(path) => NormalizerConfig::from_file(path)?,
            None => NormalizerConfig::default(),
        };

        fn set(slot: &mut String, value: Option<String>) {
            if let Some(value) = value {
                *slot = value;
            }
        }

        if let Some(dir) = self.dir {
            cfg.target_dir = dir;
        }
        set(&mut cfg.pattern, self.pattern);
        set(&mut cfg.collection_key, self.collection_key);
        set(&mut cfg.collection_name, self.collection_name);
        set(&mut cfg.data_key, self.data_key);
        set(&mut cfg.defaults.persona_id, self.persona_id);
        set(&mut cfg.defaults.created_ym, self.created_ym);
        set(&mut cfg.defaults.status, self.status);
        set(&mut cfg.defaults.author, self.author);
        set(&mut cfg.defaults.version, self.version_default);
        set(&mut cfg.defaults.created_date, self.created_date);
        set(&mut cfg.defaults.last_updated, self.last_updated);
        set(&mut cfg.defaults.version_status, self.version_status);
        set(&mut cfg.defaults.approved_by, self.approved_by);
        cfg.dry_run |= self.dry_run;
        Ok(cfg)
    }
}

fn init_tracing(quiet: bool, verbose: bool) {
    let fallback = if quiet {
        "warn"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .init();
}

fn run(args: Args) -> Result<bool> {
    let format = args.format;
    let normalizer = Normalizer::new(args.into_config()?);
    let summary = normalizer.run()?;
    report::print_summary(&summary, format)?;
    Ok(!summary.has_failures())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.quiet, args.verbose);

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn config_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{content}").unwrap();
        file
    }

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("recnorm").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn flags_override_file_and_file_overrides_defaults() {
        let file = config_file(
            r#"{"data_key": "records", "dry_run": true, "defaults": {"author": "file"}}"#,
        );
        let path = file.path().to_str().unwrap();

        let cfg = parse(&["-c", path, "--author", "cli"]).into_config().unwrap();
        assert_eq!(cfg.defaults.author, "cli");
        assert_eq!(cfg.data_key, "records");
        assert_eq!(cfg.defaults.persona_id, "revrebel_core");
        assert_eq!(cfg.collection_key, "collectionName");
        // no --dry-run on the command line does not switch it back off
        assert!(cfg.dry_run);
    }

    #[test]
    fn positional_dir_and_key_flags_are_applied() {
        let cfg = parse(&["some/dir", "--collection-key", "coll", "--data-key", "items"])
            .into_config()
            .unwrap();
        assert_eq!(cfg.target_dir, PathBuf::from("some/dir"));
        assert_eq!(cfg.collection_key, "coll");
        assert_eq!(cfg.data_key, "items");
        assert!(!cfg.dry_run);
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        let err = Args::try_parse_from(["recnorm", "-q", "-v"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn run_reports_file_failures_as_false() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), "{\"id\": ").unwrap();
        let path = dir.path().to_str().unwrap();

        assert!(!run(parse(&[path, "--format", "json"])).unwrap());
    }

    #[test]
    fn run_succeeds_when_every_file_is_processed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ok.json"), r#"{"id": "a"}"#).unwrap();
        let path = dir.path().to_str().unwrap();

        assert!(run(parse(&[path, "--dry-run"])).unwrap());
        let raw = std::fs::read_to_string(dir.path().join("ok.json")).unwrap();
        assert_eq!(raw, r#"{"id": "a"}"#);
    }

    #[test]
    fn missing_directory_is_a_run_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent");
        assert!(run(parse(&[missing.to_str().unwrap()])).is_err());
    }
}
