use crate::summary::{FileOutcome, RunSummary};
use anyhow::Result;
use std::fmt::Write as _;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SummaryFormat {
    #[default]
    Text,
    Json,
}

pub fn render(summary: &RunSummary, format: SummaryFormat) -> Result<String> {
    match format {
        SummaryFormat::Text => Ok(render_text(summary)),
        SummaryFormat::Json => render_json(summary),
    }
}

pub fn render_json(summary: &RunSummary) -> Result<String> {
    Ok(serde_json::to_string_pretty(summary)?)
}

pub fn render_text(summary: &RunSummary) -> String {
    let rule = "=".repeat(80);
    let mut out = String::new();

    let _ = writeln!(out, "{rule}");
    let _ = writeln!(
        out,
        "VALIDATION SUMMARY{}",
        if summary.dry_run { " (dry run)" } else { "" }
    );
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Directory: {}", summary.target_dir.display());
    let _ = writeln!(out, "Total files processed: {}", summary.total_files);
    if summary.dry_run {
        let _ = writeln!(out, "Files that would be modified: {}", summary.files_modified);
    } else {
        let _ = writeln!(out, "Files modified: {}", summary.files_modified);
    }
    let _ = writeln!(out, "Files already valid: {}", summary.files_unchanged);
    let _ = writeln!(out, "Files failed: {}", summary.files_failed);
    let _ = writeln!(out, "Warnings: {}", summary.warnings);
    let _ = writeln!(out, "Processing time: {:.3}s", summary.elapsed_secs);

    let _ = writeln!(out, "\nChanges applied:");
    if summary.changes.total() == 0 {
        let _ = writeln!(out, "  No changes were needed - all files are valid!");
    } else {
        for (kind, n) in summary.changes.iter() {
            let _ = writeln!(out, "  - {}: {n} times", kind.description());
        }
    }

    let failures: Vec<_> = summary
        .files
        .iter()
        .filter_map(|f| match &f.outcome {
            FileOutcome::Failed(err) => Some((f.path.display(), err)),
            _ => None,
        })
        .collect();
    if !failures.is_empty() {
        let _ = writeln!(out, "\nFailed files:");
        for (path, err) in failures {
            let _ = writeln!(out, "  - {path}: {err}");
        }
    }

    if summary.has_failures() {
        let _ = writeln!(out, "\nValidation finished with errors.");
    } else {
        let _ = writeln!(out, "\nValidation complete! Files are ready for upload.");
    }
    out
}

pub fn print_summary(summary: &RunSummary, format: SummaryFormat) -> Result<()> {
    let rendered = render(summary, format)?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{rendered}")?;
    stdout.flush()?;
    Ok(())
}
