//! Markdown report generation
//!
//! One `###` section per URL, sorted by URL, preceded by run information
//! and statistics.

use crate::harvest::{HarvestReport, PageOutcome};
use crate::output::{OutputError, OutputResult};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown rendering of a report to `output_path`
pub fn write_markdown_report(report: &HarvestReport, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_report(report);
    let to_error = |source| OutputError::Write {
        path: output_path.display().to_string(),
        source,
    };

    let mut file = File::create(output_path).map_err(to_error)?;
    file.write_all(markdown.as_bytes()).map_err(to_error)?;

    Ok(())
}

/// Formats a harvest report as markdown
pub fn format_markdown_report(report: &HarvestReport) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Harvest of {}\n\n", report.seed));

    md.push_str("## Run Information\n\n");
    md.push_str(&format!(
        "- **Generated**: {}\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    md.push_str(&format!("- **URLs Discovered**: {}\n", report.urls.len()));
    md.push_str(&format!(
        "- **Duration**: {:.2} seconds\n\n",
        report.stats.elapsed.as_secs_f64()
    ));

    md.push_str("## Statistics\n\n");
    md.push_str(&format!("- **Fetched**: {}\n", report.stats.total));
    md.push_str(&format!("- **Succeeded**: {}\n", report.stats.succeeded));
    md.push_str(&format!("- **Failed**: {}\n", report.stats.failed));
    md.push_str(&format!("- **Errored**: {}\n", report.stats.errored));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n\n",
        report.stats.success_rate()
    ));

    md.push_str("## Extracted Content\n\n");
    if report.outcomes.is_empty() {
        md.push_str("_No pages could be fetched._\n");
    }

    for (url, outcome) in report.sorted_outcomes() {
        md.push_str(&format!("### {}\n\n", url));
        md.push_str(outcome.display_text());
        md.push_str("\n\n");
        if let PageOutcome::Failed { reason } | PageOutcome::Errored { reason } = outcome {
            md.push_str(&format!("> {}\n\n", reason));
        }
    }

    md
}
