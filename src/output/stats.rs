//! Statistics display for a finished harvest

use crate::harvest::HarvestReport;

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(report: &HarvestReport) {
    let stats = &report.stats;

    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Seed: {}", report.seed);
    println!("  URLs discovered: {}", report.urls.len());
    println!("  Pages fetched: {}", stats.total);
    println!("  Elapsed: {:.2}s", stats.elapsed.as_secs_f64());
    println!();

    println!("Pages by Outcome:");
    for (label, count) in [
        ("Succeeded", stats.succeeded),
        ("Failed", stats.failed),
        ("Errored", stats.errored),
    ] {
        let percentage = if stats.total > 0 {
            (count as f64 / stats.total as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", label, count, percentage);
    }

    let failures: Vec<_> = report
        .sorted_outcomes()
        .into_iter()
        .filter_map(|(url, outcome)| outcome.reason().map(|reason| (url, reason)))
        .collect();

    if !failures.is_empty() {
        println!("\nFailures:");
        for (url, reason) in failures {
            println!("  {} - {}", url, reason);
        }
    }
}
