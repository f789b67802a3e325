// Colored terminal summaries.
//
// Everything here goes to stderr: stdout may be carrying the score table
// when the output destination is `-`.

use colored::Colorize;

use crate::clustering::ClusterOutcome;
use crate::network::PolarizationReport;
use crate::pipeline::ScoreStage;

/// How many elite authors to list in the summary.
const ELITE_PREVIEW: usize = 15;

/// Display the scoring stage result: input counts, buckets and the elite list.
pub fn display_selection(stage: &ScoreStage, threshold: f64) {
    let full = &stage.scores;
    let elite = &stage.selection.table;
    eprintln!(
        "\n{}",
        format!("=== Activity Scores ({} authors) ===", full.rows.len()).bold()
    );
    eprintln!(
        "  Reposts: {} in range of {} read ({} incomplete skipped)",
        stage.counted_events.to_string().cyan(),
        stage.stats.reposts,
        stage.stats.incomplete
    );
    let span = match (full.buckets.first(), full.buckets.last()) {
        (Some(first), Some(last)) => format!("{} .. {}", first.label(), last.label()),
        _ => "none".to_string(),
    };
    eprintln!("  Buckets: {} ({})", full.buckets.len(), span.dimmed());
    eprintln!(
        "  Elite (total >= {}): {}",
        threshold,
        elite.rows.len().to_string().green().bold()
    );

    if elite.rows.is_empty() {
        eprintln!("  {}", "No authors reached the threshold.".yellow());
        return;
    }

    eprintln!();
    eprintln!("  {:>4}  {:<32} {:>10}", "#".dimmed(), "Author".dimmed(), "Total".dimmed());
    eprintln!("  {}", "-".repeat(50).dimmed());
    for (i, row) in elite.rows.iter().take(ELITE_PREVIEW).enumerate() {
        eprintln!(
            "  {:>4}. @{:<30} {:>10.3}",
            i + 1,
            super::truncate_chars(&row.user_id, 30),
            row.total()
        );
    }
    if elite.rows.len() > ELITE_PREVIEW {
        eprintln!("  {}", format!("... {} more", elite.rows.len() - ELITE_PREVIEW).dimmed());
    }
}

/// Display audience sizes and the most polarized pair.
pub fn display_polarization(report: &PolarizationReport) {
    let n = report.labels.len();
    eprintln!("\n{}", format!("=== Polarization ({n} x {n}) ===").bold());

    for (i, label) in report.labels.iter().enumerate().take(ELITE_PREVIEW) {
        eprintln!(
            "  @{:<30} audience {}",
            super::truncate_chars(label, 30),
            report.overlap.get(i, i)
        );
    }

    let mut widest: Option<(usize, usize, f64)> = None;
    for i in 0..n {
        for j in i + 1..n {
            let v = report.polarization.get(i, j);
            if widest.is_none_or(|(_, _, w)| v > w) {
                widest = Some((i, j, v));
            }
        }
    }
    if let Some((i, j, v)) = widest {
        eprintln!(
            "  Most polarized pair: @{} / @{} ({})",
            report.labels[i],
            report.labels[j],
            format!("{v:.4}").red()
        );
    }
}

pub fn display_clusters(outcome: &ClusterOutcome, dendrogram_path: &str) {
    eprintln!("\n{}", "=== Clustering ===".bold());
    eprintln!("  Merges: {}", outcome.merges.len());
    eprintln!("  Auxiliary value: {:.4}", outcome.auxiliary);
    eprintln!("  Dendrogram: {}", dendrogram_path.dimmed());
}
