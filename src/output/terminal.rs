// Colored terminal output for the ranked term list.
//
// All terminal-specific formatting lives here; the coordinator only ever
// produces the ordered (term, count) sequence.

use colored::Colorize;

use crate::coordinator::RunOutcome;

/// Display the ranked term list and the skipped-document report.
pub fn display_ranking(outcome: &RunOutcome) {
    if outcome.ranking.is_empty() {
        println!("No significant terms found.");
        display_failures(outcome);
        return;
    }

    println!(
        "\n{}",
        format!(
            "=== Top {} terms across {} documents ===",
            outcome.ranking.len(),
            outcome.documents_total
        )
        .bold()
    );
    println!();

    let max_count = outcome.ranking.first().map(|r| r.count).unwrap_or(1).max(1);
    let bar_width: usize = 30;

    for (i, ranked) in outcome.ranking.iter().enumerate() {
        let filled = ((ranked.count as f64 / max_count as f64) * bar_width as f64).round() as usize;
        let bar = format!(
            "[{}{}]",
            "=".repeat(filled.max(1)),
            " ".repeat(bar_width.saturating_sub(filled.max(1)))
        );

        let colored_bar = if ranked.count * 2 >= max_count {
            bar.bright_green()
        } else if ranked.count * 5 >= max_count {
            bar.bright_yellow()
        } else {
            bar.bright_blue()
        };

        println!(
            "  {:>4}. {:<24} {} {}",
            i + 1,
            ranked.term.bold(),
            colored_bar,
            ranked.count
        );
    }
    println!();

    display_failures(outcome);
}

fn display_failures(outcome: &RunOutcome) {
    if outcome.failed.is_empty() {
        return;
    }

    println!(
        "  {} {} document(s) could not be analyzed:",
        "!".red().bold(),
        outcome.failed.len()
    );
    for failed in &outcome.failed {
        println!("    * {} — {}", failed.source, failed.reason.dimmed());
    }
    println!();
}
