use std::path::Path;

use anyhow::Result;

use storyreel::config::AppConfig;
use storyreel::estimate_duration;

use super::load_passages;

pub fn cmd_budget(
    config: &AppConfig,
    passages: &Path,
    budget: Option<f64>,
    rate: Option<f64>,
    keep_links: bool,
) -> Result<()> {
    let segments = load_passages(passages, keep_links)?;

    let mut budgeter = config.budgeter();
    if let Some(budget) = budget {
        budgeter.time_budget_secs = budget;
    }
    if let Some(rate) = rate {
        budgeter.chars_per_second = rate;
    }

    println!(
        "⏱️  Budget: {:.1}s at {:.2} chars/s (+{:.2}s spacing)",
        budgeter.time_budget_secs, budgeter.chars_per_second, budgeter.spacing_secs
    );

    let selection = budgeter.fitting_prefix(&segments);
    for segment in &segments {
        let marker = if segment.index < selection.segments.len() { "✅" } else { "  " };
        let estimate = estimate_duration(&segment.text, budgeter.chars_per_second);
        println!(
            "{marker} #{:<3} {:>6.2}s  {}",
            segment.index,
            estimate,
            preview(&segment.text, 60)
        );
    }

    println!(
        "\n{} of {} passages, ~{:.1}s",
        selection.segments.len(),
        selection.offered,
        selection.estimated_secs
    );

    // Surface the same error a render would hit
    budgeter.select(&segments)?;
    Ok(())
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}…")
    }
}
