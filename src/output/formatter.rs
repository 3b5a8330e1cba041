use owo_colors::OwoColorize;
use std::io::IsTerminal;

use crate::valuation::adjust::AdjustmentValue;
use crate::valuation::snapshot::{Change, SnapshotDelta};
use crate::valuation::ValuationSnapshot;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a dollar amount in compact notation ($1.5k, $2.3M, $847)
pub fn format_money(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let abs = amount.abs();
    let formatted = if abs >= 1_000_000.0 {
        format!("{:.1}M", abs / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{:.1}k", abs / 1_000.0)
    } else {
        format!("{:.0}", abs)
    };

    // Trim trailing .0 (e.g., "1.0k" -> "1k")
    let trimmed = formatted.replace(".0M", "M").replace(".0k", "k");

    format!("{}${}", sign, trimmed)
}

/// Format an EBITDA multiple, e.g. "4.34x"
pub fn format_multiple(multiple: f64) -> String {
    format!("{:.2}x", multiple)
}

fn format_rate(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}

fn format_signed(delta: f64, decimals: usize) -> String {
    if delta >= 0.0 {
        format!("+{:.*}", decimals, delta)
    } else {
        format!("{:.*}", decimals, delta)
    }
}

fn heading(text: &str, use_colors: bool) -> String {
    if use_colors {
        text.bold().to_string()
    } else {
        text.to_string()
    }
}

fn row(label: &str, value: String, use_colors: bool) -> String {
    let label = format!("{:<22}", label);
    if use_colors {
        format!("  {}{}", label.dimmed(), value)
    } else {
        format!("  {}{}", label, value)
    }
}

/// Full report for one snapshot.
///
/// Sections: scores, multiples, enterprise value band, value gap, and the
/// adjustment trail. `verbose` adds the per-factor breakdown.
pub fn format_snapshot(snapshot: &ValuationSnapshot, use_colors: bool, verbose: bool) -> String {
    let mut lines = Vec::new();

    let title = format!(
        "{} / {} ({})",
        snapshot.company_id,
        snapshot.round_id,
        snapshot.as_of.format("%Y-%m-%d")
    );
    lines.push(heading(&title, use_colors));

    // Scores
    let core = if snapshot.core.profiled {
        format!("{:.1}", snapshot.core_points())
    } else {
        format!("{:.1} (no profile, neutral)", snapshot.core_points())
    };
    lines.push(row("Core score", core, use_colors));
    lines.push(row(
        "Buyer readiness",
        format!(
            "{:.1} ({} answers, {} of weight assessed)",
            snapshot.bri_points(),
            snapshot.answered_questions,
            format_rate(snapshot.assessed_coverage)
        ),
        use_colors,
    ));
    for score in &snapshot.category_scores {
        let value = if score.is_assessed() {
            format!("{:.1}", score.score * 100.0)
        } else {
            "not assessed".to_string()
        };
        lines.push(row(&format!("  {}", score.category), value, use_colors));
    }
    if verbose {
        for factor in &snapshot.core.factors {
            lines.push(row(
                &format!("  {}", factor.factor),
                format!("{} ({:.2})", factor.value, factor.score),
                use_colors,
            ));
        }
    }

    // Multiples
    lines.push(String::new());
    lines.push(heading("Multiples", use_colors));
    lines.push(row(
        &format!("Industry ({})", snapshot.industry),
        format!(
            "{} - {} (median {})",
            format_multiple(snapshot.industry_range.low),
            format_multiple(snapshot.industry_range.high),
            format_multiple(snapshot.industry_range.median())
        ),
        use_colors,
    ));
    lines.push(row(
        "Base",
        format_multiple(snapshot.multiple.base_multiple),
        use_colors,
    ));
    lines.push(row(
        "Final",
        format!(
            "{} (discount {}, alpha {})",
            format_multiple(snapshot.multiple.final_multiple),
            format_rate(snapshot.multiple.discount_fraction),
            snapshot.alpha
        ),
        use_colors,
    ));
    lines.push(row(
        "Quality-adjusted",
        format_multiple(snapshot.adjusted.quality_adjusted_multiple),
        use_colors,
    ));
    lines.push(row(
        "Risk-adjusted",
        format_multiple(snapshot.adjusted.risk_adjusted_multiple),
        use_colors,
    ));

    // Value
    lines.push(String::new());
    lines.push(heading("Value", use_colors));
    match snapshot.ebitda.adjusted_ebitda {
        Some(ebitda) => lines.push(row("Adjusted EBITDA", format_money(ebitda), use_colors)),
        None => lines.push(row(
            "Adjusted EBITDA",
            "unknown (dollar values are zero)".to_string(),
            use_colors,
        )),
    }
    if verbose && snapshot.has_ebitda() {
        for item in &snapshot.ebitda.add_backs {
            lines.push(row(
                &format!("  + {}", item.name),
                format_money(item.amount),
                use_colors,
            ));
        }
        for item in &snapshot.ebitda.deductions {
            lines.push(row(
                &format!("  - {}", item.name),
                format_money(item.amount),
                use_colors,
            ));
        }
        if snapshot.ebitda.owner_comp_adjustment != 0.0 {
            lines.push(row(
                "  Owner comp",
                format_money(snapshot.ebitda.owner_comp_adjustment),
                use_colors,
            ));
        }
    }
    lines.push(row(
        "Current value",
        format_money(snapshot.multiple.current_value),
        use_colors,
    ));
    lines.push(row(
        "Potential value",
        format_money(snapshot.multiple.potential_value),
        use_colors,
    ));
    lines.push(row(
        "Enterprise value",
        format!(
            "{} - {} (mid {})",
            format_money(snapshot.adjusted.ev_low),
            format_money(snapshot.adjusted.ev_high),
            format_money(snapshot.adjusted.ev_mid)
        ),
        use_colors,
    ));

    // Gap
    lines.push(String::new());
    lines.push(heading("Value gap", use_colors));
    lines.push(row("Total", format_money(snapshot.gap.total_gap), use_colors));
    lines.push(row(
        "Addressable",
        format_money(snapshot.gap.addressable_gap),
        use_colors,
    ));
    for gap in &snapshot.category_gaps {
        lines.push(row(
            &format!("  {}", gap.category),
            format!("{} ({})", format_money(gap.amount), format_rate(gap.share)),
            use_colors,
        ));
    }
    lines.push(row(
        "Structural",
        format_money(snapshot.gap.structural_gap),
        use_colors,
    ));
    lines.push(row(
        "Aspirational",
        format_money(snapshot.gap.aspirational_gap),
        use_colors,
    ));

    // Adjustments
    if !snapshot.adjusted.adjustments.is_empty() {
        lines.push(String::new());
        lines.push(heading("Adjustments", use_colors));
        for entry in &snapshot.adjusted.adjustments {
            let value = match entry.value {
                AdjustmentValue::Impact(impact) => format!("{}x", format_signed(impact, 2)),
                AdjustmentValue::Rate(rate) => format!("-{}", format_rate(rate)),
            };
            let line = format!("  {:<34}{:>8}  {}", entry.name, value, entry.explanation);
            lines.push(line);
        }
    }

    lines.join("\n")
}

/// One line per snapshot: company, round, final multiple, EV mid, total gap.
pub fn format_summary_table(snapshots: &[ValuationSnapshot], use_colors: bool) -> String {
    if snapshots.is_empty() {
        return "No valuations computed.".to_string();
    }

    snapshots
        .iter()
        .enumerate()
        .map(|(idx, snapshot)| {
            let index_str = format!("{:>2}.", idx + 1);
            let multiple = format!("{:>7}", format_multiple(snapshot.multiple.final_multiple));
            let ev = format!("{:>8}", format_money(snapshot.adjusted.ev_mid));
            let gap = format!("{:>8}", format_money(snapshot.gap.total_gap));
            if use_colors {
                format!(
                    "{} {}  {}  gap {}  {}",
                    index_str.dimmed(),
                    multiple.bold(),
                    ev,
                    gap,
                    snapshot.id.underline()
                )
            } else {
                format!(
                    "{} {}  {}  gap {}  {}",
                    index_str, multiple, ev, gap, snapshot.id
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn change_row(label: &str, change: &Change, render: fn(f64) -> String, use_colors: bool) -> String {
    let delta = if change.delta.abs() < 1e-9 {
        "=".to_string()
    } else if change.delta > 0.0 {
        format!("+{}", render(change.delta))
    } else {
        format!("-{}", render(-change.delta))
    };
    let delta = if use_colors {
        if change.delta > 1e-9 {
            delta.green().to_string()
        } else if change.delta < -1e-9 {
            delta.red().to_string()
        } else {
            delta
        }
    } else {
        delta
    };
    row(
        label,
        format!("{} -> {}  ({})", render(change.before), render(change.after), delta),
        use_colors,
    )
}

fn points(value: f64) -> String {
    format!("{:.1}", value)
}

/// Before/after report between two snapshots of the same company.
pub fn format_delta(delta: &SnapshotDelta, use_colors: bool) -> String {
    let mut lines = vec![heading(
        &format!("{} -> {}", delta.previous_id, delta.current_id),
        use_colors,
    )];
    lines.push(change_row("Core score", &delta.core_score, points, use_colors));
    lines.push(change_row("Buyer readiness", &delta.bri, points, use_colors));
    for category in &delta.categories {
        lines.push(change_row(
            &format!("  {}", category.category),
            &category.change,
            points,
            use_colors,
        ));
    }
    lines.push(change_row(
        "Final multiple",
        &delta.final_multiple,
        format_multiple,
        use_colors,
    ));
    lines.push(change_row(
        "Current value",
        &delta.current_value,
        format_money,
        use_colors,
    ));
    lines.push(change_row("EV mid", &delta.ev_mid, format_money, use_colors));
    lines.push(change_row(
        "Addressable gap",
        &delta.addressable_gap,
        format_money,
        use_colors,
    ));
    lines.push(change_row(
        "Structural gap",
        &delta.structural_gap,
        format_money,
        use_colors,
    ));
    lines.push(change_row(
        "Aspirational gap",
        &delta.aspirational_gap,
        format_money,
        use_colors,
    ));
    lines.join("\n")
}
