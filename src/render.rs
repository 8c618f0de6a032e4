//! Plain-text rendering of load snapshots and history for the terminal.

use std::fmt::Display;

use chrono::{DateTime, TimeZone, Utc};

use crate::models::{Dose, DoseTier, DoseView, HistoryView, LoadView};

/// Terminal columns that correspond to a 100% wide bar.
const BAR_COLUMNS: usize = 30;

const FRESH: char = '●';
const MODERATE: char = '◐';
const FADING: char = '○';
const EXPIRED: char = '·';

fn tier_symbol(tier: DoseTier) -> char {
    match tier {
        DoseTier::Fresh => FRESH,
        DoseTier::Moderate => MODERATE,
        DoseTier::Fading => FADING,
        DoseTier::Expired => EXPIRED,
    }
}

/// A bar `width_percent` wide, padded to full width with light shading.
/// Anything above zero shows at least one filled column.
fn bar(width_percent: f64) -> String {
    let filled = (width_percent.clamp(0.0, 100.0) / 100.0 * BAR_COLUMNS as f64).round() as usize;
    let filled = if width_percent > 0.0 { filled.max(1) } else { 0 };
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_COLUMNS - filled))
}

fn days_ago(days: i64) -> String {
    if days == 1 {
        "1 day ago".to_string()
    } else {
        format!("{} days ago", days)
    }
}

fn local<Tz: TimeZone>(instant: &DateTime<Utc>, tz: &Tz) -> DateTime<Tz> {
    instant.with_timezone(tz)
}

/// Render the current load with one bar per dose, newest first.
///
/// Times are shown in `tz`.
pub fn render_load<Tz: TimeZone>(view: &LoadView, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    let mut output = String::new();
    output.push_str(&format!("{}\n", view.date.format("%A, %B %-d, %Y")));
    output.push_str(&format!(
        "Current load: {:.2}mg from {} active dose{}\n",
        view.total_load,
        view.dose_count,
        if view.dose_count == 1 { "" } else { "s" }
    ));

    if view.doses.is_empty() {
        output.push_str("\nNo doses recorded yet\n");
        return output;
    }

    for dose in &view.doses {
        output.push('\n');
        render_dose(&mut output, dose, tz);
    }
    output
}

fn render_dose<Tz: TimeZone>(output: &mut String, view: &DoseView, tz: &Tz)
where
    Tz::Offset: Display,
{
    let decayed = &view.dose;
    output.push_str(&format!(
        "{} {}mg  {}  {}\n",
        tier_symbol(view.display.tier),
        decayed.dose.amount,
        local(&decayed.dose.timestamp, tz).format("%b %-d, %-I:%M %p"),
        days_ago(decayed.elapsed_days),
    ));
    output.push_str(&format!(
        "  {}  {:.2}mg  {:.1}% remaining\n",
        bar(view.display.bar_width),
        decayed.current_amount,
        decayed.percentage_remaining,
    ));
    if let Some(note) = &decayed.dose.note {
        output.push_str(&format!("  {}\n", note));
    }
}

/// Render the trailing history as one bar per day, oldest first.
pub fn render_history(view: &HistoryView) -> String {
    let mut output = format!("Load history ({} days)\n", view.days.len());

    for bar_day in &view.days {
        let day = &bar_day.day;
        let load = if day.total_load > 0.0 {
            format!("{:.1}mg", day.total_load)
        } else {
            "—".to_string()
        };
        let marker = if day.is_today { "  ◀ today" } else { "" };

        output.push_str(&format!(
            "{:<6}  {}  {}  {}{}\n",
            day.date.format("%b %-d").to_string(),
            day.date.format("%a"),
            bar(bar_day.bar_width),
            load,
            marker,
        ));
    }
    output
}

/// Render the raw dose log as a table, in the order given.
pub fn render_doses<Tz: TimeZone>(doses: &[Dose], tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    if doses.is_empty() {
        return "No doses recorded yet\n".to_string();
    }

    let mut output = String::new();
    for dose in doses {
        output.push_str(&format!(
            "{}  {:>6}mg  {}",
            dose.id,
            dose.amount,
            local(&dose.timestamp, tz).format("%Y-%m-%d %H:%M"),
        ));
        if let Some(note) = &dose.note {
            output.push_str(&format!("  {}", note));
        }
        output.push('\n');
    }
    output
}
