//! Display mappings derived from evaluated doses.
//!
//! These are cosmetic and never feed back into the numbers.

use serde::{Deserialize, Serialize};

use crate::model::{DayLoad, DecayedDose};

/// Age at which a dose bar reaches its minimum width.
const BAR_FADE_DAYS: f64 = 30.0;
const MIN_BAR_WIDTH: f64 = 10.0;
const MAX_BAR_WIDTH: f64 = 100.0;

const MIN_OPACITY: f64 = 0.1;
const MAX_OPACITY: f64 = 1.0;

const MIN_HISTORY_BAR_WIDTH: f64 = 2.0;

/// Bar width in percent for a dose taken `elapsed_days` ago.
///
/// Shrinks linearly from 100% on the day of the dose to 10% at 30 days and
/// stays there.
pub fn bar_width(elapsed_days: i64) -> f64 {
    let days = elapsed_days.max(0) as f64;
    if days >= BAR_FADE_DAYS {
        return MIN_BAR_WIDTH;
    }
    (MAX_BAR_WIDTH - days / BAR_FADE_DAYS * (MAX_BAR_WIDTH - MIN_BAR_WIDTH)).max(MIN_BAR_WIDTH)
}

/// Opacity for a dose with `percentage_remaining` left, in `[0.1, 1.0]`.
pub fn color_intensity(percentage_remaining: f64) -> f64 {
    (percentage_remaining / 100.0).clamp(MIN_OPACITY, MAX_OPACITY)
}

/// Qualitative strength of a dose, from most to least vivid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoseTier {
    Fresh,
    Moderate,
    Fading,
    Expired,
}

impl DoseTier {
    /// Tier for a percentage; lower bounds are inclusive.
    pub fn classify(percentage_remaining: f64) -> Self {
        if percentage_remaining >= 75.0 {
            Self::Fresh
        } else if percentage_remaining >= 50.0 {
            Self::Moderate
        } else if percentage_remaining >= 25.0 {
            Self::Fading
        } else {
            Self::Expired
        }
    }

    /// Hex display colour.
    pub fn color(&self) -> &'static str {
        match self {
            Self::Fresh => "#14b8a6",
            Self::Moderate => "#5eead4",
            Self::Fading => "#ccfbf1",
            Self::Expired => "#f0fdfa",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fresh => "fresh",
            Self::Moderate => "moderate",
            Self::Fading => "fading",
            Self::Expired => "expired",
        }
    }

    fn rgb(&self) -> (u8, u8, u8) {
        let hex = self.color().trim_start_matches('#');
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(0);
        (channel(0), channel(2), channel(4))
    }
}

/// CSS `rgba()` colour of the tier for `percentage_remaining` at `opacity`.
pub fn rgba(percentage_remaining: f64, opacity: f64) -> String {
    let (r, g, b) = DoseTier::classify(percentage_remaining).rgb();
    format!("rgba({}, {}, {}, {})", r, g, b, opacity)
}

/// Everything a front end needs to draw one dose bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoseDisplay {
    pub bar_width: f64,
    pub color_intensity: f64,
    pub tier: DoseTier,
    pub color: String,
}

impl DoseDisplay {
    pub fn for_dose(dose: &DecayedDose) -> Self {
        let intensity = color_intensity(dose.percentage_remaining);
        Self {
            bar_width: bar_width(dose.elapsed_days),
            color_intensity: intensity,
            tier: DoseTier::classify(dose.percentage_remaining),
            color: rgba(dose.percentage_remaining, intensity),
        }
    }
}

/// One bar of the history chart, scaled against the busiest day shown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryBar {
    #[serde(flatten)]
    pub day: DayLoad,
    /// Load relative to the largest load in the window, 0 to 1.
    pub intensity: f64,
    pub bar_width: f64,
    pub opacity: f64,
    pub color: String,
}

impl HistoryBar {
    /// Scale a history window for display.
    ///
    /// The reference load never drops below 1mg, so a window of tiny loads is
    /// not stretched to full width.
    pub fn scale(history: &[DayLoad]) -> Vec<Self> {
        let max_load = history
            .iter()
            .map(|day| day.total_load)
            .fold(1.0_f64, f64::max);

        history
            .iter()
            .map(|day| {
                let intensity = (day.total_load / max_load).clamp(0.0, 1.0);
                let opacity = 0.3 + intensity * 0.7;
                Self {
                    day: day.clone(),
                    intensity,
                    bar_width: (intensity * 100.0).max(MIN_HISTORY_BAR_WIDTH),
                    opacity,
                    color: rgba(intensity * 100.0, opacity),
                }
            })
            .collect()
    }
}
