use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A single logged administration of the tracked substance.
///
/// The persistence layer owns the canonical list of doses. The engine only
/// reads them and derives new values; it never mutates a `Dose` in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dose {
    /// Opaque unique identifier assigned by the store.
    pub id: String,
    /// Administered amount in milligrams. Always positive once validated.
    pub amount: f64,
    /// When the dose was taken.
    pub timestamp: DateTime<Utc>,
    #[serde(default, alias = "notes", skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A dose evaluated at a specific instant.
///
/// The `dose` fields are flattened into the JSON representation, with the
/// computed figures alongside them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecayedDose {
    #[serde(flatten)]
    pub dose: Dose,
    /// Milligrams still active, between 0 and `dose.amount`.
    pub current_amount: f64,
    /// `current_amount` as a share of the original amount, 0 to 100.
    pub percentage_remaining: f64,
    /// Whole days between the dose and the evaluation instant.
    pub elapsed_days: i64,
}

impl DecayedDose {
    /// A dose with nothing eliminated yet.
    pub(crate) fn intact(dose: &Dose) -> Self {
        Self {
            dose: dose.clone(),
            current_amount: dose.amount,
            percentage_remaining: 100.0,
            elapsed_days: 0,
        }
    }
}

/// Snapshot of the total active load at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyLoad {
    /// Calendar day of `as_of` in the zone the snapshot was taken in.
    pub date: NaiveDate,
    pub as_of: DateTime<Utc>,
    /// Sum of `current_amount` over `doses`.
    pub total_load: f64,
    /// Eligible doses in the order they were supplied.
    pub doses: Vec<DecayedDose>,
}

/// One point of the trailing load history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayLoad {
    pub date: NaiveDate,
    pub total_load: f64,
    /// Number of doses that contributed to `total_load`.
    pub dose_count: usize,
    /// Set on the most recent point of the window.
    pub is_today: bool,
}

impl From<&DailyLoad> for DayLoad {
    fn from(load: &DailyLoad) -> Self {
        Self {
            date: load.date,
            total_load: load.total_load,
            dose_count: load.doses.len(),
            is_today: false,
        }
    }
}
