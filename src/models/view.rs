use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use halflife_core::model::{DailyLoad, DayLoad, DecayedDose};
use halflife_core::presentation::{DoseDisplay, HistoryBar};

/// A decayed dose together with how to draw it.
///
/// The decayed dose fields are flattened into the JSON response; drawing
/// hints sit under `display`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoseView {
    #[serde(flatten)]
    pub dose: DecayedDose,
    pub display: DoseDisplay,
}

impl From<DecayedDose> for DoseView {
    fn from(dose: DecayedDose) -> Self {
        let display = DoseDisplay::for_dose(&dose);
        Self { dose, display }
    }
}

/// Current load snapshot as served by `GET /users/{user_id}/load`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadView {
    pub date: NaiveDate,
    pub as_of: DateTime<Utc>,
    pub total_load: f64,
    pub dose_count: usize,
    /// Newest dose first.
    pub doses: Vec<DoseView>,
}

impl From<DailyLoad> for LoadView {
    fn from(load: DailyLoad) -> Self {
        let mut doses: Vec<DoseView> = load.doses.into_iter().map(Into::into).collect();
        doses.sort_by(|a, b| b.dose.dose.timestamp.cmp(&a.dose.dose.timestamp));

        Self {
            date: load.date,
            as_of: load.as_of,
            total_load: load.total_load,
            dose_count: doses.len(),
            doses,
        }
    }
}

/// Trailing load history, oldest day first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryView {
    pub days: Vec<HistoryBar>,
}

impl From<Vec<DayLoad>> for HistoryView {
    fn from(history: Vec<DayLoad>) -> Self {
        Self {
            days: HistoryBar::scale(&history),
        }
    }
}

/// Response to clearing a user's dose log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearedResponse {
    pub deleted: usize,
}

/// A dose row exactly as stored, timestamps as their stored text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDose {
    pub id: String,
    pub amount: f64,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: String,
}

/// Raw dump of one user's log, served by `GET /users/{user_id}/debug`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoseLogDump {
    pub total_doses: usize,
    pub doses: Vec<StoredDose>,
}
