use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Local date-time layouts accepted besides RFC 3339 (as sent by an HTML
/// `datetime-local` field).
const LOCAL_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Input for creating a dose, or replacing one in full.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DoseInput {
    /// Amount in milligrams. Required and must be positive.
    pub amount: Option<f64>,
    /// When the dose was taken. Defaults to now on create and to the stored
    /// value on update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, alias = "notes", skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Reasons a dose submission is rejected.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Invalid dose amount")]
    InvalidAmount,

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Cannot enter a future date")]
    FutureTimestamp,
}

/// A submission that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidDose {
    pub amount: f64,
    pub timestamp: Option<DateTime<Utc>>,
    pub note: Option<String>,
}

/// Fields of a dose about to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDose {
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
    pub note: Option<String>,
}

impl DoseInput {
    pub fn new(amount: f64) -> Self {
        Self {
            amount: Some(amount),
            ..Self::default()
        }
    }

    pub fn at(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Check the submission against `now`.
    ///
    /// Rejects a missing, non-positive or non-finite amount, a timestamp that
    /// does not parse, and a timestamp strictly after `now`. Blank notes are
    /// dropped.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<ValidDose, ValidationError> {
        let amount = match self.amount {
            Some(amount) if amount.is_finite() && amount > 0.0 => amount,
            _ => return Err(ValidationError::InvalidAmount),
        };

        let timestamp = match self.timestamp.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                let parsed = parse_timestamp(raw)?;
                if parsed > now {
                    return Err(ValidationError::FutureTimestamp);
                }
                Some(parsed)
            }
        };

        let note = self
            .note
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        Ok(ValidDose {
            amount,
            timestamp,
            note,
        })
    }
}

impl ValidDose {
    /// Fill in a missing timestamp.
    pub fn or_timestamp(self, fallback: DateTime<Utc>) -> NewDose {
        NewDose {
            amount: self.amount,
            timestamp: self.timestamp.unwrap_or(fallback),
            note: self.note,
        }
    }
}

/// Parse an RFC 3339 instant, or a date-time without offset read in the
/// local time zone.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ValidationError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    LOCAL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        // A wall-clock time skipped by a DST change has no instant.
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| ValidationError::InvalidTimestamp(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-04-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn accepts_positive_amount_without_timestamp() {
        let valid = DoseInput::new(2.5).validate(now()).unwrap();

        assert_eq!(valid.amount, 2.5);
        assert!(valid.timestamp.is_none());
        assert_eq!(valid.clone().or_timestamp(now()).timestamp, now());
    }

    #[test]
    fn rejects_missing_zero_negative_and_nan_amounts() {
        for amount in [None, Some(0.0), Some(-1.0), Some(f64::NAN), Some(f64::INFINITY)] {
            let input = DoseInput {
                amount,
                ..DoseInput::default()
            };
            assert_eq!(input.validate(now()), Err(ValidationError::InvalidAmount));
        }
    }

    #[test]
    fn rejects_unparseable_timestamp() {
        let result = DoseInput::new(1.0).at("last tuesday").validate(now());
        assert!(matches!(result, Err(ValidationError::InvalidTimestamp(_))));
    }

    #[test]
    fn rejects_future_timestamp() {
        let future = (now() + Duration::minutes(1)).to_rfc3339();
        let result = DoseInput::new(1.0).at(future).validate(now());
        assert_eq!(result, Err(ValidationError::FutureTimestamp));
    }

    #[test]
    fn accepts_timestamp_equal_to_now() {
        let valid = DoseInput::new(1.0).at(now().to_rfc3339()).validate(now()).unwrap();
        assert_eq!(valid.timestamp, Some(now()));
    }

    #[test]
    fn parses_rfc3339_with_offset() {
        let parsed = parse_timestamp("2024-01-01T09:00:00+02:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-01-01T07:00:00+00:00");
    }

    #[test]
    fn parses_local_datetime_without_seconds() {
        let parsed = parse_timestamp("2024-01-01T09:30").unwrap();
        let expected = Local
            .from_local_datetime(
                &NaiveDateTime::parse_from_str("2024-01-01T09:30:00", "%Y-%m-%dT%H:%M:%S").unwrap(),
            )
            .earliest()
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(parsed, expected);
    }

    #[test]
    fn blank_note_is_dropped_and_legacy_key_is_accepted() {
        let input: DoseInput =
            serde_json::from_str(r#"{"amount": 2.0, "notes": "  "}"#).unwrap();
        assert!(input.validate(now()).unwrap().note.is_none());

        let input: DoseInput =
            serde_json::from_str(r#"{"amount": 2.0, "notes": " left thigh "}"#).unwrap();
        assert_eq!(input.validate(now()).unwrap().note.as_deref(), Some("left thigh"));
    }
}
