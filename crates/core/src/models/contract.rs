use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::errors::{ShiftError, ShiftResult};
use crate::models::schedule::validate_time_range;
use crate::timeline::parse_hour_range;

/// Standing work-hour contract of one staff member.
///
/// Each weekday holds an optional `"HH:MM-HH:MM"` range. Days without a range are
/// days off and produce no contract-layer entry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub staff_id: i32,
    pub monday_hours: Option<String>,
    pub tuesday_hours: Option<String>,
    pub wednesday_hours: Option<String>,
    pub thursday_hours: Option<String>,
    pub friday_hours: Option<String>,
    pub saturday_hours: Option<String>,
    pub sunday_hours: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Contract {
    pub fn hours_for(&self, weekday: Weekday) -> Option<&str> {
        let hours = match weekday {
            Weekday::Mon => &self.monday_hours,
            Weekday::Tue => &self.tuesday_hours,
            Weekday::Wed => &self.wednesday_hours,
            Weekday::Thu => &self.thursday_hours,
            Weekday::Fri => &self.friday_hours,
            Weekday::Sat => &self.saturday_hours,
            Weekday::Sun => &self.sunday_hours,
        };
        hours.as_deref().map(str::trim).filter(|h| !h.is_empty())
    }
}

/// Replaces a staff member's weekly hours. Blank or missing days are days off.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertContractRequest {
    pub monday_hours: Option<String>,
    pub tuesday_hours: Option<String>,
    pub wednesday_hours: Option<String>,
    pub thursday_hours: Option<String>,
    pub friday_hours: Option<String>,
    pub saturday_hours: Option<String>,
    pub sunday_hours: Option<String>,
}

impl UpsertContractRequest {
    pub fn validate(&self) -> ShiftResult<()> {
        let days = [
            ("monday", &self.monday_hours),
            ("tuesday", &self.tuesday_hours),
            ("wednesday", &self.wednesday_hours),
            ("thursday", &self.thursday_hours),
            ("friday", &self.friday_hours),
            ("saturday", &self.saturday_hours),
            ("sunday", &self.sunday_hours),
        ];
        for (day, hours) in days {
            let Some(hours) = hours.as_deref().map(str::trim).filter(|h| !h.is_empty()) else {
                continue;
            };
            let Some((start, end)) = parse_hour_range(hours) else {
                return Err(ShiftError::Validation(format!(
                    "Invalid {} hours '{}', expected HH:MM-HH:MM",
                    day, hours
                )));
            };
            validate_time_range(start, end).map_err(|_| {
                ShiftError::Validation(format!(
                    "Invalid {} hours '{}', must lie between 08:00 and 21:00",
                    day, hours
                ))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_hours_must_parse() {
        let mut request = UpsertContractRequest {
            monday_hours: Some("09:00-18:00".to_string()),
            tuesday_hours: Some(" ".to_string()),
            ..Default::default()
        };
        assert!(request.validate().is_ok());

        request.friday_hours = Some("18:00-09:00".to_string());
        assert!(request.validate().is_err());
    }

    #[test]
    fn contract_hours_must_fit_the_day_grid() {
        let request = UpsertContractRequest {
            monday_hours: Some("06:00-23:30".to_string()),
            ..Default::default()
        };
        assert!(matches!(request.validate(), Err(ShiftError::Validation(_))));

        let request = UpsertContractRequest {
            monday_hours: Some("08:00-21:00".to_string()),
            ..Default::default()
        };
        assert!(request.validate().is_ok());
    }
}
