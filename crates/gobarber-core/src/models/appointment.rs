use chrono::{DateTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use super::identity::null_as_empty;

/// One day of the provider's month as reported by
/// `/providers/{id}/month-availability`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct MonthAvailabilityItem {
    pub day: u32,
    pub available: bool,
}

/// Customer booked into an appointment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct AppointmentClient {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub avatar_url: String,
}

/// Appointment from `/appointments/me`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct Appointment {
    pub id: String,
    pub date: DateTime<Utc>,
    pub user: AppointmentClient,
}

impl Appointment {
    /// Start time as `HH:MM` in the given timezone
    pub fn hour_formatted<Tz: TimeZone>(&self, tz: &Tz) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        self.date.with_timezone(tz).format("%H:%M").to_string()
    }

    pub fn is_morning<Tz: TimeZone>(&self, tz: &Tz) -> bool {
        self.date.with_timezone(tz).hour() < 12
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    const APPOINTMENTS_JSON: &str = r#"[
        {"id":"a1","provider_id":"u1","user_id":"c1","date":"2021-05-20T11:00:00.000Z","created_at":"2021-05-19T10:00:00.000Z","updated_at":"2021-05-19T10:00:00.000Z","user":{"id":"c1","name":"Bruno","email":"b@c.com","avatar_url":null}},
        {"id":"a2","date":"2021-05-20T15:00:00.000Z","user":{"name":"Carla","avatar_url":"http://x/c.png"}}
    ]"#;

    #[test]
    fn test_parse_appointments_response() {
        let appointments: Vec<Appointment> =
            serde_json::from_str(APPOINTMENTS_JSON).expect("Failed to parse appointments JSON");
        assert_eq!(appointments.len(), 2);
        assert_eq!(appointments[0].user.name, "Bruno");
        assert_eq!(appointments[0].user.avatar_url, "");
        assert_eq!(appointments[1].user.avatar_url, "http://x/c.png");
    }

    #[test]
    fn test_hour_formatted_respects_timezone() {
        let appointments: Vec<Appointment> =
            serde_json::from_str(APPOINTMENTS_JSON).expect("Failed to parse appointments JSON");
        assert_eq!(appointments[0].hour_formatted(&Utc), "11:00");

        let sao_paulo = FixedOffset::west_opt(3 * 3600).expect("valid offset");
        assert_eq!(appointments[0].hour_formatted(&sao_paulo), "08:00");
        assert!(appointments[1].is_morning(&sao_paulo));
        assert!(!appointments[1].is_morning(&Utc));
    }

    #[test]
    fn test_parse_month_availability() {
        let json = r#"[{"day":1,"available":false},{"day":2,"available":true}]"#;
        let items: Vec<MonthAvailabilityItem> =
            serde_json::from_str(json).expect("Failed to parse availability JSON");
        assert_eq!(items[0], MonthAvailabilityItem { day: 1, available: false });
        assert!(items[1].available);
    }
}
