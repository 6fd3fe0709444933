//! Provider dashboard: the day's appointments and the month calendar.
//!
//! `load_day` fetches both halves of the dashboard concurrently. The
//! derivations (`DaySchedule`, `MonthCalendar`) are pure so they can be
//! rendered by any front end.

use std::collections::BTreeSet;
use std::fmt::Display;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc, Weekday};
use tracing::debug;

use crate::api::{ApiClient, ApiError};
use crate::models::{Appointment, Identity, MonthAvailabilityItem};

/// Everything the dashboard needs for one selected day
#[derive(Debug, Clone)]
pub struct DayData {
    pub availability: Vec<MonthAvailabilityItem>,
    pub appointments: Vec<Appointment>,
}

/// Fetch the month availability and the day's appointments concurrently.
/// Fails if either request fails.
pub async fn load_day(api: &ApiClient, provider: &Identity, date: NaiveDate) -> Result<DayData, ApiError> {
    let (availability, appointments) = futures::try_join!(
        api.fetch_month_availability(&provider.id, date.year(), date.month()),
        api.fetch_day_appointments(date),
    )?;
    debug!(
        %date,
        days = availability.len(),
        appointments = appointments.len(),
        "Dashboard data loaded"
    );
    Ok(DayData {
        availability,
        appointments,
    })
}

/// An appointment with its display fields resolved for one timezone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledAppointment {
    pub appointment: Appointment,
    /// `HH:MM`
    pub hour: String,
    pub is_morning: bool,
}

/// The selected day's appointments split into morning and afternoon
#[derive(Debug, Clone)]
pub struct DaySchedule {
    pub date: NaiveDate,
    pub is_today: bool,
    appointments: Vec<ScheduledAppointment>,
    next: Option<usize>,
}

impl DaySchedule {
    pub fn new<Tz: TimeZone>(
        date: NaiveDate,
        mut appointments: Vec<Appointment>,
        tz: &Tz,
        now: DateTime<Utc>,
    ) -> Self
    where
        Tz::Offset: Display,
    {
        appointments.sort_by_key(|a| a.date);
        let is_today = now.with_timezone(tz).date_naive() == date;

        let appointments: Vec<ScheduledAppointment> = appointments
            .into_iter()
            .map(|appointment| ScheduledAppointment {
                hour: appointment.hour_formatted(tz),
                is_morning: appointment.is_morning(tz),
                appointment,
            })
            .collect();

        // Only today has a meaningful "up next"
        let next = if is_today {
            appointments.iter().position(|a| a.appointment.date > now)
        } else {
            None
        };

        Self {
            date,
            is_today,
            appointments,
            next,
        }
    }

    pub fn all(&self) -> &[ScheduledAppointment] {
        &self.appointments
    }

    pub fn morning(&self) -> impl Iterator<Item = &ScheduledAppointment> {
        self.appointments.iter().filter(|a| a.is_morning)
    }

    pub fn afternoon(&self) -> impl Iterator<Item = &ScheduledAppointment> {
        self.appointments.iter().filter(|a| !a.is_morning)
    }

    pub fn next(&self) -> Option<&ScheduledAppointment> {
        self.next.map(|i| &self.appointments[i])
    }

    pub fn is_empty(&self) -> bool {
        self.appointments.is_empty()
    }

    /// e.g. `Day 20 of May`
    pub fn date_text(&self) -> String {
        format!("Day {} of {}", self.date.format("%d"), self.date.format("%B"))
    }

    /// e.g. `Thursday`
    pub fn weekday_text(&self) -> String {
        self.date.format("%A").to_string()
    }
}

/// Which days of a month can be picked on the calendar.
///
/// Weekends are never bookable; weekdays the backend reports as full are
/// disabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthCalendar {
    pub year: i32,
    pub month: u32,
    unavailable: BTreeSet<u32>,
}

impl MonthCalendar {
    pub fn new(year: i32, month: u32, availability: &[MonthAvailabilityItem]) -> Self {
        let unavailable = availability
            .iter()
            .filter(|item| !item.available)
            .map(|item| item.day)
            .collect();
        Self {
            year,
            month,
            unavailable,
        }
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn days_in_month(&self) -> u32 {
        let Some(first) = self.first_day() else {
            return 0;
        };
        let next_month = if self.month == 12 {
            NaiveDate::from_ymd_opt(self.year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(self.year, self.month + 1, 1)
        };
        next_month
            .map(|next| (next - first).num_days() as u32)
            .unwrap_or(0)
    }

    pub fn date(&self, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, day)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn is_selectable(&self, day: u32) -> bool {
        match self.date(day) {
            Some(date) => !is_weekend(date) && !self.unavailable.contains(&day),
            None => false,
        }
    }

    /// Every day of the month that cannot be picked
    pub fn disabled_days(&self) -> Vec<NaiveDate> {
        (1..=self.days_in_month())
            .filter(|day| !self.is_selectable(*day))
            .filter_map(|day| self.date(day))
            .collect()
    }

    /// New selection after the user picks `candidate`; non-selectable picks
    /// keep the current selection.
    pub fn select(&self, current: NaiveDate, candidate: NaiveDate) -> NaiveDate {
        if self.contains(candidate) && self.is_selectable(candidate.day()) {
            candidate
        } else {
            current
        }
    }
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
