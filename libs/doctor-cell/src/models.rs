use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub name: String,
    pub title: Option<String>,
    pub specialization: Option<String>,
    pub description: Option<String>,
    pub photo_path: Option<String>,
    pub is_active: bool,
    pub display_order: i32,
}

/// One weekly working interval for a doctor. A doctor may have several active
/// rows per weekday; the slot generator unions them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorSchedule {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub day_of_week: ScheduleDay,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_active: bool,
    pub notes: Option<String>,
    pub display_order: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleDay {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl ScheduleDay {
    /// Capitalized English name for customer-facing messages.
    pub fn name(&self) -> &'static str {
        match self {
            ScheduleDay::Monday => "Monday",
            ScheduleDay::Tuesday => "Tuesday",
            ScheduleDay::Wednesday => "Wednesday",
            ScheduleDay::Thursday => "Thursday",
            ScheduleDay::Friday => "Friday",
            ScheduleDay::Saturday => "Saturday",
            ScheduleDay::Sunday => "Sunday",
        }
    }
}

impl From<Weekday> for ScheduleDay {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => ScheduleDay::Monday,
            Weekday::Tue => ScheduleDay::Tuesday,
            Weekday::Wed => ScheduleDay::Wednesday,
            Weekday::Thu => ScheduleDay::Thursday,
            Weekday::Fri => ScheduleDay::Friday,
            Weekday::Sat => ScheduleDay::Saturday,
            Weekday::Sun => ScheduleDay::Sunday,
        }
    }
}

impl fmt::Display for ScheduleDay {
    // Wire value used in the day_of_week column
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name().to_lowercase())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holiday {
    pub id: Uuid,
    pub name: String,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub holiday_type: HolidayType,
    pub is_active: bool,
    pub is_recurring: bool,
    pub color: Option<String>,
}

impl Holiday {
    /// Whether this holiday blocks the given date. Recurring holidays repeat
    /// every year on the same month and day.
    pub fn applies_on(&self, date: NaiveDate) -> bool {
        use chrono::Datelike;

        if !self.is_active {
            return false;
        }
        if self.date == date {
            return true;
        }
        self.is_recurring && self.date.month() == date.month() && self.date.day() == date.day()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HolidayType {
    National,
    Religious,
    Custom,
}

/// A bookable 30-minute slot, derived per request and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// Slot start, minute granularity ("HH:MM").
    pub time: String,
    pub available: bool,
}

/// Merged working-hour bounds returned alongside the slots for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleWindow {
    pub start_time: String,
    pub end_time: String,
}

/// Result of a slot query. Business unavailability (holiday, doctor off that
/// day, fully booked) is expressed here, not as an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotAvailability {
    pub available: bool,
    pub slots: Vec<Slot>,
    pub message: Option<String>,
    pub schedule: Option<ScheduleWindow>,
}

impl SlotAvailability {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            available: false,
            slots: Vec::new(),
            message: Some(message.into()),
            schedule: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SlotError {
    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("{0}")]
    OutsideBookingWindow(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
