use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, Utc, Weekday};

/// The clinic runs on Western Indonesia Time (WIB, UTC+7). WIB has no daylight
/// saving, so a fixed offset is exact. All "today" / "now" decisions in the
/// booking domain must go through this offset, never the server's local time.
pub const CLINIC_UTC_OFFSET_SECS: i32 = 7 * 3600;

pub fn clinic_offset() -> FixedOffset {
    FixedOffset::east_opt(CLINIC_UTC_OFFSET_SECS).expect("valid WIB offset")
}

/// Injectable time source. Domain services hold a `&dyn Clock` instead of
/// calling `Utc::now()` directly so tests can pin "today" deterministically.
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;

    /// Wall-clock time at the clinic.
    fn now_clinic(&self) -> NaiveDateTime {
        self.now_utc().with_timezone(&clinic_offset()).naive_local()
    }

    /// Calendar date at the clinic.
    fn today(&self) -> NaiveDate {
        self.now_clinic().date()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Test clock pinned to a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    pub now: DateTime<Utc>,
}

impl FixedClock {
    /// Pin the clock to a clinic-local wall-clock time.
    pub fn at_clinic_time(local: NaiveDateTime) -> Self {
        let now = local
            .and_local_timezone(clinic_offset())
            .single()
            .expect("fixed offset is unambiguous")
            .with_timezone(&Utc);
        Self { now }
    }
}

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.now
    }
}

/// Monday..Sunday bounds of the calendar week containing `today`. Customers may
/// only book within this window.
pub fn current_week_bounds(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let days_from_monday = today.weekday().num_days_from_monday() as i64;
    let monday = today - Duration::days(days_from_monday);
    let sunday = monday + Duration::days(6);
    (monday, sunday)
}

/// Validate the booking-window rule shared by the slot query and the booking
/// write path: the date must not be in the past and must fall inside the
/// current clinic week.
pub fn validate_booking_date(today: NaiveDate, date: NaiveDate) -> Result<(), String> {
    if date < today {
        return Err("Date must not be in the past".to_string());
    }

    let (monday, sunday) = current_week_bounds(today);
    if date < monday || date > sunday {
        return Err(format!(
            "Date must fall within the current week ({} - {})",
            monday.format("%d %b"),
            sunday.format("%d %b %Y")
        ));
    }

    Ok(())
}
