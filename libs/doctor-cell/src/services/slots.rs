use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use reqwest::Method;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_utils::clock::{validate_booking_date, Clock, SystemClock};

use crate::models::{ScheduleDay, ScheduleWindow, Slot, SlotAvailability, SlotError};
use crate::services::doctor::DoctorService;
use crate::services::holiday::HolidayService;
use crate::services::schedule::ScheduleService;

/// Fixed appointment length. Every slot and every booking is exactly this long.
pub const SLOT_MINUTES: i64 = 30;

/// Appointment statuses that hold a slot. Cancelled and no-show appointments
/// free their time; completed ones are left in place since they cannot occupy
/// a future slot.
const BLOCKING_STATUSES: &str = "(pending,confirmed,in_progress)";

#[derive(Debug, Deserialize)]
struct BookedTimeRow {
    appointment_time: String,
}

/// Computes the bookable 30-minute slots for a (doctor, date) pair by
/// combining the holiday calendar, the doctor's weekly schedule, and the
/// existing appointments on that date.
pub struct SlotService {
    supabase: Arc<SupabaseClient>,
    doctors: DoctorService,
    holidays: HolidayService,
    schedules: ScheduleService,
    clock: Arc<dyn Clock>,
}

impl SlotService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &AppConfig, clock: Arc<dyn Clock>) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        Self {
            doctors: DoctorService::with_client(Arc::clone(&supabase)),
            holidays: HolidayService::with_client(Arc::clone(&supabase)),
            schedules: ScheduleService::with_client(Arc::clone(&supabase)),
            supabase,
            clock,
        }
    }

    /// Bookable slots for a doctor on a date within the current clinic week.
    ///
    /// Holiday, day off, and fully-booked days come back as an "unavailable"
    /// result with a reason message; only bad input or storage failures are
    /// errors.
    pub async fn available_slots(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<SlotAvailability, SlotError> {
        let today = self.clock.today();
        validate_booking_date(today, date).map_err(SlotError::OutsideBookingWindow)?;

        self.doctors
            .get_doctor(doctor_id, auth_token)
            .await
            .map_err(|e| SlotError::DatabaseError(e.to_string()))?
            .ok_or(SlotError::DoctorNotFound)?;

        if let Some(holiday) = self
            .holidays
            .holiday_for(date, auth_token)
            .await
            .map_err(|e| SlotError::DatabaseError(e.to_string()))?
        {
            debug!("{} is a holiday: {}", date, holiday.name);
            return Ok(SlotAvailability::unavailable(format!(
                "Selected date is a clinic holiday: {}",
                holiday.name
            )));
        }

        let day = ScheduleDay::from(date.weekday());
        let schedules = self
            .schedules
            .schedules_for_day(doctor_id, day, auth_token)
            .await
            .map_err(|e| SlotError::DatabaseError(e.to_string()))?;

        if schedules.is_empty() {
            return Ok(SlotAvailability::unavailable(format!(
                "Doctor is not practicing on {}",
                day.name()
            )));
        }

        let booked = self.booked_times(doctor_id, date, auth_token).await?;

        let windows: Vec<(NaiveTime, NaiveTime)> = schedules
            .iter()
            .map(|s| (s.start_time, s.end_time))
            .collect();

        // On the requested day itself, slots whose start has already passed
        // are silently dropped.
        let past_cutoff = (date == today).then(|| self.clock.now_clinic().time());

        let slots = generate_slots(&windows, &booked, past_cutoff);

        let window_start = windows.iter().map(|(start, _)| *start).min();
        let window_end = windows.iter().map(|(_, end)| *end).max();
        let schedule = match (window_start, window_end) {
            (Some(start), Some(end)) => Some(ScheduleWindow {
                start_time: start.format("%H:%M").to_string(),
                end_time: end.format("%H:%M").to_string(),
            }),
            _ => None,
        };

        debug!(
            "Doctor {} on {}: {} open slots",
            doctor_id,
            date,
            slots.len()
        );

        let available = !slots.is_empty();
        Ok(SlotAvailability {
            available,
            message: (!available).then(|| "No slots available for this date".to_string()),
            slots,
            schedule,
        })
    }

    /// The booked-set: "HH:MM" start times already claimed by non-terminal
    /// appointments for this doctor and date.
    async fn booked_times(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<HashSet<String>, SlotError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&appointment_date=eq.{}&status=in.{}&select=appointment_time",
            doctor_id, date, BLOCKING_STATUSES
        );

        let rows: Vec<BookedTimeRow> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| SlotError::DatabaseError(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| normalize_time(&row.appointment_time))
            .collect())
    }
}

/// Truncate a stored time ("HH:MM:SS" or "HH:MM") to minute granularity.
fn normalize_time(time: &str) -> String {
    time.chars().take(5).collect()
}

/// Pure slot generation over the union of working intervals.
///
/// Candidates step forward in fixed 30-minute increments from each interval
/// start; the last candidate is the one whose end lands exactly on or before
/// the interval end. Overlapping intervals produce each start time once.
pub fn generate_slots(
    windows: &[(NaiveTime, NaiveTime)],
    booked: &HashSet<String>,
    past_cutoff: Option<NaiveTime>,
) -> Vec<Slot> {
    let mut starts: Vec<NaiveTime> = Vec::new();
    let mut seen: HashSet<NaiveTime> = HashSet::new();

    for (window_start, window_end) in windows {
        let mut current = *window_start;
        loop {
            let (slot_end, wrapped) = current.overflowing_add_signed(Duration::minutes(SLOT_MINUTES));
            if wrapped != 0 || slot_end > *window_end {
                break;
            }
            if seen.insert(current) {
                starts.push(current);
            }
            current = slot_end;
        }
    }

    starts.sort();

    starts
        .into_iter()
        .filter(|start| past_cutoff.map_or(true, |cutoff| *start > cutoff))
        .map(|start| start.format("%H:%M").to_string())
        .filter(|time| !booked.contains(time))
        .map(|time| Slot {
            time,
            available: true,
        })
        .collect()
}
