use std::sync::Arc;

use chrono::{Duration, Timelike};
use rand::{distributions::Alphanumeric, Rng};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use doctor_cell::services::DoctorService;
use pet_cell::models::PetError;
use pet_cell::services::PetService;
use shared_config::AppConfig;
use shared_database::supabase::{is_conflict_error, SupabaseClient};
use shared_utils::clock::{validate_booking_date, Clock, SystemClock};

use crate::models::{
    Appointment, AppointmentStatus, BookingError, CreateBookingRequest, Review,
    SubmitReviewRequest,
};
use crate::services::lifecycle::validate_transition;

const MAX_COMPLAINT_LEN: usize = 1000;
const MAX_COMMENT_LEN: usize = 1000;
const SLOT_MINUTES: i64 = 30;

/// Unique-code inserts rarely collide; a couple of retries is plenty before
/// treating the storage as broken.
const BOOKING_CODE_ATTEMPTS: usize = 3;

pub struct BookingService {
    supabase: Arc<SupabaseClient>,
    doctors: DoctorService,
    pets: PetService,
    clock: Arc<dyn Clock>,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &AppConfig, clock: Arc<dyn Clock>) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        Self {
            doctors: DoctorService::with_client(Arc::clone(&supabase)),
            pets: PetService::with_client(Arc::clone(&supabase), Arc::clone(&clock)),
            supabase,
            clock,
        }
    }

    /// Create a pending appointment for the caller.
    ///
    /// The slot is re-checked against current appointments right before the
    /// insert, and the storage unique index on (doctor, date, time) closes the
    /// remaining race; either way a collision surfaces as `SlotTaken`. When
    /// the request registers a pet inline and a later step fails, the pet is
    /// deleted again so a failed booking leaves nothing behind.
    pub async fn create_booking(
        &self,
        user_id: &str,
        request: &CreateBookingRequest,
        auth_token: Option<&str>,
    ) -> Result<Appointment, BookingError> {
        validate_complaint(&request.complaint)?;

        if request.service_ids.is_empty() {
            return Err(BookingError::Validation(
                "At least one service must be selected".to_string(),
            ));
        }

        validate_booking_date(self.clock.today(), request.appointment_date)
            .map_err(BookingError::OutsideBookingWindow)?;

        if request.appointment_time.minute() % 30 != 0 || request.appointment_time.second() != 0 {
            return Err(BookingError::Validation(
                "Appointment time must start on a 30-minute boundary".to_string(),
            ));
        }

        let (end_time, wrapped) = request
            .appointment_time
            .overflowing_add_signed(Duration::minutes(SLOT_MINUTES));
        if wrapped != 0 {
            return Err(BookingError::Validation(
                "Appointment time is too close to midnight".to_string(),
            ));
        }

        self.doctors
            .get_doctor(request.doctor_id, auth_token)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?
            .ok_or(BookingError::DoctorNotFound)?;

        // Resolve the pet before touching the appointments table so a bad pet
        // reference never produces a half-written booking.
        let (pet_id, inline_pet) = match (request.pet_id, &request.pet) {
            (Some(pet_id), _) => {
                self.pets
                    .get_owned_pet(pet_id, user_id, auth_token)
                    .await
                    .map_err(map_pet_error)?
                    .ok_or(BookingError::PetNotFound)?;
                (pet_id, None)
            }
            (None, Some(pet_request)) => {
                let pet = self
                    .pets
                    .create_pet(user_id, pet_request, auth_token)
                    .await
                    .map_err(map_pet_error)?;
                (pet.id, Some(pet.id))
            }
            (None, None) => {
                return Err(BookingError::Validation(
                    "Either pet_id or pet details are required".to_string(),
                ));
            }
        };

        let result = self
            .insert_appointment(user_id, pet_id, end_time, request, auth_token)
            .await;

        match result {
            Ok(appointment) => Ok(appointment),
            Err(err) => {
                self.rollback_inline_pet(inline_pet, auth_token).await;
                Err(err)
            }
        }
    }

    async fn insert_appointment(
        &self,
        user_id: &str,
        pet_id: Uuid,
        end_time: chrono::NaiveTime,
        request: &CreateBookingRequest,
        auth_token: Option<&str>,
    ) -> Result<Appointment, BookingError> {
        if !self.slot_is_free(request, auth_token).await? {
            return Err(BookingError::SlotTaken);
        }

        let mut last_error = None;
        for _ in 0..BOOKING_CODE_ATTEMPTS {
            let booking_code = generate_booking_code();
            let body = json!({
                "booking_code": booking_code,
                "user_id": user_id,
                "pet_id": pet_id,
                "doctor_id": request.doctor_id,
                "appointment_date": request.appointment_date,
                "appointment_time": request.appointment_time,
                "end_time": end_time,
                "status": AppointmentStatus::Pending,
                "complaint": request.complaint.trim()
            });

            let inserted: Result<Vec<Appointment>, _> = self
                .supabase
                .request_with_headers(
                    Method::POST,
                    "/rest/v1/appointments",
                    auth_token,
                    Some(body),
                    Some(representation_headers()),
                )
                .await;

            match inserted {
                Ok(rows) => {
                    let appointment = rows.into_iter().next().ok_or_else(|| {
                        BookingError::DatabaseError("Insert returned no row".to_string())
                    })?;

                    info!(
                        "Booked {} for user {} with doctor {} at {} {}",
                        appointment.booking_code,
                        user_id,
                        request.doctor_id,
                        request.appointment_date,
                        request.appointment_time
                    );

                    return match self
                        .attach_services(appointment.id, &request.service_ids, auth_token)
                        .await
                    {
                        Ok(()) => Ok(appointment),
                        Err(err) => {
                            self.delete_appointment(appointment.id, auth_token).await;
                            Err(err)
                        }
                    };
                }
                Err(err) if is_conflict_error(&err) => {
                    // A booking_code collision gets a fresh code; any other
                    // unique violation is the slot index.
                    if err.to_string().contains("booking_code") {
                        warn!("Booking code collision, regenerating");
                        last_error = Some(err);
                        continue;
                    }
                    return Err(BookingError::SlotTaken);
                }
                Err(err) => return Err(BookingError::DatabaseError(err.to_string())),
            }
        }

        Err(BookingError::DatabaseError(format!(
            "Could not allocate a unique booking code: {}",
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    async fn slot_is_free(
        &self,
        request: &CreateBookingRequest,
        auth_token: Option<&str>,
    ) -> Result<bool, BookingError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&appointment_date=eq.{}&appointment_time=eq.{}&status=in.(pending,confirmed,in_progress)&select=id",
            request.doctor_id, request.appointment_date, request.appointment_time
        );
        let existing: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        Ok(existing.is_empty())
    }

    async fn attach_services(
        &self,
        appointment_id: Uuid,
        service_ids: &[Uuid],
        auth_token: Option<&str>,
    ) -> Result<(), BookingError> {
        let rows: Vec<Value> = service_ids
            .iter()
            .map(|service_id| {
                json!({
                    "appointment_id": appointment_id,
                    "service_id": service_id
                })
            })
            .collect();

        let _: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointment_services",
                auth_token,
                Some(Value::Array(rows)),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn delete_appointment(&self, appointment_id: Uuid, auth_token: Option<&str>) {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Result<Vec<Value>, _> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &path,
                auth_token,
                None,
                Some(representation_headers()),
            )
            .await;

        if let Err(err) = result {
            warn!(
                "Failed to roll back appointment {}: {}",
                appointment_id, err
            );
        }
    }

    async fn rollback_inline_pet(&self, inline_pet: Option<Uuid>, auth_token: Option<&str>) {
        if let Some(pet_id) = inline_pet {
            if let Err(err) = self.pets.delete_pet(pet_id, auth_token).await {
                warn!("Failed to roll back inline pet {}: {}", pet_id, err);
            }
        }
    }

    /// Booking detail by code, visible only to its owner.
    pub async fn get_by_code(
        &self,
        booking_code: &str,
        user_id: &str,
        auth_token: Option<&str>,
    ) -> Result<Appointment, BookingError> {
        let path = format!(
            "/rest/v1/appointments?booking_code=eq.{}&user_id=eq.{}",
            booking_code, user_id
        );
        self.fetch_one(&path, auth_token).await
    }

    /// Booking detail by code without an owner filter, for staff operations.
    pub async fn get_by_code_any(
        &self,
        booking_code: &str,
        auth_token: Option<&str>,
    ) -> Result<Appointment, BookingError> {
        let path = format!("/rest/v1/appointments?booking_code=eq.{}", booking_code);
        self.fetch_one(&path, auth_token).await
    }

    /// The caller's bookings, most recent first.
    pub async fn history(
        &self,
        user_id: &str,
        auth_token: Option<&str>,
    ) -> Result<Vec<Appointment>, BookingError> {
        let path = format!(
            "/rest/v1/appointments?user_id=eq.{}&order=appointment_date.desc,appointment_time.desc",
            user_id
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .map(|v| {
                serde_json::from_value(v).map_err(|e| BookingError::DatabaseError(e.to_string()))
            })
            .collect()
    }

    /// Customer-initiated cancellation. Only bookings that have not started
    /// yet (pending or confirmed) can be cancelled by their owner.
    pub async fn cancel(
        &self,
        booking_code: &str,
        user_id: &str,
        reason: Option<&str>,
        auth_token: Option<&str>,
    ) -> Result<Appointment, BookingError> {
        let appointment = self.get_by_code(booking_code, user_id, auth_token).await?;

        if !matches!(
            appointment.status,
            AppointmentStatus::Pending | AppointmentStatus::Confirmed
        ) {
            return Err(BookingError::Validation(format!(
                "A {} appointment cannot be cancelled",
                appointment.status
            )));
        }

        info!("Cancelling booking {} for user {}", booking_code, user_id);

        let body = json!({
            "status": AppointmentStatus::Cancelled,
            "cancelled_at": self.clock.now_utc(),
            "cancelled_by": user_id,
            "cancellation_reason": reason
        });

        self.patch_appointment(appointment.id, body, auth_token)
            .await
    }

    /// Staff status update with lifecycle validation. Entering `in_progress`
    /// stamps the check-in time, entering `completed` the completion time.
    pub async fn update_status(
        &self,
        booking_code: &str,
        new_status: AppointmentStatus,
        staff_user_id: &str,
        auth_token: Option<&str>,
    ) -> Result<Appointment, BookingError> {
        let appointment = self.get_by_code_any(booking_code, auth_token).await?;

        validate_transition(appointment.status, new_status)?;

        let now = self.clock.now_utc();
        let body = match new_status {
            AppointmentStatus::InProgress => json!({
                "status": new_status,
                "checked_in_at": now
            }),
            AppointmentStatus::Completed => json!({
                "status": new_status,
                "completed_at": now
            }),
            AppointmentStatus::Cancelled => json!({
                "status": new_status,
                "cancelled_at": now,
                "cancelled_by": staff_user_id
            }),
            _ => json!({ "status": new_status }),
        };

        info!(
            "Staff {} moving booking {} from {} to {}",
            staff_user_id, booking_code, appointment.status, new_status
        );

        self.patch_appointment(appointment.id, body, auth_token)
            .await
    }

    /// One review per completed appointment, written by its owner.
    pub async fn submit_review(
        &self,
        booking_code: &str,
        user_id: &str,
        request: &SubmitReviewRequest,
        auth_token: Option<&str>,
    ) -> Result<Review, BookingError> {
        if !(1..=5).contains(&request.rating) {
            return Err(BookingError::Validation(
                "Rating must be between 1 and 5".to_string(),
            ));
        }
        if let Some(comment) = &request.comment {
            if comment.len() > MAX_COMMENT_LEN {
                return Err(BookingError::Validation(format!(
                    "Comment must be at most {} characters",
                    MAX_COMMENT_LEN
                )));
            }
        }

        let appointment = self.get_by_code(booking_code, user_id, auth_token).await?;

        if appointment.status != AppointmentStatus::Completed {
            return Err(BookingError::Validation(
                "Only completed appointments can be reviewed".to_string(),
            ));
        }

        let path = format!(
            "/rest/v1/reviews?appointment_id=eq.{}&select=id",
            appointment.id
        );
        let existing: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;
        if !existing.is_empty() {
            return Err(BookingError::AlreadyReviewed);
        }

        let body = json!({
            "user_id": user_id,
            "appointment_id": appointment.id,
            "doctor_id": appointment.doctor_id,
            "rating": request.rating,
            "comment": request.comment,
            "is_visible": true
        });

        let created: Vec<Review> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/reviews",
                auth_token,
                Some(body),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| {
                // The unique index on appointment_id closes the double-submit race.
                if is_conflict_error(&e) {
                    BookingError::AlreadyReviewed
                } else {
                    BookingError::DatabaseError(e.to_string())
                }
            })?;

        created
            .into_iter()
            .next()
            .ok_or_else(|| BookingError::DatabaseError("Insert returned no row".to_string()))
    }

    async fn fetch_one(
        &self,
        path: &str,
        auth_token: Option<&str>,
    ) -> Result<Appointment, BookingError> {
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, path, auth_token, None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        match result.into_iter().next() {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| BookingError::DatabaseError(e.to_string())),
            None => Err(BookingError::NotFound),
        }
    }

    async fn patch_appointment(
        &self,
        appointment_id: Uuid,
        body: Value,
        auth_token: Option<&str>,
    ) -> Result<Appointment, BookingError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let updated: Vec<Appointment> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                auth_token,
                Some(body),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        updated.into_iter().next().ok_or(BookingError::NotFound)
    }
}

fn representation_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Prefer", HeaderValue::from_static("return=representation"));
    headers
}

fn map_pet_error(err: PetError) -> BookingError {
    match err {
        PetError::NotFound => BookingError::PetNotFound,
        PetError::Validation(msg) => BookingError::Validation(msg),
        PetError::DatabaseError(msg) => BookingError::DatabaseError(msg),
    }
}

fn validate_complaint(complaint: &str) -> Result<(), BookingError> {
    let trimmed = complaint.trim();
    if trimmed.is_empty() {
        return Err(BookingError::Validation("Complaint is required".to_string()));
    }
    if trimmed.len() > MAX_COMPLAINT_LEN {
        return Err(BookingError::Validation(format!(
            "Complaint must be at most {} characters",
            MAX_COMPLAINT_LEN
        )));
    }
    Ok(())
}

/// "BK-" plus eight random uppercase alphanumerics.
pub fn generate_booking_code() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(|b| (b as char).to_ascii_uppercase())
        .collect();
    format!("BK-{}", suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_code_has_expected_shape() {
        for _ in 0..100 {
            let code = generate_booking_code();
            assert!(code.starts_with("BK-"));
            let suffix = &code[3..];
            assert_eq!(suffix.len(), 8);
            assert!(suffix
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn complaint_validation() {
        assert!(validate_complaint("Cat keeps sneezing").is_ok());
        assert!(validate_complaint("   ").is_err());
        assert!(validate_complaint(&"x".repeat(1001)).is_err());
        assert!(validate_complaint(&"x".repeat(1000)).is_ok());
    }
}
