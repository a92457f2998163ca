use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};

use shared_config::AppConfig;
use shared_models::auth::{AuthToken, User};
use shared_models::error::AppError;

use crate::models::{
    Appointment, BookingError, CancelBookingRequest, CreateBookingRequest, Review,
    SubmitReviewRequest, UpdateStatusRequest,
};
use crate::services::BookingService;

fn map_booking_error(err: BookingError) -> AppError {
    match err {
        BookingError::OutsideBookingWindow(msg) => AppError::ValidationError(msg),
        BookingError::DoctorNotFound => AppError::NotFound("Doctor not found".to_string()),
        BookingError::PetNotFound => AppError::NotFound("Pet not found".to_string()),
        BookingError::NotFound => AppError::NotFound("Booking not found".to_string()),
        BookingError::SlotTaken => {
            AppError::Conflict("This slot has just been taken, please pick another time".to_string())
        }
        err @ BookingError::InvalidTransition { .. } => AppError::ValidationError(err.to_string()),
        BookingError::AlreadyReviewed => {
            AppError::Conflict("This appointment has already been reviewed".to_string())
        }
        BookingError::Validation(msg) => AppError::ValidationError(msg),
        BookingError::DatabaseError(msg) => AppError::Database(msg),
    }
}

pub async fn create_booking(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AuthToken>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    let service = BookingService::new(&config);

    let appointment = service
        .create_booking(&user.id, &request, Some(token.as_str()))
        .await
        .map_err(map_booking_error)?;

    Ok((StatusCode::CREATED, Json(appointment)))
}

pub async fn booking_history(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AuthToken>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let service = BookingService::new(&config);

    let bookings = service
        .history(&user.id, Some(token.as_str()))
        .await
        .map_err(map_booking_error)?;

    Ok(Json(bookings))
}

pub async fn get_booking(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AuthToken>,
    Path(booking_code): Path<String>,
) -> Result<Json<Appointment>, AppError> {
    let service = BookingService::new(&config);

    let appointment = service
        .get_by_code(&booking_code, &user.id, Some(token.as_str()))
        .await
        .map_err(map_booking_error)?;

    Ok(Json(appointment))
}

pub async fn cancel_booking(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AuthToken>,
    Path(booking_code): Path<String>,
    Json(request): Json<CancelBookingRequest>,
) -> Result<Json<Appointment>, AppError> {
    let service = BookingService::new(&config);

    let appointment = service
        .cancel(
            &booking_code,
            &user.id,
            request.reason.as_deref(),
            Some(token.as_str()),
        )
        .await
        .map_err(map_booking_error)?;

    Ok(Json(appointment))
}

pub async fn update_status(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AuthToken>,
    Path(booking_code): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Appointment>, AppError> {
    if !user.is_staff() {
        return Err(AppError::Forbidden(
            "Only staff can update appointment status".to_string(),
        ));
    }

    let service = BookingService::new(&config);

    let appointment = service
        .update_status(
            &booking_code,
            request.status,
            &user.id,
            Some(token.as_str()),
        )
        .await
        .map_err(map_booking_error)?;

    Ok(Json(appointment))
}

pub async fn submit_review(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AuthToken>,
    Path(booking_code): Path<String>,
    Json(request): Json<SubmitReviewRequest>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    let service = BookingService::new(&config);

    let review = service
        .submit_review(&booking_code, &user.id, &request, Some(token.as_str()))
        .await
        .map_err(map_booking_error)?;

    Ok((StatusCode::CREATED, Json(review)))
}
