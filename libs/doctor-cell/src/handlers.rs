use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{Doctor, DoctorSchedule, SlotAvailability, SlotError};
use crate::services::{DoctorService, ScheduleService, SlotService};

#[derive(Debug, Deserialize)]
pub struct SlotQuery {
    pub date: NaiveDate,
}

pub async fn list_doctors(
    State(config): State<Arc<AppConfig>>,
) -> Result<Json<Vec<Doctor>>, AppError> {
    let service = DoctorService::new(&config);

    let doctors = service
        .list_doctors(None)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(doctors))
}

pub async fn get_doctor(
    State(config): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Doctor>, AppError> {
    let service = DoctorService::new(&config);

    let doctor = service
        .get_doctor(doctor_id, None)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Doctor not found".to_string()))?;

    Ok(Json(doctor))
}

pub async fn get_doctor_schedules(
    State(config): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Vec<DoctorSchedule>>, AppError> {
    let service = ScheduleService::new(&config);

    let schedules = service
        .schedules_for_doctor(doctor_id, None)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(schedules))
}

pub async fn get_available_slots(
    State(config): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<SlotAvailability>, AppError> {
    info!("Slot lookup for doctor {} on {}", doctor_id, query.date);

    let service = SlotService::new(&config);

    let availability = service
        .available_slots(doctor_id, query.date, None)
        .await
        .map_err(|e| match e {
            SlotError::DoctorNotFound => AppError::NotFound("Doctor not found".to_string()),
            SlotError::OutsideBookingWindow(msg) => AppError::ValidationError(msg),
            SlotError::DatabaseError(msg) => AppError::Database(msg),
        })?;

    Ok(Json(availability))
}
