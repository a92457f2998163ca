use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{AuthToken, User};
use shared_models::error::AppError;

use crate::models::{CreatePetRequest, Pet, PetError, UpdatePetRequest};
use crate::services::PetService;

fn map_pet_error(err: PetError) -> AppError {
    match err {
        PetError::NotFound => AppError::NotFound("Pet not found".to_string()),
        PetError::Validation(msg) => AppError::ValidationError(msg),
        PetError::DatabaseError(msg) => AppError::Database(msg),
    }
}

pub async fn list_pets(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AuthToken>,
) -> Result<Json<Vec<Pet>>, AppError> {
    let service = PetService::new(&config);

    let pets = service
        .list_pets(&user.id, Some(token.as_str()))
        .await
        .map_err(map_pet_error)?;

    Ok(Json(pets))
}

pub async fn get_pet(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AuthToken>,
    Path(pet_id): Path<Uuid>,
) -> Result<Json<Pet>, AppError> {
    let service = PetService::new(&config);

    let pet = service
        .get_owned_pet(pet_id, &user.id, Some(token.as_str()))
        .await
        .map_err(map_pet_error)?
        .ok_or_else(|| AppError::NotFound("Pet not found".to_string()))?;

    Ok(Json(pet))
}

pub async fn create_pet(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AuthToken>,
    Json(request): Json<CreatePetRequest>,
) -> Result<(StatusCode, Json<Pet>), AppError> {
    let service = PetService::new(&config);

    let pet = service
        .create_pet(&user.id, &request, Some(token.as_str()))
        .await
        .map_err(map_pet_error)?;

    Ok((StatusCode::CREATED, Json(pet)))
}

pub async fn update_pet(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AuthToken>,
    Path(pet_id): Path<Uuid>,
    Json(request): Json<UpdatePetRequest>,
) -> Result<Json<Pet>, AppError> {
    let service = PetService::new(&config);

    let pet = service
        .update_pet(pet_id, &user.id, &request, Some(token.as_str()))
        .await
        .map_err(map_pet_error)?;

    Ok(Json(pet))
}

pub async fn deactivate_pet(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Extension(token): Extension<AuthToken>,
    Path(pet_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let service = PetService::new(&config);

    service
        .deactivate_pet(pet_id, &user.id, Some(token.as_str()))
        .await
        .map_err(map_pet_error)?;

    Ok(StatusCode::NO_CONTENT)
}
