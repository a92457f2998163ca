use std::sync::Arc;

use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_utils::clock::{Clock, SystemClock};

use crate::models::{CreatePetRequest, Pet, PetError, UpdatePetRequest};

const MAX_NAME_LEN: usize = 100;

pub struct PetService {
    supabase: Arc<SupabaseClient>,
    clock: Arc<dyn Clock>,
}

impl PetService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &AppConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
            clock,
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>, clock: Arc<dyn Clock>) -> Self {
        Self { supabase, clock }
    }

    /// The caller's active pets, for the booking form and profile page.
    pub async fn list_pets(
        &self,
        user_id: &str,
        auth_token: Option<&str>,
    ) -> Result<Vec<Pet>, PetError> {
        debug!("Listing pets for user: {}", user_id);

        let path = format!(
            "/rest/v1/pets?user_id=eq.{}&is_active=eq.true&order=name.asc",
            user_id
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| PetError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .map(|v| serde_json::from_value(v).map_err(|e| PetError::DatabaseError(e.to_string())))
            .collect()
    }

    /// A pet owned by the caller. Someone else's pet id reads as not-found.
    pub async fn get_owned_pet(
        &self,
        pet_id: Uuid,
        user_id: &str,
        auth_token: Option<&str>,
    ) -> Result<Option<Pet>, PetError> {
        let path = format!(
            "/rest/v1/pets?id=eq.{}&user_id=eq.{}&is_active=eq.true",
            pet_id, user_id
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| PetError::DatabaseError(e.to_string()))?;

        match result.into_iter().next() {
            Some(value) => Ok(Some(
                serde_json::from_value(value).map_err(|e| PetError::DatabaseError(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    pub async fn create_pet(
        &self,
        user_id: &str,
        request: &CreatePetRequest,
        auth_token: Option<&str>,
    ) -> Result<Pet, PetError> {
        validate_pet_fields(
            Some(&request.name),
            request.birth_date,
            request.weight,
            self.clock.today(),
        )?;

        info!("Creating pet '{}' for user {}", request.name, user_id);

        let body = json!({
            "user_id": user_id,
            "name": request.name.trim(),
            "species": request.species,
            "breed": request.breed,
            "birth_date": request.birth_date,
            "gender": request.gender,
            "weight": request.weight,
            "color": request.color,
            "photo": request.photo,
            "medical_history": request.medical_history,
            "allergies": request.allergies,
            "is_active": true
        });

        let created: Vec<Pet> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/pets",
                auth_token,
                Some(body),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| PetError::DatabaseError(e.to_string()))?;

        created
            .into_iter()
            .next()
            .ok_or_else(|| PetError::DatabaseError("Insert returned no row".to_string()))
    }

    pub async fn update_pet(
        &self,
        pet_id: Uuid,
        user_id: &str,
        request: &UpdatePetRequest,
        auth_token: Option<&str>,
    ) -> Result<Pet, PetError> {
        validate_pet_fields(
            request.name.as_deref(),
            request.birth_date,
            request.weight,
            self.clock.today(),
        )?;

        let mut patch = Map::new();
        if let Some(name) = &request.name {
            patch.insert("name".to_string(), json!(name.trim()));
        }
        if let Some(species) = request.species {
            patch.insert("species".to_string(), json!(species));
        }
        if let Some(breed) = &request.breed {
            patch.insert("breed".to_string(), json!(breed));
        }
        if let Some(birth_date) = request.birth_date {
            patch.insert("birth_date".to_string(), json!(birth_date));
        }
        if let Some(gender) = request.gender {
            patch.insert("gender".to_string(), json!(gender));
        }
        if let Some(weight) = request.weight {
            patch.insert("weight".to_string(), json!(weight));
        }
        if let Some(color) = &request.color {
            patch.insert("color".to_string(), json!(color));
        }
        if let Some(photo) = &request.photo {
            patch.insert("photo".to_string(), json!(photo));
        }
        if let Some(medical_history) = &request.medical_history {
            patch.insert("medical_history".to_string(), json!(medical_history));
        }
        if let Some(allergies) = &request.allergies {
            patch.insert("allergies".to_string(), json!(allergies));
        }

        if patch.is_empty() {
            return Err(PetError::Validation("Nothing to update".to_string()));
        }

        let path = format!(
            "/rest/v1/pets?id=eq.{}&user_id=eq.{}&is_active=eq.true",
            pet_id, user_id
        );
        let updated: Vec<Pet> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                auth_token,
                Some(Value::Object(patch)),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| PetError::DatabaseError(e.to_string()))?;

        updated.into_iter().next().ok_or(PetError::NotFound)
    }

    /// Soft-deactivate. The row stays so appointment history keeps resolving.
    pub async fn deactivate_pet(
        &self,
        pet_id: Uuid,
        user_id: &str,
        auth_token: Option<&str>,
    ) -> Result<(), PetError> {
        info!("Deactivating pet {} for user {}", pet_id, user_id);

        let path = format!(
            "/rest/v1/pets?id=eq.{}&user_id=eq.{}&is_active=eq.true",
            pet_id, user_id
        );
        let updated: Vec<Pet> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                auth_token,
                Some(json!({ "is_active": false })),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| PetError::DatabaseError(e.to_string()))?;

        if updated.is_empty() {
            return Err(PetError::NotFound);
        }
        Ok(())
    }

    /// Hard delete, used only to roll back an inline creation that was part of
    /// a booking which later failed.
    pub async fn delete_pet(&self, pet_id: Uuid, auth_token: Option<&str>) -> Result<(), PetError> {
        let path = format!("/rest/v1/pets?id=eq.{}", pet_id);
        let _: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &path,
                auth_token,
                None,
                Some(representation_headers()),
            )
            .await
            .map_err(|e| PetError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}

fn representation_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Prefer", HeaderValue::from_static("return=representation"));
    headers
}

fn validate_pet_fields(
    name: Option<&str>,
    birth_date: Option<NaiveDate>,
    weight: Option<f64>,
    today: NaiveDate,
) -> Result<(), PetError> {
    if let Some(name) = name {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(PetError::Validation("Pet name is required".to_string()));
        }
        if trimmed.len() > MAX_NAME_LEN {
            return Err(PetError::Validation(format!(
                "Pet name must be at most {} characters",
                MAX_NAME_LEN
            )));
        }
    }

    if let Some(birth_date) = birth_date {
        if birth_date >= today {
            return Err(PetError::Validation(
                "Birth date must be before today".to_string(),
            ));
        }
    }

    if let Some(weight) = weight {
        if !weight.is_finite() || weight < 0.0 {
            return Err(PetError::Validation(
                "Weight must be zero or positive".to_string(),
            ));
        }
    }

    Ok(())
}
