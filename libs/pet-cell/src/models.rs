use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An owner's pet profile. Pets are soft-deactivated rather than deleted so
/// past appointments keep a valid reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pet {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub species: PetSpecies,
    pub breed: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<PetGender>,
    pub weight: Option<f64>,
    pub color: Option<String>,
    pub photo: Option<String>,
    pub medical_history: Option<String>,
    pub allergies: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PetSpecies {
    Dog,
    Cat,
    Bird,
    Rabbit,
    Hamster,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PetGender {
    Male,
    Female,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePetRequest {
    pub name: String,
    pub species: PetSpecies,
    pub breed: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<PetGender>,
    pub weight: Option<f64>,
    pub color: Option<String>,
    pub photo: Option<String>,
    pub medical_history: Option<String>,
    pub allergies: Option<String>,
}

/// Partial update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePetRequest {
    pub name: Option<String>,
    pub species: Option<PetSpecies>,
    pub breed: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<PetGender>,
    pub weight: Option<f64>,
    pub color: Option<String>,
    pub photo: Option<String>,
    pub medical_history: Option<String>,
    pub allergies: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum PetError {
    #[error("Pet not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
