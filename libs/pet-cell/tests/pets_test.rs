use assert_matches::assert_matches;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pet_cell::models::{CreatePetRequest, PetError, PetSpecies};
use pet_cell::services::PetService;
use shared_utils::test_utils::TestConfig;

fn service(server: &MockServer) -> PetService {
    PetService::new(&TestConfig::with_supabase_url(&server.uri()).to_app_config())
}

fn pet_row(id: Uuid, user_id: Uuid, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "user_id": user_id,
        "name": name,
        "species": "cat",
        "breed": null,
        "birth_date": "2023-04-01",
        "gender": "female",
        "weight": 3.8,
        "color": null,
        "photo": null,
        "medical_history": null,
        "allergies": null,
        "is_active": true
    })
}

#[tokio::test]
async fn list_pets_returns_active_pets_only_for_owner() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/pets"))
        .and(query_param("user_id", format!("eq.{}", user_id)))
        .and(query_param("is_active", "eq.true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            pet_row(Uuid::new_v4(), user_id, "Luna"),
            pet_row(Uuid::new_v4(), user_id, "Milo")
        ])))
        .mount(&server)
        .await;

    let pets = service(&server)
        .list_pets(&user_id.to_string(), None)
        .await
        .unwrap();

    assert_eq!(pets.len(), 2);
    assert_eq!(pets[0].name, "Luna");
    assert_eq!(pets[1].species, PetSpecies::Cat);
}

#[tokio::test]
async fn create_pet_inserts_with_representation() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();
    let pet_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/rest/v1/pets"))
        .and(header("Prefer", "return=representation"))
        .and(body_partial_json(json!({
            "name": "Luna",
            "species": "cat",
            "is_active": true
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            pet_row(pet_id, user_id, "Luna")
        ])))
        .mount(&server)
        .await;

    let request = CreatePetRequest {
        name: "Luna".to_string(),
        species: PetSpecies::Cat,
        breed: None,
        birth_date: Some("2023-04-01".parse().unwrap()),
        gender: None,
        weight: Some(3.8),
        color: None,
        photo: None,
        medical_history: None,
        allergies: None,
    };

    let pet = service(&server)
        .create_pet(&user_id.to_string(), &request, None)
        .await
        .unwrap();

    assert_eq!(pet.id, pet_id);
    assert_eq!(pet.name, "Luna");
}

#[tokio::test]
async fn create_pet_rejects_blank_name_without_calling_storage() {
    let server = MockServer::start().await;

    let request = CreatePetRequest {
        name: "  ".to_string(),
        species: PetSpecies::Dog,
        breed: None,
        birth_date: None,
        gender: None,
        weight: None,
        color: None,
        photo: None,
        medical_history: None,
        allergies: None,
    };

    let err = service(&server)
        .create_pet(&Uuid::new_v4().to_string(), &request, None)
        .await
        .unwrap_err();

    assert_matches!(err, PetError::Validation(_));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn deactivating_someone_elses_pet_is_not_found() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();
    let pet_id = Uuid::new_v4();

    // owner filter matches nothing, PostgREST returns an empty array
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/pets"))
        .and(query_param("id", format!("eq.{}", pet_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let err = service(&server)
        .deactivate_pet(pet_id, &user_id.to_string(), None)
        .await
        .unwrap_err();

    assert_matches!(err, PetError::NotFound);
}
