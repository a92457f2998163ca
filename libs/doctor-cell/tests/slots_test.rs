use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use doctor_cell::models::SlotError;
use doctor_cell::services::SlotService;
use shared_utils::clock::FixedClock;
use shared_utils::test_utils::TestConfig;

// Wednesday of the test week; the clinic clock is pinned to 08:00 WIB.
const TODAY: &str = "2025-06-18";

fn pinned_clock(local: &str) -> Arc<FixedClock> {
    Arc::new(FixedClock::at_clinic_time(local.parse().unwrap()))
}

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

async fn mock_doctor(server: &MockServer, doctor_id: Uuid) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", format!("eq.{}", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": doctor_id,
            "name": "Dr. Rina Wijaya",
            "title": "drh.",
            "specialization": "Small animals",
            "description": null,
            "photo_path": null,
            "is_active": true,
            "display_order": 1
        }])))
        .mount(server)
        .await;
}

async fn mock_no_holidays(server: &MockServer, on: &str) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/holidays"))
        .and(query_param("date", format!("eq.{}", on)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/holidays"))
        .and(query_param("is_recurring", "eq.true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;
}

async fn mock_schedules(server: &MockServer, doctor_id: Uuid, day: &str, rows: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_schedules"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .and(query_param("day_of_week", format!("eq.{}", day)))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows))
        .mount(server)
        .await;
}

async fn mock_appointments(server: &MockServer, rows: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows))
        .mount(server)
        .await;
}

fn schedule_row(doctor_id: Uuid, day: &str, start: &str, end: &str) -> serde_json::Value {
    json!({
        "id": Uuid::new_v4(),
        "doctor_id": doctor_id,
        "day_of_week": day,
        "start_time": start,
        "end_time": end,
        "is_active": true,
        "notes": null,
        "display_order": 1
    })
}

fn slot_service(server: &MockServer, now_local: &str) -> SlotService {
    let config = TestConfig::with_supabase_url(&server.uri()).to_app_config();
    SlotService::with_clock(&config, pinned_clock(now_local))
}

#[tokio::test]
async fn morning_shift_produces_half_hour_slots() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    mock_doctor(&server, doctor_id).await;
    mock_no_holidays(&server, "2025-06-19").await;
    mock_schedules(
        &server,
        doctor_id,
        "thursday",
        json!([schedule_row(doctor_id, "thursday", "09:00:00", "12:00:00")]),
    )
    .await;
    mock_appointments(&server, json!([])).await;

    let service = slot_service(&server, &format!("{}T08:00:00", TODAY));
    let result = service
        .available_slots(doctor_id, date("2025-06-19"), None)
        .await
        .unwrap();

    assert!(result.available);
    let times: Vec<&str> = result.slots.iter().map(|s| s.time.as_str()).collect();
    assert_eq!(
        times,
        vec!["09:00", "09:30", "10:00", "10:30", "11:00", "11:30"]
    );

    let window = result.schedule.unwrap();
    assert_eq!(window.start_time, "09:00");
    assert_eq!(window.end_time, "12:00");
}

#[tokio::test]
async fn booked_times_are_removed() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    mock_doctor(&server, doctor_id).await;
    mock_no_holidays(&server, "2025-06-19").await;
    mock_schedules(
        &server,
        doctor_id,
        "thursday",
        json!([schedule_row(doctor_id, "thursday", "09:00:00", "12:00:00")]),
    )
    .await;
    mock_appointments(
        &server,
        json!([
            {"appointment_time": "10:00:00"},
            {"appointment_time": "11:30:00"}
        ]),
    )
    .await;

    let service = slot_service(&server, &format!("{}T08:00:00", TODAY));
    let result = service
        .available_slots(doctor_id, date("2025-06-19"), None)
        .await
        .unwrap();

    let times: Vec<&str> = result.slots.iter().map(|s| s.time.as_str()).collect();
    assert_eq!(times, vec!["09:00", "09:30", "10:30", "11:00"]);
}

#[tokio::test]
async fn slots_already_started_today_are_hidden() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    mock_doctor(&server, doctor_id).await;
    mock_no_holidays(&server, TODAY).await;
    mock_schedules(
        &server,
        doctor_id,
        "wednesday",
        json!([schedule_row(doctor_id, "wednesday", "09:00:00", "12:00:00")]),
    )
    .await;
    mock_appointments(&server, json!([])).await;

    // 10:15 at the clinic: 09:00, 09:30, 10:00 have started
    let service = slot_service(&server, &format!("{}T10:15:00", TODAY));
    let result = service
        .available_slots(doctor_id, date(TODAY), None)
        .await
        .unwrap();

    let times: Vec<&str> = result.slots.iter().map(|s| s.time.as_str()).collect();
    assert_eq!(times, vec!["10:30", "11:00", "11:30"]);
}

#[tokio::test]
async fn holiday_short_circuits_with_message() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    mock_doctor(&server, doctor_id).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/holidays"))
        .and(query_param("date", "eq.2025-06-19"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": Uuid::new_v4(),
            "name": "Clinic Anniversary",
            "date": "2025-06-19",
            "description": null,
            "holiday_type": "custom",
            "is_active": true,
            "is_recurring": false,
            "color": null
        }])))
        .mount(&server)
        .await;

    let service = slot_service(&server, &format!("{}T08:00:00", TODAY));
    let result = service
        .available_slots(doctor_id, date("2025-06-19"), None)
        .await
        .unwrap();

    assert!(!result.available);
    assert!(result.slots.is_empty());
    assert_eq!(
        result.message.as_deref(),
        Some("Selected date is a clinic holiday: Clinic Anniversary")
    );
}

#[tokio::test]
async fn day_without_schedule_is_unavailable() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    mock_doctor(&server, doctor_id).await;
    mock_no_holidays(&server, "2025-06-22").await;
    mock_schedules(&server, doctor_id, "sunday", json!([])).await;

    let service = slot_service(&server, &format!("{}T08:00:00", TODAY));
    let result = service
        .available_slots(doctor_id, date("2025-06-22"), None)
        .await
        .unwrap();

    assert!(!result.available);
    assert_eq!(
        result.message.as_deref(),
        Some("Doctor is not practicing on Sunday")
    );
}

#[tokio::test]
async fn split_shift_rows_are_unioned() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    mock_doctor(&server, doctor_id).await;
    mock_no_holidays(&server, "2025-06-19").await;
    mock_schedules(
        &server,
        doctor_id,
        "thursday",
        json!([
            schedule_row(doctor_id, "thursday", "09:00:00", "11:00:00"),
            schedule_row(doctor_id, "thursday", "14:00:00", "15:30:00")
        ]),
    )
    .await;
    mock_appointments(&server, json!([])).await;

    let service = slot_service(&server, &format!("{}T08:00:00", TODAY));
    let result = service
        .available_slots(doctor_id, date("2025-06-19"), None)
        .await
        .unwrap();

    let times: Vec<&str> = result.slots.iter().map(|s| s.time.as_str()).collect();
    assert_eq!(
        times,
        vec!["09:00", "09:30", "10:00", "10:30", "14:00", "14:30", "15:00"]
    );

    let window = result.schedule.unwrap();
    assert_eq!(window.start_time, "09:00");
    assert_eq!(window.end_time, "15:30");
}

#[tokio::test]
async fn past_date_is_rejected() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    let service = slot_service(&server, &format!("{}T08:00:00", TODAY));
    let err = service
        .available_slots(doctor_id, date("2025-06-17"), None)
        .await
        .unwrap_err();

    assert_matches!(err, SlotError::OutsideBookingWindow(msg) if msg == "Date must not be in the past");
}

#[tokio::test]
async fn next_week_is_rejected() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    let service = slot_service(&server, &format!("{}T08:00:00", TODAY));
    let err = service
        .available_slots(doctor_id, date("2025-06-23"), None)
        .await
        .unwrap_err();

    assert_matches!(err, SlotError::OutsideBookingWindow(msg) if msg.contains("current week"));
}

#[tokio::test]
async fn unknown_doctor_is_not_found() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let service = slot_service(&server, &format!("{}T08:00:00", TODAY));
    let err = service
        .available_slots(doctor_id, date("2025-06-19"), None)
        .await
        .unwrap_err();

    assert_matches!(err, SlotError::DoctorNotFound);
}

#[tokio::test]
async fn fully_booked_day_reports_no_slots() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    mock_doctor(&server, doctor_id).await;
    mock_no_holidays(&server, "2025-06-19").await;
    mock_schedules(
        &server,
        doctor_id,
        "thursday",
        json!([schedule_row(doctor_id, "thursday", "09:00:00", "10:00:00")]),
    )
    .await;
    mock_appointments(
        &server,
        json!([
            {"appointment_time": "09:00:00"},
            {"appointment_time": "09:30:00"}
        ]),
    )
    .await;

    let service = slot_service(&server, &format!("{}T08:00:00", TODAY));
    let result = service
        .available_slots(doctor_id, date("2025-06-19"), None)
        .await
        .unwrap();

    assert!(!result.available);
    assert!(result.slots.is_empty());
    assert_eq!(
        result.message.as_deref(),
        Some("No slots available for this date")
    );
}
