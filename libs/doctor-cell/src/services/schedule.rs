use std::sync::Arc;

use anyhow::Result;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{DoctorSchedule, ScheduleDay};

pub struct ScheduleService {
    supabase: Arc<SupabaseClient>,
}

impl ScheduleService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// All active weekly schedule rows for a doctor, for display on the
    /// booking form.
    pub async fn schedules_for_doctor(
        &self,
        doctor_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Vec<DoctorSchedule>> {
        debug!("Fetching schedules for doctor: {}", doctor_id);

        let path = format!(
            "/rest/v1/doctor_schedules?doctor_id=eq.{}&is_active=eq.true&order=display_order.asc,start_time.asc",
            doctor_id
        );
        self.fetch(&path, auth_token).await
    }

    /// Active rows for a doctor on one weekday, ordered by start time. The
    /// slot generator unions every returned interval rather than picking an
    /// arbitrary first row.
    pub async fn schedules_for_day(
        &self,
        doctor_id: Uuid,
        day: ScheduleDay,
        auth_token: Option<&str>,
    ) -> Result<Vec<DoctorSchedule>> {
        debug!("Fetching {} schedule for doctor: {}", day, doctor_id);

        let path = format!(
            "/rest/v1/doctor_schedules?doctor_id=eq.{}&day_of_week=eq.{}&is_active=eq.true&order=start_time.asc",
            doctor_id, day
        );
        self.fetch(&path, auth_token).await
    }

    async fn fetch(&self, path: &str, auth_token: Option<&str>) -> Result<Vec<DoctorSchedule>> {
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, path, auth_token, None)
            .await?;

        let schedules: Vec<DoctorSchedule> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<DoctorSchedule>, _>>()?;

        Ok(schedules)
    }
}
