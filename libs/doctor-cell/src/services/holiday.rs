use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::Holiday;

/// Clinic-wide holiday lookup. Holidays block every doctor for the whole day.
pub struct HolidayService {
    supabase: Arc<SupabaseClient>,
}

impl HolidayService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// The active holiday covering `date`, if any. Checks exact-date records
    /// first, then recurring records matching on month and day.
    pub async fn holiday_for(
        &self,
        date: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<Option<Holiday>> {
        debug!("Checking holiday for {}", date);

        let path = format!("/rest/v1/holidays?is_active=eq.true&date=eq.{}", date);
        let exact: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await?;

        if let Some(value) = exact.into_iter().next() {
            return Ok(Some(serde_json::from_value(value)?));
        }

        let path = "/rest/v1/holidays?is_active=eq.true&is_recurring=eq.true";
        let recurring: Vec<Value> = self
            .supabase
            .request(Method::GET, path, auth_token, None)
            .await?;

        let holidays: Vec<Holiday> = recurring
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<Holiday>, _>>()?;

        Ok(holidays.into_iter().find(|h| h.applies_on(date)))
    }

    pub async fn is_holiday(&self, date: NaiveDate, auth_token: Option<&str>) -> Result<bool> {
        Ok(self.holiday_for(date, auth_token).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{Holiday, HolidayType};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn holiday(date: &str, is_active: bool, is_recurring: bool) -> Holiday {
        Holiday {
            id: Uuid::new_v4(),
            name: "Independence Day".to_string(),
            date: date.parse().unwrap(),
            description: None,
            holiday_type: HolidayType::National,
            is_active,
            is_recurring,
            color: None,
        }
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn exact_date_match() {
        let h = holiday("2025-08-17", true, false);
        assert!(h.applies_on(date("2025-08-17")));
        assert!(!h.applies_on(date("2025-08-18")));
    }

    #[test]
    fn recurring_matches_following_years() {
        let h = holiday("2024-08-17", true, true);
        assert!(h.applies_on(date("2025-08-17")));
        assert!(h.applies_on(date("2026-08-17")));
        assert!(!h.applies_on(date("2025-08-16")));
    }

    #[test]
    fn non_recurring_does_not_repeat() {
        let h = holiday("2024-08-17", true, false);
        assert!(!h.applies_on(date("2025-08-17")));
    }

    #[test]
    fn inactive_never_applies() {
        let h = holiday("2025-08-17", false, true);
        assert!(!h.applies_on(date("2025-08-17")));
    }
}
