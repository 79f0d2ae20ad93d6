use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::dto;
use super::query::{Order, Query};
use super::{
    CARRY_FORWARD_BALANCES, CARRY_FORWARD_REQUESTS, EMPLOYEES, HOLIDAYS, PTO_RECORDS,
    SupabaseClient, SupabaseConfig, TASK_OVERVIEWS,
};
use crate::error::AppError;
use crate::models::{
    AuthUser, CarryForwardBalance, CarryForwardRequest, Employee, EmployeeInfo,
    ExistingCarryForwardRequest, HolidayRecord, LeaveRecord, NewLeaveRecord, Profile, Session,
    TaskRecord,
};

pub struct SupabaseHttpClient {
    client: Client,
    config: SupabaseConfig,
    access_token: RwLock<Option<String>>,
}

impl SupabaseHttpClient {
    pub fn new(config: SupabaseConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self {
            client,
            config,
            access_token: RwLock::new(None),
        })
    }

    fn access_token(&self) -> Option<String> {
        match self.access_token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn bearer(&self) -> String {
        self.access_token()
            .unwrap_or_else(|| self.config.anon_key.clone())
    }

    fn url(&self, base: &str, path: &str, params: &[(String, String)]) -> Result<Url, AppError> {
        let raw = format!("{}{}", base, path);
        Url::parse_with_params(&raw, params)
            .map_err(|e| AppError::Config(format!("Invalid url {}: {}", raw, e)))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.config.anon_key)
            .header("Authorization", format!("Bearer {}", self.bearer()))
    }

    async fn check(response: Response) -> Result<Response, AppError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(decode_error(status, &body))
    }

    async fn select<T: DeserializeOwned>(&self, query: &Query) -> Result<Vec<T>, AppError> {
        let path = format!("/rest/v1/{}", query.table_name());
        let url = self.url(&self.config.url, &path, &query.params())?;

        let response = self.request(Method::GET, url).send().await?;
        let body = Self::check(response).await?.text().await?;

        serde_json::from_str::<Vec<T>>(&body).map_err(|e| {
            tracing::error!("Failed to parse {} rows: {}", query.table_name(), e);
            AppError::Backend {
                status: 200,
                code: None,
                message: format!("Failed to parse {} rows: {}", query.table_name(), e),
            }
        })
    }

    async fn select_one<T: DeserializeOwned>(&self, query: Query) -> Result<Option<T>, AppError> {
        let rows = self.select::<T>(&query.limit(1)).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert<B: Serialize + Sync>(&self, table: &str, body: &B) -> Result<(), AppError> {
        let url = self.url(&self.config.url, &format!("/rest/v1/{}", table), &[])?;

        let response = self
            .request(Method::POST, url)
            .header("Prefer", "return=minimal")
            .json(body)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn update<B: Serialize + Sync>(&self, query: &Query, body: &B) -> Result<(), AppError> {
        let path = format!("/rest/v1/{}", query.table_name());
        let url = self.url(&self.config.url, &path, &query.filter_params())?;

        let response = self
            .request(Method::PATCH, url)
            .header("Prefer", "return=minimal")
            .json(body)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn token_grant<B: Serialize + Sync>(&self, grant_type: &str, body: &B) -> Result<Session, AppError> {
        let params = [("grant_type".to_string(), grant_type.to_string())];
        let url = self.url(&self.config.url, "/auth/v1/token", &params)?;

        let response = self.request(Method::POST, url).json(body).send().await?;
        let token = Self::check(response)
            .await
            .map_err(|e| match e {
                AppError::Backend { status: 400 | 401, message, .. } => AppError::Unauthorized(message),
                other => other,
            })?
            .json::<dto::TokenResponse>()
            .await?;

        Ok(token.into_session(Utc::now().timestamp()))
    }
}

/// Maps a non-success body from PostgREST or GoTrue into a backend error.
fn decode_error(status: u16, body: &str) -> AppError {
    if let Ok(err) = serde_json::from_str::<dto::PostgrestError>(body) {
        if err.code.is_some() || err.message.is_some() {
            let message = [err.message, err.details, err.hint]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" | ");
            return AppError::Backend {
                status,
                code: err.code,
                message,
            };
        }
    }

    if let Ok(err) = serde_json::from_str::<dto::AuthErrorBody>(body) {
        if let Some(message) = err.message() {
            return AppError::Backend {
                status,
                code: err.code(),
                message,
            };
        }
    }

    AppError::Backend {
        status,
        code: None,
        message: body.to_string(),
    }
}

#[async_trait]
impl SupabaseClient for SupabaseHttpClient {
    fn set_access_token(&self, token: Option<String>) {
        match self.access_token.write() {
            Ok(mut guard) => *guard = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AppError> {
        self.token_grant("password", &dto::PasswordGrantRequest { email, password })
            .await
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, AppError> {
        self.token_grant("refresh_token", &dto::RefreshGrantRequest { refresh_token })
            .await
    }

    async fn get_user(&self) -> Result<AuthUser, AppError> {
        let url = self.url(&self.config.url, "/auth/v1/user", &[])?;
        let response = self.request(Method::GET, url).send().await?;
        Ok(Self::check(response).await?.json::<AuthUser>().await?)
    }

    async fn sign_out(&self) -> Result<(), AppError> {
        let url = self.url(&self.config.url, "/auth/v1/logout", &[])?;
        let response = self.request(Method::POST, url).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn fetch_profile(&self) -> Result<Profile, AppError> {
        let base = self
            .config
            .api_base_url
            .as_deref()
            .ok_or_else(|| AppError::Config("API_BASE_URL is not set".to_string()))?;
        let token = self
            .access_token()
            .ok_or_else(|| AppError::Unauthorized("No active session".to_string()))?;

        let url = self.url(base, "/api/user/profile", &[])?;
        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let parsed: dto::ProfileResponse = serde_json::from_str(&body).map_err(|e| AppError::Backend {
            status: status.as_u16(),
            code: None,
            message: format!("Failed to parse profile response: {}", e),
        })?;

        if !status.is_success() {
            return Err(AppError::Backend {
                status: status.as_u16(),
                code: None,
                message: parsed
                    .error
                    .unwrap_or_else(|| "Failed to load profile".to_string()),
            });
        }

        parsed.profile.ok_or(AppError::NotFound)
    }

    async fn fetch_pto_records(&self, sender_email: Option<&str>) -> Result<Vec<LeaveRecord>, AppError> {
        let query = match sender_email {
            Some(email) => Query::table(PTO_RECORDS)
                .eq("sender_email", email)
                .order("date", Order::Desc),
            None => Query::table(PTO_RECORDS),
        };
        self.select(&query).await
    }

    async fn insert_pto_record(&self, record: &NewLeaveRecord) -> Result<(), AppError> {
        self.insert(PTO_RECORDS, record).await
    }

    async fn fetch_employees(&self) -> Result<Vec<Employee>, AppError> {
        self.select(&Query::table(EMPLOYEES).select("id, name, birthday"))
            .await
    }

    async fn find_employee_by_email(&self, email: &str) -> Result<Option<EmployeeInfo>, AppError> {
        self.select_one(
            Query::table(EMPLOYEES)
                .select("employee_id, name, email_id")
                .eq("email_id", email),
        )
        .await
    }

    async fn fetch_holidays(&self) -> Result<Vec<HolidayRecord>, AppError> {
        self.select(&Query::table(HOLIDAYS)).await
    }

    async fn find_carry_forward_balance(
        &self,
        employee_id: &str,
        year: i32,
    ) -> Result<Option<CarryForwardBalance>, AppError> {
        self.select_one(
            Query::table(CARRY_FORWARD_BALANCES)
                .eq("employee_id", employee_id)
                .eq("year", year),
        )
        .await
    }

    async fn find_carry_forward_request(
        &self,
        employee_id: &str,
        from_year: i32,
        to_year: i32,
    ) -> Result<Option<ExistingCarryForwardRequest>, AppError> {
        self.select_one(
            Query::table(CARRY_FORWARD_REQUESTS)
                .select("id, status")
                .eq("employee_id", employee_id)
                .eq("from_year", from_year)
                .eq("to_year", to_year),
        )
        .await
    }

    async fn insert_carry_forward_request(&self, request: &CarryForwardRequest) -> Result<(), AppError> {
        self.insert(CARRY_FORWARD_REQUESTS, request).await
    }

    async fn fetch_tasks(&self, owner: &str) -> Result<Vec<TaskRecord>, AppError> {
        self.select(
            &Query::table(TASK_OVERVIEWS)
                .eq("owner", owner)
                .order("created_at", Order::Desc),
        )
        .await
    }

    async fn find_task(&self, id: &str) -> Result<Option<TaskRecord>, AppError> {
        self.select_one(Query::table(TASK_OVERVIEWS).eq("id", id))
            .await
    }

    async fn set_task_pending_changes(&self, id: &str, pending_changes: &str) -> Result<(), AppError> {
        self.update(
            &Query::table(TASK_OVERVIEWS).eq("id", id),
            &dto::PendingChangesUpdate { pending_changes },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_postgrest_unique_violation() {
        let err = decode_error(
            409,
            r#"{"code":"23505","details":"Key (employee_id, date)=(E-1, 2025-06-02) already exists.","hint":null,"message":"duplicate key value violates unique constraint"}"#,
        );
        assert_eq!(err.backend_code(), Some("23505"));
    }

    #[test]
    fn test_decode_gotrue_error() {
        let err = decode_error(
            400,
            r#"{"code":400,"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#,
        );
        match err {
            AppError::Backend { status, code, message } => {
                assert_eq!(status, 400);
                assert_eq!(code.as_deref(), Some("invalid_credentials"));
                assert_eq!(message, "Invalid login credentials");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_decode_plain_body() {
        let err = decode_error(502, "Bad Gateway");
        match err {
            AppError::Backend { code, message, .. } => {
                assert!(code.is_none());
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_anon_key_used_without_session() {
        let client = SupabaseHttpClient::new(SupabaseConfig {
            url: "https://example.supabase.co".to_string(),
            anon_key: "anon".to_string(),
            api_base_url: None,
        })
        .unwrap();

        assert_eq!(client.bearer(), "anon");
        client.set_access_token(Some("user-token".to_string()));
        assert_eq!(client.bearer(), "user-token");
        client.set_access_token(None);
        assert_eq!(client.bearer(), "anon");
    }
}
