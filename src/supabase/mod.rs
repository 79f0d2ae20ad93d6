pub mod dto;
pub mod http;
pub mod memory;
pub mod query;

use std::env;

use async_trait::async_trait;

pub use http::SupabaseHttpClient;
pub use memory::InMemorySupabase;

use crate::error::AppError;
use crate::models::{
    AuthUser, CarryForwardBalance, CarryForwardRequest, Employee, EmployeeInfo,
    ExistingCarryForwardRequest, HolidayRecord, LeaveRecord, NewLeaveRecord, Profile, Session,
    TaskRecord,
};

pub const EMPLOYEES: &str = "employees";
pub const PTO_RECORDS: &str = "pto_records";
pub const HOLIDAYS: &str = "holidays";
pub const CARRY_FORWARD_BALANCES: &str = "carry_forward_balances";
pub const CARRY_FORWARD_REQUESTS: &str = "carry_forward_requests";
pub const TASK_OVERVIEWS: &str = "task_overviews";

/// Postgres unique_violation.
pub const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone, Debug)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    pub api_base_url: Option<String>,
}

impl SupabaseConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let url = env::var("SUPABASE_URL")
            .map_err(|_| AppError::Config("SUPABASE_URL is not set".to_string()))?;
        let anon_key = env::var("SUPABASE_ANON_KEY")
            .map_err(|_| AppError::Config("SUPABASE_ANON_KEY is not set".to_string()))?;
        let api_base_url = env::var("API_BASE_URL").ok().filter(|v| !v.is_empty());

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            anon_key,
            api_base_url: api_base_url.map(|u| u.trim_end_matches('/').to_string()),
        })
    }
}

/// Every backend round trip the app makes, one typed method per query.
#[async_trait]
pub trait SupabaseClient: Send + Sync {
    /// Token sent with table queries; `None` falls back to the anon key.
    fn set_access_token(&self, token: Option<String>);

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AppError>;
    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, AppError>;
    async fn get_user(&self) -> Result<AuthUser, AppError>;
    async fn sign_out(&self) -> Result<(), AppError>;
    async fn fetch_profile(&self) -> Result<Profile, AppError>;

    /// All records when `sender_email` is `None`, otherwise that sender's
    /// records newest first.
    async fn fetch_pto_records(&self, sender_email: Option<&str>) -> Result<Vec<LeaveRecord>, AppError>;
    async fn insert_pto_record(&self, record: &NewLeaveRecord) -> Result<(), AppError>;

    async fn fetch_employees(&self) -> Result<Vec<Employee>, AppError>;
    async fn find_employee_by_email(&self, email: &str) -> Result<Option<EmployeeInfo>, AppError>;
    async fn fetch_holidays(&self) -> Result<Vec<HolidayRecord>, AppError>;

    async fn find_carry_forward_balance(
        &self,
        employee_id: &str,
        year: i32,
    ) -> Result<Option<CarryForwardBalance>, AppError>;
    async fn find_carry_forward_request(
        &self,
        employee_id: &str,
        from_year: i32,
        to_year: i32,
    ) -> Result<Option<ExistingCarryForwardRequest>, AppError>;
    async fn insert_carry_forward_request(&self, request: &CarryForwardRequest) -> Result<(), AppError>;

    /// Tasks owned by `owner`, newest first.
    async fn fetch_tasks(&self, owner: &str) -> Result<Vec<TaskRecord>, AppError>;
    async fn find_task(&self, id: &str) -> Result<Option<TaskRecord>, AppError>;
    async fn set_task_pending_changes(&self, id: &str, pending_changes: &str) -> Result<(), AppError>;
}
