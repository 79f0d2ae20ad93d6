use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{SupabaseClient, UNIQUE_VIOLATION};
use crate::error::AppError;
use crate::models::{
    AuthUser, CarryForwardBalance, CarryForwardRequest, Employee, EmployeeInfo,
    ExistingCarryForwardRequest, HolidayRecord, LeaveRecord, NewLeaveRecord, Profile, Session,
    TaskRecord,
};

const SESSION_TTL_SECS: i64 = 3600;

#[derive(Default)]
struct Tables {
    users: Vec<(String, String, AuthUser)>,
    refresh_tokens: HashMap<String, AuthUser>,
    access_tokens: HashMap<String, AuthUser>,
    profiles: HashMap<String, Profile>,
    pto_records: Vec<LeaveRecord>,
    employees: Vec<Employee>,
    employee_infos: Vec<EmployeeInfo>,
    holidays: Vec<HolidayRecord>,
    balances: Vec<CarryForwardBalance>,
    carry_forward_requests: Vec<(String, CarryForwardRequest)>,
    tasks: Vec<TaskRecord>,
}

/// Backend held in memory, with the same uniqueness rule on `pto_records`
/// (one row per employee and date) as the hosted database.
#[derive(Default)]
pub struct InMemorySupabase {
    tables: Mutex<Tables>,
    access_token: Mutex<Option<String>>,
    calls: AtomicUsize,
    session_ttl: Option<i64>,
    failing: Vec<&'static str>,
}

impl InMemorySupabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues sessions that expire `secs` after sign-in or refresh.
    pub fn with_session_ttl(mut self, secs: i64) -> Self {
        self.session_ttl = Some(secs);
        self
    }

    /// Makes every call to the named trait method fail with a 500.
    pub fn failing(mut self, method: &'static str) -> Self {
        self.failing.push(method);
        self
    }

    fn fail_if(&self, method: &str) -> Result<(), AppError> {
        if self.failing.iter().any(|m| *m == method) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            return Err(AppError::Backend {
                status: 500,
                code: None,
                message: format!("{} is unavailable", method),
            });
        }
        Ok(())
    }

    fn tables(&self) -> Result<std::sync::MutexGuard<'_, Tables>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tables.lock().map_err(|_| AppError::InternalServerError)
    }

    fn seed(&self) -> std::sync::MutexGuard<'_, Tables> {
        match self.tables.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Number of backend calls served so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn add_user(&self, email: &str, password: &str) -> AuthUser {
        let user = AuthUser {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
        };
        self.seed()
            .users
            .push((email.to_string(), password.to_string(), user.clone()));
        user
    }

    pub fn add_profile(&self, user_id: &str, profile: Profile) {
        self.seed().profiles.insert(user_id.to_string(), profile);
    }

    pub fn add_pto_record(&self, record: LeaveRecord) {
        self.seed().pto_records.push(record);
    }

    pub fn add_employee(&self, employee: Employee) {
        self.seed().employees.push(employee);
    }

    pub fn add_employee_info(&self, info: EmployeeInfo) {
        self.seed().employee_infos.push(info);
    }

    pub fn add_holiday(&self, holiday: HolidayRecord) {
        self.seed().holidays.push(holiday);
    }

    pub fn add_balance(&self, balance: CarryForwardBalance) {
        self.seed().balances.push(balance);
    }

    pub fn add_task(&self, task: TaskRecord) {
        self.seed().tasks.push(task);
    }

    pub fn pto_records(&self) -> Vec<LeaveRecord> {
        self.seed().pto_records.clone()
    }

    pub fn carry_forward_requests(&self) -> Vec<CarryForwardRequest> {
        self.seed()
            .carry_forward_requests
            .iter()
            .map(|(_, r)| r.clone())
            .collect()
    }

    pub fn tasks(&self) -> Vec<TaskRecord> {
        self.seed().tasks.clone()
    }

    fn issue_session(&self, tables: &mut Tables, user: AuthUser) -> Session {
        let session = Session {
            access_token: Uuid::new_v4().to_string(),
            refresh_token: Uuid::new_v4().to_string(),
            expires_at: Utc::now().timestamp() + self.session_ttl.unwrap_or(SESSION_TTL_SECS),
            user: user.clone(),
        };
        tables
            .access_tokens
            .insert(session.access_token.clone(), user.clone());
        tables.refresh_tokens.insert(session.refresh_token.clone(), user);
        session
    }

    fn current_user(&self, tables: &Tables) -> Result<AuthUser, AppError> {
        let token = match self.access_token.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        token
            .and_then(|t| tables.access_tokens.get(&t).cloned())
            .ok_or_else(|| AppError::Unauthorized("Invalid or expired token".to_string()))
    }
}

#[async_trait]
impl SupabaseClient for InMemorySupabase {
    fn set_access_token(&self, token: Option<String>) {
        match self.access_token.lock() {
            Ok(mut guard) => *guard = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let mut tables = self.tables()?;
        let user = tables
            .users
            .iter()
            .find(|(e, p, _)| e == email && p == password)
            .map(|(_, _, u)| u.clone())
            .ok_or_else(|| AppError::Unauthorized("Invalid login credentials".to_string()))?;
        Ok(self.issue_session(&mut tables, user))
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, AppError> {
        let mut tables = self.tables()?;
        let user = tables
            .refresh_tokens
            .remove(refresh_token)
            .ok_or_else(|| AppError::Unauthorized("Invalid Refresh Token".to_string()))?;
        Ok(self.issue_session(&mut tables, user))
    }

    async fn get_user(&self) -> Result<AuthUser, AppError> {
        let tables = self.tables()?;
        self.current_user(&tables)
    }

    async fn sign_out(&self) -> Result<(), AppError> {
        let mut tables = self.tables()?;
        let user = self.current_user(&tables)?;
        tables.access_tokens.retain(|_, u| u.id != user.id);
        tables.refresh_tokens.retain(|_, u| u.id != user.id);
        Ok(())
    }

    async fn fetch_profile(&self) -> Result<Profile, AppError> {
        let tables = self.tables()?;
        let user = self.current_user(&tables)?;
        tables.profiles.get(&user.id).cloned().ok_or(AppError::NotFound)
    }

    async fn fetch_pto_records(&self, sender_email: Option<&str>) -> Result<Vec<LeaveRecord>, AppError> {
        let tables = self.tables()?;
        let mut records: Vec<LeaveRecord> = tables
            .pto_records
            .iter()
            .filter(|r| sender_email.is_none_or(|email| r.sender_email == email))
            .cloned()
            .collect();
        if sender_email.is_some() {
            records.sort_by(|a, b| b.date.cmp(&a.date));
        }
        Ok(records)
    }

    async fn insert_pto_record(&self, record: &NewLeaveRecord) -> Result<(), AppError> {
        let mut tables = self.tables()?;
        let exists = tables
            .pto_records
            .iter()
            .any(|r| r.employee_id == record.employee_id && r.date == record.date);
        if exists {
            return Err(AppError::Backend {
                status: 409,
                code: Some(UNIQUE_VIOLATION.to_string()),
                message: "duplicate key value violates unique constraint".to_string(),
            });
        }

        tables.pto_records.push(LeaveRecord {
            id: Uuid::new_v4().to_string(),
            date: record.date.clone(),
            day: record.day.clone(),
            hours: record.hours,
            activity: Some(record.activity.clone()),
            employee_name: record.employee_name.clone(),
            employee_id: record.employee_id.clone(),
            sender_email: record.sender_email.clone(),
            updated_at: Some(Utc::now().to_rfc3339()),
            is_pto: record.is_pto,
            status: record.status,
            request_reason: Some(record.request_reason.clone()),
            pending_changes: None,
        });
        Ok(())
    }

    async fn fetch_employees(&self) -> Result<Vec<Employee>, AppError> {
        Ok(self.tables()?.employees.clone())
    }

    async fn find_employee_by_email(&self, email: &str) -> Result<Option<EmployeeInfo>, AppError> {
        self.fail_if("find_employee_by_email")?;
        Ok(self
            .tables()?
            .employee_infos
            .iter()
            .find(|e| e.email_id == email)
            .cloned())
    }

    async fn fetch_holidays(&self) -> Result<Vec<HolidayRecord>, AppError> {
        Ok(self.tables()?.holidays.clone())
    }

    async fn find_carry_forward_balance(
        &self,
        employee_id: &str,
        year: i32,
    ) -> Result<Option<CarryForwardBalance>, AppError> {
        self.fail_if("find_carry_forward_balance")?;
        Ok(self
            .tables()?
            .balances
            .iter()
            .find(|b| b.employee_id == employee_id && b.year == year)
            .cloned())
    }

    async fn find_carry_forward_request(
        &self,
        employee_id: &str,
        from_year: i32,
        to_year: i32,
    ) -> Result<Option<ExistingCarryForwardRequest>, AppError> {
        self.fail_if("find_carry_forward_request")?;
        Ok(self
            .tables()?
            .carry_forward_requests
            .iter()
            .find(|(_, r)| {
                r.employee_id == employee_id && r.from_year == from_year && r.to_year == to_year
            })
            .map(|(id, r)| ExistingCarryForwardRequest {
                id: id.clone(),
                status: r.status,
            }))
    }

    async fn insert_carry_forward_request(&self, request: &CarryForwardRequest) -> Result<(), AppError> {
        self.tables()?
            .carry_forward_requests
            .push((Uuid::new_v4().to_string(), request.clone()));
        Ok(())
    }

    async fn fetch_tasks(&self, owner: &str) -> Result<Vec<TaskRecord>, AppError> {
        let mut tasks: Vec<TaskRecord> = self
            .tables()?
            .tasks
            .iter()
            .filter(|t| t.owner == owner)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }

    async fn find_task(&self, id: &str) -> Result<Option<TaskRecord>, AppError> {
        Ok(self.tables()?.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn set_task_pending_changes(&self, id: &str, pending_changes: &str) -> Result<(), AppError> {
        let mut tables = self.tables()?;
        if let Some(task) = tables.tasks.iter_mut().find(|t| t.id == id) {
            task.pending_changes = Some(pending_changes.to_string());
            task.updated_at = Some(Utc::now().to_rfc3339());
        }
        Ok(())
    }
}
