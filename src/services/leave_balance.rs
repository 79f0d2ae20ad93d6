//! PTO accounting for one employee and one calendar year.
//!
//! Everything here is a pure function of already-fetched rows. Only approved
//! records count toward usage; pending and rejected ones are listed but never
//! summed.

use serde::{Deserialize, Serialize};

use crate::dates::{in_year, parse_date};
use crate::models::{CarryForwardBalance, EmployeeInfo, LeaveRecord, LeaveStatus};

pub const BASE_PTO_LIMIT_DAYS: f64 = 12.0;
pub const HOURS_PER_DAY: f64 = 8.0;

/// Optional inclusive bounds, `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

impl DateRange {
    fn contains(&self, date: &str) -> bool {
        let after_start = self
            .start
            .as_deref()
            .filter(|s| !s.is_empty())
            .is_none_or(|start| date >= start);
        let before_end = self
            .end
            .as_deref()
            .filter(|s| !s.is_empty())
            .is_none_or(|end| date <= end);
        after_start && before_end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeePtoSummary {
    pub employee_id: String,
    pub employee_name: String,
    pub sender_email: String,
    pub total_pto_hours: f64,
    pub total_pto_days: f64,
    pub remaining_pto_days: f64,
    pub non_pto_hours: f64,
    pub non_pto_days: f64,
    pub carry_forward_days: f64,
    pub effective_pto_limit: f64,
    pub can_carry_forward: bool,
    /// Share of the effective limit already used, capped at 100.
    pub usage_percent: f64,
}

/// Leave rows of one sender viewed through one calendar year.
pub struct LeaveLedger<'a> {
    pub sender_email: &'a str,
    pub records: &'a [LeaveRecord],
    pub balance: Option<&'a CarryForwardBalance>,
    pub year: i32,
}

impl<'a> LeaveLedger<'a> {
    fn in_selected_year(&self, record: &LeaveRecord) -> bool {
        record.sender_email == self.sender_email
            && parse_date(&record.date).is_ok_and(|d| in_year(d, self.year))
    }

    /// Carried days still available for the selected year.
    pub fn carry_forward_days(&self) -> f64 {
        self.balance
            .filter(|b| b.year == self.year)
            .map(CarryForwardBalance::available_days)
            .unwrap_or(0.0)
    }

    pub fn summary(&self, employee: &EmployeeInfo, current_year: i32) -> EmployeePtoSummary {
        let (pto_hours, non_pto_hours) = self
            .records
            .iter()
            .filter(|r| r.status == LeaveStatus::Approved && self.in_selected_year(r))
            .fold((0.0, 0.0), |(pto, non_pto), r| {
                if r.is_pto {
                    (pto + r.hours, non_pto)
                } else {
                    (pto, non_pto + r.hours)
                }
            });

        let carry_forward_days = self.carry_forward_days();
        let effective_pto_limit = BASE_PTO_LIMIT_DAYS + carry_forward_days;
        let total_pto_days = pto_hours / HOURS_PER_DAY;
        let remaining_pto_days = (effective_pto_limit - total_pto_days).max(0.0);

        let usage_percent = if effective_pto_limit > 0.0 {
            (total_pto_days / effective_pto_limit * 100.0).min(100.0)
        } else {
            0.0
        };

        EmployeePtoSummary {
            employee_id: employee.employee_id.clone(),
            employee_name: employee.name.clone(),
            sender_email: employee.email_id.clone(),
            total_pto_hours: pto_hours,
            total_pto_days,
            remaining_pto_days,
            non_pto_hours,
            non_pto_days: non_pto_hours / HOURS_PER_DAY,
            carry_forward_days,
            effective_pto_limit,
            can_carry_forward: self.year == current_year && remaining_pto_days > 0.0,
            usage_percent,
        }
    }

    /// Every record of the sender in the selected year and inside `range`,
    /// whatever its status.
    pub fn records_in_range(&self, range: &DateRange) -> Vec<LeaveRecord> {
        self.records
            .iter()
            .filter(|r| self.in_selected_year(r) && range.contains(&r.date))
            .cloned()
            .collect()
    }
}
