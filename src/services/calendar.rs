use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::{format_number, surface};
use crate::dates::{anchor_to_year, normalize_date};
use crate::error::AppError;
use crate::models::{Employee, HolidayRecord, LeaveRecord};
use crate::supabase::SupabaseClient;

pub const MAX_DOTS_PER_DAY: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    Leave,
    Birthday,
    Holiday,
}

impl EventCategory {
    pub fn color(&self) -> &'static str {
        match self {
            EventCategory::Leave => "green",
            EventCategory::Birthday => "yellow",
            EventCategory::Holiday => "orange",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dot {
    pub category: EventCategory,
    pub color: &'static str,
}

/// Dots per `YYYY-MM-DD`, ordered by date.
pub type DayMarkers = BTreeMap<String, Vec<Dot>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthEvent {
    pub id: String,
    pub date: String,
    pub category: EventCategory,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DaySelection {
    pub date: String,
    pub pto_records: Vec<LeaveRecord>,
    pub birthdays: Vec<Employee>,
    pub holidays: Vec<HolidayRecord>,
}

/// A `YYYY-MM` calendar page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::validation("Invalid Month", format!("Expected YYYY-MM, got {}", s));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Ok(Self { year, month })
    }
}

/// The three collections behind the dashboard calendar.
#[derive(Debug, Clone, Default)]
pub struct CalendarData {
    pub pto_records: Vec<LeaveRecord>,
    pub employees: Vec<Employee>,
    pub holidays: Vec<HolidayRecord>,
}

fn clean(date: &str) -> String {
    normalize_date(Some(date)).unwrap_or_default()
}

impl CalendarData {
    /// Fetches leave records, employees and holidays, one after the other.
    pub async fn load(backend: &dyn SupabaseClient) -> Result<Self, AppError> {
        let loaded = async {
            let pto_records = backend.fetch_pto_records(None).await?;
            let employees = backend.fetch_employees().await?;
            let holidays = backend.fetch_holidays().await?;
            Ok::<_, AppError>(Self {
                pto_records,
                employees,
                holidays,
            })
        }
        .await;

        loaded.map_err(|e| {
            surface(
                e,
                "Error loading data",
                "Failed to load the calendar. Please try again.",
            )
        })
    }

    /// Category dots per day, at most [`MAX_DOTS_PER_DAY`] each. Birthdays are
    /// placed in `year`.
    pub fn markers(&self, year: i32) -> DayMarkers {
        let mut marks = DayMarkers::new();

        let mut add_dot = |date: String, category: EventCategory| {
            if date.is_empty() {
                return;
            }
            let dots = marks.entry(date).or_default();
            if dots.len() < MAX_DOTS_PER_DAY {
                dots.push(Dot {
                    category,
                    color: category.color(),
                });
            }
        };

        for record in &self.pto_records {
            add_dot(clean(&record.date), EventCategory::Leave);
        }
        for employee in &self.employees {
            if let Some(date) = anchor_to_year(employee.birthday.as_deref(), year) {
                add_dot(date, EventCategory::Birthday);
            }
        }
        for holiday in &self.holidays {
            add_dot(clean(&holiday.date), EventCategory::Holiday);
        }

        marks
    }

    /// Events falling in `month`, sorted by date.
    pub fn month_events(&self, month: YearMonth) -> Vec<MonthEvent> {
        let prefix = month.to_string();
        let mut events = Vec::new();

        for record in &self.pto_records {
            let date = clean(&record.date);
            if !date.starts_with(&prefix) {
                continue;
            }
            let who = if record.employee_name.is_empty() {
                &record.employee_id
            } else {
                &record.employee_name
            };
            let hours = format_number(record.hours);
            let description = match record.activity.as_deref().filter(|a| !a.is_empty()) {
                Some(activity) => format!("{} hours - {}", hours, activity),
                None => format!("{} hours", hours),
            };
            events.push(MonthEvent {
                id: format!("pto-{}", record.id),
                date,
                category: EventCategory::Leave,
                title: format!("PTO - {}", who),
                description: Some(description),
            });
        }

        for employee in &self.employees {
            let Some(date) = anchor_to_year(employee.birthday.as_deref(), month.year) else {
                continue;
            };
            if date.starts_with(&prefix) {
                events.push(MonthEvent {
                    id: format!("birthday-{}", employee.id),
                    date,
                    category: EventCategory::Birthday,
                    title: format!("Birthday - {}", employee.name),
                    description: None,
                });
            }
        }

        for holiday in &self.holidays {
            let date = clean(&holiday.date);
            if !date.starts_with(&prefix) {
                continue;
            }
            events.push(MonthEvent {
                id: format!("holiday-{}", holiday.id),
                date,
                category: EventCategory::Holiday,
                title: holiday.name.clone(),
                description: holiday.description.clone().filter(|d| !d.is_empty()),
            });
        }

        events.sort_by(|a, b| a.date.cmp(&b.date));
        events
    }

    /// Everything shown when a day is tapped. Birthdays match on their
    /// `year` anniversary.
    pub fn day_selection(&self, date: &str, year: i32) -> DaySelection {
        let date = clean(date);

        DaySelection {
            pto_records: self
                .pto_records
                .iter()
                .filter(|r| clean(&r.date) == date)
                .cloned()
                .collect(),
            birthdays: self
                .employees
                .iter()
                .filter(|e| anchor_to_year(e.birthday.as_deref(), year).as_deref() == Some(date.as_str()))
                .cloned()
                .collect(),
            holidays: self
                .holidays
                .iter()
                .filter(|h| clean(&h.date) == date)
                .cloned()
                .collect(),
            date,
        }
    }
}
