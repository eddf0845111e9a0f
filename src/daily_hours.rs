// src/daily_hours.rs
//
// Daily hours accounting: task durations, per-employee day totals, the
// 8-hour budget check, and the manager-facing daily summary. Everything in
// here is a pure function over caller-supplied snapshots; the HTTP layer and
// the store own all state.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub const MS_PER_HOUR: i64 = 3_600_000;

/// Per-employee, per-day budget: 8 hours, in milliseconds.
pub const DAILY_LIMIT_MS: i64 = 8 * MS_PER_HOUR;

pub const DAILY_LIMIT_HOURS: Decimal = dec!(8);

pub type EmployeeId = String;

// --- Persisted shapes (as seen by the engine) ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub employee_id: EmployeeId,
    pub description: String,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub employee_id: EmployeeId,
    pub name: String,
    pub email: String,
    pub department: String,
}

/// A candidate task (create or edit) before it has a storage id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub employee_id: EmployeeId,
    pub description: String,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

// --- Errors ---

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BudgetViolation {
    #[error("End time must be after start time")]
    InvalidRange,
    #[error("Task duration cannot exceed 8 hours")]
    ExceedsSingleTaskLimit,
    #[error("Total daily tasks cannot exceed 8 hours")]
    ExceedsDailyLimit { remaining_hours: Decimal },
}

// --- Duration Calculator ---

/// Signed duration in whole milliseconds. Negative or zero means the range
/// is invalid; callers must reject it, never clamp it.
pub fn duration_ms(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_milliseconds()
}

/// Milliseconds to hours as a `Decimal`. Integer milliseconds internally
/// keep the 8-hour boundary comparison exact; this conversion is only for
/// reporting.
pub fn hours_from_ms(ms: i64) -> Decimal {
    Decimal::from(ms) / Decimal::from(MS_PER_HOUR)
}

/// Remaining budget for a day, floored at zero.
pub fn remaining_hours_from_ms(total_ms: i64) -> Decimal {
    hours_from_ms((DAILY_LIMIT_MS - total_ms).max(0))
}

/// Inclusive day bounds: `[00:00:00.000, 23:59:59.999]` of `day`, UTC.
/// A task belongs to the day containing its start instant.
pub fn day_bounds(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = day.and_hms_opt(0, 0, 0).unwrap().and_utc();
    let end = day.and_hms_milli_opt(23, 59, 59, 999).unwrap().and_utc();
    (start, end)
}

// --- Budget Validator ---

/// Validates a candidate task against the daily budget. `same_day_total_ms`
/// is the summed duration of the employee's *other* tasks on the day implied
/// by the candidate's start instant; for a brand-new task that is simply the
/// day total, for an edit the edited task's own id must already be excluded.
///
/// Check order is fixed so rejections are deterministic: invalid range, then
/// single-task limit, then daily limit. Landing exactly on 8 hours accepts.
pub fn validate(draft: &TaskDraft, same_day_total_ms: i64) -> Result<(), BudgetViolation> {
    let ms = duration_ms(draft.from, draft.to);
    if ms <= 0 {
        return Err(BudgetViolation::InvalidRange);
    }
    if ms > DAILY_LIMIT_MS {
        return Err(BudgetViolation::ExceedsSingleTaskLimit);
    }
    if same_day_total_ms + ms > DAILY_LIMIT_MS {
        return Err(BudgetViolation::ExceedsDailyLimit {
            remaining_hours: remaining_hours_from_ms(same_day_total_ms),
        });
    }
    Ok(())
}

// --- Daily Aggregator ---

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DayTotals {
    pub total_ms: i64,
    pub tasks: Vec<Task>,
}

impl DayTotals {
    pub fn total_hours(&self) -> Decimal {
        hours_from_ms(self.total_ms)
    }
}

/// Groups the given day's tasks by employee and sums their durations.
/// Filters on the start instant, both day bounds inclusive; each employee's
/// task list comes back ordered ascending by start.
pub fn aggregate(tasks: &[Task], day: NaiveDate) -> BTreeMap<EmployeeId, DayTotals> {
    let (start, end) = day_bounds(day);
    let mut day_tasks: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.from >= start && t.from <= end)
        .collect();
    day_tasks.sort_by_key(|t| t.from);

    let mut by_employee: BTreeMap<EmployeeId, DayTotals> = BTreeMap::new();
    for task in day_tasks {
        let totals = by_employee.entry(task.employee_id.clone()).or_default();
        totals.total_ms += duration_ms(task.from, task.to);
        totals.tasks.push(task.clone());
    }
    by_employee
}

// --- Summary Builder ---

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyEmployeeSummary {
    pub total_hours: Decimal,
    pub remaining_hours: Decimal,
    pub tasks: Vec<Task>,
    /// `None` when tasks reference an employee id that no longer resolves;
    /// the tasks themselves are never dropped.
    pub employee: Option<Employee>,
}

impl DailyEmployeeSummary {
    fn zero_filled(employee: Employee) -> Self {
        Self {
            total_hours: dec!(0),
            remaining_hours: DAILY_LIMIT_HOURS,
            tasks: Vec::new(),
            employee: Some(employee),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummaryReport {
    pub date: NaiveDate,
    pub employee_summaries: BTreeMap<EmployeeId, DailyEmployeeSummary>,
}

/// Full outer join of the day's aggregation with the employee directory:
/// every known employee appears (zero-filled when task-less), and employees
/// present only in the task set appear with an unknown-employee marker.
/// Rebuilt wholesale on every call; there is no incremental update path.
pub fn build_summary(
    tasks: &[Task],
    employees: &[Employee],
    day: NaiveDate,
) -> DailySummaryReport {
    let mut summaries = BTreeMap::new();

    for (employee_id, totals) in aggregate(tasks, day) {
        let employee = employees
            .iter()
            .find(|e| e.employee_id == employee_id)
            .cloned();
        summaries.insert(
            employee_id,
            DailyEmployeeSummary {
                total_hours: totals.total_hours(),
                remaining_hours: remaining_hours_from_ms(totals.total_ms),
                tasks: totals.tasks,
                employee,
            },
        );
    }

    for employee in employees {
        summaries
            .entry(employee.employee_id.clone())
            .or_insert_with(|| DailyEmployeeSummary::zero_filled(employee.clone()));
    }

    DailySummaryReport {
        date: day,
        employee_summaries: summaries,
    }
}
