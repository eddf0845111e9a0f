// src/main.rs
use anyhow::{Context, Result};
use axum::http::StatusCode;
use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use clap::Parser;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use std::{env, net::SocketAddr, sync::Arc};
use thiserror::Error;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

mod daily_hours;
mod store;
mod store_tests;

use daily_hours::{BudgetViolation, Employee, Task, TaskDraft};
use store::{StoreError, TimeStore};

const DEFAULT_PORT: u16 = 5000;

// --- Error Handling ---

#[derive(Error, Debug)]
enum AppError {
    #[error(transparent)]
    Budget(#[from] BudgetViolation),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Invalid input data: {0}")]
    InvalidInput(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status_code, body) = match &self {
            AppError::Budget(violation) => {
                let mut body = json!({ "message": violation.to_string() });
                // Daily-limit rejections carry the remaining budget so the
                // client can show it without recomputing.
                if let BudgetViolation::ExceedsDailyLimit { remaining_hours } = violation {
                    body["remainingHours"] = json!(remaining_hours);
                }
                (StatusCode::BAD_REQUEST, body)
            }
            AppError::Store(store_err) => {
                let status = match store_err {
                    StoreError::TaskNotFound | StoreError::EmployeeNotFound => {
                        StatusCode::NOT_FOUND
                    }
                    StoreError::DuplicateEmployee | StoreError::DuplicateEmail => {
                        StatusCode::BAD_REQUEST
                    }
                };
                (status, json!({ "message": store_err.to_string() }))
            }
            AppError::InvalidInput(_) => {
                (StatusCode::BAD_REQUEST, json!({ "message": self.to_string() }))
            }
        };
        if status_code.is_server_error() {
            error!("Error occurred: {:?}", self);
        }
        (status_code, Json(body)).into_response()
    }
}

#[derive(Clone)]
struct AppState {
    store: Arc<TimeStore>,
}

// --- Request/response shapes ---

#[derive(Serialize)]
struct TaskWithEmployee {
    #[serde(flatten)]
    task: Task,
    employee: Option<Employee>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DailyTasksResponse {
    employee: Employee,
    tasks: Vec<Task>,
    total_hours: Decimal,
    remaining_hours: Decimal,
}

fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::InvalidInput(format!("invalid date '{}', expected yyyy-MM-dd", raw)))
}

fn check_task_draft(draft: &TaskDraft) -> Result<(), AppError> {
    if draft.employee_id.trim().is_empty() {
        return Err(AppError::InvalidInput("employeeId is required".to_string()));
    }
    if draft.description.trim().is_empty() {
        return Err(AppError::InvalidInput("description is required".to_string()));
    }
    Ok(())
}

fn check_employee(employee: &Employee) -> Result<(), AppError> {
    if employee.employee_id.trim().is_empty() {
        return Err(AppError::InvalidInput("employeeId is required".to_string()));
    }
    if employee.name.trim().is_empty() {
        return Err(AppError::InvalidInput("name is required".to_string()));
    }
    if !employee.email.contains('@') {
        return Err(AppError::InvalidInput("invalid email format".to_string()));
    }
    if employee.department.trim().is_empty() {
        return Err(AppError::InvalidInput("department is required".to_string()));
    }
    Ok(())
}

// --- Task handlers ---

async fn handle_list_tasks(State(state): State<AppState>) -> Json<Vec<TaskWithEmployee>> {
    let tasks = state.store.tasks_sorted_by_start();
    let listing = tasks
        .into_iter()
        .map(|task| {
            let employee = state.store.get_employee(&task.employee_id);
            TaskWithEmployee { task, employee }
        })
        .collect();
    Json(listing)
}

async fn handle_create_task(
    State(state): State<AppState>,
    Json(draft): Json<TaskDraft>,
) -> Result<impl IntoResponse, AppError> {
    check_task_draft(&draft)?;

    // Budget baseline: the employee's existing total on the day the new
    // task starts. Nothing to exclude for a brand-new task.
    let day = draft.from.date_naive();
    let total_ms = state.store.same_day_total_ms(&draft.employee_id, day, None);
    daily_hours::validate(&draft, total_ms)?;

    let task = state.store.insert_task(draft);
    info!(
        "Created task {} for {} on {}",
        task.id,
        task.employee_id,
        task.from.date_naive()
    );
    Ok((StatusCode::CREATED, Json(task)))
}

async fn handle_update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(draft): Json<TaskDraft>,
) -> Result<Json<Task>, AppError> {
    check_task_draft(&draft)?;
    if state.store.get_task(&id).is_none() {
        return Err(StoreError::TaskNotFound.into());
    }

    // The day to re-validate against is derived from the *edited* start
    // instant, and only the task's own id is excluded from the baseline.
    let day = draft.from.date_naive();
    let total_ms = state
        .store
        .same_day_total_ms(&draft.employee_id, day, Some(&id));
    daily_hours::validate(&draft, total_ms)?;

    let task = state.store.update_task(&id, draft)?;
    info!("Updated task {} for {}", task.id, task.employee_id);
    Ok(Json(task))
}

async fn handle_delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let task = state.store.delete_task(&id)?;
    info!("Deleted task {}", task.id);
    Ok(Json(json!({
        "message": "Task deleted successfully",
        "taskId": task.id,
    })))
}

async fn handle_daily_tasks(
    State(state): State<AppState>,
    Path((employee_id, date)): Path<(String, String)>,
) -> Result<Json<DailyTasksResponse>, AppError> {
    let day = parse_date(&date)?;
    let employee = state
        .store
        .get_employee(&employee_id)
        .ok_or(StoreError::EmployeeNotFound)?;

    let tasks = state.store.tasks_sorted_by_start();
    let totals = daily_hours::aggregate(&tasks, day)
        .remove(&employee_id)
        .unwrap_or_default();

    Ok(Json(DailyTasksResponse {
        employee,
        total_hours: totals.total_hours(),
        remaining_hours: daily_hours::remaining_hours_from_ms(totals.total_ms),
        tasks: totals.tasks,
    }))
}

async fn handle_daily_summary(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<daily_hours::DailySummaryReport>, AppError> {
    let day = parse_date(&date)?;
    let tasks = state.store.tasks_sorted_by_start();
    let employees = state.store.employees_sorted_by_name();
    Ok(Json(daily_hours::build_summary(&tasks, &employees, day)))
}

// --- Employee handlers ---

async fn handle_list_employees(State(state): State<AppState>) -> Json<Vec<Employee>> {
    Json(state.store.employees_sorted_by_name())
}

async fn handle_get_employee(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Employee>, AppError> {
    let employee = state
        .store
        .get_employee(&id)
        .ok_or(StoreError::EmployeeNotFound)?;
    Ok(Json(employee))
}

async fn handle_get_employee_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Employee>, AppError> {
    let employee = state
        .store
        .find_employee_by_name(&name)
        .ok_or(StoreError::EmployeeNotFound)?;
    Ok(Json(employee))
}

async fn handle_create_employee(
    State(state): State<AppState>,
    Json(employee): Json<Employee>,
) -> Result<impl IntoResponse, AppError> {
    check_employee(&employee)?;
    let employee = state.store.create_employee(employee)?;
    info!(
        "Created employee {} ({})",
        employee.employee_id, employee.name
    );
    Ok((StatusCode::CREATED, Json(employee)))
}

async fn handle_update_employee(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(employee): Json<Employee>,
) -> Result<Json<Employee>, AppError> {
    check_employee(&employee)?;
    let employee = state.store.update_employee(&id, employee)?;
    info!("Updated employee {}", employee.employee_id);
    Ok(Json(employee))
}

async fn handle_delete_employee(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let employee = state.store.delete_employee(&id)?;
    info!("Deleted employee {}", employee.employee_id);
    Ok(Json(json!({
        "message": "Employee deleted successfully",
        "employee": employee,
    })))
}

async fn handle_status(State(state): State<AppState>) -> Html<String> {
    Html(format!(
        "<h1>Server Status</h1><p>Current Time (Server): {}</p><hr>\
         <p>Employees: {}</p>\
         <p>Tasks: {}</p>",
        chrono::Local::now().to_rfc3339(),
        state.store.employee_count(),
        state.store.task_count()
    ))
}

// --- Bootstrap ---

#[derive(Parser, Debug)]
#[command(name = "tasklog-core", about = "Daily task tracker backend")]
struct Cli {
    /// Port to listen on (falls back to the PORT env var, then 5000)
    #[arg(long)]
    port: Option<u16>,
    /// Seed the employee directory with the demo employees at startup
    #[arg(long)]
    seed: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Setting tracing subscriber failed")?;

    let cli = Cli::parse();
    let port = cli
        .port
        .or_else(|| env::var("PORT").ok().and_then(|p| p.parse().ok()))
        .unwrap_or(DEFAULT_PORT);

    let store = Arc::new(TimeStore::new());
    if cli.seed {
        let inserted = store::seed_default_employees(&store);
        info!("Seeded {} employees.", inserted);
    }
    let state = AppState { store };

    let task_routes = Router::new()
        .route("/", get(handle_list_tasks).post(handle_create_task))
        .route(
            "/{id}",
            axum::routing::put(handle_update_task).delete(handle_delete_task),
        )
        .route("/daily/{employee_id}/{date}", get(handle_daily_tasks))
        .route("/summary/{date}", get(handle_daily_summary));
    let employee_routes = Router::new()
        .route("/", get(handle_list_employees).post(handle_create_employee))
        .route(
            "/{id}",
            get(handle_get_employee)
                .put(handle_update_employee)
                .delete(handle_delete_employee),
        )
        .route("/by-name/{name}", get(handle_get_employee_by_name));
    let api_routes = Router::new()
        .nest("/tasks", task_routes)
        .nest("/employees", employee_routes);
    let app = Router::new()
        .nest("/api", api_routes)
        .route("/status", get(handle_status))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Binding listen address failed")?;
    axum::serve(listener, app)
        .await
        .context("HTTP server failed")?;

    Ok(())
}
