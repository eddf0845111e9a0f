// src/store.rs
//
// In-memory document store standing in for the external persistence layer.
// Tasks are keyed by an opaque storage id, employees by their business
// employee id. Plain HashMaps behind Mutexes; handlers take short locks and
// work on cloned snapshots.

use chrono::NaiveDate;
use rand::{thread_rng, RngCore};
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;
use tracing::info;

use crate::daily_hours::{self, Employee, EmployeeId, Task, TaskDraft};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("Task not found")]
    TaskNotFound,
    #[error("Employee not found")]
    EmployeeNotFound,
    #[error("Employee with this ID or email already exists")]
    DuplicateEmployee,
    #[error("Employee with this email already exists")]
    DuplicateEmail,
}

#[derive(Default)]
pub struct TimeStore {
    tasks: Mutex<HashMap<String, Task>>,
    employees: Mutex<HashMap<EmployeeId, Employee>>,
}

/// Opaque 24-hex storage id, independent of any business key.
fn new_task_id() -> String {
    let mut bytes = [0u8; 12];
    thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

impl TimeStore {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Tasks ---

    pub fn insert_task(&self, draft: TaskDraft) -> Task {
        let task = Task {
            id: new_task_id(),
            employee_id: draft.employee_id,
            description: draft.description,
            from: draft.from,
            to: draft.to,
        };
        self.tasks
            .lock()
            .unwrap()
            .insert(task.id.clone(), task.clone());
        task
    }

    pub fn update_task(&self, id: &str, draft: TaskDraft) -> Result<Task, StoreError> {
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks.get_mut(id).ok_or(StoreError::TaskNotFound)?;
        task.employee_id = draft.employee_id;
        task.description = draft.description;
        task.from = draft.from;
        task.to = draft.to;
        Ok(task.clone())
    }

    pub fn delete_task(&self, id: &str) -> Result<Task, StoreError> {
        self.tasks
            .lock()
            .unwrap()
            .remove(id)
            .ok_or(StoreError::TaskNotFound)
    }

    pub fn get_task(&self, id: &str) -> Option<Task> {
        self.tasks.lock().unwrap().get(id).cloned()
    }

    /// All tasks, ascending by start instant.
    pub fn tasks_sorted_by_start(&self) -> Vec<Task> {
        let mut tasks: Vec<Task> = self.tasks.lock().unwrap().values().cloned().collect();
        tasks.sort_by_key(|t| t.from);
        tasks
    }

    /// Summed duration (ms) of an employee's tasks starting on `day`,
    /// optionally excluding one task id. This is the validation baseline:
    /// pass the edited task's own id when re-checking an update.
    pub fn same_day_total_ms(
        &self,
        employee_id: &str,
        day: NaiveDate,
        exclude_task_id: Option<&str>,
    ) -> i64 {
        let (start, end) = daily_hours::day_bounds(day);
        self.tasks
            .lock()
            .unwrap()
            .values()
            .filter(|t| t.employee_id == employee_id)
            .filter(|t| t.from >= start && t.from <= end)
            .filter(|t| Some(t.id.as_str()) != exclude_task_id)
            .map(|t| daily_hours::duration_ms(t.from, t.to))
            .sum()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    // --- Employees ---

    /// Directory listing, ascending by display name.
    pub fn employees_sorted_by_name(&self) -> Vec<Employee> {
        let mut employees: Vec<Employee> =
            self.employees.lock().unwrap().values().cloned().collect();
        employees.sort_by(|a, b| a.name.cmp(&b.name));
        employees
    }

    pub fn get_employee(&self, employee_id: &str) -> Option<Employee> {
        self.employees.lock().unwrap().get(employee_id).cloned()
    }

    /// Case-insensitive substring match on the display name.
    pub fn find_employee_by_name(&self, fragment: &str) -> Option<Employee> {
        let needle = fragment.to_lowercase();
        self.employees
            .lock()
            .unwrap()
            .values()
            .find(|e| e.name.to_lowercase().contains(&needle))
            .cloned()
    }

    pub fn create_employee(&self, employee: Employee) -> Result<Employee, StoreError> {
        let mut employees = self.employees.lock().unwrap();
        let exists = employees.values().any(|e| {
            e.employee_id == employee.employee_id || e.email.eq_ignore_ascii_case(&employee.email)
        });
        if exists {
            return Err(StoreError::DuplicateEmployee);
        }
        employees.insert(employee.employee_id.clone(), employee.clone());
        Ok(employee)
    }

    pub fn update_employee(
        &self,
        employee_id: &str,
        update: Employee,
    ) -> Result<Employee, StoreError> {
        let mut employees = self.employees.lock().unwrap();
        if !employees.contains_key(employee_id) {
            return Err(StoreError::EmployeeNotFound);
        }
        let email_taken = employees.values().any(|e| {
            e.employee_id != employee_id && e.email.eq_ignore_ascii_case(&update.email)
        });
        if email_taken {
            return Err(StoreError::DuplicateEmail);
        }
        // The payload may re-key the employee; reject a collision with an
        // existing directory entry.
        if update.employee_id != employee_id && employees.contains_key(&update.employee_id) {
            return Err(StoreError::DuplicateEmployee);
        }
        employees.remove(employee_id);
        employees.insert(update.employee_id.clone(), update.clone());
        Ok(update)
    }

    pub fn delete_employee(&self, employee_id: &str) -> Result<Employee, StoreError> {
        self.employees
            .lock()
            .unwrap()
            .remove(employee_id)
            .ok_or(StoreError::EmployeeNotFound)
    }

    pub fn employee_count(&self) -> usize {
        self.employees.lock().unwrap().len()
    }
}

/// Demo directory used by `--seed`. Existing entries win.
pub fn seed_default_employees(store: &TimeStore) -> usize {
    let defaults = [
        ("EMP001", "John Doe", "john.doe@company.com", "Engineering"),
        ("EMP002", "Jane Smith", "jane.smith@company.com", "Design"),
        ("EMP003", "Mike Johnson", "mike.johnson@company.com", "Marketing"),
    ];

    let mut inserted = 0;
    for (employee_id, name, email, department) in defaults {
        let employee = Employee {
            employee_id: employee_id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            department: department.to_string(),
        };
        match store.create_employee(employee) {
            Ok(e) => {
                info!("Seeded employee {} ({})", e.employee_id, e.name);
                inserted += 1;
            }
            Err(_) => info!("Skipping seed for {}: already present", employee_id),
        }
    }
    inserted
}
