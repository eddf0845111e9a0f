// src/store_tests.rs

#[cfg(test)]
mod tests {
    use crate::daily_hours::{self, BudgetViolation, Employee, TaskDraft, MS_PER_HOUR};
    use crate::store::{seed_default_employees, StoreError, TimeStore};
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
    use rust_decimal_macros::dec;

    fn d(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .unwrap_or_else(|_| panic!("Invalid date string format: {}", date_str))
    }

    fn dt(datetime_str: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(datetime_str, "%Y-%m-%d %H:%M")
            .unwrap_or_else(|_| panic!("Invalid datetime string format: {}", datetime_str))
            .and_utc()
    }

    fn build_draft(employee_id: &str, from: &str, to: &str) -> TaskDraft {
        TaskDraft {
            employee_id: employee_id.to_string(),
            description: "work".to_string(),
            from: dt(from),
            to: dt(to),
        }
    }

    fn build_employee(employee_id: &str, name: &str, email: &str) -> Employee {
        Employee {
            employee_id: employee_id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            department: "Engineering".to_string(),
        }
    }

    #[test]
    fn inserted_tasks_get_distinct_opaque_ids() {
        let store = TimeStore::new();
        let t1 = store.insert_task(build_draft("EMP001", "2024-01-10 09:00", "2024-01-10 10:00"));
        let t2 = store.insert_task(build_draft("EMP001", "2024-01-10 10:00", "2024-01-10 11:00"));
        assert_eq!(t1.id.len(), 24);
        assert_ne!(t1.id, t2.id);
        assert_eq!(store.task_count(), 2);
    }

    #[test]
    fn same_day_total_filters_by_employee_and_day() {
        let store = TimeStore::new();
        store.insert_task(build_draft("EMP001", "2024-01-10 09:00", "2024-01-10 13:00"));
        store.insert_task(build_draft("EMP002", "2024-01-10 09:00", "2024-01-10 17:00"));
        store.insert_task(build_draft("EMP001", "2024-01-11 09:00", "2024-01-11 12:00"));

        assert_eq!(
            store.same_day_total_ms("EMP001", d("2024-01-10"), None),
            4 * MS_PER_HOUR
        );
        assert_eq!(
            store.same_day_total_ms("EMP001", d("2024-01-11"), None),
            3 * MS_PER_HOUR
        );
        assert_eq!(store.same_day_total_ms("EMP003", d("2024-01-10"), None), 0);
    }

    #[test]
    fn editing_a_task_excludes_only_its_own_id() {
        // EMP001: 09:00-13:00 (4h) and 13:00-17:00 (4h) on the same day.
        let store = TimeStore::new();
        let morning =
            store.insert_task(build_draft("EMP001", "2024-01-10 09:00", "2024-01-10 13:00"));
        store.insert_task(build_draft("EMP001", "2024-01-10 13:00", "2024-01-10 17:00"));

        // Stretching the morning task to 09:00-14:00 (5h): the baseline is
        // the other task's 4h, so 4h + 5h busts the budget.
        let edited = build_draft("EMP001", "2024-01-10 09:00", "2024-01-10 14:00");
        let baseline =
            store.same_day_total_ms("EMP001", edited.from.date_naive(), Some(&morning.id));
        assert_eq!(baseline, 4 * MS_PER_HOUR);
        assert_eq!(
            daily_hours::validate(&edited, baseline),
            Err(BudgetViolation::ExceedsDailyLimit {
                remaining_hours: dec!(4)
            })
        );

        // Shrinking it to 3h passes.
        let shorter = build_draft("EMP001", "2024-01-10 09:00", "2024-01-10 12:00");
        assert_eq!(daily_hours::validate(&shorter, baseline), Ok(()));
    }

    #[test]
    fn update_keeps_the_storage_id() {
        let store = TimeStore::new();
        let task = store.insert_task(build_draft("EMP001", "2024-01-10 09:00", "2024-01-10 10:00"));
        let updated = store
            .update_task(
                &task.id,
                build_draft("EMP001", "2024-01-10 09:00", "2024-01-10 11:00"),
            )
            .expect("update succeeds");
        assert_eq!(updated.id, task.id);
        assert_eq!(updated.to, dt("2024-01-10 11:00"));
    }

    #[test]
    fn missing_task_ids_are_reported() {
        let store = TimeStore::new();
        assert_eq!(
            store.update_task(
                "missing",
                build_draft("EMP001", "2024-01-10 09:00", "2024-01-10 10:00")
            ),
            Err(StoreError::TaskNotFound)
        );
        assert_eq!(store.delete_task("missing"), Err(StoreError::TaskNotFound));
    }

    #[test]
    fn employee_directory_enforces_unique_id_and_email() {
        let store = TimeStore::new();
        store
            .create_employee(build_employee("EMP001", "John Doe", "john.doe@company.com"))
            .expect("first insert succeeds");

        assert_eq!(
            store.create_employee(build_employee("EMP001", "Someone Else", "other@company.com")),
            Err(StoreError::DuplicateEmployee)
        );
        assert_eq!(
            store.create_employee(build_employee("EMP009", "John Clone", "John.Doe@company.com")),
            Err(StoreError::DuplicateEmployee)
        );
    }

    #[test]
    fn employee_update_rejects_email_taken_by_someone_else() {
        let store = TimeStore::new();
        store
            .create_employee(build_employee("EMP001", "John Doe", "john.doe@company.com"))
            .expect("insert");
        store
            .create_employee(build_employee("EMP002", "Jane Smith", "jane.smith@company.com"))
            .expect("insert");

        assert_eq!(
            store.update_employee(
                "EMP002",
                build_employee("EMP002", "Jane Smith", "john.doe@company.com")
            ),
            Err(StoreError::DuplicateEmail)
        );
        // Keeping your own email is fine.
        assert!(store
            .update_employee(
                "EMP002",
                build_employee("EMP002", "Jane S.", "jane.smith@company.com")
            )
            .is_ok());
        assert_eq!(
            store.update_employee(
                "EMP404",
                build_employee("EMP404", "Ghost", "ghost@company.com")
            ),
            Err(StoreError::EmployeeNotFound)
        );
    }

    #[test]
    fn listing_is_sorted_by_name() {
        let store = TimeStore::new();
        store
            .create_employee(build_employee("EMP002", "Zoe", "zoe@company.com"))
            .expect("insert");
        store
            .create_employee(build_employee("EMP001", "Adam", "adam@company.com"))
            .expect("insert");

        let names: Vec<String> = store
            .employees_sorted_by_name()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["Adam".to_string(), "Zoe".to_string()]);
    }

    #[test]
    fn name_lookup_is_case_insensitive_substring() {
        let store = TimeStore::new();
        store
            .create_employee(build_employee("EMP001", "John Doe", "john.doe@company.com"))
            .expect("insert");

        assert!(store.find_employee_by_name("john").is_some());
        assert!(store.find_employee_by_name("DOE").is_some());
        assert!(store.find_employee_by_name("smith").is_none());
    }

    #[test]
    fn seeding_is_idempotent() {
        let store = TimeStore::new();
        assert_eq!(seed_default_employees(&store), 3);
        assert_eq!(seed_default_employees(&store), 0);
        assert_eq!(store.employee_count(), 3);
        assert!(store.get_employee("EMP001").is_some());
    }
}
