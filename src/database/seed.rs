use std::path::Path;

use chrono::{Datelike, Duration, Local, NaiveTime, Weekday};
use log::info;
use rand::Rng;
use rusqlite::{params, Connection};

use super::DatabaseError;

const DEPARTMENTS: [(&str, &str, &str); 5] = [
    ("Information Technology", "Ahmed Al-Rashid", "Building A - Floor 3"),
    ("Human Resources", "Fatima Al-Zahra", "Building B - Floor 1"),
    ("Finance", "Mohammed Al-Mansouri", "Building A - Floor 2"),
    ("Marketing", "Sarah Al-Khalil", "Building C - Floor 1"),
    ("Operations", "Omar Al-Thani", "Building A - Floor 1"),
];

const EMPLOYEES: [(&str, &str, &str, &str, &str); 10] = [
    (
        "Ahmed Ali Hassan",
        "Information Technology",
        "Software Developer",
        "2023-01-15",
        "ahmed.hassan@example.com",
    ),
    (
        "Fatima Mohammed Al-Zahra",
        "Human Resources",
        "HR Manager",
        "2022-03-10",
        "fatima.zahra@example.com",
    ),
    (
        "Mohammed Omar Al-Rashid",
        "Finance",
        "Financial Analyst",
        "2023-02-20",
        "mohammed.rashid@example.com",
    ),
    (
        "Sarah Abdullah Al-Khalil",
        "Marketing",
        "Marketing Specialist",
        "2022-11-05",
        "sarah.khalil@example.com",
    ),
    (
        "Omar Hassan Al-Thani",
        "Operations",
        "Operations Manager",
        "2022-01-12",
        "omar.thani@example.com",
    ),
    (
        "Aisha Ahmed Al-Mansouri",
        "Information Technology",
        "System Administrator",
        "2023-03-08",
        "aisha.mansouri@example.com",
    ),
    (
        "Khalid Mohammed Al-Sabah",
        "Finance",
        "Accountant",
        "2022-09-15",
        "khalid.sabah@example.com",
    ),
    (
        "Nour Ali Al-Hashimi",
        "Marketing",
        "Content Creator",
        "2023-04-12",
        "nour.hashimi@example.com",
    ),
    (
        "Hassan Omar Al-Maktoum",
        "Operations",
        "Logistics Coordinator",
        "2022-07-20",
        "hassan.maktoum@example.com",
    ),
    (
        "Layla Ahmed Al-Qasimi",
        "Human Resources",
        "HR Assistant",
        "2023-05-01",
        "layla.qasimi@example.com",
    ),
];

/// Creates a fresh sample attendance database for testing: 10 employees,
/// 5 departments, and 30 days of randomized attendance with an 85% presence
/// rate. Fridays and Saturdays are skipped as weekend days.
pub fn seed_sample_database<P: AsRef<Path>>(path: P) -> Result<(), DatabaseError> {
    let path = path.as_ref();
    if path.exists() {
        std::fs::remove_file(path)
            .map_err(|e| DatabaseError::Connection(format!("Failed to replace database: {}", e)))?;
    }

    let conn = Connection::open(path)
        .map_err(|e| DatabaseError::Connection(e.to_string()))?;

    conn.execute_batch(
        "CREATE TABLE employees (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            department TEXT NOT NULL,
            position TEXT NOT NULL,
            hire_date DATE NOT NULL,
            email TEXT UNIQUE NOT NULL
        );
        CREATE TABLE attendance (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            employee_id INTEGER NOT NULL,
            date DATE NOT NULL,
            check_in TIME,
            check_out TIME,
            hours_worked REAL DEFAULT 0,
            status TEXT NOT NULL,
            FOREIGN KEY (employee_id) REFERENCES employees (id)
        );
        CREATE TABLE departments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT UNIQUE NOT NULL,
            manager TEXT,
            location TEXT
        );",
    )?;

    for (name, manager, location) in DEPARTMENTS {
        conn.execute(
            "INSERT INTO departments (name, manager, location) VALUES (?1, ?2, ?3)",
            params![name, manager, location],
        )?;
    }

    for (name, department, position, hire_date, email) in EMPLOYEES {
        conn.execute(
            "INSERT INTO employees (name, department, position, hire_date, email)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![name, department, position, hire_date, email],
        )?;
    }

    let mut rng = rand::thread_rng();
    let start_date = Local::now().date_naive() - Duration::days(30);

    for day in 0..30 {
        let date = start_date + Duration::days(day);
        if matches!(date.weekday(), Weekday::Fri | Weekday::Sat) {
            continue;
        }

        for employee_id in 1..=EMPLOYEES.len() as i64 {
            if rng.gen::<f64>() < 0.85 {
                let check_in = NaiveTime::from_hms_opt(
                    rng.gen_range(7..=9),
                    rng.gen_range(0..60),
                    0,
                )
                .expect("valid check-in time");
                let hours_worked: f64 = rng.gen_range(7.0..9.0);
                let check_out = check_in + Duration::minutes((hours_worked * 60.0) as i64);

                conn.execute(
                    "INSERT INTO attendance
                        (employee_id, date, check_in, check_out, hours_worked, status)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        employee_id,
                        date.to_string(),
                        check_in.format("%H:%M").to_string(),
                        check_out.format("%H:%M").to_string(),
                        (hours_worked * 100.0).round() / 100.0,
                        "Present",
                    ],
                )?;
            } else {
                conn.execute(
                    "INSERT INTO attendance
                        (employee_id, date, check_in, check_out, hours_worked, status)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        employee_id,
                        date.to_string(),
                        None::<String>,
                        None::<String>,
                        0.0,
                        "Absent",
                    ],
                )?;
            }
        }
    }

    info!("Sample database created at: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_database_has_expected_shape() {
        let path = std::env::temp_dir().join(format!(
            "attendance-agent-seed-test-{}.db",
            std::process::id()
        ));
        seed_sample_database(&path).unwrap();

        let conn = Connection::open(&path).unwrap();
        let employees: i64 = conn
            .query_row("SELECT COUNT(*) FROM employees", [], |row| row.get(0))
            .unwrap();
        assert_eq!(employees, 10);

        // Weekends are skipped, so 30 calendar days yield at most 22 workdays.
        let distinct_days: i64 = conn
            .query_row("SELECT COUNT(DISTINCT date) FROM attendance", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert!(distinct_days >= 20 && distinct_days <= 22);

        let bad_status: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM attendance WHERE status NOT IN ('Present', 'Absent')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(bad_status, 0);

        std::fs::remove_file(&path).ok();
    }
}
