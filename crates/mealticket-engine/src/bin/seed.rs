//! # Seed Data Generator
//!
//! Populates the database with employees and suppliers for development.
//!
//! ## Usage
//! ```bash
//! # 25 employees (default) and the demo suppliers
//! cargo run -p mealticket-engine --bin seed
//!
//! # Custom amount
//! cargo run -p mealticket-engine --bin seed -- --employees 200
//!
//! # Specify database path and monthly allocation
//! cargo run -p mealticket-engine --bin seed -- --db ./data/mealticket.db --allocation 22
//! ```
//!
//! Defaults for `--db` and `--allocation` come from [`RedemptionConfig::load`]
//! (`mealticket.toml`, then `MEALTICKET_*`).
//!
//! Every fifth employee is on leave and every eleventh is suspended, so the
//! status gate can be exercised by hand. One supplier is unverified and one
//! deactivated.

use anyhow::Context;
use chrono::Utc;
use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mealticket_core::{Employee, EmployeeStatus, Supplier, DEFAULT_LOCATION_RADIUS_METERS};
use mealticket_db::repository::generate_id;
use mealticket_db::{Database, DbConfig};
use mealticket_engine::RedemptionConfig;

const FIRST_NAMES: &[&str] = &[
    "Abebe", "Almaz", "Bereket", "Dawit", "Eleni", "Fikir", "Genet", "Hana", "Kebede", "Lidya",
    "Meron", "Nahom", "Rahel", "Samuel", "Tigist", "Yonas",
];

const LAST_NAMES: &[&str] = &[
    "Alemu", "Bekele", "Desta", "Girma", "Haile", "Kassa", "Mekonnen", "Tadesse", "Tesfaye",
    "Wolde",
];

/// (business name, address, latitude, longitude, active, verified)
const SUPPLIERS: &[(&str, &str, f64, f64, bool, bool)] = &[
    ("Kaldi's Coffee Bole", "Bole Road, Addis Ababa", 8.9950, 38.7880, true, true),
    ("Yod Abyssinia", "Bole Medhanialem, Addis Ababa", 8.9970, 38.7890, true, true),
    ("Piassa Kitchen", "Churchill Avenue, Addis Ababa", 9.0337, 38.7500, true, false),
    ("Merkato Injera House", "Merkato, Addis Ababa", 9.0300, 38.7400, false, true),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = RedemptionConfig::load().context("failed to load configuration")?;
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 25;
    let mut db_path = config.database_path.to_string_lossy().into_owned();
    let mut allocation = config.default_monthly_allocation;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--employees" | "-e" => {
                if i + 1 < args.len() {
                    count = args[i + 1]
                        .parse()
                        .with_context(|| format!("invalid employee count '{}'", args[i + 1]))?;
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--allocation" | "-a" => {
                if i + 1 < args.len() {
                    allocation = args[i + 1]
                        .parse()
                        .with_context(|| format!("invalid allocation '{}'", args[i + 1]))?;
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Mealticket Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -e, --employees <N>  Number of employees to generate (default: 25)");
                println!("  -d, --db <PATH>      Database file path (default: database_path from config)");
                println!("  -a, --allocation <N> Monthly coupons per employee (default: default_monthly_allocation from config)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    anyhow::ensure!(allocation >= 0, "allocation cannot be negative");

    info!(database = %db_path, employees = count, allocation, "Seeding database");

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .context("failed to open database")?;

    let existing = db.employees().count().await?;
    if existing > 0 {
        warn!(existing, "Database already has employees; skipping seed");
        return Ok(());
    }

    let start = std::time::Instant::now();

    for seed in 0..count {
        let employee = generate_employee(seed, allocation);
        if let Err(e) = db.employees().insert(&employee).await {
            warn!(employee_code = %employee.employee_code, error = %e, "Failed to insert employee");
        }
    }

    for (business_name, address, latitude, longitude, is_active, is_verified) in SUPPLIERS {
        let now = Utc::now();
        let supplier = Supplier {
            supplier_id: generate_id(),
            user_id: generate_id(),
            business_name: business_name.to_string(),
            address: address.to_string(),
            latitude: *latitude,
            longitude: *longitude,
            location_radius: DEFAULT_LOCATION_RADIUS_METERS,
            is_active: *is_active,
            is_verified: *is_verified,
            created_at: now,
            updated_at: now,
        };
        db.suppliers()
            .insert(&supplier)
            .await
            .with_context(|| format!("failed to insert supplier {business_name}"))?;
    }

    info!(
        employees = db.employees().count().await?,
        suppliers = SUPPLIERS.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Seed complete"
    );

    db.close().await;
    Ok(())
}

/// Builds one employee with a deterministic name, status and balance.
fn generate_employee(seed: usize, allocation: i64) -> Employee {
    let now = Utc::now();
    let first = FIRST_NAMES[seed % FIRST_NAMES.len()];
    let last = LAST_NAMES[(seed / FIRST_NAMES.len()) % LAST_NAMES.len()];

    let status = if seed % 11 == 10 {
        EmployeeStatus::Suspended
    } else if seed % 5 == 4 {
        EmployeeStatus::OnLeave
    } else {
        EmployeeStatus::Active
    };

    Employee {
        employee_id: generate_id(),
        user_id: generate_id(),
        employee_code: format!("EMP-{:04}", seed + 1),
        name: format!("{first} {last}"),
        email: format!(
            "{}.{}{}@example.com",
            first.to_lowercase(),
            last.to_lowercase(),
            seed + 1
        ),
        status,
        monthly_allocation: allocation,
        current_balance: (allocation - (seed as i64 % 7)).max(0),
        last_allocation_date: Some(now),
        created_at: now,
        updated_at: now,
    }
}
