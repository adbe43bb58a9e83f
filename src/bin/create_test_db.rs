use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use extrack::{
    Amount, CategoryName, Email, Expense, PasswordHash, ValidatedPassword, create_category,
    create_expense, create_user, initialize_db,
};

/// A utility for creating a test database for the ExTrack server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user (test@example.com)...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user(
        Email::new_unchecked("test@example.com"),
        password_hash,
        &conn,
    )?;

    println!("Creating test categories...");

    let categories = [
        create_category(CategoryName::new_unchecked("Food"), "#ef4444", &conn)?,
        create_category(CategoryName::new_unchecked("Transport"), "#3b82f6", &conn)?,
        create_category(CategoryName::new_unchecked("Entertainment"), "#8b5cf6", &conn)?,
        create_category(CategoryName::new_unchecked("Utilities"), "#f59e0b", &conn)?,
    ];

    println!("Creating test expenses...");

    // A few months of plausible spending, spread out so that the monthly
    // trend chart and the date range filters have something to show.
    let expense_data: &[(f64, i64, usize, &str)] = &[
        (42.50, 2, 0, "Weekly groceries"),
        (3.80, 3, 1, "Bus fare"),
        (18.00, 5, 2, "Movie night"),
        (65.20, 9, 0, "Groceries and snacks"),
        (120.00, 12, 3, "Power bill"),
        (8.50, 15, 0, "Lunch at the corner cafe"),
        (22.00, 21, 1, "Taxi home"),
        (54.30, 33, 0, "Groceries"),
        (95.00, 40, 3, "Internet bill"),
        (31.00, 47, 2, "Concert ticket"),
        (48.90, 61, 0, "Groceries"),
        (12.00, 75, 1, "Train ticket"),
        (110.00, 89, 3, "Power bill"),
    ];

    let today = OffsetDateTime::now_utc().date();
    for &(amount, days_ago, category_index, description) in expense_data {
        create_expense(
            Expense::build(
                Amount::new(amount)?,
                today - Duration::days(days_ago),
                description,
            )
            .category_id(Some(categories[category_index].id)),
            user.id,
            &conn,
        )?;
    }

    println!("Success!");

    Ok(())
}
