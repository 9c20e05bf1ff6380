use std::error::Error;

use chrono::NaiveDate;
use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand};
use engine::{DateRange, DriverAvailability, Engine, ReportSummary, VehicleAvailability};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "fleetbook_admin")]
#[command(about = "Admin utilities for Fleetbook (fleet bootstrap and period reports)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./fleetbook.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Vehicle(Vehicle),
    Driver(Driver),
    Report(Report),
}

#[derive(Args, Debug)]
struct Vehicle {
    #[command(subcommand)]
    command: VehicleCommand,
}

#[derive(Subcommand, Debug)]
enum VehicleCommand {
    Create(VehicleCreateArgs),
    List,
    /// Moves a vehicle between READY and MAINTENANCE.
    Availability(VehicleAvailabilityArgs),
}

#[derive(Args, Debug)]
struct VehicleCreateArgs {
    #[arg(long)]
    plate: String,
    #[arg(long)]
    brand: String,
    #[arg(long)]
    model: String,
}

#[derive(Args, Debug)]
struct VehicleAvailabilityArgs {
    #[arg(long)]
    id: Uuid,
    #[arg(long, value_parser = parse_vehicle_availability)]
    availability: VehicleAvailability,
}

#[derive(Args, Debug)]
struct Driver {
    #[command(subcommand)]
    command: DriverCommand,
}

#[derive(Subcommand, Debug)]
enum DriverCommand {
    Create(DriverCreateArgs),
    List,
    /// Moves a driver between READY and OFF_DUTY.
    Availability(DriverAvailabilityArgs),
}

#[derive(Args, Debug)]
struct DriverCreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    phone: Option<String>,
}

#[derive(Args, Debug)]
struct DriverAvailabilityArgs {
    #[arg(long)]
    id: Uuid,
    #[arg(long, value_parser = parse_driver_availability)]
    availability: DriverAvailability,
}

#[derive(Args, Debug)]
struct Report {
    #[command(subcommand)]
    command: ReportCommand,
}

#[derive(Subcommand, Debug)]
enum ReportCommand {
    /// Financial summary for the local dates `from..=to`.
    Summary(ReportSummaryArgs),
}

#[derive(Args, Debug)]
struct ReportSummaryArgs {
    #[arg(long)]
    from: NaiveDate,
    #[arg(long)]
    to: NaiveDate,
    #[arg(long, default_value = "UTC", value_parser = parse_timezone)]
    timezone: Tz,
}

fn parse_vehicle_availability(raw: &str) -> Result<VehicleAvailability, String> {
    VehicleAvailability::try_from(raw.to_ascii_uppercase().as_str()).map_err(|err| err.to_string())
}

fn parse_driver_availability(raw: &str) -> Result<DriverAvailability, String> {
    DriverAvailability::try_from(raw.to_ascii_uppercase().as_str()).map_err(|err| err.to_string())
}

fn parse_timezone(raw: &str) -> Result<Tz, String> {
    raw.parse::<Tz>()
        .map_err(|err| format!("unknown timezone {raw}: {err}"))
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

fn print_summary(summary: &ReportSummary) {
    println!(
        "period: {} .. {}",
        summary.range.from.to_rfc3339(),
        summary.range.to.to_rfc3339()
    );
    println!("bookings:          {}", summary.booking_count);
    println!("revenue:           {}", summary.total_revenue);
    println!("operational cost:  {}", summary.total_operational_cost);
    println!("gross profit:      {}", summary.total_gross_profit);
    println!("overtime fees:     {}", summary.total_overtime_fee);
    println!("office expenses:   {}", summary.office_expenses);
    println!("net profit:        {}", summary.net_profit);
    println!("margin:            {:.2}%", summary.profit_margin);

    if !summary.fuel_recap.is_empty() {
        println!("\nfuel");
        for row in &summary.fuel_recap {
            println!(
                "  {:<16} {:<24} {:>14} ({} trips)",
                row.month_label, row.vehicle_label, row.fuel_cost, row.trips
            );
        }
    }
    if !summary.payroll_recap.is_empty() {
        println!("\npayroll");
        for row in &summary.payroll_recap {
            println!(
                "  {:<16} {:<24} {:>14} ({} trips)",
                row.month_label, row.driver_name, row.driver_fee, row.trips
            );
        }
    }
    if !summary.expenses_by_category.is_empty() {
        println!("\nexpenses");
        for row in &summary.expenses_by_category {
            println!("  {:<41} {:>14} ({})", row.category, row.total, row.count);
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;

    match cli.command {
        Command::Vehicle(Vehicle { command }) => {
            let engine = Engine::builder().database(db).build().await?;
            match command {
                VehicleCommand::Create(args) => {
                    let vehicle = engine
                        .new_vehicle(&args.plate, &args.brand, &args.model)
                        .await?;
                    println!("created vehicle: {} ({})", vehicle.plate, vehicle.id);
                }
                VehicleCommand::List => {
                    for vehicle in engine.vehicles().await? {
                        println!(
                            "{}  {:<12} {} {:<16} {}",
                            vehicle.id,
                            vehicle.plate,
                            vehicle.brand,
                            vehicle.model_name,
                            vehicle.availability.as_str()
                        );
                    }
                }
                VehicleCommand::Availability(args) => {
                    let vehicle = engine
                        .set_vehicle_availability(args.id, args.availability)
                        .await?;
                    println!(
                        "vehicle {} is {}",
                        vehicle.plate,
                        vehicle.availability.as_str()
                    );
                }
            }
        }
        Command::Driver(Driver { command }) => {
            let engine = Engine::builder().database(db).build().await?;
            match command {
                DriverCommand::Create(args) => {
                    let driver = engine
                        .new_driver(&args.name, args.phone.as_deref())
                        .await?;
                    println!("created driver: {} ({})", driver.name, driver.id);
                }
                DriverCommand::List => {
                    for driver in engine.drivers().await? {
                        println!(
                            "{}  {:<24} {:<16} {}",
                            driver.id,
                            driver.name,
                            driver.phone.as_deref().unwrap_or("-"),
                            driver.availability.as_str()
                        );
                    }
                }
                DriverCommand::Availability(args) => {
                    let driver = engine
                        .set_driver_availability(args.id, args.availability)
                        .await?;
                    println!("driver {} is {}", driver.name, driver.availability.as_str());
                }
            }
        }
        Command::Report(Report {
            command: ReportCommand::Summary(args),
        }) => {
            let range = match DateRange::from_dates(args.from, args.to, args.timezone) {
                Ok(range) => range,
                Err(err) => {
                    eprintln!("{err}");
                    std::process::exit(2);
                }
            };
            let engine = Engine::builder()
                .database(db)
                .timezone(args.timezone)
                .build()
                .await?;
            let summary = engine.report_summary(range).await?;
            print_summary(&summary);
        }
    }

    Ok(())
}
