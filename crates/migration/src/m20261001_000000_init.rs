//! Initial schema migration - creates all tables from scratch.
//!
//! - `vehicles`: fleet units and their availability
//! - `drivers`: drivers and their availability
//! - `service_packages`: car rental / full-day trip / tour offers
//! - `hotel_tiers`, `hotels`, `price_ranges`: tour package pricing
//! - `itinerary_days`: ordered day plan of a package
//! - `bookings`: rentals and tours, with the raw financial terms
//! - `expenses`: office and fleet operating costs

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Vehicles {
    Table,
    Id,
    Plate,
    Brand,
    ModelName,
    Availability,
    CreatedAt,
}

#[derive(Iden)]
enum Drivers {
    Table,
    Id,
    Name,
    Phone,
    Availability,
    CreatedAt,
}

#[derive(Iden)]
enum ServicePackages {
    Table,
    Id,
    Name,
    Kind,
    Description,
    Price,
    OvertimeRatePerHour,
    BaseDurationHours,
    CreatedAt,
}

#[derive(Iden)]
enum HotelTiers {
    Table,
    Id,
    PackageId,
    Position,
    StarRating,
    PricePerPax,
}

#[derive(Iden)]
enum Hotels {
    Table,
    Id,
    TierId,
    Position,
    Name,
}

#[derive(Iden)]
enum PriceRanges {
    Table,
    Id,
    TierId,
    Position,
    MinPax,
    MaxPax,
    Price,
}

#[derive(Iden)]
enum ItineraryDays {
    Table,
    Id,
    PackageId,
    Day,
    Title,
    Description,
}

#[derive(Iden)]
enum Bookings {
    Table,
    Id,
    InvoiceCode,
    CustomerName,
    CustomerPhone,
    BookingDate,
    CheckoutAt,
    CheckinAt,
    AllInRate,
    OvertimeRatePerHour,
    FuelCost,
    DriverFee,
    BaseDurationHours,
    PaymentStatus,
    Note,
    VehicleId,
    DriverId,
    PackageId,
    CreatedAt,
}

#[derive(Iden)]
enum Expenses {
    Table,
    Id,
    SpentAt,
    Category,
    Description,
    Amount,
    VehicleId,
    CreatedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Vehicles
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Vehicles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Vehicles::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Vehicles::Plate).string().not_null())
                    .col(ColumnDef::new(Vehicles::Brand).string().not_null())
                    .col(ColumnDef::new(Vehicles::ModelName).string().not_null())
                    .col(
                        ColumnDef::new(Vehicles::Availability)
                            .string()
                            .not_null()
                            .default("READY"),
                    )
                    .col(
                        ColumnDef::new(Vehicles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-vehicles-plate-unique")
                    .table(Vehicles::Table)
                    .col(Vehicles::Plate)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Drivers
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Drivers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Drivers::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Drivers::Name).string().not_null())
                    .col(ColumnDef::new(Drivers::Phone).string())
                    .col(
                        ColumnDef::new(Drivers::Availability)
                            .string()
                            .not_null()
                            .default("READY"),
                    )
                    .col(
                        ColumnDef::new(Drivers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Service packages and their children
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(ServicePackages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ServicePackages::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ServicePackages::Name).string().not_null())
                    .col(ColumnDef::new(ServicePackages::Kind).string().not_null())
                    .col(ColumnDef::new(ServicePackages::Description).text())
                    .col(ColumnDef::new(ServicePackages::Price).big_integer())
                    .col(ColumnDef::new(ServicePackages::OvertimeRatePerHour).big_integer())
                    .col(ColumnDef::new(ServicePackages::BaseDurationHours).big_integer())
                    .col(
                        ColumnDef::new(ServicePackages::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(HotelTiers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(HotelTiers::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(HotelTiers::PackageId).string().not_null())
                    .col(ColumnDef::new(HotelTiers::Position).integer().not_null())
                    .col(ColumnDef::new(HotelTiers::StarRating).integer().not_null())
                    .col(ColumnDef::new(HotelTiers::PricePerPax).big_integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-hotel_tiers-package_id")
                            .from(HotelTiers::Table, HotelTiers::PackageId)
                            .to(ServicePackages::Table, ServicePackages::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Hotels::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Hotels::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Hotels::TierId).string().not_null())
                    .col(ColumnDef::new(Hotels::Position).integer().not_null())
                    .col(ColumnDef::new(Hotels::Name).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-hotels-tier_id")
                            .from(Hotels::Table, Hotels::TierId)
                            .to(HotelTiers::Table, HotelTiers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PriceRanges::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PriceRanges::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PriceRanges::TierId).string().not_null())
                    .col(ColumnDef::new(PriceRanges::Position).integer().not_null())
                    .col(ColumnDef::new(PriceRanges::MinPax).double().not_null())
                    .col(ColumnDef::new(PriceRanges::MaxPax).double().not_null())
                    .col(ColumnDef::new(PriceRanges::Price).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-price_ranges-tier_id")
                            .from(PriceRanges::Table, PriceRanges::TierId)
                            .to(HotelTiers::Table, HotelTiers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ItineraryDays::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ItineraryDays::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ItineraryDays::PackageId).string().not_null())
                    .col(ColumnDef::new(ItineraryDays::Day).integer().not_null())
                    .col(ColumnDef::new(ItineraryDays::Title).string().not_null())
                    .col(ColumnDef::new(ItineraryDays::Description).text())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-itinerary_days-package_id")
                            .from(ItineraryDays::Table, ItineraryDays::PackageId)
                            .to(ServicePackages::Table, ServicePackages::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Bookings
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Bookings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Bookings::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Bookings::InvoiceCode).string().not_null())
                    .col(ColumnDef::new(Bookings::CustomerName).string().not_null())
                    .col(ColumnDef::new(Bookings::CustomerPhone).string())
                    .col(
                        ColumnDef::new(Bookings::BookingDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Bookings::CheckoutAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Bookings::CheckinAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Bookings::AllInRate)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Bookings::OvertimeRatePerHour)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Bookings::FuelCost)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Bookings::DriverFee)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Bookings::BaseDurationHours).big_integer())
                    .col(
                        ColumnDef::new(Bookings::PaymentStatus)
                            .string()
                            .not_null()
                            .default("UNPAID"),
                    )
                    .col(ColumnDef::new(Bookings::Note).text())
                    .col(ColumnDef::new(Bookings::VehicleId).string().not_null())
                    .col(ColumnDef::new(Bookings::DriverId).string().not_null())
                    .col(ColumnDef::new(Bookings::PackageId).string())
                    .col(
                        ColumnDef::new(Bookings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bookings-vehicle_id")
                            .from(Bookings::Table, Bookings::VehicleId)
                            .to(Vehicles::Table, Vehicles::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bookings-driver_id")
                            .from(Bookings::Table, Bookings::DriverId)
                            .to(Drivers::Table, Drivers::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bookings-package_id")
                            .from(Bookings::Table, Bookings::PackageId)
                            .to(ServicePackages::Table, ServicePackages::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bookings-invoice_code-unique")
                    .table(Bookings::Table)
                    .col(Bookings::InvoiceCode)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bookings-booking_date-id")
                    .table(Bookings::Table)
                    .col(Bookings::BookingDate)
                    .col(Bookings::Id)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Expenses
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Expenses::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Expenses::SpentAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Expenses::Category).string().not_null())
                    .col(ColumnDef::new(Expenses::Description).text())
                    .col(ColumnDef::new(Expenses::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Expenses::VehicleId).string())
                    .col(
                        ColumnDef::new(Expenses::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expenses-vehicle_id")
                            .from(Expenses::Table, Expenses::VehicleId)
                            .to(Vehicles::Table, Vehicles::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expenses-spent_at")
                    .table(Expenses::Table)
                    .col(Expenses::SpentAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Bookings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ItineraryDays::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PriceRanges::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Hotels::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(HotelTiers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ServicePackages::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Drivers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Vehicles::Table).to_owned())
            .await?;
        Ok(())
    }
}
