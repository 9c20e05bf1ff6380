//! Booking and accounting engine for a fleet-rental and tour office.
//!
//! Pure parts ([`finance`], [`pricing`], [`reports`]) work on plain values;
//! [`Engine`] wraps a `sea-orm` connection and runs the booking lifecycle,
//! catalog maintenance and report queries on top of them.

pub use bookings::{Booking, CancelledBooking, PaymentStatus};
pub use clock::{Clock, FixedClock, SystemClock};
pub use commands::{NewBookingCmd, NewExpenseCmd, NewPackageCmd, UpdateBookingCmd};
pub use drivers::{Driver, DriverAvailability};
pub use error::{EngineError, ErrorKind};
pub use expenses::Expense;
pub use finance::{AggregateTotals, FinancialSummary, NetProfit, RentalTerms, ValidationReport};
pub use money::Money;
pub use ops::{BookingListFilter, Engine, EngineBuilder};
pub use packages::{HotelTier, ItineraryDay, PackageKind, PackagePricing, ServicePackage};
pub use policy::{AssignmentGuard, CancelPolicy, ReassignPolicy};
pub use pricing::{BandError, BandOverlap, PriceBand, TierReport};
pub use reports::{
    CategoryTotal, DashboardStats, DateRange, FleetStatusCount, FuelRecapRow, PayrollRecapRow,
    ReportSummary, StatsPeriod, StatsQuery, TrendBucket, VehicleExpenseTotal, VehicleRevenue,
};
pub use vehicles::{Vehicle, VehicleAvailability};

mod bookings;
mod clock;
mod commands;
mod drivers;
mod error;
mod expenses;
pub mod finance;
mod hotel_tiers;
mod hotels;
pub mod invoice;
mod itinerary_days;
mod money;
pub mod normalize;
mod ops;
mod packages;
mod policy;
mod price_ranges;
pub mod pricing;
pub mod reports;
mod util;
mod vehicles;

type ResultEngine<T> = Result<T, EngineError>;
