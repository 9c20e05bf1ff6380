use chrono::{DateTime, Duration, TimeZone, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    AssignmentGuard, BookingListFilter, CancelPolicy, DriverAvailability, Engine, EngineBuilder,
    EngineError, FixedClock, HotelTier, Money, NewBookingCmd, NewPackageCmd, PackageKind,
    PaymentStatus,
    ReassignPolicy, UpdateBookingCmd, VehicleAvailability,
};
use migration::MigratorTrait;
use uuid::Uuid;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 2, 0, 0).unwrap()
}

async fn migrated_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    db
}

async fn engine_with(
    configure: impl FnOnce(EngineBuilder) -> EngineBuilder,
) -> (Engine, DatabaseConnection) {
    let db = migrated_db().await;
    let builder = Engine::builder()
        .database(db.clone())
        .clock(FixedClock(now()));
    let engine = configure(builder).build().await.unwrap();
    (engine, db)
}

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    engine_with(|b| b).await
}

async fn count(db: &DatabaseConnection, table: &str) -> i64 {
    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_string(
            backend,
            format!("SELECT COUNT(*) AS n FROM {table}"),
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get::<i64>("", "n").unwrap()
}

async fn fleet(engine: &Engine) -> (Uuid, Uuid) {
    let vehicle = engine
        .new_vehicle("B 1234 XY", "Toyota", "Avanza")
        .await
        .unwrap();
    let driver = engine.new_driver("Budi", Some("0812")).await.unwrap();
    (vehicle.id, driver.id)
}

fn rental(vehicle_id: Uuid, driver_id: Uuid) -> NewBookingCmd {
    let checkout = now() + Duration::hours(24);
    NewBookingCmd::new("Siti", checkout, checkout + Duration::hours(15))
        .all_in_rate(Money::new(650_000))
        .overtime_rate_per_hour(Money::new(50_000))
        .fuel_cost(Money::new(200_000))
        .driver_fee(Money::new(150_000))
        .vehicle_id(vehicle_id)
        .driver_id(driver_id)
}

#[tokio::test]
async fn create_claims_vehicle_and_driver() {
    let (engine, _db) = engine_with_db().await;
    let (vehicle_id, driver_id) = fleet(&engine).await;

    let booking = engine
        .create_booking(rental(vehicle_id, driver_id))
        .await
        .unwrap();

    assert_eq!(booking.invoice_code, "INV-20261018-0000");
    assert_eq!(booking.booking_date, now());
    assert_eq!(booking.payment_status, PaymentStatus::Unpaid);
    assert_eq!(
        engine.vehicle(vehicle_id).await.unwrap().availability,
        VehicleAvailability::Booked
    );
    assert_eq!(
        engine.driver(driver_id).await.unwrap().availability,
        DriverAvailability::OnTrip
    );

    let summary = engine.booking_financials(booking.id).await.unwrap();
    assert_eq!(summary.rental_hours, 15);
    assert_eq!(summary.overtime_hours, 3);
    assert_eq!(summary.overtime_fee, Money::new(150_000));
    assert_eq!(summary.total_revenue, Money::new(800_000));
    assert_eq!(summary.total_operational_cost, Money::new(350_000));
    assert_eq!(summary.gross_profit, Money::new(450_000));
}

#[tokio::test]
async fn invoice_date_is_the_local_office_date() {
    let evening_utc = Utc.with_ymd_and_hms(2026, 10, 17, 23, 0, 0).unwrap();
    let (engine, _db) = engine_with(|b| {
        b.timezone(chrono_tz::Asia::Jakarta)
            .clock(FixedClock(evening_utc))
    })
    .await;
    let (vehicle_id, driver_id) = fleet(&engine).await;

    let booking = engine
        .create_booking(rental(vehicle_id, driver_id))
        .await
        .unwrap();
    assert_eq!(booking.invoice_code, "INV-20261018-0000");
}

#[tokio::test]
async fn checkout_already_started_puts_vehicle_on_trip() {
    let (engine, _db) = engine_with_db().await;
    let (vehicle_id, driver_id) = fleet(&engine).await;

    let cmd = NewBookingCmd::new("Siti", now(), now() + Duration::hours(12))
        .vehicle_id(vehicle_id)
        .driver_id(driver_id);
    engine.create_booking(cmd).await.unwrap();

    assert_eq!(
        engine.vehicle(vehicle_id).await.unwrap().availability,
        VehicleAvailability::OnTrip
    );
}

#[tokio::test]
async fn create_is_atomic_when_driver_write_fails() {
    let (engine, db) = engine_with_db().await;
    let (vehicle_id, driver_id) = fleet(&engine).await;
    db.execute_unprepared(
        "CREATE TRIGGER fail_driver_update BEFORE UPDATE ON drivers \
         BEGIN SELECT RAISE(ABORT, 'injected failure'); END;",
    )
    .await
    .unwrap();

    let err = engine
        .create_booking(rental(vehicle_id, driver_id))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Database(_)));

    assert_eq!(count(&db, "bookings").await, 0);
    assert_eq!(
        engine.vehicle(vehicle_id).await.unwrap().availability,
        VehicleAvailability::Ready
    );
    assert_eq!(
        engine.driver(driver_id).await.unwrap().availability,
        DriverAvailability::Ready
    );
}

#[tokio::test]
async fn duplicate_invoice_is_a_conflict_without_partial_state() {
    let (engine, db) = engine_with_db().await;
    let (vehicle_id, driver_id) = fleet(&engine).await;
    let other_vehicle = engine
        .new_vehicle("B 9 ZZ", "Suzuki", "Ertiga")
        .await
        .unwrap();
    let other_driver = engine.new_driver("Agus", None).await.unwrap();

    engine
        .create_booking(rental(vehicle_id, driver_id))
        .await
        .unwrap();
    // Same fixed clock, same invoice code.
    let err = engine
        .create_booking(rental(other_vehicle.id, other_driver.id))
        .await
        .unwrap_err();

    assert_eq!(err, EngineError::ExistingKey("INV-20261018-0000".to_string()));
    assert_eq!(count(&db, "bookings").await, 1);
    assert_eq!(
        engine.vehicle(other_vehicle.id).await.unwrap().availability,
        VehicleAvailability::Ready
    );
    assert_eq!(
        engine.driver(other_driver.id).await.unwrap().availability,
        DriverAvailability::Ready
    );
}

#[tokio::test]
async fn create_rejects_bad_input_before_writing() {
    let (engine, db) = engine_with_db().await;
    let (vehicle_id, driver_id) = fleet(&engine).await;

    let missing_vehicle = NewBookingCmd::new("Siti", now(), now() + Duration::hours(1))
        .driver_id(driver_id);
    assert_eq!(
        engine.create_booking(missing_vehicle).await.unwrap_err(),
        EngineError::Validation("vehicle is required".to_string())
    );

    let inverted = NewBookingCmd::new("Siti", now(), now() - Duration::hours(1))
        .vehicle_id(vehicle_id)
        .driver_id(driver_id);
    assert_eq!(
        engine.create_booking(inverted).await.unwrap_err(),
        EngineError::Validation("check-in must be after check-out".to_string())
    );

    let negative = rental(vehicle_id, driver_id).fuel_cost(Money::new(-1));
    assert_eq!(
        engine.create_booking(negative).await.unwrap_err(),
        EngineError::Validation("fuel cost must not be negative".to_string())
    );

    let blank = NewBookingCmd {
        customer_name: "   ".to_string(),
        ..rental(vehicle_id, driver_id)
    };
    assert!(matches!(
        engine.create_booking(blank).await.unwrap_err(),
        EngineError::Validation(_)
    ));

    let unknown = rental(Uuid::new_v4(), driver_id);
    assert_eq!(
        engine.create_booking(unknown).await.unwrap_err(),
        EngineError::KeyNotFound("vehicle not exists".to_string())
    );

    assert_eq!(count(&db, "bookings").await, 0);
    assert_eq!(
        engine.vehicle(vehicle_id).await.unwrap().availability,
        VehicleAvailability::Ready
    );
}

#[tokio::test]
async fn cancel_always_resets_availability_by_default() {
    let (engine, db) = engine_with_db().await;
    let (vehicle_id, driver_id) = fleet(&engine).await;
    let booking = engine
        .create_booking(rental(vehicle_id, driver_id))
        .await
        .unwrap();

    // Put the vehicle in maintenance behind the booking's back.
    engine
        .set_vehicle_availability(vehicle_id, VehicleAvailability::Maintenance)
        .await
        .unwrap();

    let cancelled = engine.cancel_booking(booking.id).await.unwrap();
    assert_eq!(cancelled.booking.id, booking.id);
    assert!(cancelled.vehicle_released);
    assert!(cancelled.driver_released);

    assert_eq!(count(&db, "bookings").await, 0);
    assert_eq!(
        engine.vehicle(vehicle_id).await.unwrap().availability,
        VehicleAvailability::Ready
    );
    assert_eq!(
        engine.driver(driver_id).await.unwrap().availability,
        DriverAvailability::Ready
    );

    assert_eq!(
        engine.cancel_booking(booking.id).await.unwrap_err(),
        EngineError::KeyNotFound("booking not exists".to_string())
    );
}

#[tokio::test]
async fn cancel_can_preserve_out_of_service_resources() {
    let (engine, _db) =
        engine_with(|b| b.cancel_policy(CancelPolicy::PreserveOutOfService)).await;
    let (vehicle_id, driver_id) = fleet(&engine).await;
    let booking = engine
        .create_booking(rental(vehicle_id, driver_id))
        .await
        .unwrap();
    engine
        .set_vehicle_availability(vehicle_id, VehicleAvailability::Maintenance)
        .await
        .unwrap();

    let cancelled = engine.cancel_booking(booking.id).await.unwrap();
    assert!(!cancelled.vehicle_released);
    assert!(cancelled.driver_released);
    assert_eq!(
        engine.vehicle(vehicle_id).await.unwrap().availability,
        VehicleAvailability::Maintenance
    );
    assert_eq!(
        engine.driver(driver_id).await.unwrap().availability,
        DriverAvailability::Ready
    );
}

#[tokio::test]
async fn reassignment_does_not_touch_availability_by_default() {
    let (engine, _db) = engine_with_db().await;
    let (vehicle_id, driver_id) = fleet(&engine).await;
    let spare = engine
        .new_vehicle("B 777 CD", "Daihatsu", "Xenia")
        .await
        .unwrap();
    let booking = engine
        .create_booking(rental(vehicle_id, driver_id))
        .await
        .unwrap();

    let updated = engine
        .update_booking(
            booking.id,
            UpdateBookingCmd::new()
                .vehicle_id(spare.id)
                .note("switched car"),
        )
        .await
        .unwrap();

    assert_eq!(updated.vehicle_id, spare.id);
    assert_eq!(updated.note.as_deref(), Some("switched car"));
    assert_eq!(updated.invoice_code, booking.invoice_code);
    assert_eq!(
        engine.vehicle(vehicle_id).await.unwrap().availability,
        VehicleAvailability::Booked
    );
    assert_eq!(
        engine.vehicle(spare.id).await.unwrap().availability,
        VehicleAvailability::Ready
    );
}

#[tokio::test]
async fn transfer_policy_moves_availability() {
    let (engine, _db) =
        engine_with(|b| b.reassign_policy(ReassignPolicy::TransferAvailability)).await;
    let (vehicle_id, driver_id) = fleet(&engine).await;
    let spare = engine
        .new_vehicle("B 777 CD", "Daihatsu", "Xenia")
        .await
        .unwrap();
    let relief = engine.new_driver("Agus", None).await.unwrap();
    let booking = engine
        .create_booking(rental(vehicle_id, driver_id))
        .await
        .unwrap();

    engine
        .update_booking(
            booking.id,
            UpdateBookingCmd::new()
                .vehicle_id(spare.id)
                .driver_id(relief.id),
        )
        .await
        .unwrap();

    assert_eq!(
        engine.vehicle(vehicle_id).await.unwrap().availability,
        VehicleAvailability::Ready
    );
    assert_eq!(
        engine.vehicle(spare.id).await.unwrap().availability,
        VehicleAvailability::Booked
    );
    assert_eq!(
        engine.driver(driver_id).await.unwrap().availability,
        DriverAvailability::Ready
    );
    assert_eq!(
        engine.driver(relief.id).await.unwrap().availability,
        DriverAvailability::OnTrip
    );
}

#[tokio::test]
async fn update_validates_the_merged_booking() {
    let (engine, _db) = engine_with_db().await;
    let (vehicle_id, driver_id) = fleet(&engine).await;
    let booking = engine
        .create_booking(rental(vehicle_id, driver_id))
        .await
        .unwrap();

    let err = engine
        .update_booking(
            booking.id,
            UpdateBookingCmd::new().checkin_at(booking.checkout_at),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Validation("check-in must be after check-out".to_string())
    );

    let err = engine
        .update_booking(Uuid::new_v4(), UpdateBookingCmd::new().note("x"))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("booking not exists".to_string()));

    let cleared = engine
        .update_booking(
            booking.id,
            UpdateBookingCmd::new()
                .customer_phone("0813")
                .all_in_rate(Money::new(700_000)),
        )
        .await
        .unwrap();
    assert_eq!(cleared.customer_phone.as_deref(), Some("0813"));
    assert_eq!(cleared.all_in_rate, Money::new(700_000));
    assert_eq!(cleared.fuel_cost, booking.fuel_cost);
}

#[tokio::test]
async fn payment_status_rejects_unknown_values() {
    let (engine, _db) = engine_with_db().await;
    let (vehicle_id, driver_id) = fleet(&engine).await;
    let booking = engine
        .create_booking(rental(vehicle_id, driver_id))
        .await
        .unwrap();

    let err = engine
        .set_payment_status(booking.id, "REFUNDED")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Validation("invalid payment status: REFUNDED".to_string())
    );
    assert_eq!(
        engine.booking(booking.id).await.unwrap().payment_status,
        PaymentStatus::Unpaid
    );

    let paid = engine
        .set_payment_status(booking.id, "DOWN_PAYMENT")
        .await
        .unwrap();
    assert_eq!(paid.payment_status, PaymentStatus::DownPayment);
    assert_eq!(paid.all_in_rate, booking.all_in_rate);

    assert!(matches!(
        engine.set_payment_status(Uuid::new_v4(), "PAID").await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn require_ready_guard_refuses_double_booking() {
    let (engine, db) = engine_with(|b| b.assignment_guard(AssignmentGuard::RequireReady)).await;
    let (vehicle_id, driver_id) = fleet(&engine).await;
    engine
        .create_booking(rental(vehicle_id, driver_id))
        .await
        .unwrap();
    let other_driver = engine.new_driver("Agus", None).await.unwrap();

    let err = engine
        .create_booking(rental(vehicle_id, other_driver.id))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Unavailable("vehicle B 1234 XY is BOOKED".to_string())
    );
    assert_eq!(count(&db, "bookings").await, 1);
}

#[tokio::test]
async fn booking_copies_package_terms() {
    let (engine, _db) = engine_with_db().await;
    let (vehicle_id, driver_id) = fleet(&engine).await;
    let package = engine
        .new_package(
            NewPackageCmd::new("Avanza 10 jam", PackageKind::CarRental)
                .price(Money::new(600_000))
                .overtime_rate_per_hour(Money::new(60_000))
                .base_duration_hours(10),
        )
        .await
        .unwrap();

    let checkout = now() + Duration::hours(1);
    let booking = engine
        .create_booking(
            NewBookingCmd::new("Siti", checkout, checkout + Duration::hours(12))
                .vehicle_id(vehicle_id)
                .driver_id(driver_id)
                .package_id(package.id),
        )
        .await
        .unwrap();

    assert_eq!(booking.all_in_rate, Money::new(600_000));
    assert_eq!(booking.overtime_rate_per_hour, Money::new(60_000));
    assert_eq!(booking.base_duration_hours, Some(10));
    let summary = booking.financials();
    assert_eq!(summary.overtime_hours, 2);
    assert_eq!(summary.total_revenue, Money::new(720_000));

    // Deleting the package keeps the booking and its copied terms.
    engine.delete_package(package.id).await.unwrap();
    let kept = engine.booking(booking.id).await.unwrap();
    assert_eq!(kept.package_id, None);
    assert_eq!(kept.all_in_rate, Money::new(600_000));
}

#[tokio::test]
async fn changing_the_package_applies_all_of_its_terms() {
    let (engine, _db) = engine_with_db().await;
    let (vehicle_id, driver_id) = fleet(&engine).await;
    let ten_hours = engine
        .new_package(
            NewPackageCmd::new("Avanza 10 jam", PackageKind::CarRental)
                .price(Money::new(600_000))
                .overtime_rate_per_hour(Money::new(60_000))
                .base_duration_hours(10),
        )
        .await
        .unwrap();
    let full_day = engine
        .new_package(
            NewPackageCmd::new("Jogja full day", PackageKind::FullDayTrip)
                .price(Money::new(800_000))
                .overtime_rate_per_hour(Money::new(70_000))
                .base_duration_hours(8),
        )
        .await
        .unwrap();
    let tour = engine
        .new_package(
            NewPackageCmd::new("Bromo 3D2N", PackageKind::TourPackage).hotel_tier(HotelTier {
                star_rating: 3,
                price_per_pax: Some(Money::new(2_500_000)),
                hotels: vec!["Hotel Santika".to_string()],
                price_ranges: vec![],
            }),
        )
        .await
        .unwrap();

    let checkout = now() + Duration::hours(1);
    let booking = engine
        .create_booking(
            NewBookingCmd::new("Siti", checkout, checkout + Duration::hours(12))
                .vehicle_id(vehicle_id)
                .driver_id(driver_id)
                .package_id(ten_hours.id),
        )
        .await
        .unwrap();

    let moved = engine
        .update_booking(booking.id, UpdateBookingCmd::new().package_id(full_day.id))
        .await
        .unwrap();
    assert_eq!(moved.package_id, Some(full_day.id));
    assert_eq!(moved.all_in_rate, Money::new(800_000));
    assert_eq!(moved.overtime_rate_per_hour, Money::new(70_000));
    assert_eq!(moved.base_duration_hours, Some(8));
    assert_eq!(moved.financials().total_revenue, Money::new(1_080_000));

    // Explicit rates still win over the package's.
    let negotiated = engine
        .update_booking(
            booking.id,
            UpdateBookingCmd::new()
                .package_id(ten_hours.id)
                .all_in_rate(Money::new(550_000)),
        )
        .await
        .unwrap();
    assert_eq!(negotiated.all_in_rate, Money::new(550_000));
    assert_eq!(negotiated.overtime_rate_per_hour, Money::new(60_000));
    assert_eq!(negotiated.base_duration_hours, Some(10));

    let err = engine
        .update_booking(booking.id, UpdateBookingCmd::new().package_id(tour.id))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Validation("all-in rate is required for tour packages".to_string())
    );
    assert_eq!(engine.booking(booking.id).await.unwrap(), negotiated);

    let detached = engine
        .update_booking(booking.id, UpdateBookingCmd::new().clear_package())
        .await
        .unwrap();
    assert_eq!(detached.package_id, None);
    assert_eq!(detached.base_duration_hours, None);
    assert_eq!(detached.all_in_rate, Money::new(550_000));
    assert_eq!(detached.overtime_rate_per_hour, Money::new(60_000));
}

#[tokio::test]
async fn bookings_page_is_newest_first_with_cursor() {
    let db = migrated_db().await;
    let engine = Engine::builder().database(db.clone()).build().await.unwrap();
    let mut created = Vec::new();
    for i in 0..5 {
        // One engine per booking so every invoice code differs.
        let at = now() - Duration::days(i);
        let clocked = Engine::builder()
            .database(db.clone())
            .clock(FixedClock(at))
            .build()
            .await
            .unwrap();
        let vehicle = clocked
            .new_vehicle(&format!("B {i} AA"), "Toyota", "Avanza")
            .await
            .unwrap();
        let driver = clocked
            .new_driver(&format!("Driver {i}"), None)
            .await
            .unwrap();
        let booking = clocked
            .create_booking(rental(vehicle.id, driver.id))
            .await
            .unwrap();
        assert_eq!(booking.booking_date, at);
        created.push(booking.id);
    }

    let all = BookingListFilter::default();
    let (first, cursor) = engine.bookings_page(2, None, &all).await.unwrap();
    assert_eq!(first.iter().map(|b| b.id).collect::<Vec<_>>(), created[..2]);
    let cursor = cursor.unwrap();

    let (second, cursor) = engine.bookings_page(2, Some(&cursor), &all).await.unwrap();
    assert_eq!(second.iter().map(|b| b.id).collect::<Vec<_>>(), created[2..4]);
    let (third, cursor) = engine
        .bookings_page(2, cursor.as_deref(), &all)
        .await
        .unwrap();
    assert_eq!(third.len(), 1);
    assert_eq!(third[0].id, created[4]);
    assert!(cursor.is_none());

    let recent = BookingListFilter {
        from: Some(now() - Duration::days(1)),
        ..Default::default()
    };
    let (items, _) = engine.bookings_page(10, None, &recent).await.unwrap();
    assert_eq!(items.len(), 2);

    let paid_only = BookingListFilter {
        payment_status: Some(PaymentStatus::Paid),
        ..Default::default()
    };
    let (items, next) = engine.bookings_page(10, None, &paid_only).await.unwrap();
    assert!(items.is_empty());
    assert!(next.is_none());

    assert!(matches!(
        engine.bookings_page(2, Some("not-a-cursor"), &all).await,
        Err(EngineError::Validation(_))
    ));
    assert!(matches!(
        engine.bookings_page(0, None, &all).await,
        Err(EngineError::Validation(_))
    ));
}
