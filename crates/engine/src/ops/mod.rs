use std::sync::Arc;

use chrono_tz::Tz;
use sea_orm::{DatabaseConnection, DatabaseTransaction, prelude::*};
use uuid::Uuid;

use crate::{
    AssignmentGuard, CancelPolicy, Clock, Driver, EngineError, ReassignPolicy, ResultEngine,
    SystemClock, Vehicle, drivers, invoice::DEFAULT_INVOICE_PREFIX, vehicles,
};

mod bookings;
mod expenses;
mod fleet;
mod packages;
mod reports;

pub use bookings::BookingListFilter;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    clock: Arc<dyn Clock>,
    timezone: Tz,
    invoice_prefix: String,
    cancel_policy: CancelPolicy,
    reassign_policy: ReassignPolicy,
    assignment_guard: AssignmentGuard,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Time zone used for report windows and bucket keys.
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn cancel_policy(&self) -> CancelPolicy {
        self.cancel_policy
    }

    pub fn reassign_policy(&self) -> ReassignPolicy {
        self.reassign_policy
    }

    pub fn assignment_guard(&self) -> AssignmentGuard {
        self.assignment_guard
    }

    async fn require_vehicle(&self, db: &DatabaseTransaction, id: Uuid) -> ResultEngine<Vehicle> {
        let model = vehicles::Entity::find_by_id(id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("vehicle not exists".to_string()))?;
        Vehicle::try_from(model)
    }

    async fn require_driver(&self, db: &DatabaseTransaction, id: Uuid) -> ResultEngine<Driver> {
        let model = drivers::Entity::find_by_id(id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("driver not exists".to_string()))?;
        Driver::try_from(model)
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    clock: Option<Arc<dyn Clock>>,
    timezone: Option<Tz>,
    invoice_prefix: Option<String>,
    cancel_policy: CancelPolicy,
    reassign_policy: ReassignPolicy,
    assignment_guard: AssignmentGuard,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Source of "now". Defaults to the system clock.
    pub fn clock(mut self, clock: impl Clock + 'static) -> EngineBuilder {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Defaults to UTC.
    pub fn timezone(mut self, tz: Tz) -> EngineBuilder {
        self.timezone = Some(tz);
        self
    }

    pub fn invoice_prefix(mut self, prefix: impl Into<String>) -> EngineBuilder {
        self.invoice_prefix = Some(prefix.into());
        self
    }

    pub fn cancel_policy(mut self, policy: CancelPolicy) -> EngineBuilder {
        self.cancel_policy = policy;
        self
    }

    pub fn reassign_policy(mut self, policy: ReassignPolicy) -> EngineBuilder {
        self.reassign_policy = policy;
        self
    }

    pub fn assignment_guard(mut self, guard: AssignmentGuard) -> EngineBuilder {
        self.assignment_guard = guard;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let invoice_prefix = self
            .invoice_prefix
            .map(|p| p.trim().to_string())
            .unwrap_or_else(|| DEFAULT_INVOICE_PREFIX.to_string());
        if invoice_prefix.is_empty()
            || !invoice_prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(EngineError::Validation(format!(
                "invalid invoice prefix: {invoice_prefix:?}"
            )));
        }

        Ok(Engine {
            database: self.database,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            timezone: self.timezone.unwrap_or(Tz::UTC),
            invoice_prefix,
            cancel_policy: self.cancel_policy,
            reassign_policy: self.reassign_policy,
            assignment_guard: self.assignment_guard,
        })
    }
}
