use chrono::{DateTime, Utc};
use uuid::Uuid;

use sea_orm::{
    ActiveValue, ConnectionTrait, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};

use crate::{
    EngineError, NewPackageCmd, PackagePricing, ResultEngine, ServicePackage, hotel_tiers, hotels,
    itinerary_days,
    packages::{self, pricing_for},
    price_ranges,
    util::{normalize_optional_text, normalize_required_name},
};

use super::{Engine, with_tx};

/// A package command checked against the kind rules, ready to be written.
struct ValidPackage {
    name: String,
    kind: crate::PackageKind,
    description: Option<String>,
    pricing: PackagePricing,
    itinerary: Vec<crate::ItineraryDay>,
}

fn validate_package(cmd: NewPackageCmd) -> ResultEngine<ValidPackage> {
    let name = normalize_required_name(&cmd.name, "package name")?;
    let pricing = pricing_for(
        cmd.kind,
        cmd.price,
        cmd.overtime_rate_per_hour,
        cmd.base_duration_hours,
        cmd.hotel_tiers,
    )?;
    let mut itinerary = cmd.itinerary;
    for day in &mut itinerary {
        if day.day == 0 {
            return Err(EngineError::Validation(
                "itinerary day must be at least 1".to_string(),
            ));
        }
        day.title = normalize_required_name(&day.title, "itinerary title")?;
        day.description = normalize_optional_text(day.description.as_deref());
    }
    itinerary.sort_by_key(|day| day.day);

    Ok(ValidPackage {
        name,
        kind: cmd.kind,
        description: normalize_optional_text(cmd.description.as_deref()),
        pricing,
        itinerary,
    })
}

fn package_row(
    id: Uuid,
    package: &ValidPackage,
    created_at: Option<DateTime<Utc>>,
) -> packages::ActiveModel {
    let (price, overtime, base) = match &package.pricing {
        PackagePricing::Flat {
            price,
            overtime_rate_per_hour,
            base_duration_hours,
        } => (
            Some(price.amount()),
            Some(overtime_rate_per_hour.amount()),
            *base_duration_hours,
        ),
        PackagePricing::Tiered { .. } => (None, None, None),
    };
    packages::ActiveModel {
        id: ActiveValue::Set(id.to_string()),
        name: ActiveValue::Set(package.name.clone()),
        kind: ActiveValue::Set(package.kind.as_str().to_string()),
        description: ActiveValue::Set(package.description.clone()),
        price: ActiveValue::Set(price),
        overtime_rate_per_hour: ActiveValue::Set(overtime),
        base_duration_hours: ActiveValue::Set(base),
        created_at: created_at.map_or(ActiveValue::NotSet, ActiveValue::Set),
    }
}

impl Engine {
    /// Creates a package with its hotel tiers and itinerary.
    ///
    /// Tour packages have their price bands checked per tier before anything
    /// is written; an overlap rejects the whole package.
    pub async fn new_package(&self, cmd: NewPackageCmd) -> ResultEngine<ServicePackage> {
        let package = validate_package(cmd)?;
        let id = Uuid::new_v4();
        with_tx!(self, |db_tx| {
            package_row(id, &package, Some(self.clock.now()))
                .insert(&db_tx)
                .await
                .map_err(|err| EngineError::from_write(err, "package"))?;
            insert_children(&db_tx, id, &package).await?;
            tracing::info!(package = %id, kind = package.kind.as_str(), "package created");
            self.require_package(&db_tx, id).await
        })
    }

    /// Replaces a package's fields and children. Bookings keep the terms they
    /// copied when they were made.
    pub async fn update_package(
        &self,
        id: Uuid,
        cmd: NewPackageCmd,
    ) -> ResultEngine<ServicePackage> {
        let package = validate_package(cmd)?;
        with_tx!(self, |db_tx| {
            package_row(id, &package, None)
                .update(&db_tx)
                .await
                .map_err(|err| EngineError::from_write(err, "package"))?;
            delete_children(&db_tx, id).await?;
            insert_children(&db_tx, id, &package).await?;
            tracing::info!(package = %id, "package updated");
            self.require_package(&db_tx, id).await
        })
    }

    pub async fn package(&self, id: Uuid) -> ResultEngine<ServicePackage> {
        with_tx!(self, |db_tx| self.require_package(&db_tx, id).await)
    }

    /// All packages, by name.
    pub async fn packages(&self) -> ResultEngine<Vec<ServicePackage>> {
        with_tx!(self, |db_tx| {
            let rows = packages::Entity::find()
                .order_by_asc(packages::Column::Name)
                .all(&db_tx)
                .await?;
            let mut out = Vec::with_capacity(rows.len());
            for row in rows {
                out.push(load_children(&db_tx, row).await?);
            }
            Ok(out)
        })
    }

    /// Deletes a package and its children. Bookings made with it lose the
    /// reference but are kept.
    pub async fn delete_package(&self, id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            delete_children(&db_tx, id).await?;
            let result = packages::Entity::delete_by_id(id.to_string())
                .exec(&db_tx)
                .await
                .map_err(|err| EngineError::from_write(err, "package"))?;
            if result.rows_affected == 0 {
                return Err(EngineError::KeyNotFound("package not exists".to_string()));
            }
            tracing::info!(package = %id, "package deleted");
            Ok(())
        })
    }

    pub(in crate::ops) async fn require_package(
        &self,
        db_tx: &DatabaseTransaction,
        id: Uuid,
    ) -> ResultEngine<ServicePackage> {
        let row = packages::Entity::find_by_id(id.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("package not exists".to_string()))?;
        load_children(db_tx, row).await
    }
}

async fn load_children<C: ConnectionTrait>(
    db: &C,
    row: packages::Model,
) -> ResultEngine<ServicePackage> {
    let tiers = hotel_tiers::Entity::find()
        .filter(hotel_tiers::Column::PackageId.eq(row.id.clone()))
        .order_by_asc(hotel_tiers::Column::Position)
        .all(db)
        .await?;
    let tier_ids: Vec<String> = tiers.iter().map(|t| t.id.clone()).collect();
    let hotel_rows = hotels::Entity::find()
        .filter(hotels::Column::TierId.is_in(tier_ids.clone()))
        .order_by_asc(hotels::Column::Position)
        .all(db)
        .await?;
    let range_rows = price_ranges::Entity::find()
        .filter(price_ranges::Column::TierId.is_in(tier_ids))
        .order_by_asc(price_ranges::Column::Position)
        .all(db)
        .await?;
    let days = itinerary_days::Entity::find()
        .filter(itinerary_days::Column::PackageId.eq(row.id.clone()))
        .order_by_asc(itinerary_days::Column::Day)
        .all(db)
        .await?;
    packages::assemble(row, tiers, hotel_rows, range_rows, days)
}

async fn insert_children(
    db_tx: &DatabaseTransaction,
    package_id: Uuid,
    package: &ValidPackage,
) -> ResultEngine<()> {
    if let PackagePricing::Tiered { hotel_tiers: tiers } = &package.pricing {
        for (position, tier) in (0i32..).zip(tiers) {
            let tier_id = Uuid::new_v4().to_string();
            hotel_tiers::ActiveModel {
                id: ActiveValue::Set(tier_id.clone()),
                package_id: ActiveValue::Set(package_id.to_string()),
                position: ActiveValue::Set(position),
                star_rating: ActiveValue::Set(i32::from(tier.star_rating)),
                price_per_pax: ActiveValue::Set(tier.price_per_pax.map(|p| p.amount())),
            }
            .insert(db_tx)
            .await?;
            for (position, name) in (0i32..).zip(&tier.hotels) {
                hotels::ActiveModel {
                    id: ActiveValue::Set(Uuid::new_v4().to_string()),
                    tier_id: ActiveValue::Set(tier_id.clone()),
                    position: ActiveValue::Set(position),
                    name: ActiveValue::Set(name.trim().to_string()),
                }
                .insert(db_tx)
                .await?;
            }
            for (position, band) in (0i32..).zip(&tier.price_ranges) {
                price_ranges::ActiveModel {
                    id: ActiveValue::Set(Uuid::new_v4().to_string()),
                    tier_id: ActiveValue::Set(tier_id.clone()),
                    position: ActiveValue::Set(position),
                    min_pax: ActiveValue::Set(band.min_pax),
                    max_pax: ActiveValue::Set(band.max_pax),
                    price: ActiveValue::Set(band.price.amount()),
                }
                .insert(db_tx)
                .await?;
            }
        }
    }
    for day in &package.itinerary {
        itinerary_days::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4().to_string()),
            package_id: ActiveValue::Set(package_id.to_string()),
            day: ActiveValue::Set(i32::try_from(day.day).unwrap_or(i32::MAX)),
            title: ActiveValue::Set(day.title.clone()),
            description: ActiveValue::Set(day.description.clone()),
        }
        .insert(db_tx)
        .await?;
    }
    Ok(())
}

/// Removes tiers with their hotels and bands, then the itinerary.
async fn delete_children(db_tx: &DatabaseTransaction, package_id: Uuid) -> ResultEngine<()> {
    let tier_ids: Vec<String> = hotel_tiers::Entity::find()
        .filter(hotel_tiers::Column::PackageId.eq(package_id.to_string()))
        .all(db_tx)
        .await?
        .into_iter()
        .map(|t| t.id)
        .collect();
    hotels::Entity::delete_many()
        .filter(hotels::Column::TierId.is_in(tier_ids.clone()))
        .exec(db_tx)
        .await?;
    price_ranges::Entity::delete_many()
        .filter(price_ranges::Column::TierId.is_in(tier_ids))
        .exec(db_tx)
        .await?;
    hotel_tiers::Entity::delete_many()
        .filter(hotel_tiers::Column::PackageId.eq(package_id.to_string()))
        .exec(db_tx)
        .await?;
    itinerary_days::Entity::delete_many()
        .filter(itinerary_days::Column::PackageId.eq(package_id.to_string()))
        .exec(db_tx)
        .await?;
    Ok(())
}
