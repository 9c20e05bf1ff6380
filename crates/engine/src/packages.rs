//! Service packages: flat-priced car rentals and day trips, tier-priced tours.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, Money, ResultEngine, hotel_tiers, hotels, itinerary_days, price_ranges,
    pricing::{self, PriceBand},
    util::{ensure_not_negative, parse_uuid},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PackageKind {
    CarRental,
    FullDayTrip,
    TourPackage,
}

impl PackageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CarRental => "CAR_RENTAL",
            Self::FullDayTrip => "FULL_DAY_TRIP",
            Self::TourPackage => "TOUR_PACKAGE",
        }
    }

    /// Whether the kind is priced per hotel tier instead of a flat price.
    pub fn is_tiered(self) -> bool {
        self == Self::TourPackage
    }
}

impl TryFrom<&str> for PackageKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "CAR_RENTAL" => Ok(Self::CarRental),
            "FULL_DAY_TRIP" => Ok(Self::FullDayTrip),
            "TOUR_PACKAGE" => Ok(Self::TourPackage),
            other => Err(EngineError::Validation(format!(
                "invalid package kind: {other}"
            ))),
        }
    }
}

/// A star-rating bucket of a tour package.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HotelTier {
    pub star_rating: u8,
    pub price_per_pax: Option<Money>,
    #[serde(default)]
    pub hotels: Vec<String>,
    #[serde(default)]
    pub price_ranges: Vec<PriceBand>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItineraryDay {
    pub day: u32,
    pub title: String,
    pub description: Option<String>,
}

/// How a package is priced. The variant is fixed by the package kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PackagePricing {
    Flat {
        price: Money,
        overtime_rate_per_hour: Money,
        base_duration_hours: Option<i64>,
    },
    Tiered {
        hotel_tiers: Vec<HotelTier>,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServicePackage {
    pub id: Uuid,
    pub name: String,
    pub kind: PackageKind,
    pub description: Option<String>,
    pub pricing: PackagePricing,
    pub itinerary: Vec<ItineraryDay>,
}

impl ServicePackage {
    /// Flat price and overtime rate, for kinds that have them.
    pub fn flat_rates(&self) -> Option<(Money, Money)> {
        match &self.pricing {
            PackagePricing::Flat {
                price,
                overtime_rate_per_hour,
                ..
            } => Some((*price, *overtime_rate_per_hour)),
            PackagePricing::Tiered { .. } => None,
        }
    }

    pub fn base_duration_hours(&self) -> Option<i64> {
        match &self.pricing {
            PackagePricing::Flat {
                base_duration_hours,
                ..
            } => *base_duration_hours,
            PackagePricing::Tiered { .. } => None,
        }
    }
}

/// Builds the pricing of a package from loose fields, enforcing that flat
/// kinds carry a price and no tiers, and tours carry tiers and no price.
pub(crate) fn pricing_for(
    kind: PackageKind,
    price: Option<Money>,
    overtime_rate_per_hour: Option<Money>,
    base_duration_hours: Option<i64>,
    hotel_tiers: Vec<HotelTier>,
) -> ResultEngine<PackagePricing> {
    if kind.is_tiered() {
        if price.is_some() || overtime_rate_per_hour.is_some() || base_duration_hours.is_some() {
            return Err(EngineError::Validation(
                "tour packages are priced per hotel tier, not with a flat price".to_string(),
            ));
        }
        if hotel_tiers.is_empty() {
            return Err(EngineError::Validation(
                "tour packages need at least one hotel tier".to_string(),
            ));
        }
        for (index, tier) in hotel_tiers.iter().enumerate() {
            validate_tier(tier).map_err(|err| match err {
                EngineError::Validation(message) => {
                    EngineError::Validation(format!("hotel tier #{}: {message}", index + 1))
                }
                other => other,
            })?;
        }
        return Ok(PackagePricing::Tiered { hotel_tiers });
    }

    if !hotel_tiers.is_empty() {
        return Err(EngineError::Validation(format!(
            "{} packages have no hotel tiers",
            kind.as_str()
        )));
    }
    let price = price.ok_or_else(|| {
        EngineError::Validation(format!("{} packages need a price", kind.as_str()))
    })?;
    ensure_not_negative(price, "price")?;
    let overtime_rate_per_hour = overtime_rate_per_hour.unwrap_or(Money::ZERO);
    ensure_not_negative(overtime_rate_per_hour, "overtime rate per hour")?;
    if base_duration_hours.is_some_and(|hours| hours <= 0) {
        return Err(EngineError::Validation(
            "base duration must be at least one hour".to_string(),
        ));
    }
    Ok(PackagePricing::Flat {
        price,
        overtime_rate_per_hour,
        base_duration_hours,
    })
}

fn validate_tier(tier: &HotelTier) -> ResultEngine<()> {
    if !(1..=5).contains(&tier.star_rating) {
        return Err(EngineError::Validation(
            "star rating must be between 1 and 5".to_string(),
        ));
    }
    if let Some(price) = tier.price_per_pax {
        ensure_not_negative(price, "price per pax")?;
    }
    if tier.hotels.iter().any(|name| name.trim().is_empty()) {
        return Err(EngineError::Validation(
            "hotel name must not be empty".to_string(),
        ));
    }
    pricing::check(&tier.price_ranges)
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "service_packages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub kind: String,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub overtime_rate_per_hour: Option<i64>,
    pub base_duration_hours: Option<i64>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Reassembles a package from its row and its child rows, all ordered by
/// position.
pub(crate) fn assemble(
    model: Model,
    tiers: Vec<hotel_tiers::Model>,
    hotel_rows: Vec<hotels::Model>,
    range_rows: Vec<price_ranges::Model>,
    days: Vec<itinerary_days::Model>,
) -> ResultEngine<ServicePackage> {
    let kind = PackageKind::try_from(model.kind.as_str())?;
    let pricing = if kind.is_tiered() {
        let hotel_tiers = tiers
            .into_iter()
            .map(|tier| {
                let hotels = hotel_rows
                    .iter()
                    .filter(|h| h.tier_id == tier.id)
                    .map(|h| h.name.clone())
                    .collect();
                let price_ranges = range_rows
                    .iter()
                    .filter(|r| r.tier_id == tier.id)
                    .map(|r| PriceBand::new(r.min_pax, r.max_pax, Money::new(r.price)))
                    .collect();
                HotelTier {
                    star_rating: u8::try_from(tier.star_rating).unwrap_or_default(),
                    price_per_pax: tier.price_per_pax.map(Money::new),
                    hotels,
                    price_ranges,
                }
            })
            .collect();
        PackagePricing::Tiered { hotel_tiers }
    } else {
        PackagePricing::Flat {
            price: Money::new(model.price.unwrap_or_default()),
            overtime_rate_per_hour: Money::new(model.overtime_rate_per_hour.unwrap_or_default()),
            base_duration_hours: model.base_duration_hours,
        }
    };
    let itinerary = days
        .into_iter()
        .map(|day| ItineraryDay {
            day: u32::try_from(day.day).unwrap_or_default(),
            title: day.title,
            description: day.description,
        })
        .collect();

    Ok(ServicePackage {
        id: parse_uuid(&model.id, "package")?,
        name: model.name,
        kind,
        description: model.description,
        pricing,
        itinerary,
    })
}
