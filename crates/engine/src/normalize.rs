//! Boundary normalization of loosely-typed package input.
//!
//! Package forms arrive with several spellings for the same field and with
//! localized labels for the kind. The tables below are the only place those
//! spellings are known; everything past [`package_from_json`] works with a
//! canonical [`NewPackageCmd`].

use serde_json::{Map, Value};

use crate::{
    EngineError, HotelTier, ItineraryDay, Money, NewPackageCmd, PackageKind, ResultEngine,
    pricing::PriceBand,
};

const KIND_KEYS: &[&str] = &["kind", "type", "package_type", "packageType"];
const NAME_KEYS: &[&str] = &["name", "package_name", "packageName", "title"];
const DESCRIPTION_KEYS: &[&str] = &["description", "desc"];
const PRICE_KEYS: &[&str] = &["price", "flat_price", "flatPrice", "base_price", "basePrice"];
const OVERTIME_KEYS: &[&str] = &[
    "overtime_rate_per_hour",
    "overtimeRatePerHour",
    "overtime_rate",
    "overtimeRate",
    "overtime",
];
const DURATION_KEYS: &[&str] = &[
    "base_duration_hours",
    "baseDurationHours",
    "duration",
    "duration_hours",
    "durationHours",
    "base_hours",
];
const TIER_KEYS: &[&str] = &["hotel_tiers", "hotelTiers", "tiers"];
const STAR_KEYS: &[&str] = &["star_rating", "starRating", "stars"];
const PER_PAX_KEYS: &[&str] = &["price_per_pax", "pricePerPax"];
const HOTEL_KEYS: &[&str] = &["hotels", "hotel_options", "hotelOptions"];
const RANGE_KEYS: &[&str] = &["price_ranges", "priceRanges", "ranges"];
const MIN_PAX_KEYS: &[&str] = &["min_pax", "minPax"];
const MAX_PAX_KEYS: &[&str] = &["max_pax", "maxPax"];
const ITINERARY_KEYS: &[&str] = &["itinerary", "itinerary_days", "itineraryDays"];
const DAY_KEYS: &[&str] = &["day", "day_number", "dayNumber"];

const KIND_ALIASES: &[(&str, PackageKind)] = &[
    ("car rental", PackageKind::CarRental),
    ("rental", PackageKind::CarRental),
    ("sewa mobil", PackageKind::CarRental),
    ("rent car", PackageKind::CarRental),
    ("full day trip", PackageKind::FullDayTrip),
    ("full day", PackageKind::FullDayTrip),
    ("fullday", PackageKind::FullDayTrip),
    ("day trip", PackageKind::FullDayTrip),
    ("tour package", PackageKind::TourPackage),
    ("tour", PackageKind::TourPackage),
    ("paket wisata", PackageKind::TourPackage),
    ("paket tour", PackageKind::TourPackage),
];

/// Maps a kind label to its canonical value: canonical names, any casing,
/// `-`/`_` separators and the localized aliases are accepted.
pub fn package_kind(label: &str) -> ResultEngine<PackageKind> {
    let folded = label
        .trim()
        .to_lowercase()
        .replace(['-', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    KIND_ALIASES
        .iter()
        .find(|(alias, _)| *alias == folded)
        .map(|(_, kind)| *kind)
        .ok_or_else(|| EngineError::Validation(format!("unknown package kind: {}", label.trim())))
}

/// Builds a package command from a JSON object using the alias tables.
pub fn package_from_json(value: &Value) -> ResultEngine<NewPackageCmd> {
    let object = as_object(value, "package")?;

    let kind = match pick(object, KIND_KEYS) {
        Some(Value::String(label)) => package_kind(label)?,
        Some(_) => {
            return Err(EngineError::Validation(
                "package kind must be a string".to_string(),
            ));
        }
        None => return Err(EngineError::Validation("package kind is required".to_string())),
    };
    let name = text(object, NAME_KEYS, "package name")?
        .ok_or_else(|| EngineError::Validation("package name is required".to_string()))?;

    let mut cmd = NewPackageCmd::new(name, kind);
    cmd.description = text(object, DESCRIPTION_KEYS, "description")?;
    cmd.price = money(object, PRICE_KEYS, "price")?;
    cmd.overtime_rate_per_hour = money(object, OVERTIME_KEYS, "overtime rate per hour")?;
    cmd.base_duration_hours = integer(object, DURATION_KEYS, "base duration")?;
    cmd.hotel_tiers = list(object, TIER_KEYS)?
        .iter()
        .map(hotel_tier)
        .collect::<ResultEngine<_>>()?;
    cmd.itinerary = list(object, ITINERARY_KEYS)?
        .iter()
        .map(itinerary_day)
        .collect::<ResultEngine<_>>()?;
    Ok(cmd)
}

fn hotel_tier(value: &Value) -> ResultEngine<HotelTier> {
    let object = as_object(value, "hotel tier")?;
    let star_rating = integer(object, STAR_KEYS, "star rating")?
        .ok_or_else(|| EngineError::Validation("star rating is required".to_string()))?;
    let star_rating = u8::try_from(star_rating).map_err(|_| {
        EngineError::Validation("star rating must be between 1 and 5".to_string())
    })?;
    let hotels = list(object, HOTEL_KEYS)?
        .iter()
        .map(|hotel| match hotel {
            Value::String(name) => Ok(name.trim().to_string()),
            Value::Object(map) => text(map, NAME_KEYS, "hotel name")?
                .ok_or_else(|| EngineError::Validation("hotel name is required".to_string())),
            _ => Err(EngineError::Validation(
                "hotel must be a name or an object".to_string(),
            )),
        })
        .collect::<ResultEngine<_>>()?;
    let price_ranges = list(object, RANGE_KEYS)?
        .iter()
        .map(price_band)
        .collect::<ResultEngine<_>>()?;

    Ok(HotelTier {
        star_rating,
        price_per_pax: money(object, PER_PAX_KEYS, "price per pax")?,
        hotels,
        price_ranges,
    })
}

/// Pax counts that are not numbers become NaN so the pricing validator can
/// report them with the band index.
fn price_band(value: &Value) -> ResultEngine<PriceBand> {
    let object = as_object(value, "price range")?;
    let price = money(object, PRICE_KEYS, "price")?
        .ok_or_else(|| EngineError::Validation("price range needs a price".to_string()))?;
    Ok(PriceBand::new(
        pax(pick(object, MIN_PAX_KEYS)),
        pax(pick(object, MAX_PAX_KEYS)),
        price,
    ))
}

fn itinerary_day(value: &Value) -> ResultEngine<ItineraryDay> {
    let object = as_object(value, "itinerary day")?;
    let day = integer(object, DAY_KEYS, "itinerary day")?
        .ok_or_else(|| EngineError::Validation("itinerary day number is required".to_string()))?;
    let day = u32::try_from(day)
        .ok()
        .filter(|day| *day >= 1)
        .ok_or_else(|| EngineError::Validation("itinerary day must be at least 1".to_string()))?;
    let title = text(object, &["title", "name"], "itinerary title")?
        .ok_or_else(|| EngineError::Validation("itinerary title is required".to_string()))?;
    Ok(ItineraryDay {
        day,
        title,
        description: text(object, DESCRIPTION_KEYS, "itinerary description")?,
    })
}

fn as_object<'a>(value: &'a Value, label: &str) -> ResultEngine<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| EngineError::Validation(format!("{label} must be an object")))
}

/// First non-null value under any of the alias keys.
fn pick<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find(|value| !value.is_null())
}

fn text(object: &Map<String, Value>, keys: &[&str], label: &str) -> ResultEngine<Option<String>> {
    match pick(object, keys) {
        None => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.trim().to_string()).filter(|s| !s.is_empty())),
        Some(_) => Err(EngineError::Validation(format!("{label} must be a string"))),
    }
}

fn money(object: &Map<String, Value>, keys: &[&str], label: &str) -> ResultEngine<Option<Money>> {
    let invalid = || EngineError::Validation(format!("{label} must be a whole amount"));
    match pick(object, keys) {
        None => Ok(None),
        Some(Value::Number(number)) => {
            if let Some(amount) = number.as_i64() {
                return Ok(Some(Money::new(amount)));
            }
            match number.as_f64() {
                Some(amount) if amount.fract() == 0.0 && amount.abs() < 9.0e15 => {
                    Ok(Some(Money::new(amount as i64)))
                }
                _ => Err(invalid()),
            }
        }
        Some(Value::String(raw)) if raw.trim().is_empty() => Ok(None),
        Some(Value::String(raw)) => raw.parse::<Money>().map(Some).map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

fn integer(object: &Map<String, Value>, keys: &[&str], label: &str) -> ResultEngine<Option<i64>> {
    let invalid = || EngineError::Validation(format!("{label} must be a whole number"));
    match pick(object, keys) {
        None => Ok(None),
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|n| n.fract() == 0.0 && n.abs() < 9.0e15)
                    .map(|n| n as i64)
            })
            .map(Some)
            .ok_or_else(invalid),
        Some(Value::String(raw)) if raw.trim().is_empty() => Ok(None),
        Some(Value::String(raw)) => raw.trim().parse::<i64>().map(Some).map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

fn list<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> ResultEngine<&'a [Value]> {
    match pick(object, keys) {
        None => Ok(&[]),
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(_) => Err(EngineError::Validation(format!(
            "{} must be a list",
            keys.first().copied().unwrap_or("field")
        ))),
    }
}

fn pax(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(number)) => number.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(raw)) => raw.trim().parse::<f64>().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::pricing;

    #[test]
    fn kind_aliases() {
        assert_eq!(package_kind("CAR_RENTAL").unwrap(), PackageKind::CarRental);
        assert_eq!(package_kind("Sewa  Mobil").unwrap(), PackageKind::CarRental);
        assert_eq!(package_kind("rental").unwrap(), PackageKind::CarRental);
        assert_eq!(package_kind("full-day").unwrap(), PackageKind::FullDayTrip);
        assert_eq!(package_kind("Paket Wisata").unwrap(), PackageKind::TourPackage);
        assert_eq!(package_kind("tour").unwrap(), PackageKind::TourPackage);
        assert!(package_kind("boat").is_err());
    }

    #[test]
    fn flat_package_with_alternate_keys() {
        let cmd = package_from_json(&json!({
            "type": "sewa mobil",
            "title": " Avanza 12 jam ",
            "price": "Rp 650.000",
            "overtimeRate": 50000,
            "durationHours": "12",
        }))
        .unwrap();
        assert_eq!(cmd.kind, PackageKind::CarRental);
        assert_eq!(cmd.name, "Avanza 12 jam");
        assert_eq!(cmd.price, Some(Money::new(650_000)));
        assert_eq!(cmd.overtime_rate_per_hour, Some(Money::new(50_000)));
        assert_eq!(cmd.base_duration_hours, Some(12));
        assert!(cmd.hotel_tiers.is_empty());
    }

    #[test]
    fn tour_package_with_tiers_and_itinerary() {
        let cmd = package_from_json(&json!({
            "package_type": "Paket Wisata",
            "name": "Bromo 3D2N",
            "tiers": [{
                "stars": 3,
                "pricePerPax": 1500000,
                "hotel_options": ["Hotel A", {"name": "Hotel B"}],
                "priceRanges": [
                    {"minPax": 1, "maxPax": 3, "price": 3000000},
                    {"min_pax": "4", "max_pax": 6, "price": 2500000}
                ]
            }],
            "itineraryDays": [{"day": 1, "title": "Arrival"}]
        }))
        .unwrap();
        assert_eq!(cmd.kind, PackageKind::TourPackage);
        let tier = &cmd.hotel_tiers[0];
        assert_eq!(tier.star_rating, 3);
        assert_eq!(tier.hotels, vec!["Hotel A", "Hotel B"]);
        assert_eq!(tier.price_ranges[1].min_pax, 4.0);
        assert_eq!(cmd.itinerary[0].title, "Arrival");
    }

    #[test]
    fn garbled_pax_reaches_the_validator() {
        let cmd = package_from_json(&json!({
            "kind": "tour",
            "name": "Bali",
            "hotel_tiers": [{
                "star_rating": 4,
                "price_ranges": [{"min_pax": "abc", "max_pax": 3, "price": 1}]
            }]
        }))
        .unwrap();
        let report = pricing::inspect(&cmd.hotel_tiers[0].price_ranges);
        assert_eq!(report.errors[0].message, "min pax must be a number");
    }

    #[test]
    fn missing_kind_is_rejected() {
        assert!(package_from_json(&json!({"name": "x"})).is_err());
        assert!(package_from_json(&json!([])).is_err());
    }
}
