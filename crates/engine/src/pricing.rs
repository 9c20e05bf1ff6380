//! Pax-range price bands of a tour package hotel tier.
//!
//! A band `[min_pax, max_pax]` is inclusive. Bands are compared after sorting
//! by `(min_pax, max_pax)`: a band conflicts with the band before it when it
//! starts strictly before that band ends. Touching bounds (`[1, 3]` then
//! `[3, 5]`) are allowed.
//!
//! Pax counts are `f64` because they come straight from form input, where a
//! blank or garbled field must be reported rather than silently coerced.

use serde::{Deserialize, Serialize};

use crate::{EngineError, Money, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceBand {
    pub min_pax: f64,
    pub max_pax: f64,
    pub price: Money,
}

impl PriceBand {
    pub fn new(min_pax: impl Into<f64>, max_pax: impl Into<f64>, price: Money) -> Self {
        Self {
            min_pax: min_pax.into(),
            max_pax: max_pax.into(),
            price,
        }
    }

    fn is_finite(&self) -> bool {
        self.min_pax.is_finite() && self.max_pax.is_finite()
    }
}

/// A structural problem of one band. `index` is the position in the input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BandError {
    pub index: usize,
    pub message: String,
}

/// Two bands sharing at least one pax count. Indices refer to the input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BandOverlap {
    pub first: usize,
    pub second: usize,
    pub first_range: (f64, f64),
    pub second_range: (f64, f64),
}

impl BandOverlap {
    pub fn message(&self) -> String {
        format!(
            "price range #{} ({}-{} pax) overlaps price range #{} ({}-{} pax)",
            self.second + 1,
            self.second_range.0,
            self.second_range.1,
            self.first + 1,
            self.first_range.0,
            self.first_range.1,
        )
    }
}

/// Everything wrong with a list of bands.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TierReport {
    pub valid: bool,
    pub errors: Vec<BandError>,
    pub overlaps: Vec<BandOverlap>,
}

fn structural_errors(band: &PriceBand) -> Vec<String> {
    let mut errors = Vec::new();
    if !band.min_pax.is_finite() {
        errors.push("min pax must be a number".to_string());
    } else if band.min_pax < 1.0 {
        errors.push("min pax must be at least 1".to_string());
    }
    if !band.max_pax.is_finite() {
        errors.push("max pax must be a number".to_string());
    }
    if band.is_finite() && band.max_pax < band.min_pax {
        errors.push("max pax must not be lower than min pax".to_string());
    }
    if band.price.is_negative() {
        errors.push("price must not be negative".to_string());
    }
    errors
}

fn overlaps(bands: &[PriceBand]) -> Vec<BandOverlap> {
    let mut order: Vec<usize> = (0..bands.len())
        .filter(|&i| bands[i].is_finite())
        .collect();
    order.sort_by(|&a, &b| {
        bands[a]
            .min_pax
            .total_cmp(&bands[b].min_pax)
            .then_with(|| bands[a].max_pax.total_cmp(&bands[b].max_pax))
            .then(a.cmp(&b))
    });

    order
        .windows(2)
        .filter_map(|pair| {
            let (previous, current) = (pair[0], pair[1]);
            (bands[current].min_pax < bands[previous].max_pax).then(|| BandOverlap {
                first: previous,
                second: current,
                first_range: (bands[previous].min_pax, bands[previous].max_pax),
                second_range: (bands[current].min_pax, bands[current].max_pax),
            })
        })
        .collect()
}

/// Full-detail check: every structural error and every overlap.
pub fn inspect(bands: &[PriceBand]) -> TierReport {
    let errors: Vec<BandError> = bands
        .iter()
        .enumerate()
        .flat_map(|(index, band)| {
            structural_errors(band)
                .into_iter()
                .map(move |message| BandError { index, message })
        })
        .collect();
    let overlaps = overlaps(bands);

    TierReport {
        valid: errors.is_empty() && overlaps.is_empty(),
        errors,
        overlaps,
    }
}

/// Fail-fast check: the first blocking violation, if any.
pub fn check(bands: &[PriceBand]) -> ResultEngine<()> {
    for (index, band) in bands.iter().enumerate() {
        if let Some(message) = structural_errors(band).into_iter().next() {
            return Err(EngineError::Validation(format!(
                "price range #{}: {message}",
                index + 1
            )));
        }
    }
    if let Some(overlap) = overlaps(bands).first() {
        return Err(EngineError::Validation(overlap.message()));
    }
    Ok(())
}
