use crate::draft::DraftItem;
use crate::validate::parse_price_thousands;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Multiplier from the "price in thousands" typed by the operator
pub const PRICE_UNIT: f64 = 1000.0;

// Largest integer an f64 holds exactly
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Public URL of a photo returned by the asset host. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PhotoUrl(String);

impl PhotoUrl {
    pub fn new(url: impl Into<String>) -> Option<PhotoUrl> {
        let url = url.into();
        if url.trim().is_empty() {
            None
        } else {
            Some(PhotoUrl(url))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhotoUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Price(f64);

impl Price {
    /// None when the scaled value leaves the finite range
    pub fn from_thousands(thousands: f64) -> Option<Price> {
        let value = thousands * PRICE_UNIT;
        value.is_finite().then_some(Price(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Whole prices go out as JSON integers, fractional ones as floats
impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self.0;
        if value.fract() == 0.0 && value.abs() <= MAX_EXACT_INTEGER {
            serializer.serialize_i64(value as i64)
        } else {
            serializer.serialize_f64(value)
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Available,
}

/// Record persisted to the catalog store
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRecord {
    pub name: String,
    pub notes: String,
    pub price: Price,
    pub photo_url: PhotoUrl,
    pub status: ItemStatus,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RecordError {
    #[error("Price is not a finite number: {0:?}")]
    InvalidPrice(String),
}

impl CatalogRecord {
    /// Derive the persisted record from a draft and the URL of its uploaded photo
    pub fn from_draft(draft: &DraftItem, photo_url: PhotoUrl) -> Result<CatalogRecord, RecordError> {
        let price = parse_price_thousands(&draft.price_thousands)
            .and_then(Price::from_thousands)
            .ok_or_else(|| RecordError::InvalidPrice(draft.price_thousands.clone()))?;

        Ok(CatalogRecord {
            name: draft.name.clone(),
            notes: draft.notes.clone(),
            price,
            photo_url,
            status: ItemStatus::Available,
        })
    }
}
