use crate::utils::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

pub const LONGITUDE_RANGE: (f64, f64) = (-180.0, 180.0);
pub const LATITUDE_RANGE: (f64, f64) = (-90.0, 90.0);

/// A validated `[longitude, latitude]` pair.
///
/// The fields are private so a `Coordinate` can only come out of
/// [`Coordinate::new`] and is never observable out of range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    longitude: f64,
    latitude: f64,
}

impl Coordinate {
    pub fn new(longitude: f64, latitude: f64) -> Result<Self, ValidationError> {
        check_axis("longitude", longitude, LONGITUDE_RANGE)?;
        check_axis("latitude", latitude, LATITUDE_RANGE)?;
        Ok(Self {
            longitude,
            latitude,
        })
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }
}

// NaN fails both comparisons, so it is rejected by the negated range check.
fn check_axis(axis: &'static str, value: f64, (min, max): (f64, f64)) -> Result<(), ValidationError> {
    if !(min..=max).contains(&value) {
        return Err(ValidationError::OutOfRange {
            axis,
            value,
            min,
            max,
        });
    }
    Ok(())
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.6}, {:.6}]", self.longitude, self.latitude)
    }
}

/// Unvalidated input for [`Port::new`].
///
/// `coordinates` must hold exactly `[longitude, latitude]`; `unlocs` left as
/// `None` becomes an empty list.
#[derive(Debug, Clone, Default)]
pub struct PortDraft {
    pub id: String,
    pub name: String,
    pub city: String,
    pub country: String,
    pub coordinates: Vec<f64>,
    pub province: String,
    pub timezone: String,
    pub unlocs: Option<Vec<String>>,
    pub code: String,
}

/// A port record as held by a [`PortRepository`](crate::domain::ports::PortRepository).
///
/// Fields are public so callers may assemble a record by hand; such records
/// must pass [`Port::validate`] before they are written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Port {
    pub id: String,
    pub name: String,
    pub city: String,
    pub country: String,
    pub coordinates: Option<Coordinate>,
    pub province: String,
    pub timezone: String,
    pub unlocs: Vec<String>,
    pub code: String,
}

impl Port {
    pub fn new(draft: PortDraft) -> Result<Self, ValidationError> {
        if draft.id.is_empty() {
            return Err(ValidationError::EmptyId);
        }
        if draft.name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let coordinates = match draft.coordinates.as_slice() {
            [longitude, latitude] => Coordinate::new(*longitude, *latitude)?,
            other => {
                return Err(ValidationError::BadCoordinateCount { got: other.len() });
            }
        };

        Ok(Self {
            id: draft.id,
            name: draft.name,
            city: draft.city,
            country: draft.country,
            coordinates: Some(coordinates),
            province: draft.province,
            timezone: draft.timezone,
            unlocs: draft.unlocs.unwrap_or_default(),
            code: draft.code,
        })
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::EmptyId);
        }
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.coordinates.is_none() {
            return Err(ValidationError::MissingCoordinates);
        }
        Ok(())
    }
}

impl TryFrom<PortDraft> for Port {
    type Error = ValidationError;

    fn try_from(draft: PortDraft) -> Result<Self, Self::Error> {
        Port::new(draft)
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Port{{ID: {}, Name: {}, Location: {}, ", self.id, self.name, self.city)?;
        match &self.coordinates {
            Some(coordinates) => write!(f, "{}}}", coordinates),
            None => write!(f, "<no coordinates>}}"),
        }
    }
}

/// Point-in-time counters of a repository.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RepositoryStats {
    /// Distinct keys currently held.
    pub total_ports: u64,
    /// Every successful write, overwrites included.
    pub total_updates: u64,
    pub last_update: Option<DateTime<Utc>>,
}

impl RepositoryStats {
    pub fn last_update_rfc3339(&self) -> Option<String> {
        self.last_update.map(|ts| ts.to_rfc3339())
    }
}
