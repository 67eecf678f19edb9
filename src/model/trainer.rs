//! Trainer entity
//!
//! The record shape, its identifier and the inbound request shapes.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, RosterError};

/// Minimum age accepted by an update
pub const MIN_UPDATE_AGE: i32 = 18;

// =============================================================================
// Identifier
// =============================================================================

/// Opaque trainer identifier
///
/// Always holds the lowercase hyphenated form of a UUID, so two ids compare
/// equal exactly when they name the same trainer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrainerId(String);

impl TrainerId {
    /// Mint a fresh identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Parse and normalize a caller-supplied identifier
    pub fn parse(raw: &str) -> Result<Self> {
        Uuid::parse_str(raw.trim())
            .map(|uuid| Self(uuid.to_string()))
            .map_err(|_| RosterError::InvalidArgument(format!("Invalid trainer ID format: {}", raw)))
    }

    /// Whether `raw` is a well-formed identifier
    pub fn is_well_formed(raw: &str) -> bool {
        Uuid::parse_str(raw.trim()).is_ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TrainerId {
    type Err = RosterError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

// =============================================================================
// Medals
// =============================================================================

/// Closed set of medal categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum MedalTier {
    #[default]
    Unknown = 0,
    Gold = 1,
    Silver = 2,
    Bronze = 3,
}

impl MedalTier {
    /// Map a numeric tier, folding anything out of range into `Unknown`
    pub fn from_number(value: i32) -> Self {
        match value {
            1 => MedalTier::Gold,
            2 => MedalTier::Silver,
            3 => MedalTier::Bronze,
            _ => MedalTier::Unknown,
        }
    }
}

impl fmt::Display for MedalTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MedalTier::Unknown => "unknown",
            MedalTier::Gold => "gold",
            MedalTier::Silver => "silver",
            MedalTier::Bronze => "bronze",
        };
        f.write_str(label)
    }
}

impl FromStr for MedalTier {
    type Err = RosterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unknown" | "0" => Ok(MedalTier::Unknown),
            "gold" | "1" => Ok(MedalTier::Gold),
            "silver" | "2" => Ok(MedalTier::Silver),
            "bronze" | "3" => Ok(MedalTier::Bronze),
            other => Err(RosterError::InvalidArgument(format!(
                "Unknown medal tier: {}",
                other
            ))),
        }
    }
}

/// A medal won in a region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medal {
    pub region: String,
    pub tier: MedalTier,
}

impl Medal {
    pub fn new(region: impl Into<String>, tier: MedalTier) -> Self {
        Self {
            region: region.into(),
            tier,
        }
    }
}

// =============================================================================
// Trainer
// =============================================================================

/// A trainer record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trainer {
    pub id: TrainerId,
    pub name: String,
    pub age: i32,
    pub birth_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub medals: Vec<Medal>,
}

impl Trainer {
    /// Build a trainer for creation
    ///
    /// A missing birth date becomes the Unix epoch and missing medals become
    /// an empty list.
    pub fn from_new(id: TrainerId, input: NewTrainer, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: input.name,
            age: input.age,
            birth_date: input.birth_date.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            created_at: now,
            medals: input.medals.unwrap_or_default(),
        }
    }

    /// Overwrite every mutable field from an update request
    ///
    /// `id` and `created_at` are left untouched; medals are replaced, not merged.
    pub fn apply(&mut self, update: &UpdateTrainer) {
        self.name = update.name.clone();
        self.age = update.age;
        self.birth_date = update.birth_date.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        self.medals = update.medals.clone().unwrap_or_default();
    }
}

/// Inbound item of a create stream
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewTrainer {
    pub name: String,
    pub age: i32,
    pub birth_date: Option<DateTime<Utc>>,
    pub medals: Option<Vec<Medal>>,
}

impl NewTrainer {
    pub fn new(name: impl Into<String>, age: i32) -> Self {
        Self {
            name: name.into(),
            age,
            ..Default::default()
        }
    }

    pub fn with_birth_date(mut self, birth_date: DateTime<Utc>) -> Self {
        self.birth_date = Some(birth_date);
        self
    }

    pub fn with_medal(mut self, medal: Medal) -> Self {
        self.medals.get_or_insert_with(Vec::new).push(medal);
        self
    }
}

/// Full-overwrite update request
///
/// `id` stays a raw string: it is validated by the service, not on decode.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpdateTrainer {
    pub id: String,
    pub name: String,
    pub age: i32,
    pub birth_date: Option<DateTime<Utc>>,
    pub medals: Option<Vec<Medal>>,
}

impl UpdateTrainer {
    pub fn new(id: impl Into<String>, name: impl Into<String>, age: i32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            age,
            ..Default::default()
        }
    }

    pub fn with_birth_date(mut self, birth_date: DateTime<Utc>) -> Self {
        self.birth_date = Some(birth_date);
        self
    }

    pub fn with_medal(mut self, medal: Medal) -> Self {
        self.medals.get_or_insert_with(Vec::new).push(medal);
        self
    }

    /// Check the request fields in order: id, name, age
    ///
    /// Runs before any I/O; returns the normalized id on success.
    pub fn validate(&self) -> Result<TrainerId> {
        let id = TrainerId::parse(&self.id)?;
        if self.name.trim().is_empty() {
            return Err(RosterError::InvalidArgument("Name is required".to_string()));
        }
        if self.age < MIN_UPDATE_AGE {
            return Err(RosterError::InvalidArgument(format!(
                "Age must be {} or older",
                MIN_UPDATE_AGE
            )));
        }
        Ok(id)
    }
}
