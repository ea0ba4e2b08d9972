use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::enums::Gender;
use super::patch::Patch;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub full_name: String,
    /// Date-only; round-trips exactly regardless of timezone.
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub address: String,
    pub phone_number: Option<String>,
    pub insurance_information: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPatient {
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub address: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub insurance_information: Option<String>,
}

/// Partial patient update. Required fields use plain `Option` (absent =
/// untouched); nullable fields use `Patch` so an explicit `null` clears
/// them while a missing key leaves them alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientUpdate {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone_number: Patch<String>,
    #[serde(default)]
    pub insurance_information: Patch<String>,
}
