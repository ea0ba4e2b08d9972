//! Patient registry operations.
//!
//! Updates are three-state merges: a field left out of the payload is
//! untouched, an explicit null clears an optional field, a value
//! replaces it. `updated_at` is refreshed on every successful update
//! even when the merge changed nothing.

use chrono::Utc;
use rusqlite::Connection;
use thiserror::Error;

use crate::db::{repository, DatabaseError};
use crate::models::{NewPatient, Patient, PatientUpdate};

#[derive(Error, Debug)]
pub enum PatientError {
    #[error("Patient with id {0} not found")]
    NotFound(i64),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

fn require_non_empty(field: &str, value: &str) -> Result<(), PatientError> {
    if value.trim().is_empty() {
        return Err(PatientError::Validation(format!(
            "{field} must not be empty"
        )));
    }
    Ok(())
}

pub fn create_patient(conn: &Connection, input: &NewPatient) -> Result<Patient, PatientError> {
    require_non_empty("full_name", &input.full_name)?;
    require_non_empty("address", &input.address)?;

    let patient = repository::insert_patient(conn, input, Utc::now())?;
    tracing::debug!(patient_id = patient.id, "created patient");
    Ok(patient)
}

pub fn list_patients(conn: &Connection) -> Result<Vec<Patient>, PatientError> {
    Ok(repository::list_patients(conn)?)
}

pub fn get_patient(conn: &Connection, id: i64) -> Result<Patient, PatientError> {
    repository::get_patient(conn, id)?.ok_or(PatientError::NotFound(id))
}

/// Merge a partial update onto the stored row and write it back.
pub fn update_patient(
    conn: &Connection,
    id: i64,
    update: &PatientUpdate,
) -> Result<Patient, PatientError> {
    let mut current = repository::get_patient(conn, id)?.ok_or(PatientError::NotFound(id))?;

    if let Some(full_name) = &update.full_name {
        require_non_empty("full_name", full_name)?;
        current.full_name = full_name.clone();
    }
    if let Some(date_of_birth) = update.date_of_birth {
        current.date_of_birth = date_of_birth;
    }
    if let Some(gender) = update.gender {
        current.gender = gender;
    }
    if let Some(address) = &update.address {
        require_non_empty("address", address)?;
        current.address = address.clone();
    }
    current.phone_number = update.phone_number.clone().apply(current.phone_number);
    current.insurance_information = update
        .insurance_information
        .clone()
        .apply(current.insurance_information);

    let patient = repository::update_patient(conn, &current, Utc::now())?;
    tracing::debug!(patient_id = patient.id, "updated patient");
    Ok(patient)
}
