//! Prescription issuance and lookup.
//!
//! A prescription embeds a snapshot of the patient taken at creation
//! time, including an age computed against the date of issue. The
//! header and its medications are written in one transaction, so an
//! unknown patient or a failed medication insert leaves nothing behind.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rusqlite::Connection;
use thiserror::Error;

use crate::db::repository::{self, PrescriptionDraft};
use crate::db::DatabaseError;
use crate::models::{
    NewPrescription, PatientSnapshot, Prescription, PrescriptionWithMedications,
};

#[derive(Error, Debug)]
pub enum PrescriptionError {
    #[error("Patient with id {0} not found")]
    PatientNotFound(i64),

    #[error("Prescription with id {0} not found")]
    NotFound(i64),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Completed years of age on `on`. The year difference is reduced by
/// one when the birthday has not yet occurred that year.
pub fn age_on(date_of_birth: NaiveDate, on: NaiveDate) -> i32 {
    let mut age = on.year() - date_of_birth.year();
    if (on.month(), on.day()) < (date_of_birth.month(), date_of_birth.day()) {
        age -= 1;
    }
    age
}

fn validate(input: &NewPrescription) -> Result<(), PrescriptionError> {
    let require = |field: &str, value: &str| -> Result<(), PrescriptionError> {
        if value.trim().is_empty() {
            return Err(PrescriptionError::Validation(format!(
                "{field} must not be empty"
            )));
        }
        Ok(())
    };

    require("diagnosis", &input.diagnosis)?;
    require("doctor_name", &input.doctor_name)?;
    require("doctor_qualification", &input.doctor_qualification)?;
    require("clinic_name", &input.clinic_name)?;
    require("clinic_code", &input.clinic_code)?;

    if input.medications.is_empty() {
        return Err(PrescriptionError::Validation(
            "a prescription requires at least one medication".into(),
        ));
    }
    for (i, med) in input.medications.iter().enumerate() {
        require(&format!("medications[{i}].medicine_name"), &med.medicine_name)?;
        require(&format!("medications[{i}].dosage"), &med.dosage)?;
    }

    Ok(())
}

pub fn create_prescription(
    conn: &mut Connection,
    input: &NewPrescription,
) -> Result<PrescriptionWithMedications, PrescriptionError> {
    create_prescription_at(conn, input, Utc::now())
}

/// Creation with an injected issue timestamp, so the snapshot age is
/// testable against a fixed date.
pub fn create_prescription_at(
    conn: &mut Connection,
    input: &NewPrescription,
    now: DateTime<Utc>,
) -> Result<PrescriptionWithMedications, PrescriptionError> {
    validate(input)?;

    // Resolve the patient before opening the transaction: an unknown
    // patient must not consume an id or write anything.
    let patient = repository::get_patient(conn, input.patient_id)?
        .ok_or(PrescriptionError::PatientNotFound(input.patient_id))?;

    let snapshot = PatientSnapshot {
        patient_full_name: patient.full_name,
        patient_date_of_birth: patient.date_of_birth,
        patient_age: age_on(patient.date_of_birth, now.date_naive()),
        gender: patient.gender,
        address: patient.address,
    };

    let draft = PrescriptionDraft {
        patient_id: input.patient_id,
        snapshot: &snapshot,
        diagnosis: &input.diagnosis,
        icd_10_code: input.icd_10_code.as_deref(),
        doctor_name: &input.doctor_name,
        doctor_qualification: &input.doctor_qualification,
        clinic_name: &input.clinic_name,
        clinic_code: &input.clinic_code,
        digital_signature: input.digital_signature.as_deref(),
        additional_notes: input.additional_notes.as_deref(),
    };

    let tx = conn.transaction().map_err(DatabaseError::from)?;
    let id = repository::insert_prescription(&tx, &draft, now)?;
    for med in &input.medications {
        repository::insert_medication(&tx, id, med)?;
    }
    tx.commit().map_err(DatabaseError::from)?;

    tracing::debug!(
        prescription_id = id,
        patient_id = input.patient_id,
        medications = input.medications.len(),
        "issued prescription"
    );

    get_prescription(conn, id)
}

pub fn get_prescription(
    conn: &Connection,
    id: i64,
) -> Result<PrescriptionWithMedications, PrescriptionError> {
    let prescription =
        repository::get_prescription(conn, id)?.ok_or(PrescriptionError::NotFound(id))?;
    with_medications(conn, prescription)
}

pub fn list_prescriptions_by_patient(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<PrescriptionWithMedications>, PrescriptionError> {
    repository::list_prescriptions_by_patient(conn, patient_id)?
        .into_iter()
        .map(|p| with_medications(conn, p))
        .collect()
}

fn with_medications(
    conn: &Connection,
    prescription: Prescription,
) -> Result<PrescriptionWithMedications, PrescriptionError> {
    let medications = repository::list_medications_for_prescription(conn, prescription.id)?;
    Ok(PrescriptionWithMedications {
        prescription,
        medications,
    })
}
