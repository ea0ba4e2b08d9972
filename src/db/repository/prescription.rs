use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::repository::{parse_date, parse_timestamp};
use crate::db::DatabaseError;
use crate::models::enums::Gender;
use crate::models::{Medication, NewMedication, PatientSnapshot, Prescription};

const PRESCRIPTION_COLUMNS: &str = "id, patient_id, patient_full_name, patient_date_of_birth,
     patient_age, gender, address, diagnosis, icd_10_code, doctor_name, doctor_qualification,
     clinic_name, clinic_code, date_of_issue, digital_signature, additional_notes,
     created_at, updated_at";

/// Fields of a prescription header as computed by the business layer,
/// before it has an id.
pub struct PrescriptionDraft<'a> {
    pub patient_id: i64,
    pub snapshot: &'a PatientSnapshot,
    pub diagnosis: &'a str,
    pub icd_10_code: Option<&'a str>,
    pub doctor_name: &'a str,
    pub doctor_qualification: &'a str,
    pub clinic_name: &'a str,
    pub clinic_code: &'a str,
    pub digital_signature: Option<&'a str>,
    pub additional_notes: Option<&'a str>,
}

pub fn insert_prescription(
    conn: &Connection,
    draft: &PrescriptionDraft<'_>,
    now: DateTime<Utc>,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO prescriptions (patient_id, patient_full_name, patient_date_of_birth,
         patient_age, gender, address, diagnosis, icd_10_code, doctor_name,
         doctor_qualification, clinic_name, clinic_code, date_of_issue, digital_signature,
         additional_notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        params![
            draft.patient_id,
            draft.snapshot.patient_full_name,
            draft.snapshot.patient_date_of_birth.to_string(),
            draft.snapshot.patient_age,
            draft.snapshot.gender.as_str(),
            draft.snapshot.address,
            draft.diagnosis,
            draft.icd_10_code,
            draft.doctor_name,
            draft.doctor_qualification,
            draft.clinic_name,
            draft.clinic_code,
            now.to_rfc3339(),
            draft.digital_signature,
            draft.additional_notes,
            now.to_rfc3339(),
            now.to_rfc3339(),
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

pub fn insert_medication(
    conn: &Connection,
    prescription_id: i64,
    med: &NewMedication,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO medications (prescription_id, medicine_name, strength, dosage_form,
         dosage, frequency, duration, quantity, instruction)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            prescription_id,
            med.medicine_name,
            med.strength,
            med.dosage_form,
            med.dosage,
            med.frequency,
            med.duration,
            med.quantity,
            med.instruction,
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

pub fn get_prescription(
    conn: &Connection,
    id: i64,
) -> Result<Option<Prescription>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {PRESCRIPTION_COLUMNS} FROM prescriptions WHERE id = ?1"),
            params![id],
            prescription_row,
        )
        .optional()?;

    row.map(prescription_from_row).transpose()
}

pub fn list_prescriptions_by_patient(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<Prescription>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PRESCRIPTION_COLUMNS} FROM prescriptions WHERE patient_id = ?1 ORDER BY id"
    ))?;

    let rows = stmt.query_map(params![patient_id], |row| Ok(prescription_row(row)))?;

    let mut prescriptions = Vec::new();
    for row in rows {
        prescriptions.push(prescription_from_row(row??)?);
    }
    Ok(prescriptions)
}

/// Medications for one prescription, in insertion order.
pub fn list_medications_for_prescription(
    conn: &Connection,
    prescription_id: i64,
) -> Result<Vec<Medication>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, prescription_id, medicine_name, strength, dosage_form, dosage,
         frequency, duration, quantity, instruction
         FROM medications WHERE prescription_id = ?1 ORDER BY id",
    )?;

    let rows = stmt.query_map(params![prescription_id], |row| {
        Ok(Medication {
            id: row.get(0)?,
            prescription_id: row.get(1)?,
            medicine_name: row.get(2)?,
            strength: row.get(3)?,
            dosage_form: row.get(4)?,
            dosage: row.get(5)?,
            frequency: row.get(6)?,
            duration: row.get(7)?,
            quantity: row.get(8)?,
            instruction: row.get(9)?,
        })
    })?;

    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

// Internal row type for Prescription mapping
struct PrescriptionRow {
    id: i64,
    patient_id: i64,
    patient_full_name: String,
    patient_date_of_birth: String,
    patient_age: i32,
    gender: String,
    address: String,
    diagnosis: String,
    icd_10_code: Option<String>,
    doctor_name: String,
    doctor_qualification: String,
    clinic_name: String,
    clinic_code: String,
    date_of_issue: String,
    digital_signature: Option<String>,
    additional_notes: Option<String>,
    created_at: String,
    updated_at: String,
}

fn prescription_row(row: &rusqlite::Row<'_>) -> Result<PrescriptionRow, rusqlite::Error> {
    Ok(PrescriptionRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        patient_full_name: row.get(2)?,
        patient_date_of_birth: row.get(3)?,
        patient_age: row.get(4)?,
        gender: row.get(5)?,
        address: row.get(6)?,
        diagnosis: row.get(7)?,
        icd_10_code: row.get(8)?,
        doctor_name: row.get(9)?,
        doctor_qualification: row.get(10)?,
        clinic_name: row.get(11)?,
        clinic_code: row.get(12)?,
        date_of_issue: row.get(13)?,
        digital_signature: row.get(14)?,
        additional_notes: row.get(15)?,
        created_at: row.get(16)?,
        updated_at: row.get(17)?,
    })
}

fn prescription_from_row(row: PrescriptionRow) -> Result<Prescription, DatabaseError> {
    Ok(Prescription {
        id: row.id,
        patient_id: row.patient_id,
        patient: PatientSnapshot {
            patient_full_name: row.patient_full_name,
            patient_date_of_birth: parse_date(&row.patient_date_of_birth)?,
            patient_age: row.patient_age,
            gender: Gender::from_str(&row.gender)?,
            address: row.address,
        },
        diagnosis: row.diagnosis,
        icd_10_code: row.icd_10_code,
        doctor_name: row.doctor_name,
        doctor_qualification: row.doctor_qualification,
        clinic_name: row.clinic_name,
        clinic_code: row.clinic_code,
        date_of_issue: parse_timestamp(&row.date_of_issue)?,
        digital_signature: row.digital_signature,
        additional_notes: row.additional_notes,
        created_at: parse_timestamp(&row.created_at)?,
        updated_at: parse_timestamp(&row.updated_at)?,
    })
}
