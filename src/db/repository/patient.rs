use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::repository::{parse_date, parse_timestamp};
use crate::db::DatabaseError;
use crate::models::enums::Gender;
use crate::models::{NewPatient, Patient};

const PATIENT_COLUMNS: &str = "id, full_name, date_of_birth, gender, address, phone_number,
     insurance_information, created_at, updated_at";

pub fn insert_patient(
    conn: &Connection,
    input: &NewPatient,
    now: DateTime<Utc>,
) -> Result<Patient, DatabaseError> {
    conn.execute(
        "INSERT INTO patients (full_name, date_of_birth, gender, address, phone_number,
         insurance_information, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            input.full_name,
            input.date_of_birth.to_string(),
            input.gender.as_str(),
            input.address,
            input.phone_number,
            input.insurance_information,
            now.to_rfc3339(),
            now.to_rfc3339(),
        ],
    )?;

    let id = conn.last_insert_rowid();
    get_patient(conn, id)?.ok_or(DatabaseError::NotFound {
        entity_type: "patient".into(),
        id: id.to_string(),
    })
}

pub fn get_patient(conn: &Connection, id: i64) -> Result<Option<Patient>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1"),
            params![id],
            patient_row,
        )
        .optional()?;

    row.map(patient_from_row).transpose()
}

pub fn list_patients(conn: &Connection) -> Result<Vec<Patient>, DatabaseError> {
    let mut stmt =
        conn.prepare(&format!("SELECT {PATIENT_COLUMNS} FROM patients ORDER BY id"))?;

    let rows = stmt.query_map([], |row| Ok(patient_row(row)))?;

    let mut patients = Vec::new();
    for row in rows {
        patients.push(patient_from_row(row??)?);
    }
    Ok(patients)
}

/// Write back a fully merged patient row. The merge itself (absent vs
/// null vs value) happens in the business module; this always rewrites
/// every updatable column plus updated_at.
pub fn update_patient(
    conn: &Connection,
    patient: &Patient,
    now: DateTime<Utc>,
) -> Result<Patient, DatabaseError> {
    let changed = conn.execute(
        "UPDATE patients SET full_name = ?1, date_of_birth = ?2, gender = ?3, address = ?4,
         phone_number = ?5, insurance_information = ?6, updated_at = ?7
         WHERE id = ?8",
        params![
            patient.full_name,
            patient.date_of_birth.to_string(),
            patient.gender.as_str(),
            patient.address,
            patient.phone_number,
            patient.insurance_information,
            now.to_rfc3339(),
            patient.id,
        ],
    )?;

    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "patient".into(),
            id: patient.id.to_string(),
        });
    }

    get_patient(conn, patient.id)?.ok_or(DatabaseError::NotFound {
        entity_type: "patient".into(),
        id: patient.id.to_string(),
    })
}

// Internal row type for Patient mapping
struct PatientRow {
    id: i64,
    full_name: String,
    date_of_birth: String,
    gender: String,
    address: String,
    phone_number: Option<String>,
    insurance_information: Option<String>,
    created_at: String,
    updated_at: String,
}

fn patient_row(row: &rusqlite::Row<'_>) -> Result<PatientRow, rusqlite::Error> {
    Ok(PatientRow {
        id: row.get(0)?,
        full_name: row.get(1)?,
        date_of_birth: row.get(2)?,
        gender: row.get(3)?,
        address: row.get(4)?,
        phone_number: row.get(5)?,
        insurance_information: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn patient_from_row(row: PatientRow) -> Result<Patient, DatabaseError> {
    Ok(Patient {
        id: row.id,
        full_name: row.full_name,
        date_of_birth: parse_date(&row.date_of_birth)?,
        gender: Gender::from_str(&row.gender)?,
        address: row.address,
        phone_number: row.phone_number,
        insurance_information: row.insurance_information,
        created_at: parse_timestamp(&row.created_at)?,
        updated_at: parse_timestamp(&row.updated_at)?,
    })
}
