use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::enums::Gender;

/// Point-in-time copy of the patient taken when the prescription is
/// created. A legally stable record: later patient edits never touch it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientSnapshot {
    pub patient_full_name: String,
    pub patient_date_of_birth: NaiveDate,
    pub patient_age: i32,
    pub gender: Gender,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prescription {
    pub id: i64,
    pub patient_id: i64,
    #[serde(flatten)]
    pub patient: PatientSnapshot,
    pub diagnosis: String,
    pub icd_10_code: Option<String>,
    pub doctor_name: String,
    pub doctor_qualification: String,
    pub clinic_name: String,
    pub clinic_code: String,
    pub date_of_issue: DateTime<Utc>,
    pub digital_signature: Option<String>,
    pub additional_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One prescribed drug row. Dosing fields are deliberately free text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medication {
    pub id: i64,
    pub prescription_id: i64,
    pub medicine_name: String,
    pub strength: String,
    pub dosage_form: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
    pub quantity: String,
    pub instruction: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMedication {
    pub medicine_name: String,
    pub strength: String,
    pub dosage_form: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
    pub quantity: String,
    pub instruction: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPrescription {
    pub patient_id: i64,
    pub diagnosis: String,
    #[serde(default)]
    pub icd_10_code: Option<String>,
    pub doctor_name: String,
    pub doctor_qualification: String,
    pub clinic_name: String,
    pub clinic_code: String,
    #[serde(default)]
    pub digital_signature: Option<String>,
    #[serde(default)]
    pub additional_notes: Option<String>,
    pub medications: Vec<NewMedication>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrescriptionWithMedications {
    #[serde(flatten)]
    pub prescription: Prescription,
    pub medications: Vec<Medication>,
}
