//! Prescription endpoints.
//!
//! - `POST /api/prescriptions` — issue a prescription
//! - `GET /api/prescriptions/:id` — fetch one with medications
//! - `GET /api/patients/:id/prescriptions` — list for a patient

use axum::extract::{Path, State};
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::{NewPrescription, PrescriptionWithMedications};
use crate::prescriptions;

pub async fn create(
    State(ctx): State<ApiContext>,
    Json(input): Json<NewPrescription>,
) -> Result<Json<PrescriptionWithMedications>, ApiError> {
    let mut conn = ctx.db()?;
    let created = prescriptions::create_prescription(&mut conn, &input)?;
    Ok(Json(created))
}

pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
) -> Result<Json<PrescriptionWithMedications>, ApiError> {
    let conn = ctx.db()?;
    let prescription = prescriptions::get_prescription(&conn, id)?;
    Ok(Json(prescription))
}

pub async fn list_for_patient(
    State(ctx): State<ApiContext>,
    Path(patient_id): Path<i64>,
) -> Result<Json<Vec<PrescriptionWithMedications>>, ApiError> {
    let conn = ctx.db()?;
    let listed = prescriptions::list_prescriptions_by_patient(&conn, patient_id)?;
    Ok(Json(listed))
}
