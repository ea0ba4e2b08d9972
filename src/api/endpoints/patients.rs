//! Patient endpoints.
//!
//! - `POST /api/patients` — register a patient
//! - `GET /api/patients` — list all
//! - `GET /api/patients/:id` — fetch one
//! - `PATCH /api/patients/:id` — partial update

use axum::extract::{Path, State};
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::{NewPatient, Patient, PatientUpdate};
use crate::patients;

pub async fn create(
    State(ctx): State<ApiContext>,
    Json(input): Json<NewPatient>,
) -> Result<Json<Patient>, ApiError> {
    let conn = ctx.db()?;
    let patient = patients::create_patient(&conn, &input)?;
    Ok(Json(patient))
}

pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<Patient>>, ApiError> {
    let conn = ctx.db()?;
    let all = patients::list_patients(&conn)?;
    Ok(Json(all))
}

pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
) -> Result<Json<Patient>, ApiError> {
    let conn = ctx.db()?;
    let patient = patients::get_patient(&conn, id)?;
    Ok(Json(patient))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
    Json(input): Json<PatientUpdate>,
) -> Result<Json<Patient>, ApiError> {
    let conn = ctx.db()?;
    let patient = patients::update_patient(&conn, id, &input)?;
    Ok(Json(patient))
}
