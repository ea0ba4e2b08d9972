//! Invoice endpoints.
//!
//! - `POST /api/invoices` — issue an invoice
//! - `GET /api/invoices/:id` — fetch one with line items
//! - `GET /api/invoices/number/next` — preview the next number
//! - `GET /api/patients/:id/invoices` — list for a patient

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::invoices;
use crate::models::{InvoiceWithLineItems, NewInvoice};

pub async fn create(
    State(ctx): State<ApiContext>,
    Json(input): Json<NewInvoice>,
) -> Result<Json<InvoiceWithLineItems>, ApiError> {
    let mut conn = ctx.db()?;
    let created = invoices::create_invoice(&mut conn, &input)?;
    Ok(Json(created))
}

pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
) -> Result<Json<InvoiceWithLineItems>, ApiError> {
    let conn = ctx.db()?;
    let invoice = invoices::get_invoice(&conn, id)?;
    Ok(Json(invoice))
}

#[derive(Serialize)]
pub struct NextNumberResponse {
    pub invoice_number: String,
}

/// Advisory preview; nothing is reserved.
pub async fn next_number(
    State(ctx): State<ApiContext>,
) -> Result<Json<NextNumberResponse>, ApiError> {
    let conn = ctx.db()?;
    let invoice_number = invoices::peek_next_invoice_number(&conn)?;
    Ok(Json(NextNumberResponse { invoice_number }))
}

pub async fn list_for_patient(
    State(ctx): State<ApiContext>,
    Path(patient_id): Path<i64>,
) -> Result<Json<Vec<InvoiceWithLineItems>>, ApiError> {
    let conn = ctx.db()?;
    let listed = invoices::list_invoices_by_patient(&conn, patient_id)?;
    Ok(Json(listed))
}
