use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

use crate::db::repository::parse_timestamp;
use crate::db::DatabaseError;
use crate::models::{Invoice, InvoiceLineItem};

const INVOICE_COLUMNS: &str = "id, invoice_number, invoice_code, invoice_issue_date, patient_id,
     seller_clinic_name, seller_tax_id, seller_address, seller_phone, buyer_full_name,
     buyer_address, buyer_tax_code, total_amount_before_tax, total_vat, total_payable_amount,
     payment_method, digital_signature, qr_code, created_at, updated_at";

/// Invoice header as computed by the business layer (number assigned,
/// totals already derived), before it has an id.
pub struct InvoiceDraft<'a> {
    pub invoice_number: &'a str,
    pub invoice_code: &'a str,
    pub patient_id: Option<i64>,
    pub seller_clinic_name: &'a str,
    pub seller_tax_id: &'a str,
    pub seller_address: &'a str,
    pub seller_phone: &'a str,
    pub buyer_full_name: &'a str,
    pub buyer_address: Option<&'a str>,
    pub buyer_tax_code: Option<&'a str>,
    pub total_amount_before_tax: Decimal,
    pub total_vat: Decimal,
    pub total_payable_amount: Decimal,
    pub payment_method: &'a str,
    pub digital_signature: Option<&'a str>,
    pub qr_code: Option<&'a str>,
}

/// A computed line item ready for insertion.
pub struct LineItemDraft<'a> {
    pub description: &'a str,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub line_amount: Decimal,
    pub vat_rate: Decimal,
    pub vat_amount: Decimal,
}

/// Bump the singleton invoice counter and return the new value.
/// Called inside the invoice insert transaction so two concurrent
/// creations can never observe the same value.
pub fn bump_invoice_sequence(conn: &Connection) -> Result<i64, DatabaseError> {
    conn.execute("UPDATE invoice_sequence SET value = value + 1 WHERE id = 1", [])?;
    let value = conn.query_row(
        "SELECT value FROM invoice_sequence WHERE id = 1",
        [],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(value)
}

/// Read the value the counter would produce next, without consuming it.
pub fn peek_invoice_sequence(conn: &Connection) -> Result<i64, DatabaseError> {
    let value = conn.query_row(
        "SELECT value + 1 FROM invoice_sequence WHERE id = 1",
        [],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(value)
}

pub fn insert_invoice(
    conn: &Connection,
    draft: &InvoiceDraft<'_>,
    now: DateTime<Utc>,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO invoices (invoice_number, invoice_code, invoice_issue_date, patient_id,
         seller_clinic_name, seller_tax_id, seller_address, seller_phone, buyer_full_name,
         buyer_address, buyer_tax_code, total_amount_before_tax, total_vat,
         total_payable_amount, payment_method, digital_signature, qr_code, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
        params![
            draft.invoice_number,
            draft.invoice_code,
            now.to_rfc3339(),
            draft.patient_id,
            draft.seller_clinic_name,
            draft.seller_tax_id,
            draft.seller_address,
            draft.seller_phone,
            draft.buyer_full_name,
            draft.buyer_address,
            draft.buyer_tax_code,
            draft.total_amount_before_tax.to_string(),
            draft.total_vat.to_string(),
            draft.total_payable_amount.to_string(),
            draft.payment_method,
            draft.digital_signature,
            draft.qr_code,
            now.to_rfc3339(),
            now.to_rfc3339(),
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

pub fn insert_line_item(
    conn: &Connection,
    invoice_id: i64,
    item: &LineItemDraft<'_>,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO invoice_line_items (invoice_id, description, quantity, unit_price,
         line_amount, vat_rate, vat_amount)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            invoice_id,
            item.description,
            item.quantity.to_string(),
            item.unit_price.to_string(),
            item.line_amount.to_string(),
            item.vat_rate.to_string(),
            item.vat_amount.to_string(),
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

pub fn get_invoice(conn: &Connection, id: i64) -> Result<Option<Invoice>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = ?1"),
            params![id],
            invoice_row,
        )
        .optional()?;

    row.map(invoice_from_row).transpose()
}

pub fn list_invoices_by_patient(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<Invoice>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {INVOICE_COLUMNS} FROM invoices WHERE patient_id = ?1 ORDER BY id"
    ))?;

    let rows = stmt.query_map(params![patient_id], |row| Ok(invoice_row(row)))?;

    let mut invoices = Vec::new();
    for row in rows {
        invoices.push(invoice_from_row(row??)?);
    }
    Ok(invoices)
}

/// Line items for one invoice, in insertion order.
pub fn list_line_items_for_invoice(
    conn: &Connection,
    invoice_id: i64,
) -> Result<Vec<InvoiceLineItem>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, invoice_id, description, quantity, unit_price, line_amount, vat_rate,
         vat_amount
         FROM invoice_line_items WHERE invoice_id = ?1 ORDER BY id",
    )?;

    let rows = stmt.query_map(params![invoice_id], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, String>(6)?,
            row.get::<_, String>(7)?,
        ))
    })?;

    let mut items = Vec::new();
    for row in rows {
        let (id, invoice_id, description, quantity, unit_price, line_amount, vat_rate, vat_amount) =
            row?;
        items.push(InvoiceLineItem {
            id,
            invoice_id,
            description,
            quantity: parse_decimal(&quantity)?,
            unit_price: parse_decimal(&unit_price)?,
            line_amount: parse_decimal(&line_amount)?,
            vat_rate: parse_decimal(&vat_rate)?,
            vat_amount: parse_decimal(&vat_amount)?,
        });
    }
    Ok(items)
}

fn parse_decimal(s: &str) -> Result<Decimal, DatabaseError> {
    Decimal::from_str(s)
        .map_err(|e| DatabaseError::ConstraintViolation(format!("bad decimal {s:?}: {e}")))
}

// Internal row type for Invoice mapping
struct InvoiceRow {
    id: i64,
    invoice_number: String,
    invoice_code: String,
    invoice_issue_date: String,
    patient_id: Option<i64>,
    seller_clinic_name: String,
    seller_tax_id: String,
    seller_address: String,
    seller_phone: String,
    buyer_full_name: String,
    buyer_address: Option<String>,
    buyer_tax_code: Option<String>,
    total_amount_before_tax: String,
    total_vat: String,
    total_payable_amount: String,
    payment_method: String,
    digital_signature: Option<String>,
    qr_code: Option<String>,
    created_at: String,
    updated_at: String,
}

fn invoice_row(row: &rusqlite::Row<'_>) -> Result<InvoiceRow, rusqlite::Error> {
    Ok(InvoiceRow {
        id: row.get(0)?,
        invoice_number: row.get(1)?,
        invoice_code: row.get(2)?,
        invoice_issue_date: row.get(3)?,
        patient_id: row.get(4)?,
        seller_clinic_name: row.get(5)?,
        seller_tax_id: row.get(6)?,
        seller_address: row.get(7)?,
        seller_phone: row.get(8)?,
        buyer_full_name: row.get(9)?,
        buyer_address: row.get(10)?,
        buyer_tax_code: row.get(11)?,
        total_amount_before_tax: row.get(12)?,
        total_vat: row.get(13)?,
        total_payable_amount: row.get(14)?,
        payment_method: row.get(15)?,
        digital_signature: row.get(16)?,
        qr_code: row.get(17)?,
        created_at: row.get(18)?,
        updated_at: row.get(19)?,
    })
}

fn invoice_from_row(row: InvoiceRow) -> Result<Invoice, DatabaseError> {
    Ok(Invoice {
        id: row.id,
        invoice_number: row.invoice_number,
        invoice_code: row.invoice_code,
        invoice_issue_date: parse_timestamp(&row.invoice_issue_date)?,
        patient_id: row.patient_id,
        seller_clinic_name: row.seller_clinic_name,
        seller_tax_id: row.seller_tax_id,
        seller_address: row.seller_address,
        seller_phone: row.seller_phone,
        buyer_full_name: row.buyer_full_name,
        buyer_address: row.buyer_address,
        buyer_tax_code: row.buyer_tax_code,
        total_amount_before_tax: parse_decimal(&row.total_amount_before_tax)?,
        total_vat: parse_decimal(&row.total_vat)?,
        total_payable_amount: parse_decimal(&row.total_payable_amount)?,
        payment_method: row.payment_method,
        digital_signature: row.digital_signature,
        qr_code: row.qr_code,
        created_at: parse_timestamp(&row.created_at)?,
        updated_at: parse_timestamp(&row.updated_at)?,
    })
}
