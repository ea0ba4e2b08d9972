//! Invoice issuance: server-side totals and sequential numbering.
//!
//! Amounts are computed here and never taken from the caller:
//! `line_amount = quantity × unit_price` and `vat_amount = line_amount ×
//! vat_rate`, each rounded to 2 decimal places before summing into the
//! header totals. Numbers come from a singleton counter bumped inside
//! the insert transaction, formatted `INV-YYYYMMDD-NNNN`.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Connection;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::db::repository::{self, InvoiceDraft, LineItemDraft};
use crate::db::DatabaseError;
use crate::models::{Invoice, InvoiceWithLineItems, NewInvoice};

const CURRENCY_DP: u32 = 2;
const VAT_RATE_DP: u32 = 4;

#[derive(Error, Debug)]
pub enum InvoiceError {
    #[error("Invoice with id {0} not found")]
    NotFound(i64),

    #[error("{0}")]
    Validation(String),

    #[error("Invoice number already taken")]
    NumberTaken,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

pub fn format_invoice_number(date: NaiveDate, sequence: i64) -> String {
    format!("INV-{}-{:04}", date.format("%Y%m%d"), sequence)
}

fn validate(input: &NewInvoice) -> Result<(), InvoiceError> {
    let require = |field: &str, value: &str| -> Result<(), InvoiceError> {
        if value.trim().is_empty() {
            return Err(InvoiceError::Validation(format!(
                "{field} must not be empty"
            )));
        }
        Ok(())
    };

    require("invoice_code", &input.invoice_code)?;
    require("seller_clinic_name", &input.seller_clinic_name)?;
    require("seller_tax_id", &input.seller_tax_id)?;
    require("seller_address", &input.seller_address)?;
    require("seller_phone", &input.seller_phone)?;
    require("payment_method", &input.payment_method)?;

    if input.line_items.is_empty() {
        return Err(InvoiceError::Validation(
            "an invoice requires at least one line item".into(),
        ));
    }
    for (i, item) in input.line_items.iter().enumerate() {
        require(&format!("line_items[{i}].description"), &item.description)?;
        if item.quantity <= Decimal::ZERO {
            return Err(InvoiceError::Validation(format!(
                "line_items[{i}].quantity must be positive"
            )));
        }
        if item.unit_price <= Decimal::ZERO {
            return Err(InvoiceError::Validation(format!(
                "line_items[{i}].unit_price must be positive"
            )));
        }
        if item.vat_rate < Decimal::ZERO || item.vat_rate > Decimal::ONE {
            return Err(InvoiceError::Validation(format!(
                "line_items[{i}].vat_rate must be between 0 and 1"
            )));
        }
    }

    Ok(())
}

struct ComputedLine {
    line_amount: Decimal,
    vat_rate: Decimal,
    vat_amount: Decimal,
}

fn compute_line(quantity: Decimal, unit_price: Decimal, vat_rate: Decimal) -> ComputedLine {
    let line_amount = (quantity * unit_price).round_dp(CURRENCY_DP);
    let vat_rate = vat_rate.round_dp(VAT_RATE_DP);
    let vat_amount = (line_amount * vat_rate).round_dp(CURRENCY_DP);
    ComputedLine {
        line_amount,
        vat_rate,
        vat_amount,
    }
}

pub fn create_invoice(
    conn: &mut Connection,
    input: &NewInvoice,
) -> Result<InvoiceWithLineItems, InvoiceError> {
    create_invoice_at(conn, input, Utc::now())
}

/// Creation with an injected issue timestamp, so the number's date part
/// is testable against a fixed day.
pub fn create_invoice_at(
    conn: &mut Connection,
    input: &NewInvoice,
    now: DateTime<Utc>,
) -> Result<InvoiceWithLineItems, InvoiceError> {
    validate(input)?;

    // A linked patient fills in buyer fields the caller left out. An
    // unresolvable patient_id is not an error; the link is advisory.
    let patient = match input.patient_id {
        Some(id) => repository::get_patient(conn, id)?,
        None => None,
    };
    let buyer_full_name = input
        .buyer_full_name
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .map(str::to_owned)
        .or_else(|| patient.as_ref().map(|p| p.full_name.clone()))
        .ok_or_else(|| {
            InvoiceError::Validation(
                "buyer_full_name is required when no patient can be resolved".into(),
            )
        })?;
    let buyer_address = input
        .buyer_address
        .clone()
        .or_else(|| patient.as_ref().map(|p| p.address.clone()));

    let computed: Vec<ComputedLine> = input
        .line_items
        .iter()
        .map(|item| compute_line(item.quantity, item.unit_price, item.vat_rate))
        .collect();
    let total_amount_before_tax: Decimal = computed.iter().map(|l| l.line_amount).sum();
    let total_vat: Decimal = computed.iter().map(|l| l.vat_amount).sum();
    let total_payable_amount = total_amount_before_tax + total_vat;

    let tx = conn.transaction().map_err(DatabaseError::from)?;
    let sequence = repository::bump_invoice_sequence(&tx)?;
    let invoice_number = format_invoice_number(now.date_naive(), sequence);

    let draft = InvoiceDraft {
        invoice_number: &invoice_number,
        invoice_code: &input.invoice_code,
        patient_id: input.patient_id,
        seller_clinic_name: &input.seller_clinic_name,
        seller_tax_id: &input.seller_tax_id,
        seller_address: &input.seller_address,
        seller_phone: &input.seller_phone,
        buyer_full_name: &buyer_full_name,
        buyer_address: buyer_address.as_deref(),
        buyer_tax_code: input.buyer_tax_code.as_deref(),
        total_amount_before_tax,
        total_vat,
        total_payable_amount,
        payment_method: &input.payment_method,
        digital_signature: input.digital_signature.as_deref(),
        qr_code: input.qr_code.as_deref(),
    };

    let invoice_id = match repository::insert_invoice(&tx, &draft, now) {
        Ok(id) => id,
        Err(e) if e.is_constraint_violation() => return Err(InvoiceError::NumberTaken),
        Err(e) => return Err(e.into()),
    };
    for (item, line) in input.line_items.iter().zip(&computed) {
        repository::insert_line_item(
            &tx,
            invoice_id,
            &LineItemDraft {
                description: &item.description,
                quantity: item.quantity,
                unit_price: item.unit_price,
                line_amount: line.line_amount,
                vat_rate: line.vat_rate,
                vat_amount: line.vat_amount,
            },
        )?;
    }
    tx.commit().map_err(DatabaseError::from)?;

    tracing::debug!(
        invoice_id,
        %invoice_number,
        %total_payable_amount,
        "issued invoice"
    );

    get_invoice(conn, invoice_id)
}

/// The number the next created invoice would receive. Purely advisory:
/// it does not reserve anything.
pub fn peek_next_invoice_number(conn: &Connection) -> Result<String, InvoiceError> {
    let sequence = repository::peek_invoice_sequence(conn)?;
    Ok(format_invoice_number(Utc::now().date_naive(), sequence))
}

pub fn get_invoice(conn: &Connection, id: i64) -> Result<InvoiceWithLineItems, InvoiceError> {
    let invoice = repository::get_invoice(conn, id)?.ok_or(InvoiceError::NotFound(id))?;
    with_line_items(conn, invoice)
}

pub fn list_invoices_by_patient(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<InvoiceWithLineItems>, InvoiceError> {
    repository::list_invoices_by_patient(conn, patient_id)?
        .into_iter()
        .map(|invoice| with_line_items(conn, invoice))
        .collect()
}

fn with_line_items(
    conn: &Connection,
    invoice: Invoice,
) -> Result<InvoiceWithLineItems, InvoiceError> {
    let line_items = repository::list_line_items_for_invoice(conn, invoice.id)?;
    Ok(InvoiceWithLineItems {
        invoice,
        line_items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::models::enums::Gender;
    use crate::models::{NewInvoiceLineItem, NewPatient};
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn line(description: &str, quantity: Decimal, unit_price: Decimal, vat_rate: Decimal) -> NewInvoiceLineItem {
        NewInvoiceLineItem {
            description: description.into(),
            quantity,
            unit_price,
            vat_rate,
        }
    }

    fn sample_invoice() -> NewInvoice {
        NewInvoice {
            invoice_code: "C-77".into(),
            patient_id: None,
            seller_clinic_name: "Elm Clinic".into(),
            seller_tax_id: "TAX-1".into(),
            seller_address: "1 Elm St".into(),
            seller_phone: "555-0100".into(),
            buyer_full_name: Some("Jane Roe".into()),
            buyer_address: None,
            buyer_tax_code: None,
            payment_method: "cash".into(),
            digital_signature: None,
            qr_code: None,
            line_items: vec![
                line("Consultation", dec!(1), dec!(100.00), dec!(0.10)),
                line("Dressing", dec!(2), dec!(25.50), dec!(0.05)),
            ],
        }
    }

    fn seeded_patient(conn: &Connection) -> i64 {
        let input = NewPatient {
            full_name: "Jane Roe".into(),
            date_of_birth: chrono::NaiveDate::from_ymd_opt(1985, 6, 2).unwrap(),
            gender: Gender::Female,
            address: "12 Elm St".into(),
            phone_number: None,
            insurance_information: None,
        };
        repository::insert_patient(conn, &input, Utc::now()).unwrap().id
    }

    #[test]
    fn totals_are_computed_from_line_items() {
        let mut conn = open_memory_database().unwrap();
        let created = create_invoice(&mut conn, &sample_invoice()).unwrap();

        // 1×100.00 + 2×25.50 = 151.00; VAT 10.00 + 2.55 = 12.55
        assert_eq!(created.invoice.total_amount_before_tax, dec!(151.00));
        assert_eq!(created.invoice.total_vat, dec!(12.55));
        assert_eq!(created.invoice.total_payable_amount, dec!(163.55));

        assert_eq!(created.line_items[0].line_amount, dec!(100.00));
        assert_eq!(created.line_items[0].vat_amount, dec!(10.00));
        assert_eq!(created.line_items[1].line_amount, dec!(51.00));
        assert_eq!(created.line_items[1].vat_amount, dec!(2.55));
    }

    #[test]
    fn rounding_happens_per_line_before_summing() {
        let mut conn = open_memory_database().unwrap();
        let mut input = sample_invoice();
        // 3 × 3.333 = 9.999 → 10.00; VAT 10.00 × 0.07 = 0.70
        input.line_items = vec![line("Odd lot", dec!(3), dec!(3.333), dec!(0.07))];

        let created = create_invoice(&mut conn, &input).unwrap();
        assert_eq!(created.invoice.total_amount_before_tax, dec!(10.00));
        assert_eq!(created.invoice.total_vat, dec!(0.70));
        assert_eq!(created.line_items[0].line_amount, dec!(10.00));
    }

    #[test]
    fn numbers_are_sequential_and_dated() {
        let mut conn = open_memory_database().unwrap();
        let day = Utc.with_ymd_and_hms(2026, 8, 25, 10, 0, 0).unwrap();

        let first = create_invoice_at(&mut conn, &sample_invoice(), day).unwrap();
        let second = create_invoice_at(&mut conn, &sample_invoice(), day).unwrap();

        assert_eq!(first.invoice.invoice_number, "INV-20260825-0001");
        assert_eq!(second.invoice.invoice_number, "INV-20260825-0002");
    }

    #[test]
    fn sequence_does_not_reset_across_days() {
        let mut conn = open_memory_database().unwrap();
        let monday = Utc.with_ymd_and_hms(2026, 8, 24, 10, 0, 0).unwrap();
        let tuesday = Utc.with_ymd_and_hms(2026, 8, 25, 10, 0, 0).unwrap();

        create_invoice_at(&mut conn, &sample_invoice(), monday).unwrap();
        let next = create_invoice_at(&mut conn, &sample_invoice(), tuesday).unwrap();
        assert_eq!(next.invoice.invoice_number, "INV-20260825-0002");
    }

    #[test]
    fn failed_validation_does_not_consume_a_number() {
        let mut conn = open_memory_database().unwrap();
        let mut bad = sample_invoice();
        bad.line_items[0].quantity = dec!(0);
        assert!(matches!(
            create_invoice(&mut conn, &bad).unwrap_err(),
            InvoiceError::Validation(_)
        ));

        let created = create_invoice(&mut conn, &sample_invoice()).unwrap();
        assert!(created.invoice.invoice_number.ends_with("-0001"));
    }

    #[test]
    fn buyer_fields_fill_from_linked_patient() {
        let mut conn = open_memory_database().unwrap();
        let patient_id = seeded_patient(&conn);

        let mut input = sample_invoice();
        input.patient_id = Some(patient_id);
        input.buyer_full_name = None;
        input.buyer_address = None;

        let created = create_invoice(&mut conn, &input).unwrap();
        assert_eq!(created.invoice.buyer_full_name, "Jane Roe");
        assert_eq!(created.invoice.buyer_address.as_deref(), Some("12 Elm St"));
    }

    #[test]
    fn explicit_buyer_fields_win_over_patient() {
        let mut conn = open_memory_database().unwrap();
        let patient_id = seeded_patient(&conn);

        let mut input = sample_invoice();
        input.patient_id = Some(patient_id);
        input.buyer_full_name = Some("ACME Insurance Ltd".into());
        input.buyer_address = Some("PO Box 9".into());

        let created = create_invoice(&mut conn, &input).unwrap();
        assert_eq!(created.invoice.buyer_full_name, "ACME Insurance Ltd");
        assert_eq!(created.invoice.buyer_address.as_deref(), Some("PO Box 9"));
    }

    #[test]
    fn unresolvable_patient_without_buyer_name_is_rejected() {
        let mut conn = open_memory_database().unwrap();
        let mut input = sample_invoice();
        input.patient_id = Some(999);
        input.buyer_full_name = None;

        let err = create_invoice(&mut conn, &input).unwrap_err();
        assert!(matches!(err, InvoiceError::Validation(_)));
    }

    #[test]
    fn unresolvable_patient_with_buyer_name_succeeds() {
        let mut conn = open_memory_database().unwrap();
        let mut input = sample_invoice();
        input.patient_id = Some(999);

        let created = create_invoice(&mut conn, &input).unwrap();
        assert_eq!(created.invoice.patient_id, Some(999));
        assert_eq!(created.invoice.buyer_full_name, "Jane Roe");
    }

    #[test]
    fn vat_rate_above_one_is_rejected() {
        let mut conn = open_memory_database().unwrap();
        let mut input = sample_invoice();
        input.line_items[0].vat_rate = dec!(1.5);
        let err = create_invoice(&mut conn, &input).unwrap_err();
        assert!(matches!(err, InvoiceError::Validation(_)));
    }

    #[test]
    fn peek_matches_next_created_number() {
        let mut conn = open_memory_database().unwrap();
        let peeked = peek_next_invoice_number(&conn).unwrap();
        let created = create_invoice(&mut conn, &sample_invoice()).unwrap();
        assert_eq!(peeked, created.invoice.invoice_number);
        // Peeking did not consume the counter
        assert!(peeked.ends_with("-0001"));
    }

    #[test]
    fn list_by_patient_includes_line_items() {
        let mut conn = open_memory_database().unwrap();
        let patient_id = seeded_patient(&conn);
        let mut input = sample_invoice();
        input.patient_id = Some(patient_id);
        create_invoice(&mut conn, &input).unwrap();
        create_invoice(&mut conn, &input).unwrap();

        let listed = list_invoices_by_patient(&conn, patient_id).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].line_items.len(), 2);
    }
}
