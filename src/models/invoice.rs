use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Invoice header. Totals are always server-computed from the line items
/// and stored as fixed-point decimals (2 dp); client-supplied totals are
/// never trusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: i64,
    /// System-generated, unique, `INV-YYYYMMDD-NNNN`.
    pub invoice_number: String,
    /// Caller-supplied code, not validated for uniqueness.
    pub invoice_code: String,
    pub invoice_issue_date: DateTime<Utc>,
    pub patient_id: Option<i64>,
    pub seller_clinic_name: String,
    pub seller_tax_id: String,
    pub seller_address: String,
    pub seller_phone: String,
    pub buyer_full_name: String,
    pub buyer_address: Option<String>,
    pub buyer_tax_code: Option<String>,
    pub total_amount_before_tax: Decimal,
    pub total_vat: Decimal,
    pub total_payable_amount: Decimal,
    pub payment_method: String,
    pub digital_signature: Option<String>,
    pub qr_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceLineItem {
    pub id: i64,
    pub invoice_id: i64,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// quantity × unit_price, 2 dp
    pub line_amount: Decimal,
    /// Fraction 0–1, 4 dp
    pub vat_rate: Decimal,
    /// line_amount × vat_rate, 2 dp
    pub vat_amount: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewInvoiceLineItem {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub vat_rate: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewInvoice {
    pub invoice_code: String,
    #[serde(default)]
    pub patient_id: Option<i64>,
    pub seller_clinic_name: String,
    pub seller_tax_id: String,
    pub seller_address: String,
    pub seller_phone: String,
    /// Auto-filled from the linked patient when absent.
    #[serde(default)]
    pub buyer_full_name: Option<String>,
    #[serde(default)]
    pub buyer_address: Option<String>,
    #[serde(default)]
    pub buyer_tax_code: Option<String>,
    pub payment_method: String,
    #[serde(default)]
    pub digital_signature: Option<String>,
    #[serde(default)]
    pub qr_code: Option<String>,
    pub line_items: Vec<NewInvoiceLineItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceWithLineItems {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub line_items: Vec<InvoiceLineItem>,
}
