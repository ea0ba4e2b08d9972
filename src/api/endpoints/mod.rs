pub mod auth;
pub mod health;
pub mod invoices;
pub mod patients;
pub mod prescriptions;
