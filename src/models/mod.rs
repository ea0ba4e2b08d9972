pub mod enums;
pub mod invoice;
pub mod patch;
pub mod patient;
pub mod prescription;
pub mod user;

pub use invoice::*;
pub use patch::Patch;
pub use patient::*;
pub use prescription::*;
pub use user::*;
