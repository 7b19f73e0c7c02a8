pub mod donation;
pub mod donor;
pub mod enums;
pub mod organization;
pub mod pledge;
pub mod setting;
pub mod user_role;
pub mod yahrzeit;

use thiserror::Error;

pub use donation::{Donation, DonationInput};
pub use donor::{normalize_email, normalize_phone, Donor, DonorInput};
pub use enums::*;
pub use organization::{Organization, OrganizationInput};
pub use pledge::{Pledge, PledgeInput};
pub use setting::Setting;
pub use user_role::{UserRole, UserRoleInput};
pub use yahrzeit::{Yahrzeit, YahrzeitInput};

/// Field-level validation failure on a create/update payload
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InputError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

impl InputError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        InputError::Invalid { field, message: message.into() }
    }

    pub fn field(&self) -> &'static str {
        match self {
            InputError::MissingField(f) => f,
            InputError::Invalid { field, .. } => field,
        }
    }
}
