pub mod listing_service;
pub mod payment_service;
pub mod role_service;

pub use listing_service::{Listing, ListingService};
pub use payment_service::{PaymentRequest, PaymentService};
pub use role_service::RoleService;

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::{InputError, PledgeStatus};
use crate::database::{DatabaseError, Store};
use crate::filter::FilterError;
use crate::types::OrgScope;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Pledge {id} is {status} and accepts no payments")]
    PledgeClosed { id: Uuid, status: PledgeStatus },

    #[error("Pledge {0} is completed and cannot be cancelled")]
    PledgeCompleted(Uuid),

    #[error("Payment currency {got} does not match pledge currency {expected}")]
    CurrencyMismatch { expected: String, got: String },

    #[error("Payment belongs to organization {payment}, pledge to {pledge}")]
    OrganizationMismatch { payment: Uuid, pledge: Uuid },

    #[error("Payment of {amount} exceeds the remaining balance of {balance}")]
    Overpayment { amount: Decimal, balance: Decimal },

    #[error("Donor {0} is not a donor of this organization")]
    ForeignDonor(Uuid),

    #[error("Pledge {0} has payments recorded; its currency cannot change")]
    CurrencyLocked(Uuid),

    #[error("Pledge total {total} is below the {paid} already paid")]
    TotalBelowPaid { total: Decimal, paid: Decimal },

    #[error("Organization {organization_id} has reached its capacity of {capacity} members")]
    CapacityReached { organization_id: Uuid, capacity: usize },

    #[error("User {user_id} already holds the {role} role here")]
    DuplicateRole { user_id: Uuid, role: String },

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Fails unless the donor exists inside `organization_id`
pub async fn require_donor(store: &dyn Store, organization_id: Uuid, donor_id: Option<Uuid>) -> Result<(), ServiceError> {
    let Some(donor_id) = donor_id else {
        return Ok(());
    };
    match store.get_donor(&OrgScope::Organization(organization_id), donor_id).await {
        Ok(_) => Ok(()),
        Err(DatabaseError::NotFound(_)) => Err(ServiceError::ForeignDonor(donor_id)),
        Err(e) => Err(e.into()),
    }
}
