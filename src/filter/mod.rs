pub mod types;
pub mod filter;
pub mod filter_where;
pub mod filter_order;
pub mod export;
pub mod totals;
pub mod error;

pub use types::*;
pub use filter::Filter;
pub use error::FilterError;
pub use export::{to_csv, Exportable};
pub use totals::{donation_totals, pledge_totals, CurrencyTotals, DonationSums, PledgeSums};

use std::str::FromStr;
use strum_macros::{Display, EnumString};

/// Entities reachable through `/api/find/:entity` and `/api/export/:entity`
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Entity {
    #[strum(to_string = "donors", serialize = "donor")]
    Donors,
    #[strum(to_string = "donations", serialize = "donation")]
    Donations,
    #[strum(to_string = "pledges", serialize = "pledge")]
    Pledges,
    #[strum(to_string = "payments", serialize = "payment")]
    Payments,
    #[strum(to_string = "yahrzeits", serialize = "yahrzeit")]
    Yahrzeits,
    #[strum(to_string = "organizations", serialize = "organization")]
    Organizations,
    #[strum(to_string = "roles", serialize = "role", serialize = "user_roles")]
    Roles,
}

impl Entity {
    pub fn parse(name: &str) -> Result<Self, FilterError> {
        Entity::from_str(name.trim()).map_err(|_| FilterError::UnknownEntity(name.to_string()))
    }
}
