pub mod response;
pub mod validate_organization;

pub use response::{ApiResponse, ApiResult, CsvFile};
pub use validate_organization::{
    optional_organization_middleware, validate_organization_middleware, RequestScope, ORGANIZATION_HEADER,
};
