// Tenant routes. Every handler receives the validated `RequestScope` from
// `validate_organization_middleware`.

pub mod content;
pub mod donations;
pub mod donors;
pub mod export;
pub mod find;
pub mod import;
pub mod pledges;
pub mod utils;
pub mod yahrzeits;
