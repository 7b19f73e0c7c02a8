// Administration routes: organizations and user roles. A missing
// X-Organization-Id header means every organization.

pub mod organizations;
pub mod roles;
