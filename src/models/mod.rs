mod api_key;
mod audit_log;
mod membership;
mod organization;
mod user;

pub use api_key::*;
pub use audit_log::*;
pub use membership::*;
pub use organization::*;
pub use user::*;
