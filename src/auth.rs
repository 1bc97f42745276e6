//! Auth-domain types: bearer credentials and the logged-in admin profile.

pub mod credential;
pub mod user;

pub use credential::*;
pub use user::*;
