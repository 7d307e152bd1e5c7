mod auth;
mod extract;

pub use auth::{CurrentAdmin, CurrentStudent};
pub use extract::{AppJson, AppQuery};
