pub mod health;
pub mod lookup;

pub use health::{health_check, readiness_check};
pub use lookup::{fetch_by_key, fetch_default, LookupError};
