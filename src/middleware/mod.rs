pub mod bearer_auth;

pub use bearer_auth::{bearer_auth, bearer_validator};
