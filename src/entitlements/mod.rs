//! Plan and entitlement evaluation.
//!
//! Everything in this module is pure: a subscription row goes in, access
//! decisions come out. Fetching the row is the job of
//! [`crate::services::entitlement_service`].

pub mod evaluator;
pub mod limits;
pub mod tier;

pub use evaluator::{evaluate, has_access, Entitlement, Feature, SubscriptionSnapshot, SubscriptionStatus};
pub use limits::{is_known_platform, PlanLimits, KNOWN_PLATFORMS};
pub use tier::PlanTier;
