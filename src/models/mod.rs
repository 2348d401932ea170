pub mod activity;
pub mod auth_jwt_claims;
pub mod authenticated_user;
pub mod metric;
pub mod platform;
pub mod user;

pub use activity::ActivityLog;
pub use auth_jwt_claims::Claims;
pub use authenticated_user::AuthenticatedUser;
pub use metric::{MetricSummary, NewMetric};
pub use platform::{PlatformConnection, PlatformMessage};
pub use user::User;
