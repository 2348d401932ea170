pub mod activity_log_repository;
pub mod analytics_metric_repository;
pub mod platform_connection_repository;
pub mod platform_message_repository;
pub mod subscription_repository;
pub mod user_repository;

pub use activity_log_repository::{ActivityLogRepository, ActivityStore, CreateActivityLogRequest};
pub use analytics_metric_repository::{AnalyticsMetricRepository, MetricStore};
pub use platform_connection_repository::{ConnectionCheck, ConnectionStore, PlatformConnectionRepository};
pub use platform_message_repository::{MessageStore, PlatformMessageRepository};
pub use subscription_repository::{SubscriptionRecord, SubscriptionRepository, SubscriptionStore};
pub use user_repository::{TestUserStore, UserRepository};
