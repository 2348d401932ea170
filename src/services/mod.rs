pub mod activity_service;
pub mod auth;
pub mod classification_service;
pub mod entitlement_service;
pub mod export;
pub mod metrics_service;
pub mod platform_service;
pub mod provisioning_service;

#[cfg(test)]
pub mod test_support;

pub use activity_service::ActivityService;
pub use classification_service::ClassificationService;
pub use entitlement_service::EntitlementService;
pub use metrics_service::MetricsService;
pub use platform_service::PlatformService;
pub use provisioning_service::ProvisioningService;
