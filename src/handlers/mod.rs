pub mod activity_handlers;
pub mod classification_handlers;
pub mod entitlement_handlers;
pub mod export_handlers;
pub mod health;
pub mod metrics_handlers;
pub mod platform_handlers;
pub mod provisioning_handlers;

#[cfg(test)]
pub mod testing;
