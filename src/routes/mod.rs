use actix_web::web;

use crate::handlers::{
    activity_handlers, classification_handlers, entitlement_handlers, export_handlers, metrics_handlers,
    platform_handlers, provisioning_handlers,
};

// Protected API routes, mounted under /api behind bearer auth
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    // Plans and entitlements
    cfg.route("/entitlements", web::get().to(entitlement_handlers::get_entitlements))
        .route("/entitlements/access", web::get().to(entitlement_handlers::check_access))
        .route("/plans", web::get().to(entitlement_handlers::list_plans));

    // Platform data
    cfg.route("/connections", web::get().to(platform_handlers::list_connections))
        .route("/connections", web::post().to(platform_handlers::create_connection))
        .route("/messages", web::get().to(platform_handlers::list_messages))
        .route("/usage", web::get().to(platform_handlers::get_usage));

    cfg.route("/activity", web::post().to(activity_handlers::log_activity))
        .route("/activity", web::get().to(activity_handlers::list_activity));

    cfg.route("/metrics", web::post().to(metrics_handlers::ingest_metrics))
        .route("/metrics/summary", web::get().to(metrics_handlers::metrics_summary));

    cfg.route(
        "/messages/classify",
        web::post().to(classification_handlers::classify_message),
    );

    cfg.route("/export", web::post().to(export_handlers::export_rows))
        .route("/export/messages", web::get().to(export_handlers::export_messages));

    cfg.service(
        web::scope("/admin").route("/test-users", web::post().to(provisioning_handlers::create_test_user)),
    );
}
