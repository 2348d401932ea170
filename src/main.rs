use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use dotenv::dotenv;
use std::net::TcpListener;
use std::sync::Arc;

use chatdesk_server::clients::GeminiClient;
use chatdesk_server::config::AppSettings;
use chatdesk_server::db::{
    create_pool, verify_connection, ActivityLogRepository, AnalyticsMetricRepository,
    PlatformConnectionRepository, PlatformMessageRepository, SubscriptionRepository, UserRepository,
};
use chatdesk_server::handlers::health::health_check;
use chatdesk_server::middleware::bearer_auth;
use chatdesk_server::routes::configure_routes;
use chatdesk_server::services::auth::JwtVerifier;
use chatdesk_server::services::{
    ActivityService, ClassificationService, EntitlementService, MetricsService, PlatformService,
    ProvisioningService,
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let app_settings = AppSettings::from_env().context("Failed to load application settings")?;
    log::info!(
        "Starting {} ({} environment)",
        app_settings.app.name,
        app_settings.app.environment
    );

    let db_pool = create_pool(&app_settings.database)
        .await
        .context("Failed to create database connection pool")?;
    verify_connection(&db_pool)
        .await
        .context("Database connection verification failed")?;

    let jwt_verifier = web::Data::new(JwtVerifier::from_config(&app_settings.auth).context("Invalid auth settings")?);
    let gemini = Arc::new(GeminiClient::new(&app_settings.gemini).context("Invalid generative language settings")?);
    log::info!("Message classification using model {}", gemini.model());

    // Stores
    let subscriptions = Arc::new(SubscriptionRepository::new(db_pool.clone()));
    let metric_store = Arc::new(AnalyticsMetricRepository::new(db_pool.clone()));
    let message_store = Arc::new(PlatformMessageRepository::new(db_pool.clone()));
    let connection_store = Arc::new(PlatformConnectionRepository::new(db_pool.clone()));

    // Services
    let entitlement_service = Arc::new(EntitlementService::new(subscriptions));
    let platform_service = Arc::new(PlatformService::new(
        entitlement_service.clone(),
        connection_store,
        message_store.clone(),
    ));
    let activity_service = Arc::new(ActivityService::new(
        Arc::new(ActivityLogRepository::new(db_pool.clone())),
        app_settings.server.trust_proxy_headers,
    ));
    let metrics_service = Arc::new(MetricsService::new(metric_store.clone()));
    let classification_service = Arc::new(ClassificationService::new(gemini, metric_store, message_store));
    let provisioning_service = Arc::new(ProvisioningService::new(
        Arc::new(UserRepository::new(db_pool.clone())),
        app_settings.provisioning.enabled,
    ));
    if app_settings.provisioning.enabled {
        log::warn!("Test user provisioning is enabled");
    }

    let host = app_settings.server.host.clone();
    let port = app_settings.server.port;
    let listener = TcpListener::bind((host.as_str(), port))
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;
    log::info!("Starting server at http://{}:{}", host, port);

    let settings = web::Data::new(app_settings);

    HttpServer::new(move || {
        let mut cors = Cors::default().allow_any_method().allow_any_header().max_age(3600);
        if settings.allows_any_origin() {
            cors = cors.allow_any_origin();
        } else {
            for origin in &settings.server.cors_origins {
                cors = cors.allowed_origin(origin);
            }
        }

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(settings.clone())
            .app_data(jwt_verifier.clone())
            .app_data(web::Data::new(entitlement_service.clone()))
            .app_data(web::Data::new(platform_service.clone()))
            .app_data(web::Data::new(activity_service.clone()))
            .app_data(web::Data::new(metrics_service.clone()))
            .app_data(web::Data::new(classification_service.clone()))
            .app_data(web::Data::new(provisioning_service.clone()))
            // Public
            .route("/health", web::get().to(health_check))
            // Authenticated API
            .service(web::scope("/api").wrap(bearer_auth()).configure(configure_routes))
    })
    .listen(listener)?
    .run()
    .await?;

    Ok(())
}
