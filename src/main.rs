use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use laundry_api::{
    auth::{AuthConfig, AuthService},
    config, db, AppServices, AppState,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_config = config::load_config()?;
    config::init_tracing(app_config.log_level(), app_config.log_json);

    info!(
        environment = %app_config.environment,
        "Starting laundry API"
    );

    let db_pool = Arc::new(db::establish_connection_from_app_config(&app_config).await?);

    if app_config.auto_migrate {
        db::run_migrations(&db_pool).await?;
    }

    let auth_service = Arc::new(AuthService::new(
        AuthConfig::new(
            app_config.jwt_secret.clone(),
            Duration::from_secs(app_config.jwt_expiration as u64),
        ),
        db_pool.clone(),
    ));

    let services = AppServices::new(db_pool.clone(), auth_service.clone());

    let state = AppState {
        db: db_pool,
        config: app_config.clone(),
        services,
    };

    let cors = build_cors_layer(&app_config);

    let app = laundry_api::app_router(state, auth_service)
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", app_config.host, app_config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn build_cors_layer(app_config: &config::AppConfig) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let headers = [header::AUTHORIZATION, header::CONTENT_TYPE];

    if let Some(origins) = &app_config.cors_allowed_origins {
        let parsed: Vec<HeaderValue> = origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .filter_map(|o| o.parse().ok())
            .collect();

        let mut layer = CorsLayer::new()
            .allow_origin(AllowOrigin::list(parsed))
            .allow_methods(methods)
            .allow_headers(headers);
        if app_config.cors_allow_credentials {
            layer = layer.allow_credentials(true);
        }
        layer
    } else {
        // Development fallback, refused outside dev by config validation
        warn!("CORS allows any origin; configure cors_allowed_origins for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(headers)
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
