//! Router assembly and startup/shutdown lifecycle.

use std::path::{Path, PathBuf};

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::middleware::from_fn_with_state;
use axum::{routing::get, Router};
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Settings;
use crate::db;
use crate::middleware::{rate_limit::rate_limit_middleware, security_headers::security_headers_middleware};
use crate::openapi::ApiDoc;
use crate::routes;
use crate::state::AppState;

pub const APP_TITLE: &str = "EukExpress API";
pub const APP_DESCRIPTION: &str = "Logistics Management Platform";
pub const APP_VERSION: &str = "1.0.0";
pub const DOCS_PATH: &str = "/docs";
pub const OPENAPI_PATH: &str = "/openapi.json";
pub const API_PREFIX: &str = "/api/v1";
pub const UPLOAD_SUBDIRS: [&str; 2] = ["shipments", "invoices"];

pub const LISTEN_HOST: &str = "0.0.0.0";
pub const LISTEN_PORT: u16 = 8000;

const BANNER_RULE: &str = "==================================================";

/// Cross-origin policy for the configured origin list.
///
/// Credentials are allowed, so methods and headers are mirrored from the
/// preflight instead of using `*`, and a literal `*` origin is dropped.
pub fn cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<HeaderValue> = settings
        .cors_origins_list()
        .into_iter()
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| {
            if origin == "*" {
                warn!("Ignoring wildcard CORS origin; credentials are enabled");
                return None;
            }
            match HeaderValue::from_str(&origin) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(%origin, "Ignoring invalid CORS origin: {}", e);
                    None
                }
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

/// Creates the upload root, the QR-code root and the fixed upload
/// subdirectories. Returns the directories in creation order.
pub fn ensure_upload_dirs(settings: &Settings) -> std::io::Result<Vec<PathBuf>> {
    let mut dirs = vec![settings.upload_path.clone(), settings.qr_code_path.clone()];
    dirs.extend(UPLOAD_SUBDIRS.iter().map(|sub| settings.upload_path.join(sub)));
    for dir in &dirs {
        std::fs::create_dir_all(dir)?;
    }
    Ok(dirs)
}

fn static_dir(path: &Path) -> ServeDir {
    ServeDir::new(path).append_index_html_on_directories(false)
}

/// Builds the complete application router.
///
/// Layer order, outermost first: CORS, security headers, tracing, body limit.
/// Rate limiting applies to `/api/v1` only.
pub fn build_router(state: AppState) -> Router {
    let settings = state.settings.clone();
    let body_limit = usize::try_from(settings.max_upload_size).unwrap_or(usize::MAX);

    let api = routes::api_router()
        .route_layer(from_fn_with_state(state.rate_limiter.clone(), rate_limit_middleware));

    Router::new()
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health))
        .route("/readyz", get(routes::health::readyz))
        .nest(API_PREFIX, api)
        .merge(SwaggerUi::new(DOCS_PATH).url(OPENAPI_PATH, ApiDoc::openapi()))
        .nest_service("/uploads", static_dir(&settings.upload_path))
        .nest_service("/qr", static_dir(&settings.qr_code_path))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(from_fn_with_state(settings.clone(), security_headers_middleware))
        .layer(cors_layer(&settings))
}

/// Outcome of the startup sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartupReport {
    pub schema_ready: bool,
    pub admin_created: bool,
}

/// Runs the startup hooks: banner, schema creation and admin seeding.
///
/// Database failures are logged with their kind and leave the service in
/// degraded mode; they never abort startup.
pub async fn startup(state: &AppState) -> StartupReport {
    info!("{}", BANNER_RULE);
    info!("{} {} starting ({})", APP_TITLE, APP_VERSION, state.settings.app_env);
    info!("{}", BANNER_RULE);

    let mut report = StartupReport { schema_ready: false, admin_created: false };
    match db::create_schema(&state.db).await {
        Ok(()) => {
            report.schema_ready = true;
            info!("Database schema ready");
        }
        Err(e) => {
            error!(kind = e.kind(), "Database schema creation failed, continuing degraded: {}", e);
        }
    }

    if report.schema_ready {
        match db::seed_admin(&state.db, &state.settings).await {
            Ok(true) => {
                report.admin_created = true;
                info!(username = %state.settings.admin_username, "Created bootstrap admin account");
            }
            Ok(false) => {}
            Err(e) => error!("Failed to seed admin account: {}", e),
        }
    }

    info!("{}", BANNER_RULE);
    report
}

/// Shutdown hook; runs after the server has stopped accepting requests.
pub fn shutdown() {
    info!("{}", BANNER_RULE);
    info!("{} shutdown", APP_TITLE);
    info!("{}", BANNER_RULE);
}
