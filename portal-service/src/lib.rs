pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post},
    Router,
};
use portal_core::error::AppError;
use portal_core::middleware::{
    rate_limit::ip_rate_limit_middleware, security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::PortalConfig;
use crate::services::{
    AdminService, AuthService, CatalogService, Database, OnboardingService, SessionService,
    SlidingWindowLimiter, ViewCache,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::enlist::request_access,
        handlers::enlist::check_status,
        handlers::enlist::accept_invite,
        handlers::auth::login,
        handlers::catalog::available_properties,
        handlers::admin::provision,
        handlers::admin::approve_account,
        handlers::admin::reject_account,
        handlers::admin::create_invite,
        handlers::admin::list_invites,
        handlers::admin::revoke_invite,
        handlers::admin::overview,
        handlers::admin::create_property,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::enlist::EnlistRequest,
            dtos::enlist::EnlistResponse,
            dtos::enlist::EnlistStatusRequest,
            dtos::enlist::EnlistStatusResponse,
            dtos::auth::LoginRequest,
            dtos::auth::LoginResponse,
            dtos::admin::ProvisionRequest,
            dtos::admin::ProvisionResponse,
            dtos::admin::IssuedCredentials,
            dtos::admin::CreateInviteRequest,
            dtos::admin::CreateInviteResponse,
            dtos::admin::AcceptInviteRequest,
            dtos::admin::CreatePropertyRequest,
            dtos::admin::OverviewResponse,
            models::AccountResponse,
            models::AccountRole,
            models::AccountStatus,
            models::InviteResponse,
            models::InviteStatus,
            models::PropertyResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Onboarding", description = "Account claims with one-time tokens"),
        (name = "Authentication", description = "Login and session issuance"),
        (name = "Admin", description = "Provisioning, approval, invites, and catalog writes"),
        (name = "Catalog", description = "Public read-mostly views"),
        (name = "Observability", description = "Service health"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: PortalConfig,
    pub db: Database,
    pub cache: Arc<dyn ViewCache>,
    pub limiter: Arc<SlidingWindowLimiter>,
    pub sessions: SessionService,
    pub auth: AuthService,
    pub onboarding: OnboardingService,
    pub admin: AdminService,
    pub catalog: CatalogService,
    pub ip_rate_limiter: portal_core::middleware::rate_limit::IpRateLimiter,
}

impl AppState {
    /// Wire every service from its dependencies. Handlers reach services
    /// through this state; nothing here is process-global.
    pub fn build(
        config: PortalConfig,
        db: Database,
        cache: Arc<dyn ViewCache>,
        limiter: Arc<SlidingWindowLimiter>,
    ) -> Self {
        let sessions = SessionService::new(&config.session);
        let auth = AuthService::new(
            db.clone(),
            limiter.clone(),
            sessions.clone(),
            &config.rate_limit,
        );
        let onboarding = OnboardingService::new(
            db.clone(),
            limiter.clone(),
            cache.clone(),
            &config.rate_limit,
        );
        let admin = AdminService::new(db.clone(), cache.clone(), config.cache.overview_ttl_seconds);
        let catalog = CatalogService::new(
            db.clone(),
            cache.clone(),
            config.cache.properties_ttl_seconds,
        );
        let ip_rate_limiter = portal_core::middleware::rate_limit::create_ip_rate_limiter(
            config.rate_limit.global_ip_limit,
            config.rate_limit.global_ip_window_seconds,
        );

        Self {
            config,
            db,
            cache,
            limiter,
            sessions,
            auth,
            onboarding,
            admin,
            catalog,
            ip_rate_limiter,
        }
    }
}

pub async fn build_router(state: AppState) -> Result<Router, AppError> {
    // Admin routes: session auth first, then the administrator check.
    let admin_routes = Router::new()
        .route("/admin/provision", post(handlers::admin::provision))
        .route(
            "/admin/accounts/:account_id/approve",
            post(handlers::admin::approve_account),
        )
        .route(
            "/admin/accounts/:account_id/reject",
            post(handlers::admin::reject_account),
        )
        .route(
            "/admin/invites",
            post(handlers::admin::create_invite).get(handlers::admin::list_invites),
        )
        .route(
            "/admin/invites/:invite_id",
            delete(handlers::admin::revoke_invite),
        )
        .route("/admin/overview", get(handlers::admin::overview))
        .route("/admin/properties", post(handlers::admin::create_property))
        .layer(from_fn(middleware::require_admin_middleware))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let ip_limiter = state.ip_rate_limiter.clone();

    let mut app = Router::new().route("/health", get(health_check));

    let swagger_enabled = match state.config.environment {
        config::Environment::Dev => true,
        config::Environment::Prod => state.config.swagger.enabled == config::SwaggerMode::Public,
    };

    if swagger_enabled {
        app =
            app.merge(SwaggerUi::new("/docs").url("/.well-known/openapi.json", ApiDoc::openapi()));
    } else {
        app = app.route(
            "/.well-known/openapi.json",
            get(|| async { axum::Json(ApiDoc::openapi()) }),
        );
    }

    let app = app
        .route("/enlist", post(handlers::enlist::request_access))
        .route("/enlist/status", post(handlers::enlist::check_status))
        .route("/invites/accept", post(handlers::enlist::accept_invite))
        .route("/auth/login", post(handlers::auth::login))
        .route(
            "/properties/available",
            get(handlers::catalog::available_properties),
        )
        .merge(admin_routes)
        .with_state(state.clone())
        // Global IP rate limiting
        .layer(from_fn_with_state(ip_limiter, ip_rate_limit_middleware))
        // Add tracing layer
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        // Add tracing middleware for request_id
        .layer(from_fn(request_id_middleware))
        // Add security headers middleware
        .layer(from_fn(security_headers_middleware))
        // Add CORS layer
        .layer(
            CorsLayer::new()
                .allow_origin(
                    state
                        .config
                        .security
                        .allowed_origins
                        .iter()
                        .map(|o| {
                            o.parse::<axum::http::HeaderValue>().unwrap_or_else(|e| {
                                tracing::error!(
                                    "Invalid CORS origin '{}': {}. Using fallback.",
                                    o,
                                    e
                                );
                                axum::http::HeaderValue::from_static("*")
                            })
                        })
                        .collect::<Vec<axum::http::HeaderValue>>(),
                )
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::DELETE,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                ]),
        );

    Ok(app)
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 500, description = "Service is unhealthy")
    ),
    tag = "Observability"
)]
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<axum::Json<serde_json::Value>, AppError> {
    state.db.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Database health check failed");
        AppError::DatabaseError(anyhow::anyhow!(e))
    })?;

    // The cache degrades to misses, so its health never fails the check.
    let cache_status = match state.cache.health_check().await {
        Ok(()) => "up",
        Err(e) => {
            tracing::warn!(error = %e, "Cache health check failed; running degraded");
            "degraded"
        }
    };

    Ok(axum::Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "postgres": "up",
            "cache": cache_status
        }
    })))
}
