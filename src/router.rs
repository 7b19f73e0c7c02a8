use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::CONFIG;
use crate::database::Store;
use crate::handlers::{elevated, protected, public};
use crate::middleware::{optional_organization_middleware, validate_organization_middleware};
use crate::services::{ListingService, PaymentService, RoleService};

/// Shared by every handler through an `Extension` layer
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn listing(&self) -> ListingService {
        ListingService::new(self.store.clone())
    }

    pub fn payments(&self) -> PaymentService {
        PaymentService::new(self.store.clone())
    }

    pub fn roles(&self) -> RoleService {
        RoleService::new(self.store.clone())
    }
}

pub fn app(state: AppState) -> Router {
    let router = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        // Organization-scoped API
        .merge(donor_routes())
        .merge(gift_routes())
        .merge(yahrzeit_routes())
        .merge(listing_routes())
        .merge(content_routes())
        // Administration
        .merge(admin_routes())
        // Global middleware
        .layer(DefaultBodyLimit::max(CONFIG.api.max_request_size_bytes))
        .layer(cors_layer())
        .layer(Extension(state));

    if CONFIG.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn cors_layer() -> CorsLayer {
    let origins = &CONFIG.api.cors_origins;
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }
    let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| HeaderValue::from_str(o).ok()).collect();
    CorsLayer::permissive().allow_origin(AllowOrigin::list(allowed))
}

fn donor_routes() -> Router {
    use protected::donors;

    Router::new()
        .route("/api/donors", get(donors::list).post(donors::create))
        .route("/api/donors/lookup", get(donors::lookup))
        .route("/api/donors/:id", get(donors::show).put(donors::update).delete(donors::delete))
        .route_layer(middleware::from_fn(validate_organization_middleware))
}

fn gift_routes() -> Router {
    use protected::{donations, pledges};

    Router::new()
        .route("/api/donations", get(donations::list).post(donations::create))
        .route(
            "/api/donations/:id",
            get(donations::show).put(donations::update).delete(donations::delete),
        )
        .route("/api/payments", get(donations::payments))
        .route("/api/pledges", get(pledges::list).post(pledges::create))
        .route("/api/pledges/:id", get(pledges::show).put(pledges::update).delete(pledges::delete))
        .route("/api/pledges/:id/payments", post(pledges::record_payment))
        .route("/api/pledges/:id/cancel", post(pledges::cancel))
        .route_layer(middleware::from_fn(validate_organization_middleware))
}

fn yahrzeit_routes() -> Router {
    use protected::yahrzeits;

    Router::new()
        .route("/api/yahrzeits", get(yahrzeits::list).post(yahrzeits::create))
        .route("/api/yahrzeits/upcoming", get(yahrzeits::upcoming))
        .route("/api/yahrzeits/reminders", get(yahrzeits::reminders))
        .route(
            "/api/yahrzeits/:id",
            get(yahrzeits::show).put(yahrzeits::update).delete(yahrzeits::delete),
        )
        .route_layer(middleware::from_fn(validate_organization_middleware))
}

fn listing_routes() -> Router {
    use protected::{export, find, import};

    Router::new()
        .route("/api/find/:entity", post(find::post))
        .route("/api/export/:entity", get(export::get))
        .route("/api/import/:kind/:stage", post(import::post))
        .route_layer(middleware::from_fn(validate_organization_middleware))
}

fn content_routes() -> Router {
    use protected::content;

    Router::new()
        .route("/api/content/home", get(content::get).put(content::put).delete(content::delete))
        .route("/api/content/home/edit", post(content::edit))
        .route_layer(middleware::from_fn(validate_organization_middleware))
}

fn admin_routes() -> Router {
    use elevated::{organizations, roles};

    Router::new()
        .route("/api/organizations", get(organizations::list).post(organizations::create))
        .route("/api/organizations/:id", get(organizations::show).put(organizations::update))
        .route("/api/roles", get(roles::list).post(roles::create))
        .route("/api/roles/user/:user_id", get(roles::for_user))
        .route("/api/roles/:id/suspend", post(roles::suspend))
        .route("/api/roles/:id/unsuspend", post(roles::unsuspend))
        .route_layer(middleware::from_fn(optional_organization_middleware))
}
