use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post, put};
use pondok_core::AppError;
use tower_http::trace::TraceLayer;
use tower_sessions::SessionManagerLayer;
use tower_sessions_sqlx_store::PostgresStore;

use crate::state::AppState;
use crate::{auth, handlers, middleware};

mod cors;

pub fn build_router(
    app_state: AppState,
    frontend_url: &str,
    session_layer: SessionManagerLayer<PostgresStore>,
) -> Result<Router, AppError> {
    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route(
            "/api/dashboard/summary",
            get(handlers::dashboard::summary_handler),
        )
        .route(
            "/api/resources/{resource}/records",
            get(handlers::resources::list_records_handler)
                .post(handlers::resources::create_record_handler),
        )
        .route(
            "/api/resources/{resource}/records/query",
            post(handlers::resources::query_records_handler),
        )
        .route(
            "/api/resources/{resource}/records/{record_id}",
            get(handlers::resources::get_record_handler)
                .put(handlers::resources::update_record_handler)
                .delete(handlers::resources::delete_record_handler),
        )
        .route(
            "/api/resources/{resource}/export",
            post(handlers::resources::export_records_handler),
        )
        .route(
            "/api/audit-log",
            get(handlers::audit::list_audit_log_handler),
        )
        .route(
            "/api/access-profiles",
            get(handlers::accounts::list_access_profiles_handler),
        )
        .route(
            "/api/access-profiles/{account_id}",
            put(handlers::accounts::save_access_profile_handler),
        )
        .route(
            "/api/admin-accounts/{account_id}",
            delete(handlers::accounts::delete_admin_account_handler),
        )
        .route(
            "/api/payments/{invoice_id}/token",
            post(handlers::payments::create_payment_token_handler),
        )
        .route_layer(from_fn_with_state(app_state.clone(), middleware::require_auth));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .merge(protected_routes)
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors::build_cors_layer(frontend_url)?)
        .layer(session_layer)
        .with_state(app_state))
}
