pub mod admin;
pub mod export;
pub mod health;
pub mod messages;
pub mod openapi;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::middleware::{auth::require_admin_session, cors::api_cors};
use crate::AppState;

/// Builds the full application router.
pub fn app(state: AppState) -> Router {
    let messages_api = Router::new()
        .route(
            "/api/messages",
            get(messages::list_messages).post(messages::create_message),
        )
        .route(
            "/api/messages/:id",
            get(messages::get_message)
                .put(messages::update_message)
                .delete(messages::delete_message),
        );

    // Paths mirror the admin panel's controller/action/param layout.
    let admin_panel = Router::new()
        .route(admin::LIST_PATH, get(admin::list_records))
        .route(
            "/admin/message_responder/index/:field/:value",
            get(admin::list_records_by_field),
        )
        .route(
            "/admin/message_responder/export",
            get(export::export_records),
        )
        .route(
            "/admin/message_responder/view/:rec_id",
            get(admin::view_record),
        )
        .route(
            "/admin/message_responder/view/:rec_id/:value",
            get(admin::view_record_by_field),
        )
        .route(
            "/admin/message_responder/add",
            get(admin::add_form).post(admin::add_record),
        )
        .route(
            "/admin/message_responder/edit/:rec_id",
            get(admin::edit_form).post(admin::edit_record),
        )
        .route(
            "/admin/message_responder/editfield/:rec_id",
            post(admin::edit_field),
        )
        .route(
            "/admin/message_responder/delete/:rec_id",
            get(admin::delete_records).post(admin::delete_records),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_admin_session,
        ));

    let mut router = Router::new()
        .route("/health", get(health::health))
        .route("/api-docs/openapi.json", get(openapi::openapi_json))
        .merge(messages_api)
        .merge(admin_panel);

    if let Some(upload_path) = state.config.uploads_dir.clone() {
        tracing::info!("Serving uploads from: {}", upload_path);
        router = router.nest_service("/uploads", ServeDir::new(upload_path));
    }

    router
        .with_state(state)
        .layer(api_cors())
        .layer(TraceLayer::new_for_http())
}
