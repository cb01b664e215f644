use axum::Json;
use utoipa::OpenApi;

use crate::dto::message_dto::{
    CreateMessagePayload, DeleteMessageResponse, MessageResponse, UpdateMessagePayload,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health::health,
        crate::routes::messages::list_messages,
        crate::routes::messages::create_message,
        crate::routes::messages::get_message,
        crate::routes::messages::update_message,
        crate::routes::messages::delete_message,
    ),
    components(
        schemas(
            CreateMessagePayload,
            UpdateMessagePayload,
            MessageResponse,
            DeleteMessageResponse,
        )
    ),
    tags(
        (name = "messages", description = "Bot message log")
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
