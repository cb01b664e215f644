use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use axum_extra::extract::WithRejection;

use crate::{
    dto::message_dto::{
        CreateMessagePayload, DeleteMessageResponse, MessageResponse, UpdateMessagePayload,
    },
    error::{Error, Result},
    services::message_service::parse_message_id,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/messages",
    responses(
        (status = 200, description = "All message records", body = [MessageResponse]),
        (status = 500, description = "Store failure")
    )
)]
#[axum::debug_handler]
pub async fn list_messages(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let records = state.message_service.list().await?;
    let items: Vec<MessageResponse> = records.into_iter().map(Into::into).collect();
    Ok(Json(items))
}

#[utoipa::path(
    post,
    path = "/api/messages",
    request_body = CreateMessagePayload,
    responses(
        (status = 201, description = "Message record created", body = MessageResponse),
        (status = 400, description = "Missing or empty field")
    )
)]
#[axum::debug_handler]
pub async fn create_message(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<CreateMessagePayload>, Error>,
) -> Result<impl IntoResponse> {
    let record = state.message_service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(MessageResponse::from(record))))
}

#[utoipa::path(
    get,
    path = "/api/messages/{id}",
    params(
        ("id" = String, Path, description = "Message record ID")
    ),
    responses(
        (status = 200, description = "Message record found", body = MessageResponse),
        (status = 404, description = "Message not found")
    )
)]
#[axum::debug_handler]
pub async fn get_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = parse_message_id(&id)?;
    let record = state.message_service.get(id).await?;
    Ok(Json(MessageResponse::from(record)))
}

#[utoipa::path(
    put,
    path = "/api/messages/{id}",
    params(
        ("id" = String, Path, description = "Message record ID")
    ),
    request_body = UpdateMessagePayload,
    responses(
        (status = 200, description = "Message record updated", body = MessageResponse),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Message not found")
    )
)]
#[axum::debug_handler]
pub async fn update_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateMessagePayload>, Error>,
) -> Result<impl IntoResponse> {
    let id = parse_message_id(&id)?;
    let record = state.message_service.update(id, payload).await?;
    Ok(Json(MessageResponse::from(record)))
}

#[utoipa::path(
    delete,
    path = "/api/messages/{id}",
    params(
        ("id" = String, Path, description = "Message record ID")
    ),
    responses(
        (status = 200, description = "Deleted, whether or not the record existed", body = DeleteMessageResponse),
        (status = 500, description = "Store failure")
    )
)]
#[axum::debug_handler]
pub async fn delete_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = parse_message_id(&id)?;
    state.message_service.delete(id).await?;
    Ok(Json(DeleteMessageResponse {
        message: "Deleted successfully".to_string(),
    }))
}
