use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Redirect, Response},
    Extension, Form,
};
use axum_extra::extract::{cookie::CookieJar, WithRejection};

use crate::{
    dto::admin_dto::{
        AddResponderForm, DeleteQuery, EditFieldPayload, EditFieldResponse, EditResponderForm,
        ReportMeta, ResponderFormPage, ResponderListPage, ResponderListQuery, ResponderViewPage,
        ADD_PAGE_TITLE, EDIT_PAGE_TITLE, PAGE_TITLE, VIEW_PAGE_TITLE,
    },
    error::{Error, Result},
    middleware::{auth::Claims, cors::CSRF_HEADER},
    models::responder::ResponderRow,
    services::responder_service::{AddOutcome, EditFieldOutcome, EditOutcome},
    utils::{
        csrf,
        flash::{Flash, FlashLevel},
        validation::FieldErrors,
    },
    AppState,
};

pub const LIST_PATH: &str = "/admin/message_responder";

fn redirect_with_flash(jar: CookieJar, flash: Flash) -> Response {
    (flash.store(jar), Redirect::to(LIST_PATH)).into_response()
}

fn today() -> chrono::NaiveDate {
    chrono::Utc::now().date_naive()
}

fn csrf_token(state: &AppState, claims: &Claims) -> String {
    csrf::issue_token(&state.config.csrf_secret, &claims.sub)
}

async fn render_list(
    state: &AppState,
    claims: &Claims,
    jar: CookieJar,
    params: ResponderListQuery,
    field_filter: Option<(&str, &str)>,
) -> Result<(CookieJar, Json<ResponderListPage>)> {
    let list = state
        .responder_service
        .list(claims, &params, field_filter)
        .await?;
    let (jar, flash) = Flash::take(jar);

    let page = ResponderListPage {
        page_title: PAGE_TITLE.to_string(),
        record_count: list.rows.len(),
        records: list.rows,
        total_records: list.total,
        total_page: list.total_pages,
        page: list.page,
        limit: list.limit,
        search: params.search,
        flash,
        csrf_token: csrf_token(state, claims),
        report: ReportMeta::new(PAGE_TITLE, today()),
    };
    Ok((jar, Json(page)))
}

#[axum::debug_handler]
pub async fn list_records(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    jar: CookieJar,
    WithRejection(Query(params), _): WithRejection<Query<ResponderListQuery>, Error>,
) -> Result<impl IntoResponse> {
    render_list(&state, &claims, jar, params, None).await
}

#[axum::debug_handler]
pub async fn list_records_by_field(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    jar: CookieJar,
    Path((field, value)): Path<(String, String)>,
    WithRejection(Query(params), _): WithRejection<Query<ResponderListQuery>, Error>,
) -> Result<impl IntoResponse> {
    render_list(
        &state,
        &claims,
        jar,
        params,
        Some((field.as_str(), value.as_str())),
    )
    .await
}

fn view_page(state: &AppState, claims: &Claims, record: ResponderRow) -> Json<ResponderViewPage> {
    Json(ResponderViewPage {
        page_title: VIEW_PAGE_TITLE.to_string(),
        record,
        csrf_token: csrf_token(state, claims),
        report: ReportMeta::new(VIEW_PAGE_TITLE, today()),
    })
}

#[axum::debug_handler]
pub async fn view_record(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(rec_id): Path<String>,
) -> Result<impl IntoResponse> {
    let record = state.responder_service.view(&rec_id).await?;
    Ok(view_page(&state, &claims, record))
}

#[axum::debug_handler]
pub async fn view_record_by_field(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((field, value)): Path<(String, String)>,
) -> Result<impl IntoResponse> {
    let record = state.responder_service.view_by(&field, &value).await?;
    Ok(view_page(&state, &claims, record))
}

#[axum::debug_handler]
pub async fn add_form(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    Json(ResponderFormPage {
        page_title: ADD_PAGE_TITLE.to_string(),
        rec_id: None,
        values: AddResponderForm::default(),
        errors: FieldErrors::default(),
        csrf_token: csrf_token(&state, &claims),
    })
}

#[axum::debug_handler]
pub async fn add_record(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    jar: CookieJar,
    WithRejection(Form(form), _): WithRejection<Form<AddResponderForm>, Error>,
) -> Result<Response> {
    match state.responder_service.add(form).await? {
        AddOutcome::Created(_) => Ok(redirect_with_flash(
            jar,
            Flash::new(FlashLevel::Success, "Record added successfully"),
        )),
        AddOutcome::Invalid { form, errors } => {
            let page = ResponderFormPage {
                page_title: ADD_PAGE_TITLE.to_string(),
                rec_id: None,
                values: form,
                errors,
                csrf_token: csrf_token(&state, &claims),
            };
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(page)).into_response())
        }
    }
}

#[axum::debug_handler]
pub async fn edit_form(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(rec_id): Path<String>,
) -> Result<impl IntoResponse> {
    let record = state.responder_service.view(&rec_id).await?;
    Ok(Json(ResponderFormPage {
        page_title: EDIT_PAGE_TITLE.to_string(),
        rec_id: Some(record.id),
        values: EditResponderForm {
            text_recieved: Some(record.text_recieved),
            response_by_bot: Some(record.response_by_bot),
        },
        errors: FieldErrors::default(),
        csrf_token: csrf_token(&state, &claims),
    }))
}

#[axum::debug_handler]
pub async fn edit_record(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(rec_id): Path<String>,
    jar: CookieJar,
    WithRejection(Form(form), _): WithRejection<Form<EditResponderForm>, Error>,
) -> Result<Response> {
    match state.responder_service.edit(&rec_id, form).await? {
        EditOutcome::Updated => Ok(redirect_with_flash(
            jar,
            Flash::new(FlashLevel::Success, "Record updated successfully"),
        )),
        EditOutcome::NotUpdated => Ok(redirect_with_flash(
            jar,
            Flash::new(FlashLevel::Warning, "No record updated"),
        )),
        EditOutcome::Invalid { form, errors } => {
            let page = ResponderFormPage {
                page_title: EDIT_PAGE_TITLE.to_string(),
                rec_id: rec_id.trim().parse().ok(),
                values: form,
                errors,
                csrf_token: csrf_token(&state, &claims),
            };
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(page)).into_response())
        }
    }
}

/// Reads `{name, value}` from either a JSON or a form-urlencoded body.
fn parse_edit_field(headers: &HeaderMap, body: &[u8]) -> Result<EditFieldPayload> {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));
    if is_json {
        return Ok(serde_json::from_slice(body)?);
    }

    let mut payload = EditFieldPayload::default();
    for (key, value) in url::form_urlencoded::parse(body) {
        match key.as_ref() {
            "name" => payload.name = value.into_owned(),
            "value" => payload.value = Some(value.into_owned()),
            _ => {}
        }
    }
    if payload.name.is_empty() {
        return Err(Error::BadRequest("Field name is required".to_string()));
    }
    Ok(payload)
}

#[axum::debug_handler]
pub async fn edit_field(
    State(state): State<AppState>,
    Path(rec_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let payload = parse_edit_field(&headers, &body)?;
    match state.responder_service.edit_field(&rec_id, payload).await? {
        EditFieldOutcome::Updated(num_rows) => Ok(Json(EditFieldResponse { num_rows, rec_id })),
        EditFieldOutcome::Rejected(message) => Err(Error::BadRequest(message)),
    }
}

#[axum::debug_handler]
pub async fn delete_records(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(rec_id): Path<String>,
    headers: HeaderMap,
    jar: CookieJar,
    WithRejection(Query(query), _): WithRejection<Query<DeleteQuery>, Error>,
) -> Result<Response> {
    let token = headers
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or(query.csrf_token)
        .unwrap_or_default();
    if !csrf::verify_token(&state.config.csrf_secret, &claims.sub, &token) {
        tracing::warn!(sub = %claims.sub, "delete rejected: bad csrf token");
        return Err(Error::Forbidden("Invalid CSRF token".to_string()));
    }

    let flash = match state.responder_service.delete(&rec_id).await {
        Ok(_) => Flash::new(FlashLevel::Success, "Record deleted successfully"),
        Err(err) => {
            tracing::warn!(error = %err, rec_id = %rec_id, "delete failed");
            Flash::new(FlashLevel::Danger, err.to_string())
        }
    };
    Ok(redirect_with_flash(jar, flash))
}
