use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension,
};
use axum_extra::extract::WithRejection;

use crate::{
    dto::admin_dto::{ReportMeta, ResponderListQuery, PAGE_TITLE},
    error::{Error, Result},
    middleware::auth::Claims,
    services::export_service::ExportService,
    AppState,
};

/// Export the filtered admin list as XLSX
#[axum::debug_handler]
pub async fn export_records(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Query(params), _): WithRejection<Query<ResponderListQuery>, Error>,
) -> Result<impl IntoResponse> {
    let rows = state
        .responder_service
        .export_rows(&claims, &params)
        .await?;
    let report = ReportMeta::new(PAGE_TITLE, chrono::Utc::now().date_naive());
    let buffer = ExportService::generate_responders_xlsx(&rows, &report)?;
    tracing::info!(rows = rows.len(), "responder report exported");

    let disposition = format!("attachment; filename=\"{}.xlsx\"", report.report_filename);
    Ok((
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string(),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        buffer,
    ))
}
