use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};

use crate::api::dto::{MultiPdfRequest, PdfRequest};
use crate::api::state::AppState;
use crate::domain::{Actor, KanbanError};
use crate::services::PdfDocument;

pub async fn download_pdf(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<PdfRequest>,
) -> Result<Response, KanbanError> {
    let document = state.print_service()?.download_pdf(&actor, req).await?;
    Ok(pdf_response(document))
}

pub async fn download_multi_pdf(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<MultiPdfRequest>,
) -> Result<Response, KanbanError> {
    let document = state
        .print_service()?
        .download_multi_pdf(&actor, req)
        .await?;
    Ok(pdf_response(document))
}

fn pdf_response(document: PdfDocument) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", document.filename);
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.content,
    )
        .into_response()
}
