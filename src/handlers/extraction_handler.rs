use std::sync::Arc;

use actix_web::{get, post, web, HttpRequest, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    errors::AppError,
    models::dto::{
        request::ExtractDvsRequest,
        response::{ExtractDvsResponse, ParseScalesResponse, SuggestScalesResponse},
    },
    services::ScaleExtractor,
};

#[post("/api/extract-dvs")]
pub async fn extract_dvs(
    state: web::Data<Arc<AppState>>,
    request: web::Json<ExtractDvsRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate()?;

    let extraction = state
        .hypothesis_extractor
        .extract(&request.hypotheses)
        .await;
    Ok(HttpResponse::Ok().json(ExtractDvsResponse::from(extraction)))
}

/// Accepts the document (PDF or plain text) as the raw request body.
#[post("/api/parse-scales")]
pub async fn parse_scales(
    state: web::Data<Arc<AppState>>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    if body.is_empty() {
        return Err(AppError::ValidationError("No document uploaded".into()));
    }
    if body.len() > state.config.max_upload_bytes {
        return Err(AppError::ValidationError(format!(
            "Document exceeds the {} byte upload limit",
            state.config.max_upload_bytes
        )));
    }

    let content_type = req
        .headers()
        .get(actix_web::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let reader = state.document_reader.clone();
    let text = web::block(move || reader.extract_text(content_type.as_deref(), &body))
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))??;
    let scales = state.scale_extractor.parse(&text);
    let item_count = ScaleExtractor::item_count(&scales);

    Ok(HttpResponse::Ok().json(ParseScalesResponse {
        success: true,
        scales,
        item_count,
    }))
}

#[get("/api/suggest-scales/{dv_name}")]
pub async fn suggest_scales(
    state: web::Data<Arc<AppState>>,
    dv_name: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let dv = dv_name.into_inner();
    if dv.trim().is_empty() {
        return Err(AppError::ValidationError("Variable name is required".into()));
    }

    let suggestions = state.hypothesis_extractor.suggest_scales(&dv).await;
    Ok(HttpResponse::Ok().json(SuggestScalesResponse {
        success: true,
        dv,
        suggestions,
    }))
}
