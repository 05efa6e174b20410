use std::sync::Arc;

use actix_web::{http::header, post, web, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    errors::AppError,
    models::{
        domain::StudySpec,
        dto::{
            request::SurveyDataRequest,
            response::{CreateSurveyResponse, PreviewResponse},
        },
    },
    qsf::to_qsf_json,
};

/// Download name for a study: its title with every non-alphanumeric character replaced.
fn qsf_filename(spec: &StudySpec) -> String {
    let stem = spec
        .title_text()
        .map(|title| {
            title
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
                .collect::<String>()
        })
        .unwrap_or_else(|| "survey".to_string());
    format!("{}.qsf", stem)
}

#[post("/api/generate-qsf")]
pub async fn generate_qsf(
    state: web::Data<Arc<AppState>>,
    request: web::Json<SurveyDataRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate()?;

    let assembly = state.survey_service.generate(&request.survey_data)?;
    for omitted in &assembly.omitted_sections {
        log::info!("Section {} omitted: {}", omitted.key, omitted.reason);
    }
    let body = to_qsf_json(&assembly.document)?;

    Ok(HttpResponse::Ok()
        .content_type("application/json")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", qsf_filename(&request.survey_data)),
        ))
        .body(body))
}

#[post("/api/preview-survey")]
pub async fn preview_survey(
    state: web::Data<Arc<AppState>>,
    request: web::Json<SurveyDataRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate()?;

    let preview = state.survey_service.preview(&request.survey_data)?;
    Ok(HttpResponse::Ok().json(PreviewResponse {
        success: true,
        preview,
    }))
}

#[post("/api/create-qualtrics-survey")]
pub async fn create_qualtrics_survey(
    state: web::Data<Arc<AppState>>,
    request: web::Json<SurveyDataRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate()?;

    let assembly = state.survey_service.generate(&request.survey_data)?;
    let report = state.survey_service.replay(&assembly.document).await?;
    Ok(HttpResponse::Ok().json(CreateSurveyResponse::from(report)))
}
