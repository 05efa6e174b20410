pub mod extraction_handler;
pub mod health;
pub mod survey_handler;

use actix_web::web;

pub use extraction_handler::{extract_dvs, parse_scales, suggest_scales};
pub use health::{health_check, health_check_live};
pub use survey_handler::{create_qualtrics_survey, generate_qsf, preview_survey};

/// Registers every route on the application.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check)
        .service(health_check_live)
        .service(generate_qsf)
        .service(preview_survey)
        .service(create_qualtrics_survey)
        .service(extract_dvs)
        .service(parse_scales)
        .service(suggest_scales);
}
