//! Route handlers.

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::analysis::{AnalysisResult, AnswerLanguage, ComplexityReport, ImprovementResult};
use crate::service::{CodeService, ServiceError};

const INDEX_HTML: &str = include_str!("static/index.html");

/// Body of every POST endpoint. A missing or null `code` is treated as empty.
#[derive(Debug, Deserialize)]
pub struct CodeRequest {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub answer_language: Option<String>,
}

impl CodeRequest {
    fn code(&self) -> &str {
        self.code.as_deref().unwrap_or_default()
    }

    fn answer_language(&self) -> AnswerLanguage {
        AnswerLanguage::from_request(self.answer_language.as_deref())
    }
}

pub async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(INDEX_HTML)
}

pub async fn analyze(
    service: web::Data<CodeService>,
    body: web::Json<CodeRequest>,
) -> Result<web::Json<AnalysisResult>, ServiceError> {
    let result = service.analyze(body.code(), body.answer_language()).await?;
    Ok(web::Json(result))
}

pub async fn complexity(
    service: web::Data<CodeService>,
    body: web::Json<CodeRequest>,
) -> Result<web::Json<ComplexityReport>, ServiceError> {
    let result = service.complexity(body.code()).await?;
    Ok(web::Json(result))
}

pub async fn improve(
    service: web::Data<CodeService>,
    body: web::Json<CodeRequest>,
) -> Result<web::Json<ImprovementResult>, ServiceError> {
    let result = service.improve(body.code(), body.answer_language()).await?;
    Ok(web::Json(result))
}
