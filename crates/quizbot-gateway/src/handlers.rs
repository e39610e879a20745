use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::response::IntoResponse;
use quizbot_core::{PromptMode, QuizOptions, QuizResult};
use quizbot_document::{SourceText, TextSource};
use quizbot_llm::QuestionGenerator;
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::server::AppState;

#[derive(Debug, Deserialize)]
pub(crate) struct QuestionsRequest {
    pub text: String,
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default)]
    pub mode: Option<PromptMode>,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionsResponse {
    #[serde(flatten)]
    result: QuizResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

impl From<QuizResult> for QuestionsResponse {
    fn from(result: QuizResult) -> Self {
        let message = result
            .questions
            .is_empty()
            .then_some("no questions produced");
        Self { result, message }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    generator: String,
}

pub(crate) async fn health_handler<G: QuestionGenerator + 'static>(
    State(state): State<AppState<G>>,
) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.started_at.elapsed().as_secs(),
        generator: state.pipeline.generator().name().to_owned(),
    })
}

pub(crate) async fn questions_handler<G: QuestionGenerator + 'static>(
    State(state): State<AppState<G>>,
    payload: Result<Json<QuestionsRequest>, JsonRejection>,
) -> Result<Json<QuestionsResponse>, ApiError> {
    let Json(request) =
        payload.map_err(|e| ApiError::Rejected(e.status(), e.body_text()))?;
    let options = QuizOptions {
        count: request.count,
        mode: request.mode,
    };
    let result = state
        .pipeline
        .generate(&SourceText::new(request.text), options)
        .await?;
    Ok(Json(result.into()))
}

pub(crate) async fn upload_handler<G: QuestionGenerator + 'static>(
    State(state): State<AppState<G>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<QuestionsResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::Rejected(e.status(), e.body_text()))?;
    let mut file = None;
    let mut options = QuizOptions::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Rejected(e.status(), e.body_text()))?
    {
        let field_name = field.name().unwrap_or_default().to_owned();
        match field_name.as_str() {
            "file" => {
                let filename = field
                    .file_name()
                    .filter(|name| !name.is_empty())
                    .map(str::to_owned)
                    .ok_or_else(|| ApiError::BadRequest("file field has no filename".into()))?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Rejected(e.status(), e.body_text()))?;
                file = Some(TextSource::upload(filename, bytes.to_vec()));
            }
            "count" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Rejected(e.status(), e.body_text()))?;
                let count = text.trim().parse::<usize>().map_err(|_| {
                    ApiError::BadRequest(format!("count must be a positive integer, got {text:?}"))
                })?;
                options.count = Some(count);
            }
            "mode" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Rejected(e.status(), e.body_text()))?;
                options.mode = Some(text.parse::<PromptMode>().map_err(ApiError::BadRequest)?);
            }
            other => tracing::debug!("ignoring multipart field {other:?}"),
        }
    }

    let source = file.ok_or_else(|| ApiError::BadRequest("missing file field".into()))?;
    let result = state.pipeline.generate_from(source, options).await?;
    Ok(Json(result.into()))
}
