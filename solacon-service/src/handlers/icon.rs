use crate::config::FailureMode;
use crate::error::{GenerationError, OutputError};
use crate::models::{GeneratedFile, IconParams};
use crate::services::record_generation;
use crate::startup::AppState;
use axum::{
    extract::{RawQuery, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use service_core::error::AppError;
use std::time::Instant;

const CONTENT_TRANSFER_ENCODING: &str = "content-transfer-encoding";

/// `GET /?background=&color=&download=&size=&string=`
///
/// Runs the generator with whichever parameters pass validation and sends
/// the result as an attachment. What a failure looks like depends on the
/// configured [`FailureMode`].
pub async fn generate_icon(State(state): State<AppState>, RawQuery(query): RawQuery) -> Response {
    let start = Instant::now();
    let params = IconParams::from_query(query.as_deref()).validate();

    let generated = if params.rejected.is_empty() {
        state.generator.generate(&params.to_args()).await
    } else if state.config.generator.failure_mode == FailureMode::Strict {
        Err(GenerationError::InvalidParameters(params.rejected.clone()))
    } else {
        tracing::debug!(rejected = ?params.rejected, "Dropping invalid query parameters");
        state.generator.generate(&params.to_args()).await
    };
    let result = generated.and_then(file_response);

    match result {
        Ok((response, name, size)) => {
            record_generation("success", start.elapsed());
            tracing::info!(
                file_name = %name,
                size = size,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Icon generated"
            );
            response
        }
        Err(e) => {
            record_generation(e.kind(), start.elapsed());
            failure_response(e, state.config.generator.failure_mode)
        }
    }
}

fn file_response(file: GeneratedFile) -> Result<(Response, String, usize), GenerationError> {
    let disposition = HeaderValue::from_str(&file.content_disposition())
        .map_err(|_| OutputError::InvalidFileName)?;
    let size = file.content.len();

    let response = (
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            ),
            (
                header::HeaderName::from_static(CONTENT_TRANSFER_ENCODING),
                HeaderValue::from_static("Binary"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CONTENT_LENGTH, HeaderValue::from(size)),
        ],
        file.content,
    )
        .into_response();

    Ok((response, file.name, size))
}

fn failure_response(err: GenerationError, mode: FailureMode) -> Response {
    match &err {
        GenerationError::GeneratorMissing(path) => {
            tracing::error!(path = ?path, "Generator executable not found");
        }
        GenerationError::InvalidParameters(names) => {
            tracing::info!(rejected = ?names, "Rejecting icon request");
        }
        other => {
            tracing::warn!(error = %other, kind = other.kind(), "Icon generation failed");
        }
    }

    match mode {
        // Nothing from the generator reaches the caller: a bare 200.
        FailureMode::Fallthrough => StatusCode::OK.into_response(),
        FailureMode::Strict => AppError::from(err).into_response(),
    }
}
