use inference::{static_advisories, InferenceError};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{Advisory, Prediction, PredictionRequest},
};
use tracing::warn;

use crate::ApiContext;

pub fn list_alerts() -> Vec<Advisory> {
    static_advisories()
}

pub async fn predict_alert(
    ctx: &ApiContext,
    request: PredictionRequest,
) -> Result<Prediction, ApiError> {
    let Some(predictor) = ctx.predictor.as_ref() else {
        return Err(ApiError::new(
            ErrorCode::Unavailable,
            "no prediction endpoint is configured",
        ));
    };

    predictor.predict(&request.prompt).await.map_err(|err| match err {
        InferenceError::EmptyPrompt | InferenceError::PromptTooLong => {
            ApiError::validation(err.to_string())
        }
        other => {
            warn!(error = %other, "prediction request failed");
            ApiError::new(ErrorCode::Unavailable, other.to_string())
        }
    })
}
