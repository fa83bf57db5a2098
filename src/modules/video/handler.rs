use super::dto::PushEnvelope;
use super::model::{InvalidJob, JobOutcome};
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use tracing::{error, info};

/// Process an uploaded video
/// Downloads the raw object named in the notification, transcodes it to 360p
/// and uploads the result to the processed bucket.
#[utoipa::path(
    post,
    path = "/process-video",
    request_body = PushEnvelope,
    responses(
        (status = 200, description = "Processing finished successfully", body = String),
        (status = 400, description = "Bad request: missing filename.", body = String),
        (status = 409, description = "Job already in progress", body = String),
        (status = 500, description = "Processing failed", body = String)
    ),
    tag = "Processing"
)]
pub async fn process_video(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    // Run detached so a dropped connection cannot interrupt the job between
    // stages and skip its cleanup.
    let processor = state.processor.clone();
    let job = tokio::spawn(async move { processor.process(&body).await });

    match job.await {
        Ok(report) => {
            info!(
                job_id = %report.job_id,
                status = %status_for(&report.outcome),
                "Responding to notification"
            );
            outcome_response(&report.outcome)
        }
        Err(e) => {
            error!("Job task aborted: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Processing failed: internal error").into_response()
        }
    }
}

pub fn status_for(outcome: &JobOutcome) -> StatusCode {
    match outcome {
        JobOutcome::Succeeded => StatusCode::OK,
        JobOutcome::RejectedInput(_) => StatusCode::BAD_REQUEST,
        JobOutcome::Duplicate => StatusCode::CONFLICT,
        JobOutcome::DownloadFailed(_)
        | JobOutcome::TranscodeFailed(_)
        | JobOutcome::UploadFailed(_)
        | JobOutcome::PublishIncomplete { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn outcome_response(outcome: &JobOutcome) -> Response {
    let body = match outcome {
        JobOutcome::Succeeded => "Processing finished successfully".to_string(),
        JobOutcome::RejectedInput(InvalidJob::MalformedEnvelope(_)) => {
            "Bad request: malformed notification.".to_string()
        }
        JobOutcome::RejectedInput(reason) => format!("Bad request: {}", reason),
        JobOutcome::Duplicate => "Job already in progress".to_string(),
        failed => format!("Processing failed: {}", failed.summary()),
    };

    (status_for(outcome), body).into_response()
}
