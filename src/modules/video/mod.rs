use axum::Router;
use axum::routing::post;
use crate::state::AppState;

pub mod dto;
pub mod handler;
pub mod model;
pub mod registry;
pub mod service;

#[cfg(test)]
pub mod testing;

pub fn router() -> Router<AppState> {
    Router::new().route("/process-video", post(handler::process_video))
}
