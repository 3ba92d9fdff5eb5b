use super::{error_response, success_response};
use crate::session::{SessionError, SessionManager};
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;
use warp::http::StatusCode;
use warp::reply::Response;

#[derive(Debug, Deserialize)]
pub struct NewGameRequest {
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRequest {
    #[serde(default)]
    pub game_id: String,
}

pub async fn new_game(sessions: Arc<SessionManager>, request: NewGameRequest) -> Response {
    match sessions.create_session(&request.username) {
        Ok(game) => success_response(StatusCode::OK, game),
        Err(err) => session_error(err),
    }
}

pub async fn draw_card(sessions: Arc<SessionManager>, request: GameRequest) -> Response {
    match sessions.draw(&request.game_id) {
        Ok(result) => success_response(StatusCode::OK, result),
        Err(err) => session_error(err),
    }
}

pub async fn resume_game(sessions: Arc<SessionManager>, request: GameRequest) -> Response {
    match sessions.resume(&request.game_id) {
        Ok(game) => success_response(StatusCode::OK, game),
        Err(err) => session_error(err),
    }
}

pub async fn leaderboard(sessions: Arc<SessionManager>) -> Response {
    match sessions.leaderboard() {
        Ok(scores) => success_response(StatusCode::OK, scores),
        Err(err) => session_error(err),
    }
}

fn session_error(err: SessionError) -> Response {
    let (status, error_code) = match &err {
        SessionError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
        SessionError::NotFound(_) => (StatusCode::NOT_FOUND, "game_not_found"),
        SessionError::GameOver(_) => (StatusCode::CONFLICT, "game_over"),
        SessionError::EmptyDeck(_) => (StatusCode::BAD_REQUEST, "empty_deck"),
        SessionError::Storage(_) => {
            error!(error = %err, "storage failure");
            (StatusCode::INTERNAL_SERVER_ERROR, "storage_error")
        }
    };
    error_response(status, error_code, err.to_string())
}
