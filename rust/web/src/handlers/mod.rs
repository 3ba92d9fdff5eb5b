pub mod game;
pub mod live;

use serde::Serialize;
use std::convert::Infallible;
use warp::http::StatusCode;
use warp::reply::{self, Response};
use warp::{Rejection, Reply};

/// Turns warp rejections into the same JSON error body the handlers use.
pub async fn handle_rejection(rejection: Rejection) -> Result<Response, Infallible> {
    let (status, error, message) = if rejection.is_not_found() {
        (StatusCode::NOT_FOUND, "not_found", "Not found".to_string())
    } else if let Some(err) = rejection.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, "invalid_request", err.to_string())
    } else if let Some(err) = rejection.find::<warp::cors::CorsForbidden>() {
        (StatusCode::FORBIDDEN, "cors_forbidden", err.to_string())
    } else if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "method_not_allowed",
            "Method not allowed".to_string(),
        )
    } else if let Some(err) = rejection.find::<warp::reject::UnsupportedMediaType>() {
        (StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported_media_type", err.to_string())
    } else {
        (StatusCode::BAD_REQUEST, "bad_request", format!("{:?}", rejection))
    };
    Ok(error_response(status, error, message))
}

pub(crate) fn success_response<T>(status: StatusCode, body: T) -> Response
where
    T: Serialize,
{
    reply::with_status(reply::json(&body), status).into_response()
}

pub(crate) fn error_response(status: StatusCode, error: &'static str, message: String) -> Response {
    #[derive(Serialize)]
    struct ErrorBody<'a> {
        error: &'a str,
        message: String,
    }

    let body = ErrorBody { error, message };
    reply::with_status(reply::json(&body), status).into_response()
}
