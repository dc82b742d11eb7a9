//! HTTP passthrough endpoint.
//!
//! `GET /api/image?url=<url>` fetches `url` and answers with the body
//! verbatim, so a browser can hand remote images to the converter without
//! running into cross-origin restrictions.
//!
//! | Situation | Status | Body |
//! |---|---|---|
//! | upstream answered 2xx | 200 | upstream bytes, upstream `Content-Type` |
//! | `url` missing, empty or malformed | 400 | `{"message":"URL not valid"}` |
//! | fetch failed or upstream non-2xx | 502 | `{"message":"..."}` |

use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Error payload for a request without a usable `url`.
pub const URL_NOT_VALID: &str = "URL not valid";

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("Upstream answered {0}")]
    UpstreamStatus(reqwest::StatusCode),
}

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    url: Option<String>,
}

/// A fetched remote resource.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
struct AppState {
    client: reqwest::Client,
}

/// Fetch `url` as raw bytes. Non-2xx upstream answers are errors.
pub async fn fetch_remote(client: &reqwest::Client, url: &str) -> Result<Fetched, ServerError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ServerError::UpstreamStatus(status));
    }
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = response.bytes().await?.to_vec();
    Ok(Fetched {
        content_type,
        bytes,
    })
}

/// Build the router (shared between production startup and tests).
pub fn build_app(client: reqwest::Client) -> Router {
    Router::new()
        .route("/api/image", get(image_handler))
        .with_state(AppState { client })
}

async fn image_handler(
    State(state): State<AppState>,
    query: Result<Query<ImageQuery>, QueryRejection>,
) -> Response {
    let url = match query {
        Ok(Query(query)) => query.url.filter(|u| !u.is_empty()),
        Err(rejection) => {
            warn!("passthrough query rejected: {rejection}");
            None
        }
    };
    let Some(url) = url else {
        return error_response(StatusCode::BAD_REQUEST, URL_NOT_VALID);
    };

    match fetch_remote(&state.client, &url).await {
        Ok(fetched) => {
            info!(url = %url, bytes = fetched.bytes.len(), "passthrough fetched");
            let content_type = fetched
                .content_type
                .unwrap_or_else(|| crate::media_type::OCTET_STREAM.to_string());
            ([(header::CONTENT_TYPE, content_type)], fetched.bytes).into_response()
        }
        Err(e) => {
            warn!(url = %url, "passthrough failed: {e}");
            error_response(StatusCode::BAD_GATEWAY, &e.to_string())
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorMessage {
            message: message.to_string(),
        }),
    )
        .into_response()
}

/// Bind the listening socket. `bind` may be an IPv4 or IPv6 literal or a
/// host name.
pub async fn bind_listener(bind: &str, port: u16) -> Result<tokio::net::TcpListener, ServerError> {
    Ok(tokio::net::TcpListener::bind((bind, port)).await?)
}

/// Start the passthrough server and run until the process stops.
pub async fn start_server(bind: &str, port: u16) -> Result<(), ServerError> {
    let listener = bind_listener(bind, port).await?;
    let addr = listener.local_addr()?;
    info!("image passthrough listening on http://{addr}/api/image");
    axum::serve(listener, build_app(reqwest::Client::new())).await?;
    Ok(())
}
