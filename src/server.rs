//! Status and query endpoint.
//!
//! Serves the latest published run to the companion app over HTTP on a
//! loopback port chosen by the OS. The port is advertised through a small
//! text file so the app can find it.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::ServerError;
use crate::publish::Publisher;

/// Name of the port file written next to the executable.
pub const PORT_FILE_NAME: &str = "port.txt";

/// Builds the query router over `publisher`.
pub fn router(publisher: Arc<Publisher>) -> Router {
    Router::new()
        .route("/status", get(handle_status))
        .route("/last_run", get(handle_last_run))
        .route("/last_run_time", get(handle_last_run_time))
        .route("/submit_run", post(handle_submit_run))
        .with_state(publisher)
}

/// A running query server.
#[derive(Debug)]
pub struct QueryServer {
    pub addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl QueryServer {
    /// Binds `127.0.0.1:<port>` (0 picks a free port) and starts serving.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the listener cannot be bound.
    pub async fn start(
        publisher: Arc<Publisher>,
        port: u16,
        cancel: CancellationToken,
    ) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(("127.0.0.1", port))
            .await
            .map_err(ServerError::Bind)?;
        let addr = listener.local_addr().map_err(ServerError::Bind)?;

        let app = router(publisher);
        let handle = tokio::spawn(async move {
            info!(%addr, "query server started");
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    cancel.cancelled().await;
                })
                .await
                .ok();
            debug!("query server shut down");
        });

        Ok(Self { addr, handle })
    }

    /// Waits for the server task to finish after cancellation.
    pub async fn join(self) {
        let _ = self.handle.await;
    }
}

/// Default port file location: beside the running executable.
#[must_use]
pub fn default_port_file() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_default()
        .join(PORT_FILE_NAME)
}

/// Writes `port` as plain text to `path`.
///
/// # Errors
///
/// Returns [`ServerError::PortFile`] if the file cannot be written.
pub fn write_port_file(path: &Path, port: u16) -> Result<(), ServerError> {
    std::fs::write(path, port.to_string()).map_err(|source| ServerError::PortFile {
        path: path.to_path_buf(),
        source,
    })
}

async fn handle_status(State(publisher): State<Arc<Publisher>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "parser": publisher.latest().status,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn handle_last_run(State(publisher): State<Arc<Publisher>>) -> Json<Value> {
    Json(publisher.last_run_body())
}

async fn handle_last_run_time(State(publisher): State<Arc<Publisher>>) -> Json<Value> {
    Json(publisher.latest().published_at.map_or_else(
        || json!({}),
        |at| json!({ "date": at.to_rfc3339() }),
    ))
}

/// `POST /submit_run`: publishes an externally produced record.
async fn handle_submit_run(
    State(publisher): State<Arc<Publisher>>,
    body: axum::body::Bytes,
) -> Response {
    if body.is_empty() {
        return (StatusCode::BAD_REQUEST, "empty request body").into_response();
    }
    let record: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => return (StatusCode::BAD_REQUEST, format!("invalid JSON: {e}")).into_response(),
    };
    if !record.is_object() {
        return (StatusCode::BAD_REQUEST, "run record must be a JSON object").into_response();
    }
    publisher.publish(record);
    StatusCode::NO_CONTENT.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::util::ServiceExt;

    fn publisher() -> Arc<Publisher> {
        Arc::new(Publisher::new(json!({"status": "", "nickname": ""})))
    }

    async fn body_json(resp: Response) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn status_reports_parser_state() {
        let resp = router(publisher())
            .oneshot(get_request("/status"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["parser"], "LogFileEmpty");
    }

    #[tokio::test]
    async fn last_run_before_any_run_is_the_template() {
        let resp = router(publisher())
            .oneshot(get_request("/last_run"))
            .await
            .unwrap();
        let json = body_json(resp).await;
        assert_eq!(json["status"], "LogFileEmpty");
        assert_eq!(json["nickname"], "");
    }

    #[tokio::test]
    async fn last_run_time_is_empty_until_published() {
        let publisher = publisher();
        let resp = router(Arc::clone(&publisher))
            .oneshot(get_request("/last_run_time"))
            .await
            .unwrap();
        assert_eq!(body_json(resp).await, json!({}));

        publisher.publish(json!({"nickname": "Host"}));
        let resp = router(publisher)
            .oneshot(get_request("/last_run_time"))
            .await
            .unwrap();
        assert!(body_json(resp).await["date"].is_string());
    }

    #[tokio::test]
    async fn submitted_run_is_served_back() {
        let publisher = publisher();
        let req = Request::builder()
            .method("POST")
            .uri("/submit_run")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"nickname":"Pushed","total_duration":280.5}"#))
            .unwrap();
        let resp = router(Arc::clone(&publisher)).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = router(publisher)
            .oneshot(get_request("/last_run"))
            .await
            .unwrap();
        let json = body_json(resp).await;
        assert_eq!(json["nickname"], "Pushed");
    }

    #[tokio::test]
    async fn submit_rejects_bad_bodies() {
        for body in ["", "not json", "[1, 2]"] {
            let req = Request::builder()
                .method("POST")
                .uri("/submit_run")
                .body(Body::from(body))
                .unwrap();
            let resp = router(publisher()).oneshot(req).await.unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body: {body:?}");
        }
    }

    #[tokio::test]
    async fn server_binds_an_ephemeral_port() {
        let cancel = CancellationToken::new();
        let server = QueryServer::start(publisher(), 0, cancel.clone())
            .await
            .unwrap();
        assert!(server.addr.ip().is_loopback());
        assert_ne!(server.addr.port(), 0);
        cancel.cancel();
        server.join().await;
    }

    #[test]
    fn port_file_holds_the_port() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PORT_FILE_NAME);
        write_port_file(&path, 51234).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "51234");
    }
}
