use crate::infra::{AppState, CrawlLauncher, RunService, StartOutcome};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::json;
use staff_directory::departments::SELECTABLE_DEPARTMENTS;
use staff_directory::error::AppError;
use std::sync::Arc;
use tracing::{error, info};

const INDEX_TEMPLATE: &str = include_str!("../assets/index.html");

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RunRequest {
    #[serde(default)]
    pub(crate) departments: Vec<String>,
}

pub(crate) fn run_router<L>(service: Arc<RunService<L>>) -> Router
where
    L: CrawlLauncher + 'static,
{
    Router::new()
        .route("/", get(index_page))
        .route("/run-script", post(run_script_handler::<L>))
        .route("/is-done", get(is_done_handler::<L>))
        .route("/download-result", get(download_handler::<L>))
        .route("/api/v1/departments", get(departments_endpoint))
        .with_state(service)
}

pub(crate) fn with_run_routes<L>(service: Arc<RunService<L>>) -> Router
where
    L: CrawlLauncher + 'static,
{
    run_router(service)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn index_page() -> Html<String> {
    Html(render_index(SELECTABLE_DEPARTMENTS))
}

fn render_index(departments: &[&str]) -> String {
    let checkboxes = departments
        .iter()
        .map(|department| {
            format!(
                "      <label><input type=\"checkbox\" name=\"department\" value=\"{}\"> {}</label>",
                html_escape::encode_double_quoted_attribute(department),
                html_escape::encode_text(department),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    INDEX_TEMPLATE.replace("{{departments}}", &checkboxes)
}

pub(crate) async fn departments_endpoint() -> Json<serde_json::Value> {
    Json(json!({ "departments": SELECTABLE_DEPARTMENTS }))
}

pub(crate) async fn run_script_handler<L>(
    State(service): State<Arc<RunService<L>>>,
    payload: Option<Json<RunRequest>>,
) -> Response
where
    L: CrawlLauncher + 'static,
{
    let RunRequest { departments } = payload.map(|Json(body)| body).unwrap_or_default();
    info!(count = departments.len(), "crawl requested");

    match service.start(departments) {
        Ok(StartOutcome::Started) => {
            (StatusCode::OK, Json(json!({ "status": "Crawler started." }))).into_response()
        }
        Ok(StartOutcome::AlreadyRunning) => (
            StatusCode::CONFLICT,
            Json(json!({ "status": "Crawler already running." })),
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "crawler launch failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response()
        }
    }
}

pub(crate) async fn is_done_handler<L>(
    State(service): State<Arc<RunService<L>>>,
) -> Json<serde_json::Value>
where
    L: CrawlLauncher + 'static,
{
    Json(json!({ "done": service.is_done() }))
}

pub(crate) async fn download_handler<L>(State(service): State<Arc<RunService<L>>>) -> Response
where
    L: CrawlLauncher + 'static,
{
    let report_name = service.workspace().report_name().to_string();
    match service.take_report() {
        Ok(Some(bytes)) => {
            let content_type = mime_guess::from_path(&report_name)
                .first_or_octet_stream()
                .to_string();
            let disposition = format!("attachment; filename=\"{report_name}\"");
            info!(bytes = bytes.len(), "report downloaded");
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, content_type),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                bytes,
            )
                .into_response()
        }
        Ok(None) => (StatusCode::OK, "No report available.").into_response(),
        Err(err) => AppError::Io(err).into_response(),
    }
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::testing::RecordingLauncher;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use staff_directory::config::WorkspaceConfig;
    use staff_directory::workflows::workspace::RunWorkspace;
    use std::path::Path;
    use tempfile::tempdir;
    use tower::ServiceExt;

    struct Harness {
        service: Arc<RunService<Arc<RecordingLauncher>>>,
        launcher: Arc<RecordingLauncher>,
    }

    impl Harness {
        fn new(root: &Path) -> Self {
            let launcher = Arc::new(RecordingLauncher::default());
            let workspace = RunWorkspace::new(WorkspaceConfig {
                download_dir: root.join("downloads"),
                log_file: root.join("script_output.log"),
                report_name: "UofT_Staff_Report.xlsx".to_string(),
            });
            let service = Arc::new(RunService::new(workspace, launcher.clone()));
            Self { service, launcher }
        }

        async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>, Response) {
            let response = with_run_routes(self.service.clone())
                .oneshot(request)
                .await
                .expect("router responds");
            let status = response.status();
            let (parts, body) = response.into_parts();
            let bytes = to_bytes(body, usize::MAX).await.expect("body reads");
            (
                status,
                bytes.to_vec(),
                Response::from_parts(parts, Body::empty()),
            )
        }
    }

    fn trigger(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/run-script")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds")
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request builds")
    }

    fn json_body(bytes: &[u8]) -> serde_json::Value {
        serde_json::from_slice(bytes).expect("json body")
    }

    #[tokio::test]
    async fn trigger_starts_crawler_and_acknowledges_immediately() {
        let root = tempdir().expect("tempdir");
        let harness = Harness::new(root.path());
        std::fs::write(root.path().join("script_output.log"), "previous run").expect("log");

        let (status, body, _) = harness
            .send(trigger(r#"{"departments": ["Discovery Commons", "Med: Office of The Dean"]}"#))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body), json!({ "status": "Crawler started." }));
        assert_eq!(
            harness.launcher.launches(),
            vec![vec![
                "Discovery Commons".to_string(),
                "Med: Office of The Dean".to_string()
            ]]
        );
        assert!(!root.path().join("script_output.log").exists());
        assert!(root.path().join("downloads").is_dir());
    }

    #[tokio::test]
    async fn missing_department_list_launches_an_empty_run() {
        let root = tempdir().expect("tempdir");
        let harness = Harness::new(root.path());

        let (status, _, _) = harness.send(trigger("{}")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(harness.launcher.launches(), vec![Vec::<String>::new()]);
    }

    #[tokio::test]
    async fn overlapping_trigger_is_rejected() {
        let root = tempdir().expect("tempdir");
        let harness = Harness::new(root.path());

        let (first, _, _) = harness.send(trigger(r#"{"departments": []}"#)).await;
        let (second, body, _) = harness.send(trigger(r#"{"departments": []}"#)).await;

        assert_eq!(first, StatusCode::OK);
        assert_eq!(second, StatusCode::CONFLICT);
        assert_eq!(json_body(&body), json!({ "status": "Crawler already running." }));
        assert_eq!(harness.launcher.launches().len(), 1);

        harness.launcher.finish();
        let (third, _, _) = harness.send(trigger(r#"{"departments": []}"#)).await;
        assert_eq!(third, StatusCode::OK);
    }

    #[tokio::test]
    async fn is_done_follows_the_report_file() {
        let root = tempdir().expect("tempdir");
        let harness = Harness::new(root.path());
        harness.send(trigger(r#"{"departments": []}"#)).await;

        let (_, body, _) = harness.send(get_request("/is-done")).await;
        assert_eq!(json_body(&body), json!({ "done": false }));

        let report = harness.service.workspace().report_path();
        std::fs::write(&report, b"workbook").expect("report");

        let (_, body, _) = harness.send(get_request("/is-done")).await;
        assert_eq!(json_body(&body), json!({ "done": true }));
    }

    #[tokio::test]
    async fn download_without_report_is_plain_text() {
        let root = tempdir().expect("tempdir");
        let harness = Harness::new(root.path());

        let (status, body, _) = harness.send(get_request("/download-result")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"No report available.");
    }

    #[tokio::test]
    async fn download_serves_attachment_then_cleans_up() {
        let root = tempdir().expect("tempdir");
        let harness = Harness::new(root.path());
        harness.send(trigger(r#"{"departments": ["Discovery Commons"]}"#)).await;
        let workspace = harness.service.workspace().clone();
        let export = workspace.download_dir().join("Discovery Commons.csv");
        std::fs::write(&export, "Name\nAda\n").expect("export");
        std::fs::write(workspace.log_file(), "crawl log").expect("log");
        std::fs::write(workspace.report_path(), b"PK workbook").expect("report");

        let (status, body, response) = harness.send(get_request("/download-result")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"PK workbook");
        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .expect("content disposition");
        assert_eq!(disposition, "attachment; filename=\"UofT_Staff_Report.xlsx\"");
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .expect("content type");
        assert_eq!(
            content_type,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );

        assert!(!export.exists());
        assert!(!workspace.log_file().exists());
        assert!(!workspace.report_ready());

        let (_, body, _) = harness.send(get_request("/is-done")).await;
        assert_eq!(json_body(&body), json!({ "done": false }));
    }

    #[tokio::test]
    async fn index_lists_every_department_escaped() {
        let root = tempdir().expect("tempdir");
        let harness = Harness::new(root.path());

        let (status, body, _) = harness.send(get_request("/")).await;
        let page = String::from_utf8(body).expect("utf8 page");

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            page.matches("name=\"department\"").count(),
            SELECTABLE_DEPARTMENTS.len()
        );
        assert!(page.contains("Banting &amp; Best Diabetes Centre"));
        assert!(!page.contains("{{departments}}"));
    }

    #[tokio::test]
    async fn departments_endpoint_lists_catalog() {
        let root = tempdir().expect("tempdir");
        let harness = Harness::new(root.path());

        let (_, body, _) = harness.send(get_request("/api/v1/departments")).await;
        let listed = json_body(&body)["departments"]
            .as_array()
            .map(|values| values.len())
            .unwrap_or_default();

        assert_eq!(listed, SELECTABLE_DEPARTMENTS.len());
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body, json!({ "status": "ok" }));
    }
}
