use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use sheet_profiler::{build_app, config::Config, services::ChartKind, AppState};

const BOUNDARY: &str = "sheet-profiler-test-boundary";

struct TestApp {
    _dir: TempDir,
    state: Arc<AppState>,
    app: Router,
}

impl TestApp {
    fn new() -> Self {
        Self::with_config(|_| {})
    }

    fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config {
            upload_dir: dir.path().join("tmp"),
            static_dir: dir.path().join("static"),
            chart_width: 320,
            chart_height: 240,
            ..Config::default()
        };
        adjust(&mut config);

        let state = Arc::new(AppState::new(config).unwrap());
        state.charts.prepare().unwrap();
        let app = build_app(state.clone());
        Self { _dir: dir, state, app }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    async fn get(&self, uri: &str) -> (StatusCode, String) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn upload(&self, file_name: &str, data: &[u8]) -> (StatusCode, String) {
        self.send(multipart_request("file", file_name, data)).await
    }

    fn files(&self, kind: ChartKind) -> Vec<String> {
        self.state.charts.list(kind).unwrap().unwrap()
    }
}

fn multipart_request(field: &str, file_name: &str, data: &[u8]) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: text/csv\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/process_file")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn health_check_responds() {
    let app = TestApp::new();
    assert_eq!(app.get("/health").await, (StatusCode::OK, "OK".to_string()));
}

#[tokio::test]
async fn numeric_upload_renders_numeric_charts_only() {
    let app = TestApp::new();
    let (status, body) = app.upload("scores.csv", b"a,b\n1,2.5\n2,3.5\n3,1.0\n4,8.0\n").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("4 rows x 2 columns"));
    assert!(body.contains("No missing data."));
    assert_eq!(app.files(ChartKind::Histogram), vec!["histogram_a.png", "histogram_b.png"]);
    assert_eq!(app.files(ChartKind::BoxPlot), vec!["box_plots_a.png", "box_plots_b.png"]);
    assert_eq!(app.files(ChartKind::Correlation), vec!["correlation_matrix.png"]);
    assert!(app.files(ChartKind::Bar).is_empty());

    let (status, _) = app.get("/static/histograms/histogram_a.png").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn text_upload_renders_bar_charts_only() {
    let app = TestApp::new();
    let (status, _) = app
        .upload("cities.csv", b"city,color\nLima,red\nQuito,blue\nLima,red\n")
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.files(ChartKind::Bar), vec!["bar_plots_city.png", "bar_plots_color.png"]);
    assert!(app.files(ChartKind::Histogram).is_empty());
    assert!(app.files(ChartKind::BoxPlot).is_empty());
    assert!(app.files(ChartKind::Correlation).is_empty());

    let (_, gallery) = app.get("/bar_plots").await;
    assert!(gallery.contains("/static/bar_plots/bar_plots_city.png"));
}

#[tokio::test]
async fn non_csv_upload_is_rejected_without_side_effects() {
    let app = TestApp::new();
    app.upload("first.csv", b"a\n1\n2\n").await;

    let (status, body) = app.upload("data.txt", b"b\n5\n6\n").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Invalid file. Please upload a CSV file.");
    assert_eq!(app.state.session.current().unwrap().display_name, "first.csv");
    assert_eq!(app.files(ChartKind::Histogram), vec!["histogram_a.png"]);
    assert!(!app.state.config.upload_dir.join("data.txt").exists());
}

#[tokio::test]
async fn second_upload_with_the_same_name_replaces_the_first() {
    let app = TestApp::new();
    app.upload("data.csv", b"a\n1\n1\n1\n1\n1\n").await;
    let (_, details) = app.get("/details").await;
    assert!(details.contains("5 rows x 1 columns"));
    assert!(details.contains("<strong>Duplicate rows:</strong> 4"));

    app.upload("data.csv", b"x,y\n1,a\n2,b\n3,c\n").await;
    let (_, details) = app.get("/details").await;
    assert!(details.contains("3 rows x 2 columns"));
    assert!(details.contains("<strong>Duplicate rows:</strong> 0"));
    assert_eq!(app.files(ChartKind::Histogram), vec!["histogram_x.png"]);
}

#[tokio::test]
async fn landing_page_clears_charts_but_not_the_session() {
    let app = TestApp::new();
    app.upload("scores.csv", b"a,label\n1,x\n2,y\n").await;
    assert!(!app.files(ChartKind::Histogram).is_empty());

    assert!(app.state.config.upload_dir.join("scores.csv").is_file());

    let (status, _) = app.get("/").await;
    assert_eq!(status, StatusCode::OK);

    let uploads = std::fs::read_dir(&app.state.config.upload_dir).unwrap().count();
    assert_eq!(uploads, 0);
    for kind in ChartKind::ALL {
        assert!(app.files(kind).is_empty());
        let (status, gallery) = app.get(&format!("/{}", kind.dir_name())).await;
        assert_eq!(status, StatusCode::OK);
        assert!(gallery.contains("No charts have been generated yet."));
    }
    let (_, details) = app.get("/details").await;
    assert!(details.contains("scores.csv"));
    assert!(details.contains("2 rows x 2 columns"));
}

#[tokio::test]
async fn missing_counts_differ_between_summary_and_details() {
    let app = TestApp::new();
    let (_, summary) = app.upload("gaps.csv", b"a,b\n1,\n2,3\n").await;

    assert!(summary.contains("<td>b</td><td>1</td>"));
    assert!(!summary.contains("<td>a</td><td>0</td>"));
    assert!(!summary.contains("No missing data."));

    let (_, details) = app.get("/details").await;
    assert!(details.contains("<td>a</td><td>0</td>"));
    assert!(details.contains("<td>b</td><td>1</td>"));
}

#[tokio::test]
async fn undecodable_upload_is_a_bad_request() {
    let app = TestApp::with_config(|config| config.encoding_sample_bytes = 8);
    let mut data = b"a,b\n1,2\n".to_vec();
    data.extend_from_slice(&[b'3', b',', 0xFF, b'\n']);

    let (status, body) = app.upload("broken.csv", &data).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Error loading the CSV");
    assert!(app.state.session.current().is_none());
}

#[tokio::test]
async fn missing_gallery_directory_is_reported_as_text() {
    let app = TestApp::new();
    std::fs::remove_dir_all(app.state.charts.dir(ChartKind::Histogram)).unwrap();

    let (status, body) = app.get("/histograms").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "The histograms directory does not exist.");
}

#[tokio::test]
async fn empty_file_name_redirects_to_the_form() {
    let app = TestApp::new();
    let response = app
        .app
        .clone()
        .oneshot(multipart_request("file", "", b""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/process");
}

#[tokio::test]
async fn upload_without_a_file_part_is_a_bad_request() {
    let app = TestApp::new();

    let (status, _) = app.send(multipart_request("other", "data.csv", b"a\n1\n")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.get("/process_file").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn details_placeholder_before_any_upload() {
    let app = TestApp::new();
    let (status, body) = app.get("/details").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("No data has been uploaded yet."));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_uploads_leave_one_consistent_chart_set() {
    let app = TestApp::new();

    let (left, right) = tokio::join!(
        app.upload("left.csv", b"a\n1\n2\n3\n"),
        app.upload("right.csv", b"x,y,city\n1,2,Lima\n3,5,Quito\n4,4,Lima\n"),
    );
    assert_eq!(left.0, StatusCode::OK);
    assert_eq!(right.0, StatusCode::OK);

    let winner = app.state.session.current().unwrap().display_name.clone();
    let histograms = app.files(ChartKind::Histogram);
    let box_plots = app.files(ChartKind::BoxPlot);
    let bars = app.files(ChartKind::Bar);
    match winner.as_str() {
        "left.csv" => {
            assert_eq!(histograms, vec!["histogram_a.png"]);
            assert_eq!(box_plots, vec!["box_plots_a.png"]);
            assert!(bars.is_empty());
        }
        "right.csv" => {
            assert_eq!(histograms, vec!["histogram_x.png", "histogram_y.png"]);
            assert_eq!(box_plots, vec!["box_plots_x.png", "box_plots_y.png"]);
            assert_eq!(bars, vec!["bar_plots_city.png"]);
        }
        other => panic!("unexpected dataset {}", other),
    }
    assert_eq!(app.files(ChartKind::Correlation), vec!["correlation_matrix.png"]);

    let manifest = &app.state.session.current().unwrap().manifest;
    assert_eq!(manifest.len(), histograms.len() + box_plots.len() + bars.len() + 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reset_racing_an_upload_never_leaves_a_partial_set() {
    let app = TestApp::new();

    let (upload, landing) = tokio::join!(
        app.upload("scores.csv", b"a,b\n1,2\n3,4\n5,7\n"),
        app.get("/"),
    );
    assert_eq!(upload.0, StatusCode::OK);
    assert_eq!(landing.0, StatusCode::OK);

    let charts: usize = ChartKind::ALL.iter().map(|kind| app.files(*kind).len()).sum();
    assert!(charts == 0 || charts == 5, "partial chart set: {}", charts);
}

#[tokio::test]
async fn staged_renders_are_not_served() {
    let app = TestApp::new();
    app.upload("scores.csv", b"a\n1\n2\n").await;

    let entries: Vec<String> = std::fs::read_dir(app.state.charts.static_root())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert!(entries.iter().all(|name| !name.starts_with('.')), "{:?}", entries);

    let (status, _) = app.get("/static/../.chart-staging/").await;
    assert_ne!(status, StatusCode::OK);
}
