use std::sync::Arc;

use axum::{
    Router,
    extract::{Json, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::Args;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::core::{
    ApprovedRateEntry, ChartPoint, DEFAULT_CHART_WINDOW, DashboardInputs, DashboardReport,
    DashboardSettings, FiscalYear, ProjectionInput, ProjectionResult, RateSchedule,
    available_target_years, build_dashboard, chart_series, project_with_approved_rates,
    project_with_custom_fallback,
};
use crate::error::AppError;
use crate::provider::{RateDataset, RateProvider, spawn_refresh_loop};

const MAX_CUSTOM_ANNUAL_RATE: f64 = 50.0;

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<RateProvider>,
    pub schedule: Arc<RateSchedule>,
    pub settings: Arc<DashboardSettings>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionMode {
    Approved,
    Custom,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiProjectionMode {
    #[serde(alias = "bor", alias = "approvedOnly", alias = "approved-only")]
    Approved,
    #[serde(alias = "what-if", alias = "whatIf", alias = "custom-fallback")]
    Custom,
}

impl From<ApiProjectionMode> for ProjectionMode {
    fn from(value: ApiProjectionMode) -> Self {
        match value {
            ApiProjectionMode::Approved => ProjectionMode::Approved,
            ApiProjectionMode::Custom => ProjectionMode::Custom,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    current_rate: Option<f64>,
    baseline_rate: Option<f64>,
    custom_annual_rate: Option<f64>,
    target_year: Option<String>,
    mode: Option<ApiProjectionMode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct DashboardPayload {
    single_rate: Option<f64>,
    double_rate: Option<f64>,
    board_rate: Option<f64>,
    custom_annual_rate: Option<f64>,
    target_year: Option<String>,
}

/// Inputs for a single projection, shared by the `project` subcommand and `/api/project`.
#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    #[arg(long, help = "Rate at the start of the fiscal-year sequence")]
    pub current_rate: f64,
    #[arg(long, help = "Baseline-year rate that recovery is measured against")]
    pub baseline_rate: f64,
    #[arg(
        long = "custom-rate",
        default_value_t = 5.0,
        help = "Annual increase in percent for years without an approved rate"
    )]
    pub custom_annual_rate: f64,
    #[arg(long, default_value = "FY30", help = "Last fiscal year to project to")]
    pub target_year: String,
    #[arg(
        long,
        default_value_t = false,
        help = "Only apply board-approved rates; years without one hold the rate flat"
    )]
    pub approved_only: bool,
}

#[derive(Debug, Clone)]
pub struct ProjectionRequest {
    pub mode: ProjectionMode,
    pub input: ProjectionInput,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub mode: ProjectionMode,
    pub target_year: FiscalYear,
    pub current_rate: f64,
    pub baseline_rate: f64,
    pub custom_annual_rate_percent: Option<f64>,
    #[serde(flatten)]
    pub projection: ProjectionResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DatasetResponse {
    #[serde(flatten)]
    dataset: RateDataset,
    fiscal_years: Vec<FiscalYear>,
    approved_rates: Vec<ApprovedRateEntry>,
    chart: Vec<ChartPoint>,
    available_target_years: Vec<FiscalYear>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub fn build_projection_request(args: ProjectArgs) -> Result<ProjectionRequest, String> {
    if !args.current_rate.is_finite() || args.current_rate < 0.0 {
        return Err("--current-rate must be >= 0".to_string());
    }

    if !args.baseline_rate.is_finite() || args.baseline_rate < 0.0 {
        return Err("--baseline-rate must be >= 0".to_string());
    }

    validate_custom_rate(args.custom_annual_rate)?;

    let mode = if args.approved_only {
        ProjectionMode::Approved
    } else {
        ProjectionMode::Custom
    };

    Ok(ProjectionRequest {
        mode,
        input: ProjectionInput {
            current_rate: args.current_rate,
            baseline_rate: args.baseline_rate,
            custom_annual_rate_percent: args.custom_annual_rate,
            target_year: FiscalYear::new(&args.target_year),
        },
    })
}

fn validate_custom_rate(rate: f64) -> Result<(), String> {
    if !rate.is_finite() || !(0.0..=MAX_CUSTOM_ANNUAL_RATE).contains(&rate) {
        return Err(format!(
            "--custom-rate must be between 0 and {MAX_CUSTOM_ANNUAL_RATE}"
        ));
    }
    Ok(())
}

pub fn run_projection(schedule: &RateSchedule, request: &ProjectionRequest) -> ProjectResponse {
    let input = &request.input;
    let projection = match request.mode {
        ProjectionMode::Approved => project_with_approved_rates(
            schedule,
            input.current_rate,
            input.baseline_rate,
            &input.target_year,
        ),
        ProjectionMode::Custom => project_with_custom_fallback(schedule, input),
    };

    ProjectResponse {
        mode: request.mode,
        target_year: input.target_year.clone(),
        current_rate: input.current_rate,
        baseline_rate: input.baseline_rate,
        custom_annual_rate_percent: match request.mode {
            ProjectionMode::Approved => None,
            ProjectionMode::Custom => Some(input.custom_annual_rate_percent),
        },
        projection,
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/dataset", get(dataset_handler))
        .route("/api/dataset/refresh", post(refresh_handler))
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .route(
            "/api/dashboard",
            get(dashboard_get_handler).post(dashboard_post_handler),
        )
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(config: AppConfig) -> Result<(), AppError> {
    let provider = Arc::new(RateProvider::from_config(&config.provider)?);
    let refresh_task = spawn_refresh_loop(provider.clone(), config.provider.refresh_interval);

    let state = AppState {
        provider,
        schedule: Arc::new(config.schedule.clone()),
        settings: Arc::new(DashboardSettings::default()),
    };

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!(
        environment = ?config.environment,
        %addr,
        source = config.provider.source_url.as_deref().unwrap_or("built-in"),
        "rate recovery API listening"
    );

    let served = axum::serve(listener, router(state)).await;
    refresh_task.abort();
    served?;
    Ok(())
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn dataset_handler(State(state): State<AppState>) -> Response {
    let dataset = state.provider.snapshot().await;
    json_response(StatusCode::OK, build_dataset_response(&state.schedule, dataset))
}

async fn refresh_handler(State(state): State<AppState>) -> Response {
    let dataset = state.provider.refresh().await;
    json_response(StatusCode::OK, build_dataset_response(&state.schedule, dataset))
}

async fn project_get_handler(
    State(state): State<AppState>,
    Query(payload): Query<ProjectPayload>,
) -> Response {
    project_handler_impl(&state, payload).await
}

async fn project_post_handler(
    State(state): State<AppState>,
    Json(payload): Json<ProjectPayload>,
) -> Response {
    project_handler_impl(&state, payload).await
}

async fn project_handler_impl(state: &AppState, payload: ProjectPayload) -> Response {
    let dataset = state.provider.snapshot().await;
    let request = match projection_request_from_payload(payload, &dataset, &state.settings) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    debug!(mode = ?request.mode, target_year = %request.input.target_year, "projecting rate");
    json_response(StatusCode::OK, run_projection(&state.schedule, &request))
}

async fn dashboard_get_handler(
    State(state): State<AppState>,
    Query(payload): Query<DashboardPayload>,
) -> Response {
    dashboard_handler_impl(&state, payload).await
}

async fn dashboard_post_handler(
    State(state): State<AppState>,
    Json(payload): Json<DashboardPayload>,
) -> Response {
    dashboard_handler_impl(&state, payload).await
}

async fn dashboard_handler_impl(state: &AppState, payload: DashboardPayload) -> Response {
    let dataset = state.provider.snapshot().await;
    let inputs = match dashboard_inputs_from_payload(payload, &dataset, &state.settings) {
        Ok(inputs) => inputs,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    let report: DashboardReport = build_dashboard(&state.settings, &state.schedule, &inputs);
    json_response(StatusCode::OK, report)
}

fn build_dataset_response(schedule: &RateSchedule, dataset: RateDataset) -> DatasetResponse {
    DatasetResponse {
        fiscal_years: schedule.years.years().to_vec(),
        approved_rates: schedule.approved.in_sequence_order(&schedule.years),
        chart: chart_series(&dataset.historical, &schedule.approved, DEFAULT_CHART_WINDOW),
        available_target_years: available_target_years(&dataset.historical, schedule),
        dataset,
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn projection_request_from_json(json: &str) -> Result<ProjectionRequest, String> {
    let payload = serde_json::from_str::<ProjectPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    projection_request_from_payload(
        payload,
        &RateDataset::built_in(),
        &DashboardSettings::default(),
    )
}

fn projection_request_from_payload(
    payload: ProjectPayload,
    dataset: &RateDataset,
    settings: &DashboardSettings,
) -> Result<ProjectionRequest, String> {
    let mut args = default_project_args(dataset, settings);

    if let Some(v) = payload.current_rate {
        args.current_rate = v;
    }
    if let Some(v) = payload.baseline_rate {
        args.baseline_rate = v;
    }
    if let Some(v) = payload.custom_annual_rate {
        args.custom_annual_rate = v;
    }
    if let Some(v) = payload.target_year {
        args.target_year = v;
    }
    if let Some(v) = payload.mode {
        args.approved_only = ProjectionMode::from(v) == ProjectionMode::Approved;
    }

    build_projection_request(args).map_err(|msg| api_field_names(&msg))
}

fn api_field_names(msg: &str) -> String {
    msg.replace("--current-rate", "currentRate")
        .replace("--baseline-rate", "baselineRate")
        .replace("--custom-rate", "customAnnualRate")
}

fn default_project_args(dataset: &RateDataset, settings: &DashboardSettings) -> ProjectArgs {
    ProjectArgs {
        current_rate: dataset.current_rates.single,
        baseline_rate: settings.single.baseline_rate,
        custom_annual_rate: settings.default_custom_annual_rate_percent,
        target_year: settings.default_target_year.to_string(),
        approved_only: false,
    }
}

fn dashboard_inputs_from_payload(
    payload: DashboardPayload,
    dataset: &RateDataset,
    settings: &DashboardSettings,
) -> Result<DashboardInputs, String> {
    let inputs = DashboardInputs {
        single_rate: payload.single_rate.unwrap_or(dataset.current_rates.single),
        double_rate: payload.double_rate.unwrap_or(dataset.current_rates.double),
        board_rate: payload.board_rate.unwrap_or(settings.default_board_rate),
        custom_annual_rate_percent: payload
            .custom_annual_rate
            .unwrap_or(settings.default_custom_annual_rate_percent),
        target_year: payload
            .target_year
            .map(FiscalYear::new)
            .unwrap_or_else(|| settings.default_target_year.clone()),
    };

    for (name, rate) in [
        ("singleRate", inputs.single_rate),
        ("doubleRate", inputs.double_rate),
        ("boardRate", inputs.board_rate),
    ] {
        if !rate.is_finite() || rate < 0.0 {
            return Err(format!("{name} must be >= 0"));
        }
    }
    validate_custom_rate(inputs.custom_annual_rate_percent).map_err(|msg| api_field_names(&msg))?;

    Ok(inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CurrentRates, RoomType};
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_args() -> ProjectArgs {
        default_project_args(&RateDataset::built_in(), &DashboardSettings::default())
    }

    fn test_state() -> AppState {
        AppState {
            provider: Arc::new(RateProvider::new(None)),
            schedule: Arc::new(RateSchedule::default()),
            settings: Arc::new(DashboardSettings::default()),
        }
    }

    async fn read_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        serde_json::from_slice(&bytes).expect("body is JSON")
    }

    #[test]
    fn build_projection_request_rejects_negative_rates() {
        let mut args = sample_args();
        args.current_rate = -1.0;
        let err = build_projection_request(args).expect_err("must reject negative rate");
        assert!(err.contains("--current-rate"));

        let mut args = sample_args();
        args.baseline_rate = f64::INFINITY;
        let err = build_projection_request(args).expect_err("must reject infinite baseline");
        assert!(err.contains("--baseline-rate"));
    }

    #[test]
    fn build_projection_request_rejects_out_of_range_custom_rate() {
        let mut args = sample_args();
        args.custom_annual_rate = 50.5;
        let err = build_projection_request(args).expect_err("must reject > 50");
        assert!(err.contains("--custom-rate"));
    }

    #[test]
    fn build_projection_request_keeps_unknown_years_for_identity_projection() {
        let mut args = sample_args();
        args.target_year = "fy40".to_string();
        let request = build_projection_request(args).expect("unknown years are not an error");
        assert_eq!(request.input.target_year.as_str(), "FY40");

        let response = run_projection(&RateSchedule::default(), &request);
        assert_eq!(response.projection.breakdown.len(), 1);
        assert_approx(response.projection.projected_rate, request.input.current_rate);
    }

    #[test]
    fn projection_request_from_json_parses_web_keys() {
        let json = r#"{
          "currentRate": 4300,
          "baselineRate": 3748.55,
          "customAnnualRate": 3.5,
          "targetYear": "FY28",
          "mode": "bor"
        }"#;
        let request = projection_request_from_json(json).expect("json should parse");
        assert_eq!(request.mode, ProjectionMode::Approved);
        assert_approx(request.input.current_rate, 4300.0);
        assert_approx(request.input.custom_annual_rate_percent, 3.5);
        assert_eq!(request.input.target_year.as_str(), "FY28");
    }

    #[test]
    fn projection_request_from_json_uses_defaults_and_api_field_names() {
        let request = projection_request_from_json("{}").expect("defaults are valid");
        assert_eq!(request.mode, ProjectionMode::Custom);
        assert_approx(request.input.current_rate, 4192.0);
        assert_approx(request.input.baseline_rate, 3748.55);
        assert_eq!(request.input.target_year.as_str(), "FY30");

        let err = projection_request_from_json(r#"{"customAnnualRate": -2}"#)
            .expect_err("negative custom rate rejected");
        assert!(err.contains("customAnnualRate"));
    }

    #[test]
    fn projection_defaults_follow_loaded_current_rates() {
        let dataset = RateDataset {
            current_rates: CurrentRates {
                single: 4450.0,
                double: 3520.0,
            },
            ..RateDataset::built_in()
        };
        let request = projection_request_from_payload(
            ProjectPayload::default(),
            &dataset,
            &DashboardSettings::default(),
        )
        .expect("defaults are valid");
        assert_approx(request.input.current_rate, 4450.0);

        let dashboard = dashboard_inputs_from_payload(
            DashboardPayload::default(),
            &dataset,
            &DashboardSettings::default(),
        )
        .expect("defaults are valid");
        assert_approx(dashboard.single_rate, request.input.current_rate);
    }

    #[test]
    fn project_response_serialization_contains_expected_fields() {
        let request = build_projection_request(sample_args()).expect("valid inputs");
        let response = run_projection(&RateSchedule::default(), &request);
        let json = serde_json::to_string(&response).expect("response should serialize");
        assert!(json.contains("\"mode\":\"custom\""));
        assert!(json.contains("\"projectedRate\""));
        assert!(json.contains("\"inflationAdjustedBaseline\""));
        assert!(json.contains("\"fullyRecovered\""));
        assert!(json.contains("\"stillToRecover\""));
        assert!(json.contains("\"appliedRateLabel\":\"5% (Custom)\""));
    }

    #[test]
    fn approved_mode_omits_custom_rate() {
        let mut args = sample_args();
        args.approved_only = true;
        let request = build_projection_request(args).expect("valid inputs");
        let response = run_projection(&RateSchedule::default(), &request);
        assert_eq!(response.custom_annual_rate_percent, None);
        assert_eq!(
            response.projection.breakdown[5].applied_rate_label,
            "No Approved Rate"
        );
    }

    #[test]
    fn dashboard_inputs_default_to_dataset_current_rates() {
        let dataset = RateDataset::built_in();
        let inputs = dashboard_inputs_from_payload(
            DashboardPayload::default(),
            &dataset,
            &DashboardSettings::default(),
        )
        .expect("defaults are valid");
        assert_approx(inputs.single_rate, 4192.0);
        assert_approx(inputs.double_rate, 3341.0);
        assert_approx(inputs.board_rate, 3500.0);
        assert_eq!(inputs.target_year.as_str(), "FY30");

        let err = dashboard_inputs_from_payload(
            DashboardPayload {
                board_rate: Some(-10.0),
                ..DashboardPayload::default()
            },
            &dataset,
            &DashboardSettings::default(),
        )
        .expect_err("negative board rate rejected");
        assert!(err.contains("boardRate"));
    }

    #[tokio::test]
    async fn project_route_accepts_query_parameters() {
        let response = router(test_state())
            .oneshot(
                Request::get("/api/project?currentRate=1000&baselineRate=900&targetYear=FY29&mode=approved")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).map(|v| v.as_bytes()),
            Some(&b"no-store"[..])
        );
        let payload = read_json(response).await;
        assert_eq!(payload["breakdown"].as_array().map(Vec::len), Some(5));
        assert_approx(
            payload["projectedRate"].as_f64().expect("number"),
            1000.0 * 1.05 * 1.045 * 1.06 * 1.09,
        );
    }

    #[tokio::test]
    async fn project_route_rejects_invalid_json_values() {
        let response = router(test_state())
            .oneshot(
                Request::post("/api/project")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"currentRate": -5}"#))
                    .expect("request builds"),
            )
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let payload = read_json(response).await;
        assert!(payload["error"].as_str().is_some_and(|msg| msg.contains("currentRate")));
    }

    #[tokio::test]
    async fn dashboard_route_reports_every_room_type() {
        let response = router(test_state())
            .oneshot(
                Request::post("/api/dashboard")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"boardRate": 3600, "targetYear": "FY30"}"#))
                    .expect("request builds"),
            )
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        let payload = read_json(response).await;
        let rooms = payload["rooms"].as_array().expect("rooms array");
        assert_eq!(rooms.len(), RoomType::ALL.len());
        assert_eq!(rooms[2]["roomType"], "board");
        assert_eq!(rooms[2]["gap"]["currentRate"], 3600.0);
        assert_eq!(
            rooms[0]["customProjection"]["breakdown"][5]["appliedRateLabel"],
            "5% (Custom)"
        );
    }

    #[tokio::test]
    async fn dataset_route_includes_chart_and_approved_rates() {
        let response = router(test_state())
            .oneshot(
                Request::get("/api/dataset")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        let payload = read_json(response).await;
        assert_eq!(payload["source"], "default");
        assert_eq!(payload["chart"].as_array().map(Vec::len), Some(8));
        assert_eq!(payload["approvedRates"][0]["year"], "FY25");
        assert_eq!(payload["availableTargetYears"][0], "FY25");
        assert_eq!(payload["fiscalYears"].as_array().map(Vec::len), Some(6));
    }

    #[tokio::test]
    async fn unknown_route_returns_json_not_found() {
        let response = router(test_state())
            .oneshot(
                Request::get("/nope")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let payload = read_json(response).await;
        assert_eq!(payload["error"], "Not found");
    }
}
