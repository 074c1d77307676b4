use axum::{
    Router,
    extract::Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::OnceLock;
use tokio::net::TcpListener;

use crate::catalog::Catalog;
use crate::core::{
    CalculationResult, FleetError, FleetSelection, IssueKind, MAX_ENTRY_AMOUNT, Plan,
    ValidationIssue,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliPlan {
    J7,
    J9,
}

impl From<CliPlan> for Plan {
    fn from(value: CliPlan) -> Self {
        match value {
            CliPlan::J7 => Plan::JSeven,
            CliPlan::J9 => Plan::JNine,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
enum ApiPlan {
    #[serde(alias = "jseven", alias = "j-seven")]
    J7,
    #[serde(alias = "jnine", alias = "j-nine")]
    J9,
}

impl From<ApiPlan> for CliPlan {
    fn from(value: ApiPlan) -> Self {
        match value {
            ApiPlan::J7 => CliPlan::J7,
            ApiPlan::J9 => CliPlan::J9,
        }
    }
}

impl From<Plan> for ApiPlan {
    fn from(value: Plan) -> Self {
        match value {
            Plan::JSeven => ApiPlan::J7,
            Plan::JNine => ApiPlan::J9,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "tfvcalc",
    about = "Lease-vs-purchase cost comparison for small vehicle fleets on fixed-term transfer plans"
)]
struct Cli {
    #[arg(long, value_enum, default_value_t = CliPlan::J7)]
    plan: CliPlan,
    #[arg(
        long,
        default_value_t = 70_000,
        help = "Per-vehicle miscellaneous fee in yen"
    )]
    misc_fee: i64,
    #[arg(long, default_value_t = 10.0, help = "Consumption tax rate in percent")]
    tax_rate: f64,
}

#[derive(Debug, Clone, Copy)]
struct Settings {
    plan: Plan,
    misc_fee_per_vehicle: i64,
    tax_rate: f64,
}

fn build_settings(cli: Cli) -> Result<Settings, String> {
    if !(0..=MAX_ENTRY_AMOUNT).contains(&cli.misc_fee) {
        return Err(format!(
            "--misc-fee must be between 0 and {MAX_ENTRY_AMOUNT}"
        ));
    }

    if !(0.0..=100.0).contains(&cli.tax_rate) {
        return Err("--tax-rate must be between 0 and 100".to_string());
    }

    Ok(Settings {
        plan: cli.plan.into(),
        misc_fee_per_vehicle: cli.misc_fee,
        tax_rate: cli.tax_rate / 100.0,
    })
}

fn default_cli_for_api() -> Cli {
    Cli {
        plan: CliPlan::J7,
        misc_fee: 70_000,
        tax_rate: 10.0,
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CalculatePayload {
    plan: Option<ApiPlan>,
    misc_fee: Option<i64>,
    tax_rate: Option<f64>,
    vehicles: Vec<VehiclePayload>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct VehiclePayload {
    model: Option<String>,
    options: Vec<OptionPayload>,
    resale_value: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct OptionPayload {
    name: String,
    price: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CalculateResponse {
    plan: ApiPlan,
    plan_label: &'static str,
    total_term_months: u32,
    fleet_size: usize,
    misc_fee_per_vehicle: i64,
    tax_rate: f64,
    result: CalculationResult,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidationErrorResponse {
    error: String,
    issues: Vec<ValidationIssue>,
}

fn catalog() -> &'static Catalog {
    static CATALOG: OnceLock<Catalog> = OnceLock::new();
    CATALOG.get_or_init(Catalog::builtin)
}

/// How a payload gets refused: `Message` covers malformed requests (400),
/// `Issues` carries the same slot-addressed list the calculate gate
/// produces, so option-row problems land as 422 like missing resale input.
#[derive(Debug)]
enum PayloadRejection {
    Message(String),
    Issues(Vec<ValidationIssue>),
}

impl From<FleetError> for PayloadRejection {
    fn from(value: FleetError) -> Self {
        PayloadRejection::Message(value.to_string())
    }
}

impl From<String> for PayloadRejection {
    fn from(value: String) -> Self {
        PayloadRejection::Message(value)
    }
}

fn fleet_from_payload(
    payload: CalculatePayload,
    catalog: &Catalog,
) -> Result<FleetSelection, PayloadRejection> {
    let mut cli = default_cli_for_api();
    if let Some(v) = payload.plan {
        cli.plan = v.into();
    }
    if let Some(v) = payload.misc_fee {
        cli.misc_fee = v;
    }
    if let Some(v) = payload.tax_rate {
        cli.tax_rate = v;
    }
    let settings = build_settings(cli)?;

    let mut fleet = FleetSelection::new(settings.plan);
    fleet.set_misc_fee(settings.misc_fee_per_vehicle);
    fleet.set_tax_rate(settings.tax_rate);

    let mut issues = Vec::new();
    for (position, vehicle) in payload.vehicles.into_iter().enumerate() {
        let slot_id = fleet.add_slot(catalog, vehicle.model.as_deref())?;
        for option in vehicle.options {
            match fleet.add_option(slot_id, &option.name, option.price) {
                Ok(_) => {}
                Err(err @ FleetError::InvalidOptionPrice(_)) => issues.push(ValidationIssue {
                    slot_id,
                    position,
                    kind: IssueKind::InvalidOptionPrice,
                    message: err.to_string(),
                }),
                Err(other) => return Err(other.into()),
            }
        }
        if let Some(value) = vehicle.resale_value {
            match fleet.set_resale_value(slot_id, value) {
                Ok(()) => {}
                // Left unset; the calculate gate reports it against the
                // slot when the position requires a resale value.
                Err(FleetError::InvalidResaleValue(_)) => {}
                Err(other) => return Err(other.into()),
            }
        }
    }
    if !issues.is_empty() {
        return Err(PayloadRejection::Issues(issues));
    }

    Ok(fleet)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/api/catalog", get(catalog_handler))
        .route("/api/calculate", post(calculate_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("tfvcalc HTTP API listening on http://{addr}");
    tracing::info!("local access: http://127.0.0.1:{port}/api/catalog");

    axum::serve(listener, app).await
}

async fn catalog_handler() -> Response {
    json_response(StatusCode::OK, catalog().models())
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn calculate_handler(Json(payload): Json<CalculatePayload>) -> Response {
    let mut fleet = match fleet_from_payload(payload, catalog()) {
        Ok(fleet) => fleet,
        Err(PayloadRejection::Message(msg)) => {
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
        Err(PayloadRejection::Issues(issues)) => return blocked_response(issues),
    };

    let outcome = fleet.calculate(catalog()).map(CalculationResult::clone);
    match outcome {
        Ok(result) => {
            let status = if result.is_rejected() {
                StatusCode::UNPROCESSABLE_ENTITY
            } else {
                StatusCode::OK
            };
            let response = build_calculate_response(&fleet, result);
            json_response(status, response)
        }
        Err(issues) => blocked_response(issues),
    }
}

fn blocked_response(issues: Vec<ValidationIssue>) -> Response {
    json_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        ValidationErrorResponse {
            error: "calculation blocked by per-vehicle validation".to_string(),
            issues,
        },
    )
}

fn build_calculate_response(fleet: &FleetSelection, result: CalculationResult) -> CalculateResponse {
    let plan = fleet.plan();
    CalculateResponse {
        plan: plan.into(),
        plan_label: plan.label(),
        total_term_months: plan.total_term_months(),
        fleet_size: fleet.slots().len(),
        misc_fee_per_vehicle: fleet.misc_fee_per_vehicle(),
        tax_rate: fleet.tax_rate(),
        result,
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
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
fn fleet_from_json(json: &str) -> Result<FleetSelection, PayloadRejection> {
    let payload = serde_json::from_str::<CalculatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    fleet_from_payload(payload, catalog())
}

#[cfg(test)]
mod tests {
    use super::*;

    impl PayloadRejection {
        fn message(self) -> String {
            match self {
                PayloadRejection::Message(msg) => msg,
                PayloadRejection::Issues(issues) => panic!("expected a message, got {issues:?}"),
            }
        }

        fn issues(self) -> Vec<ValidationIssue> {
            match self {
                PayloadRejection::Issues(issues) => issues,
                PayloadRejection::Message(msg) => panic!("expected issues, got '{msg}'"),
            }
        }
    }

    #[test]
    fn build_settings_rejects_out_of_range_misc_fee() {
        let mut cli = default_cli_for_api();
        cli.misc_fee = -1;
        let err = build_settings(cli).expect_err("must reject negative fee");
        assert!(err.contains("--misc-fee"));

        let mut cli = default_cli_for_api();
        cli.misc_fee = MAX_ENTRY_AMOUNT + 1;
        let err = build_settings(cli).expect_err("must reject oversized fee");
        assert!(err.contains("--misc-fee"));
    }

    #[test]
    fn build_settings_rejects_out_of_range_tax_rate() {
        let mut cli = default_cli_for_api();
        cli.tax_rate = 130.0;
        let err = build_settings(cli).expect_err("must reject tax rate over 100");
        assert!(err.contains("--tax-rate"));
    }

    #[test]
    fn build_settings_converts_percent_to_rate() {
        let settings = build_settings(default_cli_for_api()).expect("valid defaults");
        assert_eq!(settings.plan, Plan::JSeven);
        assert_eq!(settings.misc_fee_per_vehicle, 70_000);
        assert!((settings.tax_rate - 0.10).abs() < 1e-12);
    }

    #[test]
    fn fleet_from_json_parses_plan_aliases_and_vehicles() {
        let json = r#"{
          "plan": "j-nine",
          "vehicles": [
            {
              "model": "wgnr",
              "options": [{ "name": "navigation", "price": 150000 }],
              "resaleValue": 1450000
            },
            { "model": "tanto" }
          ]
        }"#;
        let fleet = fleet_from_json(json).expect("payload should parse");

        assert_eq!(fleet.plan(), Plan::JNine);
        assert_eq!(fleet.slots().len(), 2);
        assert_eq!(fleet.slots()[0].model_id.as_deref(), Some("wgnr"));
        assert_eq!(fleet.slots()[0].options.len(), 1);
        assert_eq!(fleet.slots()[0].resale_value, Some(1_450_000));
        assert_eq!(fleet.slots()[1].resale_value, None);
    }

    #[test]
    fn fleet_from_json_applies_fee_and_tax_overrides() {
        let json = r#"{
          "miscFee": 50000,
          "taxRate": 8,
          "vehicles": [{ "model": "nbox" }]
        }"#;
        let fleet = fleet_from_json(json).expect("payload should parse");
        assert_eq!(fleet.misc_fee_per_vehicle(), 50_000);
        assert!((fleet.tax_rate() - 0.08).abs() < 1e-12);
    }

    #[test]
    fn fleet_from_json_rejects_unknown_models() {
        let err = fleet_from_json(r#"{ "vehicles": [{ "model": "no-such-model" }] }"#)
            .expect_err("unknown model must be rejected")
            .message();
        assert!(err.contains("no-such-model"));
    }

    #[test]
    fn invalid_option_prices_surface_as_slot_addressed_issues() {
        let json = r#"{ "vehicles": [
          { "model": "wgnr", "options": [{ "name": "navi", "price": 0 }] },
          { "model": "tanto", "options": [{ "name": "mats", "price": -100 }] }
        ] }"#;
        let issues = fleet_from_json(json)
            .expect_err("non-positive option prices must be rejected")
            .issues();

        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.kind == IssueKind::InvalidOptionPrice));
        assert_eq!(issues[0].position, 0);
        assert_eq!(issues[1].position, 1);
        assert!(issues[1].message.contains("-100"));

        let body = serde_json::to_string(&issues).expect("issues should serialize");
        assert!(body.contains("\"invalid-option-price\""));
    }

    #[test]
    fn non_positive_resale_input_is_reported_against_the_slot() {
        let json = r#"{ "vehicles": [
          { "model": "wgnr", "resaleValue": 0 },
          { "model": "tanto" }
        ] }"#;
        let mut fleet = fleet_from_json(json).expect("payload should parse");
        assert_eq!(fleet.slots()[0].resale_value, None);

        let issues = fleet.calculate(catalog()).expect_err("must be blocked");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::MissingResaleValue);
        assert_eq!(issues[0].position, 0);
    }

    #[test]
    fn fleet_from_json_rejects_over_cap_fleets() {
        let json = r#"{ "vehicles": [
          { "model": "wgnr" }, { "model": "tanto" },
          { "model": "nbox" }, { "model": "prius-g" }
        ] }"#;
        let err = fleet_from_json(json)
            .expect_err("fourth vehicle must be rejected")
            .message();
        assert!(err.contains("maximum"));
    }

    #[test]
    fn calculate_over_api_payload_is_blocked_without_resale_input() {
        let json = r#"{ "vehicles": [{ "model": "wgnr" }, { "model": "tanto" }] }"#;
        let mut fleet = fleet_from_json(json).expect("payload should parse");

        let issues = fleet.calculate(catalog()).expect_err("must be blocked");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::MissingResaleValue);
        assert_eq!(issues[0].position, 0);
    }

    #[test]
    fn calculate_response_serialization_contains_expected_fields() {
        let json = r#"{
          "plan": "j7",
          "vehicles": [
            { "model": "wgnr", "resaleValue": 1450000 },
            { "model": "tanto" }
          ]
        }"#;
        let mut fleet = fleet_from_json(json).expect("payload should parse");
        let result = fleet.calculate(catalog()).expect("computes").clone();
        let response = build_calculate_response(&fleet, result);

        assert_eq!(response.total_term_months, 84);
        assert_eq!(response.fleet_size, 2);
        assert_eq!(response.result.purchase_total, 1_770_000);
        assert_eq!(response.result.lease_total, 2_380_180);
        assert_eq!(response.result.savings, -610_180);

        let json = serde_json::to_string(&response).expect("response should serialize");
        assert!(json.contains("\"plan\":\"j7\""));
        assert!(json.contains("\"totalTermMonths\""));
        assert!(json.contains("\"purchaseTotal\""));
        assert!(json.contains("\"leaseBreakdown\""));
        assert!(json.contains("\"monthlyRate\""));
        assert!(json.contains("\"resaleTotal\""));
        assert!(json.contains("\"savings\""));
        assert!(!json.contains("\"error\""));
    }

    #[test]
    fn empty_fleet_payload_yields_an_error_flagged_result() {
        let mut fleet = fleet_from_json(r#"{ "vehicles": [] }"#).expect("payload should parse");
        let result = fleet.calculate(catalog()).expect("gate passes").clone();
        assert!(result.is_rejected());

        let response = build_calculate_response(&fleet, result);
        let json = serde_json::to_string(&response).expect("response should serialize");
        assert!(json.contains("\"error\""));
    }

    #[test]
    fn validation_issue_serialization_is_slot_addressed() {
        let json = r#"{ "vehicles": [{ "model": "wgnr" }, { "model": "tanto" }] }"#;
        let mut fleet = fleet_from_json(json).expect("payload should parse");
        let issues = fleet.calculate(catalog()).expect_err("must be blocked");

        let body = serde_json::to_string(&ValidationErrorResponse {
            error: "calculation blocked by per-vehicle validation".to_string(),
            issues,
        })
        .expect("issues should serialize");
        assert!(body.contains("\"slotId\""));
        assert!(body.contains("\"position\""));
        assert!(body.contains("\"missing-resale-value\""));
    }
}
