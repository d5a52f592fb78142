//! Command Integration Tests
//!
//! Runs the command implementations on job files written to a temp dir.

use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use cva_cli::commands::{assemble, calculate, constituents, portfolio};
use cva_cli::{CliError, CvaJob};
use cva_client::{
    CvaCalculator, EndpointRequest, EndpointResponse, JobClient, PollPolicy, PortfolioLoader,
    Transport, TransportError,
};
use cva_request::CvaRequestAssembler;
use serde_json::{json, Value};
use tempfile::TempDir;

fn job_json() -> Value {
    json!({
        "pricingParameters": {
            "valuationDate": "2024-06-28",
            "simulationCount": 2000,
            "selfReferenceEntity": "MyBank",
            "selfRecoveryRatePercent": 40,
            "reportCcy": "USD"
        },
        "entity": {
            "Name": "MyBank",
            "CollateralCurrency": "USD",
            "RecoveryInstrument": 40,
            "RecoveryDeal": 40,
            "CurveID": "MyBankCDS=R"
        },
        "universe": [
            {
                "instrumentType": "Swap",
                "instrumentDefinition": {"instrumentTag": "IRS-001", "endDate": "2029-06-28"},
                "csaTag": "AcmeBank"
            },
            {
                "instrumentType": "FxCross",
                "instrumentDefinition": {"instrumentTag": "FX-001"}
            }
        ],
        "counterparties": {
            "4295905573": [{"name": "AcmeBank"}],
            "5000000001": [{"name": "Unused"}]
        },
        "enrichments": {
            "4295905573": {
                "CurveID": "AcmeCDS=R",
                "RecoveryInstrument": 40,
                "RecoveryDeal": 40,
                "CollateralCurrency": "USD"
            }
        }
    })
}

fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn load_job(dir: &TempDir) -> CvaJob {
    let path = write_file(dir, "job.json", &job_json().to_string());
    CvaJob::load(&path).unwrap()
}

/// Transport replaying a fixed sequence of responses.
struct Replay(Mutex<Vec<EndpointResponse>>);

impl Replay {
    fn new(mut responses: Vec<EndpointResponse>) -> Self {
        responses.reverse();
        Self(Mutex::new(responses))
    }
}

#[async_trait]
impl Transport for Replay {
    async fn send(&self, request: EndpointRequest) -> Result<EndpointResponse, TransportError> {
        self.0
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| TransportError::InvalidResponse(format!("unexpected {}", request.url)))
    }
}

fn job_client(responses: Vec<EndpointResponse>) -> JobClient<Replay> {
    JobClient::new(Replay::new(responses))
        .with_policy(PollPolicy::fixed(std::time::Duration::ZERO, 3))
}

fn calculator(responses: Vec<EndpointResponse>) -> CvaCalculator<Replay> {
    CvaCalculator::new(job_client(responses))
}

fn portfolio_responses() -> Vec<EndpointResponse> {
    let swap = json!({
        "instrumentType": "Swap",
        "instrumentDefinition": {"instrumentTag": "x", "endDate": "2029-06-28"}
    });
    vec![
        EndpointResponse::new(
            200,
            json!({"values": [
                {"type": "StockIn", "instrumentUid": "LUID_A", "counterpartyId": "4295905573"}
            ]}),
        ),
        EndpointResponse::new(
            200,
            json!({"values": {"LUID_A": {"instrumentDefinition": {"instrumentType": "Swap"}}}}),
        ),
        EndpointResponse::new(
            200,
            json!({"values": {"LUID_A": {"content": swap.to_string()}}}),
        ),
        EndpointResponse::new(
            200,
            json!({"Matches": {"4295905573": {"DocumentTitle": "Acme Bank PLC, London"}}}),
        ),
    ]
}

/// Assembling a job file keeps eligible instruments and referenced CSAs
#[test]
fn test_assemble_job_file() {
    let dir = TempDir::new().unwrap();
    let job = load_job(&dir);

    let request = assemble::assemble(&job, &CvaRequestAssembler::new()).unwrap();
    assert_eq!(request.document.universe.len(), 1);
    assert_eq!(request.document.csas.len(), 1);
    assert_eq!(request.advisories.len(), 2);

    let mut out = Vec::new();
    assemble::write_document(&request, &mut out).unwrap();
    let printed: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(printed["csas"][0]["csaTag"], "AcmeBank");
    assert_eq!(printed["pricingParameters"]["valuationDate"], "2024-06-28");
}

/// The assemble command writes the document to the output file
#[test]
fn test_assemble_run_writes_output() {
    let dir = TempDir::new().unwrap();
    let job_path = write_file(&dir, "job.json", &job_json().to_string());
    let output = dir.path().join("request.json");

    assemble::run(&job_path, Some(&output)).unwrap();

    let written: Value = serde_json::from_str(&std::fs::read_to_string(output).unwrap()).unwrap();
    assert_eq!(written["universe"].as_array().unwrap().len(), 1);
}

/// A malformed job file names the file
#[test]
fn test_invalid_job_file() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "broken.json", "{\"universe\": 3}");

    let err = CvaJob::load(&path).unwrap_err();
    assert!(matches!(err, CliError::InvalidInput { .. }));
    assert!(err.to_string().contains("broken.json"));
}

/// A completed job is written as CSV
#[tokio::test]
async fn test_calculate_writes_csv() {
    let dir = TempDir::new().unwrap();
    let job = load_job(&dir);
    let calculator = calculator(vec![
        EndpointResponse::new(202, Value::Null).with_header("Location", "status/1"),
        EndpointResponse::new(200, json!({"status": "succeeded", "resourceLocation": "result/1"})),
        EndpointResponse::new(
            200,
            json!({
                "headers": [{"name": "CsaTag"}, {"name": "BilateralCvaInReportCcy"}],
                "data": [["AcmeBank", -1250.5]]
            }),
        ),
    ]);

    let mut out = Vec::new();
    calculate::execute(&calculator, &job, &mut out).await.unwrap();

    let csv = String::from_utf8(out).unwrap();
    assert_eq!(csv, "CsaTag,BilateralCvaInReportCcy\nAcmeBank,-1250.5\n");
}

/// A synchronous answer is printed and reported as rejected
#[tokio::test]
async fn test_calculate_rejected() {
    let dir = TempDir::new().unwrap();
    let job = load_job(&dir);
    let calculator = calculator(vec![EndpointResponse::new(
        200,
        json!({"message": "Invalid request"}),
    )]);

    let mut out = Vec::new();
    let err = calculate::execute(&calculator, &job, &mut out).await.unwrap_err();

    assert!(matches!(err, CliError::Rejected(_)));
    let printed: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(printed["message"], "Invalid request");
}

/// Constituent history is rebuilt from files
#[test]
fn test_constituents_from_files() {
    let dir = TempDir::new().unwrap();
    let initial = write_file(&dir, "initial.txt", "# members\nA.N\nB.N\n\n");
    let changes = write_file(
        &dir,
        "changes.json",
        &json!({
            "headers": [{"name": "Date"}, {"name": "Constituent RIC"}, {"name": "Change"}],
            "data": [
                ["2024-03-18", "C.N", "Joiner"],
                ["2024-03-18", "A.N", "Leaver"]
            ]
        })
        .to_string(),
    );

    assert_eq!(constituents::read_initial(&initial).unwrap(), vec!["A.N", "B.N"]);

    let output = dir.path().join("history.csv");
    constituents::run(
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        &initial,
        &changes,
        None,
        Some(&output),
    )
    .unwrap();

    let csv = std::fs::read_to_string(&output).unwrap();
    assert_eq!(
        csv,
        "Date,RIC\n2024-01-02,A.N\n2024-01-02,B.N\n2024-03-18,B.N\n2024-03-18,C.N\n"
    );
}

/// Membership on a single date
#[test]
fn test_constituents_as_of() {
    let history = index_constituents::reconstruct(
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        vec!["A.N".to_string()],
        &[],
    );

    let mut out = Vec::new();
    constituents::write_history(
        &history,
        NaiveDate::from_ymd_opt(2024, 2, 1),
        &mut out,
    )
    .unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "Date,RIC\n2024-02-01,A.N\n");
}

/// Portfolios are listed one per line
#[tokio::test]
async fn test_portfolio_list() {
    let client = job_client(vec![EndpointResponse::new(
        200,
        json!({"values": [
            {"id": {"scope": "GE-123", "code": "CVA_BOOK"}, "baseCurrency": "USD"},
            {"id": {"scope": "GE-123", "code": "FX_BOOK"}, "baseCurrency": "EUR"}
        ]}),
    )]);
    let loader = PortfolioLoader::new(&client, "GE-123");

    let mut out = Vec::new();
    portfolio::list(&loader, &mut out).await.unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "scope,code,baseCurrency\nGE-123,CVA_BOOK,USD\nGE-123,FX_BOOK,EUR\n"
    );
}

/// A loaded portfolio fills the template and reads back as a job
#[tokio::test]
async fn test_portfolio_export_writes_job() {
    let dir = TempDir::new().unwrap();
    let client = job_client(portfolio_responses());
    let mut loader = PortfolioLoader::new(&client, "GE-123").with_portfolio("CVA_BOOK");

    let mut template = job_json();
    template["universe"] = json!([]);
    template["counterparties"] = json!({});
    template["enrichments"] = json!({});

    let mut out = Vec::new();
    portfolio::export(&mut loader, None, template, &mut out)
        .await
        .unwrap();

    let path = write_file(&dir, "job.json", &String::from_utf8(out).unwrap());
    let job = CvaJob::load(&path).unwrap();
    assert_eq!(job.universe.len(), 1);
    assert_eq!(job.universe[0].tag(), "LUID_A");
    assert_eq!(job.universe[0].csa_tag(), Some("AcmeBankPLC"));
    assert_eq!(job.counterparties["4295905573"][0].name, "AcmeBankPLC");
    assert_eq!(job.pricing_parameters.report_ccy(), "USD");
}

/// A template missing the pricing parameters is refused
#[tokio::test]
async fn test_portfolio_export_incomplete_template() {
    let client = job_client(portfolio_responses());
    let mut loader = PortfolioLoader::new(&client, "GE-123").with_portfolio("CVA_BOOK");

    let mut out = Vec::new();
    let err = portfolio::export(&mut loader, None, json!({"entity": {}}), &mut out)
        .await
        .unwrap_err();

    assert!(matches!(err, CliError::Output(_)));
    assert!(out.is_empty());
}
