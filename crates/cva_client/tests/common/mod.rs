//! Shared fixtures for cva_client integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use cva_client::{
    EndpointRequest, EndpointResponse, JobClient, PollPolicy, Transport, TransportError,
};
use cva_core::{
    CounterpartyParams, CounterpartyRecord, CounterpartyRegistry, Instrument, PricingParameters,
    SelfEntity,
};
use serde_json::{json, Value};

/// Transport answering from a queue of scripted responses.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<EndpointResponse, TransportError>>>,
    requests: Mutex<Vec<EndpointRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, response: EndpointResponse) -> Self {
        self.responses.lock().unwrap().push_back(Ok(response));
        self
    }

    pub fn fail(self, error: TransportError) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<EndpointRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: EndpointRequest) -> Result<EndpointResponse, TransportError> {
        let url = request.url.clone();
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(TransportError::InvalidResponse(format!(
                    "unscripted request to {url}"
                )))
            })
    }
}

/// Job client that polls without sleeping.
pub fn job_client(transport: ScriptedTransport, max_attempts: u32) -> JobClient<ScriptedTransport> {
    JobClient::new(transport).with_policy(PollPolicy::fixed(Duration::ZERO, max_attempts))
}

pub fn accepted(location: &str) -> EndpointResponse {
    EndpointResponse::new(202, Value::Null).with_header("Location", location)
}

pub fn status(state: &str, resource: Option<&str>) -> EndpointResponse {
    let mut body = json!({ "status": state });
    if let Some(resource) = resource {
        body["resourceLocation"] = json!(resource);
    }
    EndpointResponse::new(200, body)
}

pub fn result_table() -> Value {
    json!({
        "headers": [{"name": "CsaTag"}, {"name": "BilateralCvaInReportCcy"}],
        "data": [["AcmeBank", -1250.5]]
    })
}

pub fn universe() -> Vec<Instrument> {
    vec![
        Instrument::new("Swap", "IRS-001")
            .with_csa_tag("AcmeBank")
            .with_end_date("2029-06-28"),
        Instrument::new("FxCross", "FX-001").with_end_date("2025-01-15"),
    ]
}

pub fn registry() -> CounterpartyRegistry {
    let mut registry = CounterpartyRegistry::from_raw(vec![(
        "4295905573",
        vec![CounterpartyRecord::assigned("AcmeBank", "IRS-001")],
    )]);
    registry
        .enrich(
            "4295905573",
            &CounterpartyParams::new("AcmeCDS=R", 40.0, 40.0, "USD"),
        )
        .unwrap();
    registry
}

pub fn pricing() -> PricingParameters {
    PricingParameters::parse("2024-06-28", 2000, "MyBank", 40.0, "USD").unwrap()
}

pub fn entity() -> SelfEntity {
    SelfEntity::new("MyBank", "USD", 40.0, 40.0, "MyBankCDS=R")
}
