//! CVA calculation over the remote job service.

use cva_core::{
    CounterpartyRegistry, Instrument, PricingParameters, SelfEntity, Table, ValidationError,
};
use cva_request::{AssembledRequest, CvaRequestAssembler};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::CalculationError;
use crate::job::JobClient;
use crate::transport::{Method, Transport};

/// Endpoint of the asynchronous CVA service.
pub const DEFAULT_CVA_ENDPOINT: &str = "data/quantitative-analytics/v1/async-cva";

/// Successful outcome of a calculation request.
#[derive(Debug, Clone, PartialEq)]
pub enum CvaOutcome {
    /// The job completed; one row per CSA
    Completed(Table),
    /// The service answered synchronously instead of accepting a job; the
    /// raw payload carries its explanation
    Rejected(Value),
}

impl CvaOutcome {
    /// Returns the result table of a completed job.
    pub fn table(&self) -> Option<&Table> {
        match self {
            CvaOutcome::Completed(table) => Some(table),
            CvaOutcome::Rejected(_) => None,
        }
    }
}

/// Assembles CVA requests and runs them on the platform.
///
/// # Examples
///
/// ```no_run
/// use cva_client::{CvaCalculator, HttpTransport, JobClient};
/// use std::time::Duration;
///
/// let transport = HttpTransport::new("https://api.example.com", Duration::from_secs(30)).unwrap();
/// let calculator = CvaCalculator::new(JobClient::new(transport));
/// ```
pub struct CvaCalculator<T> {
    client: JobClient<T>,
    assembler: CvaRequestAssembler,
    endpoint: String,
}

impl<T: Transport> CvaCalculator<T> {
    /// Creates a calculator with the default assembler and endpoint.
    pub fn new(client: JobClient<T>) -> Self {
        Self {
            client,
            assembler: CvaRequestAssembler::new(),
            endpoint: DEFAULT_CVA_ENDPOINT.to_string(),
        }
    }

    /// Sets the request assembler.
    pub fn with_assembler(mut self, assembler: CvaRequestAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    /// Sets the service endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Returns the service endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the job client.
    pub fn client(&self) -> &JobClient<T> {
        &self.client
    }

    /// Builds the request without sending it.
    pub fn assemble(
        &self,
        universe: &[Instrument],
        registry: &CounterpartyRegistry,
        pricing: &PricingParameters,
        entity: &SelfEntity,
    ) -> Result<AssembledRequest, ValidationError> {
        self.assembler.assemble(universe, registry, pricing, entity)
    }

    /// Assembles, submits and polls a CVA calculation.
    ///
    /// A 202 answer is polled to completion and decoded into a table; a 200
    /// answer is returned raw as [`CvaOutcome::Rejected`].
    pub async fn calculate(
        &self,
        universe: &[Instrument],
        registry: &CounterpartyRegistry,
        pricing: &PricingParameters,
        entity: &SelfEntity,
    ) -> Result<CvaOutcome, CalculationError> {
        let request = self.assemble(universe, registry, pricing, entity)?;
        let body = request.document.to_value()?;

        let response = self
            .client
            .submit(&self.endpoint, Method::Post, Some(body))
            .await?;

        if response.status != 202 {
            warn!(
                status = response.status,
                "CVA request was not accepted as a job, returning raw payload"
            );
            return Ok(CvaOutcome::Rejected(response.body));
        }

        let payload = self.client.await_completion(&response).await?;
        let table =
            Table::from_payload(&payload).map_err(|e| CalculationError::Decode(e.to_string()))?;

        info!(rows = table.len(), "CVA calculation completed");
        Ok(CvaOutcome::Completed(table))
    }

    /// Permissive variant of [`CvaCalculator::calculate`]: any error is
    /// logged as a warning and yields `None`.
    pub async fn calculate_or_warn(
        &self,
        universe: &[Instrument],
        registry: &CounterpartyRegistry,
        pricing: &PricingParameters,
        entity: &SelfEntity,
    ) -> Option<CvaOutcome> {
        match self.calculate(universe, registry, pricing, entity).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!(error = %e, "An error occurred during CVA calculation");
                None
            }
        }
    }
}
