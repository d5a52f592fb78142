//! Calculate command implementation
//!
//! Runs the CVA calculation of a job file on the platform and writes the
//! result table as CSV.

use std::io::Write;
use std::path::Path;

use cva_client::{ClientConfig, CvaCalculator, CvaOutcome, HttpTransport, Transport};
use tracing::{info, warn};

use crate::commands::{job_client, open_output};
use crate::error::{CliError, Result};
use crate::job_file::CvaJob;

/// Builds a calculator talking to the configured platform.
pub fn calculator(config: &ClientConfig) -> Result<CvaCalculator<HttpTransport>> {
    Ok(CvaCalculator::new(job_client(config)?).with_endpoint(config.cva_endpoint.clone()))
}

/// Runs a job and writes the result table as CSV.
///
/// A synchronous answer from the service is written as JSON and reported
/// as [`CliError::Rejected`].
pub async fn execute<T: Transport, W: Write>(
    calculator: &CvaCalculator<T>,
    job: &CvaJob,
    out: &mut W,
) -> Result<()> {
    let registry = job.registry()?;
    let outcome = calculator
        .calculate(&job.universe, &registry, &job.pricing_parameters, &job.entity)
        .await?;

    match outcome {
        CvaOutcome::Completed(table) => {
            table.write_csv(&mut *out).map_err(CliError::output)?;
            info!(rows = table.len(), "Results written");
            Ok(())
        }
        CvaOutcome::Rejected(payload) => {
            warn!("Service answered without running the job");
            serde_json::to_writer_pretty(&mut *out, &payload).map_err(CliError::output)?;
            writeln!(out)?;
            Err(CliError::Rejected(payload.to_string()))
        }
    }
}

/// Run the calculate command
pub async fn run(config: &ClientConfig, job_path: &Path, output: Option<&Path>) -> Result<()> {
    let job = CvaJob::load(job_path)?;
    let calculator = calculator(config)?;
    info!(
        base_url = %config.base_url,
        endpoint = calculator.endpoint(),
        "Submitting CVA calculation"
    );

    let mut out = open_output(output)?;
    let result = execute(&calculator, &job, &mut out).await;
    out.flush()?;
    result
}
