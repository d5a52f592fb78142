//! Assemble command implementation
//!
//! Builds the request document of a job file without sending it.

use std::io::Write;
use std::path::Path;

use cva_request::{AssembledRequest, CvaRequestAssembler};
use tracing::{info, warn};

use crate::commands::open_output;
use crate::error::{CliError, Result};
use crate::job_file::CvaJob;

/// Assembles the request of a job.
pub fn assemble(job: &CvaJob, assembler: &CvaRequestAssembler) -> Result<AssembledRequest> {
    let registry = job.registry()?;
    let request = assembler.assemble(
        &job.universe,
        &registry,
        &job.pricing_parameters,
        &job.entity,
    )?;

    for advisory in &request.advisories {
        warn!(%advisory, "Instrument or counterparty excluded");
    }
    info!(
        instruments = request.document.universe.len(),
        csas = request.document.csas.len(),
        "Request assembled"
    );
    Ok(request)
}

/// Writes the request document as pretty-printed JSON.
pub fn write_document<W: Write>(request: &AssembledRequest, out: &mut W) -> Result<()> {
    let value = request.document.to_value().map_err(CliError::output)?;
    serde_json::to_writer_pretty(&mut *out, &value).map_err(CliError::output)?;
    writeln!(out)?;
    Ok(())
}

/// Run the assemble command
pub fn run(job_path: &Path, output: Option<&Path>) -> Result<()> {
    let job = CvaJob::load(job_path)?;
    let request = assemble(&job, &CvaRequestAssembler::new())?;

    let mut out = open_output(output)?;
    write_document(&request, &mut out)?;
    out.flush()?;
    Ok(())
}
