//! CLI command implementations
//!
//! Each submodule implements a specific CLI command.

pub mod assemble;
pub mod calculate;
pub mod constituents;
pub mod portfolio;

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use cva_client::{ClientConfig, HttpTransport, JobClient};

use crate::error::Result;

/// Builds a job client talking to the configured platform.
pub fn job_client(config: &ClientConfig) -> Result<JobClient<HttpTransport>> {
    let transport = HttpTransport::from_config(config)?;
    Ok(JobClient::new(transport).with_policy(config.poll.to_policy()))
}

/// Opens the output file, or stdout when no path is given.
pub(crate) fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(io::BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    })
}
