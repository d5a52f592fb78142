//! # cva_client: Remote Job Client
//!
//! Runs CVA calculations on the analytics platform.
//!
//! ## Modules
//!
//! - `transport`: the [`Transport`] capability and request/response types
//! - `http`: [`HttpTransport`], the `reqwest` implementation
//! - `job`: [`JobClient`] submitting requests and polling asynchronous jobs
//! - `calculator`: [`CvaCalculator`] tying request assembly to job execution
//! - `portfolio`: [`PortfolioLoader`] reading universes from transaction
//!   portfolios
//! - `config`: [`ClientConfig`] loaded from file, environment and CLI
//!
//! ## Flow
//!
//! ```text
//! universe + registry + pricing + entity
//!        │ assemble (cva_request)
//!        ▼
//! POST async-cva ──202──▶ poll status ──▶ poll result ──▶ Table
//!        │
//!        └──200──▶ raw payload (CvaOutcome::Rejected)
//! ```

#![warn(missing_docs)]

mod calculator;
pub mod config;
mod error;
mod http;
mod job;
mod portfolio;
mod transport;

pub use calculator::{CvaCalculator, CvaOutcome, DEFAULT_CVA_ENDPOINT};
pub use config::{ClientConfig, ConfigError, LogLevel, PollConfig};
pub use error::{CalculationError, JobError, LoaderError, PollPhase, TransportError};
pub use http::HttpTransport;
pub use job::{JobClient, PollPolicy};
pub use portfolio::{build_universe, LoadedPortfolio, PortfolioLoader, PortfolioSummary};
pub use transport::{EndpointRequest, EndpointResponse, Method, Transport};
