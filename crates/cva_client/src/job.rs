//! Remote job client.
//!
//! The platform runs long calculations as asynchronous jobs:
//!
//! ```text
//! POST job ──202 + location──▶ GET status ... {status: succeeded|failed,
//!                                               resourceLocation}
//!                                    │
//!                                    ▼
//!                              GET result ... 200 {headers, data}
//! ```
//!
//! Both polling phases are bounded by a [`PollPolicy`] with exponential
//! backoff between attempts.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{JobError, PollPhase, TransportError};
use crate::transport::{EndpointRequest, EndpointResponse, Method, Transport};

/// Retry budget and backoff for job polling.
///
/// The delay before retry `n` (zero-based) is
/// `min(initial_interval * backoff_factor^n, max_interval)`.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// Delay after the first unsuccessful poll
    pub initial_interval: Duration,
    /// Growth factor of the delay (values below 1 are treated as 1)
    pub backoff_factor: f64,
    /// Upper bound of the delay
    pub max_interval: Duration,
    /// Maximum polls per phase
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(1),
            backoff_factor: 2.0,
            max_interval: Duration::from_secs(30),
            max_attempts: 60,
        }
    }
}

impl PollPolicy {
    /// Fixed-interval policy without backoff.
    pub fn fixed(interval: Duration, max_attempts: u32) -> Self {
        Self {
            initial_interval: interval,
            backoff_factor: 1.0,
            max_interval: interval,
            max_attempts,
        }
    }

    /// Delay before retry `attempt` (zero-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(i32::MAX as u32) as i32;
        let scaled =
            self.initial_interval.as_secs_f64() * self.backoff_factor.max(1.0).powi(exponent);
        Duration::from_secs_f64(scaled.min(self.max_interval.as_secs_f64()))
    }
}

/// Submits requests and drives asynchronous jobs to completion.
pub struct JobClient<T> {
    transport: T,
    policy: PollPolicy,
}

impl<T: Transport> JobClient<T> {
    /// Creates a client with the default polling policy.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            policy: PollPolicy::default(),
        }
    }

    /// Sets the polling policy.
    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the polling policy.
    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Returns the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends a request, failing on any status other than 200 or 202.
    pub async fn submit(
        &self,
        url: &str,
        method: Method,
        body: Option<Value>,
    ) -> Result<EndpointResponse, TransportError> {
        let response = self
            .transport
            .send(EndpointRequest {
                method,
                url: url.to_string(),
                body,
            })
            .await?;

        match response.status {
            200 | 202 => Ok(response),
            status => Err(TransportError::Status {
                status,
                body: response.body_text(),
            }),
        }
    }

    /// GET shorthand for [`JobClient::submit`].
    pub async fn get(&self, url: &str) -> Result<EndpointResponse, TransportError> {
        self.submit(url, Method::Get, None).await
    }

    /// Polls an accepted job to completion and returns the result payload.
    ///
    /// # Errors
    ///
    /// - `Transport` if the `location` header is missing or a poll fails
    /// - `Timeout` if either phase exhausts its attempts
    /// - `Failed` if the job failed without a result resource
    /// - `InvalidResponse` if a succeeded job has no result resource
    pub async fn await_completion(&self, response: &EndpointResponse) -> Result<Value, JobError> {
        let status_url = response
            .header("location")
            .ok_or(TransportError::MissingHeader("location"))?;

        let status = self.poll_status(status_url).await?;
        let state = status.get("status").and_then(Value::as_str).unwrap_or_default();
        let resource = status.get("resourceLocation").and_then(Value::as_str);

        let resource = match (state.eq_ignore_ascii_case("failed"), resource) {
            (false, Some(resource)) => resource,
            (true, Some(resource)) => {
                warn!(status_url, "Job reported failure, fetching result for details");
                resource
            }
            (true, None) => return Err(JobError::Failed(status.to_string())),
            (false, None) => {
                return Err(JobError::InvalidResponse(
                    "status resource has no resourceLocation".to_string(),
                ))
            }
        };

        self.poll_result(resource).await
    }

    async fn poll_status(&self, url: &str) -> Result<Value, JobError> {
        for attempt in 0..self.policy.max_attempts {
            let body = self.get(url).await?.body;
            let state = body.get("status").and_then(Value::as_str).unwrap_or("notStarted");

            if is_terminal(state) {
                debug!(url, state, attempt, "Job reached terminal status");
                return Ok(body);
            }

            debug!(url, state, attempt, "Job still running");
            self.wait(attempt).await;
        }

        Err(JobError::Timeout {
            phase: PollPhase::Status,
            attempts: self.policy.max_attempts,
        })
    }

    async fn poll_result(&self, url: &str) -> Result<Value, JobError> {
        for attempt in 0..self.policy.max_attempts {
            let response = self.get(url).await?;
            if response.status == 200 {
                return Ok(response.body);
            }

            debug!(url, status = response.status, attempt, "Result not ready");
            self.wait(attempt).await;
        }

        Err(JobError::Timeout {
            phase: PollPhase::Result,
            attempts: self.policy.max_attempts,
        })
    }

    async fn wait(&self, attempt: u32) {
        if attempt + 1 < self.policy.max_attempts {
            tokio::time::sleep(self.policy.delay(attempt)).await;
        }
    }
}

fn is_terminal(state: &str) -> bool {
    state.eq_ignore_ascii_case("succeeded") || state.eq_ignore_ascii_case("failed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = PollPolicy::default();
        assert_eq!(policy.initial_interval, Duration::from_secs(1));
        assert_eq!(policy.max_attempts, 60);
    }

    #[test]
    fn test_delay_backoff_and_cap() {
        let policy = PollPolicy::default();
        assert_eq!(policy.delay(0), Duration::from_secs(1));
        assert_eq!(policy.delay(1), Duration::from_secs(2));
        assert_eq!(policy.delay(3), Duration::from_secs(8));
        assert_eq!(policy.delay(10), Duration::from_secs(30));
        assert_eq!(policy.delay(u32::MAX), Duration::from_secs(30));
    }

    #[test]
    fn test_fixed_policy() {
        let policy = PollPolicy::fixed(Duration::from_millis(250), 3);
        assert_eq!(policy.delay(0), Duration::from_millis(250));
        assert_eq!(policy.delay(5), Duration::from_millis(250));
    }

    #[test]
    fn test_zero_interval_never_sleeps() {
        let policy = PollPolicy::fixed(Duration::ZERO, 10);
        assert_eq!(policy.delay(1000), Duration::ZERO);
    }

    #[test]
    fn test_factor_below_one_treated_as_one() {
        let policy = PollPolicy {
            backoff_factor: 0.5,
            ..PollPolicy::default()
        };
        assert_eq!(policy.delay(4), Duration::from_secs(1));
    }

    #[test]
    fn test_terminal_states() {
        assert!(is_terminal("succeeded"));
        assert!(is_terminal("failed"));
        assert!(is_terminal("Succeeded"));
        assert!(!is_terminal("running"));
        assert!(!is_terminal("notStarted"));
    }
}
