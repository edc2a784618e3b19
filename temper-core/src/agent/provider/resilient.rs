use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::agent::provider::{ChatRequest, Provider};
use crate::agent::streaming::StreamingResponse;
use crate::error::Result;

/// Configuration for the Circuit Breaker
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Failure threshold before opening the circuit
    pub failure_threshold: u32,
    /// Duration to wait before attempting recovery (Half-Open)
    pub reset_timeout: Duration,
    /// Maximum time to wait for the primary to start streaming
    pub request_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            reset_timeout: Duration::from_secs(60),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

struct CircuitStateInternal {
    state: CircuitState,
    failures: u32,
    last_failure_time: Option<Instant>,
}

/// Wraps a primary and a fallback backend behind a circuit breaker
///
/// Both sides are ordinary [`Provider`]s, so any two backends are interchangeable
/// (e.g. a hosted model with a local Ollama fallback).
pub struct ResilientProvider<P: Provider, F: Provider> {
    primary: Arc<P>,
    fallback: Arc<F>,
    config: CircuitBreakerConfig,
    state: Mutex<CircuitStateInternal>,
}

impl<P: Provider, F: Provider> ResilientProvider<P, F> {
    /// Create a new resilient provider
    pub fn new(primary: P, fallback: F, config: CircuitBreakerConfig) -> Self {
        Self {
            primary: Arc::new(primary),
            fallback: Arc::new(fallback),
            config,
            state: Mutex::new(CircuitStateInternal {
                state: CircuitState::Closed,
                failures: 0,
                last_failure_time: None,
            }),
        }
    }

    /// Whether requests currently bypass the primary
    pub async fn is_open(&self) -> bool {
        self.check_state().await == CircuitState::Open
    }

    async fn check_state(&self) -> CircuitState {
        let mut guard = self.state.lock().await;

        if guard.state == CircuitState::Open {
            if let Some(last_failure) = guard.last_failure_time {
                if last_failure.elapsed() > self.config.reset_timeout {
                    info!("Circuit breaker: reset timeout passed, switching to half-open");
                    guard.state = CircuitState::HalfOpen;
                }
            }
        }
        guard.state
    }

    async fn report_success(&self) {
        let mut guard = self.state.lock().await;
        if guard.state == CircuitState::HalfOpen {
            info!("Circuit breaker: half-open probe succeeded, closing circuit");
            guard.state = CircuitState::Closed;
            guard.last_failure_time = None;
        }
        guard.failures = 0;
    }

    async fn report_failure(&self) {
        let mut guard = self.state.lock().await;
        guard.failures += 1;
        guard.last_failure_time = Some(Instant::now());

        match guard.state {
            CircuitState::Closed if guard.failures >= self.config.failure_threshold => {
                warn!(
                    primary = self.primary.name(),
                    fallback = self.fallback.name(),
                    "Circuit breaker: failure threshold reached, opening circuit"
                );
                guard.state = CircuitState::Open;
            }
            CircuitState::HalfOpen => {
                warn!("Circuit breaker: half-open probe failed, re-opening circuit");
                guard.state = CircuitState::Open;
            }
            _ => {}
        }
    }
}

#[async_trait]
impl<P: Provider, F: Provider> Provider for ResilientProvider<P, F> {
    fn name(&self) -> &'static str {
        "resilient"
    }

    fn supports_json_mode(&self) -> bool {
        self.primary.supports_json_mode() && self.fallback.supports_json_mode()
    }

    async fn stream_completion(&self, request: ChatRequest) -> Result<StreamingResponse> {
        if self.check_state().await != CircuitState::Open {
            match tokio::time::timeout(
                self.config.request_timeout,
                self.primary.stream_completion(request.clone()),
            )
            .await
            {
                Ok(Ok(response)) => {
                    self.report_success().await;
                    return Ok(response);
                }
                // Refusals and rate limits belong to the caller, not the fallback
                Ok(Err(e)) if !e.is_retryable() => return Err(e),
                Ok(Err(e)) => {
                    warn!("Primary provider {} failed: {}", self.primary.name(), e);
                    self.report_failure().await;
                }
                Err(_) => {
                    warn!(
                        "Primary provider {} timed out (> {:?})",
                        self.primary.name(),
                        self.config.request_timeout
                    );
                    self.report_failure().await;
                }
            }
        }

        info!("Using fallback provider: {}", self.fallback.name());
        self.fallback.stream_completion(request).await
    }
}
