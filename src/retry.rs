use std::time::Duration;
use tokio::time::sleep;

use crate::config::NetworkSettings;
use crate::error::RpcError;
use crate::logging::{ErrorLogger, LogContext, PerformanceMonitor};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, the first one included
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Multiplier applied per attempt; 1.0 keeps the delay fixed
    pub backoff_multiplier: f64,
    /// Whether to add +/-10% jitter
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 1.0,
            jitter: false,
        }
    }
}

impl RetryConfig {
    /// Fixed-delay policy taken from a resolved network profile
    pub fn from_network(settings: &NetworkSettings) -> Self {
        Self {
            max_attempts: settings.retry_attempts.max(1),
            initial_delay: settings.retry_delay,
            max_delay: settings.retry_delay.max(Duration::from_secs(30)),
            backoff_multiplier: 1.0,
            jitter: settings.retry_jitter,
        }
    }
}

/// Retries node calls on transport failures
pub struct RetryManager {
    config: RetryConfig,
    operation_name: String,
}

impl RetryManager {
    pub fn new(operation_name: &str, config: RetryConfig) -> Self {
        Self {
            config,
            operation_name: operation_name.to_string(),
        }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or `max_attempts` is used up. The last error is returned.
    pub async fn execute<T, F, Fut>(&self, operation: F) -> Result<T, RpcError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, RpcError>>,
    {
        let monitor = PerformanceMonitor::new(&format!("retry_{}", self.operation_name));
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let attempt_monitor = PerformanceMonitor::new(&format!("{}_attempt_{}", self.operation_name, attempt));

            match operation().await {
                Ok(result) => {
                    if attempt > 1 {
                        ErrorLogger::log_recovery_success(&self.operation_name, attempt, monitor.elapsed_ms());
                    }
                    attempt_monitor.finish_with_result::<(), String>(&Ok(()));
                    return Ok(result);
                }
                Err(error) => {
                    attempt_monitor.finish_with_result::<(), &RpcError>(&Err(&error));

                    if !error.is_retryable() {
                        LogContext::new("retry", &self.operation_name)
                            .with_attempt(attempt)
                            .with_metadata("reason", serde_json::json!("non_retryable"))
                            .debug(&format!("Non-retryable error, not retrying: {}", error));
                        return Err(error);
                    }

                    ErrorLogger::log_retry_attempt(&self.operation_name, &error, attempt, max_attempts);

                    if attempt >= max_attempts {
                        return Err(error);
                    }

                    let delay = self.calculate_delay(attempt);
                    LogContext::new("retry", &self.operation_name)
                        .with_attempt(attempt)
                        .with_metadata("delay_ms", serde_json::json!(delay.as_millis() as u64))
                        .debug(&format!("Retrying in {}ms (attempt {} of {})", delay.as_millis(), attempt, max_attempts));

                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Delay to wait after the given failed attempt
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let base_delay = self.config.initial_delay.as_secs_f64();
        let exponential_delay = base_delay * self.config.backoff_multiplier.powi(attempt as i32 - 1);

        let capped_delay = exponential_delay.min(self.config.max_delay.as_secs_f64());

        let final_delay = if self.config.jitter {
            let jitter = capped_delay * 0.1 * (rand::random::<f64>() - 0.5) * 2.0;
            (capped_delay + jitter).max(0.0)
        } else {
            capped_delay
        };

        Duration::from_secs_f64(final_delay)
    }
}
