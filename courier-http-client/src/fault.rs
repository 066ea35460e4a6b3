//! Request-scoped fault injection for exercising failure paths offline.

use std::time::Duration;

/// Fault injection probabilities and parameters.
///
/// All probabilities are independent draws in `[0, 1]`. A value of `0.0`
/// disables the corresponding fault deterministically and `1.0` forces it
/// deterministically, which is what reproducible tests rely on.
#[derive(Debug, Clone)]
pub struct FaultConfig {
    /// Probability of an artificial delay before execution.
    pub delay_probability: f64,
    /// Length of the artificial delay.
    pub delay: Duration,
    /// Probability of simulated unreachability: a retryable connection error
    /// produced without any transmission.
    pub unreachable_probability: f64,
    /// Probability of losing the response: the exchange succeeds on the wire
    /// but nothing is ever published, indistinguishable from a dropped
    /// packet.
    pub lose_response_probability: f64,
    /// Probability of a synthetic API-level error regardless of actual
    /// server behavior.
    pub api_error_probability: f64,
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            delay_probability: 0.0,
            delay: Duration::from_secs(30),
            unreachable_probability: 0.0,
            lose_response_probability: 0.0,
            api_error_probability: 0.0,
        }
    }
}

impl FaultConfig {
    /// Set the delay fault probability and duration.
    pub fn with_delay(mut self, probability: f64, delay: Duration) -> Self {
        self.delay_probability = probability;
        self.delay = delay;
        self
    }

    /// Set the unreachability fault probability.
    pub fn with_unreachable(mut self, probability: f64) -> Self {
        self.unreachable_probability = probability;
        self
    }

    /// Set the lost-response fault probability.
    pub fn with_lost_response(mut self, probability: f64) -> Self {
        self.lose_response_probability = probability;
        self
    }

    /// Set the synthetic API error probability.
    pub fn with_api_error(mut self, probability: f64) -> Self {
        self.api_error_probability = probability;
        self
    }

    /// Whether every fault is disabled.
    pub fn is_inert(&self) -> bool {
        self.delay_probability == 0.0
            && self.unreachable_probability == 0.0
            && self.lose_response_probability == 0.0
            && self.api_error_probability == 0.0
    }
}

/// Draw a fault with the given probability.
pub(crate) fn triggered(probability: f64) -> bool {
    probability > 0.0 && rand::random::<f64>() < probability
}
