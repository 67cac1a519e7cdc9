use std::time::Duration;

/// Spaces out consecutive generation calls: the i-th call (0-based) waits
/// `base + step * i` before it is issued.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestPacer {
    base: Duration,
    step: Duration,
    enabled: bool,
}

impl RequestPacer {
    pub fn new(base: Duration, step: Duration) -> Self {
        Self {
            base,
            step,
            enabled: true,
        }
    }

    pub fn disabled() -> Self {
        Self {
            base: Duration::ZERO,
            step: Duration::ZERO,
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn delay_for(&self, iteration: usize) -> Duration {
        if !self.enabled {
            return Duration::ZERO;
        }
        let iteration = u32::try_from(iteration).unwrap_or(u32::MAX);
        self.base.saturating_add(self.step.saturating_mul(iteration))
    }

    pub async fn wait(&self, iteration: usize) {
        let delay = self.delay_for(iteration);
        if delay.is_zero() {
            return;
        }
        log::debug!("Pacing generation call {} by {:?}", iteration, delay);
        tokio::time::sleep(delay).await;
    }
}
