//! Resend bookkeeping and the once-per-second cooldown ticker.

use parking_lot::Mutex;
use std::{sync::Arc, time::Duration};
use tokio::{
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};

use crate::settings::ResendPolicy;

const TICK: Duration = Duration::from_secs(1);

/// How many resends happened and how long until the next one is allowed.
///
/// Resending is disabled exactly when a cooldown is running or the limit is
/// used up; that is computed, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResendState {
    count: u32,
    cooldown_remaining: u32,
    policy: ResendPolicy,
}

impl ResendState {
    /// No resends yet, no cooldown running.
    pub fn new(policy: ResendPolicy) -> Self {
        Self {
            count: 0,
            cooldown_remaining: 0,
            policy,
        }
    }

    /// Successful resends so far
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Seconds left on the cooldown, 0 when none is running
    pub fn cooldown_remaining(&self) -> u32 {
        self.cooldown_remaining
    }

    /// Whether a cooldown is running
    pub fn is_cooling_down(&self) -> bool {
        self.cooldown_remaining > 0
    }

    /// Whether all resends are used up
    pub fn limit_reached(&self) -> bool {
        self.count >= self.policy.limit
    }

    /// Whether the resend action is unavailable right now
    pub fn is_disabled(&self) -> bool {
        self.is_cooling_down() || self.limit_reached()
    }

    /// Start a full cooldown.
    pub fn arm(&mut self) {
        self.cooldown_remaining = self.policy.cooldown_secs;
    }

    /// Drop any running cooldown.
    pub fn cancel(&mut self) {
        self.cooldown_remaining = 0;
    }

    /// Count one successful resend. Never exceeds the limit.
    pub fn record_success(&mut self) {
        self.count = self.count.saturating_add(1).min(self.policy.limit);
    }

    /// Advance the cooldown by one second. Returns whether it is still running.
    pub fn tick(&mut self) -> bool {
        self.cooldown_remaining = self.cooldown_remaining.saturating_sub(1);
        self.is_cooling_down()
    }

    /// Text for the resend control
    pub fn label(&self) -> String {
        if self.limit_reached() {
            "Resend limit reached".to_string()
        } else if self.is_cooling_down() {
            format!("Resend in {}s", self.cooldown_remaining)
        } else {
            "Resend".to_string()
        }
    }
}

/// A running cooldown countdown. Aborted when stopped or dropped.
#[derive(Debug)]
pub struct CooldownTicker {
    handle: JoinHandle<()>,
}

impl CooldownTicker {
    /// Decrement `state` once per second until its cooldown reaches zero.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(state: Arc<Mutex<ResendState>>) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + TICK, TICK);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if !state.lock().tick() {
                    tracing::debug!("Resend cooldown expired");
                    break;
                }
            }
        });
        Self { handle }
    }

    /// Whether the countdown ran out on its own
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancel the countdown, leaving the state as it is.
    pub fn stop(self) {}
}

impl Drop for CooldownTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// [`ResendState`] together with the ticker counting it down.
#[derive(Debug)]
pub struct Cooldown {
    state: Arc<Mutex<ResendState>>,
    ticker: Option<CooldownTicker>,
}

impl Cooldown {
    /// Fresh state, no cooldown running.
    pub fn new(policy: ResendPolicy) -> Self {
        Self {
            state: Arc::new(Mutex::new(ResendState::new(policy))),
            ticker: None,
        }
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> ResendState {
        *self.state.lock()
    }

    /// (Re)start a full cooldown and its ticker.
    pub fn start(&mut self) {
        self.shutdown();
        self.state.lock().arm();
        self.ticker = Some(CooldownTicker::start(self.state.clone()));
    }

    /// Stop the ticker and zero the cooldown.
    pub fn cancel(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.stop();
        }
        self.state.lock().cancel();
    }

    /// Count one successful resend.
    pub fn record_success(&mut self) {
        self.state.lock().record_success();
    }

    /// Stop the ticker, leaving the remaining seconds frozen.
    pub fn shutdown(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.stop();
        }
    }

    #[cfg(test)]
    pub(crate) fn shared_state(&self) -> Arc<Mutex<ResendState>> {
        Arc::clone(&self.state)
    }
}
