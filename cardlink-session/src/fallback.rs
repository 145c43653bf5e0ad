//! Tokio-backed fallback timer.
//!
//! The reconciler only records a deadline when the pointer is released.
//! Hosts that do not poll it can arm a [`FallbackTimer`] instead, which
//! sends a `FallbackTimeout` signal into the same channel the other
//! gesture signals arrive on.

use crate::config::InteractionConfig;
use crate::reconciler::{Channel, GestureSignal};
use cardlink_types::GestureId;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Sending half of a host's gesture signal channel.
pub type SignalSender = mpsc::UnboundedSender<(Channel, GestureSignal)>;
pub type SignalReceiver = mpsc::UnboundedReceiver<(Channel, GestureSignal)>;

pub struct FallbackTimer {
    window: Duration,
    handle: Option<JoinHandle<()>>,
}

impl FallbackTimer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            handle: None,
        }
    }

    pub fn from_config(config: &InteractionConfig) -> Self {
        Self::new(config.fallback_window())
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Schedules a timeout for `gesture`, replacing any pending one.
    /// Must be called from within a tokio runtime.
    pub fn arm(&mut self, gesture: GestureId, signals: SignalSender) {
        self.disarm();
        let window = self.window;
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            if signals
                .send((Channel::Fallback, GestureSignal::FallbackTimeout { gesture }))
                .is_err()
            {
                debug!(gesture = %gesture, "Fallback fired after signal receiver closed");
            }
        }));
    }

    /// Cancels the pending timeout, if any.
    pub fn disarm(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for FallbackTimer {
    fn drop(&mut self) {
        self.disarm();
    }
}
