//! Gesture signal reconciliation.
//!
//! A host delivers the same gesture through several redundant channels:
//! the primary handler, capture and bubble phase duplicates, and a delayed
//! fallback timer. The [`Reconciler`] turns that stream into one set of
//! authoritative transitions on the [`DragSession`]:
//!
//! - the first terminal signal for a gesture decides how it ends, and every
//!   later signal for it is ignored;
//! - the visual preview is released exactly once per gesture, whichever
//!   channel terminated it;
//! - a fallback deadline armed on pointer release ends gestures that no
//!   other channel terminated.

use crate::config::InteractionConfig;
use crate::error::{panic_message, InteractionResult};
use crate::fallback::{FallbackTimer, SignalReceiver, SignalSender};
use crate::session::{CancelReason, DragSession, DropOutcome, DropRejection};
use crate::state::HoverState;
use cardlink_types::{CardId, DataTransfer, DragPayload, GestureId};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Delivery path of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Primary,
    Capture,
    Bubble,
    Fallback,
}

/// A raw gesture signal, as delivered by one channel.
#[derive(Debug, Clone)]
pub enum GestureSignal {
    /// Pick-up. The payload must be fresh for every gesture.
    Start(DragPayload),
    /// Movement sample with the card under the pointer.
    Move { element: Option<CardId> },
    /// Pointer released; arms the fallback deadline.
    Release { at: Instant },
    /// Drop on `target` (or on no card). `transfer` carries the serialized
    /// payload when the channel has it.
    Drop {
        target: Option<CardId>,
        transfer: Option<DataTransfer>,
    },
    PointerLeave,
    Escape,
    Blur,
    End,
    FallbackTimeout { gesture: GestureId },
}

/// What ended a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminalCause {
    /// Dropped on a card (accepted or not).
    Dropped,
    /// Dropped over no card.
    DroppedOutside,
    Cancelled(CancelReason),
    TimedOut,
}

#[derive(Debug, Clone)]
pub struct Termination {
    pub gesture: GestureId,
    pub channel: Channel,
    pub cause: TerminalCause,
    /// Present when a drop decided the outcome.
    pub outcome: Option<DropOutcome>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IgnoreReason {
    NoGesture,
    AlreadyTerminated,
    /// Timeout or start for a gesture other than the tracked one.
    StaleGesture,
    DuplicateStart,
    /// Pointer leave with `cancel_on_pointer_leave` off.
    PointerLeaveDisabled,
}

#[derive(Debug, Clone)]
pub enum Reconciled {
    Started(GestureId),
    Hovered(HoverState),
    Armed { deadline: Instant },
    Terminated(Termination),
    Ignored(IgnoreReason),
}

/// Releases the visual drag preview of a gesture. Closures of the form
/// `Fn(GestureId)` implement this trait.
pub trait PreviewReleaser: Send + Sync {
    fn release(&self, gesture: GestureId);
}

impl<F> PreviewReleaser for F
where
    F: Fn(GestureId) + Send + Sync,
{
    fn release(&self, gesture: GestureId) {
        self(gesture)
    }
}

struct GestureTrack {
    id: GestureId,
    payload: Arc<DragPayload>,
    terminal: Option<TerminalCause>,
    preview_released: bool,
    deadline: Option<Instant>,
}

pub struct Reconciler {
    session: DragSession,
    releaser: Arc<dyn PreviewReleaser>,
    fallback_window: Duration,
    cancel_on_pointer_leave: bool,
    timer: Option<(FallbackTimer, SignalSender)>,
    current: Option<GestureTrack>,
}

impl Reconciler {
    pub fn new(
        session: DragSession,
        releaser: impl PreviewReleaser + 'static,
        config: &InteractionConfig,
    ) -> Self {
        Self {
            session,
            releaser: Arc::new(releaser),
            fallback_window: config.fallback_window(),
            cancel_on_pointer_leave: config.cancel_on_pointer_leave,
            timer: None,
            current: None,
        }
    }

    /// Arms a tokio [`FallbackTimer`] on every release, delivering the
    /// timeout through `signals`. Requires a tokio runtime.
    #[must_use]
    pub fn with_fallback_timer(mut self, signals: SignalSender) -> Self {
        self.timer = Some((FallbackTimer::new(self.fallback_window), signals));
        self
    }

    pub fn session(&self) -> &DragSession {
        &self.session
    }

    pub fn current_gesture(&self) -> Option<GestureId> {
        self.current.as_ref().map(|t| t.id)
    }

    pub fn terminal_cause(&self) -> Option<TerminalCause> {
        self.current.as_ref().and_then(|t| t.terminal)
    }

    pub fn is_terminated(&self) -> bool {
        self.terminal_cause().is_some()
    }

    pub fn fallback_deadline(&self) -> Option<Instant> {
        self.current.as_ref().and_then(|t| t.deadline)
    }

    /// Feeds one signal through the reducer.
    pub fn dispatch(&mut self, channel: Channel, signal: GestureSignal) -> InteractionResult<Reconciled> {
        match signal {
            GestureSignal::Start(payload) => self.start(channel, payload),
            other => self.advance(channel, other),
        }
    }

    /// Receives the next signal from a host channel and dispatches it.
    /// Returns `None` once every sender is gone.
    pub async fn next_signal(
        &mut self,
        signals: &mut SignalReceiver,
    ) -> Option<InteractionResult<Reconciled>> {
        let (channel, signal) = signals.recv().await?;
        Some(self.dispatch(channel, signal))
    }

    /// Fires the fallback if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> InteractionResult<Option<Termination>> {
        let gesture = match &self.current {
            Some(track) if track.terminal.is_none() => match track.deadline {
                Some(deadline) if now >= deadline => track.id,
                _ => return Ok(None),
            },
            _ => return Ok(None),
        };
        match self.dispatch(Channel::Fallback, GestureSignal::FallbackTimeout { gesture })? {
            Reconciled::Terminated(termination) => Ok(Some(termination)),
            _ => Ok(None),
        }
    }

    /// Releases the tracked gesture's preview. Only the first call per
    /// gesture reaches the [`PreviewReleaser`]; returns whether it did.
    pub fn release_preview(&mut self) -> bool {
        let Some(track) = self.current.as_mut() else {
            return false;
        };
        if track.preview_released {
            return false;
        }
        track.preview_released = true;
        let gesture = track.id;

        if let Err(panic) = catch_unwind(AssertUnwindSafe(|| self.releaser.release(gesture))) {
            error!(
                gesture = %gesture,
                "Preview releaser panicked: {}",
                panic_message(panic.as_ref())
            );
        }
        debug!(gesture = %gesture, "Drag preview released");
        true
    }

    fn start(&mut self, channel: Channel, payload: DragPayload) -> InteractionResult<Reconciled> {
        if let Some(track) = &self.current {
            if *track.payload == payload {
                debug!(gesture = %track.id, channel = ?channel, "Duplicate start ignored");
                return Ok(Reconciled::Ignored(IgnoreReason::DuplicateStart));
            }
        }
        self.settle_previous(channel);

        let retained = Arc::new(payload.clone());
        let gesture = self.session.begin(payload)?;
        self.current = Some(GestureTrack {
            id: gesture,
            payload: retained,
            terminal: None,
            preview_released: false,
            deadline: None,
        });
        Ok(Reconciled::Started(gesture))
    }

    /// Closes a tracked gesture whose session was reset outside the
    /// reconciler, and makes sure its preview is gone.
    fn settle_previous(&mut self, channel: Channel) {
        let Some(track) = &self.current else {
            return;
        };
        if track.terminal.is_some() {
            self.release_preview();
        } else if self.session.active_gesture() != Some(track.id) {
            self.terminate(channel, TerminalCause::Cancelled(CancelReason::External), None);
        }
    }

    fn advance(&mut self, channel: Channel, signal: GestureSignal) -> InteractionResult<Reconciled> {
        let Some(track) = &self.current else {
            return Ok(Reconciled::Ignored(IgnoreReason::NoGesture));
        };
        let gesture = track.id;

        if let GestureSignal::FallbackTimeout { gesture: timed_out } = &signal {
            if *timed_out != gesture {
                return Ok(Reconciled::Ignored(IgnoreReason::StaleGesture));
            }
        }
        if track.terminal.is_some() {
            debug!(gesture = %gesture, channel = ?channel, "Signal after termination ignored");
            return Ok(Reconciled::Ignored(IgnoreReason::AlreadyTerminated));
        }
        if self.session.active_gesture() != Some(gesture) {
            return Ok(self.terminate(
                channel,
                TerminalCause::Cancelled(CancelReason::External),
                None,
            ));
        }

        match signal {
            GestureSignal::Start(_) => Ok(Reconciled::Ignored(IgnoreReason::DuplicateStart)),
            GestureSignal::Move { element } => {
                let hover = self.session.hover(gesture, element.as_ref())?;
                Ok(Reconciled::Hovered(hover))
            }
            GestureSignal::Release { at } => Ok(self.arm(gesture, at)),
            GestureSignal::Drop { target, transfer } => {
                let structured = transfer.as_ref().and_then(|t| match t.read_payload() {
                    Ok(payload) => Some(Arc::new(payload)),
                    Err(e) => {
                        debug!(gesture = %gesture, "Using retained payload: {}", e);
                        None
                    }
                });
                let outcome = match self.session.drop(gesture, target.as_ref(), structured) {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!(gesture = %gesture, channel = ?channel, "Drop failed: {}", e);
                        self.terminate(
                            channel,
                            TerminalCause::Cancelled(CancelReason::External),
                            None,
                        );
                        return Err(e);
                    }
                };
                let cause = match &outcome {
                    DropOutcome::Rejected(DropRejection::NoTarget) => TerminalCause::DroppedOutside,
                    _ => TerminalCause::Dropped,
                };
                Ok(self.terminate(channel, cause, Some(outcome)))
            }
            GestureSignal::PointerLeave if !self.cancel_on_pointer_leave => {
                Ok(Reconciled::Ignored(IgnoreReason::PointerLeaveDisabled))
            }
            GestureSignal::PointerLeave => Ok(self.cancel(channel, gesture, CancelReason::PointerLeave)),
            GestureSignal::Escape => Ok(self.cancel(channel, gesture, CancelReason::Escape)),
            GestureSignal::Blur => Ok(self.cancel(channel, gesture, CancelReason::Blur)),
            GestureSignal::End => Ok(self.cancel(channel, gesture, CancelReason::End)),
            GestureSignal::FallbackTimeout { .. } => {
                self.session.cancel(gesture, CancelReason::FallbackTimeout);
                Ok(self.terminate(channel, TerminalCause::TimedOut, None))
            }
        }
    }

    fn arm(&mut self, gesture: GestureId, at: Instant) -> Reconciled {
        let candidate = at + self.fallback_window;
        let Some(track) = self.current.as_mut() else {
            return Reconciled::Ignored(IgnoreReason::NoGesture);
        };
        // Duplicate releases keep the first deadline.
        if let Some(existing) = track.deadline {
            return Reconciled::Armed { deadline: existing };
        }
        track.deadline = Some(candidate);
        if let Some((timer, signals)) = self.timer.as_mut() {
            timer.arm(gesture, signals.clone());
        }
        debug!(gesture = %gesture, "Fallback armed");
        Reconciled::Armed { deadline: candidate }
    }

    fn cancel(&mut self, channel: Channel, gesture: GestureId, reason: CancelReason) -> Reconciled {
        self.session.cancel(gesture, reason);
        self.terminate(channel, TerminalCause::Cancelled(reason), None)
    }

    fn terminate(
        &mut self,
        channel: Channel,
        cause: TerminalCause,
        outcome: Option<DropOutcome>,
    ) -> Reconciled {
        let Some(track) = self.current.as_mut() else {
            return Reconciled::Ignored(IgnoreReason::NoGesture);
        };
        track.terminal = Some(cause);
        track.deadline = None;
        let gesture = track.id;

        if let Some((timer, _)) = self.timer.as_mut() {
            timer.disarm();
        }
        self.release_preview();
        info!(gesture = %gesture, channel = ?channel, cause = ?cause, "Gesture terminated");
        Reconciled::Terminated(Termination {
            gesture,
            channel,
            cause,
            outcome,
        })
    }
}
