//! The card registry.
//!
//! One [`CardRegistry`] is shared (as an `Arc`) by every card in a
//! workspace. It owns the card declarations, the declarative interaction
//! bindings, the global enable switch and the current drag session state.
//! Acceptance queries are pure functions of the registered configuration
//! and the payload; the drag state is only changed through
//! [`CardRegistry::set_drag_state`] and the crate-internal transitions used
//! by the session, and every change is pushed to subscribers synchronously.

use crate::config::InteractionConfig;
use crate::error::{panic_message, InteractionError, InteractionResult};
use crate::state::{DragSessionState, DragStatePatch};
use cardlink_model::{AvailableAction, CardConfig, DragConfig, DropZoneConfig, InteractionBinding};
use cardlink_types::{CardId, DragPayload};
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use tracing::{debug, error, info};

/// Callback invoked with the full drag state after every change.
pub type DragStateListener = Arc<dyn Fn(&DragSessionState) + Send + Sync>;

struct ListenerEntry {
    id: u64,
    listener: DragStateListener,
}

type ListenerList = Mutex<Vec<ListenerEntry>>;

/// Handle returned by [`CardRegistry::subscribe_to_drag_state`].
///
/// Dropping the handle does not unsubscribe; call [`Subscription::unsubscribe`].
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    listeners: Weak<ListenerList>,
}

impl Subscription {
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Removes the listener. Returns false if it was already gone (for
    /// example because the registry was disposed).
    pub fn unsubscribe(self) -> bool {
        let Some(listeners) = self.listeners.upgrade() else {
            return false;
        };
        let mut list = listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let before = list.len();
        list.retain(|entry| entry.id != self.id);
        list.len() != before
    }
}

pub(crate) struct RegistryState {
    pub(crate) cards: BTreeMap<CardId, Arc<CardConfig>>,
    pub(crate) interactions: Vec<InteractionBinding>,
    pub(crate) enabled: bool,
    pub(crate) disposed: bool,
    pub(crate) drag: DragSessionState,
}

pub struct CardRegistry {
    state: RwLock<RegistryState>,
    listeners: Arc<ListenerList>,
    next_listener_id: AtomicU64,
}

impl Default for CardRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CardRegistry {
    /// An enabled registry with no cards.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState {
                cards: BTreeMap::new(),
                interactions: Vec::new(),
                enabled: true,
                disposed: false,
                drag: DragSessionState::default(),
            }),
            listeners: Arc::new(Mutex::new(Vec::new())),
            next_listener_id: AtomicU64::new(1),
        }
    }

    /// Creates a shared registry seeded from `config`.
    pub fn create(config: &InteractionConfig) -> Arc<Self> {
        let registry = Self::new();
        {
            let mut state = registry.write();
            state.enabled = config.enabled;
            for binding in &config.interactions {
                if !state.interactions.contains(binding) {
                    state.interactions.push(binding.clone());
                }
            }
        }
        info!(
            enabled = config.enabled,
            interactions = config.interactions.len(),
            "Card registry created"
        );
        Arc::new(registry)
    }

    /// Drops every card, binding and subscriber and refuses further
    /// registrations. The drag state returns to idle without notification.
    pub fn dispose(&self) {
        let cards = {
            let mut state = self.write();
            if state.disposed {
                return;
            }
            state.disposed = true;
            state.drag = DragSessionState::default();
            state.interactions.clear();
            let count = state.cards.len();
            state.cards.clear();
            count
        };
        self.lock_listeners().clear();
        info!(cards, "Card registry disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.read().disposed
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_listeners(&self) -> MutexGuard<'_, Vec<ListenerEntry>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ================================================================
    // Card registration
    // ================================================================

    /// Validates and stores a card, replacing any card with the same id.
    pub fn register_card(&self, config: CardConfig) -> InteractionResult<()> {
        config.validate()?;
        let card_id = config.id.clone();
        let zones = config.drop_zones.len();
        let replaced = {
            let mut state = self.write();
            if state.disposed {
                return Err(InteractionError::Disposed);
            }
            state.cards.insert(card_id.clone(), Arc::new(config)).is_some()
        };
        if replaced {
            debug!(card_id = %card_id, zones, "Card re-registered");
        } else {
            debug!(card_id = %card_id, zones, "Card registered");
        }
        Ok(())
    }

    /// Removes a card. Unknown ids are a no-op.
    pub fn unregister_card(&self, card_id: &str) -> Option<Arc<CardConfig>> {
        let removed = self.write().cards.remove(card_id);
        if removed.is_some() {
            debug!(card_id = %card_id, "Card unregistered");
        }
        removed
    }

    pub fn get_card_config(&self, card_id: &str) -> Option<Arc<CardConfig>> {
        self.read().cards.get(card_id).cloned()
    }

    /// Every registered card, ordered by id.
    pub fn get_all_cards(&self) -> Vec<Arc<CardConfig>> {
        self.read().cards.values().cloned().collect()
    }

    pub fn card_count(&self) -> usize {
        self.read().cards.len()
    }

    /// The card's drop zones; empty for unknown cards.
    pub fn get_drop_zones_for_card(&self, card_id: &str) -> Vec<DropZoneConfig> {
        self.get_card_config(card_id)
            .map(|card| card.drop_zones.clone())
            .unwrap_or_default()
    }

    pub fn get_drag_config_for_card(&self, card_id: &str) -> Option<DragConfig> {
        self.get_card_config(card_id)
            .and_then(|card| card.drag_config.clone())
    }

    // ================================================================
    // Acceptance queries
    // ================================================================

    /// True iff at least one of the card's drop zones accepts the payload.
    /// Unknown cards accept nothing.
    pub fn can_card_accept(&self, card_id: &str, payload: &DragPayload) -> bool {
        self.get_card_config(card_id)
            .is_some_and(|card| card.drop_zones.iter().any(|zone| zone.accepts(payload)))
    }

    /// Non-disabled actions of every accepting zone, in zone declaration
    /// order and then action id order.
    pub fn get_available_actions(&self, card_id: &str, payload: &DragPayload) -> Vec<AvailableAction> {
        let Some(card) = self.get_card_config(card_id) else {
            return Vec::new();
        };
        card.drop_zones
            .iter()
            .filter(|zone| zone.accepts(payload))
            .flat_map(|zone| {
                zone.enabled_actions().map(|action| AvailableAction {
                    card_id: card.id.clone(),
                    target_card_type: card.card_type.clone(),
                    source_data_type: payload.source_data_type.clone(),
                    drop_zone_id: zone.id.clone(),
                    action: action.clone(),
                })
            })
            .collect()
    }

    // ================================================================
    // Interaction bindings
    // ================================================================

    /// Adds a declarative binding. Duplicates are ignored.
    pub fn register_interaction(&self, binding: InteractionBinding) -> InteractionResult<()> {
        let mut state = self.write();
        if state.disposed {
            return Err(InteractionError::Disposed);
        }
        if !state.interactions.contains(&binding) {
            debug!(
                source_type = %binding.source_type,
                target_type = %binding.target_type,
                action_id = %binding.action_id,
                "Interaction registered"
            );
            state.interactions.push(binding);
        }
        Ok(())
    }

    pub fn unregister_interaction(&self, binding: &InteractionBinding) -> bool {
        let mut state = self.write();
        let before = state.interactions.len();
        state.interactions.retain(|b| b != binding);
        state.interactions.len() != before
    }

    pub fn interactions(&self) -> Vec<InteractionBinding> {
        self.read().interactions.clone()
    }

    /// First binding registered for a (source type, target type) pair.
    pub fn find_interaction(&self, source_type: &str, target_type: &str) -> Option<InteractionBinding> {
        self.read()
            .interactions
            .iter()
            .find(|b| b.source_type == source_type && b.target_type == target_type)
            .cloned()
    }

    // ================================================================
    // Global switch
    // ================================================================

    /// Turns drag interactions on or off. Only new gestures are affected.
    pub fn set_enabled(&self, enabled: bool) {
        self.write().enabled = enabled;
        info!(enabled, "Drag interactions toggled");
    }

    pub fn is_enabled(&self) -> bool {
        self.read().enabled
    }

    // ================================================================
    // Drag state
    // ================================================================

    /// Snapshot of the current drag state.
    pub fn get_drag_state(&self) -> DragSessionState {
        self.read().drag.clone()
    }

    /// Merges `patch` into the drag state and notifies every subscriber.
    /// An empty patch changes nothing and notifies nobody.
    pub fn set_drag_state(&self, patch: DragStatePatch) {
        if patch.is_empty() {
            return;
        }
        let snapshot = {
            let mut state = self.write();
            patch.apply_to(&mut state.drag);
            state.drag.clone()
        };
        self.notify(&snapshot);
    }

    /// Returns the drag state to idle.
    pub fn reset_drag_state(&self) {
        self.set_drag_state(DragStatePatch::reset());
    }

    /// Check-and-set on the drag state under a single write lock. The
    /// closure sees the whole registry state and returns the patch to apply
    /// together with a value for the caller. Subscribers are notified after
    /// the lock is released.
    pub(crate) fn transition<T>(
        &self,
        f: impl FnOnce(&RegistryState) -> InteractionResult<(DragStatePatch, T)>,
    ) -> InteractionResult<T> {
        let (snapshot, value) = {
            let mut state = self.write();
            let (patch, value) = f(&state)?;
            if patch.is_empty() {
                return Ok(value);
            }
            patch.apply_to(&mut state.drag);
            (state.drag.clone(), value)
        };
        self.notify(&snapshot);
        Ok(value)
    }

    /// Registers a listener. It is called once immediately with the current
    /// state and then after every change, in subscription order.
    pub fn subscribe_to_drag_state(
        &self,
        listener: impl Fn(&DragSessionState) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        let listener: DragStateListener = Arc::new(listener);
        self.lock_listeners().push(ListenerEntry {
            id,
            listener: Arc::clone(&listener),
        });
        let current = self.get_drag_state();
        Self::deliver(id, &listener, &current);
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock_listeners().len()
    }

    fn notify(&self, state: &DragSessionState) {
        let listeners: Vec<(u64, DragStateListener)> = self
            .lock_listeners()
            .iter()
            .map(|entry| (entry.id, Arc::clone(&entry.listener)))
            .collect();
        for (id, listener) in &listeners {
            Self::deliver(*id, listener, state);
        }
    }

    fn deliver(id: u64, listener: &DragStateListener, state: &DragSessionState) {
        if let Err(panic) = catch_unwind(AssertUnwindSafe(|| listener(state))) {
            error!(
                subscription = id,
                "Drag state listener panicked: {}",
                panic_message(panic.as_ref())
            );
        }
    }
}
