// Copyright 2026 the Usdbridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Registry of named events.
//!
//! The [`EventScheduler`] owns every [`EventDispatcher`], kept sorted by
//! [`EventId`] so lookups are a binary search. Callback operations decode the
//! owning event from the [`CallbackId`] and forward to that dispatcher, so
//! they never scan the whole registry.
//!
//! The scheduler is an ordinary value: whoever sits at the top of the host
//! integration creates one and passes it down. All access is expected to come
//! from the host's main thread.

use alloc::boxed::Box;
use alloc::string::ToString;
use alloc::vec::Vec;

use super::callback::{Callback, Payload, ScriptRunner, UserData};
use super::dispatcher::{EventDispatcher, EventKind};
use super::error::EventError;
use super::id::{CallbackId, EventId};

/// Callback edits requested while an event is being triggered.
///
/// A trigger strategy cannot touch the scheduler while the dispatch loop is
/// borrowing it, so it queues edits here instead. They are applied in request
/// order once every callback has run.
#[derive(Debug, Default)]
pub struct PendingEdits {
    edits: Vec<Edit>,
}

#[derive(Debug)]
enum Edit {
    Register {
        event: EventId,
        tag: Box<str>,
        payload: Payload,
        weight: u32,
    },
    Unregister(CallbackId),
}

impl PendingEdits {
    /// Queues a callback registration.
    pub fn register_callback(&mut self, event: EventId, tag: &str, payload: Payload, weight: u32) {
        self.edits.push(Edit::Register {
            event,
            tag: tag.into(),
            payload,
            weight,
        });
    }

    /// Queues a callback removal.
    pub fn unregister_callback(&mut self, id: CallbackId) {
        self.edits.push(Edit::Unregister(id));
    }

    /// Returns `true` if nothing was queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}

/// The event registry.
#[derive(Debug, Default)]
pub struct EventScheduler {
    events: Vec<EventDispatcher>,
}

impl EventScheduler {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all events in id order.
    #[must_use]
    pub fn events(&self) -> &[EventDispatcher] {
        &self.events
    }

    // -- Events --

    /// Creates an event and returns its id.
    ///
    /// The id is the smallest one not in use. `associated_data` distinguishes
    /// events that share a name (for instance one event per node); a second
    /// event with the same name and data is rejected. When
    /// `parent_callback` is given the new event is a child of that callback:
    /// it is recorded on the callback and is removed along with it.
    pub fn register_event(
        &mut self,
        name: &str,
        kind: EventKind,
        associated_data: UserData,
        parent_callback: Option<CallbackId>,
    ) -> Result<EventId, EventError> {
        if self.event_by_name(name, associated_data).is_some() {
            tracing::error!(event = name, "event is already registered");
            return Err(EventError::DuplicateEvent {
                name: name.to_string(),
            });
        }
        if let Some(parent) = parent_callback
            && self.find_callback(parent).is_none()
        {
            tracing::error!(event = name, parent = ?parent, "parent callback does not exist");
            return Err(EventError::UnknownCallback(parent));
        }

        let id = self.first_free_id()?;
        let pos = self.events.partition_point(|e| e.id() < id);
        self.events.insert(
            pos,
            EventDispatcher::new(name, id, kind, associated_data, parent_callback),
        );
        if let Some(parent) = parent_callback
            && let Some(callback) = self.find_callback_mut(parent)
        {
            callback.add_child_event(id);
        }
        tracing::debug!(event = name, id = ?id, "registered event");
        Ok(id)
    }

    /// Destroys an event, its callbacks, and any child events hanging off
    /// those callbacks. Returns whether the event existed.
    pub fn unregister_event(&mut self, id: EventId) -> bool {
        let Ok(pos) = self.position(id) else {
            return false;
        };
        let dispatcher = self.events.remove(pos);
        if let Some(parent) = dispatcher.parent_callback_id()
            && let Some(callback) = self.find_callback_mut(parent)
        {
            callback.remove_child_event(id);
        }
        for callback in dispatcher.callbacks() {
            for &child in callback.child_events() {
                self.unregister_event(child);
            }
        }
        tracing::debug!(event = dispatcher.name(), id = ?id, "unregistered event");
        true
    }

    /// Destroys the event with the given name and associated data.
    pub fn unregister_event_by_name(&mut self, name: &str, associated_data: UserData) -> bool {
        match self.event_by_name(name, associated_data) {
            Some(event) => {
                let id = event.id();
                self.unregister_event(id)
            }
            None => false,
        }
    }

    /// Looks up an event by id.
    #[must_use]
    pub fn event(&self, id: EventId) -> Option<&EventDispatcher> {
        let pos = self.position(id).ok()?;
        Some(&self.events[pos])
    }

    /// Looks up an event by id, mutably.
    #[must_use]
    pub fn event_mut(&mut self, id: EventId) -> Option<&mut EventDispatcher> {
        let pos = self.position(id).ok()?;
        Some(&mut self.events[pos])
    }

    /// Looks up an event by name and associated data.
    #[must_use]
    pub fn event_by_name(&self, name: &str, associated_data: UserData) -> Option<&EventDispatcher> {
        self.events
            .iter()
            .find(|e| e.name() == name && e.associated_data() == associated_data)
    }

    // -- Callbacks --

    /// Registers a callback on the given event.
    pub fn register_callback(
        &mut self,
        event: EventId,
        tag: &str,
        payload: Payload,
        weight: u32,
    ) -> Result<CallbackId, EventError> {
        self.event_mut(event)
            .ok_or(EventError::UnknownEvent(event))?
            .register_callback(tag, payload, weight)
    }

    /// Registers a callback on the event with the given name and data.
    pub fn register_callback_by_name(
        &mut self,
        event: &str,
        associated_data: UserData,
        tag: &str,
        payload: Payload,
        weight: u32,
    ) -> Result<CallbackId, EventError> {
        let id = self
            .event_by_name(event, associated_data)
            .map(EventDispatcher::id)
            .ok_or_else(|| EventError::UnknownEventName(event.to_string()))?;
        self.register_callback(id, tag, payload, weight)
    }

    /// Removes a callback, and every child event registered on it.
    ///
    /// The owning event is decoded from the id, so this costs one binary
    /// search regardless of how many events exist.
    pub fn unregister_callback(&mut self, id: CallbackId) -> bool {
        let Some(callback) = self
            .event_mut(id.event())
            .and_then(|d| d.take_callback(id))
        else {
            return false;
        };
        for &child in callback.child_events() {
            self.unregister_event(child);
        }
        true
    }

    /// Finds a callback by id.
    #[must_use]
    pub fn find_callback(&self, id: CallbackId) -> Option<&Callback> {
        self.event(id.event())?.find_callback(id)
    }

    fn find_callback_mut(&mut self, id: CallbackId) -> Option<&mut Callback> {
        self.event_mut(id.event())?.find_callback_mut(id)
    }

    /// Moves a callback to another event and returns its new id.
    ///
    /// Child events of the callback stay attached to it under the new id.
    pub fn move_callback(&mut self, id: CallbackId, to: EventId) -> Result<CallbackId, EventError> {
        let tag = self
            .find_callback(id)
            .ok_or(EventError::UnknownCallback(id))?
            .tag()
            .to_string();
        let target = self.event(to).ok_or(EventError::UnknownEvent(to))?;
        if target.find_callback_by_tag(&tag).is_some() {
            tracing::error!(event = target.name(), tag = %tag, "duplicate callback tag");
            return Err(EventError::DuplicateTag {
                event: target.name().to_string(),
                tag,
            });
        }

        // The target id is issued first so a failure leaves the source intact.
        let new_id = self
            .event_mut(to)
            .ok_or(EventError::UnknownEvent(to))?
            .reserve_callback_id()?;
        let callback = self
            .event_mut(id.event())
            .and_then(|d| d.take_callback(id))
            .ok_or(EventError::UnknownCallback(id))?;
        let children: Vec<EventId> = callback.child_events().to_vec();
        self.event_mut(to)
            .ok_or(EventError::UnknownEvent(to))?
            .insert_reserved(callback, new_id);
        for child in children {
            if let Some(event) = self.event_mut(child) {
                event.set_parent_callback(Some(new_id));
            }
        }
        Ok(new_id)
    }

    // -- Dispatch --

    /// Triggers an event with a caller-supplied strategy.
    ///
    /// Edits queued on the [`PendingEdits`] are applied after the last
    /// callback has run; the ids of callbacks registered that way are
    /// returned in request order.
    pub fn trigger_event<F>(
        &mut self,
        id: EventId,
        mut strategy: F,
    ) -> Result<Vec<CallbackId>, EventError>
    where
        F: FnMut(&Callback, &mut PendingEdits),
    {
        let mut pending = PendingEdits::default();
        self.event(id)
            .ok_or(EventError::UnknownEvent(id))?
            .trigger_event(|callback| strategy(callback, &mut pending));
        Ok(self.apply(pending))
    }

    /// Triggers an event with the default strategy (see
    /// [`EventDispatcher::trigger`]).
    pub fn trigger(&self, id: EventId, runner: &mut dyn ScriptRunner) -> Result<(), EventError> {
        self.event(id)
            .ok_or(EventError::UnknownEvent(id))?
            .trigger(runner);
        Ok(())
    }

    /// Applies queued edits in order, returning the ids of new callbacks.
    ///
    /// Failed registrations are logged and skipped.
    pub fn apply(&mut self, pending: PendingEdits) -> Vec<CallbackId> {
        let mut registered = Vec::new();
        for edit in pending.edits {
            match edit {
                Edit::Register {
                    event,
                    tag,
                    payload,
                    weight,
                } => match self.register_callback(event, &tag, payload, weight) {
                    Ok(id) => registered.push(id),
                    Err(error) => {
                        tracing::warn!(%error, "deferred callback registration failed");
                    }
                },
                Edit::Unregister(id) => {
                    if !self.unregister_callback(id) {
                        tracing::debug!(id = ?id, "deferred unregister found no callback");
                    }
                }
            }
        }
        registered
    }

    // -- Internal helpers --

    fn position(&self, id: EventId) -> Result<usize, usize> {
        self.events.binary_search_by_key(&id, EventDispatcher::id)
    }

    /// Smallest id in `1..=u16::MAX` not taken by a registered event.
    fn first_free_id(&self) -> Result<EventId, EventError> {
        let mut candidate: u32 = 1;
        for event in &self.events {
            if u32::from(event.id().0) != candidate {
                break;
            }
            candidate += 1;
        }
        u16::try_from(candidate)
            .map(EventId)
            .map_err(|_| EventError::EventIdsExhausted)
    }
}
