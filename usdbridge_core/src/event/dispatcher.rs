// Copyright 2026 the Usdbridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A single named event and its weight-ordered callbacks.

use alloc::boxed::Box;
use alloc::string::ToString;
use alloc::vec::Vec;

use super::callback::{Callback, Payload, ScriptRunner, UserData};
use super::error::EventError;
use super::id::{CallbackId, EventId, MAX_SEQUENCE, make_callback_id};

/// Broad classification of an event, used for diagnostics and filtering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Not tied to any particular source.
    #[default]
    Generic,
    /// Raised from a host (DCC) notification.
    Host,
    /// Raised from a USD stage or layer notice.
    Usd,
    /// Raised by a schema translator.
    Schema,
    /// Defined by a third-party plugin.
    Custom,
}

/// Owns the callbacks of one event.
///
/// Callbacks are kept sorted by ascending weight; callbacks of equal weight
/// keep their registration order. Tags are unique within a dispatcher.
#[derive(Debug)]
pub struct EventDispatcher {
    name: Box<str>,
    id: EventId,
    kind: EventKind,
    associated_data: UserData,
    parent_callback: Option<CallbackId>,
    callbacks: Vec<Callback>,
    // Highest id ever issued here, so ids are not reused after removals.
    pub(super) last_issued: CallbackId,
}

impl EventDispatcher {
    /// Creates an empty dispatcher.
    ///
    /// Dispatchers are normally created through
    /// [`EventScheduler::register_event`](super::EventScheduler::register_event);
    /// a standalone dispatcher with [`EventId::INVALID`] issues "local"
    /// callback ids.
    #[must_use]
    pub fn new(
        name: &str,
        id: EventId,
        kind: EventKind,
        associated_data: UserData,
        parent_callback: Option<CallbackId>,
    ) -> Self {
        Self {
            name: name.into(),
            id,
            kind,
            associated_data,
            parent_callback,
            callbacks: Vec::new(),
            last_issued: make_callback_id(id, 0),
        }
    }

    /// Returns the event name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the event id.
    #[must_use]
    pub fn id(&self) -> EventId {
        self.id
    }

    /// Returns the event classification.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Returns the data distinguishing same-named events.
    #[must_use]
    pub fn associated_data(&self) -> UserData {
        self.associated_data
    }

    /// Returns the callback this event is triggered from, if it is a child
    /// event.
    #[must_use]
    pub fn parent_callback_id(&self) -> Option<CallbackId> {
        self.parent_callback
    }

    /// Returns the callbacks in dispatch order.
    #[must_use]
    pub fn callbacks(&self) -> &[Callback] {
        &self.callbacks
    }

    /// Returns the number of registered callbacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Returns `true` if no callbacks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Registers a callback and returns its new id.
    ///
    /// Fails if a callback with the same tag is already registered; the
    /// existing callback is left untouched.
    pub fn register_callback(
        &mut self,
        tag: &str,
        payload: Payload,
        weight: u32,
    ) -> Result<CallbackId, EventError> {
        self.check_tag(tag)?;
        let id = self.next_callback_id()?;
        self.insert_sorted(Callback::new(tag, payload, weight, id));
        tracing::trace!(event = %self.name, tag, weight, id = ?id, "registered callback");
        Ok(id)
    }

    /// Removes the callback with the given id. Returns whether it existed.
    pub fn unregister_callback(&mut self, id: CallbackId) -> bool {
        self.take_callback(id).is_some()
    }

    /// Removes the callback with the given id and hands it back, e.g. to
    /// re-register it on another event with
    /// [`insert_callback`](Self::insert_callback).
    pub fn take_callback(&mut self, id: CallbackId) -> Option<Callback> {
        let pos = self.callbacks.iter().position(|c| c.id() == id)?;
        Some(self.callbacks.remove(pos))
    }

    /// Inserts a callback taken from another dispatcher.
    ///
    /// The callback gets a fresh id from this event; its tag must not clash
    /// with an existing one.
    pub fn insert_callback(&mut self, mut callback: Callback) -> Result<CallbackId, EventError> {
        self.check_tag(callback.tag())?;
        let id = self.next_callback_id()?;
        callback.set_id(id);
        self.insert_sorted(callback);
        Ok(id)
    }

    /// Issues an id for a callback that [`insert_reserved`](Self::insert_reserved)
    /// will bring in later.
    pub(crate) fn reserve_callback_id(&mut self) -> Result<CallbackId, EventError> {
        self.next_callback_id()
    }

    pub(crate) fn insert_reserved(&mut self, mut callback: Callback, id: CallbackId) {
        callback.set_id(id);
        self.insert_sorted(callback);
    }

    /// Finds a callback by id.
    #[must_use]
    pub fn find_callback(&self, id: CallbackId) -> Option<&Callback> {
        self.callbacks.iter().find(|c| c.id() == id)
    }

    /// Finds a callback by tag.
    #[must_use]
    pub fn find_callback_by_tag(&self, tag: &str) -> Option<&Callback> {
        self.callbacks.iter().find(|c| c.tag() == tag)
    }

    pub(crate) fn set_parent_callback(&mut self, parent: Option<CallbackId>) {
        self.parent_callback = parent;
    }

    pub(crate) fn find_callback_mut(&mut self, id: CallbackId) -> Option<&mut Callback> {
        self.callbacks.iter_mut().find(|c| c.id() == id)
    }

    /// Hands every callback, in weight order, to `strategy`.
    ///
    /// The strategy knows the native signature for this event and is
    /// responsible for calling the payload. A panic inside the strategy ends
    /// the dispatch; the remaining callbacks do not run.
    pub fn trigger_event<F>(&self, mut strategy: F)
    where
        F: FnMut(&Callback),
    {
        for callback in &self.callbacks {
            strategy(callback);
        }
    }

    /// Dispatches with the default strategy: native payloads of the
    /// [`CallbackFn`](super::CallbackFn) shape are called with their user
    /// data, scripted payloads go to `runner`.
    pub fn trigger(&self, runner: &mut dyn ScriptRunner) {
        self.trigger_event(|callback| match callback.payload() {
            Payload::Native(native) => {
                if !native.invoke() {
                    tracing::warn!(
                        event = %self.name,
                        tag = callback.tag(),
                        "native callback has a custom signature; skipped by the default trigger"
                    );
                }
            }
            Payload::Script(script) => runner.run(script.language(), script.command()),
        });
    }

    // -- Internal helpers --

    fn check_tag(&self, tag: &str) -> Result<(), EventError> {
        if self.callbacks.iter().any(|c| c.tag() == tag) {
            tracing::error!(event = %self.name, tag, "duplicate callback tag");
            return Err(EventError::DuplicateTag {
                event: self.name.to_string(),
                tag: tag.to_string(),
            });
        }
        Ok(())
    }

    fn next_callback_id(&mut self) -> Result<CallbackId, EventError> {
        let floor = self.last_issued.max(make_callback_id(self.id, 0));
        let current_max = self
            .callbacks
            .iter()
            .map(Callback::id)
            .max()
            .unwrap_or(floor);
        let base = current_max.max(floor);
        if base.sequence() >= MAX_SEQUENCE {
            return Err(EventError::CallbackIdsExhausted(self.name.to_string()));
        }
        let id = make_callback_id(self.id, base.sequence() + 1);
        self.last_issued = id;
        Ok(id)
    }

    fn insert_sorted(&mut self, callback: Callback) {
        let weight = callback.weight();
        let pos = self.callbacks.partition_point(|c| c.weight() <= weight);
        self.callbacks.insert(pos, callback);
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::event::callback::{CallbackFn, ScriptLanguage};

    fn noop(_: UserData) {}

    fn dispatcher(id: u16) -> EventDispatcher {
        EventDispatcher::new("test", EventId(id), EventKind::Generic, UserData::NONE, None)
    }

    fn weights(d: &EventDispatcher) -> Vec<u32> {
        d.callbacks().iter().map(Callback::weight).collect()
    }

    #[derive(Default)]
    struct Recorder {
        ran: Vec<String>,
    }

    impl ScriptRunner for Recorder {
        fn run(&mut self, _language: ScriptLanguage, command: &str) {
            self.ran.push(command.into());
        }
    }

    #[test]
    fn lighter_callbacks_sort_first() {
        let mut d = dispatcher(1);
        let heavy = d
            .register_callback("heavy", Payload::native(noop, UserData::NONE), 1001)
            .unwrap();
        let light = d
            .register_callback("light", Payload::native(noop, UserData::NONE), 1000)
            .unwrap();
        assert_eq!(d.callbacks()[0].id(), light);
        assert_eq!(d.callbacks()[1].id(), heavy);
    }

    #[test]
    fn equal_weights_keep_registration_order() {
        let mut d = dispatcher(1);
        for tag in ["a", "b", "c"] {
            d.register_callback(tag, Payload::native(noop, UserData::NONE), 10)
                .unwrap();
        }
        d.register_callback("first", Payload::native(noop, UserData::NONE), 1)
            .unwrap();
        let tags: Vec<&str> = d.callbacks().iter().map(Callback::tag).collect();
        assert_eq!(tags, vec!["first", "a", "b", "c"]);
    }

    #[test]
    fn weights_stay_sorted() {
        let mut d = dispatcher(2);
        for (i, w) in [50_u32, 3, 3, 900, 0, 49, 51].into_iter().enumerate() {
            let tag = alloc::format!("cb{i}");
            d.register_callback(&tag, Payload::native(noop, UserData::NONE), w)
                .unwrap();
        }
        assert_eq!(weights(&d), vec![0, 3, 3, 49, 50, 51, 900]);
    }

    #[test]
    fn duplicate_tag_is_rejected() {
        let mut d = dispatcher(1);
        let first = d
            .register_callback("same", Payload::native(noop, UserData(1)), 5)
            .unwrap();
        let second = d.register_callback("same", Payload::native(noop, UserData(2)), 1);
        assert!(matches!(second, Err(EventError::DuplicateTag { .. })));
        assert_eq!(d.len(), 1);
        assert_eq!(d.callbacks()[0].id(), first);
        assert_eq!(
            d.callbacks()[0].as_native().map(|n| n.user_data()),
            Some(UserData(1))
        );
    }

    #[test]
    fn ids_embed_the_event_and_never_repeat() {
        let mut d = dispatcher(7);
        let a = d
            .register_callback("a", Payload::native(noop, UserData::NONE), 0)
            .unwrap();
        let b = d
            .register_callback("b", Payload::native(noop, UserData::NONE), 0)
            .unwrap();
        assert_eq!(a.event(), EventId(7));
        assert_eq!(a.sequence(), 1);
        assert_eq!(b.sequence(), 2);

        assert!(d.unregister_callback(b));
        let c = d
            .register_callback("c", Payload::native(noop, UserData::NONE), 0)
            .unwrap();
        assert_ne!(c, b, "id of a removed callback is not reissued");
        assert_eq!(c.sequence(), 3);
    }

    #[test]
    fn unregister_reports_misses() {
        let mut d = dispatcher(1);
        let id = d
            .register_callback("a", Payload::native(noop, UserData::NONE), 0)
            .unwrap();
        assert!(d.unregister_callback(id));
        assert!(!d.unregister_callback(id));
        assert!(d.is_empty());
    }

    #[test]
    fn take_and_insert_moves_between_dispatchers() {
        let mut from = dispatcher(1);
        let mut to = dispatcher(2);
        let id = from
            .register_callback("mover", Payload::script("ls", ScriptLanguage::Mel), 20)
            .unwrap();
        let taken = from.take_callback(id).expect("callback exists");
        assert!(from.is_empty());

        let new_id = to.insert_callback(taken).unwrap();
        assert_eq!(new_id.event(), EventId(2));
        let moved = to.find_callback(new_id).expect("moved callback");
        assert_eq!(moved.tag(), "mover");
        assert_eq!(moved.weight(), 20);
        assert!(moved.is_script());
    }

    #[test]
    fn insert_rejects_clashing_tag() {
        let mut a = dispatcher(1);
        let mut b = dispatcher(2);
        let id = a
            .register_callback("x", Payload::native(noop, UserData::NONE), 0)
            .unwrap();
        b.register_callback("x", Payload::native(noop, UserData::NONE), 0)
            .unwrap();
        let taken = a.take_callback(id).unwrap();
        assert!(b.insert_callback(taken).is_err());
        assert_eq!(b.len(), 1);
    }

    static CALLS: AtomicUsize = AtomicUsize::new(0);
    static SEEN: AtomicUsize = AtomicUsize::new(0);

    fn count(data: UserData) {
        CALLS.fetch_add(1, Ordering::SeqCst);
        SEEN.store(data.0, Ordering::SeqCst);
    }

    #[test]
    fn trigger_calls_native_once_with_user_data() {
        let mut d = dispatcher(3);
        d.register_callback("count", Payload::native(count, UserData(0x1234)), 0)
            .unwrap();
        let before = CALLS.load(Ordering::SeqCst);
        d.trigger(&mut Recorder::default());
        assert_eq!(CALLS.load(Ordering::SeqCst), before + 1);
        assert_eq!(SEEN.load(Ordering::SeqCst), 0x1234);
    }

    #[test]
    fn trigger_forwards_scripts_in_weight_order() {
        let mut d = dispatcher(3);
        d.register_callback("late", Payload::script("late", ScriptLanguage::Python), 9)
            .unwrap();
        d.register_callback("early", Payload::script("early", ScriptLanguage::Mel), 1)
            .unwrap();
        let mut runner = Recorder::default();
        d.trigger(&mut runner);
        assert_eq!(runner.ran, vec![String::from("early"), String::from("late")]);
    }

    #[test]
    fn trigger_event_uses_the_strategy_for_custom_shapes() {
        fn scaled(data: UserData, factor: usize) -> usize {
            data.0 * factor
        }
        let mut d = dispatcher(4);
        let shape: fn(UserData, usize) -> usize = scaled;
        d.register_callback(
            "scaled",
            Payload::Native(crate::event::NativeCallback::with_shape(shape, UserData(3))),
            0,
        )
        .unwrap();
        d.register_callback("plain", Payload::native(noop as CallbackFn, UserData::NONE), 1)
            .unwrap();

        let mut results = Vec::new();
        d.trigger_event(|cb| {
            if let Some(native) = cb.as_native()
                && let Some(f) = native.function::<fn(UserData, usize) -> usize>()
            {
                results.push(f(native.user_data(), 10));
            }
        });
        assert_eq!(results, vec![30]);
    }
}
