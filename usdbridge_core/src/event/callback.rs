// Copyright 2026 the Usdbridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Callback records stored by an [`EventDispatcher`](super::EventDispatcher).

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::Any;
use core::cmp::Ordering;
use core::fmt;

use super::id::{CallbackId, EventId};

/// Opaque client data handed back to a native callback when it fires.
///
/// The core never interprets the value; it is typically an address or an
/// index into a table owned by the registering plugin.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct UserData(pub usize);

impl UserData {
    /// No client data.
    pub const NONE: Self = Self(0);
}

impl fmt::Debug for UserData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserData({:#x})", self.0)
    }
}

/// The default native callback shape: a plain function receiving its
/// registered [`UserData`].
pub type CallbackFn = fn(UserData);

/// Which interpreter a scripted callback runs in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScriptLanguage {
    /// The host's own command language.
    Mel,
    /// Python.
    Python,
}

/// Executes scripted callbacks on behalf of a dispatcher.
pub trait ScriptRunner {
    /// Runs `command` in the interpreter selected by `language`.
    fn run(&mut self, language: ScriptLanguage, command: &str);
}

/// A native function plus its client data.
///
/// The function is stored type-erased because different event families call
/// their callbacks with different signatures. The trigger strategy for an
/// event recovers the concrete shape with [`function`](Self::function).
pub struct NativeCallback {
    function: Box<dyn Any>,
    user_data: UserData,
}

impl NativeCallback {
    /// Wraps a function of the default [`CallbackFn`] shape.
    #[must_use]
    pub fn new(function: CallbackFn, user_data: UserData) -> Self {
        Self::with_shape(function, user_data)
    }

    /// Wraps a function value of any shape.
    ///
    /// Pass function pointers (`my_fn as fn(UserData, u32)`) rather than
    /// function items, otherwise [`function`](Self::function) will not find
    /// them under the pointer type.
    #[must_use]
    pub fn with_shape<F: Any>(function: F, user_data: UserData) -> Self {
        Self {
            function: Box::new(function),
            user_data,
        }
    }

    /// Returns the stored function if it has shape `F`.
    #[must_use]
    pub fn function<F: Any>(&self) -> Option<&F> {
        (*self.function).downcast_ref::<F>()
    }

    /// Returns the client data registered with the function.
    #[must_use]
    pub fn user_data(&self) -> UserData {
        self.user_data
    }

    /// Calls the function if it has the default shape.
    ///
    /// Returns `false` (without calling anything) for other shapes.
    pub fn invoke(&self) -> bool {
        match self.function::<CallbackFn>() {
            Some(function) => {
                function(self.user_data);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for NativeCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeCallback")
            .field("default_shape", &self.function::<CallbackFn>().is_some())
            .field("user_data", &self.user_data)
            .finish_non_exhaustive()
    }
}

/// A command string run by a script interpreter.
#[derive(Debug)]
pub struct ScriptCallback {
    command: Box<str>,
    language: ScriptLanguage,
}

impl ScriptCallback {
    /// Copies `command` into an owned buffer.
    #[must_use]
    pub fn new(command: &str, language: ScriptLanguage) -> Self {
        Self {
            command: command.into(),
            language,
        }
    }

    /// Returns the command text.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Returns the interpreter the command targets.
    #[must_use]
    pub fn language(&self) -> ScriptLanguage {
        self.language
    }
}

/// What a callback does when its event fires.
#[derive(Debug)]
pub enum Payload {
    /// A native function with client data (not owned).
    Native(NativeCallback),
    /// An owned scripted command.
    Script(ScriptCallback),
}

impl Payload {
    /// Shorthand for a default-shape native payload.
    #[must_use]
    pub fn native(function: CallbackFn, user_data: UserData) -> Self {
        Self::Native(NativeCallback::new(function, user_data))
    }

    /// Shorthand for a scripted payload.
    #[must_use]
    pub fn script(command: &str, language: ScriptLanguage) -> Self {
        Self::Script(ScriptCallback::new(command, language))
    }
}

/// One registered callback.
///
/// Callbacks are move-only. Equality and ordering compare [`id`](Self::id)
/// only, so a collection sorted by id can be binary-searched; this is
/// unrelated to the weight order a dispatcher keeps its callbacks in.
#[derive(Debug)]
pub struct Callback {
    tag: Box<str>,
    payload: Payload,
    weight: u32,
    id: CallbackId,
    child_events: Vec<EventId>,
}

impl Callback {
    /// Builds a callback from any payload.
    #[must_use]
    pub fn new(tag: &str, payload: Payload, weight: u32, id: CallbackId) -> Self {
        Self {
            tag: tag.into(),
            payload,
            weight,
            id,
            child_events: Vec::new(),
        }
    }

    /// Builds a native callback of the default shape.
    #[must_use]
    pub fn native(
        tag: &str,
        function: CallbackFn,
        weight: u32,
        user_data: UserData,
        id: CallbackId,
    ) -> Self {
        Self::new(tag, Payload::native(function, user_data), weight, id)
    }

    /// Builds a scripted callback, copying `command`.
    #[must_use]
    pub fn script(
        tag: &str,
        command: &str,
        weight: u32,
        language: ScriptLanguage,
        id: CallbackId,
    ) -> Self {
        Self::new(tag, Payload::script(command, language), weight, id)
    }

    /// Returns the tag, unique within the owning dispatcher.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Returns the priority weight; lower runs earlier.
    #[must_use]
    pub fn weight(&self) -> u32 {
        self.weight
    }

    /// Returns the callback id.
    #[must_use]
    pub fn id(&self) -> CallbackId {
        self.id
    }

    /// Returns the event encoded in the callback id.
    #[must_use]
    pub fn event_id(&self) -> EventId {
        self.id.event()
    }

    /// Returns the payload.
    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Returns the native payload, if this is a native callback.
    #[must_use]
    pub fn as_native(&self) -> Option<&NativeCallback> {
        match &self.payload {
            Payload::Native(native) => Some(native),
            Payload::Script(_) => None,
        }
    }

    /// Returns the scripted payload, if this is a scripted callback.
    #[must_use]
    pub fn as_script(&self) -> Option<&ScriptCallback> {
        match &self.payload {
            Payload::Script(script) => Some(script),
            Payload::Native(_) => None,
        }
    }

    /// Whether the payload is a native function.
    #[must_use]
    pub fn is_native(&self) -> bool {
        matches!(self.payload, Payload::Native(_))
    }

    /// Whether the payload is a scripted command.
    #[must_use]
    pub fn is_script(&self) -> bool {
        matches!(self.payload, Payload::Script(_))
    }

    /// Events registered with this callback as their parent.
    #[must_use]
    pub fn child_events(&self) -> &[EventId] {
        &self.child_events
    }

    pub(crate) fn set_id(&mut self, id: CallbackId) {
        self.id = id;
    }

    pub(crate) fn add_child_event(&mut self, event: EventId) {
        if !self.child_events.contains(&event) {
            self.child_events.push(event);
        }
    }

    pub(crate) fn remove_child_event(&mut self, event: EventId) {
        self.child_events.retain(|&e| e != event);
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Callback {}

impl PartialOrd for Callback {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Callback {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}
