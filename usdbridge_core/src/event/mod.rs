// Copyright 2026 the Usdbridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Named events with priority-ordered callbacks.
//!
//! - [`EventScheduler`]: The registry of events. Event ids are allocated
//!   smallest-gap-first and the registry stays sorted by id.
//! - [`EventDispatcher`]: A single event with its name, associated data, optional
//!   parent callback, and the callbacks in ascending weight order.
//! - [`Callback`]: A tagged, weighted record whose [`Payload`] is either a
//!   native function with client data or an owned script command.
//! - [`id`]: The [`CallbackId`] codec. A callback id carries its event id in
//!   the top 16 bits, so the scheduler can route a callback operation to its
//!   dispatcher without searching.
//!
//! Events can form families: an event registered with a parent callback is
//! logically raised from inside that callback, and is torn down with it.

mod callback;
mod dispatcher;
mod error;
pub mod id;
mod scheduler;

pub use callback::{
    Callback, CallbackFn, NativeCallback, Payload, ScriptCallback, ScriptLanguage, ScriptRunner,
    UserData,
};
pub use dispatcher::{EventDispatcher, EventKind};
pub use error::EventError;
pub use id::{CallbackId, EventId, extract_callback_id, extract_event_id, make_callback_id};
pub use scheduler::{EventScheduler, PendingEdits};
