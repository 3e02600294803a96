// Copyright 2026 the Usdbridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::string::String;

use thiserror::Error;

use super::id::{CallbackId, EventId};

/// Reasons an event or callback operation was rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EventError {
    /// A callback with this tag already exists on the event.
    #[error("callback tag '{tag}' is already registered on event '{event}'")]
    DuplicateTag {
        /// Name of the event.
        event: String,
        /// The rejected tag.
        tag: String,
    },

    /// An event with this name and associated data already exists.
    #[error("event '{name}' is already registered")]
    DuplicateEvent {
        /// The rejected name.
        name: String,
    },

    /// No event has this id.
    #[error("unknown event {0:?}")]
    UnknownEvent(EventId),

    /// No event has this name.
    #[error("unknown event '{0}'")]
    UnknownEventName(String),

    /// No callback has this id.
    #[error("unknown callback {0:?}")]
    UnknownCallback(CallbackId),

    /// Every one of the 65535 event ids is taken.
    #[error("no free event ids remain")]
    EventIdsExhausted,

    /// The event has issued every sequence number a callback id can hold.
    #[error("event '{0}' has no callback ids left")]
    CallbackIdsExhausted(String),
}
