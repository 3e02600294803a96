// Copyright 2026 the Usdbridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event and callback identity types.
//!
//! A [`CallbackId`] is a composite key: the high 16 bits hold the owning
//! [`EventId`] and the low 48 bits hold a sequence number that is unique
//! within that event. Embedding the event lets the
//! [`EventScheduler`](super::EventScheduler) find the owning dispatcher from
//! a callback id alone.

use core::fmt;

/// Number of bits used for the sequence part of a [`CallbackId`].
pub const SEQUENCE_BITS: u32 = 48;

/// Largest sequence number representable in a [`CallbackId`].
pub const MAX_SEQUENCE: u64 = (1 << SEQUENCE_BITS) - 1;

/// Identifies an event registered with an [`EventScheduler`](super::EventScheduler).
///
/// `EventId(0)` is reserved: it never names a registered event, and it is the
/// event part of callbacks built outside any dispatcher.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EventId(pub u16);

impl EventId {
    /// The reserved "no event" id.
    pub const INVALID: Self = Self(0);

    /// Returns `true` unless this is [`EventId::INVALID`].
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Debug for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventId({})", self.0)
    }
}

/// Identifies a callback registered on an event.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CallbackId(pub u64);

impl CallbackId {
    /// "Not registered".
    pub const INVALID: Self = Self(0);

    /// Also reserved; never issued by a dispatcher.
    pub const RESERVED: Self = Self(u64::MAX);

    /// Returns `true` unless this is one of the two reserved values.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != Self::INVALID.0 && self.0 != Self::RESERVED.0
    }

    /// Returns the event this callback belongs to.
    #[inline]
    #[must_use]
    pub const fn event(self) -> EventId {
        extract_event_id(self)
    }

    /// Returns the per-event sequence number.
    #[inline]
    #[must_use]
    pub const fn sequence(self) -> u64 {
        extract_callback_id(self)
    }
}

impl fmt::Debug for CallbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CallbackId({}#{})", self.event().0, self.sequence())
    }
}

/// Packs an event id and a sequence number into a [`CallbackId`].
///
/// Sequence bits above [`MAX_SEQUENCE`] are discarded.
#[inline]
#[must_use]
pub const fn make_callback_id(event: EventId, sequence: u64) -> CallbackId {
    CallbackId(((event.0 as u64) << SEQUENCE_BITS) | (sequence & MAX_SEQUENCE))
}

/// Returns the event part of a [`CallbackId`].
#[inline]
#[must_use]
pub const fn extract_event_id(id: CallbackId) -> EventId {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "the shift leaves exactly 16 significant bits"
    )]
    let event = (id.0 >> SEQUENCE_BITS) as u16;
    EventId(event)
}

/// Returns the sequence part of a [`CallbackId`].
#[inline]
#[must_use]
pub const fn extract_callback_id(id: CallbackId) -> u64 {
    id.0 & MAX_SEQUENCE
}
