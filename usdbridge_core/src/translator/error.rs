// Copyright 2026 the Usdbridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::string::String;

use thiserror::Error;

use crate::dag::DagError;

/// Failure of a translator-context operation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ContextError {
    /// A host command failed.
    #[error("host command failed: {0}")]
    Native(#[from] DagError),

    /// Persisted context data could not be parsed.
    #[error("malformed context data: {0}")]
    Malformed(String),

    /// The proxy shape node is not usable.
    #[error("proxy shape node is not valid")]
    InvalidProxy,
}
