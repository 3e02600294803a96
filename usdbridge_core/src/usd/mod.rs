// Copyright 2026 the Usdbridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The slice of a USD stage the translator needs: prim paths, type names,
//! and prim existence.

mod path;
mod stage;

pub use path::{InvalidPrimPath, PrimPath};
pub use stage::{MemoryStage, Prim, Stage, TypeName};
