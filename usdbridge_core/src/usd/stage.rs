// Copyright 2026 the Usdbridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use serde::{Deserialize, Serialize};

use super::path::PrimPath;

/// A prim's schema type name, such as `Mesh` or `Xform`. Empty for
/// untyped prims.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeName(String);

impl TypeName {
    /// Creates a type name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(String::from(name))
    }

    /// The type name text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this names no type.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeName({:?})", self.0)
    }
}

/// A prim as seen through a [`Stage`]: its path and type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prim {
    path: PrimPath,
    type_name: TypeName,
}

impl Prim {
    /// Creates a prim description.
    #[must_use]
    pub fn new(path: PrimPath, type_name: TypeName) -> Self {
        Self { path, type_name }
    }

    /// The prim's path.
    #[must_use]
    pub fn path(&self) -> &PrimPath {
        &self.path
    }

    /// The prim's type name.
    #[must_use]
    pub fn type_name(&self) -> &TypeName {
        &self.type_name
    }
}

/// Read access to a composed stage.
pub trait Stage {
    /// The prim at `path`, or `None` if there is none.
    fn prim_at_path(&self, path: &PrimPath) -> Option<Prim>;

    /// Whether a prim exists at `path`.
    fn has_prim(&self, path: &PrimPath) -> bool {
        self.prim_at_path(path).is_some()
    }
}

/// A stage held entirely in memory.
///
/// Defining a prim also defines any missing ancestors as untyped prims.
/// Removing a prim removes its descendants.
#[derive(Clone, Debug, Default)]
pub struct MemoryStage {
    prims: BTreeMap<PrimPath, TypeName>,
}

impl MemoryStage {
    /// An empty stage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines (or retypes) the prim at `path` and returns it.
    pub fn define_prim(&mut self, path: &PrimPath, type_name: &str) -> Prim {
        let mut ancestor = path.parent();
        while let Some(a) = ancestor {
            if a.is_absolute_root() {
                break;
            }
            ancestor = a.parent();
            self.prims.entry(a).or_default();
        }
        let type_name = TypeName::new(type_name);
        self.prims.insert(path.clone(), type_name.clone());
        Prim::new(path.clone(), type_name)
    }

    /// Removes the prim at `path` and its descendants. Returns how many
    /// prims were removed.
    pub fn remove_prim(&mut self, path: &PrimPath) -> usize {
        let doomed: Vec<PrimPath> = self
            .prims
            .range(path.clone()..)
            .map(|(p, _)| p)
            .take_while(|p| p.as_str().starts_with(path.as_str()))
            .filter(|p| p.has_prefix(path))
            .cloned()
            .collect();
        for p in &doomed {
            self.prims.remove(p);
        }
        doomed.len()
    }

    /// Every prim, in path order.
    pub fn prims(&self) -> impl Iterator<Item = Prim> + '_ {
        self.prims
            .iter()
            .map(|(p, t)| Prim::new(p.clone(), t.clone()))
    }

    /// Number of prims.
    #[must_use]
    pub fn len(&self) -> usize {
        self.prims.len()
    }

    /// Whether the stage has no prims.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prims.is_empty()
    }
}

impl Stage for MemoryStage {
    fn prim_at_path(&self, path: &PrimPath) -> Option<Prim> {
        self.prims
            .get(path)
            .map(|t| Prim::new(path.clone(), t.clone()))
    }
}
