// Copyright 2026 the Usdbridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The render index seam.
//!
//! Adapters never talk to a renderer directly. They insert and remove prims
//! and mark them dirty through [`RenderIndex`], and the renderer pulls the
//! accumulated bits back out with [`RenderIndex::take_dirty`] when it syncs.
//! [`ChangeTracker`] is the in-memory implementation; it also records the
//! added/removed/dirtied notice stream a scene-index observer would see.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use thiserror::Error;
use usdbridge_core::usd::{PrimPath, TypeName};

use crate::dirty::{DirtyBits, RprimDirtyBits, SprimDirtyBits};

/// Which table of the render index a prim lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimFamily {
    /// Renderable geometry.
    Rprim,
    /// State: lights, cameras, materials.
    Sprim,
    /// Instancers.
    Instancer,
}

/// Reasons the render index rejected an insertion or removal.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum IndexError {
    /// A prim is already present at this path.
    #[error("prim {0} is already in the render index")]
    Duplicate(PrimPath),
    /// No prim of the requested family is present at this path.
    #[error("prim {0} is not in the render index")]
    Missing(PrimPath),
}

/// A change the render index reports to scene observers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SceneNotice {
    /// A prim was inserted.
    PrimsAdded {
        /// The prim.
        path: PrimPath,
        /// Its type.
        type_name: TypeName,
    },
    /// A prim was removed.
    PrimsRemoved {
        /// The prim.
        path: PrimPath,
    },
    /// A prim was marked dirty.
    PrimsDirtied {
        /// The prim.
        path: PrimPath,
        /// The bits newly marked.
        bits: DirtyBits,
    },
}

/// Where adapters publish prims and invalidations.
pub trait RenderIndex {
    /// Inserts a renderable prim.
    ///
    /// # Errors
    ///
    /// Fails if a renderable prim already exists at `path`.
    fn insert_rprim(&mut self, type_name: &TypeName, path: &PrimPath) -> Result<(), IndexError>;

    /// Inserts a state prim.
    ///
    /// # Errors
    ///
    /// Fails if a state prim already exists at `path`.
    fn insert_sprim(&mut self, type_name: &TypeName, path: &PrimPath) -> Result<(), IndexError>;

    /// Inserts an instancer.
    ///
    /// # Errors
    ///
    /// Fails if an instancer already exists at `path`.
    fn insert_instancer(&mut self, path: &PrimPath) -> Result<(), IndexError>;

    /// Removes a renderable prim.
    ///
    /// # Errors
    ///
    /// Fails if there is none at `path`.
    fn remove_rprim(&mut self, path: &PrimPath) -> Result<(), IndexError>;

    /// Removes a state prim.
    ///
    /// # Errors
    ///
    /// Fails if there is none at `path`.
    fn remove_sprim(&mut self, path: &PrimPath) -> Result<(), IndexError>;

    /// Removes an instancer.
    ///
    /// # Errors
    ///
    /// Fails if there is none at `path`.
    fn remove_instancer(&mut self, path: &PrimPath) -> Result<(), IndexError>;

    /// Accumulates dirty bits on a renderable prim.
    fn mark_rprim_dirty(&mut self, path: &PrimPath, bits: RprimDirtyBits);

    /// Accumulates dirty bits on a state prim.
    fn mark_sprim_dirty(&mut self, path: &PrimPath, bits: SprimDirtyBits);

    /// Accumulates dirty bits on an instancer.
    fn mark_instancer_dirty(&mut self, path: &PrimPath, bits: RprimDirtyBits);

    /// Returns and clears the bits accumulated on the prim at `path`.
    ///
    /// `None` if no prim is present there; clean prims yield empty bits.
    fn take_dirty(&mut self, path: &PrimPath) -> Option<DirtyBits>;

    /// Inserts a prim into the table for `family`.
    ///
    /// # Errors
    ///
    /// As the per-family insert.
    fn insert_prim(
        &mut self,
        family: PrimFamily,
        type_name: &TypeName,
        path: &PrimPath,
    ) -> Result<(), IndexError> {
        match family {
            PrimFamily::Rprim => self.insert_rprim(type_name, path),
            PrimFamily::Sprim => self.insert_sprim(type_name, path),
            PrimFamily::Instancer => self.insert_instancer(path),
        }
    }

    /// Removes a prim from the table for `family`.
    ///
    /// # Errors
    ///
    /// As the per-family removal.
    fn remove_prim(&mut self, family: PrimFamily, path: &PrimPath) -> Result<(), IndexError> {
        match family {
            PrimFamily::Rprim => self.remove_rprim(path),
            PrimFamily::Sprim => self.remove_sprim(path),
            PrimFamily::Instancer => self.remove_instancer(path),
        }
    }

    /// Marks tagged bits on the matching table.
    fn mark_dirty(&mut self, path: &PrimPath, bits: DirtyBits) {
        match bits {
            DirtyBits::Rprim(b) => self.mark_rprim_dirty(path, b),
            DirtyBits::Sprim(b) => self.mark_sprim_dirty(path, b),
            DirtyBits::Instancer(b) => self.mark_instancer_dirty(path, b),
        }
    }
}

#[derive(Clone, Debug)]
struct Tracked<B> {
    type_name: TypeName,
    dirty: B,
}

/// An in-memory [`RenderIndex`] that accumulates dirty bits per prim.
#[derive(Clone, Debug, Default)]
pub struct ChangeTracker {
    rprims: BTreeMap<PrimPath, Tracked<RprimDirtyBits>>,
    sprims: BTreeMap<PrimPath, Tracked<SprimDirtyBits>>,
    instancers: BTreeMap<PrimPath, RprimDirtyBits>,
    notices: Vec<SceneNotice>,
}

impl ChangeTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any table holds a prim at `path`.
    #[must_use]
    pub fn contains(&self, path: &PrimPath) -> bool {
        self.rprims.contains_key(path)
            || self.sprims.contains_key(path)
            || self.instancers.contains_key(path)
    }

    /// The family of the prim at `path`.
    #[must_use]
    pub fn family(&self, path: &PrimPath) -> Option<PrimFamily> {
        if self.rprims.contains_key(path) {
            Some(PrimFamily::Rprim)
        } else if self.sprims.contains_key(path) {
            Some(PrimFamily::Sprim)
        } else if self.instancers.contains_key(path) {
            Some(PrimFamily::Instancer)
        } else {
            None
        }
    }

    /// The type of the renderable or state prim at `path`.
    #[must_use]
    pub fn type_name(&self, path: &PrimPath) -> Option<&TypeName> {
        self.rprims
            .get(path)
            .map(|t| &t.type_name)
            .or_else(|| self.sprims.get(path).map(|t| &t.type_name))
    }

    /// The bits pending on the prim at `path`, without clearing them.
    #[must_use]
    pub fn dirty(&self, path: &PrimPath) -> Option<DirtyBits> {
        if let Some(t) = self.rprims.get(path) {
            return Some(DirtyBits::Rprim(t.dirty));
        }
        if let Some(t) = self.sprims.get(path) {
            return Some(DirtyBits::Sprim(t.dirty));
        }
        self.instancers.get(path).map(|&b| DirtyBits::Instancer(b))
    }

    /// Number of renderable prims.
    #[must_use]
    pub fn rprim_count(&self) -> usize {
        self.rprims.len()
    }

    /// Number of state prims.
    #[must_use]
    pub fn sprim_count(&self) -> usize {
        self.sprims.len()
    }

    /// Renderable prim paths, in path order.
    pub fn rprim_paths(&self) -> impl Iterator<Item = &PrimPath> {
        self.rprims.keys()
    }

    /// State prim paths, in path order.
    pub fn sprim_paths(&self) -> impl Iterator<Item = &PrimPath> {
        self.sprims.keys()
    }

    /// The notices recorded so far, oldest first.
    #[must_use]
    pub fn notices(&self) -> &[SceneNotice] {
        &self.notices
    }

    /// Returns and clears the recorded notices.
    pub fn take_notices(&mut self) -> Vec<SceneNotice> {
        core::mem::take(&mut self.notices)
    }

    fn added(&mut self, type_name: &TypeName, path: &PrimPath) {
        self.notices.push(SceneNotice::PrimsAdded {
            path: path.clone(),
            type_name: type_name.clone(),
        });
    }

    fn removed(&mut self, path: &PrimPath) {
        self.notices
            .push(SceneNotice::PrimsRemoved { path: path.clone() });
    }

    fn dirtied(&mut self, path: &PrimPath, bits: DirtyBits) {
        if !bits.is_empty() {
            self.notices.push(SceneNotice::PrimsDirtied {
                path: path.clone(),
                bits,
            });
        }
    }
}

impl RenderIndex for ChangeTracker {
    fn insert_rprim(&mut self, type_name: &TypeName, path: &PrimPath) -> Result<(), IndexError> {
        if self.rprims.contains_key(path) {
            return Err(IndexError::Duplicate(path.clone()));
        }
        self.rprims.insert(
            path.clone(),
            Tracked {
                type_name: type_name.clone(),
                dirty: RprimDirtyBits::ALL_DIRTY,
            },
        );
        self.added(type_name, path);
        Ok(())
    }

    fn insert_sprim(&mut self, type_name: &TypeName, path: &PrimPath) -> Result<(), IndexError> {
        if self.sprims.contains_key(path) {
            return Err(IndexError::Duplicate(path.clone()));
        }
        self.sprims.insert(
            path.clone(),
            Tracked {
                type_name: type_name.clone(),
                dirty: SprimDirtyBits::ALL_DIRTY,
            },
        );
        self.added(type_name, path);
        Ok(())
    }

    fn insert_instancer(&mut self, path: &PrimPath) -> Result<(), IndexError> {
        if self.instancers.contains_key(path) {
            return Err(IndexError::Duplicate(path.clone()));
        }
        self.instancers
            .insert(path.clone(), RprimDirtyBits::ALL_DIRTY);
        self.added(&TypeName::new("instancer"), path);
        Ok(())
    }

    fn remove_rprim(&mut self, path: &PrimPath) -> Result<(), IndexError> {
        self.rprims
            .remove(path)
            .ok_or_else(|| IndexError::Missing(path.clone()))?;
        self.removed(path);
        Ok(())
    }

    fn remove_sprim(&mut self, path: &PrimPath) -> Result<(), IndexError> {
        self.sprims
            .remove(path)
            .ok_or_else(|| IndexError::Missing(path.clone()))?;
        self.removed(path);
        Ok(())
    }

    fn remove_instancer(&mut self, path: &PrimPath) -> Result<(), IndexError> {
        self.instancers
            .remove(path)
            .ok_or_else(|| IndexError::Missing(path.clone()))?;
        self.removed(path);
        Ok(())
    }

    fn mark_rprim_dirty(&mut self, path: &PrimPath, bits: RprimDirtyBits) {
        let Some(t) = self.rprims.get_mut(path) else {
            tracing::warn!(%path, "marking unknown rprim dirty");
            return;
        };
        let new = bits.difference(t.dirty);
        t.dirty |= bits;
        self.dirtied(path, DirtyBits::Rprim(new));
    }

    fn mark_sprim_dirty(&mut self, path: &PrimPath, bits: SprimDirtyBits) {
        let Some(t) = self.sprims.get_mut(path) else {
            tracing::warn!(%path, "marking unknown sprim dirty");
            return;
        };
        let new = bits.difference(t.dirty);
        t.dirty |= bits;
        self.dirtied(path, DirtyBits::Sprim(new));
    }

    fn mark_instancer_dirty(&mut self, path: &PrimPath, bits: RprimDirtyBits) {
        let Some(t) = self.instancers.get_mut(path) else {
            tracing::warn!(%path, "marking unknown instancer dirty");
            return;
        };
        let new = bits.difference(*t);
        *t |= bits;
        self.dirtied(path, DirtyBits::Instancer(new));
    }

    fn take_dirty(&mut self, path: &PrimPath) -> Option<DirtyBits> {
        if let Some(t) = self.rprims.get_mut(path) {
            return Some(DirtyBits::Rprim(core::mem::take(&mut t.dirty)));
        }
        if let Some(t) = self.sprims.get_mut(path) {
            return Some(DirtyBits::Sprim(core::mem::take(&mut t.dirty)));
        }
        self.instancers
            .get_mut(path)
            .map(|b| DirtyBits::Instancer(core::mem::take(b)))
    }
}
