// Copyright 2026 the Usdbridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty bits for the prims an adapter feeds into the render index.
//!
//! Each prim family has its own bit set. A set bit means that category of
//! the prim's data is stale and must be pulled from the scene delegate
//! before the next draw. Newly inserted prims start fully dirty.

use bitflags::bitflags;

bitflags! {
    /// Stale data categories of a renderable prim (mesh, curves, points).
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct RprimDirtyBits: u32 {
        /// The prim id used for picking.
        const DIRTY_PRIM_ID = 1 << 0;
        /// The bounding box.
        const DIRTY_EXTENT = 1 << 1;
        /// Display style (refinement level, wireframe).
        const DIRTY_DISPLAY_STYLE = 1 << 2;
        /// Point positions.
        const DIRTY_POINTS = 1 << 3;
        /// Any other primvar.
        const DIRTY_PRIMVAR = 1 << 4;
        /// The bound material.
        const DIRTY_MATERIAL_ID = 1 << 5;
        /// Face counts and indices.
        const DIRTY_TOPOLOGY = 1 << 6;
        /// The world transform.
        const DIRTY_TRANSFORM = 1 << 7;
        /// Visibility.
        const DIRTY_VISIBILITY = 1 << 8;
        /// Normals.
        const DIRTY_NORMALS = 1 << 9;
        /// Double-sidedness.
        const DIRTY_DOUBLE_SIDED = 1 << 10;
        /// Back-face culling.
        const DIRTY_CULL_STYLE = 1 << 11;
        /// The instancer the prim is drawn through.
        const DIRTY_INSTANCER = 1 << 12;
        /// Per-instance indices.
        const DIRTY_INSTANCE_INDEX = 1 << 13;
    }
}

impl RprimDirtyBits {
    /// Every bit. New prims start here.
    pub const ALL_DIRTY: Self = Self::all();

    /// What a geometry edit invalidates.
    pub const GEOMETRY: Self = Self::DIRTY_POINTS
        .union(Self::DIRTY_NORMALS)
        .union(Self::DIRTY_PRIMVAR)
        .union(Self::DIRTY_EXTENT);
}

bitflags! {
    /// Stale data categories of a state prim (lights, cameras, materials).
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct SprimDirtyBits: u32 {
        /// The world transform.
        const DIRTY_TRANSFORM = 1 << 0;
        /// Type-specific parameters (colour, intensity, shader inputs).
        const DIRTY_PARAMS = 1 << 1;
        /// Shadow parameters.
        const DIRTY_SHADOW_PARAMS = 1 << 2;
        /// The set of prims a light affects.
        const DIRTY_COLLECTION = 1 << 3;
        /// Backing resources (textures, shader networks).
        const DIRTY_RESOURCE = 1 << 4;
    }
}

impl SprimDirtyBits {
    /// Every bit. New prims start here.
    pub const ALL_DIRTY: Self = Self::all();
}

bitflags! {
    /// Stale data categories of a material.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MaterialDirtyBits: u32 {
        /// Shader input values.
        const DIRTY_PARAMS = 1 << 1;
        /// The shader network itself.
        const DIRTY_RESOURCE = 1 << 4;
    }
}

impl MaterialDirtyBits {
    /// Every bit.
    pub const ALL_DIRTY: Self = Self::all();
}

impl From<MaterialDirtyBits> for SprimDirtyBits {
    fn from(bits: MaterialDirtyBits) -> Self {
        // The material bits share positions with their state prim bits.
        Self::from_bits_truncate(bits.bits())
    }
}

/// Dirty bits tagged with the prim family they apply to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DirtyBits {
    /// Bits of a renderable prim.
    Rprim(RprimDirtyBits),
    /// Bits of a state prim.
    Sprim(SprimDirtyBits),
    /// Bits of an instancer.
    Instancer(RprimDirtyBits),
}

impl DirtyBits {
    /// Whether no bit is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        match self {
            Self::Rprim(b) | Self::Instancer(b) => b.is_empty(),
            Self::Sprim(b) => b.is_empty(),
        }
    }

    /// The raw bit pattern.
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::Rprim(b) | Self::Instancer(b) => b.bits(),
            Self::Sprim(b) => b.bits(),
        }
    }
}
