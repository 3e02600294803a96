// Copyright 2026 the Usdbridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene delegate configuration presets.

/// Configuration for a [`SceneDelegate`](crate::delegate::SceneDelegate).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DelegateConfig {
    /// Prim path every translated prim is placed under.
    pub root: &'static str,
    /// Whether transforms are sampled at two shutter times for motion blur.
    pub motion_samples: bool,
    /// Whether light shapes are translated.
    pub lights: bool,
    /// Whether shading engines are translated into materials.
    pub materials: bool,
    /// Upper bound on adapters recreated per idle tick. Remaining requests
    /// wait for the next tick.
    pub max_recreations_per_idle: usize,
}

impl DelegateConfig {
    /// Full viewport translation.
    #[must_use]
    pub const fn viewport() -> Self {
        Self {
            root: "/HdMayaDelegate",
            motion_samples: false,
            lights: true,
            materials: true,
            max_recreations_per_idle: 64,
        }
    }

    /// Final-quality rendering: adds motion samples.
    #[must_use]
    pub const fn render() -> Self {
        Self {
            motion_samples: true,
            ..Self::viewport()
        }
    }

    /// Geometry only, for fast previews.
    #[must_use]
    pub const fn preview() -> Self {
        Self {
            lights: false,
            materials: false,
            max_recreations_per_idle: 16,
            ..Self::viewport()
        }
    }
}

impl Default for DelegateConfig {
    fn default() -> Self {
        Self::viewport()
    }
}
