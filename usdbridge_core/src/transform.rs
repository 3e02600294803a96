// Copyright 2026 the Usdbridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Row-major 4×4 matrices for node and prim transforms.
//!
//! Both the host and the stage use the row-vector convention: a point is
//! transformed as `p * M`, the translation lives in the last row, and a child's
//! world matrix is `local * parent_world`.

use core::ops::Mul;
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

/// A row-major 4×4 affine matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matrix4d {
    /// Four rows, each `[x, y, z, w]`.
    pub rows: [[f64; 4]; 4],
}

impl Matrix4d {
    /// The identity matrix.
    pub const IDENTITY: Self = Self::from_diagonal(1.0, 1.0, 1.0);

    const fn from_diagonal(x: f64, y: f64, z: f64) -> Self {
        Self {
            rows: [
                [x, 0.0, 0.0, 0.0],
                [0.0, y, 0.0, 0.0],
                [0.0, 0.0, z, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Creates a matrix from its rows.
    #[inline]
    #[must_use]
    pub const fn from_rows(rows: [[f64; 4]; 4]) -> Self {
        Self { rows }
    }

    /// A pure translation.
    #[inline]
    #[must_use]
    pub const fn from_translation(x: f64, y: f64, z: f64) -> Self {
        let mut m = Self::IDENTITY;
        m.rows[3] = [x, y, z, 1.0];
        m
    }

    /// A non-uniform scale.
    #[inline]
    #[must_use]
    pub const fn from_scale(sx: f64, sy: f64, sz: f64) -> Self {
        Self::from_diagonal(sx, sy, sz)
    }

    /// A rotation about the Y axis, in radians.
    #[must_use]
    pub fn from_rotation_y(radians: f64) -> Self {
        let (s, c) = (radians.sin(), radians.cos());
        Self::from_rows([
            [c, 0.0, -s, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [s, 0.0, c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// A rotation about the Z axis, in radians.
    #[must_use]
    pub fn from_rotation_z(radians: f64) -> Self {
        let (s, c) = (radians.sin(), radians.cos());
        Self::from_rows([
            [c, s, 0.0, 0.0],
            [-s, c, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// The translation part.
    #[inline]
    #[must_use]
    pub const fn translation(&self) -> [f64; 3] {
        let r = self.rows[3];
        [r[0], r[1], r[2]]
    }

    /// Component-wise linear blend, `self` at `t = 0` and `other` at `t = 1`.
    ///
    /// Good enough for sub-frame motion samples; it does not preserve
    /// orthonormality for large rotations.
    #[must_use]
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        let mut out = *self;
        for (row, other_row) in out.rows.iter_mut().zip(other.rows.iter()) {
            for (a, b) in row.iter_mut().zip(other_row.iter()) {
                *a += (b - *a) * t;
            }
        }
        out
    }

    /// Whether every element is within `eps` of `other`'s.
    #[must_use]
    pub fn abs_diff_eq(&self, other: &Self, eps: f64) -> bool {
        self.elements()
            .zip(other.elements())
            .all(|(a, b)| (a - b).abs() <= eps)
    }

    /// Whether every element is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.elements().all(f64::is_finite)
    }

    fn elements(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().flatten().copied()
    }
}

impl Default for Matrix4d {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Matrix4d {
    type Output = Self;

    /// `self` applied first, then `rhs`.
    fn mul(self, rhs: Self) -> Self {
        let mut out = [[0.0_f64; 4]; 4];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..4).map(|k| self.rows[i][k] * rhs.rows[k][j]).sum();
            }
        }
        Self { rows: out }
    }
}
