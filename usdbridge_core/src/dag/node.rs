// Copyright 2026 the Usdbridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node types and attribute values.

use alloc::string::String;
use core::fmt;

/// The kind of light a light node represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LightKind {
    /// Omnidirectional point light.
    Point,
    /// Infinitely distant light.
    Directional,
    /// Cone-shaped light.
    Spot,
    /// Rectangular area light.
    Area,
}

/// The native type of a node.
///
/// DAG types (transforms and shapes) live in the hierarchy; the others are
/// plain dependency nodes and never have a parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// A transform: groups and positions its children.
    Transform,
    /// A polygon mesh shape.
    Mesh,
    /// A camera shape.
    Camera,
    /// A light shape.
    Light(LightKind),
    /// A shading group binding shaders to geometry.
    ShadingEngine,
    /// A surface shader feeding a shading engine.
    Shader,
    /// Any other dependency node.
    Dependency,
}

impl NodeType {
    /// Whether nodes of this type live in the DAG hierarchy.
    #[must_use]
    pub const fn is_dag(self) -> bool {
        matches!(
            self,
            Self::Transform | Self::Mesh | Self::Camera | Self::Light(_)
        )
    }

    /// Whether this is a shape (a DAG leaf drawn under a transform).
    #[must_use]
    pub const fn is_shape(self) -> bool {
        matches!(self, Self::Mesh | Self::Camera | Self::Light(_))
    }

    /// The host's type name, used for diagnostics and persistence.
    #[must_use]
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Transform => "transform",
            Self::Mesh => "mesh",
            Self::Camera => "camera",
            Self::Light(LightKind::Point) => "pointLight",
            Self::Light(LightKind::Directional) => "directionalLight",
            Self::Light(LightKind::Spot) => "spotLight",
            Self::Light(LightKind::Area) => "areaLight",
            Self::ShadingEngine => "shadingEngine",
            Self::Shader => "standardSurface",
            Self::Dependency => "dependNode",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// The value of a node attribute ("plug").
#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    /// A boolean.
    Bool(bool),
    /// A scalar.
    Float(f64),
    /// An RGB colour.
    Color([f64; 3]),
    /// A string.
    Text(String),
    /// A connection to another node, by name.
    Connection(String),
}

impl AttrValue {
    /// Returns the scalar value, if this is a float.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string value, if this is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dag_classification() {
        assert!(NodeType::Transform.is_dag());
        assert!(NodeType::Light(LightKind::Spot).is_dag());
        assert!(!NodeType::ShadingEngine.is_dag());
        assert!(!NodeType::Dependency.is_dag());
        assert!(NodeType::Mesh.is_shape());
        assert!(!NodeType::Transform.is_shape());
    }

    #[test]
    fn type_names_match_host_spelling() {
        assert_eq!(NodeType::Light(LightKind::Directional).type_name(), "directionalLight");
        assert_eq!(alloc::format!("{}", NodeType::Mesh), "mesh");
    }
}
