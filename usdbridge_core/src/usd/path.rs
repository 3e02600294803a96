// Copyright 2026 the Usdbridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::string::String;
use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A string that is not a valid absolute prim path.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("invalid prim path {0:?}")]
pub struct InvalidPrimPath(pub String);

/// An absolute prim path such as `/World/geo/cube`.
///
/// The absolute root is `/`. Every other path starts with `/`, has no empty
/// elements, and no trailing separator. Paths order lexicographically, so a
/// prim sorts directly before its descendants.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PrimPath(String);

impl PrimPath {
    /// Parses an absolute path.
    ///
    /// # Errors
    ///
    /// Fails for relative paths, empty elements, and trailing separators.
    pub fn new(path: &str) -> Result<Self, InvalidPrimPath> {
        let valid = path == "/"
            || (path.starts_with('/')
                && path[1..]
                    .split('/')
                    .all(|e| !e.is_empty() && e.chars().all(is_element_char)));
        if valid {
            Ok(Self(String::from(path)))
        } else {
            Err(InvalidPrimPath(String::from(path)))
        }
    }

    /// The absolute root, `/`.
    #[must_use]
    pub fn absolute_root() -> Self {
        Self(String::from("/"))
    }

    /// The path text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is `/`.
    #[must_use]
    pub fn is_absolute_root(&self) -> bool {
        self.0 == "/"
    }

    /// The last element, or `""` for the root.
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or("")
    }

    /// The parent path. `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.is_absolute_root() {
            return None;
        }
        let cut = self.0.rfind('/')?;
        Some(if cut == 0 {
            Self::absolute_root()
        } else {
            Self(String::from(&self.0[..cut]))
        })
    }

    /// Number of elements. Zero for the root.
    #[must_use]
    pub fn element_count(&self) -> usize {
        if self.is_absolute_root() {
            0
        } else {
            self.0.matches('/').count()
        }
    }

    /// Appends one element.
    ///
    /// # Errors
    ///
    /// Fails if `name` is empty or contains a separator or other character
    /// not allowed in a prim name.
    pub fn append_child(&self, name: &str) -> Result<Self, InvalidPrimPath> {
        let mut out = self.0.clone();
        if !self.is_absolute_root() {
            out.push('/');
        }
        out.push_str(name);
        if name.is_empty() || !name.chars().all(is_element_char) {
            return Err(InvalidPrimPath(out));
        }
        Ok(Self(out))
    }

    /// Whether `prefix` is this path or one of its ancestors.
    #[must_use]
    pub fn has_prefix(&self, prefix: &Self) -> bool {
        if prefix.is_absolute_root() {
            return true;
        }
        match self.0.strip_prefix(prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

fn is_element_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl TryFrom<String> for PrimPath {
    type Error = InvalidPrimPath;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<PrimPath> for String {
    fn from(path: PrimPath) -> Self {
        path.0
    }
}

impl fmt::Display for PrimPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for PrimPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrimPath({})", self.0)
    }
}
