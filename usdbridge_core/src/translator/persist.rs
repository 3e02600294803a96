// Copyright 2026 the Usdbridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Saving the prim-to-node table as a string.
//!
//! Entries are written as a JSON array of records, nodes referenced by name:
//!
//! ```json
//! [{"path":"/World/cube","type":"Mesh","primary":"cube","created":["cube","cubeShape"]}]
//! ```
//!
//! Older scenes stored `path=type,primary,created,...` entries joined with
//! `;`. That form has no escaping, so it is only read, never written.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use crate::dag::{DagStore, NodeHandle};
use crate::usd::{PrimPath, TypeName};

use super::context::{PrimLookup, TranslatorContext};
use super::error::ContextError;

#[derive(Debug, Serialize, Deserialize)]
struct Record {
    path: PrimPath,
    #[serde(rename = "type")]
    type_name: TypeName,
    primary: Option<String>,
    created: Vec<String>,
}

impl TranslatorContext {
    /// Encodes every entry. Handles that are no longer valid are dropped
    /// with a warning, since they have no name to record.
    ///
    /// # Errors
    ///
    /// Fails only if the encoder does.
    pub fn serialise(&self, store: &DagStore) -> Result<String, ContextError> {
        let records: Vec<Record> = self
            .entries
            .iter()
            .map(|(path, entry)| Record {
                path: path.clone(),
                type_name: entry.type_name.clone(),
                primary: name_of(path, entry.primary, store),
                created: entry
                    .created
                    .iter()
                    .filter_map(|&n| name_of(path, n, store))
                    .collect(),
            })
            .collect();
        serde_json::to_string(&records).map_err(|e| ContextError::Malformed(e.to_string()))
    }

    /// Replaces every entry with those decoded from `text`, resolving node
    /// names through `store`. Names that no longer resolve are skipped with
    /// a warning. Returns the number of entries loaded.
    ///
    /// # Errors
    ///
    /// Fails if `text` is neither a JSON record array nor the older
    /// `;`-separated form. The context is left unchanged on failure.
    pub fn deserialise(&mut self, text: &str, store: &DagStore) -> Result<usize, ContextError> {
        let text = text.trim();
        let records = if text.starts_with('[') {
            serde_json::from_str::<Vec<Record>>(text)
                .map_err(|e| ContextError::Malformed(e.to_string()))?
        } else {
            parse_legacy(text)?
        };

        self.entries.clear();
        for record in records {
            let primary = record
                .primary
                .as_deref()
                .map_or(NodeHandle::NULL, |name| resolve_name(&record.path, name, store));
            let created = record
                .created
                .iter()
                .map(|name| resolve_name(&record.path, name, store))
                .filter(|n| !n.is_null())
                .collect();
            self.entries.insert(
                record.path,
                PrimLookup {
                    type_name: record.type_name,
                    primary,
                    created,
                },
            );
        }
        tracing::debug!(entries = self.entries.len(), "translator context loaded");
        Ok(self.entries.len())
    }
}

fn name_of(path: &PrimPath, node: NodeHandle, store: &DagStore) -> Option<String> {
    if node.is_null() {
        return None;
    }
    let name = store.name(node).map(String::from);
    if name.is_none() {
        tracing::warn!(%path, ?node, "not saving unusable node handle");
    }
    name
}

fn resolve_name(path: &PrimPath, name: &str, store: &DagStore) -> NodeHandle {
    store.lookup(name).unwrap_or_else(|| {
        tracing::warn!(%path, name, "saved node no longer exists");
        NodeHandle::NULL
    })
}

fn parse_legacy(text: &str) -> Result<Vec<Record>, ContextError> {
    let mut records = Vec::new();
    for entry in text.split(';').map(str::trim).filter(|e| !e.is_empty()) {
        let (path, payload) = entry
            .split_once('=')
            .ok_or_else(|| ContextError::Malformed(String::from(entry)))?;
        let path = PrimPath::new(path).map_err(|e| ContextError::Malformed(e.to_string()))?;
        let mut fields = payload.split(',');
        let type_name = TypeName::new(fields.next().unwrap_or(""));
        let primary = fields
            .next()
            .filter(|n| !n.is_empty())
            .map(String::from);
        let created = fields.filter(|n| !n.is_empty()).map(String::from).collect();
        records.push(Record {
            path,
            type_name,
            primary,
            created,
        });
    }
    Ok(records)
}
