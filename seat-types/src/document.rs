//! The persisted JSON document shape.
//!
//! Layouts are stored as a camelCase JSON document in which every container
//! embeds its full guest records. [`LayoutDocument`] converts to and from the
//! in-memory [`Layout`], rebuilding the guest directory and checking the
//! structural invariants on load so a corrupt document never becomes live
//! state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::{Guest, GuestId, Layout, LayoutError, Rule, Table, TableId};

/// The external JSON document for one event's layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDocument {
    /// Tables with their embedded guest records, in display order.
    pub tables: Vec<TableDocument>,
    /// Guests not assigned to any table, in display order.
    pub unassigned_guests: Vec<Guest>,
    /// Seating rules.
    #[serde(default)]
    pub rules: RuleSection,
}

/// A table as persisted, embedding its guest records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDocument {
    /// Table identifier.
    pub id: TableId,
    /// Display name.
    pub name: String,
    /// Maximum number of seats.
    pub capacity: u32,
    /// Seated guest records, in seat order.
    pub guests: Vec<Guest>,
}

/// The rules section of the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RuleSection {
    /// "Must not share a table" pairs, each serialized as a two-element array.
    #[serde(default)]
    pub not_together: Vec<Rule>,
}

/// One flattened guest-to-table entry, the public lookup surface used for
/// seating charts and check-in terminals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatRecord {
    /// The guest's display name.
    pub guest_name: String,
    /// The table's display name, or `None` for unassigned guests.
    pub table_name: Option<String>,
}

impl LayoutDocument {
    /// Build the document from a layout.
    ///
    /// Fails if a seat references a guest id missing from the directory,
    /// which indicates the layout was mutated outside the engine.
    pub fn from_layout(layout: &Layout) -> Result<Self, DocumentError> {
        let resolve = |id: GuestId| -> Result<Guest, DocumentError> {
            layout
                .guest(id)
                .cloned()
                .ok_or(DocumentError::UnresolvedGuest { guest: id })
        };

        let mut tables = Vec::with_capacity(layout.tables.len());
        for table in &layout.tables {
            let guests = table
                .seats
                .iter()
                .map(|&id| resolve(id))
                .collect::<Result<Vec<_>, _>>()?;
            tables.push(TableDocument {
                id: table.id,
                name: table.name.clone(),
                capacity: table.capacity,
                guests,
            });
        }

        let unassigned_guests = layout
            .unassigned
            .iter()
            .map(|&id| resolve(id))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            tables,
            unassigned_guests,
            rules: RuleSection {
                not_together: layout.rules.iter().copied().collect(),
            },
        })
    }

    /// Rebuild the in-memory layout from the document.
    ///
    /// Rejects duplicate guest ids, rules that reference guests absent from
    /// the document, and any layout that fails [`Layout::verify`].
    pub fn into_layout(self) -> Result<Layout, DocumentError> {
        let mut guests: BTreeMap<GuestId, Guest> = BTreeMap::new();
        let mut insert = |guest: Guest| -> Result<GuestId, DocumentError> {
            let id = guest.id;
            if guests.insert(id, guest).is_some() {
                return Err(DocumentError::DuplicateGuest { guest: id });
            }
            Ok(id)
        };

        let mut tables = Vec::with_capacity(self.tables.len());
        for doc in self.tables {
            let seats = doc
                .guests
                .into_iter()
                .map(&mut insert)
                .collect::<Result<Vec<_>, _>>()?;
            tables.push(Table {
                id: doc.id,
                name: doc.name,
                capacity: doc.capacity,
                seats,
            });
        }

        let unassigned = self
            .unassigned_guests
            .into_iter()
            .map(&mut insert)
            .collect::<Result<Vec<_>, _>>()?;

        let mut rules = std::collections::BTreeSet::new();
        for rule in self.rules.not_together {
            let (a, b) = rule.members();
            for id in [a, b] {
                if !guests.contains_key(&id) {
                    return Err(DocumentError::UnknownRuleGuest { guest: id });
                }
            }
            rules.insert(Rule::new(a, b));
        }

        let layout = Layout {
            guests,
            tables,
            unassigned,
            rules,
        };
        layout.verify()?;
        Ok(layout)
    }

    /// Serialize the document to JSON text.
    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a document from JSON text.
    pub fn from_json(text: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Errors converting between layouts and persisted documents.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// JSON encoding or decoding failed.
    #[error("document JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A seat references a guest id with no record in the layout directory.
    #[error("seat references unknown guest {guest}")]
    UnresolvedGuest {
        /// The unresolved guest id.
        guest: GuestId,
    },

    /// The same guest id appears more than once in the document.
    #[error("guest {guest} appears more than once in the document")]
    DuplicateGuest {
        /// The duplicated guest id.
        guest: GuestId,
    },

    /// A rule references a guest absent from the document.
    #[error("rule references guest {guest} absent from the document")]
    UnknownRuleGuest {
        /// The unknown guest id.
        guest: GuestId,
    },

    /// The rebuilt layout violates a structural invariant.
    #[error("document produces an invalid layout: {0}")]
    Invalid(#[from] LayoutError),
}
