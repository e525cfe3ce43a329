//! Seating plan generation and application.
//!
//! Plans arrive either from the AI collaborator (whose JSON comes in several
//! shapes) or from the deterministic fallback generator. Either way a plan
//! is just named tables with guest names; [`apply_plan`] turns one into an
//! actual layout assignment.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use seat_types::{Layout, SeatRecord};

use crate::roster::{Roster, RosterError};

/// Guests per table used by the fallback generator.
pub const DEFAULT_TABLE_SIZE: usize = 10;

/// One table in a seating plan, holding guest names rather than ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedTable {
    /// Display name for the table.
    #[serde(rename = "tableName")]
    pub name: String,
    /// Guest names seated there, in order.
    pub guests: Vec<String>,
}

/// A complete candidate seating arrangement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatingPlan {
    /// Plan identifier, assistant-assigned or `"fallback"`.
    #[serde(default)]
    pub id: String,
    /// Human-readable plan name.
    #[serde(default)]
    pub name: String,
    /// Assistant-assigned quality score, when provided.
    #[serde(default)]
    pub score: Option<f64>,
    /// The planned tables.
    pub tables: Vec<PlannedTable>,
}

/// Deterministic local plan: chunk the guest list, in input order, into
/// tables of `table_size`.
///
/// `guest_list` is one name per line; lines are trimmed and blanks dropped.
pub fn fallback_plan(guest_list: &str, table_size: usize) -> SeatingPlan {
    let size = table_size.max(1);
    let names: Vec<&str> = guest_list
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let tables = names
        .chunks(size)
        .enumerate()
        .map(|(i, chunk)| PlannedTable {
            name: format!("Table {}", i + 1),
            guests: chunk.iter().map(|&n| n.to_owned()).collect(),
        })
        .collect();

    SeatingPlan {
        id: "fallback".to_owned(),
        name: "Sequential seating".to_owned(),
        score: None,
        tables,
    }
}

/// Normalize an assistant response into plans.
///
/// Accepts a bare table array, a `{"tables": […]}` object, or a
/// `{"plans": […]}` object. Anything else is a malformed response; callers
/// degrade to [`fallback_plan`].
pub fn parse_assistant_payload(
    payload: &serde_json::Value,
) -> Result<Vec<SeatingPlan>, PlanParseError> {
    let single = |value: serde_json::Value| -> Result<Vec<SeatingPlan>, PlanParseError> {
        let tables: Vec<PlannedTable> =
            serde_json::from_value(value).map_err(|e| PlanParseError::Decode(e.to_string()))?;
        Ok(vec![SeatingPlan {
            id: "assistant".to_owned(),
            name: "Suggested seating".to_owned(),
            score: None,
            tables,
        }])
    };

    match payload {
        serde_json::Value::Array(_) => single(payload.clone()),
        serde_json::Value::Object(map) => {
            if let Some(tables) = map.get("tables") {
                single(tables.clone())
            } else if let Some(plans) = map.get("plans") {
                serde_json::from_value(plans.clone())
                    .map_err(|e| PlanParseError::Decode(e.to_string()))
            } else {
                Err(PlanParseError::UnrecognizedShape)
            }
        }
        _ => Err(PlanParseError::UnrecognizedShape),
    }
}

/// Rebuild the layout's table assignment from a plan.
///
/// Clears every current assignment, then creates one table per planned
/// table. Guest names are matched against unassigned guests (first match
/// wins); names with no existing guest become new guest records. A table's
/// capacity is `capacity`, widened if the plan seats more than that.
pub fn apply_plan(
    layout: &mut Layout,
    plan: &SeatingPlan,
    capacity: u32,
) -> Result<(), RosterError> {
    Roster::reset_assignments(layout);

    for planned in &plan.tables {
        let width = (planned.guests.len() as u32).max(capacity).max(1);
        let table_id = Roster::add_table(layout, planned.name.clone(), width)?;

        for name in &planned.guests {
            let existing = layout
                .unassigned
                .iter()
                .position(|id| layout.guests.get(id).is_some_and(|g| g.name == *name));
            let guest_id = match existing {
                Some(pos) => layout.unassigned.remove(pos),
                None => {
                    let guest = seat_types::Guest::new(name.clone());
                    let id = guest.id;
                    layout.guests.insert(id, guest);
                    id
                }
            };
            if let Some(table) = layout.table_mut(table_id) {
                table.seats.push(guest_id);
            }
        }
    }

    Ok(())
}

/// Flatten the layout into the public guest-to-table listing, sorted by
/// guest name. Read-only lookup surface for check-in terminals.
pub fn seating_chart(layout: &Layout) -> Vec<SeatRecord> {
    let mut records: Vec<SeatRecord> = Vec::with_capacity(layout.guest_count());

    for table in &layout.tables {
        for id in &table.seats {
            if let Some(guest) = layout.guest(*id) {
                records.push(SeatRecord {
                    guest_name: guest.name.clone(),
                    table_name: Some(table.name.clone()),
                });
            }
        }
    }
    for id in &layout.unassigned {
        if let Some(guest) = layout.guest(*id) {
            records.push(SeatRecord {
                guest_name: guest.name.clone(),
                table_name: None,
            });
        }
    }

    records.sort_by(|a, b| a.guest_name.cmp(&b.guest_name));
    records
}

/// Errors normalizing an assistant response.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlanParseError {
    /// The payload is neither a table array nor a tables/plans object.
    #[error("assistant payload has no recognizable tables or plans")]
    UnrecognizedShape,

    /// The payload matched a known shape but failed to decode.
    #[error("assistant payload failed to decode: {0}")]
    Decode(String),
}
