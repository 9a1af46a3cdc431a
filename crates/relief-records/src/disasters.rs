//! Disaster records.

use relief_identity::{authorize, Action};
use relief_types::{AuditAction, Disaster, DisasterPatch, Identity, NewDisaster, Relocation};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use crate::{
    audit_entry, coordinates_columns, json_column, new_id, require, require_patch, timestamp,
    Assignments, RecordError,
};

const ENTITY: &str = "disaster";

const SELECT_COLUMNS: &str = "SELECT
    id, title, description, location_name, lat, lon,
    tags_json, owner, audit_trail_json, created_at
FROM disasters";

/// Inserts a new disaster owned by `actor`.
///
/// The caller is expected to have geocoded the description already; a
/// failed geocode must never reach this function.
pub fn create_disaster(
    conn: &mut Connection,
    new: NewDisaster,
    actor: &Identity,
) -> Result<Disaster, RecordError> {
    require("title", &new.title)?;
    require("description", &new.description)?;
    authorize(actor, Action::Create, None).into_result()?;

    let disaster = Disaster {
        id: new_id(),
        title: new.title,
        description: new.description,
        location_name: new.location_name,
        coordinates: new.coordinates,
        tags: new.tags,
        owner: actor.handle.clone(),
        audit_trail: vec![audit_entry(AuditAction::Create, actor)],
        created_at: timestamp(),
    };

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    tx.execute(
        "INSERT INTO disasters (
            id, title, description, location_name, lat, lon,
            tags_json, owner, audit_trail_json, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            disaster.id,
            disaster.title,
            disaster.description,
            disaster.location_name,
            disaster.coordinates.map(|c| c.lat),
            disaster.coordinates.map(|c| c.lon),
            serde_json::to_string(&disaster.tags)?,
            disaster.owner,
            serde_json::to_string(&disaster.audit_trail)?,
            disaster.created_at,
        ],
    )?;
    tx.commit()?;

    tracing::info!(disaster_id = %disaster.id, actor = %actor.handle, "disaster created");
    Ok(disaster)
}

/// Retrieves a disaster by id.
pub fn get_disaster(conn: &Connection, id: &str) -> Result<Disaster, RecordError> {
    conn.query_row(
        &format!("{SELECT_COLUMNS} WHERE id = ?1"),
        [id],
        map_row_to_disaster,
    )
    .optional()?
    .ok_or_else(|| RecordError::not_found(ENTITY, id))
}

/// Lists disasters, newest first, optionally keeping only those carrying
/// `tag`.
///
/// The tag predicate runs in memory over the full read.
pub fn list_disasters(conn: &Connection, tag: Option<&str>) -> Result<Vec<Disaster>, RecordError> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_COLUMNS} ORDER BY created_at DESC, rowid DESC"
    ))?;
    let rows = stmt.query_map([], map_row_to_disaster)?;

    let mut disasters = Vec::new();
    for row in rows {
        disasters.push(row?);
    }

    if let Some(tag) = tag {
        disasters.retain(|d| d.has_tag(tag));
    }
    Ok(disasters)
}

/// Applies a partial update and appends an `update` audit entry.
///
/// `relocation` is the geocoded outcome of a location or description
/// change and replaces both `location_name` and the coordinates. Without
/// one, a changed `location_name` clears the coordinates, since they no
/// longer describe the named place.
pub fn update_disaster(
    conn: &mut Connection,
    id: &str,
    patch: &DisasterPatch,
    relocation: Option<&Relocation>,
    actor: &Identity,
) -> Result<Disaster, RecordError> {
    require_patch("title", patch.title.as_ref())?;
    require_patch("description", patch.description.as_ref())?;
    require_patch("location_name", patch.location_name.as_ref())?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut current = get_disaster(&tx, id)?;
    authorize(actor, Action::Update, Some(&current.owner)).into_result()?;

    let mut sets = Assignments::new();
    if let Some(title) = &patch.title {
        sets.set("title", title.clone());
    }
    if let Some(description) = &patch.description {
        sets.set("description", description.clone());
    }
    match (relocation, &patch.location_name) {
        (Some(moved), _) => {
            sets.set("location_name", moved.location_name.clone());
            sets.set("lat", moved.coordinates.map(|c| c.lat));
            sets.set("lon", moved.coordinates.map(|c| c.lon));
        }
        (None, Some(location_name)) if *location_name != current.location_name => {
            sets.set("location_name", location_name.clone());
            sets.set("lat", None::<f64>);
            sets.set("lon", None::<f64>);
        }
        _ => {}
    }
    if let Some(tags) = &patch.tags {
        sets.set("tags_json", serde_json::to_string(tags)?);
    }

    current
        .audit_trail
        .push(audit_entry(AuditAction::Update, actor));
    sets.set(
        "audit_trail_json",
        serde_json::to_string(&current.audit_trail)?,
    );
    sets.execute(&tx, "disasters", id)?;

    let updated = get_disaster(&tx, id)?;
    tx.commit()?;

    tracing::info!(disaster_id = %id, actor = %actor.handle, "disaster updated");
    Ok(updated)
}

/// Deletes a disaster and returns its tombstone.
///
/// The `delete` audit entry is written to the row before it is removed, so
/// the returned record carries the complete trail. Resources and reports
/// that reference the disaster are left in place.
pub fn delete_disaster(
    conn: &mut Connection,
    id: &str,
    actor: &Identity,
) -> Result<Disaster, RecordError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut tombstone = get_disaster(&tx, id)?;
    authorize(actor, Action::Delete, Some(&tombstone.owner)).into_result()?;

    tombstone
        .audit_trail
        .push(audit_entry(AuditAction::Delete, actor));
    tx.execute(
        "UPDATE disasters SET audit_trail_json = ?1 WHERE id = ?2",
        params![serde_json::to_string(&tombstone.audit_trail)?, id],
    )?;
    tx.execute("DELETE FROM disasters WHERE id = ?1", [id])?;
    tx.commit()?;

    tracing::info!(disaster_id = %id, actor = %actor.handle, "disaster deleted");
    Ok(tombstone)
}

/// Removes every disaster. Admin only. Returns the number removed.
///
/// Records are gone afterwards, so no per-record audit entry survives; the
/// operation is logged with the acting handle instead.
pub fn delete_all_disasters(conn: &mut Connection, actor: &Identity) -> Result<usize, RecordError> {
    authorize(actor, Action::DeleteAll, None).into_result()?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let count = tx.execute("DELETE FROM disasters", [])?;
    tx.commit()?;

    tracing::warn!(actor = %actor.handle, count, "all disasters deleted");
    Ok(count)
}

fn map_row_to_disaster(row: &Row) -> rusqlite::Result<Disaster> {
    Ok(Disaster {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        location_name: row.get(3)?,
        coordinates: coordinates_columns(row, 4, 5)?,
        tags: json_column(row, 6)?,
        owner: row.get(7)?,
        audit_trail: json_column(row, 8)?,
        created_at: row.get(9)?,
    })
}
