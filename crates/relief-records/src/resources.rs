//! Aid resources attached to a disaster.

use relief_identity::{authorize, Action};
use relief_types::{AuditAction, Identity, NewResource, Resource, ResourcePatch};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use crate::{
    audit_entry, json_column, new_id, require, require_patch, timestamp, Assignments,
    RecordError,
};

const ENTITY: &str = "resource";

const SELECT_COLUMNS: &str = "SELECT
    id, disaster_id, name, location_name, resource_type, lat, lon,
    owner, audit_trail_json, created_at
FROM resources";

/// Inserts a resource owned by `actor`.
///
/// The referenced disaster must exist when the resource is created; the
/// check and the insert share one transaction.
pub fn create_resource(
    conn: &mut Connection,
    new: NewResource,
    actor: &Identity,
) -> Result<Resource, RecordError> {
    require("name", &new.name)?;
    authorize(actor, Action::Create, None).into_result()?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    ensure_disaster_exists(&tx, &new.disaster_id)?;

    let resource = Resource {
        id: new_id(),
        disaster_id: new.disaster_id,
        name: new.name,
        location_name: new.location_name,
        resource_type: new.resource_type,
        coordinates: new.coordinates,
        owner: actor.handle.clone(),
        audit_trail: vec![audit_entry(AuditAction::Create, actor)],
        created_at: timestamp(),
    };

    tx.execute(
        "INSERT INTO resources (
            id, disaster_id, name, location_name, resource_type, lat, lon,
            owner, audit_trail_json, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            resource.id,
            resource.disaster_id,
            resource.name,
            resource.location_name,
            resource.resource_type,
            resource.coordinates.lat,
            resource.coordinates.lon,
            resource.owner,
            serde_json::to_string(&resource.audit_trail)?,
            resource.created_at,
        ],
    )?;
    tx.commit()?;

    tracing::info!(
        resource_id = %resource.id,
        disaster_id = %resource.disaster_id,
        actor = %actor.handle,
        "resource created"
    );
    Ok(resource)
}

pub fn get_resource(conn: &Connection, id: &str) -> Result<Resource, RecordError> {
    conn.query_row(
        &format!("{SELECT_COLUMNS} WHERE id = ?1"),
        [id],
        map_row_to_resource,
    )
    .optional()?
    .ok_or_else(|| RecordError::not_found(ENTITY, id))
}

/// Lists the resources of one disaster in creation order.
pub fn list_resources(conn: &Connection, disaster_id: &str) -> Result<Vec<Resource>, RecordError> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_COLUMNS} WHERE disaster_id = ?1 ORDER BY created_at ASC, rowid ASC"
    ))?;
    let rows = stmt.query_map([disaster_id], map_row_to_resource)?;

    let mut resources = Vec::new();
    for row in rows {
        resources.push(row?);
    }
    Ok(resources)
}

pub fn update_resource(
    conn: &mut Connection,
    id: &str,
    patch: &ResourcePatch,
    actor: &Identity,
) -> Result<Resource, RecordError> {
    require_patch("name", patch.name.as_ref())?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut current = get_resource(&tx, id)?;
    authorize(actor, Action::Update, Some(&current.owner)).into_result()?;

    current
        .audit_trail
        .push(audit_entry(AuditAction::Update, actor));

    let mut sets = Assignments::new();
    if let Some(name) = &patch.name {
        sets.set("name", name.clone());
    }
    if let Some(location_name) = &patch.location_name {
        sets.set("location_name", location_name.clone());
    }
    if let Some(resource_type) = &patch.resource_type {
        sets.set("resource_type", resource_type.clone());
    }
    if let Some(coordinates) = patch.coordinates {
        sets.set("lat", coordinates.lat);
        sets.set("lon", coordinates.lon);
    }
    sets.set(
        "audit_trail_json",
        serde_json::to_string(&current.audit_trail)?,
    );
    sets.execute(&tx, "resources", id)?;

    let updated = get_resource(&tx, id)?;
    tx.commit()?;

    tracing::info!(resource_id = %id, actor = %actor.handle, "resource updated");
    Ok(updated)
}

/// Deletes a resource and returns its tombstone.
pub fn delete_resource(
    conn: &mut Connection,
    id: &str,
    actor: &Identity,
) -> Result<Resource, RecordError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut tombstone = get_resource(&tx, id)?;
    authorize(actor, Action::Delete, Some(&tombstone.owner)).into_result()?;

    tombstone
        .audit_trail
        .push(audit_entry(AuditAction::Delete, actor));
    tx.execute(
        "UPDATE resources SET audit_trail_json = ?1 WHERE id = ?2",
        params![serde_json::to_string(&tombstone.audit_trail)?, id],
    )?;
    tx.execute("DELETE FROM resources WHERE id = ?1", [id])?;
    tx.commit()?;

    tracing::info!(resource_id = %id, actor = %actor.handle, "resource deleted");
    Ok(tombstone)
}

/// Fails with `NotFound` unless a disaster with `disaster_id` exists.
pub(crate) fn ensure_disaster_exists(conn: &Connection, disaster_id: &str) -> Result<(), RecordError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM disasters WHERE id = ?1)",
        [disaster_id],
        |row| row.get(0),
    )?;
    if exists {
        Ok(())
    } else {
        Err(RecordError::not_found("disaster", disaster_id))
    }
}

fn map_row_to_resource(row: &Row) -> rusqlite::Result<Resource> {
    Ok(Resource {
        id: row.get(0)?,
        disaster_id: row.get(1)?,
        name: row.get(2)?,
        location_name: row.get(3)?,
        resource_type: row.get(4)?,
        coordinates: relief_types::Coordinates::new(row.get(5)?, row.get(6)?),
        owner: row.get(7)?,
        audit_trail: json_column(row, 8)?,
        created_at: row.get(9)?,
    })
}
