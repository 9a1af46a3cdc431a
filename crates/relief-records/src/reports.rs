//! Field reports. Triaged once at creation.

use relief_identity::{authorize, Action};
use relief_triage::classify_report;
use relief_types::{AuditAction, Identity, NewReport, Report, ReportPatch, VerificationStatus};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use crate::resources::ensure_disaster_exists;
use crate::{
    audit_entry, json_column, new_id, require, require_patch, timestamp, Assignments,
    RecordError,
};

const ENTITY: &str = "report";

const SELECT_COLUMNS: &str = "SELECT
    id, disaster_id, author, content, image_url, verification_status,
    audit_trail_json, created_at
FROM reports";

/// Inserts a report authored by `actor`.
///
/// `verification_status` is computed here from the content and never
/// recomputed afterwards.
pub fn create_report(
    conn: &mut Connection,
    new: NewReport,
    actor: &Identity,
) -> Result<Report, RecordError> {
    require("content", &new.content)?;
    authorize(actor, Action::Create, None).into_result()?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    ensure_disaster_exists(&tx, &new.disaster_id)?;

    let verification_status = classify_report(&new.content).status();
    let report = Report {
        id: new_id(),
        disaster_id: new.disaster_id,
        author: actor.handle.clone(),
        content: new.content,
        image_url: new.image_url,
        verification_status,
        audit_trail: vec![audit_entry(AuditAction::Create, actor)],
        created_at: timestamp(),
    };

    tx.execute(
        "INSERT INTO reports (
            id, disaster_id, author, content, image_url, verification_status,
            audit_trail_json, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            report.id,
            report.disaster_id,
            report.author,
            report.content,
            report.image_url,
            report.verification_status.as_str(),
            serde_json::to_string(&report.audit_trail)?,
            report.created_at,
        ],
    )?;
    tx.commit()?;

    tracing::info!(
        report_id = %report.id,
        disaster_id = %report.disaster_id,
        actor = %actor.handle,
        status = report.verification_status.as_str(),
        "report created"
    );
    Ok(report)
}

pub fn get_report(conn: &Connection, id: &str) -> Result<Report, RecordError> {
    conn.query_row(
        &format!("{SELECT_COLUMNS} WHERE id = ?1"),
        [id],
        map_row_to_report,
    )
    .optional()?
    .ok_or_else(|| RecordError::not_found(ENTITY, id))
}

/// Lists the reports of one disaster, newest first.
pub fn list_reports(conn: &Connection, disaster_id: &str) -> Result<Vec<Report>, RecordError> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_COLUMNS} WHERE disaster_id = ?1 ORDER BY created_at DESC, rowid DESC"
    ))?;
    let rows = stmt.query_map([disaster_id], map_row_to_report)?;

    let mut reports = Vec::new();
    for row in rows {
        reports.push(row?);
    }
    Ok(reports)
}

/// Updates content or image URL. The verification status stays as triaged.
pub fn update_report(
    conn: &mut Connection,
    id: &str,
    patch: &ReportPatch,
    actor: &Identity,
) -> Result<Report, RecordError> {
    require_patch("content", patch.content.as_ref())?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut current = get_report(&tx, id)?;
    authorize(actor, Action::Update, Some(&current.author)).into_result()?;

    current
        .audit_trail
        .push(audit_entry(AuditAction::Update, actor));

    let mut sets = Assignments::new();
    if let Some(content) = &patch.content {
        sets.set("content", content.clone());
    }
    if let Some(image_url) = &patch.image_url {
        sets.set("image_url", image_url.clone());
    }
    sets.set(
        "audit_trail_json",
        serde_json::to_string(&current.audit_trail)?,
    );
    sets.execute(&tx, "reports", id)?;

    let updated = get_report(&tx, id)?;
    tx.commit()?;

    tracing::info!(report_id = %id, actor = %actor.handle, "report updated");
    Ok(updated)
}

/// Deletes a report and returns its tombstone.
pub fn delete_report(conn: &mut Connection, id: &str, actor: &Identity) -> Result<Report, RecordError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut tombstone = get_report(&tx, id)?;
    authorize(actor, Action::Delete, Some(&tombstone.author)).into_result()?;

    tombstone
        .audit_trail
        .push(audit_entry(AuditAction::Delete, actor));
    tx.execute(
        "UPDATE reports SET audit_trail_json = ?1 WHERE id = ?2",
        params![serde_json::to_string(&tombstone.audit_trail)?, id],
    )?;
    tx.execute("DELETE FROM reports WHERE id = ?1", [id])?;
    tx.commit()?;

    tracing::info!(report_id = %id, actor = %actor.handle, "report deleted");
    Ok(tombstone)
}

fn map_row_to_report(row: &Row) -> rusqlite::Result<Report> {
    let status: String = row.get(5)?;
    let verification_status = VerificationStatus::from_label(&status).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            format!("unknown verification status: {status}").into(),
        )
    })?;

    Ok(Report {
        id: row.get(0)?,
        disaster_id: row.get(1)?,
        author: row.get(2)?,
        content: row.get(3)?,
        image_url: row.get(4)?,
        verification_status,
        audit_trail: json_column(row, 6)?,
        created_at: row.get(7)?,
    })
}
