//! # Template Store
//!
//! CRUD over `receipt_templates`, preserving the invariant that exactly one template is the
//! default once one has been seeded.
//!
//! Every operation that moves the default flag clears it everywhere and sets it on the target
//! inside a single transaction, while holding the connection lock. A partial unique index on
//! `is_default` backs the invariant at the database level.
//!
//! The flag is only ever moved, never cleared: updating the current default with
//! `isDefault = false` keeps it the default.

use crate::db::Db;
use crate::error::ReceiptError;
use crate::store::{json_column_error, now};
use common::model::template::{NewTemplate, Template, TemplateType};
use log::{debug, info, warn};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const COLUMNS: &str = "id, name, description, template_type, active, is_default, configuration, \
                       background_asset_path, source_file_path, created_at, updated_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Template> {
    let template_type: String = row.get(3)?;
    let configuration: String = row.get(6)?;
    Ok(Template {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        template_type: TemplateType::parse(&template_type).unwrap_or_default(),
        active: row.get(4)?,
        is_default: row.get(5)?,
        configuration: serde_json::from_str(&configuration)
            .map_err(|e| json_column_error(6, e))?,
        background_asset_path: row.get(7)?,
        source_file_path: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn select_by_id(conn: &Connection, id: i64) -> Result<Template, ReceiptError> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM receipt_templates WHERE id = ?1"),
        params![id],
        from_row,
    )
    .optional()?
    .ok_or_else(|| ReceiptError::not_found(format!("template {id}")))
}

fn check(template: &NewTemplate) -> Result<(), ReceiptError> {
    if template.name.trim().is_empty() {
        return Err(ReceiptError::Validation("template name must not be empty".to_string()));
    }
    template.configuration.validate().map_err(|issues| {
        ReceiptError::Validation(
            issues
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        )
    })
}

/// Uploads are named after their content, so one file can back several templates.
fn still_referenced(conn: &Connection, path: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM receipt_templates WHERE background_asset_path = ?1 \
         OR source_file_path = ?1 \
         OR json_extract(configuration, '$.layout.backgroundAsset') = ?1)",
        params![path],
        |row| row.get(0),
    )
}

/// Keeps the paths no remaining template points at.
fn orphaned(conn: &Connection, paths: Vec<Option<String>>) -> rusqlite::Result<Vec<String>> {
    let mut orphans: Vec<String> = Vec::new();
    for path in paths.into_iter().flatten() {
        if orphans.contains(&path) {
            continue;
        }
        if still_referenced(conn, &path)? {
            debug!("template asset {path} is still in use");
            continue;
        }
        orphans.push(path);
    }
    Ok(orphans)
}

/// Removes a file no template uses anymore. Failures are logged only.
fn remove_asset(path: &str) {
    let path = Path::new(path);
    if !path.exists() {
        debug!("template asset {} already gone", path.display());
        return;
    }
    if let Err(e) = std::fs::remove_file(path) {
        warn!("Could not delete template asset {}: {e}", path.display());
    }
}

#[derive(Clone)]
pub struct TemplateStore {
    db: Db,
}

impl TemplateStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub fn create(&self, template: &NewTemplate) -> Result<Template, ReceiptError> {
        check(template)?;
        let mut conn = self.db.lock();
        let tx = conn.transaction()?;
        if template.is_default {
            tx.execute("UPDATE receipt_templates SET is_default = 0 WHERE is_default = 1", [])?;
        }
        let stamp = now();
        tx.execute(
            "INSERT INTO receipt_templates (name, description, template_type, active, is_default, \
             configuration, background_asset_path, source_file_path, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
            params![
                template.name.trim(),
                template.description,
                template.template_type.as_str(),
                template.active,
                template.is_default,
                serde_json::to_string(&template.configuration)?,
                template.background_asset_path,
                template.source_file_path,
                stamp,
            ],
        )?;
        let created = select_by_id(&tx, tx.last_insert_rowid())?;
        tx.commit()?;

        info!("Created template #{} {:?}", created.id, created.name);
        Ok(created)
    }

    /// Replaces every field of template `id`, including its whole configuration.
    pub fn update(&self, id: i64, template: &NewTemplate) -> Result<Template, ReceiptError> {
        check(template)?;
        let mut conn = self.db.lock();
        let tx = conn.transaction()?;
        let current = select_by_id(&tx, id)?;
        if template.is_default && !current.is_default {
            tx.execute("UPDATE receipt_templates SET is_default = 0 WHERE is_default = 1", [])?;
        }
        tx.execute(
            "UPDATE receipt_templates SET name = ?1, description = ?2, template_type = ?3, \
             active = ?4, is_default = ?5, configuration = ?6, background_asset_path = ?7, \
             source_file_path = ?8, updated_at = ?9 WHERE id = ?10",
            params![
                template.name.trim(),
                template.description,
                template.template_type.as_str(),
                template.active,
                template.is_default || current.is_default,
                serde_json::to_string(&template.configuration)?,
                template.background_asset_path,
                template.source_file_path,
                now(),
                id,
            ],
        )?;
        let updated = select_by_id(&tx, id)?;
        tx.commit()?;
        Ok(updated)
    }

    /// Deletes a non-default template, then removes the files no other template uses, on a
    /// best-effort basis.
    pub fn delete(&self, id: i64) -> Result<(), ReceiptError> {
        let orphans = {
            let mut conn = self.db.lock();
            let tx = conn.transaction()?;
            let template = select_by_id(&tx, id)?;
            if template.is_default {
                return Err(ReceiptError::CannotDeleteDefault);
            }
            tx.execute("DELETE FROM receipt_templates WHERE id = ?1", params![id])?;
            let orphans = orphaned(
                &tx,
                vec![template.background_asset_path, template.source_file_path],
            )?;
            tx.commit()?;
            orphans
        };

        info!("Deleted template #{id}");
        for path in &orphans {
            remove_asset(path);
        }
        Ok(())
    }

    pub fn set_default(&self, id: i64) -> Result<Template, ReceiptError> {
        let mut conn = self.db.lock();
        let tx = conn.transaction()?;
        select_by_id(&tx, id)?;
        tx.execute("UPDATE receipt_templates SET is_default = 0 WHERE is_default = 1", [])?;
        tx.execute(
            "UPDATE receipt_templates SET is_default = 1, updated_at = ?1 WHERE id = ?2",
            params![now(), id],
        )?;
        let template = select_by_id(&tx, id)?;
        tx.commit()?;

        info!("Template #{id} is now the default");
        Ok(template)
    }

    pub fn find_default(&self) -> Result<Template, ReceiptError> {
        let conn = self.db.lock();
        conn.query_row(
            &format!("SELECT {COLUMNS} FROM receipt_templates WHERE is_default = 1 LIMIT 1"),
            [],
            from_row,
        )
        .optional()?
        .ok_or_else(|| ReceiptError::not_found("default template"))
    }

    pub fn find_by_id(&self, id: i64) -> Result<Template, ReceiptError> {
        select_by_id(&self.db.lock(), id)
    }

    /// Default template first, then newest first.
    pub fn find_all(&self) -> Result<Vec<Template>, ReceiptError> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM receipt_templates \
             ORDER BY is_default DESC, created_at DESC, id DESC"
        ))?;
        let templates = stmt
            .query_map([], from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(templates)
    }

    /// Points template `id` at a new background image. The previous file is removed on a
    /// best-effort basis unless another template still uses it.
    pub fn attach_background(&self, id: i64, path: &str) -> Result<Template, ReceiptError> {
        let (orphans, updated) = {
            let mut conn = self.db.lock();
            let tx = conn.transaction()?;
            let current = select_by_id(&tx, id)?;
            tx.execute(
                "UPDATE receipt_templates SET background_asset_path = ?1, updated_at = ?2 WHERE id = ?3",
                params![path, now(), id],
            )?;
            let updated = select_by_id(&tx, id)?;
            let orphans = orphaned(&tx, vec![current.background_asset_path])?;
            tx.commit()?;
            (orphans, updated)
        };

        for old in &orphans {
            remove_asset(old);
        }
        Ok(updated)
    }
}
