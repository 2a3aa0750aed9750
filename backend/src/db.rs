//! # SQLite Storage
//!
//! One connection per process, shared behind a mutex. Every store operation locks it for its
//! whole duration, so operations that span several statements run inside a transaction and
//! never interleave with another request.
//!
//! ## Workflow
//!
//! 1.  [`open`] (or [`open_in_memory`] for tests) connects and enables foreign keys.
//! 2.  [`migrate`] creates the schema if missing. It is idempotent.
//! 3.  [`seed`] inserts the default template and the owner when their tables are empty.

use crate::error::ReceiptError;
use crate::store::TemplateStore;
use common::model::configuration::TemplateConfiguration;
use common::model::landlord::Landlord;
use common::model::template::{NewTemplate, TemplateType};
use log::info;
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;

pub type Db = Arc<Mutex<Connection>>;

pub const DEFAULT_TEMPLATE_NAME: &str = "Template par défaut";
pub const DEFAULT_TEMPLATE_DESCRIPTION: &str = "Template de quittance de loyer français standard";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS apartments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    address TEXT NOT NULL,
    city TEXT NOT NULL,
    postal_code TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tenants (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    gender TEXT NOT NULL DEFAULT 'M',
    email TEXT,
    address TEXT,
    apartment_id INTEGER REFERENCES apartments(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS owner (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    name TEXT NOT NULL,
    address_line1 TEXT NOT NULL,
    address_line2 TEXT,
    signature_text TEXT,
    signature_image_path TEXT
);

CREATE TABLE IF NOT EXISTS receipt_templates (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT,
    template_type TEXT NOT NULL DEFAULT 'custom',
    active INTEGER NOT NULL DEFAULT 1,
    is_default INTEGER NOT NULL DEFAULT 0,
    configuration TEXT NOT NULL,
    background_asset_path TEXT,
    source_file_path TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS receipt_templates_single_default
    ON receipt_templates (is_default) WHERE is_default = 1;

CREATE TABLE IF NOT EXISTS receipts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    tenant_id INTEGER NOT NULL REFERENCES tenants(id),
    template_id INTEGER REFERENCES receipt_templates(id) ON DELETE SET NULL,
    month INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
    year INTEGER NOT NULL,
    amount REAL NOT NULL,
    charges REAL NOT NULL DEFAULT 0,
    file_name TEXT NOT NULL,
    file_path TEXT NOT NULL,
    email_sent INTEGER NOT NULL DEFAULT 0,
    email_sent_at TEXT,
    created_at TEXT NOT NULL,
    UNIQUE (tenant_id, month, year)
);
"#;

fn configure(conn: Connection) -> Result<Db, ReceiptError> {
    conn.pragma_update(None, "foreign_keys", true)?;
    migrate(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// Opens (creating if needed) the database file at `path` and applies the schema.
pub fn open(path: &Path) -> Result<Db, ReceiptError> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    configure(Connection::open(path)?)
}

pub fn open_in_memory() -> Result<Db, ReceiptError> {
    configure(Connection::open_in_memory()?)
}

pub fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)
}

/// Inserts the default template and, when given, the owner, each only into an empty table.
pub fn seed(db: &Db, landlord: Option<&Landlord>) -> Result<(), ReceiptError> {
    let templates: i64 = db
        .lock()
        .query_row("SELECT COUNT(*) FROM receipt_templates", [], |row| row.get(0))?;
    if templates == 0 {
        let template = TemplateStore::new(db.clone()).create(&NewTemplate {
            name: DEFAULT_TEMPLATE_NAME.to_string(),
            description: Some(DEFAULT_TEMPLATE_DESCRIPTION.to_string()),
            template_type: TemplateType::Default,
            active: true,
            is_default: true,
            configuration: TemplateConfiguration::standard(),
            background_asset_path: None,
            source_file_path: None,
        })?;
        info!("Seeded default template #{}", template.id);
    }

    if let Some(landlord) = landlord {
        let conn = db.lock();
        let owners: i64 = conn.query_row("SELECT COUNT(*) FROM owner", [], |row| row.get(0))?;
        if owners == 0 {
            crate::store::records::write_landlord(&conn, landlord)?;
            info!("Seeded owner {}", landlord.name);
        }
    }
    Ok(())
}
