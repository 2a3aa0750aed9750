//! Tenants, the owner and generated receipts.
//!
//! Managing tenants and apartments belongs to the surrounding CRUD screens; this store only
//! offers what receipt generation needs plus the inserts used to seed data.

use crate::db::Db;
use crate::error::ReceiptError;
use crate::store::now;
use common::model::landlord::Landlord;
use common::model::receipt::{NewReceipt, Receipt};
use common::model::tenant::{ApartmentAddress, Gender, NewTenant, Tenant};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};

const RECEIPT_COLUMNS: &str = "id, tenant_id, template_id, month, year, amount, charges, \
                               file_name, file_path, email_sent, email_sent_at, created_at";

fn receipt_from_row(row: &Row<'_>) -> rusqlite::Result<Receipt> {
    Ok(Receipt {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        template_id: row.get(2)?,
        month: row.get(3)?,
        year: row.get(4)?,
        amount: row.get(5)?,
        charges: row.get(6)?,
        file_name: row.get(7)?,
        file_path: row.get(8)?,
        email_sent: row.get(9)?,
        email_sent_at: row.get(10)?,
        created_at: row.get(11)?,
    })
}

fn tenant_from_row(row: &Row<'_>) -> rusqlite::Result<Tenant> {
    let gender: String = row.get(3)?;
    let apartment_address: Option<String> = row.get(6)?;
    let apartment = match apartment_address {
        Some(address) => Some(ApartmentAddress {
            address,
            city: row.get(7)?,
            postal_code: row.get(8)?,
        }),
        None => None,
    };
    Ok(Tenant {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        gender: Gender::parse(&gender),
        email: row.get(4)?,
        address: row.get(5)?,
        apartment,
    })
}

fn select_receipt(conn: &Connection, id: i64) -> Result<Receipt, ReceiptError> {
    conn.query_row(
        &format!("SELECT {RECEIPT_COLUMNS} FROM receipts WHERE id = ?1"),
        params![id],
        receipt_from_row,
    )
    .optional()?
    .ok_or_else(|| ReceiptError::not_found(format!("receipt {id}")))
}

/// Inserts or replaces the singleton owner row.
pub(crate) fn write_landlord(conn: &Connection, landlord: &Landlord) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO owner (id, name, address_line1, address_line2, signature_text, signature_image_path) \
         VALUES (1, ?1, ?2, ?3, ?4, ?5) \
         ON CONFLICT(id) DO UPDATE SET name = excluded.name, address_line1 = excluded.address_line1, \
         address_line2 = excluded.address_line2, signature_text = excluded.signature_text, \
         signature_image_path = excluded.signature_image_path",
        params![
            landlord.name,
            landlord.address_line1,
            landlord.address_line2,
            landlord.signature_text,
            landlord.signature_image_path,
        ],
    )?;
    Ok(())
}

/// Only the `UNIQUE (tenant_id, month, year)` constraint can fail this way on `receipts`;
/// foreign key and NOT NULL failures share the primary code but not the extended one.
fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

#[derive(Clone)]
pub struct RecordStore {
    db: Db,
}

impl RecordStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// The tenant, with the address of the linked apartment when there is one.
    pub fn tenant_by_id(&self, id: i64) -> Result<Tenant, ReceiptError> {
        let conn = self.db.lock();
        conn.query_row(
            "SELECT t.id, t.first_name, t.last_name, t.gender, t.email, t.address, \
                    a.address, a.city, a.postal_code \
             FROM tenants t LEFT JOIN apartments a ON a.id = t.apartment_id \
             WHERE t.id = ?1",
            params![id],
            tenant_from_row,
        )
        .optional()?
        .ok_or_else(|| ReceiptError::not_found(format!("tenant {id}")))
    }

    pub fn insert_apartment(&self, apartment: &ApartmentAddress) -> Result<i64, ReceiptError> {
        let conn = self.db.lock();
        conn.execute(
            "INSERT INTO apartments (address, city, postal_code) VALUES (?1, ?2, ?3)",
            params![apartment.address, apartment.city, apartment.postal_code],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn insert_tenant(&self, tenant: &NewTenant) -> Result<Tenant, ReceiptError> {
        let id = {
            let conn = self.db.lock();
            conn.execute(
                "INSERT INTO tenants (first_name, last_name, gender, email, address, apartment_id) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    tenant.first_name,
                    tenant.last_name,
                    tenant.gender.as_str(),
                    tenant.email,
                    tenant.address,
                    tenant.apartment_id,
                ],
            )?;
            conn.last_insert_rowid()
        };
        self.tenant_by_id(id)
    }

    pub fn landlord(&self) -> Result<Landlord, ReceiptError> {
        let conn = self.db.lock();
        conn.query_row(
            "SELECT name, address_line1, address_line2, signature_text, signature_image_path \
             FROM owner WHERE id = 1",
            [],
            |row| {
                Ok(Landlord {
                    name: row.get(0)?,
                    address_line1: row.get(1)?,
                    address_line2: row.get(2)?,
                    signature_text: row.get(3)?,
                    signature_image_path: row.get(4)?,
                })
            },
        )
        .optional()?
        .ok_or_else(|| ReceiptError::not_found("owner"))
    }

    pub fn save_landlord(&self, landlord: &Landlord) -> Result<(), ReceiptError> {
        write_landlord(&self.db.lock(), landlord)?;
        Ok(())
    }

    pub fn receipt_exists(&self, tenant_id: i64, month: u32, year: i32) -> Result<bool, ReceiptError> {
        let conn = self.db.lock();
        let exists = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM receipts WHERE tenant_id = ?1 AND month = ?2 AND year = ?3)",
            params![tenant_id, month, year],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Records a generated receipt. A second receipt for the same tenant and period is
    /// rejected with [`ReceiptError::DuplicatePeriod`].
    pub fn save_receipt(&self, receipt: &NewReceipt) -> Result<Receipt, ReceiptError> {
        let conn = self.db.lock();
        conn.execute(
            "INSERT INTO receipts (tenant_id, template_id, month, year, amount, charges, \
             file_name, file_path, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                receipt.tenant_id,
                receipt.template_id,
                receipt.month,
                receipt.year,
                receipt.amount,
                receipt.charges,
                receipt.file_name,
                receipt.file_path,
                now(),
            ],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                ReceiptError::DuplicatePeriod {
                    tenant_id: receipt.tenant_id,
                    month: receipt.month,
                    year: receipt.year,
                }
            } else {
                ReceiptError::Database(e)
            }
        })?;
        select_receipt(&conn, conn.last_insert_rowid())
    }

    /// Newest period first.
    pub fn receipts_for_tenant(&self, tenant_id: i64) -> Result<Vec<Receipt>, ReceiptError> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {RECEIPT_COLUMNS} FROM receipts WHERE tenant_id = ?1 \
             ORDER BY year DESC, month DESC, id DESC"
        ))?;
        let receipts = stmt
            .query_map(params![tenant_id], receipt_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(receipts)
    }

    pub fn receipt_by_id(&self, id: i64) -> Result<Receipt, ReceiptError> {
        select_receipt(&self.db.lock(), id)
    }

    pub fn mark_email_sent(&self, id: i64) -> Result<Receipt, ReceiptError> {
        let conn = self.db.lock();
        let changed = conn.execute(
            "UPDATE receipts SET email_sent = 1, email_sent_at = ?1 WHERE id = ?2",
            params![now(), id],
        )?;
        if changed == 0 {
            return Err(ReceiptError::not_found(format!("receipt {id}")));
        }
        select_receipt(&conn, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn new_receipt(tenant_id: i64, month: u32) -> NewReceipt {
        NewReceipt {
            tenant_id,
            template_id: None,
            month,
            year: 2024,
            amount: 500.0,
            charges: 50.0,
            file_name: format!("2024_{month:02}.pdf"),
            file_path: format!("receipts/2024_{month:02}.pdf"),
        }
    }

    fn tenant(store: &RecordStore, apartment_id: Option<i64>) -> Tenant {
        store
            .insert_tenant(&NewTenant {
                first_name: "Jean".to_string(),
                last_name: "Dupont".to_string(),
                gender: Gender::M,
                email: None,
                address: Some("ancienne adresse".to_string()),
                apartment_id,
            })
            .unwrap()
    }

    #[test]
    fn tenant_prefers_apartment_address() {
        let store = RecordStore::new(open_in_memory().unwrap());
        let apartment = store
            .insert_apartment(&ApartmentAddress {
                address: "5 avenue de Paris".to_string(),
                city: "Versailles".to_string(),
                postal_code: "78000".to_string(),
            })
            .unwrap();
        let linked = tenant(&store, Some(apartment));
        assert_eq!(linked.resolved_address(), "5 avenue de Paris, Versailles 78000");
        let unlinked = tenant(&store, None);
        assert_eq!(unlinked.resolved_address(), "ancienne adresse");
    }

    #[test]
    fn duplicate_period_maps_to_typed_error() {
        let store = RecordStore::new(open_in_memory().unwrap());
        let renter = tenant(&store, None);
        store.save_receipt(&new_receipt(renter.id, 8)).unwrap();
        assert!(store.receipt_exists(renter.id, 8, 2024).unwrap());
        assert!(!store.receipt_exists(renter.id, 9, 2024).unwrap());
        let err = store.save_receipt(&new_receipt(renter.id, 8)).unwrap_err();
        assert_eq!(err.kind(), "duplicate_period");
    }

    #[test]
    fn unknown_tenant_is_not_reported_as_duplicate() {
        let store = RecordStore::new(open_in_memory().unwrap());
        let err = store.save_receipt(&new_receipt(404, 8)).unwrap_err();
        assert_eq!(err.kind(), "database_error");
        assert!(!store.receipt_exists(404, 8, 2024).unwrap());
    }

    #[test]
    fn receipts_newest_first_and_email_flag() {
        let store = RecordStore::new(open_in_memory().unwrap());
        let renter = tenant(&store, None);
        let august = store.save_receipt(&new_receipt(renter.id, 8)).unwrap();
        store.save_receipt(&new_receipt(renter.id, 9)).unwrap();
        let months: Vec<u32> = store
            .receipts_for_tenant(renter.id)
            .unwrap()
            .iter()
            .map(|r| r.month)
            .collect();
        assert_eq!(months, vec![9, 8]);

        assert!(!august.email_sent);
        let sent = store.mark_email_sent(august.id).unwrap();
        assert!(sent.email_sent);
        assert!(sent.email_sent_at.is_some());
        assert_eq!(store.mark_email_sent(404).unwrap_err().kind(), "not_found");
    }

    #[test]
    fn landlord_is_a_singleton() {
        let store = RecordStore::new(open_in_memory().unwrap());
        assert_eq!(store.landlord().unwrap_err().kind(), "not_found");
        let mut owner = Landlord {
            name: "Marie Martin".to_string(),
            address_line1: "8 rue des Lilas".to_string(),
            address_line2: Some("75011 Paris".to_string()),
            signature_text: None,
            signature_image_path: None,
        };
        store.save_landlord(&owner).unwrap();
        owner.name = "Marie Martin-Leroy".to_string();
        store.save_landlord(&owner).unwrap();
        assert_eq!(store.landlord().unwrap(), owner);
    }
}
