use std::sync::Arc;

use chrono::Utc;
use contacts_common::{Contact, ContactChanges, Error, NewContact, Result};
use rusqlite::{Connection, OptionalExtension, Row, params};
use uuid::Uuid;

use crate::database::{Database, format_datetime, parse_datetime};

const CONTACT_COLUMNS: &str = "id, name, email, phone, category_id, created_at, updated_at";

/// Persistent storage for contacts. Expects the `contacts` table from the
/// bundled migrations to exist. Every call blocks on the shared connection.
#[derive(Clone)]
pub struct ContactStore {
    db: Arc<Database>,
}

impl ContactStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn create(&self, new: NewContact) -> Result<Contact> {
        let now = Utc::now();
        let contact = Contact {
            id: Uuid::new_v4().to_string(),
            name: new.name,
            email: new.email,
            phone: new.phone,
            category_id: new.category_id,
            created_at: now,
            updated_at: now,
        };

        let conn = self.db.connection()?;
        conn.execute(
            "INSERT INTO contacts (id, name, email, phone, category_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                contact.id,
                contact.name,
                contact.email,
                contact.phone,
                contact.category_id,
                format_datetime(contact.created_at),
                format_datetime(contact.updated_at),
            ],
        )
        .map_err(|e| Error::Database(format!("failed to create contact: {e}")))?;

        Ok(contact)
    }

    pub fn list(&self) -> Result<Vec<Contact>> {
        let conn = self.db.connection()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {CONTACT_COLUMNS} FROM contacts ORDER BY created_at ASC, id ASC"
            ))
            .map_err(|e| Error::Database(format!("failed to prepare query: {e}")))?;

        let rows = stmt
            .query_map([], map_contact)
            .map_err(|e| Error::Database(format!("failed to query contacts: {e}")))?;

        let mut contacts = Vec::new();
        for row in rows {
            contacts.push(
                row.map_err(|e| Error::Database(format!("failed to read contact row: {e}")))?,
            );
        }
        Ok(contacts)
    }

    pub fn get(&self, id: &str) -> Result<Contact> {
        let conn = self.db.connection()?;
        load(&conn, id)?.ok_or_else(|| Error::NotFound("contact".into()))
    }

    /// Overwrite the mutable fields of `id`. The read and the write share one
    /// connection guard so a concurrent delete cannot slip in between.
    pub fn update(&self, id: &str, changes: ContactChanges) -> Result<Contact> {
        let conn = self.db.connection()?;
        let mut contact = load(&conn, id)?.ok_or_else(|| Error::NotFound("contact".into()))?;

        contact.name = changes.name;
        contact.email = changes.email;
        contact.phone = changes.phone;
        contact.category_id = changes.category_id;
        contact.updated_at = Utc::now();

        let updated = conn
            .execute(
                "UPDATE contacts
                 SET name = ?1, email = ?2, phone = ?3, category_id = ?4, updated_at = ?5
                 WHERE id = ?6",
                params![
                    contact.name,
                    contact.email,
                    contact.phone,
                    contact.category_id,
                    format_datetime(contact.updated_at),
                    contact.id,
                ],
            )
            .map_err(|e| Error::Database(format!("failed to update contact: {e}")))?;
        if updated == 0 {
            return Err(Error::NotFound("contact".into()));
        }

        Ok(contact)
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        let conn = self.db.connection()?;
        let removed = conn
            .execute("DELETE FROM contacts WHERE id = ?1", params![id])
            .map_err(|e| Error::Database(format!("failed to delete contact: {e}")))?;
        if removed == 0 {
            return Err(Error::NotFound("contact".into()));
        }
        Ok(())
    }
}

fn load(conn: &Connection, id: &str) -> Result<Option<Contact>> {
    conn.query_row(
        &format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = ?1"),
        params![id],
        map_contact,
    )
    .optional()
    .map_err(|e| Error::Database(format!("failed to load contact: {e}")))
}

fn map_contact(row: &Row<'_>) -> rusqlite::Result<Contact> {
    Ok(Contact {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        category_id: row.get(4)?,
        created_at: parse_datetime(row.get::<_, String>(5)?),
        updated_at: parse_datetime(row.get::<_, String>(6)?),
    })
}
