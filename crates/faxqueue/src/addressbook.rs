//! Recipient address book.

use serde::Serialize;
use thiserror::Error;

use crate::db::contact_repo::{self, ContactRow};
use crate::db::{Database, DatabaseError};
use crate::job::normalize_fax_number;
use crate::job::record::now_iso;

#[derive(Error, Debug)]
pub enum AddressBookError {
    #[error("Contact name must not be empty")]
    EmptyName,

    #[error("Contact number '{0}' contains no digits")]
    EmptyNumber(String),

    #[error("Contact {0} not found")]
    NotFound(i64),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contact {
    pub id: i64,
    pub name: String,
    pub number: String,
    pub note: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ContactRow> for Contact {
    fn from(row: ContactRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            number: row.number,
            note: row.note,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub trait AddressBook {
    /// All contacts ordered by name, case-insensitive.
    fn list(&self) -> Result<Vec<Contact>, AddressBookError>;

    fn get(&self, id: i64) -> Result<Option<Contact>, AddressBookError>;

    /// Inserts a contact, or updates contact `id` when given. Returns the id.
    fn upsert(
        &self,
        id: Option<i64>,
        name: &str,
        number: &str,
        note: &str,
    ) -> Result<i64, AddressBookError>;

    /// Returns false when no contact had that id.
    fn delete(&self, id: i64) -> Result<bool, AddressBookError>;
}

/// Address book stored in the SQLite phonebook database.
#[derive(Clone)]
pub struct SqliteAddressBook {
    db: Database,
    country_code: String,
}

impl SqliteAddressBook {
    pub fn new(db: Database, country_code: impl Into<String>) -> Self {
        Self {
            db,
            country_code: country_code.into(),
        }
    }
}

impl AddressBook for SqliteAddressBook {
    fn list(&self) -> Result<Vec<Contact>, AddressBookError> {
        Ok(contact_repo::list(&self.db)?
            .into_iter()
            .map(Contact::from)
            .collect())
    }

    fn get(&self, id: i64) -> Result<Option<Contact>, AddressBookError> {
        Ok(contact_repo::find_by_id(&self.db, id)?.map(Contact::from))
    }

    fn upsert(
        &self,
        id: Option<i64>,
        name: &str,
        number: &str,
        note: &str,
    ) -> Result<i64, AddressBookError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AddressBookError::EmptyName);
        }
        let normalized = normalize_fax_number(number, &self.country_code);
        if normalized.is_empty() {
            return Err(AddressBookError::EmptyNumber(number.to_string()));
        }
        let note = note.trim();
        let now = now_iso();

        match id {
            Some(id) => {
                if !contact_repo::update(&self.db, id, name, &normalized, note, &now)? {
                    return Err(AddressBookError::NotFound(id));
                }
                log::info!("Updated contact {}", id);
                Ok(id)
            }
            None => {
                let id = contact_repo::insert(&self.db, name, &normalized, note, &now)?;
                log::info!("Added contact {}", id);
                Ok(id)
            }
        }
    }

    fn delete(&self, id: i64) -> Result<bool, AddressBookError> {
        let removed = contact_repo::delete(&self.db, id)?;
        if removed {
            log::info!("Deleted contact {}", id);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> SqliteAddressBook {
        SqliteAddressBook::new(Database::open_in_memory().unwrap(), "49")
    }

    #[test]
    fn test_upsert_normalizes_number() {
        let book = book();
        let id = book.upsert(None, "  Clinic A ", "0231 / 555-12", "").unwrap();

        let contact = book.get(id).unwrap().unwrap();
        assert_eq!(contact.name, "Clinic A");
        assert_eq!(contact.number, "4923155512");
    }

    #[test]
    fn test_upsert_rejects_empty_fields() {
        let book = book();
        assert!(matches!(
            book.upsert(None, "  ", "0231", ""),
            Err(AddressBookError::EmptyName)
        ));
        assert!(matches!(
            book.upsert(None, "Clinic", "n/a", ""),
            Err(AddressBookError::EmptyNumber(_))
        ));
        assert!(book.list().unwrap().is_empty());
    }

    #[test]
    fn test_upsert_updates_existing() {
        let book = book();
        let id = book.upsert(None, "Clinic", "4912345", "").unwrap();
        let same = book.upsert(Some(id), "Clinic B", "4912345", "night line").unwrap();

        assert_eq!(same, id);
        let contacts = book.list().unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].name, "Clinic B");
        assert_eq!(contacts[0].note, "night line");
    }

    #[test]
    fn test_upsert_unknown_id() {
        let book = book();
        assert!(matches!(
            book.upsert(Some(7), "Clinic", "4912345", ""),
            Err(AddressBookError::NotFound(7))
        ));
    }

    #[test]
    fn test_delete() {
        let book = book();
        let id = book.upsert(None, "Clinic", "4912345", "").unwrap();
        assert!(book.delete(id).unwrap());
        assert!(!book.delete(id).unwrap());
        assert!(book.get(id).unwrap().is_none());
    }
}
