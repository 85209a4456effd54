//! Client records and the client registry.

use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::storage::Database;

/// A registered client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    /// Identifier assigned by storage.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Contact email, unique across clients.
    pub email: String,
}

impl Client {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("ID")?,
            name: row.get("Name")?,
            email: row.get("Email")?,
        })
    }
}

/// Input for [`ClientRegistry::register_client`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClient {
    /// Display name; must not be blank.
    pub name: String,
    /// Contact email; must look like an address.
    pub email: String,
}

impl NewClient {
    /// Create a new client input.
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Check the input, returning it with both fields trimmed.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank name or a malformed email.
    pub fn validate(self) -> Result<Self> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(Error::validation("name", "must not be empty"));
        }

        let email = self.email.trim();
        if email.is_empty() {
            return Err(Error::validation("email", "must not be empty"));
        }
        if !email.contains('@') {
            return Err(Error::validation(
                "email",
                format!("'{email}' is not an email address"),
            ));
        }

        Ok(Self {
            name: name.to_string(),
            email: email.to_string(),
        })
    }
}

/// Registers and looks up clients.
#[derive(Debug, Clone)]
pub struct ClientRegistry {
    db: Database,
}

impl ClientRegistry {
    /// Create a registry backed by the given database.
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Register a client and return it with its assigned identifier.
    ///
    /// Uniqueness of the email is enforced by the database, so two racing
    /// registrations of the same address cannot both succeed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UniqueConstraintViolation`] if the email is taken,
    /// a validation error for bad input, or a storage error.
    pub fn register_client(&self, client: NewClient) -> Result<Client> {
        let client = client.validate()?;
        let conn = self.db.connect()?;

        conn.execute(
            "INSERT INTO Clients (Name, Email) VALUES (?1, ?2)",
            params![client.name, client.email],
        )
        .map_err(|err| {
            if is_unique_violation(&err) {
                warn!("Rejected duplicate client email {}", client.email);
                Error::UniqueConstraintViolation {
                    field: "email",
                    value: client.email.clone(),
                }
            } else {
                err.into()
            }
        })?;

        let id = conn.last_insert_rowid();
        debug!("Registered client {} <{}>", id, client.email);

        Ok(Client {
            id,
            name: client.name,
            email: client.email,
        })
    }

    /// Get every client, in registration order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_all_clients(&self) -> Result<Vec<Client>> {
        let conn = self.db.connect()?;
        let mut stmt = conn.prepare("SELECT ID, Name, Email FROM Clients ORDER BY ID")?;

        let clients = stmt
            .query_map([], Client::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(clients)
    }

    /// Get a client by identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_client(&self, id: i64) -> Result<Option<Client>> {
        let conn = self.db.connect()?;
        let client = conn
            .query_row(
                "SELECT ID, Name, Email FROM Clients WHERE ID = ?1",
                [id],
                Client::from_row,
            )
            .optional()?;
        Ok(client)
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::create_test_database;

    #[test]
    fn test_register_and_get() {
        let (_dir, db) = create_test_database();
        let registry = ClientRegistry::new(db);

        let client = registry
            .register_client(NewClient::new("Ada Lovelace", "ada@example.com"))
            .unwrap();
        let fetched = registry.get_client(client.id).unwrap().unwrap();

        assert_eq!(fetched, client);
        assert_eq!(fetched.name, "Ada Lovelace");
        assert_eq!(fetched.email, "ada@example.com");
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let (_dir, db) = create_test_database();
        let registry = ClientRegistry::new(db);

        registry
            .register_client(NewClient::new("Ada", "ada@example.com"))
            .unwrap();
        let err = registry
            .register_client(NewClient::new("Someone Else", "ada@example.com"))
            .unwrap_err();

        assert!(err.is_unique_violation());
        assert_eq!(registry.get_all_clients().unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_after_trimming_rejected() {
        let (_dir, db) = create_test_database();
        let registry = ClientRegistry::new(db);

        registry
            .register_client(NewClient::new("Ada", "ada@example.com"))
            .unwrap();
        let err = registry
            .register_client(NewClient::new("Ada", "  ada@example.com "))
            .unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[test]
    fn test_distinct_emails_both_succeed() {
        let (_dir, db) = create_test_database();
        let registry = ClientRegistry::new(db);

        let a = registry
            .register_client(NewClient::new("Ada", "ada@example.com"))
            .unwrap();
        let b = registry
            .register_client(NewClient::new("Ada", "ada.l@example.com"))
            .unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(registry.get_all_clients().unwrap(), vec![a, b]);
    }

    #[test]
    fn test_blank_name_rejected() {
        let (_dir, db) = create_test_database();
        let registry = ClientRegistry::new(db);

        let err = registry
            .register_client(NewClient::new(" ", "ada@example.com"))
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_malformed_email_rejected() {
        let (_dir, db) = create_test_database();
        let registry = ClientRegistry::new(db);

        let err = registry
            .register_client(NewClient::new("Ada", "not-an-address"))
            .unwrap_err();
        assert!(err.to_string().contains("email"));

        let err = registry
            .register_client(NewClient::new("Ada", ""))
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_get_nonexistent() {
        let (_dir, db) = create_test_database();
        let registry = ClientRegistry::new(db);
        assert!(registry.get_client(12).unwrap().is_none());
    }
}
