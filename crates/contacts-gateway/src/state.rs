use std::sync::Arc;

use contacts_db::{ContactStore, Database};

/// Shared application state accessible from all request handlers.
pub struct AppState {
    pub contacts: ContactStore,
}

impl AppState {
    /// `db` must already be migrated; handlers assume the `contacts` table exists.
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            contacts: ContactStore::new(db),
        }
    }
}

pub type SharedState = Arc<AppState>;
