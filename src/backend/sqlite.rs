// =============================================================================
// SQLITE — Le driver fichier
// =============================================================================
//
// Trois façons d'ouvrir la base :
//   - fichier cache frais    → on l'ouvre tel quel
//   - fichier cache reconstruit (tronqué juste avant) → on l'ouvre et on
//     matérialise dedans ; pas besoin de DROP, le fichier est vide
//   - pas de cache           → base `:memory:`, perdue à la fin du processus
//
// =============================================================================

use std::path::Path;

use rusqlite::{Connection, OptionalExtension};

use super::sql::SqliteDialect;
use super::{Statement, Store};
use crate::error::BackendError;

/// Ouvre (ou crée) un fichier SQLite.
pub fn open_file(path: &Path) -> Result<Connection, BackendError> {
    Ok(Connection::open(path)?)
}

/// Ouvre une base éphémère en mémoire.
pub fn open_in_memory() -> Result<Connection, BackendError> {
    Ok(Connection::open_in_memory()?)
}

impl Store for Connection {
    type Dialect = SqliteDialect;

    fn table_exists(&mut self, table: &str) -> Result<bool, BackendError> {
        let found = self
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [table],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn execute_atomic(&mut self, statements: &[Statement]) -> Result<(), BackendError> {
        let tx = self.transaction()?;
        for stmt in statements {
            tx.execute_batch(&stmt.0)?;
        }
        tx.commit()?;
        Ok(())
    }
}
