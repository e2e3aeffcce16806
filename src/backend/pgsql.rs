// =============================================================================
// PGSQL — Le driver réseau (feature `postgres`)
// =============================================================================
//
// Contrairement au driver fichier, il n'y a pas de cache : à chaque
// démarrage on supprime la table si elle existe, puis on la reconstruit
// entièrement contre le serveur.
//
// =============================================================================

use ::postgres::{Client, NoTls};

use super::sql::PostgresDialect;
use super::{Statement, Store};
use crate::error::BackendError;

/// Ouvre une connexion bloquante vers le serveur.
pub fn connect(url: &str) -> Result<Client, BackendError> {
    Ok(Client::connect(url, NoTls)?)
}

impl Store for Client {
    type Dialect = PostgresDialect;

    fn table_exists(&mut self, table: &str) -> Result<bool, BackendError> {
        let row = self.query_one(
            "SELECT EXISTS (SELECT 1 FROM information_schema.tables \
             WHERE table_schema = current_schema() AND table_name = $1)",
            &[&table],
        )?;
        Ok(row.get(0))
    }

    fn execute_atomic(&mut self, statements: &[Statement]) -> Result<(), BackendError> {
        let mut tx = self.transaction()?;
        for stmt in statements {
            tx.batch_execute(&stmt.0)?;
        }
        tx.commit()?;
        Ok(())
    }
}
