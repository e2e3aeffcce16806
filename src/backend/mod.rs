// =============================================================================
// BACKEND — Matérialisation d'une table dans une base réelle
// =============================================================================
//
// Le backend traduit un TableDefinition et des Records en commandes SQL,
// puis les exécute sur une base concrète. Deux variantes :
//   - SQLite (driver fichier) : fichier cache ou base en mémoire
//   - PostgreSQL (driver réseau) : serveur vivant, feature `postgres`
//
// Le protocole est le même pour les deux :
//   1. (réseau uniquement) la table existe déjà ? → DROP
//   2. CREATE TABLE, colonnes dans l'ordre du TableDefinition
//   3. INSERT de toutes les lignes, dans l'ordre, en UNE transaction
//
// Le cœur (module core) ne connaît JAMAIS les backends.
//
// =============================================================================

pub mod sql;
pub mod sqlite;
#[cfg(feature = "postgres")]
pub mod pgsql;

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::core::record::Record;
use crate::core::schema::TableDefinition;
use crate::error::BackendError;
use sql::{SqlBackend, SqlDialect};

/// Une commande SQL générée.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement(pub String);

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Le driver de stockage, choisi une fois pour tout le processus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Driver {
    /// Fichier SQLite en cache (ou mémoire)
    #[default]
    Sqlite,
    /// Serveur PostgreSQL
    Postgres,
}

impl Driver {
    /// Le driver réseau reconstruit toujours et supprime l'ancienne table.
    pub fn is_networked(&self) -> bool {
        matches!(self, Driver::Postgres)
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Driver::Sqlite => write!(f, "sqlite"),
            Driver::Postgres => write!(f, "pgsql"),
        }
    }
}

impl FromStr for Driver {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Driver::Sqlite),
            "pgsql" | "postgres" | "postgresql" => Ok(Driver::Postgres),
            other => Err(format!("driver inconnu : {}", other)),
        }
    }
}

/// Une base sur laquelle on peut matérialiser une table.
///
/// Chaque implémentation fournit son dialecte SQL ; la génération des
/// commandes est partagée (voir `SqlBackend`).
pub trait Store {
    type Dialect: SqlDialect + Default;

    /// La table existe-t-elle déjà ?
    fn table_exists(&mut self, table: &str) -> Result<bool, BackendError>;

    /// Exécute toutes les commandes dans une seule transaction :
    /// soit tout est appliqué, soit rien.
    fn execute_atomic(&mut self, statements: &[Statement]) -> Result<(), BackendError>;
}

/// Signal « table prête » renvoyé par la matérialisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Materialized {
    pub table: String,
    pub rows: usize,
    /// Une ancienne table a été supprimée avant la création
    pub dropped: bool,
}

/// Crée la table décrite par `definition` et y insère `records`.
///
/// `drop_existing` active l'étape de suppression préalable (driver réseau).
pub fn materialize<S: Store>(
    store: &mut S,
    definition: &TableDefinition,
    records: &[Record],
    drop_existing: bool,
) -> Result<Materialized, BackendError> {
    let backend = SqlBackend::new(S::Dialect::default());

    let mut ddl = Vec::with_capacity(2);
    let dropped = drop_existing && store.table_exists(&definition.table)?;
    if dropped {
        ddl.push(backend.drop_table_sql(&definition.table));
    }
    ddl.push(backend.create_table_sql(definition));
    store.execute_atomic(&ddl)?;

    let inserts = backend.insert_rows_sql(definition, records);
    store.execute_atomic(&inserts)?;

    debug!(
        table = %definition.table,
        dialect = backend.dialect.dialect_name(),
        rows = records.len(),
        dropped,
        "table matérialisée"
    );
    Ok(Materialized {
        table: definition.table.clone(),
        rows: records.len(),
        dropped,
    })
}
