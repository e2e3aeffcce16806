// =============================================================================
// REGISTRY — Identité de modèle → connexion vivante
// =============================================================================
//
// Chaque modèle obtient sa connexion UNE fois, au premier démarrage, puis
// elle reste enregistrée pour toute la vie du processus :
//
//   registry.get_or_try_init("app::State", || démarrer…)   → démarre
//   registry.get_or_try_init("app::State", || …)           → déjà là, rien ne tourne
//
// Le registre est un objet explicite (pas de global caché) : l'application
// le crée, le partage, et le passe à qui en a besoin.
//
// Une cellule par identité : le verrou de la table n'est tenu que le temps
// de trouver la cellule, jamais pendant un démarrage. Un modèle peut donc
// en démarrer un autre depuis ses `rows()`.
//
// =============================================================================

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use once_cell::sync::OnceCell;

use crate::backend::Materialized;
use crate::core::cache::BootPath;
use crate::error::{BackendError, Result};

/// La connexion concrète derrière un modèle.
pub enum Connection {
    Sqlite(rusqlite::Connection),
    #[cfg(feature = "postgres")]
    Postgres(::postgres::Client),
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Connection::Sqlite(_) => write!(f, "Connection::Sqlite"),
            #[cfg(feature = "postgres")]
            Connection::Postgres(_) => write!(f, "Connection::Postgres"),
        }
    }
}

/// Connexion enregistrée pour un modèle, avec la façon dont elle a été obtenue.
#[derive(Debug)]
pub struct ConnectionHandle {
    identity: String,
    table: String,
    boot_path: BootPath,
    cache_file: Option<PathBuf>,
    materialized: Option<Materialized>,
    connection: Mutex<Connection>,
}

impl ConnectionHandle {
    pub fn new(
        identity: &str,
        table: &str,
        boot_path: BootPath,
        cache_file: Option<PathBuf>,
        connection: Connection,
    ) -> Self {
        ConnectionHandle {
            identity: identity.to_string(),
            table: table.to_string(),
            boot_path,
            cache_file,
            materialized: None,
            connection: Mutex::new(connection),
        }
    }

    /// Attache le signal de matérialisation (table créée, lignes insérées).
    pub fn with_materialized(mut self, materialized: Materialized) -> Self {
        self.materialized = Some(materialized);
        self
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Le chemin pris par la machine à états au démarrage.
    pub fn boot_path(&self) -> BootPath {
        self.boot_path
    }

    /// Le fichier cache derrière la connexion (`None` en mémoire ou en réseau).
    pub fn cache_file(&self) -> Option<&Path> {
        self.cache_file.as_deref()
    }

    /// Ce que la matérialisation a produit ; `None` si un cache frais a été
    /// ouvert tel quel.
    pub fn materialized(&self) -> Option<&Materialized> {
        self.materialized.as_ref()
    }

    fn lock(&self) -> std::result::Result<MutexGuard<'_, Connection>, BackendError> {
        self.connection
            .lock()
            .map_err(|_| BackendError::Poisoned(self.identity.clone()))
    }

    /// Exécute `f` sur la connexion SQLite du modèle.
    pub fn with_sqlite<R>(
        &self,
        f: impl FnOnce(&rusqlite::Connection) -> rusqlite::Result<R>,
    ) -> Result<R> {
        let guard = self.lock()?;
        match &*guard {
            Connection::Sqlite(conn) => Ok(f(conn)?),
            #[cfg(feature = "postgres")]
            Connection::Postgres(_) => Err(BackendError::WrongDriver("sqlite").into()),
        }
    }

    /// Exécute `f` sur le client PostgreSQL du modèle.
    #[cfg(feature = "postgres")]
    pub fn with_postgres<R>(
        &self,
        f: impl FnOnce(&mut ::postgres::Client) -> std::result::Result<R, ::postgres::Error>,
    ) -> Result<R> {
        let mut guard = self.lock()?;
        match &mut *guard {
            Connection::Postgres(client) => Ok(f(client)?),
            Connection::Sqlite(_) => Err(BackendError::WrongDriver("postgres").into()),
        }
    }
}

type Slot = Arc<OnceCell<Arc<ConnectionHandle>>>;

/// Registre des connexions, une par identité de modèle.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    cells: Mutex<HashMap<String, Slot>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        ConnectionRegistry::default()
    }

    fn cells(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        // Le verrou ne protège que la table des cellules, jamais un démarrage
        self.cells.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn cell(&self, identity: &str) -> Slot {
        let mut cells = self.cells();
        Arc::clone(cells.entry(identity.to_string()).or_default())
    }

    /// La connexion déjà enregistrée pour `identity`, s'il y en a une.
    pub fn get(&self, identity: &str) -> Option<Arc<ConnectionHandle>> {
        self.cells().get(identity).and_then(|cell| cell.get().cloned())
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.get(identity).is_some()
    }

    pub fn len(&self) -> usize {
        self.cells().values().filter(|cell| cell.get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Renvoie la connexion de `identity`, en la créant avec `init` si besoin.
    ///
    /// `init` ne tourne qu'une fois par identité ; en cas d'erreur rien n'est
    /// enregistré et l'erreur remonte. Deux appels concurrents sur la même
    /// identité : le second attend le premier. `init` peut démarrer une AUTRE
    /// identité, pas la sienne.
    pub fn get_or_try_init<F>(&self, identity: &str, init: F) -> Result<Arc<ConnectionHandle>>
    where
        F: FnOnce() -> Result<ConnectionHandle>,
    {
        let cell = self.cell(identity);
        cell.get_or_try_init(|| init().map(Arc::new)).cloned()
    }
}
