// =============================================================================
// CONFIG — Réglages globaux du processus
// =============================================================================
//
//   cache_prefix  → préfixe des fichiers cache          (défaut : "sushi")
//   cache_path    → répertoire des fichiers cache       (défaut : temp système)
//   driver        → sqlite (fichier) ou pgsql (réseau)  (défaut : sqlite)
//   database_url  → chaîne de connexion du driver réseau
//
// Variables d'environnement lues par `from_env` :
//   SUSHI_CACHE_PREFIX, SUSHI_CACHE_PATH, SUSHI_DRIVER, DB_DATABASE
//
// =============================================================================

use std::env;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::backend::Driver;

pub const DEFAULT_CACHE_PREFIX: &str = "sushi";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SushiConfig {
    pub(crate) cache_prefix: String,
    pub(crate) cache_path: PathBuf,
    pub(crate) driver: Driver,
    pub(crate) database_url: Option<String>,
}

impl Default for SushiConfig {
    fn default() -> Self {
        SushiConfig::from(env::temp_dir())
    }
}

impl<P> From<P> for SushiConfig
where
    P: Into<PathBuf>,
{
    fn from(cache_path: P) -> Self {
        SushiConfig {
            cache_prefix: DEFAULT_CACHE_PREFIX.to_string(),
            cache_path: cache_path.into(),
            driver: Driver::Sqlite,
            database_url: None,
        }
    }
}

impl SushiConfig {
    pub fn cache_prefix(self, cache_prefix: impl Into<String>) -> Self {
        SushiConfig {
            cache_prefix: cache_prefix.into(),
            ..self
        }
    }

    pub fn cache_path(self, cache_path: impl Into<PathBuf>) -> Self {
        SushiConfig {
            cache_path: cache_path.into(),
            ..self
        }
    }

    pub fn driver(self, driver: Driver) -> Self {
        SushiConfig { driver, ..self }
    }

    pub fn database_url(self, database_url: impl Into<String>) -> Self {
        SushiConfig {
            database_url: Some(database_url.into()),
            ..self
        }
    }

    /// Lit la configuration depuis l'environnement, avec les défauts ci-dessus.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = SushiConfig::default();
        if let Some(prefix) = lookup("SUSHI_CACHE_PREFIX").filter(|p| !p.is_empty()) {
            config = config.cache_prefix(prefix);
        }
        if let Some(path) = lookup("SUSHI_CACHE_PATH").filter(|p| !p.is_empty()) {
            config = config.cache_path(path);
        }
        if let Some(driver) = lookup("SUSHI_DRIVER") {
            match driver.parse() {
                Ok(driver) => config = config.driver(driver),
                Err(err) => warn!(%err, "SUSHI_DRIVER ignoré, driver sqlite conservé"),
            }
        }
        if let Some(url) = lookup("DB_DATABASE").filter(|u| !u.is_empty()) {
            config = config.database_url(url);
        }
        config
    }
}

impl SushiConfig {
    pub fn prefix(&self) -> &str {
        &self.cache_prefix
    }

    pub fn directory(&self) -> &Path {
        &self.cache_path
    }

    pub fn selected_driver(&self) -> Driver {
        self.driver
    }

    pub fn database(&self) -> Option<&str> {
        self.database_url.as_deref()
    }
}
