// =============================================================================
// CACHE — Le fichier SQLite en cache et la machine à états
// =============================================================================
//
// Chaque modèle a (au plus) un fichier cache :
//
//   {cache_path}/{prefix}-{identité-en-kebab}.sqlite
//
// Au démarrage, on compare deux EMPREINTES (dates de modification) :
//   - source : le fichier qui définit le modèle
//   - cache  : le fichier SQLite
//
//   ┌─────────────────────────┐  non  ┌───────────────────┐
//   │ le modèle a des lignes ?├──────▶│ NoCacheCapability │ (mémoire)
//   └───────────┬─────────────┘       └───────────────────┘
//               │ oui                          ▲
//   ┌───────────▼─────────────┐  oui  ┌───────┴───────────┐
//   │ cache présent ET        ├──────▶│ FreshCache        │ (on rouvre)
//   │ source <= cache ?       │       └───────────────────┘
//   └───────────┬─────────────┘               │
//               │ non                         │ non
//   ┌───────────▼─────────────┐  oui  ┌───────┴───────────┐
//   │ répertoire inscriptible?├──────▶│ StaleOrMissing    │ (on reconstruit)
//   └─────────────────────────┘       └───────────────────┘
//
// La décision (`decide`) est une fonction PURE : elle ne touche pas au
// disque. Les signaux sont collectés à part par `CacheEntry`.
//
// Plusieurs processus partageant le même répertoire peuvent reconstruire
// le même fichier en même temps : le dernier écrivain gagne. Pas de verrou.
//
// =============================================================================

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::naming;
use crate::error::{Result, SushiError};

/// Extension des fichiers cache.
pub const CACHE_EXTENSION: &str = "sqlite";

/// Le chemin d'exécution choisi au démarrage d'un modèle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BootPath {
    /// Le cache est à jour : on l'ouvre tel quel, sans rien recalculer
    FreshCache,
    /// Cache absent ou périmé : on le reconstruit sur disque
    StaleOrMissing,
    /// Pas de cache possible : base éphémère en mémoire
    NoCacheCapability,
    /// Driver réseau : on reconstruit toujours contre le serveur
    LiveRebuild,
}

impl fmt::Display for BootPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootPath::FreshCache => write!(f, "cache-file-found-and-up-to-date"),
            BootPath::StaleOrMissing => write!(f, "cache-file-not-found-or-stale"),
            BootPath::NoCacheCapability => write!(f, "no-caching-capabilities"),
            BootPath::LiveRebuild => write!(f, "live-rebuild"),
        }
    }
}

/// Les observations dont dépend la décision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheSignals {
    /// Le modèle expose une source de lignes
    pub has_rows: bool,
    pub cache_exists: bool,
    pub source_fingerprint: Option<SystemTime>,
    pub cache_fingerprint: Option<SystemTime>,
    pub directory_writable: bool,
}

impl CacheSignals {
    /// `source <= cache`. Une empreinte illisible n'est jamais fraîche.
    pub fn is_fresh(&self) -> bool {
        match (self.source_fingerprint, self.cache_fingerprint) {
            (Some(source), Some(cache)) => source <= cache,
            _ => false,
        }
    }
}

/// Choisit le chemin d'exécution du driver fichier.
pub fn decide(signals: &CacheSignals) -> BootPath {
    if !signals.has_rows {
        BootPath::NoCacheCapability
    } else if signals.cache_exists && signals.is_fresh() {
        BootPath::FreshCache
    } else if signals.directory_writable {
        BootPath::StaleOrMissing
    } else {
        BootPath::NoCacheCapability
    }
}

/// Le fichier cache d'un modèle et ses empreintes, lus au démarrage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub path: PathBuf,
    /// Répertoire résolu (canonique). `None` s'il n'existe pas.
    pub directory: Option<PathBuf>,
    pub source_fingerprint: Option<SystemTime>,
    pub cache_fingerprint: Option<SystemTime>,
}

impl CacheEntry {
    /// `{prefix}-{identité}.sqlite`
    pub fn file_name(prefix: &str, identity: &str) -> String {
        format!("{}-{}.{}", prefix, naming::file_stem(identity), CACHE_EXTENSION)
    }

    /// Localise le cache d'un modèle et lit les deux empreintes.
    pub fn locate(directory: &Path, prefix: &str, identity: &str, source: Option<&Path>) -> Self {
        let resolved = fs::canonicalize(directory).ok().filter(|d| d.is_dir());
        let path = resolved
            .as_deref()
            .unwrap_or(directory)
            .join(Self::file_name(prefix, identity));

        CacheEntry {
            cache_fingerprint: modified(&path),
            source_fingerprint: source.and_then(modified),
            directory: resolved,
            path,
        }
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn directory_writable(&self) -> bool {
        self.directory.as_deref().is_some_and(is_writable_dir)
    }

    pub fn signals(&self, has_rows: bool) -> CacheSignals {
        CacheSignals {
            has_rows,
            cache_exists: self.exists(),
            source_fingerprint: self.source_fingerprint,
            cache_fingerprint: self.cache_fingerprint,
            directory_writable: self.directory_writable(),
        }
    }

    /// Crée le fichier cache, ou le vide s'il existe déjà.
    pub fn truncate(&self) -> Result<()> {
        File::create(&self.path)
            .map(drop)
            .map_err(|source| SushiError::CacheWrite {
                path: self.path.clone(),
                source,
            })
    }

    /// Recale la date de modification du cache sur celle de la source, pour
    /// que le prochain démarrage le voie frais. Renvoie `false` sans empreinte source.
    pub fn stamp(&self) -> io::Result<bool> {
        let Some(source) = self.source_fingerprint else {
            return Ok(false);
        };
        let file = OpenOptions::new().write(true).open(&self.path)?;
        file.set_modified(source)?;
        Ok(true)
    }

    /// Supprime un cache à moitié écrit. Les erreurs sont ignorées.
    pub fn discard(&self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Date de modification d'un fichier, si lisible.
pub fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

fn is_writable_dir(path: &Path) -> bool {
    fs::metadata(path)
        .map(|meta| meta.is_dir() && !meta.permissions().readonly())
        .unwrap_or(false)
}
