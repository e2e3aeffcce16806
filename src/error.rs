// =============================================================================
// ERROR — Les erreurs du moteur
// =============================================================================
//
// Politique de propagation :
//   - CacheWrite est absorbée par la machine à états (repli en mémoire)
//   - SchemaInference, MissingDataSource et Backend remontent à l'appelant
//   - aucune nouvelle tentative automatique
//
// =============================================================================

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SushiError>;

#[derive(Debug, Error)]
pub enum SushiError {
    /// Le jeu de données est vide : rien à partir de quoi inférer un schéma.
    #[error("impossible d'inférer le schéma de la table `{table}` : aucune ligne ni aucun champ")]
    SchemaInference { table: String },

    /// Le modèle n'expose aucune donnée et aucun cache n'est utilisable.
    #[error("le modèle `{model}` n'expose aucune source de données")]
    MissingDataSource { model: String },

    /// Le fichier cache n'a pas pu être créé ou tronqué.
    #[error("écriture du cache impossible ({path}) : {source}")]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Échec côté stockage (création de table, insertion, connexion).
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Le driver réseau est sélectionné sans chaîne de connexion.
    #[error("driver réseau sélectionné mais aucune base configurée (DB_DATABASE)")]
    MissingDatabaseUrl,
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("sqlite : {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[cfg(feature = "postgres")]
    #[error("postgres : {0}")]
    Postgres(#[from] postgres::Error),

    /// Une connexion partagée a été empoisonnée par une panique.
    #[error("connexion `{0}` inutilisable (verrou empoisonné)")]
    Poisoned(String),

    /// Le driver demandé n'est pas compilé dans cette build.
    #[error("driver `{0}` indisponible (feature cargo désactivée)")]
    DriverUnavailable(&'static str),

    /// La connexion enregistrée n'est pas du type demandé.
    #[error("la connexion enregistrée n'est pas de type {0}")]
    WrongDriver(&'static str),
}

impl From<rusqlite::Error> for SushiError {
    fn from(err: rusqlite::Error) -> Self {
        SushiError::Backend(BackendError::Sqlite(err))
    }
}

#[cfg(feature = "postgres")]
impl From<postgres::Error> for SushiError {
    fn from(err: postgres::Error) -> Self {
        SushiError::Backend(BackendError::Postgres(err))
    }
}
