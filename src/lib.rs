// =============================================================================
// SUSHI — Des lignes en mémoire exposées comme une vraie table SQL
// =============================================================================
//
// Sushi prend un petit jeu de données déclaré dans le code (une liste de
// lignes), en déduit un schéma de table, le matérialise dans une base
// SQLite et garde cette base en cache sur disque. Le cache est invalidé
// automatiquement quand le fichier qui définit le modèle change.
//
// Architecture :
//   core/      → inférence de types, plan de table, décision de cache (sans DB)
//   backend/   → génération SQL et drivers (SQLite, PostgreSQL)
//   model      → le contrat que l'application implémente
//   registry   → identité de modèle → connexion vivante
//   bootstrap  → la machine à états qui relie le tout
//
// Concepts :
//   Record          = une ligne source, ordonnée
//   TableDefinition = la table planifiée (colonnes, clé primaire)
//   Empreinte       = date de modification (source vs cache)
//
// =============================================================================

pub mod core;
pub mod backend;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod model;
pub mod registry;

pub use bootstrap::Sushi;
pub use config::SushiConfig;
pub use crate::core::cache::BootPath;
pub use crate::core::record::Record;
pub use crate::core::schema::{SchemaOverride, TableDefinition};
pub use crate::core::typeside::{TypeTag, Value};
pub use error::{Result, SushiError};
pub use model::SushiModel;
pub use registry::{ConnectionHandle, ConnectionRegistry};
