// =============================================================================
// PLANNER — De quelques lignes d'exemple à une table complète
// =============================================================================
//
// Le planificateur lit le PREMIER record et en déduit la table :
//
//   0. Nom de colonne de chaque champ : le champ lui-même, ou (driver réseau
//      uniquement) son snake_case s'il contient "Id".
//   1. Clé auto-incrémentée demandée mais aucune colonne ne porte son nom ?
//      → on ajoute une colonne `id` en tête.
//   2. Pour chaque champ, dans l'ordre :
//        type = override explicite, sinon inféré depuis la valeur
//        colonne == clé primaire ET type entier → clé auto-incrémentée
//        sinon nom renommé → clé étrangère entière
//        sinon → colonne nullable ordinaire
//   3. Horodatages demandés et ni created_at ni updated_at présents ?
//      → on ajoute created_at puis updated_at.
//
// Un nom qui revient (doublon, collision après renommage) : le dernier gagne.
//
// =============================================================================

use indexmap::IndexMap;
use tracing::debug;

use super::naming;
use super::record::Record;
use super::schema::{ColumnDefinition, TableDefinition, TableOptions, CREATED_AT, UPDATED_AT};
use super::typeside::{infer, TypeTag};
use crate::error::{Result, SushiError};

/// Sous-chaîne qui désigne une clé étrangère (sensible à la casse).
pub const FOREIGN_KEY_MARKER: &str = "Id";

/// Planificateur de schéma.
///
/// L'heuristique de clé étrangère n'est active que pour le driver réseau ;
/// le driver fichier ne l'applique pas.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaPlanner {
    foreign_key_naming: bool,
}

impl SchemaPlanner {
    /// Planificateur du driver fichier (pas d'heuristique de clé étrangère).
    pub fn new() -> Self {
        SchemaPlanner::default()
    }

    pub fn with_foreign_key_naming(self, foreign_key_naming: bool) -> Self {
        SchemaPlanner { foreign_key_naming }
    }

    fn is_foreign_key(&self, field: &str) -> bool {
        self.foreign_key_naming && field.contains(FOREIGN_KEY_MARKER)
    }

    /// Nom de la colonne qui recevra `field`.
    fn column_name(&self, field: &str) -> String {
        if self.is_foreign_key(field) {
            naming::snake(field)
        } else {
            field.to_string()
        }
    }

    /// Planifie la table à partir du premier record de `records`.
    pub fn plan(&self, records: &[Record], options: &TableOptions) -> Result<TableDefinition> {
        let first = records
            .first()
            .filter(|row| !row.is_empty())
            .ok_or_else(|| SushiError::SchemaInference {
                table: options.table.clone(),
            })?;

        let pk = options.primary_key.as_str();
        let mut columns: IndexMap<String, ColumnDefinition> = IndexMap::new();

        if options.auto_increment && !first.keys().any(|field| self.column_name(field) == pk) {
            columns.insert(pk.to_string(), ColumnDefinition::increments(pk, None));
        }

        for (field, value) in first {
            let tag = options
                .overrides
                .get(field)
                .copied()
                .unwrap_or_else(|| infer(value));
            let name = self.column_name(field);

            let column = if name == pk && tag == TypeTag::Integer {
                ColumnDefinition::increments(&name, Some(field.as_str()))
            } else if self.is_foreign_key(field) {
                ColumnDefinition::nullable(&name, TypeTag::ForeignKeyInteger, Some(field.as_str()))
            } else {
                ColumnDefinition::nullable(field, tag, Some(field.as_str()))
            };
            columns.insert(name, column);
        }

        let has_timestamp = first.contains_key(CREATED_AT) || first.contains_key(UPDATED_AT);
        if options.timestamps && !has_timestamp {
            for name in [CREATED_AT, UPDATED_AT] {
                columns.insert(
                    name.to_string(),
                    ColumnDefinition::nullable(name, TypeTag::DateTime, None),
                );
            }
        }

        let definition = TableDefinition {
            table: options.table.clone(),
            columns: columns.into_values().collect(),
            primary_key: options.primary_key.clone(),
            timestamps: options.timestamps,
        };
        debug!(table = %definition.table, columns = definition.columns.len(), "schéma planifié");
        Ok(definition)
    }
}
