// =============================================================================
// SCHEMA — La disposition planifiée d'une table
// =============================================================================
//
// Un TableDefinition décrit EXACTEMENT la table qui sera créée :
//   - son nom
//   - ses colonnes, dans l'ordre d'émission
//   - le nom de la clé primaire
//   - si les colonnes d'horodatage ont été demandées
//
// EXEMPLE : rows = [{id: 1, name: "a"}], clé primaire "id"
//
//   table states {
//       id   : integer  [PK auto-increment]
//       name : string   nullable
//   }
//
// Invariants :
//   - les noms de colonnes sont uniques
//   - au plus une clé primaire auto-incrémentée
//
// =============================================================================

use std::collections::HashMap;
use std::fmt;

use super::typeside::TypeTag;

/// Nom de la colonne de création ajoutée par les horodatages.
pub const CREATED_AT: &str = "created_at";
/// Nom de la colonne de mise à jour ajoutée par les horodatages.
pub const UPDATED_AT: &str = "updated_at";

/// Types imposés explicitement par le modèle : nom de colonne → type.
/// Gagnent toujours sur l'inférence.
pub type SchemaOverride = HashMap<String, TypeTag>;

/// Une colonne de la table planifiée.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    /// Nom de la colonne dans la table
    pub name: String,
    pub tag: TypeTag,
    pub nullable: bool,
    pub primary_key: bool,
    pub auto_increment: bool,
    /// Champ du Record d'où vient la valeur. `None` pour les colonnes
    /// synthétisées (clé auto-incrémentée absente des données, horodatages).
    pub source: Option<String>,
}

impl ColumnDefinition {
    /// Clé primaire entière auto-incrémentée.
    pub fn increments(name: &str, source: Option<&str>) -> Self {
        ColumnDefinition {
            name: name.to_string(),
            tag: TypeTag::Integer,
            nullable: false,
            primary_key: true,
            auto_increment: true,
            source: source.map(str::to_string),
        }
    }

    /// Colonne ordinaire, toujours nullable.
    pub fn nullable(name: &str, tag: TypeTag, source: Option<&str>) -> Self {
        ColumnDefinition {
            name: name.to_string(),
            tag,
            nullable: true,
            primary_key: false,
            auto_increment: false,
            source: source.map(str::to_string),
        }
    }
}

impl fmt::Display for ColumnDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {}", self.name, self.tag)?;
        if self.auto_increment {
            write!(f, " [PK auto-increment]")?;
        } else if self.primary_key {
            write!(f, " [PK]")?;
        }
        if self.nullable {
            write!(f, " nullable")?;
        }
        match &self.source {
            Some(source) if source != &self.name => write!(f, " (← {})", source),
            _ => Ok(()),
        }
    }
}

/// La table complète à matérialiser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    pub table: String,
    pub columns: Vec<ColumnDefinition>,
    pub primary_key: String,
    pub timestamps: bool,
}

impl TableDefinition {
    /// Cherche une colonne par son nom
    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Les noms de colonnes, dans l'ordre d'émission
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Colonnes alimentées par les données source (celles des INSERT)
    pub fn sourced_columns(&self) -> impl Iterator<Item = (&ColumnDefinition, &str)> {
        self.columns
            .iter()
            .filter_map(|c| c.source.as_deref().map(|s| (c, s)))
    }

    /// La clé primaire auto-incrémentée, s'il y en a une
    pub fn auto_increment_key(&self) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.auto_increment)
    }
}

impl fmt::Display for TableDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "table {} {{", self.table)?;
        for column in &self.columns {
            writeln!(f, "    {}", column)?;
        }
        write!(f, "}}")
    }
}

/// Les réglages structurels d'un modèle, tels que le planificateur les consomme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOptions {
    pub table: String,
    pub primary_key: String,
    /// Le modèle veut une clé primaire auto-incrémentée
    pub auto_increment: bool,
    /// Le modèle déclare explicitement utiliser created_at / updated_at
    pub timestamps: bool,
    pub overrides: SchemaOverride,
}

impl TableOptions {
    pub fn new(table: &str) -> Self {
        TableOptions {
            table: table.to_string(),
            primary_key: "id".to_string(),
            auto_increment: true,
            timestamps: false,
            overrides: SchemaOverride::new(),
        }
    }

    pub fn primary_key(self, primary_key: &str) -> Self {
        TableOptions {
            primary_key: primary_key.to_string(),
            ..self
        }
    }

    pub fn auto_increment(self, auto_increment: bool) -> Self {
        TableOptions {
            auto_increment,
            ..self
        }
    }

    pub fn timestamps(self, timestamps: bool) -> Self {
        TableOptions { timestamps, ..self }
    }

    pub fn override_type(mut self, column: &str, tag: TypeTag) -> Self {
        self.overrides.insert(column.to_string(), tag);
        self
    }
}

// =============================================================================
// TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn states_table() -> TableDefinition {
        TableDefinition {
            table: "states".into(),
            columns: vec![
                ColumnDefinition::increments("id", Some("id")),
                ColumnDefinition::nullable("name", TypeTag::String, Some("name")),
                ColumnDefinition::nullable(CREATED_AT, TypeTag::DateTime, None),
            ],
            primary_key: "id".into(),
            timestamps: true,
        }
    }

    #[test]
    fn test_lookup() {
        let table = states_table();
        assert_eq!(table.column_names(), vec!["id", "name", "created_at"]);
        assert_eq!(table.column("name").map(|c| c.tag), Some(TypeTag::String));
        assert_eq!(table.auto_increment_key().map(|c| c.name.as_str()), Some("id"));
    }

    #[test]
    fn test_sourced_columns_skip_synthesized() {
        let table = states_table();
        let sourced: Vec<_> = table.sourced_columns().map(|(_, s)| s).collect();
        assert_eq!(sourced, vec!["id", "name"]);
    }

    #[test]
    fn test_display() {
        let display = states_table().to_string();
        assert!(display.contains("table states"));
        assert!(display.contains("id : integer [PK auto-increment]"));
        assert!(display.contains("name : string nullable"));
    }

    #[test]
    fn test_options_builder() {
        let opts = TableOptions::new("states")
            .primary_key("code")
            .auto_increment(false)
            .timestamps(true)
            .override_type("abbr", TypeTag::LongText);
        assert_eq!(opts.primary_key, "code");
        assert!(!opts.auto_increment);
        assert!(opts.timestamps);
        assert_eq!(opts.overrides.get("abbr"), Some(&TypeTag::LongText));
    }
}
