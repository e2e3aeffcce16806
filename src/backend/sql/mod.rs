// =============================================================================
// BACKEND SQL — Génération de SQL à partir d'un TableDefinition
// =============================================================================
//
// Ce module traduit :
//   TableDefinition → CREATE TABLE (et DROP TABLE côté réseau)
//   Records         → INSERT INTO, une commande par ligne, dans l'ordre
//
// Le trait SqlDialect isole les différences entre SQLite et PostgreSQL :
// noms de types, clé auto-incrémentée. Chaque TypeTag est traduit par un
// `match` exhaustif : ajouter un type oblige à traiter tous les dialectes.
//
// =============================================================================

use crate::backend::Statement;
use crate::core::record::Record;
use crate::core::schema::{ColumnDefinition, TableDefinition};
use crate::core::typeside::{TypeTag, Value};

/// Format des dates-heures dans les littéraux SQL.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Dialecte SQL — les différences entre les moteurs.
pub trait SqlDialect {
    /// Traduit un TypeTag en type SQL natif
    fn type_to_sql(&self, tag: TypeTag) -> String;

    /// Type complet d'une clé primaire auto-incrémentée
    fn auto_id_type(&self) -> String;

    /// Nom du dialecte
    fn dialect_name(&self) -> &'static str;

    /// Quote un identifiant (table, colonne)
    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

// ─── SQLite ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqlDialect for SqliteDialect {
    fn type_to_sql(&self, tag: TypeTag) -> String {
        match tag {
            TypeTag::Integer => "integer".to_string(),
            TypeTag::Float => "float".to_string(),
            TypeTag::String => "varchar".to_string(),
            TypeTag::LongText => "text".to_string(),
            TypeTag::DateTime => "datetime".to_string(),
            TypeTag::ForeignKeyInteger => "integer".to_string(),
        }
    }

    fn auto_id_type(&self) -> String {
        "integer primary key autoincrement not null".to_string()
    }

    fn dialect_name(&self) -> &'static str {
        "SQLite"
    }
}

// ─── PostgreSQL ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl SqlDialect for PostgresDialect {
    fn type_to_sql(&self, tag: TypeTag) -> String {
        match tag {
            TypeTag::Integer => "integer".to_string(),
            TypeTag::Float => "double precision".to_string(),
            TypeTag::String => "varchar(255)".to_string(),
            TypeTag::LongText => "text".to_string(),
            TypeTag::DateTime => "timestamp(0) without time zone".to_string(),
            TypeTag::ForeignKeyInteger => "bigint".to_string(),
        }
    }

    fn auto_id_type(&self) -> String {
        "serial primary key not null".to_string()
    }

    fn dialect_name(&self) -> &'static str {
        "PostgreSQL"
    }
}

// ─── Backend SQL générique ───────────────────────────────────────────────────

/// Générateur de commandes, paramétré par un dialecte.
pub struct SqlBackend<D: SqlDialect> {
    pub dialect: D,
}

impl<D: SqlDialect> SqlBackend<D> {
    pub fn new(dialect: D) -> Self {
        SqlBackend { dialect }
    }

    fn column_sql(&self, column: &ColumnDefinition) -> String {
        let name = self.dialect.quote_identifier(&column.name);
        if column.auto_increment {
            return format!("  {} {}", name, self.dialect.auto_id_type());
        }
        let mut line = format!("  {} {}", name, self.dialect.type_to_sql(column.tag));
        if column.primary_key {
            line.push_str(" primary key");
        }
        line.push_str(if column.nullable { " null" } else { " not null" });
        line
    }

    /// Génère le CREATE TABLE, colonnes dans l'ordre du plan.
    pub fn create_table_sql(&self, definition: &TableDefinition) -> Statement {
        let columns: Vec<String> = definition
            .columns
            .iter()
            .map(|c| self.column_sql(c))
            .collect();
        Statement(format!(
            "CREATE TABLE {} (\n{}\n);",
            self.dialect.quote_identifier(&definition.table),
            columns.join(",\n")
        ))
    }

    pub fn drop_table_sql(&self, table: &str) -> Statement {
        Statement(format!(
            "DROP TABLE IF EXISTS {};",
            self.dialect.quote_identifier(table)
        ))
    }

    /// Génère les INSERT INTO, un par ligne, dans l'ordre d'origine.
    ///
    /// Seules les colonnes alimentées par les données sont listées ; un
    /// champ absent d'une ligne vaut NULL, un champ inconnu est ignoré.
    pub fn insert_rows_sql(
        &self,
        definition: &TableDefinition,
        records: &[Record],
    ) -> Vec<Statement> {
        let sourced: Vec<(&ColumnDefinition, &str)> = definition.sourced_columns().collect();
        if sourced.is_empty() {
            return Vec::new();
        }

        let col_names: Vec<String> = sourced
            .iter()
            .map(|(column, _)| self.dialect.quote_identifier(&column.name))
            .collect();
        let table = self.dialect.quote_identifier(&definition.table);

        records
            .iter()
            .map(|row| {
                let col_values: Vec<String> = sourced
                    .iter()
                    .map(|(_, source)| row.get(*source).map_or_else(|| "NULL".into(), value_to_sql))
                    .collect();
                Statement(format!(
                    "INSERT INTO {} ({}) VALUES ({});",
                    table,
                    col_names.join(", "),
                    col_values.join(", "),
                ))
            })
            .collect()
    }
}

/// Convertit une Value en littéral SQL
pub fn value_to_sql(value: &Value) -> String {
    match value {
        Value::Integer(i) => format!("{}", i),
        // Debug garde toujours la partie décimale (1.0 et non 1)
        Value::Float(f) if f.is_finite() => format!("{:?}", f),
        Value::Float(_) => "NULL".into(),
        Value::String(s) => quote_literal(s),
        Value::DateTime(dt) => quote_literal(&dt.format(DATETIME_FORMAT).to_string()),
        Value::Boolean(b) => if *b { "'1'".into() } else { "'0'".into() },
        Value::Null => "NULL".into(),
    }
}

fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}
