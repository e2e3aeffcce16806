// =============================================================================
// TYPESIDE — Les valeurs scalaires et les types de colonnes
// =============================================================================
//
// Une ligne de données (Record) contient des valeurs scalaires : entier,
// flottant, chaîne, date-heure ou NULL. Avant de créer la table, on doit
// deviner le TYPE de chaque colonne à partir d'une valeur d'exemple.
//
// C'est le rôle de `infer` : une valeur → un TypeTag. L'inférence ne
// peut jamais échouer : ce qu'on ne sait pas typer devient une chaîne.
//
//   42              → Integer
//   3.14            → Float
//   "court"         → String      (≤ 150 caractères)
//   "très long..."  → LongText    (> 150 caractères)
//   2024-01-01 ...  → DateTime
//   NULL, bool ...  → String      (repli)
//
// =============================================================================

use std::fmt;

use chrono::NaiveDateTime;

/// Au-delà de cette longueur, une chaîne devient une colonne LongText.
pub const LONG_TEXT_THRESHOLD: usize = 150;

/// Le type d'une colonne dans la table générée.
///
/// Ensemble fermé : chaque dialecte SQL fait un `match` exhaustif dessus
/// pour émettre son type natif.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// Entier (→ INTEGER)
    Integer,
    /// Nombre à virgule flottante (→ FLOAT / DOUBLE PRECISION)
    Float,
    /// Chaîne courte (→ VARCHAR)
    String,
    /// Chaîne longue (→ TEXT)
    LongText,
    /// Date et heure sans fuseau (→ DATETIME / TIMESTAMP)
    DateTime,
    /// Entier pointant vers une autre table (→ BIGINT)
    ForeignKeyInteger,
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Integer => write!(f, "integer"),
            TypeTag::Float => write!(f, "float"),
            TypeTag::String => write!(f, "string"),
            TypeTag::LongText => write!(f, "longText"),
            TypeTag::DateTime => write!(f, "dateTime"),
            TypeTag::ForeignKeyInteger => write!(f, "foreignId"),
        }
    }
}

/// Une valeur concrète dans une ligne.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    String(std::string::String),
    DateTime(NaiveDateTime),
    Boolean(bool),
    Null,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::DateTime(dt) => write!(f, "{}", dt),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Null => write!(f, "NULL"),
        }
    }
}

impl Value {
    /// Infère le type de colonne correspondant à cette valeur.
    pub fn infer_type(&self) -> TypeTag {
        infer(self)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// Infère un TypeTag depuis une valeur d'exemple.
///
/// Règles, dans l'ordre : entier, autre nombre, chaîne (courte ou longue),
/// date-heure, puis repli sur String pour tout le reste.
pub fn infer(value: &Value) -> TypeTag {
    match value {
        Value::Integer(_) => TypeTag::Integer,
        Value::Float(_) => TypeTag::Float,
        Value::String(s) if s.chars().count() > LONG_TEXT_THRESHOLD => TypeTag::LongText,
        Value::String(_) => TypeTag::String,
        Value::DateTime(_) => TypeTag::DateTime,
        Value::Boolean(_) | Value::Null => TypeTag::String,
    }
}

// ─── Conversions ─────────────────────────────────────────────────────────────

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<std::string::String> for Value {
    fn from(v: std::string::String) -> Self {
        Value::String(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
