// =============================================================================
// RECORD — Une ligne de données source
// =============================================================================
//
// Un Record est une table d'association ORDONNÉE : nom de colonne → valeur.
// L'ordre des champs du PREMIER record d'un jeu de données décide de
// l'ordre des colonnes dans la table générée.
//
// On s'appuie sur IndexMap :
//   - l'ordre d'insertion est conservé
//   - si un nom revient, la DERNIÈRE valeur gagne (à la position d'origine)
//
// =============================================================================

use indexmap::IndexMap;

use super::typeside::Value;

/// Une ligne : nom de champ → valeur scalaire, dans l'ordre de déclaration.
pub type Record = IndexMap<String, Value>;

/// Construit un Record à partir de paires `"champ" => valeur`.
///
/// ```
/// use sushi::record;
///
/// let row = record! { "id" => 1, "name" => "Alice" };
/// assert_eq!(row.len(), 2);
/// ```
#[macro_export]
macro_rules! record {
    () => { $crate::core::record::Record::new() };
    ($($field:expr => $value:expr),+ $(,)?) => {{
        let mut row = $crate::core::record::Record::new();
        $(
            row.insert(
                ::std::string::String::from($field),
                $crate::core::typeside::Value::from($value),
            );
        )+
        row
    }};
}

/// Nombre total de champs distincts rencontrés dans un jeu de lignes.
/// Sert uniquement au diagnostic (logs).
pub fn distinct_fields(records: &[Record]) -> usize {
    let mut seen: IndexMap<&str, ()> = IndexMap::new();
    for row in records {
        for field in row.keys() {
            seen.insert(field.as_str(), ());
        }
    }
    seen.len()
}

// =============================================================================
// TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_keeps_order() {
        let row = crate::record! { "b" => 1, "a" => 2, "c" => 3 };
        let keys: Vec<_> = row.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_duplicate_field_last_wins() {
        let row = crate::record! { "id" => 1, "name" => "a", "id" => 9 };
        assert_eq!(row.len(), 2);
        assert_eq!(row["id"], Value::Integer(9));
        // La position reste celle de la première occurrence
        assert_eq!(row.get_index(0).map(|(k, _)| k.as_str()), Some("id"));
    }

    #[test]
    fn test_distinct_fields() {
        let rows = vec![
            crate::record! { "id" => 1, "name" => "a" },
            crate::record! { "id" => 2, "extra" => true },
        ];
        assert_eq!(distinct_fields(&rows), 3);
    }
}
