// =============================================================================
// MODEL — Ce que l'application fournit pour chaque table
// =============================================================================
//
// Un modèle Sushi déclare :
//   - ses lignes (`rows`)                     → les données à matérialiser
//   - ses types imposés (`schema`)            → overrides d'inférence
//   - sa table, sa clé primaire, auto-incrément
//   - s'il utilise created_at / updated_at    → déclaration EXPLICITE
//   - le fichier qui le définit (`source_path`) → empreinte de fraîcheur
//
// EXEMPLE :
//
//   struct States;
//
//   impl SushiModel for States {
//       fn rows(&self) -> Option<Vec<Record>> {
//           Some(vec![
//               record! { "id" => 1, "abbr" => "NY", "name" => "New York" },
//               record! { "id" => 2, "abbr" => "CA", "name" => "California" },
//           ])
//       }
//       fn source_path(&self) -> Option<PathBuf> {
//           Some(PathBuf::from(file!()))
//       }
//   }
//
// =============================================================================

use std::borrow::Cow;
use std::path::PathBuf;

use crate::core::naming;
use crate::core::record::Record;
use crate::core::schema::{SchemaOverride, TableOptions};

pub trait SushiModel {
    /// Les lignes du modèle. `None` : le modèle n'a pas de source de données.
    fn rows(&self) -> Option<Vec<Record>>;

    /// Le fichier qui définit le modèle ; sa date de modification sert
    /// d'empreinte pour invalider le cache.
    fn source_path(&self) -> Option<PathBuf>;

    /// Types imposés, prioritaires sur l'inférence.
    fn schema(&self) -> SchemaOverride {
        SchemaOverride::new()
    }

    /// Identité stable du modèle : clé du registre et nom du fichier cache.
    fn identity(&self) -> Cow<'static, str> {
        Cow::Borrowed(std::any::type_name::<Self>())
    }

    /// Nom de table ; par défaut le nom du type en snake_case.
    fn table(&self) -> String {
        naming::snake(naming::last_segment(&self.identity()))
    }

    fn primary_key(&self) -> String {
        "id".to_string()
    }

    /// La clé primaire est-elle auto-incrémentée ?
    fn incrementing(&self) -> bool {
        true
    }

    /// Le modèle utilise-t-il les horodatages created_at / updated_at ?
    /// Désactivé tant que le modèle ne le déclare pas.
    fn timestamps(&self) -> bool {
        false
    }

    /// Réglages structurels consommés par le planificateur.
    fn table_options(&self) -> TableOptions {
        TableOptions {
            table: self.table(),
            primary_key: self.primary_key(),
            auto_increment: self.incrementing(),
            timestamps: self.timestamps(),
            overrides: self.schema(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::typeside::TypeTag;
    use crate::record;

    struct StateModel;

    impl SushiModel for StateModel {
        fn rows(&self) -> Option<Vec<Record>> {
            Some(vec![record! { "abbr" => "NY" }])
        }

        fn source_path(&self) -> Option<PathBuf> {
            None
        }
    }

    struct Custom;

    impl SushiModel for Custom {
        fn rows(&self) -> Option<Vec<Record>> {
            None
        }

        fn source_path(&self) -> Option<PathBuf> {
            None
        }

        fn identity(&self) -> Cow<'static, str> {
            Cow::Borrowed("App\\Models\\Custom")
        }

        fn table(&self) -> String {
            "customs".into()
        }

        fn schema(&self) -> SchemaOverride {
            SchemaOverride::from([("bio".to_string(), TypeTag::LongText)])
        }

        fn timestamps(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_defaults() {
        let model = StateModel;
        assert!(model.identity().ends_with("StateModel"));
        assert_eq!(model.table(), "state_model");

        let opts = model.table_options();
        assert_eq!(opts.primary_key, "id");
        assert!(opts.auto_increment);
        assert!(!opts.timestamps);
        assert!(opts.overrides.is_empty());
    }

    #[test]
    fn test_overridden_options() {
        let opts = Custom.table_options();
        assert_eq!(opts.table, "customs");
        assert!(opts.timestamps);
        assert_eq!(opts.overrides.get("bio"), Some(&TypeTag::LongText));
    }
}
