// =============================================================================
// NAMING — Conversions de casse (snake_case, kebab-case)
// =============================================================================
//
// Utilisé pour :
//   - le nom du fichier cache : `sushi-app-models-state.sqlite`
//   - le nom de table par défaut : `StateModel` → `state_model`
//   - le renommage des clés étrangères côté PostgreSQL : `userId` → `user_id`
//
// Règle : un séparateur est inséré avant chaque majuscule qui n'est pas en
// tête, puis tout passe en minuscules. Les espaces disparaissent.
//
// =============================================================================

/// Convertit en snake_case : `windowMaterialId` → `window_material_id`.
pub fn snake(value: &str) -> String {
    delimit(value, '_')
}

/// Convertit en kebab-case : `AppModelsState` → `app-models-state`.
pub fn kebab(value: &str) -> String {
    delimit(value, '-')
}

fn delimit(value: &str, delimiter: char) -> String {
    if value.chars().all(|c| c.is_lowercase() || c.is_ascii_digit() || c == delimiter) {
        return value.to_string();
    }

    // Chaque mot séparé par des espaces commence par une majuscule,
    // puis les espaces sont supprimés.
    let joined: String = value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect();

    let mut out = String::with_capacity(joined.len() + 8);
    for (i, c) in joined.chars().enumerate() {
        if i > 0 && c.is_uppercase() {
            out.push(delimiter);
        }
        out.extend(c.to_lowercase());
    }
    out
}

/// Nom de fichier stable pour une identité de modèle.
///
/// Les séparateurs de chemin (`::`, `\`) sont retirés avant la mise en
/// kebab-case, et seuls les caractères sûrs pour un nom de fichier sont gardés.
pub fn file_stem(identity: &str) -> String {
    let flat = identity.replace("::", "").replace('\\', "");
    kebab(&flat)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

/// Dernier segment d'une identité de type : `app::models::State` → `State`.
pub fn last_segment(identity: &str) -> &str {
    let base = identity.split('<').next().unwrap_or(identity);
    base.rsplit("::").next().unwrap_or(base)
}

// =============================================================================
// TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake() {
        assert_eq!(snake("windowMaterialId"), "window_material_id");
        assert_eq!(snake("StateModel"), "state_model");
        assert_eq!(snake("already_snake"), "already_snake");
        assert_eq!(snake("userID"), "user_i_d");
    }

    #[test]
    fn test_kebab() {
        assert_eq!(kebab("AppModelsState"), "app-models-state");
        assert_eq!(kebab("hello world"), "hello-world");
        assert_eq!(kebab("lower"), "lower");
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("App\\Models\\State"), "app-models-state");
        assert_eq!(file_stem("demo::models::StateModel"), "demomodels-state-model");
        assert_eq!(file_stem("Wrapper<Inner>"), "wrapper-inner");
    }

    #[test]
    fn test_last_segment() {
        assert_eq!(last_segment("app::models::State"), "State");
        assert_eq!(last_segment("State"), "State");
        assert_eq!(last_segment("app::Wrapper<app::Inner>"), "Wrapper");
    }
}
