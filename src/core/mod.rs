// =============================================================================
// CORE — Le cœur indépendant des bases de données
// =============================================================================
//
// Ce module regroupe la logique qui ne parle à AUCUNE base :
// pas de SQL, pas de connexion — uniquement des valeurs, des types,
// des plans de tables et la décision de cache.
//
// Architecture :
//   typeside → valeurs scalaires et inférence de type
//   record   → une ligne de données source (ordonnée)
//   schema   → colonnes et tables planifiées
//   planner  → premier record + overrides → TableDefinition
//   cache    → fichier cache, empreintes, machine à états
//   naming   → snake_case / kebab-case
//
// =============================================================================

pub mod typeside;
pub mod record;
pub mod schema;
pub mod planner;
pub mod cache;
pub mod naming;
