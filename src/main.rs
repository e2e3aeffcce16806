// =============================================================================
// SUSHI — Point d'entrée : démonstration du moteur
// =============================================================================
//
// Ce main.rs montre un exemple complet :
//   1. Déclarer un modèle (des lignes + le fichier qui le définit)
//   2. Afficher la table planifiée
//   3. Démarrer le modèle (cache SQLite sur disque)
//   4. Requêter la table, puis redemander la connexion (registre)
//
// Logs : RUST_LOG=sushi=debug cargo run
//
// =============================================================================

use std::path::PathBuf;

use chrono::NaiveDate;
use sushi::core::planner::SchemaPlanner;
use sushi::{record, Record, Sushi, SushiConfig, SushiModel};
use tracing_subscriber::EnvFilter;

struct State;

impl SushiModel for State {
    fn rows(&self) -> Option<Vec<Record>> {
        let founded =
            |y, m, d| NaiveDate::from_ymd_opt(y, m, d).and_then(|d| d.and_hms_opt(0, 0, 0));
        Some(vec![
            record! {
                "id" => 1, "abbr" => "NY", "name" => "New York",
                "population" => 19.57, "admitted" => founded(1788, 7, 26),
            },
            record! {
                "id" => 2, "abbr" => "CA", "name" => "California",
                "population" => 38.97, "admitted" => founded(1850, 9, 9),
            },
            record! {
                "id" => 3, "abbr" => "TX", "name" => "Texas",
                "population" => 30.5, "admitted" => founded(1845, 12, 29),
            },
        ])
    }

    fn source_path(&self) -> Option<PathBuf> {
        Some(PathBuf::from(file!()))
    }

    fn table(&self) -> String {
        "states".into()
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sushi=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("═══ ÉTAPE 1 : Table planifiée ═══\n");
    let model = State;
    let rows = model.rows().unwrap_or_default();
    let plan = SchemaPlanner::new().plan(&rows, &model.table_options())?;
    println!("{}\n", plan);

    println!("═══ ÉTAPE 2 : Démarrage ═══\n");
    let sushi = Sushi::new(SushiConfig::from_env());
    let handle = sushi.bootstrap(&model)?;
    println!("chemin : {}", handle.boot_path());
    if let Some(file) = handle.cache_file() {
        println!("cache  : {}", file.display());
    }

    println!("\n═══ ÉTAPE 3 : Requête ═══\n");
    let states: Vec<(i64, String, String)> = handle.with_sqlite(|conn| {
        let mut stmt = conn.prepare("SELECT id, abbr, name FROM states ORDER BY name")?;
        let rows = stmt.query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))?;
        rows.collect()
    })?;
    for (id, abbr, name) in states {
        println!("  [{}] {} — {}", id, abbr, name);
    }

    println!("\n═══ ÉTAPE 4 : Registre ═══\n");
    let again = sushi.bootstrap(&model)?;
    println!(
        "même connexion : {}  ({} modèle(s) enregistré(s))",
        std::sync::Arc::ptr_eq(&handle, &again),
        sushi.registry().len()
    );
    Ok(())
}
