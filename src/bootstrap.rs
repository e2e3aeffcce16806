// =============================================================================
// BOOTSTRAP — Démarrage d'un modèle : du cache à la connexion enregistrée
// =============================================================================
//
// `Sushi::bootstrap` est appelé au premier usage d'un modèle. Il :
//   1. regarde si le registre a déjà une connexion → si oui, c'est fini
//   2. sinon, selon le driver :
//        sqlite → machine à états du cache (voir core::cache)
//        pgsql  → reconstruction complète contre le serveur
//   3. enregistre la connexion obtenue dans le registre
//
// Chemins du driver fichier :
//
//   FreshCache        → ouvrir le fichier, RIEN d'autre (ni inférence ni insert)
//   StaleOrMissing    → planifier, vider le fichier, matérialiser,
//                       recaler sa date sur celle de la source
//   NoCacheCapability → base en mémoire, matérialisée à chaque processus
//
// Un échec d'écriture du cache n'est pas fatal : on se replie en mémoire.
//
// =============================================================================

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::backend::{self, sqlite, Driver, Materialized};
use crate::config::SushiConfig;
use crate::core::cache::{self, BootPath, CacheEntry};
use crate::core::planner::SchemaPlanner;
use crate::core::record::{self, Record};
use crate::error::{Result, SushiError};
use crate::model::SushiModel;
use crate::registry::{Connection, ConnectionHandle, ConnectionRegistry};

/// Point d'entrée : configuration + registre des connexions.
#[derive(Debug, Default)]
pub struct Sushi {
    config: SushiConfig,
    registry: ConnectionRegistry,
}

impl Sushi {
    pub fn new(config: SushiConfig) -> Self {
        Sushi {
            config,
            registry: ConnectionRegistry::new(),
        }
    }

    pub fn config(&self) -> &SushiConfig {
        &self.config
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Démarre `model` s'il ne l'est pas déjà et renvoie sa connexion.
    ///
    /// Idempotent : un second appel renvoie la connexion enregistrée sans
    /// relancer la machine à états.
    pub fn bootstrap<M: SushiModel + ?Sized>(&self, model: &M) -> Result<Arc<ConnectionHandle>> {
        let identity = model.identity();
        self.registry.get_or_try_init(&identity, || self.boot(model, &identity))
    }

    /// La connexion enregistrée pour `model`, sans jamais démarrer.
    pub fn resolve_connection<M: SushiModel + ?Sized>(
        &self,
        model: &M,
    ) -> Option<Arc<ConnectionHandle>> {
        self.registry.get(&model.identity())
    }

    fn boot<M: SushiModel + ?Sized>(&self, model: &M, identity: &str) -> Result<ConnectionHandle> {
        match self.config.driver {
            Driver::Sqlite => self.boot_sqlite(model, identity),
            Driver::Postgres => self.boot_postgres(model, identity),
        }
    }

    // ─── Driver fichier ──────────────────────────────────────────────────────

    fn boot_sqlite<M: SushiModel + ?Sized>(
        &self,
        model: &M,
        identity: &str,
    ) -> Result<ConnectionHandle> {
        let rows = model.rows();
        let source = model.source_path();
        let entry = CacheEntry::locate(
            &self.config.cache_path,
            &self.config.cache_prefix,
            identity,
            source.as_deref(),
        );
        let state = cache::decide(&entry.signals(rows.is_some()));
        info!(model = %identity, path = %entry.path.display(), %state, "démarrage du modèle");

        match state {
            BootPath::FreshCache => {
                let conn = Connection::Sqlite(sqlite::open_file(&entry.path)?);
                Ok(self.handle(model, identity, state, Some(&entry), conn, None))
            }
            BootPath::StaleOrMissing => {
                let rows = rows.unwrap_or_default();
                match self.rebuild_cache(model, identity, &entry, &rows) {
                    Err(SushiError::CacheWrite { path, source }) => {
                        warn!(
                            model = %identity,
                            path = %path.display(),
                            error = %source,
                            "cache non inscriptible, repli en mémoire"
                        );
                        self.ephemeral(model, identity, Some(rows))
                    }
                    other => other,
                }
            }
            BootPath::NoCacheCapability | BootPath::LiveRebuild => {
                self.ephemeral(model, identity, rows)
            }
        }
    }

    fn rebuild_cache<M: SushiModel + ?Sized>(
        &self,
        model: &M,
        identity: &str,
        entry: &CacheEntry,
        rows: &[Record],
    ) -> Result<ConnectionHandle> {
        // On planifie avant de toucher au fichier : un jeu vide ne laisse
        // derrière lui aucun cache vide qui passerait pour frais.
        let definition = SchemaPlanner::new().plan(rows, &model.table_options())?;
        entry.truncate()?;

        let mut conn = match sqlite::open_file(&entry.path) {
            Ok(conn) => conn,
            Err(err) => {
                entry.discard();
                return Err(err.into());
            }
        };
        let ready = match backend::materialize(&mut conn, &definition, rows, false) {
            Ok(ready) => ready,
            Err(err) => {
                drop(conn);
                entry.discard();
                return Err(err.into());
            }
        };

        match entry.stamp() {
            Ok(true) => debug!(model = %identity, "empreinte du cache recalée sur la source"),
            Ok(false) => warn!(
                model = %identity,
                "source sans date de modification, le cache sera reconstruit au prochain démarrage"
            ),
            Err(err) => {
                warn!(model = %identity, error = %err, "impossible de recaler la date du cache")
            }
        }
        let conn = Connection::Sqlite(conn);
        let state = BootPath::StaleOrMissing;
        Ok(self.handle(model, identity, state, Some(entry), conn, Some(ready)))
    }

    fn ephemeral<M: SushiModel + ?Sized>(
        &self,
        model: &M,
        identity: &str,
        rows: Option<Vec<Record>>,
    ) -> Result<ConnectionHandle> {
        let rows = rows.ok_or_else(|| SushiError::MissingDataSource {
            model: identity.to_string(),
        })?;
        let definition = SchemaPlanner::new().plan(&rows, &model.table_options())?;
        let mut conn = sqlite::open_in_memory()?;
        let ready = backend::materialize(&mut conn, &definition, &rows, false)?;
        debug!(
            model = %identity,
            rows = ready.rows,
            fields = record::distinct_fields(&rows),
            "base éphémère en mémoire"
        );
        let conn = Connection::Sqlite(conn);
        Ok(self.handle(model, identity, BootPath::NoCacheCapability, None, conn, Some(ready)))
    }

    // ─── Driver réseau ───────────────────────────────────────────────────────

    #[cfg(feature = "postgres")]
    fn boot_postgres<M: SushiModel + ?Sized>(
        &self,
        model: &M,
        identity: &str,
    ) -> Result<ConnectionHandle> {
        let url = self.config.database_url.as_deref().ok_or(SushiError::MissingDatabaseUrl)?;
        let rows = model.rows().ok_or_else(|| SushiError::MissingDataSource {
            model: identity.to_string(),
        })?;
        let definition = SchemaPlanner::new()
            .with_foreign_key_naming(true)
            .plan(&rows, &model.table_options())?;

        info!(
            model = %identity,
            table = %definition.table,
            state = %BootPath::LiveRebuild,
            "démarrage du modèle"
        );
        let mut client = backend::pgsql::connect(url)?;
        let ready = backend::materialize(&mut client, &definition, &rows, true)?;
        debug!(model = %identity, rows = ready.rows, dropped = ready.dropped, "table reconstruite");
        let conn = Connection::Postgres(client);
        Ok(self.handle(model, identity, BootPath::LiveRebuild, None, conn, Some(ready)))
    }

    #[cfg(not(feature = "postgres"))]
    fn boot_postgres<M: SushiModel + ?Sized>(
        &self,
        _model: &M,
        _identity: &str,
    ) -> Result<ConnectionHandle> {
        Err(crate::error::BackendError::DriverUnavailable("postgres").into())
    }

    fn handle<M: SushiModel + ?Sized>(
        &self,
        model: &M,
        identity: &str,
        state: BootPath,
        entry: Option<&CacheEntry>,
        connection: Connection,
        ready: Option<Materialized>,
    ) -> ConnectionHandle {
        let path = entry.map(|e| e.path.clone());
        let handle = ConnectionHandle::new(identity, &model.table(), state, path, connection);
        match ready {
            Some(ready) => handle.with_materialized(ready),
            None => handle,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::SchemaOverride;
    use crate::core::typeside::TypeTag;
    use crate::record;
    use std::borrow::Cow;
    use std::cell::Cell;
    use std::fs::{self, File};
    use std::path::{Path, PathBuf};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    /// Modèle de test : lignes, fichier source et compteur d'appels à `rows`.
    struct Items {
        rows: Option<Vec<Record>>,
        source: PathBuf,
        fetched: Cell<usize>,
    }

    impl Items {
        fn new(dir: &Path) -> Self {
            let source = dir.join("items.rs");
            fs::write(&source, "// définition du modèle").unwrap();
            set_mtime(&source, 1_700_000_000);
            Items {
                rows: Some(vec![
                    record! { "id" => 1, "name" => "a" },
                    record! { "id" => 2, "name" => "bbb" },
                ]),
                source,
                fetched: Cell::new(0),
            }
        }
    }

    impl SushiModel for Items {
        fn rows(&self) -> Option<Vec<Record>> {
            self.fetched.set(self.fetched.get() + 1);
            self.rows.clone()
        }

        fn source_path(&self) -> Option<PathBuf> {
            Some(self.source.clone())
        }

        fn identity(&self) -> Cow<'static, str> {
            Cow::Borrowed("tests::Items")
        }

        fn table(&self) -> String {
            "items".into()
        }

        fn schema(&self) -> SchemaOverride {
            SchemaOverride::from([("name".to_string(), TypeTag::String)])
        }
    }

    fn set_mtime(path: &Path, secs: u64) {
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(UNIX_EPOCH + Duration::from_secs(secs))
            .unwrap();
    }

    fn mtime(path: &Path) -> SystemTime {
        fs::metadata(path).unwrap().modified().unwrap()
    }

    fn names(handle: &ConnectionHandle) -> Vec<(i64, String)> {
        handle
            .with_sqlite(|conn| {
                let mut stmt = conn.prepare("SELECT id, name FROM items ORDER BY id")?;
                let rows = stmt.query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?;
                rows.collect()
            })
            .unwrap()
    }

    fn expected() -> Vec<(i64, String)> {
        vec![(1, "a".to_string()), (2, "bbb".to_string())]
    }

    fn cache_files(dir: &Path) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "sqlite"))
            .count()
    }

    #[test]
    fn test_first_boot_builds_cache() {
        let tmp = tempfile::tempdir().unwrap();
        let model = Items::new(tmp.path());
        let sushi = Sushi::new(SushiConfig::from(tmp.path()));

        let handle = sushi.bootstrap(&model).unwrap();
        assert_eq!(handle.boot_path(), BootPath::StaleOrMissing);
        assert_eq!(names(&handle), expected());

        let file = handle.cache_file().unwrap();
        assert_eq!(file.file_name().unwrap(), "sushi-tests-items.sqlite");
        assert_eq!(mtime(file), mtime(&model.source));

        let ready = handle.materialized().unwrap();
        assert_eq!(ready.table, "items");
        assert_eq!(ready.rows, 2);
        assert!(!ready.dropped);
    }

    #[test]
    fn test_bootstrap_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let model = Items::new(tmp.path());
        let sushi = Sushi::new(SushiConfig::from(tmp.path()));

        assert!(sushi.resolve_connection(&model).is_none());
        let first = sushi.bootstrap(&model).unwrap();
        let second = sushi.bootstrap(&model).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(model.fetched.get(), 1);
        let resolved = sushi.resolve_connection(&model).unwrap();
        assert!(Arc::ptr_eq(&first, &resolved));
    }

    #[test]
    fn test_fresh_cache_skips_rebuild() {
        let tmp = tempfile::tempdir().unwrap();
        let model = Items::new(tmp.path());

        let first = Sushi::new(SushiConfig::from(tmp.path()));
        let built = first.bootstrap(&model).unwrap();
        let before = names(&built);

        // Nouveau « processus » : registre vide, même répertoire
        let second = Sushi::new(SushiConfig::from(tmp.path()));
        let fresh = second.bootstrap(&model).unwrap();
        assert_eq!(fresh.boot_path(), BootPath::FreshCache);
        assert_eq!(fresh.materialized(), None);
        assert_eq!(names(&fresh), before);

        // Le cache est pris tel quel : une ligne ajoutée à la main reste visible
        built
            .with_sqlite(|conn| {
                conn.execute("INSERT INTO items (id, name) VALUES (3, 'manual')", [])
            })
            .unwrap();
        set_mtime(fresh.cache_file().unwrap(), 1_700_000_000);
        let third = Sushi::new(SushiConfig::from(tmp.path()));
        let reopened = third.bootstrap(&model).unwrap();
        assert_eq!(reopened.boot_path(), BootPath::FreshCache);
        assert_eq!(names(&reopened).len(), 3);
    }

    #[test]
    fn test_stale_cache_is_rebuilt_and_restamped() {
        let tmp = tempfile::tempdir().unwrap();
        let mut model = Items::new(tmp.path());
        Sushi::new(SushiConfig::from(tmp.path())).bootstrap(&model).unwrap();

        // Le modèle change : nouvelle date, nouvelles lignes
        set_mtime(&model.source, 1_700_000_600);
        model.rows = Some(vec![record! { "id" => 7, "name" => "changed" }]);

        let rebuilt = Sushi::new(SushiConfig::from(tmp.path())).bootstrap(&model).unwrap();
        assert_eq!(rebuilt.boot_path(), BootPath::StaleOrMissing);
        assert_eq!(names(&rebuilt), vec![(7, "changed".to_string())]);
        let file = rebuilt.cache_file().unwrap().to_path_buf();
        assert_eq!(mtime(&file), UNIX_EPOCH + Duration::from_secs(1_700_000_600));

        let again = Sushi::new(SushiConfig::from(tmp.path())).bootstrap(&model).unwrap();
        assert_eq!(again.boot_path(), BootPath::FreshCache);
        assert_eq!(names(&again), vec![(7, "changed".to_string())]);
    }

    #[test]
    fn test_unwritable_directory_falls_back_to_memory() {
        let tmp = tempfile::tempdir().unwrap();
        let model = Items::new(tmp.path());
        let missing = tmp.path().join("no-such-dir");

        for _ in 0..2 {
            let sushi = Sushi::new(SushiConfig::from(&missing));
            let handle = sushi.bootstrap(&model).unwrap();
            assert_eq!(handle.boot_path(), BootPath::NoCacheCapability);
            assert_eq!(handle.cache_file(), None);
            assert_eq!(names(&handle), expected());
        }
        assert!(!missing.exists());
        assert_eq!(cache_files(tmp.path()), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_read_only_directory_falls_back_to_memory() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let model = Items::new(tmp.path());
        let locked = tmp.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

        let sushi = Sushi::new(SushiConfig::from(&locked));
        let handle = sushi.bootstrap(&model).unwrap();
        assert_eq!(handle.boot_path(), BootPath::NoCacheCapability);
        assert_eq!(handle.cache_file(), None);
        assert_eq!(handle.materialized().map(|m| m.rows), Some(2));
        assert_eq!(names(&handle), expected());

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(cache_files(&locked), 0);
    }

    /// Modèle dont les lignes sont lues dans la table d'un autre modèle.
    struct Summary<'a> {
        sushi: &'a Sushi,
        base: &'a Items,
    }

    impl SushiModel for Summary<'_> {
        fn rows(&self) -> Option<Vec<Record>> {
            let base = self.sushi.bootstrap(self.base).ok()?;
            let rows = base
                .with_sqlite(|conn| {
                    conn.query_row("SELECT count(*), max(id) FROM items", [], |r| {
                        let (total, last): (i64, i64) = (r.get(0)?, r.get(1)?);
                        Ok(record! { "total" => total, "last" => last })
                    })
                })
                .ok()?;
            Some(vec![rows])
        }

        fn source_path(&self) -> Option<PathBuf> {
            Some(self.base.source.clone())
        }

        fn identity(&self) -> Cow<'static, str> {
            Cow::Borrowed("tests::Summary")
        }

        fn table(&self) -> String {
            "summary".into()
        }
    }

    #[test]
    fn test_rows_may_bootstrap_another_model() {
        let tmp = tempfile::tempdir().unwrap();
        let base = Items::new(tmp.path());
        let sushi = Sushi::new(SushiConfig::from(tmp.path()));
        let summary = Summary { sushi: &sushi, base: &base };

        let handle = sushi.bootstrap(&summary).unwrap();
        let (total, last): (i64, i64) = handle
            .with_sqlite(|conn| {
                conn.query_row("SELECT total, last FROM summary", [], |r| {
                    Ok((r.get(0)?, r.get(1)?))
                })
            })
            .unwrap();
        assert_eq!((total, last), (2, 2));

        assert_eq!(sushi.registry().len(), 2);
        assert!(sushi.resolve_connection(&base).is_some());
        assert_eq!(base.fetched.get(), 1);
    }

    #[test]
    fn test_missing_rows_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let mut model = Items::new(tmp.path());
        model.rows = None;
        let sushi = Sushi::new(SushiConfig::from(tmp.path()));

        let err = sushi.bootstrap(&model).unwrap_err();
        assert!(matches!(
            err,
            SushiError::MissingDataSource { ref model } if model == "tests::Items"
        ));
        assert!(sushi.resolve_connection(&model).is_none());
        assert_eq!(cache_files(tmp.path()), 0);
    }

    #[test]
    fn test_empty_rows_leave_no_cache() {
        let tmp = tempfile::tempdir().unwrap();
        let mut model = Items::new(tmp.path());
        model.rows = Some(Vec::new());
        let sushi = Sushi::new(SushiConfig::from(tmp.path()));

        let err = sushi.bootstrap(&model).unwrap_err();
        assert!(matches!(err, SushiError::SchemaInference { .. }));
        assert_eq!(cache_files(tmp.path()), 0);
    }

    #[test]
    fn test_failed_insert_discards_cache() {
        let tmp = tempfile::tempdir().unwrap();
        let mut model = Items::new(tmp.path());
        model.rows = Some(vec![
            record! { "id" => 1, "name" => "a" },
            record! { "id" => 1, "name" => "dup" },
        ]);
        let sushi = Sushi::new(SushiConfig::from(tmp.path()));

        let err = sushi.bootstrap(&model).unwrap_err();
        assert!(matches!(err, SushiError::Backend(_)));
        assert_eq!(cache_files(tmp.path()), 0);
    }

    #[test]
    fn test_cache_prefix() {
        let tmp = tempfile::tempdir().unwrap();
        let model = Items::new(tmp.path());
        let sushi = Sushi::new(SushiConfig::from(tmp.path()).cache_prefix("demo"));
        let handle = sushi.bootstrap(&model).unwrap();
        assert_eq!(
            handle.cache_file().unwrap().file_name().unwrap(),
            "demo-tests-items.sqlite"
        );
    }

    #[cfg(not(feature = "postgres"))]
    #[test]
    fn test_postgres_driver_unavailable() {
        let tmp = tempfile::tempdir().unwrap();
        let model = Items::new(tmp.path());
        let sushi = Sushi::new(SushiConfig::from(tmp.path()).driver(Driver::Postgres));
        let err = sushi.bootstrap(&model).unwrap_err();
        assert!(matches!(
            err,
            SushiError::Backend(crate::error::BackendError::DriverUnavailable("postgres"))
        ));
    }
}
