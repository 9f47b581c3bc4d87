use async_trait::async_trait;
use std::{
    collections::{hash_map::Entry, HashMap},
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{error, info, warn};

use super::{models::Config, DatabaseError};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("failed to read migrations from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid migration filename {0:?}, expected <timestamp>-<name>.sql")]
    InvalidFilename(String),
    #[error("failed to load bot config: {0}")]
    Config(#[source] DatabaseError),
    #[error("failed to apply migration {name}: {source}")]
    Failed {
        name: String,
        #[source]
        source: DatabaseError,
    },
}

/// One forward-only schema change.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationScript {
    pub timestamp: f64,
    pub name: String,
    pub sql: String,
}

impl MigrationScript {
    /// Splits `<timestamp>-<name>.sql` at the first dash.
    pub fn parse_filename(file_name: &str) -> Result<(f64, String), MigrationError> {
        let invalid = || MigrationError::InvalidFilename(file_name.to_string());

        let stem = file_name.strip_suffix(".sql").ok_or_else(invalid)?;
        let (timestamp, name) = stem.split_once('-').ok_or_else(invalid)?;
        let timestamp = timestamp
            .parse::<f64>()
            .ok()
            .filter(|t| t.is_finite())
            .ok_or_else(invalid)?;
        if name.is_empty() {
            return Err(invalid());
        }

        Ok((timestamp, name.to_string()))
    }
}

/// Where migrations get applied.
#[async_trait]
pub trait MigrationStore: Send + Sync {
    /// The bookkeeping row, created if this is the first run.
    async fn load_config(&self, bot_id: i64) -> Result<Config, DatabaseError>;

    /// Runs the script and records its name as one unit.
    async fn apply(&self, bot_id: i64, script: &MigrationScript) -> Result<(), DatabaseError>;
}

/// Loads every `*.sql` file in `dir`. A missing directory holds no migrations.
pub async fn discover(dir: &Path) -> Result<Vec<MigrationScript>, MigrationError> {
    let read_err = |source: io::Error| MigrationError::Read {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(why) if why.kind() == io::ErrorKind::NotFound => {
            warn!(path = %dir.display(), "Migrations directory does not exist");
            return Ok(Vec::new());
        }
        Err(why) => return Err(read_err(why)),
    };

    let mut scripts = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
        let file_name = entry.file_name().to_string_lossy().into_owned();
        if !file_name.ends_with(".sql") {
            continue;
        }
        let (timestamp, name) = MigrationScript::parse_filename(&file_name)?;
        let sql = tokio::fs::read_to_string(entry.path())
            .await
            .map_err(read_err)?;
        scripts.push(MigrationScript {
            timestamp,
            name,
            sql,
        });
    }

    Ok(scripts)
}

/// Scripts not yet recorded in `config`, in application order.
///
/// Names are the identity: a script sharing a name with an applied one is skipped
/// whatever its timestamp, and of two discovered scripts with the same name only the
/// earlier one is kept.
pub fn pending<'a>(scripts: &'a [MigrationScript], config: &Config) -> Vec<&'a MigrationScript> {
    let mut by_name: HashMap<&str, &MigrationScript> = HashMap::new();
    for script in scripts.iter().filter(|s| !config.is_applied(&s.name)) {
        match by_name.entry(script.name.as_str()) {
            Entry::Occupied(mut e) => {
                if script.timestamp < e.get().timestamp {
                    e.insert(script);
                }
            }
            Entry::Vacant(e) => {
                e.insert(script);
            }
        }
    }

    let mut pending = by_name.into_values().collect::<Vec<_>>();
    pending.sort_by(|a, b| {
        a.timestamp
            .total_cmp(&b.timestamp)
            .then_with(|| a.name.cmp(&b.name))
    });
    pending
}

/// Brings the schema up to date, returning the names applied by this call.
///
/// Stops at the first failing script. Everything applied before it stays recorded, so
/// the next run resumes from the failed one.
pub async fn run<S>(
    store: &S,
    bot_id: i64,
    scripts: &[MigrationScript],
) -> Result<Vec<String>, MigrationError>
where
    S: MigrationStore + ?Sized,
{
    let config = store.load_config(bot_id).await.map_err(MigrationError::Config)?;
    let pending = pending(scripts, &config);
    if pending.is_empty() {
        info!("No migrations to apply.");
        return Ok(Vec::new());
    }

    warn!("Applying {} migrations...", pending.len());
    let mut applied = Vec::with_capacity(pending.len());
    for script in pending {
        info!(migration = %script.name, "Applying migration");
        if let Err(source) = store.apply(bot_id, script).await {
            error!(migration = %script.name, "Failed to apply migration, aborting");
            return Err(MigrationError::Failed {
                name: script.name.clone(),
                source,
            });
        }
        applied.push(script.name.clone());
    }
    info!("Finished applying migrations.");

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeStore {
        config: Mutex<Option<Config>>,
        executed: Mutex<Vec<String>>,
        writes: Mutex<usize>,
        fail_on: Option<&'static str>,
    }

    impl FakeStore {
        fn with_applied(names: &[&str]) -> Self {
            let store = Self::default();
            *store.config.lock().unwrap() = Some(Config {
                bot_id: 1,
                migrations: names.iter().map(|n| n.to_string()).collect(),
                last_login: Utc::now().naive_utc(),
            });
            store
        }

        fn applied(&self) -> Vec<String> {
            self.config
                .lock()
                .unwrap()
                .as_ref()
                .map(|c| c.migrations.clone())
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl MigrationStore for FakeStore {
        async fn load_config(&self, bot_id: i64) -> Result<Config, DatabaseError> {
            let mut config = self.config.lock().unwrap();
            if config.is_none() {
                *self.writes.lock().unwrap() += 1;
            }
            Ok(config
                .get_or_insert_with(|| Config {
                    bot_id,
                    migrations: Vec::new(),
                    last_login: Utc::now().naive_utc(),
                })
                .clone())
        }

        async fn apply(&self, _bot_id: i64, script: &MigrationScript) -> Result<(), DatabaseError> {
            if self.fail_on == Some(script.name.as_str()) {
                return Err(DatabaseError::Sqlx(sqlx::Error::Protocol(
                    "syntax error".to_string(),
                )));
            }
            self.executed.lock().unwrap().push(script.name.clone());
            *self.writes.lock().unwrap() += 1;
            if let Some(config) = self.config.lock().unwrap().as_mut() {
                config.migrations.push(script.name.clone());
            }
            Ok(())
        }
    }

    fn script(timestamp: f64, name: &str) -> MigrationScript {
        MigrationScript {
            timestamp,
            name: name.to_string(),
            sql: format!("-- {}", name),
        }
    }

    #[test]
    fn parses_timestamp_and_name() {
        assert_eq!(
            MigrationScript::parse_filename("1690000000.5-add-index.sql").unwrap(),
            (1_690_000_000.5, "add-index".to_string())
        );
    }

    #[test]
    fn rejects_malformed_filenames() {
        for name in ["init.sql", "abc-init.sql", "12-.sql", "nan-x.sql", "12-x.txt"] {
            assert!(
                matches!(
                    MigrationScript::parse_filename(name),
                    Err(MigrationError::InvalidFilename(_))
                ),
                "{name}"
            );
        }
    }

    #[tokio::test]
    async fn applies_in_timestamp_order() {
        let store = FakeStore::default();
        let scripts = [script(3.0, "c"), script(1.0, "a"), script(2.0, "b")];

        let applied = run(&store, 1, &scripts).await.unwrap();

        assert_eq!(applied, ["a", "b", "c"]);
        assert_eq!(*store.executed.lock().unwrap(), ["a", "b", "c"]);
        assert_eq!(store.applied(), ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn equal_timestamps_are_ordered_by_name() {
        let store = FakeStore::default();
        let scripts = [script(1.0, "b"), script(1.0, "a")];

        let applied = run(&store, 1, &scripts).await.unwrap();

        assert_eq!(applied, ["a", "b"]);
    }

    #[tokio::test]
    async fn rerun_with_everything_applied_writes_nothing() {
        let store = FakeStore::with_applied(&["a", "b"]);
        let scripts = [script(1.0, "a"), script(2.0, "b")];

        let applied = run(&store, 1, &scripts).await.unwrap();

        assert!(applied.is_empty());
        assert!(store.executed.lock().unwrap().is_empty());
        assert_eq!(*store.writes.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn failure_keeps_earlier_migrations_and_stops() {
        let store = FakeStore {
            fail_on: Some("b"),
            ..FakeStore::default()
        };
        let scripts = [script(1.0, "a"), script(2.0, "b"), script(3.0, "c")];

        let err = run(&store, 1, &scripts).await.unwrap_err();

        assert!(matches!(&err, MigrationError::Failed { name, .. } if name == "b"));
        assert!(err.to_string().contains("b"));
        assert_eq!(store.applied(), ["a"]);
        assert_eq!(*store.executed.lock().unwrap(), ["a"]);
    }

    #[tokio::test]
    async fn retry_after_failure_resumes_at_failed_script() {
        let store = FakeStore::with_applied(&["a"]);
        let scripts = [script(1.0, "a"), script(2.0, "b"), script(3.0, "c")];

        let applied = run(&store, 1, &scripts).await.unwrap();

        assert_eq!(applied, ["b", "c"]);
    }

    #[tokio::test]
    async fn applied_name_with_new_timestamp_is_skipped() {
        let store = FakeStore::with_applied(&["a"]);
        let scripts = [script(5.0, "a")];

        assert!(run(&store, 1, &scripts).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn no_scripts_is_a_no_op() {
        let store = FakeStore::with_applied(&[]);

        assert!(run(&store, 1, &[]).await.unwrap().is_empty());
        assert_eq!(*store.writes.lock().unwrap(), 0);
    }

    #[test]
    fn duplicate_names_keep_the_earliest_script() {
        let config = Config {
            bot_id: 1,
            migrations: Vec::new(),
            last_login: Utc::now().naive_utc(),
        };
        let scripts = [script(9.0, "a"), script(4.0, "a")];

        let pending = pending(&scripts, &config);

        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].timestamp, 4.0);
    }

    #[tokio::test]
    async fn discovers_sql_files_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("2-b.sql"), "SELECT 2").unwrap();
        std::fs::write(dir.path().join("1-a.sql"), "SELECT 1").unwrap();
        std::fs::write(dir.path().join("README.md"), "docs").unwrap();

        let mut scripts = discover(dir.path()).await.unwrap();
        scripts.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(scripts, [script_with(1.0, "a", "SELECT 1"), script_with(2.0, "b", "SELECT 2")]);
    }

    #[tokio::test]
    async fn missing_directory_has_no_migrations() {
        let dir = tempfile::tempdir().unwrap();

        let scripts = discover(&dir.path().join("missing")).await.unwrap();

        assert!(scripts.is_empty());
    }

    fn script_with(timestamp: f64, name: &str, sql: &str) -> MigrationScript {
        MigrationScript {
            timestamp,
            name: name.to_string(),
            sql: sql.to_string(),
        }
    }
}
