//! Configuration loading and backend factories.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use gurukul_core::traits::{DocumentStore, TextGenerator};
use gurukul_core::{AggregatorConfig, MemoryStore};

use crate::firestore::{FirestoreOptions, FirestoreStore};
use crate::gemini::GeminiGenerator;
use crate::mock::MockGenerator;

/// Which document store backs the analytics operations.
///
/// Debug output masks credentials.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Process-local; contents are lost on exit.
    Memory,
    /// In-memory store persisted to a JSON snapshot after each command.
    File {
        #[serde(default = "default_store_path")]
        path: PathBuf,
    },
    Firestore {
        project_id: String,
        #[serde(default)]
        api_key: Option<String>,
        #[serde(default)]
        database: Option<String>,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        auth_token: Option<String>,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::File {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".gurukul/store.json")
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreConfig::Memory => f.write_str("Memory"),
            StoreConfig::File { path } => f.debug_struct("File").field("path", path).finish(),
            StoreConfig::Firestore {
                project_id,
                api_key,
                database,
                base_url,
                auth_token,
            } => f
                .debug_struct("Firestore")
                .field("project_id", project_id)
                .field("api_key", &api_key.as_ref().map(|_| "***"))
                .field("database", database)
                .field("base_url", base_url)
                .field("auth_token", &auth_token.as_ref().map(|_| "***"))
                .finish(),
        }
    }
}

/// Which text generator backs the assistant and auto-grading.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GeneratorConfig {
    Gemini {
        api_key: String,
        #[serde(default)]
        model: Option<String>,
        #[serde(default)]
        base_url: Option<String>,
    },
    Mock {
        #[serde(default)]
        response: String,
    },
}

impl std::fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeneratorConfig::Gemini {
                api_key: _,
                model,
                base_url,
            } => f
                .debug_struct("Gemini")
                .field("api_key", &"***")
                .field("model", model)
                .field("base_url", base_url)
                .finish(),
            GeneratorConfig::Mock { response } => {
                f.debug_struct("Mock").field("response", response).finish()
            }
        }
    }
}

/// Top-level gurukul configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GurukulConfig {
    #[serde(default)]
    pub store: StoreConfig,
    /// Absent means generator-backed commands are unavailable.
    #[serde(default)]
    pub generator: Option<GeneratorConfig>,
    #[serde(default)]
    pub analytics: AggregatorConfig,
}

/// Replace `${VAR_NAME}` references with the variable's value.
///
/// Unset variables resolve to the empty string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let name = &rest[start + 2..start + len];
        result.push_str(&std::env::var(name).unwrap_or_default());
        rest = &rest[start + len + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_opt(value: &Option<String>) -> Option<String> {
    value.as_deref().map(resolve_env_vars)
}

impl GurukulConfig {
    fn resolve(&mut self) {
        if let StoreConfig::Firestore {
            project_id,
            api_key,
            database,
            base_url,
            auth_token,
        } = &mut self.store
        {
            *project_id = resolve_env_vars(project_id);
            *api_key = resolve_opt(api_key);
            *database = resolve_opt(database);
            *base_url = resolve_opt(base_url);
            *auth_token = resolve_opt(auth_token);
        }
        if let Some(GeneratorConfig::Gemini {
            api_key,
            model,
            base_url,
        }) = &mut self.generator
        {
            *api_key = resolve_env_vars(api_key);
            *model = resolve_opt(model);
            *base_url = resolve_opt(base_url);
        }
    }

    /// Apply `GURUKUL_GEMINI_KEY` and `GURUKUL_FIRESTORE_KEY`.
    ///
    /// The Gemini key selects the Gemini generator when none is configured;
    /// the Firestore key only applies to a configured Firestore store.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("GURUKUL_GEMINI_KEY") {
            match &mut self.generator {
                Some(GeneratorConfig::Gemini { api_key, .. }) => *api_key = key,
                Some(GeneratorConfig::Mock { .. }) => {}
                generator @ None => {
                    *generator = Some(GeneratorConfig::Gemini {
                        api_key: key,
                        model: None,
                        base_url: None,
                    })
                }
            }
        }
        if let Some(key) = lookup("GURUKUL_FIRESTORE_KEY") {
            if let StoreConfig::Firestore { api_key, .. } = &mut self.store {
                *api_key = Some(key);
            }
        }
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `gurukul.toml` in the current directory
/// 2. `~/.config/gurukul/config.toml`
///
/// Falls back to defaults when neither exists.
pub fn load_config() -> Result<GurukulConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<GurukulConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("gurukul.toml");
            if local.exists() {
                Some(local)
            } else {
                config_dir()
                    .map(|dir| dir.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => GurukulConfig::default(),
    };

    config.apply_overrides(|name| std::env::var(name).ok());
    config.resolve();
    tracing::debug!(store = ?config.store, generator = ?config.generator, "configuration loaded");
    Ok(config)
}

/// Parse configuration text without applying overrides.
pub fn parse_config(content: &str) -> Result<GurukulConfig> {
    Ok(toml::from_str(content)?)
}

fn config_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("gurukul"))
}

/// An opened document store.
///
/// For the `file` backend the handle remembers where to write the snapshot
/// back; [`persist`](Self::persist) is a no-op for the other backends.
pub struct StoreHandle {
    store: Arc<dyn DocumentStore>,
    snapshot: Option<(Arc<MemoryStore>, PathBuf)>,
}

impl StoreHandle {
    pub fn store(&self) -> Arc<dyn DocumentStore> {
        Arc::clone(&self.store)
    }

    pub fn persist(&self) -> Result<()> {
        if let Some((store, path)) = &self.snapshot {
            store.save(path)?;
            tracing::debug!(path = %path.display(), "store snapshot saved");
        }
        Ok(())
    }
}

/// Open the configured document store.
pub fn create_store(config: &StoreConfig) -> Result<StoreHandle> {
    match config {
        StoreConfig::Memory => Ok(StoreHandle {
            store: Arc::new(MemoryStore::new()),
            snapshot: None,
        }),
        StoreConfig::File { path } => {
            let store = Arc::new(MemoryStore::load(path)?);
            Ok(StoreHandle {
                store: store.clone(),
                snapshot: Some((store, path.clone())),
            })
        }
        StoreConfig::Firestore {
            project_id,
            api_key,
            database,
            base_url,
            auth_token,
        } => {
            let store = FirestoreStore::new(FirestoreOptions {
                project_id: project_id.clone(),
                database: database.clone(),
                api_key: api_key.clone(),
                auth_token: auth_token.clone(),
                base_url: base_url.clone(),
            })?;
            Ok(StoreHandle {
                store: Arc::new(store),
                snapshot: None,
            })
        }
    }
}

/// Create the configured text generator.
pub fn create_generator(config: Option<&GeneratorConfig>) -> Result<Arc<dyn TextGenerator>> {
    match config {
        Some(GeneratorConfig::Gemini {
            api_key,
            model,
            base_url,
        }) => {
            if api_key.is_empty() {
                anyhow::bail!("gemini api_key is empty (set GURUKUL_GEMINI_KEY)");
            }
            Ok(Arc::new(GeminiGenerator::new(
                api_key,
                model.clone(),
                base_url.clone(),
            )?))
        }
        Some(GeneratorConfig::Mock { response }) => {
            Ok(Arc::new(MockGenerator::with_fixed_response(response)))
        }
        None => anyhow::bail!(
            "no text generator configured; add a [generator] table or set GURUKUL_GEMINI_KEY"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_GURUKUL_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_GURUKUL_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_GURUKUL_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("${_GURUKUL_UNSET_VAR}x"), "x");
        assert_eq!(resolve_env_vars("open ${brace"), "open ${brace");
        std::env::remove_var("_GURUKUL_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = GurukulConfig::default();
        assert!(matches!(config.store, StoreConfig::File { .. }));
        assert!(config.generator.is_none());
        assert_eq!(config.analytics.active_window_days, 7);
        assert_eq!(config.analytics.assumed_assignments, 10);
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
[store]
type = "firestore"
project_id = "lms-prod"
api_key = "AIza-test"

[generator]
type = "gemini"
api_key = "gem-key"
model = "gemini-1.5-flash"

[analytics]
active_window_days = 14
"#;
        let config: GurukulConfig = toml::from_str(toml_str).unwrap();
        assert!(matches!(
            &config.store,
            StoreConfig::Firestore { project_id, database: None, .. } if project_id == "lms-prod"
        ));
        assert!(matches!(
            config.generator,
            Some(GeneratorConfig::Gemini { .. })
        ));
        assert_eq!(config.analytics.active_window_days, 14);
        assert_eq!(config.analytics.assumed_assignments, 10);
    }

    #[test]
    fn debug_masks_secrets() {
        let config = GurukulConfig {
            store: StoreConfig::Firestore {
                project_id: "p".into(),
                api_key: Some("AIza-secret".into()),
                database: None,
                base_url: None,
                auth_token: Some("ya29.secret".into()),
            },
            generator: Some(GeneratorConfig::Gemini {
                api_key: "gem-secret".into(),
                model: None,
                base_url: None,
            }),
            analytics: AggregatorConfig::default(),
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn gemini_key_override_selects_gemini() {
        let mut config = GurukulConfig::default();
        config.apply_overrides(|name| (name == "GURUKUL_GEMINI_KEY").then(|| "env-key".into()));
        assert!(matches!(
            config.generator,
            Some(GeneratorConfig::Gemini { ref api_key, .. }) if api_key == "env-key"
        ));
    }

    #[test]
    fn firestore_key_override_needs_firestore_store() {
        let lookup = |name: &str| (name == "GURUKUL_FIRESTORE_KEY").then(|| "fs-key".to_string());

        let mut file_backed = GurukulConfig::default();
        file_backed.apply_overrides(lookup);
        assert!(matches!(file_backed.store, StoreConfig::File { .. }));

        let mut firestore = GurukulConfig {
            store: StoreConfig::Firestore {
                project_id: "p".into(),
                api_key: None,
                database: None,
                base_url: None,
                auth_token: None,
            },
            ..Default::default()
        };
        firestore.apply_overrides(lookup);
        assert!(matches!(
            firestore.store,
            StoreConfig::Firestore { api_key: Some(ref k), .. } if k == "fs-key"
        ));
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let err = load_config_from(Some(Path::new("/nonexistent/gurukul.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[tokio::test]
    async fn file_store_persists_between_handles() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::File {
            path: dir.path().join("data/store.json"),
        };

        let handle = create_store(&config).unwrap();
        handle
            .store()
            .add("analytics_events", Default::default())
            .await
            .unwrap();
        handle.persist().unwrap();

        let reopened = create_store(&config).unwrap();
        let docs = reopened
            .store()
            .query(&gurukul_core::traits::Query::collection("analytics_events"))
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
    }

    #[test]
    fn missing_generator_is_an_error() {
        assert!(create_generator(None).is_err());
        let mock = create_generator(Some(&GeneratorConfig::Mock {
            response: "Score: 1".into(),
        }))
        .unwrap();
        assert_eq!(mock.name(), "mock");
    }
}
