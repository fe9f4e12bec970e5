use std::{env, time::Duration};

use lessonbook::store::{CollectionRegistry, CollectionSpec};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    /// Collections exposed by the gateway. Falls back to `lessons` and `orders`.
    #[serde(default)]
    pub collections: Option<Vec<CollectionSpec>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Memory,
    Mongodb,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: Option<BackendKind>,
    #[serde(default)]
    pub connection_string: Option<String>,
    pub database: String,
    pub timeout_ms: u64,
}

impl StoreConfig {
    /// MongoDB when a connection string is configured, memory otherwise.
    pub fn backend(&self) -> BackendKind {
        self.backend.unwrap_or(match self.connection_string {
            Some(_) => BackendKind::Mongodb,
            None => BackendKind::Memory,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = config::Config::builder()
            .set_default("server.port", 3000_i64)?
            .set_default("store.database", "coach")?
            .set_default("store.timeout_ms", 5000_i64)?
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("LESSONBOOK").separator("__"))
            // Plain variables used by existing deployments
            .set_override_option("server.port", env::var("PORT").ok())?
            .set_override_option("store.connection_string", env::var("CONNECTION_STRING").ok())?;

        builder.build()?.try_deserialize()
    }

    pub fn registry(&self) -> CollectionRegistry {
        match &self.collections {
            Some(specs) => CollectionRegistry::new(specs.iter().cloned()),
            None => CollectionRegistry::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lessonbook::store::CollectionKind;

    fn from(builder: config::ConfigBuilder<config::builder::DefaultState>) -> AppConfig {
        builder
            .set_default("server.port", 3000_i64)
            .unwrap()
            .set_default("store.database", "coach")
            .unwrap()
            .set_default("store.timeout_ms", 5000_i64)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn defaults_to_memory_without_connection_string() {
        let config = from(config::Config::builder());

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.store.database, "coach");
        assert_eq!(config.store.backend(), BackendKind::Memory);
        assert_eq!(config.store.timeout(), Duration::from_secs(5));
        assert!(config.registry().get("lessons").is_some());
    }

    #[test]
    fn connection_string_selects_mongodb() {
        let config = from(
            config::Config::builder()
                .set_override("store.connection_string", "mongodb://localhost:27017")
                .unwrap()
                .set_override("server.port", "8080")
                .unwrap(),
        );

        assert_eq!(config.store.backend(), BackendKind::Mongodb);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn explicit_backend_wins() {
        let config = from(
            config::Config::builder()
                .set_override("store.connection_string", "mongodb://localhost:27017")
                .unwrap()
                .set_override("store.backend", "memory")
                .unwrap(),
        );

        assert_eq!(config.store.backend(), BackendKind::Memory);
    }

    #[test]
    fn collections_can_be_configured() {
        let config = from(
            config::Config::builder().add_source(config::File::from_str(
                r#"
                [[collections]]
                name = "courses"
                kind = "catalog"
                searchable_fields = ["title"]

                [[collections]]
                name = "bookings"
                kind = "orders"
                stock = "courses"
                "#,
                config::FileFormat::Toml,
            )),
        );

        let registry = config.registry();
        assert!(registry.get("lessons").is_none());
        assert_eq!(registry.get("courses").unwrap().searchable_fields, vec!["title"]);
        assert_eq!(registry.get("bookings").unwrap().kind, CollectionKind::Orders);
        assert_eq!(registry.stock_of(registry.get("bookings").unwrap()).unwrap().name, "courses");
    }
}
