// src/config.rs

use std::env;

use crate::error::ReportError;

/// Enumerated configuration keys and their defaults. Process environment
/// variables with the same names override these; the merge is the whole
/// story, nothing reads ambient state after `Config::load` returns.
const DEFAULTS: &[(&str, &str)] = &[
    ("DB_HOST", "localhost:27017"),
    ("DB_NAME", "gales-sales"),
    ("ARTIFACT_URL", "http://localhost:8080/artifacts"),
    ("STAGE", "test"),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Dev,
    Stage,
    Test,
    Prod,
}

impl Stage {
    fn parse(value: &str) -> Result<Self, ReportError> {
        match value {
            "dev" | "development" => Ok(Self::Dev),
            "stage" => Ok(Self::Stage),
            "test" => Ok(Self::Test),
            "prod" | "production" => Ok(Self::Prod),
            other => Err(ReportError::validation(
                "config.load",
                format!("Invalid stage environment requested: {}", other),
                "Error missing or invalid stage environment",
            )),
        }
    }
}

/// Immutable process configuration, built once at startup and passed by
/// reference to whatever needs it.
#[derive(Clone, Debug)]
pub struct Config {
    pub db_host: String,
    pub db_name: String,
    pub artifact_url: String,
    pub stage: Stage,
}

impl Config {
    pub fn load() -> Result<Self, ReportError> {
        let db_host = resolve("DB_HOST");
        let db_name = resolve("DB_NAME");
        let artifact_url = resolve("ARTIFACT_URL");
        let stage = Stage::parse(&resolve("STAGE"))?;

        Ok(Self {
            db_host,
            db_name,
            artifact_url,
            stage,
        })
    }

    /// Connection string handed to the Mongo driver. Non-test stages
    /// authenticate against the hosted cluster, test talks to a local
    /// standalone instance.
    pub fn db_connect_url(&self) -> String {
        if self.stage == Stage::Test {
            return format!(
                "mongodb://{}/?readPreference=primary&ssl=false&directConnection=true",
                self.db_host
            );
        }
        format!(
            "mongodb+srv://{}/{}?retryWrites=true&w=majority",
            self.db_host, self.db_name
        )
    }
}

fn resolve(key: &str) -> String {
    if let Ok(value) = env::var(key) {
        if !value.is_empty() {
            return value;
        }
    }
    DEFAULTS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, default)| default.to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_env_unset() {
        env::remove_var("DB_NAME");
        let cfg = Config::load().unwrap();
        assert_eq!(cfg.db_name, "gales-sales");
    }

    #[test]
    fn env_overrides_default() {
        env::set_var("ARTIFACT_URL", "https://reports.example.com/store");
        let cfg = Config::load().unwrap();
        assert_eq!(cfg.artifact_url, "https://reports.example.com/store");
        env::remove_var("ARTIFACT_URL");
    }

    #[test]
    fn invalid_stage_is_rejected() {
        let err = Stage::parse("qa").unwrap_err();
        assert!(err.to_string().contains("qa"));
    }

    #[test]
    fn test_stage_uses_direct_connection() {
        let cfg = Config {
            db_host: "localhost:27017".to_string(),
            db_name: "gales-sales".to_string(),
            artifact_url: String::new(),
            stage: Stage::Test,
        };
        assert_eq!(
            cfg.db_connect_url(),
            "mongodb://localhost:27017/?readPreference=primary&ssl=false&directConnection=true"
        );
    }

    #[test]
    fn prod_stage_uses_srv_connection() {
        let cfg = Config {
            db_host: "cluster0.example.mongodb.net".to_string(),
            db_name: "gales-sales".to_string(),
            artifact_url: String::new(),
            stage: Stage::Prod,
        };
        assert!(cfg.db_connect_url().starts_with("mongodb+srv://"));
    }
}
