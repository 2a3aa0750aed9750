//! Runtime configuration read from the environment (and an optional `.env` file).
//!
//! | Variable            | Default                          |
//! |---------------------|----------------------------------|
//! | `HOST`              | `127.0.0.1`                      |
//! | `PORT`              | `8080`                           |
//! | `DB_PATH`           | `./database/quittances.sqlite`   |
//! | `RECEIPTS_DIR`      | `./receipts`                     |
//! | `UPLOADS_DIR`       | `./uploads`                      |
//!
//! `LANDLORD_NAME`, `LANDLORD_ADDRESS1`, `LANDLORD_ADDRESS2`, `LANDLORD_SIGNATURE` and
//! `SIGNATURE_PATH` describe the owner written to the database on first start.

use common::model::landlord::Landlord;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
    #[error("could not create directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub receipts_dir: PathBuf,
    pub uploads_dir: PathBuf,
    /// Owner seeded into an empty database, when `LANDLORD_NAME` is set.
    pub landlord: Option<Landlord>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars().collect())
    }

    /// Builds the configuration from an explicit variable map.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            vars.get(name)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        let port = match get("PORT") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: value.clone(),
            })?,
            None => 8080,
        };

        let landlord = get("LANDLORD_NAME").map(|name| Landlord {
            name,
            address_line1: get("LANDLORD_ADDRESS1").unwrap_or_default(),
            address_line2: get("LANDLORD_ADDRESS2"),
            signature_text: get("LANDLORD_SIGNATURE"),
            signature_image_path: get("SIGNATURE_PATH"),
        });

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            db_path: get("DB_PATH")
                .unwrap_or_else(|| "./database/quittances.sqlite".to_string())
                .into(),
            receipts_dir: get("RECEIPTS_DIR")
                .unwrap_or_else(|| "./receipts".to_string())
                .into(),
            uploads_dir: get("UPLOADS_DIR")
                .unwrap_or_else(|| "./uploads".to_string())
                .into(),
            landlord,
        })
    }

    /// Creates the content directories and the database directory if missing.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        let db_dir = self
            .db_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(|dir| dir.to_path_buf());
        let dirs = [Some(self.receipts_dir.clone()), Some(self.uploads_dir.clone()), db_dir];
        for dir in dirs.into_iter().flatten() {
            std::fs::create_dir_all(&dir)
                .map_err(|source| ConfigError::Directory { path: dir, source })?;
        }
        Ok(())
    }
}
