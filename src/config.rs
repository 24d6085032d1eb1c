use serde::{Deserialize, Serialize};
use crate::program::ProgramType;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub session: SessionConfig,
    pub drafts: DraftConfig,
    pub repository: RepositoryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionConfig {
    /// Identity of the acting user (creator for sponsor views, applicant for builder views)
    pub user_id: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DraftConfig {
    pub path: String,
    pub key: String,
    pub autosave: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RepositoryConfig {
    pub fixture_path: String,
    pub page_size: usize,
    /// Only list programs of this type when computing reclaims
    #[serde(default)]
    pub program_type: Option<ProgramType>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session: SessionConfig {
                user_id: String::new(),
            },
            drafts: DraftConfig {
                path: "drafts.db".to_string(),
                key: "program-draft".to_string(),
                autosave: true,
            },
            repository: RepositoryConfig {
                fixture_path: "programs.json".to_string(),
                page_size: 50,
                program_type: None,
            },
            logging: LoggingConfig {
                filter: "grant_wizard=debug,info".to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration from defaults, an optional TOML file and `GRANT__*` env vars
    pub fn load(path: &str) -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let defaults = Self::default();

        let config = config::Config::builder()
            .set_default("session.user_id", defaults.session.user_id)?
            .set_default("drafts.path", defaults.drafts.path)?
            .set_default("drafts.key", defaults.drafts.key)?
            .set_default("drafts.autosave", defaults.drafts.autosave)?
            .set_default("repository.fixture_path", defaults.repository.fixture_path)?
            .set_default("repository.page_size", defaults.repository.page_size as i64)?
            .set_default("logging.filter", defaults.logging.filter)?
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("GRANT").separator("__"))
            .build()?;

        let loaded: Self = config.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.repository.page_size == 0 {
            anyhow::bail!("repository.page_size must be greater than zero");
        }
        if self.drafts.key.trim().is_empty() {
            anyhow::bail!("drafts.key must not be empty");
        }
        Ok(())
    }

    /// Acting user, required by reclaim commands
    pub fn user_id(&self) -> anyhow::Result<&str> {
        let user_id = self.session.user_id.trim();
        if user_id.is_empty() {
            anyhow::bail!("session.user_id is not configured (set GRANT__SESSION__USER_ID)");
        }
        Ok(user_id)
    }

    /// Render as a TOML template for `init`
    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grant-wizard.toml");
        std::fs::write(
            &path,
            "[session]\nuser_id = \"alice\"\n\n[repository]\npage_size = 10\n",
        )
        .unwrap();

        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.user_id().unwrap(), "alice");
        assert_eq!(config.repository.page_size, 10);
        assert_eq!(config.drafts.key, "program-draft");
    }

    #[test]
    fn test_missing_user_id_is_rejected() {
        let config = Config::default();
        assert!(config.user_id().is_err());
    }

    #[test]
    fn test_zero_page_size_is_invalid() {
        let mut config = Config::default();
        config.repository.page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_template_round_trips() {
        let rendered = Config::default().to_toml().unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.drafts.path, "drafts.db");
        assert_eq!(parsed.repository.program_type, None);
    }

    #[test]
    fn test_program_type_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grant-wizard.toml");
        std::fs::write(&path, "[repository]\nprogram_type = \"funding\"\n").unwrap();

        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.repository.program_type, Some(ProgramType::Funding));
    }
}
