use std::path::{Path, PathBuf};

use clap::ValueEnum;
use repo_slice::{ArchiveFormat, ProviderKind};
use repo_slice_forge::ForgeOptions;
use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Used when neither `--token` nor the provider's environment variable is set.
    pub token: Option<String>,
    pub github_api_base: Option<String>,
    pub gitlab_api_base: Option<String>,
    #[serde(default)]
    pub export: ExportSettings,
}

/// Defaults for `repo-slice export`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ExportSettings {
    pub format: Option<OutputFormat>,
    pub concurrency: Option<usize>,
}

/// What `export` produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// One annotated text document
    #[default]
    Text,
    /// Zip archive
    Zip,
    /// Gzip-compressed tarball
    TarGz,
}

impl OutputFormat {
    /// The archive container, or `None` for text output.
    pub fn archive(self) -> Option<ArchiveFormat> {
        match self {
            Self::Text => None,
            Self::Zip => Some(ArchiveFormat::Zip),
            Self::TarGz => Some(ArchiveFormat::TarGz),
        }
    }
}

impl AppConfig {
    /// Provider settings for a run authenticated with `token`.
    pub fn forge_options(&self, token: Option<String>) -> ForgeOptions {
        ForgeOptions {
            token,
            github_api_base: self.github_api_base.clone(),
            gitlab_api_base: self.gitlab_api_base.clone(),
        }
    }
}

/// Environment variable holding the token for `provider`.
pub fn token_env_var(provider: ProviderKind) -> &'static str {
    match provider {
        ProviderKind::GitHub => "GITHUB_TOKEN",
        ProviderKind::GitLab => "GITLAB_TOKEN",
    }
}

/// Pick the access token: the flag, then the provider's environment
/// variable, then the config file. Empty values count as unset.
pub fn resolve_token(
    flag: Option<String>,
    provider: ProviderKind,
    config: &AppConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Option<String> {
    let present = |token: Option<String>| token.filter(|t| !t.trim().is_empty());
    present(flag)
        .or_else(|| present(env(token_env_var(provider))))
        .or_else(|| present(config.token.clone()))
}

/// Config file path: `~/.config/repo-slice/config.toml`
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("repo-slice").join("config.toml"))
}

/// Load config from file, falling back to defaults if missing.
pub fn load_config() -> AppConfig {
    match config_path() {
        Some(path) => load_from(&path),
        None => AppConfig::default(),
    }
}

/// Load config from `path`. A missing file gives defaults silently; an
/// unparsable one gives defaults with a warning.
pub fn load_from(path: &Path) -> AppConfig {
    let Ok(contents) = std::fs::read_to_string(path) else {
        return AppConfig::default();
    };

    match toml::from_str::<AppConfig>(&contents) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to parse config, using defaults"
            );
            AppConfig::default()
        }
    }
}
