use config::{
    builder::DefaultState, Config as Cfg, ConfigBuilder, ConfigError, Environment, File,
    FileFormat,
};
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Generator location used when no settings file overrides it, relative to
/// the working directory.
pub const DEFAULT_SOLACON_PATH: &str = "../solacon.sh";

/// Optional INI file holding generator overrides.
pub const DEFAULT_SETTINGS_FILE: &str = "../solacon.ini";

#[derive(Debug, Clone, Deserialize)]
pub struct SolaconConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub generator: GeneratorConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorConfig {
    pub solacon_path: PathBuf,
    #[serde(default)]
    pub failure_mode: FailureMode,
    #[serde(default)]
    pub command_timeout_secs: Option<u64>,
}

/// What the icon endpoint returns when generation does not produce a file.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FailureMode {
    /// Empty 200 response, whatever went wrong.
    #[default]
    Fallthrough,
    /// 400 for rejected parameters, 503 for a missing generator, 502 otherwise.
    Strict,
}

impl std::str::FromStr for FailureMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fallthrough" => Ok(FailureMode::Fallthrough),
            "strict" => Ok(FailureMode::Strict),
            _ => Err(format!("Invalid failure mode: {}", s)),
        }
    }
}

impl SolaconConfig {
    pub fn load() -> Result<Self, AppError> {
        // Handles .env and the APP__ prefix
        let common = core_config::Config::load()?;

        let settings_file = env::var("SOLACON_SETTINGS_FILE")
            .unwrap_or_else(|_| DEFAULT_SETTINGS_FILE.to_string());
        let default_path = default_solacon_path()?;

        Ok(SolaconConfig {
            common,
            generator: GeneratorConfig::load(Path::new(&settings_file), &default_path)?,
        })
    }
}

impl GeneratorConfig {
    /// Layer defaults, the settings file and `SOLACON__*` variables.
    ///
    /// A settings file that exists but does not parse is skipped, and the
    /// remaining sources are used as if it were absent.
    pub fn load(settings_file: &Path, default_path: &Path) -> Result<Self, AppError> {
        let with_file = builder(default_path, Some(settings_file))
            .and_then(|b| b.build())
            .and_then(|c| c.try_deserialize::<GeneratorConfig>());

        match with_file {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!(
                    settings_file = ?settings_file,
                    error = %e,
                    "Ignoring unreadable generator settings file"
                );
                let config = builder(default_path, None)?.build()?;
                Ok(config.try_deserialize()?)
            }
        }
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }
}

fn builder(
    default_path: &Path,
    settings_file: Option<&Path>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let mut builder = Cfg::builder()
        .set_default("solacon_path", default_path.to_string_lossy().to_string())?
        .set_default("failure_mode", "fallthrough")?;

    if let Some(file) = settings_file {
        builder = builder.add_source(
            File::from(file.to_path_buf())
                .format(FileFormat::Ini)
                .required(false),
        );
    }

    Ok(builder.add_source(Environment::with_prefix("SOLACON").separator("__")))
}

/// `DEFAULT_SOLACON_PATH` against the working directory, canonicalised when
/// the file is there.
pub fn default_solacon_path() -> Result<PathBuf, AppError> {
    let joined = env::current_dir()?.join(DEFAULT_SOLACON_PATH);
    Ok(std::fs::canonicalize(&joined).unwrap_or(joined))
}
