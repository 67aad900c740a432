use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized, Toml},
};
use std::fs;
use std::path::Path;
use toon_application::error::{AppError, AppResult};
use toon_application::infrastructure_config::Config;
use tracing::info;

const ENV_PREFIX: &str = "TOON_";

pub fn load_config() -> AppResult<Config> {
    generate_env_template_if_missing()?;
    read_config()
}

/// Defaults, then `config.toml`, `config.json` and `TOON_*` variables, with
/// `__` separating nested keys (`TOON_WORKERS__ISOLATION=process`).
pub fn read_config() -> AppResult<Config> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    if Path::new("config.toml").exists() {
        figment = figment.merge(Toml::file("config.toml"));
    }

    if Path::new("config.json").exists() {
        figment = figment.merge(Json::file("config.json"));
    }

    extract_config(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
}

fn extract_config(figment: Figment) -> AppResult<Config> {
    let config: Config = figment.extract().map_err(|e| AppError::ConfigError {
        message: format!("Failed to load configuration: {e}"),
    })?;

    config.validate()?;
    Ok(config)
}

fn generate_env_template_if_missing() -> AppResult<()> {
    let env_file = ".env";
    let template_file = ".env.example";

    if Path::new(env_file).exists() {
        return Ok(());
    }

    if !Path::new(template_file).exists() {
        return Ok(());
    }

    fs::copy(template_file, env_file).map_err(|e| AppError::ConfigError {
        message: format!("Failed to generate .env file from template: {e}"),
    })?;

    info!("Generated .env from template.");

    Ok(())
}
