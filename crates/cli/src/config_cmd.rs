use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use stepline_runtime_config::{
    CONFIG_ENV_VAR, CONFIG_FILE_NAME, StepLineConfig, load_config, save_config,
};

/// `--config`, else `$STEPLINE_CONFIG`. `None` means built-in defaults.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    explicit.map(Path::to_path_buf).or_else(|| {
        std::env::var_os(CONFIG_ENV_VAR)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
    })
}

/// Effective configuration for a command.
pub fn load(explicit: Option<&Path>) -> Result<StepLineConfig> {
    match resolve_config_path(explicit) {
        Some(path) => Ok(load_config(&path)?),
        None => Ok(StepLineConfig::default()),
    }
}

pub fn show(explicit: Option<&Path>) -> Result<()> {
    let path = resolve_config_path(explicit);
    let config = load(explicit)?;
    match &path {
        Some(path) => println!("# Config file: {}", path.display()),
        None => println!("# Config file: (none, built-in defaults)"),
    }
    let rendered = toml::to_string_pretty(&config).context("Failed to serialize config")?;
    print!("{rendered}");
    Ok(())
}

pub fn init(explicit: Option<&Path>, force: bool) -> Result<()> {
    let path = resolve_config_path(explicit).unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    save_config(&path, &StepLineConfig::default())?;
    println!("Wrote {}", path.display());
    Ok(())
}
