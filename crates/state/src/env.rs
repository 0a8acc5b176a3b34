use anyhow::Result;
use std::path::PathBuf;

/// Primary source used when nothing else is configured.
pub const DEFAULT_SOURCE: &str = "github:skillforge/skills";

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|s| s == "1" || s.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Returns the user's home directory.
pub fn home_dir() -> Result<PathBuf> {
    #[cfg(unix)]
    if let Ok(home) = std::env::var("HOME") {
        return Ok(PathBuf::from(home));
    }
    dirs::home_dir().ok_or_else(|| anyhow::anyhow!("home directory not found"))
}

/// Directory holding global state: `SKILLFORGE_HOME`, else `~/.skillforge`.
pub fn skillforge_home() -> Result<PathBuf> {
    if let Some(custom) = non_empty_var("SKILLFORGE_HOME") {
        return Ok(PathBuf::from(custom));
    }
    Ok(home_dir()?.join(".skillforge"))
}

/// Path of the global config file.
pub fn global_config_path() -> Result<PathBuf> {
    Ok(skillforge_home()?.join("config.yaml"))
}

/// Primary source override from `SKILLFORGE_SOURCE`.
pub fn env_source() -> Option<String> {
    non_empty_var("SKILLFORGE_SOURCE")
}

/// Checks if `SKILLFORGE_EXPERT` is set to true.
pub fn env_expert_mode() -> bool {
    env_flag("SKILLFORGE_EXPERT")
}

/// Cache root: `SKILLFORGE_CACHE_DIR`, else the platform cache directory,
/// else `~/.cache`, each suffixed with `skillforge`.
pub fn cache_root() -> Result<PathBuf> {
    if let Some(custom) = non_empty_var("SKILLFORGE_CACHE_DIR") {
        return Ok(PathBuf::from(custom));
    }
    if let Some(platform) = dirs::cache_dir() {
        return Ok(platform.join("skillforge"));
    }
    Ok(home_dir()?.join(".cache/skillforge"))
}

/// Token for authenticated remote fetches.
///
/// `custom_env` (from project config `auth_token_env`) is checked first, then
/// `SKILLFORGE_AUTH_TOKEN`, then `GITHUB_TOKEN`.
pub fn auth_token(custom_env: Option<&str>) -> Option<String> {
    custom_env
        .and_then(non_empty_var)
        .or_else(|| non_empty_var("SKILLFORGE_AUTH_TOKEN"))
        .or_else(|| non_empty_var("GITHUB_TOKEN"))
}
