//! Manages skillforge configuration.
//!
//! This crate provides utilities for:
//! - Reading environment variables (`SKILLFORGE_*`, auth tokens).
//! - Loading global (`~/.skillforge/config.yaml`) and project
//!   (`.skillforge/config.yaml`) configuration.
//! - Resolving the primary source and cache root with layered precedence.

pub mod config;
pub mod env;

pub use config::{
    load_settings, project_config_path, resolve_source_from, ConfigError, ExtraSource,
    ResolvedSource, Settings, SkillforgeConfig, SourceOrigin,
};
pub use env::{
    auth_token, cache_root, env_expert_mode, env_source, global_config_path, home_dir,
    skillforge_home, DEFAULT_SOURCE,
};
