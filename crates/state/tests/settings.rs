use skillforge_state::{load_settings, ConfigError, SourceOrigin};
use skillforge_test_utils::{env_guard, set_env_var, write_file, TestFixture};

#[test]
fn project_config_feeds_settings() {
    let _g = env_guard();
    let fx = TestFixture::new().unwrap();
    let _home = set_env_var("SKILLFORGE_HOME", Some(&fx.home_path().join(".sf").to_string_lossy()));
    let _src = set_env_var("SKILLFORGE_SOURCE", None);
    let _cache = set_env_var("SKILLFORGE_CACHE_DIR", Some(&fx.cache.to_string_lossy()));
    let _tok = set_env_var("SKILLFORGE_AUTH_TOKEN", None);
    let _gh = set_env_var("GITHUB_TOKEN", None);

    fx.write_project_config(
        "source: ./skills\nsources:\n  - name: acme\n    url: github:acme/skills\n",
    )
    .unwrap();

    let settings = load_settings(&fx.project, None).unwrap();
    assert_eq!(settings.source.source, "./skills");
    assert_eq!(settings.source.origin, SourceOrigin::Project);
    assert_eq!(settings.marketplace, "./skills");
    assert_eq!(settings.extra_sources.len(), 1);
    assert_eq!(settings.extra_sources[0].name, "acme");
    assert_eq!(settings.cache_root, fx.cache);
    assert!(settings.auth_token.is_none());
}

#[test]
fn env_overrides_project_and_global_supplies_marketplace() {
    let _g = env_guard();
    let fx = TestFixture::new().unwrap();
    let sf_home = fx.home_path().join(".sf");
    let _home = set_env_var("SKILLFORGE_HOME", Some(&sf_home.to_string_lossy()));
    let _src = set_env_var("SKILLFORGE_SOURCE", Some("gh:team/skills"));

    write_file(&sf_home, "config.yaml", "marketplace: github:skillforge/market\n").unwrap();
    fx.write_project_config("source: ./skills\n").unwrap();

    let settings = load_settings(&fx.project, None).unwrap();
    assert_eq!(settings.source.origin, SourceOrigin::Env);
    assert_eq!(settings.marketplace, "github:skillforge/market");

    let flagged = load_settings(&fx.project, Some("/abs/skills")).unwrap();
    assert_eq!(flagged.source.origin, SourceOrigin::Flag);
}

#[test]
fn malformed_project_config_names_the_file() {
    let _g = env_guard();
    let fx = TestFixture::new().unwrap();
    let _home = set_env_var("SKILLFORGE_HOME", Some(&fx.home_path().join(".sf").to_string_lossy()));
    fx.write_project_config("sources: {not: a list}\n").unwrap();

    let err = load_settings(&fx.project, None).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains(".skillforge"));
}
