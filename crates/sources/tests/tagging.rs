use skillforge_matrix::{MatrixBuilder, Skill, SourceType};
use skillforge_sources::{
    load_skills_from_all_sources, FsPluginRegistry, ProviderHosts, SourceCache, SourceFetcher,
    TaggingContext,
};
use skillforge_state::ExtraSource;
use skillforge_test_utils::{write_file, TestFixture};
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// In-memory log sink for asserting on emitted events.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn warnings(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes)
            .lines()
            .filter(|line| line.contains("WARN"))
            .map(str::to_string)
            .collect()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn unreachable_extra_source_is_skipped_and_others_are_tagged() {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fx = TestFixture::new().unwrap();
    fx.install_plugin("web", &["react"]).unwrap();
    let team = fx.tempdir.path().join("team-skills");
    write_file(
        &team,
        "vue/SKILL.md",
        "---\nname: vue\ndescription: Team Vue\n---\n",
    )
    .unwrap();
    write_file(&team, "vue/metadata.yaml", "version: 2.1.0\n").unwrap();

    let matrix = MatrixBuilder::new()
        .skill(Skill::new("react", "framework"))
        .skill(Skill::new("vue", "framework"))
        .build()
        .matrix;

    let extra = vec![
        ExtraSource {
            name: "acme".into(),
            url: "github:acme/skills".into(),
        },
        ExtraSource {
            name: "team".into(),
            url: team.to_string_lossy().into_owned(),
        },
    ];
    let fetcher = SourceFetcher::new(SourceCache::new(&fx.cache)).with_hosts(ProviderHosts::all(server.uri()));
    let ctx = TaggingContext {
        fetcher: &fetcher,
        registry: &FsPluginRegistry,
        project_dir: &fx.project,
        marketplace_name: "skillforge".into(),
        marketplace_url: Some("github:skillforge/skills".into()),
        extra_sources: &extra,
    };

    let tagged = load_skills_from_all_sources(matrix, &ctx).await;

    assert_eq!(tagged.skipped.len(), 1);
    assert_eq!(tagged.skipped[0].name, "acme");
    assert!(tagged.skipped[0].error.contains("acme"));
    let acme_warnings: Vec<_> = logs
        .warnings()
        .into_iter()
        .filter(|line| line.contains("acme"))
        .collect();
    assert_eq!(acme_warnings.len(), 1, "{acme_warnings:?}");
    assert!(acme_warnings[0].contains("skipping extra source 'acme'"));

    let react = tagged.matrix.skill("react").unwrap();
    assert_eq!(react.available_sources.len(), 1);
    assert!(react.active_source.as_ref().unwrap().installed);

    let vue = tagged.matrix.skill("vue").unwrap();
    let kinds: Vec<_> = vue.available_sources.iter().map(|e| e.source_type).collect();
    assert_eq!(kinds, vec![SourceType::Public, SourceType::Private]);
    assert_eq!(vue.available_sources[1].name, "team");
    assert_eq!(vue.available_sources[1].version.as_deref(), Some("2.1.0"));
    assert_eq!(vue.active_source.as_ref().unwrap().source_type, SourceType::Public);
}
