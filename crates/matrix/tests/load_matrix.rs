use skillforge_matrix::{load_matrix, validate_selection, IssueKind, MatrixError};
use skillforge_test_utils::TestFixture;

const MATRIX: &str = r#"
version: "1.0.0"
categories:
  framework: { display_name: Framework, exclusive: true, required: true, order: 1 }
  state: { display_name: State, order: 2 }
relationships:
  conflicts:
    - skills: [react, vue]
      reason: Pick one UI framework
  recommends:
    - when: react
      suggest: [zustand]
      reason: Lightweight state
  requires:
    - skill: zustand
      needs: [react, vue]
      needs_any: true
      reason: Needs a UI framework
skill_aliases:
  react: web-framework-react
  vue: web-framework-vue
  zustand: web-state-zustand
"#;

fn fixture() -> TestFixture {
    let fx = TestFixture::new().unwrap();
    fx.create_skill("web-framework-react", "framework", "React").unwrap();
    fx.create_skill("web-framework-vue", "framework", "Vue").unwrap();
    fx.create_skill("web-state-zustand", "state", "Zustand").unwrap();
    fx.write_matrix(MATRIX).unwrap();
    fx
}

#[test]
fn loads_config_and_content_into_one_matrix() {
    let fx = fixture();
    let built = load_matrix(&fx.content.join("skills-matrix.yaml"), &[fx.skills.as_path()]).unwrap();
    assert!(built.warnings.is_empty(), "{:?}", built.warnings);

    let matrix = built.matrix;
    assert_eq!(matrix.skills().len(), 3);
    let react = matrix.skill("web-framework-react").unwrap();
    assert!(react.category_exclusive);
    assert_eq!(react.conflicts_with[0].skill_id, "web-framework-vue");
    assert_eq!(matrix.label("web-framework-react"), "react");

    let report = validate_selection(&["react".to_string(), "vue".to_string()], &matrix);
    let kinds: Vec<_> = report.errors.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![IssueKind::Conflict, IssueKind::CategoryExclusive]);
}

#[test]
fn later_content_dirs_override_earlier_ones() {
    let fx = fixture();
    let local = fx.tempdir.path().join("local-skills");
    skillforge_test_utils::write_file(
        &local,
        "react/SKILL.md",
        "---\nname: web-framework-react\ndescription: Team React\n---\n",
    )
    .unwrap();
    skillforge_test_utils::write_file(&local, "react/metadata.yaml", "category: framework\nlocal: true\n")
        .unwrap();

    let built = load_matrix(
        &fx.content.join("skills-matrix.yaml"),
        &[fx.skills.as_path(), local.as_path()],
    )
    .unwrap();
    let react = built.matrix.skill("web-framework-react").unwrap();
    assert!(react.local);
    assert_eq!(react.description, "Team React");
}

#[test]
fn invalid_config_names_the_file() {
    let fx = TestFixture::new().unwrap();
    let path = fx
        .write_matrix("relationships:\n  conflicts:\n    - skills: [solo]\n")
        .unwrap();
    let err = load_matrix(&path, &[]).unwrap_err();
    assert!(matches!(err, MatrixError::Invalid { .. }));
    assert!(err.to_string().contains("skills-matrix.yaml"));
}
