use super::FileOrigin;
use super::GeneratedFile;
use super::ProjectKind;
use super::ProjectSpec;

#[test]
fn it_parses_project_kinds() {
    assert_eq!(ProjectKind::parse("nextjs"), Some(ProjectKind::NextJs));
    assert_eq!(ProjectKind::parse("next"), Some(ProjectKind::NextJs));
    assert_eq!(ProjectKind::parse(" React "), Some(ProjectKind::React));
    assert_eq!(ProjectKind::parse("FASTAPI"), Some(ProjectKind::FastApi));
    assert_eq!(ProjectKind::parse("cobol"), None);
}

#[test]
fn it_displays_project_kinds() {
    assert_eq!(ProjectKind::NextJs.to_string(), "nextjs");
    assert_eq!(ProjectKind::Vanilla.to_string(), "vanilla");
}

#[test]
fn it_creates_specs_with_defaults() {
    let spec = ProjectSpec::new("shop", ProjectKind::Vite);

    assert_eq!(spec.name, "shop");
    assert_eq!(spec.kind, ProjectKind::Vite);
    assert_eq!(spec.description, "A modern vite application");
    assert!(spec.features.is_empty());
    assert!(spec.setup_git);
    assert_eq!(spec.repo_url, None);
    assert_eq!(spec.port, 3000);
}

#[test]
fn it_tags_file_origins() {
    let template = GeneratedFile::from_template("package.json", "{}");
    let model = GeneratedFile::from_model("src/app.js", "console.log(1);");

    assert_eq!(template.origin, FileOrigin::Template);
    assert_eq!(model.origin, FileOrigin::Model);
    assert_eq!(model.path, "src/app.js");
}
