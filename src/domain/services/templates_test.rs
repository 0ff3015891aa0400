use anyhow::Result;

use super::TemplateLibrary;
use crate::domain::models::OrchestratorError;
use crate::domain::models::ProjectKind;
use crate::domain::models::ProjectSpec;

fn package_json(files: &[crate::domain::models::GeneratedFile]) -> serde_json::Value {
    let file = files
        .iter()
        .find(|file| return file.path == "package.json")
        .unwrap();

    return serde_json::from_str(&file.content).unwrap();
}

#[test]
fn it_injects_the_project_name_and_description() -> Result<()> {
    let mut spec = ProjectSpec::new("storefront", ProjectKind::NextJs);
    spec.description = "An online store".to_string();

    let files = TemplateLibrary::render(ProjectKind::NextJs, &spec)?;
    let manifest = package_json(&files);

    assert_eq!(manifest["name"], "storefront");
    assert_eq!(manifest["description"], "An online store");

    return Ok(());
}

#[test]
fn it_replaces_name_placeholders_in_file_bodies() -> Result<()> {
    let spec = ProjectSpec::new("storefront", ProjectKind::Vite);
    let files = TemplateLibrary::render(ProjectKind::Vite, &spec)?;

    let index = files
        .iter()
        .find(|file| return file.path == "index.html")
        .unwrap();

    assert!(index.content.contains("storefront"));
    assert!(!index.content.contains("{project_name}"));

    return Ok(());
}

#[test]
fn it_adds_tailwind_dev_dependencies() -> Result<()> {
    let mut spec = ProjectSpec::new("app", ProjectKind::React);
    spec.tech_stack = vec!["tailwindcss".to_string()];

    let manifest = package_json(&TemplateLibrary::render(ProjectKind::React, &spec)?);

    assert_eq!(manifest["devDependencies"]["tailwindcss"], "^3.3.0");
    assert_eq!(manifest["devDependencies"]["autoprefixer"], "^10.4.16");
    assert_eq!(manifest["devDependencies"]["postcss"], "^8.4.31");

    return Ok(());
}

#[test]
fn it_adds_typescript_except_for_nextjs() -> Result<()> {
    let mut spec = ProjectSpec::new("app", ProjectKind::React);
    spec.tech_stack = vec!["typescript".to_string()];

    let react = package_json(&TemplateLibrary::render(ProjectKind::React, &spec)?);
    assert_eq!(react["devDependencies"]["typescript"], "^5.0.0");

    // Next.js templates already carry their own typescript pin.
    let mut next_spec = ProjectSpec::new("app", ProjectKind::NextJs);
    next_spec.tech_stack = vec!["typescript".to_string()];
    let next = package_json(&TemplateLibrary::render(ProjectKind::NextJs, &next_spec)?);
    assert_eq!(next["devDependencies"]["typescript"], "^5");

    return Ok(());
}

#[test]
fn it_renders_deterministically() -> Result<()> {
    let spec = ProjectSpec::new("app", ProjectKind::Express);

    let first = TemplateLibrary::render(ProjectKind::Express, &spec)?;
    let second = TemplateLibrary::render(ProjectKind::Express, &spec)?;

    assert_eq!(first, second);

    return Ok(());
}

#[test]
fn it_rejects_kinds_without_a_template() {
    let spec = ProjectSpec::new("api", ProjectKind::FastApi);
    let err = TemplateLibrary::render(ProjectKind::FastApi, &spec).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<OrchestratorError>(),
        Some(OrchestratorError::UnknownProjectKind(_))
    ));
    assert!(!TemplateLibrary::has_template(ProjectKind::FastApi));
}

#[test]
fn it_always_has_dev_and_build_scripts() -> Result<()> {
    for kind in TemplateLibrary::kinds() {
        let spec = ProjectSpec::new("app", kind);
        let manifest = package_json(&TemplateLibrary::render(kind, &spec)?);

        assert!(
            manifest["scripts"]["dev"].is_string(),
            "{kind} template is missing a dev script"
        );
    }

    return Ok(());
}
