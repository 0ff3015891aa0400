#[cfg(test)]
#[path = "project_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;
use strum::EnumIter;
use strum::EnumVariantNames;

/// Supported project scaffold categories. Template-backed kinds render a
/// baseline file set; the rest are synthesized entirely by the model.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, EnumIter, EnumVariantNames,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProjectKind {
    NextJs,
    React,
    Vite,
    Express,
    FastApi,
    Flask,
    Vanilla,
}

impl std::fmt::Display for ProjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let res = match self {
            ProjectKind::NextJs => "nextjs",
            ProjectKind::React => "react",
            ProjectKind::Vite => "vite",
            ProjectKind::Express => "express",
            ProjectKind::FastApi => "fastapi",
            ProjectKind::Flask => "flask",
            ProjectKind::Vanilla => "vanilla",
        };

        return write!(f, "{res}");
    }
}

impl ProjectKind {
    pub fn parse(text: &str) -> Option<ProjectKind> {
        let res = match text.trim().to_lowercase().as_str() {
            "nextjs" | "next" => ProjectKind::NextJs,
            "react" => ProjectKind::React,
            "vite" => ProjectKind::Vite,
            "express" => ProjectKind::Express,
            "fastapi" => ProjectKind::FastApi,
            "flask" => ProjectKind::Flask,
            "vanilla" => ProjectKind::Vanilla,
            _ => return None,
        };

        return Some(res);
    }
}

/// Resolved description of what to build. Immutable once a generation turn
/// begins.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProjectSpec {
    pub name: String,
    pub kind: ProjectKind,
    pub description: String,
    pub features: Vec<String>,
    pub tech_stack: Vec<String>,
    pub setup_git: bool,
    pub repo_url: Option<String>,
    pub port: u16,
}

impl ProjectSpec {
    pub fn new(name: &str, kind: ProjectKind) -> ProjectSpec {
        return ProjectSpec {
            name: name.to_string(),
            kind,
            description: format!("A modern {kind} application"),
            features: vec![],
            tech_stack: vec![],
            setup_git: true,
            repo_url: None,
            port: 3000,
        };
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileOrigin {
    Template,
    Model,
}

/// One generated file, addressed relative to the project root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
    pub origin: FileOrigin,
}

impl GeneratedFile {
    pub fn from_template(path: &str, content: &str) -> GeneratedFile {
        return GeneratedFile {
            path: path.to_string(),
            content: content.to_string(),
            origin: FileOrigin::Template,
        };
    }

    pub fn from_model(path: &str, content: &str) -> GeneratedFile {
        return GeneratedFile {
            path: path.to_string(),
            content: content.to_string(),
            origin: FileOrigin::Model,
        };
    }
}
