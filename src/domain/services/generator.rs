#[cfg(test)]
#[path = "generator_test.rs"]
mod tests;

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::Path;

use anyhow::Context;
use anyhow::Result;

use super::templates::TemplateLibrary;
use crate::domain::models::extract_json_object;
use crate::domain::models::BackendBox;
use crate::domain::models::BackendPrompt;
use crate::domain::models::FeatureFailure;
use crate::domain::models::GenerateOptions;
use crate::domain::models::GeneratedFile;
use crate::domain::models::GenerationOutcome;
use crate::domain::models::OrchestratorError;
use crate::domain::models::ProjectSpec;

const MAX_PROMPT_FILE_BYTES: usize = 16 * 1024;
const SKIPPED_DIRS: [&str; 6] = ["node_modules", ".git", "dist", "build", ".next", "coverage"];

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Feature,
    Fix,
}

/// Turns a ProjectSpec into a concrete file batch: template baseline when
/// one exists, then an explicit fold over the feature list where each step
/// prompts the model with the accumulated files. Full-file replacement is
/// the merge policy; the model returns a JSON object of path to content.
pub struct CodeGenerator {}

impl CodeGenerator {
    pub async fn build(backend: &BackendBox, spec: &ProjectSpec) -> Result<GenerationOutcome> {
        let mut files: BTreeMap<String, String>;
        let mut model_paths = BTreeSet::new();

        if TemplateLibrary::has_template(spec.kind) {
            files = TemplateLibrary::render(spec.kind, spec)?
                .into_iter()
                .map(|file| return (file.path, file.content))
                .collect();
        } else {
            files = CodeGenerator::synthesize(backend, spec).await?;
            model_paths.extend(files.keys().cloned());
        }

        let mut outcome = GenerationOutcome::default();

        for feature in &spec.features {
            let res =
                CodeGenerator::apply_change(backend, spec, &files, feature, ChangeKind::Feature)
                    .await;

            match res {
                Ok(changed) => {
                    model_paths.extend(changed.keys().cloned());
                    files.extend(changed);
                    outcome.applied_features.push(feature.to_string());
                }
                Err(err) => {
                    tracing::warn!(feature = feature, error = ?err, "Feature application failed");
                    outcome.failed_feature = Some(FeatureFailure {
                        feature: feature.to_string(),
                        reason: err.to_string(),
                    });
                    break;
                }
            }
        }

        outcome.files = files
            .into_iter()
            .map(|(path, content)| {
                if model_paths.contains(&path) {
                    return GeneratedFile::from_model(&path, &content);
                }
                return GeneratedFile::from_template(&path, &content);
            })
            .collect();

        return Ok(outcome);
    }

    /// One model call for one feature or fix against the current file set.
    /// Returns only the files the model changed or added.
    pub async fn apply_change(
        backend: &BackendBox,
        spec: &ProjectSpec,
        files: &BTreeMap<String, String>,
        description: &str,
        kind: ChangeKind,
    ) -> Result<BTreeMap<String, String>> {
        let system = match kind {
            ChangeKind::Feature => {
                "You are a senior developer. Add the requested feature to the existing project. \
                 Respond with only a JSON object mapping file paths to complete updated file \
                 contents. Include only files you change or add, and maintain consistency with \
                 the existing project structure."
            }
            ChangeKind::Fix => {
                "You are a senior developer. Fix the described issue in the project. Respond \
                 with only a JSON object mapping file paths to complete fixed file contents. \
                 Include only files you change."
            }
        };

        let verb = match kind {
            ChangeKind::Feature => "Add this feature to the project",
            ChangeKind::Fix => "Fix this issue",
        };

        let prompt = format!(
            "{verb}: {description}\n\nProject: {name} ({project_kind})\nDescription: {project_description}\n\nCurrent files:\n{file_dump}",
            name = spec.name,
            project_kind = spec.kind,
            project_description = spec.description,
            file_dump = render_files_for_prompt(files),
        );

        let reply = backend
            .generate(
                BackendPrompt::new(prompt, system.to_string()),
                GenerateOptions {
                    temperature: Some(0.7),
                    ..Default::default()
                },
            )
            .await?;

        // Transport failures keep their backend type; an unusable reply is
        // a generation failure.
        return parse_file_map(&reply).map_err(|err| {
            return anyhow::Error::from(OrchestratorError::GenerationFailure {
                feature: description.to_string(),
                reason: err.to_string(),
            });
        });
    }

    /// Whole-project synthesis for kinds without a template.
    async fn synthesize(backend: &BackendBox, spec: &ProjectSpec) -> Result<BTreeMap<String, String>> {
        let system = "You are a senior full-stack developer. Create a complete, runnable \
                      project. Respond with only a JSON object mapping file paths to complete \
                      file contents. Include a dependency manifest appropriate for the project \
                      kind.";

        let prompt = format!(
            "Create a {kind} project named {name}.\nDescription: {description}\nTech stack: {stack}",
            kind = spec.kind,
            name = spec.name,
            description = spec.description,
            stack = spec.tech_stack.join(", "),
        );

        let reply = backend
            .generate(
                BackendPrompt::new(prompt, system.to_string()),
                GenerateOptions {
                    temperature: Some(0.7),
                    ..Default::default()
                },
            )
            .await?;

        return parse_file_map(&reply).context("project synthesis returned no usable files");
    }
}

fn render_files_for_prompt(files: &BTreeMap<String, String>) -> String {
    return files
        .iter()
        .map(|(path, content)| {
            if content.len() > MAX_PROMPT_FILE_BYTES {
                return format!("--- {path} ---\n[omitted, {} bytes]", content.len());
            }
            return format!("--- {path} ---\n{content}");
        })
        .collect::<Vec<String>>()
        .join("\n\n");
}

/// Parses the model's `path -> content` object, tolerating markdown fences
/// and skipping non-string values rather than failing the whole turn.
fn parse_file_map(reply: &str) -> Result<BTreeMap<String, String>> {
    let json = extract_json_object(reply)?;
    let value: serde_json::Value =
        serde_json::from_str(json).context("model reply was not valid JSON")?;

    let object = value
        .as_object()
        .context("model reply was not a JSON object")?;

    let mut res = BTreeMap::new();
    for (path, content) in object {
        if let Some(text) = content.as_str() {
            if path.starts_with('/') || path.contains("..") {
                tracing::warn!(path = path, "Skipping file outside the project root");
                continue;
            }
            res.insert(path.to_string(), text.to_string());
        } else {
            tracing::warn!(path = path, "Skipping non-string file entry in model reply");
        }
    }

    if res.is_empty() {
        anyhow::bail!("model reply contained no files");
    }

    return Ok(res);
}

/// Reads the current on-disk file set for follow-up turns, skipping
/// dependency and build output directories and oversized files.
pub fn read_project_files(root: &Path) -> Result<BTreeMap<String, String>> {
    let mut res = BTreeMap::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();

            if path.is_dir() {
                if !SKIPPED_DIRS.contains(&name.as_str()) {
                    stack.push(path);
                }
                continue;
            }

            if name == "package-lock.json" || name.starts_with('.') {
                continue;
            }

            let metadata = entry.metadata()?;
            if metadata.len() as usize > MAX_PROMPT_FILE_BYTES {
                continue;
            }

            if let Ok(content) = std::fs::read_to_string(&path) {
                let relative = path
                    .strip_prefix(root)
                    .unwrap_or(&path)
                    .to_string_lossy()
                    .to_string();
                res.insert(relative, content);
            }
        }
    }

    return Ok(res);
}
