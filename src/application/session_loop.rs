#[cfg(test)]
#[path = "session_loop_test.rs"]
mod tests;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::anyhow;
use anyhow::bail;
use anyhow::Result;
use chrono::Local;
use chrono::SecondsFormat;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;
use dialoguer::Input;
use dialoguer::Select;
use strum::IntoEnumIterator;
use yansi::Paint;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::help_text;
use crate::domain::models::BackendBox;
use crate::domain::models::BackendPrompt;
use crate::domain::models::CommitResult;
use crate::domain::models::GenerateOptions;
use crate::domain::models::GeneratedFile;
use crate::domain::models::MaterializationReport;
use crate::domain::models::ModelProfile;
use crate::domain::models::OrchestratorError;
use crate::domain::models::ProjectKind;
use crate::domain::models::ProjectSpec;
use crate::domain::models::SessionSnapshot;
use crate::domain::models::SessionState;
use crate::domain::models::TurnRecord;
use crate::domain::models::UserCommand;
use crate::domain::models::VramProbeBox;
use crate::domain::services::generator::read_project_files;
use crate::domain::services::generator::ChangeKind;
use crate::domain::services::BackgroundHandle;
use crate::domain::services::CapabilityProber;
use crate::domain::services::CodeGenerator;
use crate::domain::services::GitAutomator;
use crate::domain::services::Materializer;
use crate::domain::services::SessionSnapshots;
use crate::domain::services::Supervisor;

const HOST_TOOLS: [&str; 3] = ["node", "npm", "git"];
const TOOL_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

const BANNER: &str = r#"
+---------------------------------------------------------------+
|                       A U T O F O R G E                       |
|          Conversational coding agent for web projects         |
|           Build - Fix - Explain - Deploy - Iterate            |
+---------------------------------------------------------------+
"#;

const DEPLOY_GUIDE: &str = r#"
DEPLOYMENT GUIDE

1. Prepare:
   - The production build you just ran must succeed: npm run build
   - Smoke-test locally: npm start

2. Container setup:
   - Use a Node.js base image and copy the project in.
   - Expose the app port (default 3000) and set the startup command
     to npm start.
   - Wire a health check against / or /health.

3. Environment:
   - NODE_ENV=production
   - PORT=<your port>
   - Any app-specific variables.

4. Scaling:
   - Put the container behind your platform's load balancer and
     enable auto-scaling on CPU or request volume.
"#;

/// The interactive front end. Owns all session state, sequences every
/// component, and serializes external operations: one model call and one
/// foreground subprocess at a time.
pub struct SessionLoop {
    id: String,
    state: SessionState,
    backend: BackendBox,
    prober: CapabilityProber,
    snapshots: SessionSnapshots,
    profile: Option<ModelProfile>,
    spec: Option<ProjectSpec>,
    project_dir: Option<PathBuf>,
    history: Vec<TurnRecord>,
    dev_server: Option<BackgroundHandle>,
}

impl SessionLoop {
    pub fn new(backend: BackendBox, probe: VramProbeBox) -> SessionLoop {
        let mut id = Config::get(ConfigKey::SessionID);
        if id.is_empty() {
            id = SessionSnapshots::create_id();
        }

        return SessionLoop {
            id,
            state: SessionState::Initializing,
            backend,
            prober: CapabilityProber::new(probe),
            snapshots: SessionSnapshots::default(),
            profile: None,
            spec: None,
            project_dir: None,
            history: Vec::new(),
            dev_server: None,
        };
    }

    /// Drives the whole session. Only startup failures propagate out of
    /// here; every later failure is reported and the loop resumes.
    pub async fn run(&mut self) -> Result<()> {
        println!("{}", Paint::cyan(BANNER));

        self.initialize().await?;

        if self.select_project().await.is_err() {
            // Prompt interrupted, nothing was created yet.
            return Ok(());
        }

        self.create_project().await;
        self.command_loop().await;

        return Ok(());
    }

    /// Runs the capability probe and backend readiness check once per
    /// process. Failures here are fatal by design.
    async fn initialize(&mut self) -> Result<()> {
        self.set_state(SessionState::Initializing);

        let startup_wait = Duration::from_secs(Config::get_u64(ConfigKey::BackendStartupWait));
        if let Err(err) = self.backend.wait_until_ready(startup_wait).await {
            bail!(
                "model backend at {} did not become ready within {}s: {err}",
                Config::get(ConfigKey::BackendURL),
                startup_wait.as_secs()
            );
        }

        let cwd = PathBuf::from(".");
        let mut missing = vec![];
        for tool in HOST_TOOLS {
            let res = Supervisor::run(tool, &["--version"], &cwd, TOOL_CHECK_TIMEOUT).await;
            if !matches!(res, Ok(ref out) if out.success()) {
                missing.push(tool);
            }
        }
        if !missing.is_empty() {
            bail!("missing host dependencies: {}", missing.join(", "));
        }

        let models = self.backend.list_models().await?;
        let profile = self.prober.probe(&models).await?;
        Config::set(ConfigKey::Model, &profile.model);
        println!(
            "{}",
            Paint::green(format!("Using model: {}", profile.model))
        );
        self.profile = Some(profile);

        return Ok(());
    }

    /// Gathers the project spec interactively. An interrupted prompt
    /// surfaces as Err and ends the session cleanly.
    async fn select_project(&mut self) -> Result<()> {
        self.set_state(SessionState::SelectingProject);
        let theme = ColorfulTheme::default();

        println!("{}", Paint::blue("Let's create your project!").bold());

        let workspace = PathBuf::from(Config::get(ConfigKey::WorkspaceDir));
        let mut name;
        let mut target;
        loop {
            let raw: String = Input::with_theme(&theme)
                .with_prompt("Project name")
                .default("my-awesome-app".to_string())
                .interact_text()?;
            name = raw.trim().to_lowercase().replace(' ', "-");

            target = workspace.join(&name);
            if !target.exists() {
                break;
            }

            let reuse = Confirm::with_theme(&theme)
                .with_prompt(format!(
                    "{} already exists. Continue in it? Conflicting files will be kept as .new siblings.",
                    target.display()
                ))
                .default(false)
                .interact()?;
            if reuse {
                break;
            }
        }

        let kinds = ProjectKind::iter().collect::<Vec<ProjectKind>>();
        let kind_labels = kinds
            .iter()
            .map(|kind| return kind.to_string())
            .collect::<Vec<String>>();
        let kind_idx = Select::with_theme(&theme)
            .with_prompt("Project type")
            .items(&kind_labels)
            .default(0)
            .interact()?;
        let kind = kinds[kind_idx];

        let description: String = Input::with_theme(&theme)
            .with_prompt("Project description")
            .default(format!("A modern {kind} application"))
            .interact_text()?;

        let features_raw: String = Input::with_theme(&theme)
            .with_prompt("Key features (comma-separated)")
            .default("responsive design, modern UI".to_string())
            .interact_text()?;
        let features = split_list(&features_raw);

        let tech_raw: String = Input::with_theme(&theme)
            .with_prompt("Additional technologies (comma-separated)")
            .default("typescript".to_string())
            .interact_text()?;
        let tech_stack = split_list(&tech_raw);

        let setup_git = Confirm::with_theme(&theme)
            .with_prompt("Setup Git repository?")
            .default(true)
            .interact()?;

        let mut repo_url = None;
        if setup_git {
            let raw: String = Input::with_theme(&theme)
                .with_prompt("Remote repository URL (optional)")
                .allow_empty(true)
                .interact_text()?;
            if !raw.trim().is_empty() {
                repo_url = Some(raw.trim().to_string());
            }
        }

        let mut spec = ProjectSpec::new(&name, kind);
        spec.description = description.trim().to_string();
        spec.features = features;
        spec.tech_stack = tech_stack;
        spec.setup_git = setup_git;
        spec.repo_url = repo_url;
        spec.port = Config::get_u64(ConfigKey::DevServerPort) as u16;

        self.spec = Some(spec);
        self.project_dir = Some(target);

        return Ok(());
    }

    /// Initial generation turn: generate, materialize, install, commit.
    /// Failures are reported with what succeeded and the loop continues.
    async fn create_project(&mut self) {
        self.set_state(SessionState::Generating);

        let spec = self.spec.as_ref().unwrap().clone();
        let dir = self.project_dir.as_ref().unwrap().clone();

        if let Err(err) = tokio::fs::create_dir_all(&dir).await {
            self.report_failure("workspace setup", &err.into());
            return;
        }

        let outcome = match CodeGenerator::build(&self.backend, &spec).await {
            Ok(outcome) => outcome,
            Err(err) => {
                self.report_failure("project generation", &err);
                self.set_state(SessionState::AwaitingCommand);
                return;
            }
        };

        let report = Materializer::apply(&dir, &outcome.files, false).await;
        print_materialization(&report);

        if let Some(failed) = &outcome.failed_feature {
            println!(
                "{}",
                Paint::yellow(format!(
                    "Applied {applied} of {total} features; feature '{name}' failed: {reason}. Retry it later with: feature {name}",
                    applied = outcome.applied_features.len(),
                    total = spec.features.len(),
                    name = failed.feature,
                    reason = failed.reason,
                ))
            );
        }

        self.set_state(SessionState::Installing);
        println!("{}", Paint::yellow("Installing dependencies..."));
        let install_timeout = Duration::from_secs(Config::get_u64(ConfigKey::InstallTimeout));
        let install = Supervisor::check(
            "npm",
            &["install", "--legacy-peer-deps"],
            &dir,
            install_timeout,
        )
        .await;

        match install {
            Ok(_) => println!("{}", Paint::green("Dependencies installed.")),
            Err(err) => self.report_failure("dependency install", &err),
        }

        if spec.setup_git {
            let hint = format!("Initial commit for {}", spec.name);
            match GitAutomator::init_and_commit(&dir, Some(&hint), Some(&self.backend)).await {
                Ok(CommitResult::Committed { message }) => {
                    println!("{}", Paint::green(format!("Committed: {message}")));
                }
                Ok(CommitResult::NothingToCommit) => {}
                Err(err) => self.report_failure("version control", &err),
            }

            if let Some(url) = &spec.repo_url {
                if let Err(err) = GitAutomator::configure_remote(&dir, url).await {
                    tracing::warn!(error = ?err, "Remote configuration failed");
                    println!(
                        "{}",
                        Paint::yellow(format!("Remote setup failed (local commit kept): {err}"))
                    );
                }
            }
        }

        println!(
            "{}",
            Paint::green(format!(
                "Project '{}' is ready at {}",
                spec.name,
                dir.display()
            ))
            .bold()
        );

        self.record_turn("create", "project created").await;

        let start_server = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Start development server?")
            .default(true)
            .interact()
            .unwrap_or(false);
        if start_server {
            self.start_dev_server().await;
        }

        self.set_state(SessionState::AwaitingCommand);
    }

    async fn start_dev_server(&mut self) {
        let dir = self.project_dir.as_ref().unwrap().clone();
        let port = Config::get_u64(ConfigKey::DevServerPort);
        let ready_url = format!("http://127.0.0.1:{port}");
        let startup_timeout =
            Duration::from_secs(Config::get_u64(ConfigKey::DevServerStartupTimeout));

        println!("{}", Paint::yellow("Starting development server..."));
        match Supervisor::start_background("npm", &["run", "dev"], &dir, &ready_url, startup_timeout)
            .await
        {
            Ok(handle) => {
                println!(
                    "{}",
                    Paint::green(format!("Development server running at {ready_url}"))
                );
                self.dev_server = Some(handle);
            }
            Err(err) => self.report_failure("dev server startup", &err),
        }
    }

    /// The steady state: block for a command, dispatch it, return here.
    async fn command_loop(&mut self) {
        self.set_state(SessionState::AwaitingCommand);
        println!("\n{}", Paint::magenta(help_text()));

        loop {
            let line: String = match Input::with_theme(&ColorfulTheme::default())
                .with_prompt("autoforge")
                .allow_empty(true)
                .interact_text()
            {
                Ok(line) => line,
                Err(_) => break,
            };

            if line.trim().is_empty() {
                continue;
            }

            let command = match UserCommand::parse(&line) {
                Some(command) => command,
                None => {
                    println!(
                        "{}",
                        Paint::red("Unknown command. Type 'help' for the command list.")
                    );
                    continue;
                }
            };

            let outcome = match command.clone() {
                UserCommand::Feature(desc) => self.handle_change(&desc, ChangeKind::Feature).await,
                UserCommand::Fix(desc) => self.handle_change(&desc, ChangeKind::Fix).await,
                UserCommand::Explain(path) => self.handle_explain(path).await,
                UserCommand::Deploy => self.handle_deploy().await,
                UserCommand::Status => self.handle_status().await,
                UserCommand::Help => {
                    println!("{}", help_text());
                    Ok("help".to_string())
                }
                UserCommand::Quit => break,
            };

            let summary = match outcome {
                Ok(summary) => summary,
                Err(err) => {
                    let step = match command {
                        UserCommand::Feature(_) => "feature",
                        UserCommand::Fix(_) => "fix",
                        UserCommand::Explain(_) => "explain",
                        UserCommand::Deploy => "deploy",
                        _ => "command",
                    };
                    self.report_failure(step, &err);
                    format!("failed: {err}")
                }
            };

            self.record_turn(line.trim(), &summary).await;
            self.set_state(SessionState::AwaitingCommand);
        }

        self.shutdown().await;
    }

    /// feature/fix turns share one path: rebuild the baseline from disk,
    /// one model call, materialize. Fixes overwrite in place; features
    /// never clobber differing files.
    async fn handle_change(&mut self, description: &str, kind: ChangeKind) -> Result<String> {
        self.set_state(SessionState::Generating);

        let spec = self.spec.as_ref().unwrap().clone();
        let dir = self.require_project()?;

        let files = read_project_files(&dir)?;
        let changed =
            CodeGenerator::apply_change(&self.backend, &spec, &files, description, kind).await?;

        let batch = changed
            .iter()
            .map(|(path, content)| return GeneratedFile::from_model(path, content))
            .collect::<Vec<GeneratedFile>>();

        let force = kind == ChangeKind::Fix;
        let report = Materializer::apply(&dir, &batch, force).await;
        print_materialization(&report);

        if spec.setup_git && report.is_clean() && !report.written.is_empty() {
            match GitAutomator::init_and_commit(&dir, None, Some(&self.backend)).await {
                Ok(CommitResult::Committed { message }) => {
                    println!("{}", Paint::green(format!("Committed: {message}")));
                }
                Ok(CommitResult::NothingToCommit) => {}
                Err(err) => {
                    // Soft by design: the files are on disk either way.
                    println!("{}", Paint::yellow(format!("Commit failed: {err}")));
                }
            }
        }

        return Ok(format!("{} files written", report.written.len()));
    }

    async fn handle_explain(&mut self, path: Option<String>) -> Result<String> {
        self.set_state(SessionState::Explaining);

        let dir = self.require_project()?;
        let files = read_project_files(&dir)?;

        let target = match path {
            Some(path) => path,
            None => {
                let candidates = files
                    .keys()
                    .filter(|path| return is_code_file(path))
                    .cloned()
                    .collect::<Vec<String>>();
                if candidates.is_empty() {
                    bail!("no code files found in the project");
                }

                let idx = Select::with_theme(&ColorfulTheme::default())
                    .with_prompt("Which file should I explain?")
                    .items(&candidates)
                    .default(0)
                    .interact()?;
                candidates[idx].to_string()
            }
        };

        let content = files
            .get(&target)
            .ok_or_else(|| return anyhow!("no such project file: {target}"))?;

        let prompt = format!("Explain this file ({target}) in detail for someone learning the project:\n\n{content}");
        let explanation = self
            .backend
            .generate(
                BackendPrompt::new(
                    prompt,
                    "You are a senior developer explaining code to a newcomer.".to_string(),
                ),
                GenerateOptions::default(),
            )
            .await?;

        println!("\n{}", Paint::cyan(format!("--- {target} ---")).bold());
        println!("{explanation}\n");

        return Ok(format!("explained {target}"));
    }

    async fn handle_deploy(&mut self) -> Result<String> {
        self.set_state(SessionState::Deploying);

        let dir = self.require_project()?;
        let timeout = Duration::from_secs(Config::get_u64(ConfigKey::InstallTimeout));

        println!("{}", Paint::yellow("Running production build..."));
        Supervisor::check("npm", &["run", "build"], &dir, timeout).await?;
        println!("{}", Paint::green("Production build succeeded."));
        println!("{DEPLOY_GUIDE}");

        return Ok("production build succeeded".to_string());
    }

    async fn handle_status(&mut self) -> Result<String> {
        self.set_state(SessionState::ReportingStatus);

        let spec = self.spec.as_ref().unwrap();
        let dir = self.require_project()?;
        let file_count = read_project_files(&dir)?.len();

        let model = self
            .profile
            .as_ref()
            .map(|profile| return profile.model.to_string())
            .unwrap_or_default();

        let dev_server = match self.dev_server.as_mut() {
            Some(handle) => {
                if handle.is_running() {
                    "running"
                } else {
                    "exited"
                }
            }
            None => "stopped",
        };

        println!("{}", Paint::cyan("PROJECT STATUS").bold());
        println!("  Name:        {}", spec.name);
        println!("  Type:        {}", spec.kind);
        println!("  Description: {}", spec.description);
        println!("  Features:    {}", spec.features.join(", "));
        println!("  Tech stack:  {}", spec.tech_stack.join(", "));
        println!("  Location:    {}", dir.display());
        println!("  Files:       {file_count}");
        println!("  Model:       {model}");
        println!("  Dev server:  {dev_server}");

        return Ok("status reported".to_string());
    }

    /// Stops supervised children before the process exits so no dev server
    /// or installer outlives the session.
    pub async fn shutdown(&mut self) {
        if self.state == SessionState::Terminated {
            return;
        }
        self.set_state(SessionState::Terminated);

        if let Some(handle) = self.dev_server.take() {
            println!("{}", Paint::yellow("Stopping development server..."));
            if let Err(err) = handle.stop().await {
                tracing::warn!(error = ?err, "Failed to stop dev server");
            }
        }

        self.save_snapshot().await;
        println!("{}", Paint::cyan("Goodbye!"));
    }

    fn require_project(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.project_dir {
            if dir.exists() {
                return Ok(dir.clone());
            }
        }

        bail!("no active project");
    }

    fn set_state(&mut self, state: SessionState) {
        tracing::debug!(from = %self.state, to = %state, "Session transition");
        self.state = state;
    }

    /// Converts a failure into the structured report the user sees: the
    /// step, the cause category, and the verbatim output when a subprocess
    /// failed.
    fn report_failure(&self, step: &str, err: &anyhow::Error) {
        let category = err
            .downcast_ref::<OrchestratorError>()
            .map(|err| return err.category())
            .unwrap_or("internal");

        println!(
            "{}",
            Paint::red(format!("{step} failed [{category}]: {err}"))
        );

        if let Some(OrchestratorError::BuildOrInstallFailed { stderr, .. }) =
            err.downcast_ref::<OrchestratorError>()
        {
            if !stderr.trim().is_empty() {
                println!("{}", stderr.trim());
            }
        }
    }

    async fn record_turn(&mut self, command: &str, outcome: &str) {
        self.history.push(TurnRecord {
            command: command.to_string(),
            outcome: outcome.to_string(),
            timestamp: Local::now().to_rfc3339_opts(SecondsFormat::Secs, false),
        });

        self.save_snapshot().await;
    }

    async fn save_snapshot(&self) {
        let snapshot = SessionSnapshot {
            id: self.id.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Local::now().to_rfc3339_opts(SecondsFormat::Secs, false),
            model: Config::get(ConfigKey::Model),
            state: self.state,
            spec: self.spec.clone(),
            history: self.history.to_vec(),
        };

        if let Err(err) = self.snapshots.save(&snapshot).await {
            tracing::warn!(error = ?err, "Failed to save session snapshot");
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    return raw
        .split(',')
        .map(|entry| return entry.trim().to_string())
        .filter(|entry| return !entry.is_empty())
        .collect();
}

fn is_code_file(path: &str) -> bool {
    let extensions = [
        ".js", ".jsx", ".ts", ".tsx", ".py", ".html", ".css", ".json",
    ];
    return extensions.iter().any(|ext| return path.ends_with(ext));
}

fn print_materialization(report: &MaterializationReport) {
    println!(
        "{}",
        Paint::green(format!("{} files written", report.written.len()))
    );

    for (path, reason) in &report.failed {
        println!(
            "{}",
            Paint::red(format!("failed to write {}: {reason}", path.display()))
        );
    }
}
