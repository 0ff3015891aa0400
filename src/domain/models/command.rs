#[cfg(test)]
#[path = "command_test.rs"]
mod tests;

/// Commands accepted at the interactive prompt once a project exists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserCommand {
    Feature(String),
    Fix(String),
    Explain(Option<String>),
    Deploy,
    Status,
    Help,
    Quit,
}

impl UserCommand {
    pub fn parse(text: &str) -> Option<UserCommand> {
        let trimmed = text.trim();
        let mut parts = trimmed.splitn(2, ' ');
        let verb = parts.next().unwrap_or_default().to_lowercase();
        let rest = parts.next().unwrap_or_default().trim().to_string();

        let res = match verb.as_str() {
            "feature" | "add" => {
                if rest.is_empty() {
                    return None;
                }
                UserCommand::Feature(rest)
            }
            "fix" => {
                if rest.is_empty() {
                    return None;
                }
                UserCommand::Fix(rest)
            }
            "explain" => {
                if rest.is_empty() {
                    UserCommand::Explain(None)
                } else {
                    UserCommand::Explain(Some(rest))
                }
            }
            "deploy" => UserCommand::Deploy,
            "status" => UserCommand::Status,
            "help" | "?" => UserCommand::Help,
            "exit" | "quit" | "q" => UserCommand::Quit,
            _ => return None,
        };

        return Some(res);
    }
}

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- feature <description> - Generate and apply a new feature to the project.
- fix <description> - Fix an issue. Existing files are overwritten in place.
- explain [path] - Explain a project file. Omit the path to pick from a list.
- deploy - Run a production build and print deployment guidance.
- status - Show the current project summary.
- help (?) - Show this help.
- exit / quit (q) - Stop the dev server and leave.
    "#;

    return text.trim().to_string();
}
