use super::help_text;
use super::UserCommand;

#[test]
fn it_parses_feature_commands() {
    let res = UserCommand::parse("feature dark mode toggle");
    assert_eq!(
        res,
        Some(UserCommand::Feature("dark mode toggle".to_string()))
    );

    let alias = UserCommand::parse("add contact form");
    assert_eq!(alias, Some(UserCommand::Feature("contact form".to_string())));
}

#[test]
fn it_rejects_feature_without_a_description() {
    assert_eq!(UserCommand::parse("feature"), None);
    assert_eq!(UserCommand::parse("fix   "), None);
}

#[test]
fn it_parses_fix_commands() {
    let res = UserCommand::parse("fix the navbar overlaps the footer");
    assert_eq!(
        res,
        Some(UserCommand::Fix(
            "the navbar overlaps the footer".to_string()
        ))
    );
}

#[test]
fn it_parses_explain_with_and_without_a_path() {
    assert_eq!(
        UserCommand::parse("explain src/App.js"),
        Some(UserCommand::Explain(Some("src/App.js".to_string())))
    );
    assert_eq!(UserCommand::parse("explain"), Some(UserCommand::Explain(None)));
}

#[test]
fn it_parses_bare_verbs() {
    assert_eq!(UserCommand::parse("deploy"), Some(UserCommand::Deploy));
    assert_eq!(UserCommand::parse("status"), Some(UserCommand::Status));
    assert_eq!(UserCommand::parse("help"), Some(UserCommand::Help));
    assert_eq!(UserCommand::parse("?"), Some(UserCommand::Help));
    assert_eq!(UserCommand::parse("quit"), Some(UserCommand::Quit));
    assert_eq!(UserCommand::parse("q"), Some(UserCommand::Quit));
    assert_eq!(UserCommand::parse("exit"), Some(UserCommand::Quit));
}

#[test]
fn it_ignores_verb_casing() {
    assert_eq!(UserCommand::parse("STATUS"), Some(UserCommand::Status));
    assert_eq!(
        UserCommand::parse("Feature login page"),
        Some(UserCommand::Feature("login page".to_string()))
    );
}

#[test]
fn it_rejects_unknown_verbs() {
    assert_eq!(UserCommand::parse("dance"), None);
    assert_eq!(UserCommand::parse(""), None);
}

#[test]
fn it_lists_every_command_in_help() {
    let help = help_text();
    for verb in ["feature", "fix", "explain", "deploy", "status", "help", "exit"] {
        assert!(help.contains(verb), "help text is missing {verb}");
    }
}
