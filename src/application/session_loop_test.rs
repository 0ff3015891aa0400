use super::is_code_file;
use super::split_list;

#[test]
fn it_splits_comma_lists() {
    let res = split_list("responsive design, modern UI ,, dark mode ");
    assert_eq!(
        res,
        vec![
            "responsive design".to_string(),
            "modern UI".to_string(),
            "dark mode".to_string(),
        ]
    );
}

#[test]
fn it_splits_empty_input_to_nothing() {
    assert!(split_list("").is_empty());
    assert!(split_list(" , , ").is_empty());
}

#[test]
fn it_recognizes_code_files() {
    assert!(is_code_file("src/App.tsx"));
    assert!(is_code_file("server.js"));
    assert!(is_code_file("styles.css"));
    assert!(is_code_file("index.html"));
    assert!(!is_code_file("README.md"));
    assert!(!is_code_file("assets/logo.png"));
}
