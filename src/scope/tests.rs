use super::*;

fn scope(patterns: &[&str]) -> Scope {
    Scope::new(patterns.iter().map(|s| s.to_string()).collect())
}

#[test]
fn can_access_matches_double_star_at_any_depth() {
    let scope = scope(&["src/**"]);
    assert!(can_access("src/main.rs", &scope));
    assert!(can_access("src/flow/parser.rs", &scope));
    assert!(!can_access("tests/flow.rs", &scope));
}

#[test]
fn can_access_single_star_stays_within_segment() {
    let scope = scope(&["src/*.rs"]);
    assert!(can_access("src/main.rs", &scope));
    assert!(!can_access("src/flow/parser.rs", &scope));
}

#[test]
fn can_access_any_pattern_suffices() {
    let scope = scope(&["docs/**", "src/*.rs"]);
    assert!(can_access("docs/guide.md", &scope));
    assert!(can_access("src/lib.rs", &scope));
    assert!(!can_access("Cargo.toml", &scope));
}

#[test]
fn can_access_normalizes_backslashes() {
    let scope = scope(&["src/**"]);
    assert!(can_access("src\\flow\\parser.rs", &scope));
}

#[test]
fn invalid_pattern_matches_nothing() {
    let scope = scope(&["src/["]);
    assert!(!can_access("src/[", &scope));
    assert!(!can_access("src/main.rs", &scope));
}

#[test]
fn can_modify_false_when_read_only() {
    let scope = Scope::read_only(vec!["src/**".to_string()]);
    assert!(can_access("src/main.rs", &scope));
    assert!(!can_modify("src/main.rs", &scope));
}

#[test]
fn can_modify_delegates_to_access_when_writable() {
    let scope = scope(&["src/**"]);
    assert!(can_modify("src/main.rs", &scope));
    assert!(!can_modify("docs/guide.md", &scope));
}

#[test]
fn most_specific_pattern_prefers_deeper_patterns() {
    let patterns = vec![
        "src/**".to_string(),
        "src/flow/**".to_string(),
        "src/flow/*.rs".to_string(),
    ];
    assert_eq!(
        most_specific_pattern("src/flow/parser.rs", &patterns),
        Some("src/flow/*.rs")
    );
}

#[test]
fn most_specific_pattern_breaks_ties_by_first_occurrence() {
    let patterns = vec!["src/*.rs".to_string(), "src/*".to_string()];
    assert_eq!(
        most_specific_pattern("src/main.rs", &patterns),
        Some("src/*.rs")
    );
}

#[test]
fn most_specific_pattern_none_when_no_match() {
    let patterns = vec!["docs/**".to_string()];
    assert_eq!(most_specific_pattern("src/main.rs", &patterns), None);
}
