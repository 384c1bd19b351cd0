use super::*;
use tempfile::TempDir;

fn dev_agent(name: &str) -> Agent {
    Agent::new(name, Role::Developer, Scope::new(vec!["src/**".to_string()]))
}

#[test]
fn validate_accepts_well_formed_agent() {
    assert!(validate_agent(&dev_agent("dev")).is_ok());
}

#[test]
fn validate_rejects_empty_name() {
    let agent = dev_agent("");
    assert!(validate_agent(&agent).is_err());

    let agent = dev_agent("   ");
    assert!(validate_agent(&agent).is_err());
}

#[test]
fn validate_rejects_empty_pattern_set() {
    let agent = Agent::new("dev", Role::Developer, Scope::new(vec![]));
    let err = validate_agent(&agent).unwrap_err();
    assert!(err.to_string().contains("at least one scope pattern"));
}

#[test]
fn validate_rejects_blank_pattern() {
    let agent = Agent::new(
        "dev",
        Role::Developer,
        Scope::new(vec!["src/**".to_string(), "  ".to_string()]),
    );
    assert!(validate_agent(&agent).is_err());
}

#[test]
fn role_round_trips_through_serde() {
    let json = serde_json::to_string(&Role::Qa).unwrap();
    assert_eq!(json, "\"qa\"");
    let role: Role = serde_json::from_str(&json).unwrap();
    assert_eq!(role, Role::Qa);
}

#[test]
fn registry_load_missing_file_is_empty() {
    let temp = TempDir::new().unwrap();
    let mut registry = AgentRegistry::new(temp.path().join("agents.json"));
    registry.load().unwrap();
    assert!(registry.list().is_empty());
}

#[test]
fn registry_save_and_load_round_trip_json() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("agents.json");

    let mut registry = AgentRegistry::new(&path);
    registry.add(dev_agent("dev")).unwrap();
    registry
        .add(Agent::new(
            "auditor",
            Role::Reviewer,
            Scope::read_only(vec!["**/*.rs".to_string()]),
        ))
        .unwrap();
    registry.save().unwrap();

    let mut reloaded = AgentRegistry::new(&path);
    reloaded.load().unwrap();
    assert_eq!(reloaded.list().len(), 2);
    assert_eq!(reloaded.get("dev").unwrap().role, Role::Developer);
    assert!(reloaded.get("auditor").unwrap().scope.read_only);
}

#[test]
fn registry_save_and_load_round_trip_yaml() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("agents.yaml");

    let mut registry = AgentRegistry::new(&path);
    registry.add(dev_agent("dev")).unwrap();
    registry.save().unwrap();

    let mut reloaded = AgentRegistry::new(&path);
    reloaded.load().unwrap();
    assert_eq!(reloaded.get("dev").unwrap(), &dev_agent("dev"));
}

#[test]
fn registry_load_rejects_invalid_agent() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("agents.json");
    std::fs::write(
        &path,
        r#"{"agents":[{"name":"","role":"developer","scope":{"patterns":["src/**"]}}]}"#,
    )
    .unwrap();

    let mut registry = AgentRegistry::new(&path);
    assert!(registry.load().is_err());
}

#[test]
fn registry_add_remove_contains() {
    let mut registry = AgentRegistry::new("agents.json");
    registry.add(dev_agent("dev")).unwrap();

    assert!(registry.contains("dev"));
    assert!(registry.remove("dev"));
    assert!(!registry.remove("dev"));
    assert!(!registry.contains("dev"));
}

#[test]
fn find_config_file_walks_ancestors() {
    let temp = TempDir::new().unwrap();
    let nested = temp.path().join("a/b/c");
    std::fs::create_dir_all(&nested).unwrap();
    std::fs::write(temp.path().join("agents.json"), "{\"agents\":[]}").unwrap();

    let found = AgentRegistry::find_config_file(&nested).unwrap();
    assert_eq!(found, temp.path().join("agents.json"));
}

#[test]
fn find_config_file_prefers_nearest_directory() {
    let temp = TempDir::new().unwrap();
    let nested = temp.path().join("inner");
    std::fs::create_dir_all(&nested).unwrap();
    std::fs::write(temp.path().join("agents.json"), "{\"agents\":[]}").unwrap();
    std::fs::write(nested.join("agents.yaml"), "agents: []").unwrap();

    let found = AgentRegistry::find_config_file(&nested).unwrap();
    assert_eq!(found, nested.join("agents.yaml"));
}
