use domain::{ClientInfo, Direction, MappingRule, is_privileged};

#[test]
fn privileged_usernames_are_fixed() {
    assert!(is_privileged("root"));
    assert!(is_privileged("plugin"));
    assert!(!is_privileged("Root"));
    assert!(!ClientInfo::new("c1", "device-user").is_privileged());
}

#[test]
fn direction_parses_and_serializes_lowercase() {
    assert_eq!("up".parse::<Direction>().expect("up"), Direction::Up);
    assert_eq!("down".parse::<Direction>().expect("down"), Direction::Down);
    assert!("sideways".parse::<Direction>().is_err());
    let json = serde_json::to_string(&Direction::Down).expect("json");
    assert_eq!(json, "\"down\"");
}

#[test]
fn blank_identifier_is_treated_as_absent() {
    let mut rule = MappingRule {
        id: 1,
        device_config_id: "cfg-1".to_string(),
        name: "r".to_string(),
        direction: Direction::Down,
        source_topic: "a/{device_number}".to_string(),
        target_topic: "devices/command/{device_number}/+".to_string(),
        data_identifier: Some("   ".to_string()),
        priority: 1,
        enabled: true,
        description: None,
        created_at: None,
        updated_at: None,
    };
    assert_eq!(rule.identifier(), None);
    rule.data_identifier = Some(" reboot ".to_string());
    assert_eq!(rule.identifier(), Some("reboot"));
}
