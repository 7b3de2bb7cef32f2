use tg_topicmap::validator::{
    extract_device_number, normalized_down_topics, validate_publish, validate_subscribe,
};

#[test]
fn publish_whitelist() {
    assert!(validate_publish("devices/telemetry/control"));
    assert!(validate_publish("devices/attributes/123"));
    assert!(validate_publish("gateway/command/response/abc"));
    assert!(validate_publish("D1/up"));

    assert!(!validate_publish("devices/telemetry"));
    assert!(!validate_publish("devices/attributes/1/2"));
    assert!(!validate_publish("vendor/D1/report"));
    assert!(!validate_publish(""));
}

#[test]
fn subscribe_whitelist() {
    assert!(validate_subscribe("devices/telemetry/control/D1"));
    assert!(validate_subscribe("devices/command/D1/+"));
    assert!(validate_subscribe("devices/command/D1/m-1"));
    assert!(validate_subscribe("D1/down"));
    assert!(validate_subscribe("devices/register/response/+"));

    assert!(!validate_subscribe("devices/command/+/+"));
    assert!(!validate_subscribe("devices/command/#/x"));
    assert!(!validate_subscribe("devices/command/D1/#"));
    assert!(!validate_subscribe("+/down"));
    assert!(!validate_subscribe("devices/telemetry/control"));
}

#[test]
fn normalized_shapes_exclude_bare_down() {
    let shapes: Vec<&str> = normalized_down_topics().collect();
    assert!(shapes.contains(&"devices/command/{device_number}/+"));
    assert!(!shapes.contains(&"{device_number}/down"));
    assert!(!shapes.contains(&"devices/register/response/+"));
}

#[test]
fn device_number_from_normalized_topic() {
    assert_eq!(
        extract_device_number("devices/command/D1/set").as_deref(),
        Some("D1")
    );
    assert_eq!(
        extract_device_number("gateway/attributes/get/G7").as_deref(),
        Some("G7")
    );
    assert_eq!(extract_device_number("D1/down"), None);
    assert_eq!(extract_device_number("vendor/D1/cmd"), None);
}
