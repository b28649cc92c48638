use std::collections::HashMap;

use satori_xhtml::{Bind, BindError, ConvertError, Map, Value, bind_attrs, unmarshal_attrs};

#[derive(Bind, Debug, Default)]
struct Channel {
    pub id: i64,
    pub enabled: bool,
    pub tags: Vec<String>,
    #[attr(omitempty)]
    pub topic: String,
    #[serde(rename = "parentId", default)]
    pub parent: Option<u64>,
    #[attr(omitempty)]
    pub meta: HashMap<String, i32>,
}

#[derive(Bind, Debug, Default)]
struct Guild {
    pub name: String,
    #[attr(omitempty)]
    pub channel: Option<Channel>,
    #[attr(skip)]
    pub cached: bool,
}

#[derive(Bind, Debug, Default)]
struct Pinned {
    pub channel: Channel,
}

#[derive(Bind, Debug, Default)]
struct Wrapper(#[attr(name = "value")] pub String, pub u8);

fn attrs(json: serde_json::Value) -> Map {
    match Value::from(json) {
        Value::Map(map) => map,
        _ => Map::new(),
    }
}

#[test]
fn binds_text_numbers_and_lists() {
    let channel: Channel = bind_attrs(&attrs(serde_json::json!({
        "id": "12",
        "enabled": "true",
        "tags": ["a", "b"],
        "parentId": 3,
        "meta": {"x": "4"},
    })))
    .unwrap();
    assert_eq!(channel.id, 12);
    assert!(channel.enabled);
    assert_eq!(channel.tags, vec!["a", "b"]);
    assert_eq!(channel.topic, "");
    assert_eq!(channel.parent, Some(3));
    assert_eq!(channel.meta["x"], 4);
}

#[test]
fn present_zero_values_win() {
    let channel: Channel = bind_attrs(&attrs(serde_json::json!({
        "id": 0,
        "enabled": false,
        "tags": [],
        "topic": "",
    })))
    .unwrap();
    assert_eq!(channel.id, 0);
    assert!(channel.tags.is_empty());
}

#[test]
fn required_fields_must_be_present() {
    let err = bind_attrs::<Channel>(&attrs(serde_json::json!({"id": 1, "enabled": true}))).unwrap_err();
    assert!(matches!(err, BindError::Missing { field: "tags", .. }));
}

#[test]
fn conversion_errors_name_the_field() {
    let err = bind_attrs::<Channel>(&attrs(serde_json::json!({
        "id": 1, "enabled": "maybe", "tags": [],
    })))
    .unwrap_err();
    match err {
        BindError::Field { field, source } => {
            assert_eq!(field, "enabled");
            assert!(matches!(source, ConvertError::Parse { .. }));
        }
        other => panic!("unexpected error {other}"),
    }

    let err = bind_attrs::<Channel>(&attrs(serde_json::json!({
        "id": 1, "enabled": true, "tags": [], "parentId": -1,
    })))
    .unwrap_err();
    assert!(matches!(err, BindError::Field { field: "parent", source: ConvertError::Negative { .. } }));
}

#[test]
fn nested_records_recurse() {
    let guild: Guild = bind_attrs(&attrs(serde_json::json!({
        "name": "g",
        "channel": {"id": 5, "enabled": true, "tags": ["t"]},
        "cached": true,
    })))
    .unwrap();
    assert_eq!(guild.channel.map(|c| c.id), Some(5));
    assert!(!guild.cached);

    let err = bind_attrs::<Guild>(&attrs(serde_json::json!({"name": "g", "channel": {"id": 5}}))).unwrap_err();
    assert!(matches!(err, BindError::Field { field: "channel", source: ConvertError::Record(_) }));

    let err = bind_attrs::<Guild>(&attrs(serde_json::json!({"name": "g", "channel": 5}))).unwrap_err();
    assert!(matches!(err, BindError::Field { source: ConvertError::Unsupported { .. }, .. }));
}

#[test]
fn null_nested_record_is_default() {
    let pinned: Pinned = bind_attrs(&attrs(serde_json::json!({"channel": null}))).unwrap();
    assert_eq!(pinned.channel.id, 0);
    assert!(pinned.channel.tags.is_empty());

    let err = bind_attrs::<Pinned>(&Map::new()).unwrap_err();
    assert!(matches!(err, BindError::Missing { field: "channel", .. }));
}

#[test]
fn tuple_fields_bind_only_when_named() {
    let wrapper: Wrapper = bind_attrs(&attrs(serde_json::json!({"value": 9, "1": 4}))).unwrap();
    assert_eq!(wrapper.0, "9");
    assert_eq!(wrapper.1, 0);
}

#[test]
fn unmarshal_into_existing_records() {
    let mut guild = Guild {
        name: "old".into(),
        cached: true,
        ..Guild::default()
    };
    unmarshal_attrs(Some(&mut guild), Some(&attrs(serde_json::json!({"name": "new"})))).unwrap();
    assert_eq!(guild.name, "new");
    assert!(guild.cached);

    assert!(matches!(unmarshal_attrs::<Guild>(None, None), Err(BindError::NilTarget)));
}
