//! Integration tests for value coercion through derived views.
#![allow(missing_docs)]

mod common;

use common::{ctx, Country, Event, EventViewBuilder, Timestamp, UpperCaseString};
use mapview::{
    AttributeDef, Config, InterfaceDef, MapViewError, MapViewResult, TypeRef, TypedView, Value,
    ViewContext,
};
use serde_json::json;

fn event(
    ctx: &ViewContext,
    config: Config,
    json: serde_json::Value,
) -> MapViewResult<common::EventView> {
    ctx.builder::<Event>()
        .with_config(config)
        .with_json(json)?
        .build_as::<Event>()
}

// ============================================================================
// Scalar protocol
// ============================================================================

#[test]
fn test_constructor_and_parse_conversions() {
    let ctx = ctx();
    let event = event(
        &ctx,
        Config::default(),
        json!({"title": "Standup", "date": 1000, "private": true, "room": "room 1"}),
    )
    .unwrap();

    assert_eq!(event.title().unwrap(), Some("Standup".to_string()));
    assert_eq!(event.date().unwrap(), Some(Timestamp(1000)));
    assert!(event.is_private().unwrap());
    assert_eq!(
        event.room().unwrap(),
        Some(Some(UpperCaseString("ROOM 1".to_string())))
    );
}

#[test]
fn test_unconvertible_scalar_is_type_mismatch() {
    let ctx = ctx();
    let err = event(&ctx, Config::default(), json!({"date": "yesterday"})).unwrap_err();
    assert!(matches!(
        err,
        MapViewError::TypeMismatch { ref location, .. } if location == "Event.date"
    ));

    let err = event(&ctx, Config::default(), json!({"date": 1.5})).unwrap_err();
    assert!(matches!(err, MapViewError::TypeMismatch { .. }));

    let err = event(&ctx, Config::default(), json!({"notes": "not a list"})).unwrap_err();
    assert!(matches!(err, MapViewError::TypeMismatch { .. }));
}

#[test]
fn test_numeric_strings_parse_into_numbers() {
    let ctx = ViewContext::new();
    ctx.registry().register_interface(
        InterfaceDef::new("Counter")
            .attribute(AttributeDef::new("count", TypeRef::Int))
            .attribute(AttributeDef::new("ratio", TypeRef::Float))
            .attribute(AttributeDef::new("enabled", TypeRef::Bool)),
    );
    let view = ctx
        .builder_for("Counter")
        .with_json(json!({"count": "12", "ratio": 2, "enabled": "true"}))
        .unwrap()
        .build()
        .unwrap();

    assert_eq!(view.get("count").unwrap(), Value::Int(12));
    assert_eq!(view.get("ratio").unwrap(), Value::Float(2.0));
    assert!(view.is("enabled").unwrap());
}

#[test]
fn test_set_runs_the_same_coercion() {
    let ctx = ctx();
    let mut view = event(&ctx, Config::default(), json!({})).unwrap().into_view();
    view.set("date", 2000).unwrap();
    view.set("room", "hall").unwrap();
    let event = common::EventView::from_view(view);

    assert_eq!(event.date().unwrap(), Some(Timestamp(2000)));
    assert_eq!(
        event.room().unwrap(),
        Some(Some(UpperCaseString("HALL".to_string())))
    );
    assert_eq!(
        event.to_json().unwrap(),
        json!({"date": 2000, "room": "HALL"})
    );
}

// ============================================================================
// Enum mapping
// ============================================================================

#[test]
fn test_enum_mapped_by_custom_method() {
    let ctx = ctx();
    let config = Config::default().with_enum_mapping_method("ordinal");
    let event = event(&ctx, config, json!({"title": "Trip", "country": 3})).unwrap();

    assert_eq!(event.country().unwrap(), Some(Some(Country::AT)));
    assert_eq!(event.to_json().unwrap(), json!({"title": "Trip", "country": 3}));
    assert_eq!(event.to_string(), "PROXY{country=AT, title=Trip}");
}

#[test]
fn test_enum_mapped_by_string_property() {
    let ctx = ctx();
    let config = Config::default().with_enum_mapping_method("label");
    let event = event(&ctx, config, json!({"country": "Hungary"})).unwrap();
    assert_eq!(event.country().unwrap(), Some(Some(Country::HU)));
    assert_eq!(event.to_json().unwrap(), json!({"country": "Hungary"}));
}

#[test]
fn test_unmapped_enum_value_fails() {
    let ctx = ctx();
    let config = Config::default().with_enum_mapping_method("ordinal");
    let err = event(&ctx, config, json!({"country": 2})).unwrap_err();
    assert_eq!(err, MapViewError::enum_resolution("Country", "2", "ordinal"));

    let err = event(&ctx, Config::default(), json!({"country": "DE"})).unwrap_err();
    assert_eq!(err, MapViewError::enum_resolution("Country", "DE", "name"));
}

#[test]
fn test_typed_enum_setter_exports_with_mapping() {
    let ctx = ctx();
    let event = EventViewBuilder::new(&ctx)
        .unwrap()
        .with_config(Config::default().with_enum_mapping_method("ordinal"))
        .unwrap()
        .country(Some(Country::HU))
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(event.to_json().unwrap(), json!({"country": 1}));
}

// ============================================================================
// Collections and nesting
// ============================================================================

#[test]
fn test_list_keeps_order_and_duplicates() {
    let ctx = ctx();
    let mut event = event(&ctx, Config::default(), json!({"notes": ["b", "a", "b"]})).unwrap();
    assert_eq!(
        event.notes().unwrap(),
        Some(vec!["b".to_string(), "a".to_string(), "b".to_string()])
    );

    event.remove_from_notes(["b".to_string()]).unwrap();
    assert_eq!(
        event.notes().unwrap(),
        Some(vec!["a".to_string(), "b".to_string()])
    );
}

#[test]
fn test_optional_inner_type_must_be_interface_for_maps() {
    let ctx = ViewContext::new();
    ctx.registry().register_interface(
        InterfaceDef::new("Holder")
            .attribute(AttributeDef::new("label", TypeRef::optional(TypeRef::Str))),
    );
    let err = ctx
        .builder_for("Holder")
        .with_json(json!({"label": {"text": "x"}}))
        .unwrap()
        .build()
        .unwrap_err();
    assert!(matches!(err, MapViewError::CompositeType { .. }));
}

#[test]
fn test_embedded_attribute_must_be_interface() {
    let ctx = ViewContext::new();
    ctx.registry().register_interface(
        InterfaceDef::new("Broken")
            .attribute(AttributeDef::new("flat", TypeRef::Str).embedded()),
    );
    let err = ctx.builder_for("Broken").build().unwrap_err();
    assert!(matches!(err, MapViewError::CompositeType { .. }));
}

#[test]
fn test_configuration_propagates_to_nested_views() {
    let ctx = ViewContext::new();
    ctx.registry().register_interface(
        InterfaceDef::new("Leaf").attribute(AttributeDef::new("name", TypeRef::Str)),
    );
    ctx.registry().register_interface(
        InterfaceDef::new("Branch")
            .attribute(AttributeDef::new("leaves", TypeRef::list(TypeRef::interface("Leaf")))),
    );

    let branch = ctx
        .builder_for("Branch")
        .immutable(true)
        .with_json(json!({"leaves": [{"name": "a"}]}))
        .unwrap()
        .build()
        .unwrap();

    let leaves = branch.get("leaves").unwrap();
    let mut leaf = leaves.as_list().unwrap()[0].as_view().unwrap().clone();
    assert!(leaf.is_immutable());
    assert!(matches!(
        leaf.set("name", "b"),
        Err(MapViewError::ImmutabilityViolation { .. })
    ));
}

#[test]
fn test_deep_nesting_is_bounded() {
    let ctx = ViewContext::new();
    ctx.registry().register_interface(
        InterfaceDef::new("Node")
            .attribute(AttributeDef::new("next", TypeRef::interface("Node"))),
    );

    let mut json = json!({});
    for _ in 0..=mapview::MAX_NESTING_DEPTH {
        json = json!({ "next": json });
    }
    let err = ctx
        .builder_for("Node")
        .with_json(json)
        .unwrap()
        .build()
        .unwrap_err();
    assert!(matches!(err, MapViewError::CyclicStructure { .. }));

    let shallow = ctx
        .builder_for("Node")
        .with_json(json!({"next": {"next": {}}}))
        .unwrap()
        .build()
        .unwrap();
    let next = shallow.get("next").unwrap();
    assert!(next.as_view().unwrap().get("next").unwrap().as_view().is_some());
}
