//! Integration tests for the binder, schema registry and YAML schemas

use reqbind::{
    BindError, Binder, CallbackError, ErrorKind, FieldDef, FieldValue, ParameterMap, Request,
    ScalarKind, Schema, SchemaDef, SchemaRegistry,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

fn params(value: Value) -> ParameterMap {
    value.as_object().cloned().unwrap()
}

fn config_registry() -> SchemaRegistry {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config/schemas");
    let mut registry = SchemaRegistry::new();
    registry.load_dir(&dir).unwrap();

    registry
        .get_mut("Tag")
        .unwrap()
        .register_callback("trimName", |object| {
            Ok(FieldValue::from(object.get_str("name").unwrap_or_default().trim()))
        });
    registry
        .get_mut("CreatePost")
        .unwrap()
        .register_callback("dedupeTags", |object| {
            let mut seen = Vec::new();
            let mut tags = Vec::new();
            for tag in object.get("tags").and_then(FieldValue::as_list).unwrap_or_default() {
                let name = tag.as_object().and_then(|t| t.get_str("name")).unwrap_or_default();
                if !seen.contains(&name) {
                    seen.push(name);
                    tags.push(tag.clone());
                }
            }
            Ok(FieldValue::List(tags))
        });
    registry
}

#[test]
fn test_unannotated_schema_with_empty_params() {
    let mut registry = SchemaRegistry::new();
    registry.register(
        SchemaDef::new("Search")
            .field(FieldDef::scalar("query", ScalarKind::String))
            .field(FieldDef::scalar("limit", ScalarKind::Int)),
    );

    let object = Binder::new(&registry).bind(&ParameterMap::new(), "Search").unwrap();

    assert_eq!(object.schema_name(), "Search");
    assert!(object.is_empty());
}

#[test]
fn test_schema_required_list_applies_without_annotation() {
    let mut registry = SchemaRegistry::new();
    registry.register(
        SchemaDef::new("Login")
            .field(FieldDef::scalar("email", ScalarKind::String))
            .field(FieldDef::scalar("password", ScalarKind::String))
            .always_required("password"),
    );

    let err = Binder::new(&registry)
        .bind(&params(json!({"email": "a@b.c"})), "Login")
        .unwrap_err();

    assert_eq!(err, BindError::MissingParameter { key: "password".to_string() });
    assert_eq!(err.kind(), ErrorKind::MissingParameter);
    assert_eq!(err.to_string(), "missing password");
}

#[test]
fn test_not_empty_field_is_also_required() {
    let mut registry = SchemaRegistry::new();
    registry.register(
        SchemaDef::new("A")
            .field(FieldDef::scalar("other", ScalarKind::String))
            .field(FieldDef::scalar("name", ScalarKind::String).with_doc("@notEmpty")),
    );

    let err = Binder::new(&registry).bind(&params(json!({"other": 1})), "A").unwrap_err();
    assert_eq!(err, BindError::MissingParameter { key: "name".to_string() });
}

#[test]
fn test_not_empty_rejects_empty_values() {
    let mut registry = SchemaRegistry::new();
    registry.register(
        SchemaDef::new("A")
            .field(FieldDef::scalar("name", ScalarKind::String).mark_not_empty())
            .field(FieldDef::array("ids").with_item_type("int"))
            .always_not_empty("ids"),
    );
    let binder = Binder::new(&registry);

    for empty in [json!(""), json!(0), json!(false), json!(null), json!("0")] {
        let err = binder
            .bind(&params(json!({"name": empty, "ids": [1]})), "A")
            .unwrap_err();
        assert_eq!(err, BindError::EmptyValue { key: "name".to_string() });
        assert_eq!(err.kind(), ErrorKind::EmptyValueRejected);
    }

    let err = binder.bind(&params(json!({"name": "x", "ids": []})), "A").unwrap_err();
    assert_eq!(err.to_string(), "ids can not be empty");

    let object = binder.bind(&params(json!({"name": "x", "ids": ["3"]})), "A").unwrap();
    assert_eq!(object.get_str("name"), Some("x"));
    assert_eq!(object.get("ids"), Some(&FieldValue::List(vec![FieldValue::Int(3)])));
}

#[test]
fn test_flags_sharing_one_doc_line() {
    let mut registry = SchemaRegistry::new();
    registry.register(
        SchemaDef::new("Rename")
            .field(FieldDef::scalar("name", ScalarKind::String).with_doc("/** @required @notEmpty */")),
    );
    let binder = Binder::new(&registry);

    let err = binder.bind(&params(json!({"name": ""})), "Rename").unwrap_err();
    assert_eq!(err, BindError::EmptyValue { key: "name".to_string() });

    let err = binder.bind(&params(json!({"other": 1})), "Rename").unwrap_err();
    assert_eq!(err, BindError::MissingParameter { key: "name".to_string() });
}

#[test]
fn test_snake_case_key_after_digit() {
    let mut registry = SchemaRegistry::new();
    registry.register(SchemaDef::new("A").field(FieldDef::scalar("line2Id", ScalarKind::Int)));

    let object = Binder::new(&registry)
        .bind(&params(json!({"line2_id": "7"})), "A")
        .unwrap();
    assert_eq!(object.get_i64("line2Id"), Some(7));
}

#[test]
fn test_snake_case_fallback() {
    let mut registry = SchemaRegistry::new();
    registry.register(SchemaDef::new("A").field(FieldDef::scalar("userId", ScalarKind::Int)));

    let object = Binder::new(&registry).bind(&params(json!({"user_id": 5})), "A").unwrap();
    assert_eq!(object.get_i64("userId"), Some(5));
}

#[test]
fn test_request_var_wins_over_present_names() {
    let mut registry = SchemaRegistry::new();
    registry.register(SchemaDef::new("A").field(
        FieldDef::scalar("userId", ScalarKind::Int).with_doc("/**\n * @requestVar custom_key\n */"),
    ));
    let binder = Binder::new(&registry);

    let object = binder
        .bind(&params(json!({"userId": 1, "user_id": 2, "custom_key": 3})), "A")
        .unwrap();
    assert_eq!(object.get_i64("userId"), Some(3));

    // The override applies even when its key is absent
    let object = binder.bind(&params(json!({"userId": 1})), "A").unwrap();
    assert!(!object.contains("userId"));
}

#[test]
fn test_array_of_objects_in_order() {
    let registry = config_registry();
    let object = Binder::new(&registry)
        .bind(
            &params(json!({"title": "t", "authorId": 1, "tags": [{"name": "a"}, {"name": "b"}]})),
            "CreatePost",
        )
        .unwrap();

    let tags = object.get("tags").and_then(FieldValue::as_list).unwrap();
    let names: Vec<&str> = tags
        .iter()
        .map(|t| t.as_object().unwrap().get_str("name").unwrap())
        .collect();
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(tags[0].as_object().unwrap().get("weight"), Some(&FieldValue::Float(1.0)));
}

#[test]
fn test_array_with_non_object_element() {
    let registry = config_registry();
    let err = Binder::new(&registry)
        .bind(
            &params(json!({"title": "t", "authorId": 1, "tags": [{"name": "a"}, "not-an-object"]})),
            "CreatePost",
        )
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    assert_eq!(err.key(), Some("tags"));
}

#[test]
fn test_array_of_scalars_rejects_nested_values() {
    let registry = config_registry();
    let err = Binder::new(&registry)
        .bind(
            &params(json!({"title": "t", "authorId": 1, "categoryIds": [1, [2]]})),
            "CreatePost",
        )
        .unwrap_err();

    assert_eq!(
        err,
        BindError::TypeMismatch { key: "categoryIds".to_string(), expected: "array of scalars" }
    );
}

#[test]
fn test_unknown_item_schema() {
    let mut registry = SchemaRegistry::new();
    registry.register(
        SchemaDef::new("A").field(FieldDef::array("items").with_doc("@itemType Missing\n")),
    );

    let err = Binder::new(&registry).bind(&params(json!({"items": []})), "A").unwrap_err();
    assert_eq!(
        err,
        BindError::TypeMismatch { key: "items".to_string(), expected: "registered schema" }
    );
}

#[test]
fn test_nested_object_requires_mapping() {
    let registry = config_registry();
    let binder = Binder::new(&registry);

    let object = binder
        .bind(
            &params(json!({"title": "t", "authorId": 1, "address": {"city": "Oslo", "zip": "0150"}})),
            "CreatePost",
        )
        .unwrap();
    let address = object.get("address").and_then(FieldValue::as_object).unwrap();
    assert_eq!(address.schema_name(), "Address");
    assert_eq!(address.get_str("postalCode"), Some("0150"));

    let err = binder
        .bind(&params(json!({"title": "t", "authorId": 1, "address": "Oslo"})), "CreatePost")
        .unwrap_err();
    assert_eq!(err, BindError::TypeMismatch { key: "address".to_string(), expected: "object" });

    // Failures inside a nested bind surface unchanged
    let err = binder
        .bind(&params(json!({"title": "t", "authorId": 1, "address": {"zip": "1"}})), "CreatePost")
        .unwrap_err();
    assert_eq!(err, BindError::MissingParameter { key: "city".to_string() });
}

#[test]
fn test_deferred_callbacks_run_in_declaration_order() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let mut registry = SchemaRegistry::new();
    let schema = registry.register(
        SchemaDef::new("A")
            .field(FieldDef::scalar("a", ScalarKind::String).with_after_obj_init("cbA"))
            .field(FieldDef::scalar("b", ScalarKind::String).with_after_obj_init("cbB")),
    );
    for (name, label) in [("cbB", "B"), ("cbA", "A")] {
        let order = order.clone();
        schema.register_callback(name, move |_| {
            order.lock().unwrap().push(label);
            Ok(FieldValue::from(label))
        });
    }

    let object = Binder::new(&registry)
        .bind(&params(json!({"a": "x", "b": "y"})), "A")
        .unwrap();

    assert_eq!(*order.lock().unwrap(), vec!["A", "B"]);
    assert_eq!(object.get_str("a"), Some("A"));
    assert_eq!(object.get_str("b"), Some("B"));
}

#[test]
fn test_deferred_callback_sees_later_fields() {
    let mut registry = SchemaRegistry::new();
    registry
        .register(
            SchemaDef::new("Name")
                .field(
                    FieldDef::scalar("full", ScalarKind::String)
                        .with_after_init("joinNow")
                        .with_after_obj_init("joinLater"),
                )
                .field(FieldDef::scalar("first", ScalarKind::String))
                .field(FieldDef::scalar("last", ScalarKind::String)),
        )
        .register_callback("joinNow", |object| {
            Ok(FieldValue::from(object.get_str("first").unwrap_or("?")))
        })
        .register_callback("joinLater", |object| {
            let first = object.get_str("first").unwrap_or_default();
            let last = object.get_str("last").unwrap_or_default();
            Ok(FieldValue::from(format!("{} {}", first, last)))
        });

    let object = Binder::new(&registry)
        .bind(&params(json!({"full": "", "first": "Ada", "last": "Lovelace"})), "Name")
        .unwrap();

    assert_eq!(object.get_str("full"), Some("Ada Lovelace"));
}

#[test]
fn test_deferred_callback_failure() {
    let mut registry = SchemaRegistry::new();
    registry
        .register(
            SchemaDef::new("A").field(FieldDef::scalar("a", ScalarKind::String).with_after_obj_init("fail")),
        )
        .register_callback("fail", |_| Err(CallbackError::new("late failure")));

    let err = Binder::new(&registry).bind(&params(json!({"a": "x"})), "A").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CallbackFailure);
    assert_eq!(err.to_string(), "Callback 'fail' failed: late failure");
}

#[test]
fn test_scalar_coercion() {
    let mut registry = SchemaRegistry::new();
    registry.register(
        SchemaDef::new("A")
            .field(FieldDef::scalar("count", ScalarKind::Int))
            .field(FieldDef::scalar("ratio", ScalarKind::Float))
            .field(FieldDef::scalar("label", ScalarKind::String))
            .field(FieldDef::scalar("active", ScalarKind::Bool)),
    );
    let binder = Binder::new(&registry);

    let object = binder
        .bind(
            &params(json!({"count": "42", "ratio": "0.25", "label": 7, "active": "0"})),
            "A",
        )
        .unwrap();
    assert_eq!(object.get("count"), Some(&FieldValue::Int(42)));
    assert_eq!(object.get("ratio"), Some(&FieldValue::Float(0.25)));
    assert_eq!(object.get("label"), Some(&FieldValue::from("7")));
    assert_eq!(object.get("active"), Some(&FieldValue::Bool(false)));

    let err = binder.bind(&params(json!({"count": [1, 2]})), "A").unwrap_err();
    assert_eq!(err, BindError::NotScalar { key: "count".to_string() });
    assert_eq!(err.to_string(), "count type error");
}

#[test]
fn test_yaml_schemas_end_to_end() {
    let registry = config_registry();
    let object = Binder::new(&registry)
        .bind(
            &params(json!({
                "title": "Hello",
                "author_id": "9",
                "tags": [{"name": " rust "}, {"name": "rust"}, {"name": "yaml", "weight": "2.5"}],
                "category_ids": ["1", 2]
            })),
            "CreatePost",
        )
        .unwrap();

    assert_eq!(object.get_str("title"), Some("Hello"));
    assert_eq!(object.get_i64("authorId"), Some(9));
    assert_eq!(object.get("published"), Some(&FieldValue::Bool(false)));
    assert_eq!(
        object.get("categoryIds"),
        Some(&FieldValue::List(vec![FieldValue::Int(1), FieldValue::Int(2)]))
    );

    let tags = object.get("tags").and_then(FieldValue::as_list).unwrap();
    assert_eq!(tags.len(), 2);
    assert_eq!(tags[1].as_object().unwrap().get("weight"), Some(&FieldValue::Float(2.5)));

    let json = serde_json::to_value(&object).unwrap();
    assert_eq!(json["tags"][0]["name"], json!("rust"));
}

#[test]
fn test_concurrent_binds_share_registry() {
    let registry = config_registry();
    let binder = Binder::new(&registry);

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                scope.spawn(move || {
                    binder
                        .bind(
                            &params(json!({"title": format!("post {}", i), "authorId": i + 1})),
                            "CreatePost",
                        )
                        .unwrap()
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let object = handle.join().unwrap();
            assert_eq!(object.get_i64("authorId"), Some(i as i64 + 1));
        }
    });
}

#[derive(Debug, Deserialize, PartialEq)]
struct Tag {
    name: String,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct UpdateProfile {
    user_id: i64,
    nickname: String,
    #[serde(default)]
    tags: Vec<Tag>,
}

impl Request for UpdateProfile {
    const SCHEMA: &'static str = "UpdateProfile";

    fn schema() -> SchemaDef {
        SchemaDef::new(Self::SCHEMA)
            .field(FieldDef::scalar("userId", ScalarKind::Int).mark_required())
            .field(FieldDef::scalar("nickname", ScalarKind::String).with_after_init("lower"))
            .field(FieldDef::array("tags").with_item_type("Tag"))
    }

    fn register_callbacks(schema: &mut Schema) {
        schema.register_callback("lower", |object| {
            Ok(FieldValue::from(object.get_str("nickname").unwrap_or_default().to_lowercase()))
        });
    }
}

#[test]
fn test_typed_request() {
    let mut registry = SchemaRegistry::new();
    registry.register(SchemaDef::new("Tag").field(FieldDef::scalar("name", ScalarKind::String)));
    registry.register_request::<UpdateProfile>();
    let binder = Binder::new(&registry);

    let request: UpdateProfile = binder
        .bind_as(&params(json!({"user_id": "12", "nickname": "ADA", "tags": [{"name": "x"}]})))
        .unwrap();
    assert_eq!(
        request,
        UpdateProfile {
            user_id: 12,
            nickname: "ada".to_string(),
            tags: vec![Tag { name: "x".to_string() }],
        }
    );

    // nickname is optional in the schema but not in the type
    let err = binder
        .bind_as::<UpdateProfile>(&params(json!({"userId": 1})))
        .unwrap_err();
    assert!(matches!(err, BindError::Deserialize(_)));
}
