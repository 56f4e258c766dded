#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::{DateTime, NaiveDateTime, Utc};
use polaris_persist::{ColumnType, FieldKind, Model};

#[allow(dead_code)]
#[derive(Model)]
struct User {
    #[column(primary_key)]
    id: String,
    #[column]
    email: String,
    #[column]
    age: i64,
    #[column]
    score: f64,
    #[column]
    active: bool,
    #[column(name = "signed_up")]
    created_at: DateTime<Utc>,
    #[column]
    last_seen: Option<NaiveDateTime>,
    #[column]
    profile: serde_json::Value,
    scratch: Vec<u8>,
}

#[allow(dead_code)]
#[derive(Debug)]
struct Preferences {
    theme: String,
}

#[allow(dead_code)]
#[derive(Model)]
#[model(name = "*pkg.Account")]
struct Account {
    #[column(kind = "json")]
    preferences: Preferences,
    #[column]
    avatar: Vec<u8>,
    #[column]
    nickname: Option<&'static str>,
}

#[test]
fn test_untagged_fields_are_not_persisted() {
    let columns: Vec<_> = User::schema().fields.iter().map(|f| f.column).collect();
    assert_eq!(
        columns,
        vec![
            "id",
            "email",
            "age",
            "score",
            "active",
            "signed_up",
            "last_seen",
            "profile"
        ]
    );
}

#[test]
fn test_field_kinds_follow_the_mapping_table() {
    let kinds: Vec<_> = User::schema().fields.iter().map(|f| f.kind).collect();
    assert_eq!(
        kinds,
        vec![
            FieldKind::Text,
            FieldKind::Text,
            FieldKind::Integer,
            FieldKind::Float,
            FieldKind::Boolean,
            FieldKind::Timestamp,
            FieldKind::Timestamp,
            FieldKind::Json,
        ]
    );
}

#[test]
fn test_primary_key_and_renamed_column() {
    let schema = User::schema();
    assert!(schema.fields[0].primary_key);
    assert!(schema.fields[1..].iter().all(|f| !f.primary_key));

    let renamed = schema.fields.iter().find(|f| f.name == "created_at").unwrap();
    assert_eq!(renamed.column, "signed_up");
}

#[test]
fn test_default_type_name_is_the_struct_name() {
    assert_eq!(User::schema().type_name, "User");
    assert_eq!(User::table_name(""), "user");
    assert_eq!(User::table_name("shop"), "shop_user");
}

#[test]
fn test_type_name_override_drives_table_name() {
    assert_eq!(Account::table_name("shop"), "shop_pkg_account");
}

#[test]
fn test_explicit_kind_and_unsupported_types() {
    let fields = Account::schema().fields;
    assert_eq!(fields[0].kind, FieldKind::Json);
    assert_eq!(fields[1].kind, FieldKind::Unsupported("Vec<u8>"));
    assert_eq!(fields[2].kind, FieldKind::Text);

    let definitions = Account::schema().column_definitions().unwrap();
    let mapped: Vec<_> = definitions
        .iter()
        .map(|c| (c.name, c.column_type))
        .collect();
    assert_eq!(
        mapped,
        vec![
            ("preferences", ColumnType::Jsonb),
            ("nickname", ColumnType::Varchar)
        ]
    );
}

#[test]
fn test_schema_is_a_single_static() {
    assert!(std::ptr::eq(User::schema(), User::schema()));
}
