use rstest::rstest;
use serde_json::{json, Value};

use avro_json::{DecodeOptions, Error, Schema};

const PERSON: &str = r#"{"type":"record","name":"Person","fields":[
    {"name":"name","type":"string"},
    {"name":"age","type":"int"},
    {"name":"email","type":"string"}]}"#;

fn decode(decl: &str, input: &str) -> Result<Value, Error> {
    avro_json::from_str(&Schema::parse_str(decl).unwrap(), input)
}

fn decode_with(decl: &str, input: &str, options: &DecodeOptions) -> Result<Value, Error> {
    avro_json::from_str_with_options(&Schema::parse_str(decl).unwrap(), input, options)
}

#[rstest]
#[case(r#"{"name":"Ana","age":30,"email":"a@x"}"#)]
#[case(r#"{"age":30,"name":"Ana","email":"a@x"}"#)]
#[case(r#"{"email":"a@x","age":30,"name":"Ana"}"#)]
#[case(r#"{"age":30,"email":"a@x","name":"Ana"}"#)]
fn any_field_order_decodes_identically(#[case] input: &str) {
    assert_eq!(
        decode(PERSON, input).unwrap(),
        json!({"name": "Ana", "age": 30, "email": "a@x"})
    );
}

#[test]
fn disorder_at_every_nesting_level() {
    let decl = r#"{"type":"record","name":"Outer","fields":[
        {"name":"a","type":"int"},
        {"name":"inner","type":{"type":"record","name":"Inner","fields":[
            {"name":"x","type":"string"},
            {"name":"y","type":"boolean"}]}},
        {"name":"b","type":"long"}]}"#;
    let input = r#"{"b":2,"inner":{"y":true,"x":"v"},"a":1}"#;
    assert_eq!(
        decode(decl, input).unwrap(),
        json!({"a": 1, "inner": {"x": "v", "y": true}, "b": 2})
    );
}

#[test]
fn buffered_field_holding_a_whole_subtree() {
    let decl = r#"{"type":"record","name":"R","fields":[
        {"name":"first","type":"int"},
        {"name":"rest","type":{"type":"array","items":{"type":"map","values":"int"}}}]}"#;
    let input = r#"{"rest":[{"k":1},{}],"first":0}"#;
    assert_eq!(
        decode(decl, input).unwrap(),
        json!({"first": 0, "rest": [{"k": 1}, {}]})
    );
}

#[test]
fn unknown_fields_are_an_error_in_strict_mode() {
    let input = r#"{"name":"Ana","age":30,"email":"a@x","extra":1,"more":[true]}"#;
    let err = decode(PERSON, input).unwrap_err();
    assert_eq!(
        err,
        Error::UnknownFields(vec!["extra".to_string(), "more".to_string()])
    );
}

#[test]
fn lenient_mode_drops_unknown_fields() {
    let input = r#"{"extra":{"deep":[1,2]},"name":"Ana","age":30,"email":"a@x"}"#;
    let options = DecodeOptions::default().with_strict(false);
    assert_eq!(
        decode_with(PERSON, input, &options).unwrap(),
        json!({"name": "Ana", "age": 30, "email": "a@x"})
    );
}

#[rstest]
#[case(r#"{"name":"Ana","age":30}"#, "email")]
#[case(r#"{"age":30}"#, "name")]
#[case(r#"{}"#, "name")]
fn missing_fields_are_reported_by_name(#[case] input: &str, #[case] missing: &str) {
    assert_eq!(
        decode(PERSON, input).unwrap_err(),
        Error::MissingField(missing.to_string())
    );
}

#[test]
fn buffered_field_cap_is_enforced() {
    let input = r#"{"x1":1,"x2":2,"name":"Ana","age":30,"email":"a@x"}"#;
    let options = DecodeOptions::default()
        .with_strict(false)
        .with_max_buffered_fields(1);
    assert_eq!(
        decode_with(PERSON, input, &options).unwrap_err(),
        Error::ReorderOverflow { limit: 1 }
    );

    // one skipped field fits under the cap
    let input = r#"{"x1":1,"name":"Ana","age":30,"email":"a@x"}"#;
    assert!(decode_with(PERSON, input, &options).is_ok());
}

#[test]
fn sibling_records_have_independent_reorder_scopes() {
    let decl = r#"{"type":"record","name":"Pair","fields":[
        {"name":"left","type":{"type":"record","name":"P","fields":[
            {"name":"x","type":"int"},{"name":"y","type":"int"}]}},
        {"name":"right","type":"P"}]}"#;
    // named-type references are out of scope; spell the record out twice
    let decl = decl.replace(
        r#""type":"P"}"#,
        r#""type":{"type":"record","name":"P2","fields":[
            {"name":"x","type":"int"},{"name":"y","type":"int"}]}}"#,
    );
    let input = r#"{"left":{"y":2,"x":1},"right":{"y":4,"x":3}}"#;
    assert_eq!(
        decode(&decl, input).unwrap(),
        json!({"left": {"x": 1, "y": 2}, "right": {"x": 3, "y": 4}})
    );
}

#[test]
fn fields_after_a_replayed_field_still_decode() {
    // "age" is buffered while scanning for "name"; after replaying it, the
    // live cursor resumes at "email".
    let input = r#"{"age":30,"name":"Ana","email":"a@x"}"#;
    let value = decode(PERSON, input).unwrap();
    assert_eq!(value["email"], json!("a@x"));
}
