use rstest::rstest;
use serde_json::{json, Value};

use avro_json::{Error, Schema};

fn schema(decl: &str) -> Schema {
    Schema::parse_str(decl).unwrap()
}

fn decode(decl: &str, input: &str) -> Result<Value, Error> {
    avro_json::from_str(&schema(decl), input)
}

fn encode(decl: &str, value: Value) -> Result<String, Error> {
    avro_json::to_string(&schema(decl), &value)
}

fn round_trip(decl: &str, value: Value) {
    let schema = schema(decl);
    let text = avro_json::to_string(&schema, &value).unwrap();
    assert_eq!(avro_json::from_str(&schema, &text).unwrap(), value, "{text}");
}

#[test]
fn nullable_single_has_no_wrapper() {
    let decl = r#"["null","string"]"#;
    assert_eq!(encode(decl, json!(null)).unwrap(), "null");
    assert_eq!(encode(decl, json!("hi")).unwrap(), r#""hi""#);
    assert_eq!(decode(decl, "null").unwrap(), json!(null));
    assert_eq!(decode(decl, r#""hi""#).unwrap(), json!("hi"));
}

#[test]
fn nullable_single_order_does_not_matter() {
    let decl = r#"["int","null"]"#;
    assert_eq!(encode(decl, json!(7)).unwrap(), "7");
    assert_eq!(decode(decl, "7").unwrap(), json!(7));
    assert_eq!(decode(decl, "null").unwrap(), json!(null));
}

#[test]
fn nullable_single_record_branch() {
    // the object is the record value itself, not a wrapper
    let decl = r#"["null",{"type":"record","name":"P","fields":[
        {"name":"x","type":"int"}]}]"#;
    assert_eq!(decode(decl, r#"{"x":1}"#).unwrap(), json!({"x": 1}));
    round_trip(decl, json!({"x": 1}));
    round_trip(decl, json!(null));
}

#[rstest]
#[case("null", json!(null))]
#[case(r#"{"string":"hi"}"#, json!("hi"))]
#[case(r#"{"int":7}"#, json!(7))]
fn wider_unions_use_wrappers(#[case] input: &str, #[case] expected: Value) {
    let decl = r#"["null","string","int"]"#;
    assert_eq!(decode(decl, input).unwrap(), expected);
    round_trip(decl, expected);
}

#[test]
fn named_types_label_their_branch() {
    let decl = r#"["int",{"type":"fixed","name":"md5","size":2},
        {"type":"enum","name":"Suit","symbols":["H","S"]}]"#;
    assert_eq!(decode(decl, r#"{"md5":"ab"}"#).unwrap(), json!("ab"));
    assert_eq!(decode(decl, r#"{"Suit":"S"}"#).unwrap(), json!("S"));
    assert_eq!(encode(decl, json!(1)).unwrap(), r#"{"int":1}"#);
}

#[test]
fn unknown_branch_label_is_an_error() {
    let err = decode(r#"["null","string","int"]"#, r#"{"long":1}"#).unwrap_err();
    assert_eq!(err, Error::UnknownUnionBranch("long".to_string()));
}

#[test]
fn bare_value_needs_the_wrapper_in_wider_unions() {
    assert!(matches!(
        decode(r#"["null","string","int"]"#, r#""hi""#),
        Err(Error::TypeMismatch { .. })
    ));
}

#[test]
fn two_non_null_branches_still_use_wrappers() {
    let decl = r#"["string","int"]"#;
    assert_eq!(encode(decl, json!(7)).unwrap(), r#"{"int":7}"#);
    assert_eq!(decode(decl, r#"{"string":"x"}"#).unwrap(), json!("x"));
    assert!(matches!(decode(decl, "7"), Err(Error::TypeMismatch { .. })));
}

#[test]
fn null_for_a_union_without_a_null_branch_is_an_error() {
    let err = decode(r#"["string","int"]"#, "null").unwrap_err();
    assert_eq!(err, Error::UnknownUnionBranch("null".to_string()));
}

#[test]
fn union_inside_a_record_with_reordered_fields() {
    let decl = r#"{"type":"record","name":"R","fields":[
        {"name":"nick","type":["null","string"]},
        {"name":"id","type":"int"}]}"#;
    assert_eq!(
        decode(decl, r#"{"id":1,"nick":"n"}"#).unwrap(),
        json!({"nick": "n", "id": 1})
    );
    assert_eq!(
        decode(decl, r#"{"id":1,"nick":null}"#).unwrap(),
        json!({"nick": null, "id": 1})
    );
    round_trip(decl, json!({"nick": null, "id": 1}));
    round_trip(decl, json!({"nick": "n", "id": 1}));
}

#[test]
fn wrapped_union_buffered_and_replayed() {
    let decl = r#"{"type":"record","name":"R","fields":[
        {"name":"v","type":["null","string","int"]},
        {"name":"tail","type":"boolean"}]}"#;
    assert_eq!(
        decode(decl, r#"{"tail":true,"v":{"int":9}}"#).unwrap(),
        json!({"v": 9, "tail": true})
    );
}

#[test]
fn union_arrays_round_trip() {
    let decl = r#"{"type":"array","items":["null","long"]}"#;
    round_trip(decl, json!([null, 1, null, 2]));
    assert_eq!(encode(decl, json!([null, 1])).unwrap(), "[null,1]");
}
