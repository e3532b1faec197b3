//! End-to-end behavior of parsing, path evaluation and casting.

use std::thread;

use vellum_core::{DataType, Value};
use vellum_jsonb::{
    cast, cast_path, evaluate, CastMode, JsonPath, JsonbBinary, JsonbRef, JsonbValue,
};

fn eval_text(doc: &JsonbBinary, path: &str) -> Option<String> {
    let path = JsonPath::parse(path).unwrap();
    evaluate(doc.as_bytes(), &path)
        .unwrap()
        .map(|v| v.to_text().unwrap())
}

#[test]
fn nested_object_and_array_access() {
    let doc = JsonbBinary::parse(r#"{"a":{"b":1,"c":[1,2]}}"#).unwrap();
    assert_eq!(eval_text(&doc, "a.c").as_deref(), Some("[1,2]"));
    assert_eq!(eval_text(&doc, "a['b']").as_deref(), Some("1"));
    assert_eq!(eval_text(&doc, ":a.c[1]").as_deref(), Some("2"));
}

#[test]
fn array_root_access() {
    let doc = JsonbBinary::parse(r#"[["a","b"],{"k":"a"}]"#).unwrap();
    assert_eq!(eval_text(&doc, "[0][1]").as_deref(), Some("\"b\""));
    assert_eq!(eval_text(&doc, "[1].k").as_deref(), Some("\"a\""));
    assert_eq!(eval_text(&doc, "[1][0]"), None);
    assert_eq!(eval_text(&doc, "[0].k"), None);
}

#[test]
fn cast_present_and_absent_paths() {
    let doc = JsonbBinary::parse(r#"{"a":{"b":1,"c":[1,2]}}"#).unwrap();
    for mode in [CastMode::Strict, CastMode::Lenient] {
        let hit = JsonPath::parse(":a.c[0]").unwrap();
        assert_eq!(
            cast_path(doc.as_bytes(), &hit, DataType::Int64, mode).unwrap(),
            Value::Int64(1)
        );
        let miss = JsonPath::parse(":a.c[5]").unwrap();
        assert_eq!(
            cast_path(doc.as_bytes(), &miss, DataType::Int64, mode).unwrap(),
            Value::Null
        );
    }
}

#[test]
fn null_propagates_through_incompatible_steps() {
    let doc = JsonbBinary::parse(r#"{"s":"text","n":null,"arr":[{"x":1}]}"#).unwrap();
    for path in [":s.x", ":s[0]", ":n.x", ":arr.x", ":arr[0][0]", ":missing.deeper[3]"] {
        assert_eq!(eval_text(&doc, path), None, "{}", path);
    }
    assert_eq!(eval_text(&doc, ":n").as_deref(), Some("null"));
}

#[test]
fn repeated_evaluation_returns_same_bytes() {
    let doc = JsonbBinary::parse(r#"{"a":{"b":[true,{"c":"d"}]}}"#).unwrap();
    let path = JsonPath::parse(":a.b[1]").unwrap();
    let first = evaluate(doc.as_bytes(), &path).unwrap().unwrap();
    let second = evaluate(doc.as_bytes(), &path).unwrap().unwrap();
    match (first, second) {
        (JsonbRef::Object(x), JsonbRef::Object(y)) => {
            assert_eq!(x.as_bytes().as_ptr(), y.as_bytes().as_ptr());
            assert_eq!(x.as_bytes(), y.as_bytes());
        }
        other => panic!("expected objects, got {:?}", other),
    }
}

#[test]
fn lenient_and_strict_casts_differ_only_on_mismatch() {
    let doc = JsonbBinary::parse(r#"{"n":"12","x":"twelve","big":300}"#).unwrap();
    let root = doc.root().unwrap();
    let get = |key: &str| {
        JsonPath::parse(key)
            .unwrap()
            .evaluate(root)
            .unwrap()
            .unwrap()
    };

    assert_eq!(cast(get("n"), DataType::Int32, CastMode::Strict).unwrap(), Value::Int32(12));
    assert_eq!(cast(get("n"), DataType::Int32, CastMode::Lenient).unwrap(), Value::Int32(12));

    let strict = cast(get("x"), DataType::Int32, CastMode::Strict).unwrap_err();
    assert!(strict.is_cast_failure());
    assert_eq!(cast(get("x"), DataType::Int32, CastMode::Lenient).unwrap(), Value::Null);

    assert!(cast(get("big"), DataType::Int8, CastMode::Strict).is_err());
    assert_eq!(cast(get("big"), DataType::Int8, CastMode::Lenient).unwrap(), Value::Null);
}

#[test]
fn concurrent_readers_share_one_buffer() {
    let doc = JsonbBinary::parse(
        r#"{"events":[{"type":"PushEvent","repo":{"name":"a/b"}},{"type":"WatchEvent"}]}"#,
    )
    .unwrap();
    let path = JsonPath::parse(":events[0].repo.name").unwrap();

    thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    let mut seen = Vec::new();
                    for _ in 0..1000 {
                        let value = cast_path(doc.as_bytes(), &path, DataType::String, CastMode::Strict)
                            .unwrap();
                        seen.push(value);
                    }
                    seen
                })
            })
            .collect();
        for handle in handles {
            let seen = handle.join().unwrap();
            assert!(seen.iter().all(|v| v == &Value::String("a/b".into())));
        }
    });
}

#[test]
fn decoded_tree_round_trips() {
    let text = r#"{"int":-9223372036854775808,"uint":18446744073709551615,"f":0.1,"s":"é\n","a":[null,false,{}]}"#;
    let doc = JsonbBinary::parse(text).unwrap();
    let tree = doc.decode().unwrap();
    assert_eq!(tree, JsonbValue::from_text(text).unwrap());
    assert_eq!(JsonbBinary::encode(&tree).unwrap(), doc);
    assert_eq!(tree.to_string(), doc.to_text().unwrap());
}
