use hgs_utils::{dejsonify, jsonify, load_overrides, read_json_arg};
use serde_json::{json, Value};
use std::io::Write;

#[test]
fn test_jsonify_sorts_keys() {
    let value = json!({"b": 1, "a": {"d": [{"z": 0, "y": 1}], "c": 2}});
    assert_eq!(
        jsonify(&value).unwrap(),
        r#"{"a":{"c":2,"d":[{"y":1,"z":0}]},"b":1}"#
    );
}

#[test]
fn test_dejsonify() {
    let v: Vec<Vec<usize>> = dejsonify("[[1,2],[],[0]]").unwrap();
    assert_eq!(v, vec![vec![1, 2], vec![], vec![0]]);
    assert!(dejsonify::<Vec<usize>>("[1,").is_err());
}

#[test]
fn test_read_json_arg_inline_and_file() {
    assert_eq!(read_json_arg(r#"{"a":1}"#).unwrap(), r#"{"a":1}"#);

    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(file, r#"{{"num_neighbours": 5}}"#).unwrap();
    let path = file.path().to_str().unwrap().to_string();
    assert_eq!(read_json_arg(&path).unwrap(), r#"{"num_neighbours": 5}"#);

    assert!(read_json_arg("/definitely/not/here.json").is_err());
}

#[test]
fn test_load_overrides() {
    assert!(load_overrides(None).unwrap().is_none());
    let map = load_overrides(Some(r#"{"seed": 3}"#)).unwrap().unwrap();
    assert_eq!(map.get("seed"), Some(&Value::from(3)));
    assert!(load_overrides(Some("[1, 2]")).is_err());
}
