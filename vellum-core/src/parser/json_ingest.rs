//! `serde_json::Value` -> `ir::Value`, recognizing long-form intrinsics
//! (single-key objects named `"Ref"`, `"Fn::Sub"`, ...) as they are found.

use std::collections::BTreeMap;

use crate::ir::{Intrinsic, IntrinsicTag, Value};

pub fn convert(v: &serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::Float(n.as_f64().unwrap_or_default())
            }
        }
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(items) => Value::List(items.iter().map(convert).collect()),
        serde_json::Value::Object(map) => convert_object(map),
    }
}

fn convert_object(map: &serde_json::Map<String, serde_json::Value>) -> Value {
    if map.len() == 1 {
        let (key, val) = map.iter().next().expect("len == 1");
        if let Some(tag) = IntrinsicTag::from_long_key(key) {
            let arg = if tag == IntrinsicTag::GetAtt {
                super::refs::normalize_getatt_arg(convert(val))
            } else {
                convert(val)
            };
            return Value::Intrinsic(Box::new(Intrinsic { tag, arg }));
        }
    }
    let converted: BTreeMap<String, Value> =
        map.iter().map(|(k, v)| (k.clone(), convert(v))).collect();
    Value::Map(converted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_ref() {
        let json: serde_json::Value = serde_json::json!({"Ref": "MyParam"});
        let v = convert(&json);
        let intr = v.as_intrinsic().unwrap();
        assert_eq!(intr.tag, IntrinsicTag::Ref);
        assert_eq!(intr.arg.as_str(), Some("MyParam"));
    }

    #[test]
    fn recognizes_getatt_list_form() {
        let json: serde_json::Value = serde_json::json!({"Fn::GetAtt": ["Bucket", "Arn"]});
        let v = convert(&json);
        let intr = v.as_intrinsic().unwrap();
        assert_eq!(intr.tag, IntrinsicTag::GetAtt);
        let list = intr.arg.as_list().unwrap();
        assert_eq!(list[0].as_str(), Some("Bucket"));
        assert_eq!(list[1].as_str(), Some("Arn"));
    }

    #[test]
    fn plain_object_is_a_map() {
        let json: serde_json::Value = serde_json::json!({"a": 1, "b": "x"});
        let v = convert(&json);
        assert!(v.as_map().is_some());
    }
}
