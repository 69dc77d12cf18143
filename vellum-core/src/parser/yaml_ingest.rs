//! `serde_yaml::Value` -> `ir::Value`, recognizing both long-form intrinsic
//! mappings (`Fn::Sub: ...`) and shorthand tags (`!Sub ...`).

use std::collections::BTreeMap;

use crate::ir::{Intrinsic, IntrinsicTag, Value};

pub fn convert(v: &serde_yaml::Value) -> Value {
    match v {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(*b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::Float(n.as_f64().unwrap_or_default())
            }
        }
        serde_yaml::Value::String(s) => Value::String(s.clone()),
        serde_yaml::Value::Sequence(items) => Value::List(items.iter().map(convert).collect()),
        serde_yaml::Value::Mapping(map) => convert_mapping(map),
        serde_yaml::Value::Tagged(tagged) => {
            let tag_name = tagged.tag.to_string();
            let tag_name = tag_name.strip_prefix('!').unwrap_or(&tag_name);
            match IntrinsicTag::from_shorthand(tag_name) {
                Some(tag) => {
                    let inner = convert(&tagged.value);
                    let arg = if tag == IntrinsicTag::GetAtt {
                        getatt_arg_from_shorthand(inner)
                    } else {
                        inner
                    };
                    Value::Intrinsic(Box::new(Intrinsic { tag, arg }))
                }
                None => convert(&tagged.value),
            }
        }
    }
}

/// `!GetAtt "A.B.C"` becomes `["A", "B.C"]`: only the first dot separates the
/// resource name from the (possibly itself dotted) attribute path.
fn getatt_arg_from_shorthand(v: Value) -> Value {
    match v {
        Value::String(s) => match s.split_once('.') {
            Some((resource, attr)) => {
                Value::List(vec![Value::String(resource.to_string()), Value::String(attr.to_string())])
            }
            None => Value::List(vec![Value::String(s)]),
        },
        other => other,
    }
}

fn convert_mapping(map: &serde_yaml::Mapping) -> Value {
    if map.len() == 1 {
        let (key, val) = map.iter().next().expect("len == 1");
        if let Some(key_str) = key.as_str() {
            if let Some(tag) = IntrinsicTag::from_long_key(key_str) {
                let converted = convert(val);
                let arg = if tag == IntrinsicTag::GetAtt {
                    super::refs::normalize_getatt_arg(converted)
                } else {
                    converted
                };
                return Value::Intrinsic(Box::new(Intrinsic { tag, arg }));
            }
        }
    }
    let converted: BTreeMap<String, Value> = map
        .iter()
        .filter_map(|(k, v)| Some((k.as_str()?.to_string(), convert(v))))
        .collect();
    Value::Map(converted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::IntrinsicTag;

    fn parse(s: &str) -> serde_yaml::Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn shorthand_ref() {
        let v = convert(&parse("!Ref Param"));
        let intr = v.as_intrinsic().unwrap();
        assert_eq!(intr.tag, IntrinsicTag::Ref);
        assert_eq!(intr.arg.as_str(), Some("Param"));
    }

    #[test]
    fn shorthand_getatt_splits_on_first_dot() {
        let v = convert(&parse("!GetAtt MyDb.Endpoint.Address"));
        let intr = v.as_intrinsic().unwrap();
        assert_eq!(intr.tag, IntrinsicTag::GetAtt);
        let list = intr.arg.as_list().unwrap();
        assert_eq!(list[0].as_str(), Some("MyDb"));
        assert_eq!(list[1].as_str(), Some("Endpoint.Address"));
    }

    #[test]
    fn long_form_mapping_recognized_in_yaml_too() {
        let v = convert(&parse("Fn::Join: [\",\", [a, b]]"));
        let intr = v.as_intrinsic().unwrap();
        assert_eq!(intr.tag, IntrinsicTag::Join);
    }

    #[test]
    fn shorthand_sub() {
        let v = convert(&parse("!Sub 'arn:${AWS::Partition}:s3:::${BucketName}'"));
        let intr = v.as_intrinsic().unwrap();
        assert_eq!(intr.tag, IntrinsicTag::Sub);
        assert!(intr.arg.as_str().is_some());
    }
}
