//! `Fn::GetAtt` argument normalization and reference-graph construction.
//!
//! CloudFormation accepts `Fn::GetAtt` as either a two-element list
//! (`["A", "B"]`) or a single dotted string (`"A.B"`); this module
//! canonicalizes both into the list form the rest of the pipeline expects,
//! and walks a parsed [`Template`] to build `Template::reference_graph`.

use std::collections::BTreeMap;

use crate::ir::{Intrinsic, IntrinsicTag, Template, Value};

/// Canonicalize a raw `Fn::GetAtt` argument into `["Resource", "Attr[.Attr...]"]`.
///
/// Only the first `.` separates the resource name from the (possibly itself
/// dotted) attribute path, matching the YAML shorthand's splitting rule.
pub fn normalize_getatt_arg(arg: Value) -> Value {
    match arg {
        Value::String(s) => match s.split_once('.') {
            Some((resource, attr)) => Value::List(vec![
                Value::String(resource.to_string()),
                Value::String(attr.to_string()),
            ]),
            None => Value::List(vec![Value::String(s)]),
        },
        other => other,
    }
}

/// Walk every condition, resource, and output, recording an edge from the
/// enclosing logical ID to every `Ref` / `GetAtt` / `Condition` target, plus
/// every bare `${Name}` placeholder inside an `Fn::Sub` template string.
pub fn build_reference_graph(template: &Template) -> BTreeMap<String, Vec<String>> {
    let mut graph: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for (id, condition) in &template.conditions {
        let edges = graph.entry(id.clone()).or_default();
        walk_value(&condition.expression, edges);
    }

    for (id, resource) in &template.resources {
        let edges = graph.entry(id.clone()).or_default();
        for dep in &resource.depends_on {
            push_unique(edges, dep.clone());
        }
        if let Some(cond) = &resource.condition {
            push_unique(edges, cond.clone());
        }
        for prop in &resource.properties {
            walk_value(&prop.value, edges);
        }
    }

    for (id, output) in &template.outputs {
        let edges = graph.entry(id.clone()).or_default();
        walk_value(&output.value, edges);
        if let Some(export) = &output.export_name {
            walk_value(export, edges);
        }
        if let Some(cond) = &output.condition {
            push_unique(edges, cond.clone());
        }
    }

    graph
}

fn push_unique(edges: &mut Vec<String>, target: String) {
    if !edges.contains(&target) {
        edges.push(target);
    }
}

fn walk_value(value: &Value, edges: &mut Vec<String>) {
    match value {
        Value::Intrinsic(intr) => walk_intrinsic(intr, edges),
        Value::List(items) => {
            for item in items {
                walk_value(item, edges);
            }
        }
        Value::Map(map) => {
            for v in map.values() {
                walk_value(v, edges);
            }
        }
        _ => {}
    }
}

fn walk_intrinsic(intr: &Intrinsic, edges: &mut Vec<String>) {
    match intr.tag {
        IntrinsicTag::Ref => {
            if let Some(name) = intr.arg.as_str() {
                push_unique(edges, name.to_string());
            }
        }
        IntrinsicTag::GetAtt => {
            if let Some(list) = intr.arg.as_list() {
                if let Some(name) = list.first().and_then(Value::as_str) {
                    push_unique(edges, name.to_string());
                }
            }
        }
        IntrinsicTag::Condition => {
            if let Some(name) = intr.arg.as_str() {
                push_unique(edges, name.to_string());
            }
        }
        IntrinsicTag::Sub => walk_sub_placeholders(&intr.arg, edges),
        _ => walk_value(&intr.arg, edges),
    }
}

fn walk_sub_placeholders(arg: &Value, edges: &mut Vec<String>) {
    match arg {
        Value::String(s) => scan_placeholders(s, edges),
        Value::List(items) => {
            if let Some(Value::String(s)) = items.first() {
                scan_placeholders(s, edges);
            }
            for item in items.iter().skip(1) {
                walk_value(item, edges);
            }
        }
        _ => {}
    }
}

/// Scan a `Fn::Sub` template string for `${Name}` placeholders. Pseudo
/// parameters (`${AWS::...}`) and `GetAtt` shorthand (`${Resource.Attr}`,
/// recognizable by the embedded `.`) are skipped; only bare names that could
/// be a resource, parameter, or implicit-resource reference become edges.
fn scan_placeholders(s: &str, edges: &mut Vec<String>) {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' && bytes.get(i + 1) == Some(&b'{') {
            if let Some(end) = s[i + 2..].find('}') {
                let name = &s[i + 2..i + 2 + end];
                if !name.starts_with("AWS::") && !name.contains('.') && !name.is_empty() {
                    push_unique(edges, name.to_string());
                }
                i += 2 + end + 1;
                continue;
            }
        }
        i += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Property, Resource};

    #[test]
    fn getatt_string_form_splits_first_dot() {
        let v = normalize_getatt_arg(Value::String("MyDb.Endpoint.Address".to_string()));
        let list = v.as_list().unwrap();
        assert_eq!(list[0].as_str(), Some("MyDb"));
        assert_eq!(list[1].as_str(), Some("Endpoint.Address"));
    }

    #[test]
    fn sub_placeholders_skip_pseudo_and_getatt_shorthand() {
        let mut template = Template::default();
        template.resources.insert(
            "Fn".to_string(),
            Resource {
                logical_id: "Fn".to_string(),
                type_name: "AWS::Lambda::Function".to_string(),
                properties: vec![Property {
                    cfn_name: "Description".to_string(),
                    field_name: "Description".to_string(),
                    value: Value::Intrinsic(Box::new(Intrinsic {
                        tag: IntrinsicTag::Sub,
                        arg: Value::String(
                            "${AWS::Region}-${Bucket.Arn}-${Environment}".to_string(),
                        ),
                    })),
                }],
                depends_on: vec![],
                condition: None,
                deletion_policy: None,
                update_replace_policy: None,
                metadata: None,
            },
        );
        let graph = build_reference_graph(&template);
        assert_eq!(graph["Fn"], vec!["Environment".to_string()]);
    }

    #[test]
    fn direct_getatt_edge_recorded_regardless_of_attribute_depth() {
        let mut template = Template::default();
        template.resources.insert(
            "Fn".to_string(),
            Resource {
                logical_id: "Fn".to_string(),
                type_name: "AWS::Lambda::Function".to_string(),
                properties: vec![Property {
                    cfn_name: "Description".to_string(),
                    field_name: "Description".to_string(),
                    value: Value::Intrinsic(Box::new(Intrinsic {
                        tag: IntrinsicTag::GetAtt,
                        arg: Value::List(vec![
                            Value::String("Bucket".to_string()),
                            Value::String("Arn".to_string()),
                        ]),
                    })),
                }],
                depends_on: vec![],
                condition: None,
                deletion_policy: None,
                update_replace_policy: None,
                metadata: None,
            },
        );
        let graph = build_reference_graph(&template);
        assert_eq!(graph["Fn"], vec!["Bucket".to_string()]);
    }
}
