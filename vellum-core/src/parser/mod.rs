//! Template ingestion: bytes -> [`Template`](crate::ir::Template).
//!
//! Tries JSON first since it is the stricter, cheaper grammar to reject on,
//! then falls back to YAML, which is where CloudFormation's shorthand
//! intrinsic tags (`!Ref`, `!GetAtt`, ...) live. Long-form
//! (`{"Ref": "Name"}`) and shorthand (`!Ref Name`) inputs converge on the
//! same `ir::Value::Intrinsic` representation, so every later stage is
//! agnostic to which surface form produced a template.

mod json_ingest;
mod refs;
mod yaml_ingest;

use std::collections::BTreeMap;

use crate::error::ParseError;
use crate::ir::{Condition, Mapping, Output, Parameter, Property, Resource, Template, Value};

/// Parse a byte buffer into a [`Template`].
///
/// `source_name` is used only for diagnostics; reading the file from disk is
/// the caller's job (`vellum-cli`), not the core's.
#[tracing::instrument(skip(bytes), fields(bytes = bytes.len()))]
pub fn parse(bytes: &[u8], source_name: &str) -> Result<Template, ParseError> {
    let root = match serde_json::from_slice::<serde_json::Value>(bytes) {
        Ok(v) => json_ingest::convert(&v),
        Err(json_err) => match serde_yaml::from_slice::<serde_yaml::Value>(bytes) {
            Ok(v) => yaml_ingest::convert(&v),
            Err(yaml_err) => {
                return Err(ParseError::MalformedDocument {
                    source_name: source_name.to_string(),
                    message: format!(
                        "not valid JSON ({json_err}) and not valid YAML ({yaml_err})"
                    ),
                    line: yaml_err.location().map(|l| l.line()),
                })
            }
        },
    };

    let root_map = root.as_map().ok_or_else(|| ParseError::MalformedDocument {
        source_name: source_name.to_string(),
        message: "document root is not a mapping".to_string(),
        line: None,
    })?;

    if root_map.contains_key("apiVersion") && root_map.contains_key("kind") {
        return Err(ParseError::UnsupportedInputKind {
            source_name: source_name.to_string(),
            detected: "Kubernetes-style manifest (apiVersion/kind)".to_string(),
        });
    }

    let mut template = build_template(root_map, source_name)?;
    template.reference_graph = refs::build_reference_graph(&template);
    tracing::debug!(
        resources = template.resources.len(),
        parameters = template.parameters.len(),
        "parsed template"
    );
    Ok(template)
}

fn build_template(
    root: &BTreeMap<String, Value>,
    source_name: &str,
) -> Result<Template, ParseError> {
    let format_version = root
        .get("AWSTemplateFormatVersion")
        .and_then(Value::as_str)
        .map(str::to_string);
    let description = root
        .get("Description")
        .and_then(Value::as_str)
        .map(str::to_string);

    let parameters = root
        .get("Parameters")
        .and_then(Value::as_map)
        .map(build_parameters)
        .unwrap_or_default();

    let mappings = root
        .get("Mappings")
        .and_then(Value::as_map)
        .map(build_mappings)
        .unwrap_or_default();

    let conditions = root
        .get("Conditions")
        .and_then(Value::as_map)
        .map(build_conditions)
        .unwrap_or_default();

    // A template with no `Resources` key at all still parses (it may exist
    // only to declare parameters/mappings/outputs); a `Resources` key that
    // is present but not a mapping is the malformed case.
    let resources = match root.get("Resources") {
        None => BTreeMap::new(),
        Some(v) => v.as_map().map(build_resources).ok_or_else(|| {
            ParseError::MalformedDocument {
                source_name: source_name.to_string(),
                message: "Resources is not a mapping".to_string(),
                line: None,
            }
        })?,
    };

    let outputs = root
        .get("Outputs")
        .and_then(Value::as_map)
        .map(build_outputs)
        .unwrap_or_default();

    Ok(Template {
        format_version,
        description,
        parameters,
        mappings,
        conditions,
        resources,
        outputs,
        reference_graph: BTreeMap::new(),
        source_name: source_name.to_string(),
    })
}

fn build_parameters(raw: &BTreeMap<String, Value>) -> BTreeMap<String, Parameter> {
    raw.iter()
        .filter_map(|(id, v)| {
            let m = v.as_map()?;
            let type_name = m.get("Type").and_then(Value::as_str)?.to_string();
            Some((
                id.clone(),
                Parameter {
                    logical_id: id.clone(),
                    type_name,
                    description: m
                        .get("Description")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    default: m.get("Default").cloned(),
                    allowed_values: m
                        .get("AllowedValues")
                        .and_then(Value::as_list)
                        .map(|l| l.to_vec()),
                    allowed_pattern: m
                        .get("AllowedPattern")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    min_length: m.get("MinLength").and_then(value_as_i64),
                    max_length: m.get("MaxLength").and_then(value_as_i64),
                    min_value: m.get("MinValue").and_then(value_as_i64),
                    max_value: m.get("MaxValue").and_then(value_as_i64),
                    constraint_description: m
                        .get("ConstraintDescription")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    no_echo: matches!(m.get("NoEcho"), Some(Value::Bool(true))),
                },
            ))
        })
        .collect()
}

fn value_as_i64(v: &Value) -> Option<i64> {
    match v {
        Value::Int(i) => Some(*i),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn build_mappings(raw: &BTreeMap<String, Value>) -> BTreeMap<String, Mapping> {
    raw.iter()
        .filter_map(|(id, v)| {
            let top = v.as_map()?;
            let entries = top
                .iter()
                .filter_map(|(k, v)| Some((k.clone(), v.as_map()?.clone())))
                .collect();
            Some((
                id.clone(),
                Mapping {
                    logical_id: id.clone(),
                    entries,
                },
            ))
        })
        .collect()
}

fn build_conditions(raw: &BTreeMap<String, Value>) -> BTreeMap<String, Condition> {
    raw.iter()
        .map(|(id, v)| {
            (
                id.clone(),
                Condition {
                    logical_id: id.clone(),
                    expression: v.clone(),
                },
            )
        })
        .collect()
}

fn build_resources(raw: &BTreeMap<String, Value>) -> BTreeMap<String, Resource> {
    raw.iter()
        .filter_map(|(id, v)| {
            let m = v.as_map()?;
            let type_name = m.get("Type").and_then(Value::as_str)?.to_string();
            let properties = m
                .get("Properties")
                .and_then(Value::as_map)
                .map(|props| {
                    props
                        .iter()
                        .map(|(name, value)| Property {
                            cfn_name: name.clone(),
                            field_name: crate::codegen::naming::sanitize_field_name(name),
                            value: value.clone(),
                        })
                        .collect()
                })
                .unwrap_or_default();
            let depends_on = match m.get("DependsOn") {
                Some(Value::String(s)) => vec![s.clone()],
                Some(Value::List(items)) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
                _ => Vec::new(),
            };
            Some((
                id.clone(),
                Resource {
                    logical_id: id.clone(),
                    type_name,
                    properties,
                    depends_on,
                    condition: m
                        .get("Condition")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    deletion_policy: m
                        .get("DeletionPolicy")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    update_replace_policy: m
                        .get("UpdateReplacePolicy")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    metadata: m.get("Metadata").cloned(),
                },
            ))
        })
        .collect()
}

fn build_outputs(raw: &BTreeMap<String, Value>) -> BTreeMap<String, Output> {
    raw.iter()
        .filter_map(|(id, v)| {
            let m = v.as_map()?;
            let value = m.get("Value")?.clone();
            let export_name = m
                .get("Export")
                .and_then(Value::as_map)
                .and_then(|e| e.get("Name"))
                .cloned();
            Some((
                id.clone(),
                Output {
                    logical_id: id.clone(),
                    value,
                    description: m
                        .get("Description")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    export_name,
                    condition: m
                        .get("Condition")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                },
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_cfn_kinds() {
        let yaml = b"apiVersion: v1\nkind: Pod\n";
        let err = parse(yaml, "pod.yaml").unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedInputKind { .. }));
    }

    #[test]
    fn parses_template_with_no_resources_key() {
        let json = br#"{"AWSTemplateFormatVersion": "2010-09-09"}"#;
        let t = parse(json, "empty.json").unwrap();
        assert!(t.resources.is_empty());
    }

    #[test]
    fn parses_minimal_json_template() {
        let json = br#"{
            "Resources": {
                "MyBucket": {
                    "Type": "AWS::S3::Bucket",
                    "Properties": { "BucketName": "my-test-bucket" }
                }
            }
        }"#;
        let t = parse(json, "t.json").unwrap();
        assert_eq!(t.resources.len(), 1);
        let r = &t.resources["MyBucket"];
        assert_eq!(r.type_name, "AWS::S3::Bucket");
        assert_eq!(
            r.property("BucketName").and_then(Value::as_str),
            Some("my-test-bucket")
        );
    }

    #[test]
    fn parses_yaml_shorthand_ref() {
        let yaml = b"
Resources:
  Bucket:
    Type: AWS::S3::Bucket
    Properties:
      BucketName: !Ref Param
  Policy:
    Type: AWS::S3::BucketPolicy
    Properties:
      Bucket: !Ref Bucket
";
        let t = parse(yaml, "t.yaml").unwrap();
        let bucket_name = t.resources["Bucket"].property("BucketName").unwrap();
        assert!(bucket_name.as_intrinsic().is_some());
    }
}
