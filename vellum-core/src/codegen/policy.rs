//! IAM policy flattening (`spec.md` §4.6): lifting an inline policy
//! document into typed `PolicyDocument` / `PolicyStatement` / `Principal` /
//! `Condition` blocks with operator constants, rather than emitting the
//! nested nested-map shape CloudFormation actually uses.

use std::collections::BTreeMap;

use crate::codegen::naming;
use crate::codegen::{emit_value, GenContext, Scope};
use crate::ir::Value;

/// Property names whose value is an inline IAM policy document.
pub const POLICY_PROPERTY_NAMES: &[&str] =
    &["AssumeRolePolicyDocument", "PolicyDocument", "KeyPolicy"];

const IAM_CONDITION_OPERATORS: &[&str] = &[
    "StringEquals", "StringNotEquals", "StringLike", "StringNotLike",
    "NumericEquals", "NumericNotEquals", "NumericLessThan", "NumericLessThanEquals",
    "NumericGreaterThan", "NumericGreaterThanEquals", "DateEquals", "DateNotEquals",
    "DateLessThan", "DateLessThanEquals", "DateGreaterThan", "DateGreaterThanEquals",
    "Bool", "BinaryEquals", "IpAddress", "NotIpAddress", "ArnEquals", "ArnLike",
    "ArnNotEquals", "ArnNotLike", "Null",
];

pub fn is_policy_property(name: &str) -> bool {
    POLICY_PROPERTY_NAMES.contains(&name)
}

/// Lower a policy-document map into a top-level `PolicyDocument` block (plus
/// one block per statement), pushing them onto `ctx` and returning the
/// identifier of the document block for the caller to reference in place of
/// the original property value.
pub fn emit_policy_document(
    block_prefix: &str,
    value: &Value,
    scope: &Scope,
    ctx: &mut GenContext,
) -> String {
    let Some(map) = value.as_map() else {
        return emit_value(value, scope, ctx);
    };

    let version = map
        .get("Version")
        .and_then(Value::as_str)
        .unwrap_or("2012-10-17")
        .to_string();

    let statements = map.get("Statement").and_then(Value::as_list).unwrap_or(&[]);
    let mut statement_refs = Vec::with_capacity(statements.len());
    for (i, statement) in statements.iter().enumerate() {
        let stmt_name = ctx.unique_block_name(&format!("{block_prefix}Statement{i}"));
        let (type_name, body) = emit_statement_body(statement, scope, ctx);
        ctx.push_block(stmt_name.clone(), type_name, body);
        statement_refs.push(stmt_name);
    }

    let doc_name = ctx.unique_block_name(block_prefix);
    let statement_list = statement_refs.join(", ");
    let doc_body = format!(
        "PolicyDocument{{Version: {}, Statement: []any{{{}}}}}",
        naming::quote(&version),
        statement_list
    );
    ctx.push_block(doc_name.clone(), "PolicyDocument".to_string(), doc_body);
    doc_name
}

fn emit_statement_body(statement: &Value, scope: &Scope, ctx: &mut GenContext) -> (String, String) {
    let Some(map) = statement.as_map() else {
        return ("PolicyStatement".to_string(), emit_value(statement, scope, ctx));
    };

    let is_deny = matches!(map.get("Effect").and_then(Value::as_str), Some("Deny"));
    let type_name = if is_deny { "DenyStatement" } else { "PolicyStatement" };

    let mut fields = Vec::new();
    for (key, value) in map {
        if key == "Effect" {
            if is_deny {
                continue; // implicit from the DenyStatement type name
            }
            fields.push(format!("Effect: {}", naming::quote(value.as_str().unwrap_or("Allow"))));
            continue;
        }
        if key == "Principal" || key == "NotPrincipal" {
            fields.push(format!("{key}: {}", emit_principal(value, scope, ctx)));
            continue;
        }
        if key == "Condition" {
            fields.push(format!("Condition: {}", emit_condition(value, scope, ctx)));
            continue;
        }
        let field_name = naming::sanitize_field_name(key);
        fields.push(format!("{field_name}: {}", emit_value(value, scope, ctx)));
    }

    (type_name.to_string(), format!("{type_name}{{{}}}", fields.join(", ")))
}

fn emit_principal(value: &Value, scope: &Scope, ctx: &mut GenContext) -> String {
    if let Some("*") = value.as_str() {
        return naming::quote("*");
    }
    let Some(map) = value.as_map() else {
        return emit_value(value, scope, ctx);
    };
    if let Some(service) = map.get("Service") {
        return format!("ServicePrincipal{{{}}}", principal_values(service, scope, ctx));
    }
    if let Some(aws) = map.get("AWS") {
        return format!("AWSPrincipal{{{}}}", principal_values(aws, scope, ctx));
    }
    if let Some(federated) = map.get("Federated") {
        return format!(
            "FederatedPrincipal{{{}}}",
            principal_values(federated, scope, ctx)
        );
    }
    emit_value(value, scope, ctx)
}

fn principal_values(value: &Value, scope: &Scope, ctx: &mut GenContext) -> String {
    match value {
        Value::List(items) => items
            .iter()
            .map(|v| emit_value(v, scope, ctx))
            .collect::<Vec<_>>()
            .join(", "),
        other => emit_value(other, scope, ctx),
    }
}

/// `Condition` map keys matching the known IAM operator set are emitted as
/// named constants (unquoted identifiers); any other key stays a quoted
/// string.
fn emit_condition(value: &Value, scope: &Scope, ctx: &mut GenContext) -> String {
    let Some(map) = value.as_map() else {
        return emit_value(value, scope, ctx);
    };
    let entries: Vec<String> = map
        .iter()
        .map(|(k, v)| {
            let key = condition_key(k);
            format!("{key}: {}", emit_value(v, scope, ctx))
        })
        .collect();
    format!("map[string]any{{{}}}", entries.join(", "))
}

fn condition_key(operator: &str) -> String {
    if IAM_CONDITION_OPERATORS.contains(&operator) {
        operator.to_string()
    } else {
        naming::quote(operator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Analysis;
    use crate::ir::Template;
    use std::collections::BTreeMap as Map;

    fn service_principal_statement() -> Value {
        let mut principal_map = Map::new();
        principal_map.insert(
            "Service".to_string(),
            Value::String("lambda.amazonaws.com".to_string()),
        );
        let mut stmt = Map::new();
        stmt.insert("Effect".to_string(), Value::String("Allow".to_string()));
        stmt.insert("Principal".to_string(), Value::Map(principal_map));
        stmt.insert(
            "Action".to_string(),
            Value::String("sts:AssumeRole".to_string()),
        );
        Value::Map(stmt)
    }

    #[test]
    fn deny_statement_suppresses_effect_field() {
        let template = Template::default();
        let analysis = Analysis::run(&template);
        let mut ctx = GenContext::new(&template, &analysis);
        let scope = Scope::new("MyRole");
        let mut stmt = Map::new();
        stmt.insert("Effect".to_string(), Value::String("Deny".to_string()));
        stmt.insert("Action".to_string(), Value::String("*".to_string()));
        let (type_name, body) = emit_statement_body(&Value::Map(stmt), &scope, &mut ctx);
        assert_eq!(type_name, "DenyStatement");
        assert!(!body.contains("Effect"));
    }

    #[test]
    fn service_principal_lowers_to_typed_block() {
        let template = Template::default();
        let analysis = Analysis::run(&template);
        let mut ctx = GenContext::new(&template, &analysis);
        let scope = Scope::new("MyRole");
        let (type_name, body) = emit_statement_body(&service_principal_statement(), &scope, &mut ctx);
        assert_eq!(type_name, "PolicyStatement");
        assert!(body.contains("ServicePrincipal{\"lambda.amazonaws.com\"}"));
    }

    #[test]
    fn known_condition_operator_is_unquoted() {
        assert_eq!(condition_key("StringEquals"), "StringEquals");
        assert_eq!(condition_key("aws:SomeWeirdKey"), "\"aws:SomeWeirdKey\"");
    }
}
