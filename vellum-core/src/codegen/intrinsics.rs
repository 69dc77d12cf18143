//! One lowering rule per intrinsic function (`spec.md` §4.5), plus the
//! `Ref` / `GetAtt` emission rules from §4.4 that every other intrinsic and
//! the resource-property emitter both depend on.

use crate::codegen::naming;
use crate::codegen::{emit_value, GenContext, Scope};
use crate::error::Diagnostic;
use crate::ir::{Intrinsic, IntrinsicTag, Value};
use crate::registry;

const PSEUDO_PARAMS: &[(&str, &str)] = &[
    ("AWS::Region", "Region"),
    ("AWS::AccountId", "AccountId"),
    ("AWS::StackName", "StackName"),
    ("AWS::StackId", "StackId"),
    ("AWS::Partition", "Partition"),
    ("AWS::URLSuffix", "URLSuffix"),
    ("AWS::NoValue", "NoValue"),
    ("AWS::NotificationARNs", "NotificationARNs"),
];

fn pseudo_parameter_const(name: &str) -> Option<&'static str> {
    PSEUDO_PARAMS
        .iter()
        .find(|(k, _)| *k == name)
        .map(|(_, v)| *v)
}

/// Sanitized bare identifier for a known resource/parameter logical ID, as
/// used both at its own `var` declaration and at every bare-form reference
/// site.
pub fn sanitized_ref_identifier(logical_id: &str) -> String {
    naming::sanitize_identifier(logical_id, registry::is_reserved_name(logical_id))
}

/// `Ref` emission per §4.4: bare identifier for a known resource or used
/// parameter, the named pseudo-parameter constant, or an explicit
/// `Ref{"Name"}` for an implicit/unknown target.
pub fn emit_ref(name: &str, scope: &Scope, ctx: &mut GenContext) -> String {
    if let Some(constant) = pseudo_parameter_const(name) {
        return constant.to_string();
    }
    if ctx.template.resources.contains_key(name) || ctx.template.parameters.contains_key(name) {
        return sanitized_ref_identifier(name);
    }
    if !ctx.analysis.is_implicit(name) {
        ctx.diagnostics.push(Diagnostic::ReferenceToMissingTarget {
            from: scope.current_resource.to_string(),
            target: name.to_string(),
        });
    }
    format!("Ref{{{}}}", naming::quote(name))
}

/// `GetAtt` emission per §4.4: bare `Resource.Attr` field access for a
/// known, non-cyclic, single-segment attribute target; the explicit
/// `GetAtt{"Name", "Attr"}` form otherwise (nested dotted attribute,
/// implicit resource, unknown target, or a cyclic reference edge).
pub fn emit_getatt(resource: &str, attr: &str, scope: &Scope, ctx: &mut GenContext) -> String {
    let known = ctx.template.resources.contains_key(resource);
    let nested_attr = attr.contains('.');
    let cyclic = ctx
        .analysis
        .is_cyclic_edge(scope.current_resource, resource);
    let implicit = ctx.analysis.is_implicit(resource);

    if known && !nested_attr && !cyclic && !implicit {
        return format!("{}.{}", sanitized_ref_identifier(resource), attr);
    }
    if !known && !implicit {
        ctx.diagnostics.push(Diagnostic::ReferenceToMissingTarget {
            from: scope.current_resource.to_string(),
            target: resource.to_string(),
        });
    }
    format!(
        "GetAtt{{{}, {}}}",
        naming::quote(resource),
        naming::quote(attr)
    )
}

/// Entry point for every other intrinsic kind. `Ref`/`GetAtt` are handled by
/// the caller (`crate::codegen::emit_value`) directly since they need the
/// raw argument shape before it is generically converted.
pub fn emit(intr: &Intrinsic, scope: &Scope, ctx: &mut GenContext) -> String {
    match intr.tag {
        IntrinsicTag::Ref | IntrinsicTag::GetAtt => unreachable!("handled by emit_value"),
        IntrinsicTag::Sub => emit_sub(&intr.arg, scope, ctx),
        IntrinsicTag::Join => emit_join(&intr.arg, scope, ctx),
        IntrinsicTag::Select => emit_select(&intr.arg, scope, ctx),
        IntrinsicTag::GetAZs => emit_getazs(&intr.arg, scope, ctx),
        IntrinsicTag::If => emit_if(&intr.arg, scope, ctx),
        IntrinsicTag::Equals => emit_positional_pair("Equals", &intr.arg, scope, ctx),
        IntrinsicTag::And => emit_positional_list("And", &intr.arg, scope, ctx),
        IntrinsicTag::Or => emit_positional_list("Or", &intr.arg, scope, ctx),
        IntrinsicTag::Not => emit_positional_singleton("Not", &intr.arg, scope, ctx),
        IntrinsicTag::Base64 => emit_positional_singleton("Base64", &intr.arg, scope, ctx),
        IntrinsicTag::ImportValue => emit_positional_singleton("ImportValue", &intr.arg, scope, ctx),
        IntrinsicTag::FindInMap => emit_find_in_map(&intr.arg, scope, ctx),
        IntrinsicTag::Cidr => emit_positional_triple("Cidr", &intr.arg, scope, ctx),
        IntrinsicTag::Split => emit_positional_pair("Split", &intr.arg, scope, ctx),
        IntrinsicTag::Condition => emit_condition_ref(&intr.arg),
        IntrinsicTag::Transform => emit_transform(intr, scope, ctx),
    }
}

/// Exact-match `"${Name}"` / `"${Resource.Attr}"` simplification, per the
/// "Sub simplification" rule in §4.4. Anything else emits verbatim as
/// `Sub{...}` or `SubWithMap{...}`.
fn emit_sub(arg: &Value, scope: &Scope, ctx: &mut GenContext) -> String {
    match arg {
        Value::String(s) => {
            if let Some(simplified) = try_simplify_sub(s, scope, ctx) {
                return simplified;
            }
            format!("Sub{{String: {}}}", naming::quote(s))
        }
        Value::List(items) if items.len() == 2 => {
            let template_str = items[0].as_str().unwrap_or_default();
            if let Some(simplified) = try_simplify_sub(template_str, scope, ctx) {
                // A two-argument Sub still carries an (unused) Variables
                // map; simplification only applies when no other text is
                // present, so an empty-looking variables map is not worth
                // preserving once we've collapsed to Ref/GetAtt form.
                return simplified;
            }
            // The Variables map always emits as a free-form JSON object; it
            // is never type-checked against an enclosing struct.
            format!(
                "SubWithMap{{{}, {}}}",
                naming::quote(template_str),
                emit_value(&items[1], scope, ctx)
            )
        }
        other => format!("Sub{{String: {}}}", emit_value(other, scope, ctx)),
    }
}

/// If `s` is exactly `${Name}`, lower it through the `Ref`/`GetAtt` rules;
/// otherwise return `None` so the caller falls back to verbatim `Sub{...}`.
fn try_simplify_sub(s: &str, scope: &Scope, ctx: &mut GenContext) -> Option<String> {
    let inner = s.strip_prefix("${")?.strip_suffix('}')?;
    if inner.is_empty() || inner.contains("${") {
        return None;
    }
    match inner.split_once('.') {
        Some((resource, attr)) => Some(emit_getatt(resource, attr, scope, ctx)),
        None => Some(emit_ref(inner, scope, ctx)),
    }
}

fn emit_join(arg: &Value, scope: &Scope, ctx: &mut GenContext) -> String {
    let Some(items) = arg.as_list() else {
        return format!("Join{{{}}}", emit_value(arg, scope, ctx));
    };
    let delimiter = items.first().cloned().unwrap_or(Value::String(String::new()));
    let values = items.get(1).cloned().unwrap_or(Value::List(vec![]));
    let values_text = if matches!(values, Value::Intrinsic(_)) {
        format!("[]any{{{}}}", emit_value(&values, scope, ctx))
    } else {
        emit_value(&values, scope, ctx)
    };
    format!(
        "Join{{{}, {}}}",
        emit_value(&delimiter, scope, ctx),
        values_text
    )
}

/// `Select` index always collapses to an integer, whether the source form
/// is a string `"0"`, a float `0.0`, or an integer `0`.
fn emit_select(arg: &Value, scope: &Scope, ctx: &mut GenContext) -> String {
    let Some(items) = arg.as_list() else {
        return format!("Select{{{}}}", emit_value(arg, scope, ctx));
    };
    let index = items.first().map(select_index_text).unwrap_or_else(|| "0".to_string());
    let list = items.get(1).cloned().unwrap_or(Value::List(vec![]));
    format!("Select{{Index: {index}, List: {}}}", emit_value(&list, scope, ctx))
}

fn select_index_text(v: &Value) -> String {
    match v {
        Value::Int(i) => i.to_string(),
        Value::Float(f) => (*f as i64).to_string(),
        Value::String(s) => s
            .parse::<i64>()
            .map(|i| i.to_string())
            .unwrap_or_else(|_| "0".to_string()),
        _ => "0".to_string(),
    }
}

/// `GetAZs` region argument: empty string or `Ref AWS::Region` lowers to the
/// bare `GetAZs{}` form; a literal string region keeps it; anything else
/// falls back to `GetAZs{}` since the field is string-typed and cannot
/// accept a struct value.
fn emit_getazs(arg: &Value, _scope: &Scope, _ctx: &mut GenContext) -> String {
    match arg {
        Value::String(s) if s.is_empty() => "GetAZs{}".to_string(),
        Value::String(s) => format!("GetAZs{{Region: {}}}", naming::quote(s)),
        Value::Intrinsic(intr) if intr.tag == IntrinsicTag::Ref => {
            if intr.arg.as_str() == Some("AWS::Region") {
                "GetAZs{}".to_string()
            } else {
                "GetAZs{}".to_string()
            }
        }
        _ => "GetAZs{}".to_string(),
    }
}

/// `If{"Cond", trueVal, falseVal}`: both branches inherit the type context
/// of the property containing the `If`.
fn emit_if(arg: &Value, scope: &Scope, ctx: &mut GenContext) -> String {
    let Some(items) = arg.as_list() else {
        return format!("If{{{}}}", emit_value(arg, scope, ctx));
    };
    let cond = items.first().and_then(Value::as_str).unwrap_or_default();
    let true_val = items.get(1).cloned().unwrap_or(Value::Null);
    let false_val = items.get(2).cloned().unwrap_or(Value::Null);
    format!(
        "If{{{}, {}, {}}}",
        naming::quote(cond),
        emit_value(&true_val, scope, ctx),
        emit_value(&false_val, scope, ctx)
    )
}

fn emit_positional_pair(name: &str, arg: &Value, scope: &Scope, ctx: &mut GenContext) -> String {
    let Some(items) = arg.as_list() else {
        return format!("{name}{{{}}}", emit_value(arg, scope, ctx));
    };
    let a = items.first().cloned().unwrap_or(Value::Null);
    let b = items.get(1).cloned().unwrap_or(Value::Null);
    format!(
        "{name}{{{}, {}}}",
        emit_value(&a, scope, ctx),
        emit_value(&b, scope, ctx)
    )
}

fn emit_positional_triple(name: &str, arg: &Value, scope: &Scope, ctx: &mut GenContext) -> String {
    let Some(items) = arg.as_list() else {
        return format!("{name}{{{}}}", emit_value(arg, scope, ctx));
    };
    let parts: Vec<String> = (0..3)
        .map(|i| emit_value(items.get(i).unwrap_or(&Value::Null), scope, ctx))
        .collect();
    format!("{name}{{{}}}", parts.join(", "))
}

fn emit_positional_list(name: &str, arg: &Value, scope: &Scope, ctx: &mut GenContext) -> String {
    let Some(items) = arg.as_list() else {
        return format!("{name}{{{}}}", emit_value(arg, scope, ctx));
    };
    let parts: Vec<String> = items.iter().map(|v| emit_value(v, scope, ctx)).collect();
    format!("{name}{{{}}}", parts.join(", "))
}

fn emit_positional_singleton(name: &str, arg: &Value, scope: &Scope, ctx: &mut GenContext) -> String {
    format!("{name}{{{}}}", emit_value(arg, scope, ctx))
}

fn emit_find_in_map(arg: &Value, scope: &Scope, ctx: &mut GenContext) -> String {
    emit_positional_triple("FindInMap", arg, scope, ctx)
}

fn emit_condition_ref(arg: &Value) -> String {
    let name = arg.as_str().unwrap_or_default();
    format!("Condition{{{}}}", naming::quote(name))
}

/// `Fn::Transform` accepts both a map (`{Name, Parameters}`) and a
/// single-element-list source shape; anything else is an ambiguous shape
/// that falls back to the positional form per §6's `AmbiguousTransformShape`.
fn emit_transform(intr: &Intrinsic, scope: &Scope, ctx: &mut GenContext) -> String {
    if let Some(map) = intr.arg.as_map() {
        let name = map.get("Name").and_then(Value::as_str).unwrap_or_default();
        let params = map
            .get("Parameters")
            .cloned()
            .unwrap_or(Value::Map(Default::default()));
        return format!(
            "Transform{{Name: {}, Parameters: {}}}",
            naming::quote(name),
            emit_value(&params, scope, ctx)
        );
    }
    if let Some(list) = intr.arg.as_list() {
        if list.len() == 1 {
            if let Some(map) = list[0].as_map() {
                let name = map.get("Name").and_then(Value::as_str).unwrap_or_default();
                let params = map
                    .get("Parameters")
                    .cloned()
                    .unwrap_or(Value::Map(Default::default()));
                return format!(
                    "Transform{{Name: {}, Parameters: {}}}",
                    naming::quote(name),
                    emit_value(&params, scope, ctx)
                );
            }
        }
    }
    ctx.diagnostics.push(Diagnostic::AmbiguousTransformShape {
        logical_id: scope.current_resource.to_string(),
    });
    format!("Transform{{{}}}", emit_value(&intr.arg, scope, ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Analysis;
    use crate::ir::Template;

    fn fresh<'a>(template: &'a Template, analysis: &'a Analysis) -> GenContext<'a> {
        GenContext::new(template, analysis)
    }

    #[test]
    fn select_index_collapses_string_and_float_forms() {
        assert_eq!(select_index_text(&Value::String("0".to_string())), "0");
        assert_eq!(select_index_text(&Value::Float(0.0)), "0");
        assert_eq!(select_index_text(&Value::Int(2)), "2");
    }

    #[test]
    fn getazs_empty_and_ref_region_collapse_to_bare_form() {
        let template = Template::default();
        let analysis = Analysis::run(&template);
        let mut ctx = fresh(&template, &analysis);
        let scope = Scope::new("Subnet");
        assert_eq!(
            emit_getazs(&Value::String(String::new()), &scope, &mut ctx),
            "GetAZs{}"
        );
        let ref_region = Value::Intrinsic(Box::new(Intrinsic {
            tag: IntrinsicTag::Ref,
            arg: Value::String("AWS::Region".to_string()),
        }));
        assert_eq!(emit_getazs(&ref_region, &scope, &mut ctx), "GetAZs{}");
    }

    #[test]
    fn pseudo_parameter_emits_named_constant() {
        let template = Template::default();
        let analysis = Analysis::run(&template);
        let mut ctx = fresh(&template, &analysis);
        let scope = Scope::new("Bucket");
        assert_eq!(emit_ref("AWS::Region", &scope, &mut ctx), "Region");
    }
}
