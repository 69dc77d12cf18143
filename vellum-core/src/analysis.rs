//! Reference and dependency analysis: topological ordering, cycle
//! detection, parameter-usage pre-scan, and SAM implicit-resource inference.
//!
//! Every function here is a pure read of the [`Template`](crate::ir::Template)
//! built by the parser; none of it mutates the IR. The generator's
//! `GenContext` (see `crate::codegen::context`) is the only mutable state in
//! the pipeline.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::ir::Template;

/// The result of running dependency analysis over a template once, up
/// front, so the generator consults it rather than recomputing per resource.
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    /// Resource logical IDs in emission order: topologically sorted where
    /// possible, with cyclic/disconnected nodes appended lexicographically.
    pub resource_order: Vec<String>,
    /// Unordered pairs `(u, v)` where a `u -> v` edge participates in a
    /// cycle; `GetAtt` from `u` to `v` must use the explicit string-keyed
    /// form rather than bare field access.
    pub cyclic_edges: BTreeSet<(String, String)>,
    /// Parameters referenced (directly or via a bare `Fn::Sub` placeholder)
    /// somewhere in the template; only these are emitted.
    pub used_parameters: BTreeSet<String>,
    /// Logical IDs that do not name a declared resource, parameter, or
    /// pseudo-parameter, but are still valid reference targets because a
    /// SAM macro (`AWS::Serverless::Function/Api/HttpApi`) implicitly
    /// creates them at deploy time.
    pub implicit_resources: BTreeSet<String>,
}

impl Analysis {
    #[tracing::instrument(skip(template))]
    pub fn run(template: &Template) -> Self {
        let resource_order = topological_sort(template);
        let cyclic_edges = detect_cyclic_edges(template);
        let used_parameters = prescan_parameters(template);
        let implicit_resources = infer_sam_implicits(template);
        if !cyclic_edges.is_empty() {
            tracing::debug!(count = cyclic_edges.len(), "resource dependency cycle detected");
        }
        Analysis {
            resource_order,
            cyclic_edges,
            used_parameters,
            implicit_resources,
        }
    }

    pub fn is_cyclic_edge(&self, from: &str, to: &str) -> bool {
        self.cyclic_edges.contains(&(from.to_string(), to.to_string()))
    }

    pub fn is_used_parameter(&self, logical_id: &str) -> bool {
        self.used_parameters.contains(logical_id)
    }

    pub fn is_implicit(&self, logical_id: &str) -> bool {
        self.implicit_resources.contains(logical_id)
    }
}

/// Kahn's algorithm restricted to resource -> resource edges, lexicographic
/// tie-break within the ready queue. Resources left over after the sorted
/// prefix (cycle members, or nodes unreachable from any root) are appended
/// in lexicographic order.
fn topological_sort(template: &Template) -> Vec<String> {
    let resource_ids: BTreeSet<&String> = template.resources.keys().collect();

    let edges: BTreeMap<&String, Vec<&String>> = template
        .resources
        .keys()
        .map(|id| {
            let targets: Vec<&String> = template
                .reference_graph
                .get(id)
                .into_iter()
                .flatten()
                .filter(|t| resource_ids.contains(t) && *t != id)
                .collect();
            (id, targets)
        })
        .collect();

    // Our edges are recorded as `dependent -> dependency`, so a node is
    // ready only once everything *it* depends on has been emitted: track,
    // per node, how many of its dependencies remain unresolved.
    let mut remaining: BTreeMap<&String, usize> = resource_ids
        .iter()
        .map(|id| (*id, edges.get(id).map(Vec::len).unwrap_or(0)))
        .collect();

    // dependents[d] = nodes that depend on d, i.e. edges id -> d
    let mut dependents: BTreeMap<&String, Vec<&String>> = BTreeMap::new();
    for (id, targets) in &edges {
        for t in targets {
            dependents.entry(t).or_default().push(id);
        }
    }

    let mut queue: VecDeque<&String> = remaining
        .iter()
        .filter(|(_, &count)| count == 0)
        .map(|(id, _)| *id)
        .collect();
    let mut order: Vec<String> = Vec::new();
    let mut visited: BTreeSet<&String> = BTreeSet::new();

    while let Some(node) = pop_lexicographically_smallest(&mut queue, &visited) {
        if !visited.insert(node) {
            continue;
        }
        order.push(node.clone());
        if let Some(deps) = dependents.get(node) {
            for dependent in deps {
                if let Some(r) = remaining.get_mut(dependent) {
                    *r = r.saturating_sub(1);
                    if *r == 0 && !visited.contains(dependent) {
                        queue.push_back(dependent);
                    }
                }
            }
        }
    }

    let mut leftover: Vec<String> = resource_ids
        .into_iter()
        .filter(|id| !visited.contains(*id))
        .cloned()
        .collect();
    leftover.sort();
    order.extend(leftover);
    order
}

fn pop_lexicographically_smallest<'a>(
    queue: &mut VecDeque<&'a String>,
    visited: &BTreeSet<&'a String>,
) -> Option<&'a String> {
    // Drain the queue into a sorted candidate set each time so ties within
    // the current ready set always break lexicographically, matching §4.3.
    let mut candidates: Vec<&'a String> = queue.drain(..).filter(|n| !visited.contains(*n)).collect();
    candidates.sort();
    if candidates.is_empty() {
        return None;
    }
    let chosen = candidates.remove(0);
    for c in candidates {
        queue.push_back(c);
    }
    Some(chosen)
}

/// DFS-based cycle detection over resource -> resource edges. Returns the
/// set of edges that participate in at least one cycle.
fn detect_cyclic_edges(template: &Template) -> BTreeSet<(String, String)> {
    let resource_ids: BTreeSet<&String> = template.resources.keys().collect();
    let edges: BTreeMap<&String, Vec<&String>> = template
        .resources
        .keys()
        .map(|id| {
            let targets: Vec<&String> = template
                .reference_graph
                .get(id)
                .into_iter()
                .flatten()
                .filter(|t| resource_ids.contains(t) && *t != id)
                .collect();
            (id, targets)
        })
        .collect();

    let mut cyclic: BTreeSet<(String, String)> = BTreeSet::new();
    let mut color: BTreeMap<&String, u8> = BTreeMap::new(); // 0=white,1=gray,2=black
    let mut stack: Vec<&String> = Vec::new();

    for start in resource_ids.iter() {
        if color.get(*start).copied().unwrap_or(0) == 0 {
            dfs_visit(start, &edges, &mut color, &mut stack, &mut cyclic);
        }
    }
    cyclic
}

fn dfs_visit<'a>(
    node: &'a String,
    edges: &BTreeMap<&'a String, Vec<&'a String>>,
    color: &mut BTreeMap<&'a String, u8>,
    stack: &mut Vec<&'a String>,
    cyclic: &mut BTreeSet<(String, String)>,
) {
    color.insert(node, 1);
    stack.push(node);
    if let Some(targets) = edges.get(node) {
        for target in targets {
            match color.get(*target).copied().unwrap_or(0) {
                0 => dfs_visit(target, edges, color, stack, cyclic),
                1 => {
                    // Back edge to a gray ancestor: every edge on the stack
                    // from that ancestor forward, plus the closing edge, is
                    // part of this cycle.
                    if let Some(pos) = stack.iter().position(|n| *n == *target) {
                        for w in stack[pos..].windows(2) {
                            cyclic.insert((w[0].clone(), w[1].clone()));
                        }
                        cyclic.insert((node.clone(), (*target).clone()));
                    }
                }
                _ => {}
            }
        }
    }
    stack.pop();
    color.insert(node, 2);
}

/// Mark every parameter reachable via a `Ref` or bare `Fn::Sub` placeholder
/// anywhere in the template (conditions, resource properties, outputs) as
/// used. The reference graph already captures every such edge (built while
/// parsing), so this is a direct read rather than a second walk of the IR.
fn prescan_parameters(template: &Template) -> BTreeSet<String> {
    let mut used = BTreeSet::new();
    for targets in template.reference_graph.values() {
        for target in targets {
            if template.parameters.contains_key(target) {
                used.insert(target.clone());
            }
        }
    }
    used
}

/// For each SAM resource, the implicit logical IDs the macro creates at
/// deploy time. Per the open question in `spec.md` §9 (see `DESIGN.md`),
/// the implicit name is suppressed only when the template already declares
/// a resource or parameter with that exact name.
fn infer_sam_implicits(template: &Template) -> BTreeSet<String> {
    let mut implicits = BTreeSet::new();
    let already_declared = |name: &str| -> bool {
        template.resources.contains_key(name) || template.parameters.contains_key(name)
    };

    for (id, resource) in &template.resources {
        let candidates: Vec<String> = match resource.type_name.as_str() {
            "AWS::Serverless::Function" => vec![format!("{id}Role")],
            "AWS::Serverless::Api" => vec![format!("{id}Deployment"), format!("{id}Stage")],
            "AWS::Serverless::HttpApi" => vec![format!("{id}ApiGatewayDefaultStage")],
            _ => continue,
        };
        for name in candidates {
            if !already_declared(&name) {
                implicits.insert(name);
            }
        }
    }
    implicits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Resource, Value};
    use std::collections::BTreeMap;

    fn resource(id: &str, ty: &str, refs: Vec<&str>) -> (String, Resource, Vec<String>) {
        (
            id.to_string(),
            Resource {
                logical_id: id.to_string(),
                type_name: ty.to_string(),
                properties: vec![],
                depends_on: refs.iter().map(|s| s.to_string()).collect(),
                condition: None,
                deletion_policy: None,
                update_replace_policy: None,
                metadata: None,
            },
            refs.into_iter().map(str::to_string).collect(),
        )
    }

    fn build(resources: Vec<(String, Resource, Vec<String>)>) -> Template {
        let mut template = Template::default();
        for (id, res, edges) in resources {
            template.reference_graph.insert(id.clone(), edges);
            template.resources.insert(id, res);
        }
        template
    }

    #[test]
    fn topo_sort_orders_dependencies_first() {
        let template = build(vec![
            resource("B", "AWS::S3::Bucket", vec!["A"]),
            resource("A", "AWS::S3::Bucket", vec![]),
        ]);
        let order = topological_sort(&template);
        assert_eq!(order, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn cycle_members_still_appear_and_are_marked_cyclic() {
        let template = build(vec![
            resource("A", "AWS::S3::Bucket", vec!["B"]),
            resource("B", "AWS::S3::Bucket", vec!["A"]),
        ]);
        let cyclic = detect_cyclic_edges(&template);
        assert!(cyclic.contains(&("A".to_string(), "B".to_string())));
        let order = topological_sort(&template);
        assert_eq!(order.len(), 2);
    }

    #[test]
    fn parameter_prescan_uses_reference_graph() {
        let mut template = Template::default();
        template.parameters.insert(
            "Environment".to_string(),
            crate::ir::Parameter {
                logical_id: "Environment".to_string(),
                type_name: "String".to_string(),
                description: None,
                default: Some(Value::String("dev".to_string())),
                allowed_values: None,
                allowed_pattern: None,
                min_length: None,
                max_length: None,
                min_value: None,
                max_value: None,
                constraint_description: None,
                no_echo: false,
            },
        );
        template.parameters.insert(
            "UnusedParam".to_string(),
            crate::ir::Parameter {
                logical_id: "UnusedParam".to_string(),
                type_name: "String".to_string(),
                description: None,
                default: None,
                allowed_values: None,
                allowed_pattern: None,
                min_length: None,
                max_length: None,
                min_value: None,
                max_value: None,
                constraint_description: None,
                no_echo: false,
            },
        );
        template
            .reference_graph
            .insert("Bucket".to_string(), vec!["Environment".to_string()]);
        let used = prescan_parameters(&template);
        assert!(used.contains("Environment"));
        assert!(!used.contains("UnusedParam"));
    }

    #[test]
    fn sam_function_gets_implicit_role_unless_already_declared() {
        let mut template = Template::default();
        template.resources.insert(
            "MyFn".to_string(),
            Resource {
                logical_id: "MyFn".to_string(),
                type_name: "AWS::Serverless::Function".to_string(),
                properties: vec![],
                depends_on: vec![],
                condition: None,
                deletion_policy: None,
                update_replace_policy: None,
                metadata: None,
            },
        );
        let implicits = infer_sam_implicits(&template);
        assert!(implicits.contains("MyFnRole"));

        template.resources.insert(
            "MyFnRole".to_string(),
            Resource {
                logical_id: "MyFnRole".to_string(),
                type_name: "AWS::IAM::Role".to_string(),
                properties: vec![],
                depends_on: vec![],
                condition: None,
                deletion_policy: None,
                update_replace_policy: None,
                metadata: None,
            },
        );
        let implicits = infer_sam_implicits(&template);
        assert!(!implicits.contains("MyFnRole"));
    }
}
