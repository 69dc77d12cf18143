//! Intermediate Representation - a lossless model of a CloudFormation document
//!
//! The IR is constructed once by the parser and treated as read-only by
//! analysis and generation. Every collection here that participates in code
//! generation is a `BTreeMap`, so lexicographic iteration order falls out of
//! the type rather than needing a separate sort step at every call site.

use std::collections::BTreeMap;

/// Pseudo-parameters CloudFormation provides without a declaration.
pub const PSEUDO_PARAMETERS: &[&str] = &[
    "AWS::Region",
    "AWS::AccountId",
    "AWS::StackName",
    "AWS::StackId",
    "AWS::Partition",
    "AWS::URLSuffix",
    "AWS::NoValue",
    "AWS::NotificationARNs",
];

/// The 18 intrinsic function kinds a template may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IntrinsicTag {
    Ref,
    GetAtt,
    Sub,
    Join,
    Select,
    GetAZs,
    If,
    Equals,
    And,
    Or,
    Not,
    Base64,
    FindInMap,
    Cidr,
    ImportValue,
    Split,
    Transform,
    Condition,
}

impl IntrinsicTag {
    /// The long-form CloudFormation key for this intrinsic, e.g. `"Fn::Sub"`.
    pub fn long_key(self) -> &'static str {
        match self {
            IntrinsicTag::Ref => "Ref",
            IntrinsicTag::Condition => "Condition",
            IntrinsicTag::GetAtt => "Fn::GetAtt",
            IntrinsicTag::Sub => "Fn::Sub",
            IntrinsicTag::Join => "Fn::Join",
            IntrinsicTag::Select => "Fn::Select",
            IntrinsicTag::GetAZs => "Fn::GetAZs",
            IntrinsicTag::If => "Fn::If",
            IntrinsicTag::Equals => "Fn::Equals",
            IntrinsicTag::And => "Fn::And",
            IntrinsicTag::Or => "Fn::Or",
            IntrinsicTag::Not => "Fn::Not",
            IntrinsicTag::Base64 => "Fn::Base64",
            IntrinsicTag::FindInMap => "Fn::FindInMap",
            IntrinsicTag::Cidr => "Fn::Cidr",
            IntrinsicTag::ImportValue => "Fn::ImportValue",
            IntrinsicTag::Split => "Fn::Split",
            IntrinsicTag::Transform => "Fn::Transform",
        }
    }

    /// Resolve a long-form key (`"Ref"`, `"Fn::Sub"`, ...) to its tag.
    pub fn from_long_key(key: &str) -> Option<Self> {
        Some(match key {
            "Ref" => IntrinsicTag::Ref,
            "Condition" => IntrinsicTag::Condition,
            "Fn::GetAtt" => IntrinsicTag::GetAtt,
            "Fn::Sub" => IntrinsicTag::Sub,
            "Fn::Join" => IntrinsicTag::Join,
            "Fn::Select" => IntrinsicTag::Select,
            "Fn::GetAZs" => IntrinsicTag::GetAZs,
            "Fn::If" => IntrinsicTag::If,
            "Fn::Equals" => IntrinsicTag::Equals,
            "Fn::And" => IntrinsicTag::And,
            "Fn::Or" => IntrinsicTag::Or,
            "Fn::Not" => IntrinsicTag::Not,
            "Fn::Base64" => IntrinsicTag::Base64,
            "Fn::FindInMap" => IntrinsicTag::FindInMap,
            "Fn::Cidr" => IntrinsicTag::Cidr,
            "Fn::ImportValue" => IntrinsicTag::ImportValue,
            "Fn::Split" => IntrinsicTag::Split,
            "Fn::Transform" => IntrinsicTag::Transform,
            _ => return None,
        })
    }

    /// Resolve a YAML shorthand tag name (already stripped of its leading
    /// `!`, e.g. `"GetAtt"`) to its tag.
    pub fn from_shorthand(name: &str) -> Option<Self> {
        Some(match name {
            "Ref" => IntrinsicTag::Ref,
            "Condition" => IntrinsicTag::Condition,
            "GetAtt" => IntrinsicTag::GetAtt,
            "Sub" => IntrinsicTag::Sub,
            "Join" => IntrinsicTag::Join,
            "Select" => IntrinsicTag::Select,
            "GetAZs" => IntrinsicTag::GetAZs,
            "If" => IntrinsicTag::If,
            "Equals" => IntrinsicTag::Equals,
            "And" => IntrinsicTag::And,
            "Or" => IntrinsicTag::Or,
            "Not" => IntrinsicTag::Not,
            "Base64" => IntrinsicTag::Base64,
            "FindInMap" => IntrinsicTag::FindInMap,
            "Cidr" => IntrinsicTag::Cidr,
            "ImportValue" => IntrinsicTag::ImportValue,
            "Split" => IntrinsicTag::Split,
            "Transform" => IntrinsicTag::Transform,
            _ => return None,
        })
    }
}

/// An intrinsic function call: a tag plus its raw, not-yet-typed argument.
///
/// The argument shape depends on the tag (a bare string for `Ref`, a list for
/// `Fn::Join`, a map for `Fn::Transform`, ...). Lowering rules in
/// `crate::intrinsics` are responsible for matching on the expected shape;
/// the IR itself does not enforce it, so a malformed template still parses
/// and can be diagnosed during generation rather than rejected outright.
#[derive(Debug, Clone, PartialEq)]
pub struct Intrinsic {
    pub tag: IntrinsicTag,
    pub arg: Value,
}

/// The recursive payload of a property, intrinsic argument, condition
/// expression, or output value.
///
/// A closed variant type rather than dynamic dispatch, so every lowering
/// rule in `crate::intrinsics` and `crate::codegen` can match exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Intrinsic(Box<Intrinsic>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_intrinsic(&self) -> Option<&Intrinsic> {
        match self {
            Value::Intrinsic(i) => Some(i),
            _ => None,
        }
    }

    /// True if this value, emitted as-is, produces a CloudFormation list
    /// rather than a scalar (used by list-field wrapping in codegen).
    pub fn is_scalar_intrinsic(&self) -> bool {
        matches!(
            self,
            Value::Intrinsic(i)
                if matches!(
                    i.tag,
                    IntrinsicTag::Ref
                        | IntrinsicTag::GetAtt
                        | IntrinsicTag::GetAZs
                        | IntrinsicTag::Split
                        | IntrinsicTag::If
                )
        )
    }
}

/// A declared CloudFormation parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub logical_id: String,
    pub type_name: String,
    pub description: Option<String>,
    pub default: Option<Value>,
    pub allowed_values: Option<Vec<Value>>,
    pub allowed_pattern: Option<String>,
    pub min_length: Option<i64>,
    pub max_length: Option<i64>,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
    pub constraint_description: Option<String>,
    pub no_echo: bool,
}

impl Parameter {
    /// Whether the declared type makes this parameter list-valued
    /// (`CommaDelimitedList`, `List<...>`, or `...<List<...>>`).
    pub fn is_list_type(&self) -> bool {
        self.type_name == "CommaDelimitedList"
            || self.type_name.starts_with("List<")
            || self.type_name.contains("<List<")
    }
}

/// A two-level lookup table: top key -> second key -> value.
#[derive(Debug, Clone, PartialEq)]
pub struct Mapping {
    pub logical_id: String,
    pub entries: BTreeMap<String, BTreeMap<String, Value>>,
}

/// A named Boolean expression built from literals, refs, and condition
/// intrinsics (`Fn::Equals`, `Fn::And`, `Fn::Or`, `Fn::Not`, `Fn::If`, or a
/// reference to another condition by name).
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub logical_id: String,
    pub expression: Value,
}

/// A single resource property: its CloudFormation name, its sanitized target
/// field name, and its value tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub cfn_name: String,
    pub field_name: String,
    pub value: Value,
}

/// A declared resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub logical_id: String,
    pub type_name: String,
    pub properties: Vec<Property>,
    pub depends_on: Vec<String>,
    pub condition: Option<String>,
    pub deletion_policy: Option<String>,
    pub update_replace_policy: Option<String>,
    pub metadata: Option<Value>,
}

impl Resource {
    pub fn property(&self, cfn_name: &str) -> Option<&Value> {
        self.properties
            .iter()
            .find(|p| p.cfn_name == cfn_name)
            .map(|p| &p.value)
    }

    /// `service.Type` split of `AWS::Service::Type`, lower-cased service.
    /// Returns `None` for `Custom::*` resource types, which have no
    /// registry entry.
    pub fn service_type(&self) -> Option<(String, String)> {
        let mut parts = self.type_name.split("::");
        if parts.next()? != "AWS" {
            return None;
        }
        let service = parts.next()?.to_lowercase();
        let ty = parts.next()?.to_string();
        if parts.next().is_some() {
            return None;
        }
        Some((service, ty))
    }
}

/// A declared stack output.
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    pub logical_id: String,
    pub value: Value,
    pub description: Option<String>,
    pub export_name: Option<Value>,
    pub condition: Option<String>,
}

/// The root document: four keyed collections plus the reference graph
/// computed while parsing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Template {
    pub format_version: Option<String>,
    pub description: Option<String>,
    pub parameters: BTreeMap<String, Parameter>,
    pub mappings: BTreeMap<String, Mapping>,
    pub conditions: BTreeMap<String, Condition>,
    pub resources: BTreeMap<String, Resource>,
    pub outputs: BTreeMap<String, Output>,
    /// logical ID -> ordered list of logical IDs it references via `Ref` or
    /// `GetAtt` (including `Fn::Sub` placeholder scans).
    pub reference_graph: BTreeMap<String, Vec<String>>,
    pub source_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_parameter_types() {
        let mut p = Parameter {
            logical_id: "Subnets".into(),
            type_name: "List<AWS::EC2::Subnet::Id>".into(),
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
        };
        assert!(p.is_list_type());
        p.type_name = "CommaDelimitedList".into();
        assert!(p.is_list_type());
        p.type_name = "String".into();
        assert!(!p.is_list_type());
        p.type_name = "AWS::SSM::Parameter::Value<List<String>>".into();
        assert!(p.is_list_type());
    }

    #[test]
    fn service_type_split() {
        let r = Resource {
            logical_id: "MyBucket".into(),
            type_name: "AWS::S3::Bucket".into(),
            properties: vec![],
            depends_on: vec![],
            condition: None,
            deletion_policy: None,
            update_replace_policy: None,
            metadata: None,
        };
        assert_eq!(r.service_type(), Some(("s3".to_string(), "Bucket".to_string())));

        let custom = Resource {
            type_name: "Custom::Thing".into(),
            ..r
        };
        assert_eq!(custom.service_type(), None);
    }

    #[test]
    fn intrinsic_tag_roundtrip() {
        for key in [
            "Ref",
            "Condition",
            "Fn::GetAtt",
            "Fn::Sub",
            "Fn::Transform",
        ] {
            let tag = IntrinsicTag::from_long_key(key).unwrap();
            assert_eq!(tag.long_key(), key);
        }
    }
}
