//! Error taxonomy.
//!
//! `ParseError` is fatal: the input could not be turned into a `Template` at
//! all. `Diagnostic` is not an error type in the `std::error::Error` sense -
//! it is a non-fatal surprise encountered during generation, collected into
//! a `Vec<Diagnostic>` and returned alongside the generated files rather than
//! aborting the run (see the module docs on `generate_code`).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{source_name}: malformed template ({message})")]
    MalformedDocument {
        source_name: String,
        message: String,
        line: Option<usize>,
    },

    #[error("{source_name}: input does not look like a CloudFormation template ({detected})")]
    UnsupportedInputKind {
        source_name: String,
        detected: String,
    },
}

/// A non-fatal surprise encountered while walking the IR during analysis or
/// generation. Collected rather than raised: the generator always produces
/// its best-effort output, and the diagnostics tell the caller where it had
/// to guess or fall back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    #[error("resource {logical_id}: unrecognized intrinsic tag {tag:?}")]
    UnknownIntrinsic { logical_id: String, tag: String },

    #[error("{from}: reference to undeclared logical ID {target:?}")]
    ReferenceToMissingTarget { from: String, target: String },

    #[error("resource {logical_id}: Fn::Transform argument shape is ambiguous, assuming map form")]
    AmbiguousTransformShape { logical_id: String },

    #[error("resource {logical_id}: unrecognized resource type {type_name:?}, emitting a generic property map")]
    UnknownResourceType {
        logical_id: String,
        type_name: String,
    },

    #[error("condition {logical_id}: reference cycle detected, condition will be emitted in declaration order")]
    ConditionCycle { logical_id: String },

    #[error("{count} resource(s) form a dependency cycle ({members}); emission order falls back to declaration order for the cycle")]
    ResourceCycle { count: usize, members: String },
}
