//! vellum-core
//!
//! Translates a CloudFormation template (JSON or YAML) into a set of typed
//! Go source files whose value is structurally isomorphic to the input:
//! typed structs for known property shapes, direct variable references for
//! `Ref`, attribute access for simple `GetAtt`, and flat typed IAM policy
//! blocks rather than nested maps.
//!
//! The pipeline is [`parser::parse`] (byte buffer -> [`ir::Template`]),
//! then [`codegen::generate_code`] (the typed emitter, which runs
//! [`analysis::Analysis`] itself). See `DESIGN.md` for how each module is
//! grounded.

pub mod analysis;
pub mod codegen;
pub mod error;
pub mod ir;
pub mod parser;
pub mod registry;

use std::collections::BTreeMap;

use error::{Diagnostic, ParseError};

/// Parse `bytes` as a CloudFormation template and generate the Go source
/// tree in one call, deriving the package name from `source_name` (see
/// `codegen::naming::package_name`).
pub fn import_template(
    bytes: &[u8],
    source_name: &str,
) -> Result<(BTreeMap<String, String>, Vec<Diagnostic>), ParseError> {
    let template = parser::parse(bytes, source_name)?;
    let package_name = codegen::naming::package_name(source_name);
    Ok(codegen::generate_code(&template, &package_name))
}
