//! Emission utilities: identifier sanitization, keyword escaping,
//! enum/constant naming helpers that need resource context, comment
//! wrapping, and package-name derivation.

/// Target-DSL (Go) reserved words a sanitized field or variable name must
/// not collide with.
const KEYWORDS: &[&str] = &[
    "break", "case", "chan", "const", "continue", "default", "defer", "else",
    "fallthrough", "for", "func", "go", "goto", "if", "import", "interface",
    "map", "package", "range", "return", "select", "struct", "switch", "type",
    "var",
];

fn escape_keyword(name: &str) -> String {
    if KEYWORDS.contains(&name.to_lowercase().as_str()) {
        format!("{name}_")
    } else {
        name.to_string()
    }
}

/// Sanitize a CloudFormation property name (already PascalCase) into a
/// target field name: keyword-escape only, CloudFormation's own casing
/// convention already matches the target's exported-field convention.
pub fn sanitize_field_name(cfn_name: &str) -> String {
    escape_keyword(cfn_name)
}

/// Sanitize a logical ID into an exported top-level identifier: promote a
/// leading-lowercase name to uppercase (every resource variable is
/// exported), keyword-escape, and suffix `Resource` if the name collides
/// with a reserved intrinsic/type-name token.
pub fn sanitize_identifier(logical_id: &str, is_reserved: bool) -> String {
    let promoted = promote_leading_uppercase(logical_id);
    let escaped = escape_keyword(&promoted);
    if is_reserved {
        format!("{escaped}Resource")
    } else {
        escaped
    }
}

fn promote_leading_uppercase(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => format!("{}{}", first.to_uppercase(), chars.as_str()),
    }
}

/// Clean an identifier fragment used in a property-block suffix (e.g. the
/// distinctive field value appended to a block name for array elements):
/// `-` becomes `Neg`; `_`, `.`, `:`, `/` are stripped; a leading digit is
/// prefixed with `N`; the result is capped at 20 characters and
/// capitalized.
pub fn clean_block_suffix(raw: &str) -> String {
    let replaced = raw.replace('-', "Neg");
    let stripped: String = replaced
        .chars()
        .filter(|c| !matches!(c, '_' | '.' | ':' | '/'))
        .collect();
    let prefixed = match stripped.chars().next() {
        Some(c) if c.is_ascii_digit() => format!("N{stripped}"),
        _ => stripped,
    };
    let capped: String = prefixed.chars().take(20).collect();
    capitalize_first(&capped)
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => format!("{}{}", first.to_uppercase(), chars.as_str()),
    }
}

/// Derive the target DSL module name from an input filename: lower-case the
/// base with the extension removed, replace non-identifier characters with
/// `_`, prefix a leading digit with `_`, collapse runs of `_`. If the result
/// collides with a resource package name, append `_stack`.
pub fn package_name(source_name: &str) -> String {
    let base = source_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(source_name);
    let stem = base.rsplit_once('.').map(|(s, _)| s).unwrap_or(base);
    let lowered = stem.to_lowercase();

    let mut out = String::with_capacity(lowered.len());
    let mut last_was_underscore = false;
    for c in lowered.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_was_underscore = false;
        } else if !last_was_underscore {
            out.push('_');
            last_was_underscore = true;
        }
    }
    let out = out.trim_matches('_').to_string();
    let out = if out.is_empty() {
        "stack".to_string()
    } else {
        out
    };
    let out = match out.chars().next() {
        Some(c) if c.is_ascii_digit() => format!("_{out}"),
        _ => out,
    };

    if crate::registry::RESOURCE_PACKAGE_NAMES.contains(&out.as_str()) {
        format!("{out}_stack")
    } else {
        out
    }
}

/// Quote a string as a Go double-quoted string literal.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Wrap a description/comment string into `//`-prefixed lines no wider than
/// `width` columns, splitting on whitespace.
pub fn wrap_comment(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
        } else if current.len() + 1 + word.len() > width {
            lines.push(format!("// {current}"));
            current = word.to_string();
        } else {
            current.push(' ');
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(format!("// {current}"));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_escape() {
        assert_eq!(sanitize_field_name("Type"), "Type_");
        assert_eq!(sanitize_field_name("BucketName"), "BucketName");
    }

    #[test]
    fn promotes_lowercase_logical_ids() {
        assert_eq!(sanitize_identifier("myBucket", false), "MyBucket");
        assert_eq!(sanitize_identifier("Transform", true), "TransformResource");
    }

    #[test]
    fn block_suffix_cleanup() {
        assert_eq!(clean_block_suffix("-1"), "Neg1");
        assert_eq!(clean_block_suffix("web_sg"), "Websg");
        assert_eq!(clean_block_suffix("80"), "N80");
    }

    #[test]
    fn package_name_sanitization() {
        assert_eq!(package_name("My Stack.yaml"), "my_stack");
        assert_eq!(package_name("2024-app.json"), "_2024_app");
        assert_eq!(package_name("s3.yaml"), "s3_stack");
    }

    #[test]
    fn no_hyphen_in_cleaned_security_group_port() {
        // FromPort: -1 must not leak a hyphen into a generated identifier.
        assert!(!clean_block_suffix("-1").contains('-'));
    }
}
