//! YAML frontmatter: splitting, field access and re-serialization.
//!
//! A document carries frontmatter when its first line is exactly `---` and a
//! later line closes the block with `---`. Serialization emits
//! `---\n<yaml>---\n<body>` with a trailing newline, keeping key order.

use serde_yaml::{Mapping, Value};

/// Marks a document for publishing.
pub const PUBLISHED: &str = "Published";
/// Short description shown in listings.
pub const DESC: &str = "desc";
/// Folder the document is published under.
pub const SPEC_TAG: &str = "SpecTag";

const FENCE: &str = "---";

/// Error splitting a frontmatter block.
#[derive(Debug, thiserror::Error)]
pub enum FrontmatterError {
    #[error("{0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("frontmatter must be a mapping")]
    NotAMapping,
}

/// Ordered frontmatter fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frontmatter {
    data: Mapping,
}

impl Frontmatter {
    /// Whether there are no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Look up a field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Set a field, keeping its position if it already exists.
    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.data.insert(Value::String(key.to_owned()), value.into());
    }

    /// `Published` is boolean `true` or the exact string `"True"`.
    #[must_use]
    pub fn is_published(&self) -> bool {
        match self.get(PUBLISHED) {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(s)) => s == "True",
            _ => false,
        }
    }

    /// Whether `desc` is missing, null, empty or `false`.
    #[must_use]
    pub fn needs_summary(&self) -> bool {
        match self.get(DESC) {
            None | Some(Value::Null | Value::Bool(false)) => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(_) => false,
        }
    }

    /// The trimmed `SpecTag`, or `None` when it is absent or blank.
    #[must_use]
    pub fn spec_tag(&self) -> Option<String> {
        let tag = match self.get(SPEC_TAG)? {
            Value::String(s) => s.trim().to_owned(),
            Value::Number(n) if n.as_f64() == Some(0.0) => return None,
            Value::Number(n) => n.to_string(),
            Value::Bool(true) => "true".to_owned(),
            _ => return None,
        };
        (!tag.is_empty()).then_some(tag)
    }
}

/// Split `content` into frontmatter and body.
///
/// Content without a well-formed block yields empty frontmatter and the
/// content unchanged as the body.
///
/// # Errors
/// Returns error if the block is not valid YAML or not a mapping.
pub fn parse(content: &str) -> Result<(Frontmatter, String), FrontmatterError> {
    let Some((yaml, body)) = split(content) else {
        return Ok((Frontmatter::default(), content.to_owned()));
    };

    let data = if yaml.trim().is_empty() {
        Mapping::new()
    } else {
        match serde_yaml::from_str::<Value>(yaml)? {
            Value::Mapping(map) => map,
            Value::Null => Mapping::new(),
            _ => return Err(FrontmatterError::NotAMapping),
        }
    };
    Ok((Frontmatter { data }, body.to_owned()))
}

/// Render `body` with `frontmatter` prepended.
///
/// # Errors
/// Returns error if the fields cannot be serialized.
pub fn stringify(body: &str, frontmatter: &Frontmatter) -> Result<String, serde_yaml::Error> {
    let mut out = String::with_capacity(body.len() + 64);
    if !frontmatter.is_empty() {
        let yaml = serde_yaml::to_string(&frontmatter.data)?;
        out.push_str(FENCE);
        out.push('\n');
        out.push_str(&yaml);
        if !yaml.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(FENCE);
        out.push('\n');
    }
    out.push_str(body);
    if !out.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}

/// Whether the frontmatter block of `content` sets `Published` to `true` or
/// `"True"`, judged line by line so it works on blocks that are not valid YAML.
#[must_use]
pub fn declares_published(content: &str) -> bool {
    split(content).is_some_and(|(yaml, _)| {
        yaml.lines().any(|line| {
            line.strip_prefix(PUBLISHED)
                .and_then(|rest| rest.trim_start().strip_prefix(':'))
                .map(|value| value.split(" #").next().unwrap_or_default().trim())
                .is_some_and(|value| {
                    matches!(value, "true" | "True" | "TRUE" | "\"True\"" | "'True'")
                })
        })
    })
}

/// Locate the YAML text and the body following the closing fence.
fn split(content: &str) -> Option<(&str, &str)> {
    let rest = content.strip_prefix(FENCE)?;
    let newline = rest.find('\n')?;
    if !rest[..newline].trim_end().is_empty() {
        return None;
    }
    let inner = &rest[newline + 1..];

    let mut offset = 0;
    loop {
        let end = inner[offset..].find('\n').map_or(inner.len(), |i| offset + i);
        if inner[offset..end].trim_end() == FENCE {
            let body = inner.get(end + 1..).unwrap_or("");
            return Some((&inner[..offset], body));
        }
        if end >= inner.len() {
            return None;
        }
        offset = end + 1;
    }
}
