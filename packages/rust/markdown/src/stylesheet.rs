//! Structural stylesheet mapping bill XML elements to HTML.
//!
//! The embedded default lives in `billres.toml` at the crate root. A
//! replacement can be loaded from disk; a missing or malformed file is an
//! error the caller should treat as fatal at startup.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use billscope_shared::{BillscopeError, Result};

const EMBEDDED_STYLESHEET: &str = include_str!("../billres.toml");

/// How a single XML element is rendered.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ElementRule {
    /// HTML tag; falls back to [`Stylesheet::default_tag`].
    #[serde(default)]
    pub tag: Option<String>,
    /// CSS class; falls back to the element name.
    #[serde(default)]
    pub class: Option<String>,
    /// Drop the element and its subtree.
    #[serde(default)]
    pub skip: bool,
    /// Emit the enacting clause as `<em>` before the children.
    #[serde(default)]
    pub enacting_clause: bool,
    /// Text emitted after the closing tag.
    #[serde(default)]
    pub suffix: Option<String>,
}

static FALLBACK_RULE: ElementRule = ElementRule {
    tag: None,
    class: None,
    skip: false,
    enacting_clause: false,
    suffix: None,
};

/// Element → HTML rule table plus the enacting clause text.
#[derive(Debug, Clone, Deserialize)]
pub struct Stylesheet {
    pub enacting_clause: String,
    #[serde(default = "default_tag")]
    pub default_tag: String,
    #[serde(default)]
    pub elements: HashMap<String, ElementRule>,
}

fn default_tag() -> String {
    "span".into()
}

impl Stylesheet {
    /// The stylesheet compiled into the binary.
    pub fn embedded() -> Result<Self> {
        Self::parse(EMBEDDED_STYLESHEET, "embedded stylesheet")
    }

    /// Load a stylesheet file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| BillscopeError::io(path, e))?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Load the override at `path` if given, the embedded default otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_path(p),
            None => Self::embedded(),
        }
    }

    fn parse(content: &str, origin: &str) -> Result<Self> {
        let sheet: Self = toml::from_str(content)
            .map_err(|e| BillscopeError::config(format!("invalid stylesheet {origin}: {e}")))?;
        if sheet.enacting_clause.trim().is_empty() {
            return Err(BillscopeError::config(format!(
                "stylesheet {origin} has an empty enacting_clause"
            )));
        }
        debug!(origin, rules = sheet.elements.len(), "loaded stylesheet");
        Ok(sheet)
    }

    /// Rule for `element`, or the fallback rule when unlisted.
    pub fn rule(&self, element: &str) -> &ElementRule {
        self.elements.get(element).unwrap_or(&FALLBACK_RULE)
    }

    /// HTML tag for `element`.
    pub fn tag_for<'a>(&'a self, element: &str) -> &'a str {
        self.rule(element)
            .tag
            .as_deref()
            .unwrap_or(self.default_tag.as_str())
    }
}
