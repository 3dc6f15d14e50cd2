//! Email template loading and rendering.
//!
//! Placeholder syntax is `{{name}}`. Rendering is a pure string
//! substitution; placeholders with no matching variable are left as literal
//! text. A template that fails to load degrades to a minimal fallback body
//! instead of failing the dispatch.

use std::fs;
use std::path::PathBuf;

use thiserror::Error;

/// Template load failure.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template `{name}` could not be loaded: {source}")]
    Load {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Source of raw template text.
pub trait TemplateSource: Send + Sync {
    fn load(&self, name: &str) -> Result<String, TemplateError>;
}

/// Loads `<dir>/<name>.html` from the filesystem.
#[derive(Debug, Clone)]
pub struct FsTemplateSource {
    dir: PathBuf,
}

impl FsTemplateSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl TemplateSource for FsTemplateSource {
    fn load(&self, name: &str) -> Result<String, TemplateError> {
        let path = self.dir.join(format!("{name}.html"));
        fs::read_to_string(&path).map_err(|source| TemplateError::Load {
            name: name.to_string(),
            source,
        })
    }
}

/// Substitute `{{key}}` placeholders with the supplied values.
pub fn render(template: &str, vars: &[(&str, String)]) -> String {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{{{key}}}}}"), value);
    }
    out
}

/// Minimal body used when a template cannot be loaded.
pub fn fallback_body() -> String {
    "<html><body><h2>Notification</h2>\
     <p>Unable to load email template.</p></body></html>"
        .to_string()
}
