//! Configuration rendering boundary.
//!
//! Rendering is an opaque collaborator: template identifier plus device
//! variables in, configuration text out. The engine behind the trait is
//! deliberately thin; the pipeline only cares that a failure here is a
//! `Template` classification and that the step performs no network I/O.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

use crate::errors::FleetError;
use crate::inventory::Device;

/// Rendering failure for one device.
#[derive(Debug, Clone, Error)]
pub enum TemplateError {
    /// No template resolved for the key.
    #[error("template not found: {0}")]
    NotFound(String),

    /// The template resolved but could not be rendered.
    #[error("template '{key}' failed to render: {message}")]
    Render {
        /// The template key.
        key: String,
        /// What went wrong.
        message: String,
    },
}

/// Variables handed to the rendering collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateVars(BTreeMap<String, String>);

impl TemplateVars {
    /// Creates an empty variable set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets one variable.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Looks a variable up.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// The variables a device exposes to its templates: identity fields plus
    /// every entry of the free-form data map.
    #[must_use]
    pub fn from_device(device: &Device) -> Self {
        let mut vars = Self::new();
        vars.set("name", &device.name);
        vars.set("hostname", &device.hostname);
        vars.set("platform", &device.platform);
        vars.set("groups", device.groups.join(","));
        for (key, value) in &device.data {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            vars.set(key, text);
        }
        vars
    }
}

/// The rendering collaborator: template identifier + variables → text.
pub trait TemplateEngine: Send + Sync {
    /// Renders the template addressed by `key` with the device variables.
    fn render(&self, key: &str, vars: &TemplateVars) -> Result<String, TemplateError>;
}

/// Directory-backed engine resolving `<dir>/<key>_configs.j2`.
#[derive(Debug, Clone)]
pub struct FileTemplates {
    dir: PathBuf,
}

impl FileTemplates {
    /// Opens the template directory. A missing directory is a run-level
    /// error, surfaced before any worker starts; a missing template file is
    /// that device's `TemplateError`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, FleetError> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(FleetError::TemplateDir(dir.display().to_string()));
        }
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}_configs.j2"))
    }
}

impl TemplateEngine for FileTemplates {
    fn render(&self, key: &str, vars: &TemplateVars) -> Result<String, TemplateError> {
        let path = self.path_for(key);
        let source = fs::read_to_string(&path)
            .map_err(|_| TemplateError::NotFound(path.display().to_string()))?;
        substitute(&source, vars, key)
    }
}

/// In-memory engine keyed directly by template key. Bodies go through the
/// same placeholder substitution as file-backed templates.
#[derive(Debug, Clone, Default)]
pub struct StaticTemplates {
    templates: BTreeMap<String, String>,
}

impl StaticTemplates {
    /// Creates an empty template set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one template body.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, body: impl Into<String>) -> Self {
        self.templates.insert(key.into(), body.into());
        self
    }
}

impl TemplateEngine for StaticTemplates {
    fn render(&self, key: &str, vars: &TemplateVars) -> Result<String, TemplateError> {
        let source = self
            .templates
            .get(key)
            .ok_or_else(|| TemplateError::NotFound(key.to_string()))?;
        substitute(source, vars, key)
    }
}

/// Replaces `{{ name }}` placeholders from the variable set. An undefined
/// variable fails the render rather than leaking a placeholder into device
/// configuration.
fn substitute(source: &str, vars: &TemplateVars, key: &str) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            return Err(TemplateError::Render {
                key: key.to_string(),
                message: "unterminated '{{' placeholder".to_string(),
            });
        };
        let name = after[..end].trim();
        match vars.get(name) {
            Some(value) => out.push_str(value),
            None => {
                return Err(TemplateError::Render {
                    key: key.to_string(),
                    message: format!("undefined variable '{name}'"),
                })
            }
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    Ok(out)
}
