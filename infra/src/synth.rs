//! Synthesis of the gallery stacks into CloudFormation templates

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    config::{AppConfig, ConfigError},
    stacks::{AppStack, DnsStack},
    template::{Template, TemplateError},
};

const MANIFEST_FILE: &str = "manifest.json";

/// Errors raised during synthesis
#[derive(Error, Debug)]
pub enum SynthError {
    /// Configuration failed validation
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A template could not be assembled
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// A template could not be rendered
    #[error("Failed to render template: {0}")]
    Render(#[from] serde_json::Error),

    /// Output could not be written
    #[error("Failed to write {path}: {source}")]
    Write {
        /// File being written
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

/// One rendered stack
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedStack {
    /// Stack name
    pub name: String,
    /// Rendered template
    pub template: Template,
    /// Stacks that must be deployed first
    pub depends_on: Vec<String>,
}

impl SynthesizedStack {
    /// File name of the stack's template
    #[must_use]
    pub fn template_file(&self) -> String {
        format!("{}.template.json", self.name)
    }
}

/// Deployment manifest listing stacks in deployment order
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Manifest<'a> {
    version: u32,
    region: &'a str,
    stacks: Vec<ManifestEntry<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ManifestEntry<'a> {
    name: &'a str,
    template_file: String,
    depends_on: &'a [String],
}

/// Renders every stack for `config`, in deployment order
///
/// With a custom domain the DNS stack comes first, since the application
/// stack imports its exports. The output only depends on `config`, so
/// re-running synthesis produces identical templates.
///
/// # Errors
///
/// Returns `SynthError` if the config is invalid or a template cannot be built
pub fn synthesize(config: &AppConfig) -> Result<Vec<SynthesizedStack>, SynthError> {
    config.validate()?;

    let mut stacks = Vec::with_capacity(2);

    let binding = match &config.domain {
        Some(domain) => {
            let dns = DnsStack::new(&config.dns_stack_name(), &domain.name);
            stacks.push(SynthesizedStack {
                name: dns.name().to_string(),
                template: dns.synthesize()?,
                depends_on: Vec::new(),
            });
            Some(dns.binding())
        }
        None => None,
    };

    let app = AppStack::new(config, binding);
    stacks.push(SynthesizedStack {
        name: app.name().to_string(),
        template: app.synthesize()?,
        depends_on: app.dependencies(),
    });

    info!(
        stacks = stacks.len(),
        custom_domain = config.domain.is_some(),
        "synthesized stacks"
    );

    Ok(stacks)
}

/// Writes one template per stack plus `manifest.json` into `out_dir`
///
/// # Errors
///
/// Returns `SynthError` if rendering or writing fails
pub fn write_templates(
    stacks: &[SynthesizedStack],
    region: &str,
    out_dir: &Path,
) -> Result<Vec<PathBuf>, SynthError> {
    std::fs::create_dir_all(out_dir).map_err(|source| SynthError::Write {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::with_capacity(stacks.len() + 1);

    for stack in stacks {
        let path = out_dir.join(stack.template_file());
        write_file(&path, &stack.template.to_json()?)?;
        debug!("wrote {}", path.display());
        written.push(path);
    }

    let manifest = Manifest {
        version: 1,
        region,
        stacks: stacks
            .iter()
            .map(|stack| ManifestEntry {
                name: &stack.name,
                template_file: stack.template_file(),
                depends_on: &stack.depends_on,
            })
            .collect(),
    };

    let path = out_dir.join(MANIFEST_FILE);
    write_file(&path, &serde_json::to_string_pretty(&manifest)?)?;
    written.push(path);

    Ok(written)
}

fn write_file(path: &Path, content: &str) -> Result<(), SynthError> {
    std::fs::write(path, format!("{content}\n")).map_err(|source| SynthError::Write {
        path: path.to_path_buf(),
        source,
    })
}
