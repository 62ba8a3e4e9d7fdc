//! Rendering `.gg` template files to their output files
//!
//! Every job is rendered in parallel against the same read-only inventory;
//! outputs are then written one by one in job order.

use std::io;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::RenderError;
use crate::value::Value;
use crate::{render_with_config, RenderConfig};

/// File extension of template sources
pub const TEMPLATE_EXTENSION: &str = "gg";

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Failed to scan {path} for .gg templates: {source}")]
    Scan {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("No template file specified or found in {0}")]
    NoTemplates(String),
    #[error("{0} is not a .gg file; an output path must be given for it")]
    NotATemplate(String),
    #[error("Failed to read template {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Failed to render {path}: {source}")]
    Render {
        path: String,
        #[source]
        source: RenderError,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// One template file and where its output goes
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TemplateJob {
    pub template: PathBuf,
    pub output: PathBuf,
}

impl TemplateJob {
    /// Output path is the template path without its `.gg` extension
    pub fn for_template(template: impl Into<PathBuf>) -> Self {
        let template = template.into();
        let output = template.with_extension("");
        Self { template, output }
    }
}

/// What to do when a job fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop at the first failure in job order
    #[default]
    FailFast,
    /// Write every successful job and collect the failures
    BestEffort,
}

/// Outcome of a batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Output files written, in job order
    pub written: Vec<PathBuf>,
    pub failures: Vec<BatchError>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

fn is_template(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(TEMPLATE_EXTENSION)
}

/// Every `.gg` file directly inside `dir`, sorted by path
pub fn discover_jobs(dir: &Path) -> Result<Vec<TemplateJob>, BatchError> {
    let scan_error = |source| BatchError::Scan {
        path: dir.display().to_string(),
        source,
    };

    let mut jobs = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(scan_error)? {
        let path = entry.map_err(scan_error)?.path();
        if path.is_file() && is_template(&path) {
            jobs.push(TemplateJob::for_template(path));
        }
    }

    if jobs.is_empty() {
        return Err(BatchError::NoTemplates(dir.display().to_string()));
    }
    jobs.sort();
    debug!(count = jobs.len(), "discovered templates");
    Ok(jobs)
}

/// A job for one explicitly named template
///
/// Without `output`, the template must have the `.gg` extension.
pub fn single_job(template: &Path, output: Option<&Path>) -> Result<TemplateJob, BatchError> {
    match output {
        Some(output) => Ok(TemplateJob {
            template: template.to_path_buf(),
            output: output.to_path_buf(),
        }),
        None if is_template(template) => Ok(TemplateJob::for_template(template)),
        None => Err(BatchError::NotATemplate(template.display().to_string())),
    }
}

fn render_job(job: &TemplateJob, inventory: &Value, config: &RenderConfig) -> Result<String, BatchError> {
    let path = job.template.display().to_string();
    let source = std::fs::read_to_string(&job.template).map_err(|source| BatchError::Read {
        path: path.clone(),
        source,
    })?;
    render_with_config(&source, inventory, config).map_err(|source| BatchError::Render { path, source })
}

/// Render `jobs` against `inventory` and write their outputs
///
/// With [`FailurePolicy::FailFast`] the first failure in job order is
/// returned and later outputs are not written. With
/// [`FailurePolicy::BestEffort`] failures are collected in the report.
pub fn run_batch(
    jobs: &[TemplateJob],
    inventory: &Value,
    config: &RenderConfig,
    policy: FailurePolicy,
) -> Result<BatchReport, BatchError> {
    let rendered: Vec<Result<String, BatchError>> = jobs
        .par_iter()
        .map(|job| render_job(job, inventory, config))
        .collect();

    let mut report = BatchReport::default();
    for (job, result) in jobs.iter().zip(rendered) {
        let written = result.and_then(|content| {
            std::fs::write(&job.output, content).map_err(|source| BatchError::Write {
                path: job.output.display().to_string(),
                source,
            })
        });

        match written {
            Ok(()) => {
                info!(
                    template = %job.template.display(),
                    output = %job.output.display(),
                    "generated"
                );
                report.written.push(job.output.clone());
            }
            Err(err) if policy == FailurePolicy::FailFast => return Err(err),
            Err(err) => {
                warn!(template = %job.template.display(), error = %err, "generation failed");
                report.failures.push(err);
            }
        }
    }

    Ok(report)
}
