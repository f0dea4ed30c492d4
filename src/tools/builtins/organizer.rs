use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::kernel::config::FactotumConfig;
use crate::kernel::task_log::log_task;
use crate::tools::{BoundArguments, ParamSchema, ParamType, Tool, ToolContext, ToolError, ToolOutput};

const NO_EXTENSION: &str = "no_extension";

const HELP: &str = "\
Organize files in a directory by their extensions.

Args:
    directory (str): Path to the directory you want to organize (required).

Example:
    factotum --task organize-files --directory ~/Downloads

Scans the top level of the directory and moves every regular file into
a subfolder named after its lowercase extension (pdf, jpg, txt and so
on). Files without an extension go to 'no_extension'. Subdirectories
are left alone. A file is skipped when its destination already exists
or when a file already occupies its folder name.";

pub struct FileOrganizer;

pub fn load(_config: &FactotumConfig) -> Result<Vec<Arc<dyn Tool>>, ToolError> {
    Ok(vec![Arc::new(FileOrganizer)])
}

/// One file relocated by [`organize`].
#[derive(Debug, Clone, PartialEq)]
pub struct MovedFile {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Outcome of organizing a directory.
#[derive(Debug, Default)]
pub struct OrganizeReport {
    pub moved: Vec<MovedFile>,
    pub skipped: Vec<PathBuf>,
}

fn folder_for(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(str::to_lowercase)
        .unwrap_or_else(|| NO_EXTENSION.to_string())
}

/// Move each top-level regular file of `dir` into a per-extension subfolder.
pub fn organize(dir: &Path) -> io::Result<OrganizeReport> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();

    let mut report = OrganizeReport::default();
    for from in files {
        let Some(file_name) = from.file_name() else {
            continue;
        };
        let folder = dir.join(folder_for(&from));
        if folder.exists() && !folder.is_dir() {
            tracing::warn!(
                path = %from.display(),
                folder = %folder.display(),
                "folder name taken by a file, skipping"
            );
            report.skipped.push(from);
            continue;
        }
        fs::create_dir_all(&folder)?;

        let to = folder.join(file_name);
        if to.exists() {
            tracing::warn!(path = %from.display(), "destination exists, skipping");
            report.skipped.push(from);
            continue;
        }
        fs::rename(&from, &to)?;
        log_task(format!("Moved {} -> {}", from.display(), to.display()));
        report.moved.push(MovedFile { from, to });
    }
    Ok(report)
}

#[async_trait]
impl Tool for FileOrganizer {
    fn name(&self) -> &str {
        "organize_files"
    }

    fn parameters(&self) -> Vec<ParamSchema> {
        vec![ParamSchema::required("directory", ParamType::String, "Directory path")]
    }

    fn help(&self) -> Option<&str> {
        Some(HELP)
    }

    async fn execute(&self, args: BoundArguments, _ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let dir = PathBuf::from(args.string("directory")?);
        if !dir.is_dir() {
            return Err(ToolError::ExecutionError(format!(
                "Directory '{}' does not exist.",
                dir.display()
            )));
        }

        let target = dir.clone();
        let report = tokio::task::spawn_blocking(move || organize(&target))
            .await
            .map_err(|e| ToolError::ExecutionError(format!("organizer task failed: {e}")))??;

        log_task(format!(
            "Organized {}: {} moved, {} skipped",
            dir.display(),
            report.moved.len(),
            report.skipped.len()
        ));

        let mut content = format!("Organized {} file(s) in {}", report.moved.len(), dir.display());
        if !report.skipped.is_empty() {
            content.push_str(&format!(" ({} skipped, destination exists)", report.skipped.len()));
        }
        Ok(ToolOutput::new(content).with_metadata(json!({
            "directory": dir.display().to_string(),
            "moved": report.moved.len(),
            "skipped": report.skipped.len(),
        })))
    }
}
