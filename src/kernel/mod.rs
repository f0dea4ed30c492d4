pub mod binder;
pub mod config;
pub mod error;
pub mod render;
pub mod session;
pub mod task_log;

use std::any::Any;
use std::fmt::Write as _;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use tracing::Instrument;

use crate::tools::{
    BoundArguments, ProgressReporter, ToolContext, ToolDescriptor, ToolError, ToolOutput, ToolRegistry, Value,
};
use crate::tools::registry::canonical;
use binder::RawArguments;
use config::FactotumConfig;
use error::DispatchError;
use task_log::{log_task, log_task_failure};

/// One user action: a task id plus loosely-typed arguments.
#[derive(Debug, Clone)]
pub struct InvocationRequest {
    pub id: String,
    pub task_id: String,
    pub raw_arguments: RawArguments,
}

impl InvocationRequest {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            task_id: task_id.into(),
            raw_arguments: RawArguments::new(),
        }
    }

    pub fn with_arguments(mut self, raw_arguments: RawArguments) -> Self {
        self.raw_arguments = raw_arguments;
        self
    }
}

/// One line of the task listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub id: String,
    pub category: String,
    pub description: String,
}

/// Successful result of a dispatch.
#[derive(Debug, Clone)]
pub enum Outcome {
    Listing(Vec<ListingEntry>),
    Help { id: String, text: String },
    Completed { id: String, output: ToolOutput },
}

/// The dispatcher. Owns the registry for the life of the process.
pub struct Kernel {
    registry: ToolRegistry,
    config: FactotumConfig,
}

impl Kernel {
    pub fn new(registry: ToolRegistry, config: FactotumConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn config(&self) -> &FactotumConfig {
        &self.config
    }

    /// Every descriptor exactly once, in discovery order.
    pub fn listing(&self) -> Vec<ListingEntry> {
        self.registry
            .list_all()
            .map(|d| ListingEntry {
                id: d.id.clone(),
                category: d.category.clone(),
                description: d.description.clone(),
            })
            .collect()
    }

    /// Resolve, bind, and run one request.
    ///
    /// `list` and `help` are answered here and never reach the registry or
    /// the binder. Binding errors are returned before the tool is invoked.
    pub async fn dispatch(&self, request: InvocationRequest) -> Result<Outcome, DispatchError> {
        let task_id = canonical(&request.task_id);
        tracing::debug!(request = %request.id, task = %task_id, "Dispatching");

        match task_id.as_str() {
            "list" => return Ok(Outcome::Listing(self.listing())),
            "help" => return self.help(&request.raw_arguments),
            _ => {}
        }

        let descriptor = self
            .registry
            .lookup(&task_id)
            .ok_or_else(|| DispatchError::UnknownTask(task_id.clone()))?;
        let args = binder::bind(descriptor, &request.raw_arguments)?;
        let output = self.invoke(descriptor, args, None, &request.id).await?;

        Ok(Outcome::Completed {
            id: descriptor.id.clone(),
            output,
        })
    }

    /// Run a tool inside the failure-isolation boundary.
    ///
    /// Tool errors and panics both come back as `ToolInvocationFailure` and
    /// are written to the task log.
    pub async fn invoke(
        &self,
        descriptor: &ToolDescriptor,
        args: BoundArguments,
        progress: Option<Arc<dyn ProgressReporter>>,
        invocation_id: &str,
    ) -> Result<ToolOutput, DispatchError> {
        let mut ctx = ToolContext::new(invocation_id);
        if let Some(progress) = progress {
            ctx = ctx.with_progress(progress);
        }

        let span = tracing::info_span!("task", id = %descriptor.id, invocation = %invocation_id);
        tracing::debug!(parent: &span, args = %args.to_json(), "Invoking tool");

        let started = Instant::now();
        let result = AssertUnwindSafe(descriptor.tool.execute(args, &ctx))
            .catch_unwind()
            .instrument(span.clone())
            .await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let result = match result {
            Ok(result) => result,
            Err(panic) => Err(ToolError::ExecutionError(format!(
                "tool panicked: {}",
                panic_message(panic.as_ref())
            ))),
        };

        match result {
            Ok(output) => {
                tracing::debug!(parent: &span, elapsed_ms, "Tool finished");
                log_task(format!("Task '{}' completed: {}", descriptor.id, first_line(&output.content)));
                Ok(output)
            }
            Err(source) => {
                tracing::warn!(parent: &span, elapsed_ms, error = %source, "Tool failed");
                log_task_failure(format!("Task '{}' failed: {}", descriptor.id, source));
                Err(DispatchError::ToolInvocationFailure {
                    task: descriptor.id.clone(),
                    source,
                })
            }
        }
    }

    fn help(&self, raw: &RawArguments) -> Result<Outcome, DispatchError> {
        let target = raw
            .get("tool")
            .map(|v| v.to_string())
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| DispatchError::MissingArgument {
                task: "help".to_string(),
                param: "tool".to_string(),
            })?;

        let descriptor = self
            .registry
            .lookup(&target)
            .ok_or_else(|| DispatchError::ToolNotFound(target.trim().to_string()))?;

        Ok(Outcome::Help {
            id: descriptor.id.clone(),
            text: help_text(descriptor),
        })
    }
}

/// Long-form help plus a generated parameter table.
pub fn help_text(descriptor: &ToolDescriptor) -> String {
    let mut text = descriptor
        .help
        .clone()
        .unwrap_or_else(|| "No documentation available.".to_string());

    text.push_str("\n\nParameters:\n");
    if descriptor.parameters.is_empty() {
        text.push_str("  (none)\n");
    }
    for param in &descriptor.parameters {
        let requirement = match &param.default {
            Some(Value::String(s)) => format!("default: {s:?}"),
            Some(default) => format!("default: {default}"),
            None => "required".to_string(),
        };
        let _ = writeln!(text, "  {} : {} ({})", param.name, param.param_type, requirement);
        if !param.description.is_empty() {
            let _ = writeln!(text, "      {}", param.description);
        }
    }
    text
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
