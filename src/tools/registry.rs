//! Tool registry: the immutable id → descriptor table built once at startup.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{builtins, ParamSchema, Tool, ToolError};
use crate::kernel::config::FactotumConfig;

/// Task ids handled by the dispatcher itself.
pub const RESERVED_IDS: [&str; 2] = ["list", "help"];

pub const DEFAULT_CATEGORY: &str = "Other";
pub const DEFAULT_DESCRIPTION: &str = "No description provided.";

/// Loader signature for a tool source. May read the environment.
pub type LoadFn = fn(&FactotumConfig) -> Result<Vec<Arc<dyn Tool>>, ToolError>;

/// One entry of the registration table: a group of tools sharing tags.
#[derive(Clone, Copy)]
pub struct ToolSource {
    pub module: &'static str,
    pub category: Option<&'static str>,
    pub description: Option<&'static str>,
    pub load: LoadFn,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Failed to load tool source '{module}': {reason}")]
    SourceLoad { module: &'static str, reason: String },
    #[error("Tool '{name}' from '{module}' uses the reserved id '{id}'")]
    ReservedId { module: &'static str, name: String, id: String },
    #[error("Tool '{name}' from '{module}' normalizes to an empty id")]
    EmptyId { module: &'static str, name: String },
}

/// Registry metadata for one tool.
#[derive(Clone)]
pub struct ToolDescriptor {
    pub id: String,
    pub category: String,
    pub description: String,
    pub help: Option<String>,
    pub parameters: Vec<ParamSchema>,
    pub reports_progress: bool,
    /// Module of the source the tool was loaded from
    pub module: &'static str,
    pub tool: Arc<dyn Tool>,
}

impl fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("id", &self.id)
            .field("category", &self.category)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .field("reports_progress", &self.reports_progress)
            .field("module", &self.module)
            .finish_non_exhaustive()
    }
}

impl ToolDescriptor {
    fn new(source: &ToolSource, tool: Arc<dyn Tool>) -> Self {
        let help = tool.help().map(|h| h.trim().to_string()).filter(|h| !h.is_empty());
        let category = tool
            .category()
            .or(source.category)
            .unwrap_or(DEFAULT_CATEGORY)
            .to_string();
        let description = tool
            .description()
            .or(source.description)
            .map(str::to_string)
            .or_else(|| help.as_deref().and_then(|h| h.lines().next()).map(|l| l.trim().to_string()))
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());

        Self {
            id: normalize_id(tool.name()),
            category,
            description,
            help,
            parameters: tool.parameters(),
            reports_progress: tool.reports_progress(),
            module: source.module,
            tool,
        }
    }
}

/// Case folding shared by id normalization and lookup: trimmed and lowercased.
pub fn canonical(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Turn a declared tool name into its task id: canonical form with
/// underscores and whitespace replaced by hyphens.
pub fn normalize_id(name: &str) -> String {
    canonical(name)
        .chars()
        .map(|c| if c == '_' || c.is_whitespace() { '-' } else { c })
        .collect()
}

/// Registry of available tools, in discovery order.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    descriptors: Vec<ToolDescriptor>,
    index: HashMap<String, usize>,
}

const ADHOC_SOURCE: ToolSource = ToolSource {
    module: "adhoc",
    category: None,
    description: None,
    load: load_nothing,
};

fn load_nothing(_: &FactotumConfig) -> Result<Vec<Arc<dyn Tool>>, ToolError> {
    Ok(Vec::new())
}

impl ToolRegistry {
    /// Create a new empty tool registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every source in order and register its public tools.
    ///
    /// Fails closed: the first source that cannot be loaded aborts discovery.
    pub fn discover(sources: &[ToolSource], config: &FactotumConfig) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for source in sources {
            let tools = (source.load)(config).map_err(|e| RegistryError::SourceLoad {
                module: source.module,
                reason: e.to_string(),
            })?;
            for tool in tools {
                registry.register(source, tool)?;
            }
        }
        tracing::debug!(tools = registry.len(), "Tool discovery finished");
        Ok(registry)
    }

    /// Add a tool without source tags
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Result<Self, RegistryError> {
        self.register(&ADHOC_SOURCE, tool)?;
        Ok(self)
    }

    fn register(&mut self, source: &ToolSource, tool: Arc<dyn Tool>) -> Result<(), RegistryError> {
        if tool.name().starts_with('_') {
            tracing::trace!(name = tool.name(), module = source.module, "Skipping internal tool");
            return Ok(());
        }

        let descriptor = ToolDescriptor::new(source, tool);
        if descriptor.id.is_empty() || descriptor.id.chars().all(|c| c == '-') {
            return Err(RegistryError::EmptyId {
                module: source.module,
                name: descriptor.tool.name().to_string(),
            });
        }
        if RESERVED_IDS.contains(&descriptor.id.as_str()) {
            return Err(RegistryError::ReservedId {
                module: source.module,
                name: descriptor.tool.name().to_string(),
                id: descriptor.id,
            });
        }

        match self.index.get(&descriptor.id) {
            Some(&slot) => {
                tracing::warn!(
                    id = %descriptor.id,
                    previous = self.descriptors[slot].module,
                    replacement = source.module,
                    "Duplicate tool id, later registration wins"
                );
                self.descriptors[slot] = descriptor;
            }
            None => {
                self.index.insert(descriptor.id.clone(), self.descriptors.len());
                self.descriptors.push(descriptor);
            }
        }
        Ok(())
    }

    /// Exact lookup after trimming and lowercasing the task id.
    pub fn lookup(&self, task_id: &str) -> Option<&ToolDescriptor> {
        self.index
            .get(&canonical(task_id))
            .map(|&slot| &self.descriptors[slot])
    }

    /// All descriptors in discovery order
    pub fn list_all(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Build the registry from the built-in registration table.
pub fn build_registry(config: &FactotumConfig) -> Result<ToolRegistry, RegistryError> {
    ToolRegistry::discover(&builtins::sources(), config)
}
