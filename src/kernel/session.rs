//! Interactive session: menu → prompts → run → "run another?".

use std::sync::Arc;

use anyhow::Result;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Select};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use super::error::DispatchError;
use super::{binder, render, Kernel};
use crate::tools::{
    BoundArguments, ParamSchema, ProgressReporter, TerminalProgress, ToolDescriptor, ToolOutput, Value,
};

/// Terminal interaction used by the session. `None` answers mean the user
/// backed out (escape, Ctrl-C, Ctrl-D).
pub trait Prompter {
    fn select(&mut self, prompt: &str, items: &[String]) -> Result<Option<usize>>;
    fn input(&mut self, prompt: &str) -> Result<Option<String>>;
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool>;
    fn show(&mut self, message: &str);

    /// Handle passed to tools that report progress.
    fn progress(&self) -> Arc<dyn ProgressReporter> {
        Arc::new(TerminalProgress::new())
    }
}

/// dialoguer menus plus rustyline line editing.
pub struct TerminalPrompter {
    editor: DefaultEditor,
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
            theme: ColorfulTheme::default(),
        })
    }
}

impl Prompter for TerminalPrompter {
    fn select(&mut self, prompt: &str, items: &[String]) -> Result<Option<usize>> {
        let choice = Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(items)
            .default(0)
            .interact_opt()?;
        Ok(choice)
    }

    fn input(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.editor.readline(&format!("{prompt}: ")) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
        let answer = Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(default)
            .interact_opt()?;
        Ok(answer.unwrap_or(false))
    }

    fn show(&mut self, message: &str) {
        println!("{message}");
    }
}

/// A selectable line of the main menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuEntry {
    Tool { id: String, label: String },
    Exit,
}

impl MenuEntry {
    pub fn label(&self) -> &str {
        match self {
            MenuEntry::Tool { label, .. } => label,
            MenuEntry::Exit => "Exit",
        }
    }
}

/// Menu entries grouped by category. Groups appear in order of first
/// appearance; tools keep discovery order within a group. Exit comes last.
pub fn build_menu<'a>(descriptors: impl Iterator<Item = &'a ToolDescriptor>) -> Vec<MenuEntry> {
    let mut groups: Vec<(&str, Vec<&ToolDescriptor>)> = Vec::new();
    for descriptor in descriptors {
        match groups.iter_mut().find(|(category, _)| *category == descriptor.category) {
            Some((_, members)) => members.push(descriptor),
            None => groups.push((descriptor.category.as_str(), vec![descriptor])),
        }
    }

    let mut entries: Vec<MenuEntry> = groups
        .into_iter()
        .flat_map(|(category, members)| {
            members.into_iter().map(move |d| MenuEntry::Tool {
                id: d.id.clone(),
                label: format!("[{category}] {} — {}", d.id, d.description),
            })
        })
        .collect();
    entries.push(MenuEntry::Exit);
    entries
}

enum SessionState<'k> {
    Menu,
    Prompting(&'k ToolDescriptor),
    Running(&'k ToolDescriptor, BoundArguments),
    Completed(&'k ToolDescriptor, Result<ToolOutput, DispatchError>),
    Exited,
}

/// Counts reported when the session ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionReport {
    pub runs: usize,
    pub failures: usize,
}

pub struct InteractiveSession<'k, P: Prompter> {
    kernel: &'k Kernel,
    prompter: P,
    report: SessionReport,
}

impl<'k, P: Prompter> InteractiveSession<'k, P> {
    pub fn new(kernel: &'k Kernel, prompter: P) -> Self {
        Self {
            kernel,
            prompter,
            report: SessionReport::default(),
        }
    }

    pub fn prompter(&self) -> &P {
        &self.prompter
    }

    /// Drive the state machine until the user exits.
    pub async fn run(&mut self) -> Result<SessionReport> {
        let mut state = SessionState::Menu;
        loop {
            state = match state {
                SessionState::Menu => self.menu()?,
                SessionState::Prompting(descriptor) => self.prompt_arguments(descriptor)?,
                SessionState::Running(descriptor, args) => self.run_tool(descriptor, args).await,
                SessionState::Completed(descriptor, result) => self.complete(descriptor, result)?,
                SessionState::Exited => break,
            };
        }
        tracing::info!(runs = self.report.runs, failures = self.report.failures, "Session ended");
        Ok(self.report)
    }

    fn menu(&mut self) -> Result<SessionState<'k>> {
        let kernel: &'k Kernel = self.kernel;
        let registry = kernel.registry();
        let entries = build_menu(registry.list_all());
        let labels: Vec<String> = entries.iter().map(|e| e.label().to_string()).collect();

        let Some(choice) = self.prompter.select("What would you like to do?", &labels)? else {
            return Ok(SessionState::Exited);
        };
        match entries.get(choice) {
            Some(MenuEntry::Tool { id, .. }) => match registry.lookup(id) {
                Some(descriptor) => Ok(SessionState::Prompting(descriptor)),
                None => Ok(SessionState::Menu),
            },
            Some(MenuEntry::Exit) | None => Ok(SessionState::Exited),
        }
    }

    fn prompt_arguments(&mut self, descriptor: &'k ToolDescriptor) -> Result<SessionState<'k>> {
        let max_attempts = self.kernel.config().session.max_prompt_attempts.max(1);
        let mut bound = BoundArguments::new();

        for param in &descriptor.parameters {
            let mut attempts = 0;
            let value = loop {
                let Some(answer) = self.prompter.input(&prompt_label(param))? else {
                    return Ok(SessionState::Exited);
                };
                let answer = answer.trim();
                let raw = (!answer.is_empty()).then(|| Value::String(answer.to_string()));

                match binder::bind_one(&descriptor.id, param, raw.as_ref()) {
                    Ok(value) => break value,
                    Err(err) => {
                        attempts += 1;
                        self.prompter.show(&render::error(&err));
                        if attempts >= max_attempts {
                            self.prompter.show("Too many invalid answers, leaving the session.");
                            return Ok(SessionState::Exited);
                        }
                    }
                }
            };
            bound.insert(param.name.clone(), value);
        }

        Ok(SessionState::Running(descriptor, bound))
    }

    async fn run_tool(&mut self, descriptor: &'k ToolDescriptor, args: BoundArguments) -> SessionState<'k> {
        let progress = descriptor.reports_progress.then(|| self.prompter.progress());
        let invocation_id = uuid::Uuid::new_v4().to_string();
        let result = self.kernel.invoke(descriptor, args, progress, &invocation_id).await;
        SessionState::Completed(descriptor, result)
    }

    fn complete(
        &mut self,
        descriptor: &'k ToolDescriptor,
        result: Result<ToolOutput, DispatchError>,
    ) -> Result<SessionState<'k>> {
        self.report.runs += 1;
        match &result {
            Ok(output) => self.prompter.show(&render::completed(output)),
            Err(err) => {
                self.report.failures += 1;
                self.prompter.show(&render::error(err));
            }
        }
        tracing::debug!(task = %descriptor.id, ok = result.is_ok(), "Task finished in session");

        if self.prompter.confirm("Run another task?", true)? {
            Ok(SessionState::Menu)
        } else {
            Ok(SessionState::Exited)
        }
    }
}

fn prompt_label(param: &ParamSchema) -> String {
    let requirement = match &param.default {
        Some(Value::String(s)) if s.is_empty() => "optional".to_string(),
        Some(default) => format!("default: {default}"),
        None => "required".to_string(),
    };
    if param.description.is_empty() {
        format!("{} ({}, {})", param.name, param.param_type, requirement)
    } else {
        format!("{} — {} ({}, {})", param.name, param.description, param.param_type, requirement)
    }
}
