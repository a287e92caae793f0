// src/core/input_flow.rs

//! Multi-step input wizards.
//!
//! A flow is an ordered list of [`PromptStep`]s, the index of the current step and the
//! answers collected so far. Answers are only handed out once every step is resolved;
//! abandoning any step discards all of them.

use crate::core::tree_store::NodePatch;
use crate::models::{self, CommandNode, Scope};

/// One question of a flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptStep {
    /// Short heading, e.g. "Command".
    pub title: String,
    /// The question itself.
    pub prompt: String,
    /// Example shown when there is no initial value.
    pub placeholder: String,
    /// Pre-filled value, used when editing.
    pub initial: String,
}

impl PromptStep {
    fn new(title: &str, prompt: &str, placeholder: &str) -> Self {
        Self {
            title: title.to_string(),
            prompt: prompt.to_string(),
            placeholder: placeholder.to_string(),
            initial: String::new(),
        }
    }

    fn with_initial(mut self, initial: impl Into<String>) -> Self {
        self.initial = initial.into();
        self
    }
}

/// What [`InputFlow::submit`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowStatus {
    /// More steps remain.
    Next,
    /// Every step was answered; the answers in step order.
    Complete(Vec<String>),
    /// The flow was already finished or cancelled.
    Closed,
}

/// Progress through a list of steps.
#[derive(Debug, Clone)]
pub struct InputFlow {
    steps: Vec<PromptStep>,
    current: usize,
    answers: Vec<String>,
    closed: bool,
}

impl InputFlow {
    /// Starts at the first step.
    pub fn new(steps: Vec<PromptStep>) -> Self {
        Self {
            steps,
            current: 0,
            answers: Vec::new(),
            closed: false,
        }
    }

    /// The step waiting for an answer.
    pub fn current_step(&self) -> Option<&PromptStep> {
        if self.closed {
            None
        } else {
            self.steps.get(self.current)
        }
    }

    /// 1-based position of the current step and the total number of steps.
    pub fn position(&self) -> (usize, usize) {
        (self.current + 1, self.steps.len())
    }

    /// Records the (trimmed) answer to the current step.
    pub fn submit(&mut self, value: &str) -> FlowStatus {
        if self.current_step().is_none() {
            return FlowStatus::Closed;
        }
        self.answers.push(value.trim().to_string());
        self.current += 1;
        if self.current < self.steps.len() {
            FlowStatus::Next
        } else {
            self.closed = true;
            FlowStatus::Complete(std::mem::take(&mut self.answers))
        }
    }

    /// Abandons the flow and drops every answer collected so far.
    pub fn cancel(&mut self) {
        self.answers.clear();
        self.closed = true;
    }

    /// Whether the flow completed or was cancelled.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Asks the user for one step's value. `None` means the step was abandoned.
pub trait Prompter {
    /// Asks `step`, the `position`-th of `total` (1-based).
    fn prompt(&mut self, step: &PromptStep, position: usize, total: usize) -> Option<String>;
}

/// Walks `flow` to completion through `prompter`.
pub fn run_flow(mut flow: InputFlow, prompter: &mut dyn Prompter) -> Option<Vec<String>> {
    loop {
        let (position, total) = flow.position();
        let step = flow.current_step()?.clone();
        let Some(answer) = prompter.prompt(&step, position, total) else {
            flow.cancel();
            return None;
        };
        match flow.submit(&answer) {
            FlowStatus::Next => continue,
            FlowStatus::Complete(answers) => return Some(answers),
            FlowStatus::Closed => return None,
        }
    }
}

// --- Flow builders ---

fn command_steps() -> Vec<PromptStep> {
    vec![
        PromptStep::new(
            t!("flow.command.title"),
            t!("flow.command.prompt"),
            t!("flow.command.placeholder"),
        ),
        PromptStep::new(
            t!("flow.label.title"),
            t!("flow.label.prompt"),
            t!("flow.label.placeholder"),
        ),
        PromptStep::new(
            t!("flow.variables.title"),
            t!("flow.variables.prompt"),
            t!("flow.variables.placeholder"),
        ),
    ]
}

/// Command, optional label, optional comma-separated variables.
pub fn new_command_flow() -> InputFlow {
    InputFlow::new(command_steps())
}

/// The command flow pre-filled with a leaf's current values.
pub fn edit_command_flow(node: &CommandNode) -> Option<InputFlow> {
    let leaf = node.command()?;
    let initial = [
        leaf.template.clone(),
        node.label.clone(),
        leaf.variables.join(", "),
    ];
    let steps = command_steps()
        .into_iter()
        .zip(initial)
        .map(|(step, value)| step.with_initial(value))
        .collect();
    Some(InputFlow::new(steps))
}

/// A single label step.
pub fn group_flow() -> InputFlow {
    InputFlow::new(vec![PromptStep::new(
        t!("flow.group.title"),
        t!("flow.group.prompt"),
        t!("flow.group.placeholder"),
    )])
}

/// The group flow pre-filled with the current label.
pub fn edit_group_flow(node: &CommandNode) -> InputFlow {
    let mut flow = group_flow();
    if let Some(step) = flow.steps.first_mut() {
        step.initial = node.label.clone();
    }
    flow
}

// --- Drafts ---

/// A leaf described by the answers of a command flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDraft {
    /// The shell command, trimmed.
    pub command: String,
    /// `None` when left blank.
    pub label: Option<String>,
    /// Parsed from the comma-separated answer.
    pub variables: Vec<String>,
}

impl CommandDraft {
    /// `None` when the command answer is blank.
    pub fn from_answers(answers: &[String]) -> Option<Self> {
        let command = answers.first()?.trim();
        if command.is_empty() {
            return None;
        }
        let label = answers
            .get(1)
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .map(str::to_string);
        let variables = answers
            .get(2)
            .map(|raw| split_variables(raw))
            .unwrap_or_default();
        Some(Self {
            command: command.to_string(),
            label,
            variables,
        })
    }

    /// A new stopped leaf in `scope`.
    pub fn into_node(self, scope: Scope) -> CommandNode {
        CommandNode::leaf(scope, self.command, self.label, self.variables)
    }

    /// A patch replacing every field; a missing label falls back to the command.
    pub fn into_patch(self) -> NodePatch {
        NodePatch {
            label: Some(self.label.unwrap_or_default()),
            command: Some(self.command),
            variables: Some(self.variables),
        }
    }
}

/// The label answered in a group flow, if not blank.
pub fn group_label(answers: &[String]) -> Option<String> {
    answers
        .first()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
}

/// Splits a comma-separated list; blanks are dropped.
pub fn split_variables(raw: &str) -> Vec<String> {
    models::clean_variables(raw.split(',').map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scripted(Vec<Option<&'static str>>, Vec<String>);

    impl Prompter for Scripted {
        fn prompt(&mut self, step: &PromptStep, _position: usize, _total: usize) -> Option<String> {
            self.1.push(step.initial.clone());
            if self.0.is_empty() {
                return None;
            }
            self.0.remove(0).map(str::to_string)
        }
    }

    #[test]
    fn test_flow_completes_after_every_step() {
        let mut flow = new_command_flow();
        assert_eq!(flow.position(), (1, 3));
        assert_eq!(flow.submit(" npm test "), FlowStatus::Next);
        assert_eq!(flow.submit(""), FlowStatus::Next);
        assert_eq!(
            flow.submit("--watch, --ci"),
            FlowStatus::Complete(vec!["npm test".into(), "".into(), "--watch, --ci".into()])
        );
        assert!(flow.is_closed());
        assert_eq!(flow.submit("late"), FlowStatus::Closed);
    }

    #[test]
    fn test_cancel_discards_answers() {
        let mut flow = new_command_flow();
        flow.submit("ls");
        flow.cancel();
        assert!(flow.current_step().is_none());
        assert_eq!(flow.submit("again"), FlowStatus::Closed);
    }

    #[test]
    fn test_abandoned_step_cancels_the_run() {
        let mut prompter = Scripted(vec![Some("ls"), None], Vec::new());
        assert_eq!(run_flow(new_command_flow(), &mut prompter), None);
    }

    #[test]
    fn test_draft_defaults_and_variable_split() {
        let answers = vec![
            "npm run dev".to_string(),
            " ".to_string(),
            "--port 3000, ,--open".to_string(),
        ];
        let draft = CommandDraft::from_answers(&answers).unwrap();
        assert_eq!(draft.label, None);
        assert_eq!(draft.variables, vec!["--port 3000", "--open"]);

        let node = draft.into_node(Scope::Global);
        assert_eq!(node.label, "npm run dev");
    }

    #[test]
    fn test_blank_command_creates_nothing() {
        assert!(CommandDraft::from_answers(&["  ".to_string()]).is_none());
        assert!(CommandDraft::from_answers(&[]).is_none());
        assert_eq!(group_label(&[" ".to_string()]), None);
    }

    #[test]
    fn test_edit_flow_is_prefilled() {
        let node = CommandNode::leaf(
            Scope::Workspace,
            "cargo test",
            Some("tests".into()),
            vec!["--release".into(), "-q".into()],
        );
        let mut prompter = Scripted(vec![Some("cargo test"), Some("t"), Some("")], Vec::new());
        let answers = run_flow(edit_command_flow(&node).unwrap(), &mut prompter).unwrap();

        assert_eq!(prompter.1, vec!["cargo test", "tests", "--release, -q"]);
        let patch = CommandDraft::from_answers(&answers).unwrap().into_patch();
        assert_eq!(patch.label.as_deref(), Some("t"));
        assert_eq!(patch.variables, Some(vec![]));
    }

    #[test]
    fn test_groups_have_no_command_flow() {
        let group = CommandNode::group(Scope::Global, "build");
        assert!(edit_command_flow(&group).is_none());
        assert_eq!(edit_group_flow(&group).current_step().unwrap().initial, "build");
    }
}
