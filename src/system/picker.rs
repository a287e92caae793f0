// src/system/picker.rs

//! dialoguer front-ends for variable selection and the input wizards.

use crate::core::execution::VariablePicker;
use crate::core::input_flow::{PromptStep, Prompter};
use colored::*;
use dialoguer::{Input, MultiSelect, theme::ColorfulTheme};

/// Terminal picker for launch-time variables. Special choices are listed after the
/// variables; ESC cancels.
#[derive(Debug, Default)]
pub struct TerminalPicker {
    /// Shown in the prompt, usually the node label.
    pub title: String,
}

impl TerminalPicker {
    /// Creates a picker whose prompt names `title`.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

impl VariablePicker for TerminalPicker {
    fn pick_many(&mut self, options: &[String], special_choices: &[String]) -> Option<Vec<String>> {
        let items: Vec<String> = options.iter().chain(special_choices).cloned().collect();
        let prompt = format!(t!("picker.prompt"), label = self.title);
        let chosen = MultiSelect::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .items(&items)
            .interact_opt();

        match chosen {
            Ok(Some(indices)) => Some(
                indices
                    .into_iter()
                    .filter_map(|i| items.get(i).cloned())
                    .collect(),
            ),
            Ok(None) => None,
            Err(e) => {
                log::warn!("Variable selection failed: {}", e);
                None
            }
        }
    }
}

/// Answers wizard steps with dialoguer text inputs. An interrupted prompt abandons the flow.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn prompt(&mut self, step: &PromptStep, position: usize, total: usize) -> Option<String> {
        println!(
            "{}",
            format!(
                t!("flow.step_header"),
                position = position,
                total = total,
                title = step.title
            )
            .bold()
        );
        let theme = ColorfulTheme::default();
        let input = step_input(&theme, step);
        if step.initial.is_empty() && !step.placeholder.is_empty() {
            println!("{}", step.placeholder.dimmed());
        }

        match input.interact_text() {
            Ok(value) => Some(value),
            Err(e) => {
                log::debug!("Prompt abandoned: {}", e);
                None
            }
        }
    }
}

/// Builds the text input for one wizard step, pre-filled with its initial value.
fn step_input<'a>(theme: &'a ColorfulTheme, step: &PromptStep) -> Input<'a, String> {
    let input = Input::<String>::with_theme(theme)
        .with_prompt(step.prompt.as_str())
        .allow_empty(true);
    if step.initial.is_empty() {
        input
    } else {
        input.with_initial_text(step.initial.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(initial: &str) -> PromptStep {
        PromptStep {
            title: "Command".into(),
            prompt: "Command to run".into(),
            placeholder: "npm test".into(),
            initial: initial.into(),
        }
    }

    #[test]
    fn test_step_input_outlives_its_builder_chain() {
        let theme = ColorfulTheme::default();
        let blank = step_input(&theme, &step(""));
        let prefilled = step_input(&theme, &step("cargo run"));
        // Both inputs borrow the same theme and can still be configured afterwards.
        let _ = blank.with_prompt("again");
        let _ = prefilled.allow_empty(false);
    }
}
