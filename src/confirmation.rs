//! `x-cli-confirmation` gate: a templated yes/no prompt shown before a
//! destructive operation runs, with a bordered box and a bypass flag.

use crate::error::Error;
use crate::interactive::mock::InputOutput;
use crate::spec::model::ConfirmationSpec;
use crate::utils::to_kebab_case;
use std::collections::HashMap;

/// Renders `spec.message_template`, substituting `{param}`, `{paramCamel}`,
/// and `{param_snake}` placeholders from `params` (keyed by the parameter's
/// original name).
#[must_use]
pub fn render_message(spec: &ConfirmationSpec, params: &HashMap<String, String>) -> String {
    let mut message = spec.message_template.clone();
    for (name, value) in params {
        message = message.replace(&format!("{{{name}}}"), value);
        message = message.replace(&format!("{{{name}Camel}}"), value);
        message = message.replace(&format!("{{{}_snake}}", to_snake_case(name)), value);
    }
    message
}

fn to_snake_case(name: &str) -> String {
    to_kebab_case(name).replace('-', "_")
}

fn bordered_box(message: &str) -> String {
    let width = message.lines().map(str::len).max().unwrap_or(0).max(1);
    let top = format!("+{}+", "-".repeat(width + 2));
    let mut out = String::new();
    out.push_str(&top);
    out.push('\n');
    for line in message.lines() {
        out.push_str(&format!("| {line:<width$} |\n"));
    }
    out.push_str(&top);
    out
}

/// Evaluates a confirmation gate. Returns `Ok(true)` when the operation
/// should proceed: either the bypass flag is set, or the user answered yes.
/// Non-interactive sessions with no bypass default to "no" (returns
/// `Ok(false)`, never an error — the caller decides whether that's fatal).
///
/// # Errors
/// Propagates I/O errors from the underlying prompt.
pub fn confirm_with_io<T: InputOutput>(
    spec: &ConfirmationSpec,
    params: &HashMap<String, String>,
    bypass: bool,
    interactive: bool,
    io: &T,
) -> Result<bool, Error> {
    if bypass {
        return Ok(true);
    }
    let message = render_message(spec, params);
    io.println(&bordered_box(&message))?;

    if !interactive {
        return Ok(false);
    }
    crate::interactive::confirm_with_io("Proceed?", io)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Scripted stand-in for stdin/stdout: `read_line` pops from `inputs`
    /// in order, `println`/`print` record to `output` for inspection.
    struct ScriptedIo {
        inputs: RefCell<Vec<String>>,
        output: RefCell<Vec<String>>,
    }

    impl ScriptedIo {
        fn new(inputs: Vec<&str>) -> Self {
            Self {
                inputs: RefCell::new(inputs.into_iter().rev().map(str::to_string).collect()),
                output: RefCell::new(Vec::new()),
            }
        }
    }

    impl InputOutput for ScriptedIo {
        fn print(&self, text: &str) -> Result<(), Error> {
            self.output.borrow_mut().push(text.to_string());
            Ok(())
        }

        fn println(&self, text: &str) -> Result<(), Error> {
            self.output.borrow_mut().push(text.to_string());
            Ok(())
        }

        fn flush(&self) -> Result<(), Error> {
            Ok(())
        }

        fn read_line(&self) -> Result<String, Error> {
            Ok(self.inputs.borrow_mut().pop().unwrap_or_default())
        }
    }

    fn spec(template: &str) -> ConfirmationSpec {
        ConfirmationSpec {
            message_template: template.to_string(),
            bypass_flag: Some("force".to_string()),
        }
    }

    #[test]
    fn render_message_substitutes_plain_placeholder() {
        let params = HashMap::from([("clusterId".to_string(), "abc123".to_string())]);
        let rendered = render_message(&spec("Delete cluster {clusterId}?"), &params);
        assert_eq!(rendered, "Delete cluster abc123?");
    }

    #[test]
    fn bypass_flag_skips_prompt_entirely() {
        let io = ScriptedIo::new(vec![]);
        let params = HashMap::new();
        let result = confirm_with_io(&spec("Proceed?"), &params, true, true, &io).unwrap();
        assert!(result);
        assert!(io.output.borrow().is_empty());
    }

    #[test]
    fn non_interactive_without_bypass_defaults_to_no() {
        let io = ScriptedIo::new(vec![]);
        let params = HashMap::new();
        let result = confirm_with_io(&spec("Proceed?"), &params, false, false, &io).unwrap();
        assert!(!result);
    }

    #[test]
    fn interactive_yes_answer_proceeds() {
        let io = ScriptedIo::new(vec!["y"]);
        let params = HashMap::new();
        let result = confirm_with_io(&spec("Proceed?"), &params, false, true, &io).unwrap();
        assert!(result);
    }

    #[test]
    fn interactive_empty_answer_defaults_to_no() {
        let io = ScriptedIo::new(vec![""]);
        let params = HashMap::new();
        let result = confirm_with_io(&spec("Proceed?"), &params, false, true, &io).unwrap();
        assert!(!result);
    }

    #[test]
    fn bordered_box_wraps_message_with_matching_width() {
        let boxed = bordered_box("hello");
        let lines: Vec<&str> = boxed.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].len(), lines[2].len());
    }
}
