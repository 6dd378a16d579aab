//! Classification of an in-progress command line for shell completion.
//!
//! The token under the cursor (or the token before it when the cursor sits
//! after a separator) decides whether an option name, an option value or an
//! argument value is being typed. Parse errors never surface here.

use serde::Serialize;
use tracing::debug;

use crate::binder::bind_state;
use crate::definition::InputDefinition;
use crate::error::CompletionError;
use crate::raw::resolve_option_token;
use crate::tokenizer::tokenize_prefix;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompletionType {
    OptionName,
    OptionValue,
    ArgumentValue,
    None,
}

/// What the cursor is completing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum CompletionState {
    /// `partial` is the whole option token typed so far (`--fo`, `-`).
    OptionName { partial: String },
    OptionValue { name: String, partial: String },
    ArgumentValue { name: String, partial: String },
    None,
}

impl CompletionState {
    pub fn kind(&self) -> CompletionType {
        match self {
            CompletionState::OptionName { .. } => CompletionType::OptionName,
            CompletionState::OptionValue { .. } => CompletionType::OptionValue,
            CompletionState::ArgumentValue { .. } => CompletionType::ArgumentValue,
            CompletionState::None => CompletionType::None,
        }
    }

    /// The option or argument whose value is being completed.
    pub fn name(&self) -> Option<&str> {
        match self {
            CompletionState::OptionValue { name, .. }
            | CompletionState::ArgumentValue { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn partial(&self) -> &str {
        match self {
            CompletionState::OptionName { partial }
            | CompletionState::OptionValue { partial, .. }
            | CompletionState::ArgumentValue { partial, .. } => partial,
            CompletionState::None => "",
        }
    }

    fn option_value(name: &str, partial: &str) -> Self {
        CompletionState::OptionValue {
            name: name.to_string(),
            partial: partial.to_string(),
        }
    }

    fn argument_value(name: &str, partial: &str) -> Self {
        CompletionState::ArgumentValue {
            name: name.to_string(),
            partial: partial.to_string(),
        }
    }
}

/// Classify the completion expected at `cursor`.
///
/// `cursor == tokens.len()` means the cursor follows a separator after the
/// last token; anything larger is [`CompletionError::InvalidCursor`].
pub fn classify<S: AsRef<str>>(
    tokens: &[S],
    cursor: usize,
    definition: &InputDefinition,
) -> Result<CompletionState, CompletionError> {
    if cursor > tokens.len() {
        return Err(CompletionError::InvalidCursor {
            cursor,
            len: tokens.len(),
        });
    }
    let tokens: Vec<&str> = tokens.iter().map(|t| t.as_ref()).collect();
    let state = classify_at(&tokens, cursor, definition);
    debug!(cursor, ?state, "classified completion");
    Ok(state)
}

fn classify_at(tokens: &[&str], cursor: usize, definition: &InputDefinition) -> CompletionState {
    let free = cursor == tokens.len();
    let relevant_index = if free { cursor.checked_sub(1) } else { Some(cursor) };

    let Some(index) = relevant_index else {
        // Nothing typed yet.
        return complete_argument(tokens, None, true, definition);
    };
    let relevant = tokens[index];
    let options_open = !tokens[..index].contains(&"--");

    if options_open && is_option_like(relevant) {
        match resolve_option_token(relevant, definition) {
            None if !free => {
                return CompletionState::OptionName {
                    partial: relevant.to_string(),
                };
            }
            None => {}
            Some((opt, attached)) if opt.accepts_value() => {
                let partial = if free { "" } else { attached.unwrap_or("") };
                return CompletionState::option_value(opt.name(), partial);
            }
            Some(_) if !free => {
                return CompletionState::OptionName {
                    partial: relevant.to_string(),
                };
            }
            Some(_) => {}
        }
    }

    if !free && index > 0 && options_open {
        let previous = tokens[index - 1];
        if is_option_like(previous) && !is_option_like(relevant) {
            if let Some((opt, None)) = resolve_option_token(previous, definition) {
                if opt.accepts_value() {
                    return CompletionState::option_value(opt.name(), relevant);
                }
            }
        }
    }

    complete_argument(&tokens[..=index], Some(relevant), free, definition)
}

/// Argument completion from a tolerant bind of `bound`.
fn complete_argument(
    bound: &[&str],
    relevant: Option<&str>,
    free: bool,
    definition: &InputDefinition,
) -> CompletionState {
    let state = bind_state(bound, definition);

    if !free {
        return match (&state.last_positional, relevant) {
            (Some(name), Some(token)) => CompletionState::argument_value(name, token),
            _ => CompletionState::None,
        };
    }

    let open = definition
        .arguments()
        .iter()
        .find(|a| !state.arguments.contains_key(a.name()))
        .or_else(|| definition.arguments().last().filter(|a| a.is_array()));

    match open {
        Some(spec) => CompletionState::argument_value(spec.name(), ""),
        None => CompletionState::None,
    }
}

fn is_option_like(token: &str) -> bool {
    token.starts_with('-') && token != "-"
}

/// A completion request: tokens plus a cursor that is known to be in range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionInput {
    tokens: Vec<String>,
    cursor: usize,
}

impl CompletionInput {
    /// Tokens as delivered by the shell, with the index of the word under the cursor.
    pub fn from_tokens(tokens: Vec<String>, cursor: usize) -> Result<Self, CompletionError> {
        if cursor > tokens.len() {
            return Err(CompletionError::InvalidCursor {
                cursor,
                len: tokens.len(),
            });
        }
        Ok(Self { tokens, cursor })
    }

    /// A raw line and a cursor offset into it (`COMP_LINE`/`COMP_POINT`).
    ///
    /// `point` counts characters, not bytes; convert a byte-based `COMP_POINT`
    /// first. Only the text before `point` is considered and `point` past the
    /// end is clamped.
    pub fn from_line(line: &str, point: usize) -> Self {
        let prefix: String = line.chars().take(point).collect();
        let split = tokenize_prefix(&prefix);
        let len = split.tokens.len();
        let cursor = if split.trailing_separator {
            len
        } else {
            len.saturating_sub(1)
        };
        Self {
            tokens: split.tokens,
            cursor,
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The cursor follows a separator, so a new word is being started.
    pub fn is_cursor_free(&self) -> bool {
        self.cursor == self.tokens.len()
    }

    /// Drop the first `count` tokens (e.g. the program name).
    pub fn skip(mut self, count: usize) -> Self {
        let count = count.min(self.tokens.len());
        self.tokens.drain(..count);
        self.cursor = self.cursor.saturating_sub(count);
        self
    }

    pub fn classify(&self, definition: &InputDefinition) -> CompletionState {
        let tokens: Vec<&str> = self.tokens.iter().map(String::as_str).collect();
        let state = classify_at(&tokens, self.cursor, definition);
        debug!(cursor = self.cursor, ?state, "classified completion");
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{ArgumentSpec, OptionSpec};

    fn deploy() -> InputDefinition {
        InputDefinition::new()
            .argument(ArgumentSpec::required("command"))
            .and_then(|d| d.argument(ArgumentSpec::optional("target")))
            .and_then(|d| d.option(OptionSpec::value_required("env").short('e')))
            .and_then(|d| d.option(OptionSpec::flag("verbose").short('v')))
            .and_then(|d| d.option(OptionSpec::negatable("ansi")))
            .unwrap()
    }

    fn classify_tokens(tokens: &[&str], cursor: usize, def: &InputDefinition) -> CompletionState {
        classify(tokens, cursor, def).unwrap()
    }

    #[test]
    fn inline_equals_at_end_completes_option_value() {
        let state = classify_tokens(&["deploy", "--env="], 2, &deploy());
        assert_eq!(state, CompletionState::option_value("env", ""));
    }

    #[test]
    fn filled_argument_at_end_completes_nothing() {
        let state = classify_tokens(&["deploy", "prod"], 2, &deploy());
        assert_eq!(state, CompletionState::None);
    }

    #[test]
    fn open_argument_at_end_completes_it() {
        let state = classify_tokens(&["deploy"], 1, &deploy());
        assert_eq!(state, CompletionState::argument_value("target", ""));

        let def = InputDefinition::new()
            .argument(ArgumentSpec::required("command"))
            .and_then(|d| d.argument(ArgumentSpec::optional("targets").array()))
            .unwrap();
        let state = classify_tokens(&["deploy", "a", "b"], 3, &def);
        assert_eq!(state, CompletionState::argument_value("targets", ""));
    }

    #[test]
    fn cursor_on_positional_completes_its_argument() {
        let state = classify_tokens(&["deploy", "pr"], 1, &deploy());
        assert_eq!(state, CompletionState::argument_value("target", "pr"));

        let state = classify_tokens(&["dep"], 0, &deploy());
        assert_eq!(state, CompletionState::argument_value("command", "dep"));
    }

    #[test]
    fn surplus_positional_completes_nothing() {
        let state = classify_tokens(&["deploy", "prod", "ext"], 2, &deploy());
        assert_eq!(state, CompletionState::None);
    }

    #[test]
    fn unknown_option_under_cursor_is_option_name() {
        let state = classify_tokens(&["deploy", "--ve"], 1, &deploy());
        assert_eq!(
            state,
            CompletionState::OptionName {
                partial: "--ve".to_string()
            }
        );
        assert_eq!(state.kind(), CompletionType::OptionName);
        assert_eq!(state.name(), None);
    }

    #[test]
    fn option_value_forms() {
        let def = deploy();
        assert_eq!(
            classify_tokens(&["deploy", "--env=pr"], 1, &def),
            CompletionState::option_value("env", "pr")
        );
        assert_eq!(
            classify_tokens(&["deploy", "-epr"], 1, &def),
            CompletionState::option_value("env", "pr")
        );
        assert_eq!(
            classify_tokens(&["deploy", "-vepr"], 1, &def),
            CompletionState::option_value("env", "pr")
        );
        assert_eq!(
            classify_tokens(&["deploy", "--env"], 2, &def),
            CompletionState::option_value("env", "")
        );
        assert_eq!(
            classify_tokens(&["deploy", "--env", "pr"], 2, &def),
            CompletionState::option_value("env", "pr")
        );
    }

    #[test]
    fn free_cursor_after_value_option_completes_its_value() {
        let def = deploy();
        assert_eq!(
            classify_tokens(&["deploy", "--env=prod"], 2, &def),
            CompletionState::option_value("env", "")
        );
        assert_eq!(
            classify_tokens(&["deploy", "-eprod"], 2, &def),
            CompletionState::option_value("env", "")
        );
    }

    #[test]
    fn bound_option_value_falls_through_to_arguments() {
        let def = deploy();
        assert_eq!(
            classify_tokens(&["deploy", "--env", "prod"], 3, &def),
            CompletionState::argument_value("target", "")
        );
        assert_eq!(
            classify_tokens(&["deploy", "--nope"], 2, &def),
            CompletionState::argument_value("target", "")
        );
    }

    #[test]
    fn flag_and_negation_under_cursor_are_option_names() {
        let def = deploy();
        assert_eq!(
            classify_tokens(&["deploy", "--no-ansi"], 1, &def).kind(),
            CompletionType::OptionName
        );
        assert_eq!(
            classify_tokens(&["deploy", "-v"], 2, &def),
            CompletionState::argument_value("target", "")
        );
    }

    #[test]
    fn terminator_disables_option_branches() {
        let def = deploy();
        assert_eq!(
            classify_tokens(&["deploy", "--", "--env"], 2, &def),
            CompletionState::argument_value("target", "--env")
        );
        assert_eq!(
            classify_tokens(&["deploy", "--"], 2, &def),
            CompletionState::argument_value("target", "")
        );
    }

    #[test]
    fn empty_input_completes_first_argument() {
        assert_eq!(
            classify_tokens(&[], 0, &deploy()),
            CompletionState::argument_value("command", "")
        );
        assert_eq!(
            classify_tokens(&[], 0, &InputDefinition::new()),
            CompletionState::None
        );
    }

    #[test]
    fn cursor_past_end_is_rejected() {
        let err = classify(&["a"], 2, &deploy()).unwrap_err();
        assert_eq!(err, CompletionError::InvalidCursor { cursor: 2, len: 1 });
        assert!(CompletionInput::from_tokens(vec![], 1).is_err());
    }

    #[test]
    fn from_line_places_cursor_on_current_word() {
        let input = CompletionInput::from_line("deploy --env=pr", 15);
        assert_eq!(input.tokens(), ["deploy", "--env=pr"]);
        assert_eq!(input.cursor(), 1);
        assert!(!input.is_cursor_free());

        let input = CompletionInput::from_line("deploy ", 7);
        assert_eq!(input.cursor(), 1);
        assert!(input.is_cursor_free());

        let input = CompletionInput::from_line("deploy prod", 3);
        assert_eq!(input.tokens(), ["dep"]);
        assert_eq!(input.cursor(), 0);

        let input = CompletionInput::from_line("", 10);
        assert!(input.tokens().is_empty());
        assert_eq!(input.cursor(), 0);
    }

    #[test]
    fn from_line_point_counts_characters() {
        // "é" is two bytes but one character.
        let input = CompletionInput::from_line("café deploy", 5);
        assert_eq!(input.tokens(), ["café"]);
        assert!(input.is_cursor_free());
    }

    #[test]
    fn skip_drops_program_name() {
        let input = CompletionInput::from_line("app deploy ", 11).skip(1);
        assert_eq!(input.tokens(), ["deploy"]);
        assert_eq!(
            input.classify(&deploy()),
            CompletionState::argument_value("target", "")
        );
    }

    #[test]
    fn state_serializes_with_type_tag() {
        let json = serde_json::to_value(CompletionState::option_value("env", "p")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "option-value", "name": "env", "partial": "p"})
        );
        let json = serde_json::to_value(CompletionState::None).unwrap();
        assert_eq!(json, serde_json::json!({"type": "none"}));
    }
}
