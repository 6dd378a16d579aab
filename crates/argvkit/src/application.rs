//! Command registry, lookup and dispatch.
//!
//! A [`Command`] is plain data: a definition, a handler and an optional
//! completion hook. The [`Application`] owns the global definition that every
//! registered command is merged with.

use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};

use indexmap::IndexMap;
use tracing::debug;

use crate::binder::{bind, bind_tolerant};
use crate::completion::{CompletionInput, CompletionState};
use crate::definition::{ArgumentSpec, InputDefinition, OptionSpec};
use crate::error::{CommandError, CompletionError};
use crate::help;
use crate::input::ParsedInput;
use crate::raw::{first_argument, has_parameter_option};
use crate::suggestions::{Suggestion, SuggestionSink};

/// Runs a command with its bound input and returns the exit code.
pub type Handler =
    Box<dyn Fn(&ParsedInput, &mut dyn Write) -> Result<i32, CommandError> + Send + Sync>;

/// Adds dynamic suggestions for the value being completed.
pub type CompletionHook =
    Box<dyn Fn(&CompletionState, &ParsedInput, &mut SuggestionSink) + Send + Sync>;

pub struct Command {
    name: String,
    description: String,
    aliases: Vec<String>,
    hidden: bool,
    definition: InputDefinition,
    /// The declared definition merged with the application's; set on registration.
    input_definition: InputDefinition,
    handler: Handler,
    completion_hook: Option<CompletionHook>,
}

impl Command {
    pub fn new<F>(name: impl Into<String>, definition: InputDefinition, handler: F) -> Self
    where
        F: Fn(&ParsedInput, &mut dyn Write) -> Result<i32, CommandError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: String::new(),
            aliases: Vec::new(),
            hidden: false,
            input_definition: definition.clone(),
            definition,
            handler: Box::new(handler),
            completion_hook: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Hidden commands still run but are left out of listings, abbreviations
    /// and completion.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn completion<F>(mut self, hook: F) -> Self
    where
        F: Fn(&CompletionState, &ParsedInput, &mut SuggestionSink) + Send + Sync + 'static,
    {
        self.completion_hook = Some(Box::new(hook));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_description(&self) -> &str {
        &self.description
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// The definition as declared.
    pub fn definition(&self) -> &InputDefinition {
        &self.definition
    }

    /// The definition used for binding and completion.
    pub fn input_definition(&self) -> &InputDefinition {
        &self.input_definition
    }

    pub fn execute(&self, input: &ParsedInput, out: &mut dyn Write) -> Result<i32, CommandError> {
        (self.handler)(input, out)
    }

    /// Run the completion hook, if any.
    pub fn complete(&self, state: &CompletionState, input: &ParsedInput, sink: &mut SuggestionSink) {
        if let Some(hook) = &self.completion_hook {
            hook(state, input, sink);
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("hidden", &self.hidden)
            .field("definition", &self.definition)
            .field("completion_hook", &self.completion_hook.is_some())
            .finish_non_exhaustive()
    }
}

/// How much the application should print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
    VeryVerbose,
    Debug,
}

impl Verbosity {
    /// Command-line flags win over `env_value` (a `SHELL_VERBOSITY`-style level
    /// from `-1` to `3`). Scanning stops at `--`.
    pub fn resolve<S: AsRef<str>>(tokens: &[S], env_value: Option<&str>) -> Verbosity {
        let env = match env_value.and_then(|v| v.trim().parse::<i32>().ok()) {
            Some(level) if level < 0 => Verbosity::Quiet,
            Some(1) => Verbosity::Verbose,
            Some(2) => Verbosity::VeryVerbose,
            Some(level) if level >= 3 => Verbosity::Debug,
            _ => Verbosity::Normal,
        };

        let has = |names: &[&str]| has_parameter_option(tokens, names, true);
        if has(&["--quiet", "-q"]) {
            return Verbosity::Quiet;
        }
        if has(&["-vvv"]) {
            Verbosity::Debug
        } else if has(&["-vv"]) {
            Verbosity::VeryVerbose
        } else if has(&["-v", "--verbose"]) {
            Verbosity::Verbose
        } else {
            env
        }
    }

    pub fn is_quiet(self) -> bool {
        self == Verbosity::Quiet
    }
}

/// A named, versioned set of commands.
pub struct Application {
    name: String,
    version: String,
    definition: InputDefinition,
    commands: IndexMap<String, Command>,
    aliases: HashMap<String, String>,
    env_verbosity: Option<String>,
}

impl Application {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            definition: default_definition(),
            commands: IndexMap::new(),
            aliases: HashMap::new(),
            env_verbosity: None,
        }
    }

    /// Verbosity level used when the command line sets none.
    pub fn env_verbosity(mut self, value: Option<String>) -> Self {
        self.env_verbosity = value;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// `name version`, or just `name` without a version.
    pub fn long_version(&self) -> String {
        if self.version.trim().is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.name, self.version.trim())
        }
    }

    pub fn definition(&self) -> &InputDefinition {
        &self.definition
    }

    /// Registered commands in registration order, hidden ones included.
    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.commands.values()
    }

    /// Visible commands sorted by name.
    pub fn visible_commands(&self) -> Vec<&Command> {
        let mut visible: Vec<&Command> = self.commands.values().filter(|c| !c.hidden).collect();
        visible.sort_by(|a, b| a.name.cmp(&b.name));
        visible
    }

    pub fn register(&mut self, mut command: Command) -> Result<&mut Self, CommandError> {
        validate_name(&command.name)?;
        for alias in &command.aliases {
            validate_name(alias)?;
        }

        let mut claimed: Vec<&str> = vec![command.name.as_str()];
        claimed.extend(command.aliases.iter().map(String::as_str));
        for (i, name) in claimed.iter().enumerate() {
            if self.commands.contains_key(*name)
                || self.aliases.contains_key(*name)
                || claimed[..i].contains(name)
            {
                return Err(CommandError::Duplicate(name.to_string()));
            }
        }

        command.input_definition = command.definition.merge(&self.definition)?;
        for alias in &command.aliases {
            self.aliases.insert(alias.clone(), command.name.clone());
        }
        debug!(command = %command.name, aliases = ?command.aliases, "registered command");
        self.commands.insert(command.name.clone(), command);
        Ok(self)
    }

    /// Resolve `name` by exact name, alias, or `:`-segment abbreviation
    /// (`ca:cl` for `cache:clear`).
    pub fn find(&self, name: &str) -> Result<&Command, CommandError> {
        if let Some(command) = self.commands.get(name) {
            return Ok(command);
        }
        if let Some(command) = self.aliases.get(name).and_then(|n| self.commands.get(n)) {
            return Ok(command);
        }

        let candidates: Vec<&Command> = self
            .visible_commands()
            .into_iter()
            .filter(|c| abbreviates(name, &c.name))
            .collect();
        debug!(name, candidates = candidates.len(), "command lookup by abbreviation");

        match candidates.as_slice() {
            [one] => Ok(*one),
            [] => Err(CommandError::NotFound {
                name: name.to_string(),
                alternatives: self.alternatives(name),
            }),
            many => Err(CommandError::Ambiguous {
                name: name.to_string(),
                candidates: many.iter().map(|c| c.name.clone()).collect(),
            }),
        }
    }

    fn alternatives(&self, name: &str) -> Vec<String> {
        let threshold = name.chars().count() / 3;
        let lower = name.to_lowercase();
        let mut found: Vec<(usize, String)> = self
            .visible_commands()
            .into_iter()
            .filter_map(|c| {
                let distance = levenshtein(name, &c.name);
                (distance <= threshold || c.name.to_lowercase().contains(&lower))
                    .then(|| (distance, c.name.clone()))
            })
            .collect();
        found.sort();
        found.into_iter().map(|(_, n)| n).collect()
    }

    /// Parse `argv` (without the program name), dispatch, and return the exit code.
    ///
    /// Errors are written to `err`; the return value is then `1`.
    pub fn run<S: AsRef<str>>(&self, argv: &[S], out: &mut dyn Write, err: &mut dyn Write) -> i32 {
        let tokens: Vec<&str> = argv.iter().map(|t| t.as_ref()).collect();
        match self.dispatch(&tokens, out, err) {
            Ok(code) => code,
            Err(e) => {
                debug!(error = %e, "failed to write output");
                1
            }
        }
    }

    fn dispatch(&self, tokens: &[&str], out: &mut dyn Write, err: &mut dyn Write) -> io::Result<i32> {
        if has_parameter_option(tokens, &["--version", "-V"], true) {
            writeln!(out, "{}", self.long_version())?;
            return Ok(0);
        }

        let help = has_parameter_option(tokens, &["--help", "-h"], true);
        let Some(name) = first_argument(tokens, &self.definition) else {
            write!(out, "{}", help::application_help(self))?;
            return Ok(0);
        };

        let command = match self.find(name) {
            Ok(command) => command,
            Err(e) => {
                writeln!(err, "{e}")?;
                return Ok(1);
            }
        };

        if help {
            write!(out, "{}", help::command_help(command, &self.name))?;
            return Ok(0);
        }

        let input = match bind(tokens, command.input_definition()) {
            Ok(input) => input,
            Err(e) => {
                writeln!(err, "{e}")?;
                writeln!(err)?;
                writeln!(err, "{}", help::usage_line(command, &self.name))?;
                return Ok(1);
            }
        };

        let verbosity = Verbosity::resolve(tokens, self.env_verbosity.as_deref());
        debug!(command = %command.name, ?verbosity, "dispatching");

        let mut quiet = io::sink();
        let sink: &mut dyn Write = if verbosity.is_quiet() { &mut quiet } else { out };
        match command.execute(&input, sink) {
            Ok(code) => Ok(code),
            Err(e) => {
                writeln!(err, "{e}")?;
                Ok(1)
            }
        }
    }

    /// Suggestions for the word at `cursor` in `tokens` (without the program name).
    pub fn complete<S: AsRef<str>>(
        &self,
        tokens: &[S],
        cursor: usize,
    ) -> Result<SuggestionSink, CompletionError> {
        let input = completion_input(tokens, cursor)?;
        let (command, state) = self.classify_completion(&input);
        let mut sink = SuggestionSink::new();

        let on_command_name = matches!(
            &state,
            CompletionState::ArgumentValue { name, .. } if name == "command"
        );
        let command = match command {
            Some(command) if !on_command_name => command,
            // The shell filters the full list by the typed prefix.
            _ => {
                self.complete_application(&state, &mut sink);
                return Ok(sink);
            }
        };

        let definition = command.input_definition();
        match &state {
            CompletionState::OptionName { .. } => {
                sink.suggest_options(definition.options().cloned());
                return Ok(sink);
            }
            CompletionState::OptionValue { name, .. } => {
                if let Some(spec) = definition.option_spec(name) {
                    sink.suggest_values(spec.suggested_values());
                }
            }
            CompletionState::ArgumentValue { name, .. } => {
                if let Some(spec) = definition.argument_spec(name) {
                    sink.suggest_values(spec.suggested_values());
                }
            }
            CompletionState::None => return Ok(sink),
        }

        let bound = bind_tolerant(input.tokens(), definition);
        command.complete(&state, &bound, &mut sink);
        Ok(sink)
    }

    /// The classification [`Application::complete`] acts on.
    pub fn completion_state<S: AsRef<str>>(
        &self,
        tokens: &[S],
        cursor: usize,
    ) -> Result<CompletionState, CompletionError> {
        let input = completion_input(tokens, cursor)?;
        Ok(self.classify_completion(&input).1)
    }

    /// Classify against the application definition first; once a command is
    /// named (and the cursor is not on its name), against the command's.
    fn classify_completion(&self, input: &CompletionInput) -> (Option<&Command>, CompletionState) {
        let app_state = input.classify(&self.definition);
        let command = first_argument(input.tokens(), &self.definition)
            .and_then(|name| self.find(name).ok());
        debug!(command = ?command.map(Command::name), ?app_state, "completing");

        match command {
            Some(command) if app_state.name() != Some("command") => {
                (Some(command), input.classify(command.input_definition()))
            }
            other => (other, app_state),
        }
    }

    fn complete_application(&self, state: &CompletionState, sink: &mut SuggestionSink) {
        match state {
            CompletionState::OptionName { .. } => {
                sink.suggest_options(self.definition.options().cloned());
            }
            CompletionState::ArgumentValue { name, .. } if name == "command" => {
                for command in self.visible_commands() {
                    sink.suggest_value(Suggestion::with_description(
                        command.name(),
                        command.get_description(),
                    ));
                    for alias in command.aliases() {
                        sink.suggest_value(Suggestion::with_description(
                            alias.as_str(),
                            command.get_description(),
                        ));
                    }
                }
            }
            _ => {}
        }
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("commands", &self.commands.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

fn completion_input<S: AsRef<str>>(
    tokens: &[S],
    cursor: usize,
) -> Result<CompletionInput, CompletionError> {
    let owned: Vec<String> = tokens.iter().map(|t| t.as_ref().to_string()).collect();
    CompletionInput::from_tokens(owned, cursor)
}

fn default_definition() -> InputDefinition {
    InputDefinition::trusted(
        vec![ArgumentSpec::required("command").description("The command to execute")],
        vec![
            OptionSpec::flag("help")
                .short('h')
                .description("Display help for the given command, or the command list"),
            OptionSpec::flag("quiet")
                .short('q')
                .description("Do not output any message"),
            OptionSpec::flag("verbose")
                .short('v')
                .description("Increase the verbosity of messages (-v, -vv or -vvv)"),
            OptionSpec::flag("version")
                .short('V')
                .description("Display this application version"),
            OptionSpec::negatable("ansi").description("Force (or disable --no-ansi) ANSI output"),
            OptionSpec::flag("no-interaction")
                .short('n')
                .description("Do not ask any interactive question"),
        ],
    )
}

fn validate_name(name: &str) -> Result<(), CommandError> {
    let valid = !name.is_empty()
        && !name.chars().any(char::is_whitespace)
        && name.split(':').all(|segment| !segment.is_empty());
    if valid {
        Ok(())
    } else {
        Err(CommandError::InvalidName(name.to_string()))
    }
}

/// Each `:` segment of `abbreviation` is a case-insensitive prefix of the
/// matching segment of `name`, with the same number of segments.
fn abbreviates(abbreviation: &str, name: &str) -> bool {
    let short: Vec<&str> = abbreviation.split(':').collect();
    let full: Vec<&str> = name.split(':').collect();
    short.len() == full.len()
        && short
            .iter()
            .zip(&full)
            .all(|(s, f)| f.to_lowercase().starts_with(&s.to_lowercase()))
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut current = vec![i + 1; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        previous = current;
    }
    previous[b.len()]
}
