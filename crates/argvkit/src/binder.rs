//! Binding of a token sequence against an [`InputDefinition`].
//!
//! Tokens are folded left to right into a [`BindState`]; defaults are applied
//! once at the end. In strict mode the first error stops the fold. In
//! tolerant mode (used for completion) the offending token is dropped and
//! binding continues.

use std::iter::Peekable;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::definition::{InputDefinition, OptionSpec};
use crate::error::ParseError;
use crate::input::{ParsedInput, Value};

/// Bind `tokens` against `definition`, failing on the first error.
pub fn bind<S: AsRef<str>>(
    tokens: &[S],
    definition: &InputDefinition,
) -> Result<ParsedInput, ParseError> {
    let (state, error) = Binder::new(definition, Mode::Strict).run(tokens);
    if let Some(err) = error {
        debug!(%err, "bind failed");
        return Err(err);
    }
    state.finish(definition, Mode::Strict)
}

/// Bind whatever can be bound, ignoring every error.
///
/// Required arguments may be absent from the result's explicit values; they
/// read as their defaults.
pub fn bind_tolerant<S: AsRef<str>>(tokens: &[S], definition: &InputDefinition) -> ParsedInput {
    let state = bind_state(tokens, definition);
    let mut arguments = IndexMap::new();
    for spec in definition.arguments() {
        let value = state
            .arguments
            .get(spec.name())
            .cloned()
            .unwrap_or_else(|| spec.fallback());
        arguments.insert(spec.name().to_string(), value);
    }
    let mut options = IndexMap::new();
    for spec in definition.options() {
        let value = state
            .options
            .get(spec.name())
            .cloned()
            .unwrap_or_else(|| spec.fallback());
        options.insert(spec.name().to_string(), value);
    }
    ParsedInput::new(arguments, options)
}

/// Tolerant bind without defaults, for completion.
pub(crate) fn bind_state<S: AsRef<str>>(tokens: &[S], definition: &InputDefinition) -> BindState {
    Binder::new(definition, Mode::Tolerant).run(tokens).0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Strict,
    Tolerant,
}

/// Values bound so far, before defaults.
#[derive(Debug, Clone)]
pub(crate) struct BindState {
    pub(crate) arguments: IndexMap<String, Value>,
    pub(crate) options: IndexMap<String, Value>,
    /// Cleared by a `--` token.
    pub(crate) parse_options: bool,
    /// Argument that received the most recent token, if that token was positional.
    pub(crate) last_positional: Option<String>,
}

impl BindState {
    fn new() -> Self {
        Self {
            arguments: IndexMap::new(),
            options: IndexMap::new(),
            parse_options: true,
            last_positional: None,
        }
    }

    fn finish(mut self, definition: &InputDefinition, mode: Mode) -> Result<ParsedInput, ParseError> {
        if mode == Mode::Strict {
            let missing: Vec<String> = definition
                .arguments()
                .iter()
                .filter(|a| a.is_required() && !self.arguments.contains_key(a.name()))
                .map(|a| a.name().to_string())
                .collect();
            if !missing.is_empty() {
                return Err(ParseError::MissingArgument { names: missing });
            }
        }

        let mut arguments = IndexMap::with_capacity(definition.argument_count());
        for spec in definition.arguments() {
            let value = self
                .arguments
                .swap_remove(spec.name())
                .unwrap_or_else(|| spec.fallback());
            arguments.insert(spec.name().to_string(), value);
        }

        let mut options = IndexMap::new();
        for spec in definition.options() {
            let value = self
                .options
                .swap_remove(spec.name())
                .unwrap_or_else(|| spec.fallback());
            options.insert(spec.name().to_string(), value);
        }

        debug!(
            arguments = arguments.len(),
            options = options.len(),
            "bound input"
        );
        Ok(ParsedInput::new(arguments, options))
    }
}

struct Binder<'d> {
    definition: &'d InputDefinition,
    mode: Mode,
}

impl<'d> Binder<'d> {
    fn new(definition: &'d InputDefinition, mode: Mode) -> Self {
        Self { definition, mode }
    }

    /// Fold every token into a fresh state. In strict mode the fold stops at
    /// the first error, which is returned alongside the partial state.
    fn run<S: AsRef<str>>(&self, tokens: &[S]) -> (BindState, Option<ParseError>) {
        let mut state = BindState::new();
        let mut rest = tokens.iter().map(|t| t.as_ref()).peekable();

        while let Some(token) = rest.next() {
            state.last_positional = None;
            if let Err(err) = self.step(&mut state, token, &mut rest) {
                if self.mode == Mode::Strict {
                    return (state, Some(err));
                }
                trace!(%err, token, "ignoring parse error");
            }
        }

        (state, None)
    }

    fn step<'t, I>(
        &self,
        state: &mut BindState,
        token: &'t str,
        rest: &mut Peekable<I>,
    ) -> Result<(), ParseError>
    where
        I: Iterator<Item = &'t str>,
    {
        if !state.parse_options || token.is_empty() || token == "-" {
            return self.push_argument(state, token);
        }
        if token == "--" {
            state.parse_options = false;
            return Ok(());
        }
        if let Some(long) = token.strip_prefix("--") {
            return self.long_option(state, long, rest);
        }
        if let Some(cluster) = token.strip_prefix('-') {
            return self.short_options(state, cluster, rest);
        }
        self.push_argument(state, token)
    }

    fn long_option<'t, I>(
        &self,
        state: &mut BindState,
        long: &'t str,
        rest: &mut Peekable<I>,
    ) -> Result<(), ParseError>
    where
        I: Iterator<Item = &'t str>,
    {
        let (name, inline) = match long.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (long, None),
        };

        if let Some(opt) = self.definition.option_spec(name) {
            return self.bind_option(state, opt, inline, rest);
        }

        if let Some(opt) = self.definition.negated_option(name) {
            if inline.is_some() {
                return Err(ParseError::UnexpectedValue {
                    option: name.to_string(),
                });
            }
            trace!(option = opt.name(), "negated option");
            state.options.insert(opt.name().to_string(), Value::Bool(false));
            return Ok(());
        }

        Err(ParseError::UnknownOption {
            option: format!("--{name}"),
        })
    }

    /// `-abc` binds flags `a` and `b`, then `c`. The first shortcut that
    /// accepts a value takes the rest of the cluster as its value.
    fn short_options<'t, I>(
        &self,
        state: &mut BindState,
        cluster: &'t str,
        rest: &mut Peekable<I>,
    ) -> Result<(), ParseError>
    where
        I: Iterator<Item = &'t str>,
    {
        for (i, c) in cluster.char_indices() {
            let opt = self
                .definition
                .option_for_shortcut(c)
                .ok_or_else(|| ParseError::UnknownOption {
                    option: format!("-{c}"),
                })?;

            if opt.accepts_value() {
                let attached = &cluster[i + c.len_utf8()..];
                let inline = (!attached.is_empty()).then_some(attached);
                return self.bind_option(state, opt, inline, rest);
            }
            self.bind_option(state, opt, None, rest)?;
        }
        Ok(())
    }

    fn bind_option<'t, I>(
        &self,
        state: &mut BindState,
        opt: &OptionSpec,
        inline: Option<&'t str>,
        rest: &mut Peekable<I>,
    ) -> Result<(), ParseError>
    where
        I: Iterator<Item = &'t str>,
    {
        let name = opt.name().to_string();

        if !opt.accepts_value() {
            if inline.is_some() {
                return Err(ParseError::UnexpectedValue { option: name });
            }
            state.options.insert(name, Value::Bool(true));
            return Ok(());
        }

        let value = match inline {
            Some(v) => Some(v),
            None => rest.next_if(|next| next.is_empty() || !next.starts_with('-')),
        };
        trace!(option = %name, ?value, "bound option");

        match value {
            Some(v) if opt.is_array() => append(&mut state.options, name, v),
            Some(v) => {
                state.options.insert(name, Value::String(v.to_string()));
            }
            None if opt.is_value_required() => {
                return Err(ParseError::MissingValue { option: name });
            }
            None if opt.is_array() => {
                state
                    .options
                    .entry(name)
                    .or_insert_with(|| Value::List(Vec::new()));
            }
            None => {
                state.options.insert(name, opt.fallback());
            }
        }
        Ok(())
    }

    fn push_argument(&self, state: &mut BindState, token: &str) -> Result<(), ParseError> {
        let specs = self.definition.arguments();
        let bound = state.arguments.len();

        let target = if let Some(spec) = specs.get(bound) {
            let value = if spec.is_array() {
                Value::List(vec![token.to_string()])
            } else {
                Value::String(token.to_string())
            };
            state.arguments.insert(spec.name().to_string(), value);
            spec.name()
        } else if let Some(spec) = specs.last().filter(|a| a.is_array()) {
            append(&mut state.arguments, spec.name().to_string(), token);
            spec.name()
        } else {
            return Err(ParseError::TooManyArguments {
                token: token.to_string(),
                expected: specs.iter().map(|a| a.name().to_string()).collect(),
            });
        };

        trace!(argument = target, token, "bound argument");
        state.last_positional = Some(target.to_string());
        Ok(())
    }
}

fn append(values: &mut IndexMap<String, Value>, name: String, item: &str) {
    let slot = values.entry(name).or_insert_with(|| Value::List(Vec::new()));
    match slot {
        Value::List(items) => items.push(item.to_string()),
        other => *other = Value::List(vec![item.to_string()]),
    }
}
