//! Declared shape of the input accepted by one command.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::error::DefinitionError;
use crate::input::Value;

/// A positional argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentSpec {
    name: String,
    required: bool,
    array: bool,
    default: Option<Value>,
    description: String,
    suggested_values: Vec<String>,
}

impl ArgumentSpec {
    pub fn required(name: impl Into<String>) -> Self {
        Self::with_mode(name.into(), true)
    }

    pub fn optional(name: impl Into<String>) -> Self {
        Self::with_mode(name.into(), false)
    }

    fn with_mode(name: String, required: bool) -> Self {
        Self {
            name,
            required,
            array: false,
            default: None,
            description: String::new(),
            suggested_values: Vec::new(),
        }
    }

    /// Absorb every remaining positional token.
    pub fn array(mut self) -> Self {
        self.array = true;
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Static completion candidates.
    pub fn suggest<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suggested_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_array(&self) -> bool {
        self.array
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn get_description(&self) -> &str {
        &self.description
    }

    pub fn suggested_values(&self) -> &[String] {
        &self.suggested_values
    }

    /// Value bound when the command line supplies nothing.
    pub(crate) fn fallback(&self) -> Value {
        match (&self.default, self.array) {
            (Some(v), _) => v.clone(),
            (None, true) => Value::List(Vec::new()),
            (None, false) => Value::Null,
        }
    }

    fn validate(&self) -> Result<(), DefinitionError> {
        if self.name.trim().is_empty() {
            return Err(DefinitionError::EmptyName);
        }
        match &self.default {
            Some(_) if self.required => {
                Err(DefinitionError::RequiredWithDefault(self.name.clone()))
            }
            Some(v) if self.array && !matches!(v, Value::List(_)) => {
                Err(DefinitionError::ArrayDefaultNotList(self.name.clone()))
            }
            _ => Ok(()),
        }
    }
}

/// Whether an option takes a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueMode {
    #[default]
    None,
    Required,
    Optional,
}

/// A named option, `--name` with an optional single-character shortcut.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSpec {
    name: String,
    shortcut: Option<char>,
    value: ValueMode,
    array: bool,
    negatable: bool,
    default: Option<Value>,
    description: String,
    suggested_values: Vec<String>,
}

impl OptionSpec {
    fn with_mode(name: impl Into<String>, value: ValueMode, negatable: bool) -> Self {
        let name = name.into();
        let name = name.strip_prefix("--").map(str::to_string).unwrap_or(name);
        Self {
            name,
            shortcut: None,
            value,
            array: false,
            negatable,
            default: None,
            description: String::new(),
            suggested_values: Vec::new(),
        }
    }

    /// A boolean switch, `true` when present.
    pub fn flag(name: impl Into<String>) -> Self {
        Self::with_mode(name, ValueMode::None, false)
    }

    /// A boolean switch exposed as both `--name` and `--no-name`.
    pub fn negatable(name: impl Into<String>) -> Self {
        Self::with_mode(name, ValueMode::None, true)
    }

    pub fn value_required(name: impl Into<String>) -> Self {
        Self::with_mode(name, ValueMode::Required, false)
    }

    pub fn value_optional(name: impl Into<String>) -> Self {
        Self::with_mode(name, ValueMode::Optional, false)
    }

    pub fn short(mut self, shortcut: char) -> Self {
        self.shortcut = Some(shortcut);
        self
    }

    /// Collect every occurrence into a list.
    pub fn array(mut self) -> Self {
        self.array = true;
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn suggest<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suggested_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shortcut(&self) -> Option<char> {
        self.shortcut
    }

    pub fn value_mode(&self) -> ValueMode {
        self.value
    }

    pub fn accepts_value(&self) -> bool {
        self.value != ValueMode::None
    }

    pub fn is_value_required(&self) -> bool {
        self.value == ValueMode::Required
    }

    pub fn is_array(&self) -> bool {
        self.array
    }

    pub fn is_negatable(&self) -> bool {
        self.negatable
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn get_description(&self) -> &str {
        &self.description
    }

    pub fn suggested_values(&self) -> &[String] {
        &self.suggested_values
    }

    pub(crate) fn fallback(&self) -> Value {
        if let Some(v) = &self.default {
            return v.clone();
        }
        if !self.accepts_value() {
            Value::Bool(false)
        } else if self.array {
            Value::List(Vec::new())
        } else {
            Value::Null
        }
    }

    fn validate(&self) -> Result<(), DefinitionError> {
        if self.name.trim().is_empty() {
            return Err(DefinitionError::EmptyName);
        }
        if let Some(c) = self.shortcut {
            if c == '-' || c == '=' || c.is_whitespace() {
                return Err(DefinitionError::InvalidShortcut(c, self.name.clone()));
            }
        }
        if self.array && !self.accepts_value() {
            return Err(DefinitionError::ArrayWithoutValue(self.name.clone()));
        }
        if self.negatable && self.accepts_value() {
            return Err(DefinitionError::NegatableWithValue(self.name.clone()));
        }
        match &self.default {
            Some(Value::Bool(_)) | None if self.negatable => Ok(()),
            Some(_) if self.negatable => {
                Err(DefinitionError::NegatableDefaultNotBool(self.name.clone()))
            }
            Some(_) if !self.accepts_value() => {
                Err(DefinitionError::FlagWithDefault(self.name.clone()))
            }
            Some(v) if self.array && !matches!(v, Value::List(_)) => {
                Err(DefinitionError::ArrayDefaultNotList(self.name.clone()))
            }
            _ => Ok(()),
        }
    }
}

/// Ordered arguments plus options keyed by long name.
///
/// Read-only once built; binding and completion only borrow it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputDefinition {
    arguments: Vec<ArgumentSpec>,
    options: IndexMap<String, OptionSpec>,
    shortcuts: HashMap<char, String>,
    negations: HashMap<String, String>,
}

impl InputDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an argument.
    pub fn argument(mut self, spec: ArgumentSpec) -> Result<Self, DefinitionError> {
        self.add_argument(spec)?;
        Ok(self)
    }

    /// Add an option.
    pub fn option(mut self, spec: OptionSpec) -> Result<Self, DefinitionError> {
        self.add_option(spec)?;
        Ok(self)
    }

    /// Build from specs known to be valid, skipping validation.
    pub(crate) fn trusted(arguments: Vec<ArgumentSpec>, options: Vec<OptionSpec>) -> Self {
        let mut def = InputDefinition {
            arguments,
            ..InputDefinition::default()
        };
        for spec in options {
            if let Some(c) = spec.shortcut {
                def.shortcuts.insert(c, spec.name.clone());
            }
            if spec.negatable {
                def.negations.insert(format!("no-{}", spec.name), spec.name.clone());
            }
            def.options.insert(spec.name.clone(), spec);
        }
        def
    }

    pub fn add_argument(&mut self, spec: ArgumentSpec) -> Result<(), DefinitionError> {
        spec.validate()?;
        if self.arguments.iter().any(|a| a.name == spec.name) {
            return Err(DefinitionError::DuplicateArgument(spec.name));
        }
        if let Some(last) = self.arguments.last() {
            if last.array {
                return Err(DefinitionError::ArgumentAfterArray {
                    name: spec.name,
                    array: last.name.clone(),
                });
            }
            if spec.required && !last.required {
                return Err(DefinitionError::RequiredAfterOptional {
                    name: spec.name,
                    optional: last.name.clone(),
                });
            }
        }
        self.arguments.push(spec);
        Ok(())
    }

    pub fn add_option(&mut self, spec: OptionSpec) -> Result<(), DefinitionError> {
        spec.validate()?;
        if self.options.contains_key(&spec.name) {
            return Err(DefinitionError::DuplicateOption(spec.name));
        }
        if self.negations.contains_key(&spec.name) {
            return Err(DefinitionError::NegationConflict(spec.name));
        }
        let negation = format!("no-{}", spec.name);
        if spec.negatable && self.options.contains_key(&negation) {
            return Err(DefinitionError::NegationConflict(negation));
        }
        if let Some(c) = spec.shortcut {
            if let Some(existing) = self.shortcuts.get(&c) {
                return Err(DefinitionError::DuplicateShortcut {
                    shortcut: c,
                    existing: existing.clone(),
                });
            }
            self.shortcuts.insert(c, spec.name.clone());
        }
        if spec.negatable {
            self.negations.insert(negation, spec.name.clone());
        }
        self.options.insert(spec.name.clone(), spec);
        Ok(())
    }

    /// Combine with an application-level definition: its arguments come first,
    /// its options are added after this definition's own.
    pub fn merge(&self, app: &InputDefinition) -> Result<InputDefinition, DefinitionError> {
        let mut merged = InputDefinition::new();
        for arg in app.arguments.iter().chain(self.arguments.iter()) {
            merged.add_argument(arg.clone())?;
        }
        for opt in self.options.values().chain(app.options.values()) {
            merged.add_option(opt.clone())?;
        }
        Ok(merged)
    }

    pub fn arguments(&self) -> &[ArgumentSpec] {
        &self.arguments
    }

    pub fn argument_spec(&self, name: &str) -> Option<&ArgumentSpec> {
        self.arguments.iter().find(|a| a.name == name)
    }

    pub fn argument_at(&self, index: usize) -> Option<&ArgumentSpec> {
        self.arguments.get(index)
    }

    pub fn argument_count(&self) -> usize {
        self.arguments.len()
    }

    pub fn options(&self) -> impl Iterator<Item = &OptionSpec> {
        self.options.values()
    }

    pub fn option_spec(&self, name: &str) -> Option<&OptionSpec> {
        self.options.get(name)
    }

    pub fn option_for_shortcut(&self, shortcut: char) -> Option<&OptionSpec> {
        self.shortcuts
            .get(&shortcut)
            .and_then(|name| self.options.get(name))
    }

    /// Resolve `no-name` to the negatable option `name`.
    pub fn negated_option(&self, negation: &str) -> Option<&OptionSpec> {
        self.negations
            .get(negation)
            .and_then(|name| self.options.get(name))
    }

    /// One-line usage, e.g. `[-f|--force] [--] <name> [<files>...]`.
    pub fn synopsis(&self, short: bool) -> String {
        let mut elements: Vec<String> = Vec::new();

        if short && !self.options.is_empty() {
            elements.push("[options]".to_string());
        } else if !short {
            for opt in self.options.values() {
                let value = match opt.value {
                    ValueMode::None => String::new(),
                    ValueMode::Required => format!(" {}", opt.name.to_uppercase()),
                    ValueMode::Optional => format!(" [{}]", opt.name.to_uppercase()),
                };
                let shortcut = opt.shortcut.map(|c| format!("-{c}|")).unwrap_or_default();
                let negation = if opt.negatable {
                    format!("|--no-{}", opt.name)
                } else {
                    String::new()
                };
                elements.push(format!("[{shortcut}--{}{value}{negation}]", opt.name));
            }
        }

        if !elements.is_empty() && !self.arguments.is_empty() {
            elements.push("[--]".to_string());
        }
        if !self.arguments.is_empty() {
            elements.push(self.argument_synopsis());
        }
        elements.join(" ")
    }

    /// Argument part of the synopsis, e.g. `<name> [<files>...]`.
    pub fn argument_synopsis(&self) -> String {
        let mut elements: Vec<String> = Vec::new();
        let mut tail = String::new();
        for arg in &self.arguments {
            let mut element = format!("<{}>", arg.name);
            if arg.array {
                element.push_str("...");
            }
            if !arg.required {
                element = format!("[{element}");
                tail.push(']');
            }
            elements.push(element);
        }

        let mut out = elements.join(" ");
        out.push_str(&tail);
        out
    }
}
