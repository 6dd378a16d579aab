use thiserror::Error;

/// A failure while binding tokens against an [`InputDefinition`](crate::InputDefinition).
///
/// Binding stops at the first failure; there is no partial result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// `option` is rendered as typed: `--name` or `-n`.
    #[error("the \"{option}\" option does not exist")]
    UnknownOption { option: String },

    #[error("the \"--{option}\" option does not accept a value")]
    UnexpectedValue { option: String },

    #[error("the \"--{option}\" option requires a value")]
    MissingValue { option: String },

    #[error("{}", too_many_arguments(.token, .expected))]
    TooManyArguments { token: String, expected: Vec<String> },

    #[error("not enough arguments (missing: {})", quoted(.names))]
    MissingArgument { names: Vec<String> },
}

fn too_many_arguments(token: &str, expected: &[String]) -> String {
    if expected.is_empty() {
        format!("no arguments expected, got \"{token}\"")
    } else {
        format!(
            "too many arguments, expected arguments {} (got \"{token}\")",
            quoted(expected)
        )
    }
}

fn quoted(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("\"{n}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

/// An invalid argument or option declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("an argument or option name cannot be empty")]
    EmptyName,

    #[error("invalid shortcut '{0}' for option \"{1}\"")]
    InvalidShortcut(char, String),

    #[error("an argument with name \"{0}\" already exists")]
    DuplicateArgument(String),

    #[error("an option named \"{0}\" already exists")]
    DuplicateOption(String),

    #[error("an option with shortcut \"{shortcut}\" already exists (\"{existing}\")")]
    DuplicateShortcut { shortcut: char, existing: String },

    #[error("cannot add argument \"{name}\" after the array argument \"{array}\"")]
    ArgumentAfterArray { name: String, array: String },

    #[error("cannot add a required argument \"{name}\" after the optional argument \"{optional}\"")]
    RequiredAfterOptional { name: String, optional: String },

    #[error("cannot set a default value on the required argument \"{0}\"")]
    RequiredWithDefault(String),

    #[error("a default value for the array input \"{0}\" must be a list")]
    ArrayDefaultNotList(String),

    #[error("the array option \"{0}\" must accept a value")]
    ArrayWithoutValue(String),

    #[error("the negatable option \"{0}\" cannot accept a value")]
    NegatableWithValue(String),

    #[error("cannot set a default value on the flag \"{0}\"")]
    FlagWithDefault(String),

    #[error("the default value of the negatable option \"{0}\" must be a boolean")]
    NegatableDefaultNotBool(String),

    #[error("the option \"{0}\" conflicts with the negation of a negatable option")]
    NegationConflict(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    /// The cursor may sit on a token or one past the last token, never further.
    #[error("invalid cursor {cursor}: it must be at most the number of tokens ({len})")]
    InvalidCursor { cursor: usize, len: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported shell \"{0}\" (expected bash, zsh or fish)")]
pub struct UnknownShell(pub String);

/// Errors surfaced by the command registry and by command handlers.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("command \"{name}\" is not defined{}", did_you_mean(.alternatives))]
    NotFound {
        name: String,
        alternatives: Vec<String>,
    },

    #[error("command \"{name}\" is ambiguous ({})", .candidates.join(", "))]
    Ambiguous {
        name: String,
        candidates: Vec<String>,
    },

    #[error("invalid command name \"{0}\"")]
    InvalidName(String),

    #[error("a command or alias named \"{0}\" is already registered")]
    Duplicate(String),

    #[error(transparent)]
    Definition(#[from] DefinitionError),

    #[error("{0}")]
    Failed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn did_you_mean(alternatives: &[String]) -> String {
    match alternatives.len() {
        0 => String::new(),
        1 => format!("; did you mean \"{}\"?", alternatives[0]),
        _ => format!("; did you mean one of {}?", quoted(alternatives)),
    }
}

impl From<String> for CommandError {
    fn from(msg: String) -> Self {
        CommandError::Failed(msg)
    }
}

impl From<&str> for CommandError {
    fn from(msg: &str) -> Self {
        CommandError::Failed(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_many_arguments_message_depends_on_declared_arguments() {
        let none = ParseError::TooManyArguments {
            token: "x".to_string(),
            expected: vec![],
        };
        assert_eq!(none.to_string(), "no arguments expected, got \"x\"");

        let some = ParseError::TooManyArguments {
            token: "x".to_string(),
            expected: vec!["a".to_string(), "b".to_string()],
        };
        assert!(some.to_string().contains("\"a\", \"b\""));
    }

    #[test]
    fn not_found_suggests_alternatives() {
        let err = CommandError::NotFound {
            name: "lst".to_string(),
            alternatives: vec!["list".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "command \"lst\" is not defined; did you mean \"list\"?"
        );
    }
}
