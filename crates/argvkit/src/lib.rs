//! Argv parsing and shell-completion engine for console applications.
//!
//! The pieces, leaf first:
//! - [`InputDefinition`] declares the arguments and options of one command.
//! - [`tokenize`] splits a raw command line into tokens.
//! - [`bind`] folds tokens into a [`ParsedInput`], failing with a [`ParseError`].
//! - [`classify`] / [`CompletionInput`] decide what the cursor is completing.
//! - [`SuggestionSink`] collects candidates, rendered per [`Shell`].
//! - [`Application`] registers [`Command`]s and dispatches or completes argv.
//!
//! # Example
//!
//! ```rust
//! use argvkit::{ArgumentSpec, InputDefinition, OptionSpec, bind};
//!
//! let definition = InputDefinition::new()
//!     .argument(ArgumentSpec::required("name"))?
//!     .option(OptionSpec::value_required("level").short('l'))?;
//!
//! let input = bind(&["alice", "-l5"], &definition)?;
//! assert_eq!(input.string_argument("name"), Some("alice"));
//! assert_eq!(input.string_option("level"), Some("5"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod application;
mod binder;
mod completion;
mod definition;
mod error;
pub mod help;
mod input;
pub mod raw;
mod suggestions;
mod tokenizer;

pub use application::{Application, Command, CompletionHook, Handler, Verbosity};
pub use binder::{bind, bind_tolerant};
pub use completion::{CompletionInput, CompletionState, CompletionType, classify};
pub use definition::{ArgumentSpec, InputDefinition, OptionSpec, ValueMode};
pub use error::{CommandError, CompletionError, DefinitionError, ParseError, UnknownShell};
pub use input::{ParsedInput, Value};
pub use suggestions::{Shell, Suggestion, SuggestionSink};
pub use tokenizer::{TokenizedLine, tokenize, tokenize_prefix};
