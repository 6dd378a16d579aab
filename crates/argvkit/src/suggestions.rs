//! Completion candidates and their rendering for a calling shell.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::definition::OptionSpec;
use crate::error::UnknownShell;

/// A candidate value, optionally described.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl Suggestion {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            description: None,
        }
    }

    pub fn with_description(value: impl Into<String>, description: impl Into<String>) -> Self {
        let description = description.into();
        Self {
            value: value.into(),
            description: (!description.is_empty()).then_some(description),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl From<&str> for Suggestion {
    fn from(value: &str) -> Self {
        Suggestion::new(value)
    }
}

impl From<String> for Suggestion {
    fn from(value: String) -> Self {
        Suggestion::new(value)
    }
}

impl From<&String> for Suggestion {
    fn from(value: &String) -> Self {
        Suggestion::new(value.as_str())
    }
}

/// Values and options collected for one completion request, in insertion order.
///
/// Duplicates are kept.
#[derive(Debug, Clone, Default)]
pub struct SuggestionSink {
    values: Vec<Suggestion>,
    options: Vec<OptionSpec>,
}

impl SuggestionSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn suggest_value(&mut self, value: impl Into<Suggestion>) -> &mut Self {
        self.values.push(value.into());
        self
    }

    pub fn suggest_values<I, V>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Suggestion>,
    {
        self.values.extend(values.into_iter().map(Into::into));
        self
    }

    pub fn suggest_option(&mut self, option: OptionSpec) -> &mut Self {
        self.options.push(option);
        self
    }

    pub fn suggest_options<I>(&mut self, options: I) -> &mut Self
    where
        I: IntoIterator<Item = OptionSpec>,
    {
        self.options.extend(options);
        self
    }

    pub fn values(&self) -> &[Suggestion] {
        &self.values
    }

    pub fn options(&self) -> &[OptionSpec] {
        &self.options
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.options.is_empty()
    }
}

/// Output dialect of a completion script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shell {
    #[default]
    Bash,
    Zsh,
    Fish,
}

impl Shell {
    /// One candidate per line.
    ///
    /// Bash gets bare words, values first. Zsh and fish get `word<TAB>description`,
    /// options first.
    pub fn render(self, sink: &SuggestionSink) -> String {
        let mut lines: Vec<String> = Vec::new();
        match self {
            Shell::Bash => {
                lines.extend(sink.values().iter().map(|s| s.value().to_string()));
                for opt in sink.options() {
                    lines.push(format!("--{}", opt.name()));
                    if opt.is_negatable() {
                        lines.push(format!("--no-{}", opt.name()));
                    }
                }
            }
            Shell::Zsh | Shell::Fish => {
                for opt in sink.options() {
                    lines.push(described(&format!("--{}", opt.name()), opt.get_description()));
                    if opt.is_negatable() {
                        lines.push(described(
                            &format!("--no-{}", opt.name()),
                            opt.get_description(),
                        ));
                    }
                }
                for value in sink.values() {
                    lines.push(described(value.value(), value.description().unwrap_or("")));
                }
            }
        }

        if lines.is_empty() {
            return String::new();
        }
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

fn described(word: &str, description: &str) -> String {
    if description.is_empty() {
        word.to_string()
    } else {
        format!("{word}\t{description}")
    }
}

impl FromStr for Shell {
    type Err = UnknownShell;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bash" => Ok(Shell::Bash),
            "zsh" => Ok(Shell::Zsh),
            "fish" => Ok(Shell::Fish),
            _ => Err(UnknownShell(s.to_string())),
        }
    }
}

impl fmt::Display for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Shell::Bash => "bash",
            Shell::Zsh => "zsh",
            Shell::Fish => "fish",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sink() -> SuggestionSink {
        let mut sink = SuggestionSink::new();
        sink.suggest_value("prod")
            .suggest_value(Suggestion::with_description("staging", "pre-release"))
            .suggest_option(OptionSpec::negatable("ansi").description("Force ANSI output"))
            .suggest_option(OptionSpec::flag("quiet"));
        sink
    }

    #[test]
    fn bash_renders_bare_words() {
        assert_eq!(
            Shell::Bash.render(&sink()),
            "prod\nstaging\n--ansi\n--no-ansi\n--quiet\n"
        );
    }

    #[test]
    fn zsh_renders_descriptions_options_first() {
        assert_eq!(
            Shell::Zsh.render(&sink()),
            "--ansi\tForce ANSI output\n--no-ansi\tForce ANSI output\n--quiet\nprod\nstaging\tpre-release\n"
        );
    }

    #[test]
    fn empty_sink_renders_nothing() {
        let sink = SuggestionSink::new();
        assert!(sink.is_empty());
        assert_eq!(Shell::Fish.render(&sink), "");
    }

    #[test]
    fn insertion_order_and_duplicates_are_kept() {
        let mut sink = SuggestionSink::new();
        sink.suggest_values(["b", "a", "b"]);
        let values: Vec<&str> = sink.values().iter().map(Suggestion::value).collect();
        assert_eq!(values, vec!["b", "a", "b"]);
    }

    #[test]
    fn shell_parses_case_insensitively() {
        assert_eq!("ZSH".parse::<Shell>(), Ok(Shell::Zsh));
        assert_eq!("fish".parse::<Shell>().map(|s| s.to_string()).as_deref(), Ok("fish"));
        assert_eq!("tcsh".parse::<Shell>(), Err(UnknownShell("tcsh".to_string())));
    }
}
