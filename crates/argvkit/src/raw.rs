//! Scans of raw tokens that run before a full bind.
//!
//! The command name and global switches must be known before the command's
//! own definition can be picked, so these helpers read tokens directly.

use crate::definition::{InputDefinition, OptionSpec};

/// The first positional token, skipping options and the values they consume.
///
/// A `--` terminator makes the following token the answer.
pub fn first_argument<'a, S: AsRef<str>>(
    tokens: &'a [S],
    definition: &InputDefinition,
) -> Option<&'a str> {
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_ref();
        if token == "--" {
            return tokens.get(i + 1).map(|t| t.as_ref());
        }
        if token.starts_with('-') && token != "-" {
            let next_is_value = tokens
                .get(i + 1)
                .map(|t| t.as_ref())
                .is_some_and(|next| next.is_empty() || !next.starts_with('-'));
            let takes_next = resolve_option_token(token, definition)
                .is_some_and(|(opt, attached)| opt.accepts_value() && attached.is_none());
            i += if takes_next && next_is_value { 2 } else { 1 };
            continue;
        }
        return Some(token);
    }
    None
}

/// Whether any of `names` (`--long` or `-s`) appears in `tokens`.
///
/// Long names also match their `--name=value` form. With `only_params`,
/// scanning stops at `--`.
pub fn has_parameter_option<S: AsRef<str>>(tokens: &[S], names: &[&str], only_params: bool) -> bool {
    for token in tokens {
        let token = token.as_ref();
        if only_params && token == "--" {
            return false;
        }
        for name in names {
            if token == *name {
                return true;
            }
            if name.starts_with("--") && token.starts_with(&format!("{name}=")) {
                return true;
            }
        }
    }
    false
}

/// The value given to any of `names`, as `--name=value`, `--name value` or `-n value`.
pub fn parameter_option<'a, S: AsRef<str>>(
    tokens: &'a [S],
    names: &[&str],
    only_params: bool,
) -> Option<&'a str> {
    for (i, token) in tokens.iter().enumerate() {
        let token = token.as_ref();
        if only_params && token == "--" {
            return None;
        }
        for name in names {
            if token == *name {
                return tokens.get(i + 1).map(|t| t.as_ref());
            }
            if name.starts_with("--") {
                if let Some(value) = token.strip_prefix(&format!("{name}=")) {
                    return Some(value);
                }
            } else if let Some(value) = token.strip_prefix(name) {
                // `-lvalue`
                if !value.is_empty() && !name.is_empty() {
                    return Some(value);
                }
            }
        }
    }
    None
}

/// Resolve an option-like token to its spec and the value attached to it.
///
/// Long tokens split on `=` and also resolve negations (`--no-x` -> `x`). A
/// short cluster resolves to its first value-accepting shortcut, whose value
/// is the rest of the cluster (`-ve5` -> `e`, `5`), else to its last flag. An
/// unknown name or shortcut yields `None`.
pub(crate) fn resolve_option_token<'t, 'd>(
    token: &'t str,
    definition: &'d InputDefinition,
) -> Option<(&'d OptionSpec, Option<&'t str>)> {
    if let Some(long) = token.strip_prefix("--") {
        let (name, value) = match long.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (long, None),
        };
        if name.is_empty() {
            return None;
        }
        let opt = definition
            .option_spec(name)
            .or_else(|| definition.negated_option(name))?;
        return Some((opt, value));
    }

    let cluster = token.strip_prefix('-')?;
    let mut found = None;
    for (i, c) in cluster.char_indices() {
        let opt = definition.option_for_shortcut(c)?;
        if opt.accepts_value() {
            let rest = &cluster[i + c.len_utf8()..];
            return Some((opt, (!rest.is_empty()).then_some(rest)));
        }
        found = Some((opt, None));
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{ArgumentSpec, OptionSpec};

    fn definition() -> InputDefinition {
        InputDefinition::new()
            .argument(ArgumentSpec::required("command"))
            .and_then(|d| d.option(OptionSpec::value_required("env").short('e')))
            .and_then(|d| d.option(OptionSpec::flag("verbose").short('v')))
            .unwrap()
    }

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn first_argument_skips_options_and_their_values() {
        let def = definition();
        assert_eq!(first_argument(&argv(&["-v", "deploy"]), &def), Some("deploy"));
        assert_eq!(
            first_argument(&argv(&["--env", "prod", "deploy"]), &def),
            Some("deploy")
        );
        assert_eq!(
            first_argument(&argv(&["--env=prod", "deploy"]), &def),
            Some("deploy")
        );
        assert_eq!(first_argument(&argv(&["-eprod", "deploy"]), &def), Some("deploy"));
        assert_eq!(first_argument(&argv(&["--", "-x"]), &def), Some("-x"));
        assert_eq!(first_argument(&argv(&["-v"]), &def), None);
    }

    #[test]
    fn has_parameter_option_matches_long_value_form() {
        let tokens = argv(&["deploy", "--env=prod", "--", "-q"]);
        assert!(has_parameter_option(&tokens, &["--env"], true));
        assert!(!has_parameter_option(&tokens, &["--quiet", "-q"], true));
        assert!(has_parameter_option(&tokens, &["--quiet", "-q"], false));
    }

    #[test]
    fn parameter_option_reads_all_forms() {
        assert_eq!(
            parameter_option(&argv(&["--env=prod"]), &["--env", "-e"], false),
            Some("prod")
        );
        assert_eq!(
            parameter_option(&argv(&["--env", "prod"]), &["--env", "-e"], false),
            Some("prod")
        );
        assert_eq!(
            parameter_option(&argv(&["-eprod"]), &["--env", "-e"], false),
            Some("prod")
        );
        assert_eq!(
            parameter_option(&argv(&["--", "--env=prod"]), &["--env"], true),
            None
        );
    }

    #[test]
    fn resolve_option_token_resolves_clusters_and_negations() {
        let def = definition()
            .option(OptionSpec::negatable("ansi"))
            .unwrap();
        let resolve = |token: &'static str| {
            resolve_option_token(token, &def).map(|(opt, value)| (opt.name().to_string(), value))
        };
        assert_eq!(resolve("-ve5"), Some(("env".to_string(), Some("5"))));
        assert_eq!(resolve("-ve"), Some(("env".to_string(), None)));
        assert_eq!(resolve("-vv"), Some(("verbose".to_string(), None)));
        assert_eq!(resolve("-xe"), None);
        assert_eq!(resolve("--no-ansi"), Some(("ansi".to_string(), None)));
        assert_eq!(resolve("--env=x"), Some(("env".to_string(), Some("x"))));
        assert_eq!(resolve("--env="), Some(("env".to_string(), Some(""))));
        assert_eq!(resolve("--"), None);
    }
}
