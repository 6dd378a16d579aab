//! Plain-text help for commands and the application.

use crate::application::{Application, Command};
use crate::definition::{ArgumentSpec, InputDefinition, OptionSpec, ValueMode};
use crate::input::Value;

/// `Usage: app name [options] [--] <args>`.
pub fn usage_line(command: &Command, app_name: &str) -> String {
    format!("Usage: {}", usage(command, app_name))
}

fn usage(command: &Command, app_name: &str) -> String {
    let mut out = format!("{app_name} {}", command.name());
    let has_options = command.input_definition().options().next().is_some();
    let arguments = command.definition().argument_synopsis();
    if has_options {
        out.push_str(" [options]");
    }
    if !arguments.is_empty() {
        if has_options {
            out.push_str(" [--]");
        }
        out.push(' ');
        out.push_str(&arguments);
    }
    out
}

/// Render the help of one command.
///
/// Arguments are the command's own; options include the application's.
pub fn command_help(command: &Command, app_name: &str) -> String {
    let mut out = String::new();
    if command.get_description().trim().is_empty() {
        out.push_str(command.name());
        out.push('\n');
    } else {
        out.push_str(&format!(
            "{} - {}\n",
            command.name(),
            command.get_description().trim()
        ));
    }

    out.push_str(&format!("\n{}\n", usage_line(command, app_name)));
    if !command.aliases().is_empty() {
        out.push_str(&format!("Aliases: {}\n", command.aliases().join(", ")));
    }

    let arguments: Vec<(String, String)> = command
        .definition()
        .arguments()
        .iter()
        .map(|a| (format!("<{}>", a.name()), argument_help(a)))
        .collect();
    push_section(&mut out, "Arguments", &arguments);

    push_section(&mut out, "Options", &option_rows(command.input_definition()));
    out
}

/// Render the application overview: version, global options, visible commands.
pub fn application_help(app: &Application) -> String {
    let mut out = format!("{}\n", app.long_version());
    out.push_str(&format!(
        "\nUsage: {} <command> [options] [arguments]\n",
        app.name()
    ));

    push_section(&mut out, "Options", &option_rows(app.definition()));

    let commands: Vec<(String, String)> = app
        .visible_commands()
        .into_iter()
        .map(|c| {
            let mut help = c.get_description().trim().to_string();
            if !c.aliases().is_empty() {
                append(&mut help, &format!("[aliases: {}]", c.aliases().join(", ")));
            }
            (c.name().to_string(), help)
        })
        .collect();
    push_section(&mut out, "Commands", &commands);
    out
}

fn option_rows(definition: &InputDefinition) -> Vec<(String, String)> {
    let any_shortcut = definition.options().any(|o| o.shortcut().is_some());
    definition
        .options()
        .map(|o| (option_left(o, any_shortcut), option_help(o)))
        .collect()
}

fn option_left(opt: &OptionSpec, pad_shortcut: bool) -> String {
    let mut out = match opt.shortcut() {
        Some(c) => format!("-{c}, "),
        None if pad_shortcut => "    ".to_string(),
        None => String::new(),
    };
    if opt.is_negatable() {
        out.push_str(&format!("--[no-]{}", opt.name()));
    } else {
        out.push_str(&format!("--{}", opt.name()));
    }
    let value = opt.name().to_ascii_uppercase();
    match opt.value_mode() {
        ValueMode::None => {}
        ValueMode::Required => out.push_str(&format!("={value}")),
        ValueMode::Optional => out.push_str(&format!("[={value}]")),
    }
    out
}

fn option_help(opt: &OptionSpec) -> String {
    let mut out = opt.get_description().trim().to_string();
    if opt.accepts_value() {
        if let Some(default) = opt.default_value().and_then(format_default) {
            append(&mut out, &format!("[default: {default}]"));
        }
    }
    if opt.is_array() {
        append(&mut out, "(multiple values allowed)");
    }
    out
}

fn argument_help(arg: &ArgumentSpec) -> String {
    let mut out = arg.get_description().trim().to_string();
    if let Some(default) = arg.default_value().and_then(format_default) {
        append(&mut out, &format!("[default: {default}]"));
    }
    out
}

/// JSON rendering of a default; `None` for null and empty lists.
fn format_default(value: &Value) -> Option<String> {
    if value.is_null() || value.as_list().is_some_and(<[String]>::is_empty) {
        return None;
    }
    serde_json::to_string(value).ok()
}

fn append(out: &mut String, text: &str) {
    if !out.is_empty() {
        out.push(' ');
    }
    out.push_str(text);
}

fn push_section(out: &mut String, title: &str, rows: &[(String, String)]) {
    if rows.is_empty() {
        return;
    }
    out.push_str(&format!("\n{title}:\n"));
    let width = rows.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
    for (left, help) in rows {
        if help.is_empty() {
            out.push_str(&format!("  {left}\n"));
        } else {
            out.push_str(&format!("  {left:width$}  {help}\n"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deploy() -> Command {
        let definition = InputDefinition::new()
            .argument(ArgumentSpec::required("target").description("Where to deploy"))
            .and_then(|d| d.argument(ArgumentSpec::optional("region").default("eu")))
            .and_then(|d| {
                d.option(
                    OptionSpec::value_required("env")
                        .short('e')
                        .description("Environment")
                        .default("prod"),
                )
            })
            .and_then(|d| d.option(OptionSpec::value_optional("format")))
            .and_then(|d| d.option(OptionSpec::value_required("tag").array()))
            .unwrap();
        Command::new("deploy", definition, |_, _| Ok(0))
            .description("Deploy a release")
            .alias("d")
    }

    #[test]
    fn command_help_lists_arguments_and_options() {
        let mut app = Application::new("shipit", "1.0.0");
        app.register(deploy()).unwrap();
        let Ok(command) = app.find("deploy") else {
            panic!("deploy is registered");
        };
        let help = command_help(command, app.name());

        assert!(help.starts_with("deploy - Deploy a release\n"));
        assert!(help.contains(
            "Usage: shipit deploy [options] [--] <target> [<region>]\n"
        ));
        assert!(help.contains("Aliases: d\n"));
        assert!(help.contains("  <target>  Where to deploy\n"));
        assert!(help.contains("  <region>  [default: \"eu\"]\n"));
        assert!(help.contains("-e, --env=ENV"));
        assert!(help.contains("Environment [default: \"prod\"]"));
        assert!(help.contains("    --format[=FORMAT]"));
        assert!(help.contains("(multiple values allowed)"));
        assert!(help.contains("--[no-]ansi"));
        assert!(!help.contains("<command>"));
    }

    #[test]
    fn options_are_aligned() {
        let definition = InputDefinition::new()
            .option(OptionSpec::flag("all").short('a').description("Everything"))
            .and_then(|d| d.option(OptionSpec::value_required("level").description("How much")))
            .unwrap();
        let rows = option_rows(&definition);
        let mut out = String::new();
        push_section(&mut out, "Options", &rows);
        assert_eq!(
            out,
            "\nOptions:\n  -a, --all          Everything\n      --level=LEVEL  How much\n"
        );
    }

    #[test]
    fn null_and_empty_defaults_are_not_shown() {
        assert_eq!(format_default(&Value::Null), None);
        assert_eq!(format_default(&Value::List(Vec::new())), None);
        assert_eq!(
            format_default(&Value::List(vec!["a".to_string()])).as_deref(),
            Some("[\"a\"]")
        );
        assert_eq!(format_default(&Value::Bool(true)).as_deref(), Some("true"));
    }

    #[test]
    fn application_help_lists_visible_commands() {
        let mut app = Application::new("shipit", "1.0.0");
        app.register(deploy()).unwrap();
        app.register(Command::new("internal", InputDefinition::new(), |_, _| Ok(0)).hidden())
            .unwrap();

        let help = application_help(&app);
        assert!(help.starts_with("shipit 1.0.0\n"));
        assert!(help.contains("Usage: shipit <command> [options] [arguments]"));
        assert!(help.contains("  deploy  Deploy a release [aliases: d]\n"));
        assert!(!help.contains("internal"));
        assert!(help.contains("-V, --version"));
    }
}
