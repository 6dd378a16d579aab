use anyhow::{Context, Result};
use argvkit::{Application, Command, CommandError, ParsedInput, Value};
use argvkit_manifest::AppManifest;
use indexmap::IndexMap;
use serde::Serialize;
use std::io::Write;

/// What a manifest-declared command prints when run.
#[derive(Debug, Serialize)]
struct Invocation<'a> {
    command: &'a str,
    arguments: &'a IndexMap<String, Value>,
    options: &'a IndexMap<String, Value>,
}

/// Build an application whose commands echo their bound input as JSON.
pub fn build_application(manifest: &AppManifest, env_verbosity: Option<String>) -> Result<Application> {
    let mut app = Application::new(&manifest.name, &manifest.version).env_verbosity(env_verbosity);

    for (schema, definition) in manifest.definitions()? {
        let name = schema.name.clone();
        let mut command = Command::new(&schema.name, definition, move |input, out| {
            echo(&name, input, out)
        })
        .description(&schema.description);
        for alias in &schema.aliases {
            command = command.alias(alias);
        }
        if schema.hidden {
            command = command.hidden();
        }
        app.register(command)
            .with_context(|| format!("failed to register command \"{}\"", schema.name))?;
    }

    Ok(app)
}

fn echo(command: &str, input: &ParsedInput, out: &mut dyn Write) -> Result<i32, CommandError> {
    let invocation = Invocation {
        command,
        arguments: input.arguments(),
        options: input.options(),
    };
    let json = serde_json::to_string_pretty(&invocation)
        .map_err(|e| CommandError::Failed(format!("failed to encode input: {e}")))?;
    writeln!(out, "{json}")?;
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(app: &Application, argv: &[&str]) -> (i32, serde_json::Value, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let code = app.run(argv, &mut out, &mut err);
        let json = if out.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&out).unwrap()
        };
        (code, json, String::from_utf8(err).unwrap())
    }

    #[test]
    fn commands_echo_bound_input() {
        let app = build_application(&AppManifest::example("demo"), None).unwrap();
        let (code, json, err) = run(&app, &["d", "production", "api", "-t", "v1", "--no-cache"]);
        assert_eq!(code, 0, "stderr: {err}");
        assert_eq!(json["command"], "deploy");
        assert_eq!(json["arguments"]["target"], "production");
        assert_eq!(json["arguments"]["services"], serde_json::json!(["api"]));
        assert_eq!(json["options"]["tag"], serde_json::json!(["v1"]));
        assert_eq!(json["options"]["cache"], false);
        assert_eq!(json["options"]["env"], "dev");
    }

    #[test]
    fn duplicate_aliases_are_rejected() {
        let mut manifest = AppManifest::example("demo");
        manifest.commands[1].aliases.push("d".to_string());
        let err = build_application(&manifest, None).unwrap_err();
        assert!(format!("{err:#}").contains("already registered"), "{err:#}");
    }
}
