//! JSON manifest model declaring the commands of an argvkit application.
//!
//! The manifest is plain data; [`CommandSchema::to_definition`] turns one
//! command into a validated [`InputDefinition`].

use argvkit::{ArgumentSpec, DefinitionError, InputDefinition, OptionSpec, Value};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to parse manifest JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported schema-version {0} (expected {SCHEMA_VERSION})")]
    UnsupportedSchema(u32),

    #[error("command \"{command}\": {source}")]
    Definition {
        command: String,
        #[source]
        source: DefinitionError,
    },
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AppManifest {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<CommandSchema>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CommandSchema {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<ArgumentSchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionSchema>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ArgumentSchema {
    pub name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub array: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Static completion candidates.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

/// Whether an option takes a value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValueKind {
    #[default]
    None,
    Required,
    Optional,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OptionSchema {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortcut: Option<char>,
    #[serde(default)]
    pub value: ValueKind,
    #[serde(default)]
    pub array: bool,
    #[serde(default)]
    pub negatable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl AppManifest {
    /// Parse and check the schema version. Command definitions are not
    /// validated here; see [`AppManifest::definitions`].
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        let manifest: AppManifest = serde_json::from_str(json)?;
        if manifest.schema_version != SCHEMA_VERSION {
            return Err(ManifestError::UnsupportedSchema(manifest.schema_version));
        }
        Ok(manifest)
    }

    pub fn to_json_pretty(&self) -> Result<String, ManifestError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Every command paired with its definition, failing on the first invalid one.
    pub fn definitions(&self) -> Result<Vec<(&CommandSchema, InputDefinition)>, ManifestError> {
        self.commands
            .iter()
            .map(|c| {
                c.to_definition()
                    .map(|d| (c, d))
                    .map_err(|source| ManifestError::Definition {
                        command: c.name.clone(),
                        source,
                    })
            })
            .collect()
    }

    /// A small manifest written by `init`.
    pub fn example(name: impl Into<String>) -> Self {
        let deploy = CommandSchema {
            name: "deploy".to_string(),
            description: "Deploy a release to a target".to_string(),
            aliases: vec!["d".to_string()],
            arguments: vec![
                ArgumentSchema {
                    name: "target".to_string(),
                    required: true,
                    description: "Where to deploy".to_string(),
                    suggestions: vec!["production".to_string(), "staging".to_string()],
                    ..Default::default()
                },
                ArgumentSchema {
                    name: "services".to_string(),
                    array: true,
                    description: "Services to deploy (all when omitted)".to_string(),
                    ..Default::default()
                },
            ],
            options: vec![
                OptionSchema {
                    name: "env".to_string(),
                    shortcut: Some('e'),
                    value: ValueKind::Required,
                    default: Some(Value::from("dev")),
                    description: "Environment name".to_string(),
                    suggestions: vec!["dev".to_string(), "prod".to_string()],
                    ..Default::default()
                },
                OptionSchema {
                    name: "tag".to_string(),
                    shortcut: Some('t'),
                    value: ValueKind::Required,
                    array: true,
                    description: "Tag the release".to_string(),
                    ..Default::default()
                },
                OptionSchema {
                    name: "force".to_string(),
                    shortcut: Some('f'),
                    description: "Skip confirmation".to_string(),
                    ..Default::default()
                },
                OptionSchema {
                    name: "cache".to_string(),
                    negatable: true,
                    default: Some(Value::Bool(true)),
                    description: "Reuse build cache".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        let clear = CommandSchema {
            name: "cache:clear".to_string(),
            description: "Clear the build cache".to_string(),
            options: vec![OptionSchema {
                name: "format".to_string(),
                value: ValueKind::Optional,
                default: Some(Value::from("text")),
                description: "Report format".to_string(),
                suggestions: vec!["text".to_string(), "json".to_string()],
                ..Default::default()
            }],
            ..Default::default()
        };

        Self {
            schema_version: SCHEMA_VERSION,
            name: name.into(),
            version: "0.1.0".to_string(),
            commands: vec![deploy, clear],
        }
    }
}

impl CommandSchema {
    pub fn to_definition(&self) -> Result<InputDefinition, DefinitionError> {
        let mut definition = InputDefinition::new();
        for arg in &self.arguments {
            definition.add_argument(arg.to_spec())?;
        }
        for opt in &self.options {
            definition.add_option(opt.to_spec()?)?;
        }
        Ok(definition)
    }
}

impl ArgumentSchema {
    pub fn to_spec(&self) -> ArgumentSpec {
        let mut spec = if self.required {
            ArgumentSpec::required(self.name.as_str())
        } else {
            ArgumentSpec::optional(self.name.as_str())
        };
        if self.array {
            spec = spec.array();
        }
        if let Some(default) = &self.default {
            spec = spec.default(default.clone());
        }
        spec.description(self.description.as_str())
            .suggest(self.suggestions.iter().cloned())
    }
}

impl OptionSchema {
    pub fn to_spec(&self) -> Result<OptionSpec, DefinitionError> {
        let mut spec = match (self.value, self.negatable) {
            (ValueKind::None, true) => OptionSpec::negatable(self.name.as_str()),
            (_, true) => return Err(DefinitionError::NegatableWithValue(self.name.clone())),
            (ValueKind::None, false) => OptionSpec::flag(self.name.as_str()),
            (ValueKind::Required, false) => OptionSpec::value_required(self.name.as_str()),
            (ValueKind::Optional, false) => OptionSpec::value_optional(self.name.as_str()),
        };
        if let Some(c) = self.shortcut {
            spec = spec.short(c);
        }
        if self.array {
            spec = spec.array();
        }
        if let Some(default) = &self.default {
            spec = spec.default(default.clone());
        }
        Ok(spec
            .description(self.description.as_str())
            .suggest(self.suggestions.iter().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argvkit::ValueMode;

    #[test]
    fn manifest_deserializes_kebab_case() {
        let json = r#"{
  "schema-version": 1,
  "name": "shipit",
  "commands": [
    {
      "name": "deploy",
      "arguments": [{ "name": "target", "required": true }],
      "options": [
        { "name": "env", "shortcut": "e", "value": "required", "default": "dev" },
        { "name": "dry-run", "negatable": true }
      ]
    }
  ]
}"#;
        let m = AppManifest::from_json(json).unwrap();
        assert_eq!(m.name, "shipit");
        assert!(m.version.is_empty());
        let deploy = &m.commands[0];
        assert_eq!(deploy.options[0].shortcut, Some('e'));
        assert_eq!(deploy.options[0].value, ValueKind::Required);
        assert_eq!(deploy.options[0].default, Some(Value::from("dev")));

        let def = deploy.to_definition().unwrap();
        let Some(env) = def.option_for_shortcut('e') else {
            panic!("shortcut e is declared");
        };
        assert_eq!(env.value_mode(), ValueMode::Required);
        assert!(def.negated_option("no-dry-run").is_some());
    }

    #[test]
    fn schema_version_defaults_and_is_checked() {
        let m = AppManifest::from_json(r#"{ "name": "x" }"#).unwrap();
        assert_eq!(m.schema_version, SCHEMA_VERSION);

        let err = AppManifest::from_json(r#"{ "schema-version": 2, "name": "x" }"#).unwrap_err();
        assert!(matches!(err, ManifestError::UnsupportedSchema(2)));
    }

    #[test]
    fn invalid_definitions_are_reported_per_command() {
        let mut m = AppManifest::example("demo");
        m.commands[1].options.push(OptionSchema {
            name: "loud".to_string(),
            value: ValueKind::Required,
            negatable: true,
            ..Default::default()
        });
        let Err(ManifestError::Definition { command, source }) = m.definitions() else {
            panic!("expected a definition error");
        };
        assert_eq!(command, "cache:clear");
        assert_eq!(source, DefinitionError::NegatableWithValue("loud".to_string()));
    }

    #[test]
    fn example_round_trips_and_is_valid() {
        let m = AppManifest::example("demo");
        let json = m.to_json_pretty().unwrap();
        assert!(json.contains("\"schema-version\": 1"));
        let back = AppManifest::from_json(&json).unwrap();
        assert_eq!(back, m);

        let defs = back.definitions().unwrap();
        assert_eq!(defs.len(), 2);
        let (deploy, def) = &defs[0];
        assert_eq!(deploy.name, "deploy");
        assert_eq!(
            def.synopsis(false),
            "[-e|--env ENV] [-t|--tag TAG] [-f|--force] [--cache|--no-cache] [--] <target> [<services>...]"
        );
    }
}
