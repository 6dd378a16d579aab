use anyhow::Result;
use argvkit::help;
use serde::Serialize;

use crate::app::build_application;
use crate::manifest::LoadedManifest;

#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub manifest: String,
    pub application: String,
    pub version: String,
    pub commands: Vec<CommandReport>,
}

#[derive(Debug, Serialize)]
pub struct CommandReport {
    pub name: String,
    pub aliases: Vec<String>,
    pub hidden: bool,
    pub usage: String,
}

/// Build the application from the manifest, which validates every command
/// definition, and describe each command.
pub fn check_manifest(loaded: &LoadedManifest) -> Result<CheckReport> {
    let app = build_application(&loaded.manifest, None)?;

    let commands = app
        .commands()
        .map(|c| CommandReport {
            name: c.name().to_string(),
            aliases: c.aliases().to_vec(),
            hidden: c.is_hidden(),
            usage: help::usage_line(c, app.name()),
        })
        .collect();

    Ok(CheckReport {
        manifest: loaded.path.display().to_string(),
        application: app.name().to_string(),
        version: app.version().to_string(),
        commands,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use argvkit_manifest::AppManifest;
    use std::path::PathBuf;

    #[test]
    fn report_lists_every_command_with_usage() {
        let mut manifest = AppManifest::example("demo");
        manifest.commands[1].hidden = true;
        let loaded = LoadedManifest {
            path: PathBuf::from("argvkit.json"),
            manifest,
        };

        let report = check_manifest(&loaded).unwrap();
        assert_eq!(report.application, "demo");
        assert_eq!(report.commands.len(), 2);
        assert_eq!(report.commands[0].name, "deploy");
        assert_eq!(report.commands[0].aliases, vec!["d"]);
        assert_eq!(
            report.commands[0].usage,
            "Usage: demo deploy [options] [--] <target> [<services>...]"
        );
        assert!(report.commands[1].hidden);
    }
}
