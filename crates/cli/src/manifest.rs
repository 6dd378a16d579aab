use anyhow::{Context, Result, bail};
use argvkit_manifest::AppManifest;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_MANIFEST_NAME: &str = "argvkit.json";

#[derive(Debug, Clone)]
pub struct LoadedManifest {
    pub path: PathBuf,
    pub manifest: AppManifest,
}

/// Load the manifest named by `-m`/`ARGVKIT_MANIFEST`, else `argvkit.json` in
/// the current directory.
pub fn load_manifest(manifest_path: Option<&Path>) -> Result<LoadedManifest> {
    let cwd = std::env::current_dir().context("failed to get current directory")?;

    let (path, explicit) = match manifest_path {
        Some(p) => (resolve_against(&cwd, p), true),
        None => (cwd.join(DEFAULT_MANIFEST_NAME), false),
    };

    if !path.exists() {
        if explicit {
            bail!("manifest not found: {}", path.display());
        }
        bail!(
            "no {DEFAULT_MANIFEST_NAME} in {} (run `argvkit init` or pass --manifest)",
            cwd.display()
        );
    }

    let contents = fs::read_to_string(&path)
        .with_context(|| format!("failed to read manifest: {}", path.display()))?;
    let manifest = AppManifest::from_json(&contents)
        .with_context(|| format!("invalid manifest: {}", path.display()))?;
    tracing::debug!(path = %path.display(), commands = manifest.commands.len(), "loaded manifest");

    Ok(LoadedManifest { path, manifest })
}

/// Write the example manifest into `project_dir`. An existing manifest is only
/// replaced with `overwrite`.
pub fn write_default_manifest(project_dir: &Path, overwrite: bool) -> Result<PathBuf> {
    let dest = project_dir.join(DEFAULT_MANIFEST_NAME);
    if dest.exists() && !overwrite {
        bail!(
            "{DEFAULT_MANIFEST_NAME} already exists in {} (use --force to replace it)",
            project_dir.display()
        );
    }

    let app_name = guess_project_name(project_dir).unwrap_or_else(|| "my-cli".to_string());
    let manifest = AppManifest::example(app_name);

    let mut out = manifest
        .to_json_pretty()
        .context("failed to serialize manifest")?;
    out.push('\n');

    let tmp = dest.with_extension("tmp");
    fs::write(&tmp, out.as_bytes())
        .with_context(|| format!("failed to write {}", tmp.display()))?;
    if overwrite && dest.exists() {
        fs::remove_file(&dest).with_context(|| format!("failed to remove {}", dest.display()))?;
    }
    fs::rename(&tmp, &dest)
        .with_context(|| format!("failed to move {} into place", dest.display()))?;
    Ok(dest)
}

fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn guess_project_name(project_dir: &Path) -> Option<String> {
    // For `.` or other non-meaningful paths, try the current directory name.
    let file_name = project_dir.file_name().and_then(|s| s.to_str());
    let direct = file_name.filter(|s| !s.is_empty() && *s != "." && *s != "..");
    if let Some(name) = direct {
        return Some(name.to_string());
    }

    let cwd = std::env::current_dir().ok()?;
    cwd.file_name()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn make_temp_dir(prefix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let pid = std::process::id();
        let dir = std::env::temp_dir().join(format!("argvkit-{prefix}-{pid}-{nanos}"));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn write_default_manifest_uses_directory_name() {
        let dir = make_temp_dir("manifest-defaults");
        let dest = write_default_manifest(&dir, false).unwrap();
        assert_eq!(dest.file_name().unwrap(), DEFAULT_MANIFEST_NAME);

        let loaded = load_manifest(Some(&dest)).unwrap();
        let project_name = dir.file_name().unwrap().to_string_lossy();
        assert_eq!(loaded.manifest.name, project_name);
        assert_eq!(loaded.manifest.version, "0.1.0");
        assert!(!loaded.manifest.commands.is_empty());
        assert!(!dir.join("argvkit.tmp").exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn existing_manifest_needs_overwrite() {
        let dir = make_temp_dir("manifest-overwrite");
        let dest = dir.join(DEFAULT_MANIFEST_NAME);
        fs::write(&dest, "{ \"name\": \"keep\" }").unwrap();

        assert!(write_default_manifest(&dir, false).is_err());
        assert_eq!(load_manifest(Some(&dest)).unwrap().manifest.name, "keep");

        write_default_manifest(&dir, true).unwrap();
        assert_ne!(load_manifest(Some(&dest)).unwrap().manifest.name, "keep");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn explicit_missing_manifest_is_an_error() {
        let dir = make_temp_dir("manifest-missing");
        let err = load_manifest(Some(&dir.join("nope.json"))).unwrap_err();
        assert!(err.to_string().contains("manifest not found"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn malformed_manifest_reports_path() {
        let dir = make_temp_dir("manifest-malformed");
        let path = dir.join(DEFAULT_MANIFEST_NAME);
        fs::write(&path, "{ \"schema-version\": 9, \"name\": \"x\" }").unwrap();

        let err = load_manifest(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("invalid manifest"));
        assert!(format!("{err:#}").contains("unsupported schema-version 9"));

        let _ = fs::remove_dir_all(&dir);
    }
}
