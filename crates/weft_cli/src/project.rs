//! Locating and loading the project configuration.

use std::path::{Path, PathBuf};

use weft_config::{WeftConfig, CONFIG_FILE_NAME};

use crate::GlobalArgs;

/// Walks up from `start` looking for the nearest directory containing `weft.toml`.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE_NAME).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find {CONFIG_FILE_NAME} in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Resolves the project root and the config file path.
///
/// `--config` may name the file (its directory becomes the root) or the
/// directory. Without it, the search starts at the current directory.
pub fn resolve_project(
    global: &GlobalArgs,
) -> Result<(PathBuf, PathBuf), Box<dyn std::error::Error>> {
    match global.config {
        Some(ref config_path) => {
            let p = PathBuf::from(config_path);
            if p.is_file() {
                let root = p
                    .parent()
                    .filter(|d| !d.as_os_str().is_empty())
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."));
                Ok((root, p))
            } else {
                let file = p.join(CONFIG_FILE_NAME);
                Ok((p, file))
            }
        }
        None => {
            let root = find_project_root(&std::env::current_dir()?)?;
            let file = root.join(CONFIG_FILE_NAME);
            Ok((root, file))
        }
    }
}

/// Loads the project configuration.
pub fn load_project(
    global: &GlobalArgs,
) -> Result<(PathBuf, WeftConfig), Box<dyn std::error::Error>> {
    let (root, file) = resolve_project(global)?;
    let config = weft_config::load_config(&file)
        .map_err(|e| format!("{}: {e}", file.display()))?;
    log::debug!("loaded {} (project '{}')", file.display(), config.project.name);
    Ok((root, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn global(config: Option<String>) -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            verbose: false,
            color: false,
            config,
        }
    }

    #[test]
    fn finds_root_in_parent() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("weft.toml"), "[project]\nname = \"t\"\n").unwrap();
        let nested = tmp.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_project_root(&nested).unwrap(), tmp.path());
    }

    #[test]
    fn missing_root_errors() {
        let tmp = TempDir::new().unwrap();
        let err = find_project_root(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("weft.toml"));
    }

    #[test]
    fn config_file_path() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("custom.toml");
        fs::write(&file, "[project]\nname = \"t\"\n").unwrap();
        let (root, path) =
            resolve_project(&global(Some(file.to_str().unwrap().to_string()))).unwrap();
        assert_eq!(root, tmp.path());
        assert_eq!(path, file);
    }

    #[test]
    fn config_dir_path() {
        let tmp = TempDir::new().unwrap();
        let (root, path) =
            resolve_project(&global(Some(tmp.path().to_str().unwrap().to_string()))).unwrap();
        assert_eq!(root, tmp.path());
        assert_eq!(path, tmp.path().join("weft.toml"));
    }

    #[test]
    fn load_reports_file_on_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("weft.toml"), "[project]\nname = \"\"\n").unwrap();
        let err = load_project(&global(Some(tmp.path().to_str().unwrap().to_string())))
            .err()
            .unwrap();
        assert!(err.to_string().contains("weft.toml"));
    }
}
