use crate::error::{ProcessorError, Result};
use crate::project_identity;
use crate::utils::regex_cache;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Expand `$VAR` and `${VAR}` references from the process environment.
/// Unknown variables are left untouched.
pub fn expand_vars(input: &str) -> String {
    expand_vars_with(input, |name| std::env::var(name).ok())
}

pub fn expand_vars_with<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let Ok(re) = regex_cache::get_cached_regex(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))")
    else {
        return input.to_string();
    };

    re.replace_all(input, |caps: &regex::Captures| {
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str())
            .unwrap_or_default();
        lookup(name).unwrap_or_else(|| caps[0].to_string())
    })
    .into_owned()
}

pub fn config_dir() -> Result<PathBuf> {
    let proj = ProjectDirs::from(
        project_identity::PROJECT_QUALIFIER,
        project_identity::PROJECT_ORG,
        project_identity::CONFIG_DIR_NAME,
    )
    .ok_or_else(|| ProcessorError::Other("Could not determine config directory".to_string()))?;
    Ok(proj.config_dir().to_path_buf())
}

pub fn settings_file() -> Result<PathBuf> {
    Ok(config_dir()?.join(project_identity::SETTINGS_FILE_BASENAME))
}

/// `{cache_dir}/downloads`, the shared scratch area of the Apple processors.
pub fn downloads_dir(cache_dir: &Path) -> PathBuf {
    cache_dir.join("downloads")
}

/// Create a directory (and parents) with a path-carrying error.
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|e| ProcessorError::io(path, e))
}

/// File name without its final extension.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
