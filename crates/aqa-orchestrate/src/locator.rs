//! Executor binary discovery: explicit override, then
//! `AQA_RUNNER_PATH`, then project-relative release/debug build output,
//! then `~/.cargo/bin`, then common system install paths, then a bare
//! `PATH` lookup. Grounded in the sibling Rust executor's own build
//! location conventions (`target/release`/`target/debug`) plus the
//! `which`-style search idiom used by `kioku-aperture`'s tool discovery.

use std::path::{Path, PathBuf};

const BINARY_NAME: &str = "aqa-runner";

pub fn locate_executor(explicit: Option<&str>) -> Result<PathBuf, Vec<String>> {
    let mut tried = Vec::new();

    if let Some(path) = explicit {
        tried.push(path.to_string());
        let candidate = PathBuf::from(path);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    if let Ok(path) = std::env::var("AQA_RUNNER_PATH") {
        tried.push(path.clone());
        let candidate = PathBuf::from(&path);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    for rel in ["target/release", "target/debug"] {
        let candidate = Path::new(rel).join(BINARY_NAME);
        tried.push(candidate.display().to_string());
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    if let Some(home) = std::env::var_os("CARGO_HOME").or_else(|| std::env::var_os("HOME")) {
        let candidate = PathBuf::from(home).join(".cargo").join("bin").join(BINARY_NAME);
        tried.push(candidate.display().to_string());
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    for sys in ["/usr/local/bin", "/usr/bin"] {
        let candidate = Path::new(sys).join(BINARY_NAME);
        tried.push(candidate.display().to_string());
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    if let Ok(path_var) = std::env::var("PATH") {
        for dir in std::env::split_paths(&path_var) {
            let candidate = dir.join(BINARY_NAME);
            tried.push(candidate.display().to_string());
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
    }

    Err(tried)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_is_tried_first_and_used_when_present() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap();
        let found = locate_executor(Some(path)).unwrap();
        assert_eq!(found, tmp.path());
    }

    #[test]
    fn missing_everywhere_reports_every_path_tried() {
        std::env::remove_var("AQA_RUNNER_PATH");
        let err = locate_executor(Some("/definitely/not/here")).unwrap_err();
        assert!(err.iter().any(|p| p == "/definitely/not/here"));
        assert!(!err.is_empty());
    }
}
