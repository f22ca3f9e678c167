use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use crate::error::EngineError;

/// Resolve a bare command name against an ordered search path.
///
/// The first directory whose `dir/name` exists as an executable regular
/// file wins; later directories are never consulted. Absence of a
/// candidate is an expected outcome, not a failure: the only error is
/// [`EngineError::CommandNotFound`] once the whole path is exhausted.
/// Pure lookup, no process state is touched.
///
/// A name containing a path separator bypasses the search and is checked
/// directly, so `./script` and `/usr/bin/env` behave as they would in any
/// shell.
pub fn resolve(name: &str, search_path: &[PathBuf]) -> Result<PathBuf, EngineError> {
    if name.contains('/') {
        let direct = Path::new(name);
        if is_executable(direct) {
            return Ok(direct.to_path_buf());
        }
    } else {
        for dir in search_path {
            let candidate = dir.join(name);
            if is_executable(&candidate) {
                return Ok(candidate);
            }
        }
    }
    Err(EngineError::CommandNotFound {
        name: name.to_string(),
    })
}

fn is_executable(path: &Path) -> bool {
    match path.metadata() {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::fs::{File, Permissions};

    /// Lay out `<base>/<dir>/<name>` with the given mode and return the
    /// directory path.
    fn fake_bin(base: &Path, dir: &str, name: &str, mode: u32) -> PathBuf {
        let dir_path = base.join(dir);
        fs::create_dir_all(&dir_path).expect("create fake bin dir");
        let file_path = dir_path.join(name);
        File::create(&file_path).expect("create fake program");
        fs::set_permissions(&file_path, Permissions::from_mode(mode)).expect("chmod");
        dir_path
    }

    fn temp_base(tag: &str) -> PathBuf {
        let base = std::env::temp_dir().join(format!("resolver_tests_{}_{}", std::process::id(), tag));
        let _ = fs::remove_dir_all(&base);
        fs::create_dir_all(&base).expect("create temp base");
        base
    }

    #[test]
    fn first_matching_directory_wins() {
        let base = temp_base("order");
        let first = fake_bin(&base, "first", "prog", 0o755);
        let second = fake_bin(&base, "second", "prog", 0o755);

        let found = resolve("prog", &[first.clone(), second]).expect("should resolve");
        assert_eq!(found, first.join("prog"));

        let _ = fs::remove_dir_all(base);
    }

    #[test]
    fn skips_directories_without_the_name() {
        let base = temp_base("skip");
        let empty = fake_bin(&base, "empty", "other", 0o755);
        let holds = fake_bin(&base, "holds", "prog", 0o755);

        let found = resolve("prog", &[empty, holds.clone()]).expect("should resolve");
        assert_eq!(found, holds.join("prog"));

        let _ = fs::remove_dir_all(base);
    }

    #[test]
    fn non_executable_candidates_are_not_matches() {
        let base = temp_base("mode");
        let plain = fake_bin(&base, "plain", "prog", 0o644);

        let res = resolve("prog", &[plain]);
        assert!(matches!(
            res,
            Err(EngineError::CommandNotFound { ref name }) if name == "prog"
        ));

        let _ = fs::remove_dir_all(base);
    }

    #[test]
    fn exhausted_path_is_a_value_not_a_panic() {
        // None of these directories exist; every candidate probe must fail
        // quietly and the scan must run to the end.
        let path = vec![
            PathBuf::from("/does/not/exist"),
            PathBuf::from("/also/missing"),
        ];
        let res = resolve("prog", &path);
        assert!(matches!(
            res,
            Err(EngineError::CommandNotFound { ref name }) if name == "prog"
        ));
    }

    #[test]
    fn empty_search_path_never_resolves() {
        assert!(resolve("prog", &[]).is_err());
    }

    #[test]
    fn name_with_separator_is_checked_directly() {
        let base = temp_base("direct");
        let dir = fake_bin(&base, "bin", "prog", 0o755);
        let direct = dir.join("prog");

        // resolves even though the search path is unrelated
        let found = resolve(direct.to_str().unwrap(), &[PathBuf::from("/unrelated")])
            .expect("should resolve");
        assert_eq!(found, direct);

        let _ = fs::remove_dir_all(base);
    }
}
