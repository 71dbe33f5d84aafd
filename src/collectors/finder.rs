use glob::glob;
use log::{debug, error, warn};
use std::collections::HashSet;
use std::path::PathBuf;

/// Resolve explicit paths and glob patterns into the list of files to watch
///
/// Explicit paths come first and are kept even if they do not exist yet.
/// Glob matches follow in pattern order. Directories are skipped and
/// duplicates are dropped, keeping the first occurrence. A pattern that
/// fails to parse is logged and skipped.
pub fn resolve_targets(files: &[String], globs: &[String]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut paths = Vec::new();

    for file in files {
        let path = PathBuf::from(file);
        if seen.insert(path.clone()) {
            paths.push(path);
        }
    }

    for pattern in globs {
        let matches = match glob(pattern) {
            Ok(matches) => matches,
            Err(e) => {
                error!("Error parsing glob '{}': {}", pattern, e);
                continue;
            }
        };

        let mut matched = 0;
        for entry in matches {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    warn!("Unreadable path while expanding '{}': {}", pattern, e);
                    continue;
                }
            };

            if path.is_dir() {
                continue;
            }

            matched += 1;
            if seen.insert(path.clone()) {
                paths.push(path);
            }
        }

        if matched == 0 {
            warn!("Glob '{}' matched no files", pattern);
        } else {
            debug!("Glob '{}' matched {} files", pattern, matched);
        }
    }

    paths
}
