use serde::Deserialize;

/// Raw settings as written in a TOML config file or given on the command line
///
/// Numeric limits keep the signed conventions of the command line: a
/// non-positive `max_lines` means unlimited and a `min_lines` below one is
/// raised to one. A negative `timeout_ms` is rejected during validation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub files: Vec<String>,
    pub globs: Vec<String>,
    pub begin: Option<String>,
    pub end: Option<String>,
    pub exclude: Vec<String>,
    pub max_lines: i64,
    pub min_lines: i64,
    pub timeout_ms: i64,
    pub start_at_end: bool,
    pub reopen: bool,
    pub poll_interval_ms: u64,
    pub url: Option<String>,
    pub username: String,
    pub color: String,
    pub prefix: String,
    pub syntax: String,
    pub no_attach: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            globs: Vec::new(),
            begin: None,
            end: None,
            exclude: Vec::new(),
            max_lines: -1,
            min_lines: 1,
            timeout_ms: 1,
            start_at_end: false,
            reopen: false,
            poll_interval_ms: 100,
            url: None,
            username: String::new(),
            color: "#FF0000".to_string(),
            prefix: ":warning:".to_string(),
            syntax: String::new(),
            no_attach: false,
        }
    }
}
