use crate::error::ConfigError;
use regex::Regex;

/// Patterns that classify lines as entry boundaries or as noise
///
/// Compiled once at startup and shared read-only by every aggregator and the
/// dispatcher. Matching is unanchored, so `ERROR` matches anywhere in a line;
/// use `^ERROR` to pin it to the start.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    begin: Option<Regex>,
    end: Option<Regex>,
    exclude: Vec<Regex>,
}

impl FilterSet {
    /// Compile the configured patterns
    ///
    /// Empty begin/end strings are treated as "not configured".
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidPattern` naming the first pattern that
    /// fails to compile.
    pub fn compile(
        begin: Option<&str>,
        end: Option<&str>,
        exclude: &[String],
    ) -> Result<Self, ConfigError> {
        let begin = compile_optional("begin", begin)?;
        let end = compile_optional("end", end)?;
        let exclude = exclude
            .iter()
            .map(|p| compile_one("exclude", p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            begin,
            end,
            exclude,
        })
    }

    /// True iff a begin pattern is configured and matches `line`
    pub fn matches_begin(&self, line: &str) -> bool {
        self.begin.as_ref().is_some_and(|re| re.is_match(line))
    }

    /// True iff an end pattern is configured and matches `line`
    pub fn matches_end(&self, line: &str) -> bool {
        self.end.as_ref().is_some_and(|re| re.is_match(line))
    }

    /// True iff any exclude pattern matches any line of the candidate entry
    pub fn is_excluded<S: AsRef<str>>(&self, entry_lines: &[S]) -> bool {
        self.exclude
            .iter()
            .any(|re| entry_lines.iter().any(|l| re.is_match(l.as_ref())))
    }

    pub fn has_begin(&self) -> bool {
        self.begin.is_some()
    }

    pub fn has_end(&self) -> bool {
        self.end.is_some()
    }
}

fn compile_optional(kind: &'static str, pattern: Option<&str>) -> Result<Option<Regex>, ConfigError> {
    match pattern {
        Some(p) if !p.is_empty() => compile_one(kind, p).map(Some),
        _ => Ok(None),
    }
}

fn compile_one(kind: &'static str, pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
        kind,
        pattern: pattern.to_string(),
        source,
    })
}
