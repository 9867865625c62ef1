//! Ignore rules for excluding paths from a build.
//!
//! Users write ignore patterns as plain strings. Each pattern is normalised
//! (backslashes become `/`, leading `./` is stripped) and classified into one
//! of three typed rules:
//!
//! - `mods/` (trailing slash) is a [`IgnoreRule::Prefix`] rule;
//! - `config/secret.toml` (contains a slash) is an [`IgnoreRule::Exact`] rule;
//! - `.DS_Store` (no slash) is an [`IgnoreRule::Basename`] rule.
//!
//! Matching is literal string comparison on normalised relative paths. There
//! is no globbing.

use std::fmt;

/// A single normalised ignore rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IgnoreRule {
    /// A relative path; matches the path itself, everything below it, and
    /// any path ending in `/<path>`.
    Exact(String),
    /// A bare file or directory name; matches any entry with that name.
    Basename(String),
    /// A directory written with a trailing slash; matches the directory and
    /// everything below it, at the root or below any segment boundary.
    Prefix(String),
}

impl IgnoreRule {
    /// Parse a user-supplied pattern into a typed rule.
    ///
    /// Returns `None` when the pattern normalises to nothing (for example
    /// `""` or `"./"`), since such a rule would otherwise exclude every path.
    ///
    /// # Examples
    ///
    /// ```
    /// use modpack::ignore::IgnoreRule;
    ///
    /// assert_eq!(
    ///     IgnoreRule::parse("./logs/"),
    ///     Some(IgnoreRule::Prefix("logs".to_owned()))
    /// );
    /// assert_eq!(
    ///     IgnoreRule::parse(".\\config\\secret.toml"),
    ///     Some(IgnoreRule::Exact("config/secret.toml".to_owned()))
    /// );
    /// assert_eq!(
    ///     IgnoreRule::parse(".DS_Store"),
    ///     Some(IgnoreRule::Basename(".DS_Store".to_owned()))
    /// );
    /// assert_eq!(IgnoreRule::parse("./"), None);
    /// ```
    #[must_use]
    pub fn parse(pattern: &str) -> Option<Self> {
        let normalised = normalise(pattern);
        if let Some(dir) = normalised.strip_suffix('/') {
            let dir = dir.trim_end_matches('/');
            return (!dir.is_empty()).then(|| Self::Prefix(dir.to_owned()));
        }
        if normalised.is_empty() {
            return None;
        }
        if normalised.contains('/') {
            Some(Self::Exact(normalised))
        } else {
            Some(Self::Basename(normalised))
        }
    }

    /// Return true when `path` (already normalised) is excluded by this rule.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Basename(name) => basename(path) == name || starts_below(path, name),
            Self::Exact(rule) => path == rule || starts_below(path, rule) || ends_with(path, rule),
            Self::Prefix(dir) => {
                path == dir
                    || starts_below(path, dir)
                    || ends_with(path, dir)
                    || contains_segment(path, dir)
            }
        }
    }

    /// Return the pattern text the rule was normalised to.
    #[must_use]
    pub fn pattern(&self) -> &str {
        match self {
            Self::Exact(value) | Self::Basename(value) | Self::Prefix(value) => value,
        }
    }
}

impl fmt::Display for IgnoreRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prefix(dir) => write!(f, "{dir}/"),
            Self::Exact(value) | Self::Basename(value) => write!(f, "{value}"),
        }
    }
}

/// An ordered set of ignore rules.
///
/// # Examples
///
/// ```
/// use modpack::ignore::IgnoreSet;
///
/// let rules = IgnoreSet::from_patterns(["ignored/", ".DS_Store", "config/local.toml"]);
/// assert!(rules.should_ignore("ignored/b.txt"));
/// assert!(rules.should_ignore("mods/.DS_Store"));
/// assert!(rules.should_ignore("./config/local.toml"));
/// assert!(!rules.should_ignore("a.txt"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreSet {
    rules: Vec<IgnoreRule>,
}

impl IgnoreSet {
    /// Create an empty rule set, which matches nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a rule set from raw patterns, discarding empty ones.
    pub fn from_patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for pattern in patterns {
            set.push_pattern(pattern.as_ref());
        }
        set
    }

    /// Parse and append one pattern.
    ///
    /// Returns false (and logs a warning) when the pattern is empty after
    /// normalisation.
    pub fn push_pattern(&mut self, pattern: &str) -> bool {
        match IgnoreRule::parse(pattern) {
            Some(rule) => {
                self.push(rule);
                true
            }
            None => {
                log::warn!("ignoring empty ignore pattern {pattern:?}");
                false
            }
        }
    }

    /// Append an already-typed rule, skipping duplicates.
    pub fn push(&mut self, rule: IgnoreRule) {
        if !self.rules.contains(&rule) {
            self.rules.push(rule);
        }
    }

    /// Return true when any rule excludes `relative_path`.
    ///
    /// The path is normalised first, so callers may pass host-style
    /// separators or a leading `./`.
    #[must_use]
    pub fn should_ignore(&self, relative_path: &str) -> bool {
        let path = normalise(relative_path);
        self.rules.iter().any(|rule| rule.matches(&path))
    }

    /// Return the rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[IgnoreRule] {
        &self.rules
    }

    /// Return true when the set holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Return true when any of `rules` excludes `relative_path`.
#[must_use]
pub fn should_ignore(relative_path: &str, rules: &IgnoreSet) -> bool {
    rules.should_ignore(relative_path)
}

/// Normalise a path or pattern: `\` becomes `/` and leading `./` segments
/// (and stray leading slashes after them) are removed.
#[must_use]
pub fn normalise(raw: &str) -> String {
    let forward = raw.trim().replace('\\', "/");
    let mut rest = forward.as_str();
    while let Some(stripped) = rest.strip_prefix("./") {
        rest = stripped.trim_start_matches('/');
    }
    rest.to_owned()
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn starts_below(path: &str, dir: &str) -> bool {
    path.strip_prefix(dir)
        .is_some_and(|rest| rest.starts_with('/'))
}

fn ends_with(path: &str, tail: &str) -> bool {
    path.strip_suffix(tail)
        .is_some_and(|head| head.ends_with('/'))
}

fn contains_segment(path: &str, dir: &str) -> bool {
    path.contains(&format!("/{dir}/"))
}
