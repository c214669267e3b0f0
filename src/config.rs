//! Rule loading and compilation.
//!
//! This module provides support for loading the PATH reordering rules from a
//! TOML configuration file and compiling them into an immutable [`RuleSet`].
//! A rules file declares:
//! - Named regex patterns, one per tag
//! - A priority ordering over those tag names
//! - An optional reserved `NULL` pattern whose matches are removed entirely
//!
//! Pattern text may embed `$VARNAME` references, which are substituted from
//! the supplied environment map exactly once before compilation.
//!
//! # Configuration File Format
//!
//! Configuration is stored in TOML format with the following structure:
//!
//! ```toml
//! tag_order = ["goenv", "usr_local", "usr_bins", "bins"]
//!
//! [patterns]
//! usr_bins  = '\A/usr/s?bin$'
//! usr_local = '\A/usr/local/s?bin'
//! bins      = '\A/s?bin$'
//! goenv     = '/\.goenv(/|$)'
//! NULL      = '/wtfisthis$'
//! ```

use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// The reserved tag name whose pattern removes entries instead of ranking
/// them. It never becomes a bucket and may not appear in `tag_order`.
pub const EXCLUSION_TAG: &str = "NULL";

/// Matches one `$VARNAME` reference inside pattern text. The name starts
/// with a letter or underscore followed by at least one more word character,
/// so a bare `$X` stays literal.
static VAR_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$[A-Za-z_][A-Za-z0-9_]+").expect("invalid reference regex"));

/// Errors that can occur during rule loading and compilation.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Rules file not found at the specified or resolved path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// A pattern failed to compile after variable substitution.
    InvalidRegexPattern {
        /// The tag the pattern was declared under.
        tag: String,
        /// The pattern text that failed to compile.
        pattern: String,
        /// The reason why the pattern is invalid.
        reason: String,
    },
    /// `tag_order` names a tag with no declared pattern.
    UndeclaredTag(String),
    /// IO error while reading the rules file.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Rules file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::InvalidRegexPattern {
                tag,
                pattern,
                reason,
            } => {
                write!(
                    f,
                    "Invalid pattern '{}' for tag '{}': {}",
                    pattern, tag, reason
                )
            }
            ConfigError::UndeclaredTag(tag) => {
                write!(
                    f,
                    "tag_order entry '{}' is not declared under [patterns]; check your rules file",
                    tag
                )
            }
            ConfigError::IoError(msg) => write!(f, "IO error reading rules file: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// The raw rules document, deserialized from TOML.
///
/// This is the unvalidated form: pattern text has not been substituted or
/// compiled yet. Call [`RuleConfig::compile`] to obtain a usable [`RuleSet`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleConfig {
    /// Ordered tag names defining bucket precedence. May be empty.
    #[serde(default)]
    pub tag_order: Vec<String>,

    /// Tag name to pattern text. TOML rejects duplicate keys, so tag
    /// uniqueness is enforced structurally.
    #[serde(default)]
    pub patterns: BTreeMap<String, String>,
}

impl RuleConfig {
    /// Load the rules document, resolving its location.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. The file named by the `PATHTIDY_CONFIG` environment variable
    /// 3. `~/.pathtidy.toml` in the home directory
    /// 4. `~/.config/pathtidy/config.toml`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if no rules file exists at any
    /// of those locations. A missing rules file is fatal: without rules the
    /// tool has nothing meaningful to do.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        if let Ok(env_path) = std::env::var("PATHTIDY_CONFIG")
            && !env_path.is_empty()
        {
            return Self::load_from_file(Path::new(&env_path));
        }

        if let Ok(home) = std::env::var("HOME") {
            let dotfile = PathBuf::from(&home).join(".pathtidy.toml");
            if dotfile.exists() {
                return Self::load_from_file(&dotfile);
            }

            let xdg_config = PathBuf::from(&home)
                .join(".config")
                .join("pathtidy")
                .join("config.toml");
            if xdg_config.exists() {
                return Self::load_from_file(&xdg_config);
            }

            return Err(ConfigError::ConfigNotFound(dotfile));
        }

        Err(ConfigError::ConfigNotFound(PathBuf::from(
            "~/.pathtidy.toml",
        )))
    }

    /// Load the rules document from a specific file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if the file does not exist.
    /// Returns `ConfigError::ConfigInvalid` if TOML parsing fails.
    /// Returns `ConfigError::IoError` if the file cannot be read.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml_str(&content)
    }

    /// Parse the rules document from an in-memory TOML string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigInvalid` if TOML parsing fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Compile the document into a validated [`RuleSet`], substituting
    /// `$VARNAME` references against `env`.
    ///
    /// A rule whose pattern references a variable missing from `env` is
    /// dropped from both the patterns and the priority order, and a warning
    /// is recorded on the returned rule set; it could never match anything.
    ///
    /// # Errors
    ///
    /// Returns an error if any pattern fails to compile, or if `tag_order`
    /// names a tag with no declared pattern.
    ///
    /// # Examples
    ///
    /// ```
    /// use pathtidy::RuleConfig;
    /// use std::collections::HashMap;
    ///
    /// let config = RuleConfig::from_toml_str(r#"
    /// tag_order = ["usr_local"]
    /// [patterns]
    /// usr_local = '\A/usr/local/s?bin'
    /// "#).unwrap();
    ///
    /// let rules = config.compile(&HashMap::new()).unwrap();
    /// assert_eq!(rules.order(), ["usr_local"]);
    /// assert_eq!(rules.classify("/usr/local/bin"), Some("usr_local"));
    /// ```
    pub fn compile(self, env: &HashMap<String, String>) -> Result<RuleSet, ConfigError> {
        RuleSet::new(self, env)
    }
}

/// The validated, compiled rule set.
///
/// Immutable once constructed; classification and exclusion matching borrow
/// it, so one `RuleSet` may be reused across any number of reordering calls.
#[derive(Debug)]
pub struct RuleSet {
    tags: Vec<String>,
    patterns: HashMap<String, Regex>,
    order: Vec<String>,
    exclusion: Option<Regex>,
    warnings: Vec<String>,
}

impl RuleSet {
    /// Substitute patterns, compile them, and validate the priority order.
    fn new(config: RuleConfig, env: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut tags = Vec::new();
        let mut patterns = HashMap::new();
        let mut exclusion = None;
        let mut dropped: HashSet<String> = HashSet::new();
        let mut warnings = Vec::new();

        for (tag, text) in &config.patterns {
            let Some(expanded) = expand_variables(text, env) else {
                warnings.push(format!(
                    "pattern \"{}\" contains environment variables that could not be expanded; \
                     rule '{}' will be ignored",
                    text, tag
                ));
                dropped.insert(tag.clone());
                continue;
            };

            let regex = Regex::new(&expanded).map_err(|e| ConfigError::InvalidRegexPattern {
                tag: tag.clone(),
                pattern: expanded.clone(),
                reason: e.to_string(),
            })?;

            if tag == EXCLUSION_TAG {
                exclusion = Some(regex);
            } else {
                tags.push(tag.clone());
                patterns.insert(tag.clone(), regex);
            }
        }

        // Rules dropped over unresolved variables can never match a PATH
        // entry, so their names are filtered out of the ordering as well.
        let order: Vec<String> = config
            .tag_order
            .into_iter()
            .filter(|tag| !dropped.contains(tag))
            .collect();

        for tag in &order {
            if !patterns.contains_key(tag) {
                return Err(ConfigError::UndeclaredTag(tag.clone()));
            }
        }

        Ok(Self {
            tags,
            patterns,
            order,
            exclusion,
            warnings,
        })
    }

    /// The declared tag names, excluding the reserved exclusion tag.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Tag names in bucket-priority order.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Warnings recorded while compiling, one per dropped rule.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// True if `entry` matches the exclusion pattern. Excluded entries are
    /// removed from the output entirely, even when a classification pattern
    /// would also match them.
    pub fn matches_exclusion(&self, entry: &str) -> bool {
        self.exclusion.as_ref().is_some_and(|re| re.is_match(entry))
    }

    /// Classify `entry`, returning the first tag in priority order whose
    /// pattern matches it, or `None` for unclassified entries.
    ///
    /// Patterns carry their own anchoring; no implicit anchoring is added,
    /// so an unanchored pattern matches anywhere in the entry.
    pub fn classify(&self, entry: &str) -> Option<&str> {
        for tag in &self.order {
            if let Some(regex) = self.patterns.get(tag)
                && regex.is_match(entry)
            {
                return Some(tag);
            }
        }
        None
    }
}

/// Replace each `$VARNAME` reference in `pattern` with its value from `env`.
///
/// Substitution happens exactly once, left to right: substituted values are
/// never rescanned, so a value that itself contains `$VAR`-shaped text is
/// left as is. Returns `None` if any referenced variable is missing from
/// `env`, letting the caller decide how to handle the rule.
fn expand_variables(pattern: &str, env: &HashMap<String, String>) -> Option<String> {
    let mut result = String::with_capacity(pattern.len());
    let mut last = 0;

    for reference in VAR_REFERENCE.find_iter(pattern) {
        result.push_str(&pattern[last..reference.start()]);

        // Strip the leading '$' to get the variable name.
        let name = &pattern[reference.start() + 1..reference.end()];
        result.push_str(env.get(name)?);

        last = reference.end();
    }

    result.push_str(&pattern[last..]);
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &str = r#"
tag_order = ["pyenv", "goenv", "home_bin", "usr_local", "usr_bins", "bins"]

[patterns]
usr_bins = "\\A/usr/s?bin$"
usr_local = "\\A/usr/local/s?bin"
bins = "\\A/s?bin$"
goenv = "/\\.goenv(/|$)"
home_bin = "\\A$HOME/bin$"
pyenv = "\\A$PYENV_ROOT/(bin|shims)$"
NULL = "/wtfisthis$"
"#;

    fn test_env() -> HashMap<String, String> {
        // A home under /test so nothing collides with the real environment.
        HashMap::from([
            ("HOME".to_string(), "/test/casey".to_string()),
            ("PYENV_ROOT".to_string(), "/opt/pyenv".to_string()),
        ])
    }

    fn compiled_rules() -> RuleSet {
        RuleConfig::from_toml_str(RULES)
            .expect("failed to parse rules")
            .compile(&test_env())
            .expect("failed to compile rules")
    }

    #[test]
    fn test_parse_rules_document() {
        let config = RuleConfig::from_toml_str(RULES).unwrap();
        assert_eq!(config.tag_order.len(), 6);
        assert_eq!(config.patterns.len(), 7);
        assert_eq!(config.patterns["goenv"], "/\\.goenv(/|$)");
    }

    #[test]
    fn test_order_property() {
        let rules = compiled_rules();
        assert_eq!(
            rules.order(),
            ["pyenv", "goenv", "home_bin", "usr_local", "usr_bins", "bins"]
        );
    }

    #[test]
    fn test_exclusion_tag_is_not_a_bucket() {
        let rules = compiled_rules();
        assert!(!rules.tags().contains(&EXCLUSION_TAG.to_string()));
        assert!(!rules.order().contains(&EXCLUSION_TAG.to_string()));
        assert!(rules.matches_exclusion("/opt/wtfisthis"));
        assert!(!rules.matches_exclusion("/usr/bin"));
    }

    #[test]
    fn test_classify_uses_priority_order() {
        let rules = compiled_rules();
        assert_eq!(rules.classify("/opt/pyenv/shims"), Some("pyenv"));
        assert_eq!(rules.classify("/test/casey/.goenv/bin"), Some("goenv"));
        assert_eq!(rules.classify("/test/casey/bin"), Some("home_bin"));
        assert_eq!(rules.classify("/usr/local/sbin"), Some("usr_local"));
        assert_eq!(rules.classify("/usr/sbin"), Some("usr_bins"));
        assert_eq!(rules.classify("/sbin"), Some("bins"));
        assert_eq!(rules.classify("/nonexistent/anywhere"), None);
    }

    #[test]
    fn test_expand_single_variable() {
        let pattern = "\\A$PYENV_ROOT/(bin|shims)$";
        assert_eq!(
            expand_variables(pattern, &test_env()),
            Some("\\A/opt/pyenv/(bin|shims)$".to_string())
        );
    }

    #[test]
    fn test_expand_multiple_variables() {
        let env = HashMap::from([
            ("HOME".to_string(), "/home/u".to_string()),
            ("TOOL".to_string(), "goenv".to_string()),
        ]);
        assert_eq!(
            expand_variables("\\A$HOME/.$TOOL/bin$", &env),
            Some("\\A/home/u/.goenv/bin$".to_string())
        );
    }

    #[test]
    fn test_expand_exactly_once() {
        // There is no recursion: a substituted value containing $VAR-shaped
        // text is left unexpanded.
        let env = HashMap::from([("PYENV_ROOT".to_string(), "$HOME/.pyenv".to_string())]);
        assert_eq!(
            expand_variables("\\A$PYENV_ROOT/(bin|shims)$", &env),
            Some("\\A$HOME/.pyenv/(bin|shims)$".to_string())
        );
    }

    #[test]
    fn test_expand_short_name_stays_literal() {
        // A single-character name does not qualify as a reference.
        let env = HashMap::from([("A".to_string(), "/opt".to_string())]);
        assert_eq!(expand_variables("$A/bin", &env), Some("$A/bin".to_string()));
    }

    #[test]
    fn test_expand_missing_variable_returns_none() {
        assert_eq!(expand_variables("\\A$NOPE/bin$", &HashMap::new()), None);
    }

    #[test]
    fn test_unresolved_variable_drops_rule_with_warning() {
        // No PYENV_ROOT in the env: the pyenv rule must vanish from both
        // the patterns and the ordering, with one warning naming it.
        let env = HashMap::from([("HOME".to_string(), "/test/casey".to_string())]);
        let rules = RuleConfig::from_toml_str(RULES)
            .unwrap()
            .compile(&env)
            .unwrap();

        assert!(!rules.tags().contains(&"pyenv".to_string()));
        assert_eq!(
            rules.order(),
            ["goenv", "home_bin", "usr_local", "usr_bins", "bins"]
        );
        assert_eq!(rules.warnings().len(), 1);
        assert!(rules.warnings()[0].contains("$PYENV_ROOT"));
        assert_eq!(rules.classify("/opt/pyenv/shims"), None);
    }

    #[test]
    fn test_undeclared_tag_in_order_fails() {
        let config = RuleConfig::from_toml_str(
            r#"
tag_order = ["bins", "missing"]
[patterns]
bins = "\\A/s?bin$"
"#,
        )
        .unwrap();

        let err = config.compile(&HashMap::new()).unwrap_err();
        match err {
            ConfigError::UndeclaredTag(tag) => assert_eq!(tag, "missing"),
            other => panic!("expected UndeclaredTag, got {:?}", other),
        }
    }

    #[test]
    fn test_exclusion_tag_in_order_fails() {
        let config = RuleConfig::from_toml_str(
            r#"
tag_order = ["NULL"]
[patterns]
NULL = "/wtfisthis$"
"#,
        )
        .unwrap();

        assert!(matches!(
            config.compile(&HashMap::new()),
            Err(ConfigError::UndeclaredTag(tag)) if tag == "NULL"
        ));
    }

    #[test]
    fn test_invalid_regex_fails() {
        let config = RuleConfig::from_toml_str(
            r#"
tag_order = ["broken"]
[patterns]
broken = "[invalid("
"#,
        )
        .unwrap();

        assert!(matches!(
            config.compile(&HashMap::new()),
            Err(ConfigError::InvalidRegexPattern { tag, .. }) if tag == "broken"
        ));
    }

    #[test]
    fn test_malformed_toml_fails() {
        assert!(matches!(
            RuleConfig::from_toml_str("tag_order = [unclosed"),
            Err(ConfigError::ConfigInvalid(_))
        ));
    }

    #[test]
    fn test_empty_document_compiles() {
        let rules = RuleConfig::from_toml_str("")
            .unwrap()
            .compile(&HashMap::new())
            .unwrap();
        assert!(rules.order().is_empty());
        assert!(rules.tags().is_empty());
        assert!(rules.warnings().is_empty());
        assert!(!rules.matches_exclusion("/usr/bin"));
        assert_eq!(rules.classify("/usr/bin"), None);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = RuleConfig::load_from_file(Path::new("/nonexistent/pathtidy.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigNotFound(_)));
    }
}
