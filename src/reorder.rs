/// PATH reordering engine.
///
/// This module provides the pure reordering pass over a colon-separated
/// path string: entries are classified into one bucket per priority tag,
/// entries matching the exclusion pattern are dropped, and the buckets are
/// re-emitted in priority order followed by unclassified entries, with
/// duplicates removed. No I/O happens here; filesystem pruning is the CLI's
/// concern.
use crate::config::RuleSet;
use std::collections::{HashMap, HashSet};

/// Reorders path entries according to a compiled [`RuleSet`].
pub struct PathReorderer;

impl PathReorderer {
    /// Reorder the entries of `path_str` by bucket priority.
    ///
    /// The input is split on `':'` with empty entries and duplicates
    /// preserved. Each entry is processed in input order:
    /// - an entry matching the exclusion pattern is dropped outright, even
    ///   if a classification pattern would also match it,
    /// - otherwise the first tag in priority order whose pattern matches
    ///   claims the entry; it is appended to that tag's bucket unless the
    ///   identical string is already there, and no further tags are tried
    ///   either way (a duplicate never falls through to a lower-priority
    ///   bucket),
    /// - an entry matching no tag is kept aside, in input order.
    ///
    /// The result concatenates the buckets in priority order, then the
    /// unclassified entries, and removes any string that already appeared
    /// earlier in the output.
    ///
    /// # Examples
    ///
    /// ```
    /// use pathtidy::{PathReorderer, RuleConfig};
    /// use std::collections::HashMap;
    ///
    /// let config = RuleConfig::from_toml_str(r#"
    /// tag_order = ["usr_local", "usr_bins"]
    /// [patterns]
    /// usr_bins  = '\A/usr/s?bin$'
    /// usr_local = '\A/usr/local/s?bin'
    /// "#).unwrap();
    /// let rules = config.compile(&HashMap::new()).unwrap();
    ///
    /// let reordered = PathReorderer::reorder(&rules, "/usr/bin:/usr/local/bin:/opt/other");
    /// assert_eq!(reordered, ["/usr/local/bin", "/usr/bin", "/opt/other"]);
    /// ```
    pub fn reorder(rules: &RuleSet, path_str: &str) -> Vec<String> {
        let order = rules.order();

        // Ordinal position of each tag's bucket.
        let index: HashMap<&str, usize> = order
            .iter()
            .enumerate()
            .map(|(i, tag)| (tag.as_str(), i))
            .collect();

        let mut buckets: Vec<Vec<&str>> = vec![Vec::new(); order.len()];
        let mut unclassified: Vec<&str> = Vec::new();

        for entry in path_str.split(':') {
            if rules.matches_exclusion(entry) {
                continue;
            }

            match rules.classify(entry) {
                Some(tag) => {
                    let bucket = &mut buckets[index[tag]];
                    if !bucket.contains(&entry) {
                        bucket.push(entry);
                    }
                }
                None => unclassified.push(entry),
            }
        }

        // Second dedup pass, this time across the whole output: the
        // per-bucket check above cannot see entries in other buckets or in
        // the unclassified tail. First occurrence wins.
        let mut seen: HashSet<&str> = HashSet::new();
        let mut result: Vec<String> = Vec::new();

        for entry in buckets.into_iter().flatten().chain(unclassified) {
            if seen.insert(entry) {
                result.push(entry.to_string());
            }
        }

        result
    }
}
