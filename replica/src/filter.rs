use std::collections::HashMap;
use std::sync::RwLock;

use regex::Regex;

use common::config::ReplicaConfig;
use common::err::replica_error::ReError;
use common::err::CResult;

/// Include/exclude regex lists matched against `schema.table`, with a
/// verdict cache so each table is judged once.
#[derive(Debug)]
pub struct TableFilter {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
    cache: RwLock<HashMap<String, bool>>,
}

impl TableFilter {
    /// `None` when no filter is configured: everything matches and the
    /// rows fast path stays uninstalled.
    pub fn from_config(config: &ReplicaConfig) -> CResult<Option<TableFilter>> {
        if config.include_table_regex.is_empty() && config.exclude_table_regex.is_empty() {
            return Ok(None);
        }

        let compile = |patterns: &[String]| -> CResult<Vec<Regex>> {
            patterns
                .iter()
                .map(|p| {
                    Regex::new(p)
                        .map_err(|e| ReError::ConfigError(format!("bad table regex {}: {}", p, e)))
                })
                .collect()
        };

        Ok(Some(TableFilter {
            include: compile(&config.include_table_regex)?,
            exclude: compile(&config.exclude_table_regex)?,
            cache: RwLock::new(HashMap::new()),
        }))
    }

    /// Should rows of `schema.table` be decoded and dispatched.
    pub fn matches(&self, key: &str) -> bool {
        if let Some(&hit) = self.cache.read().unwrap().get(key) {
            return hit;
        }

        let mut matched = if self.include.is_empty() {
            true
        } else {
            self.include.iter().any(|r| r.is_match(key))
        };
        if matched && self.exclude.iter().any(|r| r.is_match(key)) {
            matched = false;
        }

        self.cache.write().unwrap().insert(key.to_string(), matched);
        matched
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn filter(include: &[&str], exclude: &[&str]) -> TableFilter {
        let config = ReplicaConfig {
            include_table_regex: include.iter().map(|s| s.to_string()).collect(),
            exclude_table_regex: exclude.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        };
        TableFilter::from_config(&config).unwrap().unwrap()
    }

    #[test]
    fn no_filter_configured() {
        let config = ReplicaConfig::default();
        assert!(TableFilter::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn include_then_exclude() {
        let f = filter(&["^shop\\..*"], &["^shop\\.audit_.*"]);
        assert!(f.matches("shop.orders"));
        assert!(!f.matches("shop.audit_log"));
        assert!(!f.matches("other.orders"));
        // cached verdicts agree
        assert!(f.matches("shop.orders"));
    }

    #[test]
    fn exclude_only() {
        let f = filter(&[], &["^mysql\\..*"]);
        assert!(f.matches("shop.orders"));
        assert!(!f.matches("mysql.user"));
    }

    #[test]
    fn bad_pattern_is_config_error() {
        let config = ReplicaConfig {
            include_table_regex: vec!["(".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            TableFilter::from_config(&config),
            Err(ReError::ConfigError(_))
        ));
    }
}
