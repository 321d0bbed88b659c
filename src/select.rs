//! Table selection
//!
//! Decides which discovered tables take part in a generation run and what
//! they are called in the generated output.

use std::collections::HashMap;

use tracing::{debug, error, trace};

use crate::error::GormliftError;
use crate::naming::{normalize, normalize_prefix, NamingStrategy};

/// Output names of an included table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputNames {
    /// Identifier the model is named after
    pub name: String,
    /// Base name of the generated files
    pub file: String,
}

/// Selection decision for one discovered table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub raw_name: String,
    /// `None` when the table is excluded
    pub output: Option<OutputNames>,
}

impl TableSpec {
    pub fn is_included(&self) -> bool {
        self.output.is_some()
    }
}

/// Allow/deny filtering bound to a table prefix
#[derive(Debug, Clone)]
pub struct TableSelector {
    prefix: String,
    /// Only include these tables (empty means all)
    include: Vec<String>,
    /// Never include these tables
    exclude: Vec<String>,
}

impl TableSelector {
    pub fn new(prefix: &str, include: Vec<String>, exclude: Vec<String>) -> Self {
        Self {
            prefix: normalize_prefix(prefix),
            include,
            exclude,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn is_denied(&self, table_name: &str) -> bool {
        self.exclude.iter().any(|t| t == table_name)
    }

    /// Check if a table should be included
    pub fn should_include(&self, table_name: &str) -> bool {
        if self.is_denied(table_name) {
            return false;
        }

        self.include.is_empty() || self.include.iter().any(|t| t == table_name)
    }

    /// Decide inclusion and output names for every discovered table, in order
    pub fn select(&self, all_tables: &[String]) -> Vec<TableSpec> {
        all_tables
            .iter()
            .map(|raw_name| {
                let output = self.should_include(raw_name).then(|| {
                    let name = normalize(raw_name, &self.prefix);
                    OutputNames {
                        file: name.clone(),
                        name,
                    }
                });
                trace!(table = ?raw_name, output = ?output, "Selected table");
                TableSpec {
                    raw_name: raw_name.clone(),
                    output,
                }
            })
            .collect()
    }

    /// Reject included tables whose output names are empty or collide
    pub fn check_conflicts(&self, specs: &[TableSpec]) -> Result<(), GormliftError> {
        let mut seen: HashMap<&str, &str> = HashMap::new();

        for spec in specs {
            let Some(output) = &spec.output else {
                continue;
            };

            if output.name.is_empty() {
                error!(table = ?spec.raw_name, prefix = ?self.prefix, "Table normalizes to an empty name");
                return Err(GormliftError::Naming(format!(
                    "table '{}' is empty after removing prefix '{}'",
                    spec.raw_name, self.prefix
                )));
            }

            if let Some(other) = seen.insert(output.name.as_str(), spec.raw_name.as_str()) {
                error!(first = ?other, second = ?spec.raw_name, name = ?output.name, "Output names collide");
                return Err(GormliftError::Naming(format!(
                    "tables '{}' and '{}' both generate '{}'",
                    other, spec.raw_name, output.name
                )));
            }
        }

        debug!(tables = ?seen.len(), "Output names are unique");
        Ok(())
    }
}

impl NamingStrategy for TableSelector {
    fn resolve_output_name(&self, table_name: &str) -> Option<String> {
        if self.is_denied(table_name) {
            return None;
        }
        Some(normalize(table_name, &self.prefix))
    }

    fn resolve_file_name(&self, table_name: &str) -> String {
        normalize(table_name, &self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::collection::vec;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn included(specs: &[TableSpec]) -> Vec<&str> {
        specs
            .iter()
            .filter(|s| s.is_included())
            .map(|s| s.raw_name.as_str())
            .collect()
    }

    #[test]
    fn test_select_all_with_deny_list() {
        let selector = TableSelector::new("app_", vec![], names(&["log_raw"]));
        let specs = selector.select(&names(&["app_user", "app_order", "log_raw"]));

        assert_eq!(included(&specs), vec!["app_user", "app_order"]);
        assert_eq!(specs[0].output.as_ref().unwrap().name, "user");
        assert_eq!(specs[1].output.as_ref().unwrap().file, "order");
        assert_eq!(specs[2].output, None);
    }

    #[test]
    fn test_select_allow_list_matches_raw_names() {
        let selector = TableSelector::new("app", names(&["app_user", "order"]), vec![]);
        let specs = selector.select(&names(&["app_user", "app_order", "log_raw"]));

        assert_eq!(included(&specs), vec!["app_user"]);
    }

    #[test]
    fn test_deny_beats_allow() {
        let selector = TableSelector::new("", names(&["users"]), names(&["users"]));
        let specs = selector.select(&names(&["users"]));

        assert!(included(&specs).is_empty());
        assert_eq!(selector.resolve_output_name("users"), None);
    }

    #[test]
    fn test_prefix_gets_separator_before_filtering() {
        let selector = TableSelector::new("app", vec![], vec![]);
        assert_eq!(selector.prefix(), "app_");

        let specs = selector.select(&names(&["appuser", "app_user"]));
        assert_eq!(specs[0].output.as_ref().unwrap().name, "appuser");
        assert_eq!(specs[1].output.as_ref().unwrap().name, "user");
    }

    #[test]
    fn test_naming_strategy() {
        let selector = TableSelector::new("app_", vec![], names(&["app_secret"]));

        assert_eq!(selector.resolve_output_name("app_user"), Some("user".to_string()));
        assert_eq!(selector.resolve_output_name("app_secret"), None);
        assert_eq!(selector.resolve_file_name("app_secret"), "secret");
    }

    #[test]
    fn test_check_conflicts_duplicate_names() {
        let selector = TableSelector::new("app_", vec![], vec![]);
        let specs = selector.select(&names(&["app_user", "user"]));

        let err = selector.check_conflicts(&specs).unwrap_err();
        assert!(err.to_string().contains("app_user"));
        assert!(err.to_string().contains("'user'"));
    }

    #[test]
    fn test_check_conflicts_empty_name() {
        let selector = TableSelector::new("app_", vec![], vec![]);
        let specs = selector.select(&names(&["app_"]));

        let err = selector.check_conflicts(&specs).unwrap_err();
        assert!(matches!(err, GormliftError::Naming(_)));
    }

    #[test]
    fn test_check_conflicts_ignores_excluded() {
        let selector = TableSelector::new("app_", vec![], names(&["user"]));
        let specs = selector.select(&names(&["app_user", "user"]));

        assert!(selector.check_conflicts(&specs).is_ok());
    }

    proptest! {
        #[test]
        fn prop_selection_matches_set_algebra(
            tables in vec("[a-d]{1,2}", 0..12),
            allow in vec("[a-d]{1,2}", 0..6),
            deny in vec("[a-d]{1,2}", 0..6),
        ) {
            let selector = TableSelector::new("", allow.clone(), deny.clone());
            let specs = selector.select(&tables);

            prop_assert_eq!(specs.len(), tables.len());

            let deny: HashSet<_> = deny.iter().collect();
            let allow: HashSet<_> = allow.iter().collect();
            for (spec, table) in specs.iter().zip(&tables) {
                prop_assert_eq!(&spec.raw_name, table);
                let expected = !deny.contains(table) && (allow.is_empty() || allow.contains(table));
                prop_assert_eq!(spec.is_included(), expected);
            }
        }
    }
}
