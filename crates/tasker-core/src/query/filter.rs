//! Typed filter predicates compiled to parameterized SQL.
//!
//! Predicates are AND-ed. Every value is bound as a parameter; only alias
//! names and column names are formatted into the SQL text.

use rusqlite::types::Value;
use std::fmt::Write as _;
use std::num::ParseIntError;

use crate::model::{ParseEnumError, Priority, Status};

/// A single filter condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Status(Status),
    Priority(Priority),
    ProjectId(i64),
    /// Exact (case-sensitive) tag name.
    TagName(String),
}

/// Rejected value for a known filter key.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("invalid status filter: {0}")]
    Status(#[source] ParseEnumError),

    #[error("invalid priority filter: {0}")]
    Priority(#[source] ParseEnumError),

    #[error("invalid project_id filter '{value}': {source}")]
    ProjectId {
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("tag_name filter must not be blank")]
    BlankTag,
}

/// An ordered list of predicates, all of which must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    predicates: Vec<Predicate>,
}

/// SQL fragments produced by [`TaskFilter::to_sql`].
///
/// `joins` and `where_clause` are meant to follow `FROM tasks t`; `params`
/// bind to `?1..?N` in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSql {
    pub joins: String,
    pub conditions: Vec<String>,
    pub params: Vec<Value>,
}

impl FilterSql {
    #[must_use]
    pub fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }
}

impl TaskFilter {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            predicates: Vec::new(),
        }
    }

    #[must_use]
    pub fn status(mut self, status: Status) -> Self {
        self.predicates.push(Predicate::Status(status));
        self
    }

    #[must_use]
    pub fn priority(mut self, priority: Priority) -> Self {
        self.predicates.push(Predicate::Priority(priority));
        self
    }

    #[must_use]
    pub fn project(mut self, project_id: i64) -> Self {
        self.predicates.push(Predicate::ProjectId(project_id));
        self
    }

    #[must_use]
    pub fn tag(mut self, name: impl Into<String>) -> Self {
        self.predicates.push(Predicate::TagName(name.into()));
        self
    }

    pub fn push(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    #[must_use]
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Build a filter from loose key/value pairs.
    ///
    /// Recognized keys are `status`, `priority`, `project_id` and `tag_name`;
    /// anything else is ignored. A recognized key with an unparsable value is
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError`] for the first value that fails to parse.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut filter = Self::new();
        for (key, value) in pairs {
            let value = value.as_ref();
            let predicate = match key.as_ref() {
                "status" => Predicate::Status(value.parse().map_err(FilterError::Status)?),
                "priority" => Predicate::Priority(value.parse().map_err(FilterError::Priority)?),
                "project_id" => Predicate::ProjectId(value.trim().parse().map_err(|source| {
                    FilterError::ProjectId {
                        value: value.to_owned(),
                        source,
                    }
                })?),
                "tag_name" => {
                    if value.trim().is_empty() {
                        return Err(FilterError::BlankTag);
                    }
                    Predicate::TagName(value.to_owned())
                }
                _ => continue,
            };
            filter.push(predicate);
        }
        Ok(filter)
    }

    /// Compile the predicates for a query over `tasks t`.
    #[must_use]
    pub fn to_sql(&self) -> FilterSql {
        let mut sql = FilterSql::default();

        for (idx, predicate) in self.predicates.iter().enumerate() {
            match predicate {
                Predicate::Status(status) => {
                    sql.params.push(Value::Text(status.as_str().to_owned()));
                    sql.conditions.push(format!("t.status = ?{}", sql.params.len()));
                }
                Predicate::Priority(priority) => {
                    sql.params.push(Value::Text(priority.as_str().to_owned()));
                    sql.conditions
                        .push(format!("t.priority = ?{}", sql.params.len()));
                }
                Predicate::ProjectId(project_id) => {
                    sql.params.push(Value::Integer(*project_id));
                    sql.conditions
                        .push(format!("t.project_id = ?{}", sql.params.len()));
                }
                Predicate::TagName(name) => {
                    sql.params.push(Value::Text(name.clone()));
                    let _ = write!(
                        sql.joins,
                        " INNER JOIN task_tags tt{idx} ON tt{idx}.task_id = t.id \
                         INNER JOIN tags g{idx} ON g{idx}.id = tt{idx}.tag_id AND g{idx}.name = ?{}",
                        sql.params.len()
                    );
                }
            }
        }

        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_compiles_to_nothing() {
        let sql = TaskFilter::new().to_sql();
        assert!(sql.joins.is_empty());
        assert!(sql.where_clause().is_empty());
        assert!(sql.params.is_empty());
    }

    #[test]
    fn scalar_predicates_bind_in_order() {
        let sql = TaskFilter::new()
            .status(Status::Pending)
            .priority(Priority::High)
            .project(4)
            .to_sql();

        assert_eq!(
            sql.where_clause(),
            " WHERE t.status = ?1 AND t.priority = ?2 AND t.project_id = ?3"
        );
        assert_eq!(
            sql.params,
            vec![
                Value::Text("pending".into()),
                Value::Text("high".into()),
                Value::Integer(4)
            ]
        );
    }

    #[test]
    fn each_tag_predicate_gets_its_own_join_alias() {
        let sql = TaskFilter::new()
            .tag("home")
            .status(Status::Blocked)
            .tag("errand")
            .to_sql();

        assert!(sql.joins.contains("tt0.task_id = t.id"));
        assert!(sql.joins.contains("g0.name = ?1"));
        assert!(sql.joins.contains("g2.name = ?3"));
        assert_eq!(sql.where_clause(), " WHERE t.status = ?2");
        assert_eq!(sql.params.len(), 3);
    }

    #[test]
    fn tag_values_are_bound_not_inlined() {
        let sql = TaskFilter::new().tag("x'; DROP TABLE tasks; --").to_sql();
        assert!(!sql.joins.contains("DROP"));
        assert_eq!(sql.params, vec![Value::Text("x'; DROP TABLE tasks; --".into())]);
    }

    #[test]
    fn from_pairs_ignores_unknown_keys() {
        let filter = TaskFilter::from_pairs([
            ("status", "in_progress"),
            ("color", "blue"),
            ("priority", "LOW"),
            ("project_id", " 12 "),
            ("tag_name", "work"),
        ])
        .expect("valid pairs");

        assert_eq!(
            filter.predicates(),
            &[
                Predicate::Status(Status::InProgress),
                Predicate::Priority(Priority::Low),
                Predicate::ProjectId(12),
                Predicate::TagName("work".into()),
            ]
        );
    }

    #[test]
    fn from_pairs_rejects_bad_values_for_known_keys() {
        assert!(matches!(
            TaskFilter::from_pairs([("status", "done")]),
            Err(FilterError::Status(_))
        ));
        assert!(matches!(
            TaskFilter::from_pairs([("priority", "urgent")]),
            Err(FilterError::Priority(_))
        ));
        assert!(matches!(
            TaskFilter::from_pairs([("project_id", "abc")]),
            Err(FilterError::ProjectId { .. })
        ));
        assert_eq!(
            TaskFilter::from_pairs([("tag_name", " ")]),
            Err(FilterError::BlankTag)
        );
    }

    #[test]
    fn from_pairs_with_only_unknown_keys_is_empty() {
        let filter = TaskFilter::from_pairs(Vec::<(String, String)>::new()).expect("empty");
        assert!(filter.is_empty());
        let filter = TaskFilter::from_pairs([("assignee", "me")]).expect("ignored");
        assert!(filter.is_empty());
    }
}
