//! Dynamic query builders for the task table.
//!
//! Both builders track an ordered clause list, an ordered parameter
//! list, and an explicit placeholder counter, so numbering stays
//! contiguous no matter which subset of optional inputs is present.
//! Values are never spliced into the SQL text.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::Postgres;

use tareas_core::{Error, Result, TaskFilter, UpdateTaskFields};

use crate::escape_like;

/// Type-safe parameter binding for SQL queries.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    /// String parameter.
    String(String),
    /// Timestamp parameter.
    Timestamp(DateTime<Utc>),
    /// Boolean parameter.
    Bool(bool),
    /// 64-bit integer parameter.
    Int(i64),
}

/// Bind a parameter list onto a query in order.
pub(crate) fn bind_params<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &[QueryParam],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            QueryParam::String(v) => query.bind(v.clone()),
            QueryParam::Timestamp(v) => query.bind(*v),
            QueryParam::Bool(v) => query.bind(*v),
            QueryParam::Int(v) => query.bind(*v),
        };
    }
    query
}

/// Generates a parameterized WHERE fragment for task list filtering.
///
/// The fragment starts from an always-true base predicate so every
/// present filter can be appended uniformly with ` AND `, in this
/// fixed order: search, priority, date_from, date_to. Placeholder
/// indices are contiguous starting at `param_offset + 1`.
///
/// # Example
///
/// ```rust,ignore
/// use tareas_db::filter::TaskFilterQueryBuilder;
/// use tareas_core::TaskFilter;
///
/// let filter = TaskFilter {
///     search: Some("pan".into()),
///     ..Default::default()
/// };
/// let (sql, params) = TaskFilterQueryBuilder::new(filter, 0).build();
/// // sql: "TRUE AND description ILIKE $1 ESCAPE '\'"
/// // params: [QueryParam::String("%pan%")]
/// ```
pub struct TaskFilterQueryBuilder {
    filter: TaskFilter,
    param_offset: usize,
}

impl TaskFilterQueryBuilder {
    /// Create a new builder for the given filter.
    ///
    /// # Parameters
    ///
    /// * `filter` - The optional filter criteria
    /// * `param_offset` - Number of parameters already in the query
    pub fn new(filter: TaskFilter, param_offset: usize) -> Self {
        Self {
            filter,
            param_offset,
        }
    }

    /// Build the WHERE fragment.
    ///
    /// Returns a tuple of:
    /// - SQL fragment beginning with the always-true base predicate
    /// - Vector of query parameters in the order they appear
    ///
    /// An empty filter returns `("TRUE", [])`.
    pub fn build(&self) -> (String, Vec<QueryParam>) {
        let mut clauses = Vec::new();
        let mut params = Vec::new();
        let mut param_idx = self.param_offset;

        // Case-insensitive substring match on description. User-supplied
        // wildcard characters are escaped so they match literally.
        if let Some(search) = &self.filter.search {
            param_idx += 1;
            clauses.push(format!("description ILIKE ${} ESCAPE '\\'", param_idx));
            params.push(QueryParam::String(format!("%{}%", escape_like(search))));
        }

        // Exact priority match
        if let Some(priority) = self.filter.priority {
            param_idx += 1;
            clauses.push(format!("priority = ${}", param_idx));
            params.push(QueryParam::String(priority.as_str().to_string()));
        }

        // Inclusive lower bound on deadline
        if let Some(from) = self.filter.date_from {
            param_idx += 1;
            clauses.push(format!("deadline >= ${}", param_idx));
            params.push(QueryParam::Timestamp(from));
        }

        // Inclusive upper bound on deadline
        if let Some(to) = self.filter.date_to {
            param_idx += 1;
            clauses.push(format!("deadline <= ${}", param_idx));
            params.push(QueryParam::Timestamp(to));
        }

        let mut sql = String::from("TRUE");
        for clause in &clauses {
            sql.push_str(" AND ");
            sql.push_str(clause);
        }

        (sql, params)
    }

    /// Build the complete list query, newest first.
    pub fn build_list_query(&self) -> (String, Vec<QueryParam>) {
        let (fragment, params) = self.build();
        let sql = format!(
            "SELECT id, description, deadline, priority, completed, image_path, created_at \
             FROM task WHERE {} ORDER BY created_at DESC",
            fragment
        );
        (sql, params)
    }
}

/// Generates a parameterized UPDATE statement for a partial field set.
///
/// Only present fields produce a SET clause; the row id is always the
/// last parameter. Placeholder numbering is contiguous from `$1`.
pub struct UpdateQueryBuilder<'a> {
    fields: &'a UpdateTaskFields,
    image_path: Option<&'a str>,
}

impl<'a> UpdateQueryBuilder<'a> {
    /// Create a builder over the partial fields and optional new image
    /// reference.
    pub fn new(fields: &'a UpdateTaskFields, image_path: Option<&'a str>) -> Self {
        Self { fields, image_path }
    }

    /// Build the full UPDATE statement.
    ///
    /// Returns `Error::Validation` when neither a field nor an image
    /// path is present.
    pub fn build(&self, id: i64) -> Result<(String, Vec<QueryParam>)> {
        let mut sets = Vec::new();
        let mut params = Vec::new();
        let mut param_idx = 0usize;

        if let Some(description) = &self.fields.description {
            param_idx += 1;
            sets.push(format!("description = ${}", param_idx));
            params.push(QueryParam::String(description.clone()));
        }

        if let Some(deadline) = self.fields.deadline {
            param_idx += 1;
            sets.push(format!("deadline = ${}", param_idx));
            params.push(QueryParam::Timestamp(deadline));
        }

        if let Some(priority) = self.fields.priority {
            param_idx += 1;
            sets.push(format!("priority = ${}", param_idx));
            params.push(QueryParam::String(priority.as_str().to_string()));
        }

        if let Some(completed) = self.fields.completed {
            param_idx += 1;
            sets.push(format!("completed = ${}", param_idx));
            params.push(QueryParam::Bool(completed));
        }

        if let Some(image_path) = self.image_path {
            param_idx += 1;
            sets.push(format!("image_path = ${}", param_idx));
            params.push(QueryParam::String(image_path.to_string()));
        }

        if sets.is_empty() {
            return Err(Error::Validation("no fields to update".to_string()));
        }

        param_idx += 1;
        let sql = format!(
            "UPDATE task SET {} WHERE id = ${} \
             RETURNING id, description, deadline, priority, completed, image_path, created_at",
            sets.join(", "),
            param_idx
        );
        params.push(QueryParam::Int(id));

        Ok((sql, params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tareas_core::Priority;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn test_empty_filter_returns_true() {
        let builder = TaskFilterQueryBuilder::new(TaskFilter::default(), 0);
        let (sql, params) = builder.build();

        assert_eq!(sql, "TRUE");
        assert!(params.is_empty());
    }

    #[test]
    fn test_search_only() {
        let filter = TaskFilter {
            search: Some("pan".into()),
            ..Default::default()
        };
        let (sql, params) = TaskFilterQueryBuilder::new(filter, 0).build();

        assert_eq!(sql, "TRUE AND description ILIKE $1 ESCAPE '\\'");
        assert_eq!(params, vec![QueryParam::String("%pan%".into())]);
    }

    #[test]
    fn test_search_escapes_wildcards() {
        let filter = TaskFilter {
            search: Some("50%_done".into()),
            ..Default::default()
        };
        let (_, params) = TaskFilterQueryBuilder::new(filter, 0).build();

        assert_eq!(params, vec![QueryParam::String("%50\\%\\_done%".into())]);
    }

    #[test]
    fn test_date_to_alone_uses_placeholder_one() {
        let filter = TaskFilter {
            date_to: Some(ts("2026-03-01T00:00:00Z")),
            ..Default::default()
        };
        let (sql, params) = TaskFilterQueryBuilder::new(filter, 0).build();

        assert_eq!(sql, "TRUE AND deadline <= $1");
        assert_eq!(params.len(), 1);
        assert!(!sql.contains("$2"));
    }

    #[test]
    fn test_all_filters_fixed_order() {
        let filter = TaskFilter {
            search: Some("informe".into()),
            priority: Some(Priority::Alta),
            date_from: Some(ts("2026-01-01T00:00:00Z")),
            date_to: Some(ts("2026-02-01T00:00:00Z")),
        };
        let (sql, params) = TaskFilterQueryBuilder::new(filter, 0).build();

        assert_eq!(
            sql,
            "TRUE AND description ILIKE $1 ESCAPE '\\' AND priority = $2 \
             AND deadline >= $3 AND deadline <= $4"
        );
        assert_eq!(params.len(), 4);
        match &params[1] {
            QueryParam::String(p) => assert_eq!(p, "alta"),
            other => panic!("Expected String param, got {:?}", other),
        }
    }

    #[test]
    fn test_placeholders_contiguous_for_all_subsets() {
        let search = Some("x".to_string());
        let priority = Some(Priority::Media);
        let date_from = Some(ts("2026-01-01T00:00:00Z"));
        let date_to = Some(ts("2026-06-01T00:00:00Z"));

        for mask in 0u8..16 {
            let filter = TaskFilter {
                search: if mask & 1 != 0 { search.clone() } else { None },
                priority: if mask & 2 != 0 { priority } else { None },
                date_from: if mask & 4 != 0 { date_from } else { None },
                date_to: if mask & 8 != 0 { date_to } else { None },
            };
            let (sql, params) = TaskFilterQueryBuilder::new(filter, 0).build();

            let expected = mask.count_ones() as usize;
            assert_eq!(params.len(), expected, "mask {:#06b}", mask);
            for idx in 1..=expected {
                assert!(
                    sql.contains(&format!("${}", idx)),
                    "mask {:#06b}: missing ${} in {}",
                    mask,
                    idx,
                    sql
                );
            }
            assert!(
                !sql.contains(&format!("${}", expected + 1)),
                "mask {:#06b}: extra placeholder in {}",
                mask,
                sql
            );
        }
    }

    #[test]
    fn test_param_offset() {
        let filter = TaskFilter {
            priority: Some(Priority::Baja),
            ..Default::default()
        };
        let (sql, params) = TaskFilterQueryBuilder::new(filter, 5).build();

        assert_eq!(sql, "TRUE AND priority = $6");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_list_query_orders_by_created_at_desc() {
        let (sql, params) =
            TaskFilterQueryBuilder::new(TaskFilter::default(), 0).build_list_query();

        assert!(sql.starts_with("SELECT"));
        assert!(sql.ends_with("ORDER BY created_at DESC"));
        assert!(sql.contains("WHERE TRUE"));
        assert!(params.is_empty());
    }

    #[test]
    fn test_update_single_field() {
        let fields = UpdateTaskFields {
            completed: Some(true),
            ..Default::default()
        };
        let (sql, params) = UpdateQueryBuilder::new(&fields, None).build(9).unwrap();

        assert!(sql.starts_with("UPDATE task SET completed = $1 WHERE id = $2"));
        assert_eq!(
            params,
            vec![QueryParam::Bool(true), QueryParam::Int(9)]
        );
    }

    #[test]
    fn test_update_all_fields_and_image() {
        let fields = UpdateTaskFields {
            description: Some("nueva".into()),
            deadline: Some(ts("2026-05-01T12:00:00Z")),
            priority: Some(Priority::Alta),
            completed: Some(false),
        };
        let (sql, params) = UpdateQueryBuilder::new(&fields, Some("/images/n.png"))
            .build(3)
            .unwrap();

        assert!(sql.contains("description = $1"));
        assert!(sql.contains("deadline = $2"));
        assert!(sql.contains("priority = $3"));
        assert!(sql.contains("completed = $4"));
        assert!(sql.contains("image_path = $5"));
        assert!(sql.contains("WHERE id = $6"));
        assert_eq!(params.len(), 6);
        assert_eq!(params[5], QueryParam::Int(3));
    }

    #[test]
    fn test_update_image_only() {
        let fields = UpdateTaskFields::default();
        let (sql, params) = UpdateQueryBuilder::new(&fields, Some("/images/a.jpg"))
            .build(1)
            .unwrap();

        assert!(sql.contains("image_path = $1"));
        assert!(sql.contains("WHERE id = $2"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_update_no_fields_is_validation_error() {
        let fields = UpdateTaskFields::default();
        let err = UpdateQueryBuilder::new(&fields, None).build(1).unwrap_err();

        match err {
            Error::Validation(msg) => assert_eq!(msg, "no fields to update"),
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }
}
