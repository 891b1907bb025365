//! Query and filter model
//!
//! A `Query` is a table plus a conjunction of conditions, an ordering and a
//! page window. The same value is evaluated in memory by the mock backend and
//! rendered into PostgREST query parameters by the REST backend, so both
//! implementations agree on what a filter selects.

use chrono::DateTime;
use rolodex_core::{Table, UserId};
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;

/// A raw table row as returned by the backend.
pub type Row = serde_json::Map<String, Value>;

/// Serialize any value into a JSON filter operand.
fn operand<T: Serialize>(value: T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// One predicate on a row.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq { column: String, value: Value },
    Neq { column: String, value: Value },
    In { column: String, values: Vec<Value> },
    NotIn { column: String, values: Vec<Value> },
    IsNull { column: String, is_null: bool },
    Lt { column: String, value: Value },
    Gte { column: String, value: Value },
    /// Case-insensitive substring match on any of `columns`.
    Search { columns: Vec<String>, term: String },
}

impl Condition {
    /// Evaluate against a row. Null/missing cells never satisfy a comparison,
    /// matching SQL three-valued logic.
    pub fn matches(&self, row: &Row) -> bool {
        let cell = |column: &str| row.get(column).filter(|v| !v.is_null());
        match self {
            Condition::Eq { column, value } => cell(column).is_some_and(|v| v == value),
            Condition::Neq { column, value } => cell(column).is_some_and(|v| v != value),
            Condition::In { column, values } => {
                cell(column).is_some_and(|v| values.contains(v))
            }
            Condition::NotIn { column, values } => {
                cell(column).is_some_and(|v| !values.contains(v))
            }
            Condition::IsNull { column, is_null } => cell(column).is_none() == *is_null,
            Condition::Lt { column, value } => cell(column)
                .is_some_and(|v| compare_values(v, value) == Some(Ordering::Less)),
            Condition::Gte { column, value } => cell(column).is_some_and(|v| {
                matches!(
                    compare_values(v, value),
                    Some(Ordering::Greater | Ordering::Equal)
                )
            }),
            Condition::Search { columns, term } => {
                let needle = term.to_lowercase();
                columns.iter().any(|c| {
                    cell(c)
                        .and_then(Value::as_str)
                        .is_some_and(|s| s.to_lowercase().contains(&needle))
                })
            }
        }
    }

    /// Render as a PostgREST `(key, value)` parameter.
    pub fn to_query_pair(&self) -> (String, String) {
        match self {
            Condition::Eq { column, value } => (column.clone(), format!("eq.{}", render(value))),
            Condition::Neq { column, value } => {
                (column.clone(), format!("neq.{}", render(value)))
            }
            Condition::In { column, values } => {
                (column.clone(), format!("in.({})", render_list(values)))
            }
            Condition::NotIn { column, values } => {
                (column.clone(), format!("not.in.({})", render_list(values)))
            }
            Condition::IsNull { column, is_null: true } => (column.clone(), "is.null".to_string()),
            Condition::IsNull { column, is_null: false } => {
                (column.clone(), "not.is.null".to_string())
            }
            Condition::Lt { column, value } => (column.clone(), format!("lt.{}", render(value))),
            Condition::Gte { column, value } => {
                (column.clone(), format!("gte.{}", render(value)))
            }
            Condition::Search { columns, term } => {
                let pattern = quote(&format!("*{}*", term));
                match columns.as_slice() {
                    [single] => (single.clone(), format!("ilike.{}", pattern)),
                    _ => {
                        let alternatives = columns
                            .iter()
                            .map(|c| format!("{}.ilike.{}", c, pattern))
                            .collect::<Vec<_>>()
                            .join(",");
                        ("or".to_string(), format!("({})", alternatives))
                    }
                }
            }
        }
    }
}

/// Quote a PostgREST operand if it contains reserved characters.
fn quote(raw: &str) -> String {
    if raw.contains([',', '(', ')', '"', '\\', ':']) || raw.contains(char::is_whitespace) {
        let escaped = raw.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{}\"", escaped)
    } else {
        raw.to_string()
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn render_list(values: &[Value]) -> String {
    values
        .iter()
        .map(|v| quote(&render(v)))
        .collect::<Vec<_>>()
        .join(",")
}

/// Order two JSON cells. Numbers compare numerically, strings lexically
/// (ISO dates and RFC 3339 timestamps sort correctly), booleans false < true.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(
            match (
                DateTime::parse_from_rfc3339(x),
                DateTime::parse_from_rfc3339(y),
            ) {
                // Fractional seconds vary in width, so compare instants.
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            },
        ),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Conjunction of conditions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every user-facing read starts here.
    pub fn owned_by(user_id: UserId) -> Self {
        Self::new().eq("user_id", user_id)
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn with(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn eq(self, column: &str, value: impl Serialize) -> Self {
        self.with(Condition::Eq {
            column: column.to_string(),
            value: operand(value),
        })
    }

    pub fn neq(self, column: &str, value: impl Serialize) -> Self {
        self.with(Condition::Neq {
            column: column.to_string(),
            value: operand(value),
        })
    }

    pub fn is_in<T: Serialize>(self, column: &str, values: impl IntoIterator<Item = T>) -> Self {
        self.with(Condition::In {
            column: column.to_string(),
            values: values.into_iter().map(operand).collect(),
        })
    }

    pub fn not_in<T: Serialize>(self, column: &str, values: impl IntoIterator<Item = T>) -> Self {
        self.with(Condition::NotIn {
            column: column.to_string(),
            values: values.into_iter().map(operand).collect(),
        })
    }

    pub fn is_null(self, column: &str) -> Self {
        self.with(Condition::IsNull {
            column: column.to_string(),
            is_null: true,
        })
    }

    pub fn not_null(self, column: &str) -> Self {
        self.with(Condition::IsNull {
            column: column.to_string(),
            is_null: false,
        })
    }

    pub fn lt(self, column: &str, value: impl Serialize) -> Self {
        self.with(Condition::Lt {
            column: column.to_string(),
            value: operand(value),
        })
    }

    pub fn gte(self, column: &str, value: impl Serialize) -> Self {
        self.with(Condition::Gte {
            column: column.to_string(),
            value: operand(value),
        })
    }

    pub fn search(self, columns: &[&str], term: &str) -> Self {
        self.with(Condition::Search {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            term: term.to_string(),
        })
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.conditions.iter().all(|c| c.matches(row))
    }

    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        self.conditions.iter().map(Condition::to_query_pair).collect()
    }
}

/// One ordering key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// A select against one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: Table,
    pub filter: Filter,
    pub order: Vec<Order>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl Query {
    pub fn table(table: Table) -> Self {
        Self {
            table,
            filter: Filter::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.order.push(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// PostgREST parameters, excluding `select`.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = self.filter.to_query_pairs();
        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(|o| format!("{}.{}", o.column, if o.ascending { "asc" } else { "desc" }))
                .collect::<Vec<_>>()
                .join(",");
            pairs.push(("order".to_string(), order));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset".to_string(), offset.to_string()));
        }
        pairs
    }

    /// Apply filter, ordering and window to an in-memory table.
    ///
    /// Nulls sort last ascending and first descending, like Postgres.
    pub fn apply<'a>(&self, rows: impl IntoIterator<Item = &'a Row>) -> Vec<Row> {
        let mut selected: Vec<Row> = rows
            .into_iter()
            .filter(|row| self.filter.matches(row))
            .cloned()
            .collect();

        if !self.order.is_empty() {
            selected.sort_by(|a, b| {
                for key in &self.order {
                    let left = a.get(&key.column).filter(|v| !v.is_null());
                    let right = b.get(&key.column).filter(|v| !v.is_null());
                    let ord = match (left, right) {
                        (None, None) => Ordering::Equal,
                        (None, Some(_)) => Ordering::Greater,
                        (Some(_), None) => Ordering::Less,
                        (Some(l), Some(r)) => compare_values(l, r).unwrap_or(Ordering::Equal),
                    };
                    let ord = if key.ascending { ord } else { ord.reverse() };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
        }

        selected
            .into_iter()
            .skip(self.offset.unwrap_or(0))
            .take(self.limit.unwrap_or(usize::MAX))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("test rows must be objects"),
        }
    }

    #[test]
    fn test_timestamps_compare_as_instants() {
        let short = json!("2026-01-01T10:00:00.5Z");
        let long = json!("2026-01-01T10:00:00.123456Z");
        assert_eq!(compare_values(&short, &long), Some(Ordering::Greater));
        assert_eq!(
            compare_values(&json!("2001-01-01"), &json!("2026-10-19")),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn test_eq_and_owner_filter() {
        let owner = Uuid::now_v7();
        let r = row(json!({"user_id": owner, "first_name": "Ada"}));
        assert!(Filter::owned_by(owner).matches(&r));
        assert!(!Filter::owned_by(Uuid::now_v7()).matches(&r));
        assert!(Filter::owned_by(owner).eq("first_name", "Ada").matches(&r));
    }

    #[test]
    fn test_null_cells_never_compare() {
        let r = row(json!({"due_date": null}));
        assert!(!Filter::new().lt("due_date", "2024-01-01").matches(&r));
        assert!(!Filter::new().neq("due_date", "2024-01-01").matches(&r));
        assert!(Filter::new().is_null("due_date").matches(&r));
        assert!(Filter::new().is_null("missing").matches(&r));
        assert!(!Filter::new().not_null("due_date").matches(&r));
    }

    #[test]
    fn test_in_and_not_in() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        let r = row(json!({"id": a}));
        assert!(Filter::new().is_in("id", [a, b]).matches(&r));
        assert!(!Filter::new().not_in("id", [a]).matches(&r));
        assert!(Filter::new().not_in("id", [b]).matches(&r));
        assert!(Filter::new().not_in("id", Vec::<Uuid>::new()).matches(&r));
    }

    #[test]
    fn test_search_is_case_insensitive_across_columns() {
        let r = row(json!({"first_name": "Grace", "surname": "Hopper", "email": null}));
        let f = |t: &str| Filter::new().search(&["first_name", "surname", "email"], t);
        assert!(f("hop").matches(&r));
        assert!(f("GRA").matches(&r));
        assert!(!f("lovelace").matches(&r));
    }

    #[test]
    fn test_date_comparison() {
        let r = row(json!({"due_date": "2024-05-09"}));
        assert!(Filter::new().lt("due_date", "2024-05-10").matches(&r));
        assert!(Filter::new().gte("due_date", "2024-05-09").matches(&r));
        assert!(!Filter::new().gte("due_date", "2024-05-10").matches(&r));
    }

    #[test]
    fn test_query_pairs() {
        let id = Uuid::nil();
        let query = Query::table(Table::Contacts)
            .filter(
                Filter::owned_by(id)
                    .eq("is_favourite", true)
                    .not_in("id", ["a", "b"])
                    .search(&["first_name", "surname"], "ann"),
            )
            .order_by("surname", true)
            .order_by("created_at", false)
            .limit(10)
            .offset(20);

        let pairs = query.to_query_pairs();
        let get = |k: &str| {
            pairs
                .iter()
                .find(|(key, _)| key == k)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("user_id"), Some("eq.00000000-0000-0000-0000-000000000000"));
        assert_eq!(get("is_favourite"), Some("eq.true"));
        assert_eq!(get("id"), Some("not.in.(a,b)"));
        assert_eq!(
            get("or"),
            Some("(first_name.ilike.*ann*,surname.ilike.*ann*)")
        );
        assert_eq!(get("order"), Some("surname.asc,created_at.desc"));
        assert_eq!(get("limit"), Some("10"));
        assert_eq!(get("offset"), Some("20"));
    }

    #[test]
    fn test_reserved_characters_are_quoted() {
        let pair = Filter::new().search(&["name"], "a,b").to_query_pairs();
        assert_eq!(pair[0], ("name".to_string(), "ilike.\"*a,b*\"".to_string()));
    }

    #[test]
    fn test_apply_orders_and_pages() {
        let rows: Vec<Row> = ["c", "a", "b", "d"]
            .iter()
            .map(|n| row(json!({"name": n})))
            .collect();
        let out = Query::table(Table::Tags)
            .order_by("name", true)
            .offset(1)
            .limit(2)
            .apply(&rows);
        let names: Vec<&str> = out.iter().filter_map(|r| r["name"].as_str()).collect();
        assert_eq!(names, vec!["b", "c"]);
    }

    #[test]
    fn test_apply_nulls_last_ascending() {
        let rows = vec![
            row(json!({"due_date": null})),
            row(json!({"due_date": "2024-01-02"})),
            row(json!({"due_date": "2024-01-01"})),
        ];
        let out = Query::table(Table::Tasks)
            .order_by("due_date", true)
            .apply(&rows);
        assert_eq!(out[0]["due_date"], "2024-01-01");
        assert!(out[2]["due_date"].is_null());
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// A filter conjunction matches exactly when every condition does.
        #[test]
        fn prop_filter_is_conjunction(a in 0i64..10, b in 0i64..10, x in 0i64..10, y in 0i64..10) {
            let r = match json!({"a": a, "b": b}) { Value::Object(m) => m, _ => unreachable!() };
            let f = Filter::new().eq("a", x).eq("b", y);
            prop_assert_eq!(f.matches(&r), a == x && b == y);
        }

        /// `apply` never returns more rows than the limit, and every row matches.
        #[test]
        fn prop_apply_respects_limit(values in prop::collection::vec(0i64..5, 0..30), limit in 0usize..10) {
            let rows: Vec<Row> = values
                .iter()
                .map(|v| match json!({"v": v}) { Value::Object(m) => m, _ => unreachable!() })
                .collect();
            let query = Query::table(Table::Contacts)
                .filter(Filter::new().gte("v", 2))
                .limit(limit);
            let out = query.apply(&rows);
            prop_assert!(out.len() <= limit);
            prop_assert!(out.iter().all(|r| query.filter.matches(r)));
        }
    }
}
