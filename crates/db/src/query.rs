//! Parameterized statement composition for list and count queries.
//!
//! A filter is expressed as an ordered list of [`Predicate`]s. The composer
//! walks that list once, assigning placeholder numbers from a single counter
//! (the length of the value list), so the fetch and count statements built
//! from the same predicates always filter identically. Sort columns come only
//! from a [`SortOrder`], which can only be built from an allow-list.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use sqlx::postgres::PgArguments;
use sqlx::query::QueryScalar;
use sqlx::Postgres;
use storefront_core::listing::{PageWindow, SortOrder};

use crate::error::QueryBuildError;

// ---------------------------------------------------------------------------
// Values and predicates
// ---------------------------------------------------------------------------

/// Value bound to a positional placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    BigInt(i64),
    Text(String),
    Date(NaiveDate),
}

/// One optional filter clause. Columns are trusted SQL expressions supplied by
/// repositories; only values travel as placeholders.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column = $n`
    Eq {
        column: &'static str,
        value: BindValue,
    },
    /// Case-insensitive substring match against any of `columns`.
    ContainsAny {
        columns: &'static [&'static str],
        term: String,
    },
    /// `column::date >= $n`
    OnOrAfter {
        column: &'static str,
        day: NaiveDate,
    },
    /// `column::date <= $n`
    OnOrBefore {
        column: &'static str,
        day: NaiveDate,
    },
}

/// Final SQL text plus the values for its placeholders, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub values: Vec<BindValue>,
}

impl Statement {
    /// Pair `sql` with `values`, checking that the statement uses exactly the
    /// placeholders `$1..=$n` for `n = values.len()`.
    pub fn new(sql: String, values: Vec<BindValue>) -> Result<Self, QueryBuildError> {
        let used = placeholder_indices(&sql);
        let contiguous = used.iter().copied().eq(1..=used.len());
        if !contiguous || used.len() != values.len() {
            return Err(QueryBuildError::PlaceholderMismatch {
                placeholders: used.len(),
                values: values.len(),
            });
        }
        Ok(Self { sql, values })
    }
}

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Params {
    values: Vec<BindValue>,
}

impl Params {
    fn push(&mut self, value: BindValue) -> String {
        self.values.push(value);
        format!("${}", self.values.len())
    }

    fn where_clause(&mut self, predicates: &[Predicate]) -> String {
        let conditions: Vec<String> = predicates.iter().map(|p| self.condition(p)).collect();
        if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        }
    }

    fn condition(&mut self, predicate: &Predicate) -> String {
        match predicate {
            Predicate::Eq { column, value } => {
                format!("{column} = {}", self.push(value.clone()))
            }
            Predicate::ContainsAny { columns, term } => {
                let pattern = like_pattern(term);
                let clauses: Vec<String> = columns
                    .iter()
                    .map(|column| {
                        format!(
                            "LOWER({column}) LIKE {}",
                            self.push(BindValue::Text(pattern.clone()))
                        )
                    })
                    .collect();
                format!("({})", clauses.join(" OR "))
            }
            Predicate::OnOrAfter { column, day } => {
                format!("{column}::date >= {}", self.push(BindValue::Date(*day)))
            }
            Predicate::OnOrBefore { column, day } => {
                format!("{column}::date <= {}", self.push(BindValue::Date(*day)))
            }
        }
    }
}

/// Build the page-fetch statement.
///
/// `base` is a row-level `SELECT ... FROM ...` without a `WHERE` clause. The
/// page of rows it yields is folded into one JSON array document, `[]` when
/// nothing matches.
pub fn compose_fetch(
    base: &str,
    predicates: &[Predicate],
    sort: &SortOrder,
    window: &PageWindow,
) -> Result<Statement, QueryBuildError> {
    let mut params = Params::default();
    let where_clause = params.where_clause(predicates);
    let offset = params.push(BindValue::BigInt(window.offset()));
    let limit = params.push(BindValue::BigInt(window.limit));

    let sql = format!(
        "SELECT COALESCE(json_agg(\"t\"), '[]'::json) FROM (\
         {base}{where_clause} \
         ORDER BY {} \
         OFFSET {offset} LIMIT {limit}\
         ) AS \"t\"",
        sort.to_sql(),
    );
    Statement::new(sql, params.values)
}

/// Build the count statement for the same predicates.
///
/// `base` is a `SELECT COUNT(*) ... FROM ...` without a `WHERE` clause.
pub fn compose_count(base: &str, predicates: &[Predicate]) -> Result<Statement, QueryBuildError> {
    let mut params = Params::default();
    let where_clause = params.where_clause(predicates);
    Statement::new(format!("{base}{where_clause}"), params.values)
}

/// Lowercased `%term%` with LIKE wildcards in the term escaped.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.to_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// Distinct `$n` placeholder indices used in `sql`, ignoring quoted literals.
fn placeholder_indices(sql: &str) -> BTreeSet<usize> {
    let mut used = BTreeSet::new();
    let mut in_literal = false;
    let mut chars = sql.char_indices().peekable();

    while let Some((_, ch)) = chars.next() {
        match ch {
            '\'' => in_literal = !in_literal,
            '$' if !in_literal => {
                let mut digits = String::new();
                while let Some((_, d)) = chars.peek().copied() {
                    if !d.is_ascii_digit() {
                        break;
                    }
                    digits.push(d);
                    chars.next();
                }
                if let Ok(index) = digits.parse::<usize>() {
                    used.insert(index);
                }
            }
            _ => {}
        }
    }
    used
}

// ---------------------------------------------------------------------------
// Binding
// ---------------------------------------------------------------------------

/// Bind a statement's values, in order, onto a sqlx `QueryScalar`.
pub fn bind_values<'q, O>(
    mut q: QueryScalar<'q, Postgres, O, PgArguments>,
    values: &'q [BindValue],
) -> QueryScalar<'q, Postgres, O, PgArguments> {
    for value in values {
        match value {
            BindValue::BigInt(v) => q = q.bind(*v),
            BindValue::Text(v) => q = q.bind(v.as_str()),
            BindValue::Date(v) => q = q.bind(*v),
        }
    }
    q
}
