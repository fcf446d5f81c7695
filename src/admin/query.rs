//! Builds the listing statements for an administered table.
//!
//! Everything here is pure: a [`ModelAdmin`] plus request parameters in,
//! a pair of SeaQuery statements (page rows and total count) out.

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use sea_orm::sea_query::{
    Alias, Asterisk, Condition, Expr, Func, LikeExpr, Order, Query, SelectStatement, SimpleExpr,
};
use std::collections::{BTreeMap, HashMap};

use super::registry::{self, FilterKind, ModelAdmin};
use crate::errors::{AppError, AppResult};
use crate::types::PaginationParams;

const SEARCH_PARAM: &str = "q";
const ORDER_PARAM: &str = "o";
const PAGE_PARAM: &str = "page";
const PER_PAGE_PARAM: &str = "per_page";

/// Listing request: search text, filters, ordering and page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdminQuery {
    pub search: Option<String>,
    /// Display field, `-` prefix for descending
    pub order: Option<String>,
    pub filters: BTreeMap<String, String>,
    pub pagination: PaginationParams,
}

impl AdminQuery {
    /// Split raw query-string pairs into reserved parameters and filters.
    pub fn from_params(mut params: HashMap<String, String>) -> AppResult<Self> {
        let number = |value: Option<String>, default: u64, name: &str| -> AppResult<u64> {
            match value {
                None => Ok(default),
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|_| AppError::BadRequest(format!("'{}' must be a number", name))),
            }
        };

        let defaults = PaginationParams::default();
        let pagination = PaginationParams::new(
            number(params.remove(PAGE_PARAM), defaults.page, PAGE_PARAM)?,
            number(params.remove(PER_PAGE_PARAM), defaults.per_page, PER_PAGE_PARAM)?,
        );
        let search = params
            .remove(SEARCH_PARAM)
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty());
        let order = params
            .remove(ORDER_PARAM)
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty());

        Ok(Self {
            search,
            order,
            filters: params.into_iter().collect(),
            pagination,
        })
    }
}

/// Statements for one listing page
#[derive(Debug, Clone)]
pub struct Listing {
    pub rows: SelectStatement,
    pub count: SelectStatement,
}

/// Build the page and count statements for `model`.
pub fn build(model: &ModelAdmin, query: &AdminQuery) -> AppResult<Listing> {
    let table = Alias::new(model.table);
    let mut condition = Condition::all();

    if let Some(text) = &query.search {
        condition = condition.add(search_condition(model, text)?);
    }
    for (field, value) in &query.filters {
        condition = condition.add(filter_expr(model, field, value)?);
    }

    let mut rows = Query::select();
    rows.column((table.clone(), Alias::new("id")));
    for field in model.list_display {
        rows.expr_as(
            Expr::col((table.clone(), Alias::new(model.column(field)))),
            Alias::new(*field),
        );
    }
    rows.from(table.clone()).cond_where(condition.clone());

    for (column, order) in ordering(model, query.order.as_deref())? {
        rows.order_by((table.clone(), Alias::new(column)), order);
    }
    rows.order_by((table.clone(), Alias::new("id")), Order::Asc)
        .limit(query.pagination.limit())
        .offset(query.pagination.offset());

    let mut count = Query::select();
    count
        .expr_as(Expr::col(Asterisk).count(), Alias::new("count"))
        .from(table)
        .cond_where(condition);

    Ok(Listing { rows, count })
}

/// Every term must match at least one search field.
fn search_condition(model: &ModelAdmin, text: &str) -> AppResult<Condition> {
    if model.search_fields.is_empty() {
        return Err(AppError::BadRequest(format!(
            "{} cannot be searched",
            model.label
        )));
    }

    let mut all = Condition::all();
    for term in text.split_whitespace() {
        let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
        let mut any = Condition::any();
        for path in model.search_fields {
            any = any.add(search_expr(model, path, &pattern)?);
        }
        all = all.add(any);
    }
    Ok(all)
}

/// `LOWER(col) LIKE pattern`, following `relation__field` paths through
/// `fk IN (SELECT id FROM target WHERE ...)` subqueries.
fn search_expr(model: &ModelAdmin, path: &str, pattern: &str) -> AppResult<SimpleExpr> {
    let table = Alias::new(model.table);
    match path.split_once("__") {
        None => Ok(Expr::expr(Func::lower(Expr::col((table, Alias::new(path)))))
            .like(LikeExpr::new(pattern).escape('\\'))),
        Some((hop, rest)) => {
            let relation = model
                .relation(hop)
                .ok_or_else(|| {
                    AppError::internal(format!("{}: unknown relation {}", model.name, hop))
                })?;
            let target = registry::for_table(relation.target).ok_or_else(|| {
                AppError::internal(format!(
                    "{}: unregistered table {}",
                    model.name, relation.target
                ))
            })?;
            let inner = search_expr(target, rest, pattern)?;
            let target_table = Alias::new(target.table);
            let subquery = Query::select()
                .column((target_table.clone(), Alias::new("id")))
                .from(target_table)
                .and_where(inner)
                .to_owned();
            Ok(Expr::col((table, Alias::new(relation.column))).in_subquery(subquery))
        }
    }
}

fn filter_expr(model: &ModelAdmin, field: &str, value: &str) -> AppResult<SimpleExpr> {
    let filter = model.filter(field).ok_or_else(|| {
        AppError::BadRequest(format!("{} cannot be filtered by '{}'", model.label, field))
    })?;
    let column = Expr::col((Alias::new(model.table), Alias::new(model.column(field))));
    let value = value.trim();

    match filter.kind {
        FilterKind::Choice(allowed) => {
            if !allowed().contains(&value) {
                return Err(AppError::BadRequest(format!(
                    "Invalid value '{}' for {}",
                    value, field
                )));
            }
            Ok(column.eq(value))
        }
        FilterKind::Boolean => {
            let flag = match value {
                "true" | "1" => true,
                "false" | "0" => false,
                other => {
                    return Err(AppError::BadRequest(format!(
                        "'{}' expects true or false, got '{}'",
                        field, other
                    )))
                }
            };
            Ok(column.eq(flag))
        }
        FilterKind::Date => {
            let day = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
                AppError::BadRequest(format!("'{}' expects a YYYY-MM-DD date", field))
            })?;
            let start = Utc.from_utc_datetime(&day.and_time(chrono::NaiveTime::MIN));
            let end = start + Duration::days(1);
            Ok(column.clone().gte(start).and(column.lt(end)))
        }
        FilterKind::Text => Ok(column.eq(value)),
    }
}

/// Requested ordering, else the configured default.
fn ordering(model: &ModelAdmin, requested: Option<&str>) -> AppResult<Vec<(&'static str, Order)>> {
    let parse = |field: &str| -> (String, Order) {
        match field.strip_prefix('-') {
            Some(name) => (name.to_string(), Order::Desc),
            None => (field.to_string(), Order::Asc),
        }
    };

    match requested {
        Some(field) => {
            let (name, order) = parse(field);
            if !model.list_display.contains(&name.as_str()) {
                return Err(AppError::BadRequest(format!(
                    "{} cannot be ordered by '{}'",
                    model.label, name
                )));
            }
            Ok(vec![(model.column(&name), order)])
        }
        None => Ok(model
            .ordering
            .iter()
            .map(|field| {
                let (name, order) = parse(field);
                (model.column(&name), order)
            })
            .collect()),
    }
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::sea_query::PostgresQueryBuilder;

    fn listing(model: &str, query: AdminQuery) -> (String, String) {
        let model = registry::find(model).unwrap();
        let listing = build(model, &query).unwrap();
        (
            listing.rows.to_string(PostgresQueryBuilder),
            listing.count.to_string(PostgresQueryBuilder),
        )
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_reserved_params_are_split_from_filters() {
        let query = AdminQuery::from_params(params(&[
            ("q", "  solar "),
            ("o", "-title"),
            ("page", "2"),
            ("status", "active"),
        ]))
        .unwrap();

        assert_eq!(query.search.as_deref(), Some("solar"));
        assert_eq!(query.order.as_deref(), Some("-title"));
        assert_eq!(query.pagination.page, 2);
        assert_eq!(query.filters.get("status").map(String::as_str), Some("active"));
        assert_eq!(query.filters.len(), 1);
    }

    #[test]
    fn test_non_numeric_page_is_rejected() {
        let result = AdminQuery::from_params(params(&[("page", "two")]));
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_default_listing_uses_display_columns_and_ordering() {
        let (rows, count) = listing("projects", AdminQuery::default());

        assert!(rows.contains(r#""projects"."proponent_id" AS "proponent""#));
        assert!(rows.contains(r#""projects"."title" AS "title""#));
        assert!(rows.contains(r#"ORDER BY "projects"."created_at" DESC, "projects"."id" ASC"#));
        assert!(rows.contains("LIMIT 20"));
        assert!(count.contains(r#"COUNT(*) AS "count""#));
        assert!(!count.contains("LIMIT"));
    }

    #[test]
    fn test_search_matches_any_field_for_every_term() {
        let query = AdminQuery {
            search: Some("Ann Lee".into()),
            ..Default::default()
        };
        let (rows, count) = listing("users", query);

        assert!(rows.contains(r#"LOWER("users"."username") LIKE '%ann%'"#));
        assert!(rows.contains(r#"LOWER("users"."last_name") LIKE '%lee%'"#));
        assert!(rows.contains(" OR "));
        assert!(rows.contains(" AND "));
        assert!(count.contains(r#"LOWER("users"."email") LIKE '%ann%'"#));
    }

    #[test]
    fn test_related_search_uses_nested_subqueries() {
        let query = AdminQuery {
            search: Some("alice".into()),
            ..Default::default()
        };
        let (rows, _) = listing("credit_holdings", query);

        assert!(rows.contains(
            r#""credit_holdings"."wallet_id" IN (SELECT "credit_wallets"."id" FROM "credit_wallets" WHERE "credit_wallets"."user_id" IN (SELECT "users"."id" FROM "users" WHERE LOWER("users"."username") LIKE '%alice%'"#
        ));
        assert!(rows.contains(r#""credit_holdings"."project_id" IN (SELECT "projects"."id""#));
    }

    #[test]
    fn test_like_wildcards_in_terms_are_escaped() {
        assert_eq!(escape_like("50%_off"), r"50\%\_off");
    }

    #[test]
    fn test_choice_filter_checks_allowed_values() {
        let model = registry::find("transactions").unwrap();
        let mut query = AdminQuery::default();
        query.filters.insert("status".into(), "completed".into());
        let sql = build(model, &query).unwrap().rows.to_string(PostgresQueryBuilder);
        assert!(sql.contains(r#""transactions"."status" = 'completed'"#));

        query.filters.insert("status".into(), "shipped".into());
        assert!(matches!(build(model, &query), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_boolean_filter() {
        let mut query = AdminQuery::default();
        query.filters.insert("is_active".into(), "0".into());
        let (rows, _) = listing("users", query);
        assert!(rows.contains(r#""users"."is_active" = FALSE"#));
    }

    #[test]
    fn test_date_filter_covers_whole_day() {
        let mut query = AdminQuery::default();
        query
            .filters
            .insert("transaction_date".into(), "2024-03-01".into());
        let (rows, _) = listing("transactions", query);

        assert!(rows.contains(r#""transactions"."transaction_date" >= '2024-03-01 00:00:00"#));
        assert!(rows.contains(r#""transactions"."transaction_date" < '2024-03-02 00:00:00"#));
    }

    #[test]
    fn test_bad_filters_are_rejected() {
        let model = registry::find("evidence").unwrap();

        let mut query = AdminQuery::default();
        query.filters.insert("password_hash".into(), "x".into());
        assert!(matches!(build(model, &query), Err(AppError::BadRequest(_))));

        let mut query = AdminQuery::default();
        query.filters.insert("submitted_at".into(), "yesterday".into());
        assert!(matches!(build(model, &query), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_order_param_is_limited_to_display_fields() {
        let model = registry::find("evidence_revisions").unwrap();

        let query = AdminQuery {
            order: Some("revision_number".into()),
            ..Default::default()
        };
        let sql = build(model, &query).unwrap().rows.to_string(PostgresQueryBuilder);
        assert!(sql.contains(r#"ORDER BY "evidence_revisions"."revision_number" ASC"#));

        let query = AdminQuery {
            order: Some("-changes_description".into()),
            ..Default::default()
        };
        assert!(matches!(build(model, &query), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_wallets_cannot_be_filtered() {
        let model = registry::find("credit_wallets").unwrap();
        let mut query = AdminQuery::default();
        query.filters.insert("user".into(), "x".into());
        assert!(matches!(build(model, &query), Err(AppError::BadRequest(_))));
    }
}
