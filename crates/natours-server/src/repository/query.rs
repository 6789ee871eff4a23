//! Filter, sort and pagination over JSON-shaped records.

use crate::middleware::params::{ParamValue, QueryParams};
use serde_json::{Number, Value};
use std::cmp::Ordering;

/// Keys that shape the listing instead of filtering it.
const RESERVED_KEYS: [&str; 4] = ["page", "sort", "limit", "fields"];

const DEFAULT_LIMIT: usize = 100;

/// A predicate on one top-level field.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(String, Value),
    In(String, Vec<Value>),
    Gt(String, Value),
    Gte(String, Value),
    Lt(String, Value),
    Lte(String, Value),
}

impl Condition {
    pub fn matches(&self, record: &Value) -> bool {
        let field = |name: &str| record.get(name);
        match self {
            Self::Eq(name, expected) => field(name).is_some_and(|v| values_equal(v, expected)),
            Self::In(name, options) => {
                field(name).is_some_and(|v| options.iter().any(|o| values_equal(v, o)))
            }
            Self::Gt(name, bound) => cmp_field(field(name), bound) == Some(Ordering::Greater),
            Self::Gte(name, bound) => matches!(
                cmp_field(field(name), bound),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Self::Lt(name, bound) => cmp_field(field(name), bound) == Some(Ordering::Less),
            Self::Lte(name, bound) => matches!(
                cmp_field(field(name), bound),
                Some(Ordering::Less | Ordering::Equal)
            ),
        }
    }
}

fn cmp_field(value: Option<&Value>, bound: &Value) -> Option<Ordering> {
    compare(value?, bound)
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    compare(a, b) == Some(Ordering::Equal) || a == b
}

/// Sort on one field, descending when written with a leading `-`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub descending: bool,
}

impl SortKey {
    pub fn parse(spec: &str) -> Vec<SortKey> {
        spec.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_prefix('-') {
                Some(field) => SortKey { field: field.to_string(), descending: true },
                None => SortKey { field: s.to_string(), descending: false },
            })
            .collect()
    }
}

/// Listing request against a repository.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub conditions: Vec<Condition>,
    pub sort: Vec<SortKey>,
    pub page: usize,
    pub limit: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            conditions: Vec::new(),
            sort: Vec::new(),
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn sort_by(mut self, spec: &str) -> Self {
        self.sort = SortKey::parse(spec);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn page(mut self, page: usize) -> Self {
        self.page = page.max(1);
        self
    }

    /// Build from de-duplicated query parameters.
    ///
    /// `price=100` filters on equality, `price[gte]=100` on a bound, and a
    /// multi-valued key matches any of its values. `sort`, `page` and `limit`
    /// shape the result; values that do not parse fall back to defaults.
    pub fn from_params(params: &QueryParams) -> Self {
        let mut query = Self::new().sort_by("-createdAt");

        for (key, value) in params.iter() {
            match key.as_str() {
                "sort" => query = query.sort_by(value.last()),
                "page" => {
                    if let Ok(page) = value.last().parse() {
                        query = query.page(page);
                    }
                }
                "limit" => {
                    if let Ok(limit) = value.last().parse() {
                        query = query.limit(limit);
                    }
                }
                k if RESERVED_KEYS.contains(&k) => {}
                k => {
                    if let Some(condition) = condition_for(k, value) {
                        query.conditions.push(condition);
                    }
                }
            }
        }

        query
    }

    /// Apply to a set of serialized records, returning matching indices in
    /// result order.
    pub fn select(&self, records: &[Value]) -> Vec<usize> {
        let mut hits: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, record)| self.conditions.iter().all(|c| c.matches(record)))
            .map(|(i, _)| i)
            .collect();

        if !self.sort.is_empty() {
            hits.sort_by(|&a, &b| {
                for key in &self.sort {
                    let ord = match (records[a].get(&key.field), records[b].get(&key.field)) {
                        (Some(x), Some(y)) => compare(x, y).unwrap_or(Ordering::Equal),
                        (Some(_), None) => Ordering::Less,
                        (None, Some(_)) => Ordering::Greater,
                        (None, None) => Ordering::Equal,
                    };
                    let ord = if key.descending { ord.reverse() } else { ord };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
        }

        hits.into_iter()
            .skip(self.page.saturating_sub(1).saturating_mul(self.limit))
            .take(self.limit)
            .collect()
    }
}

fn condition_for(key: &str, value: &ParamValue) -> Option<Condition> {
    let (field, operator) = match key.split_once('[') {
        Some((field, rest)) => (field, Some(rest.strip_suffix(']')?)),
        None => (key, None),
    };

    let scalar = || parse_scalar(value.last());
    Some(match (operator, value) {
        (None, ParamValue::Many(values)) => Condition::In(
            field.to_string(),
            values.iter().map(|v| parse_scalar(v)).collect(),
        ),
        (None, ParamValue::Single(_)) => Condition::Eq(field.to_string(), scalar()),
        (Some("gt"), _) => Condition::Gt(field.to_string(), scalar()),
        (Some("gte"), _) => Condition::Gte(field.to_string(), scalar()),
        (Some("lt"), _) => Condition::Lt(field.to_string(), scalar()),
        (Some("lte"), _) => Condition::Lte(field.to_string(), scalar()),
        (Some(_), _) => return None,
    })
}

fn parse_scalar(raw: &str) -> Value {
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(raw.to_string()))
}
