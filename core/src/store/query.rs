// voyage/src/store/query.rs

//! Field filters, ordering and limits over JSON documents.

use super::Document;
use serde_json::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
  Eq,
  Ne,
  Lt,
  Le,
  Gt,
  Ge,
  /// Field equals one of the values of an array operand.
  In,
  /// Array field contains the operand.
  ArrayContains,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
  pub field: String,
  pub op: FilterOp,
  pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
  Ascending,
  Descending,
}

/// A conjunction of filters with optional ordering and limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
  pub filters: Vec<Filter>,
  pub order_by: Option<(String, Direction)>,
  pub limit: Option<usize>,
}

impl Query {
  pub fn all() -> Self {
    Self::default()
  }

  pub fn filter(mut self, field: &str, op: FilterOp, value: impl Into<Value>) -> Self {
    self.filters.push(Filter {
      field: field.to_string(),
      op,
      value: value.into(),
    });
    self
  }

  pub fn where_eq(self, field: &str, value: impl Into<Value>) -> Self {
    self.filter(field, FilterOp::Eq, value)
  }

  pub fn where_in(self, field: &str, values: Vec<Value>) -> Self {
    self.filter(field, FilterOp::In, Value::Array(values))
  }

  pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
    self.order_by = Some((field.to_string(), direction));
    self
  }

  pub fn limit(mut self, limit: usize) -> Self {
    self.limit = Some(limit);
    self
  }

  pub fn matches(&self, data: &Value) -> bool {
    self.filters.iter().all(|filter| filter.matches(data))
  }

  /// Filters, orders and truncates `docs` the way a backend would.
  pub fn apply(&self, docs: impl IntoIterator<Item = Document>) -> Vec<Document> {
    let mut selected: Vec<Document> = docs.into_iter().filter(|doc| self.matches(&doc.data)).collect();
    if let Some((field, direction)) = &self.order_by {
      selected.sort_by(|a, b| {
        let ord = compare_optional(lookup(&a.data, field), lookup(&b.data, field));
        match direction {
          Direction::Ascending => ord,
          Direction::Descending => ord.reverse(),
        }
      });
    }
    if let Some(limit) = self.limit {
      selected.truncate(limit);
    }
    selected
  }
}

impl Filter {
  pub fn matches(&self, data: &Value) -> bool {
    let Some(actual) = lookup(data, &self.field) else {
      return self.op == FilterOp::Ne;
    };
    match self.op {
      FilterOp::Eq => values_equal(actual, &self.value),
      FilterOp::Ne => !values_equal(actual, &self.value),
      FilterOp::Lt => compare_values(actual, &self.value) == Some(Ordering::Less),
      FilterOp::Le => matches!(compare_values(actual, &self.value), Some(Ordering::Less | Ordering::Equal)),
      FilterOp::Gt => compare_values(actual, &self.value) == Some(Ordering::Greater),
      FilterOp::Ge => matches!(
        compare_values(actual, &self.value),
        Some(Ordering::Greater | Ordering::Equal)
      ),
      FilterOp::In => match &self.value {
        Value::Array(candidates) => candidates.iter().any(|c| values_equal(actual, c)),
        _ => false,
      },
      FilterOp::ArrayContains => match actual {
        Value::Array(items) => items.iter().any(|item| values_equal(item, &self.value)),
        _ => false,
      },
    }
  }
}

/// Resolves a dotted field path (`audience.userId`).
pub(crate) fn lookup<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
  path.split('.').try_fold(data, |current, segment| current.get(segment))
}

fn values_equal(a: &Value, b: &Value) -> bool {
  match (a, b) {
    (Value::Number(_), Value::Number(_)) => compare_values(a, b) == Some(Ordering::Equal),
    _ => a == b,
  }
}

/// Orders scalars of the same kind; mixed kinds are incomparable.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
  match (a, b) {
    (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
      (Some(x), Some(y)) => Some(x.cmp(&y)),
      _ => x.as_f64()?.partial_cmp(&y.as_f64()?),
    },
    (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
    (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
    (Value::Null, Value::Null) => Some(Ordering::Equal),
    _ => None,
  }
}

/// Missing values sort first, like nulls.
fn compare_optional(a: Option<&Value>, b: Option<&Value>) -> Ordering {
  match (a, b) {
    (Some(a), Some(b)) => compare_values(a, b).unwrap_or(Ordering::Equal),
    (None, Some(_)) => Ordering::Less,
    (Some(_), None) => Ordering::Greater,
    (None, None) => Ordering::Equal,
  }
}
