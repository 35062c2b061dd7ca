// Small SELECT builder for the admin listings, which
// all have optional search and filter clauses plus
// pagination. The fixed queries are just written out
// in the store modules.

use std::fmt;

pub enum Order {
  Asc,
  Desc
}

pub struct OrderBy {
  pub order: Order,
  pub field: String
}

impl OrderBy {
  pub fn new(order: Order, field: &str) -> Self {
    OrderBy {
      order,
      field: field.to_string()
    }
  }
}

// Used the "builder pattern" they talk about in the
// Rust docs. The "q_" in front of field names is
// just because "where" is a reserved keyword.
// All the where clauses are glued with AND, use
// where_or to get a parenthesized OR group in there.
pub struct Query {
  q_fields: String,
  q_from: String,
  q_where: Vec<String>,
  q_order: Vec<OrderBy>,
  limit: Option<i64>,
  offset: Option<i64>
}

impl Query {

  pub fn select(fields: &str, from: &str) -> Self {
    Query {
      q_fields: fields.to_string(),
      q_from: from.to_string(),
      q_where: Vec::new(),
      q_order: Vec::new(),
      limit: None,
      offset: None
    }
  }

  pub fn count(from: &str) -> Self {
    Self::select("count(*)", from)
  }

  pub fn where_clause(mut self, clause: &str) -> Self {
    self.q_where.push(clause.to_string());
    self
  }

  pub fn where_or(mut self, clauses: &[&str]) -> Self {
    if !clauses.is_empty() {
      self.q_where.push(format!("({})", clauses.join(" OR ")));
    }
    self
  }

  pub fn order(mut self, order: OrderBy) -> Self {
    self.q_order.push(order);
    self
  }

  pub fn limit(mut self, limit: i64) -> Self {
    self.limit = Some(limit);
    self
  }

  pub fn offset(mut self, offset: i64) -> Self {
    self.offset = Some(offset);
    self
  }

}

// Creating the query string is done by implementing
// Display, which gives us to_string() for free.
impl fmt::Display for Query {

  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "SELECT {} FROM {} ", self.q_fields, self.q_from)?;
    if !self.q_where.is_empty() {
      write!(f, "WHERE {} ", self.q_where.join(" AND "))?;
    }
    if !self.q_order.is_empty() {
      let order: Vec<String> = self.q_order.iter()
        .map(|o| format!(
          "{} {}",
          o.field,
          match o.order {
            Order::Asc => "ASC",
            Order::Desc => "DESC"
          }
        ))
        .collect();
      write!(f, "ORDER BY {} ", order.join(", "))?;
    }
    if let Some(lim) = self.limit {
      write!(f, "LIMIT {} ", lim)?;
      if let Some(off) = self.offset {
        write!(f, "OFFSET {} ", off)?;
      }
    }
    Ok(())
  }

}
