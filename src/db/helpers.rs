pub fn generate_field_equal_qmark(name: &str) -> String {
  format!("{} = ?", name)
}

pub fn generate_field_like_qmark(name: &str) -> String {
  format!("{} LIKE ? ESCAPE '\\'", name)
}

// Turns a search term into a "contains" LIKE pattern,
// escaping the LIKE wildcards the user might have typed.
pub fn like_pattern(term: &str) -> String {
  let mut pattern = String::with_capacity(term.len() + 2);
  pattern.push('%');
  for c in term.trim().chars() {
    if c == '%' || c == '_' || c == '\\' {
      pattern.push('\\');
    }
    pattern.push(c);
  }
  pattern.push('%');
  pattern
}

pub fn bool_to_i32(value: bool) -> i32 {
  if value { 1 } else { 0 }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn like_pattern_escapes_wildcards() {
    assert_eq!(like_pattern(" news "), "%news%");
    assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
  }

  #[test]
  fn like_clause_declares_escape_char() {
    assert_eq!(generate_field_like_qmark("users.name"), "users.name LIKE ? ESCAPE '\\'");
  }
}
