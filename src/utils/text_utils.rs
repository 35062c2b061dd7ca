use html2text::from_read;

// Cuts at a char boundary, String::truncate panics when
// cutting a multibyte char in half (and Cyrillic is all
// multibyte).
pub fn truncate_utf8(s: &mut String, max_chars: usize) {
  if let Some((idx, _)) = s.char_indices().nth(max_chars) {
    s.truncate(idx);
  }
}

// Plain text preview of an article description for the
// listing pages. Descriptions may contain markup.
pub fn excerpt(description: &str, max_chars: usize) -> String {
  let plain = from_read(description.as_bytes(), 1000);
  let mut text = plain.split_whitespace().collect::<Vec<&str>>().join(" ");
  if text.chars().count() > max_chars {
    truncate_utf8(&mut text, max_chars);
    text = text.trim_end().to_string();
    text.push('…');
  }
  text
}
