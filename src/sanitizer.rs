use std::sync::OnceLock;

use regex::Regex;

const FILTER_PHRASES: [&str; 3] = [
  "I can't directly create images",
  "as a language model",
  "within this text-based environment",
];

fn bold_pattern() -> &'static Regex {
  static BOLD: OnceLock<Regex> = OnceLock::new();
  BOLD.get_or_init(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid bold pattern"))
}

fn italic_pattern() -> &'static Regex {
  static ITALIC: OnceLock<Regex> = OnceLock::new();
  ITALIC.get_or_init(|| Regex::new(r"\*(.*?)\*").expect("valid italic pattern"))
}

// Every line boundary, including lone \r, form feed and unicode separators.
fn line_break_pattern() -> &'static Regex {
  static LINE_BREAK: OnceLock<Regex> = OnceLock::new();
  LINE_BREAK.get_or_init(|| {
    Regex::new(r"\r\n|[\n\r\x0b\x0c\x1c-\x1e\x{85}\x{2028}\x{2029}]").expect("valid line break pattern")
  })
}

/// Strips markdown emphasis and drops lines carrying a filtered phrase.
/// Surviving lines keep their original order.
pub fn sanitize(raw: &str) -> String {
  let unbolded = bold_pattern().replace_all(raw, "$1");
  let cleaned = italic_pattern().replace_all(&unbolded, "$1");

  let phrases: Vec<String> = FILTER_PHRASES.iter().map(|p| p.to_lowercase()).collect();
  line_break_pattern()
    .split(&cleaned)
    .filter(|line| {
      let lower = line.to_lowercase();
      !phrases.iter().any(|p| lower.contains(p.as_str()))
    })
    .collect::<Vec<_>>()
    .join("\n")
    .trim()
    .to_string()
}
