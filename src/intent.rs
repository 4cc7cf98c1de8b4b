use crate::models::MediaKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
  Image,
  Pdf,
  Video,
  TextOnly,
}

impl Intent {
  pub fn media_kind(self) -> Option<MediaKind> {
    match self {
      Intent::Image => Some(MediaKind::Image),
      Intent::Pdf => Some(MediaKind::Pdf),
      Intent::Video => Some(MediaKind::Video),
      Intent::TextOnly => None,
    }
  }
}

/// Evaluated top to bottom; the first rule with a hit decides the intent.
/// Pdf is listed before Video, so a message naming both resolves to Pdf.
const RULES: &[(Intent, &[&str])] = &[
  (Intent::Image, &["image", "picture", "photo"]),
  (Intent::Pdf, &["pdf"]),
  (Intent::Video, &["video"]),
];

pub fn classify(message: &str) -> Intent {
  let lower = message.to_lowercase();
  RULES
    .iter()
    .find(|(_, needles)| needles.iter().any(|n| lower.contains(n)))
    .map(|(intent, _)| *intent)
    .unwrap_or(Intent::TextOnly)
}
