use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ChatRequest {
  #[serde(default)]
  pub message: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
  pub role: String,
  pub content: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub media_type: Option<MediaKind>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub media_url: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub media_title: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub media_thumbnail: Option<String>,
}

impl ChatResponse {
  pub fn assistant(content: impl Into<String>) -> Self {
    Self {
      role: "assistant".to_string(),
      content: content.into(),
      media_type: None,
      media_url: None,
      media_title: None,
      media_thumbnail: None,
    }
  }
}

/// Body returned for any failure on the chat path.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ErrorBody {
  pub role: String,
  pub content: String,
}

impl ErrorBody {
  pub fn new(message: &str) -> Self {
    Self {
      role: "assistant".to_string(),
      content: format!("Error: {message}"),
    }
  }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
  Image,
  Video,
  Pdf,
}

impl MediaKind {
  pub fn as_str(self) -> &'static str {
    match self {
      MediaKind::Image => "image",
      MediaKind::Video => "video",
      MediaKind::Pdf => "pdf",
    }
  }
}

/// A keyword-tagged media entry. Field names follow the store's column names.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MediaRecord {
  Image {
    keyword: String,
    image_url: String,
  },
  Video {
    keyword: String,
    title: String,
    video_url: String,
    #[serde(rename = "thumbnail")]
    thumbnail_url: String,
  },
  Pdf {
    keyword: String,
    title: String,
    pdf_url: String,
  },
}

impl MediaRecord {
  pub fn kind(&self) -> MediaKind {
    match self {
      MediaRecord::Image { .. } => MediaKind::Image,
      MediaRecord::Video { .. } => MediaKind::Video,
      MediaRecord::Pdf { .. } => MediaKind::Pdf,
    }
  }

  pub fn keyword(&self) -> &str {
    match self {
      MediaRecord::Image { keyword, .. }
      | MediaRecord::Video { keyword, .. }
      | MediaRecord::Pdf { keyword, .. } => keyword,
    }
  }

  /// Copies this record's media fields onto `response`.
  pub fn attach(self, response: &mut ChatResponse) {
    response.media_type = Some(self.kind());
    match self {
      MediaRecord::Image { image_url, .. } => {
        response.media_url = Some(image_url);
      }
      MediaRecord::Video {
        title,
        video_url,
        thumbnail_url,
        ..
      } => {
        response.media_url = Some(video_url);
        response.media_title = Some(title);
        response.media_thumbnail = Some(thumbnail_url);
      }
      MediaRecord::Pdf { title, pdf_url, .. } => {
        response.media_url = Some(pdf_url);
        response.media_title = Some(title);
      }
    }
  }
}

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
  pub status: String,
  pub version: String,
  pub uptime_ms: u128,
}
