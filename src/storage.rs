use std::path::Path;

use async_trait::async_trait;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::RelayError;
use crate::models::{MediaKind, MediaRecord};

/// Whether a record with an empty keyword takes part in matching.
/// An empty keyword is a substring of every message, so under `MatchEmpty`
/// such a record matches everything.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KeywordPolicy {
  #[default]
  MatchEmpty,
  RequireNonEmpty,
}

#[async_trait]
pub trait MediaStore: Send + Sync {
  /// First record of `kind`, in store order, whose keyword occurs in `message`
  /// (case-insensitive). `Ok(None)` when nothing matches.
  async fn find_media(&self, kind: MediaKind, message: &str) -> Result<Option<MediaRecord>, RelayError>;
}

pub struct SqliteMediaStore {
  db: Mutex<Connection>,
  policy: KeywordPolicy,
}

impl SqliteMediaStore {
  pub fn new(conn: Connection, policy: KeywordPolicy) -> Self {
    Self {
      db: Mutex::new(conn),
      policy,
    }
  }

  #[cfg(test)]
  pub async fn insert_media(&self, record: &MediaRecord) -> Result<(), RelayError> {
    let conn = self.db.lock().await;
    insert_media(&conn, record)
  }

  /// Swaps the whole record set for `records` in one transaction.
  pub async fn replace_all(&self, records: &[MediaRecord]) -> Result<(), RelayError> {
    let mut conn = self.db.lock().await;
    let tx = conn.transaction()?;
    tx.execute_batch("DELETE FROM images; DELETE FROM videos; DELETE FROM pdfs;")?;
    for record in records {
      insert_media(&tx, record)?;
    }
    tx.commit()?;
    Ok(())
  }
}

#[async_trait]
impl MediaStore for SqliteMediaStore {
  async fn find_media(&self, kind: MediaKind, message: &str) -> Result<Option<MediaRecord>, RelayError> {
    let query = message.to_lowercase();
    let conn = self.db.lock().await;

    let sql = match kind {
      MediaKind::Image => "SELECT keyword, image_url FROM images ORDER BY rowid",
      MediaKind::Video => "SELECT keyword, title, video_url, thumbnail FROM videos ORDER BY rowid",
      MediaKind::Pdf => "SELECT keyword, title, pdf_url FROM pdfs ORDER BY rowid",
    };
    let mut stmt = conn.prepare(sql)?;
    let columns = stmt.column_count();
    let rows = stmt.query_map([], |row| StoredRow::read(row, columns))?;

    for row in rows {
      let row = row?;
      let keyword = row.keyword.to_lowercase();
      if keyword.is_empty() && self.policy == KeywordPolicy::RequireNonEmpty {
        continue;
      }
      if query.contains(&keyword) {
        return row.into_record(kind);
      }
    }
    Ok(None)
  }
}

/// A row as stored. Only the keyword defaults to empty; the other columns
/// are checked once the row has matched.
struct StoredRow {
  keyword: String,
  fields: Vec<Option<String>>,
}

impl StoredRow {
  fn read(row: &Row<'_>, columns: usize) -> rusqlite::Result<Self> {
    let keyword = row.get::<_, Option<String>>(0)?.unwrap_or_default();
    let fields = (1..columns)
      .map(|idx| row.get::<_, Option<String>>(idx))
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(Self { keyword, fields })
  }

  /// An image without a url counts as no match. A video or pdf missing a
  /// column is a malformed record.
  fn into_record(self, kind: MediaKind) -> Result<Option<MediaRecord>, RelayError> {
    let mut fields = self.fields.into_iter();
    let mut next = |column: &'static str| -> Result<String, RelayError> {
      fields
        .next()
        .flatten()
        .ok_or(RelayError::MalformedRecord { kind: kind.as_str(), column })
    };

    let record = match kind {
      MediaKind::Image => match next("image_url") {
        Ok(image_url) if !image_url.is_empty() => MediaRecord::Image {
          keyword: self.keyword,
          image_url,
        },
        _ => return Ok(None),
      },
      MediaKind::Video => MediaRecord::Video {
        keyword: self.keyword,
        title: next("title")?,
        video_url: next("video_url")?,
        thumbnail_url: next("thumbnail")?,
      },
      MediaKind::Pdf => MediaRecord::Pdf {
        keyword: self.keyword,
        title: next("title")?,
        pdf_url: next("pdf_url")?,
      },
    };
    Ok(Some(record))
  }
}

pub fn init_db(path: &Path) -> anyhow::Result<Connection> {
  let conn = Connection::open(path)?;
  create_tables(&conn)?;
  Ok(conn)
}

pub fn create_tables(conn: &Connection) -> rusqlite::Result<()> {
  conn.execute_batch(
    "
    CREATE TABLE IF NOT EXISTS images (
      keyword TEXT,
      image_url TEXT
    );
    CREATE TABLE IF NOT EXISTS videos (
      keyword TEXT,
      title TEXT,
      video_url TEXT,
      thumbnail TEXT
    );
    CREATE TABLE IF NOT EXISTS pdfs (
      keyword TEXT,
      title TEXT,
      pdf_url TEXT
    );
    ",
  )
}

pub fn insert_media(conn: &Connection, record: &MediaRecord) -> Result<(), RelayError> {
  match record {
    MediaRecord::Image { keyword, image_url } => {
      conn.execute(
        "INSERT INTO images (keyword, image_url) VALUES (?1, ?2)",
        params![keyword, image_url],
      )?;
    }
    MediaRecord::Video {
      keyword,
      title,
      video_url,
      thumbnail_url,
    } => {
      conn.execute(
        "INSERT INTO videos (keyword, title, video_url, thumbnail) VALUES (?1, ?2, ?3, ?4)",
        params![keyword, title, video_url, thumbnail_url],
      )?;
    }
    MediaRecord::Pdf { keyword, title, pdf_url } => {
      conn.execute(
        "INSERT INTO pdfs (keyword, title, pdf_url) VALUES (?1, ?2, ?3)",
        params![keyword, title, pdf_url],
      )?;
    }
  }
  Ok(())
}

/// Replaces the stored records with the JSON array at `path`. Returns the record count.
pub async fn seed_from_file(store: &SqliteMediaStore, path: &Path) -> anyhow::Result<usize> {
  let data = std::fs::read_to_string(path)?;
  let records: Vec<MediaRecord> = serde_json::from_str(&data)?;
  store.replace_all(&records).await?;
  Ok(records.len())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn memory_store(policy: KeywordPolicy) -> SqliteMediaStore {
    let conn = Connection::open_in_memory().unwrap();
    create_tables(&conn).unwrap();
    SqliteMediaStore::new(conn, policy)
  }

  fn image(keyword: &str, url: &str) -> MediaRecord {
    MediaRecord::Image {
      keyword: keyword.to_string(),
      image_url: url.to_string(),
    }
  }

  #[tokio::test]
  async fn finds_keyword_case_insensitively() {
    let store = memory_store(KeywordPolicy::MatchEmpty);
    store.insert_media(&image("Eiffel Tower", "https://img/eiffel")).await.unwrap();

    let hit = store
      .find_media(MediaKind::Image, "show me an image of the EIFFEL tower")
      .await
      .unwrap();
    assert_eq!(hit, Some(image("Eiffel Tower", "https://img/eiffel")));
  }

  #[tokio::test]
  async fn first_match_in_store_order_wins() {
    let store = memory_store(KeywordPolicy::MatchEmpty);
    store.insert_media(&image("cat", "https://img/first")).await.unwrap();
    store.insert_media(&image("cat", "https://img/second")).await.unwrap();

    let hit = store.find_media(MediaKind::Image, "a cat photo").await.unwrap();
    assert_eq!(hit, Some(image("cat", "https://img/first")));
  }

  #[tokio::test]
  async fn no_match_is_none() {
    let store = memory_store(KeywordPolicy::MatchEmpty);
    store.insert_media(&image("dog", "https://img/dog")).await.unwrap();

    let hit = store.find_media(MediaKind::Image, "a cat photo").await.unwrap();
    assert_eq!(hit, None);
  }

  #[tokio::test]
  async fn kinds_are_queried_independently() {
    let store = memory_store(KeywordPolicy::MatchEmpty);
    store.insert_media(&image("rust", "https://img/rust")).await.unwrap();
    let pdf = MediaRecord::Pdf {
      keyword: "rust".to_string(),
      title: "The Book".to_string(),
      pdf_url: "https://pdf/book".to_string(),
    };
    store.insert_media(&pdf).await.unwrap();

    assert_eq!(store.find_media(MediaKind::Pdf, "rust pdf").await.unwrap(), Some(pdf));
    assert_eq!(store.find_media(MediaKind::Video, "rust video").await.unwrap(), None);
  }

  #[tokio::test]
  async fn empty_keyword_matches_every_message() {
    let store = memory_store(KeywordPolicy::MatchEmpty);
    store.insert_media(&image("", "https://img/default")).await.unwrap();

    let hit = store.find_media(MediaKind::Image, "anything at all").await.unwrap();
    assert_eq!(hit, Some(image("", "https://img/default")));
    let hit = store.find_media(MediaKind::Image, "").await.unwrap();
    assert_eq!(hit, Some(image("", "https://img/default")));
  }

  #[tokio::test]
  async fn require_non_empty_skips_blank_keywords() {
    let store = memory_store(KeywordPolicy::RequireNonEmpty);
    store.insert_media(&image("", "https://img/default")).await.unwrap();
    store.insert_media(&image("moon", "https://img/moon")).await.unwrap();

    assert_eq!(store.find_media(MediaKind::Image, "anything").await.unwrap(), None);
    assert_eq!(
      store.find_media(MediaKind::Image, "moon picture").await.unwrap(),
      Some(image("moon", "https://img/moon"))
    );
  }

  fn store_from_sql(sql: &str) -> SqliteMediaStore {
    let conn = Connection::open_in_memory().unwrap();
    create_tables(&conn).unwrap();
    conn.execute_batch(sql).unwrap();
    SqliteMediaStore::new(conn, KeywordPolicy::MatchEmpty)
  }

  #[tokio::test]
  async fn image_without_url_is_not_found() {
    let store = store_from_sql(
      "INSERT INTO images (keyword) VALUES ('tiger');
       INSERT INTO images (keyword, image_url) VALUES ('tiger', 'https://img/later');",
    );
    assert_eq!(store.find_media(MediaKind::Image, "tiger photo").await.unwrap(), None);

    let store = store_from_sql("INSERT INTO images (keyword, image_url) VALUES ('tiger', '')");
    assert_eq!(store.find_media(MediaKind::Image, "tiger photo").await.unwrap(), None);
  }

  #[tokio::test]
  async fn null_keyword_reads_as_empty() {
    let store = store_from_sql("INSERT INTO images (image_url) VALUES ('https://img/any')");
    assert_eq!(
      store.find_media(MediaKind::Image, "any image").await.unwrap(),
      Some(image("", "https://img/any"))
    );
  }

  #[tokio::test]
  async fn matched_video_missing_column_is_malformed() {
    let store = store_from_sql("INSERT INTO videos (keyword, video_url) VALUES ('rust', 'https://v/rust')");

    let err = store.find_media(MediaKind::Video, "rust video").await.unwrap_err();
    assert!(matches!(err, RelayError::MalformedRecord { kind: "video", column: "title" }));
    assert_eq!(err.to_string(), "malformed video record: missing title");
  }

  #[tokio::test]
  async fn matched_pdf_missing_url_is_malformed() {
    let store = store_from_sql("INSERT INTO pdfs (keyword, title) VALUES ('rust', 'The Book')");

    let err = store.find_media(MediaKind::Pdf, "rust pdf").await.unwrap_err();
    assert!(matches!(err, RelayError::MalformedRecord { kind: "pdf", column: "pdf_url" }));
  }

  #[tokio::test]
  async fn unmatched_malformed_rows_are_ignored() {
    let store = store_from_sql(
      "INSERT INTO videos (keyword) VALUES ('python');
       INSERT INTO videos (keyword, title, video_url, thumbnail) VALUES ('rust', 'Rust', 'https://v/rust', 'https://t/rust');",
    );

    let hit = store.find_media(MediaKind::Video, "rust video").await.unwrap();
    assert!(matches!(hit, Some(MediaRecord::Video { ref title, .. }) if title == "Rust"));
  }

  #[tokio::test]
  async fn seeding_replaces_existing_records() {
    let store = memory_store(KeywordPolicy::MatchEmpty);
    store.insert_media(&image("stale", "https://img/stale")).await.unwrap();
    let path = std::env::temp_dir().join(format!("aura-seed-{}.json", uuid::Uuid::new_v4()));
    std::fs::write(
      &path,
      r#"[
        { "kind": "image", "keyword": "sun", "image_url": "https://img/sun" },
        { "kind": "video", "keyword": "sun", "title": "Sun", "video_url": "https://v/sun", "thumbnail": "https://t/sun" }
      ]"#,
    )
    .unwrap();

    let count = seed_from_file(&store, &path).await.unwrap();
    assert_eq!(count, 2);
    assert!(store.find_media(MediaKind::Video, "sun video").await.unwrap().is_some());
    assert_eq!(store.find_media(MediaKind::Image, "stale image").await.unwrap(), None);

    // Seeding twice must not duplicate.
    seed_from_file(&store, &path).await.unwrap();
    let conn = store.db.lock().await;
    let images: i64 = conn.query_row("SELECT COUNT(*) FROM images", [], |r| r.get(0)).unwrap();
    assert_eq!(images, 1);
    drop(conn);
    std::fs::remove_file(&path).ok();
  }
}
