use serde::{Deserialize, Serialize};
use url::Url;

/// Accent used when a row carries none.
pub const DEFAULT_ACCENT: &str = "#2563eb";
/// Description used when a row carries none.
pub const DEFAULT_DESCRIPTION: &str = "No description yet.";

/// Columns requested from the books table, in wire spelling.
pub const BOOK_COLUMNS: [&str; 14] = [
    "id",
    "title",
    "author",
    "price",
    "rating",
    "pages",
    "category",
    "accent",
    "featured",
    "description",
    "cover",
    "audioPreview",
    "fileUrl",
    "progress",
];

/// Catalog entry as presented to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Unique within a catalog snapshot
    pub id: String,
    pub title: String,
    pub author: String,
    pub price: f64,
    /// Expected 0 to 5
    pub rating: f64,
    pub pages: u32,
    /// Free-text label, stored as given
    pub category: String,
    /// Display hint only
    pub accent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_preview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    /// Fraction read, 0 to 1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
}

/// Row shape shared by the wire and the local store. Every `Book` is built
/// from one of these so both sources get the same defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRow {
    pub id: String,
    pub title: String,
    pub author: String,
    pub price: f64,
    pub rating: f64,
    pub pages: u32,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_preview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            author: row.author,
            price: row.price,
            rating: row.rating,
            pages: row.pages,
            category: row.category,
            accent: row.accent.unwrap_or_else(|| DEFAULT_ACCENT.to_string()),
            featured: row.featured,
            description: row
                .description
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            cover: row.cover,
            audio_preview: row.audio_preview,
            file_url: row.file_url,
            progress: row.progress,
        }
    }
}

/// Fields supplied when adding a book. Unset optional fields fall back to
/// the same defaults as rows from the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBookInput {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    pub author: String,
    pub price: f64,
    pub rating: f64,
    pub pages: u32,
    pub category: String,
    #[serde(default)]
    pub accent: Option<String>,
    #[serde(default)]
    pub featured: Option<bool>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default)]
    pub audio_preview: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
}

impl NewBookInput {
    pub(crate) fn into_row(self, id: String, progress: Option<f64>) -> BookRow {
        BookRow {
            id,
            title: self.title,
            author: self.author,
            price: self.price,
            rating: self.rating,
            pages: self.pages,
            category: self.category,
            accent: self.accent,
            featured: self.featured,
            description: self.description,
            cover: self.cover,
            audio_preview: self.audio_preview,
            file_url: self.file_url,
            progress,
        }
    }
}

/// Where the downloadable file for a book can be found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileLink {
    Available(Url),
    /// No file has been attached yet.
    Missing,
    /// A reference exists but is not a usable URL.
    Invalid { reference: String, reason: String },
}

impl Book {
    /// Resolve the download link. Never fails; callers show a message for
    /// anything other than `Available`.
    pub fn file_link(&self) -> FileLink {
        let Some(reference) = self.file_url.as_deref().map(str::trim) else {
            return FileLink::Missing;
        };
        if reference.is_empty() {
            return FileLink::Missing;
        }
        match Url::parse(reference) {
            Ok(url) => FileLink::Available(url),
            Err(err) => FileLink::Invalid {
                reference: reference.to_string(),
                reason: err.to_string(),
            },
        }
    }

    pub fn can_open(&self) -> bool {
        matches!(self.file_link(), FileLink::Available(_))
    }

    /// Rough size of the downloadable PDF: 15 KB per page, at least 3 MB,
    /// rounded to one decimal.
    pub fn estimated_file_size_mb(&self) -> f64 {
        let estimate = (f64::from(self.pages) * 0.015 * 10.0).round() / 10.0;
        estimate.max(3.0)
    }

    pub fn is_featured(&self) -> bool {
        self.featured.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn row_json() -> serde_json::Value {
        json!({
            "id": "b1",
            "title": "Alpha",
            "author": "A. Writer",
            "price": 9.5,
            "rating": 4.2,
            "pages": 300,
            "category": "Mystery",
            "audioPreview": "https://cdn.example/alpha.mp3",
            "fileUrl": null
        })
    }

    #[test]
    fn missing_accent_and_description_get_defaults() {
        let row: BookRow = serde_json::from_value(row_json()).unwrap();
        let book = Book::from(row);
        assert_eq!(book.accent, DEFAULT_ACCENT);
        assert_eq!(book.description, DEFAULT_DESCRIPTION);
        assert_eq!(
            book.audio_preview.as_deref(),
            Some("https://cdn.example/alpha.mp3")
        );
        assert_eq!(book.file_url, None);
    }

    #[test]
    fn present_values_are_kept() {
        let mut value = row_json();
        value["accent"] = json!("#000000");
        value["description"] = json!("Told backwards.");
        let book = Book::from(serde_json::from_value::<BookRow>(value).unwrap());
        assert_eq!(book.accent, "#000000");
        assert_eq!(book.description, "Told backwards.");
    }

    #[test]
    fn book_serializes_with_wire_names() {
        let book = Book::from(serde_json::from_value::<BookRow>(row_json()).unwrap());
        let value = serde_json::to_value(&book).unwrap();
        assert_eq!(value["audioPreview"], "https://cdn.example/alpha.mp3");
        assert!(value.get("fileUrl").is_none());
    }

    #[test]
    fn input_row_omits_unset_fields() {
        let input = NewBookInput {
            title: "X".into(),
            author: "Y".into(),
            category: "Custom".into(),
            ..NewBookInput::default()
        };
        let value = serde_json::to_value(input.into_row("book-1".into(), None)).unwrap();
        assert_eq!(value["id"], "book-1");
        assert!(value.get("accent").is_none());
        assert!(value.get("progress").is_none());
    }

    #[test]
    fn file_link_degrades_gracefully() {
        let mut book = Book::from(serde_json::from_value::<BookRow>(row_json()).unwrap());
        assert_eq!(book.file_link(), FileLink::Missing);
        assert!(!book.can_open());

        book.file_url = Some("   ".into());
        assert_eq!(book.file_link(), FileLink::Missing);

        book.file_url = Some("not a link".into());
        assert!(matches!(book.file_link(), FileLink::Invalid { .. }));

        book.file_url = Some("https://files.example/alpha.pdf".into());
        assert!(book.can_open());
    }

    #[test]
    fn file_size_estimate() {
        let mut book = Book::from(serde_json::from_value::<BookRow>(row_json()).unwrap());
        book.pages = 100;
        assert_eq!(book.estimated_file_size_mb(), 3.0);
        book.pages = 480;
        assert_eq!(book.estimated_file_size_mb(), 7.2);
    }
}
