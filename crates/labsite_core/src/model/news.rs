//! News item model.

use crate::model::ordering::{Orderable, RecordId};
use crate::model::validation::{check_optional_url, require_text, RecordValidationError};
use serde::{Deserialize, Serialize};

/// News item row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct News {
    pub id: RecordId,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub hyperlink: Option<String>,
    /// Epoch ms publication timestamp.
    pub publish_date: i64,
    /// Whether the item is expanded on the public page.
    pub is_open: bool,
    pub sort_order: i64,
    pub is_deleted: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl News {
    pub fn new(title: impl Into<String>, content: impl Into<String>, publish_date: i64) -> Self {
        Self {
            id: 0,
            title: title.into(),
            content: content.into(),
            image_url: None,
            hyperlink: None,
            publish_date,
            is_open: false,
            sort_order: 0,
            is_deleted: false,
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn validate(&self) -> Result<(), RecordValidationError> {
        require_text("title", &self.title)?;
        require_text("content", &self.content)?;
        check_optional_url("image_url", self.image_url.as_deref())?;
        check_optional_url("hyperlink", self.hyperlink.as_deref())?;
        Ok(())
    }
}

impl Orderable for News {
    fn id(&self) -> RecordId {
        self.id
    }

    fn sort_order(&self) -> i64 {
        self.sort_order
    }

    fn set_sort_order(&mut self, value: i64) {
        self.sort_order = value;
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }
}

/// Partial update of a news item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub hyperlink: Option<String>,
    pub publish_date: Option<i64>,
    pub is_open: Option<bool>,
    pub order: Option<i64>,
}

impl NewsPatch {
    pub fn apply_to(&self, news: &mut News) {
        if let Some(title) = &self.title {
            news.title = title.clone();
        }
        if let Some(content) = &self.content {
            news.content = content.clone();
        }
        if self.image_url.is_some() {
            news.image_url = self.image_url.clone();
        }
        if self.hyperlink.is_some() {
            news.hyperlink = self.hyperlink.clone();
        }
        if let Some(publish_date) = self.publish_date {
            news.publish_date = publish_date;
        }
        if let Some(is_open) = self.is_open {
            news.is_open = is_open;
        }
    }
}
