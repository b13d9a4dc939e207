#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Forum types: categories contain topics, topics contain posts.
//!
//! Rows returned from the database are plain data. User submissions go
//! through the `New*` types, whose `validate` methods trim whitespace and
//! enforce length limits before anything is written.

use serde::{Deserialize, Serialize};

/// Maximum topic title length, in characters.
pub const MAX_TITLE_CHARS: usize = 200;

/// Maximum post body length, in characters.
pub const MAX_BODY_CHARS: usize = 10_000;

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForumCategory {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: i64,
    pub category_id: i64,
    pub title: String,
    pub author: String,
    pub created_at: String,
    /// Number of posts in the topic.
    pub post_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub topic_id: i64,
    pub author: String,
    pub body: String,
    pub created_at: String,
}

// ---------------------------------------------------------------------------
// Submissions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTopic {
    pub category_id: i64,
    pub title: String,
    pub author: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub author: String,
    pub body: String,
}

impl NewCategory {
    /// Returns a trimmed copy, or the first validation failure.
    ///
    /// A blank description is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the name is blank.
    pub fn validate(&self) -> Result<Self, ValidationError> {
        Ok(Self {
            name: required("name", &self.name, None)?,
            description: self
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
        })
    }
}

impl NewTopic {
    /// Returns a trimmed copy, or the first validation failure.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the title or author is blank, or the
    /// title is longer than [`MAX_TITLE_CHARS`].
    pub fn validate(&self) -> Result<Self, ValidationError> {
        Ok(Self {
            category_id: self.category_id,
            title: required("title", &self.title, Some(MAX_TITLE_CHARS))?,
            author: required("author", &self.author, None)?,
        })
    }
}

impl NewPost {
    /// Returns a trimmed copy, or the first validation failure.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the author or body is blank, or the
    /// body is longer than [`MAX_BODY_CHARS`].
    pub fn validate(&self) -> Result<Self, ValidationError> {
        Ok(Self {
            author: required("author", &self.author, None)?,
            body: required("body", &self.body, Some(MAX_BODY_CHARS))?,
        })
    }
}

fn required(
    field: &'static str,
    value: &str,
    max_chars: Option<usize>,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if let Some(max) = max_chars {
        if trimmed.chars().count() > max {
            return Err(ValidationError::TooLong { field, max });
        }
    }
    Ok(trimmed.to_string())
}

/// A submission field failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// The field is empty after trimming.
    Empty { field: &'static str },
    /// The field exceeds its character limit.
    TooLong { field: &'static str, max: usize },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{field} must not be empty"),
            Self::TooLong { field, max } => {
                write!(f, "{field} must be at most {max} characters")
            }
        }
    }
}

impl std::error::Error for ValidationError {}
