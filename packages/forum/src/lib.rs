#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Forum storage: categories, topics, and posts.
//!
//! The forum shares the chart database file. Call [`ensure_schema`] once
//! on the open connection before using any other function.

use moosicbox_json_utils::database::ToValue as _;
use natal_forum_models::{
    ForumCategory, NewCategory, NewPost, NewTopic, Post, Topic, ValidationError,
};
use switchy_database::{Database, DatabaseValue, Row};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors from forum operations.
#[derive(Debug, Error)]
pub enum ForumError {
    /// A database query or command failed.
    #[error("Database error: {0}")]
    Database(String),

    /// The referenced category or topic does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// `"category"` or `"topic"`.
        entity: &'static str,
        id: i64,
    },

    /// A submission failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl From<switchy_database::DatabaseError> for ForumError {
    fn from(e: switchy_database::DatabaseError) -> Self {
        Self::Database(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// Creates the forum tables if they don't already exist.
///
/// # Errors
///
/// Returns [`ForumError::Database`] if any statement fails.
pub async fn ensure_schema(db: &dyn Database) -> Result<(), ForumError> {
    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS forum_categories (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT NOT NULL,
            description TEXT,
            created_at  TEXT NOT NULL
        )",
    )
    .await?;

    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS forum_topics (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            category_id INTEGER NOT NULL REFERENCES forum_categories(id) ON DELETE CASCADE,
            title       TEXT NOT NULL,
            author      TEXT NOT NULL,
            created_at  TEXT NOT NULL
        )",
    )
    .await?;

    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS forum_posts (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            topic_id    INTEGER NOT NULL REFERENCES forum_topics(id) ON DELETE CASCADE,
            author      TEXT NOT NULL,
            body        TEXT NOT NULL,
            created_at  TEXT NOT NULL
        )",
    )
    .await?;

    db.exec_raw(
        "CREATE INDEX IF NOT EXISTS idx_forum_topics_category
         ON forum_topics (category_id, created_at)",
    )
    .await?;

    db.exec_raw(
        "CREATE INDEX IF NOT EXISTS idx_forum_posts_topic
         ON forum_posts (topic_id, created_at)",
    )
    .await?;

    db.exec_raw("PRAGMA foreign_keys = ON").await?;

    Ok(())
}

/// Extracts the ID from a `RETURNING id` result.
fn returning_id(rows: &[Row]) -> Result<i64, ForumError> {
    rows.first()
        .and_then(|r| r.to_value("id").ok())
        .ok_or_else(|| ForumError::Database("insert returned no id".to_string()))
}

async fn exists(db: &dyn Database, table: &str, id: i64) -> Result<bool, ForumError> {
    let rows = db
        .query_raw_params(
            &format!("SELECT id FROM {table} WHERE id = $1"),
            &[DatabaseValue::Int64(id)],
        )
        .await?;
    Ok(!rows.is_empty())
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Creates a category.
///
/// # Errors
///
/// Returns [`ForumError::Validation`] for an invalid submission or
/// [`ForumError::Database`] if the insert fails.
pub async fn create_category(
    db: &dyn Database,
    category: &NewCategory,
) -> Result<ForumCategory, ForumError> {
    let category = category.validate()?;
    let created_at = chrono::Utc::now().to_rfc3339();

    let rows = db
        .query_raw_params(
            "INSERT INTO forum_categories (name, description, created_at)
             VALUES ($1, $2, $3)
             RETURNING id",
            &[
                DatabaseValue::String(category.name.clone()),
                category
                    .description
                    .clone()
                    .map_or(DatabaseValue::Null, DatabaseValue::String),
                DatabaseValue::String(created_at.clone()),
            ],
        )
        .await?;

    let id = returning_id(&rows)?;
    log::info!("Created forum category {id} ({})", category.name);

    Ok(ForumCategory {
        id,
        name: category.name,
        description: category.description,
        created_at,
    })
}

/// Lists all categories by name.
///
/// # Errors
///
/// Returns [`ForumError::Database`] if the query fails.
pub async fn list_categories(db: &dyn Database) -> Result<Vec<ForumCategory>, ForumError> {
    let rows = db
        .query_raw_params(
            "SELECT id, name, description, created_at FROM forum_categories
             ORDER BY name, id",
            &[],
        )
        .await?;

    Ok(rows
        .iter()
        .map(|row| ForumCategory {
            id: row.to_value("id").unwrap_or(0),
            name: row.to_value("name").unwrap_or_default(),
            description: row.to_value("description").unwrap_or(None),
            created_at: row.to_value("created_at").unwrap_or_default(),
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Topics
// ---------------------------------------------------------------------------

const TOPIC_COLUMNS: &str = "t.id, t.category_id, t.title, t.author, t.created_at,
    (SELECT COUNT(*) FROM forum_posts p WHERE p.topic_id = t.id) AS post_count";

fn row_to_topic(row: &Row) -> Topic {
    Topic {
        id: row.to_value("id").unwrap_or(0),
        category_id: row.to_value("category_id").unwrap_or(0),
        title: row.to_value("title").unwrap_or_default(),
        author: row.to_value("author").unwrap_or_default(),
        created_at: row.to_value("created_at").unwrap_or_default(),
        post_count: row.to_value("post_count").unwrap_or(0),
    }
}

/// Creates a topic in an existing category.
///
/// # Errors
///
/// Returns [`ForumError::NotFound`] if the category does not exist,
/// [`ForumError::Validation`] for an invalid submission, or
/// [`ForumError::Database`] if the insert fails.
pub async fn create_topic(db: &dyn Database, topic: &NewTopic) -> Result<Topic, ForumError> {
    let topic = topic.validate()?;
    if !exists(db, "forum_categories", topic.category_id).await? {
        return Err(ForumError::NotFound {
            entity: "category",
            id: topic.category_id,
        });
    }

    let created_at = chrono::Utc::now().to_rfc3339();
    let rows = db
        .query_raw_params(
            "INSERT INTO forum_topics (category_id, title, author, created_at)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
            &[
                DatabaseValue::Int64(topic.category_id),
                DatabaseValue::String(topic.title.clone()),
                DatabaseValue::String(topic.author.clone()),
                DatabaseValue::String(created_at.clone()),
            ],
        )
        .await?;

    Ok(Topic {
        id: returning_id(&rows)?,
        category_id: topic.category_id,
        title: topic.title,
        author: topic.author,
        created_at,
        post_count: 0,
    })
}

/// Lists a category's topics, newest first.
///
/// # Errors
///
/// Returns [`ForumError::NotFound`] if the category does not exist or
/// [`ForumError::Database`] if the query fails.
pub async fn list_topics(db: &dyn Database, category_id: i64) -> Result<Vec<Topic>, ForumError> {
    if !exists(db, "forum_categories", category_id).await? {
        return Err(ForumError::NotFound {
            entity: "category",
            id: category_id,
        });
    }

    let rows = db
        .query_raw_params(
            &format!(
                "SELECT {TOPIC_COLUMNS} FROM forum_topics t
                 WHERE t.category_id = $1
                 ORDER BY t.created_at DESC, t.id DESC"
            ),
            &[DatabaseValue::Int64(category_id)],
        )
        .await?;

    Ok(rows.iter().map(row_to_topic).collect())
}

/// Loads a topic by ID.
///
/// # Errors
///
/// Returns [`ForumError::Database`] if the query fails.
pub async fn get_topic(db: &dyn Database, id: i64) -> Result<Option<Topic>, ForumError> {
    let rows = db
        .query_raw_params(
            &format!("SELECT {TOPIC_COLUMNS} FROM forum_topics t WHERE t.id = $1"),
            &[DatabaseValue::Int64(id)],
        )
        .await?;

    Ok(rows.first().map(row_to_topic))
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

/// Adds a post to an existing topic.
///
/// # Errors
///
/// Returns [`ForumError::NotFound`] if the topic does not exist,
/// [`ForumError::Validation`] for an invalid submission, or
/// [`ForumError::Database`] if the insert fails.
pub async fn create_post(
    db: &dyn Database,
    topic_id: i64,
    post: &NewPost,
) -> Result<Post, ForumError> {
    let post = post.validate()?;
    if !exists(db, "forum_topics", topic_id).await? {
        return Err(ForumError::NotFound {
            entity: "topic",
            id: topic_id,
        });
    }

    let created_at = chrono::Utc::now().to_rfc3339();
    let rows = db
        .query_raw_params(
            "INSERT INTO forum_posts (topic_id, author, body, created_at)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
            &[
                DatabaseValue::Int64(topic_id),
                DatabaseValue::String(post.author.clone()),
                DatabaseValue::String(post.body.clone()),
                DatabaseValue::String(created_at.clone()),
            ],
        )
        .await?;

    Ok(Post {
        id: returning_id(&rows)?,
        topic_id,
        author: post.author,
        body: post.body,
        created_at,
    })
}

/// Lists a topic's posts, oldest first.
///
/// # Errors
///
/// Returns [`ForumError::Database`] if the query fails.
pub async fn list_posts(db: &dyn Database, topic_id: i64) -> Result<Vec<Post>, ForumError> {
    let rows = db
        .query_raw_params(
            "SELECT id, topic_id, author, body, created_at FROM forum_posts
             WHERE topic_id = $1
             ORDER BY created_at, id",
            &[DatabaseValue::Int64(topic_id)],
        )
        .await?;

    Ok(rows
        .iter()
        .map(|row| Post {
            id: row.to_value("id").unwrap_or(0),
            topic_id: row.to_value("topic_id").unwrap_or(0),
            author: row.to_value("author").unwrap_or_default(),
            body: row.to_value("body").unwrap_or_default(),
            created_at: row.to_value("created_at").unwrap_or_default(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchy_database_connection::init_sqlite_rusqlite;

    async fn temp_db(name: &str) -> Box<dyn Database> {
        let path = std::env::temp_dir().join(format!("natal_forum_test_{name}.db"));
        let _ = std::fs::remove_file(&path);
        let db = init_sqlite_rusqlite(Some(path.as_path())).unwrap();
        ensure_schema(db.as_ref()).await.unwrap();
        db
    }

    fn category(name: &str) -> NewCategory {
        NewCategory {
            name: name.to_string(),
            description: Some("Chart readings and questions".to_string()),
        }
    }

    #[tokio::test]
    async fn category_topic_post_flow() {
        let db = temp_db("flow").await;

        let readings = create_category(db.as_ref(), &category("Readings"))
            .await
            .unwrap();
        let topic = create_topic(
            db.as_ref(),
            &NewTopic {
                category_id: readings.id,
                title: "  Moon in the 4th house  ".to_string(),
                author: "luna".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(topic.title, "Moon in the 4th house");

        for body in ["First!", "Second reply"] {
            create_post(
                db.as_ref(),
                topic.id,
                &NewPost {
                    author: "sol".to_string(),
                    body: body.to_string(),
                },
            )
            .await
            .unwrap();
        }

        let posts = list_posts(db.as_ref(), topic.id).await.unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].body, "First!");

        let fetched = get_topic(db.as_ref(), topic.id).await.unwrap().unwrap();
        assert_eq!(fetched.post_count, 2);

        let topics = list_topics(db.as_ref(), readings.id).await.unwrap();
        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].id, topic.id);

        let categories = list_categories(db.as_ref()).await.unwrap();
        assert_eq!(categories, vec![readings]);
    }

    #[tokio::test]
    async fn missing_parents_are_not_found() {
        let db = temp_db("not_found").await;

        let err = create_topic(
            db.as_ref(),
            &NewTopic {
                category_id: 999,
                title: "Orphan".to_string(),
                author: "nobody".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            ForumError::NotFound {
                entity: "category",
                id: 999
            }
        ));

        let err = create_post(
            db.as_ref(),
            42,
            &NewPost {
                author: "nobody".to_string(),
                body: "hello".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ForumError::NotFound { entity: "topic", .. }));

        assert!(matches!(
            list_topics(db.as_ref(), 7).await,
            Err(ForumError::NotFound { .. })
        ));
        assert!(get_topic(db.as_ref(), 7).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn invalid_submission_writes_nothing() {
        let db = temp_db("invalid").await;
        let err = create_category(db.as_ref(), &category("  "))
            .await
            .unwrap_err();
        assert!(matches!(err, ForumError::Validation(_)));
        assert!(list_categories(db.as_ref()).await.unwrap().is_empty());
    }
}
