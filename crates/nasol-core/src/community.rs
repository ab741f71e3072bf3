//! Community board: viewer posts and their comments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Nickname stored when the author leaves it blank.
pub const ANONYMOUS_NICKNAME: &str = "익명";
pub const MAX_NICKNAME_CHARS: usize = 20;
pub const MIN_TITLE_CHARS: usize = 2;
pub const MIN_POST_CONTENT_CHARS: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub nickname: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub content: String,
    pub nickname: String,
    pub created_at: DateTime<Utc>,
}

/// A post together with its comments, newest comment first.
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub post: Post,
    pub comments: Vec<Comment>,
}

/// Rejected board input. The messages are shown to users verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("제목/내용이 너무 짧습니다")]
    PostTooShort,
    #[error("입력값 오류")]
    InvalidComment,
}

/// A validated post ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub nickname: String,
}

impl NewPost {
    /// Trims every field and applies the nickname default.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::PostTooShort`] when the trimmed title has fewer
    /// than 2 characters or the trimmed content fewer than 5.
    pub fn parse(title: &str, content: &str, nickname: Option<&str>) -> Result<Self, DraftError> {
        let title = title.trim();
        let content = content.trim();
        if title.chars().count() < MIN_TITLE_CHARS
            || content.chars().count() < MIN_POST_CONTENT_CHARS
        {
            return Err(DraftError::PostTooShort);
        }
        Ok(Self {
            title: title.to_string(),
            content: content.to_string(),
            nickname: normalize_nickname(nickname),
        })
    }
}

/// A validated comment ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub post_id: i64,
    pub content: String,
    pub nickname: String,
}

impl NewComment {
    /// # Errors
    ///
    /// Returns [`DraftError::InvalidComment`] when `post_id` is missing or the
    /// trimmed content is empty.
    pub fn parse(
        post_id: Option<i64>,
        content: &str,
        nickname: Option<&str>,
    ) -> Result<Self, DraftError> {
        let content = content.trim();
        match post_id {
            Some(post_id) if !content.is_empty() => Ok(Self {
                post_id,
                content: content.to_string(),
                nickname: normalize_nickname(nickname),
            }),
            _ => Err(DraftError::InvalidComment),
        }
    }
}

/// Trimmed and cut to 20 characters; blank becomes [`ANONYMOUS_NICKNAME`].
#[must_use]
pub fn normalize_nickname(nickname: Option<&str>) -> String {
    let cut: String = nickname
        .unwrap_or_default()
        .trim()
        .chars()
        .take(MAX_NICKNAME_CHARS)
        .collect();
    if cut.is_empty() {
        ANONYMOUS_NICKNAME.to_string()
    } else {
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_fields_are_trimmed() {
        let post = NewPost::parse("  영수 어때요 ", " 최종 선택 궁금하네요 ", Some(" 솔로팬 ")).unwrap();
        assert_eq!(post.title, "영수 어때요");
        assert_eq!(post.content, "최종 선택 궁금하네요");
        assert_eq!(post.nickname, "솔로팬");
    }

    #[test]
    fn short_title_or_content_is_rejected() {
        assert_eq!(
            NewPost::parse("영", "충분히 긴 내용", None),
            Err(DraftError::PostTooShort)
        );
        assert_eq!(
            NewPost::parse("제목", "  짧다  ", None),
            Err(DraftError::PostTooShort)
        );
        assert!(NewPost::parse("제목", "다섯글자임", None).is_ok());
    }

    #[test]
    fn nickname_defaults_and_is_cut_to_twenty_chars() {
        assert_eq!(normalize_nickname(None), "익명");
        assert_eq!(normalize_nickname(Some("   ")), "익명");
        let long = "가".repeat(25);
        assert_eq!(normalize_nickname(Some(&long)).chars().count(), 20);
    }

    #[test]
    fn comment_needs_post_and_content() {
        assert_eq!(
            NewComment::parse(None, "좋아요", None),
            Err(DraftError::InvalidComment)
        );
        assert_eq!(
            NewComment::parse(Some(3), "   ", None),
            Err(DraftError::InvalidComment)
        );
        let comment = NewComment::parse(Some(3), " 좋아요 ", None).unwrap();
        assert_eq!(comment.post_id, 3);
        assert_eq!(comment.content, "좋아요");
        assert_eq!(comment.nickname, "익명");
    }
}
