use chrono::{DateTime, Utc};
use serde::Serialize;

/// A registered account row. The password hash never leaves the
/// db_operations layer, so it is not part of this struct.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub profile_image: String,
    pub bio: Option<String>,
    pub role: String,
    pub last_post_time: Option<DateTime<Utc>>,
}

impl Account {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

#[derive(Debug, Clone)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub media: Option<String>,
    pub media_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub user_id: i64,
}

#[derive(Debug, Clone)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub user_id: i64,
    pub post_id: i64,
}

/// Media classification derived from the uploaded filename's extension.
/// The allow-list and the classifier are the same set: an extension that
/// does not classify is not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    const IMAGE_EXTENSIONS: [&'static str; 4] = ["png", "jpg", "jpeg", "gif"];
    const VIDEO_EXTENSIONS: [&'static str; 3] = ["mp4", "webm", "mov"];

    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = filename.rsplit_once('.')?.1.to_lowercase();
        if Self::IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Image)
        } else if Self::VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

/// Actions subject to the ownership/role policy.
pub enum FeedAction {
    DeletePost,
    DeleteComment,
    UpdateProfile,
}

// --- Serialized views. Field names match the wire contract. ---

#[derive(Serialize)]
pub struct AuthorSummary {
    pub id: i64,
    pub username: String,
    pub image: String,
}

/// Comment as nested inside a post projection.
#[derive(Serialize)]
pub struct CommentView {
    pub id: i64,
    pub content: String,
    pub user: String,
    pub user_id: i64,
    pub user_pfp: String,
}

/// Comment as returned by the per-post comment listing.
#[derive(Serialize)]
pub struct CommentDetail {
    pub id: i64,
    pub content: String,
    pub user: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct PostView {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub media: Option<String>,
    pub media_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub author: AuthorSummary,
    pub comments: Vec<CommentView>,
    pub likes: i64,
    pub liked_by_me: bool,
}

#[derive(Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub profile_image: String,
    pub role: String,
    pub bio: Option<String>,
}

#[derive(Serialize)]
pub struct ProfileView {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub profile_image: String,
    pub posts: Vec<PostView>,
}

pub mod db_operations;

#[cfg(test)]
mod tests {
    use super::MediaKind;

    #[test]
    fn classifies_image_and_video_extensions() {
        assert_eq!(MediaKind::from_filename("cat.png"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_filename("cat.JPEG"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_filename("clip.mp4"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_filename("clip.MOV"), Some(MediaKind::Video));
    }

    #[test]
    fn rejects_unclassifiable_extensions() {
        assert_eq!(MediaKind::from_filename("clip.mkv"), None);
        assert_eq!(MediaKind::from_filename("doc.pdf"), None);
        assert_eq!(MediaKind::from_filename("no_extension"), None);
        assert_eq!(MediaKind::from_filename(""), None);
    }
}
