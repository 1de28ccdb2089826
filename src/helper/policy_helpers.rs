use crate::models::{Account, FeedAction};

/// Central ownership/role policy. Post deletion is open to the owner or an
/// admin; comment deletion and profile updates are owner-only.
pub fn can(actor: &Account, action: FeedAction, owner_id: i64) -> bool {
    match action {
        FeedAction::DeletePost => actor.id == owner_id || actor.is_admin(),
        FeedAction::DeleteComment => actor.id == owner_id,
        FeedAction::UpdateProfile => actor.id == owner_id,
    }
}
