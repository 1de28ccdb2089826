pub mod auth_helpers;
pub mod feed_helpers;
pub mod policy_helpers;
pub mod profile_helpers;
pub mod upload_helpers;
