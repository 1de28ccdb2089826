pub mod accounts_db_operations;
pub mod comments_db_operations;
pub mod likes_db_operations;
pub mod posts_db_operations;
