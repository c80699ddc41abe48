pub mod auth;
pub mod courses;
pub mod documents;
pub mod gateway;
pub mod orders;
pub mod purchases;
pub mod webhooks;
