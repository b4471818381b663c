pub mod handlers;
pub mod oauth;
