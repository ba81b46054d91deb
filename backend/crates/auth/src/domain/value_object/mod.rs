//! Value Object Module

pub mod lifecycle;
pub mod reset_token;
pub mod totp_secret;
pub mod user_id;
