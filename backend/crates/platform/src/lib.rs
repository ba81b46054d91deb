//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations with no domain
//! knowledge:
//! - Cryptographic utilities (random bytes, SHA-256, hex)
//! - Password hashing (Argon2id, salted, constant-time verification)
//! - Gravatar URL derivation

pub mod crypto;
pub mod gravatar;
pub mod password;
