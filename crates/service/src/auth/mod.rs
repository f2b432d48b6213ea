//! Auth module: account registration, login, and the token lifecycle
//! (issue, refresh rotation, revocation, email verification).
//!
//! Layering follows domain / repository / service: handlers call
//! [`AccountService`], which talks to a [`repository::AccountRepository`]
//! for accounts, a [`registry::TokenRegistry`] for revocable tokens, and a
//! [`mailer::EmailDispatcher`] for verification mail.

pub mod domain;
pub mod errors;
pub mod gate;
pub mod mailer;
pub mod registry;
pub mod repository;
pub mod service;
pub mod token;
pub mod validate;

pub use service::AccountService;
