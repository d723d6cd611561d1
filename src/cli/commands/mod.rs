//! CLI command implementations

pub mod account;
pub mod catalog;
pub mod completions;
pub mod farm;
pub mod grower;
pub mod init;
pub mod invite;
pub mod links;
pub mod notify;
pub mod outbox;
