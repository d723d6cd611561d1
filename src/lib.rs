//! Agrilink: invitation, permission and catalog backend for agricultural
//! operations teams.
//!
//! Applicators invite workers, team members and growers; growers share farms
//! with applicators. Every relationship follows one invite lifecycle and every
//! list supports the same `{label, searchValue}` search.

pub mod cli;
pub mod core;
pub mod mail;
pub mod services;
pub mod store;
