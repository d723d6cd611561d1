//! Core module - domain types, rules and shared utilities

pub mod actor;
pub mod config;
pub mod error;
pub mod filter;
pub mod invite;
pub mod notification;
pub mod pagination;
pub mod token;

pub use actor::{EffectiveActor, ProfileStatus, Role};
pub use config::{Config, ConfigError, MailTransport};
pub use error::{ApiError, ApiResult, ErrorBody, Violations};
pub use filter::{FilterError, FilterSchema, Predicate, SearchOptions};
pub use invite::{AutoAcceptPreferences, InviteAction, InviteError, InviteStatus, LinkKind, Terms};
pub use notification::{Notification, NotificationRefs, NotificationType};
pub use pagination::{Paged, Pagination};
pub use token::{InviteClaims, InviteTokenIssuer, TokenError};
