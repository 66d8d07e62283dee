//! Dashboard Client
//! Mission: Role-aware pages rendered from live API calls
//!
//! The HTTP client, session and view state are plain values owned by
//! [`Dashboard`]; templates are compiled into the binary.

pub mod client;
pub mod pages;
pub mod render;
pub mod session;
pub mod view;

pub use client::{ApiClient, ClientError};
pub use pages::{Dashboard, PageError};
pub use render::Renderer;
pub use session::Session;
pub use view::{Notification, NotificationLevel, Regions, ViewState, NOTIFICATION_TTL};
