// Backend for the Obinna Events promotional site

// Export modules for each part of the site
pub mod booking;
pub mod catalog;
pub mod chat;
pub mod config;
pub mod error;
pub mod mailer;
pub mod server;
pub mod stats;
pub mod templates;
pub mod youtube;

// Re-export key types for convenience
pub use booking::{BookingError, BookingRelay, BookingRequest, BookingSubmission, RelayConfig};
pub use catalog::{ShowCatalog, ShowCategory, VideoCatalogProvider, VideoSummary};
pub use chat::{ChatResponder, ChatRule};
pub use config::{Config, ConfigError};
pub use mailer::{ConnectivityFailure, MailTransport, OutboundMessage, SmtpConfig, SmtpMailer};
pub use server::{router, AppState, StatsSurface};
pub use stats::{
    format_number, AggregateReport, AggregateStats, AggregatorConfig, ChannelStatSnapshot,
    FetchFailure, FetchOutcome, NumberFormat, StatsAggregator, StatsProvider, StatsService,
};
pub use youtube::{YouTubeClient, YouTubeConfig};
