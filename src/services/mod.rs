mod auth;
pub(crate) mod orders;
mod reports;
mod stats;

pub use auth::AuthService;
pub use orders::OrderService;
pub use reports::ReportService;
pub use stats::StatsService;
