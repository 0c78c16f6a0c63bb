pub mod service;
pub mod styles;

pub use service::{RankingService, WeeklyRanking};
