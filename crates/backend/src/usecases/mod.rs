pub mod u600_pipeline;
pub mod u601_ingestion;
pub mod u602_gamification;
pub mod u603_rankings;
pub mod u604_rendering;
pub mod u605_notify;
pub mod u606_snapshots;
