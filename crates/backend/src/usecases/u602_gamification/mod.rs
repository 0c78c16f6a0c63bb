pub mod engine;
pub mod managers;

pub use engine::GamificationEngine;
