pub mod engine;
mod types;

pub use engine::{FixedRandom, RandomSource, SeededRandom, SentimentEngine, ThreadRandom};
pub use types::*;
