//! Keyword sentiment heuristic.
//!
//! This is a placeholder, not a statistical classifier: text containing
//! "good" or "great" (any case) is positive, everything else is negative.
//! Confidence is drawn uniformly from [0.7, 1.0) and carries no information
//! about the decision. Clients and tests depend on exactly this behavior.

use super::Sentiment;
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::sync::Mutex;

pub const CONFIDENCE_MIN: f64 = 0.7;
pub const CONFIDENCE_MAX: f64 = 1.0;

const POSITIVE_KEYWORDS: [&str; 2] = ["good", "great"];

/// Source of uniform samples in [0, 1).
pub trait RandomSource: Send + Sync {
    fn next_unit(&self) -> f64;
}

/// Per-thread generator; the production default.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_unit(&self) -> f64 {
        rand::rng().random::<f64>()
    }
}

/// Reproducible generator for tests and replays.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_unit(&self) -> f64 {
        // A poisoned lock still holds a usable generator.
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.random::<f64>()
    }
}

/// Always yields the same sample.
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom(pub f64);

impl RandomSource for FixedRandom {
    fn next_unit(&self) -> f64 {
        self.0
    }
}

pub struct SentimentEngine {
    random: Box<dyn RandomSource>,
}

impl SentimentEngine {
    pub fn new(random: impl RandomSource + 'static) -> Self {
        Self {
            random: Box::new(random),
        }
    }

    pub fn classify(&self, text: &str) -> (Sentiment, f64) {
        (classify_sentiment(text), self.confidence())
    }

    fn confidence(&self) -> f64 {
        let sample = self.random.next_unit();
        let unit = if sample.is_finite() {
            sample.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let value = CONFIDENCE_MIN + unit * (CONFIDENCE_MAX - CONFIDENCE_MIN);
        // Rounding can land exactly on the upper bound.
        if value >= CONFIDENCE_MAX {
            f64::from_bits(CONFIDENCE_MAX.to_bits() - 1)
        } else {
            value
        }
    }
}

impl Default for SentimentEngine {
    fn default() -> Self {
        Self::new(ThreadRandom)
    }
}

pub fn classify_sentiment(text: &str) -> Sentiment {
    let lowered = text.to_lowercase();
    if POSITIVE_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        Sentiment::Positive
    } else {
        Sentiment::Negative
    }
}
