pub mod noise;
pub mod weighted;

pub use noise::{FixedNoise, GaussianNoise, NoNoise, NoiseSource};
pub use weighted::{FeatureContributions, ScoreWeights, SpendingScorer};
