pub mod category;
pub mod insights;

pub use category::{classify, RecommendationCategory, VisualTag};
pub use insights::{CustomerStanding, IncomeLevel, LoyaltyLevel, QuickStats};
