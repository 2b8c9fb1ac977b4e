pub use shared::RiskLevel;

pub const HIGH_THRESHOLD: f32 = 0.9;
pub const MEDIUM_THRESHOLD: f32 = 0.7;

/// `> 0.9` is High, `(0.7, 0.9]` is Medium, everything else Low.
pub fn classify(confidence: f32) -> RiskLevel {
    if confidence > HIGH_THRESHOLD {
        RiskLevel::High
    } else if confidence > MEDIUM_THRESHOLD {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers() {
        assert_eq!(classify(0.95), RiskLevel::High);
        assert_eq!(classify(0.8), RiskLevel::Medium);
        assert_eq!(classify(0.5), RiskLevel::Low);
    }

    #[test]
    fn boundaries_are_exclusive_on_the_upper_tier() {
        assert_eq!(classify(0.9), RiskLevel::Medium);
        assert_eq!(classify(0.7), RiskLevel::Low);
        assert_eq!(classify(1.0), RiskLevel::High);
        assert_eq!(classify(0.0), RiskLevel::Low);
    }
}
