use shared::RiskLevel;

use crate::inference::ranker::round_percent;

pub const SYSTEM_PROMPT: &str = "You are a professional agricultural advisor.";

/// Section titles the advisory must contain, in order.
pub const SECTION_TITLES: [&str; 7] = [
    "Disease Explanation",
    "Immediate Actions",
    "Organic Treatment Options",
    "Chemical Treatment Options",
    "Prevention Strategies",
    "Severity Level Explanation",
    "Safety Disclaimer",
];

pub fn build_prompt(disease: &str, confidence: f32, risk: RiskLevel) -> String {
    format!(
        r#"You are a professional agricultural expert.

A plant disease detection system predicted the following:

Disease: {disease}
Prediction Confidence: {confidence}%
Risk Level: {risk}

Generate a structured advisory in EXACTLY the following format:

1. Disease Explanation:
(Short and simple explanation in 2-3 sentences)

2. Immediate Actions:
- point
- point
- point

3. Organic Treatment Options:
- point
- point
- point

4. Chemical Treatment Options:
- point
- point
- point

5. Prevention Strategies:
- point
- point
- point

6. Severity Level Explanation:
- point
- point

7. Safety Disclaimer:
(Always advise consulting a local agricultural expert before chemical treatment.)

Important Rules:
- Use '-' for bullet points.
- Keep language farmer-friendly.
- Do NOT provide extreme pesticide dosage.
- Do NOT leave any section empty.
"#,
        disease = disease,
        confidence = format_percent(round_percent(confidence)),
        risk = risk,
    )
}

/// Shortest decimal form, keeping one fractional digit on whole numbers
/// (`95.0`, `93.12`).
fn format_percent(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_prediction_details() {
        let prompt = build_prompt("Tomato___Late_blight", 0.9312, RiskLevel::High);
        assert!(prompt.contains("Disease: Tomato___Late_blight"));
        assert!(prompt.contains("Prediction Confidence: 93.12%"));
        assert!(prompt.contains("Risk Level: High"));
        assert!(prompt.contains("Do NOT provide extreme pesticide dosage."));
    }

    #[test]
    fn whole_percentages_keep_one_decimal() {
        let prompt = build_prompt("Potato___Early_blight", 0.95, RiskLevel::High);
        assert!(prompt.contains("Prediction Confidence: 95.0%"));
        assert!(!prompt.contains("95.00"));

        let prompt = build_prompt("Potato___Early_blight", 0.875, RiskLevel::Medium);
        assert!(prompt.contains("Prediction Confidence: 87.5%"));
    }

    #[test]
    fn prompt_lists_every_section_in_order() {
        let prompt = build_prompt("Apple___healthy", 0.5, RiskLevel::Low);
        let mut cursor = 0;
        for (i, title) in SECTION_TITLES.iter().enumerate() {
            let heading = format!("{}. {}:", i + 1, title);
            let pos = prompt[cursor..].find(&heading).unwrap();
            cursor += pos + heading.len();
        }
    }

    #[test]
    fn prompt_is_deterministic() {
        assert_eq!(
            build_prompt("Grape___Black_rot", 0.75, RiskLevel::Medium),
            build_prompt("Grape___Black_rot", 0.75, RiskLevel::Medium)
        );
    }
}
