use super::AdvisoryError;
use super::prompt::SECTION_TITLES;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: &'static str,
    pub body: String,
}

/// Generated advisory that contains all seven sections, in order, each with a
/// non-empty body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvisoryReport {
    text: String,
    sections: Vec<Section>,
}

impl AdvisoryReport {
    pub fn parse(text: &str) -> Result<Self, AdvisoryError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AdvisoryError::EmptyResponse);
        }
        // ASCII lowercasing keeps byte offsets aligned with `text`
        let lower = text.to_ascii_lowercase();

        let mut starts = Vec::with_capacity(SECTION_TITLES.len());
        let mut cursor = 0;
        for title in SECTION_TITLES {
            let needle = title.to_ascii_lowercase();
            let pos = lower[cursor..]
                .find(&needle)
                .map(|p| cursor + p)
                .ok_or_else(|| AdvisoryError::Malformed(title.to_string()))?;
            cursor = pos + needle.len();
            starts.push((title, pos, cursor));
        }

        let mut sections = Vec::with_capacity(starts.len());
        for (i, &(title, _, body_start)) in starts.iter().enumerate() {
            let body_end = starts.get(i + 1).map_or(text.len(), |next| next.1);
            let body = clean_body(&text[body_start..body_end]);
            if !body.chars().any(char::is_alphanumeric) {
                return Err(AdvisoryError::Malformed(title.to_string()));
            }
            sections.push(Section {
                title,
                body: body.to_string(),
            });
        }

        Ok(Self {
            text: text.to_string(),
            sections,
        })
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Strips heading punctuation after the title and the next heading's
/// numbering (`6.`, `**`, `###`) before the following title.
fn clean_body(raw: &str) -> &str {
    raw.trim_start_matches(|c: char| c == ':' || c == '*' || c.is_whitespace())
        .trim_end_matches(|c: char| {
            c.is_ascii_digit() || c == '.' || c == '*' || c == '#' || c.is_whitespace()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "1. Disease Explanation:
Late blight is a fungal-like disease that spreads fast in cool, wet weather.

2. Immediate Actions:
- Remove infected leaves
- Avoid overhead watering
- Isolate affected plants

3. Organic Treatment Options:
- Copper-based sprays approved for organic use
- Improve airflow
- Mulch the soil

4. Chemical Treatment Options:
- Chlorothalonil according to the label
- Mancozeb according to the label
- Rotate active ingredients

5. Prevention Strategies:
- Plant resistant varieties
- Space plants well
- Rotate crops

6. Severity Level Explanation:
- High confidence means act now
- The disease can destroy a crop within days

7. Safety Disclaimer:
Consult a local agricultural expert before any chemical treatment.";

    #[test]
    fn parses_well_formed_report() {
        let report = AdvisoryReport::parse(SAMPLE).unwrap();
        assert_eq!(report.sections().len(), 7);
        assert_eq!(report.sections()[0].title, "Disease Explanation");
        assert!(report.sections()[1].body.starts_with("- Remove infected leaves"));
        assert!(report.sections()[5].body.ends_with("within days"));
        assert_eq!(report.text(), SAMPLE);
    }

    #[test]
    fn accepts_markdown_headings() {
        let markdown = SAMPLE
            .lines()
            .map(|l| {
                if l.chars().next().is_some_and(|c| c.is_ascii_digit()) {
                    format!("**{}**", l)
                } else {
                    l.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("\n");
        let report = AdvisoryReport::parse(&markdown).unwrap();
        assert_eq!(report.sections()[6].title, "Safety Disclaimer");
        assert!(report.sections()[6].body.starts_with("Consult"));
    }

    #[test]
    fn missing_section_is_malformed() {
        let text = SAMPLE.replace("5. Prevention Strategies:", "5. Other:");
        match AdvisoryReport::parse(&text) {
            Err(AdvisoryError::Malformed(title)) => assert_eq!(title, "Prevention Strategies"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn empty_section_is_malformed() {
        let text = SAMPLE.replace(
            "Consult a local agricultural expert before any chemical treatment.",
            "",
        );
        assert!(matches!(
            AdvisoryReport::parse(&text),
            Err(AdvisoryError::Malformed(_))
        ));

        let text = SAMPLE.replace(
            "- High confidence means act now\n- The disease can destroy a crop within days",
            "-\n-",
        );
        assert!(matches!(
            AdvisoryReport::parse(&text),
            Err(AdvisoryError::Malformed(_))
        ));
    }

    #[test]
    fn out_of_order_sections_are_malformed() {
        let text = "7. Safety Disclaimer:\nAsk an expert.\n".to_string() + SAMPLE;
        // the leading disclaimer is ignored; the ordered copy still parses
        assert!(AdvisoryReport::parse(&text).is_ok());

        let swapped = SAMPLE
            .replace("1. Disease Explanation:", "TMP")
            .replace("2. Immediate Actions:", "1. Disease Explanation:")
            .replace("TMP", "2. Immediate Actions:");
        assert!(AdvisoryReport::parse(&swapped).is_err());
    }

    #[test]
    fn blank_text_is_empty_response() {
        assert!(matches!(
            AdvisoryReport::parse("  \n"),
            Err(AdvisoryError::EmptyResponse)
        ));
    }
}
