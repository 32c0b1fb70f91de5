use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::itinerary::{Day, PlaceEntry};

/// What a user asked the day generator for
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub language: Option<String>,
    pub city: String,
    pub country: String,
}

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("generator unavailable: {0}")]
    Unavailable(String),

    #[error("generator returned malformed output: {0}")]
    Malformed(String),
}

/// External collaborator that drafts days for an itinerary.
///
/// How the days are produced (a language model, a template, a fixture) is
/// none of the core's business; it only appends what comes back.
#[async_trait]
pub trait DayGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<Day>, GeneratorError>;
}

/// Generator over text a model already produced, e.g. a saved completion.
///
/// The text is parsed with [`parse_generated_days`] on every call.
#[derive(Debug, Clone)]
pub struct ModelOutputGenerator {
    raw: String,
}

impl ModelOutputGenerator {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }
}

#[async_trait]
impl DayGenerator for ModelOutputGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<Day>, GeneratorError> {
        let days = parse_generated_days(&self.raw)?;
        tracing::debug!("Parsed {} generated day(s) for {}, {}", days.len(), request.city, request.country);
        Ok(days)
    }
}

#[derive(Deserialize)]
struct GeneratedItinerary {
    itinerary: Vec<GeneratedDay>,
}

#[derive(Deserialize)]
struct GeneratedDay {
    day: String,
    #[serde(default)]
    description: Vec<GeneratedPlace>,
}

#[derive(Deserialize)]
struct GeneratedPlace {
    place: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    tips: Option<String>,
}

/// Parse raw generator text of the form `{"destination": .., "itinerary": [..]}`.
///
/// Models tend to wrap the JSON in prose or code fences, so only the outermost
/// `{...}` span is parsed. Every generated place starts unchecked with empty tips
/// when none were given.
pub fn parse_generated_days(raw: &str) -> Result<Vec<Day>, GeneratorError> {
    let start = raw.find('{');
    let end = raw.rfind('}');
    let json = match (start, end) {
        (Some(start), Some(end)) if start < end => &raw[start..=end],
        _ => return Err(GeneratorError::Malformed("no JSON object in output".to_string())),
    };

    let generated: GeneratedItinerary =
        serde_json::from_str(json).map_err(|e| GeneratorError::Malformed(e.to_string()))?;

    Ok(generated
        .itinerary
        .into_iter()
        .map(|day| Day {
            day: day.day,
            description: day
                .description
                .into_iter()
                .map(|place| PlaceEntry {
                    place: place.place,
                    description: place.description,
                    tips: Some(place.tips.unwrap_or_default()),
                    checked: false,
                })
                .collect(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fenced_model_output() {
        let raw = r#"Here you go:
```json
{"destination":"Rome","itinerary":[{"day":"Day 1","description":[{"place":"Colosseum","description":"Arena","tips":"Book ahead"},{"place":"Forum","description":"Ruins"}]}]}
```"#;

        let days = parse_generated_days(raw).unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].day, "Day 1");
        assert_eq!(days[0].description[0].tips.as_deref(), Some("Book ahead"));
        assert_eq!(days[0].description[1].tips.as_deref(), Some(""));
        assert!(days[0].description.iter().all(|p| !p.checked));
    }

    #[tokio::test]
    async fn model_output_generator_parses_on_generate() {
        let request = GenerationRequest {
            prompt: "two museums".to_string(),
            language: None,
            city: "Madrid".to_string(),
            country: "Spain".to_string(),
        };

        let generator = ModelOutputGenerator::new(
            r#"{"itinerary":[{"day":"Day 1","description":[{"place":"Prado","description":"Art"}]}]}"#,
        );
        let days = generator.generate(&request).await.unwrap();
        let prado = PlaceEntry {
            tips: Some(String::new()),
            ..PlaceEntry::new("Prado", "Art")
        };
        assert_eq!(days, vec![Day::new("Day 1", vec![prado])]);

        let broken = ModelOutputGenerator::new("{\"itinerary\": [");
        assert!(matches!(broken.generate(&request).await, Err(GeneratorError::Malformed(_))));
    }

    #[test]
    fn rejects_output_without_days() {
        assert!(matches!(parse_generated_days("sorry, I can't"), Err(GeneratorError::Malformed(_))));
        assert!(matches!(
            parse_generated_days(r#"{"destination":"Rome"}"#),
            Err(GeneratorError::Malformed(_))
        ));
    }
}
