use serde::{Deserialize, Deserializer, Serialize};

/// One polled data point describing a train's plot images and reveal offset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainRecord {
    #[serde(deserialize_with = "deserialize_train_id")]
    pub id: String,
    pub animation_start: f64,
    pub background_img: String,
    pub foreground_img: String,
}

impl TrainRecord {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        animation_start: f64,
        background_img: impl Into<String>,
        foreground_img: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            animation_start,
            background_img: background_img.into(),
            foreground_img: foreground_img.into(),
        }
    }

    /// Reveal start value for this train after applying the deployment's presentation scale
    #[must_use]
    pub fn scaled_start(&self, presentation_scale: f64) -> f64 {
        self.animation_start * presentation_scale
    }
}

/// Train ids arrive as strings for aggregate views ("All Trains") and as
/// bare numbers for individual trains, depending on who wrote the manifest
fn deserialize_train_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    })
}
