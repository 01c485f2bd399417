//! Per-user aggregation over live detection readings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::RECENT_READINGS_LIMIT;
use crate::emotion::{Emotion, EmotionCounts, EmotionScores};

/// One entry of the `recent` list: a reading reduced to its dominant label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentReading {
    pub timestamp: DateTime<Utc>,
    pub emotion: Emotion,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionSummary {
    pub total: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_emotions: Option<EmotionScores>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dominant_emotion: Option<Emotion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub histogram: Option<EmotionCounts>,
    /// Always present, empty when there is no data.
    pub recent: Vec<RecentReading>,
}

impl EmotionSummary {
    pub fn empty() -> Self {
        Self {
            total: 0,
            average_emotions: None,
            dominant_emotion: None,
            histogram: None,
            recent: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// Summarize readings given in store order (oldest first).
///
/// `recent` holds up to [`RECENT_READINGS_LIMIT`] readings, newest first.
pub fn summarize<'a, I>(readings: I) -> EmotionSummary
where
    I: IntoIterator<Item = (DateTime<Utc>, &'a EmotionScores)>,
{
    let readings: Vec<_> = readings.into_iter().collect();
    let Some(average) = EmotionScores::mean(readings.iter().map(|(_, v)| *v)) else {
        return EmotionSummary::empty();
    };

    let mut histogram = EmotionCounts::default();
    for (_, scores) in &readings {
        histogram.increment(scores.dominant().0);
    }

    let recent = readings
        .iter()
        .rev()
        .take(RECENT_READINGS_LIMIT)
        .map(|(timestamp, scores)| {
            let (emotion, probability) = scores.dominant();
            RecentReading {
                timestamp: *timestamp,
                emotion,
                probability,
            }
        })
        .collect();

    EmotionSummary {
        total: readings.len(),
        dominant_emotion: Some(average.dominant().0),
        average_emotions: Some(average),
        histogram: Some(histogram),
        recent,
    }
}
