//! The six-label emotion vector reported by the client-side detector.
//!
//! Every max or aggregate computation walks labels in [`Emotion::ALL`] order,
//! so ties always resolve to the label that comes first in that list.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SharedError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Neutral,
    Happy,
    Sad,
    Angry,
    Surprised,
    Disgusted,
}

impl Emotion {
    /// Fixed label order used for every tie-break.
    pub const ALL: [Emotion; 6] = [
        Emotion::Neutral,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Surprised,
        Emotion::Disgusted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Neutral => "neutral",
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Surprised => "surprised",
            Emotion::Disgusted => "disgusted",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Emotion::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| SharedError::UnknownEmotion(s.to_string()))
    }
}

/// Probability-like score per label. Missing fields deserialize as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionScores {
    pub neutral: f64,
    pub happy: f64,
    pub sad: f64,
    pub angry: f64,
    pub surprised: f64,
    pub disgusted: f64,
}

impl EmotionScores {
    /// Legacy single-label input: 1 for the named label, 0 elsewhere.
    /// Unrecognized labels produce the all-zero vector.
    pub fn one_hot(label: &str) -> Self {
        let mut scores = Self::default();
        if let Ok(emotion) = label.parse::<Emotion>() {
            scores.set(emotion, 1.0);
        }
        scores
    }

    pub fn get(&self, emotion: Emotion) -> f64 {
        match emotion {
            Emotion::Neutral => self.neutral,
            Emotion::Happy => self.happy,
            Emotion::Sad => self.sad,
            Emotion::Angry => self.angry,
            Emotion::Surprised => self.surprised,
            Emotion::Disgusted => self.disgusted,
        }
    }

    pub fn set(&mut self, emotion: Emotion, value: f64) {
        let slot = match emotion {
            Emotion::Neutral => &mut self.neutral,
            Emotion::Happy => &mut self.happy,
            Emotion::Sad => &mut self.sad,
            Emotion::Angry => &mut self.angry,
            Emotion::Surprised => &mut self.surprised,
            Emotion::Disgusted => &mut self.disgusted,
        };
        *slot = value;
    }

    pub fn is_zero(&self) -> bool {
        Emotion::ALL.iter().all(|e| self.get(*e) == 0.0)
    }

    /// Label with the greatest score and that score. Only a strictly greater
    /// value displaces an earlier label.
    pub fn dominant(&self) -> (Emotion, f64) {
        let mut best = (Emotion::ALL[0], self.get(Emotion::ALL[0]));
        for emotion in &Emotion::ALL[1..] {
            let value = self.get(*emotion);
            if value > best.1 {
                best = (*emotion, value);
            }
        }
        best
    }

    /// Per-label arithmetic mean. `None` for an empty input.
    pub fn mean<'a, I>(vectors: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a EmotionScores>,
    {
        let mut sum = Self::default();
        let mut count = 0usize;
        for v in vectors {
            for e in Emotion::ALL {
                sum.set(e, sum.get(e) + v.get(e));
            }
            count += 1;
        }
        if count == 0 {
            return None;
        }
        for e in Emotion::ALL {
            sum.set(e, sum.get(e) / count as f64);
        }
        Some(sum)
    }
}

/// How often each label was the per-row dominant label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionCounts {
    pub neutral: u32,
    pub happy: u32,
    pub sad: u32,
    pub angry: u32,
    pub surprised: u32,
    pub disgusted: u32,
}

impl EmotionCounts {
    pub fn get(&self, emotion: Emotion) -> u32 {
        match emotion {
            Emotion::Neutral => self.neutral,
            Emotion::Happy => self.happy,
            Emotion::Sad => self.sad,
            Emotion::Angry => self.angry,
            Emotion::Surprised => self.surprised,
            Emotion::Disgusted => self.disgusted,
        }
    }

    pub fn increment(&mut self, emotion: Emotion) {
        match emotion {
            Emotion::Neutral => self.neutral += 1,
            Emotion::Happy => self.happy += 1,
            Emotion::Sad => self.sad += 1,
            Emotion::Angry => self.angry += 1,
            Emotion::Surprised => self.surprised += 1,
            Emotion::Disgusted => self.disgusted += 1,
        }
    }
}
