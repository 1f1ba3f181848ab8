//! Simulated body-language analysis.
//!
//! Produces a stable `BodyLanguageAnalysis` shape from random draws. Only
//! `confidence` and `recommendations` are derived, and both are pure functions
//! of the drawn values.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use rand::Rng;
use serde::Serialize;

const POSTURE_RANGE: RangeInclusive<f64> = 60.0..=95.0;
const EYE_CONTACT_RANGE: RangeInclusive<f64> = 65.0..=90.0;

/// Subtracted from confidence when fidgeting outnumbers calm gestures.
pub const FIDGETING_PENALTY: f64 = 10.0;

const POSTURE_THRESHOLD: f64 = 70.0;
const EYE_CONTACT_THRESHOLD: f64 = 70.0;
const EXPRESSIVE_LIMIT: u32 = 8;

pub const AFFIRMATION: &str =
    "Great body language overall. Keep up the confident, engaged presence.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Gesture {
    Calm,
    Expressive,
    Fidgeting,
    Professional,
}

impl Gesture {
    pub const ALL: [Gesture; 4] = [
        Gesture::Calm,
        Gesture::Expressive,
        Gesture::Fidgeting,
        Gesture::Professional,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gesture::Calm => "calm",
            Gesture::Expressive => "expressive",
            Gesture::Fidgeting => "fidgeting",
            Gesture::Professional => "professional",
        }
    }

    fn count_range(&self) -> RangeInclusive<u32> {
        match self {
            Gesture::Calm => 3..=12,
            Gesture::Expressive => 2..=10,
            Gesture::Fidgeting => 0..=10,
            Gesture::Professional => 4..=12,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BodyLanguageAnalysis {
    pub posture_score: f64,
    pub eye_contact_score: f64,
    pub dominant_gesture: Gesture,
    /// Gesture name → occurrence count.
    pub gesture_analysis: BTreeMap<String, u32>,
    pub confidence: f64,
    pub recommendations: Vec<String>,
    pub simulated: bool,
}

#[cfg(test)]
impl BodyLanguageAnalysis {
    fn gesture_count(&self, gesture: Gesture) -> u32 {
        self.gesture_analysis
            .get(gesture.as_str())
            .copied()
            .unwrap_or(0)
    }
}

/// Draws one synthetic analysis from `rng`.
pub fn analyze_with<R: Rng>(rng: &mut R) -> BodyLanguageAnalysis {
    let posture_score = round2(rng.gen_range(POSTURE_RANGE));
    let eye_contact_score = round2(rng.gen_range(EYE_CONTACT_RANGE));
    let dominant_gesture = Gesture::ALL[rng.gen_range(0..Gesture::ALL.len())];

    let gesture_analysis: BTreeMap<String, u32> = Gesture::ALL
        .iter()
        .map(|g| (g.as_str().to_string(), rng.gen_range(g.count_range())))
        .collect();

    let count = |g: Gesture| gesture_analysis.get(g.as_str()).copied().unwrap_or(0);
    let calm = count(Gesture::Calm);
    let fidgeting = count(Gesture::Fidgeting);
    let expressive = count(Gesture::Expressive);

    let confidence = derive_confidence(posture_score, eye_contact_score, fidgeting, calm);
    let recommendations =
        recommend(posture_score, eye_contact_score, dominant_gesture, expressive);

    BodyLanguageAnalysis {
        posture_score,
        eye_contact_score,
        dominant_gesture,
        gesture_analysis,
        confidence,
        recommendations,
        simulated: true,
    }
}

/// Mean of posture and eye contact, less `FIDGETING_PENALTY` when fidgeting
/// outnumbers calm gestures, clamped to [0, 100].
pub fn derive_confidence(posture: f64, eye_contact: f64, fidgeting: u32, calm: u32) -> f64 {
    let mut confidence = (posture + eye_contact) / 2.0;
    if fidgeting > calm {
        confidence -= FIDGETING_PENALTY;
    }
    round2(confidence.clamp(0.0, 100.0))
}

pub fn recommend(
    posture: f64,
    eye_contact: f64,
    dominant: Gesture,
    expressive_count: u32,
) -> Vec<String> {
    let mut out = Vec::new();

    if posture < POSTURE_THRESHOLD {
        out.push("Sit up straight and keep your shoulders relaxed to project confidence.".to_string());
    }
    if eye_contact < EYE_CONTACT_THRESHOLD {
        out.push("Look at the camera more often to maintain eye contact with the interviewer.".to_string());
    }
    match dominant {
        Gesture::Fidgeting => out.push(
            "Try to keep your hands still; rest them on the table between points.".to_string(),
        ),
        Gesture::Expressive if expressive_count > EXPRESSIVE_LIMIT => out.push(
            "Tone down hand movements slightly so they support rather than distract.".to_string(),
        ),
        _ => {}
    }

    if out.is_empty() {
        out.push(AFFIRMATION.to_string());
    }
    out
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
