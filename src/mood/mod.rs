//! Mood detection for free-text chat messages
//!
//! The model answers with a JSON object holding a conversational reply and a
//! mood analysis (label plus a 1-10 "rage meter" intensity).

use crate::conversation::Turn;
use crate::model::{GenerateRequest, ModelService, ResponseFormat, ServiceError};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

pub const MOOD_SYSTEM_INSTRUCTION: &str = "You are Tranquility, a warm mental health AI companion.
Your main job:
  1. Offer empathetic, validating, and gentle responses.
  2. Reflect emotional understanding and emotional safety.
  3. Include short, actionable comfort or insight when fitting.
  4. Be concise, 2-3 sentences per response.
  5. Detect emotional tone and intensity and return them as JSON per the schema.
If a message expresses crisis (suicide, harm), convey immediate empathy and concern.
Output ONLY raw JSON matching the schema, with no markdown, preambles, or explanations.";

/// Reply returned to the user when the model cannot be reached or misbehaves
pub const FALLBACK_REPLY: &str =
    "I'm here with you, though something went wrong with my response. Let's try again in a moment.";

/// Mood label used for the fallback reply
pub const FALLBACK_MOOD: &str = "Error";

const MIN_RAGE: i64 = 1;
const MAX_RAGE: i64 = 10;

/// Conversational reply plus detected mood
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodReply {
    pub text: String,
    pub mood: String,
    /// 1 (very calm) to 10 (intense distress); 0 only for the fallback reply
    pub rage_meter: u8,
}

impl MoodReply {
    pub fn fallback() -> Self {
        Self {
            text: FALLBACK_REPLY.to_string(),
            mood: FALLBACK_MOOD.to_string(),
            rage_meter: 0,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.rage_meter == 0 && self.mood == FALLBACK_MOOD
    }
}

#[derive(Debug, Deserialize)]
struct RawMoodReply {
    text: String,
    mood: RawMood,
}

#[derive(Debug, Deserialize)]
struct RawMood {
    mood: String,
    #[serde(rename = "rageMeter")]
    rage_meter: i64,
}

/// Response schema the model must follow
pub fn mood_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "text": {
                "type": "STRING",
                "description": "A helpful, compassionate, and conversational response crafted to comfort and gently support the user."
            },
            "mood": {
                "type": "OBJECT",
                "properties": {
                    "mood": {
                        "type": "STRING",
                        "description": "A short phrase describing the user's emotional tone, e.g., 'Calm', 'Anxious', 'Sad', 'Overwhelmed'."
                    },
                    "rageMeter": {
                        "type": "INTEGER",
                        "description": "A score from 1 (very calm) to 10 (intense distress). Use low numbers for positive/neutral tones and high for strong negative feelings."
                    }
                },
                "required": ["mood", "rageMeter"]
            }
        },
        "required": ["text", "mood"]
    })
}

/// Parse the model's JSON reply, tolerating a surrounding markdown fence
pub fn parse_mood_reply(raw: &str) -> Result<MoodReply, ServiceError> {
    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .unwrap_or(trimmed);

    let parsed: RawMoodReply = serde_json::from_str(body.trim())?;

    Ok(MoodReply {
        text: parsed.text,
        mood: parsed.mood.mood,
        rage_meter: parsed.mood.rage_meter.clamp(MIN_RAGE, MAX_RAGE) as u8,
    })
}

/// Ask the model for a reply and a mood analysis of `message`
pub async fn try_detect_mood(
    service: &dyn ModelService,
    model: &str,
    message: &str,
) -> Result<MoodReply, ServiceError> {
    let request = GenerateRequest::new(model, vec![Turn::user(message)])
        .with_system_instruction(MOOD_SYSTEM_INSTRUCTION)
        .with_response_format(ResponseFormat::json(mood_schema()));

    let response = service.generate(&request).await?;
    let reply = parse_mood_reply(&response.text)?;

    info!("Mood: {}, rage meter: {}", reply.mood, reply.rage_meter);

    Ok(reply)
}

/// Like `try_detect_mood`, but degrades to the fallback reply on any failure
pub async fn detect_mood(service: &dyn ModelService, model: &str, message: &str) -> MoodReply {
    match try_detect_mood(service, model, message).await {
        Ok(reply) => reply,
        Err(e) => {
            error!("Mood detection failed: {}", e);
            MoodReply::fallback()
        }
    }
}
