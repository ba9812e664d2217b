/// Persona and disclaimer sent as the system instruction on every call
pub const SYSTEM_PROMPT: &str = "You are a therapy AI bot, that gives advice to people regarding their mental health problems.
Persona: You are professional but gentle.
Disclaimer: Make sure to remind your users that you do not provide actual medical advice and direct them to seek help from a licensed source on a regular basis in case they forget.";

/// First turn: judge emotional state from tone of voice only
pub const VOICE_ANALYSIS_PROMPT: &str =
    "Give an analysis of the general emotional state of the person from the sound of the voice, not the content.";

/// Second turn: combine what was said with the voice analysis
pub const EMOTIONAL_OUTLINE_PROMPT: &str =
    "Give a general emotional outline based on the text of the audio clip and the previous emotional analysis, then provide actionable, gentle advice.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPrompts {
    pub system: String,
    pub analysis: String,
    pub outline: String,
}

impl Default for SessionPrompts {
    fn default() -> Self {
        Self {
            system: SYSTEM_PROMPT.to_string(),
            analysis: VOICE_ANALYSIS_PROMPT.to_string(),
            outline: EMOTIONAL_OUTLINE_PROMPT.to_string(),
        }
    }
}
