/// Returned when the conversation holds no assistant turn.
pub const NO_RESPONSE: &str = "No response content.";

/// Sentinel some model backends leave at the end of their text.
const UNDEFINED_SENTINEL: &str = "undefined";

/// Turn the final assistant text into the caller-facing answer.
pub fn extract_answer(text: Option<&str>) -> String {
    let Some(text) = text else {
        return NO_RESPONSE.to_string();
    };
    let trimmed = text.trim();
    let trimmed = trimmed
        .strip_suffix(UNDEFINED_SENTINEL)
        .map(str::trim_end)
        .unwrap_or(trimmed);
    if trimmed.is_empty() {
        NO_RESPONSE.to_string()
    } else {
        trimmed.to_string()
    }
}
