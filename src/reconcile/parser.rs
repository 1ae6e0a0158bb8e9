use serde_json::Value;

use super::ReconcileError;

/// Strip code fences and cut the reply down to its outermost `{...}` span.
pub fn extract_json_object(response: &str) -> Result<&str, ReconcileError> {
    let mut text = response.trim();

    if let Some(start) = text.find("```json") {
        let body = start + "```json".len();
        if let Some(end) = text[body..].find("```") {
            text = text[body..body + end].trim();
        }
    } else if let Some(start) = text.find("```") {
        let body = start + 3;
        if let Some(end) = text[body..].find("```") {
            text = text[body..body + end].trim();
        }
    }

    let open = text
        .find('{')
        .ok_or_else(|| ReconcileError::MalformedResponse("No JSON object found".into()))?;
    let close = text
        .rfind('}')
        .filter(|&close| close > open)
        .ok_or_else(|| ReconcileError::MalformedResponse("Unclosed JSON object".into()))?;

    Ok(&text[open..=close])
}

/// Decode the model reply into a JSON object.
pub fn parse_feedback_json(response: &str) -> Result<Value, ReconcileError> {
    let json = extract_json_object(response)?;
    let value: Value =
        serde_json::from_str(json).map_err(|e| ReconcileError::JsonParsing(e.to_string()))?;
    if !value.is_object() {
        return Err(ReconcileError::MalformedResponse(
            "Top-level JSON value is not an object".into(),
        ));
    }
    Ok(value)
}
