use serde_json::Value as JsonValue;

const REDACTED: &str = "[REDACTED]";

/// Replace free-text and secret fields with a placeholder before a payload is logged.
/// Structural fields (`model`, `role`, numbers) are kept so the log stays useful.
pub fn redact_sensitive_data(data: &JsonValue) -> JsonValue {
    match data {
        JsonValue::Object(map) => {
            let mut redacted_map = serde_json::Map::new();
            for (key, val) in map {
                let redacted_val = if is_sensitive_field(key) {
                    redact_string_value(val)
                } else {
                    redact_sensitive_data(val)
                };
                redacted_map.insert(key.clone(), redacted_val);
            }
            JsonValue::Object(redacted_map)
        }
        JsonValue::Array(arr) => JsonValue::Array(arr.iter().map(redact_sensitive_data).collect()),
        _ => data.clone(),
    }
}

/// Short preview of a secret: first 8 chars, `***`, last 4. Short secrets are fully masked.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 16 {
        return "***".to_string();
    }

    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}***{tail}")
}

fn is_sensitive_field(field_name: &str) -> bool {
    let lower = field_name.to_lowercase();
    matches!(
        lower.as_str(),
        "content"
            | "task_type"
            | "effort_description"
            | "ability_description"
            | "token"
            | "authorization"
            | "secret"
            | "sk"
    )
}

fn redact_string_value(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::String(s) if !s.is_empty() => JsonValue::String(REDACTED.to_string()),
        _ => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chat_payload_keeps_structure_but_hides_text() {
        let payload = json!({
            "model": "deepseek-v3.1-250821",
            "messages": [
                {"role": "system", "content": "你是评分助手"},
                {"role": "user", "content": "任务类型：【写周报】"}
            ]
        });

        let redacted = redact_sensitive_data(&payload);

        assert_eq!(redacted["model"], "deepseek-v3.1-250821");
        assert_eq!(redacted["messages"][0]["role"], "system");
        assert_eq!(redacted["messages"][0]["content"], REDACTED);
        assert_eq!(redacted["messages"][1]["content"], REDACTED);
    }

    #[test]
    fn token_bodies_are_redacted() {
        let body = json!({"token": "bce-v3/ALTAK-xyz", "status": "enable", "expireTime": "2025-04-09T00:00:00Z"});
        let redacted = redact_sensitive_data(&body);

        assert_eq!(redacted["token"], REDACTED);
        assert_eq!(redacted["status"], "enable");
        assert_eq!(redacted["expireTime"], "2025-04-09T00:00:00Z");
    }

    #[test]
    fn mask_secret_shows_only_edges() {
        assert_eq!(mask_secret("bce-v3/ALTAK-0123456789/abcd"), "bce-v3/A***abcd");
        assert_eq!(mask_secret("short"), "***");
    }
}
