//! Strict judge-response validation.
//!
//! The raw completion must be one JSON object carrying every required
//! field. The only coercions are:
//! - a Markdown code fence around the object is removed
//! - an integral float score (`7.0`) is read as an integer
//! - a confidence in `(1, 100]` is read as a percentage
//! - the legacy key `alignment` is accepted for `status`
//!
//! Anything else is a [`JudgeError::Malformed`]; no field is defaulted
//! except the optional extras.

use intentgate_core::{AlignmentStatus, JudgeError, Judgment, RiskLevel, MAX_SCORE};
use serde_json::{Map, Value};

type Object = Map<String, Value>;

/// Parse a raw judge response into a validated [`Judgment`].
pub fn parse_judgment(raw: &str) -> Result<Judgment, JudgeError> {
    let body = strip_code_fence(raw);
    if body.is_empty() {
        return Err(JudgeError::malformed("empty response"));
    }

    let value: Value = serde_json::from_str(body)
        .map_err(|e| JudgeError::malformed(format!("response is not JSON: {e}")))?;
    let obj = value
        .as_object()
        .ok_or_else(|| JudgeError::malformed("response is not a JSON object"))?;

    let score = parse_score(required(obj, "score")?)?;
    let confidence = parse_confidence(required(obj, "confidence")?)?;
    let status = parse_status(obj)?;
    let key_functionality_present = required(obj, "key_functionality_present")?
        .as_bool()
        .ok_or_else(|| JudgeError::malformed("`key_functionality_present` must be a boolean"))?;

    let mut judgment = Judgment::new(score, confidence, status)
        .with_key_functionality(key_functionality_present);
    judgment.matches = string_list(obj, "matches")?;
    judgment.discrepancies = string_list(obj, "discrepancies")?;
    judgment.suggestions = string_list(obj, "suggestions")?;

    judgment.intent_summary = optional_string(obj, "intent_summary")?;
    judgment.actual_changes = optional_string(obj, "actual_changes")?;
    judgment.risk_level = match optional_string(obj, "risk_level")? {
        None => None,
        Some(raw) => Some(
            RiskLevel::parse(&raw)
                .ok_or_else(|| JudgeError::malformed(format!("unknown risk_level {raw:?}")))?,
        ),
    };
    judgment.needs_human_review = match obj.get("needs_human_review") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(_) => return Err(JudgeError::malformed("`needs_human_review` must be a boolean")),
    };

    Ok(judgment)
}

/// Remove a surrounding ```` ``` ```` / ```` ```json ```` fence, if any.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn required<'a>(obj: &'a Object, key: &str) -> Result<&'a Value, JudgeError> {
    match obj.get(key) {
        None | Some(Value::Null) => Err(JudgeError::malformed(format!("missing field `{key}`"))),
        Some(v) => Ok(v),
    }
}

fn parse_score(value: &Value) -> Result<u8, JudgeError> {
    let n = value
        .as_f64()
        .ok_or_else(|| JudgeError::malformed(format!("`score` must be a number, got {value}")))?;
    if n.fract() != 0.0 {
        return Err(JudgeError::malformed(format!("`score` must be an integer, got {n}")));
    }
    if !(0.0..=f64::from(MAX_SCORE)).contains(&n) {
        return Err(JudgeError::malformed(format!(
            "`score` {n} is outside 0..={MAX_SCORE}"
        )));
    }
    Ok(n as u8)
}

fn parse_confidence(value: &Value) -> Result<f64, JudgeError> {
    let c = value.as_f64().ok_or_else(|| {
        JudgeError::malformed(format!("`confidence` must be a number, got {value}"))
    })?;
    if (0.0..=1.0).contains(&c) {
        Ok(c)
    } else if c > 1.0 && c <= 100.0 {
        Ok(c / 100.0)
    } else {
        Err(JudgeError::malformed(format!(
            "`confidence` {c} is outside 0.0..=1.0"
        )))
    }
}

fn parse_status(obj: &Object) -> Result<AlignmentStatus, JudgeError> {
    let value = match (obj.get("status"), obj.get("alignment")) {
        (Some(v), _) if !v.is_null() => v,
        (_, Some(v)) if !v.is_null() => v,
        _ => return Err(JudgeError::malformed("missing field `status`")),
    };
    let raw = value
        .as_str()
        .ok_or_else(|| JudgeError::malformed("`status` must be a string"))?;
    AlignmentStatus::parse(raw)
        .ok_or_else(|| JudgeError::malformed(format!("unknown status {raw:?}")))
}

fn string_list(obj: &Object, key: &str) -> Result<Vec<String>, JudgeError> {
    let items = required(obj, key)?
        .as_array()
        .ok_or_else(|| JudgeError::malformed(format!("`{key}` must be an array")))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| JudgeError::malformed(format!("`{key}` must contain only strings")))
        })
        .collect()
}

fn optional_string(obj: &Object, key: &str) -> Result<Option<String>, JudgeError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(JudgeError::malformed(format!("`{key}` must be a string"))),
    }
}
