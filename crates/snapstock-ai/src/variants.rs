//! Variant text parsing: deterministic first, AI fallback second.
//!
//! Dictated transcripts like "small 4, medium 5, large 7" must round-trip
//! exact quantities, so a rule-based parse runs before any model call and
//! wins whenever it matches. The model only sees transcripts the rules
//! cannot handle (e.g. multi-option phrasing like "sizes S M L and colors
//! red, blue").

use snapstock_core::{VariantOption, VariantOptionSet};

use crate::client::GenPart;
use crate::error::AiError;
use crate::prompts;
use crate::scan::{strip_code_fences, ScanAnalyzer, ANALYZE_TIMEOUT};

impl ScanAnalyzer {
    /// Parses free-form variant text into a normalized option set.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`AiError`] only when deterministic parsing
    /// yields nothing and the model call fails — there is no fallback
    /// product here, the dashboard shows the parse error instead.
    pub async fn parse_variant_text(&self, transcript: &str) -> Result<VariantOptionSet, AiError> {
        if let Some(set) = parse_deterministic(transcript) {
            return Ok(set.normalized());
        }

        let prompt = prompts::variant_parsing(transcript);
        let text = self
            .generative()
            .generate(vec![GenPart::Text(prompt)], ANALYZE_TIMEOUT)
            .await?;
        let stripped = strip_code_fences(&text);
        let loose: serde_json::Value =
            serde_json::from_str(stripped).map_err(|e| AiError::Deserialize {
                context: "variant parsing reply".to_string(),
                source: e,
            })?;

        Ok(normalize_loose_options(&loose))
    }
}

/// Rule-based parse of "value [quantity], value [quantity], …".
///
/// Split on commas; within each clause, a trailing non-negative integer is
/// that value's quantity, otherwise the whole clause is a value with an
/// implicit quantity of 1. Any clause list that yields at least one value is
/// consumed here — "red, blue" parses deterministically as [1, 1] and never
/// reaches the model. Returns `None` only for an effectively empty
/// transcript.
#[must_use]
pub fn parse_deterministic(transcript: &str) -> Option<VariantOptionSet> {
    let trimmed = transcript.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut values = Vec::new();
    let mut quantities = Vec::new();

    for clause in trimmed.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        let tokens: Vec<&str> = clause.split_whitespace().collect();
        if tokens.len() >= 2 {
            if let Ok(quantity) = tokens[tokens.len() - 1].parse::<i64>() {
                if quantity >= 0 {
                    values.push(tokens[..tokens.len() - 1].join(" "));
                    quantities.push(quantity);
                    continue;
                }
            }
        }
        values.push(tokens.join(" "));
        quantities.push(1);
    }

    if values.is_empty() {
        return None;
    }

    Some(VariantOptionSet {
        options: vec![VariantOption {
            name: "Size".to_string(),
            values,
            quantities: Some(quantities),
        }],
    })
}

/// Normalizes a loosely-typed options payload from the model: values coerced
/// to strings, quantities to integers (kept only when aligned with values),
/// empty options dropped, missing names defaulted.
#[must_use]
pub fn normalize_loose_options(loose: &serde_json::Value) -> VariantOptionSet {
    let raw_options = loose
        .get("options")
        .and_then(serde_json::Value::as_array)
        .cloned()
        .unwrap_or_default();

    let options = raw_options
        .iter()
        .map(|o| {
            let name = o
                .get("name")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("Option")
                .to_string();
            let values: Vec<String> = o
                .get("values")
                .and_then(serde_json::Value::as_array)
                .map(|vs| vs.iter().map(coerce_to_string).collect())
                .unwrap_or_default();
            let quantities: Option<Vec<i64>> = o
                .get("quantities")
                .and_then(serde_json::Value::as_array)
                .map(|qs| qs.iter().map(coerce_to_i64).collect());
            VariantOption {
                name,
                values,
                quantities,
            }
        })
        .collect();

    VariantOptionSet { options }.normalized()
}

fn coerce_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn coerce_to_i64(value: &serde_json::Value) -> i64 {
    match value {
        serde_json::Value::Number(n) => n.as_i64().unwrap_or_else(|| {
            n.as_f64().map_or(0, |f| {
                #[allow(clippy::cast_possible_truncation)]
                let truncated = f as i64;
                truncated
            })
        }),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}
