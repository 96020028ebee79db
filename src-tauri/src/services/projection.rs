use crate::error::UploadError;
use crate::models::analysis_types::{AnalysisResult, PlotImage, StatsTable};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Body of a successful `/upload` response. Every key is optional.
#[derive(Deserialize)]
struct AnalysisResponse {
    summary: Option<StatsTable>,
    descriptive_stats: Option<Map<String, Value>>,
    numerical_distribution: Option<String>,
    categorical_distributions: Option<BTreeMap<String, PlotImage>>,
    correlation_plot: Option<String>,
    filename: Option<String>,
    shape: Option<(u64, u64)>,
}

/// Parse and project a raw response body. Pandas statistics routinely
/// contain `NaN`, which the service emits as a bare token; those (and
/// `Infinity`/`-Infinity`) are read as `null`.
pub fn project_bytes(body: &[u8]) -> Result<AnalysisResult, UploadError> {
    let body = null_non_finite(body);
    let value: Value = serde_json::from_slice(&body)?;
    project(value)
}

/// Structural pass-through from the response body to [`AnalysisResult`].
/// Image payloads are not decoded; `null` and `""` plots count as absent.
pub fn project(body: Value) -> Result<AnalysisResult, UploadError> {
    if !body.is_object() {
        return Err(UploadError::MalformedResponse(format!(
            "expected a JSON object, got {}",
            json_type_name(&body)
        )));
    }

    let response: AnalysisResponse = serde_json::from_value(body)?;

    Ok(AnalysisResult {
        summary: response.summary,
        descriptive_stats: response.descriptive_stats,
        numerical_plot: non_empty_plot(response.numerical_distribution),
        categorical_plots: response.categorical_distributions,
        correlation_plot: non_empty_plot(response.correlation_plot),
        filename: response.filename,
        shape: response.shape,
    })
}

/// Replace non-finite number tokens outside string literals with `null`.
fn null_non_finite(body: &[u8]) -> Cow<'_, [u8]> {
    const TOKENS: [&[u8]; 3] = [b"-Infinity", b"Infinity", b"NaN"];

    let mut out: Option<Vec<u8>> = None;
    let mut in_string = false;
    let mut escaped = false;
    let mut i = 0;

    while i < body.len() {
        let byte = body[i];
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
        } else if byte == b'"' {
            in_string = true;
        } else if let Some(token) = TOKENS.into_iter().find(|t| body[i..].starts_with(t)) {
            out.get_or_insert_with(|| body[..i].to_vec())
                .extend_from_slice(b"null");
            i += token.len();
            continue;
        }

        if let Some(out) = out.as_mut() {
            out.push(byte);
        }
        i += 1;
    }

    match out {
        Some(rewritten) => Cow::Owned(rewritten),
        None => Cow::Borrowed(body),
    }
}

fn non_empty_plot(raw: Option<String>) -> Option<PlotImage> {
    raw.filter(|s| !s.is_empty()).map(PlotImage)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
