//! Normalization of the model's free-text answer into a [`LocationAnalysis`].

use crate::models::{Coordinates, LocationAnalysis, LocationCandidate, MAX_LOCATIONS};
use crate::{Error, Result};
use serde_json::Value;

/// Remove Markdown code fences the model sometimes wraps its JSON in.
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

fn parse_error(raw: &str, error: serde_json::Error) -> Error {
    Error::AnalysisParse {
        raw: raw.to_string(),
        reason: error.to_string(),
    }
}

/// Parse model output. Accepts the canonical `{interpretation, locations}`
/// shape and a bare single location (`city` at the top level). At most
/// [`MAX_LOCATIONS`] candidates are kept, in the model's order.
pub fn parse_location_analysis(raw: &str) -> Result<LocationAnalysis> {
    let cleaned = strip_code_fences(raw);
    let value: Value = serde_json::from_str(&cleaned).map_err(|e| parse_error(raw, e))?;

    let mut analysis = if is_single_location(&value) {
        wrap_single_location(&value).map_err(|e| parse_error(raw, e))?
    } else {
        serde_json::from_value::<LocationAnalysis>(value).map_err(|e| parse_error(raw, e))?
    };

    if analysis.locations.len() > MAX_LOCATIONS {
        tracing::debug!(
            "Model returned {} locations, keeping the first {}",
            analysis.locations.len(),
            MAX_LOCATIONS
        );
        analysis.locations.truncate(MAX_LOCATIONS);
    }

    Ok(analysis)
}

fn is_single_location(value: &Value) -> bool {
    value.get("city").is_some() && value.get("locations").is_none()
}

fn wrap_single_location(value: &Value) -> std::result::Result<LocationAnalysis, serde_json::Error> {
    let mut candidate: LocationCandidate = serde_json::from_value(value.clone())?;
    if candidate.coordinates.is_none() {
        candidate.coordinates = Some(Coordinates::default());
    }

    let interpretation = value
        .get("interpretation")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(LocationAnalysis {
        interpretation,
        locations: vec![candidate],
    })
}
