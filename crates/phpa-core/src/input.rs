//! Parsing of raw forecaster payloads.
//!
//! Each parser accepts the full text read from the input channel and
//! returns a validated value, or an [`InputError`] that names what was
//! wrong. Nothing here touches stdin directly.

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{InputError, InputResult};
use crate::types::{AlgorithmInput, ENVELOPE_VERSION, Envelope, SeasonalRequest};

/// Parse the payload shared by the walk-forward and moving-average forecasters.
pub fn parse_algorithm_input(raw: &str) -> InputResult<AlgorithmInput> {
    let input: AlgorithmInput = parse_json(raw)?;
    input.validate()?;
    debug!(
        evaluations = input.evaluations.len(),
        look_ahead = input.look_ahead,
        "algorithm input parsed"
    );
    Ok(input)
}

/// Parse a seasonal forecaster request (`action`, `lookAhead`, `data`).
pub fn parse_seasonal_request(raw: &str) -> InputResult<SeasonalRequest> {
    let request: SeasonalRequest = parse_json(raw)?;
    request.validate()?;
    Ok(request)
}

/// Parse a versioned envelope and validate the payload it carries.
pub fn parse_envelope(raw: &str) -> InputResult<Envelope> {
    let envelope: Envelope = parse_json(raw)?;
    if envelope.version != ENVELOPE_VERSION {
        return Err(InputError::UnsupportedVersion(envelope.version));
    }
    envelope.request.validate()?;
    debug!(algorithm = envelope.request.algorithm(), "envelope parsed");
    Ok(envelope)
}

fn parse_json<T: DeserializeOwned>(raw: &str) -> InputResult<T> {
    if raw.trim().is_empty() {
        return Err(InputError::Empty);
    }
    Ok(serde_json::from_str(raw)?)
}
