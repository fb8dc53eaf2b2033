//! Result emission on stdout.
//!
//! A successful invocation writes exactly one value and nothing else;
//! diagnostics go to stderr.

use std::io::Write;

/// The single value an invocation produces.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// Predicted replica count, written bare with no trailing newline.
    Replicas(i64),
    /// Seasonal point forecasts as a compact JSON array.
    Forecast(Vec<f64>),
    /// Acknowledgement of a seasonal training run.
    Trained,
    /// Evaluation ids the controller should delete.
    Ids(Vec<i64>),
}

impl Output {
    pub fn render(&self) -> serde_json::Result<String> {
        match self {
            Output::Replicas(n) => Ok(n.to_string()),
            Output::Forecast(values) => serde_json::to_string(values),
            Output::Trained => Ok(serde_json::json!({ "success": 1 }).to_string()),
            Output::Ids(ids) => serde_json::to_string(ids),
        }
    }
}

/// Write `output` to `out` in one call and flush.
pub fn emit<W: Write>(out: &mut W, output: &Output) -> anyhow::Result<()> {
    let rendered = output.render()?;
    out.write_all(rendered.as_bytes())?;
    out.flush()?;
    Ok(())
}
