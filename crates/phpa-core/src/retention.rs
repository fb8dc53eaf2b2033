//! Evaluation retention — which stored evaluations the controller should drop.

use crate::types::Evaluation;

/// Ids of the oldest evaluations beyond `stored_values`, oldest first.
///
/// Evaluations are ordered by creation time (ties broken by id) before the
/// excess is selected, so delivery order does not matter.
pub fn ids_to_remove(evaluations: &[Evaluation], stored_values: usize) -> Vec<i64> {
    if evaluations.len() <= stored_values {
        return Vec::new();
    }
    let mut ordered: Vec<&Evaluation> = evaluations.iter().collect();
    ordered.sort_by(|a, b| a.created.cmp(&b.created).then(a.id.cmp(&b.id)));
    ordered
        .into_iter()
        .take(evaluations.len() - stored_values)
        .map(|e| e.id)
        .collect()
}
