//! C3 linearization (method resolution order)

use std::sync::Arc;

use super::Class;
use crate::error::{Result, RuntimeError};
use crate::scope::Scope;

impl Class {
    /// Compute or return the memoized method resolution order.
    ///
    /// The result lists qualified names, this class first. Parents are
    /// looked up in `scope`. The cache is written only after a fully
    /// successful computation, and once written it is authoritative.
    ///
    /// # Errors
    ///
    /// - `NotFound` if a parent class is not visible from `scope`
    /// - `InconsistentHierarchy` if no linearization exists or the
    ///   hierarchy contains a cycle
    pub fn mro(&self, scope: &Scope) -> Result<Arc<[String]>> {
        self.compute_mro(scope, &mut Vec::new())
    }

    fn compute_mro(&self, scope: &Scope, stack: &mut Vec<String>) -> Result<Arc<[String]>> {
        if let Some(mro) = self.mro.get() {
            return Ok(Arc::clone(mro));
        }
        if stack.iter().any(|name| name == self.qualified_name()) {
            return Err(RuntimeError::InconsistentHierarchy {
                class: self.qualified_name().to_string(),
                reason: format!("inheritance cycle through {}", stack.join(" -> ")),
            });
        }

        let parents = self.parents();
        let linearization = if parents.is_empty() {
            vec![self.qualified_name().to_string()]
        } else {
            stack.push(self.qualified_name().to_string());

            let mut sequences = Vec::with_capacity(parents.len() + 1);
            let mut direct = Vec::with_capacity(parents.len());
            for parent in &parents {
                let parent = scope.get_class(parent)?;
                sequences.push(parent.compute_mro(scope, stack)?.to_vec());
                direct.push(parent.qualified_name().to_string());
            }
            // Local precedence order is the final merge input.
            sequences.push(direct);

            stack.pop();

            let merged = c3_merge(&sequences).map_err(|reason| {
                RuntimeError::InconsistentHierarchy {
                    class: self.qualified_name().to_string(),
                    reason,
                }
            })?;

            let mut linearization = Vec::with_capacity(merged.len() + 1);
            linearization.push(self.qualified_name().to_string());
            linearization.extend(merged);
            linearization
        };

        tracing::debug!(
            class = self.qualified_name(),
            mro = ?linearization,
            "computed method resolution order"
        );

        // Another thread may have won the race; its result is identical.
        let _ = self.mro.set(Arc::from(linearization));
        self.mro.get().cloned().ok_or_else(|| RuntimeError::InconsistentHierarchy {
            class: self.qualified_name().to_string(),
            reason: "method resolution order was not recorded".to_string(),
        })
    }
}

/// Merge linearizations with the C3 rule.
///
/// Repeatedly takes the first head (in input order) that appears in no
/// sequence's tail, appends it, and strips it from the front of every
/// sequence it heads. Fails when only blocked heads remain.
pub(crate) fn c3_merge(sequences: &[Vec<String>]) -> std::result::Result<Vec<String>, String> {
    let mut work: Vec<&[String]> = sequences
        .iter()
        .map(Vec::as_slice)
        .filter(|seq| !seq.is_empty())
        .collect();
    let mut result = Vec::new();

    while !work.is_empty() {
        let head = work
            .iter()
            .map(|seq| &seq[0])
            .find(|candidate| !work.iter().any(|seq| seq[1..].contains(*candidate)))
            .cloned();

        let Some(head) = head else {
            let blocked: Vec<&str> = work.iter().map(|seq| seq[0].as_str()).collect();
            return Err(format!(
                "cannot create a consistent method resolution order (blocked heads: {})",
                blocked.join(", ")
            ));
        };

        for seq in work.iter_mut() {
            if seq[0] == head {
                *seq = &seq[1..];
            }
        }
        work.retain(|seq| !seq.is_empty());
        result.push(head);
    }

    Ok(result)
}
