//! Setup-time ordering against the other registered plugins.

/// Realms to run before (at capture) and after (at restore).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderConstraints {
    /// Realms whose post-auth extensions must run after the capture.
    pub before: Vec<String>,
    /// Realms whose pre-handler extensions must run before the restore.
    pub after: Vec<String>,
}

/// Computes the constraints from the registrations known right now.
///
/// Both lists hold every registered realm except `self_id`. Plugins that
/// register later are not covered.
#[must_use]
pub fn resolve(registered: &[String], self_id: &str) -> OrderConstraints {
    let others: Vec<String> = registered
        .iter()
        .filter(|name| name.as_str() != self_id)
        .cloned()
        .collect();

    OrderConstraints {
        before: others.clone(),
        after: others,
    }
}
