//! Per-checkpoint ordering of registered extensions.
//!
//! Extensions are ordered by their `before`/`after` realm constraints. Ties
//! are broken by registration order, so an unconstrained extension runs in
//! the order it was added.

use super::{Checkpoint, ExtOptions, LifecycleMethod};
use crate::errors::CycleDetectedError;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

/// An extension as stored by the server.
#[derive(Debug, Clone)]
pub(crate) struct RegisteredExtension {
    /// The plugin (or server) that registered the extension.
    pub realm: String,
    /// Ordering constraints against other realms.
    pub options: ExtOptions,
    /// The callback.
    pub method: Arc<dyn LifecycleMethod>,
}

/// The sorted extensions of one checkpoint.
#[derive(Debug, Default)]
pub(crate) struct ExtensionQueue {
    entries: Vec<RegisteredExtension>,
    order: Vec<usize>,
}

impl ExtensionQueue {
    /// Adds an extension and re-sorts the queue.
    ///
    /// On a contradiction the queue is left unchanged.
    pub fn add(
        &mut self,
        checkpoint: Checkpoint,
        extension: RegisteredExtension,
    ) -> Result<(), CycleDetectedError> {
        self.entries.push(extension);

        match sort(&self.entries) {
            Ok(order) => {
                self.order = order;
                Ok(())
            }
            Err(cycle) => {
                self.entries.pop();
                Err(CycleDetectedError::new(checkpoint, cycle))
            }
        }
    }

    /// Drops every extension registered by `realm`; returns how many went.
    pub fn remove_realm(&mut self, realm: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.realm != realm);

        // A subset of an acyclic queue is acyclic.
        self.order = sort(&self.entries).unwrap_or_else(|_| (0..self.entries.len()).collect());

        before - self.entries.len()
    }

    /// Iterates extensions in execution order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredExtension> {
        self.order.iter().map(|&i| &self.entries[i])
    }

    /// Returns the realms in execution order.
    pub fn realms(&self) -> Vec<String> {
        self.iter().map(|e| e.realm.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Returns true if `a` must run before `b`.
fn precedes(a: &RegisteredExtension, b: &RegisteredExtension) -> bool {
    if a.realm == b.realm {
        return false;
    }
    a.options.before.iter().any(|r| *r == b.realm) || b.options.after.iter().any(|r| *r == a.realm)
}

/// Stable topological sort; returns the realms of a cycle on failure.
fn sort(entries: &[RegisteredExtension]) -> Result<Vec<usize>, Vec<String>> {
    let n = entries.len();
    let successors: Vec<Vec<usize>> = (0..n)
        .map(|i| (0..n).filter(|&j| precedes(&entries[i], &entries[j])).collect())
        .collect();

    let mut in_degree = vec![0usize; n];
    for succ in &successors {
        for &j in succ {
            in_degree[j] += 1;
        }
    }

    let mut ready: BTreeSet<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);

    while let Some(next) = ready.pop_first() {
        order.push(next);
        for &j in &successors[next] {
            in_degree[j] -= 1;
            if in_degree[j] == 0 {
                ready.insert(j);
            }
        }
    }

    if order.len() == n {
        return Ok(order);
    }

    let scheduled: HashSet<usize> = order.into_iter().collect();
    let remaining: Vec<usize> = (0..n).filter(|i| !scheduled.contains(i)).collect();
    Err(find_cycle(&successors, &remaining)
        .into_iter()
        .map(|i| entries[i].realm.clone())
        .collect())
}

/// Finds one cycle among nodes that could not be scheduled.
fn find_cycle(successors: &[Vec<usize>], remaining: &[usize]) -> Vec<usize> {
    fn dfs(
        node: usize,
        successors: &[Vec<usize>],
        visited: &mut HashSet<usize>,
        path: &mut Vec<usize>,
    ) -> Option<Vec<usize>> {
        if let Some(start) = path.iter().position(|&n| n == node) {
            let mut cycle = path[start..].to_vec();
            cycle.push(node);
            return Some(cycle);
        }
        if !visited.insert(node) {
            return None;
        }

        path.push(node);
        for &next in &successors[node] {
            if let Some(cycle) = dfs(next, successors, visited, path) {
                return Some(cycle);
            }
        }
        path.pop();
        None
    }

    let mut visited = HashSet::new();
    for &node in remaining {
        if let Some(cycle) = dfs(node, successors, &mut visited, &mut Vec::new()) {
            return cycle;
        }
    }
    remaining.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::{FnExtension, Flow};
    use crate::request::Request;

    fn ext(realm: &str, options: ExtOptions) -> RegisteredExtension {
        RegisteredExtension {
            realm: realm.to_string(),
            options,
            method: Arc::new(FnExtension::new(realm, |_: &mut Request| Ok(Flow::Continue))),
        }
    }

    fn queue(exts: Vec<RegisteredExtension>) -> ExtensionQueue {
        let mut queue = ExtensionQueue::default();
        for e in exts {
            queue.add(Checkpoint::OnPostAuth, e).unwrap();
        }
        queue
    }

    #[test]
    fn test_registration_order_by_default() {
        let q = queue(vec![
            ext("a", ExtOptions::default()),
            ext("b", ExtOptions::default()),
            ext("c", ExtOptions::default()),
        ]);
        assert_eq!(q.realms(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_before_moves_extension_forward() {
        let q = queue(vec![
            ext("a", ExtOptions::default()),
            ext("b", ExtOptions::default()),
            ext("late", ExtOptions::new().before(["a", "b"])),
        ]);
        assert_eq!(q.realms(), vec!["late", "a", "b"]);
    }

    #[test]
    fn test_after_moves_extension_back() {
        let q = queue(vec![
            ext("first", ExtOptions::new().after(["a", "b"])),
            ext("a", ExtOptions::default()),
            ext("b", ExtOptions::default()),
        ]);
        assert_eq!(q.realms(), vec!["a", "b", "first"]);
    }

    #[test]
    fn test_unknown_realms_are_ignored() {
        let q = queue(vec![
            ext("a", ExtOptions::new().before(["ghost"])),
            ext("b", ExtOptions::new().after(["ghost"])),
        ]);
        assert_eq!(q.realms(), vec!["a", "b"]);
    }

    #[test]
    fn test_remove_realm() {
        let mut q = queue(vec![
            ext("a", ExtOptions::default()),
            ext("b", ExtOptions::new().before(["a"])),
            ext("c", ExtOptions::new().after(["b"])),
            ext("b", ExtOptions::default()),
        ]);
        assert_eq!(q.realms(), vec!["b", "a", "b", "c"]);

        assert_eq!(q.remove_realm("b"), 2);
        assert_eq!(q.realms(), vec!["a", "c"]);
        assert_eq!(q.remove_realm("ghost"), 0);
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn test_cycle_is_rejected() {
        let mut q = queue(vec![ext("a", ExtOptions::new().before(["b"]))]);

        let err = q
            .add(Checkpoint::OnPostAuth, ext("b", ExtOptions::new().before(["a"])))
            .unwrap_err();

        assert_eq!(err.checkpoint, Checkpoint::OnPostAuth);
        assert_eq!(err.cycle_path, vec!["a", "b", "a"]);
        assert_eq!(q.len(), 1);
        assert_eq!(q.realms(), vec!["a"]);
    }
}
