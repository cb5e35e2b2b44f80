// ---------------------------------------------------------------------------
// TransitionGraph
// ---------------------------------------------------------------------------

/// Generic finite-state machine: a current state plus a set of permitted
/// transitions. Transition attempts report success as a `bool` and an illegal
/// attempt leaves the state untouched, so callers can probe freely.
#[derive(Debug, Clone)]
pub struct TransitionGraph<S> {
    state: S,
    edges: Vec<(S, Vec<S>)>,
}

impl<S: Clone + PartialEq> TransitionGraph<S> {
    pub fn new(initial: S) -> Self {
        Self {
            state: initial,
            edges: Vec::new(),
        }
    }

    /// Permit `from -> to`. Idempotent: re-adding an existing edge is a no-op.
    pub fn add_edge(&mut self, from: S, to: S) {
        if let Some((_, targets)) = self.edges.iter_mut().find(|(s, _)| *s == from) {
            if !targets.contains(&to) {
                targets.push(to);
            }
        } else {
            self.edges.push((from, vec![to]));
        }
    }

    /// True if `state -> to` is a permitted edge.
    pub fn can_transition(&self, to: &S) -> bool {
        self.edges
            .iter()
            .find(|(s, _)| *s == self.state)
            .is_some_and(|(_, targets)| targets.contains(to))
    }

    /// Move to `to` if permitted. Returns `true` on success; on `false` the
    /// current state is unchanged.
    pub fn transition(&mut self, to: S) -> bool {
        if !self.can_transition(&to) {
            return false;
        }
        self.state = to;
        true
    }

    pub fn current_state(&self) -> &S {
        &self.state
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
