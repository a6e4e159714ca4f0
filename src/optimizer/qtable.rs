//! Tabular action values with optional LRU eviction of whole state rows.

use std::collections::HashMap;

use serde::Serialize;

use crate::catalog::{Tactic, TacticSpace};

/// The tactic a side is currently playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct State(pub Tactic);

/// The tactic chosen for the next match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Action(pub Tactic);

#[derive(Debug, Clone, Default)]
struct Row {
    values: HashMap<Action, f64>,
    last_used: u64,
}

/// Unseen `(state, action)` pairs read as `0.0`.
#[derive(Debug, Clone)]
pub struct QTable {
    rows: HashMap<State, Row>,
    capacity: Option<usize>,
    clock: u64,
}

impl QTable {
    /// `capacity` bounds the number of state rows kept; `None` grows without limit.
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            rows: HashMap::new(),
            capacity,
            clock: 0,
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn set_capacity(&mut self, capacity: Option<usize>) {
        self.capacity = capacity;
        if let Some(limit) = capacity {
            while self.rows.len() > limit {
                self.evict_oldest();
            }
        }
    }

    /// Number of state rows held.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of stored `(state, action)` values.
    pub fn entries(&self) -> usize {
        self.rows.values().map(|row| row.values.len()).sum()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.clock = 0;
    }

    pub fn get(&self, state: &State, action: &Action) -> f64 {
        self.rows
            .get(state)
            .and_then(|row| row.values.get(action))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn set(&mut self, state: State, action: Action, value: f64) {
        self.clock += 1;
        if !self.rows.contains_key(&state) {
            if let Some(limit) = self.capacity {
                while limit > 0 && self.rows.len() >= limit {
                    self.evict_oldest();
                }
            }
        }
        let row = self.rows.entry(state).or_default();
        row.last_used = self.clock;
        row.values.insert(action, value);
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .rows
            .iter()
            .min_by_key(|(_, row)| row.last_used)
            .map(|(state, _)| *state);
        if let Some(state) = oldest {
            self.rows.remove(&state);
        }
    }

    /// Highest value reachable from `state`, counting unseen actions as `0.0`.
    pub fn max_value(&self, state: &State, action_count: usize) -> f64 {
        let Some(row) = self.rows.get(state) else {
            return 0.0;
        };
        let stored = row.values.values().copied().fold(f64::NEG_INFINITY, f64::max);
        if row.values.len() < action_count {
            stored.max(0.0)
        } else if stored.is_finite() {
            stored
        } else {
            0.0
        }
    }

    /// Highest-valued action for `state` within `space`; the first maximal action in
    /// enumeration order wins ties. `None` only for an empty space.
    pub fn greedy_action(&self, state: &State, space: &TacticSpace) -> Option<Action> {
        let row = self.rows.get(state);
        let stored = row.map(|row| row.values.iter()).into_iter().flatten();
        let best_stored = stored
            .filter_map(|(action, value)| space.index_of(&action.0).map(|index| (index, *value)))
            .max_by(|(left_index, left), (right_index, right)| {
                left.total_cmp(right).then_with(|| right_index.cmp(left_index))
            });
        let stored_count = row.map_or(0, |row| row.values.len());
        let has_unseen = stored_count < space.len();

        match best_stored {
            Some((index, value)) if value > 0.0 || !has_unseen => space.get(index).map(Action),
            // The maximum is 0.0: the earliest action that is unseen or stored at 0.0.
            _ => space
                .iter()
                .map(Action)
                .find(|action| row.and_then(|row| row.values.get(action)).map_or(true, |value| *value >= 0.0)),
        }
    }

    /// Every stored value as `(state, action, value)`.
    pub fn iter(&self) -> impl Iterator<Item = (&State, &Action, f64)> + '_ {
        self.rows
            .iter()
            .flat_map(|(state, row)| row.values.iter().map(move |(action, value)| (state, action, *value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn space() -> TacticSpace {
        let full = TacticSpace::full();
        TacticSpace {
            formations: full.formations[..2].to_vec(),
            attack_strategies: full.attack_strategies[..2].to_vec(),
            defense_strategies: full.defense_strategies[..1].to_vec(),
            forward_archetypes: full.forward_archetypes[..1].to_vec(),
            midfielder_archetypes: full.midfielder_archetypes[..1].to_vec(),
            defender_archetypes: full.defender_archetypes[..1].to_vec(),
        }
    }

    fn at(space: &TacticSpace, index: usize) -> Tactic {
        space.get(index).expect("index inside space")
    }

    #[test]
    fn unseen_entries_read_zero() {
        let space = space();
        let table = QTable::new(None);
        let state = State(at(&space, 0));
        assert_eq!(table.get(&state, &Action(at(&space, 1))), 0.0);
        assert_eq!(table.max_value(&state, space.len()), 0.0);
        assert_eq!(table.greedy_action(&state, &space), Some(Action(at(&space, 0))));
    }

    #[test]
    fn greedy_prefers_highest_then_earliest() {
        let space = space();
        let mut table = QTable::new(None);
        let state = State(at(&space, 0));
        table.set(state, Action(at(&space, 5)), 2.0);
        table.set(state, Action(at(&space, 3)), 2.0);
        table.set(state, Action(at(&space, 1)), 1.0);
        assert_eq!(table.greedy_action(&state, &space), Some(Action(at(&space, 3))));
        assert_eq!(table.max_value(&state, space.len()), 2.0);
    }

    #[test]
    fn negative_values_lose_to_unseen_actions() {
        let space = space();
        let mut table = QTable::new(None);
        let state = State(at(&space, 2));
        table.set(state, Action(at(&space, 0)), -1.0);
        assert_eq!(table.greedy_action(&state, &space), Some(Action(at(&space, 1))));
        assert_eq!(table.max_value(&state, space.len()), 0.0);
    }

    #[test]
    fn full_row_ignores_implicit_zero() {
        let space = space();
        let mut table = QTable::new(None);
        let state = State(at(&space, 0));
        for (index, tactic) in space.iter().enumerate() {
            table.set(state, Action(tactic), -1.0 - index as f64);
        }
        assert_eq!(table.max_value(&state, space.len()), -1.0);
        assert_eq!(table.greedy_action(&state, &space), Some(Action(at(&space, 0))));
    }

    #[test]
    fn capacity_evicts_least_recently_written_row() {
        let space = space();
        let mut table = QTable::new(Some(2));
        let a = State(at(&space, 0));
        let b = State(at(&space, 1));
        let c = State(at(&space, 2));
        let action = Action(at(&space, 3));
        table.set(a, action, 1.0);
        table.set(b, action, 1.0);
        table.set(a, action, 2.0);
        table.set(c, action, 1.0);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&a, &action), 2.0);
        assert_eq!(table.get(&b, &action), 0.0);
        assert_eq!(table.get(&c, &action), 1.0);
    }
}
