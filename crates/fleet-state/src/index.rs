//! Dispatch index: nearest-neighbour queries over coordinate columns.
//!
//! The query is a linear Manhattan-distance scan.  Candidate sets are a few
//! dozen nodes, and the result must be the *lowest* index among equally
//! distant candidates (agent behaviour is order-sensitive), which a plain
//! ascending scan with a strict `<` guarantees.
//!
//! Candidates can be narrowed with a [`Filter`], a set of `(column, value)`
//! pairs that must all hold (`include`) or must all fail (`exclude`), and
//! with an arbitrary per-slot predicate such as "not yet visited".

use fleet_core::Coord;

use crate::column::{ColumnId, Columns};
use crate::StateResult;

/// Index of the candidate closest to `from` among those `admit` accepts.
///
/// Ties resolve to the lowest index.  `None` if no candidate is admitted.
pub fn nearest(from: Coord, candidates: &[Coord], mut admit: impl FnMut(usize) -> bool) -> Option<usize> {
    let mut best: Option<(usize, u32)> = None;
    for (i, &c) in candidates.iter().enumerate() {
        if !admit(i) {
            continue;
        }
        let d = from.manhattan(c);
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((i, d)),
        }
    }
    best.map(|(i, _)| i)
}

// ── Filter ────────────────────────────────────────────────────────────────────

/// Column predicates by name.  Resolve once against the store, then query
/// many times.
///
/// ```rust
/// use fleet_state::Filter;
///
/// // Waiting customers with outstanding demand.
/// let f = Filter::new().include("c_waiting", 1.0).exclude("demand", 0.0);
/// # let _ = f;
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter {
    include: Vec<(String, f64)>,
    exclude: Vec<(String, f64)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit only slots where `column == value`.
    pub fn include(mut self, column: &str, value: f64) -> Self {
        self.include.push((column.to_owned(), value));
        self
    }

    /// Reject slots where `column == value`.
    pub fn exclude(mut self, column: &str, value: f64) -> Self {
        self.exclude.push((column.to_owned(), value));
        self
    }

    /// Bind column names to handles.
    ///
    /// # Errors
    ///
    /// [`StateError::UnknownColumn`][crate::StateError::UnknownColumn] for a
    /// name that was never registered.
    pub fn resolve(&self, columns: &Columns) -> StateResult<ResolvedFilter> {
        let bind = |pairs: &[(String, f64)]| -> StateResult<Vec<(ColumnId, f64)>> {
            pairs
                .iter()
                .map(|(name, v)| Ok((columns.scalar_id(name)?, *v)))
                .collect()
        };
        Ok(ResolvedFilter {
            include: bind(&self.include)?,
            exclude: bind(&self.exclude)?,
        })
    }
}

/// A [`Filter`] bound to column handles.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedFilter {
    include: Vec<(ColumnId, f64)>,
    exclude: Vec<(ColumnId, f64)>,
}

impl ResolvedFilter {
    /// `true` if every include predicate holds at `slot` and no exclude
    /// predicate does.  An inactive (`None`) value never equals anything.
    pub fn admits(&self, columns: &Columns, slot: usize) -> bool {
        self.include.iter().all(|&(id, v)| columns.get(id, slot) == Some(v))
            && !self.exclude.iter().any(|&(id, v)| columns.get(id, slot) == Some(v))
    }
}
