//! Multi-objective filtering over `(shape, length, crossing)` candidates:
//! non-dominated extraction, crowding-distance diversity, and a top-K
//! selector that combines the two.

use crate::core::types::PathCandidate;

/// A candidate annotated with its objective triple and, once computed,
/// its Pareto rank and crowding distance.
#[derive(Debug, Clone)]
pub struct ParetoCandidate {
    pub candidate: PathCandidate,
    pub objectives: (f64, f64, f64),
    pub rank: usize,
    pub crowding_distance: f64,
}

impl ParetoCandidate {
    fn from_candidate(candidate: PathCandidate) -> Self {
        let objectives = candidate.objectives();
        Self {
            candidate,
            objectives,
            rank: 0,
            crowding_distance: 0.0,
        }
    }

    fn objective(&self, m: usize) -> f64 {
        match m {
            0 => self.objectives.0,
            1 => self.objectives.1,
            _ => self.objectives.2,
        }
    }
}

const N_OBJECTIVES: usize = 3;

/// `a` dominates `b` iff `a` is no worse on every objective and strictly
/// better on at least one.
pub fn dominates(a: (f64, f64, f64), b: (f64, f64, f64)) -> bool {
    let (a0, a1, a2) = a;
    let (b0, b1, b2) = b;
    let all_leq = a0 <= b0 && a1 <= b1 && a2 <= b2;
    let any_lt = a0 < b0 || a1 < b1 || a2 < b2;
    all_leq && any_lt
}

/// Non-dominated filtering and top-K diverse selection over a candidate
/// set, following NSGA-II-style crowding distance.
#[derive(Debug, Default)]
pub struct ParetoFilter;

impl ParetoFilter {
    pub fn new() -> Self {
        Self
    }

    /// The subset of `candidates` that no other candidate dominates.
    pub fn filter_non_dominated(&self, candidates: Vec<PathCandidate>) -> Vec<ParetoCandidate> {
        if candidates.is_empty() {
            return Vec::new();
        }

        let annotated: Vec<ParetoCandidate> = candidates
            .into_iter()
            .map(ParetoCandidate::from_candidate)
            .collect();

        annotated
            .iter()
            .enumerate()
            .filter(|(i, candidate)| {
                !annotated
                    .iter()
                    .enumerate()
                    .any(|(j, other)| *i != j && dominates(other.objectives, candidate.objectives))
            })
            .map(|(_, c)| c.clone())
            .collect()
    }

    /// Assigns crowding distances in place. Sets of size <= 2 get `+inf`
    /// for every member; larger sets get, per objective dimension, `+inf`
    /// for the two extremes and a normalized neighbor-gap sum for the
    /// rest.
    pub fn assign_crowding_distance(&self, candidates: &mut [ParetoCandidate]) {
        let n = candidates.len();
        if n <= 2 {
            for c in candidates.iter_mut() {
                c.crowding_distance = f64::INFINITY;
            }
            return;
        }

        for c in candidates.iter_mut() {
            c.crowding_distance = 0.0;
        }

        for m in 0..N_OBJECTIVES {
            let mut order: Vec<usize> = (0..n).collect();
            order.sort_by(|&i, &j| {
                candidates[i]
                    .objective(m)
                    .partial_cmp(&candidates[j].objective(m))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            candidates[order[0]].crowding_distance = f64::INFINITY;
            candidates[order[n - 1]].crowding_distance = f64::INFINITY;

            let range = candidates[order[n - 1]].objective(m) - candidates[order[0]].objective(m);
            if range == 0.0 {
                continue;
            }

            for i in 1..n - 1 {
                let prev = candidates[order[i - 1]].objective(m);
                let next = candidates[order[i + 1]].objective(m);
                candidates[order[i]].crowding_distance += (next - prev) / range;
            }
        }
    }

    /// Extracts the Pareto front and returns up to `k` of its most diverse
    /// members (highest crowding distance first; ties keep input order).
    pub fn select_top_k(&self, candidates: Vec<PathCandidate>, k: usize) -> Vec<PathCandidate> {
        if candidates.is_empty() {
            return Vec::new();
        }
        if candidates.len() <= k {
            return candidates;
        }

        let front = self.filter_non_dominated(candidates);
        if front.len() <= k {
            return front.into_iter().map(|c| c.candidate).collect();
        }

        let mut front = front;
        self.assign_crowding_distance(&mut front);
        front.sort_by(|a, b| {
            b.crowding_distance
                .partial_cmp(&a.crowding_distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        front.into_iter().take(k).map(|c| c.candidate).collect()
    }

    /// Assigns every candidate a Pareto rank (0 = top layer) by
    /// repeatedly extracting and removing non-dominated layers.
    pub fn pareto_ranks(&self, candidates: Vec<PathCandidate>) -> Vec<ParetoCandidate> {
        if candidates.is_empty() {
            return Vec::new();
        }

        let mut annotated: Vec<ParetoCandidate> = candidates
            .into_iter()
            .map(ParetoCandidate::from_candidate)
            .collect();

        let mut remaining: Vec<usize> = (0..annotated.len()).collect();
        let mut rank = 0usize;

        while !remaining.is_empty() {
            let non_dominated: Vec<usize> = remaining
                .iter()
                .copied()
                .filter(|&i| {
                    !remaining.iter().any(|&j| {
                        j != i && dominates(annotated[j].objectives, annotated[i].objectives)
                    })
                })
                .collect();

            for &i in &non_dominated {
                annotated[i].rank = rank;
            }

            remaining.retain(|i| !non_dominated.contains(i));
            rank += 1;
        }

        annotated
    }
}
