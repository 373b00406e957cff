//! # Rank Engine
//!
//! Citation-biased power iteration over the cited -> citing incidence.
//!
//! The algorithm deliberately differs from textbook PageRank and must not be
//! "fixed":
//! - `M[cited][citing] = 1.0`, so a paper accumulates the full rank of every
//!   paper that cites it, with no out-degree normalisation;
//! - the seed vector is the log-scaled citation count, not uniform;
//! - dangling nodes add a fixed `epsilon * D` to every node, independent of
//!   the rank mass they hold;
//! - the vector is renormalised to sum 1 after every step, and the final
//!   scores are rescaled so the top node is exactly 1.0.
//!
//! The engine is synchronous and single-threaded and performs no I/O. Callers
//! that want progress output read it from [`RankReport`].

use crate::graph::Graph;
use crate::primitives::{
    CONVERGENCE_THRESHOLD, DAMPING_FACTOR, MAX_ITERATIONS, MIN_DANGLING_CONTRIBUTION,
};
use crate::{CiteRankError, NodeId};
use serde::{Deserialize, Serialize};

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Ranking parameters. Defaults reproduce the reference behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankConfig {
    /// Retained mass per step.
    pub damping: f64,
    /// Iteration cap.
    pub max_iterations: usize,
    /// L2 convergence threshold.
    pub tolerance: f64,
    /// Fixed contribution per dangling node.
    pub dangling_epsilon: f64,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            damping: DAMPING_FACTOR,
            max_iterations: MAX_ITERATIONS,
            tolerance: CONVERGENCE_THRESHOLD,
            dangling_epsilon: MIN_DANGLING_CONTRIBUTION,
        }
    }
}

impl RankConfig {
    /// Check parameter ranges.
    ///
    /// Damping must lie in `(0, 1)` so the uniform term keeps every score
    /// positive.
    pub fn validate(&self) -> Result<(), CiteRankError> {
        if !(self.damping > 0.0 && self.damping < 1.0) {
            return Err(CiteRankError::ConfigError(format!(
                "damping must be in (0, 1), got {}",
                self.damping
            )));
        }
        if self.max_iterations == 0 {
            return Err(CiteRankError::ConfigError(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if !(self.tolerance >= 0.0) {
            return Err(CiteRankError::ConfigError(format!(
                "tolerance must be non-negative, got {}",
                self.tolerance
            )));
        }
        if !(self.dangling_epsilon >= 0.0) {
            return Err(CiteRankError::ConfigError(format!(
                "dangling_epsilon must be non-negative, got {}",
                self.dangling_epsilon
            )));
        }
        Ok(())
    }
}

// =============================================================================
// INCIDENCE (CSR)
// =============================================================================

/// Compressed sparse rows of the distinct cited -> citing pairs.
///
/// Row `i` lists every citing paper of `i`.
#[derive(Debug, Clone)]
struct Incidence {
    offsets: Vec<usize>,
    columns: Vec<usize>,
}

impl Incidence {
    /// Build from a graph. `distinct_edges` is sorted by (cited, citing), so
    /// rows fill in order.
    fn from_graph(graph: &Graph) -> Self {
        let n = graph.len();
        let mut offsets = Vec::with_capacity(n + 1);
        let mut columns = Vec::with_capacity(graph.distinct_edge_count());

        offsets.push(0);
        let mut row = 0usize;
        for (cited, citing) in graph.distinct_edges() {
            while row < cited.index() {
                offsets.push(columns.len());
                row += 1;
            }
            columns.push(citing.index());
        }
        while row < n {
            offsets.push(columns.len());
            row += 1;
        }

        Self { offsets, columns }
    }

    fn row(&self, i: usize) -> &[usize] {
        &self.columns[self.offsets[i]..self.offsets[i + 1]]
    }

    fn is_dangling(&self, i: usize) -> bool {
        self.offsets[i] == self.offsets[i + 1]
    }

    fn len(&self) -> usize {
        self.offsets.len() - 1
    }
}

// =============================================================================
// POWER ITERATION
// =============================================================================

/// Outcome of one power-iteration step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationStep {
    /// 0-based iteration number.
    pub iteration: usize,
    /// L2 norm of the change made by this step.
    pub diff: f64,
    /// Whether `diff` fell below the tolerance.
    pub converged: bool,
}

/// Step-by-step power iteration. Yields at most `max_iterations` steps and
/// stops early after the first converged one.
#[derive(Debug)]
pub struct PowerIteration {
    config: RankConfig,
    incidence: Incidence,
    rank: Vec<f64>,
    next: Vec<f64>,
    teleport: f64,
    dangling_count: usize,
    dangling_contribution: f64,
    iteration: usize,
    converged: bool,
}

impl PowerIteration {
    fn new(config: RankConfig, graph: &Graph) -> Self {
        let incidence = Incidence::from_graph(graph);
        let n = incidence.len();

        let dangling_count = (0..n).filter(|&i| incidence.is_dangling(i)).count();
        let citations: Vec<u32> = graph.nodes().map(|node| node.attributes.citation_count).collect();

        Self {
            config,
            rank: seed_distribution(&citations),
            next: vec![0.0; n],
            teleport: if n == 0 { 0.0 } else { (1.0 - config.damping) / n as f64 },
            dangling_count,
            dangling_contribution: config.dangling_epsilon * dangling_count as f64,
            incidence,
            iteration: 0,
            converged: false,
        }
    }

    /// The current rank distribution (sums to 1).
    #[must_use]
    pub fn distribution(&self) -> &[f64] {
        &self.rank
    }

    /// Number of dangling nodes.
    #[must_use]
    pub fn dangling_count(&self) -> usize {
        self.dangling_count
    }

    /// Whether the last step converged.
    #[must_use]
    pub fn is_converged(&self) -> bool {
        self.converged
    }
}

impl Iterator for PowerIteration {
    type Item = IterationStep;

    fn next(&mut self) -> Option<IterationStep> {
        if self.converged || self.iteration >= self.config.max_iterations || self.rank.is_empty() {
            return None;
        }

        let damping = self.config.damping;
        for (i, slot) in self.next.iter_mut().enumerate() {
            let inflow: f64 = self.incidence.row(i).iter().map(|&j| self.rank[j]).sum();
            *slot = damping * (inflow + self.dangling_contribution) + self.teleport;
        }

        let total: f64 = self.next.iter().sum();
        for value in &mut self.next {
            *value /= total;
        }

        let diff = self
            .next
            .iter()
            .zip(&self.rank)
            .map(|(new, old)| (new - old) * (new - old))
            .sum::<f64>()
            .sqrt();

        std::mem::swap(&mut self.rank, &mut self.next);
        let step = IterationStep {
            iteration: self.iteration,
            diff,
            converged: diff < self.config.tolerance,
        };
        self.iteration += 1;
        self.converged = step.converged;
        Some(step)
    }
}

/// Log-scaled citation seed, normalised to sum 1.
///
/// `seed[i] = ln(c[i] + 1) / ln(max + 1)`. All-zero citations (or an all-zero
/// seed) fall back to the uniform distribution.
fn seed_distribution(citations: &[u32]) -> Vec<f64> {
    let n = citations.len();
    if n == 0 {
        return Vec::new();
    }

    let max_citations = citations.iter().copied().max().unwrap_or(0);
    let uniform = || vec![1.0 / n as f64; n];
    if max_citations == 0 {
        return uniform();
    }

    let denominator = f64::from(max_citations).ln_1p();
    let seed: Vec<f64> = citations
        .iter()
        .map(|&c| f64::from(c).ln_1p() / denominator)
        .collect();

    let total: f64 = seed.iter().sum();
    if total > 0.0 {
        seed.into_iter().map(|s| s / total).collect()
    } else {
        uniform()
    }
}

// =============================================================================
// RANKING RESULT
// =============================================================================

/// Diagnostics of a ranking run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RankReport {
    /// Steps actually performed.
    pub iterations: usize,
    /// Whether the run stopped on the tolerance rather than the cap.
    pub converged: bool,
    /// Diff of the last step (0 when no step ran).
    pub final_diff: f64,
    /// Per-step diffs, in order.
    pub diffs: Vec<f64>,
    /// Number of dangling nodes.
    pub dangling_count: usize,
    /// Smallest final score.
    pub min_score: f64,
    /// Largest final score (1.0 unless the graph is empty).
    pub max_score: f64,
}

/// Authority scores indexed by internal node index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ranking {
    scores: Vec<f64>,
    distribution: Vec<f64>,
    report: RankReport,
}

impl Ranking {
    /// Final scores, top node = 1.0.
    #[must_use]
    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    /// The normalised distribution before the final rescale (sums to 1).
    #[must_use]
    pub fn distribution(&self) -> &[f64] {
        &self.distribution
    }

    /// Score of one node.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<f64> {
        self.scores.get(id.index()).copied()
    }

    /// Run diagnostics.
    #[must_use]
    pub fn report(&self) -> &RankReport {
        &self.report
    }

    /// Number of scored nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// `(node, score)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, f64)> + '_ {
        self.scores
            .iter()
            .enumerate()
            .map(|(i, &score)| (NodeId::from_index(i), score))
    }

    /// The `limit` highest scores, descending; ties broken by lower index.
    #[must_use]
    pub fn top(&self, limit: usize) -> Vec<(NodeId, f64)> {
        let mut ranked: Vec<(NodeId, f64)> = self.iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(limit);
        ranked
    }
}

// =============================================================================
// ENGINE
// =============================================================================

/// The Rank Engine.
#[derive(Debug, Clone, Default)]
pub struct RankEngine {
    config: RankConfig,
}

impl RankEngine {
    /// Create an engine, validating the configuration.
    pub fn new(config: RankConfig) -> Result<Self, CiteRankError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The engine's configuration.
    #[must_use]
    pub fn config(&self) -> &RankConfig {
        &self.config
    }

    /// Start a step-by-step iteration over a quiescent graph.
    #[must_use]
    pub fn iterate(&self, graph: &Graph) -> PowerIteration {
        PowerIteration::new(self.config, graph)
    }

    /// Rank every node of the graph.
    ///
    /// An empty graph yields an empty ranking without iterating.
    #[must_use]
    pub fn rank(&self, graph: &Graph) -> Ranking {
        let mut iteration = self.iterate(graph);
        if iteration.distribution().is_empty() {
            return Ranking::default();
        }

        let diffs: Vec<f64> = iteration.by_ref().map(|step| step.diff).collect();
        Self::finish(iteration, diffs)
    }

    fn finish(iteration: PowerIteration, diffs: Vec<f64>) -> Ranking {
        let distribution = iteration.rank;
        let max_rank = distribution.iter().copied().fold(f64::MIN, f64::max);
        let scores: Vec<f64> = distribution.iter().map(|r| r / max_rank).collect();

        let report = RankReport {
            iterations: diffs.len(),
            converged: iteration.converged,
            final_diff: diffs.last().copied().unwrap_or(0.0),
            diffs,
            dangling_count: iteration.dangling_count,
            min_score: scores.iter().copied().fold(f64::MAX, f64::min),
            max_score: scores.iter().copied().fold(f64::MIN, f64::max),
        };

        Ranking {
            scores,
            distribution,
            report,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphStore;
    use crate::{PaperAttributes, PaperId};

    const TOLERANCE: f64 = 1e-6;

    fn paper(graph: &mut Graph, id: &str, citations: u32) -> NodeId {
        graph
            .create_or_get_node(
                &PaperId::new(id),
                PaperAttributes::new(id, "", 2000, citations),
            )
            .expect("create")
    }

    fn cite(graph: &mut Graph, cited: &str, citing: &str) {
        graph
            .add_edge(&PaperId::new(cited), &PaperId::new(citing))
            .expect("edge");
    }

    #[test]
    fn empty_graph_yields_empty_ranking() {
        let ranking = RankEngine::default().rank(&Graph::new());
        assert!(ranking.is_empty());
        assert_eq!(ranking.report().iterations, 0);
    }

    #[test]
    fn seed_is_log_scaled() {
        let seed = seed_distribution(&[0, 1, 3]);
        // ln(1)=0, ln(2), ln(4)=2 ln(2); normalised over 3 ln(2).
        assert!((seed[0] - 0.0).abs() < TOLERANCE);
        assert!((seed[1] - 1.0 / 3.0).abs() < TOLERANCE);
        assert!((seed[2] - 2.0 / 3.0).abs() < TOLERANCE);
    }

    #[test]
    fn zero_citations_seed_uniformly() {
        let seed = seed_distribution(&[0, 0, 0, 0]);
        assert!(seed.iter().all(|&s| (s - 0.25).abs() < TOLERANCE));
    }

    #[test]
    fn incidence_rows_follow_cited_paper() {
        let mut graph = Graph::new();
        let a = paper(&mut graph, "a", 1);
        let b = paper(&mut graph, "b", 1);
        let c = paper(&mut graph, "c", 1);
        cite(&mut graph, "a", "b");
        cite(&mut graph, "a", "c");
        cite(&mut graph, "c", "b");
        cite(&mut graph, "a", "b");

        let incidence = Incidence::from_graph(&graph);
        assert_eq!(incidence.row(a.index()), &[b.index(), c.index()]);
        assert!(incidence.row(b.index()).is_empty());
        assert_eq!(incidence.row(c.index()), &[b.index()]);
        assert!(incidence.is_dangling(b.index()));
    }

    #[test]
    fn every_step_conserves_mass() {
        let mut graph = Graph::new();
        paper(&mut graph, "a", 30);
        paper(&mut graph, "b", 4);
        paper(&mut graph, "c", 0);
        cite(&mut graph, "a", "b");
        cite(&mut graph, "b", "c");
        cite(&mut graph, "c", "a");
        cite(&mut graph, "a", "c");

        let mut iteration = RankEngine::default().iterate(&graph);
        let mut steps = 0;
        while iteration.next().is_some() {
            let mass: f64 = iteration.distribution().iter().sum();
            assert!((mass - 1.0).abs() < TOLERANCE, "mass {mass} at step {steps}");
            steps += 1;
        }
        assert!(steps > 0);
    }

    #[test]
    fn two_cycle_hits_iteration_cap() {
        let mut graph = Graph::new();
        paper(&mut graph, "a", 10);
        paper(&mut graph, "b", 0);
        cite(&mut graph, "a", "b");
        cite(&mut graph, "b", "a");

        let ranking = RankEngine::default().rank(&graph);
        assert_eq!(ranking.report().iterations, MAX_ITERATIONS);
        assert!(!ranking.report().converged);
        assert_eq!(ranking.report().diffs.len(), MAX_ITERATIONS);
    }

    #[test]
    fn two_node_steps_match_hand_computation() {
        let mut graph = Graph::new();
        paper(&mut graph, "a", 10);
        paper(&mut graph, "b", 0);
        cite(&mut graph, "a", "b");

        let config = RankConfig {
            damping: 0.85,
            tolerance: 0.0,
            dangling_epsilon: 1e-3,
            ..RankConfig::default()
        };
        let mut iteration = RankEngine::new(config).expect("engine").iterate(&graph);
        assert_eq!(iteration.distribution(), &[1.0, 0.0]);

        // b holds no rank yet: both raw entries are 0.85 * 0.001 + 0.075.
        iteration.next().expect("step 1");
        assert!((iteration.distribution()[0] - 0.5).abs() < 1e-12);
        assert!((iteration.distribution()[1] - 0.5).abs() < 1e-12);

        // a = 0.85 * (0.5 + 0.001) + 0.075 = 0.50085, b = 0.07585.
        iteration.next().expect("step 2");
        let expected_a = 0.50085 / (0.50085 + 0.07585);
        assert!((iteration.distribution()[0] - expected_a).abs() < 1e-12);
        assert!((iteration.distribution()[1] - (1.0 - expected_a)).abs() < 1e-12);
        assert!((expected_a - 0.868_475_810_646_783_5).abs() < 1e-12);
    }

    #[test]
    fn top_orders_by_score_then_index() {
        let mut graph = Graph::new();
        paper(&mut graph, "a", 10);
        paper(&mut graph, "b", 0);
        paper(&mut graph, "c", 0);
        cite(&mut graph, "a", "b");

        let ranking = RankEngine::default().rank(&graph);
        let top = ranking.top(3);
        assert_eq!(top[0].0, NodeId(0));
        assert_eq!(top[1].0, NodeId(1));
        assert_eq!(top[2].0, NodeId(2));
        assert_eq!(ranking.top(1).len(), 1);
    }

    #[test]
    fn config_validation_rejects_out_of_range() {
        let bad_damping = RankConfig {
            damping: 1.0,
            ..RankConfig::default()
        };
        assert!(RankEngine::new(bad_damping).is_err());

        let zero_iterations = RankConfig {
            max_iterations: 0,
            ..RankConfig::default()
        };
        assert!(zero_iterations.validate().is_err());

        let nan_tolerance = RankConfig {
            tolerance: f64::NAN,
            ..RankConfig::default()
        };
        assert!(nan_tolerance.validate().is_err());

        assert!(RankConfig::default().validate().is_ok());
    }
}
