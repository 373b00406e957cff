//! # Ranking Primitives
//!
//! Hardcoded constants for the CiteRank CORE.
//!
//! The ranking constants reproduce existing, relied-upon behaviour and are the
//! defaults of [`crate::rank::RankConfig`]. Changing them changes every
//! downstream score.

/// Probability mass retained per power-iteration step.
///
/// Unusually high compared to the textbook 0.85.
pub const DAMPING_FACTOR: f64 = 0.99;

/// Hard cap on power iterations. Terminates ranking regardless of convergence.
pub const MAX_ITERATIONS: usize = 100;

/// Iteration stops once the L2 norm of the rank change drops below this.
pub const CONVERGENCE_THRESHOLD: f64 = 1e-9;

/// Fixed per-dangling-node contribution added to every node each iteration.
///
/// Not proportional to the rank mass held by dangling nodes.
pub const MIN_DANGLING_CONTRIBUTION: f64 = 1e-9;

/// URL prefix for papers known only by id.
pub const PAPER_URL_PREFIX: &str = "https://www.semanticscholar.org/paper/";

/// Title used when a citing paper record carries none.
pub const UNKNOWN_TITLE: &str = "unknown";

// =============================================================================
// SNAPSHOT FORMAT
// =============================================================================

/// Magic bytes for the CiteRank snapshot format header.
///
/// - File Header = Magic Bytes ("CRNK") + Version (u8) before payload.
pub const MAGIC_BYTES: &[u8; 4] = b"CRNK";

/// Current snapshot format version.
///
/// Increment this when making breaking changes to the snapshot layout.
pub const FORMAT_VERSION: u8 = 1;

/// Maximum snapshot size accepted by the loader. Checked before decoding.
pub const MAX_SNAPSHOT_SIZE: usize = 1024 * 1024 * 1024;

/// Maximum node count a snapshot header may announce.
pub const MAX_SNAPSHOT_NODE_COUNT: u64 = 50_000_000;

/// Maximum edge count a snapshot header may announce.
pub const MAX_SNAPSHOT_EDGE_COUNT: u64 = 500_000_000;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length for external paper ids.
pub const MAX_PAPER_ID_LENGTH: usize = 256;

/// Maximum length for titles and URLs.
///
/// Longer values are rejected by the Ingestor.
pub const MAX_TEXT_LENGTH: usize = 65536;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damping_is_retained_mass() {
        assert!(DAMPING_FACTOR > 0.0 && DAMPING_FACTOR <= 1.0);
    }

    #[test]
    fn magic_bytes_correct() {
        assert_eq!(MAGIC_BYTES, b"CRNK");
    }
}
