use super::*;

/// First-pass histogram width. Under-dense bins this wide are candidates
/// for refinement.
pub(crate) const COARSE_INTERVAL: u64 = 10_000_000;

/// Second-pass histogram width, and the width of every emitted range.
pub(crate) const FINE_INTERVAL: u64 = 1_000;

/// A half-open block range `[gt, lt)` believed to be under-indexed.
/// `doc_count` is how many block documents the store actually holds for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapRange {
  pub gt: u64,
  pub lt: u64,
  pub doc_count: u64,
}

/// Return the buckets whose document count falls below expectation, in
/// input order. The first bucket gets its own threshold: the chain starts
/// at block 0, so a full leading window holds one document fewer than an
/// interior one. No deduplication, no merging of adjacent buckets.
pub(crate) fn find_gaps(
  buckets: &[Bucket],
  first_threshold: u64,
  other_threshold: u64,
) -> Vec<Bucket> {
  buckets
    .iter()
    .enumerate()
    .filter(|(i, bucket)| {
      bucket.doc_count
        < if *i == 0 {
          first_threshold
        } else {
          other_threshold
        }
    })
    .map(|(_, bucket)| bucket.clone())
    .collect()
}

/// Whole-store coarse scan for under-dense regions.
pub(crate) fn coarse_gaps(store: &impl BucketSource) -> Result<Vec<Bucket>> {
  let buckets = store.buckets(COARSE_INTERVAL, None)?;
  Ok(find_gaps(&buckets, COARSE_INTERVAL - 1, COARSE_INTERVAL))
}

/// Narrow each coarse gap down to the 1000-block sub-ranges actually
/// missing data by re-querying its window at fine granularity. Interior
/// fine buckets should be exactly full, so both thresholds are the fine
/// interval itself.
pub(crate) fn refine(store: &impl BucketSource, coarse: &[Bucket]) -> Result<Vec<GapRange>> {
  let mut ranges = Vec::new();

  for bucket in coarse {
    let gte = bucket.key as u64;

    let fine = store.buckets(FINE_INTERVAL, Some((gte, gte + COARSE_INTERVAL)))?;

    for missing in find_gaps(&fine, FINE_INTERVAL, FINE_INTERVAL) {
      let gt = missing.key as u64;
      ranges.push(GapRange {
        gt,
        lt: gt + FINE_INTERVAL,
        doc_count: missing.doc_count,
      });
    }
  }

  Ok(ranges)
}
