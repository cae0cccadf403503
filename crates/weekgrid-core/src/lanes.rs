//! Side-by-side placement for blocks that
//! overlap within one day column.

use serde::Serialize;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
)]
pub struct LaneSlot {
  /// Zero-based lane, left to right.
  pub lane:  usize,
  /// Lanes in this block's overlap
  /// cluster; the block renders at
  /// `1 / lanes` of the column width.
  pub lanes: usize
}

/// Greedy interval partitioning over
/// `(top, bottom)` spans. `None` entries
/// (blocks that are not rendered) stay
/// `None`. Blocks that merely touch share a
/// lane.
#[tracing::instrument(level = "debug", skip_all, fields(count = spans.len()))]
pub fn assign_lanes(
  spans: &[Option<(f64, f64)>]
) -> Vec<Option<LaneSlot>> {
  let mut order = spans
    .iter()
    .enumerate()
    .filter_map(|(idx, span)| {
      span.map(|(top, bottom)| {
        (idx, top, bottom)
      })
    })
    .collect::<Vec<_>>();
  order.sort_by(|a, b| {
    a.1
      .total_cmp(&b.1)
      .then(a.2.total_cmp(&b.2))
      .then(a.0.cmp(&b.0))
  });

  let mut result = vec![None; spans.len()];
  let mut lane_ends: Vec<f64> = Vec::new();
  let mut cluster: Vec<(usize, usize)> =
    Vec::new();
  let mut cluster_end = f64::NEG_INFINITY;

  for (idx, top, bottom) in order {
    if !cluster.is_empty()
      && top >= cluster_end
    {
      close_cluster(
        &mut result,
        &mut cluster,
        lane_ends.len()
      );
      lane_ends.clear();
    }

    let lane = match lane_ends
      .iter()
      .position(|end| *end <= top)
    {
      | Some(free) => {
        lane_ends[free] = bottom;
        free
      }
      | None => {
        lane_ends.push(bottom);
        lane_ends.len() - 1
      }
    };

    cluster.push((idx, lane));
    cluster_end = if cluster.len() == 1 {
      bottom
    } else {
      cluster_end.max(bottom)
    };
  }

  close_cluster(
    &mut result,
    &mut cluster,
    lane_ends.len()
  );

  result
}

fn close_cluster(
  result: &mut [Option<LaneSlot>],
  cluster: &mut Vec<(usize, usize)>,
  lanes: usize
) {
  for (idx, lane) in cluster.drain(..) {
    result[idx] =
      Some(LaneSlot { lane, lanes });
  }
}
