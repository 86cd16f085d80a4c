use comms::Identity;

/// Whether the worker of `rank` processes the data shard `shard`.
///
/// Every shard maps to exactly one rank in `[0, rank_size)`.
pub fn owns(shard: usize, rank: usize, rank_size: usize) -> bool {
    shard % rank_size == rank
}

/// The data partitioning of a single worker, fixed for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partitioner {
    rank: usize,
    rank_size: usize,
}

impl Partitioner {
    /// Creates a new `Partitioner` for `identity`.
    pub fn new(identity: &Identity) -> Self {
        Self {
            rank: identity.rank(),
            rank_size: identity.rank_size().get(),
        }
    }

    pub fn owns(&self, shard: usize) -> bool {
        owns(shard, self.rank, self.rank_size)
    }

    /// The shards of `[0, total)` this worker processes, in order.
    pub fn owned(&self, total: usize) -> impl Iterator<Item = usize> + use<> {
        (self.rank..total).step_by(self.rank_size)
    }
}
