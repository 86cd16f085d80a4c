use std::{
    env,
    error::Error,
    fmt::{self, Display},
    num::NonZeroUsize,
};

use serde::{Deserialize, Serialize};

/// Error returned when the process identity supplied by the runtime is invalid.
#[derive(Debug)]
pub enum IdentityErr {
    Missing(&'static str),
    Invalid { var: &'static str, value: String },
    RankOutOfRange { rank: usize, rank_size: usize },
}

impl Display for IdentityErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityErr::Missing(var) => write!(f, "missing environment variable {var}"),
            IdentityErr::Invalid { var, value } => {
                write!(f, "environment variable {var} is not a valid number: {value:?}")
            }
            IdentityErr::RankOutOfRange { rank, rank_size } => {
                write!(f, "rank {rank} is out of range for rank size {rank_size}")
            }
        }
    }
}

impl Error for IdentityErr {}

/// The immutable identity of a process, fixed at startup.
///
/// It is passed explicitly to whatever needs it (partitioning, logging), never read
/// from ambient state after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawIdentity")]
pub struct Identity {
    node_id: String,
    rank: usize,
    rank_size: NonZeroUsize,
}

/// The wire form of an `Identity`, checked through `Identity::new` on the way in.
#[derive(Deserialize)]
struct RawIdentity {
    node_id: String,
    rank: usize,
    rank_size: NonZeroUsize,
}

impl TryFrom<RawIdentity> for Identity {
    type Error = IdentityErr;

    fn try_from(raw: RawIdentity) -> Result<Self, Self::Error> {
        Self::new(raw.node_id, raw.rank, raw.rank_size)
    }
}

impl Identity {
    /// Creates a new `Identity`.
    ///
    /// # Arguments
    /// * `node_id` - The node identifier given by the runtime.
    /// * `rank` - The rank of this process, in `[0, rank_size)`.
    /// * `rank_size` - The total amount of ranks.
    ///
    /// # Returns
    /// A new `Identity` or an error if `rank` is out of range.
    pub fn new(
        node_id: impl Into<String>,
        rank: usize,
        rank_size: NonZeroUsize,
    ) -> Result<Self, IdentityErr> {
        if rank >= rank_size.get() {
            return Err(IdentityErr::RankOutOfRange {
                rank,
                rank_size: rank_size.get(),
            });
        }

        Ok(Self {
            node_id: node_id.into(),
            rank,
            rank_size,
        })
    }

    /// Reads the identity from `NODE_ID`, `RANK` and `RANK_SIZE`.
    pub fn from_env() -> Result<Self, IdentityErr> {
        let node_id = env::var("NODE_ID").map_err(|_| IdentityErr::Missing("NODE_ID"))?;
        let rank = parse_var("RANK")?;
        let rank_size = parse_var("RANK_SIZE")?;

        let rank_size = NonZeroUsize::new(rank_size).ok_or(IdentityErr::Invalid {
            var: "RANK_SIZE",
            value: "0".to_string(),
        })?;

        Self::new(node_id, rank, rank_size)
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn rank_size(&self) -> NonZeroUsize {
        self.rank_size
    }
}

fn parse_var(var: &'static str) -> Result<usize, IdentityErr> {
    let value = env::var(var).map_err(|_| IdentityErr::Missing(var))?;
    value
        .trim()
        .parse()
        .map_err(|_| IdentityErr::Invalid { var, value })
}

impl Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NodeID: {}, Rank: {}, RankSize: {}",
            self.node_id, self.rank, self.rank_size
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_rank_out_of_range() {
        let size = NonZeroUsize::new(2).unwrap();
        assert!(Identity::new("w-0", 1, size).is_ok());
        assert!(matches!(
            Identity::new("w-2", 2, size),
            Err(IdentityErr::RankOutOfRange { rank: 2, rank_size: 2 })
        ));
    }

    #[test]
    fn deserializing_checks_the_rank() {
        let ok: Identity =
            serde_json::from_str(r#"{"node_id":"n","rank":1,"rank_size":2}"#).unwrap();
        assert_eq!(ok.rank(), 1);

        let err = serde_json::from_str::<Identity>(r#"{"node_id":"n","rank":2,"rank_size":2}"#)
            .unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn displays_for_logging() {
        let identity = Identity::new("node-a", 0, NonZeroUsize::new(3).unwrap()).unwrap();
        assert_eq!(identity.to_string(), "NodeID: node-a, Rank: 0, RankSize: 3");
    }
}
