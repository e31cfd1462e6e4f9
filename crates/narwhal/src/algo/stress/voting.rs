/// A voter's wish to sit `distance` away from the voted node, with strength `weight`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vote {
    pub voter: usize,
    pub distance: f64,
    pub weight: f64,
}

impl Vote {
    pub fn new(voter: usize, distance: f64, weight: f64) -> Self {
        Self {
            voter,
            distance,
            weight,
        }
    }

    /// Vote with the customary stress weight `1 / distance^2`.
    pub fn with_distance(voter: usize, distance: f64) -> Self {
        Self::new(voter, distance, 1.0 / (distance * distance))
    }
}

/// Votes that share a multiplier.
#[derive(Debug, Clone, PartialEq)]
pub struct VoteBlock {
    pub votes: Vec<Vote>,
    pub block_weight: f64,
}

impl VoteBlock {
    pub fn new(block_weight: f64) -> Self {
        Self {
            votes: Vec::new(),
            block_weight,
        }
    }
}

/// All votes cast on one node, grouped by block.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeVoting {
    pub voted_node: usize,
    pub blocks: Vec<VoteBlock>,
}

impl NodeVoting {
    pub fn new(voted_node: usize, block_weights: &[f64]) -> Self {
        Self {
            voted_node,
            blocks: block_weights.iter().map(|&w| VoteBlock::new(w)).collect(),
        }
    }

    /// Every vote paired with its block weight.
    pub fn weighted_votes(&self) -> impl Iterator<Item = (f64, &Vote)> + '_ {
        self.blocks
            .iter()
            .flat_map(|block| block.votes.iter().map(move |v| (block.block_weight, v)))
    }

    pub fn vote_count(&self) -> usize {
        self.blocks.iter().map(|b| b.votes.len()).sum()
    }

    /// Drops all votes, keeping the blocks and their weights.
    pub fn clear_votes(&mut self) {
        for block in &mut self.blocks {
            block.votes.clear();
        }
    }
}
