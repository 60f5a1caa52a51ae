//! Proof-of-work mining

use crate::blockchain::Block;
use tracing::debug;

/// True when `hash` starts with `difficulty` zero hex digits.
pub fn meets_difficulty(hash: &str, difficulty: usize) -> bool {
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
}

impl Block {
    /// Increments the nonce until the hash meets `difficulty`. There is no
    /// timeout; expected work is 16^difficulty hashes.
    pub fn mine(&mut self, difficulty: usize) {
        while !meets_difficulty(&self.hash, difficulty) {
            self.nonce += 1;
            self.hash = self.calculate_hash();
        }
        debug!(hash = %self.hash, nonce = self.nonce, difficulty, "block mined");
    }
}

/// Consuming form of [`Block::mine`].
pub fn mine_block(mut block: Block, difficulty: usize) -> Block {
    block.mine(difficulty);
    block
}
