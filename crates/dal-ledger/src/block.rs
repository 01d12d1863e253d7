use chrono::{DateTime, Utc};
use dal_crypto::ContentHasher;
use dal_types::{AccountId, BlockHash, TxHash};

/// A mined block. Every block carries exactly one transaction.
///
/// `hash` commits to the parent hash and to every other field, so editing a
/// stored block or reordering blocks is caught by [`verify_blocks`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub number: u64,
    pub parent: Option<BlockHash>,
    pub hash: BlockHash,
    pub tx_hash: TxHash,
    pub sender: AccountId,
    pub reverted: bool,
    pub timestamp: DateTime<Utc>,
}

impl Block {
    /// Build the block that follows `parent` and compute its hash.
    pub fn seal(
        parent: Option<&Block>,
        tx_hash: TxHash,
        sender: AccountId,
        reverted: bool,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let mut block = Self {
            number: parent.map_or(0, |p| p.number + 1),
            parent: parent.map(|p| p.hash),
            hash: BlockHash::from_hash([0; 32]),
            tx_hash,
            sender,
            reverted,
            timestamp,
        };
        block.hash = block.expected_hash();
        block
    }

    /// Hash of the block's contents as they stand now.
    pub fn expected_hash(&self) -> BlockHash {
        let mut bytes = Vec::with_capacity(32 + 8 + 32 + 20 + 1 + 8);
        if let Some(parent) = &self.parent {
            bytes.extend_from_slice(parent.as_bytes());
        }
        bytes.extend_from_slice(&self.number.to_be_bytes());
        bytes.extend_from_slice(self.tx_hash.as_bytes());
        bytes.extend_from_slice(self.sender.as_bytes());
        bytes.push(u8::from(self.reverted));
        bytes.extend_from_slice(&self.timestamp.timestamp_millis().to_be_bytes());
        BlockHash::from_hash(ContentHasher::BLOCK.hash(&bytes))
    }
}

/// Check that `blocks` form an unbroken chain starting at block 0.
pub fn verify_blocks(blocks: &[Block]) -> Result<(), ChainError> {
    let mut previous: Option<&Block> = None;
    for (position, block) in blocks.iter().enumerate() {
        let position = position as u64;
        if block.number != position {
            return Err(ChainError::OutOfSequence {
                position,
                number: block.number,
            });
        }
        if block.parent != previous.map(|p| p.hash) {
            return Err(ChainError::ParentMismatch { number: block.number });
        }
        if block.hash != block.expected_hash() {
            return Err(ChainError::HashMismatch { number: block.number });
        }
        previous = Some(block);
    }
    Ok(())
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("block at position {position} is numbered {number}")]
    OutOfSequence { position: u64, number: u64 },

    #[error("block {number} does not link to its predecessor")]
    ParentMismatch { number: u64 },

    #[error("block {number} hash does not match its contents")]
    HashMismatch { number: u64 },
}
