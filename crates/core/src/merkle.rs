//! Merkle tree implementation for transaction roots and inclusion proofs.
//!
//! The tree is built bottom-up from an ordered list of leaf byte strings:
//!
//! - an odd leaf count greater than one is padded by appending a copy of the
//!   last leaf;
//! - leaf digest = `H(leaf)`, internal digest = `H(left || right)`;
//! - at any level with an odd node count the last node is paired with itself.
//!
//! Proofs list sibling digests from the leaf level up to the level just below
//! the root.

use crate::hash::{Blake3, Hash, HashFunction};
use std::marker::PhantomData;
use thiserror::Error;

/// Errors that can occur when building trees or checking proofs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MerkleError {
    #[error("cannot build a merkle tree from zero leaves")]
    EmptyInput,

    #[error("leaf index {index} out of range for {leaf_count} leaves")]
    InvalidIndex { index: usize, leaf_count: usize },

    #[error("proof has {actual} siblings, tree depth is {expected}")]
    MalformedProof { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, MerkleError>;

/// Children of an internal node.
#[derive(Debug, Clone)]
enum Branch {
    Pair(Box<MerkleNode>, Box<MerkleNode>),
    /// The last node of an odd level, standing in as both children.
    PairSelf(Box<MerkleNode>),
}

/// A node of a [`MerkleTree`]. Leaves own no children.
#[derive(Debug, Clone)]
pub struct MerkleNode {
    digest: Hash,
    branch: Option<Branch>,
}

impl MerkleNode {
    fn leaf<H: HashFunction>(data: &[u8]) -> Self {
        Self {
            digest: H::hash(data),
            branch: None,
        }
    }

    fn pair<H: HashFunction>(left: MerkleNode, right: MerkleNode) -> Self {
        Self {
            digest: H::combine(&left.digest, &right.digest),
            branch: Some(Branch::Pair(Box::new(left), Box::new(right))),
        }
    }

    fn pair_self<H: HashFunction>(child: MerkleNode) -> Self {
        Self {
            digest: H::combine(&child.digest, &child.digest),
            branch: Some(Branch::PairSelf(Box::new(child))),
        }
    }

    /// The digest committed by this node.
    pub fn digest(&self) -> Hash {
        self.digest
    }

    pub fn is_leaf(&self) -> bool {
        self.branch.is_none()
    }

    /// Left child, if this is an internal node.
    pub fn left(&self) -> Option<&MerkleNode> {
        match &self.branch {
            Some(Branch::Pair(left, _)) => Some(left),
            Some(Branch::PairSelf(child)) => Some(child),
            None => None,
        }
    }

    /// Right child, if this is an internal node. For a self-paired node this
    /// is the same node as [`left`](Self::left).
    pub fn right(&self) -> Option<&MerkleNode> {
        match &self.branch {
            Some(Branch::Pair(_, right)) => Some(right),
            Some(Branch::PairSelf(child)) => Some(child),
            None => None,
        }
    }
}

/// An immutable binary Merkle tree over byte-string leaves.
#[derive(Debug, Clone)]
pub struct MerkleTree<H = Blake3> {
    root: MerkleNode,
    /// Leaves as supplied by the caller, before padding.
    leaves: Vec<Vec<u8>>,
    depth: usize,
    _hasher: PhantomData<H>,
}

impl MerkleTree<Blake3> {
    /// Build a Blake3 merkle tree from a list of leaves.
    pub fn new<T: AsRef<[u8]>>(leaves: &[T]) -> Result<Self> {
        Self::with_hasher(leaves)
    }
}

impl<H: HashFunction> MerkleTree<H> {
    /// Build a merkle tree using the hash function `H`.
    pub fn with_hasher<T: AsRef<[u8]>>(leaves: &[T]) -> Result<Self> {
        let last = leaves.last().ok_or(MerkleError::EmptyInput)?;

        let mut level: Vec<MerkleNode> = leaves
            .iter()
            .map(|leaf| MerkleNode::leaf::<H>(leaf.as_ref()))
            .collect();
        if level.len() > 1 && level.len() % 2 == 1 {
            level.push(MerkleNode::leaf::<H>(last.as_ref()));
        }

        let mut depth = 0;
        while level.len() > 1 {
            let mut next = Vec::with_capacity(level.len().div_ceil(2));
            let mut nodes = level.into_iter();
            while let Some(left) = nodes.next() {
                let parent = match nodes.next() {
                    Some(right) => MerkleNode::pair::<H>(left, right),
                    None => MerkleNode::pair_self::<H>(left),
                };
                next.push(parent);
            }
            level = next;
            depth += 1;
        }

        let root = level.pop().ok_or(MerkleError::EmptyInput)?;

        Ok(Self {
            root,
            leaves: leaves.iter().map(|leaf| leaf.as_ref().to_vec()).collect(),
            depth,
            _hasher: PhantomData,
        })
    }

    /// Get the root of the merkle tree.
    pub fn root(&self) -> Hash {
        self.root.digest
    }

    /// The root node, for walking the tree.
    pub fn root_node(&self) -> &MerkleNode {
        &self.root
    }

    /// Number of leaves supplied by the caller (padding excluded).
    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Number of sibling digests in every proof of this tree.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Original bytes of the leaf at `index`.
    pub fn leaf(&self, index: usize) -> Option<&[u8]> {
        self.leaves.get(index).map(Vec::as_slice)
    }

    pub fn leaves(&self) -> &[Vec<u8>] {
        &self.leaves
    }

    /// Generate an inclusion proof for the leaf at `index`.
    ///
    /// Walks down from the root. At each level the half width is the number
    /// of leaf slots under the left child; the sibling on the other side of
    /// the index is recorded.
    pub fn proof(&self, index: usize) -> Result<MerkleProof> {
        self.check_index(index)?;

        let mut siblings = Vec::with_capacity(self.depth);
        let mut node = &self.root;
        let mut offset = index;
        let mut half = if self.depth == 0 { 0 } else { 1usize << (self.depth - 1) };

        while let (Some(left), Some(right)) = (node.left(), node.right()) {
            if offset < half {
                siblings.push(right.digest);
                node = left;
            } else {
                siblings.push(left.digest);
                node = right;
                offset -= half;
            }
            half /= 2;
        }

        siblings.reverse();

        Ok(MerkleProof {
            leaf_index: index,
            leaf_count: self.leaf_count(),
            siblings,
        })
    }

    /// Verify a proof for the stored leaf at `index` against this tree's root.
    pub fn verify_proof(&self, index: usize, siblings: &[Hash]) -> Result<bool> {
        self.check_index(index)?;
        verify_proof::<H>(
            self.leaf_count(),
            index,
            &self.leaves[index],
            siblings,
            &self.root(),
        )
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.leaf_count() {
            return Err(MerkleError::InvalidIndex {
                index,
                leaf_count: self.leaf_count(),
            });
        }
        Ok(())
    }
}

/// A merkle proof for a single leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleProof {
    /// Index of the proven leaf.
    pub leaf_index: usize,
    /// Leaf count of the tree the proof was taken from.
    pub leaf_count: usize,
    /// Sibling hashes from leaf to root.
    pub siblings: Vec<Hash>,
}

impl MerkleProof {
    /// Check that `leaf` sits at this proof's index under `root`.
    pub fn verify<H: HashFunction>(&self, leaf: &[u8], root: &Hash) -> Result<bool> {
        verify_proof::<H>(self.leaf_count, self.leaf_index, leaf, &self.siblings, root)
    }
}

/// Depth of the tree built from `leaf_count` leaves, after padding.
pub fn tree_depth(leaf_count: usize) -> usize {
    if leaf_count <= 1 {
        return 0;
    }
    // Padding to an even count does not change the first halving.
    let mut width = leaf_count.div_ceil(2);
    let mut depth = 1;
    while width > 1 {
        width = width.div_ceil(2);
        depth += 1;
    }
    depth
}

/// Verify an inclusion proof against a claimed root.
///
/// `siblings` must be in leaf-to-root order and have exactly
/// [`tree_depth`]`(leaf_count)` entries.
pub fn verify_proof<H: HashFunction>(
    leaf_count: usize,
    index: usize,
    leaf: &[u8],
    siblings: &[Hash],
    root: &Hash,
) -> Result<bool> {
    if index >= leaf_count {
        return Err(MerkleError::InvalidIndex { index, leaf_count });
    }
    let expected = tree_depth(leaf_count);
    if siblings.len() != expected {
        return Err(MerkleError::MalformedProof {
            expected,
            actual: siblings.len(),
        });
    }

    let mut current = H::hash(leaf);
    let mut idx = index;

    for sibling in siblings {
        current = if idx % 2 == 0 {
            H::combine(&current, sibling)
        } else {
            H::combine(sibling, &current)
        };
        idx /= 2;
    }

    Ok(current == *root)
}

/// Compute the Blake3 merkle root of a list of leaves.
pub fn merkle_root<T: AsRef<[u8]>>(leaves: &[T]) -> Result<Hash> {
    MerkleTree::new(leaves).map(|tree| tree.root())
}
