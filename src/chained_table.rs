//! ChainedTable: separate chaining with nodes kept in a generational arena.
//!
//! Buckets hold the key of their first node; each node holds the key of the
//! next. New nodes are prepended, so a bucket iterates newest first.

use crate::health::Violation;
use crate::policy::ResizePolicy;
use crate::strategy::{CollisionStrategy, Placement};
use slotmap::{DefaultKey, SlotMap};

#[derive(Clone, Debug)]
struct Node<T> {
    value: T,
    hash: u64,
    next: Option<DefaultKey>,
}

/// Position of a node: its bucket, the node, and the node linking to it
/// (`None` when the node is the bucket head).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct NodePosition {
    bucket: usize,
    prev: Option<DefaultKey>,
    node: DefaultKey,
}

#[derive(Clone, Debug)]
pub struct ChainedTable<T> {
    buckets: Vec<Option<DefaultKey>>,
    nodes: SlotMap<DefaultKey, Node<T>>,
}

impl<T> ChainedTable<T> {
    pub fn new() -> Self {
        Self {
            buckets: Vec::new(),
            nodes: SlotMap::with_key(),
        }
    }

    /// Number of nodes in bucket `index`.
    pub fn chain_len(&self, index: usize) -> usize {
        let mut len = 0;
        let mut cursor = self.buckets.get(index).copied().flatten();
        while let Some(k) = cursor {
            len += 1;
            cursor = self.nodes[k].next;
        }
        len
    }

    #[inline]
    fn bucket_of(hash: u64, buckets: usize) -> usize {
        (hash % buckets as u64) as usize
    }

    fn head_from(&self, start: usize) -> Option<NodePosition> {
        (start..self.buckets.len()).find_map(|bucket| {
            self.buckets[bucket].map(|node| NodePosition {
                bucket,
                prev: None,
                node,
            })
        })
    }
}

impl<T> Default for ChainedTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CollisionStrategy<T> for ChainedTable<T> {
    type Position = NodePosition;

    fn admissible_capacity(&self, requested: usize) -> usize {
        requested.max(1)
    }

    fn capacity(&self) -> usize {
        self.buckets.len()
    }

    fn reset(&mut self, capacity: usize) {
        self.nodes.clear();
        self.buckets = vec![None; capacity];
    }

    fn find<F>(&self, hash: u64, mut eq: F) -> Option<NodePosition>
    where
        F: FnMut(&T) -> bool,
    {
        if self.buckets.is_empty() {
            return None;
        }
        let bucket = Self::bucket_of(hash, self.buckets.len());
        let mut prev = None;
        let mut cursor = self.buckets[bucket];
        while let Some(node) = cursor {
            let n = &self.nodes[node];
            if n.hash == hash && eq(&n.value) {
                return Some(NodePosition { bucket, prev, node });
            }
            prev = Some(node);
            cursor = n.next;
        }
        None
    }

    // Chains never force growth on length; only the load test applies.
    fn place<R>(&mut self, hash: u64, value: T, _policy: &R) -> Placement<T>
    where
        T: Eq,
        R: ResizePolicy + ?Sized,
    {
        if self.buckets.is_empty() {
            return Placement::Grow(value);
        }
        if self.find(hash, |v| *v == value).is_some() {
            return Placement::Present(value);
        }
        let bucket = Self::bucket_of(hash, self.buckets.len());
        let next = self.buckets[bucket];
        let key = self.nodes.insert(Node { value, hash, next });
        self.buckets[bucket] = Some(key);
        Placement::Inserted
    }

    fn rehash(&mut self, capacity: usize) -> bool {
        let mut buckets = vec![None; capacity];
        for (key, node) in self.nodes.iter_mut() {
            let bucket = Self::bucket_of(node.hash, capacity);
            node.next = buckets[bucket];
            buckets[bucket] = Some(key);
        }
        self.buckets = buckets;
        true
    }

    fn get(&self, position: NodePosition) -> &T {
        &self.nodes[position.node].value
    }

    fn take(&mut self, position: NodePosition) -> (T, Option<NodePosition>) {
        let NodePosition { bucket, prev, node } = position;
        let removed = self
            .nodes
            .remove(node)
            .expect("position must refer to a live node");
        match prev {
            Some(p) => self.nodes[p].next = removed.next,
            None => self.buckets[bucket] = removed.next,
        }
        let successor = match removed.next {
            Some(next) => Some(NodePosition {
                bucket,
                prev,
                node: next,
            }),
            None => self.head_from(bucket + 1),
        };
        (removed.value, successor)
    }

    fn first(&self) -> Option<NodePosition> {
        self.head_from(0)
    }

    fn successor(&self, position: NodePosition) -> Option<NodePosition> {
        match self.nodes[position.node].next {
            Some(next) => Some(NodePosition {
                bucket: position.bucket,
                prev: Some(position.node),
                node: next,
            }),
            None => self.head_from(position.bucket + 1),
        }
    }

    fn slot_of(&self, position: NodePosition) -> usize {
        position.bucket
    }

    fn check_placement<H, V>(&self, hash: H, report: &mut V)
    where
        H: Fn(&T) -> u64,
        V: FnMut(Violation),
    {
        let buckets = self.buckets.len();
        for (bucket, head) in self.buckets.iter().enumerate() {
            let mut cursor = *head;
            // Bounded so a corrupted cycle cannot hang the check.
            let mut budget = self.nodes.len();
            while let Some(key) = cursor {
                if budget == 0 {
                    break;
                }
                budget -= 1;
                let Some(node) = self.nodes.get(key) else {
                    break;
                };
                let current = hash(&node.value);
                if current != node.hash {
                    report(Violation::HashDrift { slot: bucket });
                }
                let expected = Self::bucket_of(current, buckets);
                if expected != bucket {
                    report(Violation::MisplacedNode { bucket, expected });
                }
                cursor = node.next;
            }
        }
    }
}
