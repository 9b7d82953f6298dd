use super::{BucketNodes, BucketQueue, BucketState, TieBreak, NIL};
use crate::QueueError;

/// 旋转桶队列: 桶索引对桶数取模循环复用.
///
/// 适用于权值单调不减、且单步增量不超过 `max_step` 的最短路
/// (LiveWire 的逐弧搜索正是如此: 弧代价有界). 只支持递增取出,
/// 平局先进先出.
#[derive(Debug)]
pub struct RotatingBucketQueue {
    nodes: BucketNodes,
    minimum: usize,
}

impl RotatingBucketQueue {
    /// 构建容纳 `size` 个元素的队列, 单步权值增量上界为 `max_step`.
    pub fn new(size: usize, max_step: usize) -> Self {
        Self {
            nodes: BucketNodes::new(size, max_step + 1),
            minimum: 0,
        }
    }

    /// 桶数.
    #[inline]
    pub fn buckets(&self) -> usize {
        self.nodes.weight.len()
    }

    /// 将极值游标重置到 0, 供队列复用.
    pub fn reset_minimum(&mut self) {
        self.minimum = 0;
    }
}

impl BucketQueue for RotatingBucketQueue {
    fn insert(&mut self, id: usize, weight: f64) -> Result<(), QueueError> {
        if self.nodes.queued(id) {
            return Err(QueueError::AlreadyQueued(id));
        }
        let bucket = weight as usize % self.buckets();
        self.nodes.push(bucket, id, TieBreak::Fifo);
        Ok(())
    }

    fn remove(&mut self) -> Result<usize, QueueError> {
        if self.nodes.elements == 0 {
            return Err(QueueError::Underflow);
        }
        while self.nodes.weight[self.minimum].first == NIL {
            self.minimum = (self.minimum + 1) % self.buckets();
        }
        Ok(self.nodes.pop_first(self.minimum))
    }

    fn update(&mut self, id: usize, cur_weight: f64, new_weight: f64) -> Result<(), QueueError> {
        if self.nodes.queued(id) {
            let bucket = cur_weight as usize % self.buckets();
            self.nodes.unlink(bucket, id);
        }
        self.nodes.identity[id].state = BucketState::Removed;
        self.insert(id, new_weight)?;
        self.nodes.identity[id].state = BucketState::Updated;
        Ok(())
    }

    fn state(&self, id: usize) -> BucketState {
        self.nodes.identity[id].state
    }

    fn set_state(&mut self, id: usize, new_state: BucketState) {
        self.nodes.identity[id].state = new_state;
    }

    fn finished(&mut self, id: usize) {
        self.nodes.identity[id].state = BucketState::Removed;
    }

    fn is_empty(&self) -> bool {
        self.nodes.elements == 0
    }

    fn elements(&self) -> usize {
        self.nodes.elements
    }

    fn increasing(&self) -> bool {
        true
    }

    fn reset_state(&mut self) {
        self.nodes.reset_states();
        self.minimum = 0;
    }
}
