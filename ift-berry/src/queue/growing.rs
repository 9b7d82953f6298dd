use super::{BucketNodes, BucketQueue, BucketState, RemovalOrder, TieBreak, NIL};
use crate::consts::{QUEUE_FAIL_BUCKETS, QUEUE_WARN_BUCKETS};
use crate::QueueError;

/// 初始桶数. 权值范围超出时再增长.
const INITIAL_BUCKETS: usize = 256;

/// 增长式桶队列: 权值范围事先未知.
///
/// 桶索引为 `(权值 / δ) mod 桶数`. 当新权值超出当前容量时,
/// 桶数组重新分配, 所有已占用的桶按 `权值 mod δ` 的相对偏移重新归位.
/// 离谱的权值范围先软警告 (1e6 桶), 再硬拒绝 (1e7 桶),
/// 避免失控的内存占用.
#[derive(Debug)]
pub struct GrowingBucketQueue {
    nodes: BucketNodes,
    minimum: f64,
    maximum: f64,
    delta: f64,
    order: RemovalOrder,
    tie: TieBreak,
}

impl GrowingBucketQueue {
    /// 构建容纳 `size` 个元素的队列, 桶宽为 `delta`.
    pub fn new(size: usize, delta: f64, order: RemovalOrder, tie: TieBreak) -> Self {
        assert!(delta > 0.0, "桶宽必须为正");
        Self {
            nodes: BucketNodes::new(size, INITIAL_BUCKETS),
            minimum: 0.0,
            maximum: 0.0,
            delta,
            order,
            tie,
        }
    }

    /// 当前桶数.
    #[inline]
    pub fn buckets(&self) -> usize {
        self.nodes.weight.len()
    }

    #[inline]
    fn index(&self, value: f64) -> usize {
        (value / self.delta) as usize % self.buckets()
    }

    /// 增长桶数组至 `new_size`, 保持所有已占用桶的相对偏移.
    fn grow(&mut self, new_size: usize) {
        let old_len = self.buckets();
        let mut new_weight = vec![super::WeightNode::default(); new_size];
        let mut wgt = self.minimum;
        for _ in 0..old_len {
            let cur_idx = self.index(wgt);
            let new_idx = (wgt / self.delta) as usize % new_size;
            new_weight[new_idx] = self.nodes.weight[cur_idx];
            wgt += self.delta;
        }
        self.nodes.weight = new_weight;
    }

    /// 权值边界维护与增长检查. 插入 `wgt` 前调用.
    fn accommodate(&mut self, wgt: f64) -> Result<(), QueueError> {
        if self.nodes.elements == 0 {
            self.minimum = wgt;
            self.maximum = wgt;
            return Ok(());
        }
        let new_min = wgt.min(self.minimum);
        let new_max = wgt.max(self.maximum);
        let new_size = 1.0 + (new_max - new_min) / self.delta;
        if new_size > QUEUE_WARN_BUCKETS {
            if new_size > QUEUE_FAIL_BUCKETS {
                return Err(QueueError::TooBig(new_size as u64));
            }
            log::warn!(
                "桶队列过于巨大, 可能要运行很久. 最小值: {new_min}, 最大值: {new_max}, 本次权值: {wgt}"
            );
        }
        if (self.buckets() as f64) <= new_size {
            self.grow(new_size as usize + 10000);
        }
        self.minimum = new_min;
        self.maximum = new_max;
        Ok(())
    }
}

impl BucketQueue for GrowingBucketQueue {
    fn insert(&mut self, id: usize, weight: f64) -> Result<(), QueueError> {
        if self.nodes.queued(id) {
            return Err(QueueError::AlreadyQueued(id));
        }
        self.accommodate(weight)?;
        let bucket = self.index(weight);
        self.nodes.push(bucket, id, self.tie);
        Ok(())
    }

    fn remove(&mut self) -> Result<usize, QueueError> {
        if self.nodes.elements == 0 {
            return Err(QueueError::Underflow);
        }
        let bucket = match self.order {
            RemovalOrder::Increasing => {
                let mut bucket = self.index(self.minimum);
                while self.nodes.weight[bucket].first == NIL {
                    self.minimum += self.delta;
                    bucket = self.index(self.minimum);
                }
                bucket
            }
            RemovalOrder::Decreasing => {
                let mut bucket = self.index(self.maximum);
                while self.nodes.weight[bucket].first == NIL {
                    self.maximum -= self.delta;
                    bucket = self.index(self.maximum);
                }
                bucket
            }
        };
        Ok(self.nodes.pop_first(bucket))
    }

    fn update(&mut self, id: usize, cur_weight: f64, new_weight: f64) -> Result<(), QueueError> {
        if self.nodes.queued(id) {
            let bucket = self.index(cur_weight);
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
        self.order == RemovalOrder::Increasing
    }

    fn reset_state(&mut self) {
        self.nodes.reset_states();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_tie_order() {
        let mut q = GrowingBucketQueue::new(8, 1.0, RemovalOrder::Increasing, TieBreak::Fifo);
        for id in [3usize, 1, 5] {
            q.insert(id, 7.0).unwrap();
        }
        assert_eq!(q.remove().unwrap(), 3);
        assert_eq!(q.remove().unwrap(), 1);
        assert_eq!(q.remove().unwrap(), 5);
    }

    #[test]
    fn test_lifo_tie_order() {
        let mut q = GrowingBucketQueue::new(8, 1.0, RemovalOrder::Increasing, TieBreak::Lifo);
        for id in [3usize, 1, 5] {
            q.insert(id, 7.0).unwrap();
        }
        assert_eq!(q.remove().unwrap(), 5);
        assert_eq!(q.remove().unwrap(), 1);
        assert_eq!(q.remove().unwrap(), 3);
    }

    #[test]
    fn test_increasing_extracts_minimum() {
        let mut q = GrowingBucketQueue::new(8, 1.0, RemovalOrder::Increasing, TieBreak::Fifo);
        q.insert(0, 9.0).unwrap();
        q.insert(1, 2.0).unwrap();
        q.insert(2, 5.0).unwrap();
        assert_eq!(q.remove().unwrap(), 1);
        q.finished(1);
        q.insert(3, 1.0).unwrap();
        assert_eq!(q.remove().unwrap(), 3);
        assert_eq!(q.remove().unwrap(), 2);
        assert_eq!(q.remove().unwrap(), 0);
    }

    #[test]
    fn test_decreasing_extracts_maximum() {
        let mut q = GrowingBucketQueue::new(8, 1.0, RemovalOrder::Decreasing, TieBreak::Fifo);
        q.insert(0, 3.0).unwrap();
        q.insert(1, 8.0).unwrap();
        q.insert(2, 5.0).unwrap();
        assert_eq!(q.remove().unwrap(), 1);
        assert_eq!(q.remove().unwrap(), 2);
        assert_eq!(q.remove().unwrap(), 0);
    }

    #[test]
    fn test_double_insert_rejected() {
        let mut q = GrowingBucketQueue::new(4, 1.0, RemovalOrder::Increasing, TieBreak::Fifo);
        q.insert(2, 1.0).unwrap();
        assert_eq!(q.insert(2, 3.0), Err(QueueError::AlreadyQueued(2)));
    }

    #[test]
    fn test_underflow_rejected() {
        let mut q = GrowingBucketQueue::new(4, 1.0, RemovalOrder::Increasing, TieBreak::Fifo);
        assert_eq!(q.remove(), Err(QueueError::Underflow));
    }

    #[test]
    fn test_growth_preserves_order() {
        let mut q = GrowingBucketQueue::new(16, 1.0, RemovalOrder::Increasing, TieBreak::Fifo);
        // 先塞满小权值, 再插入一个远超初始 256 桶容量的权值触发增长.
        for id in 0..8usize {
            q.insert(id, id as f64 * 10.0).unwrap();
        }
        q.insert(8, 5000.0).unwrap();
        assert!(q.buckets() > INITIAL_BUCKETS);
        let mut got = Vec::new();
        while !q.is_empty() {
            let id = q.remove().unwrap();
            q.finished(id);
            got.push(id);
        }
        assert_eq!(got, vec![0, 1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_runaway_growth_rejected() {
        let mut q = GrowingBucketQueue::new(4, 1.0, RemovalOrder::Increasing, TieBreak::Fifo);
        q.insert(0, 0.0).unwrap();
        assert!(matches!(q.insert(1, 1.0e9), Err(QueueError::TooBig(_))));
    }

    #[test]
    fn test_update_moves_element() {
        let mut q = GrowingBucketQueue::new(4, 1.0, RemovalOrder::Increasing, TieBreak::Fifo);
        q.insert(0, 9.0).unwrap();
        q.insert(1, 5.0).unwrap();
        q.update(0, 9.0, 2.0).unwrap();
        assert_eq!(q.state(0), BucketState::Updated);
        assert_eq!(q.remove().unwrap(), 0);
        assert_eq!(q.remove().unwrap(), 1);
    }

    #[test]
    fn test_reset_state() {
        let mut q = GrowingBucketQueue::new(4, 1.0, RemovalOrder::Increasing, TieBreak::Fifo);
        q.insert(0, 1.0).unwrap();
        let id = q.remove().unwrap();
        q.finished(id);
        q.reset_state();
        assert_eq!(q.state(0), BucketState::NotVisited);
    }
}
