use super::{BucketNodes, BucketQueue, BucketState, RemovalOrder, TieBreak, NIL};
use crate::QueueError;

/// 定界快速桶队列: 调用方预先给出精确的权值下界与桶数.
///
/// 桶索引是 `权值 − 下界` 的精确算术, 不做任何重新分配,
/// 因此所有操作严格 O(1) (取出操作对游标做摊还扫描).
/// 适用于权值范围已知的路径函数, 例如梯度幅值域.
#[derive(Debug)]
pub struct FastBucketQueue {
    nodes: BucketNodes,
    minimum: f64,
    order: RemovalOrder,
    tie: TieBreak,

    /// 极值桶游标. 只在插入更小 (或更大) 权值时回退.
    current: usize,
}

impl FastBucketQueue {
    /// 构建容纳 `size` 个元素的队列.
    ///
    /// 权值必须全部落在 `[minimum, minimum + n_buckets)` 内, 否则 panic.
    pub fn new(
        size: usize,
        minimum: f64,
        n_buckets: usize,
        order: RemovalOrder,
        tie: TieBreak,
    ) -> Self {
        assert!(n_buckets > 0, "桶数必须为正");
        Self {
            nodes: BucketNodes::new(size, n_buckets),
            minimum,
            order,
            tie,
            current: match order {
                RemovalOrder::Increasing => 0,
                RemovalOrder::Decreasing => n_buckets - 1,
            },
        }
    }

    /// 桶数.
    #[inline]
    pub fn buckets(&self) -> usize {
        self.nodes.weight.len()
    }

    #[inline]
    fn index(&self, value: f64) -> usize {
        let idx = (value - self.minimum) as usize;
        assert!(idx < self.buckets(), "权值 {value} 超出定界队列范围");
        idx
    }
}

impl BucketQueue for FastBucketQueue {
    fn insert(&mut self, id: usize, weight: f64) -> Result<(), QueueError> {
        if self.nodes.queued(id) {
            return Err(QueueError::AlreadyQueued(id));
        }
        let bucket = self.index(weight);
        self.nodes.push(bucket, id, self.tie);
        match self.order {
            RemovalOrder::Increasing if bucket < self.current => self.current = bucket,
            RemovalOrder::Decreasing if bucket > self.current => self.current = bucket,
            _ => {}
        }
        Ok(())
    }

    fn remove(&mut self) -> Result<usize, QueueError> {
        if self.nodes.elements == 0 {
            return Err(QueueError::Underflow);
        }
        while self.nodes.weight[self.current].first == NIL {
            match self.order {
                RemovalOrder::Increasing => self.current += 1,
                RemovalOrder::Decreasing => self.current -= 1,
            }
        }
        Ok(self.nodes.pop_first(self.current))
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
    fn test_exact_range_ordering() {
        let mut q = FastBucketQueue::new(8, 10.0, 16, RemovalOrder::Increasing, TieBreak::Fifo);
        q.insert(0, 25.0).unwrap();
        q.insert(1, 10.0).unwrap();
        q.insert(2, 17.0).unwrap();
        assert_eq!(q.remove().unwrap(), 1);
        assert_eq!(q.remove().unwrap(), 2);
        assert_eq!(q.remove().unwrap(), 0);
    }

    #[test]
    fn test_decreasing_lifo() {
        let mut q = FastBucketQueue::new(8, 0.0, 8, RemovalOrder::Decreasing, TieBreak::Lifo);
        q.insert(0, 3.0).unwrap();
        q.insert(1, 3.0).unwrap();
        q.insert(2, 7.0).unwrap();
        assert_eq!(q.remove().unwrap(), 2);
        // 同桶平局后进先出.
        assert_eq!(q.remove().unwrap(), 1);
        assert_eq!(q.remove().unwrap(), 0);
    }

    #[test]
    fn test_cursor_rewinds_on_lower_insert() {
        let mut q = FastBucketQueue::new(8, 0.0, 8, RemovalOrder::Increasing, TieBreak::Fifo);
        q.insert(0, 6.0).unwrap();
        assert_eq!(q.remove().unwrap(), 0);
        q.finished(0);
        q.insert(1, 2.0).unwrap();
        assert_eq!(q.remove().unwrap(), 1);
    }

    #[test]
    #[should_panic(expected = "超出定界队列范围")]
    fn test_out_of_range_weight_panics() {
        let mut q = FastBucketQueue::new(4, 0.0, 4, RemovalOrder::Increasing, TieBreak::Fifo);
        let _ = q.insert(0, 4.0);
    }
}
