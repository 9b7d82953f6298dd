//! 桶排序优先队列族.
//!
//! 以离散化的标量权值为桶索引, 配合侵入式双向链表,
//! 为 IFT 一类算法提供近 O(1) 的插入/取出.
//! 三个实现共享同一套节点布局:
//!
//! - [`GrowingBucketQueue`]: 权值范围未知, 桶数组按需增长;
//! - [`FastBucketQueue`]: 调用方给出精确下界与桶数, 严格 O(1);
//! - [`RotatingBucketQueue`]: 循环桶索引, 供 LiveWire 的单调最短路使用.

mod fast;
mod growing;
mod rotating;

pub use fast::FastBucketQueue;
pub use growing::GrowingBucketQueue;
pub use rotating::RotatingBucketQueue;

use crate::QueueError;

/// 链表空位哨兵.
pub(crate) const NIL: usize = usize::MAX;

/// 队列中单个元素的状态.
///
/// 不变式: 元素恰好位于一个桶中, 当且仅当状态为
/// `Inserted` 或 `Updated`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum BucketState {
    /// 从未进入过队列.
    #[default]
    NotVisited,

    /// 已插入, 尚未被更新过.
    Inserted,

    /// 在队列中且权值被更新过.
    Updated,

    /// 已被取出并定型.
    Removed,
}

/// 取出顺序.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RemovalOrder {
    /// 先取最小权值.
    Increasing,

    /// 先取最大权值.
    Decreasing,
}

/// 同桶平局规则.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TieBreak {
    /// 先进先出.
    Fifo,

    /// 后进先出.
    Lifo,
}

/// 每个元素的侵入式链表节点 (状态, 前驱, 后继).
#[derive(Copy, Clone, Debug)]
pub(crate) struct IdentityNode {
    pub state: BucketState,
    pub prev: usize,
    pub next: usize,
}

impl Default for IdentityNode {
    fn default() -> Self {
        Self {
            state: BucketState::NotVisited,
            prev: NIL,
            next: NIL,
        }
    }
}

/// 每个桶的首尾元素编号.
#[derive(Copy, Clone, Debug)]
pub(crate) struct WeightNode {
    pub first: usize,
    pub last: usize,
}

impl Default for WeightNode {
    fn default() -> Self {
        Self {
            first: NIL,
            last: NIL,
        }
    }
}

/// 三种桶队列共享的节点仓库与链表操作.
#[derive(Debug)]
pub(crate) struct BucketNodes {
    pub identity: Vec<IdentityNode>,
    pub weight: Vec<WeightNode>,
    pub elements: usize,
}

impl BucketNodes {
    pub fn new(size: usize, buckets: usize) -> Self {
        Self {
            identity: vec![IdentityNode::default(); size],
            weight: vec![WeightNode::default(); buckets],
            elements: 0,
        }
    }

    /// 元素是否正在某个桶里.
    #[inline]
    pub fn queued(&self, id: usize) -> bool {
        matches!(
            self.identity[id].state,
            BucketState::Inserted | BucketState::Updated
        )
    }

    /// 将 `id` 挂入 `bucket` 桶, 平局规则由 `tie` 决定. 状态置为 `Inserted`.
    pub fn push(&mut self, bucket: usize, id: usize, tie: TieBreak) {
        self.elements += 1;
        let slot = &mut self.weight[bucket];
        match tie {
            TieBreak::Fifo => {
                if slot.first == NIL {
                    slot.first = id;
                    self.identity[id].prev = NIL;
                } else {
                    let tail = slot.last;
                    self.identity[tail].next = id;
                    self.identity[id].prev = tail;
                }
                slot.last = id;
                self.identity[id].next = NIL;
            }
            TieBreak::Lifo => {
                if slot.first == NIL {
                    slot.last = id;
                    self.identity[id].next = NIL;
                } else {
                    let head = slot.first;
                    self.identity[head].prev = id;
                    self.identity[id].next = head;
                }
                slot.first = id;
                self.identity[id].prev = NIL;
            }
        }
        self.identity[id].state = BucketState::Inserted;
    }

    /// 弹出 `bucket` 桶的队首元素. 桶必须非空.
    pub fn pop_first(&mut self, bucket: usize) -> usize {
        debug_assert_ne!(self.weight[bucket].first, NIL);
        self.elements -= 1;
        let id = self.weight[bucket].first;
        let next = self.identity[id].next;
        self.weight[bucket].first = next;
        if next == NIL {
            self.weight[bucket].last = NIL;
        } else {
            self.identity[next].prev = NIL;
        }
        id
    }

    /// 从 `bucket` 桶中摘除任意位置的 `id`. 供权值更新使用.
    pub fn unlink(&mut self, bucket: usize, id: usize) {
        if self.elements == 0 {
            return;
        }
        self.elements -= 1;
        let prev = self.identity[id].prev;
        let next = self.identity[id].next;
        if self.weight[bucket].first == id {
            self.weight[bucket].first = next;
            if next == NIL {
                self.weight[bucket].last = NIL;
            } else {
                self.identity[next].prev = NIL;
            }
        } else {
            self.identity[prev].next = next;
            if next == NIL {
                self.weight[bucket].last = prev;
            } else {
                self.identity[next].prev = prev;
            }
        }
    }

    /// 将所有元素状态重置为 `NotVisited`, 供队列复用.
    pub fn reset_states(&mut self) {
        for node in self.identity.iter_mut() {
            node.state = BucketState::NotVisited;
        }
    }
}

/// 桶队列统一契约. 路径函数只依赖其中的状态查询.
pub trait BucketQueue {
    /// 以权值 `weight` 插入元素 `id`.
    ///
    /// 元素已在队列中时返回 [`QueueError::AlreadyQueued`].
    fn insert(&mut self, id: usize, weight: f64) -> Result<(), QueueError>;

    /// 取出当前极值 (最小或最大, 取决于配置) 权值的元素.
    ///
    /// 空队列返回 [`QueueError::Underflow`]. 取出 **不** 修改元素状态;
    /// 定型由调用方通过 [`BucketQueue::finished`] 显式完成.
    fn remove(&mut self) -> Result<usize, QueueError>;

    /// 把 `id` 的权值从 `cur_weight` 改为 `new_weight`.
    ///
    /// 语义等价于先按 `cur_weight` 摘除再按 `new_weight` 插入,
    /// 完成后元素状态为 [`BucketState::Updated`].
    fn update(&mut self, id: usize, cur_weight: f64, new_weight: f64) -> Result<(), QueueError>;

    /// 查询元素状态.
    fn state(&self, id: usize) -> BucketState;

    /// 改写元素状态.
    fn set_state(&mut self, id: usize, new_state: BucketState);

    /// 将元素标记为已定型 ([`BucketState::Removed`]).
    fn finished(&mut self, id: usize);

    /// 队列是否为空.
    fn is_empty(&self) -> bool;

    /// 队列中的元素个数.
    fn elements(&self) -> usize;

    /// 是否按权值递增顺序取出.
    fn increasing(&self) -> bool;

    /// 将全部元素状态重置为 `NotVisited`.
    fn reset_state(&mut self);
}

#[cfg(test)]
mod oracle_tests {
    //! 以 binary-heap-plus 堆为参照, 验证桶队列在随机交错
    //! 插入/更新/取出下的全序一致性.

    use super::*;
    use binary_heap_plus::BinaryHeap;
    use std::collections::HashMap;

    /// 确定性伪随机序列.
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self) -> u64 {
            self.0 = self
                .0
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            self.0 >> 33
        }
    }

    /// 惰性删除的堆参照模型: (权值, 插入序号, 元素) 最小堆,
    /// 过期条目弹出时跳过. FIFO 平局由插入序号保证.
    struct HeapOracle {
        heap: BinaryHeap<(i64, u64, usize), binary_heap_plus::MinComparator>,
        live: HashMap<usize, (i64, u64)>,
        seq: u64,
    }

    impl HeapOracle {
        fn new() -> Self {
            Self {
                heap: BinaryHeap::new_min(),
                live: HashMap::new(),
                seq: 0,
            }
        }

        fn insert(&mut self, id: usize, w: i64) {
            self.seq += 1;
            self.live.insert(id, (w, self.seq));
            self.heap.push((w, self.seq, id));
        }

        /// 语义上等价于 `Remove(id@旧权值)` 后 `Insert(id@新权值)`.
        fn update(&mut self, id: usize, w: i64) {
            self.insert(id, w);
        }

        fn remove(&mut self) -> usize {
            loop {
                let (w, seq, id) = self.heap.pop().expect("参照模型下溢");
                if self.live.get(&id) == Some(&(w, seq)) {
                    self.live.remove(&id);
                    return id;
                }
            }
        }
    }

    #[test]
    fn test_random_workload_matches_oracle() {
        let mut rng = Lcg(20120906);
        let mut queue =
            GrowingBucketQueue::new(64, 1.0, RemovalOrder::Increasing, TieBreak::Fifo);
        let mut oracle = HeapOracle::new();
        let mut weight_of: HashMap<usize, i64> = HashMap::new();
        let mut free: Vec<usize> = (0..64).collect();

        for _ in 0..4000 {
            match rng.next() % 3 {
                0 if !free.is_empty() => {
                    let id = free.swap_remove(rng.next() as usize % free.len());
                    let w = (rng.next() % 200) as i64;
                    queue.insert(id, w as f64).unwrap();
                    oracle.insert(id, w);
                    weight_of.insert(id, w);
                }
                1 if !weight_of.is_empty() => {
                    let &id = weight_of
                        .keys()
                        .nth(rng.next() as usize % weight_of.len())
                        .unwrap();
                    let old = weight_of[&id];
                    let new = (rng.next() % 200) as i64;
                    queue.update(id, old as f64, new as f64).unwrap();
                    oracle.update(id, new);
                    weight_of.insert(id, new);
                }
                _ if !weight_of.is_empty() => {
                    let got = queue.remove().unwrap();
                    queue.finished(got);
                    let want = oracle.remove();
                    assert_eq!(got, want);
                    weight_of.remove(&got);
                    free.push(got);
                }
                _ => {}
            }
        }
        // 清空两者并比较剩余全序.
        while !queue.is_empty() {
            let got = queue.remove().unwrap();
            queue.finished(got);
            assert_eq!(got, oracle.remove());
        }
    }

    #[test]
    fn test_fast_queue_matches_oracle() {
        let mut rng = Lcg(20130914);
        let mut queue = FastBucketQueue::new(32, 0.0, 64, RemovalOrder::Increasing, TieBreak::Fifo);
        let mut oracle = HeapOracle::new();
        let mut queued: Vec<(usize, i64)> = Vec::new();
        let mut free: Vec<usize> = (0..32).collect();
        let mut floor = 0i64;

        // 定界队列要求取出单调: 权值只增不减地生成.
        for _ in 0..2000 {
            if rng.next() % 2 == 0 && !free.is_empty() {
                let id = free.swap_remove(rng.next() as usize % free.len());
                let w = (floor + (rng.next() % 8) as i64).min(63);
                queue.insert(id, w as f64).unwrap();
                oracle.insert(id, w);
                queued.push((id, w));
            } else if !queued.is_empty() {
                let got = queue.remove().unwrap();
                queue.finished(got);
                assert_eq!(got, oracle.remove());
                let at = queued.iter().position(|&(id, _)| id == got).unwrap();
                let (_, w) = queued.swap_remove(at);
                floor = floor.max(w);
                free.push(got);
            }
        }
    }
}
