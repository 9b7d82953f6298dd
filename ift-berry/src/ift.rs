//! 森林生长控制循环.
//!
//! 从队列中按极值顺序取出元素, 询问路径函数能否传播,
//! 对每个邻居做廉价预判与松弛, 改善时同步队列权值.
//! 循环终止时, 每个可达元素都持有当前代价策略下定型的
//! 最优值/标签/前驱.

use crate::adjacency::Adjacency;
use crate::path::{CostScalar, PathFunction};
use crate::queue::{BucketQueue, BucketState};
use crate::{Idx2d, IftError};

/// 退化 IFT: 无邻接关系, 每次取出对全部元素做松弛.
///
/// 用于元素间两两可达的场合 (例如最小生成树式分割).
#[derive(Debug)]
pub struct DegeneratedIft<'a, P, Q> {
    function: &'a mut P,
    queue: &'a mut Q,
}

impl<'a, P: PathFunction, Q: BucketQueue> DegeneratedIft<'a, P, Q> {
    /// 组合路径函数与队列.
    pub fn new(function: &'a mut P, queue: &'a mut Q) -> Self {
        Self { function, queue }
    }

    /// 把值图中给定的元素按其当前值插入队列.
    pub fn insert_seeds<I: IntoIterator<Item = usize>>(
        &mut self,
        seeds: I,
    ) -> Result<(), IftError> {
        for elm in seeds {
            let weight = self.function.maps().value[elm].to_weight();
            self.queue.insert(elm, weight)?;
        }
        Ok(())
    }

    /// 运行至队列耗尽.
    pub fn run(&mut self) -> Result<(), IftError> {
        let size = self.function.maps().value.size();
        while !self.queue.is_empty() {
            let index = self.queue.remove()?;
            let capable = self.function.remove_hook(index, self.queue.state(index));
            self.queue.finished(index);
            if !capable {
                continue;
            }
            for adj_index in (0..size).filter(|&adj| adj != index) {
                if self.queue.state(adj_index) == BucketState::Removed {
                    continue;
                }
                if !self
                    .function
                    .capable(index, adj_index, self.queue.state(adj_index))
                {
                    continue;
                }
                let previous = self.function.maps().value[adj_index].to_weight();
                if self.function.propagate(index, adj_index, 0) {
                    let new = self.function.maps().value[adj_index].to_weight();
                    self.queue.update(adj_index, previous, new)?;
                }
            }
        }
        Ok(())
    }
}

/// 图像 IFT: 邻接关系驱动的森林生长, 支持提前终止元素.
#[derive(Debug)]
pub struct ImageIft<'a, P, Q> {
    function: &'a mut P,
    queue: &'a mut Q,
    adjacency: &'a Adjacency,
    shape: Idx2d,

    /// 提前终止元素: 该元素定型后立即退出循环.
    stop_element: Option<usize>,
}

impl<'a, P: PathFunction, Q: BucketQueue> ImageIft<'a, P, Q> {
    /// 组合值图、邻接关系、路径函数与队列.
    ///
    /// 值图大小与 `shape` 不符时返回 [`IftError::DimensionMismatch`].
    pub fn new(
        function: &'a mut P,
        adjacency: &'a Adjacency,
        shape: Idx2d,
        queue: &'a mut Q,
    ) -> Result<Self, IftError> {
        let got = function.maps().value.size();
        let want = shape.0 * shape.1;
        if got != want {
            return Err(IftError::DimensionMismatch(got, want));
        }
        Ok(Self {
            function,
            queue,
            adjacency,
            shape,
            stop_element: None,
        })
    }

    /// 设置提前终止元素. LiveWire 的点到点搜索依赖它
    /// 避免全图扫描.
    pub fn set_stop_element(&mut self, elm: usize) {
        self.stop_element = Some(elm);
    }

    /// 取消提前终止.
    pub fn clear_stop_element(&mut self) {
        self.stop_element = None;
    }

    /// 把值图中给定的元素按其当前值插入队列.
    pub fn insert_seeds<I: IntoIterator<Item = usize>>(
        &mut self,
        seeds: I,
    ) -> Result<(), IftError> {
        for elm in seeds {
            let weight = self.function.maps().value[elm].to_weight();
            self.queue.insert(elm, weight)?;
        }
        Ok(())
    }

    /// 运行至队列耗尽或终止元素定型.
    pub fn run(&mut self) -> Result<(), IftError> {
        let adj_size = self.adjacency.len();
        while !self.queue.is_empty() {
            if let Some(stop) = self.stop_element {
                if self.queue.state(stop) == BucketState::Removed {
                    break;
                }
            }
            let index = self.queue.remove()?;
            let capable = self.function.remove_hook(index, self.queue.state(index));
            self.queue.finished(index);
            if !capable {
                continue;
            }
            for slot in 0..adj_size {
                let Some(adj_index) = self.adjacency.neighbor(self.shape, index, slot) else {
                    continue;
                };
                let adj_state = self.queue.state(adj_index);
                if adj_state == BucketState::Removed {
                    continue;
                }
                if !self.function.capable(index, adj_index, adj_state) {
                    continue;
                }
                let previous = self.function.maps().value[adj_index].to_weight();
                if self.function.propagate(index, adj_index, slot) {
                    let new = self.function.maps().value[adj_index].to_weight();
                    self.queue.update(adj_index, previous, new)?;
                }
            }
        }
        Ok(())
    }
}
