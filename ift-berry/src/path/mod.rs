//! 可插拔的路径函数族.
//!
//! 路径函数决定 IFT 中路径代价如何在种子处初始化、如何沿边传播.
//! 每个策略持有本次运行的森林映射 (值/标签/前驱), 驱动方在运行
//! 之间重新借用这些映射做种子初始化与结果读取.

mod geosum;
mod livewire;
mod max;
mod oriented;
mod sum;

pub use geosum::GeodesicRestrictionPathFunction;
pub use livewire::{LiveWirePathFunction, SideAdjacency};
pub use max::MaxPathFunction;
pub use oriented::{OrientedExternPathFunction, OrientedInternPathFunction};
pub use sum::SumPathFunction;

use crate::queue::BucketState;
use crate::GridMap;
use num::{Bounded, NumCast};

/// 前驱图中森林根的哨兵值.
pub const ROOT: i32 = -1;

/// 代价标量: 整数或浮点像素值.
pub trait CostScalar: Copy + PartialOrd + NumCast + Bounded {
    /// 转为队列权值.
    fn to_weight(self) -> f64;

    /// 从 f64 截断转换, 越界时取饱和值.
    fn from_weight(w: f64) -> Self;
}

impl CostScalar for i32 {
    #[inline]
    fn to_weight(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_weight(w: f64) -> Self {
        if w >= i32::MAX as f64 {
            i32::MAX
        } else {
            w as i32
        }
    }
}

impl CostScalar for f32 {
    #[inline]
    fn to_weight(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_weight(w: f64) -> Self {
        w as f32
    }
}

/// 按可用映射一次性选定的取出/更新变体.
///
/// 选定之后热循环里只做一次 `match`, 不做逐映射的空值判断.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MapSet {
    /// 只有值图.
    Simple,

    /// 值图 + 前驱图.
    Predecessor,

    /// 值图 + 标签图.
    Label,

    /// 值图 + 标签图 + 前驱图.
    Complete,
}

impl MapSet {
    fn of(label: bool, predecessor: bool) -> Self {
        match (label, predecessor) {
            (false, false) => Self::Simple,
            (false, true) => Self::Predecessor,
            (true, false) => Self::Label,
            (true, true) => Self::Complete,
        }
    }
}

/// 一次 IFT 运行的森林映射集合.
#[derive(Clone, Debug)]
pub struct ForestMaps<D> {
    /// 路径代价图. 语义由所属路径函数定义.
    pub value: GridMap<D>,

    /// 标签图 (对象/背景或轮廓弧段号). 可缺省.
    pub label: Option<GridMap<i32>>,

    /// 前驱图, 构成森林. 根的前驱为 [`ROOT`]. 可缺省.
    pub predecessor: Option<GridMap<i32>>,
}

impl<D: Copy> ForestMaps<D> {
    /// 以统一初值构建.
    pub fn new(value: GridMap<D>, with_label: bool, with_predecessor: bool) -> Self {
        let shape = value.shape();
        Self {
            value,
            label: with_label.then(|| GridMap::filled(shape, 0)),
            predecessor: with_predecessor.then(|| GridMap::filled(shape, ROOT)),
        }
    }

    /// 本映射集合对应的更新变体.
    #[inline]
    pub fn update_set(&self) -> MapSet {
        MapSet::of(self.label.is_some(), self.predecessor.is_some())
    }

    /// 成功传播后的映射更新: 按变体拷贝前驱/标签.
    #[inline]
    pub(crate) fn apply_update(&mut self, set: MapSet, index: usize, adj_index: usize) {
        match set {
            MapSet::Simple => {}
            MapSet::Predecessor => {
                self.predecessor.as_mut().unwrap()[adj_index] = index as i32;
            }
            MapSet::Label => {
                let label = self.label.as_mut().unwrap();
                label[adj_index] = label[index];
            }
            MapSet::Complete => {
                self.predecessor.as_mut().unwrap()[adj_index] = index as i32;
                let label = self.label.as_mut().unwrap();
                label[adj_index] = label[index];
            }
        }
    }

    /// 种子 (首次取出) 的根初始化: 前驱置 [`ROOT`], 顺序标号模式下分配新标号.
    #[inline]
    pub(crate) fn init_root(&mut self, index: usize, next_label: &mut Option<i32>) {
        if let Some(pred) = self.predecessor.as_mut() {
            pred[index] = ROOT;
        }
        if let (Some(label), Some(next)) = (self.label.as_mut(), next_label.as_mut()) {
            label[index] = *next;
            *next += 1;
        }
    }
}

/// 路径函数策略契约.
///
/// `propagate` 在内部完成值与标签/前驱的写入,
/// 驱动循环只负责队列权值的同步.
pub trait PathFunction {
    /// 代价标量类型.
    type Scalar: CostScalar;

    /// 借用森林映射.
    fn maps(&self) -> &ForestMaps<Self::Scalar>;

    /// 可变借用森林映射, 供驱动方做种子初始化.
    fn maps_mut(&mut self) -> &mut ForestMaps<Self::Scalar>;

    /// 元素取出钩子. 对首次取出的种子做根初始化,
    /// 返回该元素是否还有资格向外传播.
    fn remove_hook(&mut self, index: usize, state: BucketState) -> bool;

    /// 廉价预判: `index → adj_index` 这条边是否可能改善 `adj_index`.
    fn capable(&self, index: usize, adj_index: usize, adj_state: BucketState) -> bool;

    /// 计算候选传播值; 若严格改善则写入映射并返回 `true`.
    ///
    /// `adj_slot` 是邻接偏移槽位, 供依赖边几何的策略使用.
    fn propagate(&mut self, index: usize, adj_index: usize, adj_slot: usize) -> bool;

    /// 取出顺序: `true` 为先取最小.
    fn increasing(&self) -> bool;

    /// 切换增量传播模式. 开启后, 重复运行会保留先前已定型的
    /// 非种子区域, 而不是从种子集重新计算.
    fn differential_propagation(&mut self, enable: bool);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_set_selection() {
        assert_eq!(MapSet::of(false, false), MapSet::Simple);
        assert_eq!(MapSet::of(false, true), MapSet::Predecessor);
        assert_eq!(MapSet::of(true, false), MapSet::Label);
        assert_eq!(MapSet::of(true, true), MapSet::Complete);
    }

    #[test]
    fn test_apply_update_complete() {
        let value = GridMap::filled((2, 2), 0i32);
        let mut maps = ForestMaps::new(value, true, true);
        maps.label.as_mut().unwrap()[0usize] = 7;
        let set = maps.update_set();
        assert_eq!(set, MapSet::Complete);
        maps.apply_update(set, 0, 3);
        assert_eq!(maps.label.as_ref().unwrap()[3usize], 7);
        assert_eq!(maps.predecessor.as_ref().unwrap()[3usize], 0);
    }

    #[test]
    fn test_cost_scalar_saturation() {
        assert_eq!(i32::from_weight(1.0e12), i32::MAX);
        assert_eq!(i32::from_weight(41.9), 41);
        assert_eq!(f32::from_weight(2.5), 2.5f32);
    }
}
