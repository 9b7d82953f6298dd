use super::{CostScalar, ForestMaps, PathFunction};
use crate::queue::BucketState;
use crate::{GridMap, SegError};

/// 定向边代价的公共实现. 外向与内向只在取向反转条件上不同.
#[derive(Debug)]
struct OrientedCore<D> {
    maps: ForestMaps<D>,
    handicap: GridMap<D>,
    intensity: GridMap<D>,

    /// 第一遍测地前驱森林. 沿该森林边的弧权压为零.
    restriction: Option<GridMap<i32>>,
    alpha: f64,
    next_label: Option<i32>,
}

impl<D: CostScalar> OrientedCore<D> {
    fn new(
        maps: ForestMaps<D>,
        handicap: GridMap<D>,
        intensity: GridMap<D>,
        restriction: Option<GridMap<i32>>,
        alpha: f64,
    ) -> Result<Self, SegError> {
        assert_eq!(maps.value.shape(), handicap.shape(), "梯度图形状不符");
        assert_eq!(maps.value.shape(), intensity.shape(), "亮度图形状不符");
        if let Some(r) = restriction.as_ref() {
            assert_eq!(maps.value.shape(), r.shape(), "约束前驱图形状不符");
        }
        assert!(maps.label.is_some(), "定向路径函数需要标签图");
        if !(0.0..=1.0).contains(&alpha) {
            return Err(SegError::InvalidAlpha(alpha));
        }
        Ok(Self {
            maps,
            handicap,
            intensity,
            restriction,
            alpha,
            next_label: None,
        })
    }

    fn remove_hook(&mut self, index: usize, state: BucketState) -> bool {
        if state == BucketState::Inserted {
            self.maps.init_root(index, &mut self.next_label);
        }
        true
    }

    fn capable(&self, index: usize, adj_index: usize, adj_state: BucketState) -> bool {
        adj_state != BucketState::Removed
            && self.maps.value[index] < self.maps.value[adj_index]
    }

    /// `invert_on_object` 为内向变体: 对象标签反转取向;
    /// 否则为外向变体: 背景标签反转取向.
    fn propagate(&mut self, index: usize, adj_index: usize, invert_on_object: bool) -> bool {
        let src_value = self.maps.value[adj_index];
        let mut arc =
            self.handicap[index].to_weight() + self.handicap[adj_index].to_weight();
        let mut fraction = if self.intensity[index] > self.intensity[adj_index] {
            self.alpha
        } else if self.intensity[index] < self.intensity[adj_index] {
            -self.alpha
        } else {
            0.0
        };
        let label = self.maps.label.as_ref().unwrap();
        let on_object = label[index] != 0;
        if on_object == invert_on_object {
            fraction = -fraction;
        }
        arc = (arc * (1.0 + fraction)).round() + 1.0;
        if let Some(restriction) = self.restriction.as_ref() {
            if (on_object && restriction[index] == adj_index as i32)
                || (!on_object && restriction[adj_index] == index as i32)
            {
                arc = 0.0;
            }
        }
        arc += 1.0;
        let prp_value = D::from_weight(arc);
        if src_value > prp_value {
            self.maps.value[adj_index] = prp_value;
            let set = self.maps.update_set();
            self.maps.apply_update(set, index, adj_index);
            return true;
        }
        false
    }
}

/// 外向定向路径函数: 适用于对象亮于背景的边界取向 (alpha >= 0).
#[derive(Debug)]
pub struct OrientedExternPathFunction<D> {
    core: OrientedCore<D>,
}

impl<D: CostScalar> OrientedExternPathFunction<D> {
    /// 绑定映射、梯度、亮度与可选的测地约束前驱森林.
    ///
    /// 要求标签图存在, `alpha` 在 `[0, 1]` 内.
    pub fn new(
        maps: ForestMaps<D>,
        handicap: GridMap<D>,
        intensity: GridMap<D>,
        restriction: Option<GridMap<i32>>,
        alpha: f64,
    ) -> Result<Self, SegError> {
        Ok(Self {
            core: OrientedCore::new(maps, handicap, intensity, restriction, alpha)?,
        })
    }

    /// 拆出森林映射. 供约束森林更新后重建第二遍时回收.
    pub fn into_maps(self) -> ForestMaps<D> {
        self.core.maps
    }
}

impl<D: CostScalar> PathFunction for OrientedExternPathFunction<D> {
    type Scalar = D;

    fn maps(&self) -> &ForestMaps<D> {
        &self.core.maps
    }

    fn maps_mut(&mut self) -> &mut ForestMaps<D> {
        &mut self.core.maps
    }

    fn remove_hook(&mut self, index: usize, state: BucketState) -> bool {
        self.core.remove_hook(index, state)
    }

    fn capable(&self, index: usize, adj_index: usize, adj_state: BucketState) -> bool {
        self.core.capable(index, adj_index, adj_state)
    }

    fn propagate(&mut self, index: usize, adj_index: usize, _adj_slot: usize) -> bool {
        self.core.propagate(index, adj_index, false)
    }

    fn increasing(&self) -> bool {
        true
    }

    fn differential_propagation(&mut self, _enable: bool) {
        // 定向代价只依赖边两端, 增量重跑等价于普通传播.
    }
}

/// 内向定向路径函数: 适用于对象暗于背景的边界取向 (alpha < 0, 取其绝对值).
#[derive(Debug)]
pub struct OrientedInternPathFunction<D> {
    core: OrientedCore<D>,
}

impl<D: CostScalar> OrientedInternPathFunction<D> {
    /// 绑定映射、梯度、亮度与可选的测地约束前驱森林.
    ///
    /// 要求标签图存在, `alpha` 在 `[0, 1]` 内.
    pub fn new(
        maps: ForestMaps<D>,
        handicap: GridMap<D>,
        intensity: GridMap<D>,
        restriction: Option<GridMap<i32>>,
        alpha: f64,
    ) -> Result<Self, SegError> {
        Ok(Self {
            core: OrientedCore::new(maps, handicap, intensity, restriction, alpha)?,
        })
    }

    /// 拆出森林映射. 供约束森林更新后重建第二遍时回收.
    pub fn into_maps(self) -> ForestMaps<D> {
        self.core.maps
    }
}

impl<D: CostScalar> PathFunction for OrientedInternPathFunction<D> {
    type Scalar = D;

    fn maps(&self) -> &ForestMaps<D> {
        &self.core.maps
    }

    fn maps_mut(&mut self) -> &mut ForestMaps<D> {
        &mut self.core.maps
    }

    fn remove_hook(&mut self, index: usize, state: BucketState) -> bool {
        self.core.remove_hook(index, state)
    }

    fn capable(&self, index: usize, adj_index: usize, adj_state: BucketState) -> bool {
        self.core.capable(index, adj_index, adj_state)
    }

    fn propagate(&mut self, index: usize, adj_index: usize, _adj_slot: usize) -> bool {
        self.core.propagate(index, adj_index, true)
    }

    fn increasing(&self) -> bool {
        true
    }

    fn differential_propagation(&mut self, _enable: bool) {}
}
