use super::{CostScalar, ForestMaps, PathFunction};
use crate::adjacency::Adjacency;
use crate::queue::BucketState;
use crate::{GridMap, SegError};

/// 测地约束路径函数: 测地星凸分割的第一遍.
///
/// 只从对象种子出发, 计算无约束测地距离场与其前驱森林;
/// 该前驱森林随后作为第二遍定向路径函数的约束输入.
#[derive(Debug)]
pub struct GeodesicRestrictionPathFunction<D> {
    maps: ForestMaps<D>,
    handicap: GridMap<D>,
    intensity: GridMap<D>,
    alpha: f64,
    beta: f64,

    /// 每个邻接槽位的欧氏距离, 构造时算好.
    dists: Vec<f64>,
    next_label: Option<i32>,
    differential: bool,
}

impl<D: CostScalar> GeodesicRestrictionPathFunction<D> {
    /// 绑定映射、梯度 (`handicap`)、原图亮度与邻接关系.
    ///
    /// `alpha` 必须在 `[-1, 1]` 内, `beta` 必须在 `[0, 4]` 内,
    /// 任一形状不符时 panic.
    pub fn new(
        maps: ForestMaps<D>,
        handicap: GridMap<D>,
        intensity: GridMap<D>,
        adj: &Adjacency,
        alpha: f64,
        beta: f64,
    ) -> Result<Self, SegError> {
        assert_eq!(maps.value.shape(), handicap.shape(), "梯度图形状不符");
        assert_eq!(maps.value.shape(), intensity.shape(), "亮度图形状不符");
        if !(-1.0..=1.0).contains(&alpha) {
            return Err(SegError::InvalidAlpha(alpha));
        }
        if !(0.0..=4.0).contains(&beta) {
            return Err(SegError::InvalidBeta(beta));
        }
        let dists = (0..adj.len()).map(|slot| adj.dist(slot)).collect();
        Ok(Self {
            maps,
            handicap,
            intensity,
            alpha,
            beta,
            dists,
            next_label: None,
            differential: false,
        })
    }

    fn arc_weight(&self, index: usize, adj_index: usize, ge_zero: bool) -> f64 {
        let mut arc =
            self.handicap[index].to_weight() + self.handicap[adj_index].to_weight();
        let tmp = (self.intensity[index].to_weight()
            - self.intensity[adj_index].to_weight())
            * self.alpha;
        let fraction = if ge_zero {
            // 增量变体把零差视为顺向.
            if tmp >= 0.0 {
                self.alpha.abs()
            } else {
                -self.alpha.abs()
            }
        } else if tmp > 0.0 {
            self.alpha.abs()
        } else if tmp < 0.0 {
            -self.alpha.abs()
        } else {
            0.0
        };
        arc = (arc * (1.0 + fraction)).round();
        arc + 1.0
    }
}

impl<D: CostScalar> PathFunction for GeodesicRestrictionPathFunction<D> {
    type Scalar = D;

    fn maps(&self) -> &ForestMaps<D> {
        &self.maps
    }

    fn maps_mut(&mut self) -> &mut ForestMaps<D> {
        &mut self.maps
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

    fn propagate(&mut self, index: usize, adj_index: usize, adj_slot: usize) -> bool {
        let src_value = self.maps.value[adj_index];
        let arc = self.arc_weight(index, adj_index, self.differential);
        let distance = self.dists[adj_slot];
        let prp_value = D::from_weight(
            self.maps.value[index].to_weight() + arc.powf(self.beta) - 1.0 + distance,
        );
        if src_value > prp_value {
            self.maps.value[adj_index] = prp_value;
            let set = self.maps.update_set();
            self.maps.apply_update(set, index, adj_index);
            return true;
        }
        false
    }

    fn increasing(&self) -> bool {
        true
    }

    fn differential_propagation(&mut self, enable: bool) {
        self.differential = enable;
    }
}
