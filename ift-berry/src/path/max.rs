use super::{CostScalar, ForestMaps, MapSet, PathFunction};
use crate::queue::BucketState;
use crate::GridMap;

/// Max 路径函数: 路径代价为沿途像素差异度的最大值. 分水岭变换的核心.
#[derive(Debug)]
pub struct MaxPathFunction<D> {
    maps: ForestMaps<D>,
    handicap: GridMap<D>,
    update_set: MapSet,
    next_label: Option<i32>,
    differential: bool,
}

impl<D: CostScalar> MaxPathFunction<D> {
    /// 绑定森林映射与差异度图 (通常为梯度).
    ///
    /// 两者形状不符时 panic.
    pub fn new(maps: ForestMaps<D>, handicap: GridMap<D>, sequential_label: bool) -> Self {
        assert_eq!(maps.value.shape(), handicap.shape(), "差异度图形状不符");
        let update_set = maps.update_set();
        Self {
            maps,
            handicap,
            update_set,
            next_label: sequential_label.then_some(0),
            differential: false,
        }
    }
}

impl<D: CostScalar> PathFunction for MaxPathFunction<D> {
    type Scalar = D;

    fn maps(&self) -> &ForestMaps<D> {
        &self.maps
    }

    fn maps_mut(&mut self) -> &mut ForestMaps<D> {
        &mut self.maps
    }

    fn remove_hook(&mut self, index: usize, state: BucketState) -> bool {
        if state == BucketState::Inserted {
            self.maps.value[index] = self.handicap[index];
            self.maps.init_root(index, &mut self.next_label);
        }
        true
    }

    fn capable(&self, _index: usize, _adj_index: usize, adj_state: BucketState) -> bool {
        adj_state != BucketState::Removed
    }

    fn propagate(&mut self, index: usize, adj_index: usize, _adj_slot: usize) -> bool {
        let src_value = self.maps.value[adj_index];
        let arc_weight = self.handicap[adj_index];
        let prp_value = if self.maps.value[index] < arc_weight {
            arc_weight
        } else {
            self.maps.value[index]
        };
        if self.differential {
            // 增量模式: 除了严格改善, 还要沿既有树边重涂标签不一致的子树.
            let pred = self.maps.predecessor.as_ref().unwrap();
            let label = self.maps.label.as_ref().unwrap();
            let repaint =
                pred[adj_index] == index as i32 && label[adj_index] != label[index];
            if src_value > prp_value || repaint {
                self.maps.value[adj_index] = prp_value;
                self.maps.apply_update(MapSet::Complete, index, adj_index);
                return true;
            }
            return false;
        }
        let through_tree = self
            .maps
            .predecessor
            .as_ref()
            .is_some_and(|pred| pred[adj_index] == index as i32);
        if through_tree || src_value > prp_value {
            self.maps.value[adj_index] = prp_value;
            self.maps.apply_update(self.update_set, index, adj_index);
            return true;
        }
        false
    }

    fn increasing(&self) -> bool {
        true
    }

    fn differential_propagation(&mut self, enable: bool) {
        // 增量传播需要完整的标签与前驱映射.
        self.differential =
            enable && self.maps.label.is_some() && self.maps.predecessor.is_some();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GridMap;

    fn make(handicap: Vec<i32>) -> MaxPathFunction<i32> {
        let value = GridMap::filled((1, 4), i32::MAX);
        let maps = ForestMaps::new(value, true, true);
        MaxPathFunction::new(maps, GridMap::from_row_major((1, 4), handicap), false)
    }

    #[test]
    fn test_seed_root_init() {
        let mut pf = make(vec![5, 3, 8, 1]);
        pf.maps_mut().value[2usize] = 0;
        assert!(pf.remove_hook(2, BucketState::Inserted));
        assert_eq!(pf.maps().value[2usize], 8);
        assert_eq!(pf.maps().predecessor.as_ref().unwrap()[2usize], super::super::ROOT);
    }

    #[test]
    fn test_propagate_takes_max() {
        let mut pf = make(vec![5, 3, 8, 1]);
        pf.maps_mut().value[0usize] = 4;
        // prp = max(4, handicap[1]=3) = 4 < MAX, 传播成功.
        assert!(pf.propagate(0, 1, 0));
        assert_eq!(pf.maps().value[1usize], 4);
        assert_eq!(pf.maps().predecessor.as_ref().unwrap()[1usize], 0);
        // 再次传播不再改善.
        pf.maps_mut().predecessor.as_mut().unwrap()[1usize] = 3;
        assert!(!pf.propagate(0, 1, 0));
    }

    #[test]
    fn test_capable_skips_removed() {
        let pf = make(vec![0; 4]);
        assert!(pf.capable(0, 1, BucketState::NotVisited));
        assert!(pf.capable(0, 1, BucketState::Inserted));
        assert!(!pf.capable(0, 1, BucketState::Removed));
    }
}
