use super::{CostScalar, ForestMaps, MapSet, PathFunction};
use crate::queue::BucketState;
use crate::GridMap;

/// Sum 路径函数: 路径代价为沿途边权的累加. 模糊连接分割使用.
#[derive(Debug)]
pub struct SumPathFunction<D> {
    maps: ForestMaps<D>,
    handicap: GridMap<D>,
    update_set: MapSet,
    next_label: Option<i32>,
    differential: bool,
}

impl<D: CostScalar> SumPathFunction<D> {
    /// 绑定森林映射与边权图 (通常为梯度).
    ///
    /// 两者形状不符时 panic.
    pub fn new(maps: ForestMaps<D>, handicap: GridMap<D>, sequential_label: bool) -> Self {
        assert_eq!(maps.value.shape(), handicap.shape(), "边权图形状不符");
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

impl<D: CostScalar + std::ops::Add<Output = D>> PathFunction for SumPathFunction<D> {
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

    fn capable(&self, index: usize, adj_index: usize, _adj_state: BucketState) -> bool {
        self.maps.value[index] < self.maps.value[adj_index]
    }

    fn propagate(&mut self, index: usize, adj_index: usize, _adj_slot: usize) -> bool {
        let src_value = self.maps.value[adj_index];
        // 累加在 f64 域进行, 避免整数代价图在饱和值附近回绕.
        let prp_value = D::from_weight(
            self.maps.value[index].to_weight() + self.handicap[adj_index].to_weight(),
        );
        if self.differential {
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
        if src_value > prp_value {
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
        self.differential =
            enable && self.maps.label.is_some() && self.maps.predecessor.is_some();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GridMap;

    #[test]
    fn test_propagate_accumulates() {
        let value = GridMap::filled((1, 3), i32::MAX);
        let maps = ForestMaps::new(value, false, false);
        let mut pf = SumPathFunction::new(
            maps,
            GridMap::from_row_major((1, 3), vec![2, 3, 4]),
            false,
        );
        pf.maps_mut().value[0usize] = 2;
        assert!(pf.propagate(0, 1, 0));
        assert_eq!(pf.maps().value[1usize], 5);
        assert!(pf.propagate(1, 2, 0));
        assert_eq!(pf.maps().value[2usize], 9);
        // 不改善则拒绝.
        assert!(!pf.propagate(0, 1, 0));
    }

    #[test]
    fn test_capable_requires_cheaper_source() {
        let value = GridMap::from_row_major((1, 2), vec![3, 7]);
        let maps = ForestMaps::new(value, false, false);
        let pf = SumPathFunction::new(
            maps,
            GridMap::filled((1, 2), 1),
            false,
        );
        assert!(pf.capable(0, 1, BucketState::NotVisited));
        assert!(!pf.capable(1, 0, BucketState::NotVisited));
    }

    #[test]
    fn test_saturating_near_max() {
        let value = GridMap::from_row_major((1, 2), vec![i32::MAX - 1, i32::MAX]);
        let maps = ForestMaps::new(value, false, false);
        let mut pf = SumPathFunction::new(
            maps,
            GridMap::filled((1, 2), 10),
            false,
        );
        // MAX-1 + 10 饱和到 MAX, 不回绕也不改善.
        assert!(!pf.propagate(0, 1, 0));
        assert_eq!(pf.maps().value[1usize], i32::MAX);
    }
}
