use super::{ForestMaps, PathFunction};
use crate::adjacency::Adjacency;
use crate::consts::field::{is_forbidden, is_side};
use crate::queue::BucketState;
use crate::GridMap;
use std::collections::HashSet;

/// 边界侧标号之间的邻接表.
///
/// 只有在种子边界的端点处相遇的两个侧标号才互相邻接;
/// LiveWire 路径允许跨越互相邻接的侧, 禁止跨越无关的侧.
#[derive(Debug, Default, Clone)]
pub struct SideAdjacency {
    pairs: HashSet<(i32, i32)>,
}

impl SideAdjacency {
    /// 空邻接表.
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录 `a` 与 `b` 相遇 (对称).
    pub fn link(&mut self, a: i32, b: i32) {
        if a != b && a > 0 && b > 0 {
            self.pairs.insert((a, b));
            self.pairs.insert((b, a));
        }
    }

    /// `a` 与 `b` 是否邻接.
    #[inline]
    pub fn linked(&self, a: i32, b: i32) -> bool {
        self.pairs.contains(&(a, b))
    }

    /// 已记录的有向对数.
    #[inline]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// 是否没有任何记录.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// LiveWire 受限弧搜索的路径函数.
///
/// 边代价为两端像素补梯度的平均值; 准入规则禁止进入禁区像素、
/// 跨越两个禁区像素夹着的对角、触碰其他弧段的轮廓标号,
/// 以及在不相邻的种子边界侧之间穿越.
/// 邻接关系必须是 [`Adjacency::clockwise8`] (对角槽位判定依赖其布局).
#[derive(Debug)]
pub struct LiveWirePathFunction {
    maps: ForestMaps<i32>,

    /// 补梯度代价图.
    cost: GridMap<i32>,

    /// 受限代价场: -2 禁区, -1 通行, >0 边界侧标号.
    field: GridMap<i32>,

    /// 连通后的种子分类图 (0 无, 1 对象, 2 背景).
    seeds: GridMap<i32>,

    /// 轮廓弧段标号图.
    arcs: GridMap<i32>,

    /// 沿路径携带的边界侧标号.
    side: GridMap<i32>,

    /// 本次搜索的弧段号.
    arc_id: i32,
    sides: SideAdjacency,
}

impl LiveWirePathFunction {
    /// 绑定本次弧搜索的全部输入.
    ///
    /// `maps` 需要值图与前驱图; 各图形状不符时 panic.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        maps: ForestMaps<i32>,
        cost: GridMap<i32>,
        field: GridMap<i32>,
        seeds: GridMap<i32>,
        arcs: GridMap<i32>,
        sides: SideAdjacency,
        arc_id: i32,
    ) -> Self {
        let shape = maps.value.shape();
        assert_eq!(shape, cost.shape(), "代价图形状不符");
        assert_eq!(shape, field.shape(), "代价场形状不符");
        assert_eq!(shape, seeds.shape(), "种子图形状不符");
        assert_eq!(shape, arcs.shape(), "弧段图形状不符");
        assert!(maps.predecessor.is_some(), "LiveWire 需要前驱图");
        let side = GridMap::filled(shape, 0);
        Self {
            maps,
            cost,
            field,
            seeds,
            arcs,
            side,
            arc_id,
            sides,
        }
    }

    /// 设置弧的起点: 代价清零并携带入口侧标号.
    pub fn set_start(&mut self, ini: usize, side_label: i32) {
        self.maps.value[ini] = 0;
        self.maps.predecessor.as_mut().unwrap()[ini] = super::ROOT;
        self.side[ini] = side_label;
    }

    /// 读取某像素当前携带的侧标号. 供下一段弧接力.
    #[inline]
    pub fn side_of(&self, index: usize) -> i32 {
        self.side[index]
    }

    /// 检查 `index → adj_index` 这条边是否满足全部准入规则.
    fn admissible(&self, index: usize, adj_index: usize, adj_slot: usize) -> bool {
        // 其他弧段已定型的轮廓不可触碰.
        let arc = self.arcs[adj_index];
        if arc != 0 && arc != self.arc_id {
            return false;
        }
        // 禁区像素.
        if is_forbidden(self.field[adj_index]) {
            return false;
        }
        // 对角穿越: 两个正交角像素都是禁区时禁止.
        if adj_slot % 2 == 0 {
            let (dh, dw) = Adjacency::clockwise8().offset(adj_slot);
            let (h_adj, w_adj) = self.field.pos_of(adj_index);
            let corner_a = (h_adj.wrapping_add_signed(-dh), w_adj);
            let corner_b = (h_adj, w_adj.wrapping_add_signed(-dw));
            if is_forbidden(self.field[corner_a]) && is_forbidden(self.field[corner_b]) {
                return false;
            }
        }
        // 种子边界侧规则: 只允许停留在同侧或跨入相邻的侧.
        let target_side = self.field[adj_index];
        if is_side(target_side) {
            let cur = self.side[index];
            if cur > 0 && target_side != cur && !self.sides.linked(cur, target_side) {
                return false;
            }
        }
        true
    }
}

impl PathFunction for LiveWirePathFunction {
    type Scalar = i32;

    fn maps(&self) -> &ForestMaps<i32> {
        &self.maps
    }

    fn maps_mut(&mut self) -> &mut ForestMaps<i32> {
        &mut self.maps
    }

    fn remove_hook(&mut self, _index: usize, _state: BucketState) -> bool {
        true
    }

    fn capable(&self, index: usize, adj_index: usize, adj_state: BucketState) -> bool {
        adj_state != BucketState::Removed
            && self.maps.value[index] < self.maps.value[adj_index]
    }

    fn propagate(&mut self, index: usize, adj_index: usize, adj_slot: usize) -> bool {
        if !self.admissible(index, adj_index, adj_slot) {
            return false;
        }
        let previous = self.maps.value[adj_index];
        let step = (self.cost[index] + self.cost[adj_index]) / 2;
        let prp_value = self.maps.value[index].saturating_add(step);
        if previous > prp_value {
            self.maps.value[adj_index] = prp_value;
            self.maps.predecessor.as_mut().unwrap()[adj_index] = index as i32;
            self.side[adj_index] = if self.seeds[adj_index] == 0 {
                self.field[adj_index]
            } else {
                self.side[index]
            };
            return true;
        }
        false
    }

    fn increasing(&self) -> bool {
        true
    }

    fn differential_propagation(&mut self, _enable: bool) {
        // 逐弧搜索每次都从干净的值图出发, 无增量模式.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::field::{FIELD_FORBIDDEN, FIELD_FREE};
    use crate::GridMap;

    fn make(field: GridMap<i32>) -> LiveWirePathFunction {
        let shape = field.shape();
        let maps = ForestMaps::new(GridMap::filled(shape, i32::MAX), false, true);
        LiveWirePathFunction::new(
            maps,
            GridMap::filled(shape, 4),
            field,
            GridMap::filled(shape, 0),
            GridMap::filled(shape, 0),
            SideAdjacency::new(),
            1,
        )
    }

    #[test]
    fn test_forbidden_pixel_inadmissible() {
        let mut field = GridMap::filled((3, 3), FIELD_FREE);
        field[(1, 1)] = FIELD_FORBIDDEN;
        let mut pf = make(field);
        pf.set_start(0, -1);
        // 槽位 1 是 E: (0,0) → (0,1) 合法; (0,1) → (1,1) 禁区.
        assert!(pf.propagate(0, 1, 1));
        assert!(!pf.propagate(1, 4, 3));
    }

    #[test]
    fn test_diagonal_between_forbidden_corners() {
        let mut field = GridMap::filled((3, 3), FIELD_FREE);
        field[(0, 1)] = FIELD_FORBIDDEN;
        field[(1, 0)] = FIELD_FORBIDDEN;
        let mut pf = make(field);
        pf.set_start(0, -1);
        // SE 对角 (槽位 2) 从 (0,0) 到 (1,1): 两个角像素均为禁区.
        assert!(!pf.propagate(0, 4, 2));
    }

    #[test]
    fn test_side_crossing_rules() {
        let mut field = GridMap::filled((1, 4), FIELD_FREE);
        field[(0, 1)] = 1;
        field[(0, 2)] = 2;
        let mut pf = make(field.clone());
        pf.set_start(0, 0);
        assert!(pf.propagate(0, 1, 1));
        assert_eq!(pf.side_of(1), 1);
        // 从侧 1 跨入无关的侧 2: 禁止.
        assert!(!pf.propagate(1, 2, 1));

        // 相邻的侧允许跨越.
        let mut sides = SideAdjacency::new();
        sides.link(1, 2);
        let shape = field.shape();
        let maps = ForestMaps::new(GridMap::filled(shape, i32::MAX), false, true);
        let mut pf = LiveWirePathFunction::new(
            maps,
            GridMap::filled(shape, 4),
            field,
            GridMap::filled(shape, 0),
            GridMap::filled(shape, 0),
            sides,
            1,
        );
        pf.set_start(0, 0);
        assert!(pf.propagate(0, 1, 1));
        assert!(pf.propagate(1, 2, 1));
    }

    #[test]
    fn test_cost_accumulates_average() {
        let field = GridMap::filled((1, 3), FIELD_FREE);
        let mut pf = make(field);
        pf.set_start(0, -1);
        assert!(pf.propagate(0, 1, 1));
        // (4 + 4) / 2 = 4.
        assert_eq!(pf.maps().value[1usize], 4);
        assert!(pf.propagate(1, 2, 1));
        assert_eq!(pf.maps().value[2usize], 8);
    }

    #[test]
    fn test_other_arc_contour_blocked() {
        let field = GridMap::filled((1, 3), FIELD_FREE);
        let shape = field.shape();
        let mut arcs = GridMap::filled(shape, 0);
        arcs[(0, 1)] = 2;
        let maps = ForestMaps::new(GridMap::filled(shape, i32::MAX), false, true);
        let mut pf = LiveWirePathFunction::new(
            maps,
            GridMap::filled(shape, 4),
            field,
            GridMap::filled(shape, 0),
            arcs,
            SideAdjacency::new(),
            1,
        );
        pf.set_start(0, -1);
        assert!(!pf.propagate(0, 1, 1));
    }
}
