use super::tool::SegmentationTool;
use crate::adjacency::Adjacency;
use crate::consts::field::{FIELD_FORBIDDEN, FIELD_FREE, FIELD_UNSEEN};
use crate::consts::seed::{SEED_BACKGROUND, SEED_OBJECT};
use crate::consts::{MIN_ANCHORS, MIN_CONTOUR_LEN};
use crate::filter::{complement, erode_bin};
use crate::ift::ImageIft;
use crate::path::{ForestMaps, LiveWirePathFunction, PathFunction, SideAdjacency, ROOT};
use crate::queue::{BucketQueue, FastBucketQueue, RemovalOrder, RotatingBucketQueue, TieBreak};
use crate::{GridMap, Idx2d, SegError};
use either::Either;
use itertools::Itertools;
use std::collections::VecDeque;

/// 种子边界端点在工作图里的标记值 (中段为 1).
const SEED_BORDER_END: i32 = 3;

/// LiveWire 后处理状态. 全量分割时重建, 锚点拖动时局部修补.
pub(crate) struct LiveWireState {
    /// 顺时针轮廓像素序列 (唯一一圈, 不含回到起点的重复).
    pub contour: Vec<usize>,

    /// 锚点位置, 首尾闭合: `anchors[0]` 是跟踪起点,
    /// 末位是闭合锚点. 弧 `k` 连接 `anchors[k-1] → anchors[k]`.
    pub anchors: Vec<usize>,

    /// 轮廓弧段标号图: 弧 `k` 的轮廓像素值为 `k`.
    pub border: GridMap<i32>,

    /// 受限代价场: -2 禁区, -1 通行, >0 边界侧标号.
    pub field: GridMap<i32>,

    /// 连通后的种子分类图 (0 无, 1 对象, 2 背景).
    pub conn_seeds: GridMap<i32>,

    /// 边界侧标号邻接表.
    pub sides: SideAdjacency,

    /// 精化掩码: 逐弧 LiveWire 路径画进这里.
    pub refined: GridMap<i32>,

    /// 补梯度代价图.
    pub cost: GridMap<i32>,

    /// 单步代价上界, 旋转桶队列的桶数依据.
    pub max_step: usize,

    /// 每条弧最近一次搜索得到的路径 (含两端锚点).
    pub arc_paths: Vec<Vec<usize>>,
}

impl LiveWireState {
    /// 运行弧 `arc_id`: 从 `ini` 到 `end` 的受限最短路.
    ///
    /// 调用前需把该弧的旧像素从精化掩码中清除.
    /// 返回路径终点携带的侧标号, 供下一段弧接力.
    pub(crate) fn run_arc(
        &mut self,
        arc_id: i32,
        ini: usize,
        end: usize,
        side_label: i32,
    ) -> Result<i32, SegError> {
        let shape = self.refined.shape();
        let size = self.refined.size();
        // 已精化的掩码像素与禁区像素代价置零, 既有路径成为障碍.
        let mut value = GridMap::filled(shape, i32::MAX);
        for idx in 0..size {
            if self.refined[idx] != 0 || self.field[idx] == FIELD_FORBIDDEN {
                value[idx] = 0;
            }
        }
        let maps = ForestMaps {
            value,
            label: None,
            predecessor: Some(GridMap::filled(shape, ROOT)),
        };
        let mut pf = LiveWirePathFunction::new(
            maps,
            self.cost.clone(),
            self.field.clone(),
            self.conn_seeds.clone(),
            self.border.clone(),
            self.sides.clone(),
            arc_id,
        );
        pf.set_start(ini, side_label);
        let mut queue = RotatingBucketQueue::new(size, self.max_step);
        queue.insert(ini, 0.0).map_err(crate::IftError::from)?;
        let adj = Adjacency::clockwise8();
        let mut ift = ImageIft::new(&mut pf, adj, shape, &mut queue)?;
        ift.set_stop_element(end);
        ift.run()?;

        // 自终点回溯前驱链, 画进精化掩码.
        let pred = pf.maps().predecessor.as_ref().unwrap();
        let mut path = vec![end];
        let mut cur = end;
        while cur != ini {
            let p = pred[cur];
            if p == ROOT {
                // 搜索被约束困死, 终点未接通. 保留已有掩码不再回溯.
                log::warn!("LiveWire 弧 {arc_id} 无法接通 {ini} → {end}");
                break;
            }
            cur = p as usize;
            path.push(cur);
        }
        path.reverse();
        for &p in &path {
            self.refined[p] = 1;
        }
        let arc_slot = arc_id as usize - 1;
        if self.arc_paths.len() <= arc_slot {
            self.arc_paths.resize(arc_slot + 1, Vec::new());
        }
        self.arc_paths[arc_slot] = path;
        Ok(pf.side_of(end))
    }

    /// 把弧 `arc_id` 的旧轮廓像素从精化掩码中清除.
    pub(crate) fn clear_arc(&mut self, arc_id: i32) {
        for idx in 0..self.border.size() {
            if self.border[idx] == arc_id {
                self.refined[idx] = 0;
            }
        }
    }
}

/// LiveWire 后处理与锚点编辑.
impl SegmentationTool {
    /// 掩码边界跟踪、锚点放置与逐弧受限搜索.
    ///
    /// 只对整数数值表示可用. 成功时返回实际放置的锚点 (弧段) 个数,
    /// 介于 3 与请求值之间; 轮廓不足 10 像素时返回可恢复的
    /// [`SegError::ContourTooShort`].
    pub fn live_wire_post_processing(&mut self, requested: usize) -> Result<usize, SegError> {
        let Some(Either::Left(grad)) = self.grad.as_ref() else {
            log::warn!("LiveWire 后处理只支持整数灰度图");
            return Ok(0);
        };
        let grad = grad.clone();
        let shape = self.label.shape();

        // (a) 边界像素与最高梯度起点.
        let border_adj = Adjacency::circular(1.1);
        let mut is_border = GridMap::filled(shape, 0i32);
        let mut contour_size = 0usize;
        let mut start = 0usize;
        let mut best_energy = i32::MIN;
        for pos in self.label.pos_iter() {
            if self.label[pos] != 0
                && border_adj
                    .neighbors_pos(shape, pos)
                    .any(|n| self.label[n] == 0)
            {
                is_border[pos] = 1;
                contour_size += 1;
                if best_energy < grad[pos] {
                    best_energy = grad[pos];
                    start = self.label.flat_of(pos);
                }
            }
        }
        if contour_size < MIN_CONTOUR_LEN {
            return Err(SegError::ContourTooShort(contour_size));
        }

        // (a) 顺时针 Moore 跟踪, 回退规则 (dir + 5) mod 8.
        let contour = trace_contour(&is_border, shape, start, contour_size)?;
        let ring = contour.len();

        // (b) 锚点个数收紧到 [3, 轮廓长度/10].
        let mut anchors = requested;
        if anchors > ring / 10 {
            anchors = (ring / 10).max(MIN_ANCHORS);
        }
        let spacing = ring as f64 / anchors as f64;
        let radius = (spacing / 4.0).floor() as usize;
        let mut positions = vec![start];
        let mut brd_idx = spacing;
        while brd_idx < ring as f64 - 2.5 {
            let hi = (brd_idx.round() as usize).min(ring - 1);
            let lo = hi.saturating_sub(radius);
            // 在窗口内吸附到梯度极大处.
            let snapped = (lo..=hi)
                .map(|i| contour[i])
                .max_by_key(|&p| grad[p])
                .unwrap();
            positions.push(snapped);
            brd_idx += spacing;
        }
        positions.push(contour[ring - 1]);
        if positions.len() < MIN_ANCHORS + 1 {
            return Err(SegError::ContourTooShort(ring));
        }
        let anchors = positions.len() - 1;

        // (c) 弧段标号: 弧 k 覆盖 anchors[k-1] 到 anchors[k].
        let mut border = GridMap::filled(shape, 0i32);
        let mut arc = 0usize;
        for &pxl in contour.iter() {
            border[pxl] = arc as i32 + 1;
            if arc + 1 < positions.len() && pxl == positions[arc + 1] {
                arc += 1;
            }
        }

        // (d) 种子连通与受限代价场.
        let conn_seeds = self.connect_seed_components();
        let (field, sides) = build_seed_field(&conn_seeds);

        // (e) 逐弧受限搜索.
        let cost = complement(&grad);
        let max_step = cost.iter().copied().max().unwrap_or(0).max(1) as usize;
        let mut state = LiveWireState {
            contour,
            anchors: positions,
            border,
            field,
            conn_seeds,
            sides,
            refined: self.mask.clone(),
            cost,
            max_step,
            arc_paths: Vec::new(),
        };
        let mut side_label = -1;
        let pairs: Vec<(usize, usize)> = state.anchors.iter().copied().tuple_windows().collect();
        for (k, (ini, end)) in pairs.into_iter().enumerate() {
            let arc_id = k as i32 + 1;
            state.clear_arc(arc_id);
            side_label = state.run_arc(arc_id, ini, end, side_label)?;
        }
        if self.dump_maps {
            crate::dump::dump_map(&state.field, "ift_berry_seed_field");
            crate::dump::dump_map(&state.refined, "ift_berry_refined");
        }
        self.livewire = Some(state);
        self.mark_all_dirty();
        Ok(anchors)
    }

    /// 拖动锚点 `idx` 到 `new_pos` (平铺索引),
    /// 只重算与其相邻的两条弧.
    ///
    /// 尚无 LiveWire 状态或 `idx` 越界是编程错误, 直接 panic.
    pub fn move_anchor(&mut self, idx: usize, new_pos: usize) -> Result<(), SegError> {
        let mut state = self.livewire.take().expect("尚未运行 LiveWire 后处理");
        let arcs = state.anchors.len() - 1;
        assert!(idx < arcs, "锚点编号越界: {idx}");

        // 只清除并重算与锚点相邻的两条弧.
        let prev_arc = if idx == 0 { arcs } else { idx };
        let next_arc = idx + 1;
        state.clear_arc(prev_arc as i32);
        state.clear_arc(next_arc as i32);

        state.anchors[idx] = new_pos;
        if idx == 0 {
            // 闭合锚点跟随起点移动.
            state.anchors[arcs] = new_pos.saturating_sub(1);
            state.run_arc(
                arcs as i32,
                state.anchors[arcs - 1],
                state.anchors[arcs],
                -1,
            )?;
        } else {
            state.run_arc(idx as i32, state.anchors[idx - 1], state.anchors[idx], -1)?;
        }
        state.run_arc(
            next_arc as i32,
            state.anchors[idx],
            state.anchors[idx + 1],
            -1,
        )?;

        self.mask = state.refined.clone();
        self.livewire = Some(state);
        self.mark_all_dirty();
        Ok(())
    }

    /// 精化掩码 (逐弧 LiveWire 路径叠加的结果).
    pub fn get_refined_mask(&self) -> Option<&GridMap<i32>> {
        self.livewire.as_ref().map(|lw| &lw.refined)
    }

    /// 同类种子组件连通: 用分割代价场做区域生长,
    /// 把同类但不连通的种子组件以最小代价前驱路径连接起来.
    fn connect_seed_components(&self) -> GridMap<i32> {
        let shape = self.seeds.shape();
        let size = self.seeds.size();
        let adj = Adjacency::circular(1.7);

        // 组件标号: 对象 1, 2, ...; 背景 -1, -2, ...
        let mut comp = GridMap::filled(shape, 0i32);
        let mut next_obj = 1;
        let mut next_bkg = -1;
        for src in 0..size {
            if self.seeds[src] == 0 || comp[src] != 0 {
                continue;
            }
            let id = if self.seeds[src] == SEED_OBJECT {
                let id = next_obj;
                next_obj += 1;
                id
            } else {
                let id = next_bkg;
                next_bkg -= 1;
                id
            };
            let mut queue = VecDeque::from([src]);
            comp[src] = id;
            while let Some(cur) = queue.pop_front() {
                for n in adj.neighbors(shape, cur) {
                    if comp[n] == 0 && self.seeds[n] == self.seeds[cur] {
                        comp[n] = id;
                        queue.push_back(n);
                    }
                }
            }
        }

        // 以分割代价为优先级做区域生长, 记录同类组件的首次接触.
        let cost = match self.runtime.as_ref() {
            Some(Either::Left(engine)) => engine.value_map().clone(),
            _ => GridMap::filled(shape, 0),
        };
        let max_cost = cost
            .iter()
            .copied()
            .filter(|&c| c < i32::MAX)
            .max()
            .unwrap_or(0)
            .max(1);
        let mut queue = FastBucketQueue::new(
            size,
            0.0,
            max_cost as usize + 1,
            RemovalOrder::Increasing,
            TieBreak::Fifo,
        );
        let mut grown = comp.clone();
        let mut pred = GridMap::filled(shape, ROOT);
        for px in 0..size {
            if self.seeds[px] != 0 {
                // 满员的快速队列不会失败, 这里的错误只可能是编程错误.
                queue.insert(px, 0.0).expect("种子重复入队");
            }
        }
        let mut contacts: Vec<(i32, i32, usize, usize)> = Vec::new();
        let mut seen_pairs = std::collections::HashSet::new();
        while let Ok(src) = queue.remove() {
            queue.finished(src);
            for n in adj.neighbors(shape, src) {
                if grown[n] == 0 && self.label[src] == self.label[n] {
                    grown[n] = grown[src];
                    pred[n] = src as i32;
                    let w = cost[n].clamp(0, max_cost) as f64;
                    queue.insert(n, w).expect("区域生长重复入队");
                } else if grown[src] * grown[n] > 0 && grown[src] != grown[n] {
                    // 同类不同组件首次相遇.
                    let key = (grown[src].min(grown[n]), grown[src].max(grown[n]));
                    if seen_pairs.insert(key) {
                        contacts.push((grown[src], grown[n], src, n));
                    }
                }
            }
        }

        // 按相遇顺序合并组件, 沿前驱链画出连接曲线.
        let mut dsu = Dsu::new((next_obj - next_bkg) as usize);
        let key_of = |id: i32| {
            if id > 0 {
                id as usize
            } else {
                (next_obj - 1 - id) as usize
            }
        };
        let mut conn = comp;
        for (a, b, pa, pb) in contacts {
            if dsu.union(key_of(a), key_of(b)) {
                let paint = if a > 0 { 1 } else { -1 };
                for start in [pa, pb] {
                    let mut cur = start;
                    while pred[cur] != ROOT {
                        conn[cur] = paint;
                        cur = pred[cur] as usize;
                    }
                }
            }
        }

        // 归一化: 正值为对象, 负值为背景.
        conn.map_pixels(|p| match p.cmp(&0) {
            std::cmp::Ordering::Greater => SEED_OBJECT,
            std::cmp::Ordering::Less => SEED_BACKGROUND,
            std::cmp::Ordering::Equal => 0,
        })
    }
}

/// Moore 顺时针轮廓跟踪.
///
/// 从 `start` 出发沿 8-邻域边界走一圈, 回到出发对 (起点, 次点)
/// 时停止. 步数超过边界像素数三倍视为轮廓破碎.
fn trace_contour(
    is_border: &GridMap<i32>,
    shape: Idx2d,
    start: usize,
    contour_size: usize,
) -> Result<Vec<usize>, SegError> {
    let trc = Adjacency::clockwise8();
    let limit = contour_size * 3;
    let min_loop = 22.min(contour_size + 2);
    let mut walk = vec![start];
    let mut dir = 0usize;
    loop {
        if walk.len() >= limit {
            return Err(SegError::ContourBroken);
        }
        dir = (dir + 5) % 8;
        let cur = *walk.last().unwrap();
        let mut probed = 0;
        loop {
            if probed == 8 {
                // 孤立像素, 没有可走的边界邻居.
                return Err(SegError::ContourBroken);
            }
            if let Some(n) = trc.neighbor(shape, cur, dir) {
                if is_border[n] == 1 {
                    walk.push(n);
                    break;
                }
            }
            dir = (dir + 1) % 8;
            probed += 1;
        }
        let len = walk.len();
        if len >= min_loop && walk[len - 1] == walk[1] && walk[len - 2] == walk[0] {
            // 去掉回到起点的两个重复像素.
            walk.truncate(len - 2);
            return Ok(walk);
        }
    }
}

/// 由连通种子图构建受限代价场与边界侧邻接表.
///
/// 对象种子边界像素可通行 (-1), 其余种子区域禁区 (-2);
/// 紧贴对象种子边界的自由像素获得边界侧标号 (>0),
/// 侧与侧只在边界端点处相邻.
fn build_seed_field(conn_seeds: &GridMap<i32>) -> (GridMap<i32>, SideAdjacency) {
    let shape = conn_seeds.shape();
    let size = conn_seeds.size();
    let trc = Adjacency::clockwise8();

    // 对象种子区域的边界带.
    let obj_mask = conn_seeds.map_pixels(|p| (p == SEED_OBJECT) as i32);
    let eroded = erode_bin(&obj_mask, &Adjacency::circular(1.5));
    let mut seed_bdr = GridMap::filled(shape, 0i32);
    for idx in 0..size {
        seed_bdr[idx] = obj_mask[idx] - eroded[idx];
    }

    // 端点检测: 8-邻域里同侧边界至多连成一段的像素是端点.
    for idx in 0..size {
        if seed_bdr[idx] != 1 {
            continue;
        }
        let pos = conn_seeds.pos_of(idx);
        let ring: Vec<bool> = (0..8)
            .map(|slot| {
                trc.neighbor_pos(shape, pos, slot)
                    .map(|n| seed_bdr[n] >= 1)
                    .unwrap_or(false)
            })
            .collect();
        let mut runs = 0;
        for i in 0..8 {
            if ring[i] && !ring[(i + 7) % 8] {
                runs += 1;
            }
        }
        if runs <= 1 {
            seed_bdr[idx] = SEED_BORDER_END;
        }
    }

    let mut field = GridMap::filled(shape, FIELD_UNSEEN);
    let mut sides = SideAdjacency::new();
    let mut side_label = 1;
    for src in 0..size {
        if field[src] != FIELD_UNSEEN {
            continue;
        }
        if seed_bdr[src] >= 1 {
            // 对象种子边界自身可通行.
            field[src] = FIELD_FREE;
            continue;
        }
        if conn_seeds[src] != 0 {
            field[src] = FIELD_FORBIDDEN;
            continue;
        }
        // 自由像素: 沿对象种子边界的一侧扩散, 端点截断.
        field[src] = FIELD_FREE;
        let mut queue = VecDeque::from([src]);
        while let Some(cur) = queue.pop_front() {
            let pos = conn_seeds.pos_of(cur);
            let mut touches_middle = false;
            for slot in 0..8 {
                let Some(n) = trc.neighbor_pos(shape, pos, slot) else {
                    continue;
                };
                if seed_bdr[n] >= 1 {
                    field[cur] = side_label;
                    if seed_bdr[n] == SEED_BORDER_END {
                        touches_middle = false;
                        break;
                    }
                    touches_middle = true;
                }
            }
            if touches_middle {
                // 只沿四个正向继续贴边扩散.
                for slot in [1usize, 3, 5, 7] {
                    if let Some(n) = trc.neighbor(shape, cur, slot) {
                        if field[n] == FIELD_UNSEEN && conn_seeds[n] == 0 {
                            field[n] = FIELD_FREE;
                            queue.push_back(n);
                        }
                    }
                }
            }
        }
        if field[src] > 0 {
            side_label += 1;
        }
    }

    // 端点处相遇的侧标号互相邻接.
    for idx in 0..size {
        if seed_bdr[idx] != SEED_BORDER_END {
            continue;
        }
        let pos = conn_seeds.pos_of(idx);
        let met: Vec<i32> = trc
            .neighbors_pos(shape, pos)
            .map(|n| field[n])
            .filter(|&f| f > 0)
            .collect();
        for (i, &a) in met.iter().enumerate() {
            for &b in met.iter().skip(i + 1) {
                sides.link(a, b);
            }
        }
    }

    // 构建结束后残余的未访问像素视为可通行.
    for idx in 0..size {
        if field[idx] == FIELD_UNSEEN {
            field[idx] = FIELD_FREE;
        }
    }
    (field, sides)
}

/// 并查集, 组件合并用.
struct Dsu {
    parent: Vec<usize>,
}

impl Dsu {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            let root = self.find(self.parent[x]);
            self.parent[x] = root;
        }
        self.parent[x]
    }

    /// 合并两个集合. 原本就在同一集合时返回 `false`.
    fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        self.parent[ra] = rb;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::field::FIELD_FORBIDDEN;
    use crate::phantom;
    use crate::seg::{PathFunctionKind, SegmentationTool};
    use either::Either;

    /// 中央圆盘 + 四角背景种子, 足够大以产生可跟踪的轮廓.
    fn segmented_tool() -> SegmentationTool {
        let shape = (15, 15);
        let center = (7, 7);
        let img = phantom::two_level_disk(shape, center, 4.5, 100, 0);
        let mut t = SegmentationTool::new(Either::Left(img));
        t.seeds[center] = crate::consts::seed::SEED_OBJECT;
        for corner in [(0, 0), (0, 14), (14, 0), (14, 14)] {
            t.seeds[corner] = crate::consts::seed::SEED_BACKGROUND;
        }
        t.connect(PathFunctionKind::Watershed, 0.0, 0.5, 0)
            .unwrap();
        t
    }

    #[test]
    fn test_contour_is_closed_ring() {
        let t = segmented_tool();
        let lw = t.livewire.as_ref().expect("后处理未运行");
        let ring = &lw.contour;
        assert!(ring.len() >= MIN_CONTOUR_LEN);
        // 相邻轮廓像素 8-相邻, 首尾闭合.
        let shape = t.get_mask().shape();
        let neighbouring = |a: usize, b: usize| {
            let (ah, aw) = (a / shape.1, a % shape.1);
            let (bh, bw) = (b / shape.1, b % shape.1);
            ah.abs_diff(bh) <= 1 && aw.abs_diff(bw) <= 1 && a != b
        };
        for pair in ring.windows(2) {
            assert!(neighbouring(pair[0], pair[1]));
        }
        assert!(neighbouring(ring[0], ring[ring.len() - 1]));
    }

    #[test]
    fn test_anchor_count_clamped() {
        let t = segmented_tool();
        let lw = t.livewire.as_ref().unwrap();
        let arcs = lw.anchors.len() - 1;
        assert!(arcs >= MIN_ANCHORS);
        assert!(arcs <= lw.contour.len() / 10 + MIN_ANCHORS);
    }

    #[test]
    fn test_arcs_cover_contour_once() {
        let t = segmented_tool();
        let lw = t.livewire.as_ref().unwrap();
        let arcs = (lw.anchors.len() - 1) as i32;
        // 弧段标号沿轮廓单调不减, 从 1 到弧数, 每个像素恰好标注一次.
        let labels: Vec<i32> = lw.contour.iter().map(|&p| lw.border[p]).collect();
        assert_eq!(labels[0], 1);
        assert_eq!(*labels.last().unwrap(), arcs);
        for pair in labels.windows(2) {
            assert!(pair[0] <= pair[1] && pair[1] <= pair[0] + 1);
        }
    }

    #[test]
    fn test_livewire_paths_avoid_forbidden() {
        let t = segmented_tool();
        let lw = t.livewire.as_ref().unwrap();
        assert!(!lw.arc_paths.is_empty());
        for path in &lw.arc_paths {
            assert!(!path.is_empty());
            for &p in path {
                assert_ne!(lw.field[p], FIELD_FORBIDDEN, "路径进入禁区: {p}");
            }
        }
    }

    #[test]
    fn test_livewire_path_cost_monotone() {
        let t = segmented_tool();
        let lw = t.livewire.as_ref().unwrap();
        for path in &lw.arc_paths {
            let mut acc = 0i64;
            let mut last = 0i64;
            for pair in path.windows(2) {
                acc += ((lw.cost[pair[0]] + lw.cost[pair[1]]) / 2) as i64;
                assert!(acc >= last);
                last = acc;
            }
        }
    }

    #[test]
    fn test_move_anchor_recomputes_two_arcs() {
        let mut t = segmented_tool();
        let (idx, old_pos, shifted) = {
            let lw = t.livewire.as_ref().unwrap();
            let idx = 1usize;
            let old_pos = lw.anchors[idx];
            // 挪到邻近的自由像素 (不在任何弧的轮廓上, 也不是禁区),
            // 保证新位置仍可接通.
            let shape = lw.border.shape();
            let pos = lw.border.pos_of(old_pos);
            let shifted = Adjacency::clockwise8()
                .neighbors_pos(shape, pos)
                .map(|n| lw.border.flat_of(n))
                .find(|&n| lw.border[n] == 0 && lw.field[n] != FIELD_FORBIDDEN)
                .expect("锚点周围没有自由像素");
            (idx, old_pos, shifted)
        };
        let before = t.livewire.as_ref().unwrap().arc_paths.clone();
        t.move_anchor(idx, shifted).unwrap();
        let lw = t.livewire.as_ref().unwrap();
        assert_eq!(lw.anchors[idx], shifted);
        assert_ne!(lw.anchors[idx], old_pos);
        // 不相邻的弧未被重算.
        for k in 0..before.len() {
            if k != idx - 1 && k != idx {
                assert_eq!(before[k], lw.arc_paths[k], "弧 {} 不应被重算", k + 1);
            }
        }
        // 掩码切换为精化结果.
        assert_eq!(t.get_mask(), &lw.refined);
    }

    #[test]
    fn test_seed_field_marks_seeds_forbidden_or_border() {
        let t = segmented_tool();
        let lw = t.livewire.as_ref().unwrap();
        // 背景种子永远是禁区.
        for corner in [(0usize, 0usize), (0, 14), (14, 0), (14, 14)] {
            assert_eq!(lw.field[corner], FIELD_FORBIDDEN);
        }
        // 对象种子是边界像素 (单像素组件) 时可通行.
        assert_ne!(lw.field[(7, 7)], FIELD_FORBIDDEN);
    }

    #[test]
    fn test_short_contour_rejected() {
        let shape = (8, 8);
        let img = phantom::two_level_disk(shape, (4, 4), 1.0, 100, 0);
        let mut t = SegmentationTool::new(Either::Left(img));
        t.seeds[(4, 4)] = crate::consts::seed::SEED_OBJECT;
        t.seeds[(0, 0)] = crate::consts::seed::SEED_BACKGROUND;
        t.seeds[(7, 7)] = crate::consts::seed::SEED_BACKGROUND;
        // 半径 1 的圆盘轮廓不足 10 像素: connect 吞掉该错误并返回 0 锚点.
        let used = t.connect(PathFunctionKind::Watershed, 0.0, 0.5, 0).unwrap();
        assert_eq!(used, 0);
        assert!(t.livewire.is_none());
    }
}
