use super::tool::SegmentationTool;
use crate::adjacency::Adjacency;
use crate::consts::seed::{SEED_BACKGROUND, SEED_OBJECT, SEED_STROKE};
use crate::{Idx2d, SegError};
use std::time::{Duration, Instant};

/// 笔画类型.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DrawType {
    /// 对象种子 (左键).
    Object,

    /// 背景种子 (右键).
    Background,

    /// 锚点拖动模式.
    MoveAnchor,
}

impl DrawType {
    /// 从整数编码解析. 未知编码是编程错误.
    pub fn from_code(code: i32) -> Result<Self, SegError> {
        match code {
            1 => Ok(Self::Object),
            2 => Ok(Self::Background),
            3 => Ok(Self::MoveAnchor),
            other => Err(SegError::InvalidDrawType(other)),
        }
    }

    /// 笔画落到种子图里的像素值.
    pub(crate) fn seed_value(self) -> i32 {
        match self {
            Self::Object => SEED_OBJECT,
            Self::Background => SEED_BACKGROUND,
            Self::MoveAnchor => 0,
        }
    }
}

/// 鼠标按键.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StrokeButton {
    /// 左键: 对象笔画.
    Left,

    /// 右键: 背景笔画.
    Right,
}

/// 重绘节流: 把重算/重绘频率压到约每 30 毫秒一次,
/// 长笔画期间保持界面可响应.
#[derive(Debug)]
pub struct RedrawThrottle {
    last: Instant,
    interval: Duration,
}

impl Default for RedrawThrottle {
    fn default() -> Self {
        Self {
            last: Instant::now(),
            interval: Duration::from_millis(30),
        }
    }
}

impl RedrawThrottle {
    /// 是否到了可以重绘的时刻. 返回 `true` 时顺带重置计时.
    pub fn ready(&mut self) -> bool {
        if self.last.elapsed() >= self.interval {
            self.last = Instant::now();
            return true;
        }
        false
    }
}

/// 种子涂抹操作集合.
impl SegmentationTool {
    /// 按下: 开始一条笔画. 左键画对象, 右键画背景.
    pub fn begin_stroke(&mut self, pos: Idx2d, button: StrokeButton) {
        if self.draw_type == DrawType::MoveAnchor {
            return;
        }
        self.drawing = true;
        self.seeds_visible = true;
        self.draw_type = match button {
            StrokeButton::Left => DrawType::Object,
            StrokeButton::Right => DrawType::Background,
        };
        self.last_point = Some(pos);
    }

    /// 拖动: 把上一点到当前点的线段画进种子图.
    ///
    /// 返回是否值得重绘 (节流).
    pub fn stroke_to(&mut self, pos: Idx2d) -> bool {
        if self.drawing {
            if self.last_point == Some(pos) {
                return false;
            }
            if let Some(last) = self.last_point {
                self.draw_seed(last, pos);
            }
            self.last_point = Some(pos);
        }
        self.throttle.ready()
    }

    /// 松开: 终结笔画.
    pub fn end_stroke(&mut self, pos: Idx2d) {
        if self.drawing {
            if let Some(last) = self.last_point {
                self.draw_seed(last, pos);
            }
            self.drawing = false;
            self.last_point = None;
        }
        self.mark_all_dirty();
    }

    /// 把 `last` 到 `current` 的线段栅格化进种子图,
    /// 再按笔画粗细膨胀并打上种子值.
    pub fn draw_seed(&mut self, last: Idx2d, current: Idx2d) {
        rasterize_line(&mut self.seeds, last, current);
        let shape = self.seeds.shape();
        let value = self.draw_type.seed_value();
        let adj = Adjacency::circular(self.thickness as f64);
        let stroke = self.seeds.positions_of(SEED_STROKE);
        for px in stroke {
            self.seeds[px] = value;
            let pos = self.seeds.pos_of(px);
            for n in adj.neighbors_pos(shape, pos).collect::<Vec<_>>() {
                self.seeds[n] = value;
            }
        }
        self.mark_all_dirty();
    }

    /// 清空所有种子. 掩码层随之隐藏, 锚点状态作废.
    pub fn clear_seeds(&mut self) {
        self.seeds.fill(0);
        self.mask_visible = false;
        self.livewire = None;
        self.mark_all_dirty();
    }
}

/// Bresenham 直线栅格化, 落点写 [`SEED_STROKE`].
fn rasterize_line(seeds: &mut crate::GridMap<i32>, from: Idx2d, to: Idx2d) {
    let (mut h0, mut w0) = (from.0 as i64, from.1 as i64);
    let (h1, w1) = (to.0 as i64, to.1 as i64);
    let dh = (h1 - h0).abs();
    let dw = (w1 - w0).abs();
    let step_h = if h0 < h1 { 1 } else { -1 };
    let step_w = if w0 < w1 { 1 } else { -1 };
    let mut err = dw - dh;
    loop {
        if h0 >= 0 && w0 >= 0 && seeds.check((h0 as usize, w0 as usize)) {
            seeds[(h0 as usize, w0 as usize)] = SEED_STROKE;
        }
        if (h0, w0) == (h1, w1) {
            break;
        }
        let e2 = 2 * err;
        if e2 > -dh {
            err -= dh;
            w0 += step_w;
        }
        if e2 < dw {
            err += dw;
            h0 += step_h;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::seed::{SEED_BACKGROUND, SEED_OBJECT};
    use crate::phantom;
    use crate::seg::SegmentationTool;
    use either::Either;

    fn tool() -> SegmentationTool {
        SegmentationTool::new(Either::Left(phantom::ramp((10, 10))))
    }

    #[test]
    fn test_stroke_paints_line() {
        let mut t = tool();
        t.begin_stroke((2, 1), StrokeButton::Left);
        t.stroke_to((2, 7));
        t.end_stroke((2, 7));
        for w in 1..=7 {
            assert_eq!(t.seeds[(2, w)], SEED_OBJECT);
        }
        assert_eq!(t.seeds[(3, 3)], 0);
    }

    #[test]
    fn test_right_button_paints_background() {
        let mut t = tool();
        t.begin_stroke((0, 0), StrokeButton::Right);
        t.end_stroke((0, 3));
        assert_eq!(t.seeds[(0, 2)], SEED_BACKGROUND);
    }

    #[test]
    fn test_thickness_dilates_stroke() {
        let mut t = tool();
        t.set_thickness(1);
        t.begin_stroke((5, 5), StrokeButton::Left);
        t.end_stroke((5, 5));
        assert_eq!(t.seeds[(5, 5)], SEED_OBJECT);
        assert_eq!(t.seeds[(4, 5)], SEED_OBJECT);
        assert_eq!(t.seeds[(5, 4)], SEED_OBJECT);
        assert_eq!(t.seeds[(4, 4)], 0);
    }

    #[test]
    fn test_diagonal_line_connected() {
        let mut t = tool();
        t.begin_stroke((0, 0), StrokeButton::Left);
        t.end_stroke((4, 4));
        for i in 0..=4 {
            assert_eq!(t.seeds[(i, i)], SEED_OBJECT);
        }
    }

    #[test]
    fn test_clear_seeds_resets() {
        let mut t = tool();
        t.begin_stroke((1, 1), StrokeButton::Left);
        t.end_stroke((1, 5));
        t.clear_seeds();
        assert_eq!(t.seeds.count(SEED_OBJECT), 0);
        assert!(!t.get_mask_visible());
    }

    #[test]
    fn test_invalid_draw_type_code() {
        assert!(matches!(
            DrawType::from_code(9),
            Err(crate::SegError::InvalidDrawType(9))
        ));
        assert_eq!(DrawType::from_code(1).unwrap(), DrawType::Object);
    }
}
