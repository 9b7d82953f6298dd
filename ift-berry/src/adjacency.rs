//! 像素图的隐式邻接关系.
//!
//! 节点是像素的行优先平铺编号, 边由偏移表按需生成.

use crate::Idx2d;
use once_cell::sync::Lazy;

/// 偏移表邻接关系. 偏移以 `(dh, dw)` 表示, 不含中心.
#[derive(Clone, Debug)]
pub struct Adjacency {
    offsets: Vec<(isize, isize)>,
}

impl Adjacency {
    /// 以半径 `radius` 的圆形邻域构建.
    ///
    /// 半径 1.0 产生 4-邻域, 1.5 产生 8-邻域.
    pub fn circular(radius: f64) -> Self {
        let r = radius.max(0.0);
        let bound = r.floor() as isize;
        let r2 = r * r;
        let mut offsets = Vec::with_capacity(8);
        for dh in -bound..=bound {
            for dw in -bound..=bound {
                if (dh, dw) == (0, 0) {
                    continue;
                }
                if (dh * dh + dw * dw) as f64 <= r2 {
                    offsets.push((dh, dw));
                }
            }
        }
        Self { offsets }
    }

    /// 顺时针排序的 8-邻域, 供轮廓跟踪与 LiveWire 使用.
    ///
    /// 顺序固定为 NE, E, SE, S, SW, W, NW, N; 对角偏移位于偶数槽位.
    pub fn clockwise8() -> &'static Adjacency {
        static CLOCKWISE8: Lazy<Adjacency> = Lazy::new(|| Adjacency {
            offsets: vec![
                (-1, 1),  // NE
                (0, 1),   // E
                (1, 1),   // SE
                (1, 0),   // S
                (1, -1),  // SW
                (0, -1),  // W
                (-1, -1), // NW
                (-1, 0),  // N
            ],
        });
        &CLOCKWISE8
    }

    /// 邻域大小 (偏移个数).
    #[inline]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// 邻域是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// 第 `slot` 个偏移.
    #[inline]
    pub fn offset(&self, slot: usize) -> (isize, isize) {
        self.offsets[slot]
    }

    /// 第 `slot` 个偏移的欧氏长度.
    #[inline]
    pub fn dist(&self, slot: usize) -> f64 {
        let (dh, dw) = self.offsets[slot];
        ((dh * dh + dw * dw) as f64).sqrt()
    }

    /// 在形状为 `shape` 的图像中, 求元组索引 `pos` 的第 `slot` 个邻居.
    /// 越界时返回 `None`.
    #[inline]
    pub fn neighbor_pos(&self, shape: Idx2d, pos: Idx2d, slot: usize) -> Option<Idx2d> {
        let (dh, dw) = self.offsets[slot];
        let h = pos.0.checked_add_signed(dh)?;
        let w = pos.1.checked_add_signed(dw)?;
        (h < shape.0 && w < shape.1).then_some((h, w))
    }

    /// 在形状为 `shape` 的图像中, 求平铺索引 `flat` 的第 `slot` 个邻居的平铺索引.
    /// 越界时返回 `None`.
    #[inline]
    pub fn neighbor(&self, shape: Idx2d, flat: usize, slot: usize) -> Option<usize> {
        let pos = (flat / shape.1, flat % shape.1);
        self.neighbor_pos(shape, pos, slot)
            .map(|(h, w)| h * shape.1 + w)
    }

    /// 迭代 `pos` 的所有不越界邻居的元组索引.
    pub fn neighbors_pos<'a>(
        &'a self,
        shape: Idx2d,
        pos: Idx2d,
    ) -> impl Iterator<Item = Idx2d> + 'a {
        (0..self.len()).filter_map(move |slot| self.neighbor_pos(shape, pos, slot))
    }

    /// 迭代 `flat` 的所有不越界邻居的平铺索引.
    pub fn neighbors<'a>(
        &'a self,
        shape: Idx2d,
        flat: usize,
    ) -> impl Iterator<Item = usize> + 'a {
        (0..self.len()).filter_map(move |slot| self.neighbor(shape, flat, slot))
    }
}
