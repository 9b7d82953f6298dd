//! 合成测试图像.
//!
//! 单元测试与示例不依赖任何外部数据文件, 全部输入由这里生成.

use crate::{GridMap, Idx2d};

/// 二值圆盘: 圆内为 1, 圆外为 0.
///
/// 判定按像素中心到 `center` 的欧氏距离不超过 `radius`.
pub fn binary_disk(shape: Idx2d, center: Idx2d, radius: f64) -> GridMap<i32> {
    two_level_disk(shape, center, radius, 1, 0)
}

/// 双灰阶圆盘: 圆内为 `inside`, 圆外为 `outside`.
pub fn two_level_disk<D: Copy>(
    shape: Idx2d,
    center: Idx2d,
    radius: f64,
    inside: D,
    outside: D,
) -> GridMap<D> {
    let mut img = GridMap::filled(shape, outside);
    let r2 = radius * radius;
    for pos in img.pos_iter() {
        let dh = pos.0 as f64 - center.0 as f64;
        let dw = pos.1 as f64 - center.1 as f64;
        if dh * dh + dw * dw <= r2 {
            img[pos] = inside;
        }
    }
    img
}

/// 水平渐变: 每列像素值等于列号.
pub fn ramp(shape: Idx2d) -> GridMap<i32> {
    let mut img = GridMap::filled(shape, 0);
    for pos in img.pos_iter() {
        img[pos] = pos.1 as i32;
    }
    img
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disk_symmetry() {
        let disk = binary_disk((9, 9), (4, 4), 2.0);
        assert_eq!(disk[(4, 4)], 1);
        assert_eq!(disk[(4, 6)], 1);
        assert_eq!(disk[(4, 7)], 0);
        assert_eq!(disk[(0, 0)], 0);
        // 上下左右对称.
        assert_eq!(disk[(2, 4)], disk[(6, 4)]);
        assert_eq!(disk[(4, 2)], disk[(4, 6)]);
    }

    #[test]
    fn test_ramp_columns() {
        let r = ramp((2, 5));
        assert_eq!(r[(0, 0)], 0);
        assert_eq!(r[(1, 4)], 4);
    }
}
