use super::GridMap;
use crate::consts::seed::{SEED_BACKGROUND, SEED_OBJECT};
use image::{Rgba, RgbaImage};

/// 叠加层配色.
#[derive(Copy, Clone, Debug)]
pub struct OverlayStyle {
    /// 对象种子颜色.
    pub object: Rgba<u8>,

    /// 背景种子颜色.
    pub background: Rgba<u8>,

    /// 掩码颜色.
    pub mask: Rgba<u8>,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            object: Rgba([0, 255, 0, 255]),
            background: Rgba([0, 0, 255, 255]),
            mask: Rgba([255, 0, 0, 255]),
        }
    }
}

/// 将种子图与掩码合成为一张可供显示的 RGBA 叠加层.
///
/// 不可见的图层以全透明像素表示; 该操作从不修改底层数据.
/// 两图形状不符时 panic.
pub fn render_overlay(
    seeds: &GridMap<i32>,
    mask: &GridMap<i32>,
    seeds_visible: bool,
    mask_visible: bool,
    style: OverlayStyle,
) -> RgbaImage {
    assert_eq!(seeds.shape(), mask.shape(), "种子图与掩码形状不符");
    let (h, w) = seeds.shape();
    let mut out = RgbaImage::from_pixel(w as u32, h as u32, Rgba([0, 0, 0, 0]));
    if seeds_visible {
        for (pos, &p) in seeds.indexed_iter() {
            let color = match p {
                SEED_OBJECT => style.object,
                SEED_BACKGROUND => style.background,
                _ => continue,
            };
            out.put_pixel(pos.1 as u32, pos.0 as u32, color);
        }
    }
    if mask_visible {
        for (pos, &p) in mask.indexed_iter() {
            if p != 0 {
                out.put_pixel(pos.1 as u32, pos.0 as u32, style.mask);
            }
        }
    }
    out
}
