//! 图像的持久化存储.

use crate::consts::{gray, rgb};
use crate::{BoneResult, CtWindow, Idx2d, LabelSlice, ScanSlice};
use image::{Rgb, RgbImage};
use std::fs;
use std::path::Path;

/// 标签值对应的叠加色. 背景返回 `None`.
#[inline]
fn pretty(label: u8) -> Option<[u8; 3]> {
    match label {
        gray::TIBIA => Some(rgb::TIBIA_GREEN),
        gray::FEMUR => Some(rgb::FEMUR_RED),
        _ => None,
    }
}

/// 将 `over` 以 `alpha` 的不透明度叠加到 `base` 上.
#[inline]
fn blend(base: [u8; 3], over: [u8; 3], alpha: f32) -> [u8; 3] {
    let mix = |b: u8, o: u8| (b as f32 * (1.0 - alpha) + o as f32 * alpha).round() as u8;
    [
        mix(base[0], over[0]),
        mix(base[1], over[1]),
        mix(base[2], over[2]),
    ]
}

/// 标记点十字的半臂长, 以像素为单位.
const MARKER_ARM: usize = 3;

/// 将扫描切片 (骨窗), 标签叠加层和若干标记点合成为一张 RGB 图像并保存到 `path`.
///
/// `marks` 中的每个元素为 `(切片坐标 (x, z), 颜色)`, 以十字形绘制, 超出图像的部分被裁掉.
/// 父目录不存在时会被创建.
///
/// 若 `scan` 与 `label` 形状不一致, 则程序 panic.
pub fn save_overlay<P: AsRef<Path>>(
    scan: &ScanSlice,
    label: &LabelSlice,
    marks: &[(Idx2d, [u8; 3])],
    path: P,
) -> BoneResult<()> {
    assert_eq!(scan.shape(), label.shape(), "扫描和标签切片形状不一致");
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let window = CtWindow::from_bone_visual();
    let (width, height) = scan.shape();
    let mut buf = RgbImage::new(width as u32, height as u32);
    for ((x, z), &hu) in scan.indexed_iter() {
        let g = window.eval(hu).unwrap_or(u8::MIN);
        let color = match pretty(label[(x, z)]) {
            Some(over) => blend([g; 3], over, 0.5),
            None => [g; 3],
        };
        buf.put_pixel(x as u32, z as u32, Rgb(color));
    }

    for &((mx, mz), color) in marks {
        let horizontal = (mx.saturating_sub(MARKER_ARM)..=mx + MARKER_ARM).map(|x| (x, mz));
        let vertical = (mz.saturating_sub(MARKER_ARM)..=mz + MARKER_ARM).map(|z| (mx, z));
        for (x, z) in horizontal.chain(vertical) {
            if x < width && z < height {
                buf.put_pixel(x as u32, z as u32, Rgb(color));
            }
        }
    }

    buf.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_blend() {
        assert_eq!(blend([0; 3], [200, 100, 0], 0.5), [100, 50, 0]);
        assert_eq!(blend([10, 20, 30], [0; 3], 0.0), [10, 20, 30]);
    }

    #[test]
    fn test_overlay_pixels() {
        let hu = Array2::<f32>::from_elem((9, 7), -1000.0);
        let mut lab = Array2::<u8>::zeros((9, 7));
        lab[(1, 1)] = gray::TIBIA;
        lab[(2, 1)] = gray::FEMUR;
        let scan = ScanSlice::new(hu.view());
        let label = LabelSlice::new(lab.view());

        let dir = std::env::temp_dir().join(format!("bone-berry-vis-{}", std::process::id()));
        let path = dir.join("overlay.png");
        save_overlay(&scan, &label, &[((6, 5), rgb::MEDIAL_BLUE)], &path).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (9, 7));
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(img.get_pixel(1, 1).0, [0, 100, 0]);
        assert_eq!(img.get_pixel(2, 1).0, [110, 0, 0]);
        // 十字中心和裁剪后的两臂.
        assert_eq!(img.get_pixel(6, 5).0, rgb::MEDIAL_BLUE);
        assert_eq!(img.get_pixel(8, 5).0, rgb::MEDIAL_BLUE);
        assert_eq!(img.get_pixel(6, 2).0, rgb::MEDIAL_BLUE);
        assert_eq!(img.get_pixel(5, 4).0, [0, 0, 0]);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_label_colors() {
        assert_eq!(pretty(gray::TIBIA), Some(rgb::TIBIA_GREEN));
        assert_eq!(pretty(gray::FEMUR), Some(rgb::FEMUR_RED));
        assert_eq!(pretty(gray::BACKGROUND), None);
        assert_eq!(pretty(7), None);
    }
}
