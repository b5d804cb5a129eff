use crate::morph::{closing_2d, remove_small_objects_2d, Element2d};
use crate::ScanSlice;
use ndarray::Array2;

/// 提取冠状切片上的骨骼掩膜.
///
/// 算法流程依次为:
///
/// 1. 严格大于 `threshold` 的像素为候选骨骼.
/// 2. 去除面积小于 `min_size` 的 4-连通区域.
/// 3. 以半径为 `closing_radius` 的圆盘做闭运算, 图像外视为前景.
pub fn bone_mask(
    slice: &ScanSlice,
    threshold: f32,
    min_size: usize,
    closing_radius: usize,
) -> Array2<bool> {
    let mask = slice.threshold(threshold);
    let mask = remove_small_objects_2d(mask.view(), min_size);
    closing_2d(mask.view(), &Element2d::cached_disk(closing_radius))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::s;

    #[test]
    fn test_bone_mask() {
        let mut hu = Array2::<f32>::from_elem((30, 30), -50.0);
        // 大块骨骼, 中间有 1 像素宽的低密度裂缝.
        hu.slice_mut(s![5..15, 5..20]).fill(900.0);
        hu.slice_mut(s![5..15, 12]).fill(100.0);
        // 噪点.
        hu.slice_mut(s![25..27, 25..27]).fill(900.0);

        let mask = bone_mask(&ScanSlice::new(hu.view()), 200.0, 50, 2);
        assert!(mask[(10, 12)]);
        assert!(mask[(5, 5)]);
        assert!(!mask[(25, 25)]);
        assert!(!mask[(20, 10)]);
    }

    #[test]
    fn test_bone_mask_empty() {
        let hu = Array2::<f32>::from_elem((8, 8), 0.0);
        let mask = bone_mask(&ScanSlice::new(hu.view()), 200.0, 50, 2);
        assert!(mask.iter().all(|p| !*p));
    }
}
