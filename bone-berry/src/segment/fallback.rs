use super::refine::{refine_label, RefineOrder, RefineParams};
use super::slice::split_at_joint;
use super::volume::{assemble, slab_range};
use super::SegmentConfig;
use crate::{BoneLabel, CtScan, NiftiHeaderAttr};
use log::info;

/// 备用分割. 在主方法得到不合理结果时使用.
///
/// 与主方法相比: 阈值更低, 不做骨骼掩膜的去噪和闭运算, 直接在切片 z 方向中点处切分;
/// 三维后处理先做 5x5x5 闭运算再填洞.
pub fn fallback_segment(scan: &CtScan, cfg: &SegmentConfig) -> BoneLabel {
    let fb = &cfg.fallback;
    let slab = slab_range(scan.len_y(), cfg.slab);
    info!(
        "Fallback segmentation on slices {slab:?} with threshold {}",
        fb.threshold
    );

    let raw = assemble(scan, slab, |s| {
        let mask = s.threshold(fb.threshold);
        Some(split_at_joint(mask.view(), s.height() / 2, fb.side_min_size))
    });

    refine_label(
        &raw,
        RefineParams {
            order: RefineOrder::CloseThenFill,
            closing: fb.closing,
            min_size: fb.min_component,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::gray::{FEMUR, TIBIA};
    use crate::VoxelSpacing;
    use ndarray::{s, Array3};

    #[test]
    fn test_fallback_splits_at_midpoint() {
        let mut data = Array3::<f32>::from_elem((40, 40, 80), -500.0);
        data.slice_mut(s![10..30, 10..30, 25..55]).fill(180.0);
        let scan = CtScan::from_array(data, VoxelSpacing::default()).unwrap();

        let label = fallback_segment(&scan, &SegmentConfig::default());
        assert_eq!(label.count(FEMUR), 20 * 20 * 15);
        assert_eq!(label.count(TIBIA), 20 * 20 * 15);
        assert_eq!(label[(15, 15, 39)], FEMUR);
        assert_eq!(label[(15, 15, 40)], TIBIA);
    }
}
