//! 股骨/胫骨分割, 以及由分割结果派生的扩张/随机化变体.
//!
//! 主流程为:
//!
//! 1. 对 Y 方向中间 60% 的每个冠状切片, 提取骨骼掩膜并在关节线处切分
//!   (见 [`segment_slice`]).
//! 2. 将各切片结果拼装为标签体 (见 [`assemble`]).
//! 3. 三维后处理 (见 [`refine_label`]).
//! 4. 若任一骨骼体素过少, 改用备用方法 (见 [`fallback_segment`]).

mod bone;
mod config;
mod expand;
mod fallback;
mod joint;
mod random;
mod refine;
mod slice;
mod variant;
mod volume;

pub use bone::bone_mask;
pub use config::{FallbackConfig, SegmentConfig};
pub use expand::{expand_label, expansion_ring};
pub use fallback::fallback_segment;
pub use joint::{gaussian_filter1d, locate_joint};
pub use random::{randomize_label, RandomSource};
pub use refine::{refine_label, refine_mask, RefineOrder, RefineParams};
pub use slice::{segment_slice, split_at_joint, SlicePair};
pub use variant::{build_variants, MaskVariant, RandomSpec, VariantKind, VariantPlan};
pub use volume::{assemble, reduce_outcomes, segment_slab, slab_range, SliceOutcome};

use crate::consts::gray::{FEMUR, TIBIA};
use crate::{BoneLabel, BoneResult, CtScan, NiftiHeaderAttr, Stage, StageContext};
use log::{info, warn};
use std::fmt;
use std::ops::Range;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 最终采用的分割方法.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SegmentationMethod {
    /// 主方法.
    Primary,

    /// 备用方法.
    Fallback,
}

impl fmt::Display for SegmentationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentationMethod::Primary => f.write_str("primary"),
            SegmentationMethod::Fallback => f.write_str("fallback"),
        }
    }
}

/// 分割结果.
#[derive(Debug, Clone)]
pub struct Segmentation {
    /// 标签体.
    pub label: BoneLabel,

    /// 最终采用的方法.
    pub method: SegmentationMethod,

    /// 参与分割的冠状切片范围.
    pub slab: Range<usize>,
}

/// 主方法的三维后处理参数.
#[inline]
fn primary_refine(cfg: &SegmentConfig) -> RefineParams {
    RefineParams {
        order: RefineOrder::FillThenClose,
        closing: cfg.refine_closing,
        min_size: cfg.min_component,
    }
}

/// 分割膝关节 CT 中的股骨和胫骨.
///
/// 主方法得到的胫骨或股骨体素数低于 `cfg.min_plausible` 时, 结果被丢弃并改用备用方法.
/// 备用方法的结果不再检查.
pub fn segment_knee(scan: &CtScan, cfg: &SegmentConfig) -> BoneResult<Segmentation> {
    cfg.validate().stage(Stage::Segment)?;
    let slab = slab_range(scan.len_y(), cfg.slab);
    info!(
        "Segmenting coronal slices {slab:?} of {} with threshold {}",
        scan.len_y(),
        cfg.bone_threshold
    );

    let raw = assemble(scan, slab.clone(), |s| segment_slice(s, cfg));
    let label = refine_label(&raw, primary_refine(cfg));

    let (tibia, femur) = (label.count(TIBIA), label.count(FEMUR));
    info!("Primary segmentation: {tibia} tibia voxels, {femur} femur voxels");
    if tibia >= cfg.min_plausible && femur >= cfg.min_plausible {
        return Ok(Segmentation {
            label,
            method: SegmentationMethod::Primary,
            slab,
        });
    }

    warn!(
        "Primary segmentation implausible (tibia {tibia}, femur {femur}, minimum {}), using fallback",
        cfg.min_plausible
    );
    let label = fallback_segment(scan, cfg);
    info!(
        "Fallback segmentation: {} tibia voxels, {} femur voxels",
        label.count(TIBIA),
        label.count(FEMUR)
    );
    Ok(Segmentation {
        label,
        method: SegmentationMethod::Fallback,
        slab,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VoxelSpacing;
    use ndarray::{s, Array3};

    fn knee(bone_hu: f32) -> CtScan {
        let mut data = Array3::<f32>::from_elem((40, 40, 80), -700.0);
        data.slice_mut(s![10..30, 10..30, 10..30]).fill(bone_hu);
        data.slice_mut(s![10..30, 10..30, 51..71]).fill(bone_hu);
        CtScan::from_array(data, VoxelSpacing::new(0.8, 1.0, 1.5).unwrap()).unwrap()
    }

    #[test]
    fn test_primary_segmentation() {
        let seg = segment_knee(&knee(1200.0), &SegmentConfig::default()).unwrap();
        assert_eq!(seg.method, SegmentationMethod::Primary);
        assert_eq!(seg.slab, 8..32);
        assert_eq!(seg.label.numeric_statistics(), [40 * 40 * 80 - 16000, 8000, 8000]);
        assert_eq!(seg.label[(15, 15, 15)], FEMUR);
        assert_eq!(seg.label[(15, 15, 60)], TIBIA);
    }

    #[test]
    fn test_dim_bone_uses_fallback() {
        let seg = segment_knee(&knee(180.0), &SegmentConfig::default()).unwrap();
        assert_eq!(seg.method, SegmentationMethod::Fallback);
        assert_eq!(seg.label.count(FEMUR), 8000);
        assert_eq!(seg.label.count(TIBIA), 8000);
    }

    #[test]
    fn test_empty_scan_stays_empty() {
        let scan = CtScan::from_array(Array3::zeros((12, 12, 12)), VoxelSpacing::default()).unwrap();
        let seg = segment_knee(&scan, &SegmentConfig::default()).unwrap();
        assert_eq!(seg.method, SegmentationMethod::Fallback);
        assert_eq!(seg.label.count(TIBIA) + seg.label.count(FEMUR), 0);
    }

    #[test]
    fn test_invalid_config() {
        let cfg = SegmentConfig {
            joint_sigma: -1.0,
            ..Default::default()
        };
        let err = segment_knee(&knee(1200.0), &cfg).unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Segment));
    }
}
