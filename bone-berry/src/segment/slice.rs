use super::bone::bone_mask;
use super::joint::locate_joint;
use super::SegmentConfig;
use crate::morph::remove_small_objects_2d;
use crate::ScanSlice;
use ndarray::{s, Array2, ArrayView2};

/// 单个冠状切片的分割结果. 两个掩膜形状均为 `(X, Z)`, 互不相交.
#[derive(Debug, Clone, PartialEq)]
pub struct SlicePair {
    /// 股骨掩膜, 只出现在 `z < joint` 的部分.
    pub femur: Array2<bool>,

    /// 胫骨掩膜, 只出现在 `z >= joint` 的部分.
    pub tibia: Array2<bool>,

    /// 分界线的 z 方向索引.
    pub joint: usize,
}

impl SlicePair {
    /// 两个掩膜是否都为空?
    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.femur.iter().chain(self.tibia.iter()).any(|p| *p)
    }
}

/// 在 z 方向索引 `joint` 处将骨骼掩膜切分为股骨 (`z < joint`) 和胫骨 (`z >= joint`),
/// 并分别去除面积小于 `min_size` 的 4-连通区域.
pub fn split_at_joint(mask: ArrayView2<bool>, joint: usize, min_size: usize) -> SlicePair {
    let joint = joint.min(mask.ncols());

    let mut femur = mask.to_owned();
    femur.slice_mut(s![.., joint..]).fill(false);
    let mut tibia = mask.to_owned();
    tibia.slice_mut(s![.., ..joint]).fill(false);

    SlicePair {
        femur: remove_small_objects_2d(femur.view(), min_size),
        tibia: remove_small_objects_2d(tibia.view(), min_size),
        joint,
    }
}

/// 分割单个冠状切片.
///
/// 若切片最大 HU 值低于骨骼阈值, 返回 `None`. 否则依次提取骨骼掩膜,
/// 定位关节线并切分.
pub fn segment_slice(slice: &ScanSlice, cfg: &SegmentConfig) -> Option<SlicePair> {
    if slice.max() < cfg.bone_threshold {
        return None;
    }
    let mask = bone_mask(
        slice,
        cfg.bone_threshold,
        cfg.bone_min_size,
        cfg.closing_radius,
    );
    let joint = locate_joint(mask.view(), cfg.joint_sigma);
    Some(split_at_joint(mask.view(), joint, cfg.side_min_size))
}
