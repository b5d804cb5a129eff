//! 胫骨平台最低点.
//!
//! 以胫骨体素 X 坐标 (毫米) 的均值为界, 较小一侧为外侧, 其余为内侧.
//! 每侧独立选取物理 Z 坐标最小的体素.
//!
//! # 注意
//!
//! 这里的 "最低" 是字面意义上的最小 Z, 与 header 中的扫描方向无关.
//! 内/外侧的划分同样只对固定的左膝摆位成立, 不会根据方向信息自动翻转.

mod report;

pub use report::LandmarkReport;

use crate::consts::rgb::{LATERAL_YELLOW, MEDIAL_BLUE};
use crate::{
    save_overlay, BoneError, BoneLabel, BoneResult, CtScan, Idx3d, NiftiHeaderAttr, PointMm,
};
use log::{info, warn};
use std::path::Path;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 单侧最低点.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Landmark {
    /// 找到了最低点.
    Present {
        /// 物理坐标 (毫米).
        mm: PointMm,

        /// 体素索引, 由 `mm` 逐轴除以体素间距并截断得到.
        voxel: Idx3d,
    },

    /// 该侧没有任何胫骨体素.
    Absent,
}

impl Landmark {
    /// 是否存在?
    #[inline]
    pub fn is_present(&self) -> bool {
        matches!(self, Landmark::Present { .. })
    }

    /// 物理坐标.
    #[inline]
    pub fn mm(&self) -> Option<PointMm> {
        match self {
            Landmark::Present { mm, .. } => Some(*mm),
            Landmark::Absent => None,
        }
    }

    /// 体素索引.
    #[inline]
    pub fn voxel(&self) -> Option<Idx3d> {
        match self {
            Landmark::Present { voxel, .. } => Some(*voxel),
            Landmark::Absent => None,
        }
    }
}

/// 胫骨内/外侧最低点.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TibiaLandmarks {
    /// 内侧.
    pub medial: Landmark,

    /// 外侧.
    pub lateral: Landmark,
}

impl TibiaLandmarks {
    /// 两侧均缺失.
    pub const ABSENT: Self = Self {
        medial: Landmark::Absent,
        lateral: Landmark::Absent,
    };

    /// 两侧是否都存在?
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.medial.is_present() && self.lateral.is_present()
    }
}

/// Neumaier 补偿求和后取均值. 空输入返回 NaN.
fn compensated_mean<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    let (mut sum, mut comp, mut n) = (0.0f64, 0.0f64, 0usize);
    for v in values {
        let t = sum + v;
        if sum.abs() >= v.abs() {
            comp += (sum - t) + v;
        } else {
            comp += (v - t) + sum;
        }
        sum = t;
        n += 1;
    }
    (sum + comp) / n as f64
}

/// 按 `center_x` 划分为 `(外侧, 内侧)`: X 小于 `center_x` 为外侧, 其余为内侧.
fn split_sides(points: &[PointMm], center_x: f64) -> (Vec<&PointMm>, Vec<&PointMm>) {
    points.iter().partition(|p| p[0] < center_x)
}

/// 取 Z 最小的点; 并列时取先出现者.
fn lowest<'a, I: Iterator<Item = &'a PointMm>>(points: I) -> Option<PointMm> {
    points.min_by(|a, b| a[2].total_cmp(&b[2])).copied()
}

/// 在 `label` 的胫骨部分寻找内/外侧最低点.
///
/// 胫骨体素按行优先顺序收集, 因此同一侧存在多个最低点时, 结果为行优先顺序下的第一个.
pub fn find_tibia_lowest_points(label: &BoneLabel) -> TibiaLandmarks {
    let spacing = label.spacing();
    let points: Vec<PointMm> = label
        .tibia_pos()
        .into_iter()
        .map(|p| spacing.to_mm(p))
        .collect();
    if points.is_empty() {
        warn!("No tibia voxels, both landmarks are absent");
        return TibiaLandmarks::ABSENT;
    }

    let center_x = compensated_mean(points.iter().map(|p| p[0]));
    let pick = |side: &str, point: Option<PointMm>| match point {
        Some(mm) => Landmark::Present {
            mm,
            voxel: spacing.to_voxel(mm),
        },
        None => {
            warn!("No tibia voxels on the {side} side of x = {center_x:.2} mm");
            Landmark::Absent
        }
    };

    let (lateral, medial) = split_sides(&points, center_x);
    let lateral = pick("lateral", lowest(lateral.into_iter()));
    let medial = pick("medial", lowest(medial.into_iter()));
    info!("Tibia landmarks: medial {medial:?}, lateral {lateral:?}");
    TibiaLandmarks { medial, lateral }
}

/// 保存第 `y` 个冠状切片的叠加图, 并标出位于该切片上的内侧 (蓝) 和外侧 (黄) 最低点.
///
/// `y` 越界或 `scan` 与 `label` 形状不一致时返回 `Err`.
pub fn save_landmark_overlay<P: AsRef<Path>>(
    scan: &CtScan,
    label: &BoneLabel,
    y: usize,
    landmarks: &TibiaLandmarks,
    path: P,
) -> BoneResult<()> {
    if scan.shape() != label.shape() {
        return Err(BoneError::invalid_parameter(format!(
            "scan shape {:?} differs from label shape {:?}",
            scan.shape(),
            label.shape()
        )));
    }
    if y >= scan.len_y() {
        return Err(BoneError::invalid_parameter(format!(
            "coronal slice {y} out of range 0..{}",
            scan.len_y()
        )));
    }

    let marks: Vec<_> = [
        (landmarks.medial, MEDIAL_BLUE),
        (landmarks.lateral, LATERAL_YELLOW),
    ]
    .into_iter()
    .filter_map(|(l, color)| l.voxel().map(|v| (v, color)))
    .filter(|((_, vy, _), _)| *vy == y)
    .map(|((x, _, z), color)| ((x, z), color))
    .collect();

    save_overlay(&scan.slice_at(y), &label.slice_at(y), &marks, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::gray::{FEMUR, TIBIA};
    use crate::segment::{segment_knee, SegmentConfig, SegmentationMethod};
    use crate::VoxelSpacing;
    use ndarray::{s, Array3};

    fn empty_label(shape: (usize, usize, usize), spacing: VoxelSpacing) -> BoneLabel {
        let scan = CtScan::from_array(Array3::zeros(shape), spacing).unwrap();
        BoneLabel::zeros_like(&scan)
    }

    #[test]
    fn test_empty_tibia() {
        let mut label = empty_label((10, 10, 10), VoxelSpacing::default());
        label.data_mut().slice_mut(s![2..5, 2..5, 2..5]).fill(FEMUR);
        let lm = find_tibia_lowest_points(&label);
        assert_eq!(lm, TibiaLandmarks::ABSENT);
        assert_eq!(lm.medial.mm(), None);
        assert_eq!(lm.lateral.voxel(), None);
    }

    #[test]
    fn test_cuboid_landmarks() {
        let spacing = VoxelSpacing::new(0.8, 1.0, 1.5).unwrap();
        let mut label = empty_label((40, 40, 80), spacing);
        label.data_mut().slice_mut(s![10..30, 10..30, 51..71]).fill(TIBIA);
        label.data_mut().slice_mut(s![10..30, 10..30, 10..30]).fill(FEMUR);

        let lm = find_tibia_lowest_points(&label);
        assert!(lm.is_complete());
        assert_eq!(lm.lateral.voxel(), Some((10, 10, 51)));
        assert_eq!(lm.medial.voxel(), Some((20, 10, 51)));
        let mm = lm.medial.mm().unwrap();
        assert!((mm[0] - 16.0).abs() < 1e-9);
        assert!((mm[1] - 10.0).abs() < 1e-9);
        assert!((mm[2] - 76.5).abs() < 1e-9);
    }

    #[test]
    fn test_compensated_mean() {
        assert_eq!(compensated_mean(std::iter::repeat(0.1).take(10)), 0.1);
        assert_eq!(compensated_mean([1e16, 3.0, -1e16]), 1.0);
        assert!(compensated_mean(std::iter::empty::<f64>()).is_nan());
    }

    #[test]
    fn test_segmented_knee_landmarks() {
        let spacing = VoxelSpacing::new(0.8, 1.0, 1.5).unwrap();
        let mut data = Array3::<f32>::from_elem((40, 40, 80), -700.0);
        data.slice_mut(s![10..30, 10..30, 10..30]).fill(1200.0);
        data.slice_mut(s![10..30, 10..30, 51..71]).fill(1200.0);
        let scan = CtScan::from_array(data, spacing).unwrap();

        let seg = segment_knee(&scan, &SegmentConfig::default()).unwrap();
        assert_eq!(seg.method, SegmentationMethod::Primary);
        assert_eq!(seg.label.count(TIBIA), 8000);

        // 最低点位于胫骨块朝向关节的一面.
        let lm = find_tibia_lowest_points(&seg.label);
        assert_eq!(lm.lateral.voxel(), Some((10, 10, 51)));
        assert_eq!(lm.medial.voxel(), Some((20, 10, 51)));

        // 内外侧恰好划分全部胫骨体素.
        let points: Vec<PointMm> = seg
            .label
            .tibia_pos()
            .into_iter()
            .map(|p| spacing.to_mm(p))
            .collect();
        let center_x = compensated_mean(points.iter().map(|p| p[0]));
        let (lateral, medial) = split_sides(&points, center_x);
        assert_eq!(lateral.len() + medial.len(), points.len());
        assert_eq!(lateral.len(), 4000);
        assert_eq!(medial.len(), 4000);
        assert!(lateral.iter().all(|p| p[0] < center_x));
        assert!(medial.iter().all(|p| p[0] >= center_x));
    }

    #[test]
    fn test_sides_pick_their_own_minimum() {
        let mut label = empty_label((10, 4, 20), VoxelSpacing::default());
        label.data_mut().slice_mut(s![0..5, 1..2, 10..15]).fill(TIBIA);
        label.data_mut().slice_mut(s![6..10, 1..2, 6..15]).fill(TIBIA);
        label[(2, 2, 8)] = TIBIA;

        // 均值约为 5.19: x < 6 为外侧.
        let lm = find_tibia_lowest_points(&label);
        assert_eq!(lm.lateral.voxel(), Some((2, 2, 8)));
        assert_eq!(lm.medial.voxel(), Some((6, 1, 6)));
    }

    #[test]
    fn test_single_column_is_medial() {
        // 所有点 X 相同, 均不小于均值, 全部归入内侧.
        let mut label = empty_label((6, 6, 6), VoxelSpacing::default());
        label.data_mut().slice_mut(s![3..4, 1..3, 2..5]).fill(TIBIA);
        let lm = find_tibia_lowest_points(&label);
        assert_eq!(lm.medial.voxel(), Some((3, 1, 2)));
        assert_eq!(lm.lateral, Landmark::Absent);
    }

    #[test]
    fn test_voxel_round_trip() {
        let spacing = VoxelSpacing::new(0.7, 0.3, 1.1).unwrap();
        let mut label = empty_label((30, 30, 30), spacing);
        label.data_mut().slice_mut(s![3..29, 7..8, 11..27]).fill(TIBIA);
        let lm = find_tibia_lowest_points(&label);
        for l in [lm.medial, lm.lateral] {
            let voxel = l.voxel().unwrap();
            assert_eq!(spacing.to_mm(voxel), l.mm().unwrap());
            assert_eq!(label[voxel], TIBIA);
        }
    }

    #[test]
    fn test_overlay_rejects_bad_slice() {
        let scan = CtScan::from_array(Array3::zeros((4, 4, 4)), VoxelSpacing::default()).unwrap();
        let label = BoneLabel::zeros_like(&scan);
        let path = std::env::temp_dir().join("bone-berry-overlay-bad-slice.png");
        assert!(save_landmark_overlay(&scan, &label, 4, &TibiaLandmarks::ABSENT, &path).is_err());
    }

    #[test]
    fn test_overlay_written() {
        let scan = CtScan::from_array(Array3::zeros((8, 6, 10)), VoxelSpacing::default()).unwrap();
        let mut label = BoneLabel::zeros_like(&scan);
        label.data_mut().slice_mut(s![1..7, 2..4, 5..9]).fill(TIBIA);
        let lm = find_tibia_lowest_points(&label);
        let path = std::env::temp_dir()
            .join("bone-berry-landmark-test")
            .join("overlay.png");
        save_landmark_overlay(&scan, &label, 2, &lm, &path).unwrap();
        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (8, 10));
        assert_eq!(lm.lateral.voxel(), Some((1, 2, 5)));
        assert_eq!(lm.medial.voxel(), Some((4, 2, 5)));
        assert_eq!(img.get_pixel(1, 5).0, LATERAL_YELLOW);
        assert_eq!(img.get_pixel(4, 8).0, MEDIAL_BLUE);
        std::fs::remove_file(&path).unwrap();
    }
}
