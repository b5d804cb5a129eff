use super::SlicePair;
use crate::consts::gray::{FEMUR, TIBIA};
use crate::{BoneLabel, CtScan, ScanSlice};
use log::debug;
use std::ops::Range;

/// 计算参与分割的冠状切片范围: `[floor(len_y * lo), floor(len_y * hi))`.
pub fn slab_range(len_y: usize, (lo, hi): (f64, f64)) -> Range<usize> {
    let start = ((len_y as f64 * lo) as usize).min(len_y);
    let end = ((len_y as f64 * hi) as usize).min(len_y);
    start..end.max(start)
}

/// 单个切片的计算结果: `(y, 分割结果)`.
pub type SliceOutcome = (usize, Option<SlicePair>);

/// 对 `slab` 中的每个冠状切片调用 `segment`. 各切片的计算互不依赖,
/// 在打开 `rayon` feature 时并行执行. 结果按 y 升序排列.
pub fn segment_slab<F>(scan: &CtScan, slab: Range<usize>, segment: F) -> Vec<SliceOutcome>
where
    F: Fn(&ScanSlice) -> Option<SlicePair> + Sync + Send,
{
    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            use rayon::iter::{IntoParallelIterator, ParallelIterator};
            slab.into_par_iter()
                .map(|y| (y, segment(&scan.slice_at(y))))
                .collect()
        } else {
            slab.map(|y| (y, segment(&scan.slice_at(y)))).collect()
        }
    }
}

/// 将所有切片结果写入一个全背景的标签体. 每个切片先写胫骨, 后写股骨.
///
/// 这是唯一修改标签体的步骤.
pub fn reduce_outcomes(scan: &CtScan, outcomes: Vec<SliceOutcome>) -> BoneLabel {
    let mut label = BoneLabel::zeros_like(scan);
    let mut painted = 0usize;
    for (y, pair) in outcomes {
        let Some(pair) = pair else { continue };
        let mut sli = label.slice_at_mut(y);
        sli.paint(pair.tibia.view(), TIBIA);
        sli.paint(pair.femur.view(), FEMUR);
        painted += 1;
    }
    debug!("Assembled {painted} segmented slices");
    label
}

/// 分割 `slab` 范围内的所有冠状切片并拼装为标签体. 范围外的切片保持为背景.
#[inline]
pub fn assemble<F>(scan: &CtScan, slab: Range<usize>, segment: F) -> BoneLabel
where
    F: Fn(&ScanSlice) -> Option<SlicePair> + Sync + Send,
{
    let outcomes = segment_slab(scan, slab, segment);
    reduce_outcomes(scan, outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NiftiHeaderAttr, VoxelSpacing};
    use ndarray::{Array2, Array3};

    #[test]
    fn test_slab_range() {
        assert_eq!(slab_range(100, (0.2, 0.8)), 20..80);
        assert_eq!(slab_range(7, (0.2, 0.8)), 1..5);
        assert_eq!(slab_range(1, (0.2, 0.8)), 0..0);
        assert_eq!(slab_range(0, (0.2, 0.8)), 0..0);
    }

    #[test]
    fn test_assemble_only_touches_slab() {
        let scan = CtScan::from_array(
            Array3::<f32>::zeros((4, 10, 6)),
            VoxelSpacing::default(),
        )
        .unwrap();
        let slab = slab_range(scan.len_y(), (0.2, 0.8));

        // 每个切片: 第 0 列为股骨, 最后一列为胫骨, 中间某点两者重叠.
        let label = assemble(&scan, slab.clone(), |s| {
            let (x, z) = s.shape();
            let mut femur = Array2::from_elem((x, z), false);
            let mut tibia = femur.clone();
            femur.column_mut(0).fill(true);
            tibia.column_mut(z - 1).fill(true);
            tibia[(0, 0)] = true;
            Some(SlicePair { femur, tibia, joint: z / 2 })
        });

        for y in 0..scan.len_y() {
            let sli = label.slice_at(y);
            if slab.contains(&y) {
                assert_eq!(sli.count(FEMUR), 4);
                assert_eq!(sli.count(TIBIA), 4);
                assert_eq!(sli[(0, 0)], FEMUR);
            } else {
                assert_eq!(sli.count(FEMUR) + sli.count(TIBIA), 0);
            }
        }
    }
}
