use crate::consts::gray::{FEMUR, TIBIA};
use crate::morph::{dilate_box, BoxElement};
use crate::{BoneLabel, BoneResult, NiftiHeaderAttr};
use log::debug;
use ndarray::{Array3, Zip};

/// 将两个骨骼标签各自向外扩张约 `expansion_mm` 毫米.
///
/// 1. 每个轴上的盒形结构元素边长为 `max(1, ceil(expansion_mm / spacing))`.
/// 2. 胫骨和股骨分别膨胀.
/// 3. 两者膨胀结果重叠的体素, 各自退回原始状态; 因此扩张不会侵占另一块骨骼.
/// 4. 依次写入胫骨和股骨.
///
/// `expansion_mm` 为 0 时, 结构元素为单体素, 结果与输入相同.
/// `expansion_mm` 为负数或非有限值时返回 `Err`.
pub fn expand_label(label: &BoneLabel, expansion_mm: f64) -> BoneResult<BoneLabel> {
    let kernel = label.spacing().kernel_size(expansion_mm)?;
    debug!("Expanding by {expansion_mm} mm with box kernel {kernel:?}");
    let element = BoxElement::new(kernel);
    if element.is_identity() {
        return Ok(label.clone());
    }

    let tibia = label.mask(TIBIA);
    let femur = label.mask(FEMUR);
    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            let (mut tibia_exp, mut femur_exp) = rayon::join(
                || dilate_box(tibia.view(), element),
                || dilate_box(femur.view(), element),
            );
        } else {
            let mut tibia_exp = dilate_box(tibia.view(), element);
            let mut femur_exp = dilate_box(femur.view(), element);
        }
    }

    Zip::from(&mut tibia_exp)
        .and(&mut femur_exp)
        .and(&tibia)
        .and(&femur)
        .for_each(|t, f, &t0, &f0| {
            if *t && *f {
                *t = t0;
                *f = f0;
            }
        });

    Ok(label.from_masks(&tibia_exp, &femur_exp))
}

/// 扩张环: 在 `expanded` 中为 `label`, 但在 `original` 中不是 `label` 的体素.
///
/// 两个标签形状必须一致, 否则程序 panic.
pub fn expansion_ring(original: &BoneLabel, expanded: &BoneLabel, label: u8) -> Array3<bool> {
    let mut ring = Array3::from_elem(original.data().raw_dim(), false);
    Zip::from(&mut ring)
        .and(original.data())
        .and(expanded.data())
        .for_each(|r, &o, &e| *r = e == label && o != label);
    ring
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CtScan, VoxelSpacing};
    use ndarray::s;

    fn empty_label(shape: (usize, usize, usize), spacing: VoxelSpacing) -> BoneLabel {
        let scan = CtScan::from_array(Array3::zeros(shape), spacing).unwrap();
        BoneLabel::zeros_like(&scan)
    }

    #[test]
    fn test_zero_expansion_is_identity() {
        let mut label = empty_label((8, 8, 8), VoxelSpacing::new(0.5, 0.5, 2.0).unwrap());
        label.data_mut().slice_mut(s![2..5, 2..5, 1..3]).fill(TIBIA);
        label[(6, 6, 6)] = FEMUR;
        assert_eq!(expand_label(&label, 0.0).unwrap(), label);
        assert!(expand_label(&label, -1.0).is_err());
    }

    #[test]
    fn test_expansion_is_superset() {
        let mut label = empty_label((20, 20, 20), VoxelSpacing::new(0.5, 1.0, 1.5).unwrap());
        label.data_mut().slice_mut(s![4..8, 4..8, 4..8]).fill(TIBIA);
        label.data_mut().slice_mut(s![12..16, 12..16, 12..16]).fill(FEMUR);
        let out = expand_label(&label, 2.0).unwrap();
        for (pos, &v) in label.data().indexed_iter() {
            if v != 0 {
                assert_eq!(out[pos], v);
            }
        }
        // 边长 [4, 2, 2]: 各轴分别增长 3, 1, 1 个体素.
        assert_eq!(out.count(TIBIA), 7 * 5 * 5);
        assert_eq!(out.count(FEMUR), 7 * 5 * 5);
        assert!(out.is_valid());
    }

    #[test]
    fn test_contested_voxels_revert() {
        let mut label = empty_label((10, 10, 20), VoxelSpacing::default());
        label[(5, 5, 10)] = TIBIA;
        label[(5, 5, 12)] = FEMUR;
        // 边长 4, 膨胀窗口 [-1, 2]: 单体素扩张为 p-2..=p+1.
        let out = expand_label(&label, 4.0).unwrap();
        assert_eq!(out[(5, 5, 10)], TIBIA);
        assert_eq!(out[(5, 5, 8)], TIBIA);
        assert_eq!(out[(5, 5, 11)], 0);
        assert_eq!(out[(4, 5, 10)], 0);
        assert_eq!(out[(5, 5, 12)], FEMUR);
        assert_eq!(out[(5, 5, 13)], FEMUR);
        assert_eq!(out[(4, 6, 13)], FEMUR);
    }

    #[test]
    fn test_expansion_ring() {
        let mut label = empty_label((6, 6, 6), VoxelSpacing::default());
        label[(3, 3, 3)] = TIBIA;
        let out = expand_label(&label, 3.0).unwrap();
        let ring = expansion_ring(&label, &out, TIBIA);
        assert_eq!(ring.iter().filter(|p| **p).count(), 26);
        assert!(!ring[(3, 3, 3)]);
        assert!(expansion_ring(&label, &out, FEMUR).iter().all(|p| !*p));
    }
}
