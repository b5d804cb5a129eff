//! 分割结果的三维后处理.

use crate::consts::gray::{FEMUR, TIBIA};
use crate::morph::{closing_box, fill_holes_3d, remove_small_objects_3d, BoxElement};
use crate::BoneLabel;
use ndarray::Array3;

/// 填洞与闭运算的先后顺序.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RefineOrder {
    /// 先填洞, 后闭运算. 主方法使用.
    FillThenClose,

    /// 先闭运算, 后填洞. 备用方法使用.
    CloseThenFill,
}

/// 三维后处理参数.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RefineParams {
    /// 填洞与闭运算的先后顺序.
    pub order: RefineOrder,

    /// 闭运算立方体边长.
    pub closing: usize,

    /// 保留的最小 6-连通区域体积.
    pub min_size: usize,
}

/// 对单个骨骼掩膜做填洞, 闭运算 (体数据外视为背景) 和小连通域去除.
pub fn refine_mask(mask: Array3<bool>, params: RefineParams) -> Array3<bool> {
    let element = BoxElement::cube(params.closing);
    let mask = match params.order {
        RefineOrder::FillThenClose => {
            let filled = fill_holes_3d(mask.view());
            closing_box(filled.view(), element)
        }
        RefineOrder::CloseThenFill => {
            let closed = closing_box(mask.view(), element);
            fill_holes_3d(closed.view())
        }
    };
    remove_small_objects_3d(mask.view(), params.min_size)
}

/// 对胫骨和股骨分别做三维后处理, 然后依次写回 (重叠处为股骨).
pub fn refine_label(label: &BoneLabel, params: RefineParams) -> BoneLabel {
    let tibia = label.mask(TIBIA);
    let femur = label.mask(FEMUR);

    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            let (tibia, femur) = rayon::join(
                || refine_mask(tibia, params),
                || refine_mask(femur, params),
            );
        } else {
            let tibia = refine_mask(tibia, params);
            let femur = refine_mask(femur, params);
        }
    }
    label.from_masks(&tibia, &femur)
}
