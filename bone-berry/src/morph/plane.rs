//! 冠状切片上的二值形态学操作. 连通性均按 4-邻接计算.

use super::Element2d;
use crate::data::slice::PosIter;
use crate::Idx2d;
use ndarray::{s, Array2, ArrayView2, Zip};
use std::collections::VecDeque;
use std::ops::Range;

/// 一个 4-连通区域的所有像素索引.
pub type Area2d = Vec<Idx2d>;

/// 按 4-相邻规则获取掩膜中的所有前景区域, 区域按首个像素的行优先序排列.
pub fn areas_2d(mask: ArrayView2<bool>) -> Vec<Area2d> {
    let (len0, len1) = mask.dim();
    let mut seen = Array2::from_elem(mask.raw_dim(), false);
    let mut ans = Vec::new();
    let mut bfs_q = VecDeque::with_capacity(4);

    for pos in PosIter::new(mask.dim()) {
        if seen[pos] || !mask[pos] {
            continue;
        }
        seen[pos] = true;
        bfs_q.push_back(pos);
        let mut this_area = Area2d::with_capacity(1);
        while let Some(cur_pos) = bfs_q.pop_front() {
            this_area.push(cur_pos);
            let (a, b) = cur_pos;
            let neighbours = [
                (a.wrapping_sub(1), b),
                (a + 1, b),
                (a, b.wrapping_sub(1)),
                (a, b + 1),
            ];
            for n in neighbours {
                if n.0 < len0 && n.1 < len1 && mask[n] && !seen[n] {
                    seen[n] = true;
                    bfs_q.push_back(n);
                }
            }
        }
        ans.push(this_area);
    }
    ans
}

/// 去除面积 (像素数) 小于 `min_size` 的 4-连通前景区域.
pub fn remove_small_objects_2d(mask: ArrayView2<bool>, min_size: usize) -> Array2<bool> {
    let mut out = Array2::from_elem(mask.raw_dim(), false);
    for area in areas_2d(mask).into_iter().filter(|a| a.len() >= min_size) {
        for pos in area {
            out[pos] = true;
        }
    }
    out
}

/// 平移 `d` 后源区间与目标区间的重叠部分, 满足 `dst[i] = src[i + d]`.
#[inline]
fn shifted(d: isize, len: usize) -> Option<(Range<usize>, Range<usize>)> {
    let len = len as isize;
    let dst = 0isize.max(-d)..len.min(len - d);
    (dst.start < dst.end).then(|| {
        let src = (dst.start + d) as usize..(dst.end + d) as usize;
        (src, dst.start as usize..dst.end as usize)
    })
}

/// 二值膨胀: `out[p] = any(mask[p - d])`, 图像外视为背景.
pub fn dilate_2d(mask: ArrayView2<bool>, element: &Element2d) -> Array2<bool> {
    let (len0, len1) = mask.dim();
    let mut out = Array2::from_elem(mask.raw_dim(), false);
    for &(d0, d1) in element.offsets() {
        let (Some((s0, t0)), Some((s1, t1))) = (shifted(-d0, len0), shifted(-d1, len1)) else {
            continue;
        };
        Zip::from(out.slice_mut(s![t0, t1]))
            .and(mask.slice(s![s0, s1]))
            .for_each(|o, &m| *o |= m);
    }
    out
}

/// 二值腐蚀: `out[p] = all(mask[p + d])`. 图像外的像素取 `border`.
pub fn erode_2d(mask: ArrayView2<bool>, element: &Element2d, border: bool) -> Array2<bool> {
    let (len0, len1) = mask.dim();
    let mut out = Array2::from_elem(mask.raw_dim(), true);
    for &(d0, d1) in element.offsets() {
        match (shifted(d0, len0), shifted(d1, len1)) {
            (Some((s0, t0)), Some((s1, t1))) => {
                if !border {
                    // 窗口越界的位置直接置为背景.
                    out.slice_mut(s![..t0.start, ..]).fill(false);
                    out.slice_mut(s![t0.end.., ..]).fill(false);
                    out.slice_mut(s![.., ..t1.start]).fill(false);
                    out.slice_mut(s![.., t1.end..]).fill(false);
                }
                Zip::from(out.slice_mut(s![t0, t1]))
                    .and(mask.slice(s![s0, s1]))
                    .for_each(|o, &m| *o &= m);
            }
            _ if !border => out.fill(false),
            _ => {}
        }
    }
    out
}

/// 二值闭运算 (先膨胀后腐蚀). 腐蚀时图像外视为前景, 因此贴边的前景不会被侵蚀.
pub fn closing_2d(mask: ArrayView2<bool>, element: &Element2d) -> Array2<bool> {
    let dilated = dilate_2d(mask, element);
    erode_2d(dilated.view(), element, true)
}
