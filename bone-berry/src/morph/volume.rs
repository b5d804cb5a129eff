//! 体数据上的二值形态学操作. 连通性均按 6-邻接 (钻石邻接) 计算.

use super::BoxElement;
use crate::data::slice::PosIter3d;
use crate::Idx3d;
use ndarray::{Array3, ArrayView1, ArrayView3, ArrayViewMut1, Axis, Zip};
use std::collections::VecDeque;

/// 一个 6-连通区域的所有体素索引.
pub type Area3d = Vec<Idx3d>;

/// 获取 `pos` 前后上下左右六个点的坐标. 不检查越界, 越界坐标会在下游被过滤掉.
#[inline]
fn diamond_neighbours((x, y, z): Idx3d) -> [Idx3d; 6] {
    [
        (x.wrapping_sub(1), y, z),
        (x + 1, y, z),
        (x, y.wrapping_sub(1), z),
        (x, y + 1, z),
        (x, y, z.wrapping_sub(1)),
        (x, y, z + 1),
    ]
}

/// 检查索引是否在 `shape` 范围内.
#[inline]
fn within((x, y, z): Idx3d, (lx, ly, lz): Idx3d) -> bool {
    x < lx && y < ly && z < lz
}

/// 从 `seeds` 出发, 在满足 `mask[p] == value` 的体素上做 6-邻接广度优先搜索,
/// 将所有访问到的体素在 `seen` 中标记, 返回本次访问的体素.
fn flood(
    mask: ArrayView3<bool>,
    value: bool,
    seen: &mut Array3<bool>,
    seeds: impl IntoIterator<Item = Idx3d>,
) -> Area3d {
    let shape = mask.dim();
    let mut bfs_q: VecDeque<Idx3d> = VecDeque::new();
    for s in seeds {
        if mask[s] == value && !seen[s] {
            seen[s] = true;
            bfs_q.push_back(s);
        }
    }
    let mut area = Area3d::with_capacity(bfs_q.len());
    while let Some(cur) = bfs_q.pop_front() {
        area.push(cur);
        for n in diamond_neighbours(cur) {
            if within(n, shape) && mask[n] == value && !seen[n] {
                seen[n] = true;
                bfs_q.push_back(n);
            }
        }
    }
    area
}

/// 按 6-相邻规则获取体数据中的所有前景区域, 区域按首个体素的行优先序排列.
pub fn areas_3d(mask: ArrayView3<bool>) -> Vec<Area3d> {
    let mut seen = Array3::from_elem(mask.raw_dim(), false);
    let mut ans = Vec::new();
    for pos in PosIter3d::new(mask.dim()) {
        if mask[pos] && !seen[pos] {
            ans.push(flood(mask, true, &mut seen, [pos]));
        }
    }
    ans
}

/// 去除体积 (体素数) 小于 `min_size` 的 6-连通前景区域.
pub fn remove_small_objects_3d(mask: ArrayView3<bool>, min_size: usize) -> Array3<bool> {
    let mut out = Array3::from_elem(mask.raw_dim(), false);
    for area in areas_3d(mask).into_iter().filter(|a| a.len() >= min_size) {
        for pos in area {
            out[pos] = true;
        }
    }
    out
}

/// 填充前景中的空洞: 所有不能经 6-邻接背景路径到达体数据表面的背景体素都被置为前景.
pub fn fill_holes_3d(mask: ArrayView3<bool>) -> Array3<bool> {
    let (lx, ly, lz) = mask.dim();
    let on_surface = |(x, y, z): &Idx3d| {
        x + 1 == lx || y + 1 == ly || z + 1 == lz || *x == 0 || *y == 0 || *z == 0
    };

    let mut exterior = Array3::from_elem(mask.raw_dim(), false);
    flood(
        mask,
        false,
        &mut exterior,
        PosIter3d::new(mask.dim()).filter(on_surface),
    );

    let mut out = mask.to_owned();
    Zip::from(&mut out)
        .and(&exterior)
        .for_each(|o, &ext| *o = !ext);
    out
}

/// 单轴滑窗方式.
#[derive(Copy, Clone, Debug)]
enum Sweep {
    /// 窗口内存在前景即为前景. 体数据外视为背景.
    Any,

    /// 窗口内全为前景才为前景. 体数据外的体素取 `border`.
    All { border: bool },
}

/// 对单条一维 lane 做滑窗. 第 `i` 个输出的窗口为 `[i - back, i + fwd]`.
fn sweep_lane(
    src: ArrayView1<bool>,
    mut dst: ArrayViewMut1<bool>,
    (back, fwd): (usize, usize),
    mode: Sweep,
) {
    let n = src.len();
    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0usize);
    for &v in src.iter() {
        let last = prefix[prefix.len() - 1];
        prefix.push(last + v as usize);
    }

    for (i, out) in dst.iter_mut().enumerate() {
        let lo = i.saturating_sub(back);
        let hi = (i + fwd).min(n - 1);
        let hits = prefix[hi + 1] - prefix[lo];
        *out = match mode {
            Sweep::Any => hits > 0,
            Sweep::All { border } => {
                let clipped = i < back || i + fwd >= n;
                hits == hi + 1 - lo && (border || !clipped)
            }
        };
    }
}

/// 沿 `axis` 对整个体数据做滑窗.
fn sweep_axis(mask: ArrayView3<bool>, axis: usize, reach: (usize, usize), mode: Sweep) -> Array3<bool> {
    let mut out = Array3::from_elem(mask.raw_dim(), false);
    if reach == (0, 0) || mask.is_empty() {
        out.assign(&mask);
        return out;
    }

    let zip = Zip::from(mask.lanes(Axis(axis))).and(out.lanes_mut(Axis(axis)));
    let op = |src: ArrayView1<bool>, dst: ArrayViewMut1<bool>| sweep_lane(src, dst, reach, mode);
    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            zip.par_for_each(op);
        } else {
            zip.for_each(op);
        }
    }
    out
}

/// 盒形二值膨胀. 盒形元素可分解为三个方向的一维滑窗.
pub fn dilate_box(mask: ArrayView3<bool>, element: BoxElement) -> Array3<bool> {
    let x = sweep_axis(mask, 0, element.dilation_reach(0), Sweep::Any);
    let y = sweep_axis(x.view(), 1, element.dilation_reach(1), Sweep::Any);
    sweep_axis(y.view(), 2, element.dilation_reach(2), Sweep::Any)
}

/// 盒形二值腐蚀. 体数据外的体素取 `border`.
pub fn erode_box(mask: ArrayView3<bool>, element: BoxElement, border: bool) -> Array3<bool> {
    let mode = Sweep::All { border };
    let x = sweep_axis(mask, 0, element.erosion_reach(0), mode);
    let y = sweep_axis(x.view(), 1, element.erosion_reach(1), mode);
    sweep_axis(y.view(), 2, element.erosion_reach(2), mode)
}

/// 盒形二值闭运算 (先膨胀后腐蚀). 腐蚀时体数据外视为背景, 因此贴着表面的前景可能被侵蚀.
pub fn closing_box(mask: ArrayView3<bool>, element: BoxElement) -> Array3<bool> {
    let dilated = dilate_box(mask, element);
    erode_box(dilated.view(), element, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::s;

    fn count(a: &Array3<bool>) -> usize {
        a.iter().filter(|p| **p).count()
    }

    #[test]
    fn test_areas_3d() {
        let mut mask = Array3::from_elem((4, 4, 4), false);
        mask.slice_mut(s![0..2, 0..2, 0..2]).fill(true);
        // 仅与立方体共享一条棱, 不算连通.
        mask[(2, 2, 1)] = true;
        mask[(3, 3, 3)] = true;
        let areas = areas_3d(mask.view());
        assert_eq!(areas.len(), 3);
        assert_eq!(areas[0].len(), 8);
        assert_eq!(areas[1], vec![(2, 2, 1)]);

        let kept = remove_small_objects_3d(mask.view(), 2);
        assert_eq!(count(&kept), 8);
        assert!(!kept[(3, 3, 3)]);
    }

    #[test]
    fn test_fill_holes() {
        let mut mask = Array3::from_elem((7, 7, 7), false);
        mask.slice_mut(s![1..6, 1..6, 1..6]).fill(true);
        mask.slice_mut(s![2..5, 2..5, 2..5]).fill(false);
        let filled = fill_holes_3d(mask.view());
        assert_eq!(count(&filled), 125);

        // 开口的杯子不是空洞.
        let mut cup = mask.clone();
        cup.slice_mut(s![3, 3, 5..7]).fill(false);
        let filled = fill_holes_3d(cup.view());
        assert_eq!(filled, cup);
    }

    #[test]
    fn test_fill_holes_touching_surface() {
        // 贴表面的空心壳体, 内部仍是空洞.
        let mut mask = Array3::from_elem((5, 5, 5), true);
        mask[(2, 2, 2)] = false;
        assert_eq!(count(&fill_holes_3d(mask.view())), 125);
    }

    #[test]
    fn test_dilate_box_even_kernel() {
        let mut mask = Array3::from_elem((6, 6, 6), false);
        mask[(3, 3, 3)] = true;
        let out = dilate_box(mask.view(), BoxElement::new([2, 1, 4]));
        assert_eq!(count(&out), 2 * 4);
        // 偶数边长时向低索引多扩张一格.
        assert!(out[(2, 3, 3)] && out[(3, 3, 3)] && !out[(4, 3, 3)]);
        assert!(out[(3, 3, 1)] && out[(3, 3, 4)] && !out[(3, 3, 0)] && !out[(3, 3, 5)]);
    }

    #[test]
    fn test_dilate_identity() {
        let mut mask = Array3::from_elem((3, 4, 5), false);
        mask[(1, 2, 3)] = true;
        mask[(0, 0, 0)] = true;
        assert_eq!(dilate_box(mask.view(), BoxElement::cube(1)), mask);
    }

    #[test]
    fn test_erode_box_border() {
        let mask = Array3::from_elem((4, 4, 4), true);
        assert_eq!(count(&erode_box(mask.view(), BoxElement::cube(3), true)), 64);
        assert_eq!(count(&erode_box(mask.view(), BoxElement::cube(3), false)), 8);
    }

    #[test]
    fn test_closing_box() {
        let mut mask = Array3::from_elem((9, 9, 9), false);
        mask.slice_mut(s![2..7, 2..7, 2..4]).fill(true);
        mask.slice_mut(s![2..7, 2..7, 5..7]).fill(true);
        let closed = closing_box(mask.view(), BoxElement::cube(3));
        assert_eq!(count(&closed), 5 * 5 * 5);

        // 贴表面的前景会被侵蚀.
        let full = Array3::from_elem((4, 4, 4), true);
        assert_eq!(count(&closing_box(full.view(), BoxElement::cube(3))), 8);
    }
}
