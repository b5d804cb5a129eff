use once_cell::sync::Lazy;
use std::borrow::Cow;

/// 二维结构元素, 以相对于中心的偏移量 `(dx, dz)` 集合表示.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element2d {
    offsets: Vec<(isize, isize)>,
}

/// 默认的闭运算圆盘 (半径 2, 共 13 个像素).
static DISK_R2: Lazy<Element2d> = Lazy::new(|| Element2d::disk(2));

impl Element2d {
    /// 半径为 `radius` 的离散圆盘: 所有满足 `dx^2 + dz^2 <= radius^2` 的偏移量.
    pub fn disk(radius: usize) -> Self {
        let r = radius as isize;
        let offsets = (-r..=r)
            .flat_map(|dx| (-r..=r).map(move |dz| (dx, dz)))
            .filter(|(dx, dz)| dx * dx + dz * dz <= r * r)
            .collect();
        Self { offsets }
    }

    /// 获取半径为 `radius` 的圆盘. 常用半径会复用缓存.
    pub fn cached_disk(radius: usize) -> Cow<'static, Element2d> {
        if radius == 2 {
            Cow::Borrowed(&*DISK_R2)
        } else {
            Cow::Owned(Self::disk(radius))
        }
    }

    /// 所有偏移量.
    #[inline]
    pub fn offsets(&self) -> &[(isize, isize)] {
        &self.offsets
    }

    /// 偏移量个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// 是否为空元素?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

/// 三维盒形 (全 1) 结构元素, 边长按 `(X, Y, Z)` 组织.
///
/// 偶数边长时中心的约定如下: 膨胀窗口覆盖 `[-(k-1)/2, k-1-(k-1)/2]`,
/// 腐蚀窗口覆盖 `[-k/2, k-1-k/2]`. 奇数边长时两者相同且对称.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BoxElement {
    size: [usize; 3],
}

impl BoxElement {
    /// 创建盒形结构元素. 每一维长度至少为 1, 否则程序 panic.
    pub fn new(size: [usize; 3]) -> Self {
        assert!(size.iter().all(|k| *k >= 1), "结构元素边长至少为 1");
        Self { size }
    }

    /// 边长为 `k` 的立方体.
    #[inline]
    pub fn cube(k: usize) -> Self {
        Self::new([k; 3])
    }

    /// 三个维度上的边长.
    #[inline]
    pub fn size(&self) -> [usize; 3] {
        self.size
    }

    /// 是否为单体素 (恒等) 元素?
    #[inline]
    pub fn is_identity(&self) -> bool {
        self.size == [1; 3]
    }

    /// 膨胀时在 `axis` 上向后/向前覆盖的体素数.
    #[inline]
    pub(crate) fn dilation_reach(&self, axis: usize) -> (usize, usize) {
        let k = self.size[axis];
        let back = (k - 1) / 2;
        (back, k - 1 - back)
    }

    /// 腐蚀时在 `axis` 上向后/向前覆盖的体素数.
    #[inline]
    pub(crate) fn erosion_reach(&self, axis: usize) -> (usize, usize) {
        let k = self.size[axis];
        let back = k / 2;
        (back, k - 1 - back)
    }
}
