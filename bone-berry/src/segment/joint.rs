//! 关节线 (股骨/胫骨分界) 定位.

use itertools::Itertools;
use ndarray::{ArrayView2, Axis};
use num::Float;
use ordered_float::NotNan;

/// 高斯核截断半径 (以标准差为单位).
const TRUNCATE: f64 = 4.0;

/// 搜索窗口长度不超过该值时, 不做极小值搜索.
const MIN_WINDOW: usize = 5;

#[inline]
fn lit<T: Float>(v: f64) -> T {
    T::from(v).unwrap_or_else(T::nan)
}

/// 对称反射 (`d c b a | a b c d | d c b a`) 方式的越界索引折返.
#[inline]
fn reflect(mut i: isize, n: isize) -> usize {
    loop {
        if i < 0 {
            i = -i - 1;
        } else if i >= n {
            i = 2 * n - i - 1;
        } else {
            return i as usize;
        }
    }
}

/// 一维高斯平滑. 核半径为 `floor(4 * sigma + 0.5)`, 边界按对称反射处理.
///
/// `sigma` 必须为正, 否则返回输入的拷贝.
pub fn gaussian_filter1d<T: Float>(input: &[T], sigma: T) -> Vec<T> {
    if input.is_empty() || !(sigma > T::zero()) {
        return input.to_vec();
    }
    let sd = sigma.to_f64().unwrap_or(0.0);
    let radius = (TRUNCATE * sd + 0.5) as isize;

    let weights: Vec<T> = (-radius..=radius)
        .map(|x| lit::<T>((-0.5 * (x * x) as f64 / (sd * sd)).exp()))
        .collect();
    let total = weights.iter().fold(T::zero(), |acc, w| acc + *w);

    let n = input.len() as isize;
    (0..n)
        .map(|i| {
            let acc = weights
                .iter()
                .zip(-radius..=radius)
                .fold(T::zero(), |acc, (w, k)| acc + *w * input[reflect(i + k, n)]);
            acc / total
        })
        .collect()
}

/// 在平滑后的密度曲线中定位关节线.
///
/// 1. 对每个 z 统计掩膜在 x 方向的前景像素数, 得到纵向密度曲线, 做高斯平滑后
///    向零截断为整数. 截断会把浅的极小值抹平为平台, 平台不算严格极小值.
/// 2. 只在 `[height / 3, 2 * height / 3)` 范围内搜索.
/// 3. 若窗口长度大于 5, 收集窗口内 (不含两端各两个点) 所有严格小于左右邻居的点,
///    取其中平滑值最小者 (并列时取最靠前的).
/// 4. 否则, 或不存在这样的点时, 返回 `height / 2`.
///
/// `mask` 形状为 `(X, Z)`, 返回值是 z 方向索引.
pub fn locate_joint(mask: ArrayView2<bool>, sigma: f64) -> usize {
    let height = mask.len_of(Axis(1));
    let profile: Vec<f64> = mask
        .axis_iter(Axis(1))
        .map(|column| column.iter().filter(|p| **p).count() as f64)
        .collect();
    // 曲线非负, 截断即向下取整.
    let smooth: Vec<f64> = gaussian_filter1d(&profile, sigma)
        .into_iter()
        .map(f64::trunc)
        .collect();

    let start = height / 3;
    let window = &smooth[start..2 * height / 3];
    if window.len() <= MIN_WINDOW {
        return height / 2;
    }

    let last = window.len() - 2;
    window
        .iter()
        .tuple_windows::<(_, _, _)>()
        .enumerate()
        .map(|(k, triple)| (k + 1, triple))
        .filter(|(j, (prev, cur, next))| (2..last).contains(j) && cur < prev && cur < next)
        .filter_map(|(j, (_, cur, _))| NotNan::new(*cur).ok().map(|v| (j, v)))
        .min_by_key(|(_, v)| *v)
        .map_or(height / 2, |(j, _)| start + j)
}
