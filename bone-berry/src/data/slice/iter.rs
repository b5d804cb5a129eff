use crate::{Idx2d, Idx3d};

/// 二维行优先索引迭代器, 用于形态学扫描切片的每个像素.
#[derive(Debug, Clone)]
pub struct PosIter {
    cur: Idx2d,
    shape: Idx2d,
}

impl PosIter {
    /// 按 `shape` 创建迭代器.
    #[inline]
    pub fn new(shape: Idx2d) -> Self {
        Self { cur: (0, 0), shape }
    }
}

impl Iterator for PosIter {
    type Item = Idx2d;

    fn next(&mut self) -> Option<Self::Item> {
        let (len0, len1) = self.shape;
        if len0 == 0 || len1 == 0 || self.cur.0 == len0 {
            return None;
        }
        let ret_pos = self.cur;
        if self.cur.1 + 1 == len1 {
            self.cur = (self.cur.0 + 1, 0);
        } else {
            self.cur.1 += 1;
        }
        Some(ret_pos)
    }
}

/// 三维行优先索引迭代器, 与 `ndarray` 标准布局的遍历顺序一致.
#[derive(Debug, Clone)]
pub struct PosIter3d {
    cur: Idx3d,
    shape: Idx3d,
}

impl PosIter3d {
    /// 按 `shape` 创建迭代器.
    #[inline]
    pub fn new(shape: Idx3d) -> Self {
        Self {
            cur: (0, 0, 0),
            shape,
        }
    }
}

impl Iterator for PosIter3d {
    type Item = Idx3d;

    fn next(&mut self) -> Option<Self::Item> {
        let (len0, len1, len2) = self.shape;
        if len0 == 0 || len1 == 0 || len2 == 0 || self.cur.0 == len0 {
            return None;
        }
        let ret_pos = self.cur;
        let (a, b, c) = &mut self.cur;
        *c += 1;
        if *c == len2 {
            *c = 0;
            *b += 1;
            if *b == len1 {
                *b = 0;
                *a += 1;
            }
        }
        Some(ret_pos)
    }
}
