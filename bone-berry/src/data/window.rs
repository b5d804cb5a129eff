/// 显示用的 CT 灰度窗. 窗位 `level`, 窗宽 `width`, 对应 HU 区间
/// `[level - width / 2, level + width / 2]`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CtWindow {
    level: f32,
    width: f32,
}

impl CtWindow {
    /// 骨窗 (L 400, W 1800), 叠加图的底图使用该窗.
    #[inline]
    pub const fn from_bone_visual() -> CtWindow {
        Self {
            level: 400.0,
            width: 1800.0,
        }
    }

    /// 窗下限, 低于它的 HU 值映射为黑色.
    #[inline]
    pub fn lower_bound(&self) -> f32 {
        self.level - self.width * 0.5
    }

    /// 同 [`CtWindow::eval_f32`], 结果向下取整为灰度值.
    pub fn eval(&self, ct: f32) -> Option<u8> {
        self.eval_f32(ct).map(|v| v as u8)
    }

    /// 把 HU 值线性映射到 `[0.0, 255.0]`. 非有限值返回 `None`.
    pub fn eval_f32(&self, ct: f32) -> Option<f32> {
        ct.is_finite()
            .then(|| ((ct - self.lower_bound()) / self.width * 255.0).clamp(0.0, 255.0))
    }
}
