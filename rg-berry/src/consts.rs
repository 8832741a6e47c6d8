//! 通用常量.

/// 单通道颜色与标签值.
pub mod gray {
    /// 真值标注中, 背景的像素值.
    pub const GT_BACKGROUND: u8 = 0;

    /// 真值标注中, 健康肝脏组织的像素值.
    pub const GT_LIVER: u8 = 1;

    /// 真值标注中, 肿瘤的像素值.
    pub const GT_TUMOR: u8 = 2;

    /// 二值掩膜的前景值.
    pub const MASK_FOREGROUND: u8 = 1;

    /// 二值掩膜的背景值.
    pub const MASK_BACKGROUND: u8 = 0;

    /// 单通道黑色.
    pub const BLACK: u8 = 0b_0000_0000;

    /// 单通道亮灰色.
    pub const LIGHT_GRAY: u8 = 0b_1100_0000;

    /// 单通道白色.
    pub const WHITE: u8 = 0b_1111_1111;

    /// 像素是否是背景?
    #[inline]
    pub const fn is_background(p: u8) -> bool {
        matches!(p, GT_BACKGROUND)
    }

    /// 像素是否是前景 (非背景)?
    #[inline]
    pub const fn is_foreground(p: u8) -> bool {
        !is_background(p)
    }

    /// 像素是否是健康肝脏组织?
    #[inline]
    pub const fn is_liver(p: u8) -> bool {
        matches!(p, GT_LIVER)
    }
}

/// 流水线经验参数.
///
/// 这些取值均为手工调定, 是可调参数而非契约.
pub mod params {
    /// 粗阈值化的下界 (HU).
    pub const THRESHOLD_LOWER: f32 = 60.0;

    /// 粗阈值化的上界 (HU).
    pub const THRESHOLD_UPPER: f32 = 130.0;

    /// 第一阶段均值滤波半径.
    pub const STAGE1_MEAN_RADIUS: usize = 2;

    /// 第二阶段均值滤波半径.
    pub const STAGE2_MEAN_RADIUS: usize = 3;

    /// 置信连通生长的标准差倍率. 经典取值.
    pub const GROW_MULTIPLIER: f64 = 2.5;

    /// 第一阶段生长的初始邻域半径.
    pub const STAGE1_GROW_RADIUS: usize = 2;

    /// 第二阶段生长的初始邻域半径. 0 代表只用种子体素本身做统计.
    pub const STAGE2_GROW_RADIUS: usize = 0;

    /// 两阶段生长的迭代轮数. 0 代表只做初始生长.
    pub const GROW_ITERATIONS: u32 = 0;

    /// 第一阶段开运算半径.
    pub const STAGE1_OPENING_RADIUS: usize = 2;

    /// 第一阶段重建闭运算半径.
    pub const STAGE1_CLOSING_BR_RADIUS: usize = 10;

    /// 第一阶段普通闭运算半径.
    pub const STAGE1_CLOSING_RADIUS: usize = 3;

    /// 第二阶段掩膜腐蚀半径.
    pub const STAGE2_ERODE_RADIUS: usize = 1;

    /// 第二阶段掩膜腐蚀迭代次数.
    pub const STAGE2_ERODE_ITERS: u32 = 3;

    /// 第二阶段开运算半径.
    pub const STAGE2_OPENING_RADIUS: usize = 2;

    /// 第二阶段随机种子个数.
    pub const SEED_COUNT: usize = 30;

    /// 随机采样使用的固定 RNG 种子, 保证结果可复现.
    pub const SEED_RNG: u64 = 9;

    /// sigmoid 对比度增强的 ROI 边长.
    pub const SIGMOID_ROI_EDGE: usize = 20;
}
