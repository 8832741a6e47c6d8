//! 两阶段提取流水线.
//!
//! 第一阶段 ([`one_seed`]) 以单种子完成粗分割, 第二阶段 ([`multi_seed`])
//! 在粗分割内部重新采样种子并生长出更紧致的掩膜. 各步骤的经验参数见
//! [`crate::consts::params`].

use crate::{CtMask, CtVolume, Idx2d};

pub mod multi_seed;
pub mod one_seed;

/// 第一阶段 (单种子区域生长) 的输出.
#[derive(Debug)]
pub struct StageOne {
    /// 形态学清理后的粗分割掩膜.
    pub mask: CtMask,

    /// 前景最多的切片索引, 第二阶段在该切片上采样种子.
    pub seed_slice: usize,

    /// 假定肝脏分量的质心, 即第一阶段的生长种子.
    pub centroid: Idx2d,
}

/// 第二阶段 (多种子区域生长) 的输出.
#[derive(Debug)]
pub struct StageTwo {
    /// 以精化掩膜约束原体积得到的灰度分割.
    pub volume: CtVolume,

    /// 精化后的二值掩膜.
    pub mask: CtMask,
}
