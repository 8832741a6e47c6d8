//! 第二阶段: 多种子区域生长.
//!
//! 以第一阶段掩膜约束并增强原体积, 在腐蚀后的掩膜内部随机采样种子,
//! 从全部种子重新生长出更紧致的分割.

use super::{StageOne, StageTwo};
use crate::consts::params::*;
use crate::growing::{self, GrowOptions};
use crate::{filters, seeds, CtVolume};

/// 运行第二阶段流水线.
///
/// 原体积: 均值模糊 → 以第一阶段掩膜做掩膜滤波 → 直方图均衡.
/// 种子: 腐蚀第一阶段掩膜后, 在其种子切片上随机采样
/// [`SEED_COUNT`] 个像素. 生长后做开运算, 再以精化掩膜约束原体积.
pub fn run(input: &CtVolume, first: &StageOne) -> StageTwo {
    let vol = filters::mean_filter(input, STAGE2_MEAN_RADIUS);
    let vol = filters::mask_filter(&vol, &first.mask);
    let vol = filters::histogram_equalization(&vol);

    let eroded = filters::erode(&first.mask, STAGE2_ERODE_RADIUS, STAGE2_ERODE_ITERS);
    let picked = seeds::pick_random_pixels(&eroded, first.seed_slice, SEED_COUNT);
    let seed_list = seeds::create_seed_list(&picked, first.seed_slice);

    let mask = growing::confidence_connected(
        &vol,
        &seed_list,
        &GrowOptions {
            multiplier: GROW_MULTIPLIER,
            initial_radius: STAGE2_GROW_RADIUS,
            iterations: GROW_ITERATIONS,
        },
    );
    let mask = filters::binary_opening(&mask, STAGE2_OPENING_RADIUS);

    let volume = filters::mask_filter(input, &mask);
    StageTwo { volume, mask }
}
