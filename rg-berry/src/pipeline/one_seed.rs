//! 第一阶段: 单种子区域生长.
//!
//! 先在裁剪、模糊、阈值化后的体积上启发式定位肝脏质心,
//! 再对对比度增强后的原体积从该单一种子生长, 最后做形态学清理.

use super::StageOne;
use crate::consts::gray::{MASK_BACKGROUND, MASK_FOREGROUND};
use crate::consts::params::*;
use crate::growing::{self, GrowOptions};
use crate::{filters, seeds, CtVolume, Idx2d};

/// 定位生长种子.
///
/// 裁掉体积的右半幅 (肝脏主要位于病人右侧) → 均值模糊 → 粗阈值化 →
/// 选前景最多的切片 → 求肝脏分量质心.
///
/// # 返回值
///
/// `(切片索引, 质心)`. 裁剪只缩短宽度方向, 因此质心坐标在原体积中依然有效.
pub fn locate_seed(input: &CtVolume) -> (usize, Idx2d) {
    let vol = filters::crop_right_half(input);
    let vol = filters::mean_filter(&vol, STAGE1_MEAN_RADIUS);
    let coarse = filters::threshold(
        &vol,
        THRESHOLD_LOWER,
        THRESHOLD_UPPER,
        MASK_FOREGROUND,
        MASK_BACKGROUND,
    );

    let slice_idx = seeds::find_biggest_mask(&coarse);
    let centroid = seeds::find_centroid(&coarse, slice_idx);
    (slice_idx, centroid)
}

/// 运行第一阶段流水线.
///
/// 对原体积: 均值模糊 → 以质心为基准做 sigmoid 对比度增强 → 直方图均衡 →
/// 从单种子做置信连通生长 → 开运算 → 重建闭运算 → 闭运算.
pub fn run(input: &CtVolume) -> StageOne {
    let (seed_slice, centroid) = locate_seed(input);
    let seed = (seed_slice, centroid.0, centroid.1);

    let vol = filters::mean_filter(input, STAGE1_MEAN_RADIUS);
    let vol = filters::sigmoid_filter(&vol, seed_slice, centroid);
    let vol = filters::histogram_equalization(&vol);

    let mask = growing::confidence_connected(
        &vol,
        &[seed],
        &GrowOptions {
            multiplier: GROW_MULTIPLIER,
            initial_radius: STAGE1_GROW_RADIUS,
            iterations: GROW_ITERATIONS,
        },
    );

    let mask = filters::binary_opening(&mask, STAGE1_OPENING_RADIUS);
    let mask = filters::binary_closing_br(&mask, STAGE1_CLOSING_BR_RADIUS);
    let mask = filters::binary_closing(&mask, STAGE1_CLOSING_RADIUS);

    StageOne {
        mask,
        seed_slice,
        centroid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NiftiHeaderAttr;
    use ndarray::Array3;

    /// 7 层合成体积: 左半幅有一个亮矩形柱体, 跨第 2..5 层.
    ///
    /// 半径 2 的三维均值模糊会把单层矩形摊薄到阈值带之外,
    /// 因此矩形需要有一定的 z 向厚度; 摊薄后第 2 层是首个在带内的切片.
    fn synthetic_volume() -> CtVolume {
        let mut data = Array3::<f32>::zeros((7, 64, 64));
        for z in 2..5 {
            for h in 20..40 {
                for w in 8..28 {
                    data[(z, h, w)] = 120.0;
                }
            }
        }
        CtVolume::fake(data, [1.0, 1.0, 1.0])
    }

    #[test]
    fn test_locate_seed_selects_rectangle_slice() {
        let (slice_idx, (h, w)) = locate_seed(&synthetic_volume());
        assert!((2..5).contains(&slice_idx), "切片 {slice_idx} 不在矩形柱体内");
        assert!((20..40).contains(&h), "质心行 {h} 不在矩形内");
        assert!((8..28).contains(&w), "质心列 {w} 不在矩形内");
    }

    #[test]
    fn test_run_produces_binary_mask_of_same_shape() {
        let input = synthetic_volume();
        let out = run(&input);
        assert_eq!(out.mask.shape(), input.shape());
        assert!((2..5).contains(&out.seed_slice));
        assert!(out.mask.data().iter().all(|&p| p <= 1));
    }
}
