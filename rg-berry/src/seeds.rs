//! 种子选择方法: 最大掩膜切片、连通分量质心、分量内随机采样.

use itertools::Itertools;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::consts::gray::{is_background, is_foreground};
use crate::consts::params::SEED_RNG;
use crate::{Area2d, CtMask, Idx2d, Idx3d, MaskSlice};

/// 找出体积中前景像素最多的水平切片索引.
///
/// 输入应为阈值化后的掩膜体积. 若阈值带以肝脏的典型灰度为中心,
/// 选出的切片大概率含有一个显著的肝脏截面. 并列时取最先出现者.
pub fn find_biggest_mask(mask: &CtMask) -> usize {
    let mut biggest_area = 0usize;
    let mut biggest_idx = 0usize;
    for (idx, sli) in mask.slice_iter().enumerate() {
        let area = sli.count_nonzero();
        if area > biggest_area {
            biggest_area = area;
            biggest_idx = idx;
        }
    }
    biggest_idx
}

/// 一个连通分量的统计行, 形如 cv 惯例的 \[left, top, width, height, area\].
struct CompStats {
    left: usize,
    top: usize,
    width: usize,
    height: usize,
    area: usize,
    sum_h: usize,
    sum_w: usize,
}

impl CompStats {
    fn of(pixels: &[Idx2d]) -> Self {
        let mut min_h = usize::MAX;
        let mut min_w = usize::MAX;
        let mut max_h = 0usize;
        let mut max_w = 0usize;
        let mut sum_h = 0usize;
        let mut sum_w = 0usize;
        for &(h, w) in pixels {
            min_h = min_h.min(h);
            min_w = min_w.min(w);
            max_h = max_h.max(h);
            max_w = max_w.max(w);
            sum_h += h;
            sum_w += w;
        }
        if pixels.is_empty() {
            // 空行: 全零统计.
            (min_h, min_w) = (0, 0);
        }
        Self {
            left: min_w,
            top: min_h,
            width: if pixels.is_empty() { 0 } else { max_w - min_w + 1 },
            height: if pixels.is_empty() { 0 } else { max_h - min_h + 1 },
            area: pixels.len(),
            sum_h,
            sum_w,
        }
    }

    /// 统计行的最大分量.
    fn max_stat(&self) -> usize {
        *[self.left, self.top, self.width, self.height, self.area]
            .iter()
            .max()
            .unwrap()
    }

    /// 质心, 向下取整到整数索引. 分量必须非空, 否则程序 panic.
    fn centroid(&self) -> Idx2d {
        assert!(self.area > 0, "空分量没有质心");
        (self.sum_h / self.area, self.sum_w / self.area)
    }
}

/// 对切片做 4-邻接连通分量标注. 行 0 为整个背景像素集
/// (cv 惯例, 背景不拆分), 其余行为各前景分量.
fn labelled_rows(sli: &MaskSlice) -> Vec<Area2d> {
    let mut rows = vec![sli.positions(is_background)];
    rows.extend(sli.areas(is_foreground));
    rows
}

/// 次大统计量启发式: 返回统计行最大分量第二大的行索引.
///
/// 背景行通常拥有最大的统计值 (其面积覆盖体幅的大部分),
/// 肝脏分量居次, 因此 "第二大" 即假定的肝脏. 行数不足 2 时程序 panic.
fn second_largest_row(rows: &[Area2d]) -> usize {
    assert!(rows.len() >= 2, "切片上连通分量不足, 无法定位肝脏分量");
    let order: Vec<usize> = (0..rows.len())
        .sorted_by_key(|&i| (CompStats::of(&rows[i]).max_stat(), i))
        .collect();
    order[order.len() - 2]
}

/// 求假定肝脏分量的质心.
///
/// 对给定切片做 4-邻接连通分量标注, 以次大统计量启发式选出肝脏分量,
/// 返回其质心 (高, 宽). 该像素将作为区域生长的初始种子.
///
/// 如果切片上连通分量不足 2 个, 或选中分量为空, 则程序 panic.
pub fn find_centroid(mask: &CtMask, slice_idx: usize) -> Idx2d {
    let sli = mask.slice_at(slice_idx);
    let rows = labelled_rows(&sli);
    let liver = second_largest_row(&rows);
    CompStats::of(&rows[liver]).centroid()
}

/// 从切片的假定肝脏分量中做不放回随机采样.
///
/// 采样使用固定种子 ([`SEED_RNG`]) 的 `StdRng`, 保证结果可复现;
/// 候选像素按行优先顺序排列后抽取.
///
/// 如果肝脏分量的像素数少于 `number_of_pixels`, 则程序 panic.
pub fn pick_random_pixels(mask: &CtMask, slice_idx: usize, number_of_pixels: usize) -> Vec<Idx2d> {
    let sli = mask.slice_at(slice_idx);
    let rows = labelled_rows(&sli);
    let liver = second_largest_row(&rows);

    let mut pixels = rows[liver].clone();
    pixels.sort_unstable();
    assert!(
        pixels.len() >= number_of_pixels,
        "肝脏分量只有 {} 个像素, 少于请求的 {number_of_pixels} 个",
        pixels.len()
    );

    let mut rng = StdRng::seed_from_u64(SEED_RNG);
    rand::seq::index::sample(&mut rng, pixels.len(), number_of_pixels)
        .iter()
        .map(|i| pixels[i])
        .collect()
}

/// 将二维采样点提升为三维种子列表.
pub fn create_seed_list(pixels: &[Idx2d], slice_idx: usize) -> Vec<Idx3d> {
    pixels.iter().map(|&(h, w)| (slice_idx, h, w)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    /// 3 层合成体积: 第 1 层有一个明显大于其他层的前景矩形.
    fn synthetic_stack() -> CtMask {
        let mut data = Array3::<u8>::zeros((3, 32, 32));
        data[(0, 5, 5)] = 1;
        for h in 8..24 {
            for w in 4..20 {
                data[(1, h, w)] = 1;
            }
        }
        for h in 10..14 {
            for w in 10..14 {
                data[(2, h, w)] = 1;
            }
        }
        CtMask::fake(data, [1.0, 1.0, 1.0])
    }

    #[test]
    fn test_find_biggest_mask_unique_maximum() {
        assert_eq!(find_biggest_mask(&synthetic_stack()), 1);
    }

    #[test]
    fn test_find_biggest_mask_tie_first_occurrence() {
        let mut data = Array3::<u8>::zeros((3, 4, 4));
        data[(1, 1, 1)] = 1;
        data[(2, 2, 2)] = 1;
        let mask = CtMask::fake(data, [1.0, 1.0, 1.0]);
        assert_eq!(find_biggest_mask(&mask), 1);
    }

    #[test]
    fn test_find_centroid_inside_rectangle() {
        let mask = synthetic_stack();
        let (h, w) = find_centroid(&mask, 1);
        assert!((8..24).contains(&h));
        assert!((4..20).contains(&w));
        // 矩形的精确质心: 行 (8+23)/2, 列 (4+19)/2, 向下取整.
        assert_eq!((h, w), (15, 11));
    }

    #[test]
    #[should_panic]
    fn test_find_centroid_needs_two_components() {
        // 全背景切片只有背景行, 行数为 1.
        let data = Array3::<u8>::zeros((1, 4, 4));
        let mask = CtMask::fake(data, [1.0, 1.0, 1.0]);
        let _ = find_centroid(&mask, 0);
    }

    #[test]
    fn test_pick_random_pixels_deterministic_membership() {
        let mask = synthetic_stack();
        let picked = pick_random_pixels(&mask, 1, 30);
        assert_eq!(picked.len(), 30);
        for &(h, w) in &picked {
            assert!((8..24).contains(&h) && (4..20).contains(&w));
        }
        // 固定 RNG 种子: 两次运行结果一致.
        assert_eq!(picked, pick_random_pixels(&mask, 1, 30));
        // 不放回: 无重复.
        let unique: std::collections::HashSet<_> = picked.iter().collect();
        assert_eq!(unique.len(), 30);
    }

    #[test]
    #[should_panic]
    fn test_pick_random_pixels_too_few() {
        let mask = synthetic_stack();
        // 第 2 层的分量只有 16 个像素.
        let _ = pick_random_pixels(&mask, 2, 30);
    }

    #[test]
    fn test_create_seed_list_lifts_slice_index() {
        let seeds = create_seed_list(&[(3, 4), (5, 6)], 7);
        assert_eq!(seeds, vec![(7, 3, 4), (7, 5, 6)]);
    }
}
