//! 置信连通区域生长.
//!
//! 从种子点出发, 以种子邻域的灰度统计量确定接纳区间
//! `mean ± multiplier * σ`, 做 6-邻接 BFS 生长; 每轮迭代后以当前分割体
//! 重新估计统计量并重新生长.

use std::collections::VecDeque;

use ndarray::Array3;

use crate::consts::gray::{MASK_BACKGROUND, MASK_FOREGROUND};
use crate::{CtMask, CtVolume, Idx3d, NiftiHeaderAttr};

/// 区域生长参数.
#[derive(Copy, Clone, Debug)]
pub struct GrowOptions {
    /// 接纳区间的标准差倍率. 必须为正. 经典取值为 2.5.
    pub multiplier: f64,

    /// 初始统计量的立方邻域半径. 0 代表只统计种子体素本身.
    pub initial_radius: usize,

    /// 统计量细化迭代轮数. 0 代表只做初始生长.
    pub iterations: u32,
}

/// 获得 `(z, h, w)` 的 6-邻居索引. 不检查越界.
#[inline]
fn neighbour6((z, h, w): Idx3d) -> [Idx3d; 6] {
    [
        (z.wrapping_sub(1), h, w),
        (z.saturating_add(1), h, w),
        (z, h.wrapping_sub(1), w),
        (z, h.saturating_add(1), w),
        (z, h, w.wrapping_sub(1)),
        (z, h, w.saturating_add(1)),
    ]
}

/// 在线均值/方差累加器.
#[derive(Default)]
struct Moments {
    count: u64,
    sum: f64,
    sum_sq: f64,
}

impl Moments {
    #[inline]
    fn push(&mut self, v: f64) {
        self.count += 1;
        self.sum += v;
        self.sum_sq += v * v;
    }

    /// `(均值, 总体标准差)`. 累加器必须非空.
    fn mean_std(&self) -> (f64, f64) {
        debug_assert!(self.count > 0);
        let mean = self.sum / self.count as f64;
        let var = (self.sum_sq / self.count as f64 - mean * mean).max(0.0);
        (mean, var.sqrt())
    }
}

/// 从种子列表做置信连通区域生长, 返回二值掩膜.
///
/// # 注意
///
/// 1. `seeds` 必须非空且全部位于体积内, 否则程序 panic.
/// 2. `opt.multiplier` 必须为正, 否则程序 panic.
/// 3. 灰度落在接纳区间之外的种子不会被纳入分割体, 与其相连的区域也不会生长.
pub fn confidence_connected(vol: &CtVolume, seeds: &[Idx3d], opt: &GrowOptions) -> CtMask {
    assert!(!seeds.is_empty(), "种子列表不能为空");
    assert!(opt.multiplier > 0.0, "倍率必须为正");
    for seed in seeds {
        assert!(vol.check(seed), "种子 {seed:?} 越界");
    }

    let (mean, std) = seed_neighbourhood_moments(vol, seeds, opt.initial_radius).mean_std();
    let mut mask = flood(vol, seeds, mean, std, opt.multiplier);

    for _ in 0..opt.iterations {
        let mut m = Moments::default();
        for (pos, &flag) in mask.indexed_iter() {
            if flag == MASK_FOREGROUND {
                m.push(vol[pos] as f64);
            }
        }
        if m.count == 0 {
            // 上一轮没有接纳任何体素, 细化无从谈起.
            break;
        }
        let (mean, std) = m.mean_std();
        mask = flood(vol, seeds, mean, std, opt.multiplier);
    }

    CtMask::with_header_of(vol, mask)
}

/// 统计所有种子的立方邻域 (半径 `radius`, 截断到体积内) 灰度矩.
fn seed_neighbourhood_moments(vol: &CtVolume, seeds: &[Idx3d], radius: usize) -> Moments {
    let (z_len, h_len, w_len) = vol.shape();
    let r = radius as isize;
    let mut m = Moments::default();
    for &(z, h, w) in seeds {
        for dz in -r..=r {
            for dh in -r..=r {
                for dw in -r..=r {
                    let zi = z as isize + dz;
                    let hi = h as isize + dh;
                    let wi = w as isize + dw;
                    if zi < 0 || hi < 0 || wi < 0 {
                        continue;
                    }
                    let (zi, hi, wi) = (zi as usize, hi as usize, wi as usize);
                    if zi >= z_len || hi >= h_len || wi >= w_len {
                        continue;
                    }
                    m.push(vol[(zi, hi, wi)] as f64);
                }
            }
        }
    }
    m
}

/// 以 `[mean - k*std, mean + k*std]` 为接纳区间, 从种子做 6-邻接 BFS.
fn flood(vol: &CtVolume, seeds: &[Idx3d], mean: f64, std: f64, multiplier: f64) -> Array3<u8> {
    let lower = (mean - multiplier * std) as f32;
    let upper = (mean + multiplier * std) as f32;
    let accept = |v: f32| (lower..=upper).contains(&v);

    let (z_len, h_len, w_len) = vol.shape();
    let in_bounds = |(z, h, w): &Idx3d| *z < z_len && *h < h_len && *w < w_len;

    let mut mask = Array3::<u8>::from_elem((z_len, h_len, w_len), MASK_BACKGROUND);
    let mut q: VecDeque<Idx3d> = VecDeque::new();

    for &seed in seeds {
        if mask[seed] == MASK_BACKGROUND && accept(vol[seed]) {
            mask[seed] = MASK_FOREGROUND;
            q.push_back(seed);
        }
    }

    while let Some(cur) = q.pop_front() {
        for neigh in neighbour6(cur) {
            if in_bounds(&neigh) && mask[neigh] == MASK_BACKGROUND && accept(vol[neigh]) {
                mask[neigh] = MASK_FOREGROUND;
                q.push_back(neigh);
            }
        }
    }
    mask
}
