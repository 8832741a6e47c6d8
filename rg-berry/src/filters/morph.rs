//! 形态学滤波器: 灰度腐蚀/膨胀与二值开/闭运算.
//!
//! 结构元一律为半径 `r` 的球 (体素坐标下的欧氏球). 越界邻居被忽略.

use ndarray::Array3;

use crate::{CtMask, NiftiHeaderAttr};

/// 三维偏移量.
type Offset = (isize, isize, isize);

/// 半径为 `radius` 的球结构元偏移集合 (含中心).
fn ball_offsets(radius: usize) -> Vec<Offset> {
    let r = radius as isize;
    let r2 = (radius * radius) as isize;
    let mut ans = Vec::new();
    for dz in -r..=r {
        for dh in -r..=r {
            for dw in -r..=r {
                if dz * dz + dh * dh + dw * dw <= r2 {
                    ans.push((dz, dh, dw));
                }
            }
        }
    }
    ans
}

/// 形态学基本算子.
#[derive(Copy, Clone)]
enum MorphOp {
    /// 邻域取最小.
    Erode,

    /// 邻域取最大.
    Dilate,
}

/// 对数据做一次邻域 min/max 扫描.
fn morph_pass(data: &Array3<u8>, offsets: &[Offset], op: MorphOp) -> Array3<u8> {
    let &[z_len, h_len, w_len] = data.shape() else {
        unreachable!()
    };
    let mut out = data.clone();
    for ((z, h, w), dst) in out.indexed_iter_mut() {
        let mut acc = data[(z, h, w)];
        for &(dz, dh, dw) in offsets {
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
            let v = data[(zi, hi, wi)];
            acc = match op {
                MorphOp::Erode => acc.min(v),
                MorphOp::Dilate => acc.max(v),
            };
        }
        *dst = acc;
    }
    out
}

/// 对掩膜做灰度腐蚀 (邻域最小值), 重复 `iters` 次.
///
/// 如果 `radius < 1` 则程序 panic. `iters` 为 0 时返回原掩膜的副本.
pub fn erode(mask: &CtMask, radius: usize, iters: u32) -> CtMask {
    assert!(radius >= 1, "半径必须大于等于 1");
    let offsets = ball_offsets(radius);
    let mut data = mask.data().to_owned();
    for _ in 0..iters {
        data = morph_pass(&data, &offsets, MorphOp::Erode);
    }
    CtMask::with_header_of(mask, data)
}

/// 对掩膜做灰度膨胀 (邻域最大值), 重复 `iters` 次.
///
/// 如果 `radius < 1` 则程序 panic. `iters` 为 0 时返回原掩膜的副本.
pub fn dilate(mask: &CtMask, radius: usize, iters: u32) -> CtMask {
    assert!(radius >= 1, "半径必须大于等于 1");
    let offsets = ball_offsets(radius);
    let mut data = mask.data().to_owned();
    for _ in 0..iters {
        data = morph_pass(&data, &offsets, MorphOp::Dilate);
    }
    CtMask::with_header_of(mask, data)
}

/// 二值开运算: 先腐蚀, 后膨胀. 去除小于结构元的噪声对象.
///
/// 如果 `radius < 1` 则程序 panic.
pub fn binary_opening(mask: &CtMask, radius: usize) -> CtMask {
    assert!(radius >= 1, "半径必须大于等于 1");
    let offsets = ball_offsets(radius);
    let eroded = morph_pass(&mask.data().to_owned(), &offsets, MorphOp::Erode);
    let opened = morph_pass(&eroded, &offsets, MorphOp::Dilate);
    CtMask::with_header_of(mask, opened)
}

/// 二值闭运算: 先膨胀, 后腐蚀. 填补小于结构元的孔洞与缝隙.
///
/// 如果 `radius < 1` 则程序 panic.
pub fn binary_closing(mask: &CtMask, radius: usize) -> CtMask {
    assert!(radius >= 1, "半径必须大于等于 1");
    let offsets = ball_offsets(radius);
    let dilated = morph_pass(&mask.data().to_owned(), &offsets, MorphOp::Dilate);
    let closed = morph_pass(&dilated, &offsets, MorphOp::Erode);
    CtMask::with_header_of(mask, closed)
}

/// 重建闭运算: 膨胀后做测地腐蚀直至不动点, 保留大对象的原有形状.
///
/// 以半径 `radius` 的球膨胀作为 marker, 原掩膜作为测地约束,
/// 反复以单位球腐蚀并与原掩膜逐体素取最大, 收敛后即为结果.
///
/// 如果 `radius < 1` 则程序 panic.
pub fn binary_closing_br(mask: &CtMask, radius: usize) -> CtMask {
    assert!(radius >= 1, "半径必须大于等于 1");
    let original = mask.data().to_owned();
    let unit = ball_offsets(1);

    let mut marker = morph_pass(&original, &ball_offsets(radius), MorphOp::Dilate);
    loop {
        let mut next = morph_pass(&marker, &unit, MorphOp::Erode);
        // 测地约束: 不得低于原掩膜.
        ndarray::Zip::from(&mut next)
            .and(&original)
            .for_each(|n, &o| *n = (*n).max(o));
        if next == marker {
            break;
        }
        marker = next;
    }
    CtMask::with_header_of(mask, marker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    /// 20^3 网格中一个 8^3 的实心立方体.
    fn convex_box() -> CtMask {
        let mut data = Array3::<u8>::zeros((20, 20, 20));
        for z in 6..14 {
            for h in 6..14 {
                for w in 6..14 {
                    data[(z, h, w)] = 1;
                }
            }
        }
        CtMask::fake(data, [1.0, 1.0, 1.0])
    }

    #[test]
    fn test_ball_offsets_radius_one() {
        // 单位球 = 中心 + 6-邻域.
        assert_eq!(ball_offsets(1).len(), 7);
    }

    #[test]
    #[should_panic]
    fn test_erode_rejects_zero_radius() {
        let _ = erode(&convex_box(), 0, 1);
    }

    #[test]
    #[should_panic]
    fn test_opening_rejects_zero_radius() {
        let _ = binary_opening(&convex_box(), 0);
    }

    #[test]
    #[should_panic]
    fn test_closing_br_rejects_zero_radius() {
        let _ = binary_closing_br(&convex_box(), 0);
    }

    #[test]
    fn test_radius_one_accepted() {
        let mask = convex_box();
        let out = erode(&mask, 1, 1);
        assert!(out.count_nonzero() < mask.count_nonzero());
    }

    #[test]
    fn test_erode_then_dilate_shrinks_thin_parts() {
        let mut data = Array3::<u8>::zeros((5, 9, 9));
        // 单体素突刺.
        data[(2, 4, 4)] = 1;
        let mask = CtMask::fake(data, [1.0, 1.0, 1.0]);
        let opened = binary_opening(&mask, 1);
        assert_eq!(opened.count_nonzero(), 0);
    }

    #[test]
    fn test_open_close_idempotent_on_convex_mask() {
        let mask = convex_box();
        let once = binary_closing(&binary_opening(&mask, 1), 1);
        let twice = binary_closing(&binary_opening(&once, 1), 1);
        assert_eq!(twice.data(), once.data());
        assert!(once.count_nonzero() > 0);
    }

    #[test]
    fn test_closing_br_fills_hole_keeps_shape() {
        let mut mask = convex_box();
        // 内部挖一个单体素孔.
        mask[(10, 10, 10)] = 0;
        let closed = binary_closing_br(&mask, 2);
        assert_eq!(closed[(10, 10, 10)], 1);
        // 立方体外部不被扩张.
        assert_eq!(closed[(0, 0, 0)], 0);
        assert_eq!(closed.count_nonzero(), 8 * 8 * 8);
    }
}
