#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 从腹部 3D CT 扫描中提取肝脏的两阶段种子区域生长流水线.
//!
//! 流程分为两个阶段. 第一阶段 (osrg) 从阈值化体积中启发式地定位一个肝脏质心,
//! 以该单一种子做置信连通区域生长, 并做形态学清理; 第二阶段 (msrg)
//! 在第一阶段掩膜内部随机采样多个种子点, 在对比度增强后的体积上重新生长,
//! 得到更紧致的分割.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 数据均以 `(z, H, W)` 模式访问, 与 nifti 文件的 `(W, H, z)` 存储相反.
//! 2. 在非期望情况下 (如非法半径、越界种子), 程序会直接 panic,
//!   而不会导致内存错误. As what Rust promises.
//! 3. 所有经验常量 (阈值带、半径、种子数) 位于 [`consts::params`],
//!   它们是可调参数而非契约.
//!
//! # 模块一览
//!
//! ### 体积与掩膜数据结构 ✅
//!
//! nii 文件读写、header 属性、水平切片视图. 实现位于 `rg-berry/src/data`.
//!
//! ### 预处理滤波器集合 ✅
//!
//! 裁剪、均值滤波、阈值化、形态学操作、直方图均衡、sigmoid 对比度增强、掩膜.
//! 实现位于 `rg-berry/src/filters`.
//!
//! ### 种子选择 ✅
//!
//! 最大掩膜切片、连通分量质心、分量内随机采样. 实现位于 `rg-berry/src/seeds`.
//!
//! ### 置信连通区域生长 ✅
//!
//! 以种子邻域统计量为初值的 6-邻接生长. 实现位于 `rg-berry/src/growing`.
//!
//! ### 分割评估 ✅
//!
//! VOE / RVD / Dice / Jaccard / ASSD 五项指标. 实现位于 `rg-berry/src/evaluate`.
//!
//! ### 归档文件 I/O ✅
//!
//! 从 `{用户主目录}/liver` 下的 zip 归档中读取 nii 体积.
//! 实现位于 `rg-berry/src/archive`.

/// 二维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 三维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

type Predicate = fn(u8) -> bool;

type Area2d = Vec<Idx2d>;
type Areas2d = Vec<Area2d>;

/// 3D CT nii 文件基础数据结构.
mod data;

pub use data::{
    CtMask, CtVolume, CtWindow, ImgWriteVis, MaskSlice, NiftiHeaderAttr, VolumeSlice,
};

pub mod archive;
pub mod consts;
pub mod evaluate;
pub mod filters;
pub mod growing;
pub mod pipeline;
pub mod prelude;
pub mod seeds;
