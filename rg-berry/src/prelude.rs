//! 🍒 欢迎光临 🍒
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d};

pub use crate::data::{CtMask, CtVolume, CtWindow, ImgWriteVis, MaskSlice, NiftiHeaderAttr, VolumeSlice};

pub use crate::consts::gray::{
    GT_BACKGROUND, GT_LIVER, GT_TUMOR, MASK_BACKGROUND, MASK_FOREGROUND,
};
pub use crate::consts::params;

pub use crate::archive::{zipped_mask, zipped_volume, ReadArchiveError};
pub use crate::evaluate::{evaluate, EvalError, Evaluation};
pub use crate::growing::{confidence_connected, GrowOptions};
pub use crate::pipeline::{multi_seed, one_seed, StageOne, StageTwo};
