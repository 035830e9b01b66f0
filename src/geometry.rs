// 该文件是 Kuangjing （框景） 项目的一部分。
// src/geometry.rs - 帧与张量之间的几何变换
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use thiserror::Error;

mod affine;
mod mapper;
mod remap;
mod space;
mod warp;

pub use self::affine::{AffineTransform, Rotation};
pub use self::mapper::{
  AspectPolicy, FrameToTensorMapper, TensorMapping, compute_square_transform, compute_transform,
};
pub use self::remap::{TensorResultRemapper, remap_boxes, trim_to_aspect};
pub use self::space::{BoundingBox, CoordinateSpace, FrameSpace, ScaledSpace, TensorSpace, Transform};
pub use self::warp::warp_affine;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
  #[error("源图像尺寸为空: {width}x{height}")]
  EmptySource { width: u32, height: u32 },
  #[error("目标尺寸为空: {width}x{height}")]
  EmptyDestination { width: u32, height: u32 },
  #[error("变换矩阵不可逆, 行列式: {determinant}")]
  Singular { determinant: f32 },
  #[error("不支持的旋转角度: {0}")]
  UnsupportedRotation(i32),
}

/// 图像或张量的宽高
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FrameSize {
  pub width: u32,
  pub height: u32,
}

impl FrameSize {
  pub const fn new(width: u32, height: u32) -> Self {
    Self { width, height }
  }

  pub const fn square(size: u32) -> Self {
    Self::new(size, size)
  }

  pub fn is_empty(&self) -> bool {
    self.width == 0 || self.height == 0
  }

  /// 旋转后的尺寸，90/270 度时宽高互换
  pub fn rotated(&self, rotation: Rotation) -> Self {
    if rotation.is_transposed() {
      Self::new(self.height, self.width)
    } else {
      *self
    }
  }

  /// 宽 / 高；尺寸为空时返回 `None`
  pub fn aspect_ratio(&self) -> Option<f32> {
    if self.is_empty() {
      None
    } else {
      Some(self.width as f32 / self.height as f32)
    }
  }
}

impl std::fmt::Display for FrameSize {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}x{}", self.width, self.height)
  }
}
