// 该文件是 Kuangjing （框景） 项目的一部分。
// src/geometry/mapper.rs - 帧到张量的几何映射
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

use tracing::debug;

use super::{AffineTransform, CoordinateSpace, FrameSize, GeometryError, Rotation, Transform};

/// 宽高比处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AspectPolicy {
  /// X/Y 独立缩放，可能产生形变
  #[default]
  Stretch,
  /// 等比缩放并覆盖目标区域，多余部分被裁掉
  Crop,
  /// 等比缩放并完整放入目标区域，空白部分填充
  Letterbox,
}

impl AspectPolicy {
  pub fn from_flags(maintain_aspect: bool, fit_in: bool) -> Self {
    match (maintain_aspect, fit_in) {
      (false, _) => AspectPolicy::Stretch,
      (true, false) => AspectPolicy::Crop,
      (true, true) => AspectPolicy::Letterbox,
    }
  }
}

/// 计算把 `src` 尺寸的帧映射到 `dst` 尺寸输出的仿射变换
///
/// 先把源图中心移到原点并旋转，再按策略缩放，最后平移到目标中心。
/// 旋转 90/270 度时，缩放比例按交换后的宽高计算。
pub fn compute_transform(
  src: FrameSize,
  dst: FrameSize,
  rotation: Rotation,
  policy: AspectPolicy,
) -> Result<AffineTransform, GeometryError> {
  if src.is_empty() {
    return Err(GeometryError::EmptySource {
      width: src.width,
      height: src.height,
    });
  }
  if dst.is_empty() {
    return Err(GeometryError::EmptyDestination {
      width: dst.width,
      height: dst.height,
    });
  }

  let (src_w, src_h) = (src.width as f32, src.height as f32);
  let (dst_w, dst_h) = (dst.width as f32, dst.height as f32);
  let rotated = src.rotated(rotation);
  let (in_w, in_h) = (rotated.width as f32, rotated.height as f32);

  let scale_x = dst_w / in_w;
  let scale_y = dst_h / in_h;
  let (scale_x, scale_y) = match policy {
    AspectPolicy::Stretch => (scale_x, scale_y),
    AspectPolicy::Crop => {
      let s = scale_x.max(scale_y);
      (s, s)
    }
    AspectPolicy::Letterbox => {
      let s = scale_x.min(scale_y);
      (s, s)
    }
  };

  debug!(
    "计算变换: {}x{} -> {}x{}, 旋转 {}°, 策略 {:?}, 缩放 ({:.4}, {:.4})",
    src.width,
    src.height,
    dst.width,
    dst.height,
    rotation.degrees(),
    policy,
    scale_x,
    scale_y
  );

  Ok(
    AffineTransform::translation(-src_w / 2.0, -src_h / 2.0)
      .post_rotate(rotation)
      .post_scale(scale_x, scale_y)
      .post_translate(dst_w / 2.0, dst_h / 2.0),
  )
}

/// 目标为 `dst_size x dst_size` 的方形张量
pub fn compute_square_transform(
  src: FrameSize,
  dst_size: u32,
  rotation: Rotation,
  policy: AspectPolicy,
) -> Result<AffineTransform, GeometryError> {
  compute_transform(src, FrameSize::square(dst_size), rotation, policy)
}

/// 一次映射的正向与逆向变换
#[derive(Debug, Clone, Copy)]
pub struct TensorMapping<From, To> {
  pub forward: Transform<From, To>,
  pub inverse: Transform<To, From>,
}

/// 固定输出尺寸与策略的映射器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameToTensorMapper {
  dst: FrameSize,
  policy: AspectPolicy,
}

impl FrameToTensorMapper {
  pub fn new(dst: FrameSize, policy: AspectPolicy) -> Self {
    Self { dst, policy }
  }

  pub fn square(size: u32, policy: AspectPolicy) -> Self {
    Self::new(FrameSize::square(size), policy)
  }

  pub fn output_size(&self) -> FrameSize {
    self.dst
  }

  pub fn policy(&self) -> AspectPolicy {
    self.policy
  }

  pub fn map<From: CoordinateSpace, To: CoordinateSpace>(
    &self,
    src: FrameSize,
    rotation: Rotation,
  ) -> Result<TensorMapping<From, To>, GeometryError> {
    let forward = Transform::new(compute_transform(src, self.dst, rotation, self.policy)?);
    let inverse = forward.inverse()?;
    Ok(TensorMapping { forward, inverse })
  }
}
