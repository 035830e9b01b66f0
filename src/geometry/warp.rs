// 该文件是 Kuangjing （框景） 项目的一部分。
// src/geometry/warp.rs - 按仿射变换重采样图像
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

use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};

use super::{AffineTransform, FrameSize, GeometryError};

/// 把 `image` 经 `transform` 绘制到 `dst` 尺寸的新图像上
///
/// 输出尺寸恒为 `dst`，源图未覆盖的像素填充为 `fill`。
pub fn warp_affine(
  image: &RgbImage,
  transform: &AffineTransform,
  dst: FrameSize,
  fill: Rgb<u8>,
) -> Result<RgbImage, GeometryError> {
  if dst.is_empty() {
    return Err(GeometryError::EmptyDestination {
      width: dst.width,
      height: dst.height,
    });
  }

  let projection =
    Projection::from_matrix(transform.to_matrix3()).ok_or(GeometryError::Singular {
      determinant: transform.determinant(),
    })?;

  let mut out = RgbImage::from_pixel(dst.width, dst.height, fill);
  warp_into(image, &projection, Interpolation::Bilinear, fill, &mut out);
  Ok(out)
}
