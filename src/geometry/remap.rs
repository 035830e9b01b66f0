// 该文件是 Kuangjing （框景） 项目的一部分。
// src/geometry/remap.rs - 推理结果坐标回映射
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

use image::{RgbImage, imageops};
use tracing::debug;

use super::{BoundingBox, CoordinateSpace, Transform};
use crate::model::Recognition;

/// 把一组边界框映射到目标空间，结果仍为轴对齐矩形
pub fn remap_boxes<From: CoordinateSpace, To: CoordinateSpace>(
  boxes: &[BoundingBox<From>],
  back: &Transform<From, To>,
) -> Vec<BoundingBox<To>> {
  boxes.iter().map(|bbox| back.map_box(bbox)).collect()
}

/// 置信度过滤 + 坐标回映射
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TensorResultRemapper {
  min_confidence: f32,
}

impl TensorResultRemapper {
  pub fn new(min_confidence: f32) -> Self {
    Self { min_confidence }
  }

  pub fn min_confidence(&self) -> f32 {
    self.min_confidence
  }

  /// 丢弃低于阈值或没有位置的结果，其余结果映射到 `To` 空间
  pub fn remap<From: CoordinateSpace, To: CoordinateSpace>(
    &self,
    recognitions: Vec<Recognition<From>>,
    back: &Transform<From, To>,
  ) -> Vec<Recognition<To>> {
    let total = recognitions.len();
    let mapped: Vec<Recognition<To>> = recognitions
      .into_iter()
      .filter(|r| r.confidence >= self.min_confidence)
      .filter_map(|r| match r.location {
        Some(location) => {
          let location = back.map_box(&location);
          Some(r.with_location(Some(location)))
        }
        None => None,
      })
      .collect();

    debug!(
      "回映射 {} -> {}: 保留 {}/{} 个结果 (阈值 {})",
      From::NAME,
      To::NAME,
      mapped.len(),
      total,
      self.min_confidence
    );

    mapped
  }
}

/// 居中裁剪图像，使其宽高比为 `aspect`（宽 / 高）
pub fn trim_to_aspect(image: &RgbImage, aspect: f32) -> RgbImage {
  let (width, height) = image.dimensions();
  if width == 0 || height == 0 || !aspect.is_finite() || aspect <= 0.0 {
    return image.clone();
  }

  let current = width as f32 / height as f32;
  let (x, y, w, h) = if current > aspect {
    let w = ((height as f32 * aspect).round() as u32).clamp(1, width);
    ((width - w) / 2, 0, w, height)
  } else {
    let h = ((width as f32 / aspect).round() as u32).clamp(1, height);
    (0, (height - h) / 2, width, h)
  };

  imageops::crop_imm(image, x, y, w, h).to_image()
}
