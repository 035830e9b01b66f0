// 该文件是 Kuangjing （框景） 项目的一部分。
// src/geometry/space.rs - 坐标空间标记与带标记的变换
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

use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use super::{AffineTransform, GeometryError};

pub trait CoordinateSpace: std::fmt::Debug + Copy + 'static {
  const NAME: &'static str;
}

/// 相机原始帧坐标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSpace {}

/// 预缩放后的中间图像坐标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaledSpace {}

/// 模型输入张量坐标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorSpace {}

impl CoordinateSpace for FrameSpace {
  const NAME: &'static str = "frame";
}

impl CoordinateSpace for ScaledSpace {
  const NAME: &'static str = "scaled";
}

impl CoordinateSpace for TensorSpace {
  const NAME: &'static str = "tensor";
}

/// 属于坐标空间 `S` 的轴对齐边界框
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox<S> {
  pub left: f32,
  pub top: f32,
  pub right: f32,
  pub bottom: f32,
  #[serde(skip)]
  _space: PhantomData<S>,
}

impl<S> BoundingBox<S> {
  pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
    Self {
      left,
      top,
      right,
      bottom,
      _space: PhantomData,
    }
  }

  pub fn from_array(ltrb: [f32; 4]) -> Self {
    let [left, top, right, bottom] = ltrb;
    Self::new(left, top, right, bottom)
  }

  pub fn to_array(&self) -> [f32; 4] {
    [self.left, self.top, self.right, self.bottom]
  }

  pub fn width(&self) -> f32 {
    self.right - self.left
  }

  pub fn height(&self) -> f32 {
    self.bottom - self.top
  }

  pub fn contains(&self, other: &BoundingBox<S>) -> bool {
    self.left <= other.left
      && self.top <= other.top
      && self.right >= other.right
      && self.bottom >= other.bottom
  }
}

/// 从坐标空间 `From` 到 `To` 的仿射变换
///
/// 只有首尾空间相接的变换才能组合，遗漏或颠倒逆映射步骤会在编译期报错。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform<From, To> {
  affine: AffineTransform,
  _spaces: PhantomData<(From, To)>,
}

impl<From: CoordinateSpace, To: CoordinateSpace> Transform<From, To> {
  pub fn new(affine: AffineTransform) -> Self {
    Self {
      affine,
      _spaces: PhantomData,
    }
  }

  pub fn affine(&self) -> &AffineTransform {
    &self.affine
  }

  pub fn then<Next: CoordinateSpace>(&self, next: &Transform<To, Next>) -> Transform<From, Next> {
    Transform::new(self.affine.then(&next.affine))
  }

  pub fn inverse(&self) -> Result<Transform<To, From>, GeometryError> {
    Ok(Transform::new(self.affine.invert()?))
  }

  pub fn map_point(&self, x: f32, y: f32) -> (f32, f32) {
    self.affine.map_point(x, y)
  }

  pub fn map_box(&self, bbox: &BoundingBox<From>) -> BoundingBox<To> {
    BoundingBox::from_array(self.affine.map_rect(bbox.to_array()))
  }
}

impl<S: CoordinateSpace> Transform<S, S> {
  pub fn identity() -> Self {
    Self::new(AffineTransform::identity())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::geometry::Rotation;
  use approx::assert_abs_diff_eq;

  #[test]
  fn chained_inverse_restores_frame_points() {
    let pre: Transform<FrameSpace, ScaledSpace> =
      Transform::new(AffineTransform::scaling(0.5, 0.5));
    let crop: Transform<ScaledSpace, TensorSpace> = Transform::new(
      AffineTransform::translation(-320.0, -240.0)
        .post_rotate(Rotation::Deg90)
        .post_scale(0.8, 0.8)
        .post_translate(208.0, 208.0),
    );

    let forward = pre.then(&crop);
    let back = crop.inverse().unwrap().then(&pre.inverse().unwrap());

    let (tx, ty) = forward.map_point(400.0, 300.0);
    let (fx, fy) = back.map_point(tx, ty);
    assert_abs_diff_eq!(fx, 400.0, epsilon = 1e-3);
    assert_abs_diff_eq!(fy, 300.0, epsilon = 1e-3);
  }

  #[test]
  fn bounding_box_serializes_without_space_tag() {
    let bbox: BoundingBox<TensorSpace> = BoundingBox::new(1.0, 2.0, 3.0, 4.0);
    let json = serde_json::to_value(bbox).unwrap();
    assert_eq!(
      json,
      serde_json::json!({"left": 1.0, "top": 2.0, "right": 3.0, "bottom": 4.0})
    );
  }
}
