// 该文件是 Kuangjing （框景） 项目的一部分。
// src/geometry/affine.rs - 二维仿射变换
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

use super::GeometryError;

/// 行列式绝对值低于该阈值时视为不可逆
const SINGULAR_EPSILON: f32 = 1e-8;

/// 以 90 度为单位的旋转角度（顺时针，y 轴向下）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rotation {
  #[default]
  Deg0,
  Deg90,
  Deg180,
  Deg270,
}

impl Rotation {
  pub fn degrees(self) -> i32 {
    match self {
      Rotation::Deg0 => 0,
      Rotation::Deg90 => 90,
      Rotation::Deg180 => 180,
      Rotation::Deg270 => 270,
    }
  }

  /// 旋转后宽高是否互换
  pub fn is_transposed(self) -> bool {
    matches!(self, Rotation::Deg90 | Rotation::Deg270)
  }

  /// (cos, sin)，精确取值，避免三角函数带来的误差
  fn cos_sin(self) -> (f32, f32) {
    match self {
      Rotation::Deg0 => (1.0, 0.0),
      Rotation::Deg90 => (0.0, 1.0),
      Rotation::Deg180 => (-1.0, 0.0),
      Rotation::Deg270 => (0.0, -1.0),
    }
  }
}

impl TryFrom<i32> for Rotation {
  type Error = GeometryError;

  fn try_from(degrees: i32) -> Result<Self, Self::Error> {
    match degrees.rem_euclid(360) {
      0 => Ok(Rotation::Deg0),
      90 => Ok(Rotation::Deg90),
      180 => Ok(Rotation::Deg180),
      270 => Ok(Rotation::Deg270),
      _ => Err(GeometryError::UnsupportedRotation(degrees)),
    }
  }
}

/// 2x3 仿射矩阵
///
/// 系数布局为 `[sx, kx, tx, ky, sy, ty]`，映射关系：
/// `x' = sx * x + kx * y + tx`，`y' = ky * x + sy * y + ty`。
///
/// `post_*` 系列方法在当前变换之后追加一个变换，
/// 与相机帧处理中常见的构造顺序保持一致。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
  m: [f32; 6],
}

impl Default for AffineTransform {
  fn default() -> Self {
    Self::identity()
  }
}

impl AffineTransform {
  pub const fn identity() -> Self {
    Self {
      m: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
    }
  }

  pub const fn from_coefficients(m: [f32; 6]) -> Self {
    Self { m }
  }

  pub fn coefficients(&self) -> [f32; 6] {
    self.m
  }

  pub fn translation(dx: f32, dy: f32) -> Self {
    Self {
      m: [1.0, 0.0, dx, 0.0, 1.0, dy],
    }
  }

  pub fn scaling(sx: f32, sy: f32) -> Self {
    Self {
      m: [sx, 0.0, 0.0, 0.0, sy, 0.0],
    }
  }

  pub fn rotation(rotation: Rotation) -> Self {
    let (cos, sin) = rotation.cos_sin();
    Self {
      m: [cos, -sin, 0.0, sin, cos, 0.0],
    }
  }

  /// 先应用 `self`，再应用 `next`
  pub fn then(&self, next: &AffineTransform) -> AffineTransform {
    let [a, b, c, d, e, f] = next.m;
    let [g, h, i, j, k, l] = self.m;
    AffineTransform {
      m: [
        a * g + b * j,
        a * h + b * k,
        a * i + b * l + c,
        d * g + e * j,
        d * h + e * k,
        d * i + e * l + f,
      ],
    }
  }

  pub fn post_translate(self, dx: f32, dy: f32) -> Self {
    self.then(&Self::translation(dx, dy))
  }

  pub fn post_scale(self, sx: f32, sy: f32) -> Self {
    self.then(&Self::scaling(sx, sy))
  }

  pub fn post_rotate(self, rotation: Rotation) -> Self {
    self.then(&Self::rotation(rotation))
  }

  pub fn determinant(&self) -> f32 {
    let [sx, kx, _, ky, sy, _] = self.m;
    sx * sy - kx * ky
  }

  pub fn is_invertible(&self) -> bool {
    self.determinant().abs() > SINGULAR_EPSILON
  }

  pub fn invert(&self) -> Result<AffineTransform, GeometryError> {
    let det = self.determinant();
    if det.abs() <= SINGULAR_EPSILON {
      return Err(GeometryError::Singular { determinant: det });
    }

    let [sx, kx, tx, ky, sy, ty] = self.m;
    Ok(AffineTransform {
      m: [
        sy / det,
        -kx / det,
        (kx * ty - sy * tx) / det,
        -ky / det,
        sx / det,
        (ky * tx - sx * ty) / det,
      ],
    })
  }

  pub fn map_point(&self, x: f32, y: f32) -> (f32, f32) {
    let [sx, kx, tx, ky, sy, ty] = self.m;
    (sx * x + kx * y + tx, ky * x + sy * y + ty)
  }

  /// 映射矩形的四个角点，并返回其轴对齐外接矩形 `[left, top, right, bottom]`
  pub fn map_rect(&self, rect: [f32; 4]) -> [f32; 4] {
    let [left, top, right, bottom] = rect;
    let corners = [
      self.map_point(left, top),
      self.map_point(right, top),
      self.map_point(right, bottom),
      self.map_point(left, bottom),
    ];

    corners.iter().fold(
      [f32::INFINITY, f32::INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY],
      |[l, t, r, b], &(x, y)| [l.min(x), t.min(y), r.max(x), b.max(y)],
    )
  }

  /// 行优先的 3x3 齐次矩阵
  pub fn to_matrix3(&self) -> [f32; 9] {
    let [sx, kx, tx, ky, sy, ty] = self.m;
    [sx, kx, tx, ky, sy, ty, 0.0, 0.0, 1.0]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use approx::assert_abs_diff_eq;

  #[test]
  fn rotation_from_degrees_normalizes() {
    assert_eq!(Rotation::try_from(0).unwrap(), Rotation::Deg0);
    assert_eq!(Rotation::try_from(450).unwrap(), Rotation::Deg90);
    assert_eq!(Rotation::try_from(-90).unwrap(), Rotation::Deg270);
    assert!(matches!(
      Rotation::try_from(45),
      Err(GeometryError::UnsupportedRotation(45))
    ));
  }

  #[test]
  fn rotate_90_is_clockwise_in_image_coordinates() {
    let (x, y) = AffineTransform::rotation(Rotation::Deg90).map_point(1.0, 0.0);
    assert_abs_diff_eq!(x, 0.0);
    assert_abs_diff_eq!(y, 1.0);
  }

  #[test]
  fn then_applies_in_order() {
    let t = AffineTransform::translation(10.0, 0.0).post_scale(2.0, 2.0);
    let (x, y) = t.map_point(1.0, 1.0);
    assert_abs_diff_eq!(x, 22.0);
    assert_abs_diff_eq!(y, 2.0);
  }

  #[test]
  fn inverse_round_trip() {
    let t = AffineTransform::translation(-640.0, -360.0)
      .post_rotate(Rotation::Deg270)
      .post_scale(0.325, 0.578)
      .post_translate(208.0, 208.0);
    let inv = t.invert().unwrap();

    for &(px, py) in &[(0.0, 0.0), (1279.0, 719.0), (317.5, 42.25), (-10.0, 900.0)] {
      let (fx, fy) = t.map_point(px, py);
      let (bx, by) = inv.map_point(fx, fy);
      assert_abs_diff_eq!(bx, px, epsilon = 1e-3);
      assert_abs_diff_eq!(by, py, epsilon = 1e-3);
    }
  }

  #[test]
  fn singular_matrix_does_not_invert() {
    let t = AffineTransform::scaling(0.0, 3.0);
    assert!(!t.is_invertible());
    assert!(matches!(t.invert(), Err(GeometryError::Singular { .. })));
  }

  #[test]
  fn map_rect_stays_axis_aligned_under_rotation() {
    let t = AffineTransform::rotation(Rotation::Deg90);
    let [l, t_, r, b] = t.map_rect([10.0, 20.0, 30.0, 60.0]);
    assert_abs_diff_eq!(l, -60.0);
    assert_abs_diff_eq!(t_, 10.0);
    assert_abs_diff_eq!(r, -20.0);
    assert_abs_diff_eq!(b, 30.0);
  }
}
