// 该文件是 Kuangjing （框景） 项目的一部分。
// src/frame.rs - 相机帧与张量图像定义
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

use std::str::FromStr;

use image::RgbImage;

use crate::{geometry::{FrameSize, Rotation}, input::AsNhwcFrame};

const RGB_CHANNELS: usize = 3;

/// 产生该帧的摄像头朝向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LensFacing {
  Front,
  #[default]
  Back,
}

impl FromStr for LensFacing {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "front" => Ok(LensFacing::Front),
      "back" => Ok(LensFacing::Back),
      other => Err(format!("未知的摄像头朝向: {}", other)),
    }
  }
}

/// 一次分析周期的输入帧
#[derive(Debug, Clone)]
pub struct CameraFrame {
  pub image: RgbImage,
  /// 传感器方向相对显示方向的旋转
  pub rotation: Rotation,
  pub lens_facing: LensFacing,
  pub index: u64,
}

impl CameraFrame {
  pub fn new(image: RgbImage) -> Self {
    Self {
      image,
      rotation: Rotation::Deg0,
      lens_facing: LensFacing::Back,
      index: 0,
    }
  }

  pub fn with_rotation(mut self, rotation: Rotation) -> Self {
    self.rotation = rotation;
    self
  }

  pub fn with_lens_facing(mut self, lens_facing: LensFacing) -> Self {
    self.lens_facing = lens_facing;
    self
  }

  pub fn with_index(mut self, index: u64) -> Self {
    self.index = index;
    self
  }

  pub fn size(&self) -> FrameSize {
    FrameSize::new(self.image.width(), self.image.height())
  }

  /// 按显示方向计算的尺寸
  pub fn display_size(&self) -> FrameSize {
    self.size().rotated(self.rotation)
  }
}

/// 送入模型的 RGB 张量图像，内存布局为 NHWC
#[derive(Debug, Clone, PartialEq)]
pub struct TensorImage {
  image: RgbImage,
}

impl From<RgbImage> for TensorImage {
  fn from(image: RgbImage) -> Self {
    Self { image }
  }
}

impl TensorImage {
  pub fn size(&self) -> FrameSize {
    FrameSize::new(self.image.width(), self.image.height())
  }

  pub fn image(&self) -> &RgbImage {
    &self.image
  }

  pub fn into_image(self) -> RgbImage {
    self.image
  }

  pub fn channels(&self) -> usize {
    RGB_CHANNELS
  }

  /// 转为 NCHW 平面布局
  pub fn to_nchw(&self) -> Vec<u8> {
    let (width, height) = self.image.dimensions();
    let plane_size = (width * height) as usize;
    let mut data = vec![0u8; plane_size * RGB_CHANNELS];

    for (idx, pixel) in self.image.pixels().enumerate() {
      for c in 0..RGB_CHANNELS {
        data[c * plane_size + idx] = pixel[c];
      }
    }
    data
  }

  /// `(value - mean) / std`，NHWC 布局的浮点数据
  pub fn to_normalized(&self, mean: f32, std: f32) -> Vec<f32> {
    self
      .image
      .as_raw()
      .iter()
      .map(|&v| (v as f32 - mean) / std)
      .collect()
  }
}

impl AsNhwcFrame for TensorImage {
  fn as_nhwc(&self) -> &[u8] {
    self.image.as_raw()
  }
}
