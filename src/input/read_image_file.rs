// 该文件是 Kuangjing （框景） 项目的一部分。
// src/input/read_image_file.rs - 图像文件输入
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::path::Path;

use image::{ImageReader, RgbImage};
use thiserror::Error;
use tracing::{error, info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::{CameraFrame, LensFacing},
  geometry::{GeometryError, Rotation},
};

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像加载错误: {0}")]
  ImageLoadError(#[from] image::ImageError),
  #[error("旋转角度无效: {0}")]
  Rotation(#[from] GeometryError),
  #[error("参数 '{key}' 的取值无效: {value}")]
  InvalidValue { key: String, value: String },
}

/// 把一张静态图像当作相机输出
///
/// `image:///path/to/file.jpg?rotation=90&lens=front&repeat=10`，
/// `repeat=0` 表示无限重复。
pub struct ImageFileInput {
  image: RgbImage,
  rotation: Rotation,
  lens_facing: LensFacing,
  repeat: Option<u64>,
  emitted: u64,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

fn invalid(key: &str, value: &str) -> ImageFileInputError {
  ImageFileInputError::InvalidValue {
    key: key.to_string(),
    value: value.to_string(),
  }
}

impl FromUrl for ImageFileInput {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI 方案不匹配: 期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ImageFileInputError::SchemeMismatch(url.scheme().to_string()));
    }

    let mut input = Self::open(url.path())?;
    for (k, v) in url.query_pairs() {
      match k.as_ref() {
        "rotation" => {
          let degrees: i32 = v.parse().map_err(|_| invalid(&k, &v))?;
          input.rotation = Rotation::try_from(degrees)?;
        }
        "lens" => input.lens_facing = v.parse().map_err(|_| invalid(&k, &v))?,
        "repeat" => {
          let repeat: u64 = v.parse().map_err(|_| invalid(&k, &v))?;
          input.repeat = (repeat > 0).then_some(repeat);
        }
        other => warn!("忽略未知的输入参数: {}", other),
      }
    }

    Ok(input)
  }
}

impl ImageFileInput {
  pub fn open(path: impl AsRef<Path>) -> Result<Self, ImageFileInputError> {
    let path = path.as_ref();
    let image = ImageReader::open(path)?.decode()?.to_rgb8();
    info!(
      "已加载输入图像 {} ({}x{})",
      path.display(),
      image.width(),
      image.height()
    );
    Ok(Self::from_image(image))
  }

  pub fn from_image(image: RgbImage) -> Self {
    Self {
      image,
      rotation: Rotation::Deg0,
      lens_facing: LensFacing::Back,
      repeat: Some(1),
      emitted: 0,
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

  /// `None` 表示无限重复
  pub fn with_repeat(mut self, repeat: Option<u64>) -> Self {
    self.repeat = repeat;
    self
  }
}

impl Iterator for ImageFileInput {
  type Item = CameraFrame;

  fn next(&mut self) -> Option<Self::Item> {
    if self.repeat.is_some_and(|repeat| self.emitted >= repeat) {
      return None;
    }

    let frame = CameraFrame::new(self.image.clone())
      .with_rotation(self.rotation)
      .with_lens_facing(self.lens_facing)
      .with_index(self.emitted);
    self.emitted += 1;
    Some(frame)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::Rgb;

  #[test]
  fn url_query_sets_frame_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("input.png");
    RgbImage::from_pixel(8, 4, Rgb([9, 9, 9])).save(&path).unwrap();

    let url = Url::parse(&format!(
      "image://{}?rotation=270&lens=front&repeat=3",
      path.display()
    ))
    .unwrap();
    let frames: Vec<CameraFrame> = ImageFileInput::from_url(&url).unwrap().collect();

    assert_eq!(frames.len(), 3);
    assert_eq!(frames[2].index, 2);
    assert_eq!(frames[0].rotation, Rotation::Deg270);
    assert_eq!(frames[0].lens_facing, LensFacing::Front);
    assert_eq!(frames[0].image.dimensions(), (8, 4));
  }

  #[test]
  fn zero_repeat_is_endless() {
    let input = ImageFileInput::from_image(RgbImage::new(2, 2)).with_repeat(None);
    assert_eq!(input.take(100).count(), 100);
  }

  #[test]
  fn invalid_rotation_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("input.png");
    RgbImage::new(2, 2).save(&path).unwrap();

    let url = Url::parse(&format!("image://{}?rotation=45", path.display())).unwrap();
    assert!(matches!(
      ImageFileInput::from_url(&url),
      Err(ImageFileInputError::Rotation(GeometryError::UnsupportedRotation(45)))
    ));
  }

  #[test]
  fn other_schemes_are_rejected() {
    let url = Url::parse("video:///dev/video0").unwrap();
    assert!(matches!(
      ImageFileInput::from_url(&url),
      Err(ImageFileInputError::SchemeMismatch(_))
    ));
  }
}
