// 该文件是 Kuangjing （框景） 项目的一部分。
// src/output/draw.rs - 分析结果可视化
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use image::{Rgb, RgbImage};
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};

use crate::{
  analyzer::StyleTransferResult,
  geometry::{BoundingBox, FrameSpace},
  model::{Classification, Recognition},
};

const BOX_COLOR: [u8; 3] = [0, 0, 255]; // 蓝色
const BOX_THICKNESS: u32 = 2;

pub struct Draw {
  color: Rgb<u8>,
  thickness: u32,
}

impl Default for Draw {
  fn default() -> Self {
    Self {
      color: Rgb(BOX_COLOR),
      thickness: BOX_THICKNESS,
    }
  }
}

impl Draw {
  /// 按帧坐标绘制边框，超出图像的部分被裁掉
  pub fn draw_box(&self, image: &mut RgbImage, bbox: &BoundingBox<FrameSpace>) {
    let (w, h) = (image.width() as i32, image.height() as i32);
    if w == 0 || h == 0 {
      return;
    }

    let x_min = (bbox.left.floor() as i32).clamp(0, w - 1);
    let y_min = (bbox.top.floor() as i32).clamp(0, h - 1);
    let x_max = (bbox.right.ceil() as i32).clamp(0, w - 1);
    let y_max = (bbox.bottom.ceil() as i32).clamp(0, h - 1);

    for t in 0..self.thickness as i32 {
      let width = x_max - x_min - 2 * t + 1;
      let height = y_max - y_min - 2 * t + 1;
      if width <= 0 || height <= 0 {
        break;
      }
      let rect = Rect::at(x_min + t, y_min + t).of_size(width as u32, height as u32);
      draw_hollow_rect_mut(image, rect, self.color);
    }
  }
}

/// 可以画到帧上并记录为文本的分析结果
pub trait Overlay {
  fn render_on(&self, draw: &Draw, frame: &RgbImage) -> RgbImage;

  fn record_lines(&self, label_with_name: bool) -> Vec<String>;

  /// 没有可输出的内容
  fn is_empty(&self) -> bool;
}

impl Overlay for Vec<Recognition<FrameSpace>> {
  fn render_on(&self, draw: &Draw, frame: &RgbImage) -> RgbImage {
    let mut image = frame.clone();
    for location in self.iter().filter_map(|r| r.location.as_ref()) {
      draw.draw_box(&mut image, location);
    }
    image
  }

  fn record_lines(&self, label_with_name: bool) -> Vec<String> {
    self
      .iter()
      .filter_map(|item| {
        let bbox = item.location.as_ref()?;
        let name = if label_with_name { &item.label } else { &item.id };
        Some(format!(
          "{}, {:.4}, {:.4}, {:.4}, {:.4}, {:.4}",
          name, item.confidence, bbox.left, bbox.top, bbox.right, bbox.bottom
        ))
      })
      .collect()
  }

  fn is_empty(&self) -> bool {
    <[Recognition<FrameSpace>]>::is_empty(self)
  }
}

impl Overlay for Vec<Classification> {
  fn render_on(&self, _draw: &Draw, frame: &RgbImage) -> RgbImage {
    frame.clone()
  }

  fn record_lines(&self, label_with_name: bool) -> Vec<String> {
    self
      .iter()
      .map(|item| {
        let name = if label_with_name { &item.label } else { &item.id };
        format!("{}, {:.4}", name, item.confidence)
      })
      .collect()
  }

  fn is_empty(&self) -> bool {
    <[Classification]>::is_empty(self)
  }
}

impl Overlay for StyleTransferResult {
  fn render_on(&self, _draw: &Draw, _frame: &RgbImage) -> RgbImage {
    self.image.clone()
  }

  fn record_lines(&self, _label_with_name: bool) -> Vec<String> {
    self.style.iter().cloned().collect()
  }

  /// 缺少风格图时的回退结果同样需要输出
  fn is_empty(&self) -> bool {
    self.image.width() == 0 || self.image.height() == 0
  }
}

pub struct Record {
  pub label_with_name: bool,
}

impl Record {
  /// 写入与图像同名的 `.txt` 文件
  pub fn record<T: Overlay>(&self, result: &T, path: &std::path::Path) -> Result<(), std::io::Error> {
    let records = result.record_lines(self.label_with_name);
    std::fs::write(path.with_extension("txt"), records.join("\n"))?;
    Ok(())
  }
}
