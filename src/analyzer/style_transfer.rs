// 该文件是 Kuangjing （框景） 项目的一部分。
// src/analyzer/style_transfer.rs - 风格迁移分析器
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

use std::{path::PathBuf, sync::Arc};

use image::{RgbImage, imageops};
use tracing::{debug, info, warn};

use super::{AnalyzerError, Analyzer, CycleOutcome, InferenceInfo, run_cycle, timed};
use crate::{
  config::StyleTransferConfig,
  dump::{DirectoryDumper, PRE_SCALED_IMAGE_FILE, STYLED_IMAGE_FILE, dump_intermediate},
  frame::{CameraFrame, LensFacing, TensorImage},
  geometry::{AspectPolicy, FrameSize, compute_square_transform, trim_to_aspect, warp_affine},
  model::{ExecutorBuilder, LazyExecutor, ModelExecutor, StyleTransferInput},
};

/// 按名称加载风格图
pub trait StyleSource {
  fn load_style(&self, name: &str) -> Option<RgbImage>;
}

/// 从 `<root>/thumbnails/<name>` 加载风格图
#[derive(Debug, Clone)]
pub struct DirectoryStyleSource {
  root: PathBuf,
}

impl DirectoryStyleSource {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }
}

impl StyleSource for DirectoryStyleSource {
  fn load_style(&self, name: &str) -> Option<RgbImage> {
    let path = self.root.join("thumbnails").join(name);
    match image::open(&path) {
      Ok(image) => {
        debug!("风格图已加载: {}", path.display());
        Some(image.to_rgb8())
      }
      Err(e) => {
        warn!("无法加载风格图 {}: {}", path.display(), e);
        None
      }
    }
  }
}

#[derive(Debug, Clone)]
pub struct StyleTransferResult {
  pub image: RgbImage,
  /// 本次使用的风格；缺少风格图时为 `None`，`image` 为未迁移的输入
  pub style: Option<String>,
}

impl StyleTransferResult {
  pub fn is_styled(&self) -> bool {
    self.style.is_some()
  }
}

pub struct StyleTransferAnalyzer<B: ExecutorBuilder<StyleTransferConfig>, S: StyleSource> {
  config: StyleTransferConfig,
  builder: B,
  executor: LazyExecutor<B::Executor>,
  styles: S,
  style_name: Option<String>,
  style_image: Option<Arc<RgbImage>>,
  dumper: Option<DirectoryDumper>,
}

impl<B, S> StyleTransferAnalyzer<B, S>
where
  B: ExecutorBuilder<StyleTransferConfig>,
  B::Executor: ModelExecutor<Input = StyleTransferInput, Output = RgbImage>,
  S: StyleSource,
{
  pub fn new(config: StyleTransferConfig, builder: B, styles: S) -> Self {
    let style_name = config.style.clone();
    Self {
      config,
      builder,
      executor: LazyExecutor::new(),
      styles,
      style_name,
      style_image: None,
      dumper: None,
    }
  }

  pub fn with_dumper(mut self, dumper: Option<DirectoryDumper>) -> Self {
    self.dumper = dumper;
    self
  }

  pub fn selected_style(&self) -> Option<&str> {
    self.style_name.as_deref()
  }

  /// 选择新风格，风格图在下一帧重新加载
  pub fn select_style(&mut self, name: impl Into<String>) {
    let name = name.into();
    info!("选择风格: {}", name);
    self.style_image = None;
    self.style_name = Some(name);
  }

  fn prepare(&self, frame: &CameraFrame) -> Result<RgbImage, AnalyzerError> {
    let size = FrameSize::square(self.config.content_size);
    let transform = compute_square_transform(
      frame.size(),
      self.config.content_size,
      frame.rotation,
      AspectPolicy::Letterbox,
    )?;
    let pre_scaled = warp_affine(&frame.image, &transform, size, self.config.padding)?;

    let content = match frame.lens_facing {
      LensFacing::Front => imageops::flip_horizontal(&pre_scaled),
      LensFacing::Back => pre_scaled,
    };
    dump_intermediate(self.dumper.as_ref(), &content, PRE_SCALED_IMAGE_FILE);
    Ok(content)
  }

  fn current_style(&mut self) -> Option<Arc<RgbImage>> {
    if self.style_image.is_none()
      && let Some(name) = self.style_name.as_deref()
    {
      self.style_image = self.styles.load_style(name).map(Arc::new);
    }
    self.style_image.clone()
  }

  fn process(
    &mut self,
    frame: &CameraFrame,
    info: &mut InferenceInfo,
  ) -> Result<StyleTransferResult, AnalyzerError> {
    let content = self.prepare(frame)?;
    let style = self.current_style();

    let executor = self.executor.load(&self.builder, &self.config)?;
    let (styled, style_name) = match style {
      Some(style) => {
        let input = StyleTransferInput {
          content: TensorImage::from(content),
          style,
        };
        let styled = timed(info, || executor.infer(&input)).map_err(AnalyzerError::inference)?;
        (styled, self.style_name.clone())
      }
      None => {
        warn!("没有可用的风格图, 使用原始输入作为结果");
        (content, None)
      }
    };

    let image = match info.frame_size.aspect_ratio() {
      Some(aspect) => trim_to_aspect(&styled, aspect),
      None => styled,
    };
    dump_intermediate(self.dumper.as_ref(), &image, STYLED_IMAGE_FILE);

    Ok(StyleTransferResult {
      image,
      style: style_name,
    })
  }
}

impl<B, S> Analyzer for StyleTransferAnalyzer<B, S>
where
  B: ExecutorBuilder<StyleTransferConfig>,
  B::Executor: ModelExecutor<Input = StyleTransferInput, Output = RgbImage>,
  S: StyleSource,
{
  type Output = StyleTransferResult;

  fn analyze(&mut self, frame: &CameraFrame) -> CycleOutcome<Self::Output> {
    run_cycle(frame, |info| self.process(frame, info))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    analyzer::testing::{FlakyBuilder, FnExecutor},
    geometry::Rotation,
  };
  use image::Rgb;
  use std::cell::Cell;

  struct MemoryStyles {
    loads: Cell<usize>,
  }

  impl StyleSource for MemoryStyles {
    fn load_style(&self, name: &str) -> Option<RgbImage> {
      self.loads.set(self.loads.get() + 1);
      (name == "wave.jpg").then(|| RgbImage::from_pixel(8, 8, Rgb([0, 0, 200])))
    }
  }

  fn styles() -> MemoryStyles {
    MemoryStyles { loads: Cell::new(0) }
  }

  /// 把内容图整体染成风格图左上角的颜色
  fn painter() -> FnExecutor<StyleTransferInput, RgbImage> {
    FnExecutor::new(|input: &StyleTransferInput| {
      let colour = *input.style.get_pixel(0, 0);
      let (w, h) = input.content.image().dimensions();
      Ok(RgbImage::from_pixel(w, h, colour))
    })
  }

  fn config(style: Option<&str>) -> StyleTransferConfig {
    StyleTransferConfig {
      style: style.map(str::to_string),
      ..StyleTransferConfig::default()
    }
  }

  #[test]
  fn styled_output_is_trimmed_to_display_aspect() {
    let mut analyzer =
      StyleTransferAnalyzer::new(config(Some("wave.jpg")), FlakyBuilder::new(0, painter), styles());
    let frame = CameraFrame::new(RgbImage::new(1280, 720)).with_rotation(Rotation::Deg90);

    let analysis = analyzer.analyze(&frame).completed().unwrap();
    assert!(analysis.result.is_styled());
    assert_eq!(analysis.result.image.dimensions(), (216, 384));
    assert_eq!(analysis.result.image.get_pixel(100, 100), &Rgb([0, 0, 200]));
  }

  #[test]
  fn missing_style_falls_back_to_trimmed_input() {
    let mut analyzer =
      StyleTransferAnalyzer::new(config(Some("missing.jpg")), FlakyBuilder::new(0, painter), styles());
    let frame = CameraFrame::new(RgbImage::from_pixel(640, 480, Rgb([10, 200, 10])));

    let analysis = analyzer.analyze(&frame).completed().unwrap();
    assert!(!analysis.result.is_styled());
    assert_eq!(analysis.result.image.dimensions(), (384, 288));
    assert_eq!(analysis.result.image.get_pixel(192, 144), &Rgb([10, 200, 10]));
  }

  #[test]
  fn style_image_is_cached_until_selection_changes() {
    let mut analyzer =
      StyleTransferAnalyzer::new(config(None), FlakyBuilder::new(0, painter), styles());
    let frame = CameraFrame::new(RgbImage::new(64, 64));

    analyzer.analyze(&frame);
    assert_eq!(analyzer.styles.loads.get(), 0);

    analyzer.select_style("wave.jpg");
    analyzer.analyze(&frame);
    analyzer.analyze(&frame);
    assert_eq!(analyzer.styles.loads.get(), 1);
    assert_eq!(analyzer.selected_style(), Some("wave.jpg"));

    analyzer.select_style("wave.jpg");
    analyzer.analyze(&frame);
    assert_eq!(analyzer.styles.loads.get(), 2);
  }

  #[test]
  fn front_lens_content_is_mirrored() {
    let image = RgbImage::from_fn(384, 384, |x, _| {
      if x < 192 { Rgb([255, 0, 0]) } else { Rgb([0, 255, 0]) }
    });
    let mut analyzer = StyleTransferAnalyzer::new(config(None), FlakyBuilder::new(0, painter), styles());
    let frame = CameraFrame::new(image).with_lens_facing(LensFacing::Front);

    let analysis = analyzer.analyze(&frame).completed().unwrap();
    assert_eq!(analysis.result.image.get_pixel(10, 100), &Rgb([0, 255, 0]));
    assert_eq!(analysis.result.image.get_pixel(370, 100), &Rgb([255, 0, 0]));
  }

  #[test]
  fn directory_source_reads_thumbnails() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("thumbnails")).unwrap();
    RgbImage::from_pixel(4, 4, Rgb([1, 2, 3]))
      .save(dir.path().join("thumbnails").join("mosaic.png"))
      .unwrap();

    let source = DirectoryStyleSource::new(dir.path());
    assert_eq!(source.load_style("mosaic.png").unwrap().dimensions(), (4, 4));
    assert!(source.load_style("absent.png").is_none());
  }
}
