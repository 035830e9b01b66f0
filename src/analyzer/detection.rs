// 该文件是 Kuangjing （框景） 项目的一部分。
// src/analyzer/detection.rs - 目标检测分析器
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

use image::Rgb;
use tracing::debug;

use super::{AnalyzerError, Analyzer, CycleOutcome, InferenceInfo, run_cycle, timed};
use crate::{
  config::DetectionConfig,
  dump::{CROPPED_IMAGE_FILE, DirectoryDumper, PRE_SCALED_IMAGE_FILE, dump_intermediate},
  frame::{CameraFrame, TensorImage},
  geometry::{
    AspectPolicy, FrameSize, FrameSpace, FrameToTensorMapper, Rotation, ScaledSpace,
    TensorMapping, TensorResultRemapper, TensorSpace, Transform, warp_affine,
  },
  model::{ExecutorBuilder, LazyExecutor, ModelExecutor, Recognition},
};

const PADDING: Rgb<u8> = Rgb([0, 0, 0]);

/// 预处理产物：模型输入与张量到帧的逆变换
struct Prepared {
  tensor: TensorImage,
  tensor_to_frame: Transform<TensorSpace, FrameSpace>,
}

/// 先把帧预缩放到固定尺寸，再裁剪为方形张量，推理结果沿相反顺序映射回帧坐标
pub struct ObjectDetectionAnalyzer<B: ExecutorBuilder<DetectionConfig>> {
  config: DetectionConfig,
  builder: B,
  executor: LazyExecutor<B::Executor>,
  remapper: TensorResultRemapper,
  dumper: Option<DirectoryDumper>,
}

impl<B> ObjectDetectionAnalyzer<B>
where
  B: ExecutorBuilder<DetectionConfig>,
  B::Executor: ModelExecutor<Input = TensorImage, Output = Vec<Recognition<TensorSpace>>>,
{
  pub fn new(config: DetectionConfig, builder: B) -> Self {
    let remapper = TensorResultRemapper::new(config.min_confidence);
    Self {
      config,
      builder,
      executor: LazyExecutor::new(),
      remapper,
      dumper: None,
    }
  }

  pub fn with_dumper(mut self, dumper: Option<DirectoryDumper>) -> Self {
    self.dumper = dumper;
    self
  }

  pub fn config(&self) -> &DetectionConfig {
    &self.config
  }

  fn prepare(&self, frame: &CameraFrame) -> Result<Prepared, AnalyzerError> {
    let pre_scale_mapper = FrameToTensorMapper::new(self.config.frame_size, AspectPolicy::Crop);
    let pre_scale: TensorMapping<FrameSpace, ScaledSpace> =
      pre_scale_mapper.map(frame.size(), Rotation::Deg0)?;
    let scaled = warp_affine(
      &frame.image,
      pre_scale.forward.affine(),
      self.config.frame_size,
      PADDING,
    )?;
    dump_intermediate(self.dumper.as_ref(), &scaled, PRE_SCALED_IMAGE_FILE);

    let crop_mapper = FrameToTensorMapper::square(
      self.config.input_size,
      AspectPolicy::from_flags(self.config.maintain_aspect, false),
    );
    let scaled_size = FrameSize::new(scaled.width(), scaled.height());
    let crop: TensorMapping<ScaledSpace, TensorSpace> =
      crop_mapper.map(scaled_size, frame.rotation)?;
    let cropped = warp_affine(
      &scaled,
      crop.forward.affine(),
      crop_mapper.output_size(),
      PADDING,
    )?;
    dump_intermediate(self.dumper.as_ref(), &cropped, CROPPED_IMAGE_FILE);

    Ok(Prepared {
      tensor: TensorImage::from(cropped),
      tensor_to_frame: crop.inverse.then(&pre_scale.inverse),
    })
  }

  fn process(
    &mut self,
    frame: &CameraFrame,
    info: &mut InferenceInfo,
  ) -> Result<Vec<Recognition<FrameSpace>>, AnalyzerError> {
    let prepared = self.prepare(frame)?;

    let executor = self.executor.load(&self.builder, &self.config)?;
    let raw = timed(info, || executor.infer(&prepared.tensor)).map_err(AnalyzerError::inference)?;
    debug!("原始检测结果: {:?}", raw);

    Ok(self.remapper.remap(raw, &prepared.tensor_to_frame))
  }
}

impl<B> Analyzer for ObjectDetectionAnalyzer<B>
where
  B: ExecutorBuilder<DetectionConfig>,
  B::Executor: ModelExecutor<Input = TensorImage, Output = Vec<Recognition<TensorSpace>>>,
{
  type Output = Vec<Recognition<FrameSpace>>;

  fn analyze(&mut self, frame: &CameraFrame) -> CycleOutcome<Self::Output> {
    run_cycle(frame, |info| self.process(frame, info))
  }
}
