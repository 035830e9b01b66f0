// 该文件是 Kuangjing （框景） 项目的一部分。
// src/analyzer/classification.rs - 图像分类分析器
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
use tracing::{debug, info};

use super::{AnalyzerError, Analyzer, CycleOutcome, InferenceInfo, run_cycle, timed};
use crate::{
  config::ClassificationConfig,
  dump::{CROPPED_IMAGE_FILE, DirectoryDumper, dump_intermediate},
  frame::{CameraFrame, TensorImage},
  geometry::{AspectPolicy, FrameSpace, FrameToTensorMapper, TensorMapping, TensorSpace, warp_affine},
  model::{Classification, ExecutorBuilder, LazyExecutor, ModelExecutor, ModelProfile, ModelVariant},
};

pub struct ImageClassificationAnalyzer<B: ExecutorBuilder<ModelProfile>> {
  config: ClassificationConfig,
  profile: ModelProfile,
  builder: B,
  executor: LazyExecutor<B::Executor>,
  dumper: Option<DirectoryDumper>,
}

impl<B> ImageClassificationAnalyzer<B>
where
  B: ExecutorBuilder<ModelProfile>,
  B::Executor: ModelExecutor<Input = TensorImage, Output = Vec<Classification>>,
{
  pub fn new(config: ClassificationConfig, builder: B) -> Self {
    let profile = config.model.profile();
    Self {
      config,
      profile,
      builder,
      executor: LazyExecutor::new(),
      dumper: None,
    }
  }

  pub fn with_dumper(mut self, dumper: Option<DirectoryDumper>) -> Self {
    self.dumper = dumper;
    self
  }

  pub fn profile(&self) -> &ModelProfile {
    &self.profile
  }

  /// 切换模型变体，下一帧使用新模型
  pub fn select_model(&mut self, variant: ModelVariant) {
    if variant == self.profile.variant {
      return;
    }
    info!("切换分类模型: {} -> {}", self.profile.variant, variant);
    self.config.model = variant;
    self.profile = variant.profile();
    self.executor.reset();
  }

  fn process(
    &mut self,
    frame: &CameraFrame,
    info: &mut InferenceInfo,
  ) -> Result<Vec<Classification>, AnalyzerError> {
    let mapper = FrameToTensorMapper::square(self.profile.input_size, AspectPolicy::Crop);
    let mapping: TensorMapping<FrameSpace, TensorSpace> = mapper.map(frame.size(), frame.rotation)?;
    let cropped = warp_affine(
      &frame.image,
      mapping.forward.affine(),
      mapper.output_size(),
      Rgb([0, 0, 0]),
    )?;
    dump_intermediate(self.dumper.as_ref(), &cropped, CROPPED_IMAGE_FILE);
    let tensor = TensorImage::from(cropped);

    let executor = self.executor.load(&self.builder, &self.profile)?;
    let mut results = timed(info, || executor.infer(&tensor)).map_err(AnalyzerError::inference)?;
    debug!("原始分类结果: {:?}", results);

    results.retain(|r| r.confidence >= self.config.min_confidence);
    results.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    results.truncate(self.config.max_results);
    Ok(results)
  }
}

impl<B> Analyzer for ImageClassificationAnalyzer<B>
where
  B: ExecutorBuilder<ModelProfile>,
  B::Executor: ModelExecutor<Input = TensorImage, Output = Vec<Classification>>,
{
  type Output = Vec<Classification>;

  fn analyze(&mut self, frame: &CameraFrame) -> CycleOutcome<Self::Output> {
    run_cycle(frame, |info| self.process(frame, info))
  }
}
