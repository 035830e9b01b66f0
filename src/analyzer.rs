// 该文件是 Kuangjing （框景） 项目的一部分。
// src/analyzer.rs - 单帧分析周期
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

use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, warn};

use crate::{
  frame::{CameraFrame, LensFacing},
  geometry::{FrameSize, GeometryError, Rotation},
  model::ExecutorInitError,
};

mod classification;
mod detection;
mod style_transfer;

pub use self::classification::ImageClassificationAnalyzer;
pub use self::detection::ObjectDetectionAnalyzer;
pub use self::style_transfer::{
  DirectoryStyleSource, StyleSource, StyleTransferAnalyzer, StyleTransferResult,
};

/// 每个分析周期的元数据
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceInfo {
  pub rotation: Rotation,
  pub lens_facing: LensFacing,
  /// 按显示方向计算的帧尺寸
  pub frame_size: FrameSize,
  pub inference_time: Duration,
}

impl InferenceInfo {
  pub fn for_frame(frame: &CameraFrame) -> Self {
    Self {
      rotation: frame.rotation,
      lens_facing: frame.lens_facing,
      frame_size: frame.display_size(),
      inference_time: Duration::ZERO,
    }
  }
}

#[derive(Error, Debug)]
pub enum AnalyzerError {
  #[error(transparent)]
  ExecutorInit(#[from] ExecutorInitError),
  #[error("推理失败: {0}")]
  Inference(#[source] Box<dyn std::error::Error + Send + Sync>),
  #[error("几何变换错误: {0}")]
  Geometry(#[from] GeometryError),
}

impl AnalyzerError {
  pub fn inference<E: std::error::Error + Send + Sync + 'static>(e: E) -> Self {
    AnalyzerError::Inference(Box::new(e))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
  EmptyFrame(FrameSize),
}

/// 一次分析的结果
#[derive(Debug, Clone)]
pub struct Analysis<T> {
  pub result: T,
  pub info: InferenceInfo,
}

/// 分析周期的结局
///
/// `Completed` 中结果为空表示“没有检测到目标”，与 `Failed` 区分开。
#[derive(Debug)]
pub enum CycleOutcome<T> {
  Skipped(SkipReason),
  Failed(AnalyzerError),
  Completed(Analysis<T>),
}

impl<T> CycleOutcome<T> {
  pub fn completed(self) -> Option<Analysis<T>> {
    match self {
      CycleOutcome::Completed(analysis) => Some(analysis),
      _ => None,
    }
  }

  pub fn is_skipped(&self) -> bool {
    matches!(self, CycleOutcome::Skipped(_))
  }

  pub fn is_failed(&self) -> bool {
    matches!(self, CycleOutcome::Failed(_))
  }
}

pub trait Analyzer {
  type Output;

  fn analyze(&mut self, frame: &CameraFrame) -> CycleOutcome<Self::Output>;
}

/// 空帧直接跳过，其余交给 `process`
pub(crate) fn run_cycle<T>(
  frame: &CameraFrame,
  process: impl FnOnce(&mut InferenceInfo) -> Result<T, AnalyzerError>,
) -> CycleOutcome<T> {
  let size = frame.size();
  if size.is_empty() {
    warn!("第 {} 帧尺寸为空 ({}), 跳过本次分析", frame.index, size);
    return CycleOutcome::Skipped(SkipReason::EmptyFrame(size));
  }

  let mut info = InferenceInfo::for_frame(frame);
  match process(&mut info) {
    Ok(result) => {
      debug!("第 {} 帧分析完成, 推理耗时 {:.2?}", frame.index, info.inference_time);
      CycleOutcome::Completed(Analysis { result, info })
    }
    Err(e) => CycleOutcome::Failed(e),
  }
}

/// 执行 `f` 并记录耗时
pub(crate) fn timed<R>(info: &mut InferenceInfo, f: impl FnOnce() -> R) -> R {
  let now = Instant::now();
  let result = f();
  info.inference_time = now.elapsed();
  result
}

#[cfg(test)]
pub(crate) mod testing {
  use std::cell::Cell;

  use thiserror::Error;

  use crate::model::{ExecutorBuilder, ModelExecutor};

  #[derive(Debug, Error)]
  #[error("{0}")]
  pub struct FakeError(pub &'static str);

  /// 以闭包作为推理函数的执行器
  pub struct FnExecutor<I, O> {
    pub infer: Box<dyn Fn(&I) -> Result<O, FakeError>>,
  }

  impl<I, O> FnExecutor<I, O> {
    pub fn new<F>(infer: F) -> Self
    where
      F: Fn(&I) -> Result<O, FakeError> + 'static,
    {
      Self {
        infer: Box::new(infer),
      }
    }
  }

  impl<I, O> ModelExecutor for FnExecutor<I, O> {
    type Input = I;
    type Output = O;
    type Error = FakeError;

    fn infer(&self, input: &I) -> Result<O, FakeError> {
      (self.infer)(input)
    }
  }

  /// 前 `failures` 次构建失败，之后返回由 `make` 生成的执行器
  pub struct FlakyBuilder<I, O> {
    pub failures: Cell<usize>,
    pub builds: Cell<usize>,
    pub make: fn() -> FnExecutor<I, O>,
  }

  impl<I, O> FlakyBuilder<I, O> {
    pub fn new(failures: usize, make: fn() -> FnExecutor<I, O>) -> Self {
      Self {
        failures: Cell::new(failures),
        builds: Cell::new(0),
        make,
      }
    }
  }

  impl<P, I, O> ExecutorBuilder<P> for FlakyBuilder<I, O> {
    type Executor = FnExecutor<I, O>;
    type Error = FakeError;

    fn build(&self, _params: &P) -> Result<Self::Executor, Self::Error> {
      self.builds.set(self.builds.get() + 1);
      if self.failures.get() > 0 {
        self.failures.set(self.failures.get() - 1);
        return Err(FakeError("model asset missing"));
      }
      Ok((self.make)())
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::RgbImage;

  #[test]
  fn empty_frames_are_skipped_without_processing() {
    let frame = CameraFrame::new(RgbImage::new(0, 480));
    let outcome = run_cycle(&frame, |_| -> Result<(), AnalyzerError> {
      panic!("empty frame must not be processed")
    });
    assert!(matches!(
      outcome,
      CycleOutcome::Skipped(SkipReason::EmptyFrame(FrameSize { width: 0, height: 480 }))
    ));
  }

  #[test]
  fn info_uses_display_orientation() {
    let frame = CameraFrame::new(RgbImage::new(640, 480)).with_rotation(Rotation::Deg90);
    let outcome = run_cycle(&frame, |info| Ok(info.frame_size));
    let analysis = outcome.completed().unwrap();
    assert_eq!(analysis.result, FrameSize::new(480, 640));
    assert_eq!(analysis.info.rotation, Rotation::Deg90);
  }
}
