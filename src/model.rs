// 该文件是 Kuangjing （框景） 项目的一部分。
// src/model.rs - 模型执行器接口与推理结果
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::sync::Arc;

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::{frame::TensorImage, geometry::BoundingBox};

/// 不透明的推理调用
///
/// 同一实例上的调用串行进行，前一次推理完成后才会开始下一次。
pub trait ModelExecutor {
  type Input;
  type Output;
  type Error: std::error::Error + Send + Sync + 'static;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// 根据参数 `P` 构造执行器
pub trait ExecutorBuilder<P> {
  type Executor: ModelExecutor;
  type Error: std::error::Error + Send + Sync + 'static;

  fn build(&self, params: &P) -> Result<Self::Executor, Self::Error>;
}

/// 检测结果，位置属于坐标空间 `S`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Recognition<S> {
  pub id: String,
  pub label: String,
  pub confidence: f32,
  #[serde(default)]
  pub location: Option<BoundingBox<S>>,
}

impl<S> Recognition<S> {
  pub fn new(
    id: impl Into<String>,
    label: impl Into<String>,
    confidence: f32,
    location: Option<BoundingBox<S>>,
  ) -> Self {
    Self {
      id: id.into(),
      label: label.into(),
      confidence,
      location,
    }
  }

  pub fn with_location<T>(self, location: Option<BoundingBox<T>>) -> Recognition<T> {
    Recognition {
      id: self.id,
      label: self.label,
      confidence: self.confidence,
      location,
    }
  }
}

/// 分类结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
  pub id: String,
  pub label: String,
  pub confidence: f32,
}

/// 风格迁移的输入：内容图与风格图
#[derive(Debug, Clone)]
pub struct StyleTransferInput {
  pub content: TensorImage,
  pub style: Arc<RgbImage>,
}

mod lazy;
mod variant;
pub use self::lazy::{ExecutorInitError, LazyExecutor};
pub use self::variant::{Architecture, ModelProfile, ModelVariant, ModelVariantParseError, Precision};

#[cfg(feature = "model_replay")]
mod replay;
#[cfg(feature = "model_replay")]
pub use self::replay::{ReplayBuilder, ReplayDetector, ReplayError};
