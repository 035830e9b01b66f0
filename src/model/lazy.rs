// 该文件是 Kuangjing （框景） 项目的一部分。
// src/model/lazy.rs - 延迟创建的模型执行器
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use thiserror::Error;
use tracing::{error, info};

use super::ExecutorBuilder;

#[derive(Error, Debug)]
#[error("模型执行器创建失败 (第 {attempt} 次尝试): {source}")]
pub struct ExecutorInitError {
  pub attempt: usize,
  #[source]
  pub source: Box<dyn std::error::Error + Send + Sync>,
}

/// 首次使用时创建执行器，之后复用
///
/// 创建失败时保持未初始化状态，下一次访问会重新尝试。
#[derive(Debug)]
pub struct LazyExecutor<E> {
  executor: Option<E>,
  attempts: usize,
}

impl<E> Default for LazyExecutor<E> {
  fn default() -> Self {
    Self {
      executor: None,
      attempts: 0,
    }
  }
}

impl<E> LazyExecutor<E> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_loaded(&self) -> bool {
    self.executor.is_some()
  }

  pub fn attempts(&self) -> usize {
    self.attempts
  }

  pub fn get_or_try_init<F, Err>(&mut self, init: F) -> Result<&E, ExecutorInitError>
  where
    F: FnOnce() -> Result<E, Err>,
    Err: std::error::Error + Send + Sync + 'static,
  {
    let executor = match self.executor.take() {
      Some(executor) => executor,
      None => {
        self.attempts += 1;
        info!("创建模型执行器 (第 {} 次尝试)", self.attempts);
        match init() {
          Ok(executor) => {
            info!("模型执行器创建完成");
            executor
          }
          Err(e) => {
            error!("模型执行器创建失败: {}", e);
            return Err(ExecutorInitError {
              attempt: self.attempts,
              source: Box::new(e),
            });
          }
        }
      }
    };

    Ok(self.executor.insert(executor))
  }

  pub fn load<P, B>(&mut self, builder: &B, params: &P) -> Result<&E, ExecutorInitError>
  where
    B: ExecutorBuilder<P, Executor = E>,
  {
    self.get_or_try_init(|| builder.build(params))
  }

  /// 丢弃已创建的执行器，下一次访问时重新创建
  pub fn reset(&mut self) {
    if self.executor.take().is_some() {
      info!("模型执行器已释放");
    }
  }
}
