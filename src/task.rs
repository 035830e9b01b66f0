// 该文件是 Kuangjing （框景） 项目的一部分。
// src/task.rs - 分析任务循环
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

use std::{
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
  thread,
  time::Duration,
};

use anyhow::Context;
use tracing::{error, info, warn};

use crate::{
  analyzer::{Analyzer, CycleOutcome},
  frame::CameraFrame,
  output::Render,
};

/// 中断后强制退出前的等待时间
const FORCE_EXIT_DELAY: Duration = Duration::from_secs(30);

pub trait Task<I, A, O>: Sized {
  type Error;
  fn run_task(self, input: I, analyzer: A, output: O) -> Result<(), Self::Error>;
}

/// 输出一次周期的结果，返回本次推理耗时；跳过或失败时返回 `None`
fn deliver<T, O, RE>(
  frame: &CameraFrame,
  outcome: CycleOutcome<T>,
  output: &O,
) -> Result<Option<Duration>, anyhow::Error>
where
  O: Render<T, Error = RE>,
  RE: std::error::Error + Sync + Send + 'static,
{
  match outcome {
    CycleOutcome::Skipped(reason) => {
      warn!("第 {} 帧被跳过: {:?}", frame.index, reason);
      Ok(None)
    }
    CycleOutcome::Failed(e) => {
      error!("第 {} 帧分析失败: {}", frame.index, e);
      Ok(None)
    }
    CycleOutcome::Completed(analysis) => {
      output.render_result(frame, &analysis)?;
      Ok(Some(analysis.info.inference_time))
    }
  }
}

/// 只分析第一帧
pub struct OneShotTask;

impl<RE, I, A, O> Task<I, A, O> for OneShotTask
where
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = CameraFrame>,
  A: Analyzer,
  O: Render<A::Output, Error = RE>,
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, mut analyzer: A, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    info!("输入帧获取成功，开始分析...");

    match analyzer.analyze(&frame) {
      CycleOutcome::Failed(e) => Err(e).context("分析失败"),
      outcome => {
        if let Some(elapsed) = deliver(&frame, outcome, &output)? {
          info!("推理完成，耗时: {:.2?}", elapsed);
        }
        Ok(())
      }
    }
  }
}

/// 对同一帧重复分析，统计平均推理时间
#[derive(Debug)]
pub struct RepeatShotTask {
  times: usize,
  warmup: usize,
}

impl Default for RepeatShotTask {
  fn default() -> Self {
    Self {
      times: 1000,
      warmup: 2,
    }
  }
}

impl RepeatShotTask {
  pub fn with_times(mut self, times: usize) -> Self {
    self.times = times;
    self
  }

  /// 统计平均时间时忽略的前几次推理
  pub fn with_warmup(mut self, warmup: usize) -> Self {
    self.warmup = warmup;
    self
  }

  fn average(&self, times: &[Duration]) -> Option<Duration> {
    let measured = times.get(self.warmup..)?;
    let count = u32::try_from(measured.len()).ok().filter(|&n| n > 0)?;
    Some(measured.iter().sum::<Duration>() / count)
  }
}

impl<RE, I, A, O> Task<I, A, O> for RepeatShotTask
where
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = CameraFrame>,
  A: Analyzer,
  O: Render<A::Output, Error = RE>,
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, mut analyzer: A, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    info!("输入帧获取成功，重复分析 {} 次...", self.times);

    let mut times = Vec::with_capacity(self.times);
    for i in 0..self.times {
      if let Some(elapsed) = deliver(&frame, analyzer.analyze(&frame), &output)? {
        info!("({})推理完成，耗时: {:.2?}", i, elapsed);
        times.push(elapsed);
      }
    }

    match self.average(&times) {
      Some(average) => warn!(
        "平均推理时间: {:.2?} ({} 次有效推理, 忽略前 {} 次)",
        average,
        times.len(),
        self.warmup
      ),
      None => warn!("有效推理次数不足, 无法统计平均推理时间"),
    }

    Ok(())
  }
}

/// 持续分析输入帧，直到输入结束、达到指定帧数或收到中断信号
#[derive(Debug)]
pub struct ContinuousTask {
  frame_number: Option<usize>,
  stop: Arc<AtomicBool>,
  handle_interrupt: bool,
}

impl Default for ContinuousTask {
  fn default() -> Self {
    Self {
      frame_number: None,
      stop: Arc::new(AtomicBool::new(false)),
      handle_interrupt: true,
    }
  }
}

impl ContinuousTask {
  pub fn with_frame_number(mut self, frame_number: Option<usize>) -> Self {
    self.frame_number = frame_number;
    self
  }

  /// 不安装 Ctrl-C 处理器，只通过 [`ContinuousTask::stop_handle`] 停止
  pub fn without_interrupt_handler(mut self) -> Self {
    self.handle_interrupt = false;
    self
  }

  pub fn stop_handle(&self) -> Arc<AtomicBool> {
    self.stop.clone()
  }

  fn install_interrupt_handler(&self) -> anyhow::Result<()> {
    let stop = self.stop.clone();
    ctrlc::set_handler(move || {
      info!("收到中断信号，准备退出...");
      stop.store(true, Ordering::SeqCst);
      thread::spawn(|| {
        thread::sleep(FORCE_EXIT_DELAY);
        warn!("强制退出程序");
        std::process::exit(1);
      });
    })
    .context("无法设置 Ctrl-C 处理器")
  }
}

impl<RE, I, A, O> Task<I, A, O> for ContinuousTask
where
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = CameraFrame>,
  A: Analyzer,
  O: Render<A::Output, Error = RE>,
{
  type Error = anyhow::Error;

  fn run_task(self, input: I, mut analyzer: A, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    if self.handle_interrupt {
      self.install_interrupt_handler()?;
    }

    let mut processed = 0usize;
    let mut failed = 0usize;
    for frame in input {
      if self.stop.load(Ordering::SeqCst) {
        warn!("中断信号接收，退出任务循环");
        break;
      }

      processed += 1;
      info!("处理第 {} 帧图像", frame.index);
      let outcome = analyzer.analyze(&frame);
      if outcome.is_failed() {
        failed += 1;
      }
      if let Some(elapsed) = deliver(&frame, outcome, &output)? {
        info!("推理完成，耗时: {:.2?}", elapsed);
      }

      if self.frame_number.is_some_and(|n| processed >= n) {
        info!("达到指定帧数 {}, 退出任务循环", processed);
        break;
      }
    }

    info!("任务完成，共处理 {} 帧, 失败 {} 帧", processed, failed);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::analyzer::{Analysis, AnalyzerError, InferenceInfo, SkipReason};
  use crate::geometry::GeometryError;
  use image::RgbImage;
  use std::cell::RefCell;
  use std::convert::Infallible;

  /// 空帧跳过, 序号除 3 余 2 的帧失败, 其余完成
  struct ScriptedAnalyzer;

  impl Analyzer for ScriptedAnalyzer {
    type Output = u64;

    fn analyze(&mut self, frame: &CameraFrame) -> CycleOutcome<u64> {
      if frame.image.width() == 0 {
        return CycleOutcome::Skipped(SkipReason::EmptyFrame(frame.size()));
      }
      if frame.index % 3 == 2 {
        return CycleOutcome::Failed(AnalyzerError::Geometry(GeometryError::Singular {
          determinant: 0.0,
        }));
      }
      let mut info = InferenceInfo::for_frame(frame);
      info.inference_time = Duration::from_millis(frame.index + 1);
      CycleOutcome::Completed(Analysis {
        result: frame.index,
        info,
      })
    }
  }

  #[derive(Default)]
  struct Collect {
    rendered: RefCell<Vec<u64>>,
  }

  impl Render<u64> for &Collect {
    type Error = Infallible;

    fn render_result(&self, _frame: &CameraFrame, analysis: &Analysis<u64>) -> Result<(), Infallible> {
      self.rendered.borrow_mut().push(analysis.result);
      Ok(())
    }
  }

  fn frames(count: u64) -> impl Iterator<Item = CameraFrame> {
    (0..count).map(|i| CameraFrame::new(RgbImage::new(4, 4)).with_index(i))
  }

  #[test]
  fn continuous_task_keeps_going_after_failures() {
    let output = Collect::default();
    ContinuousTask::default()
      .without_interrupt_handler()
      .run_task(frames(6), ScriptedAnalyzer, &output)
      .unwrap();
    assert_eq!(*output.rendered.borrow(), vec![0, 1, 3, 4]);
  }

  #[test]
  fn continuous_task_stops_at_frame_number() {
    let output = Collect::default();
    ContinuousTask::default()
      .without_interrupt_handler()
      .with_frame_number(Some(2))
      .run_task(frames(100), ScriptedAnalyzer, &output)
      .unwrap();
    assert_eq!(*output.rendered.borrow(), vec![0, 1]);
  }

  #[test]
  fn continuous_task_honours_stop_flag() {
    let output = Collect::default();
    let task = ContinuousTask::default().without_interrupt_handler();
    task.stop_handle().store(true, Ordering::SeqCst);
    task
      .run_task(frames(10), ScriptedAnalyzer, &output)
      .unwrap();
    assert!(output.rendered.borrow().is_empty());
  }

  #[test]
  fn skipped_frames_are_not_rendered() {
    let output = Collect::default();
    let input = std::iter::once(CameraFrame::new(RgbImage::new(0, 0)));
    OneShotTask
      .run_task(input, ScriptedAnalyzer, &output)
      .unwrap();
    assert!(output.rendered.borrow().is_empty());
  }

  #[test]
  fn one_shot_reports_failure() {
    let output = Collect::default();
    let input = std::iter::once(CameraFrame::new(RgbImage::new(4, 4)).with_index(2));
    assert!(
      OneShotTask
        .run_task(input, ScriptedAnalyzer, &output)
        .is_err()
    );
  }

  #[test]
  fn repeat_shot_reuses_first_frame() {
    let output = Collect::default();
    RepeatShotTask::default()
      .with_times(5)
      .run_task(frames(3), ScriptedAnalyzer, &output)
      .unwrap();
    assert_eq!(*output.rendered.borrow(), vec![0; 5]);
  }

  #[test]
  fn average_skips_warmup_rounds() {
    let task = RepeatShotTask::default().with_warmup(2);
    let times = [100, 50, 10, 20].map(Duration::from_millis);
    assert_eq!(task.average(&times), Some(Duration::from_millis(15)));
    assert_eq!(task.average(&times[..2]), None);
    assert_eq!(task.average(&[]), None);
  }
}
