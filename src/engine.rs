// 该文件是 Shanan Task （山南任务库） 项目的一部分。
// src/engine.rs - 推理引擎边界
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

//! 推理引擎只负责“张量进、张量出”。模型解析与算子执行都在引擎内部，
//! 任务层（[`crate::backend`]）在此之上完成预处理与后处理。
//!
//! 同一个引擎句柄能否被多个线程同时使用，取决于具体实现是否为 `Sync`；
//! 任务对象不额外加锁。

use crate::{core::ComputeSettings, status::Status};

#[cfg(feature = "rknpu")]
mod rknpu;
#[cfg(feature = "rknpu")]
pub use self::rknpu::RknpuEngine;

/// 张量形状
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorShape {
  pub dims: Vec<usize>,
}

impl TensorShape {
  pub fn new(dims: impl Into<Vec<usize>>) -> Self {
    TensorShape { dims: dims.into() }
  }

  pub fn element_count(&self) -> usize {
    self.dims.iter().product()
  }

  /// 最后一维，标量视为 1
  pub fn last_dim(&self) -> usize {
    self.dims.last().copied().unwrap_or(1)
  }

  /// 按 NHWC 解读，返回 (height, width, channels)
  pub fn as_nhwc(&self) -> Option<(usize, usize, usize)> {
    match self.dims.as_slice() {
      [1, h, w, c] => Some((*h, *w, *c)),
      [h, w, c] => Some((*h, *w, *c)),
      _ => None,
    }
  }
}

/// 送入引擎的张量
#[derive(Debug, Clone, Copy)]
pub enum InputTensor<'a> {
  /// NHWC 排列的图像数据
  UInt8 { data: &'a [u8], shape: &'a TensorShape },
  /// 文本 token id 等整数输入
  Int32 { data: &'a [i32], shape: &'a TensorShape },
}

impl InputTensor<'_> {
  pub fn shape(&self) -> &TensorShape {
    match self {
      InputTensor::UInt8 { shape, .. } => shape,
      InputTensor::Int32 { shape, .. } => shape,
    }
  }

  pub fn len(&self) -> usize {
    match self {
      InputTensor::UInt8 { data, .. } => data.len(),
      InputTensor::Int32 { data, .. } => data.len(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// 引擎输出，已反量化为 f32
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTensor {
  pub shape: TensorShape,
  pub data: Vec<f32>,
}

impl OutputTensor {
  pub fn new(shape: TensorShape, data: Vec<f32>) -> Self {
    OutputTensor { shape, data }
  }

  pub fn as_slice(&self) -> &[f32] {
    &self.data
  }
}

pub trait InferenceEngine {
  fn input_shapes(&self) -> &[TensorShape];
  fn output_shapes(&self) -> &[TensorShape];
  fn run(&self, inputs: &[InputTensor<'_>]) -> Result<Vec<OutputTensor>, Status>;
}

pub trait LoadEngine: InferenceEngine + Sized {
  fn load(model: &[u8], settings: &ComputeSettings) -> Result<Self, Status>;
}
