// 该文件是 Shanan Task （山南任务库） 项目的一部分。
// src/engine/rknpu.rs - RKNPU 推理后端
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

use std::sync::Mutex;

use rknpu::{Context, InitFlags, TensorFormat, TensorType};
use tracing::{debug, error, info};

use crate::{
  core::ComputeSettings,
  engine::{InferenceEngine, InputTensor, LoadEngine, OutputTensor, TensorShape},
  status::{Status, StatusCode, SupportStatus},
};

const DEFAULT_INPUT_SHAPE: [usize; 4] = [1, 640, 640, 3];

fn runtime_error(step: &str, e: rknpu::Error) -> Status {
  error!("RKNN {}失败: {}", step, e);
  Status::internal(
    format!("RKNN {} failed: {}", step, e),
    SupportStatus::EngineRuntimeError,
  )
}

/// 基于 RKNN 运行时的推理引擎
///
/// RKNN 上下文的 set_input/run/get_outputs 必须成组执行，这里用互斥锁串行化，
/// 因此同一个引擎可以在线程间共享。
pub struct RknpuEngine {
  context: Mutex<Context>,
  input_shapes: Vec<TensorShape>,
  output_shapes: Vec<TensorShape>,
}

impl std::fmt::Debug for RknpuEngine {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("RknpuEngine")
      .field("input_shapes", &self.input_shapes)
      .field("output_shapes", &self.output_shapes)
      .finish()
  }
}

fn set_inputs(context: &Context, inputs: &[InputTensor<'_>]) -> Result<(), Status> {
  for (index, input) in inputs.iter().enumerate() {
    debug!("设置第 {} 个输入, 元素数 {}", index, input.len());
    match input {
      InputTensor::UInt8 { data, .. } => {
        context
          .set_input(index as _, data, TensorFormat::NHWC, TensorType::UInt8)
          .map_err(|e| runtime_error("设置输入", e))?;
      }
      InputTensor::Int32 { data, .. } => {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_ne_bytes()).collect();
        context
          .set_input(index as _, &bytes, TensorFormat::NHWC, TensorType::Int32)
          .map_err(|e| runtime_error("设置输入", e))?;
      }
    }
  }
  Ok(())
}

fn collect_outputs(context: &Context, num_outputs: usize) -> Result<Vec<Vec<f32>>, Status> {
  let output = context
    .get_outputs()
    .map_err(|e| runtime_error("获取输出", e))?;
  (0..num_outputs)
    .map(|index| {
      output
        .get_f32(index)
        .map(|data| data.to_vec())
        .map_err(|e| runtime_error("读取输出", e))
    })
    .collect()
}

impl LoadEngine for RknpuEngine {
  fn load(model: &[u8], settings: &ComputeSettings) -> Result<Self, Status> {
    info!("创建 RKNN 推理上下文");
    let context = Context::new(model, InitFlags::default()).map_err(|e| {
      error!("模型加载失败: {}", e);
      Status::new(
        StatusCode::InvalidArgument,
        format!("Model provided has invalid format: {}", e),
        SupportStatus::InvalidModelError,
      )
    })?;

    match context.sdk_version() {
      Ok(version) => {
        if let Ok(api_ver) = version.api_version() {
          debug!("模型 API 版本: {}", api_ver);
        }
        if let Ok(drv_ver) = version.driver_version() {
          debug!("模型驱动版本: {}", drv_ver);
        }
      }
      Err(e) => return Err(runtime_error("查询 SDK 版本", e)),
    }

    if settings.num_threads > 0 {
      debug!("RKNN 不按线程数调度, 忽略 num_threads={}", settings.num_threads);
    }

    let num_inputs = context
      .num_inputs()
      .map_err(|e| runtime_error("获取输入数量", e))? as usize;
    let num_outputs = context
      .num_outputs()
      .map_err(|e| runtime_error("获取输出数量", e))? as usize;
    debug!("模型输入数量: {}", num_inputs);
    debug!("模型输出数量: {}", num_outputs);

    if num_inputs == 0 || num_outputs == 0 {
      return Err(Status::new(
        StatusCode::InvalidArgument,
        format!(
          "Model must have at least one input and one output, found {} and {}",
          num_inputs, num_outputs
        ),
        SupportStatus::InvalidNumOutputTensorsError,
      ));
    }

    let input_shape = TensorShape::new(
      settings
        .input_shape
        .clone()
        .unwrap_or_else(|| DEFAULT_INPUT_SHAPE.to_vec()),
    );
    let input_shapes = vec![input_shape; num_inputs];

    // RKNN 不直接给出输出维度，用一次全零推理获得输出大小
    debug!("执行预热推理以确定输出形状");
    let zeros_u8 = vec![0u8; input_shapes[0].element_count()];
    let zeros_i32 = vec![0i32; input_shapes[0].element_count()];
    let warmup: Vec<InputTensor<'_>> = input_shapes
      .iter()
      .map(|shape| {
        if num_inputs == 1 && shape.as_nhwc().is_some() {
          InputTensor::UInt8 { data: &zeros_u8, shape }
        } else {
          InputTensor::Int32 { data: &zeros_i32, shape }
        }
      })
      .collect();
    set_inputs(&context, &warmup)?;
    context.run().map_err(|e| runtime_error("预热推理", e))?;
    let output_shapes: Vec<TensorShape> = collect_outputs(&context, num_outputs)?
      .iter()
      .map(|data| TensorShape::new([1, data.len()]))
      .collect();
    debug!("模型输出形状: {:?}", output_shapes);

    info!("模型加载完成");
    Ok(RknpuEngine {
      context: Mutex::new(context),
      input_shapes,
      output_shapes,
    })
  }
}

impl InferenceEngine for RknpuEngine {
  fn input_shapes(&self) -> &[TensorShape] {
    &self.input_shapes
  }

  fn output_shapes(&self) -> &[TensorShape] {
    &self.output_shapes
  }

  fn run(&self, inputs: &[InputTensor<'_>]) -> Result<Vec<OutputTensor>, Status> {
    let context = self.context.lock().map_err(|_| {
      Status::internal("RKNN context lock poisoned", SupportStatus::EngineRuntimeError)
    })?;

    set_inputs(&context, inputs)?;
    debug!("执行模型推理");
    context.run().map_err(|e| runtime_error("推理", e))?;

    debug!("获取模型输出");
    let outputs = collect_outputs(&context, self.output_shapes.len())?;
    Ok(
      outputs
        .into_iter()
        .zip(self.output_shapes.iter())
        .map(|(data, shape)| OutputTensor::new(shape.clone(), data))
        .collect(),
    )
  }
}
