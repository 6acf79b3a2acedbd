// 该文件是 Shanan Task （山南任务库） 项目的一部分。
// tests/common/mod.rs - 集成测试公共工具
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

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::json;

use shanan_task::{
  core::ComputeSettings,
  engine::{InferenceEngine, InputTensor, LoadEngine, OutputTensor, TensorShape},
  status::{Status, StatusCode, SupportStatus},
};

#[derive(Deserialize)]
struct FakeOutput {
  shape: Vec<usize>,
  data: Vec<f32>,
}

/// 模型文件就是一段 JSON：输入形状加上固定的输出
#[derive(Deserialize)]
struct FakeModel {
  inputs: Vec<Vec<usize>>,
  outputs: Vec<FakeOutput>,
}

pub struct FakeEngine {
  input_shapes: Vec<TensorShape>,
  output_shapes: Vec<TensorShape>,
  outputs: Vec<OutputTensor>,
}

impl LoadEngine for FakeEngine {
  fn load(model: &[u8], _settings: &ComputeSettings) -> Result<Self, Status> {
    let model: FakeModel = serde_json::from_slice(model).map_err(|e| {
      Status::new(
        StatusCode::InvalidArgument,
        format!("Model provided has invalid format: {}", e),
        SupportStatus::InvalidModelError,
      )
    })?;

    let outputs: Vec<OutputTensor> = model
      .outputs
      .into_iter()
      .map(|o| OutputTensor::new(TensorShape::new(o.shape), o.data))
      .collect();
    Ok(FakeEngine {
      input_shapes: model.inputs.into_iter().map(TensorShape::new).collect(),
      output_shapes: outputs.iter().map(|o| o.shape.clone()).collect(),
      outputs,
    })
  }
}

impl InferenceEngine for FakeEngine {
  fn input_shapes(&self) -> &[TensorShape] {
    &self.input_shapes
  }

  fn output_shapes(&self) -> &[TensorShape] {
    &self.output_shapes
  }

  fn run(&self, inputs: &[InputTensor<'_>]) -> Result<Vec<OutputTensor>, Status> {
    if inputs.len() != self.input_shapes.len() {
      return Err(Status::internal(
        format!("expected {} inputs, got {}", self.input_shapes.len(), inputs.len()),
        SupportStatus::InvalidNumInputTensorsError,
      ));
    }
    for (input, shape) in inputs.iter().zip(self.input_shapes.iter()) {
      if input.len() != shape.element_count() {
        return Err(Status::internal(
          format!("input of {} elements does not fit {:?}", input.len(), shape.dims),
          SupportStatus::InvalidInputTensorDimensionsError,
        ));
      }
    }
    Ok(self.outputs.clone())
  }
}

pub fn model_json(inputs: &[Vec<usize>], outputs: &[(Vec<usize>, Vec<f32>)]) -> Vec<u8> {
  let outputs: Vec<_> = outputs
    .iter()
    .map(|(shape, data)| json!({ "shape": shape, "data": data }))
    .collect();
  serde_json::to_vec(&json!({ "inputs": inputs, "outputs": outputs })).unwrap()
}

pub fn write_file(dir: &Path, name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
  let path = dir.join(name);
  std::fs::write(&path, contents).unwrap();
  path
}

/// 全黑的 RGB 图像
pub fn black_image(width: usize, height: usize) -> Vec<u8> {
  vec![0u8; width * height * 3]
}
