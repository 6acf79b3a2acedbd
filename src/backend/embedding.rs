// 该文件是 Shanan Task （山南任务库） 项目的一部分。
// src/backend/embedding.rs - 特征向量后处理
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

use tracing::debug;

use crate::{
  backend::check_output_count,
  engine::{OutputTensor, TensorShape},
  processor::{
    Embedding, EmbeddingOptions, EmbeddingResult, FeatureVector, l2_normalize, quantize,
  },
  status::Status,
};

/// 图像与文本嵌入共用的输出处理，每个输出层对应一个特征向量
#[derive(Debug, Clone)]
pub struct EmbeddingPostprocessor {
  options: EmbeddingOptions,
  output_shapes: Vec<TensorShape>,
}

impl EmbeddingPostprocessor {
  pub fn new(options: EmbeddingOptions, output_shapes: &[TensorShape]) -> Self {
    EmbeddingPostprocessor {
      options,
      output_shapes: output_shapes.to_vec(),
    }
  }

  pub fn options(&self) -> &EmbeddingOptions {
    &self.options
  }

  pub fn postprocess(&self, outputs: Vec<OutputTensor>) -> Result<EmbeddingResult, Status> {
    check_output_count(outputs.len(), self.output_shapes.len())?;

    let embeddings = outputs
      .into_iter()
      .enumerate()
      .map(|(output_index, output)| {
        let mut values = output.data;
        if self.options.l2_normalize {
          l2_normalize(&mut values);
        }
        let feature_vector = if self.options.quantize {
          FeatureVector::Quantized(quantize(&values))
        } else {
          FeatureVector::Float(values)
        };
        debug!("输出层 {}: 特征维度 {}", output_index, feature_vector.len());
        Embedding {
          feature_vector,
          output_index: output_index as i32,
        }
      })
      .collect();

    Ok(EmbeddingResult { embeddings })
  }

  /// 输出层的特征维度，索引无效时为 -1
  pub fn embedding_dimension(&self, output_index: i32) -> i32 {
    usize::try_from(output_index)
      .ok()
      .and_then(|index| self.output_shapes.get(index))
      .map_or(-1, |shape| shape.last_dim() as i32)
  }

  pub fn number_of_output_layers(&self) -> i32 {
    self.output_shapes.len() as i32
  }
}

/// 按位置取出结果中的特征向量
pub fn embedding_by_index(result: &EmbeddingResult, index: i32) -> Result<Embedding, Status> {
  usize::try_from(index)
    .ok()
    .and_then(|index| result.embeddings.get(index))
    .cloned()
    .ok_or_else(|| {
      Status::invalid_argument(format!(
        "Embedding index {} is out of range [0, {})",
        index,
        result.embeddings.len()
      ))
    })
}
