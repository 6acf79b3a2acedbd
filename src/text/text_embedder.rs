// 该文件是 Shanan Task （山南任务库） 项目的一部分。
// src/text/text_embedder.rs - 文本特征提取
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

use std::path::Path;

use tracing::warn;

use crate::{
  backend::{TextEmbedderBackend, embedding_by_index},
  core::BaseOptions,
  engine::{InferenceEngine, LoadEngine},
  error::{TaskError, TaskResult},
  processor::{Embedding, EmbeddingOptions, EmbeddingResult, FeatureVector},
};

#[derive(Debug, Clone, PartialEq)]
pub struct TextEmbedderOptions {
  pub base_options: BaseOptions,
  pub embedding_options: EmbeddingOptions,
}

impl TextEmbedderOptions {
  pub fn new(base_options: BaseOptions) -> Self {
    TextEmbedderOptions {
      base_options,
      embedding_options: EmbeddingOptions::default(),
    }
  }

  pub fn embedding_options(mut self, options: EmbeddingOptions) -> Self {
    self.embedding_options = options;
    self
  }
}

/// 文本特征提取，模型需要通过 `BaseOptions::vocab_file` 提供词表
pub struct TextEmbedder<E> {
  backend: TextEmbedderBackend<E>,
  options: TextEmbedderOptions,
}

impl<E: LoadEngine> TextEmbedder<E> {
  pub fn create_from_file(path: impl AsRef<Path>) -> TaskResult<Self> {
    let base_options = BaseOptions::from_file(path.as_ref());
    Self::create_from_options(TextEmbedderOptions::new(base_options))
  }

  pub fn create_from_options(options: TextEmbedderOptions) -> TaskResult<Self> {
    let backend =
      TextEmbedderBackend::create_from_options(&options.base_options, &options.embedding_options)?;
    Ok(TextEmbedder { backend, options })
  }
}

impl<E: InferenceEngine> TextEmbedder<E> {
  pub fn options(&self) -> &TextEmbedderOptions {
    &self.options
  }

  pub fn embed(&self, text: &str) -> TaskResult<EmbeddingResult> {
    Ok(self.backend.embed(text)?)
  }

  pub fn cosine_similarity(&self, u: &FeatureVector, v: &FeatureVector) -> TaskResult<f64> {
    Ok(self.backend.cosine_similarity(u, v)?)
  }

  pub fn get_embedding_dimension(&self, output_index: i32) -> i32 {
    self.backend.embedding_dimension(output_index)
  }

  pub fn get_number_of_output_layers(&self) -> i32 {
    self.backend.number_of_output_layers()
  }

  pub fn get_embedding_by_index(
    &self,
    result: &EmbeddingResult,
    output_index: i32,
  ) -> TaskResult<Embedding> {
    if output_index < 0 || output_index as usize >= result.embeddings.len() {
      warn!("输出索引 {} 越界", output_index);
      return Err(TaskError::validation("Output index is out of bound."));
    }
    Ok(embedding_by_index(result, output_index)?)
  }
}
