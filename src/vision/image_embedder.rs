// 该文件是 Shanan Task （山南任务库） 项目的一部分。
// src/vision/image_embedder.rs - 图像特征提取
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
  backend::{ImageEmbedderBackend, embedding_by_index},
  core::BaseOptions,
  engine::{InferenceEngine, LoadEngine},
  error::{TaskError, TaskResult},
  processor::{BoundingBox, Embedding, EmbeddingOptions, EmbeddingResult, FeatureVector},
  vision::TensorImage,
};

#[derive(Debug, Clone, PartialEq)]
pub struct ImageEmbedderOptions {
  pub base_options: BaseOptions,
  pub embedding_options: EmbeddingOptions,
}

impl ImageEmbedderOptions {
  pub fn new(base_options: BaseOptions) -> Self {
    ImageEmbedderOptions {
      base_options,
      embedding_options: EmbeddingOptions::default(),
    }
  }

  pub fn embedding_options(mut self, options: EmbeddingOptions) -> Self {
    self.embedding_options = options;
    self
  }
}

pub struct ImageEmbedder<E> {
  backend: ImageEmbedderBackend<E>,
  options: ImageEmbedderOptions,
}

impl<E: LoadEngine> ImageEmbedder<E> {
  pub fn create_from_file(path: impl AsRef<Path>) -> TaskResult<Self> {
    let base_options = BaseOptions::from_file(path.as_ref());
    Self::create_from_options(ImageEmbedderOptions::new(base_options))
  }

  pub fn create_from_options(options: ImageEmbedderOptions) -> TaskResult<Self> {
    let backend =
      ImageEmbedderBackend::create_from_options(&options.base_options, &options.embedding_options)?;
    Ok(ImageEmbedder { backend, options })
  }
}

impl<E: InferenceEngine> ImageEmbedder<E> {
  pub fn options(&self) -> &ImageEmbedderOptions {
    &self.options
  }

  pub fn embed(
    &self,
    image: &TensorImage<'_>,
    roi: Option<&BoundingBox>,
  ) -> TaskResult<EmbeddingResult> {
    Ok(self.backend.embed(&image.as_image_data(), roi)?)
  }

  pub fn cosine_similarity(&self, u: &FeatureVector, v: &FeatureVector) -> TaskResult<f64> {
    Ok(self.backend.cosine_similarity(u, v)?)
  }

  /// 指定输出层的特征维度，索引无效时返回 -1 而不是报错
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
      warn!(
        "输出索引 {} 越界, 共 {} 个特征向量",
        output_index,
        result.embeddings.len()
      );
      return Err(TaskError::validation("Output index is out of bound."));
    }
    Ok(embedding_by_index(result, output_index)?)
  }
}
