// 该文件是 Shanan Task （山南任务库） 项目的一部分。
// src/backend/image_embedder.rs - 图像特征提取后端
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

use tracing::info;

use crate::{
  backend::{EmbeddingPostprocessor, ImageInputSpec},
  core::{BaseOptions, load_model},
  engine::{InferenceEngine, InputTensor, LoadEngine},
  frame::ImageData,
  processor::{BoundingBox, EmbeddingOptions, EmbeddingResult, FeatureVector, cosine_similarity},
  status::Status,
};

pub struct ImageEmbedderBackend<E> {
  engine: E,
  input: ImageInputSpec,
  postprocessor: EmbeddingPostprocessor,
}

impl<E: LoadEngine> ImageEmbedderBackend<E> {
  pub fn create_from_options(
    base_options: &BaseOptions,
    options: &EmbeddingOptions,
  ) -> Result<Self, Status> {
    info!("创建图像特征提取任务");
    let model = load_model(base_options)?;
    let engine = E::load(&model, &base_options.compute_settings)?;
    Self::with_engine(engine, *options)
  }
}

impl<E: InferenceEngine> ImageEmbedderBackend<E> {
  pub fn with_engine(engine: E, options: EmbeddingOptions) -> Result<Self, Status> {
    let input = ImageInputSpec::from_engine(&engine)?;
    let postprocessor = EmbeddingPostprocessor::new(options, engine.output_shapes());
    Ok(ImageEmbedderBackend {
      engine,
      input,
      postprocessor,
    })
  }

  pub fn embed(
    &self,
    image: &ImageData<'_>,
    roi: Option<&BoundingBox>,
  ) -> Result<EmbeddingResult, Status> {
    let data = self.input.preprocess(image, roi)?;
    let shape = self.input.shape();
    let outputs = self
      .engine
      .run(&[InputTensor::UInt8 { data: &data, shape: &shape }])?;
    self.postprocessor.postprocess(outputs)
  }

  pub fn cosine_similarity(&self, u: &FeatureVector, v: &FeatureVector) -> Result<f64, Status> {
    cosine_similarity(u, v)
  }

  pub fn embedding_dimension(&self, output_index: i32) -> i32 {
    self.postprocessor.embedding_dimension(output_index)
  }

  pub fn number_of_output_layers(&self) -> i32 {
    self.postprocessor.number_of_output_layers()
  }
}
