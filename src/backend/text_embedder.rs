// 该文件是 Shanan Task （山南任务库） 项目的一部分。
// src/backend/text_embedder.rs - 文本特征提取后端
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

use tracing::{debug, error, info};

use crate::{
  backend::EmbeddingPostprocessor,
  core::{BaseOptions, load_model, read_associated_file},
  engine::{InferenceEngine, InputTensor, LoadEngine, TensorShape},
  processor::{EmbeddingOptions, EmbeddingResult, FeatureVector, WordpieceTokenizer, cosine_similarity},
  status::{Status, StatusCode, SupportStatus},
};

/// BERT 类模型：ids、mask、segment ids
const BERT_NUM_INPUTS: usize = 3;

pub struct TextEmbedderBackend<E> {
  engine: E,
  tokenizer: WordpieceTokenizer,
  seq_len: usize,
  postprocessor: EmbeddingPostprocessor,
}

impl<E: LoadEngine> TextEmbedderBackend<E> {
  pub fn create_from_options(
    base_options: &BaseOptions,
    options: &EmbeddingOptions,
  ) -> Result<Self, Status> {
    info!("创建文本特征提取任务");
    let model = load_model(base_options)?;
    let Some(vocab_file) = base_options.vocab_file.as_deref() else {
      error!("文本模型缺少词表文件");
      return Err(Status::new(
        StatusCode::NotFound,
        "Unable to find the vocabulary file: no `vocab_file` is associated with the model.",
        SupportStatus::AssociatedFileNotFoundError,
      ));
    };
    let tokenizer = WordpieceTokenizer::from_vocab(&read_associated_file(vocab_file)?)?;
    let engine = E::load(&model, &base_options.compute_settings)?;
    Self::with_engine(engine, tokenizer, *options)
  }
}

impl<E: InferenceEngine> TextEmbedderBackend<E> {
  pub fn with_engine(
    engine: E,
    tokenizer: WordpieceTokenizer,
    options: EmbeddingOptions,
  ) -> Result<Self, Status> {
    let inputs = engine.input_shapes();
    if inputs.len() != 1 && inputs.len() != BERT_NUM_INPUTS {
      error!("文本模型输入数量不支持: {}", inputs.len());
      return Err(Status::new(
        StatusCode::InvalidArgument,
        format!(
          "Text models are expected to have 1 or {} inputs, found {}",
          BERT_NUM_INPUTS,
          inputs.len()
        ),
        SupportStatus::InvalidNumInputTensorsError,
      ));
    }

    let seq_len = inputs[0].last_dim();
    if seq_len < 2 {
      return Err(Status::new(
        StatusCode::InvalidArgument,
        format!("Input sequence length must be at least 2, found {}", seq_len),
        SupportStatus::InvalidInputTensorDimensionsError,
      ));
    }
    debug!("文本模型输入: {} 个, 序列长度 {}", inputs.len(), seq_len);

    let postprocessor = EmbeddingPostprocessor::new(options, engine.output_shapes());
    Ok(TextEmbedderBackend {
      engine,
      tokenizer,
      seq_len,
      postprocessor,
    })
  }

  pub fn embed(&self, text: &str) -> Result<EmbeddingResult, Status> {
    let encoding = self.tokenizer.encode(text, self.seq_len);
    let shape = TensorShape::new([1, self.seq_len]);

    let outputs = if self.engine.input_shapes().len() == BERT_NUM_INPUTS {
      self.engine.run(&[
        InputTensor::Int32 { data: &encoding.ids, shape: &shape },
        InputTensor::Int32 { data: &encoding.mask, shape: &shape },
        InputTensor::Int32 { data: &encoding.segment_ids, shape: &shape },
      ])?
    } else {
      self
        .engine
        .run(&[InputTensor::Int32 { data: &encoding.ids, shape: &shape }])?
    };
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
