// 该文件是 Shanan Task （山南任务库） 项目的一部分。
// tests/embedder.rs - 图像与文本特征集成测试
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

mod common;

use common::{FakeEngine, black_image, model_json, write_file};
use shanan_task::{
  core::BaseOptions,
  processor::{BoundingBox, EmbeddingOptions, FeatureVector},
  status::{StatusCode, SupportStatus},
  text::{TextEmbedder, TextEmbedderOptions},
  vision::{ImageEmbedder, ImageEmbedderOptions, TensorImage},
};

const VOCAB: &str = "[PAD]\n[UNK]\n[CLS]\n[SEP]\nhello\nworld\n";

fn image_embedder(options: EmbeddingOptions) -> ImageEmbedder<FakeEngine> {
  let model = model_json(
    &[vec![1, 4, 4, 3]],
    &[
      (vec![1, 1, 1, 4], vec![3.0, 0.0, 4.0, 0.0]),
      (vec![1, 2], vec![1.0, 1.0]),
    ],
  );
  ImageEmbedder::create_from_options(
    ImageEmbedderOptions::new(BaseOptions::from_content(model)).embedding_options(options),
  )
  .unwrap()
}

#[test]
fn image_embedding_dimensions_and_sentinel() {
  let embedder = image_embedder(EmbeddingOptions::default());
  assert_eq!(embedder.get_number_of_output_layers(), 2);
  assert_eq!(embedder.get_embedding_dimension(0), 4);
  assert_eq!(embedder.get_embedding_dimension(1), 2);
  assert_eq!(embedder.get_embedding_dimension(2), -1);
  assert_eq!(embedder.get_embedding_dimension(-3), -1);
}

#[test]
fn image_embed_and_lookup() {
  let embedder = image_embedder(EmbeddingOptions::default().l2_normalize(true));
  let pixels = black_image(8, 8);
  let image = TensorImage::create_from_array(&pixels, &[8, 8, 3]).unwrap();

  let result = embedder.embed(&image, None).unwrap();
  assert_eq!(result.embeddings.len(), 2);

  let first = embedder.get_embedding_by_index(&result, 0).unwrap();
  assert_eq!(first.output_index, 0);
  let FeatureVector::Float(values) = &first.feature_vector else {
    panic!("expected float feature vector");
  };
  assert!((values[0] - 0.6).abs() < 1e-6);
  assert!((values[2] - 0.8).abs() < 1e-6);

  let err = embedder.get_embedding_by_index(&result, 2).unwrap_err();
  assert!(err.is_validation());
  assert_eq!(err.to_string(), "Output index is out of bound.");
  assert!(embedder.get_embedding_by_index(&result, -1).unwrap_err().is_validation());
}

#[test]
fn image_embed_with_region_of_interest() {
  let embedder = image_embedder(EmbeddingOptions::default());
  let pixels = black_image(8, 8);
  let image = TensorImage::create_from_array(&pixels, &[1, 8, 8, 3]).unwrap();

  assert!(embedder.embed(&image, Some(&BoundingBox::new(0, 0, 8, 8))).is_ok());
  let err = embedder
    .embed(&image, Some(&BoundingBox::new(4, 4, 8, 8)))
    .unwrap_err();
  assert!(!err.is_validation());
}

#[test]
fn image_cosine_similarity() {
  let embedder = image_embedder(EmbeddingOptions::default().quantize(true).l2_normalize(true));
  let pixels = black_image(4, 4);
  let image = TensorImage::create_from_array(&pixels, &[4, 4, 3]).unwrap();
  let result = embedder.embed(&image, None).unwrap();
  let first = &result.embeddings[0].feature_vector;
  let second = &result.embeddings[1].feature_vector;
  assert!(first.is_quantized());

  let same = embedder.cosine_similarity(first, first).unwrap();
  assert!((same - 1.0).abs() < 1e-9);

  let err = embedder.cosine_similarity(first, second).unwrap_err();
  assert!(err.to_string().contains("different sizes (4 vs 2)"));
}

fn text_model(inputs: usize) -> Vec<u8> {
  let shapes: Vec<Vec<usize>> = vec![vec![1, 8]; inputs];
  model_json(&shapes, &[(vec![1, 3], vec![1.0, 2.0, 2.0])])
}

#[test]
fn text_embedder_requires_vocab() {
  let options = TextEmbedderOptions::new(BaseOptions::from_content(text_model(1)));
  let err = TextEmbedder::<FakeEngine>::create_from_options(options)
    .err()
    .unwrap();
  let status = err.status().unwrap();
  assert_eq!(status.code(), StatusCode::NotFound);
  assert_eq!(status.support_status(), SupportStatus::AssociatedFileNotFoundError);
}

#[test]
fn text_embed_single_and_bert_inputs() {
  let dir = tempfile::tempdir().unwrap();
  let vocab = write_file(dir.path(), "vocab.txt", VOCAB);

  for inputs in [1, 3] {
    let options = TextEmbedderOptions::new(
      BaseOptions::from_content(text_model(inputs)).vocab_file(&vocab),
    )
    .embedding_options(EmbeddingOptions::default().l2_normalize(true));
    let embedder = TextEmbedder::<FakeEngine>::create_from_options(options).unwrap();

    let result = embedder.embed("Hello world").unwrap();
    let embedding = embedder.get_embedding_by_index(&result, 0).unwrap();
    assert_eq!(embedding.feature_vector.len(), 3);
    assert_eq!(embedder.get_embedding_dimension(0), 3);
    assert_eq!(embedder.get_embedding_dimension(1), -1);
    assert!(embedder.get_embedding_by_index(&result, 1).unwrap_err().is_validation());

    let similarity = embedder
      .cosine_similarity(&embedding.feature_vector, &embedding.feature_vector)
      .unwrap();
    assert!((similarity - 1.0).abs() < 1e-6);
  }
}

#[test]
fn text_models_with_two_inputs_are_rejected() {
  let dir = tempfile::tempdir().unwrap();
  let vocab = write_file(dir.path(), "vocab.txt", VOCAB);
  let options =
    TextEmbedderOptions::new(BaseOptions::from_content(text_model(2)).vocab_file(vocab));
  let err = TextEmbedder::<FakeEngine>::create_from_options(options)
    .err()
    .unwrap();
  assert_eq!(
    err.status().unwrap().support_status(),
    SupportStatus::InvalidNumInputTensorsError
  );
}
