// 该文件是 Shanan Task （山南任务库） 项目的一部分。
// src/main.rs - 命令行主程序
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

mod args;

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use tracing::info;
use url::Url;

use shanan_task::{
  FromUrl,
  core::BaseOptions,
  engine::RknpuEngine,
  frame::RgbFrame,
  output::{DirectoryRecordOutput, Render},
  processor::FeatureVector,
  text::{TextEmbedder, TextEmbedderOptions},
  vision::{
    ImageClassifier, ImageClassifierOptions, ImageEmbedder, ImageEmbedderOptions, ObjectDetector,
    ObjectDetectorOptions, TensorImage,
  },
};

use args::{Args, Command, ModelArgs};

fn base_options(model: &ModelArgs) -> Result<BaseOptions> {
  info!("模型地址: {}", model.model);
  Ok(BaseOptions::from_url(&model.model)?)
}

fn load_image(path: &Path) -> Result<(TensorImage<'static>, RgbFrame)> {
  let image = TensorImage::create_from_file(path)?;
  let frame = image.as_image_data().to_frame()?;
  Ok((image, frame))
}

fn record<R: Serialize>(target: Option<&Url>, task: &str, frame: &RgbFrame, result: &R) -> Result<()> {
  if let Some(url) = target {
    let output = DirectoryRecordOutput::from_url(url)?.task(task);
    output.render_result(frame, result)?;
  }
  Ok(())
}

fn print_json<R: Serialize>(result: &R) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(result)?);
  Ok(())
}

fn print_similarity(similarity: f64) {
  println!("余弦相似度: {:.6}", similarity);
}

fn feature_pair(vectors: &[FeatureVector]) -> Option<(&FeatureVector, &FeatureVector)> {
  match vectors {
    [u, v] => Some((u, v)),
    _ => None,
  }
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  match args.command {
    Command::Classify {
      model,
      image,
      roi,
      filter,
    } => {
      let options = ImageClassifierOptions::new(base_options(&model)?)
        .classification_options(filter.classification_options());
      let classifier = ImageClassifier::<RknpuEngine>::create_from_options(options)?;
      let (image, frame) = load_image(&image)?;

      let now = std::time::Instant::now();
      let result = classifier.classify(&image, roi.as_ref())?;
      info!("推理完成，耗时: {:.2?}", now.elapsed());

      print_json(&result)?;
      record(model.record.as_ref(), "classify", &frame, &result)?;
    }
    Command::Detect {
      model,
      image,
      filter,
      render,
    } => {
      let options = ObjectDetectorOptions::new(base_options(&model)?)
        .detection_options(filter.detection_options());
      let detector = ObjectDetector::<RknpuEngine>::create_from_options(options)?;
      let (image, frame) = load_image(&image)?;

      let now = std::time::Instant::now();
      let result = detector.detect(&image)?;
      info!("推理完成，耗时: {:.2?}, 检测到 {} 个目标", now.elapsed(), result.len());

      print_json(&result)?;
      record(model.record.as_ref(), "detect", &frame, &result)?;

      if let Some(url) = render {
        #[cfg(feature = "save_image_file")]
        {
          let output = shanan_task::output::SaveImageFileOutput::from_url(&url)?;
          output.render_result(&frame, &result)?;
        }
        #[cfg(not(feature = "save_image_file"))]
        anyhow::bail!("未启用 save_image_file 功能, 无法输出到 {}", url);
      }
    }
    Command::EmbedImage {
      model,
      image,
      roi,
      embedding,
    } => {
      let options = ImageEmbedderOptions::new(base_options(&model)?)
        .embedding_options(embedding.embedding_options());
      let embedder = ImageEmbedder::<RknpuEngine>::create_from_options(options)?;
      info!("输出层数量: {}", embedder.get_number_of_output_layers());

      let mut vectors = Vec::new();
      for path in image.iter() {
        let (image, frame) = load_image(path)?;
        let result = embedder.embed(&image, roi.as_ref())?;
        print_json(&result)?;
        record(model.record.as_ref(), "embed-image", &frame, &result)?;
        vectors.push(embedder.get_embedding_by_index(&result, 0)?.feature_vector);
      }

      if let Some((u, v)) = feature_pair(&vectors) {
        print_similarity(embedder.cosine_similarity(u, v)?);
      }
    }
    Command::EmbedText {
      model,
      text,
      embedding,
    } => {
      let options = TextEmbedderOptions::new(base_options(&model)?)
        .embedding_options(embedding.embedding_options());
      let embedder = TextEmbedder::<RknpuEngine>::create_from_options(options)?;

      let mut vectors = Vec::new();
      for text in text.iter() {
        let result = embedder.embed(text)?;
        print_json(&result)?;
        vectors.push(embedder.get_embedding_by_index(&result, 0)?.feature_vector);
      }

      if let Some((u, v)) = feature_pair(&vectors) {
        print_similarity(embedder.cosine_similarity(u, v)?);
      }
    }
  }

  Ok(())
}
