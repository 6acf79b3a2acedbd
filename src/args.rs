// 该文件是 Shanan Task （山南任务库） 项目的一部分。
// src/args.rs - 命令行参数
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

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use url::Url;

use shanan_task::processor::{
  BoundingBox, ClassificationOptions, DetectionOptions, EmbeddingOptions,
};

/// Shanan Task 命令行
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  #[command(subcommand)]
  pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// 图像分类
  Classify {
    #[command(flatten)]
    model: ModelArgs,
    /// 输入图像
    #[arg(long, value_name = "FILE")]
    image: PathBuf,
    /// 感兴趣区域 x,y,width,height
    #[arg(long, value_name = "ROI", value_parser = parse_roi)]
    roi: Option<BoundingBox>,
    #[command(flatten)]
    filter: FilterArgs,
  },
  /// 目标检测
  Detect {
    #[command(flatten)]
    model: ModelArgs,
    #[arg(long, value_name = "FILE")]
    image: PathBuf,
    #[command(flatten)]
    filter: FilterArgs,
    /// 绘制检测框后保存，例如 image:///tmp/out.png
    #[arg(long, value_name = "OUTPUT")]
    render: Option<Url>,
  },
  /// 图像特征，给出两幅图像时输出余弦相似度
  EmbedImage {
    #[command(flatten)]
    model: ModelArgs,
    #[arg(long, value_name = "FILE", num_args = 1..=2, required = true)]
    image: Vec<PathBuf>,
    #[arg(long, value_name = "ROI", value_parser = parse_roi)]
    roi: Option<BoundingBox>,
    #[command(flatten)]
    embedding: EmbeddingArgs,
  },
  /// 文本特征，给出两段文本时输出余弦相似度
  EmbedText {
    #[command(flatten)]
    model: ModelArgs,
    #[arg(long, value_name = "TEXT", num_args = 1..=2, required = true)]
    text: Vec<String>,
    #[command(flatten)]
    embedding: EmbeddingArgs,
  },
}

#[derive(ClapArgs, Debug)]
pub struct ModelArgs {
  /// 模型地址，例如 file:///path/model.rknn?labels=/path/labels.txt
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 结果记录目录，例如 folder:///var/records?image
  #[arg(long, value_name = "RECORD")]
  pub record: Option<Url>,
}

#[derive(ClapArgs, Debug)]
pub struct FilterArgs {
  /// 最多返回的结果数
  #[arg(long, value_name = "COUNT", allow_negative_numbers = true)]
  pub max_results: Option<i32>,
  /// 分数阈值 (0.0 - 1.0)
  #[arg(long, value_name = "THRESHOLD")]
  pub score_threshold: Option<f32>,
  /// 只保留这些类别
  #[arg(long, value_name = "NAME", value_delimiter = ',')]
  pub allow: Vec<String>,
  /// 排除这些类别
  #[arg(long, value_name = "NAME", value_delimiter = ',')]
  pub deny: Vec<String>,
  /// 显示名语言
  #[arg(long, value_name = "LOCALE")]
  pub locale: Option<String>,
}

#[derive(ClapArgs, Debug)]
pub struct EmbeddingArgs {
  #[arg(long)]
  pub l2_normalize: bool,
  #[arg(long)]
  pub quantize: bool,
}

fn parse_roi(value: &str) -> Result<BoundingBox, String> {
  let parts = value
    .split(',')
    .map(|part| part.trim().parse::<i32>())
    .collect::<Result<Vec<_>, _>>()
    .map_err(|err| format!("无效的区域 '{}': {}", value, err))?;
  match parts.as_slice() {
    &[x, y, width, height] => Ok(BoundingBox::new(x, y, width, height)),
    _ => Err(format!("区域应为 x,y,width,height, 实际为 '{}'", value)),
  }
}

impl FilterArgs {
  pub fn classification_options(&self) -> ClassificationOptions {
    ClassificationOptions {
      display_names_locale: self.locale.clone(),
      max_results: self.max_results,
      score_threshold: self.score_threshold,
      class_name_allowlist: self.allow.clone(),
      class_name_denylist: self.deny.clone(),
    }
  }

  pub fn detection_options(&self) -> DetectionOptions {
    DetectionOptions {
      display_names_locale: self.locale.clone(),
      max_results: self.max_results,
      score_threshold: self.score_threshold,
      class_name_allowlist: self.allow.clone(),
      class_name_denylist: self.deny.clone(),
    }
  }
}

impl EmbeddingArgs {
  pub fn embedding_options(&self) -> EmbeddingOptions {
    EmbeddingOptions::default()
      .l2_normalize(self.l2_normalize)
      .quantize(self.quantize)
  }
}
