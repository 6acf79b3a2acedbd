// 该文件是 Shanan Task （山南任务库） 项目的一部分。
// src/core/base_options.rs - 模型来源配置
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

use std::{collections::BTreeMap, path::PathBuf};

use thiserror::Error;
use tracing::error;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme};

/// 通过文件描述符引用模型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileDescriptorMeta {
  pub fd: i32,
  /// 读取长度，0 表示读到文件末尾
  pub length: u64,
  pub offset: u64,
}

/// 推理引擎的运行参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeSettings {
  /// 推理线程数，-1 表示交给引擎决定
  pub num_threads: i32,
  /// 覆盖模型输入形状，例如 `[1, 224, 224, 3]`
  pub input_shape: Option<Vec<usize>>,
}

impl Default for ComputeSettings {
  fn default() -> Self {
    ComputeSettings {
      num_threads: -1,
      input_shape: None,
    }
  }
}

/// 模型来源
///
/// `file_content`、`file_name`、`file_descriptor_meta` 至少设置一项；
/// 标签、多语言显示名和词表是模型的附属文件。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BaseOptions {
  pub file_name: Option<PathBuf>,
  pub file_content: Option<Vec<u8>>,
  pub file_descriptor_meta: Option<FileDescriptorMeta>,
  pub compute_settings: ComputeSettings,
  pub label_file: Option<PathBuf>,
  /// locale -> 显示名文件
  pub display_names_files: BTreeMap<String, PathBuf>,
  pub vocab_file: Option<PathBuf>,
}

impl BaseOptions {
  pub fn from_file(path: impl Into<PathBuf>) -> Self {
    BaseOptions {
      file_name: Some(path.into()),
      ..Default::default()
    }
  }

  pub fn from_content(content: impl Into<Vec<u8>>) -> Self {
    BaseOptions {
      file_content: Some(content.into()),
      ..Default::default()
    }
  }

  pub fn from_descriptor(meta: FileDescriptorMeta) -> Self {
    BaseOptions {
      file_descriptor_meta: Some(meta),
      ..Default::default()
    }
  }

  pub fn num_threads(mut self, num_threads: i32) -> Self {
    self.compute_settings.num_threads = num_threads;
    self
  }

  pub fn input_shape(mut self, shape: impl Into<Vec<usize>>) -> Self {
    self.compute_settings.input_shape = Some(shape.into());
    self
  }

  pub fn label_file(mut self, path: impl Into<PathBuf>) -> Self {
    self.label_file = Some(path.into());
    self
  }

  pub fn display_names_file(mut self, locale: impl Into<String>, path: impl Into<PathBuf>) -> Self {
    self.display_names_files.insert(locale.into(), path.into());
    self
  }

  pub fn vocab_file(mut self, path: impl Into<PathBuf>) -> Self {
    self.vocab_file = Some(path.into());
    self
  }
}

#[derive(Error, Debug)]
pub enum BaseOptionsUrlError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("无效的查询参数 {0}: {1}")]
  InvalidQuery(String, String),
  #[error("路径解码失败: {0}")]
  PathDecode(#[from] std::string::FromUtf8Error),
}

impl FromUrlWithScheme for BaseOptions {
  const SCHEME: &'static str = "file";
}

fn decode_path(path: &str) -> Result<PathBuf, BaseOptionsUrlError> {
  Ok(PathBuf::from(urlencoding::decode(path)?.into_owned()))
}

impl FromUrl for BaseOptions {
  type Error = BaseOptionsUrlError;

  /// 解析形如 `file:///models/ssd.rknn?threads=2&input=1,300,300,3&labels=/models/coco.txt` 的地址
  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(BaseOptionsUrlError::SchemeMismatch(format!(
        "期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }

    let mut options = BaseOptions::from_file(decode_path(url.path())?);
    for (key, value) in url.query_pairs() {
      match &*key {
        "threads" => {
          let threads = value
            .parse::<i32>()
            .map_err(|e| BaseOptionsUrlError::InvalidQuery(key.to_string(), e.to_string()))?;
          options = options.num_threads(threads);
        }
        "input" => {
          let shape = value
            .split(',')
            .map(|dim| dim.trim().parse::<usize>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| BaseOptionsUrlError::InvalidQuery(key.to_string(), e.to_string()))?;
          options = options.input_shape(shape);
        }
        "labels" => options = options.label_file(value.into_owned()),
        "vocab" => options = options.vocab_file(value.into_owned()),
        other => {
          if let Some(locale) = other.strip_prefix("display_names.") {
            options = options.display_names_file(locale, value.into_owned());
          } else {
            return Err(BaseOptionsUrlError::InvalidQuery(
              other.to_string(),
              "未知参数".to_string(),
            ));
          }
        }
      }
    }

    Ok(options)
  }
}
