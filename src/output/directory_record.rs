// 该文件是 Shanan Task （山南任务库） 项目的一部分。
// src/output/directory_record.rs - 目录记录输出
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

use std::{
  path::{Path, PathBuf},
  sync::atomic::{AtomicU16, Ordering},
};

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::RgbFrame,
  output::{OutputError, Render},
};

/// 写入磁盘的一条任务记录
#[derive(Debug, Serialize)]
pub struct TaskRecord<'a, R> {
  pub task: &'a str,
  pub timestamp: DateTime<Utc>,
  pub width: u32,
  pub height: u32,
  pub result: &'a R,
}

/// `folder:///path/to/dir[?image]`
///
/// 按 `年/月/日` 分目录保存 JSON 记录，带 `image` 参数时同时保存输入图像。
pub struct DirectoryRecordOutput {
  directory: PathBuf,
  task: String,
  save_image: bool,
  counter: AtomicU16,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = OutputError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(OutputError::SchemeMismatch(format!(
        "期望记录方式 '{}', 实际记录方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    let directory = urlencoding::decode(uri.path())?;
    let save_image = uri.query_pairs().any(|(k, _)| k == "image");
    Ok(DirectoryRecordOutput::new(directory.into_owned()).save_image(save_image))
  }
}

impl DirectoryRecordOutput {
  pub fn new(directory: impl Into<PathBuf>) -> Self {
    DirectoryRecordOutput {
      directory: directory.into(),
      task: String::from("task"),
      save_image: false,
      counter: AtomicU16::new(0),
    }
  }

  pub fn task(mut self, task: impl Into<String>) -> Self {
    self.task = task.into();
    self
  }

  pub fn save_image(mut self, save_image: bool) -> Self {
    self.save_image = save_image;
    self
  }

  pub fn directory(&self) -> &Path {
    &self.directory
  }

  fn record_path(&self, now: &DateTime<Utc>) -> Result<PathBuf, OutputError> {
    let directory = self
      .directory
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()));
    std::fs::create_dir_all(&directory)?;

    let id = self.counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
    Ok(directory.join(format!("{}-{:04X}.json", now.format("%H-%M-%S"), id)))
  }

  /// 写入一条记录，返回 JSON 文件路径
  pub fn record<R: Serialize>(&self, frame: &RgbFrame, result: &R) -> Result<PathBuf, OutputError> {
    let now = Utc::now();
    let path = self.record_path(&now)?;
    let record = TaskRecord {
      task: &self.task,
      timestamp: now,
      width: frame.width(),
      height: frame.height(),
      result,
    };
    std::fs::write(&path, serde_json::to_vec_pretty(&record)?)?;
    debug!("写入记录: {}", path.display());

    if self.save_image {
      let image_path = path.with_extension("png");
      frame.as_rgb_image().save(&image_path)?;
      info!("保存输入图像: {}", image_path.display());
    }
    Ok(path)
  }
}

impl<R: Serialize> Render<R> for DirectoryRecordOutput {
  type Error = OutputError;

  fn render_result(&self, frame: &RgbFrame, result: &R) -> Result<(), Self::Error> {
    self.record(frame, result).map(|_| ())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::processor::{Category, ClassificationResult, Classifications};

  #[test]
  fn test_from_url_query() {
    let url = Url::parse("folder:///var/records?image").unwrap();
    let output = DirectoryRecordOutput::from_url(&url).unwrap();
    assert_eq!(output.directory(), Path::new("/var/records"));
    assert!(output.save_image);
  }

  #[test]
  fn test_record_writes_dated_json() {
    let dir = tempfile::tempdir().unwrap();
    let output = DirectoryRecordOutput::new(dir.path()).task("classify");
    let frame = RgbFrame::from(image::RgbImage::new(4, 2));
    let result = ClassificationResult {
      classifications: vec![Classifications {
        classes: vec![Category {
          index: 3,
          score: 0.5,
          display_name: String::new(),
          class_name: "cat".to_string(),
        }],
        head_index: 0,
        head_name: String::new(),
      }],
    };

    let path = output.record(&frame, &result).unwrap();
    assert!(path.starts_with(dir.path()));
    let json: serde_json::Value =
      serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(json["task"], "classify");
    assert_eq!(json["width"], 4);
    assert_eq!(json["result"]["classifications"][0]["classes"][0]["class_name"], "cat");

    let second = output.record(&frame, &result).unwrap();
    assert_ne!(path, second);
  }
}
