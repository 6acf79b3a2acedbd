// 该文件是 Shanan Task （山南任务库） 项目的一部分。
// src/core/labels.rs - 类别标签
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

use tracing::{debug, warn};

use crate::{
  core::{BaseOptions, read_associated_file},
  status::Status,
};

/// 类别索引到名称的映射，每行一个标签，行号即索引
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelMap {
  labels: Vec<String>,
  display_names: Option<Vec<String>>,
}

fn parse_lines(text: &str) -> Vec<String> {
  let mut lines: Vec<String> = text.lines().map(|line| line.trim().to_string()).collect();
  while lines.last().is_some_and(|line| line.is_empty()) {
    lines.pop();
  }
  lines
}

impl LabelMap {
  pub fn from_labels<I, S>(labels: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    LabelMap {
      labels: labels.into_iter().map(Into::into).collect(),
      display_names: None,
    }
  }

  pub fn parse(labels: &str, display_names: Option<&str>) -> Self {
    LabelMap {
      labels: parse_lines(labels),
      display_names: display_names.map(parse_lines),
    }
  }

  /// 按 `BaseOptions` 中的附属文件加载；没有标签文件时返回 `None`
  pub fn load(options: &BaseOptions, locale: &str) -> Result<Option<Self>, Status> {
    let Some(label_file) = options.label_file.as_deref() else {
      debug!("未配置标签文件");
      return Ok(None);
    };

    let labels = read_associated_file(label_file)?;
    let display_names = match options.display_names_files.get(locale) {
      Some(path) => Some(read_associated_file(path)?),
      None => {
        if !options.display_names_files.is_empty() {
          warn!("没有 locale '{}' 对应的显示名文件", locale);
        }
        None
      }
    };

    let map = LabelMap::parse(&labels, display_names.as_deref());
    debug!("加载了 {} 个标签", map.len());
    if let Some(names) = map.display_names.as_ref()
      && names.len() != map.labels.len()
    {
      warn!(
        "显示名数量 {} 与标签数量 {} 不一致",
        names.len(),
        map.labels.len()
      );
    }
    Ok(Some(map))
  }

  pub fn len(&self) -> usize {
    self.labels.len()
  }

  pub fn is_empty(&self) -> bool {
    self.labels.is_empty()
  }

  pub fn class_name(&self, index: usize) -> Option<&str> {
    self.labels.get(index).map(String::as_str)
  }

  pub fn display_name(&self, index: usize) -> Option<&str> {
    self
      .display_names
      .as_ref()
      .and_then(|names| names.get(index))
      .map(String::as_str)
  }

  /// 空行占位的标签不参与按名称查找
  pub fn index_of(&self, class_name: &str) -> Option<usize> {
    if class_name.is_empty() {
      return None;
    }
    self.labels.iter().position(|label| label == class_name)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_keeps_line_numbers() {
    let map = LabelMap::parse("background\ncat\n\ndog\n\n", Some("背景\n猫\n\n狗\n"));
    assert_eq!(map.len(), 4);
    assert_eq!(map.class_name(1), Some("cat"));
    assert_eq!(map.class_name(2), Some(""));
    assert_eq!(map.index_of("dog"), Some(3));
    assert_eq!(map.display_name(3), Some("狗"));
    assert_eq!(map.class_name(4), None);
    assert_eq!(map.index_of(""), None);
  }

  #[test]
  fn test_load_without_label_file() {
    let options = BaseOptions::from_file("model.rknn");
    assert_eq!(LabelMap::load(&options, "en").unwrap(), None);
  }

  #[test]
  fn test_load_missing_label_file_fails() {
    let options = BaseOptions::from_file("model.rknn").label_file("/no/such/labels.txt");
    assert!(LabelMap::load(&options, "en").is_err());
  }
}
