// 该文件是 Shanan Task （山南任务库） 项目的一部分。
// src/output/save_image_file.rs - 保存检测结果图像
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

use std::path::{Path, PathBuf};

use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::RgbFrame,
  output::{OutputError, Render, draw::Draw},
  processor::DetectionResult,
};

/// `image:///path/to/out.png`
pub struct SaveImageFileOutput {
  path: PathBuf,
  draw: Draw,
}

impl FromUrlWithScheme for SaveImageFileOutput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for SaveImageFileOutput {
  type Error = OutputError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(OutputError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    let path = urlencoding::decode(uri.path())?;
    Ok(SaveImageFileOutput::new(path.into_owned()))
  }
}

impl SaveImageFileOutput {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    SaveImageFileOutput {
      path: path.into(),
      draw: Draw::default(),
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  fn save_image(&self, image: &image::RgbImage) -> Result<(), OutputError> {
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }

    image.save(&self.path)?;
    info!("保存图像到文件: {}", self.path.display());
    Ok(())
  }
}

impl Render<DetectionResult> for SaveImageFileOutput {
  type Error = OutputError;

  fn render_result(&self, frame: &RgbFrame, result: &DetectionResult) -> Result<(), Self::Error> {
    let mut image = frame.as_rgb_image().clone();
    self.draw.draw_detections(&mut image, result);
    self.save_image(&image)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::processor::{BoundingBox, Detection};

  #[test]
  fn test_from_url_scheme() {
    let url = Url::parse("image:///tmp/out.png").unwrap();
    let output = SaveImageFileOutput::from_url(&url).unwrap();
    assert_eq!(output.path(), Path::new("/tmp/out.png"));

    let url = Url::parse("folder:///tmp").unwrap();
    assert!(SaveImageFileOutput::from_url(&url).is_err());
  }

  #[test]
  fn test_render_writes_png() {
    let dir = tempfile::tempdir().unwrap();
    let output = SaveImageFileOutput::new(dir.path().join("nested/out.png"));
    let frame = RgbFrame::from(image::RgbImage::new(8, 8));
    let result = DetectionResult {
      detections: vec![Detection {
        bounding_box: BoundingBox::new(1, 1, 4, 4),
        classes: Vec::new(),
      }],
    };
    output.render_result(&frame, &result).unwrap();
    let saved = image::open(output.path()).unwrap().into_rgb8();
    assert_eq!(saved.get_pixel(1, 1).0, [0, 0, 255]);
  }
}
