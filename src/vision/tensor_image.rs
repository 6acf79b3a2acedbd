// 该文件是 Shanan Task （山南任务库） 项目的一部分。
// src/vision/tensor_image.rs - 任务输入图像
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

//! 两种来源的图像：
//!
//! - 从文件解码：[`TensorImage::Owned`] 持有解码后的像素，离开作用域时释放；
//! - 调用方提供的数组：[`TensorImage::Borrowed`] 只借用，生命周期不能超过源数据。
//!
//! 两种状态在构造时确定，之后不会转换。

use std::{io::ErrorKind, path::Path};

use image::{DynamicImage, ImageError, ImageReader};
use tracing::{debug, error, info};

use crate::{
  error::{TaskError, TaskResult},
  frame::ImageData,
  status::{Status, StatusCode, SupportStatus},
};

/// 按通道数区分的颜色空间
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSpaceType {
  Grayscale = 1,
  Rgb = 3,
  Rgba = 4,
}

impl ColorSpaceType {
  pub fn from_channels(channels: usize) -> TaskResult<Self> {
    match channels {
      1 => Ok(ColorSpaceType::Grayscale),
      3 => Ok(ColorSpaceType::Rgb),
      4 => Ok(ColorSpaceType::Rgba),
      other => Err(TaskError::validation(format!(
        "Number of channels {} is not supported, expect 1 (GRAYSCALE), 3 (RGB) or 4 (RGBA)",
        other
      ))),
    }
  }

  pub fn channels(&self) -> usize {
    *self as usize
  }
}

/// 可以作为数组元素传入的类型，只有 `u8` 能构造图像
pub trait ArrayElement: Copy {
  const DTYPE: &'static str;

  fn as_bytes(data: &[Self]) -> Option<&[u8]>;
}

impl ArrayElement for u8 {
  const DTYPE: &'static str = "uint8";

  fn as_bytes(data: &[Self]) -> Option<&[u8]> {
    Some(data)
  }
}

macro_rules! unsupported_element {
  ($($ty:ty => $name:literal),* $(,)?) => {
    $(
      impl ArrayElement for $ty {
        const DTYPE: &'static str = $name;

        fn as_bytes(_data: &[Self]) -> Option<&[u8]> {
          None
        }
      }
    )*
  };
}

unsupported_element!(
  i8 => "int8",
  u16 => "uint16",
  i32 => "int32",
  f32 => "float32",
  f64 => "float64",
);

/// 从文件解码得到的像素，持有所有权
#[derive(Debug)]
pub struct OwnedImage {
  data: Vec<u8>,
  width: u32,
  height: u32,
  channels: usize,
}

impl Drop for OwnedImage {
  fn drop(&mut self) {
    debug!(
      "释放图像缓冲区: {}x{}x{}, {} 字节",
      self.width,
      self.height,
      self.channels,
      self.data.len()
    );
  }
}

/// 借用调用方的像素
#[derive(Debug, Clone, Copy)]
pub struct BorrowedImage<'a> {
  data: &'a [u8],
  width: u32,
  height: u32,
  channels: usize,
}

#[derive(Debug)]
pub enum TensorImage<'a> {
  Owned(OwnedImage),
  Borrowed(BorrowedImage<'a>),
}

fn decode_error(path: &Path, err: ImageError) -> Status {
  match err {
    ImageError::IoError(io) if io.kind() == ErrorKind::NotFound => Status::new(
      StatusCode::NotFound,
      format!("Unable to open file at {}", path.display()),
      SupportStatus::FileNotFoundError,
    ),
    ImageError::IoError(io) if io.kind() == ErrorKind::PermissionDenied => Status::new(
      StatusCode::PermissionDenied,
      format!("Permission denied when opening file at {}", path.display()),
      SupportStatus::FilePermissionDeniedError,
    ),
    other => Status::new(
      StatusCode::InvalidArgument,
      format!("Unable to decode image file {}: {}", path.display(), other),
      SupportStatus::ImageProcessingError,
    ),
  }
}

/// 按 (h,w)、(1,h,w)、(h,w,c)、(1,h,w,c) 解读形状，三维时开头的 1 视为批次维
fn image_dims(shape: &[usize]) -> TaskResult<(usize, usize, usize)> {
  match *shape {
    [h, w] | [1, h, w] => Ok((h, w, 1)),
    [h, w, c] | [1, h, w, c] => Ok((h, w, c)),
    _ => Err(TaskError::validation(format!(
      "Expect image array with shape (height, width, channels), got {:?}",
      shape
    ))),
  }
}

impl TensorImage<'static> {
  /// 解码图像文件，缓冲区归 `TensorImage` 所有
  pub fn create_from_file(path: impl AsRef<Path>) -> TaskResult<Self> {
    let path = path.as_ref();
    let reader = ImageReader::open(path).map_err(|err| decode_error(path, err.into()))?;
    let decoded = reader
      .with_guessed_format()
      .map_err(|err| decode_error(path, err.into()))?
      .decode()
      .map_err(|err| {
        error!("解码图像 {} 失败: {}", path.display(), err);
        decode_error(path, err)
      })?;

    let (width, height) = (decoded.width(), decoded.height());
    let (data, channels) = match decoded {
      DynamicImage::ImageLuma8(image) => (image.into_raw(), 1),
      DynamicImage::ImageRgb8(image) => (image.into_raw(), 3),
      DynamicImage::ImageRgba8(image) => (image.into_raw(), 4),
      other if other.color().has_alpha() => (other.into_rgba8().into_raw(), 4),
      other if other.color().channel_count() == 1 => (other.into_luma8().into_raw(), 1),
      other => (other.into_rgb8().into_raw(), 3),
    };
    info!("加载图像 {}: {}x{}x{}", path.display(), width, height, channels);

    Ok(TensorImage::Owned(OwnedImage {
      data,
      width,
      height,
      channels,
    }))
  }
}

impl<'a> TensorImage<'a> {
  /// 借用调用方数组，只接受 `u8`
  pub fn create_from_array<T: ArrayElement>(data: &'a [T], shape: &[usize]) -> TaskResult<Self> {
    let Some(bytes) = T::as_bytes(data) else {
      return Err(TaskError::validation(format!(
        "Expect array with dtype=uint8, got dtype={}",
        T::DTYPE
      )));
    };

    let (height, width, channels) = image_dims(shape)?;
    ColorSpaceType::from_channels(channels)?;
    let Some(expected) = height
      .checked_mul(width)
      .and_then(|n| n.checked_mul(channels))
    else {
      return Err(TaskError::validation(format!(
        "Image shape {:?} is too large",
        shape
      )));
    };
    if bytes.len() != expected {
      return Err(TaskError::validation(format!(
        "Array of {} elements does not match shape {:?}",
        bytes.len(),
        shape
      )));
    }
    let (Ok(width), Ok(height)) = (u32::try_from(width), u32::try_from(height)) else {
      return Err(TaskError::validation(format!(
        "Image shape {:?} is too large",
        shape
      )));
    };

    Ok(TensorImage::Borrowed(BorrowedImage {
      data: bytes,
      width,
      height,
      channels,
    }))
  }

  pub fn width(&self) -> u32 {
    match self {
      TensorImage::Owned(image) => image.width,
      TensorImage::Borrowed(image) => image.width,
    }
  }

  pub fn height(&self) -> u32 {
    match self {
      TensorImage::Owned(image) => image.height,
      TensorImage::Borrowed(image) => image.height,
    }
  }

  pub fn channels(&self) -> usize {
    match self {
      TensorImage::Owned(image) => image.channels,
      TensorImage::Borrowed(image) => image.channels,
    }
  }

  pub fn color_space_type(&self) -> TaskResult<ColorSpaceType> {
    ColorSpaceType::from_channels(self.channels())
  }

  pub fn is_owned(&self) -> bool {
    matches!(self, TensorImage::Owned(_))
  }

  pub fn buffer(&self) -> &[u8] {
    match self {
      TensorImage::Owned(image) => &image.data,
      TensorImage::Borrowed(image) => image.data,
    }
  }

  pub fn as_image_data(&self) -> ImageData<'_> {
    ImageData {
      data: self.buffer(),
      width: self.width(),
      height: self.height(),
      channels: self.channels(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_color_space_from_channels() {
    assert_eq!(ColorSpaceType::from_channels(1).unwrap(), ColorSpaceType::Grayscale);
    assert_eq!(ColorSpaceType::from_channels(3).unwrap(), ColorSpaceType::Rgb);
    assert_eq!(ColorSpaceType::from_channels(4).unwrap(), ColorSpaceType::Rgba);
    assert!(ColorSpaceType::from_channels(2).unwrap_err().is_validation());
    assert_eq!(ColorSpaceType::Rgba.channels(), 4);
  }

  #[test]
  fn test_create_from_array_shapes() {
    let data = vec![0u8; 2 * 3 * 3];
    let image = TensorImage::create_from_array(&data, &[2, 3, 3]).unwrap();
    assert_eq!((image.width(), image.height()), (3, 2));
    assert!(!image.is_owned());

    let batched = TensorImage::create_from_array(&data, &[1, 2, 3, 3]).unwrap();
    assert_eq!(batched.color_space_type().unwrap(), ColorSpaceType::Rgb);

    let batched_gray = TensorImage::create_from_array(&data[..15], &[1, 5, 3]).unwrap();
    assert_eq!((batched_gray.width(), batched_gray.height()), (3, 5));
    assert_eq!(batched_gray.color_space_type().unwrap(), ColorSpaceType::Grayscale);

    let gray = TensorImage::create_from_array(&data[..6], &[2, 3]).unwrap();
    assert_eq!(gray.color_space_type().unwrap(), ColorSpaceType::Grayscale);
  }

  #[test]
  fn test_create_from_array_rejects_non_uint8() {
    let data = vec![0.0f32; 12];
    let err = TensorImage::create_from_array(&data, &[2, 2, 3]).unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("dtype=uint8"));
  }

  #[test]
  fn test_create_from_array_rejects_bad_shape() {
    let data = vec![0u8; 12];
    assert!(TensorImage::create_from_array(&data, &[2, 2, 2]).is_err());
    assert!(TensorImage::create_from_array(&data, &[2, 2, 4]).is_err());
    assert!(TensorImage::create_from_array(&data, &[12]).is_err());
  }

  #[test]
  fn test_create_from_array_rejects_overflowing_shape() {
    let data = vec![0u8; 3];
    let err = TensorImage::create_from_array(&data, &[usize::MAX, 2, 3]).unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("too large"));
    assert!(TensorImage::create_from_array(&data, &[1, usize::MAX, usize::MAX, 3]).is_err());
  }

  #[test]
  fn test_create_from_missing_file() {
    let err = TensorImage::create_from_file("/nonexistent/shanan/cat.png").unwrap_err();
    let status = err.status().unwrap();
    assert_eq!(status.code(), StatusCode::NotFound);
  }
}
