// 该文件是 Shanan Task （山南任务库） 项目的一部分。
// src/backend/detection_layout.rs - 检测模型输出解码
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

use tracing::{debug, error};

use crate::{
  engine::OutputTensor,
  status::{Status, StatusCode, SupportStatus},
};

const SSD_NUM_OUTPUTS: usize = 4;
const YOLO26_NUM_OUTPUTS: usize = 6;
const YOLO26_STRIDES: [usize; 3] = [8, 16, 32];
const YOLO26_NMS_THRESH: f32 = 0.45;
/// 未设置分数阈值时的候选框下限
const YOLO26_CANDIDATE_THRESH: f32 = 0.25;

/// 解码后的候选框，bbox 为归一化坐标 [x_min, y_min, x_max, y_max]
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawDetection {
  pub class_index: usize,
  pub score: f32,
  pub bbox: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DetectionLayout {
  /// 带后处理的 SSD：位置、类别、分数、数量
  Ssd,
  /// 三个检测头，每个头一对回归/分类输出
  Yolo26 { input_width: usize, input_height: usize },
}

impl DetectionLayout {
  pub(crate) fn from_outputs(
    num_outputs: usize,
    input_width: usize,
    input_height: usize,
  ) -> Result<Self, Status> {
    match num_outputs {
      SSD_NUM_OUTPUTS => Ok(DetectionLayout::Ssd),
      YOLO26_NUM_OUTPUTS => Ok(DetectionLayout::Yolo26 {
        input_width,
        input_height,
      }),
      other => {
        error!("不支持的检测模型输出数量: {}", other);
        Err(Status::new(
          StatusCode::InvalidArgument,
          format!(
            "Unsupported detection output layout: expected {} (SSD) or {} (YOLO26) outputs, found {}",
            SSD_NUM_OUTPUTS, YOLO26_NUM_OUTPUTS, other
          ),
          SupportStatus::InvalidNumOutputTensorsError,
        ))
      }
    }
  }

  pub(crate) fn decode(
    &self,
    outputs: &[OutputTensor],
    min_score: Option<f32>,
  ) -> Result<Vec<RawDetection>, Status> {
    match *self {
      DetectionLayout::Ssd => decode_ssd(outputs),
      DetectionLayout::Yolo26 {
        input_width,
        input_height,
      } => decode_yolo26(
        outputs,
        input_width,
        input_height,
        min_score.unwrap_or(YOLO26_CANDIDATE_THRESH),
      ),
    }
  }
}

fn output_dimensions_error(message: String) -> Status {
  Status::internal(message, SupportStatus::InvalidOutputTensorDimensionsError)
}

fn decode_ssd(outputs: &[OutputTensor]) -> Result<Vec<RawDetection>, Status> {
  let [locations, classes, scores, count] = outputs else {
    return Err(Status::new(
      StatusCode::Internal,
      format!("SSD layout expects 4 outputs, found {}", outputs.len()),
      SupportStatus::InvalidNumOutputTensorsError,
    ));
  };

  let (locations, classes, scores) = (locations.as_slice(), classes.as_slice(), scores.as_slice());
  let reported = count.as_slice().first().copied().unwrap_or(0.0).max(0.0) as usize;
  let available = scores.len().min(classes.len()).min(locations.len() / 4);
  if reported > available {
    error!("检测数量 {} 超过输出张量大小 {}", reported, available);
    return Err(output_dimensions_error(format!(
      "Detection count {} exceeds the output tensors, which hold {} detections",
      reported, available
    )));
  }
  let num = reported;
  debug!("SSD 输出检测数量: {}", num);

  Ok(
    (0..num)
      .filter(|&i| classes[i] >= 0.0)
      .map(|i| {
        let loc = &locations[i * 4..i * 4 + 4];
        // 位置顺序为 [y_min, x_min, y_max, x_max]
        RawDetection {
          class_index: classes[i] as usize,
          score: scores[i],
          bbox: [loc[1], loc[0], loc[3], loc[2]],
        }
      })
      .collect(),
  )
}

/// 根据张量大小匹配回归和分类输出
/// 返回 (reg, cls, 类别数)，大小不匹配时报错
fn match_reg_cls_tensors<'a>(
  tensor1: &'a [f32],
  tensor2: &'a [f32],
  spatial: usize,
  head_idx: usize,
) -> Result<(&'a [f32], &'a [f32], usize), Status> {
  let reg_expected = 4 * spatial;
  let class_num = |len: usize| (len > 0 && len % spatial == 0).then(|| len / spatial);

  if tensor1.len() == reg_expected
    && let Some(classes) = class_num(tensor2.len())
  {
    debug!("检测头 {}: 输出顺序正常", head_idx);
    Ok((tensor1, tensor2, classes))
  } else if tensor2.len() == reg_expected
    && let Some(classes) = class_num(tensor1.len())
  {
    debug!("检测头 {}: 输出顺序交换", head_idx);
    Ok((tensor2, tensor1, classes))
  } else {
    error!(
      "检测头 {}: 输出大小不匹配 - 张量1: {}, 张量2: {}, 期望回归: {}",
      head_idx,
      tensor1.len(),
      tensor2.len(),
      reg_expected
    );
    Err(output_dimensions_error(format!(
      "Detection head {} has outputs of size {} and {}, expected a regression output of size {} \
       and a classification output that is a multiple of {}",
      head_idx,
      tensor1.len(),
      tensor2.len(),
      reg_expected,
      spatial
    )))
  }
}

fn sigmoid(x: f32) -> f32 {
  1.0 / (1.0 + (-x).exp())
}

fn decode_yolo26(
  outputs: &[OutputTensor],
  input_width: usize,
  input_height: usize,
  min_score: f32,
) -> Result<Vec<RawDetection>, Status> {
  let (input_w, input_h) = (input_width as f32, input_height as f32);
  let mut items = Vec::new();

  for (head_idx, stride) in YOLO26_STRIDES.into_iter().enumerate() {
    let (map_h, map_w) = (input_height / stride, input_width / stride);
    let spatial = map_h * map_w;
    if spatial == 0 {
      return Err(output_dimensions_error(format!(
        "Model input {}x{} is smaller than detection stride {}",
        input_width, input_height, stride
      )));
    }

    // 输出顺序可能不同，根据张量大小判断哪个是回归，哪个是分类
    let (Some(tensor1), Some(tensor2)) = (outputs.get(head_idx * 2), outputs.get(head_idx * 2 + 1))
    else {
      error!("检测头 {} 缺少输出", head_idx);
      return Err(output_dimensions_error(format!(
        "Detection head {} is missing its outputs",
        head_idx
      )));
    };
    let (reg, cls, class_num) =
      match_reg_cls_tensors(tensor1.as_slice(), tensor2.as_slice(), spatial, head_idx)?;
    let stride = stride as f32;

    for h in 0..map_h {
      for w in 0..map_w {
        let idx = h * map_w + w;

        let (score, class_index) = {
          let mut max_logit = f32::MIN;
          let mut cls_idx = 0usize;
          for c in 0..class_num {
            let logit = cls[c * spatial + idx];
            if logit > max_logit {
              max_logit = logit;
              cls_idx = c;
            }
          }
          (sigmoid(max_logit), cls_idx)
        };

        if score < min_score {
          continue;
        }

        let left = reg[idx];
        let top = reg[spatial + idx];
        let right = reg[2 * spatial + idx];
        let bottom = reg[3 * spatial + idx];

        let grid_x = (w as f32) + 0.5;
        let grid_y = (h as f32) + 0.5;

        let xmin = ((grid_x - left) * stride).clamp(0.0, input_w);
        let ymin = ((grid_y - top) * stride).clamp(0.0, input_h);
        let xmax = ((grid_x + right) * stride).clamp(0.0, input_w);
        let ymax = ((grid_y + bottom) * stride).clamp(0.0, input_h);

        if xmax > xmin && ymax > ymin {
          items.push(RawDetection {
            class_index,
            score,
            bbox: [xmin / input_w, ymin / input_h, xmax / input_w, ymax / input_h],
          });
        }
      }
    }
  }

  debug!("YOLO26 候选框数量: {}", items.len());
  Ok(nms(items, YOLO26_NMS_THRESH))
}

/// 按类别的非极大值抑制，结果按分数降序
fn nms(mut detections: Vec<RawDetection>, iou_threshold: f32) -> Vec<RawDetection> {
  detections.sort_by(|a, b| b.score.total_cmp(&a.score));

  let mut result: Vec<RawDetection> = Vec::new();
  for det in detections {
    let suppressed = result
      .iter()
      .any(|kept| kept.class_index == det.class_index && iou(kept, &det) >= iou_threshold);
    if !suppressed {
      result.push(det);
    }
  }
  result
}

/// 计算两个边界框的 IoU
fn iou(a: &RawDetection, b: &RawDetection) -> f32 {
  let x1 = a.bbox[0].max(b.bbox[0]);
  let y1 = a.bbox[1].max(b.bbox[1]);
  let x2 = a.bbox[2].min(b.bbox[2]);
  let y2 = a.bbox[3].min(b.bbox[3]);

  let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
  let area_a = (a.bbox[2] - a.bbox[0]) * (a.bbox[3] - a.bbox[1]);
  let area_b = (b.bbox[2] - b.bbox[0]) * (b.bbox[3] - b.bbox[1]);
  let union = area_a + area_b - intersection;

  if union > 0.0 { intersection / union } else { 0.0 }
}
