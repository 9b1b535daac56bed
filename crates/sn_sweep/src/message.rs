// crates/sn_sweep/src/message.rs

//! 跨分区通量消息
//!
//! 分区间沿扫描方向传递的角通量载荷。一条消息覆盖一个全局面上
//! 一个角度集的全部成员方向：`values` 按成员方向行主序排列，每个
//! 方向占 `width` 个分量（能群 × 面上离散点）。
//!
//! 发送方与接收方通过全局面编号对齐消息，成员方向顺序由角度集
//! 定义，双方一致。

use serde::{Deserialize, Serialize};
use sn_foundation::error::{SnError, SnResult};
use sn_foundation::indices::{AngleSetIndex, FaceIndex};

/// 单个全局面、单个角度集的角通量消息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FluxMessage {
    /// 全局面编号（收发双方共享）
    pub face: FaceIndex,
    /// 所属角度集
    pub angle_set: AngleSetIndex,
    /// 角通量载荷：成员方向 × 通量宽度，行主序
    pub values: Vec<f64>,
}

impl FluxMessage {
    /// 构建消息并校验载荷长度
    pub fn new(
        face: FaceIndex,
        angle_set: AngleSetIndex,
        n_directions: usize,
        width: usize,
        values: Vec<f64>,
    ) -> SnResult<Self> {
        SnError::check_size("flux message payload", n_directions * width, values.len())?;
        Ok(Self {
            face,
            angle_set,
            values,
        })
    }

}
