// crates/sn_foundation/src/error.rs

//! 错误处理模块，定义统一错误类型
//!
//! 提供 `SnError` 枚举和 `SnResult` 类型别名，用于整个项目的错误处理。
//!
//! # 设计原则
//!
//! 1. **分层**: 基础层只定义核心错误，扫描调度相关的四类致命错误
//!    （配置、拓扑、通信、数值核）在此统一建模
//! 2. **易用性**: 提供便捷的构造方法
//! 3. **无内部重试**: 调度器内部不做任何恢复，错误一律上抛给外层迭代器

use thiserror::Error;

/// 统一结果类型
pub type SnResult<T> = Result<T, SnError>;

/// SnSweep 错误类型
///
/// 核心错误类型，用于整个项目。前四个变体对应扫描调度的四类致命错误，
/// 其余为通用的数据校验错误。
#[derive(Error, Debug)]
pub enum SnError {
    // ========================================================================
    // 扫描调度致命错误
    // ========================================================================

    /// 配置错误（网格邻接不一致等，在任何扫描前检出）
    #[error("配置错误: {message}")]
    Config {
        /// 具体错误信息
        message: String,
    },

    /// 拓扑错误（存在不可归因于反射边界的依赖环）
    #[error("拓扑错误: 角度集 {angle_set} 存在依赖环，涉及单元 {cells:?}")]
    Topology {
        /// 发生环的角度集编号
        angle_set: usize,
        /// 无法排序的单元（全局编号）
        cells: Vec<usize>,
    },

    /// 通信错误（消息未到达或负载大小不匹配，整个扫描作废）
    #[error("通信错误: {message}")]
    Communication {
        /// 具体错误信息
        message: String,
    },

    /// 数值核错误（注入的扫描核返回失败，对当前扫描致命）
    #[error("数值核错误: {message}")]
    NumericalKernel {
        /// 具体错误信息
        message: String,
    },

    // ========================================================================
    // 通用校验错误
    // ========================================================================

    /// 无效网格拓扑
    #[error("无效的网格拓扑: {message}")]
    InvalidMesh {
        /// 具体错误信息
        message: String,
    },

    /// 无效输入
    #[error("无效的输入数据: {message}")]
    InvalidInput {
        /// 说明无效原因
        message: String,
    },

    /// 数组大小不匹配
    #[error("数组大小不匹配: {name} 期望{expected}, 实际{actual}")]
    SizeMismatch {
        /// 数据名称
        name: &'static str,
        /// 期望大小
        expected: usize,
        /// 实际大小
        actual: usize,
    },

    /// 索引越界
    #[error("索引越界: {index_type} 索引 {index} 超出范围 0..{len}")]
    IndexOutOfBounds {
        /// 索引类别描述
        index_type: &'static str,
        /// 访问的索引
        index: usize,
        /// 上界（长度）
        len: usize,
    },

    /// 通道发送失败
    #[error("通道发送失败")]
    ChannelSendError,

    /// 内部错误
    #[error("内部错误: {message}")]
    Internal {
        /// 内部错误描述
        message: String,
    },
}

// ========================================================================
// 便捷构造方法
// ========================================================================

impl SnError {
    /// 配置错误
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// 拓扑错误
    pub fn topology(angle_set: usize, cells: Vec<usize>) -> Self {
        Self::Topology { angle_set, cells }
    }

    /// 通信错误
    pub fn communication(message: impl Into<String>) -> Self {
        Self::Communication {
            message: message.into(),
        }
    }

    /// 数值核错误
    pub fn numerical_kernel(message: impl Into<String>) -> Self {
        Self::NumericalKernel {
            message: message.into(),
        }
    }

    /// 无效网格
    pub fn invalid_mesh(message: impl Into<String>) -> Self {
        Self::InvalidMesh {
            message: message.into(),
        }
    }

    /// 无效输入
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// 数组大小不匹配
    pub fn size_mismatch(name: &'static str, expected: usize, actual: usize) -> Self {
        Self::SizeMismatch {
            name,
            expected,
            actual,
        }
    }

    /// 索引越界
    pub fn index_out_of_bounds(index_type: &'static str, index: usize, len: usize) -> Self {
        Self::IndexOutOfBounds {
            index_type,
            index,
            len,
        }
    }

    /// 内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

// ========================================================================
// 验证辅助方法
// ========================================================================

impl SnError {
    /// 检查数组大小是否匹配
    #[inline]
    pub fn check_size(name: &'static str, expected: usize, actual: usize) -> SnResult<()> {
        if expected != actual {
            Err(Self::size_mismatch(name, expected, actual))
        } else {
            Ok(())
        }
    }

    /// 检查索引是否在范围内
    #[inline]
    pub fn check_index(index_type: &'static str, index: usize, len: usize) -> SnResult<()> {
        if index >= len {
            Err(Self::index_out_of_bounds(index_type, index, len))
        } else {
            Ok(())
        }
    }
}

impl<T> From<std::sync::mpsc::SendError<T>> for SnError {
    fn from(_: std::sync::mpsc::SendError<T>) -> Self {
        Self::ChannelSendError
    }
}

// ========================================================================
// 测试
// ========================================================================
