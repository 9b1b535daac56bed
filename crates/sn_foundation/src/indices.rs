// crates/sn_foundation/src/indices.rs

//! 强类型索引系统
//!
//! 提供类型安全的索引类型，用于网格单元、面、方向、角度集等的引用。
//!
//! # 设计原则
//!
//! 1. **类型安全**: 不同类型的索引不可混用（CellIndex ≠ FaceIndex）
//! 2. **零开销**: 编译期类型检查，运行时与 usize 完全相同
//!
//! # 示例
//!
//! ```rust
//! use sn_foundation::indices::{CellIndex, DirectionIndex, cell, direction};
//!
//! let c = CellIndex::new(0);
//! let d = direction(5);
//!
//! assert!(c.is_valid());
//! assert_eq!(d.get(), 5);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// 无效索引标记
pub const INVALID_INDEX: usize = usize::MAX;

// =============================================================================
// 宏：生成索引类型
// =============================================================================

macro_rules! define_index {
    ($(#[$meta:meta])* $name:ident, $doc:literal) => {
        #[doc = $doc]
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[repr(transparent)]
        pub struct $name(pub usize);

        impl $name {
            /// 无效索引常量
            pub const INVALID: Self = Self(INVALID_INDEX);

            /// 创建新索引
            #[inline]
            pub const fn new(idx: usize) -> Self {
                Self(idx)
            }

            /// 获取索引值
            #[inline]
            pub const fn get(self) -> usize {
                self.0
            }

            /// 检查是否有效
            #[inline]
            pub const fn is_valid(self) -> bool {
                self.0 != INVALID_INDEX
            }

            /// 检查是否无效
            #[inline]
            pub const fn is_invalid(self) -> bool {
                self.0 == INVALID_INDEX
            }
        }

        impl From<usize> for $name {
            #[inline]
            fn from(idx: usize) -> Self { Self::new(idx) }
        }

        impl From<$name> for usize {
            #[inline]
            fn from(idx: $name) -> usize { idx.get() }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}({})", stringify!($name), self.0)
                } else {
                    write!(f, "{}(INVALID)", stringify!($name))
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}", self.0)
                } else {
                    write!(f, "INVALID")
                }
            }
        }

        impl Default for $name {
            fn default() -> Self { Self::INVALID }
        }
    };
}

// =============================================================================
// 索引类型定义
// =============================================================================

define_index!(CellIndex, "单元索引（全局编号）");
define_index!(FaceIndex, "面索引（全局编号）");
define_index!(DirectionIndex, "离散方向索引");
define_index!(AngleSetIndex, "角度集索引");
define_index!(RankIndex, "分区/进程编号");
define_index!(BoundaryIndex, "边界索引");

// =============================================================================
// 便捷构造函数
// =============================================================================

/// 创建单元索引
#[inline]
pub const fn cell(idx: usize) -> CellIndex {
    CellIndex::new(idx)
}

/// 创建面索引
#[inline]
pub const fn face(idx: usize) -> FaceIndex {
    FaceIndex::new(idx)
}

/// 创建方向索引
#[inline]
pub const fn direction(idx: usize) -> DirectionIndex {
    DirectionIndex::new(idx)
}

/// 创建角度集索引
#[inline]
pub const fn angle_set(idx: usize) -> AngleSetIndex {
    AngleSetIndex::new(idx)
}

/// 创建分区编号
#[inline]
pub const fn rank(idx: usize) -> RankIndex {
    RankIndex::new(idx)
}

/// 创建边界索引
#[inline]
pub const fn boundary(idx: usize) -> BoundaryIndex {
    BoundaryIndex::new(idx)
}
