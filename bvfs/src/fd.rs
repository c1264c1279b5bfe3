//! # 文件描述符表
//!
//! 描述符以索引节点槽位为键，只活在内存里，重新载入分区后一律处于关闭状态。

use core::fmt;

use crate::Error;

/// 打开文件的方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum OpenMode {
    /// 只读，游标从头开始
    ReadOnly = 0,
    /// 只写，游标位于文件末尾
    Append = 1,
    /// 只写，先清空文件
    Truncate = 2,
}

impl OpenMode {
    #[inline]
    pub fn is_write(self) -> bool {
        self != Self::ReadOnly
    }
}

impl TryFrom<u32> for OpenMode {
    type Error = Error;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Self::ReadOnly),
            1 => Ok(Self::Append),
            2 => Ok(Self::Truncate),
            raw => Err(Error::InvalidMode(raw)),
        }
    }
}

/// 文件句柄。
///
/// 只能由[`Bvfs::open`](crate::Bvfs::open)产生；
/// 关闭后同一槽位可能被再次打开，届时会得到相等的句柄。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(usize);

impl Handle {
    #[inline]
    pub(crate) fn new(slot: usize) -> Self {
        Self(slot)
    }

    #[inline]
    pub(crate) fn slot(self) -> usize {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fd{}", self.0)
    }
}

/// 一个槽位上的会话状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FileDescriptor {
    #[default]
    Closed,
    Open {
        mode: OpenMode,
        /// 下一次读写的字节偏移
        cursor: usize,
    },
}

impl FileDescriptor {
    #[inline]
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }
}
