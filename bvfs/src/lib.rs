//! bvfs：建立在定长宿主文件（分区）之上的单目录文件系统。
//!
//! 分区由 16384 个 512 字节的块组成，所有文件都在同一个根目录下，
//! 以名字区分，不支持子目录。

/* bvfs 的整体架构，自上而下 */

// 文件操作层：打开、关闭、读写、删除、列举
mod vfs;

// 文件描述符表：每个打开的文件的会话状态
mod fd;

// 分区管理层：创建或载入分区，卸载时落盘
mod partition;

// 空闲块链表：数据块的分配与回收
mod free_list;

// 磁盘数据结构层：表示磁盘文件系统的数据结构
mod layout;

mod error;

#[cfg(test)]
mod ram_disk;

pub use block_dev::{BLOCK_SIZE, BlockDevice, BlockFile};

pub use self::{
    error::{Error, Result},
    fd::{Handle, OpenMode},
    layout::BlockId,
    partition::Bvfs,
    vfs::{FileStat, Listing},
};

/// 分区总块数
pub const PARTITION_BLOCKS: usize = 16384;
/// 分区文件的字节数
pub const PARTITION_SIZE: u64 = (PARTITION_BLOCKS * BLOCK_SIZE) as u64;
/// 索引节点个数，也是文件个数的上限
pub const INODE_COUNT: usize = 256;
/// 文件名占用的字节数（含结尾的 NUL）
pub const NAME_CAP: usize = 32;
/// 单个文件最多占用的数据块数
pub const FILE_BLOCKS_CAP: usize = 128;
/// 单个文件的最大字节数
pub const MAX_FILE_SIZE: usize = FILE_BLOCKS_CAP * BLOCK_SIZE;

type DataBlock = [u8; BLOCK_SIZE];
