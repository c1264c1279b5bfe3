//! # 磁盘数据结构层
//!
//! bvfs 的分区布局：
//! 空闲链表头(#0) | 索引节点区域(#1 ~ #256) | 数据块区域(#257 ~ #16383)
//!
//! 每个索引节点独占一块；空闲数据块的开头两字节指向下一个空闲块。

mod block_id;
pub use block_id::BlockId;

mod free_link;
pub use free_link::FreeLink;

mod inode;
pub use inode::{DiskInode, Inode};

use crate::INODE_COUNT;

/// 存放空闲链表头的块
pub const HEAD_BLOCK: usize = 0;
/// 索引节点区域的起始块
pub const INODE_AREA_START: usize = 1;
/// 数据块区域的起始块
pub const DATA_AREA_START: usize = INODE_AREA_START + INODE_COUNT;
