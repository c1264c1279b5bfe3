use derive_more::{Display, From, Into};

use super::DATA_AREA_START;
use crate::PARTITION_BLOCKS;

/// 分区内的块号
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into, Display)]
#[display(fmt = "#{}", _0)]
#[repr(transparent)]
pub struct BlockId(u16);

impl BlockId {
    /// 空闲链表为空时，链接处写入的越界块号
    const EMPTY_LINK: u16 = PARTITION_BLOCKS as u16;

    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    /// 数据块区域内的全部块
    pub fn data_area() -> impl ExactSizeIterator<Item = Self> {
        (DATA_AREA_START as u16..PARTITION_BLOCKS as u16).map(Self)
    }

    pub fn is_data(self) -> bool {
        (DATA_AREA_START..PARTITION_BLOCKS).contains(&self.block())
    }

    /// 交给块设备的块编号
    #[inline]
    pub fn block(self) -> usize {
        self.0 as usize
    }

    /// 解读磁盘上的链接，越界值一律视为链表结束
    pub fn from_link(raw: u16) -> Option<Self> {
        Some(Self(raw)).filter(|id| id.is_data())
    }

    pub fn to_link(link: Option<Self>) -> u16 {
        link.map_or(Self::EMPTY_LINK, |id| id.0)
    }
}
