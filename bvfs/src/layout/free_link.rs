use binrw::binrw;

use super::BlockId;

/// 空闲链表上的一环。
///
/// #0 块开头存放链表头，每个空闲数据块开头存放下一个空闲块；
/// 链表为空或到达末尾时为`None`，落盘为越界哨兵。
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeLink {
    #[br(map = |raw: u16| BlockId::from_link(raw))]
    #[bw(map = |next: &Option<BlockId>| BlockId::to_link(*next))]
    next: Option<BlockId>,
}

impl FreeLink {
    #[inline]
    pub fn new(next: Option<BlockId>) -> Self {
        Self { next }
    }

    #[inline]
    pub fn next(&self) -> Option<BlockId> {
        self.next
    }
}
