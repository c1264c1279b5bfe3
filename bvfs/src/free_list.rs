//! # 空闲块链表
//!
//! 空闲的数据块串成一条单链表：#0 块开头存放表头，
//! 每个空闲块开头的两字节指向下一个空闲块。
//!
//! 分配从表头取一块，回收把整条块列表接到表头之前。
//! 每次变更都以写回表头收尾，这是链表唯一的提交点。
//! 链接字节只在这里读写，文件内容层从不解读它们。

use std::io::Cursor;

use binrw::{BinRead, BinWrite};
use block_dev::BlockDevice;

use crate::layout::{BlockId, FreeLink, HEAD_BLOCK};
use crate::{DataBlock, Error, Result, BLOCK_SIZE};

#[derive(Debug)]
pub struct FreeList {
    head: Option<BlockId>,
}

impl FreeList {
    /// 把整个数据块区域按顺序串成链表，最后一块指向空
    pub fn format(block_device: &dyn BlockDevice) -> Result<Self> {
        let mut area = BlockId::data_area().peekable();
        let head = area.peek().copied();
        while let Some(id) = area.next() {
            write_link(block_device, id.block(), area.peek().copied())?;
        }

        let mut free_list = Self { head: None };
        free_list.commit(block_device, head)?;
        log::info!("free list threaded from {:?}", head);

        Ok(free_list)
    }

    pub fn load(block_device: &dyn BlockDevice) -> Result<Self> {
        Ok(Self {
            head: read_link(block_device, HEAD_BLOCK)?,
        })
    }

    #[inline]
    pub fn head(&self) -> Option<BlockId> {
        self.head
    }

    /// 从表头取出一块交给调用者。
    ///
    /// 取出的块不会清零，开头仍残留着链接字节，调用者须自行覆盖。
    pub fn alloc(&mut self, block_device: &dyn BlockDevice) -> Result<BlockId> {
        let id = self.head.ok_or(Error::NoSpace)?;
        let next = read_link(block_device, id.block())?;
        self.commit(block_device, next)?;
        log::debug!("alloc {id}");

        Ok(id)
    }

    /// 把一个文件的块列表按逻辑顺序整体接到链表前端
    pub fn release(&mut self, block_device: &dyn BlockDevice, blocks: &[BlockId]) -> Result<()> {
        let (Some(&first), Some(&last)) = (blocks.first(), blocks.last()) else {
            return Ok(());
        };

        for pair in blocks.windows(2) {
            write_link(block_device, pair[0].block(), Some(pair[1]))?;
        }
        write_link(block_device, last.block(), self.head)?;
        self.commit(block_device, Some(first))?;
        log::debug!("released {} blocks starting at {first}", blocks.len());

        Ok(())
    }

    /// 沿链表走一遍，收集全部空闲块
    pub fn collect(&self, block_device: &dyn BlockDevice) -> Result<Vec<BlockId>> {
        let mut blocks = Vec::new();
        let mut current = self.head;
        while let Some(id) = current {
            // 链表成环说明分区已损坏
            if blocks.len() > BlockId::data_area().len() {
                return Err(Error::Layout(format!("free list loops back through {id}")));
            }
            blocks.push(id);
            current = read_link(block_device, id.block())?;
        }

        Ok(blocks)
    }

    /// 把表头写回#0块
    pub fn persist(&self, block_device: &dyn BlockDevice) -> Result<()> {
        write_link(block_device, HEAD_BLOCK, self.head)
    }

    fn commit(&mut self, block_device: &dyn BlockDevice, head: Option<BlockId>) -> Result<()> {
        write_link(block_device, HEAD_BLOCK, head)?;
        self.head = head;
        Ok(())
    }
}

fn read_link(block_device: &dyn BlockDevice, block_id: usize) -> Result<Option<BlockId>> {
    let mut block: DataBlock = [0; BLOCK_SIZE];
    block_device.read_block(block_id, &mut block)?;
    let link = FreeLink::read(&mut Cursor::new(&block[..]))?;
    Ok(link.next())
}

/// 写入链接，块内其余字节清零
fn write_link(block_device: &dyn BlockDevice, block_id: usize, next: Option<BlockId>) -> Result<()> {
    let mut block: DataBlock = [0; BLOCK_SIZE];
    FreeLink::new(next).write(&mut Cursor::new(&mut block[..]))?;
    block_device.write_block(block_id, &block)?;
    Ok(())
}
