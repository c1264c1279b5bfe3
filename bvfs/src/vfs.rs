//! # 文件操作层
//!
//! 名字解析、打开/关闭状态机，以及按块拆分的读写。
//!
//! 槽位有三种状态：空闲（无索引节点）、已关闭、以某种模式打开。
//! 元数据的变更只留在内存里，由[`Bvfs::sync`]或[`Bvfs::destroy`]落盘。

use core::fmt;
use std::time::SystemTime;

use chrono::{DateTime, Local};

use crate::fd::FileDescriptor;
use crate::layout::Inode;
use crate::{
    BLOCK_SIZE, BlockId, Bvfs, DataBlock, Error, FILE_BLOCKS_CAP, Handle, NAME_CAP, OpenMode,
    Result,
};

/// 与`ctime(3)`相同的 24 字符时间格式
const CTIME: &str = "%a %b %e %H:%M:%S %Y";

/// 单个文件的概况
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStat {
    pub name: String,
    /// 文件字节数
    pub size: usize,
    /// 占用的数据块数
    pub blocks: usize,
    /// 最后修改时间
    pub mtime: SystemTime,
}

/// 根目录的清单，按槽位顺序排列
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing(pub Vec<FileStat>);

impl Bvfs {
    /// 打开文件，返回句柄。
    ///
    /// 只读打开不存在的文件会失败；写模式下不存在则新建。
    /// 同一个文件同时只能打开一次。
    pub fn open(&mut self, name: &str, mode: OpenMode) -> Result<Handle> {
        validate_name(name)?;

        let (slot, cursor) = match self.find(name) {
            Some(slot) => {
                if self.fds[slot].is_open() {
                    return Err(Error::AlreadyOpen);
                }
                let cursor = match mode {
                    OpenMode::ReadOnly => 0,
                    OpenMode::Append => self.inode(slot)?.size,
                    OpenMode::Truncate => {
                        self.truncate(slot)?;
                        0
                    }
                };
                (slot, cursor)
            }
            None if mode == OpenMode::ReadOnly => return Err(Error::NotFound),
            None => {
                let slot = self.alloc_slot()?;
                self.inodes[slot] = Some(Inode::new(name));
                log::debug!("created {name:?} in slot {slot}");
                (slot, 0)
            }
        };

        self.fds[slot] = FileDescriptor::Open { mode, cursor };
        log::debug!("open {name:?} as {mode:?}, cursor={cursor}");

        Ok(Handle::new(slot))
    }

    /// 关闭文件。不回收数据块，也不落盘元数据。
    pub fn close(&mut self, handle: Handle) -> Result<()> {
        let slot = handle.slot();
        if !self.fds[slot].is_open() {
            return Err(Error::NotOpen);
        }
        if self.inodes[slot].is_none() {
            return Err(Error::NotFound);
        }

        self.fds[slot] = FileDescriptor::Closed;
        log::debug!("close {handle}");

        Ok(())
    }

    /// 在游标处写入`buf`，返回实际写入的字节数。
    ///
    /// 数据块耗尽或文件达到[`FILE_BLOCKS_CAP`]块时就此停下，
    /// 返回已写入的部分；一个字节都没写进去时报[`Error::NoSpace`]。
    pub fn write(&mut self, handle: Handle, buf: &[u8]) -> Result<usize> {
        let slot = handle.slot();
        let Self {
            block_device,
            free_list,
            inodes,
            fds,
        } = self;

        let FileDescriptor::Open { mode, cursor } = &mut fds[slot] else {
            return Err(Error::NotOpen);
        };
        if !mode.is_write() {
            return Err(Error::Mode(*mode));
        }
        let inode = inodes[slot].as_mut().ok_or(Error::NotFound)?;

        let mut written = 0;
        while written < buf.len() {
            let block_index = *cursor / BLOCK_SIZE;
            let offset = *cursor % BLOCK_SIZE;
            let chunk = (BLOCK_SIZE - offset).min(buf.len() - written);

            let mut block: DataBlock = [0; BLOCK_SIZE];
            let fresh = block_index == inode.blocks.len();
            let id = if fresh {
                if inode.blocks.len() == FILE_BLOCKS_CAP {
                    log::warn!("{:?} reached {FILE_BLOCKS_CAP} blocks", inode.name);
                    break;
                }
                match free_list.alloc(&**block_device) {
                    Ok(id) => id,
                    Err(Error::NoSpace) => {
                        log::warn!("partition full while writing {:?}", inode.name);
                        break;
                    }
                    Err(err) => return Err(err),
                }
            } else {
                let id = inode.blocks[block_index];
                block_device.read_block(id.block(), &mut block)?;
                id
            };

            block[offset..offset + chunk].copy_from_slice(&buf[written..written + chunk]);
            if let Err(err) = block_device.write_block(id.block(), &block) {
                if fresh {
                    // 新块还没挂到文件上，还给空闲链表
                    free_list.release(&**block_device, &[id])?;
                }
                return Err(err.into());
            }
            if fresh {
                inode.blocks.push(id);
            }

            written += chunk;
            *cursor += chunk;
            inode.size = inode.size.max(*cursor);
        }

        if written == 0 && !buf.is_empty() {
            return Err(Error::NoSpace);
        }
        if written > 0 {
            inode.touch();
        }
        if written < buf.len() {
            log::warn!("short write: {written} of {} bytes", buf.len());
        }

        Ok(written)
    }

    /// 从游标处读满`buf`。
    ///
    /// 请求越过文件末尾时整体失败，不做任何部分读取；
    /// 读取成功后游标才前移。
    pub fn read(&mut self, handle: Handle, buf: &mut [u8]) -> Result<usize> {
        let slot = handle.slot();
        let FileDescriptor::Open { mode, cursor } = self.fds[slot] else {
            return Err(Error::NotOpen);
        };
        if mode != OpenMode::ReadOnly {
            return Err(Error::Mode(mode));
        }
        let inode = self.inodes[slot].as_ref().ok_or(Error::NotFound)?;
        if cursor + buf.len() > inode.size {
            return Err(Error::OutOfBounds {
                cursor,
                len: buf.len(),
                size: inode.size,
            });
        }

        let mut block: DataBlock = [0; BLOCK_SIZE];
        let mut read = 0;
        while read < buf.len() {
            let position = cursor + read;
            let offset = position % BLOCK_SIZE;
            let chunk = (BLOCK_SIZE - offset).min(buf.len() - read);

            let id = inode.blocks[position / BLOCK_SIZE];
            self.block_device.read_block(id.block(), &mut block)?;
            buf[read..read + chunk].copy_from_slice(&block[offset..offset + chunk]);
            read += chunk;
        }

        self.fds[slot] = FileDescriptor::Open {
            mode,
            cursor: cursor + read,
        };

        Ok(read)
    }

    /// 删除文件并回收其数据块。打开着的文件不能删除。
    pub fn unlink(&mut self, name: &str) -> Result<()> {
        validate_name(name)?;

        let slot = self.find(name).ok_or(Error::NotFound)?;
        if self.fds[slot].is_open() {
            return Err(Error::AlreadyOpen);
        }

        let inode = self.inodes[slot].as_ref().ok_or(Error::NotFound)?;
        self.free_list.release(&*self.block_device, &inode.blocks)?;
        self.inodes[slot] = None;
        log::debug!("unlinked {name:?} from slot {slot}");

        Ok(())
    }

    /// 按槽位顺序列出全部文件
    pub fn list(&self) -> Listing {
        Listing(
            self.inodes
                .iter()
                .flatten()
                .map(FileStat::from)
                .collect(),
        )
    }

    pub fn stat(&self, name: &str) -> Result<FileStat> {
        validate_name(name)?;
        let slot = self.find(name).ok_or(Error::NotFound)?;
        self.inode(slot).map(FileStat::from)
    }

    /// 沿空闲链表收集全部空闲块
    pub fn free_blocks(&self) -> Result<Vec<BlockId>> {
        self.free_list.collect(&*self.block_device)
    }
}

impl Bvfs {
    /// 在使用中的槽位里按名字查找
    fn find(&self, name: &str) -> Option<usize> {
        self.inodes
            .iter()
            .position(|inode| inode.as_ref().is_some_and(|inode| inode.name == name))
    }

    /// 第一个空闲槽位
    fn alloc_slot(&self) -> Result<usize> {
        self.inodes
            .iter()
            .position(Option::is_none)
            .ok_or(Error::Exhausted)
    }

    fn inode(&self, slot: usize) -> Result<&Inode> {
        self.inodes[slot].as_ref().ok_or(Error::NotFound)
    }

    /// 清空文件：先把块还给空闲链表，再清掉内存中的块列表
    fn truncate(&mut self, slot: usize) -> Result<()> {
        let inode = self.inodes[slot].as_mut().ok_or(Error::NotFound)?;
        self.free_list.release(&*self.block_device, &inode.blocks)?;
        inode.blocks.clear();
        inode.size = 0;
        inode.touch();
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.len() >= NAME_CAP {
        return Err(Error::NameTooLong { len: name.len() });
    }
    if name.is_empty() || name.contains('\0') {
        return Err(Error::InvalidName);
    }
    Ok(())
}

impl From<&Inode> for FileStat {
    fn from(inode: &Inode) -> Self {
        Self {
            name: inode.name.clone(),
            size: inode.size,
            blocks: inode.size.div_ceil(BLOCK_SIZE),
            mtime: inode.mtime,
        }
    }
}

impl Listing {
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileStat> {
        self.0.iter()
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "| {} Files", self.len())?;
        for stat in self.iter() {
            writeln!(f, "{stat}")?;
        }
        Ok(())
    }
}

impl fmt::Display for FileStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mtime = DateTime::<Local>::from(self.mtime).format(CTIME);
        write!(
            f,
            "| bytes: {}, blocks: {}, {mtime}, {}",
            self.size, self.blocks, self.name
        )
    }
}
