use std::time::{Duration, SystemTime, UNIX_EPOCH};

use binrw::binrw;

use super::BlockId;
use crate::{BLOCK_SIZE, Error, FILE_BLOCKS_CAP, NAME_CAP, Result};

/// 磁盘上的索引节点，独占一块，其余部分补零
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskInode {
    /// NUL 结尾的文件名
    name: [u8; NAME_CAP],
    /// 文件字节数，[`DiskInode::UNUSED`]表示槽位空闲
    size: i32,
    /// 有效的块号个数
    block_count: u16,
    /// 最后修改时间，Unix 秒
    mtime: i64,
    /// 文件第 i 个逻辑块所在的物理块
    blocks: [u16; FILE_BLOCKS_CAP],
}

/// 内存中的索引节点。槽位空闲时不存在此结构。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inode {
    pub name: String,
    pub size: usize,
    pub blocks: Vec<BlockId>,
    pub mtime: SystemTime,
}

impl DiskInode {
    const UNUSED: i32 = -1;

    pub fn unused() -> Self {
        Self {
            name: [0; NAME_CAP],
            size: Self::UNUSED,
            block_count: 0,
            mtime: 0,
            blocks: [0; FILE_BLOCKS_CAP],
        }
    }

    /// 解出槽位内容，空闲槽位为`None`。
    ///
    /// 文件名必须以 NUL 结尾且是合法的 UTF-8，否则写回时会被改写。
    pub fn into_inode(self) -> Result<Option<Inode>> {
        let Ok(size) = usize::try_from(self.size) else {
            return Ok(None);
        };

        let name_len = self
            .name
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| Error::Layout("file name is not NUL-terminated".into()))?;
        let name = std::str::from_utf8(&self.name[..name_len])
            .map_err(|err| Error::Layout(format!("file name is not UTF-8: {err}")))?
            .to_owned();

        let block_count = (self.block_count as usize).min(FILE_BLOCKS_CAP);
        if block_count != size.div_ceil(BLOCK_SIZE) {
            log::warn!("inode {name:?}: {size} bytes recorded in {block_count} blocks");
        }
        // 文件长度不能越过实际记录的块
        let size = size.min(block_count * BLOCK_SIZE);
        let blocks = self.blocks[..block_count]
            .iter()
            .map(|&raw| BlockId::new(raw))
            .collect();

        Ok(Some(Inode {
            name,
            size,
            blocks,
            mtime: UNIX_EPOCH + Duration::from_secs(self.mtime.max(0) as u64),
        }))
    }
}

impl From<Option<&Inode>> for DiskInode {
    fn from(slot: Option<&Inode>) -> Self {
        let mut disk_inode = Self::unused();
        let Some(inode) = slot else {
            return disk_inode;
        };

        // 名字长度在打开时已校验，这里只防止越界
        let name = inode.name.as_bytes();
        let name_len = name.len().min(NAME_CAP - 1);
        disk_inode.name[..name_len].copy_from_slice(&name[..name_len]);
        disk_inode.size = inode.size as i32;
        disk_inode.block_count = inode.blocks.len() as u16;
        disk_inode.mtime = inode
            .mtime
            .duration_since(UNIX_EPOCH)
            .map_or(0, |since| since.as_secs() as i64);
        for (raw, id) in disk_inode.blocks.iter_mut().zip(&inode.blocks) {
            *raw = u16::from(*id);
        }

        disk_inode
    }
}

impl Inode {
    /// 新建的空文件
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            size: 0,
            blocks: Vec::new(),
            mtime: SystemTime::now(),
        }
    }

    #[inline]
    pub fn touch(&mut self) {
        self.mtime = SystemTime::now();
    }
}
