//! # 分区管理层
//!
//! 创建或载入分区，在内存中维护索引节点表与描述符表，卸载时落盘。

use core::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Cursor};
use std::path::Path;
use std::sync::Arc;

use binrw::{BinRead, BinWrite};
use block_dev::{BlockDevice, BlockFile};

use crate::fd::FileDescriptor;
use crate::free_list::FreeList;
use crate::layout::{DiskInode, INODE_AREA_START, Inode};
use crate::{BLOCK_SIZE, DataBlock, Error, INODE_COUNT, PARTITION_SIZE, Result};

/// 一个挂载中的分区。
///
/// 分区文件由它独占；索引节点表和描述符表都归它所有，
/// 从[`Bvfs::init`]起有效，到[`Bvfs::destroy`]为止。
pub struct Bvfs {
    pub(crate) block_device: Arc<dyn BlockDevice>,
    pub(crate) free_list: FreeList,
    /// 槽位空闲时为`None`
    pub(crate) inodes: Vec<Option<Inode>>,
    pub(crate) fds: Vec<FileDescriptor>,
}

impl Bvfs {
    /// 打开`path`处的分区文件；文件不存在时新建并格式化。
    ///
    /// 已存在的分区不做任何格式校验，直接载入。
    pub fn init(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        match OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)
        {
            Ok(fd) => {
                log::info!("creating partition {}", path.display());
                let formatted = fd
                    .set_len(PARTITION_SIZE)
                    .map_err(Error::from)
                    .and_then(|()| Self::format(Arc::new(BlockFile::new(fd))));
                if formatted.is_err() {
                    // 不留下格式化了一半的分区
                    if let Err(err) = fs::remove_file(path) {
                        log::error!("cannot remove {}: {err}", path.display());
                    }
                }
                formatted
            }
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                log::info!("loading partition {}", path.display());
                let fd = OpenOptions::new().read(true).write(true).open(path)?;
                Self::load(Arc::new(BlockFile::new(fd)))
            }
            Err(err) => {
                log::error!("cannot open partition {}: {err}", path.display());
                Err(err.into())
            }
        }
    }

    /// 在块设备上建立全新的分区：空闲链表串起全部数据块，索引节点全部空闲
    pub fn format(block_device: Arc<dyn BlockDevice>) -> Result<Self> {
        let free_list = FreeList::format(&*block_device)?;

        let partition = Self {
            block_device,
            free_list,
            inodes: vec![None; INODE_COUNT],
            fds: vec![FileDescriptor::Closed; INODE_COUNT],
        };
        partition.flush_inodes()?;

        Ok(partition)
    }

    /// 载入已有分区的空闲链表头与全部索引节点
    pub fn load(block_device: Arc<dyn BlockDevice>) -> Result<Self> {
        let free_list = FreeList::load(&*block_device)?;

        let mut block: DataBlock = [0; BLOCK_SIZE];
        let inodes = (0..INODE_COUNT)
            .map(|slot| -> Result<Option<Inode>> {
                block_device.read_block(INODE_AREA_START + slot, &mut block)?;
                let disk_inode = DiskInode::read(&mut Cursor::new(&block[..]))?;
                disk_inode.into_inode()
            })
            .collect::<Result<Vec<_>>>()?;
        log::info!(
            "loaded {} files, free list head {:?}",
            inodes.iter().flatten().count(),
            free_list.head()
        );

        Ok(Self {
            block_device,
            free_list,
            inodes,
            fds: vec![FileDescriptor::Closed; INODE_COUNT],
        })
    }

    /// 把全部索引节点和空闲链表头写回磁盘，分区保持挂载
    pub fn sync(&mut self) -> Result<()> {
        self.flush_inodes()?;
        self.free_list.persist(&*self.block_device)?;
        self.block_device.sync()?;
        Ok(())
    }

    /// 落盘并卸载分区。仍然打开着的描述符随之作废。
    pub fn destroy(mut self) -> Result<()> {
        let open = self.fds.iter().filter(|fd| fd.is_open()).count();
        if open > 0 {
            log::warn!("{open} descriptors still open at teardown");
        }
        self.sync()?;
        log::info!("partition unmounted");
        Ok(())
    }

    fn flush_inodes(&self) -> Result<()> {
        let mut block: DataBlock = [0; BLOCK_SIZE];
        for (slot, inode) in self.inodes.iter().enumerate() {
            block.fill(0);
            DiskInode::from(inode.as_ref()).write(&mut Cursor::new(&mut block[..]))?;
            self.block_device
                .write_block(INODE_AREA_START + slot, &block)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Bvfs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bvfs")
            .field("free_head", &self.free_list.head())
            .field("files", &self.inodes.iter().flatten().count())
            .field("open", &self.fds.iter().filter(|fd| fd.is_open()).count())
            .finish_non_exhaustive()
    }
}
