//! # 块设备接口层
//!
//! 块设备是以**块**为单位存储数据的设备，例如磁盘、分区镜像文件等；
//! [`BlockDevice`] 就是对读写块设备的抽象，
//! 实现了此特质的类型称为**块设备驱动**。
//!
//! 文件系统只通过块设备驱动读写块设备，从不直接触碰宿主文件。

use std::any::Any;
use std::io;

mod block_file;

pub use self::block_file::BlockFile;

/// 块大小，读写都以此为单位
pub const BLOCK_SIZE: usize = 512;

/// 块设备驱动特质
pub trait BlockDevice: Send + Sync + Any {
    /// 读出编号为`block_id`的整块，`buf`长度须为[`BLOCK_SIZE`]
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> io::Result<()>;

    /// 写入编号为`block_id`的整块，`buf`长度须为[`BLOCK_SIZE`]
    fn write_block(&self, block_id: usize, buf: &[u8]) -> io::Result<()>;

    /// 把已写入的数据刷到底层介质
    fn sync(&self) -> io::Result<()> {
        Ok(())
    }
}
