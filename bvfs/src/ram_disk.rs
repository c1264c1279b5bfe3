//! 测试用的内存块设备

use std::io;
use std::sync::Mutex;

use crate::{BLOCK_SIZE, BlockDevice, PARTITION_BLOCKS};

pub struct RamDisk(Mutex<Vec<u8>>);

impl RamDisk {
    pub fn new() -> Self {
        Self(Mutex::new(vec![0; PARTITION_BLOCKS * BLOCK_SIZE]))
    }
}

impl BlockDevice for RamDisk {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> io::Result<()> {
        let data = self.0.lock().unwrap();
        let start = block_id * BLOCK_SIZE;
        buf.copy_from_slice(&data[start..start + BLOCK_SIZE]);
        Ok(())
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) -> io::Result<()> {
        let mut data = self.0.lock().unwrap();
        let start = block_id * BLOCK_SIZE;
        data[start..start + BLOCK_SIZE].copy_from_slice(buf);
        Ok(())
    }
}

/// 指定块的下一次写入失败一次，其余读写交给[`RamDisk`]
pub struct FlakyDisk {
    disk: RamDisk,
    fail_next: Mutex<Option<usize>>,
}

impl FlakyDisk {
    pub fn new() -> Self {
        Self {
            disk: RamDisk::new(),
            fail_next: Mutex::new(None),
        }
    }

    pub fn fail_next_write_to(&self, block_id: usize) {
        *self.fail_next.lock().unwrap() = Some(block_id);
    }
}

impl BlockDevice for FlakyDisk {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> io::Result<()> {
        self.disk.read_block(block_id, buf)
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) -> io::Result<()> {
        let mut fail_next = self.fail_next.lock().unwrap();
        if *fail_next == Some(block_id) {
            *fail_next = None;
            return Err(io::Error::other(format!("write to block {block_id} failed")));
        }
        self.disk.write_block(block_id, buf)
    }
}
