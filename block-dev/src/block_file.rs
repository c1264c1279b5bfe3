use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{BLOCK_SIZE, BlockDevice};

/// A flat host file treated as a block device. Block `n` lives at byte offset `n * BLOCK_SIZE`.
#[derive(Debug)]
pub struct BlockFile {
    inner: Mutex<File>,
}

impl BlockFile {
    pub fn new(fd: File) -> Self {
        Self {
            inner: Mutex::new(fd),
        }
    }

    /// 锁中毒时照常取出文件：每次读写都会重新定位
    fn file(&self) -> MutexGuard<'_, File> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn seek_block(file: &mut File, block_id: usize) -> io::Result<()> {
        file.seek(SeekFrom::Start((block_id * BLOCK_SIZE) as u64))?;
        Ok(())
    }
}

impl BlockDevice for BlockFile {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> io::Result<()> {
        debug_assert_eq!(buf.len(), BLOCK_SIZE, "not a complete block!");
        let mut file = self.file();
        Self::seek_block(&mut file, block_id)?;
        file.read_exact(buf)
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) -> io::Result<()> {
        debug_assert_eq!(buf.len(), BLOCK_SIZE, "not a complete block!");
        let mut file = self.file();
        Self::seek_block(&mut file, block_id)?;
        file.write_all(buf)
    }

    fn sync(&self) -> io::Result<()> {
        self.file().sync_all()
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Seek, SeekFrom, Write};

    use super::*;

    #[test]
    fn blocks_map_to_file_offsets() {
        let mut fd = tempfile::tempfile().unwrap();
        fd.set_len(4 * BLOCK_SIZE as u64).unwrap();
        fd.seek(SeekFrom::Start(0)).unwrap();
        fd.write_all(&[0xAA; BLOCK_SIZE]).unwrap();

        let dev = BlockFile::new(fd);
        let mut buf = [0u8; BLOCK_SIZE];
        dev.read_block(0, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0xAA));

        dev.write_block(3, &[0x55; BLOCK_SIZE]).unwrap();
        dev.read_block(3, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0x55));
        dev.read_block(2, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn short_file_is_an_error() {
        let fd = tempfile::tempfile().unwrap();
        fd.set_len(BLOCK_SIZE as u64 / 2).unwrap();

        let dev = BlockFile::new(fd);
        let mut buf = [0u8; BLOCK_SIZE];
        let err = dev.read_block(0, &mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn usable_from_another_thread() {
        let fd = tempfile::tempfile().unwrap();
        fd.set_len(2 * BLOCK_SIZE as u64).unwrap();
        let dev = BlockFile::new(fd);
        dev.write_block(1, &[0x5A; BLOCK_SIZE]).unwrap();

        let dev = std::thread::spawn(move || {
            let mut buf = [0u8; BLOCK_SIZE];
            dev.read_block(1, &mut buf).unwrap();
            assert!(buf.iter().all(|&b| b == 0x5A));
            dev.write_block(0, &[0xA5; BLOCK_SIZE]).unwrap();
            dev
        })
        .join()
        .unwrap();

        let mut buf = [0u8; BLOCK_SIZE];
        dev.read_block(0, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0xA5));
        dev.sync().unwrap();
    }
}
