use std::io;

use thiserror::Error;

use crate::{NAME_CAP, OpenMode};

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file name is {len} bytes long, at most {} allowed", NAME_CAP - 1)]
    NameTooLong { len: usize },
    #[error("file name must be non-empty and free of NUL bytes")]
    InvalidName,
    #[error("unknown open mode {0}")]
    InvalidMode(u32),
    #[error("no such file")]
    NotFound,
    #[error("file is already open")]
    AlreadyOpen,
    #[error("file descriptor is not open")]
    NotOpen,
    #[error("operation not permitted on a file opened as {0:?}")]
    Mode(OpenMode),
    #[error("read of {len} bytes at offset {cursor} runs past the end of the file ({size} bytes)")]
    OutOfBounds {
        cursor: usize,
        len: usize,
        size: usize,
    },
    #[error("inode table is full")]
    Exhausted,
    #[error("no space left for another data block")]
    NoSpace,
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed on-disk record: {0}")]
    Layout(String),
}

impl Error {
    /// 参数校验类错误：文件名或打开模式不合法
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::NameTooLong { .. } | Self::InvalidName | Self::InvalidMode(_)
        )
    }
}

impl From<binrw::Error> for Error {
    fn from(err: binrw::Error) -> Self {
        match err {
            binrw::Error::Io(err) => Self::Io(err),
            err => Self::Layout(err.to_string()),
        }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        let kind = match err {
            Error::Io(err) => return err,
            Error::NotFound => io::ErrorKind::NotFound,
            Error::NoSpace | Error::Exhausted => io::ErrorKind::StorageFull,
            Error::Layout(_) => io::ErrorKind::InvalidData,
            _ if err.is_validation() => io::ErrorKind::InvalidInput,
            _ => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}
