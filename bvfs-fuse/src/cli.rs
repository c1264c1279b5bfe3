use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
pub struct Cli {
    /// Partition file, created on first use
    #[arg(long, short, default_value = "bvfs.img")]
    pub partition: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List every file in the partition
    Ls,

    /// Copy a host file into the partition
    Put {
        /// Host file to copy
        host: PathBuf,

        /// Name inside the partition, defaults to the host file name
        #[arg(long, short)]
        name: Option<String>,

        /// Append to an existing file instead of replacing it
        #[arg(long, short)]
        append: bool,
    },

    /// Write a file's contents to stdout
    Cat { name: String },

    /// Delete a file
    Rm { name: String },

    /// Count the free data blocks
    Free,

    /// Copy every regular file of a host directory into the partition
    Pack {
        /// Source directory
        #[arg(long, short)]
        source: PathBuf,
    },
}
