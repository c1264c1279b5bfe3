mod cli;

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;

use bvfs::{Bvfs, OpenMode};
use clap::Parser;
use cli::{Cli, Command};

fn main() -> io::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut partition = Bvfs::init(&cli.partition)?;
    let result = run(&mut partition, cli.command);
    partition.destroy()?;

    result
}

fn run(partition: &mut Bvfs, command: Command) -> io::Result<()> {
    match command {
        Command::Ls => print!("{}", partition.list()),
        Command::Put { host, name, append } => {
            let name = match name {
                Some(name) => name,
                None => file_name(&host)?,
            };
            let mode = if append {
                OpenMode::Append
            } else {
                OpenMode::Truncate
            };
            put(partition, &host, &name, mode)?;
        }
        Command::Cat { name } => {
            let size = partition.stat(&name)?.size;
            let fd = partition.open(&name, OpenMode::ReadOnly)?;
            let mut data = vec![0; size];
            let read = partition.read(fd, &mut data);
            partition.close(fd)?;
            read?;
            io::stdout().write_all(&data)?;
        }
        Command::Rm { name } => partition.unlink(&name)?,
        Command::Free => println!("{} free blocks", partition.free_blocks()?.len()),
        Command::Pack { source } => {
            println!("source={source:?}");
            for entry in fs::read_dir(&source)? {
                let entry = entry?;
                if !entry.file_type()?.is_file() {
                    continue;
                }
                let host = entry.path();
                let name = file_name(&host)?;
                log::info!("packing {name:?}");
                put(partition, &host, &name, OpenMode::Truncate)?;
            }
        }
    }

    Ok(())
}

fn put(partition: &mut Bvfs, host: &Path, name: &str, mode: OpenMode) -> io::Result<()> {
    let mut data = Vec::new();
    File::open(host)?.read_to_end(&mut data)?;

    let fd = partition.open(name, mode)?;
    let written = partition.write(fd, &data);
    partition.close(fd)?;

    let written = written?;
    if written < data.len() {
        log::warn!("{name:?}: only {written} of {} bytes fit", data.len());
    }
    Ok(())
}

fn file_name(path: &Path) -> io::Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_owned)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "host path has no file name"))
}
