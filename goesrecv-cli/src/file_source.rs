//! A `Source` reading raw interleaved-f32 I/Q samples from a file.

use std::fs::File;
use std::io::{BufReader, Read as _};
use std::path::Path;

use goesrecv_core::{Queue, SampleBlock, Sample, Source};

pub struct FileSource {
    reader: BufReader<File>,
    block_size: usize,
}

impl FileSource {
    pub fn open(path: &Path, block_size: usize) -> std::io::Result<Self> {
        Ok(Self {
            reader: BufReader::new(File::open(path)?),
            block_size,
        })
    }
}

impl Source for FileSource {
    fn run(&mut self, qout: &Queue<SampleBlock>) {
        let mut raw = vec![0u8; self.block_size * 8];
        loop {
            let mut filled = 0;
            while filled < raw.len() {
                match self.reader.read(&mut raw[filled..]) {
                    Ok(0) => break,
                    Ok(n) => filled += n,
                    Err(err) => {
                        log::error!("file source read error: {err}");
                        qout.close();
                        return;
                    }
                }
            }
            if filled == 0 {
                break;
            }

            let mut block = qout.pop_for_write();
            block.clear();
            for chunk in raw[..filled].chunks_exact(8) {
                let re = f32::from_le_bytes(chunk[0..4].try_into().unwrap());
                let im = f32::from_le_bytes(chunk[4..8].try_into().unwrap());
                block.push(Sample::new(re, im));
            }
            qout.push_write(block);

            if filled < raw.len() {
                break;
            }
        }
        qout.close();
    }
}
