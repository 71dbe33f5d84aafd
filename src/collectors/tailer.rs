use crate::config::AggregationPolicy;
use crate::error::SourceError;
use crate::events::LogLine;
use log::{debug, info, warn};
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};
use tokio::sync::mpsc::Sender;

/// Identity of the file behind a path, used to notice rotation
type FileId = Option<(u64, u64)>;

/// Follows one growing file and sends each complete line to its aggregator
///
/// Reads from the start of the file, or from its end with `start_at_end`.
/// At end-of-file it sleeps for the poll interval and tries again. A file
/// that shrinks below the read offset is reread from the beginning. With
/// `reopen_on_rotate` the path is reopened once it refers to a different
/// file; otherwise the original descriptor is followed.
pub struct FileTailer {
    path: PathBuf,
    start_at_end: bool,
    reopen: bool,
    poll_interval: Duration,
    output: Sender<LogLine>,
}

struct OpenFile {
    reader: BufReader<File>,
    offset: u64,
    id: FileId,
}

impl FileTailer {
    pub fn new(path: PathBuf, policy: &AggregationPolicy, output: Sender<LogLine>) -> Self {
        Self {
            path,
            start_at_end: policy.start_at_end,
            reopen: policy.reopen_on_rotate,
            poll_interval: policy.poll_interval,
            output,
        }
    }

    /// Tail the file until the receiving aggregator goes away
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Open` if the file cannot be opened and rotation
    /// following is disabled, and `SourceError::Read` on a read failure.
    pub async fn run(self) -> Result<(), SourceError> {
        let Some(mut current) = self.open_initial().await? else {
            return Ok(());
        };
        info!(
            "Tailing {} from offset {}",
            self.path.display(),
            current.offset
        );

        let mut partial = Vec::new();
        loop {
            let n = current
                .reader
                .read_until(b'\n', &mut partial)
                .await
                .map_err(|source| self.read_error(source))?;

            if n > 0 {
                current.offset += n as u64;
                if partial.ends_with(b"\n") && !self.emit(&mut partial).await {
                    return Ok(());
                }
                continue;
            }

            if self.output.is_closed() {
                return Ok(());
            }
            tokio::time::sleep(self.poll_interval).await;

            if let Some(reopened) = self.check_rotation(&mut current, &mut partial).await? {
                if !partial.is_empty() && !self.emit(&mut partial).await {
                    return Ok(());
                }
                current = reopened;
            }
        }
    }

    /// Open the path for the first time, waiting for it to appear when
    /// following rotation. `None` means the aggregator went away meanwhile.
    async fn open_initial(&self) -> Result<Option<OpenFile>, SourceError> {
        let mut warned = false;
        loop {
            match open(&self.path).await {
                Ok(mut file) => {
                    if self.start_at_end {
                        file.offset = file
                            .reader
                            .seek(SeekFrom::End(0))
                            .await
                            .map_err(|source| self.read_error(source))?;
                    }
                    return Ok(Some(file));
                }
                Err(source) if !self.reopen => {
                    return Err(SourceError::Open {
                        path: self.path.display().to_string(),
                        source,
                    });
                }
                Err(e) => {
                    if !warned {
                        warn!("Waiting for {} to appear: {}", self.path.display(), e);
                        warned = true;
                    }
                    if self.output.is_closed() {
                        return Ok(None);
                    }
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }

    /// Handle truncation in place and return a fresh handle if the path was
    /// rotated to a new file
    async fn check_rotation(
        &self,
        current: &mut OpenFile,
        partial: &mut Vec<u8>,
    ) -> Result<Option<OpenFile>, SourceError> {
        let len = current
            .reader
            .get_ref()
            .metadata()
            .await
            .map_err(|source| self.read_error(source))?
            .len();

        if len < current.offset {
            info!("{} was truncated, reading from the start", self.path.display());
            current
                .reader
                .seek(SeekFrom::Start(0))
                .await
                .map_err(|source| self.read_error(source))?;
            current.offset = 0;
            partial.clear();
            return Ok(None);
        }

        if !self.reopen {
            return Ok(None);
        }

        match tokio::fs::metadata(&self.path).await {
            Ok(meta) if file_id(&meta) != current.id => match open(&self.path).await {
                Ok(reopened) => {
                    info!("{} was rotated, reopening", self.path.display());
                    Ok(Some(reopened))
                }
                Err(e) => {
                    debug!("Rotated file {} not readable yet: {}", self.path.display(), e);
                    Ok(None)
                }
            },
            Ok(_) => Ok(None),
            Err(e) => {
                debug!("{} is missing, waiting: {}", self.path.display(), e);
                Ok(None)
            }
        }
    }

    /// Send the buffered line and clear it; `false` means the receiver is gone
    async fn emit(&self, partial: &mut Vec<u8>) -> bool {
        let mut bytes = std::mem::take(partial);
        if bytes.last() == Some(&b'\n') {
            bytes.pop();
        }
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }

        let text = String::from_utf8_lossy(&bytes).into_owned();
        self.output.send(LogLine::new(text)).await.is_ok()
    }

    fn read_error(&self, source: std::io::Error) -> SourceError {
        SourceError::Read {
            path: self.path.display().to_string(),
            source,
        }
    }
}

async fn open(path: &Path) -> std::io::Result<OpenFile> {
    let file = File::open(path).await?;
    let id = file_id(&file.metadata().await?);
    Ok(OpenFile {
        reader: BufReader::new(file),
        offset: 0,
        id,
    })
}

#[cfg(unix)]
fn file_id(meta: &std::fs::Metadata) -> FileId {
    use std::os::unix::fs::MetadataExt;
    Some((meta.dev(), meta.ino()))
}

#[cfg(not(unix))]
fn file_id(_meta: &std::fs::Metadata) -> FileId {
    None
}
