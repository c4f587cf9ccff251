//! Output capture with a per-stream size cap

use tokio::io::{AsyncRead, AsyncReadExt};

/// Appended to a stream that exceeded the cap
pub const TRUNCATION_MARKER: &str = "\n... [truncated]";

const READ_CHUNK: usize = 8 * 1024;

/// Byte buffer that keeps at most `limit` bytes and remembers whether more arrived
#[derive(Debug, Default)]
pub struct CappedBuffer {
    data: Vec<u8>,
    limit: usize,
    overflowed: bool,
}

impl CappedBuffer {
    pub fn new(limit: usize) -> Self {
        Self {
            data: Vec::new(),
            limit,
            overflowed: false,
        }
    }

    /// Append a chunk, discarding whatever does not fit
    pub fn extend(&mut self, chunk: &[u8]) {
        let room = self.limit.saturating_sub(self.data.len());
        if chunk.len() > room {
            self.overflowed = true;
        }
        let take = chunk.len().min(room);
        self.data.extend_from_slice(&chunk[..take]);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    /// Decode lossily, appending [`TRUNCATION_MARKER`] if the cap was hit
    ///
    /// Returns the text and whether it was truncated.
    pub fn render(&self) -> (String, bool) {
        let mut text = String::from_utf8_lossy(&self.data).into_owned();
        if self.overflowed {
            text.push_str(TRUNCATION_MARKER);
        }
        (text, self.overflowed)
    }
}

/// Read `reader` to EOF, keeping only what fits in `sink`
///
/// Reading continues past the cap so the writer never blocks on a full pipe.
pub async fn pump<R>(mut reader: R, sink: &tokio::sync::Mutex<CappedBuffer>) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut chunk = vec![0u8; READ_CHUNK];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        sink.lock().await.extend(&chunk[..n]);
    }
}
