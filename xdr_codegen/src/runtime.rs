// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

// The hand-written runtime every generated module embeds verbatim: the scatter-gather cursors,
// the decode buffer, and the primitive integer/bool codecs. Emitted as a `mod rt` inside the
// generated module so the generated code is self-contained given only the `bytes` crate.

pub const RUNTIME: &str = r#"
/// Implemented by every generated struct, enum, and union. `marshall_into`/`unmarshall_from` are
/// the per-element routines the aggregate codecs dispatch to in a loop for vectors and fixed
/// arrays of user types.
pub trait XdrCodec: Sized {
    fn marshall_into(&self, cursor: &mut XdrWriteCursor);
    fn unmarshall_from(cursor: &mut XdrReadCursor, dbuf: &mut XdrDecodeBuffer) -> Result<Self, XdrCodecError>;

    fn marshall(&self) -> (Vec<bytes::Bytes>, usize) {
        let mut cursor = XdrWriteCursor::new();
        self.marshall_into(&mut cursor);
        cursor.finish()
    }

    fn unmarshall(iovecs: &[bytes::Bytes]) -> Result<Self, XdrCodecError> {
        let mut cursor = XdrReadCursor::new(iovecs);
        let mut dbuf = XdrDecodeBuffer::new();
        Self::unmarshall_from(&mut cursor, &mut dbuf)
    }
}

#[derive(Debug)]
pub enum XdrCodecError {
    /// The cursor ran past the end of the iovec list, on read or write.
    Truncated,
    /// A vector or opaque field's encoded count exceeded its declared bound.
    BoundExceeded { bound: u32, found: u32 },
    /// RPC dispatch was asked for a procedure that is either unknown to this version or has no
    /// registered callback. Distinct from a decode failure against a recognised procedure.
    Unimplemented,
}

impl std::fmt::Display for XdrCodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            XdrCodecError::Truncated => write!(f, "cursor ran past the end of the iovec list"),
            XdrCodecError::BoundExceeded { bound, found } => {
                write!(f, "count {found} exceeds declared bound {bound}")
            }
            XdrCodecError::Unimplemented => write!(f, "procedure is unknown or not implemented"),
        }
    }
}

impl std::error::Error for XdrCodecError {}

pub fn pad_len(n: usize) -> usize {
    (4 - n % 4) % 4
}

/// A bump arena the decoder sub-allocates from when assembling a byte range that spans more
/// than one input iovec. Growth chains fresh blocks rather than reallocating, so a reference
/// handed out of `reserve` stays valid until the whole buffer is released (dropped).
pub struct XdrDecodeBuffer {
    blocks: Vec<Vec<u8>>,
    used: usize,
}

const DECODE_BUFFER_MIN_BLOCK: usize = 4096;

impl XdrDecodeBuffer {
    pub fn new() -> Self {
        XdrDecodeBuffer {
            blocks: vec![vec![0u8; DECODE_BUFFER_MIN_BLOCK]],
            used: 0,
        }
    }

    pub fn reserve(&mut self, len: usize) -> &mut [u8] {
        let last_remaining = self.blocks.last().unwrap().len() - self.used;
        if last_remaining < len {
            let size = std::cmp::max(DECODE_BUFFER_MIN_BLOCK, len);
            self.blocks.push(vec![0u8; size]);
            self.used = 0;
        }
        let block = self.blocks.last_mut().unwrap();
        let start = self.used;
        self.used += len;
        &mut block[start..start + len]
    }
}

impl Default for XdrDecodeBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks a read position across a scatter-gather sequence of input iovecs.
pub struct XdrReadCursor<'a> {
    iovecs: &'a [bytes::Bytes],
    index: usize,
    offset: usize,
}

impl<'a> XdrReadCursor<'a> {
    pub fn new(iovecs: &'a [bytes::Bytes]) -> Self {
        XdrReadCursor {
            iovecs,
            index: 0,
            offset: 0,
        }
    }

    fn advance_to_data(&mut self) -> bool {
        while let Some(cur) = self.iovecs.get(self.index) {
            if self.offset < cur.len() {
                return true;
            }
            self.index += 1;
            self.offset = 0;
        }
        false
    }

    pub fn extract(&mut self, dst: &mut [u8]) -> Result<(), XdrCodecError> {
        let mut written = 0;
        while written < dst.len() {
            if !self.advance_to_data() {
                return Err(XdrCodecError::Truncated);
            }
            let cur = &self.iovecs[self.index];
            let avail = cur.len() - self.offset;
            let take = avail.min(dst.len() - written);
            dst[written..written + take]
                .copy_from_slice(&cur[self.offset..self.offset + take]);
            self.offset += take;
            written += take;
        }
        Ok(())
    }

    pub fn skip(&mut self, n: usize) -> Result<(), XdrCodecError> {
        let mut remaining = n;
        while remaining > 0 {
            if !self.advance_to_data() {
                return Err(XdrCodecError::Truncated);
            }
            let cur = &self.iovecs[self.index];
            let avail = cur.len() - self.offset;
            let take = avail.min(remaining);
            self.offset += take;
            remaining -= take;
        }
        Ok(())
    }

    /// Extracts `n` bytes as a reference-counted, zero-copy slice when they lie entirely within
    /// the current iovec; otherwise assembles them into `dbuf` with one copy.
    pub fn get_zerocopy(
        &mut self,
        n: usize,
        dbuf: &mut XdrDecodeBuffer,
    ) -> Result<bytes::Bytes, XdrCodecError> {
        if self.advance_to_data() {
            let cur = &self.iovecs[self.index];
            if cur.len() - self.offset >= n {
                let b = cur.slice(self.offset..self.offset + n);
                self.offset += n;
                return Ok(b);
            }
        }
        let scratch = dbuf.reserve(n);
        self.extract(scratch)?;
        Ok(bytes::Bytes::copy_from_slice(scratch))
    }

    pub fn get_vec(&mut self, n: usize) -> Result<Vec<u8>, XdrCodecError> {
        let mut v = vec![0u8; n];
        self.extract(&mut v)?;
        Ok(v)
    }

    pub fn get_u32(&mut self) -> Result<u32, XdrCodecError> {
        let mut b = [0u8; 4];
        self.extract(&mut b)?;
        Ok(u32::from_be_bytes(b))
    }

    pub fn get_i32(&mut self) -> Result<i32, XdrCodecError> {
        let mut b = [0u8; 4];
        self.extract(&mut b)?;
        Ok(i32::from_be_bytes(b))
    }

    pub fn get_u64(&mut self) -> Result<u64, XdrCodecError> {
        let mut b = [0u8; 8];
        self.extract(&mut b)?;
        Ok(u64::from_be_bytes(b))
    }

    pub fn get_i64(&mut self) -> Result<i64, XdrCodecError> {
        let mut b = [0u8; 8];
        self.extract(&mut b)?;
        Ok(i64::from_be_bytes(b))
    }

    pub fn get_bool(&mut self) -> Result<bool, XdrCodecError> {
        Ok(self.get_u32()? != 0)
    }
}

/// Accumulates output bytes as a sequence of iovecs: ordinary writes land in a scratch buffer
/// that's flushed as one chunk, while `append_zerocopy` splices an existing `Bytes` in without
/// copying its payload.
pub struct XdrWriteCursor {
    chunks: Vec<bytes::Bytes>,
    scratch: bytes::BytesMut,
}

impl XdrWriteCursor {
    pub fn new() -> Self {
        XdrWriteCursor {
            chunks: Vec::new(),
            scratch: bytes::BytesMut::new(),
        }
    }

    pub fn append(&mut self, src: &[u8]) {
        self.scratch.extend_from_slice(src);
    }

    pub fn append_padded(&mut self, src: &[u8]) {
        self.append(src);
        self.append(&[0u8; 4][..pad_len(src.len())]);
    }

    pub fn append_zerocopy(&mut self, b: bytes::Bytes) {
        if !self.scratch.is_empty() {
            let flushed = std::mem::replace(&mut self.scratch, bytes::BytesMut::new());
            self.chunks.push(flushed.freeze());
        }
        self.chunks.push(b);
    }

    pub fn put_u32(&mut self, v: u32) {
        self.append(&v.to_be_bytes());
    }

    pub fn put_i32(&mut self, v: i32) {
        self.append(&v.to_be_bytes());
    }

    pub fn put_u64(&mut self, v: u64) {
        self.append(&v.to_be_bytes());
    }

    pub fn put_i64(&mut self, v: i64) {
        self.append(&v.to_be_bytes());
    }

    pub fn put_bool(&mut self, v: bool) {
        self.put_u32(if v { 1 } else { 0 });
    }

    pub fn finish(mut self) -> (Vec<bytes::Bytes>, usize) {
        if !self.scratch.is_empty() {
            self.chunks.push(self.scratch.freeze());
        }
        let total = self.chunks.iter().map(|c| c.len()).sum();
        (self.chunks, total)
    }
}

impl Default for XdrWriteCursor {
    fn default() -> Self {
        Self::new()
    }
}

/// The RPC runtime's interface to generated dispatch code: reserving output iovecs for a reply
/// and handing the marshalled reply back to the transport. Implemented by the RPC runtime, not by
/// generated code.
pub trait XdrTransport {
    const MAX_REPLY_IOVECS: usize = 16;
    const MAX_IOVEC_LEN: usize = 1024 * 1024;

    fn reply_dispatch(&mut self, iovecs: Vec<bytes::Bytes>) -> Result<(), XdrCodecError>;
}

/// Holds one incoming call's argument iovecs plus a decode buffer scoped to the call, as handed
/// to a `recv_call_<proc>` callback.
pub struct XdrCallContext<'a> {
    pub iovecs: &'a [bytes::Bytes],
    pub dbuf: XdrDecodeBuffer,
}

impl<'a> XdrCallContext<'a> {
    pub fn new(iovecs: &'a [bytes::Bytes]) -> Self {
        XdrCallContext {
            iovecs,
            dbuf: XdrDecodeBuffer::new(),
        }
    }
}
"#;
