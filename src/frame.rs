//! # 帧编解码模块
//!
//! 帧按固定顺序写在像素数据中：
//!
//! | 字段 | 明文宽度 | 占用像素字节 |
//! |---|---|---|
//! | 魔数 `#*` | 2 字节 | 16 |
//! | 扩展名长度 | `u32` | 32 |
//! | 扩展名 | N 字节 | 8 × N |
//! | 载荷长度 | `u32` | 32 |
//! | 载荷 | M 字节 | 8 × M |
//!
//! 写入端与读取端都以流的方式逐块处理像素字节，每个像素字节只读一次，
//! 载荷不会整体加载进内存。

use crate::capacity::frame_cost;
use crate::constants::{BITS_PER_BYTE, BITS_PER_LENGTH, MARKER, MAX_EXTENSION_LEN};
use crate::error::{EmbedError, ExtensionFault, ExtractError, Field};
use crate::steganography::{pack_u8, pack_u32, unpack_u8, unpack_u32};
use std::io::{ErrorKind, Read, Write};

/// 载荷流式读写时的缓冲区大小。
const PAYLOAD_CHUNK: usize = 8 * 1024;

/// 检查扩展名能否安全地写入帧并拼接到文件名后面。
///
/// 空字符串合法 (载荷没有扩展名)。非空时必须以 `.` 开头，
/// 只包含可打印 ASCII 字符且不含路径分隔符。
pub fn validate_extension(extension: &[u8]) -> Result<(), ExtensionFault> {
    if extension.len() > MAX_EXTENSION_LEN {
        return Err(ExtensionFault::TooLong {
            len: extension.len(),
            max: MAX_EXTENSION_LEN,
        });
    }
    let Some((&first, _)) = extension.split_first() else {
        return Ok(());
    };
    let printable = extension
        .iter()
        .all(|&b| b.is_ascii_graphic() && b != b'/' && b != b'\\');
    if first != b'.' || !printable {
        return Err(ExtensionFault::Malformed);
    }
    Ok(())
}

/// 帧的元数据部分：扩展名与载荷长度。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    extension: String,
    payload_len: u32,
}

impl FrameHeader {
    /// 构造帧头并校验扩展名。
    pub fn new(extension: impl Into<String>, payload_len: u32) -> Result<Self, ExtensionFault> {
        let extension = extension.into();
        validate_extension(extension.as_bytes())?;
        Ok(Self {
            extension,
            payload_len,
        })
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn payload_len(&self) -> u32 {
        self.payload_len
    }

    /// 整个帧占用的像素字节数。
    pub fn carrier_bytes(&self) -> u64 {
        frame_cost(self.extension.len(), self.payload_len)
    }
}

/// 将帧写入载体：从 `carrier` 读取原始像素字节，改写最低位后写到 `out`。
pub struct FrameWriter<R, W> {
    carrier: R,
    out: W,
    consumed: u64,
}

impl<R: Read, W: Write> FrameWriter<R, W> {
    pub fn new(carrier: R, out: W) -> Self {
        Self {
            carrier,
            out,
            consumed: 0,
        }
    }

    /// 已消耗的像素字节数。
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// 按固定字段顺序写入完整的帧，载荷从 `payload` 中流式读取。
    ///
    /// # Errors
    ///
    /// * [`EmbedError::CarrierExhausted`] - 像素数据在帧写完前耗尽。
    /// * [`EmbedError::PayloadTruncated`] - 载荷流比帧头声明的长度短。
    /// * [`EmbedError::Io`] - 读写失败。
    pub fn write_frame<P: Read>(&mut self, header: &FrameHeader, payload: P) -> Result<(), EmbedError> {
        for &byte in MARKER {
            self.write_byte(byte, Field::Marker)?;
        }

        // 扩展名长度已被 validate_extension 限制在 MAX_EXTENSION_LEN 以内
        let extension_len = header.extension.len() as u32;
        self.write_length(extension_len, Field::ExtensionLength)?;
        for &byte in header.extension.as_bytes() {
            self.write_byte(byte, Field::Extension)?;
        }

        self.write_length(header.payload_len, Field::PayloadLength)?;
        self.write_payload(payload, header.payload_len)?;

        tracing::debug!(
            consumed = self.consumed,
            extension = %header.extension,
            payload_len = header.payload_len,
            "frame written"
        );
        Ok(())
    }

    /// 取回底层的载体流与输出流，用于继续拷贝剩余数据。
    pub fn into_inner(self) -> (R, W) {
        (self.carrier, self.out)
    }

    fn write_payload<P: Read>(&mut self, payload: P, len: u32) -> Result<(), EmbedError> {
        let mut payload = payload.take(u64::from(len));
        let mut buf = vec![0u8; PAYLOAD_CHUNK];
        let mut written = 0u64;

        loop {
            let n = match payload.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            for &byte in &buf[..n] {
                self.write_byte(byte, Field::Payload)?;
            }
            written += n as u64;
        }

        if written < u64::from(len) {
            return Err(EmbedError::PayloadTruncated {
                expected: len,
                actual: written,
            });
        }
        Ok(())
    }

    fn write_byte(&mut self, value: u8, field: Field) -> Result<(), EmbedError> {
        let mut chunk = [0u8; BITS_PER_BYTE];
        self.fill(&mut chunk, field)?;
        pack_u8(value, &mut chunk);
        self.emit(&chunk)
    }

    fn write_length(&mut self, value: u32, field: Field) -> Result<(), EmbedError> {
        let mut chunk = [0u8; BITS_PER_LENGTH];
        self.fill(&mut chunk, field)?;
        pack_u32(value, &mut chunk);
        self.emit(&chunk)
    }

    fn fill(&mut self, chunk: &mut [u8], field: Field) -> Result<(), EmbedError> {
        self.carrier.read_exact(chunk).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => EmbedError::CarrierExhausted { field },
            _ => EmbedError::Io(e),
        })
    }

    fn emit(&mut self, chunk: &[u8]) -> Result<(), EmbedError> {
        self.out.write_all(chunk)?;
        self.consumed += chunk.len() as u64;
        Ok(())
    }
}

/// 从载体中读取帧。
pub struct FrameReader<R> {
    carrier: R,
    consumed: u64,
}

impl<R: Read> FrameReader<R> {
    pub fn new(carrier: R) -> Self {
        Self {
            carrier,
            consumed: 0,
        }
    }

    /// 已消耗的像素字节数。
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// 读取魔数、扩展名与载荷长度。
    ///
    /// 魔数不匹配时立即返回 [`ExtractError::MarkerMismatch`]，不再读取任何后续字段。
    /// 像素数据不足 16 字节、连魔数都放不下的载体同样视为没有隐藏数据。
    /// 扩展名长度超过上限时，在读取扩展名之前就返回
    /// [`ExtractError::ExtensionTooLong`]。
    pub fn read_header(&mut self) -> Result<FrameHeader, ExtractError> {
        let (found, complete) = self.read_marker()?;
        if !complete || &found != MARKER {
            return Err(ExtractError::MarkerMismatch {
                found,
                expected: *MARKER,
            });
        }

        let extension_len = self.read_length(Field::ExtensionLength)?;
        let extension_len = usize::try_from(extension_len).unwrap_or(usize::MAX);
        if extension_len > MAX_EXTENSION_LEN {
            return Err(ExtractError::ExtensionTooLong {
                len: extension_len,
                max: MAX_EXTENSION_LEN,
            });
        }

        let extension = (0..extension_len)
            .map(|_| self.read_byte(Field::Extension))
            .collect::<Result<Vec<u8>, _>>()?;
        validate_extension(&extension)?;
        let extension = String::from_utf8(extension).map_err(|_| ExtractError::InvalidExtension)?;

        let payload_len = self.read_length(Field::PayloadLength)?;
        tracing::debug!(%extension, payload_len, "frame header decoded");

        Ok(FrameHeader {
            extension,
            payload_len,
        })
    }

    /// 按帧头声明的长度解出载荷，分块写入 `out`，返回写出的字节数。
    pub fn copy_payload<W: Write>(&mut self, header: &FrameHeader, out: &mut W) -> Result<u64, ExtractError> {
        let mut buf = Vec::with_capacity(PAYLOAD_CHUNK);

        for _ in 0..header.payload_len {
            buf.push(self.read_byte(Field::Payload)?);
            if buf.len() == PAYLOAD_CHUNK {
                out.write_all(&buf)?;
                buf.clear();
            }
        }
        out.write_all(&buf)?;

        Ok(u64::from(header.payload_len))
    }

    /// 读取魔数所在的 16 个像素字节。载体提前结束时缺失的部分按 0 处理，
    /// 并通过第二个返回值告知调用方魔数不完整。
    fn read_marker(&mut self) -> Result<([u8; 2], bool), ExtractError> {
        let mut found = [0u8; 2];
        let mut complete = true;
        for byte in &mut found {
            let mut chunk = [0u8; BITS_PER_BYTE];
            let filled = self.fill_partial(&mut chunk)?;
            complete &= filled == chunk.len();
            *byte = unpack_u8(&chunk);
        }
        Ok((found, complete))
    }

    fn fill_partial(&mut self, chunk: &mut [u8]) -> Result<usize, ExtractError> {
        let mut filled = 0;
        while filled < chunk.len() {
            match self.carrier.read(&mut chunk[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        self.consumed += filled as u64;
        Ok(filled)
    }

    fn read_byte(&mut self, field: Field) -> Result<u8, ExtractError> {
        let mut chunk = [0u8; BITS_PER_BYTE];
        self.fill(&mut chunk, field)?;
        Ok(unpack_u8(&chunk))
    }

    fn read_length(&mut self, field: Field) -> Result<u32, ExtractError> {
        let mut chunk = [0u8; BITS_PER_LENGTH];
        self.fill(&mut chunk, field)?;
        Ok(unpack_u32(&chunk))
    }

    fn fill(&mut self, chunk: &mut [u8], field: Field) -> Result<(), ExtractError> {
        self.carrier.read_exact(chunk).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => ExtractError::UnexpectedEndOfCarrier { field },
            _ => ExtractError::Io(e),
        })?;
        self.consumed += chunk.len() as u64;
        Ok(())
    }
}
