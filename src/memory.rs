//! 内存抽象层
//!
//! 本模块定义了内存阵列的统一接口 `Memory` trait，以及 timing 模型
//! 内部使用的平坦字节数组 `FlatMemory`。访存时序不在这里建模，
//! 见 `crate::timing`。

/// 访存粒度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessSize {
    Byte,
    Half,
    Word,
}

impl AccessSize {
    pub fn bytes(self) -> usize {
        match self {
            AccessSize::Byte => 1,
            AccessSize::Half => 2,
            AccessSize::Word => 4,
        }
    }

    /// 从请求报文中的 `len` 字段转换，0 表示整字
    pub fn from_len(len: u8) -> Option<Self> {
        match len {
            1 => Some(AccessSize::Byte),
            2 => Some(AccessSize::Half),
            0 | 4 => Some(AccessSize::Word),
            _ => None,
        }
    }
}

/// 内存访问错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemError {
    /// 地址未按访问粒度对齐
    Unaligned { addr: u32, access: AccessSize },
    /// 地址越界
    OutOfRange { addr: u32, access: AccessSize, base: u32, size: usize },
    /// 请求报文中的 len 字段非法
    BadLength { addr: u32, len: u8 },
}

impl std::fmt::Display for MemError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemError::Unaligned { addr, access } => {
                write!(f, "Unaligned {:?} access at 0x{:08x}", access, addr)
            }
            MemError::OutOfRange { addr, access, base, size } => {
                write!(
                    f,
                    "Out-of-range {:?} access at 0x{:08x} (region=0x{:08x}..0x{:08x})",
                    access,
                    addr,
                    base,
                    base.wrapping_add(*size as u32)
                )
            }
            MemError::BadLength { addr, len } => {
                write!(f, "Bad access length {} at 0x{:08x}", len, addr)
            }
        }
    }
}

impl std::error::Error for MemError {}

pub type MemResult<T> = Result<T, MemError>;

/// 内存阵列的统一接口
pub trait Memory {
    fn load8(&self, addr: u32) -> MemResult<u8>;

    /// 小端序
    fn load16(&self, addr: u32) -> MemResult<u16>;

    /// 小端序
    fn load32(&self, addr: u32) -> MemResult<u32>;

    fn store8(&mut self, addr: u32, value: u8) -> MemResult<()>;

    fn store16(&mut self, addr: u32, value: u16) -> MemResult<()>;

    fn store32(&mut self, addr: u32, value: u32) -> MemResult<()>;

    /// 按粒度读取，结果零扩展到 32 位
    fn load(&self, addr: u32, access: AccessSize) -> MemResult<u32> {
        match access {
            AccessSize::Byte => self.load8(addr).map(u32::from),
            AccessSize::Half => self.load16(addr).map(u32::from),
            AccessSize::Word => self.load32(addr),
        }
    }

    /// 按粒度写入，只取 `value` 的低位
    fn store(&mut self, addr: u32, access: AccessSize, value: u32) -> MemResult<()> {
        match access {
            AccessSize::Byte => self.store8(addr, value as u8),
            AccessSize::Half => self.store16(addr, value as u16),
            AccessSize::Word => self.store32(addr, value),
        }
    }
}

/// 简单线性内存
///
/// 使用 `Vec<u8>` 存储一段地址空间，支持可选的基地址偏移。
pub struct FlatMemory {
    data: Vec<u8>,
    base_addr: u32,
}

impl FlatMemory {
    /// 创建一个指定大小的内存区域
    ///
    /// ```
    /// use tinyrv0_sim::memory::FlatMemory;
    ///
    /// let mem = FlatMemory::new(64 * 1024, 0);
    /// assert_eq!(mem.size(), 64 * 1024);
    /// ```
    pub fn new(size: usize, base_addr: u32) -> Self {
        FlatMemory {
            data: vec![0; size],
            base_addr,
        }
    }

    pub fn base_addr(&self) -> u32 {
        self.base_addr
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 清零整个阵列（reset 时使用）
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// 整个阵列的只读视图
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    fn ensure_aligned(addr: u32, access: AccessSize) -> MemResult<()> {
        if addr.is_multiple_of(access.bytes() as u32) {
            Ok(())
        } else {
            Err(MemError::Unaligned { addr, access })
        }
    }

    fn bounds_check(&self, addr: u32, len: usize, access: AccessSize) -> MemResult<usize> {
        let out_of_range = MemError::OutOfRange {
            addr,
            access,
            base: self.base_addr,
            size: self.data.len(),
        };

        let relative = addr.checked_sub(self.base_addr).ok_or(out_of_range)? as usize;
        let end = relative.checked_add(len).ok_or(out_of_range)?;
        if end > self.data.len() {
            return Err(out_of_range);
        }

        Ok(relative)
    }

    /// 批量写入数据到内存
    pub fn write_bytes(&mut self, addr: u32, data: &[u8]) -> MemResult<()> {
        if data.is_empty() {
            return Ok(());
        }
        let start = self.bounds_check(addr, data.len(), AccessSize::Byte)?;
        self.data[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// 批量读取数据，返回副本
    pub fn read_bytes(&self, addr: u32, len: usize) -> MemResult<Vec<u8>> {
        if len == 0 {
            return Ok(Vec::new());
        }
        let start = self.bounds_check(addr, len, AccessSize::Byte)?;
        Ok(self.data[start..start + len].to_vec())
    }
}

impl Memory for FlatMemory {
    fn load8(&self, addr: u32) -> MemResult<u8> {
        let idx = self.bounds_check(addr, 1, AccessSize::Byte)?;
        Ok(self.data[idx])
    }

    fn load16(&self, addr: u32) -> MemResult<u16> {
        Self::ensure_aligned(addr, AccessSize::Half)?;
        let idx = self.bounds_check(addr, 2, AccessSize::Half)?;
        Ok(u16::from_le_bytes([self.data[idx], self.data[idx + 1]]))
    }

    fn load32(&self, addr: u32) -> MemResult<u32> {
        Self::ensure_aligned(addr, AccessSize::Word)?;
        let idx = self.bounds_check(addr, 4, AccessSize::Word)?;
        Ok(u32::from_le_bytes([
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]))
    }

    fn store8(&mut self, addr: u32, value: u8) -> MemResult<()> {
        let idx = self.bounds_check(addr, 1, AccessSize::Byte)?;
        self.data[idx] = value;
        Ok(())
    }

    fn store16(&mut self, addr: u32, value: u16) -> MemResult<()> {
        Self::ensure_aligned(addr, AccessSize::Half)?;
        let idx = self.bounds_check(addr, 2, AccessSize::Half)?;
        self.data[idx..idx + 2].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    fn store32(&mut self, addr: u32, value: u32) -> MemResult<()> {
        Self::ensure_aligned(addr, AccessSize::Word)?;
        let idx = self.bounds_check(addr, 4, AccessSize::Word)?;
        self.data[idx..idx + 4].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }
}
