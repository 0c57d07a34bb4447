//! 内存镜像与加载器
//!
//! `MemoryImage` 是处理器看到的全部初始状态：若干段（地址 + 字节）、
//! 入口 PC、可选的停机点，以及 mngr2proc / proc2mngr 两条消息流。
//!
//! 三种构造方式：
//! - 程序化：`with_text` / `with_data_words` / `with_mngr2proc` / `with_proc2mngr`
//! - ELF：PT_LOAD 段作为内存段，`.mngr2proc` / `.proc2mngr` 节作为消息流，
//!   `_halt` 符号作为停机点
//! - 原始二进制：整体加载到指定地址

use std::path::Path;

use elf::ElfBytes;
use elf::abi::{EM_RISCV, PT_LOAD};
use elf::endian::AnyEndian;
use log::info;

use crate::error::SimError;
use crate::memory::FlatMemory;

/// 默认入口（复位向量）
pub const DEFAULT_ENTRY: u32 = 0x200;

/// 一段连续的初始内存内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub addr: u32,
    pub data: Vec<u8>,
}

impl Section {
    pub fn new(name: impl Into<String>, addr: u32, data: Vec<u8>) -> Self {
        Self { name: name.into(), addr, data }
    }

    /// 由小端 32-bit 字构造
    pub fn from_words(name: impl Into<String>, addr: u32, words: &[u32]) -> Self {
        let data = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        Self::new(name, addr, data)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryImage {
    pub sections: Vec<Section>,
    pub entry: u32,
    /// 到达该 PC 时停止取指
    pub halt_pc: Option<u32>,
    /// 测试源消息
    pub mngr2proc: Vec<u32>,
    /// 期望的测试汇消息
    pub proc2mngr: Vec<u32>,
}

impl Default for MemoryImage {
    fn default() -> Self {
        Self {
            sections: Vec::new(),
            entry: DEFAULT_ENTRY,
            halt_pc: None,
            mngr2proc: Vec::new(),
            proc2mngr: Vec::new(),
        }
    }
}

impl MemoryImage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 在入口处放置代码段，停机点设为最后一条指令之后
    ///
    /// ```
    /// use tinyrv0_sim::image::MemoryImage;
    ///
    /// let image = MemoryImage::new().with_text(&[0x00500093, 0x00700113]);
    /// assert_eq!(image.entry, 0x200);
    /// assert_eq!(image.halt_pc, Some(0x208));
    /// ```
    pub fn with_text(mut self, words: &[u32]) -> Self {
        self.sections.push(Section::from_words(".text", self.entry, words));
        self.halt_pc = Some(self.entry.wrapping_add(4 * words.len() as u32));
        self
    }

    pub fn with_data_words(mut self, addr: u32, words: &[u32]) -> Self {
        self.sections.push(Section::from_words(".data", addr, words));
        self
    }

    pub fn with_entry(mut self, entry: u32) -> Self {
        self.entry = entry;
        self
    }

    pub fn with_mngr2proc(mut self, msgs: impl IntoIterator<Item = u32>) -> Self {
        self.mngr2proc.extend(msgs);
        self
    }

    pub fn with_proc2mngr(mut self, msgs: impl IntoIterator<Item = u32>) -> Self {
        self.proc2mngr.extend(msgs);
        self
    }

    /// 将所有段写入内存阵列
    pub fn write_to(&self, mem: &mut FlatMemory) -> Result<(), SimError> {
        for section in &self.sections {
            mem.write_bytes(section.addr, &section.data)?;
        }
        Ok(())
    }

    pub fn total_bytes(&self) -> usize {
        self.sections.iter().map(|s| s.data.len()).sum()
    }

    /// 原始二进制整体加载到 `load_addr`，并从该地址开始执行
    ///
    /// 停机点设为最后一个（按字补齐的）字之后，与 `with_text` 一致。
    pub fn from_bin(data: Vec<u8>, load_addr: u32) -> Self {
        let len = data.len().next_multiple_of(4) as u32;
        Self {
            sections: vec![Section::new(".bin", load_addr, data)],
            entry: load_addr,
            halt_pc: Some(load_addr.wrapping_add(len)),
            ..Self::default()
        }
    }

    pub fn from_bin_file<P: AsRef<Path>>(path: P, load_addr: u32) -> Result<Self, SimError> {
        let data = std::fs::read(path.as_ref())?;
        info!("Loaded binary {} ({} bytes @ 0x{:08x})", path.as_ref().display(), data.len(), load_addr);
        Ok(Self::from_bin(data, load_addr))
    }

    pub fn from_elf<P: AsRef<Path>>(path: P) -> Result<Self, SimError> {
        let data = std::fs::read(path.as_ref())?;
        let image = Self::from_elf_bytes(&data)?;
        info!("Loaded ELF {}", path.as_ref().display());
        Ok(image)
    }

    /// 从字节数组解析 ELF（使用 elf crate）
    pub fn from_elf_bytes(data: &[u8]) -> Result<Self, SimError> {
        let elf_file = ElfBytes::<AnyEndian>::minimal_parse(data)
            .map_err(|e| SimError::ElfParse(format!("Failed to parse ELF: {}", e)))?;

        let header = &elf_file.ehdr;
        if header.e_machine != EM_RISCV {
            return Err(SimError::ElfParse(format!(
                "Not a RISC-V ELF (machine type: 0x{:x}, expected 0x{:x})",
                header.e_machine, EM_RISCV
            )));
        }
        if header.class != elf::file::Class::ELF32 {
            return Err(SimError::ElfParse("Only 32-bit ELF is supported".into()));
        }

        let mut image = MemoryImage::new().with_entry(header.e_entry as u32);

        if let Some(phdrs) = elf_file.segments() {
            for (i, phdr) in phdrs.iter().filter(|p| p.p_type == PT_LOAD).enumerate() {
                let mut bytes = elf_file
                    .segment_data(&phdr)
                    .map_err(|e| SimError::ElfParse(format!("Failed to read segment data: {}", e)))?
                    .to_vec();
                // .bss 部分补零
                bytes.resize(phdr.p_memsz as usize, 0);
                image.sections.push(Section::new(format!("seg{i}"), phdr.p_vaddr as u32, bytes));
            }
        }

        image.mngr2proc = stream_section(&elf_file, ".mngr2proc")?;
        image.proc2mngr = stream_section(&elf_file, ".proc2mngr")?;

        if let Ok(Some((symtab, strtab))) = elf_file.symbol_table() {
            image.halt_pc = symtab
                .iter()
                .find(|sym| strtab.get(sym.st_name as usize).is_ok_and(|name| name == "_halt"))
                .map(|sym| sym.st_value as u32);
        }

        // 既无停机点又无消息流时 done() 在第 0 周期就成立
        if image.halt_pc.is_none() && image.mngr2proc.is_empty() && image.proc2mngr.is_empty() {
            return Err(SimError::ElfParse(
                "ELF has no _halt symbol and no .mngr2proc/.proc2mngr sections".into(),
            ));
        }

        Ok(image)
    }
}

/// 读取一个由小端 32-bit 字组成的节，节不存在时返回空流
fn stream_section(elf_file: &ElfBytes<'_, AnyEndian>, name: &str) -> Result<Vec<u32>, SimError> {
    let shdr = elf_file
        .section_header_by_name(name)
        .map_err(|e| SimError::ElfParse(format!("Failed to read section headers: {}", e)))?;
    let Some(shdr) = shdr else {
        return Ok(Vec::new());
    };
    let (bytes, _) = elf_file
        .section_data(&shdr)
        .map_err(|e| SimError::ElfParse(format!("Failed to read section {name}: {}", e)))?;
    if bytes.len() % 4 != 0 {
        return Err(SimError::ElfParse(format!("section {name} is not a whole number of words")));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}
