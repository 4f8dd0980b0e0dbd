// crates/tw_io/src/checkpoint.rs

//! 时间检查点记录
//!
//! 保存/恢复时间积分器的定点时间状态，保证重启后时间簿记逐位一致。
//!
//! # 文件格式
//!
//! 定长 20 字节小端记录，无魔数、无版本头：
//!
//! ```text
//! [偏移  0] 整数时间 itime     : u64
//! [偏移  8] 整数步长 idt       : u64
//! [偏移 16] 迭代计数 iteration : i32
//! ```
//!
//! 文件名为固定前缀加七位零填充的起始时间：`time.0003600`。
//!
//! # 使用示例
//!
//! ```rust,ignore
//! use tw_io::checkpoint::TimeRecord;
//!
//! let record = TimeRecord { itime: 3_600_000_000_000, idt: 5_000_000_000, iteration: 720 };
//! record.save(Path::new("."), 3600)?;
//!
//! let loaded = TimeRecord::load(Path::new("."), 3600)?;
//! assert_eq!(loaded.itime, record.itime);
//! ```

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{IoError, IoResult};

/// 记录字节数
pub const RECORD_SIZE: usize = 20;

/// 检查点文件名前缀
const FILE_PREFIX: &str = "time";

/// 时间检查点记录
///
/// 三个字段与积分器的定点时间状态一一对应；
/// 浮点镜像 (time, dt) 在加载后由调用方除以缩放因子重建。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRecord {
    /// 整数时间（原子时间单位）
    pub itime: u64,
    /// 整数步长（原子时间单位）
    pub idt: u64,
    /// 迭代计数
    pub iteration: i32,
}

impl TimeRecord {
    /// 给定起始时间的检查点文件名
    pub fn filename(start_iotime: u64) -> String {
        format!("{FILE_PREFIX}.{start_iotime:07}")
    }

    /// 给定目录与起始时间的完整路径
    pub fn path_for(directory: &Path, start_iotime: u64) -> PathBuf {
        directory.join(Self::filename(start_iotime))
    }

    /// 编码为定长小端字节记录
    fn to_bytes(self) -> [u8; RECORD_SIZE] {
        let mut buf = [0u8; RECORD_SIZE];
        buf[0..8].copy_from_slice(&self.itime.to_le_bytes());
        buf[8..16].copy_from_slice(&self.idt.to_le_bytes());
        buf[16..20].copy_from_slice(&self.iteration.to_le_bytes());
        buf
    }

    /// 从定长小端字节记录解码
    fn from_bytes(buf: &[u8; RECORD_SIZE]) -> Self {
        Self {
            itime: u64::from_le_bytes(buf[0..8].try_into().unwrap()),
            idt: u64::from_le_bytes(buf[8..16].try_into().unwrap()),
            iteration: i32::from_le_bytes(buf[16..20].try_into().unwrap()),
        }
    }

    /// 保存到 `directory/time.<start:07>`
    ///
    /// 仅应由协调进程调用。文件已存在或无法创建均为错误，
    /// 调用方负责将错误计数广播给所有进程后再中止。
    pub fn save(&self, directory: &Path, start_iotime: u64) -> IoResult<PathBuf> {
        let path = Self::path_for(directory, start_iotime);

        // 已存在的检查点不覆盖：存在即失败
        let mut file = File::options()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|source| IoError::Create {
                path: path.clone(),
                source,
            })?;

        file.write_all(&self.to_bytes())
            .and_then(|_| file.flush())
            .map_err(|source| IoError::Create {
                path: path.clone(),
                source,
            })?;

        log::info!("保存检查点 \"{}\"", path.display());
        Ok(path)
    }

    /// 从 `directory/time.<start:07>` 加载
    pub fn load(directory: &Path, start_iotime: u64) -> IoResult<Self> {
        let path = Self::path_for(directory, start_iotime);

        let mut file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(IoError::NotFound { path });
            }
            Err(source) => return Err(IoError::Read { path, source }),
        };

        let mut buf = [0u8; RECORD_SIZE];
        let mut read = 0usize;
        while read < RECORD_SIZE {
            match file.read(&mut buf[read..]) {
                Ok(0) => {
                    return Err(IoError::Truncated {
                        path,
                        expected: RECORD_SIZE,
                        actual: read,
                    });
                }
                Ok(n) => read += n,
                Err(source) => return Err(IoError::Read { path, source }),
            }
        }

        log::info!("加载检查点 \"{}\"", path.display());
        Ok(Self::from_bytes(&buf))
    }
}

// ============================================================
// 测试
// ============================================================
