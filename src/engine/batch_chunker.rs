// ==========================================
// 商机数据装载工具 - 分批器
// ==========================================
// 契约: 给定 N 条记录与批次大小 C (>0)
// - 产出 ceil(N/C) 个连续、互不重叠、保持原顺序的区间
// - 除最后一批外每批恰为 C 条
// - N = 0 → 0 批; C >= N → 1 批
// ==========================================

use crate::domain::opportunity::OpportunityRecord;
use crate::domain::upload::Batch;
use std::ops::Range;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChunkError {
    #[error("批次大小必须大于 0")]
    ZeroChunkSize,
}

pub type ChunkResult<T> = Result<T, ChunkError>;

// ==========================================
// ChunkRange - 批次区间
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRange {
    pub number: usize, // 批次序号（从 1 开始）
    pub start: usize,  // 起始下标（含）
    pub end: usize,    // 结束下标（不含）
}

impl ChunkRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn as_range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// 批次数 = ceil(total / chunk_size)
pub fn chunk_count(total: usize, chunk_size: usize) -> ChunkResult<usize> {
    if chunk_size == 0 {
        return Err(ChunkError::ZeroChunkSize);
    }
    Ok(total.div_ceil(chunk_size))
}

/// 计算全部批次区间
pub fn chunk_ranges(total: usize, chunk_size: usize) -> ChunkResult<Vec<ChunkRange>> {
    let count = chunk_count(total, chunk_size)?;

    Ok((0..count)
        .map(|idx| {
            let start = idx * chunk_size;
            ChunkRange {
                number: idx + 1,
                start,
                end: (start + chunk_size).min(total),
            }
        })
        .collect())
}

/// 将记录切分为借用批次
pub fn chunk_records(
    records: &[OpportunityRecord],
    chunk_size: usize,
) -> ChunkResult<Vec<Batch<'_>>> {
    let ranges = chunk_ranges(records.len(), chunk_size)?;
    let total = ranges.len();

    Ok(ranges
        .into_iter()
        .map(|range| Batch {
            number: range.number,
            total,
            offset: range.start,
            records: &records[range.as_range()],
        })
        .collect())
}
