//! Static division of the page range `[0, max_page]` between workers.
use std::ops::Range;

use crate::config::PartitionStrategy;
use crate::error::FetchError;

/// A contiguous run of pages owned by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub index: usize,
    pub start: u32,
    /// May be zero when there are more workers than pages.
    pub count: u32,
}

impl Partition {
    pub fn pages(&self) -> Range<u32> {
        self.start..self.start + self.count
    }

    pub fn contains(&self, page: u32) -> bool {
        self.pages().contains(&page)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionPlan {
    partitions: Vec<Partition>,
}

impl PartitionPlan {
    pub fn new(
        strategy: PartitionStrategy,
        max_page: u32,
        workers: usize,
    ) -> Result<Self, FetchError> {
        match strategy {
            PartitionStrategy::Remainder => Self::split(max_page, workers),
            PartitionStrategy::Balanced => Self::balanced(max_page, workers),
        }
    }

    /// Every worker gets `max_page / workers` pages, the last one also takes
    /// the remainder and the final page.
    pub fn split(max_page: u32, workers: usize) -> Result<Self, FetchError> {
        let workers = check_bounds(max_page, workers)?;
        let step = max_page / workers;

        let partitions = (0..workers)
            .map(|i| {
                let start = i * step;
                let count = if i == workers - 1 {
                    max_page - start + 1
                } else {
                    step
                };
                Partition {
                    index: i as usize,
                    start,
                    count,
                }
            })
            .collect();

        Ok(PartitionPlan { partitions })
    }

    /// Partition sizes differ by at most one page; the larger ones come first.
    pub fn balanced(max_page: u32, workers: usize) -> Result<Self, FetchError> {
        let workers = check_bounds(max_page, workers)?;
        let total = max_page + 1;
        let base = total / workers;
        let remainder = total % workers;

        let mut start = 0;
        let mut partitions = Vec::with_capacity(workers as usize);
        for i in 0..workers {
            let count = if i < remainder { base + 1 } else { base };
            partitions.push(Partition {
                index: i as usize,
                start,
                count,
            });
            start += count;
        }

        Ok(PartitionPlan { partitions })
    }

    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    /// All assigned pages, partition by partition.
    pub fn pages(&self) -> impl Iterator<Item = u32> + '_ {
        self.partitions.iter().flat_map(|p| p.pages())
    }
}

fn check_bounds(max_page: u32, workers: usize) -> Result<u32, FetchError> {
    if workers == 0 {
        return Err(FetchError::Config(
            "worker count must be at least 1".to_string(),
        ));
    }
    if max_page == u32::MAX {
        return Err(FetchError::Config(format!(
            "page count {} is out of range",
            max_page
        )));
    }
    u32::try_from(workers)
        .map_err(|_| FetchError::Config(format!("worker count {} is out of range", workers)))
}
