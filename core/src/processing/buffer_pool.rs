use crate::prelude::StageError;

/// Scoped pool of scratch buffers reused across plots handled by one worker.
pub struct BufferPool {
    buffers: Vec<Vec<f64>>,
    outstanding: usize,
    max_capacity: usize,
}

impl BufferPool {
    pub fn with_capacity(max_capacity: usize) -> Self {
        Self {
            buffers: Vec::with_capacity(max_capacity),
            outstanding: 0,
            max_capacity,
        }
    }

    /// Hands out an empty buffer, reusing a released one when available.
    pub fn checkout(&mut self, capacity: usize) -> Result<Vec<f64>, StageError> {
        if self.outstanding >= self.max_capacity {
            return Err(StageError::BufferExhaustion(format!(
                "all {} scratch buffers checked out",
                self.max_capacity
            )));
        }
        let mut buffer = self.buffers.pop().unwrap_or_default();
        buffer.clear();
        buffer.reserve(capacity);
        self.outstanding += 1;
        Ok(buffer)
    }

    /// Returns a buffer back to the pool for reuse.
    pub fn release(&mut self, mut buffer: Vec<f64>) {
        buffer.clear();
        self.outstanding = self.outstanding.saturating_sub(1);
        if self.buffers.len() < self.max_capacity {
            self.buffers.push(buffer);
        }
    }

    pub fn reset(&mut self) {
        self.buffers.clear();
        self.outstanding = 0;
    }
}
