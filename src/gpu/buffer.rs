//! Vertex buffers that are rewritten every frame.

/// Smallest allocation, in bytes.
const MIN_CAPACITY: u64 = 1024;

/// A GPU buffer that grows to fit whatever is written into it.
///
/// The mesh is rebuilt on every resize, so vertex counts are not known up
/// front. Capacity only ever grows (to the next power of two), which keeps
/// reallocations rare while the window is being dragged.
pub struct DynamicBuffer {
    label: &'static str,
    usage: wgpu::BufferUsages,
    buffer: wgpu::Buffer,
    capacity: u64,
    len: u64,
}

impl DynamicBuffer {
    pub fn new(device: &wgpu::Device, label: &'static str, usage: wgpu::BufferUsages) -> Self {
        let usage = usage | wgpu::BufferUsages::COPY_DST;
        Self {
            label,
            usage,
            buffer: allocate(device, label, usage, MIN_CAPACITY),
            capacity: MIN_CAPACITY,
            len: 0,
        }
    }

    /// Replace the buffer contents with `bytes`.
    pub fn write(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, bytes: &[u8]) {
        let needed = bytes.len() as u64;
        if needed > self.capacity {
            self.capacity = grown_capacity(needed);
            self.buffer = allocate(device, self.label, self.usage, self.capacity);
            log::debug!("grew {} to {} bytes", self.label, self.capacity);
        }
        if needed > 0 {
            queue.write_buffer(&self.buffer, 0, bytes);
        }
        self.len = needed;
    }

    /// The written part of the buffer.
    pub fn slice(&self) -> wgpu::BufferSlice<'_> {
        self.buffer.slice(..self.len.max(wgpu::COPY_BUFFER_ALIGNMENT))
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

fn allocate(device: &wgpu::Device, label: &str, usage: wgpu::BufferUsages, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage,
        mapped_at_creation: false,
    })
}

fn grown_capacity(needed: u64) -> u64 {
    needed.next_power_of_two().max(MIN_CAPACITY)
}
