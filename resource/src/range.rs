use {
    smallvec::SmallVec,
    std::ops::Range,
    syncval_core::{vk, EngineFault, ResourceId},
};

/// Byte range of a buffer.
/// `size` may be `vk::WHOLE_SIZE`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferRange {
    /// First byte.
    pub offset: u64,

    /// Number of bytes.
    pub size: u64,
}

impl BufferRange {
    /// Range from `offset` to the end of the buffer.
    pub fn whole() -> Self {
        BufferRange {
            offset: 0,
            size: vk::WHOLE_SIZE,
        }
    }

    /// Range of `size` bytes at `offset`.
    pub fn new(offset: u64, size: u64) -> Self {
        BufferRange { offset, size }
    }
}

/// Aspects, mip levels and array layers of an image.
/// Counts may be `vk::REMAINING_MIP_LEVELS` and `vk::REMAINING_ARRAY_LAYERS`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageSubresourceRange {
    /// Aspects.
    pub aspects: vk::ImageAspectFlags,

    /// First mip level.
    pub base_mip_level: u32,

    /// Number of mip levels.
    pub level_count: u32,

    /// First array layer.
    pub base_array_layer: u32,

    /// Number of array layers.
    pub layer_count: u32,
}

impl ImageSubresourceRange {
    /// All levels and layers of `aspects`.
    pub fn whole(aspects: vk::ImageAspectFlags) -> Self {
        ImageSubresourceRange {
            aspects,
            base_mip_level: 0,
            level_count: vk::REMAINING_MIP_LEVELS,
            base_array_layer: 0,
            layer_count: vk::REMAINING_ARRAY_LAYERS,
        }
    }
}

impl From<vk::ImageSubresourceRange> for ImageSubresourceRange {
    fn from(range: vk::ImageSubresourceRange) -> Self {
        ImageSubresourceRange {
            aspects: range.aspect_mask,
            base_mip_level: range.base_mip_level,
            level_count: range.level_count,
            base_array_layer: range.base_array_layer,
            layer_count: range.layer_count,
        }
    }
}

/// Part of a resource an access or barrier touches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SubresourceRange {
    /// Bytes of a buffer.
    Buffer(BufferRange),

    /// Subresources of an image.
    Image(ImageSubresourceRange),
}

impl From<BufferRange> for SubresourceRange {
    fn from(range: BufferRange) -> Self {
        SubresourceRange::Buffer(range)
    }
}

impl From<ImageSubresourceRange> for SubresourceRange {
    fn from(range: ImageSubresourceRange) -> Self {
        SubresourceRange::Image(range)
    }
}

/// Linear ranges of a resource's index space.
pub type LinearRanges = SmallVec<[Range<u64>; 4]>;

pub(crate) fn buffer_ranges(
    resource: ResourceId,
    size: u64,
    range: &BufferRange,
) -> Result<LinearRanges, EngineFault> {
    let end = if range.size == vk::WHOLE_SIZE {
        size
    } else {
        range
            .offset
            .checked_add(range.size)
            .ok_or(EngineFault::RangeOverflow {
                offset: range.offset,
                size: range.size,
            })?
    };

    if range.offset > end || end > size {
        return Err(EngineFault::OutOfBounds {
            resource,
            range: range.offset..end,
        });
    }

    let mut ranges = LinearRanges::new();
    if range.offset < end {
        ranges.push(range.offset..end);
    }
    Ok(ranges)
}

fn clamp_count(
    resource: ResourceId,
    base: u32,
    count: u32,
    remaining: u32,
    total: u32,
) -> Result<Range<u64>, EngineFault> {
    let end = if count == remaining {
        u64::from(total)
    } else {
        u64::from(base) + u64::from(count)
    };
    let base = u64::from(base);
    if base > end || end > u64::from(total) {
        return Err(EngineFault::OutOfBounds {
            resource,
            range: base..end,
        });
    }
    Ok(base..end)
}

fn push_merged(ranges: &mut LinearRanges, range: Range<u64>) {
    if range.start == range.end {
        return;
    }
    if let Some(last) = ranges.last_mut() {
        if last.end == range.start {
            last.end = range.end;
            return;
        }
    }
    ranges.push(range);
}

/// Linearise subresources as `(aspect, level, layer)` with layers varying fastest.
/// Aspects are numbered in bit order among the image's own aspects.
pub(crate) fn image_ranges(
    resource: ResourceId,
    image_aspects: vk::ImageAspectFlags,
    mip_levels: u32,
    array_layers: u32,
    range: &ImageSubresourceRange,
) -> Result<LinearRanges, EngineFault> {
    if !image_aspects.contains(range.aspects) {
        return Err(EngineFault::InvalidAspects {
            resource,
            aspects: range.aspects,
        });
    }

    let levels = clamp_count(
        resource,
        range.base_mip_level,
        range.level_count,
        vk::REMAINING_MIP_LEVELS,
        mip_levels,
    )?;
    let layers = clamp_count(
        resource,
        range.base_array_layer,
        range.layer_count,
        vk::REMAINING_ARRAY_LAYERS,
        array_layers,
    )?;

    let level_total = u64::from(mip_levels);
    let layer_total = u64::from(array_layers);
    let mut ranges = LinearRanges::new();

    let image_bits = (0..32)
        .map(|bit| 1u32 << bit)
        .filter(|&bit| image_aspects.as_raw() & bit != 0);

    for (index, bit) in image_bits.enumerate() {
        if range.aspects.as_raw() & bit == 0 {
            continue;
        }
        for level in levels.clone() {
            let overflow = || EngineFault::RangeOverflow {
                offset: level,
                size: layers.end,
            };
            let base = (index as u64)
                .checked_mul(level_total)
                .and_then(|base| base.checked_add(level))
                .and_then(|base| base.checked_mul(layer_total))
                .ok_or_else(overflow)?;
            let end = base.checked_add(layers.end).ok_or_else(overflow)?;
            push_merged(&mut ranges, base + layers.start..end);
        }
    }

    Ok(ranges)
}
