use {
    crate::range::{buffer_ranges, image_ranges, LinearRanges, SubresourceRange},
    fnv::FnvHashMap,
    parking_lot::RwLock,
    smallvec::SmallVec,
    std::{ops::Range, sync::Arc},
    syncval_core::{vk, EngineFault, MemoryId, ResourceId},
};

/// Creation parameters of a buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferInfo {
    /// Size in bytes.
    pub size: u64,

    /// Sharing mode.
    pub sharing: vk::SharingMode,
}

/// Creation parameters of an image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageInfo {
    /// Aspects the format has.
    pub aspects: vk::ImageAspectFlags,

    /// Number of mip levels.
    pub mip_levels: u32,

    /// Number of array layers.
    pub array_layers: u32,

    /// Layout at creation.
    pub initial_layout: vk::ImageLayout,

    /// Sharing mode.
    pub sharing: vk::SharingMode,
}

/// Buffer or image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    /// Buffer resource.
    Buffer(BufferInfo),

    /// Image resource.
    Image(ImageInfo),
}

/// Registered resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourceInfo {
    /// Resource id.
    pub id: ResourceId,

    /// Kind and creation parameters.
    pub kind: ResourceKind,
}

impl ResourceInfo {
    /// Sharing mode of the resource.
    pub fn sharing(&self) -> vk::SharingMode {
        match self.kind {
            ResourceKind::Buffer(ref info) => info.sharing,
            ResourceKind::Image(ref info) => info.sharing,
        }
    }

    /// Check if resource is an image.
    pub fn is_image(&self) -> bool {
        match self.kind {
            ResourceKind::Image(_) => true,
            ResourceKind::Buffer(_) => false,
        }
    }

    /// Layout of never touched subresources.
    pub fn initial_layout(&self) -> Option<vk::ImageLayout> {
        match self.kind {
            ResourceKind::Image(ref info) => Some(info.initial_layout),
            ResourceKind::Buffer(_) => None,
        }
    }

    /// Size of the linear index space.
    /// Saturates for images too large to index.
    pub fn extent(&self) -> u64 {
        match self.kind {
            ResourceKind::Buffer(ref info) => info.size,
            ResourceKind::Image(ref info) => u64::from(info.aspects.as_raw().count_ones())
                .saturating_mul(u64::from(info.mip_levels))
                .saturating_mul(u64::from(info.array_layers)),
        }
    }

    /// Map range onto the resource's linear index space.
    pub fn linearize(&self, range: &SubresourceRange) -> Result<LinearRanges, EngineFault> {
        match (&self.kind, range) {
            (ResourceKind::Buffer(info), SubresourceRange::Buffer(range)) => {
                buffer_ranges(self.id, info.size, range)
            }
            (ResourceKind::Image(info), SubresourceRange::Image(range)) => image_ranges(
                self.id,
                info.aspects,
                info.mip_levels,
                info.array_layers,
                range,
            ),
            _ => Err(EngineFault::WrongResourceKind(self.id)),
        }
    }
}

/// Device memory range a resource is bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MemoryBinding {
    /// Memory allocation.
    pub memory: MemoryId,

    /// Offset of the resource in the allocation.
    pub offset: u64,

    /// Number of bytes bound.
    pub size: u64,
}

impl MemoryBinding {
    /// Bound bytes of the allocation.
    pub fn bytes(&self) -> Range<u64> {
        self.offset..self.offset + self.size
    }
}

/// Resource sharing memory with another one.
///
/// Buffers map bytes onto each other exactly.
/// Images have no known memory layout so any overlap covers the whole image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alias {
    /// Resource sharing the memory.
    pub resource: ResourceId,

    /// Shared part in the linear index space of the resource asked about.
    pub own: Range<u64>,

    /// Shared part in the linear index space of the alias.
    pub other: Range<u64>,

    exact: bool,
}

impl Alias {
    /// Part of `range` that is shared, in own and alias index spaces.
    pub fn map(&self, range: &Range<u64>) -> Option<(Range<u64>, Range<u64>)> {
        let start = range.start.max(self.own.start);
        let end = range.end.min(self.own.end);
        if start >= end {
            return None;
        }
        let other = if self.exact {
            self.other.start + (start - self.own.start)..self.other.start + (end - self.own.start)
        } else {
            self.other.clone()
        };
        Some((start..end, other))
    }
}

/// Memory bindings of resources.
#[derive(Debug, Default)]
struct Bindings {
    by_resource: FnvHashMap<ResourceId, MemoryBinding>,
    by_memory: FnvHashMap<MemoryId, SmallVec<[ResourceId; 4]>>,
}

impl Bindings {
    fn remove(&mut self, id: ResourceId) -> Option<MemoryBinding> {
        let binding = self.by_resource.remove(&id)?;
        if let Some(bound) = self.by_memory.get_mut(&binding.memory) {
            bound.retain(|resource| *resource != id);
            if bound.is_empty() {
                self.by_memory.remove(&binding.memory);
            }
        }
        Some(binding)
    }
}

/// Map keyed by resource id split into independently locked shards.
#[derive(Debug)]
pub(crate) struct Shards<V> {
    shards: Vec<RwLock<FnvHashMap<ResourceId, V>>>,
}

impl<V: Clone> Shards<V> {
    pub(crate) fn new(count: usize) -> Self {
        Shards {
            shards: (0..count.max(1))
                .map(|_| RwLock::new(FnvHashMap::default()))
                .collect(),
        }
    }

    fn shard(&self, id: ResourceId) -> &RwLock<FnvHashMap<ResourceId, V>> {
        &self.shards[(id.0 % self.shards.len() as u64) as usize]
    }

    pub(crate) fn get(&self, id: ResourceId) -> Option<V> {
        self.shard(id).read().get(&id).cloned()
    }

    pub(crate) fn get_or_insert_with(&self, id: ResourceId, f: impl FnOnce() -> V) -> V {
        if let Some(value) = self.get(id) {
            return value;
        }
        self.shard(id).write().entry(id).or_insert_with(f).clone()
    }

    /// Insert unless present. Returns `false` if `id` was taken.
    pub(crate) fn insert_new(&self, id: ResourceId, value: V) -> bool {
        let mut shard = self.shard(id).write();
        if shard.contains_key(&id) {
            false
        } else {
            shard.insert(id, value);
            true
        }
    }

    pub(crate) fn insert(&self, id: ResourceId, value: V) {
        self.shard(id).write().insert(id, value);
    }

    pub(crate) fn remove(&self, id: ResourceId) -> Option<V> {
        self.shard(id).write().remove(&id)
    }

    pub(crate) fn clear(&self) {
        for shard in &self.shards {
            shard.write().clear();
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().len()).sum()
    }

    /// Snapshot of all entries in id order.
    pub(crate) fn sorted(&self) -> Vec<(ResourceId, V)> {
        let mut entries: Vec<_> = self
            .shards
            .iter()
            .flat_map(|shard| {
                shard
                    .read()
                    .iter()
                    .map(|(&id, value)| (id, value.clone()))
                    .collect::<Vec<_>>()
            })
            .collect();
        entries.sort_by_key(|&(id, _)| id);
        entries
    }
}

/// Resources known to the validator.
#[derive(Debug)]
pub struct Registry {
    resources: Shards<Arc<ResourceInfo>>,
    bindings: RwLock<Bindings>,
}

impl Registry {
    /// Create registry with `shard_count` lock shards.
    pub fn new(shard_count: usize) -> Self {
        Registry {
            resources: Shards::new(shard_count),
            bindings: RwLock::new(Bindings::default()),
        }
    }

    fn register(&self, info: ResourceInfo) -> Result<(), EngineFault> {
        if self.resources.insert_new(info.id, Arc::new(info)) {
            log::trace!("Registered {} as {:?}", info.id, info.kind);
            Ok(())
        } else {
            Err(EngineFault::DuplicateResource(info.id))
        }
    }

    /// Register a buffer.
    pub fn register_buffer(&self, id: ResourceId, info: BufferInfo) -> Result<(), EngineFault> {
        self.register(ResourceInfo {
            id,
            kind: ResourceKind::Buffer(info),
        })
    }

    /// Register an image.
    pub fn register_image(&self, id: ResourceId, info: ImageInfo) -> Result<(), EngineFault> {
        if info.aspects.is_empty() {
            return Err(EngineFault::InvalidAspects {
                resource: id,
                aspects: info.aspects,
            });
        }
        self.register(ResourceInfo {
            id,
            kind: ResourceKind::Image(info),
        })
    }

    /// Forget a resource and its memory binding.
    pub fn unregister(&self, id: ResourceId) -> Result<Arc<ResourceInfo>, EngineFault> {
        let info = self
            .resources
            .remove(id)
            .ok_or(EngineFault::UnknownResource(id))?;
        self.bindings.write().remove(id);
        Ok(info)
    }

    /// Bind the resource to device memory.
    /// A previous binding of the resource is replaced.
    pub fn bind_memory(&self, id: ResourceId, binding: MemoryBinding) -> Result<(), EngineFault> {
        self.info(id)?;
        if binding.offset.checked_add(binding.size).is_none() {
            return Err(EngineFault::RangeOverflow {
                offset: binding.offset,
                size: binding.size,
            });
        }

        let mut bindings = self.bindings.write();
        if let Some(previous) = bindings.remove(id) {
            log::warn!("{} is bound again, previous binding to {} is dropped", id, previous.memory);
        }
        log::trace!("Bound {} to {} at {:?}", id, binding.memory, binding.bytes());
        bindings.by_resource.insert(id, binding);
        bindings
            .by_memory
            .entry(binding.memory)
            .or_insert_with(SmallVec::new)
            .push(id);
        Ok(())
    }

    /// Memory binding of the resource.
    pub fn binding(&self, id: ResourceId) -> Option<MemoryBinding> {
        self.bindings.read().by_resource.get(&id).copied()
    }

    /// Other resources bound to memory overlapping the resource's binding.
    pub fn aliases(&self, id: ResourceId) -> Result<SmallVec<[Alias; 2]>, EngineFault> {
        let mut aliases = SmallVec::new();
        let bindings = self.bindings.read();
        let binding = match bindings.by_resource.get(&id) {
            Some(binding) => *binding,
            None => return Ok(aliases),
        };
        let bound = match bindings.by_memory.get(&binding.memory) {
            Some(bound) if bound.len() > 1 => bound,
            _ => return Ok(aliases),
        };

        let info = self.info(id)?;
        let bytes = binding.bytes();
        for &other_id in bound.iter().filter(|other| **other != id) {
            let other_binding = match bindings.by_resource.get(&other_id) {
                Some(other_binding) => *other_binding,
                None => continue,
            };
            let other_bytes = other_binding.bytes();
            let start = bytes.start.max(other_bytes.start);
            let end = bytes.end.min(other_bytes.end);
            if start >= end {
                continue;
            }

            let other = self.info(other_id)?;
            let shared = |info: &ResourceInfo, base: u64| {
                if info.is_image() {
                    0..info.extent()
                } else {
                    start - base..(end - base).min(info.extent())
                }
            };
            let mut own = shared(&*info, bytes.start);
            let mut other_range = shared(&*other, other_bytes.start);
            let exact = !info.is_image() && !other.is_image();
            if exact {
                let len = own
                    .end
                    .saturating_sub(own.start)
                    .min(other_range.end.saturating_sub(other_range.start));
                own.end = own.start + len;
                other_range.end = other_range.start + len;
            }
            if own.start >= own.end || other_range.start >= other_range.end {
                continue;
            }
            aliases.push(Alias {
                resource: other_id,
                own,
                other: other_range,
                exact,
            });
        }
        Ok(aliases)
    }

    /// Get resource info.
    pub fn info(&self, id: ResourceId) -> Result<Arc<ResourceInfo>, EngineFault> {
        self.resources
            .get(id)
            .ok_or(EngineFault::UnknownResource(id))
    }

    /// Number of registered resources.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Check if no resources are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::range::BufferRange};

    #[test]
    fn duplicate_registration_fails() {
        let registry = Registry::new(4);
        let info = BufferInfo {
            size: 64,
            sharing: vk::SharingMode::EXCLUSIVE,
        };
        registry.register_buffer(ResourceId(7), info).unwrap();
        assert_eq!(
            registry.register_buffer(ResourceId(7), info),
            Err(EngineFault::DuplicateResource(ResourceId(7)))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unknown_resource_is_a_fault() {
        let registry = Registry::new(4);
        assert_eq!(
            registry.info(ResourceId(3)).map(|_| ()),
            Err(EngineFault::UnknownResource(ResourceId(3)))
        );
    }

    #[test]
    fn buffer_range_on_image_is_wrong_kind() {
        let registry = Registry::new(1);
        registry
            .register_image(
                ResourceId(1),
                ImageInfo {
                    aspects: vk::ImageAspectFlags::COLOR,
                    mip_levels: 1,
                    array_layers: 1,
                    initial_layout: vk::ImageLayout::UNDEFINED,
                    sharing: vk::SharingMode::EXCLUSIVE,
                },
            )
            .unwrap();
        let info = registry.info(ResourceId(1)).unwrap();
        assert_eq!(info.extent(), 1);
        assert_eq!(
            info.linearize(&BufferRange::whole().into()),
            Err(EngineFault::WrongResourceKind(ResourceId(1)))
        );
    }

    fn buffer(registry: &Registry, id: u64, size: u64) -> ResourceId {
        let id = ResourceId(id);
        registry
            .register_buffer(
                id,
                BufferInfo {
                    size,
                    sharing: vk::SharingMode::EXCLUSIVE,
                },
            )
            .unwrap();
        id
    }

    fn bind(registry: &Registry, id: ResourceId, offset: u64, size: u64) {
        registry
            .bind_memory(
                id,
                MemoryBinding {
                    memory: MemoryId(1),
                    offset,
                    size,
                },
            )
            .unwrap();
    }

    #[test]
    fn buffer_aliases_map_bytes() {
        let registry = Registry::new(2);
        let first = buffer(&registry, 1, 128);
        let second = buffer(&registry, 2, 128);
        let apart = buffer(&registry, 3, 64);
        bind(&registry, first, 0, 128);
        bind(&registry, second, 64, 128);
        bind(&registry, apart, 256, 64);

        let aliases = registry.aliases(first).unwrap();
        assert_eq!(aliases.len(), 1);
        assert_eq!(aliases[0].resource, second);
        assert_eq!(aliases[0].own, 64..128);
        assert_eq!(aliases[0].other, 0..64);
        assert_eq!(aliases[0].map(&(96..200)), Some((96..128, 32..64)));
        assert_eq!(aliases[0].map(&(0..64)), None);
        assert!(registry.aliases(apart).unwrap().is_empty());

        registry.unregister(second).unwrap();
        assert!(registry.aliases(first).unwrap().is_empty());
        assert_eq!(registry.binding(second), None);
    }

    #[test]
    fn image_alias_covers_whole_image() {
        let registry = Registry::new(2);
        let bytes = buffer(&registry, 1, 1024);
        let image = ResourceId(2);
        registry
            .register_image(
                image,
                ImageInfo {
                    aspects: vk::ImageAspectFlags::COLOR,
                    mip_levels: 2,
                    array_layers: 1,
                    initial_layout: vk::ImageLayout::UNDEFINED,
                    sharing: vk::SharingMode::EXCLUSIVE,
                },
            )
            .unwrap();
        bind(&registry, bytes, 0, 1024);
        bind(&registry, image, 512, 4096);

        let aliases = registry.aliases(bytes).unwrap();
        assert_eq!(aliases[0].own, 512..1024);
        assert_eq!(aliases[0].map(&(0..1)), None);
        assert_eq!(aliases[0].map(&(600..601)), Some((600..601, 0..2)));
        let aliases = registry.aliases(image).unwrap();
        assert_eq!(aliases[0].map(&(1..2)), Some((1..2, 512..1024)));
    }

    #[test]
    fn binding_unknown_or_overflowing_fails() {
        let registry = Registry::new(1);
        let binding = MemoryBinding {
            memory: MemoryId(1),
            offset: u64::max_value(),
            size: 2,
        };
        assert_eq!(
            registry.bind_memory(ResourceId(5), binding),
            Err(EngineFault::UnknownResource(ResourceId(5)))
        );
        let id = buffer(&registry, 5, 16);
        assert_eq!(
            registry.bind_memory(id, binding),
            Err(EngineFault::RangeOverflow {
                offset: u64::max_value(),
                size: 2,
            })
        );
    }

    #[test]
    fn shards_iterate_in_id_order() {
        let shards = Shards::new(3);
        for id in &[9u64, 2, 5, 1] {
            shards.insert(ResourceId(*id), *id);
        }
        let ids: Vec<_> = shards.sorted().into_iter().map(|(id, _)| id.0).collect();
        assert_eq!(ids, vec![1, 2, 5, 9]);
    }
}
