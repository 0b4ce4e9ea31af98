//! Flat typed cell storage for a 2D grid.
//!
//! A [`GridWorld`] owns `width * height` zeroed cells whose layout is fixed by
//! the [`WorldType`] it was created with. Cells are handed out as typed
//! slices; taking a mutable slice marks the world dirty so that whoever
//! mirrors the cells on the GPU knows to re-sync before the next draw.

use crate::error::RenderError;

/// Selects the per-cell layout of a [`GridWorld`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorldType {
    /// Cells are [`WorldMoe`].
    Moe,
}

impl WorldType {
    /// Size in bytes of one cell.
    pub fn cell_size(self) -> usize {
        match self {
            WorldType::Moe => std::mem::size_of::<WorldMoe>(),
        }
    }

    /// Logical name of the shader pair that draws this layout.
    pub fn shader_name(self) -> &'static str {
        match self {
            WorldType::Moe => "alife/world2d_moe",
        }
    }
}

/// A cell holding nothing but food.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct WorldMoe {
    pub food: i16,
}

/// One arm per [`WorldType`]; each keeps its cells in their natural
/// alignment so typed views never need a copy.
#[derive(Debug)]
enum CellStorage {
    Moe(Vec<WorldMoe>),
}

impl CellStorage {
    fn zeroed<T: bytemuck::Zeroable + Clone>(count: usize) -> Result<Vec<T>, RenderError> {
        let mut cells = Vec::new();
        cells
            .try_reserve_exact(count)
            .map_err(|_| RenderError::allocation("grid world cells"))?;
        cells.resize(count, T::zeroed());
        Ok(cells)
    }

    fn len(&self) -> usize {
        match self {
            CellStorage::Moe(cells) => cells.len(),
        }
    }

    fn as_bytes(&self) -> &[u8] {
        match self {
            CellStorage::Moe(cells) => bytemuck::cast_slice(cells),
        }
    }

    fn as_bytes_mut(&mut self) -> &mut [u8] {
        match self {
            CellStorage::Moe(cells) => bytemuck::cast_slice_mut(cells),
        }
    }

    fn cast<T: bytemuck::Pod>(&self) -> &[T] {
        match self {
            CellStorage::Moe(cells) => bytemuck::cast_slice(cells),
        }
    }

    fn cast_mut<T: bytemuck::Pod>(&mut self) -> &mut [T] {
        match self {
            CellStorage::Moe(cells) => bytemuck::cast_slice_mut(cells),
        }
    }
}

/// A `width x height` grid of cells with a dirty flag.
#[derive(Debug)]
pub struct GridWorld {
    world_type: WorldType,
    width: u32,
    height: u32,
    cells: CellStorage,
    dirty: bool,
}

impl GridWorld {
    /// Allocates a zeroed world.
    ///
    /// Zero-sized or overflowing dimensions are rejected; a failed
    /// reservation comes back as [`RenderError::Allocation`].
    pub fn new(world_type: WorldType, width: u32, height: u32) -> Result<Self, RenderError> {
        let count = (width as usize)
            .checked_mul(height as usize)
            .filter(|&count| count > 0)
            .filter(|count| count.checked_mul(world_type.cell_size()).is_some_and(|b| b <= isize::MAX as usize))
            .ok_or(RenderError::InvalidDimensions { width, height })?;

        let cells = match world_type {
            WorldType::Moe => CellStorage::Moe(CellStorage::zeroed(count)?),
        };
        log::debug!("GridWorld: created {world_type:?} world {width}x{height}");

        Ok(Self {
            world_type,
            width,
            height,
            cells,
            dirty: false,
        })
    }

    pub fn world_type(&self) -> WorldType {
        self.world_type
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Always `width * height`.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Typed read-only view of the cells. Leaves the dirty flag alone.
    ///
    /// `T` must have the layout of the world's cell type; a size that does
    /// not tile the storage panics.
    pub fn elements_as<T: bytemuck::Pod>(&self) -> &[T] {
        self.cells.cast()
    }

    /// Typed mutable view of the cells. Marks the world dirty.
    pub fn mutable_elements_as<T: bytemuck::Pod>(&mut self) -> &mut [T] {
        self.dirty = true;
        self.cells.cast_mut()
    }

    /// Raw cell bytes in row-major order.
    pub fn as_bytes(&self) -> &[u8] {
        self.cells.as_bytes()
    }

    /// Zeroes every cell. Marks the world dirty.
    pub fn clear(&mut self) {
        self.dirty = true;
        self.cells.as_bytes_mut().fill(0);
    }

    /// Returns the dirty flag and clears it.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

impl Drop for GridWorld {
    fn drop(&mut self) {
        log::trace!("GridWorld: dropping {}x{} world", self.width, self.height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_world_is_zeroed_and_clean() {
        let world = GridWorld::new(WorldType::Moe, 64, 32).unwrap();
        assert_eq!(world.cell_count(), 64 * 32);
        assert_eq!(world.as_bytes().len(), 64 * 32 * 2);
        assert!(world.elements_as::<WorldMoe>().iter().all(|c| c.food == 0));
        assert!(!world.is_dirty());
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        assert!(matches!(
            GridWorld::new(WorldType::Moe, 0, 4),
            Err(RenderError::InvalidDimensions { width: 0, height: 4 })
        ));
        assert!(GridWorld::new(WorldType::Moe, 4, 0).is_err());
    }

    #[test]
    fn mutable_access_always_sets_dirty() {
        let mut world = GridWorld::new(WorldType::Moe, 4, 4).unwrap();
        world.mutable_elements_as::<WorldMoe>()[5].food = 7;
        assert!(world.is_dirty());
        // Already dirty, still dirty
        let _ = world.mutable_elements_as::<WorldMoe>();
        assert!(world.is_dirty());

        assert!(world.take_dirty());
        assert!(!world.take_dirty());
        let _ = world.mutable_elements_as::<WorldMoe>();
        assert!(world.is_dirty());
    }

    #[test]
    fn read_access_never_touches_dirty() {
        let mut world = GridWorld::new(WorldType::Moe, 4, 4).unwrap();
        let _ = world.elements_as::<WorldMoe>();
        assert!(!world.is_dirty());

        world.mutable_elements_as::<WorldMoe>()[0].food = 1;
        let _ = world.elements_as::<WorldMoe>();
        assert!(world.is_dirty());
    }

    #[test]
    fn cells_can_be_viewed_as_raw_i16() {
        let mut world = GridWorld::new(WorldType::Moe, 3, 2).unwrap();
        world.mutable_elements_as::<WorldMoe>()[4].food = -12;
        assert_eq!(world.elements_as::<i16>()[4], -12);
    }

    #[test]
    fn clear_zeroes_and_marks_dirty() {
        let mut world = GridWorld::new(WorldType::Moe, 3, 3).unwrap();
        world.mutable_elements_as::<WorldMoe>()[8].food = 100;
        world.take_dirty();

        world.clear();
        assert!(world.is_dirty());
        assert_eq!(world.elements_as::<WorldMoe>()[8].food, 0);
    }
}
