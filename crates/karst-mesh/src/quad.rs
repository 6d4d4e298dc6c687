use karst_geom::{Vec2, Vec3};
use karst_voxel::VoxelFacing;

/// One renderable face, packed into two 32-bit words:
///
/// ```text
/// [0] XXXXXXXXYYYYYYYYZZZZZZZZWWWWHHHH
/// [1] FFFFTTTTTTTTTTTAAAAA------------
/// ```
///
/// Position components are 8-bit fixed point in 1/16 voxel units, so they
/// span exactly one chunk. Width/height are 4-bit with a −1 bias
/// (1..16 sixteenths). F is the 4-bit facing, T the 11-bit atlas offset,
/// A the 5-bit animation frame count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChunkQuad(pub [u32; 2]);

impl ChunkQuad {
    pub fn pack(pos: Vec3, size: Vec2, facing: VoxelFacing, texture: u16, frames: usize) -> Self {
        let mut w0 = 0u32;
        let mut w1 = 0u32;

        w0 |= (0x0000_00FF & (pos.x * 16.0) as u32) << 24;
        w0 |= (0x0000_00FF & (pos.y * 16.0) as u32) << 16;
        w0 |= (0x0000_00FF & (pos.z * 16.0) as u32) << 8;

        w0 |= (0x0000_000F & (size.x * 16.0 - 1.0) as u32) << 4;
        w0 |= 0x0000_000F & (size.y * 16.0 - 1.0) as u32;

        w1 |= (0x0000_000F & facing as u32) << 28;
        w1 |= (0x0000_07FF & texture as u32) << 17;
        w1 |= (0x0000_001F & frames as u32) << 12;

        Self([w0, w1])
    }

    /// Position in 1/16 voxel units.
    #[inline]
    pub fn position(self) -> (u8, u8, u8) {
        (
            (self.0[0] >> 24) as u8,
            (self.0[0] >> 16) as u8,
            (self.0[0] >> 8) as u8,
        )
    }

    /// (width, height) in sixteenths, range 1..=16.
    #[inline]
    pub fn size(self) -> (u8, u8) {
        (((self.0[0] >> 4) & 0xF) as u8 + 1, (self.0[0] & 0xF) as u8 + 1)
    }

    #[inline]
    pub fn facing_bits(self) -> u8 {
        (self.0[1] >> 28) as u8
    }

    #[inline]
    pub fn texture(self) -> u16 {
        ((self.0[1] >> 17) & 0x7FF) as u16
    }

    #[inline]
    pub fn frames(self) -> u8 {
        ((self.0[1] >> 12) & 0x1F) as u8
    }
}
