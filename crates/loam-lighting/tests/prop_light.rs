use loam_blocks::BlockKind;
use loam_chunk::Chunk;
use loam_lighting::{FLOOD_NODE_CAP, light_chunk, rescale_sky_light};
use loam_world::{ChunkCoord, ChunkDims};
use proptest::prelude::*;

const DIMS: ChunkDims = ChunkDims::flat(24);

fn solids() -> impl Strategy<Value = Vec<bool>> {
    prop::collection::vec(prop::bool::weighted(0.35), DIMS.volume())
}

fn build(solid: &[bool]) -> Chunk {
    let mut c = Chunk::new(ChunkCoord::default(), DIMS);
    for y in 0..DIMS.sy {
        for z in 0..DIMS.sz {
            for x in 0..DIMS.sx {
                let i = c.idx(x, y, z);
                if solid[i] {
                    c.set_local(x as i32, y as i32, z as i32, BlockKind::Stone);
                }
            }
        }
    }
    c
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    // Every voxel stays within [0, max]; solids are never lit
    #[test]
    fn light_is_bounded(solid in solids(), max in 1u8..=15) {
        let mut c = build(&solid);
        let stats = light_chunk(&mut c, max);
        prop_assert!(stats.processed <= FLOOD_NODE_CAP);
        for b in c.blocks() {
            prop_assert!(b.sky_light <= max);
            if b.is_solid() {
                prop_assert_eq!(b.sky_light, 0);
            }
        }
    }

    // Air with nothing above it is lit at the maximum
    #[test]
    fn open_columns_are_max(solid in solids(), max in 1u8..=15) {
        let mut c = build(&solid);
        light_chunk(&mut c, max);
        for z in 0..DIMS.sz as i32 {
            for x in 0..DIMS.sx as i32 {
                for y in (0..DIMS.sy as i32).rev() {
                    let b = c.get_local(x, y, z);
                    if b.is_solid() {
                        break;
                    }
                    prop_assert_eq!(b.sky_light, max);
                }
            }
        }
    }

    // Air boxed in by six solids stays dark
    #[test]
    fn boxed_air_is_dark(solid in solids(), x in 1i32..15, y in 1i32..23, z in 1i32..15) {
        let mut c = build(&solid);
        c.set_local(x, y, z, BlockKind::Air);
        for (dx, dy, dz) in [(1, 0, 0), (-1, 0, 0), (0, 1, 0), (0, -1, 0), (0, 0, 1), (0, 0, -1)] {
            c.set_local(x + dx, y + dy, z + dz, BlockKind::Stone);
        }
        light_chunk(&mut c, 15);
        prop_assert_eq!(c.sky_light(x, y, z), 0);
    }

    // Rescaling keeps dark voxels dark and lit voxels within [1, new max]
    #[test]
    fn rescale_bounds(solid in solids(), new_max in 1u8..=15) {
        let mut c = build(&solid);
        light_chunk(&mut c, 15);
        let before: Vec<u8> = c.blocks().iter().map(|b| b.sky_light).collect();
        rescale_sky_light(&mut c, new_max);
        for (b, &old) in c.blocks().iter().zip(&before) {
            if old == 0 {
                prop_assert_eq!(b.sky_light, 0);
            } else {
                prop_assert!(b.sky_light >= 1 && b.sky_light <= new_max);
            }
        }
    }

    // Any detour through other maxima lands back on the lit field
    #[test]
    fn rescale_back_to_lit_max_is_exact(
        solid in solids(),
        detour in prop::collection::vec(1u8..=15, 1..6),
    ) {
        let mut c = build(&solid);
        light_chunk(&mut c, 15);
        let before: Vec<u8> = c.blocks().iter().map(|b| b.sky_light).collect();
        for level in detour {
            rescale_sky_light(&mut c, level);
        }
        rescale_sky_light(&mut c, 15);
        let after: Vec<u8> = c.blocks().iter().map(|b| b.sky_light).collect();
        prop_assert_eq!(after, before);
    }
}
