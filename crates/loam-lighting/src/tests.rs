use super::*;
use loam_blocks::BlockKind;
use loam_world::{ChunkCoord, ChunkDims};

fn chunk_with(dims: ChunkDims, fill: &dyn Fn(i32, i32, i32) -> BlockKind) -> Chunk {
    let mut c = Chunk::new(ChunkCoord::default(), dims);
    for y in 0..dims.sy as i32 {
        for z in 0..dims.sz as i32 {
            for x in 0..dims.sx as i32 {
                let k = fill(x, y, z);
                if k != BlockKind::Air {
                    c.set_local(x, y, z, k);
                }
            }
        }
    }
    c
}

#[test]
fn open_sky_is_fully_lit() {
    let mut c = chunk_with(ChunkDims::flat(32), &|_, y, _| {
        if y < 4 {
            BlockKind::Stone
        } else {
            BlockKind::Air
        }
    });
    let stats = light_chunk(&mut c, 15);
    assert_eq!(stats.direct, 16 * 16 * 28);
    assert_eq!(stats.seeds, 0);
    for y in 4..32 {
        assert_eq!(c.sky_light(7, y, 9), 15);
    }
    assert_eq!(c.sky_light(7, 3, 9), 0);
    assert_eq!(c.light_max(), 15);
}

#[test]
fn enclosed_air_stays_dark() {
    let mut c = chunk_with(ChunkDims::flat(16), &|x, y, z| {
        if (x, y, z) == (8, 8, 8) {
            BlockKind::Air
        } else if y <= 12 {
            BlockKind::Stone
        } else {
            BlockKind::Air
        }
    });
    light_chunk(&mut c, 15);
    assert_eq!(c.sky_light(8, 8, 8), 0);
    assert_eq!(c.sky_light(8, 13, 8), 15);
}

#[test]
fn light_spreads_under_an_overhang() {
    // Roof over x < 8 at y = 10, floor at y = 0.
    let mut c = chunk_with(ChunkDims::flat(16), &|x, y, _| {
        if y == 0 || (y == 10 && x < 8) {
            BlockKind::Stone
        } else {
            BlockKind::Air
        }
    });
    let stats = light_chunk(&mut c, 15);
    assert!(stats.seeds > 0);
    assert!(!stats.capped);
    assert_eq!(c.sky_light(8, 5, 4), 15);
    assert_eq!(c.sky_light(7, 5, 4), 14);
    assert_eq!(c.sky_light(6, 5, 4), 13);
    assert_eq!(c.sky_light(0, 5, 4), 7);
    // The roof itself is never lit.
    assert_eq!(c.sky_light(3, 10, 4), 0);
}

#[test]
fn spread_stops_at_leaf_level() {
    // A long dark tunnel along +x under a thick roof, open at x = 0.
    let mut c = chunk_with(ChunkDims::flat(16), &|x, y, z| {
        let tunnel = y == 2 && z == 8;
        let shaft = x == 0 && z == 8 && y >= 2;
        if tunnel || shaft {
            BlockKind::Air
        } else {
            BlockKind::Stone
        }
    });
    light_chunk(&mut c, 15);
    assert_eq!(c.sky_light(0, 2, 8), 15);
    for x in 1..=13 {
        assert_eq!(c.sky_light(x, 2, 8), 15 - x as u8);
    }
    // Level 2 is a leaf, so level 1 is never produced.
    assert_eq!(c.sky_light(14, 2, 8), 0);
    assert!(c.blocks().iter().all(|b| b.sky_light != 1));
}

#[test]
fn flood_fill_respects_node_cap() {
    // Sealed hall under a roof with a single shaft through it.
    let mut c = chunk_with(ChunkDims::flat(256), &|x, y, z| {
        if y == 0 || (y == 250 && (x, z) != (0, 0)) {
            BlockKind::Stone
        } else {
            BlockKind::Air
        }
    });
    let stats = light_chunk(&mut c, 15);
    assert!(stats.capped);
    assert_eq!(stats.processed, FLOOD_NODE_CAP);
    assert_eq!(c.sky_light(0, 120, 0), 15);
    assert_eq!(c.sky_light(1, 120, 0), 14);
    // Would be lit at level 5 without the cap.
    assert_eq!(c.sky_light(5, 120, 5), 0);
}

#[test]
fn scratch_is_reusable() {
    let mut scratch = SkyLightScratch::new();
    let mut a = chunk_with(ChunkDims::flat(16), &|x, y, _| {
        if y == 0 || (y == 10 && x < 8) {
            BlockKind::Stone
        } else {
            BlockKind::Air
        }
    });
    let mut b = a.clone();
    let first = compute_sky_light(&mut a, 15, &mut scratch);
    let second = compute_sky_light(&mut b, 15, &mut scratch);
    assert_eq!(first, second);
    assert_eq!(a.blocks(), b.blocks());
}

#[test]
fn recompute_after_edit_clears_stale_light() {
    let mut c = chunk_with(ChunkDims::flat(16), &|_, y, _| {
        if y < 2 {
            BlockKind::Stone
        } else {
            BlockKind::Air
        }
    });
    light_chunk(&mut c, 15);
    assert_eq!(c.sky_light(4, 2, 4), 15);
    // Cap the whole chunk at y = 12.
    for z in 0..16 {
        for x in 0..16 {
            c.set_local(x, 12, z, BlockKind::Planks);
        }
    }
    light_chunk(&mut c, 15);
    assert_eq!(c.sky_light(4, 2, 4), 0);
    assert_eq!(c.sky_light(4, 13, 4), 15);
}

#[test]
fn rescale_is_proportional_and_keeps_dark_voxels() {
    let mut c = chunk_with(ChunkDims::flat(16), &|x, y, _| {
        if y == 0 || (y == 10 && x < 8) {
            BlockKind::Stone
        } else {
            BlockKind::Air
        }
    });
    light_chunk(&mut c, 15);
    rescale_sky_light(&mut c, 8);
    assert_eq!(c.light_max(), 8);
    assert_eq!(c.sky_light(8, 5, 4), 8);
    // 14 * 8 / 15 = 7.47 -> 7
    assert_eq!(c.sky_light(7, 5, 4), 7);
    // 7 * 8 / 15 = 3.73 -> 4
    assert_eq!(c.sky_light(0, 5, 4), 4);
    assert_eq!(c.sky_light(3, 10, 4), 0);

    // Dimming to 1 keeps every lit voxel at 1.
    rescale_sky_light(&mut c, 1);
    assert_eq!(c.sky_light(0, 5, 4), 1);
    assert_eq!(c.sky_light(3, 10, 4), 0);
}

#[test]
fn dimming_to_one_and_back_restores_shading() {
    let mut c = chunk_with(ChunkDims::flat(16), &|x, y, _| {
        if y == 0 || (y == 10 && x < 8) {
            BlockKind::Stone
        } else {
            BlockKind::Air
        }
    });
    light_chunk(&mut c, 15);
    let lit: Vec<u8> = c.blocks().iter().map(|b| b.sky_light).collect();

    for level in (1..15).rev() {
        rescale_sky_light(&mut c, level);
    }
    assert_eq!(c.sky_light(0, 5, 4), 1);
    assert_eq!(c.sky_light(7, 5, 4), 1);
    for level in 2..=15 {
        rescale_sky_light(&mut c, level);
    }
    let restored: Vec<u8> = c.blocks().iter().map(|b| b.sky_light).collect();
    assert_eq!(restored, lit);
    assert_eq!(c.sky_light(0, 5, 4), 7);
}

#[test]
fn rescale_without_a_base_scales_current_values() {
    let mut c = Chunk::new(ChunkCoord::default(), ChunkDims::flat(16));
    c.blocks_mut()[0].sky_light = 15;
    c.blocks_mut()[1].sky_light = 7;
    assert_eq!(c.sky_base_max(), None);
    rescale_sky_light(&mut c, 8);
    assert_eq!(c.blocks()[0].sky_light, 8);
    assert_eq!(c.blocks()[1].sky_light, 4);
    assert_eq!(c.blocks()[2].sky_light, 0);
}

#[test]
fn zero_maximum_leaves_chunk_dark() {
    let mut c = chunk_with(ChunkDims::flat(16), &|_, _, _| BlockKind::Air);
    let stats = light_chunk(&mut c, 0);
    assert_eq!(stats, SkyLightStats::default());
    assert!(c.blocks().iter().all(|b| b.sky_light == 0));
}
