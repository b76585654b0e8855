use criterion::{criterion_group, criterion_main, Criterion};
use obj_baker::packing::{stitch_atlas, PackingScheduler, TileId, TileTree};
use obj_baker::types::ImageBuffer;

/// Leaves with a spread of sizes, the way a scanned model's textures tend to vary.
fn make_tree(count: usize, scale: u32) -> (TileTree, Vec<TileId>) {
    let sizes = [scale, scale * 2, scale * 4, scale * 8];
    let mut tree = TileTree::new();
    let leaves = (0..count)
        .map(|i| {
            let w = sizes[i % sizes.len()];
            let h = sizes[(i / sizes.len()) % sizes.len()];
            let shade = (i * 37 % 256) as u8;
            tree.add_leaf(format!("mat_{i}"), ImageBuffer::filled(w, h, [shade, shade, shade, 255]))
        })
        .collect();
    (tree, leaves)
}

fn bench_schedule(c: &mut Criterion) {
    let (tree, leaves) = make_tree(256, 4);

    c.bench_function("schedule_256_leaves", |b| {
        b.iter(|| {
            let mut tree = tree.clone();
            PackingScheduler::new(leaves.clone()).build(&mut tree).unwrap()
        });
    });
}

fn bench_stitch(c: &mut Criterion) {
    let (mut tree, leaves) = make_tree(32, 64);
    let root = PackingScheduler::new(leaves)
        .build(&mut tree)
        .unwrap()
        .unwrap();

    c.bench_function("stitch_32_leaves", |b| {
        b.iter(|| {
            let mut tree = tree.clone();
            stitch_atlas(&mut tree, root, [0, 0, 0, 0]).unwrap()
        });
    });
}

criterion_group!(benches, bench_schedule, bench_stitch);
criterion_main!(benches);
