//! Benchmarks for editing operations on generated documents.
//!
//! Run with: cargo bench -p boxflow-layout

use boxflow_core::Rect;
use boxflow_layout::{
    BoxId, BoxNode, BoxTree, Engine, GridLayout, Sizing, SizingMode, StackLayout, TextStyle,
    VectorStyle,
};
use boxflow_style::Rgb;
use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

struct Generated {
    tree: BoxTree,
    page: BoxId,
    first_section: BoxId,
    first_card: BoxId,
}

/// A page of `sections` free sections, each holding a hugging list of cards
/// and a grid of tiles.
fn make_document(sections: usize) -> Generated {
    let mut tree = BoxTree::new();
    let page = tree.add_root(BoxNode::container(Rect::from_size(1440.0, 10.0)));
    let mut first_section = None;
    let mut first_card = None;
    let mut y = 0.0;

    for _ in 0..sections {
        let section = tree
            .push_child(page, BoxNode::container(Rect::new(0.0, y, 1440.0, 720.0)))
            .expect("section");
        let list = tree
            .push_child(
                section,
                BoxNode::container(Rect::new(40.0, 40.0, 640.0, 10.0))
                    .with_stack(StackLayout::vertical(12.0))
                    .with_padding(16.0)
                    .with_sizing(Sizing::new(SizingMode::Fixed, SizingMode::Hug)),
            )
            .expect("list");
        for _ in 0..6 {
            let card = tree
                .push_child(
                    list,
                    BoxNode::container(Rect::from_size(10.0, 72.0))
                        .with_sizing(Sizing::new(SizingMode::Fill, SizingMode::Fixed)),
                )
                .expect("card");
            tree.push_child(card, BoxNode::image(Rect::new(12.0, 12.0, 48.0, 48.0)))
                .expect("avatar");
            tree.push_child(
                card,
                BoxNode::text(
                    Rect::new(72.0, 24.0, 320.0, 24.0),
                    TextStyle::new(16.0, Rgb::new(90, 90, 90)),
                ),
            )
            .expect("title");
            first_card.get_or_insert(card);
        }
        let grid = tree
            .push_child(
                section,
                BoxNode::container(Rect::new(720.0, 40.0, 10.0, 10.0))
                    .with_grid(GridLayout::new(3, 16.0, 16.0))
                    .with_sizing(Sizing::HUG),
            )
            .expect("grid");
        for _ in 0..9 {
            let tile = tree
                .push_child(grid, BoxNode::container(Rect::from_size(200.0, 180.0)))
                .expect("tile");
            tree.push_child(
                tile,
                BoxNode::vector(Rect::new(16.0, 16.0, 32.0, 32.0), VectorStyle::default()),
            )
            .expect("icon");
        }
        first_section.get_or_insert(section);
        y += 760.0;
    }

    let engine = Engine::default();
    engine.settle(&mut tree, page).expect("settle");
    Generated {
        tree,
        page,
        first_section: first_section.expect("at least one section"),
        first_card: first_card.expect("at least one card"),
    }
}

fn bench_resize(c: &mut Criterion) {
    let mut group = c.benchmark_group("ops/resize");
    for sections in [1, 8, 32] {
        let doc = make_document(sections);
        group.bench_with_input(
            BenchmarkId::new("section", sections),
            &doc,
            |b, doc| {
                b.iter_batched(
                    || doc.tree.clone(),
                    |mut tree| {
                        Engine::default()
                            .resize(&mut tree, doc.first_section, Some(1200.0), Some(900.0))
                            .expect("resize");
                        black_box(tree)
                    },
                    BatchSize::SmallInput,
                )
            },
        );
        group.bench_with_input(BenchmarkId::new("card", sections), &doc, |b, doc| {
            b.iter_batched(
                || doc.tree.clone(),
                |mut tree| {
                    Engine::default()
                        .resize(&mut tree, doc.first_card, None, Some(120.0))
                        .expect("resize");
                    black_box(tree)
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_clone_delete(c: &mut Criterion) {
    let mut group = c.benchmark_group("ops/structure");
    for sections in [1, 8, 32] {
        let doc = make_document(sections);
        group.bench_with_input(BenchmarkId::new("clone_section", sections), &doc, |b, doc| {
            b.iter_batched(
                || doc.tree.clone(),
                |mut tree| {
                    let copy = Engine::default()
                        .clone_box(&mut tree, doc.first_section, doc.page, None)
                        .expect("clone");
                    black_box((tree, copy))
                },
                BatchSize::SmallInput,
            )
        });
        group.bench_with_input(BenchmarkId::new("delete_section", sections), &doc, |b, doc| {
            b.iter_batched(
                || doc.tree.clone(),
                |mut tree| {
                    Engine::default()
                        .delete(&mut tree, doc.first_section)
                        .expect("delete");
                    black_box(tree)
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_state_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("ops/state_hash");
    for sections in [1, 8, 32] {
        let doc = make_document(sections);
        group.bench_with_input(BenchmarkId::new("hash", sections), &doc, |b, doc| {
            b.iter(|| black_box(doc.tree.state_hash()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_resize, bench_clone_delete, bench_state_hash);
criterion_main!(benches);
