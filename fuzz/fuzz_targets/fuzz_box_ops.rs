#![no_main]

use arbitrary::Arbitrary;
use boxflow_core::Rect;
use boxflow_layout::{
    BoxId, BoxNode, BoxOperation, BoxTree, Engine, GridLayout, Sizing, SizingMode, StackLayout,
    TextAutoResize, TextStyle, VectorStyle,
};
use boxflow_style::Rgb;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct SeedBox {
    parent: u8,
    kind: u8,
    layout: u8,
    sizing: u8,
    x: u16,
    y: u16,
    width: u16,
    height: u16,
    padding: u8,
    color: [u8; 3],
}

#[derive(Debug, Arbitrary)]
enum FuzzOp {
    Resize {
        target: u8,
        width: Option<u16>,
        height: Option<u16>,
    },
    Clone {
        source: u8,
        parent: u8,
        index: Option<u8>,
    },
    Delete {
        target: u8,
    },
    Contrast,
}

#[derive(Debug, Arbitrary)]
struct Input {
    boxes: Vec<SeedBox>,
    ops: Vec<FuzzOp>,
}

fn mode(bits: u8) -> SizingMode {
    match bits % 3 {
        0 => SizingMode::Fixed,
        1 => SizingMode::Hug,
        _ => SizingMode::Fill,
    }
}

fn seed_node(seed: &SeedBox) -> BoxNode {
    let rect = Rect::new(
        f64::from(seed.x % 2000),
        f64::from(seed.y % 2000),
        f64::from(seed.width % 1200),
        f64::from(seed.height % 1200),
    );
    let color = Rgb::new(seed.color[0], seed.color[1], seed.color[2]);
    let node = match seed.kind % 5 {
        0 | 1 => BoxNode::container(rect),
        2 => {
            let auto = match seed.layout % 3 {
                0 => TextAutoResize::None,
                1 => TextAutoResize::Height,
                _ => TextAutoResize::WidthAndHeight,
            };
            BoxNode::text(rect, TextStyle::new(f64::from(seed.padding % 40 + 8), color).auto_resize(auto))
        }
        3 => BoxNode::vector(
            rect,
            VectorStyle {
                color: Some(color),
                ..VectorStyle::default()
            },
        ),
        _ => BoxNode::image(rect),
    };
    let node = node.with_sizing(Sizing::new(mode(seed.sizing), mode(seed.sizing / 3)));
    if !node.kind.is_container() {
        return node;
    }
    let node = node.with_padding(f64::from(seed.padding % 32));
    match seed.layout % 4 {
        0 | 1 => node,
        2 => node.with_stack(StackLayout::vertical(f64::from(seed.padding % 24))),
        _ => node.with_grid(GridLayout::new(
            usize::from(seed.layout % 5),
            f64::from(seed.padding % 16),
            f64::from(seed.padding % 12),
        )),
    }
}

fn build(seeds: &[SeedBox]) -> (BoxTree, BoxId) {
    let mut tree = BoxTree::new();
    let root = tree.add_root(BoxNode::container(Rect::from_size(1440.0, 2400.0)));
    for seed in seeds.iter().take(48) {
        let containers: Vec<BoxId> = tree
            .pre_order(root)
            .into_iter()
            .filter(|&id| tree.node(id).is_some_and(|node| node.kind.is_container()))
            .collect();
        let parent = containers[usize::from(seed.parent) % containers.len()];
        let _ = tree.push_child(parent, seed_node(seed));
    }
    (tree, root)
}

fn pick(tree: &BoxTree, root: BoxId, index: u8) -> BoxId {
    let all = tree.pre_order(root);
    all[usize::from(index) % all.len()]
}

fuzz_target!(|input: Input| {
    let (mut tree, root) = build(&input.boxes);
    let mut engine = Engine::default();
    let _ = engine.settle(&mut tree, root);

    for op in input.ops.iter().take(64) {
        if !tree.contains(root) || tree.len() > 400 {
            break;
        }
        let operation = match *op {
            FuzzOp::Resize {
                target,
                width,
                height,
            } => BoxOperation::Resize {
                target: pick(&tree, root, target),
                width: width.map(f64::from),
                height: height.map(f64::from),
            },
            FuzzOp::Clone {
                source,
                parent,
                index,
            } => BoxOperation::Clone {
                source: pick(&tree, root, source),
                parent: pick(&tree, root, parent),
                index: index.map(usize::from),
            },
            FuzzOp::Delete { target } => BoxOperation::Delete {
                target: pick(&tree, root, target),
            },
            FuzzOp::Contrast => BoxOperation::RemediateContrast { root },
        };

        let before = tree.state_hash();
        match engine.apply(&mut tree, operation) {
            Ok(outcome) => assert_eq!(outcome.after_hash, tree.state_hash()),
            Err(_) => assert_eq!(before, tree.state_hash(), "rejected operation mutated the tree"),
        }
        tree.validate().expect("tree must stay structurally valid");
        for node in tree.nodes() {
            assert!(node.rect.width.is_finite() && node.rect.height.is_finite());
        }
        engine.take_changes();
    }
});
