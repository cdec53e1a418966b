use std::ops::ControlFlow;

use avl_engine::{AvlTree, Direction};

fn main() {
    let mut tree: AvlTree<u32, String> = (1..=20).map(|k| (k, format!("job-{k}"))).collect();
    println!("height of {} nodes: {}", tree.len(), tree.height());

    // Drop every job whose id is divisible by three while walking the tree.
    let mut dropped = Vec::new();
    tree.for_each(Direction::Forward, |tree, id| {
        if tree.key(id).map_or(false, |k| k % 3 == 0) {
            tree.remove(id).unwrap();
            dropped.push(tree.release(id).unwrap().1);
        }
        ControlFlow::Continue(())
    });
    println!("dropped: {dropped:?}");
    println!("kept: {tree:?}");
}
