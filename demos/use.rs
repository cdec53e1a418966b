use avl_engine::{AvlTree, Builder, Direction};

fn main() {
    let mut tree = AvlTree::new();
    tree.insert(0, "zero");
    tree.insert(1, "one");
    tree.insert(2, "two");
    tree.insert(2, "deux");
    tree.insert(3, "three");
    tree.insert(4, "four");
    tree.insert(5, "five");
    assert_eq!(tree.get(&2), Some(&"two"));

    let one = tree.find(&1).unwrap();
    tree.remove(one).unwrap();
    assert!(tree.get(&1).is_none());
    println!("removed {:?}", tree.release(one).unwrap());

    for (k, v) in &tree {
        println!("{k} => {v}");
    }

    let mut by_len = Builder::new()
        .comparator(|a: &String, b: &String| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
        .build::<String, ()>()
        .unwrap();
    for word in ["pear", "fig", "banana", "kiwi"] {
        by_len.insert(word.to_string(), ());
    }

    print!("{{ ");
    let mut cursor = by_len.cursor(Direction::Backward);
    let mut current = cursor.get(&by_len);
    while let Some(id) = current {
        print!("{}, ", by_len.key(id).unwrap());
        current = cursor.next(&by_len);
    }
    println!("}}");
}
