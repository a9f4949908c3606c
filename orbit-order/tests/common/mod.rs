#![allow(dead_code)]

use orbit_model::Positioned;

/// Minimal positioned record: `id` is a letter, `parent` a scope number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: char,
    pub parent: u8,
    pub position: u32,
}

impl Positioned for Item {
    type Id = char;
    type ParentKey = u8;

    fn id(&self) -> char {
        self.id
    }

    fn parent_key(&self) -> u8 {
        self.parent
    }

    fn position(&self) -> u32 {
        self.position
    }

    fn set_position(&mut self, position: u32) {
        self.position = position;
    }

    fn set_parent_key(&mut self, parent_key: u8) {
        self.parent = parent_key;
    }
}

/// Builds a dense scope: `scope(1, "ABC")` is `[A(0), B(1), C(2)]` under parent 1.
pub fn scope(parent: u8, ids: &str) -> Vec<Item> {
    ids.chars()
        .enumerate()
        .map(|(i, id)| Item {
            id,
            parent,
            position: i as u32,
        })
        .collect()
}

/// Ids in display (position) order.
pub fn order(items: &[Item]) -> String {
    let mut sorted: Vec<&Item> = items.iter().collect();
    sorted.sort_by_key(|i| i.position);
    sorted.iter().map(|i| i.id).collect()
}

pub fn positions(items: &[Item]) -> Vec<u32> {
    items.iter().map(|i| i.position).collect()
}
