//! The repair-droid maze: a remote-control machine explored by depth-first
//! backtracking, then searched for shortest paths by breadth-first search.

use crate::geometry::Vec2;
use intcode_vm::ports::{CancelToken, QueuePort};
use intcode_vm::{InputPort, Machine, OutputPort, Word};
use std::collections::{HashMap, VecDeque};
use std::thread;

/// What the droid found when it tried to move onto a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    /// The droid did not move; the cell is a wall.
    Wall,
    /// The droid moved onto open space.
    Open,
    /// The droid moved onto the oxygen system.
    Oxygen,
}

impl Cell {
    fn from_status(status: Word) -> Self {
        match status {
            0 => Cell::Wall,
            2 => Cell::Oxygen,
            _ => Cell::Open,
        }
    }

    fn is_traversable(self) -> bool {
        matches!(self, Cell::Open | Cell::Oxygen)
    }
}

const MOVES: [(Vec2, Word); 4] = [
    (Vec2::new(0, 1), 1),
    (Vec2::new(0, -1), 2),
    (Vec2::new(-1, 0), 3),
    (Vec2::new(1, 0), 4),
];

fn opposite_command(command: Word) -> Word {
    match command {
        1 => 2,
        2 => 1,
        3 => 4,
        4 => 3,
        other => panic!("not a movement command: {other}"),
    }
}

/// The mapped-out maze: every cell the droid visited, and the oxygen
/// system's position if found.
#[derive(Debug, Clone, Default)]
pub struct Maze {
    /// Every cell the droid has visited, keyed by position.
    pub area: HashMap<Vec2, Cell>,
    /// The oxygen system's position, once discovered.
    pub oxygen: Option<Vec2>,
}

/// Drive the remote-control machine over a depth-first backtracking
/// exploration of every reachable cell.
#[must_use]
pub fn explore(image: &[Word]) -> Maze {
    let input = QueuePort::new(vec![]);
    let output = QueuePort::new(vec![]);
    let mut droid = Machine::new(image.to_vec(), input.clone(), output.clone());
    let cancel = droid.cancel_token();

    tracing::debug!("maze droid booting");
    let droid_thread = thread::spawn(move || droid.run_until_terminate());

    let mut maze = Maze::default();
    maze.area.insert(Vec2::new(0, 0), Cell::Open);
    dfs(Vec2::new(0, 0), &input, &output, &cancel, &mut maze);

    cancel.cancel();
    droid_thread.join().unwrap().unwrap();
    tracing::debug!(cells = maze.area.len(), oxygen_found = maze.oxygen.is_some(), "maze exploration complete");
    maze
}

fn dfs(pos: Vec2, input: &QueuePort, output: &QueuePort, cancel: &CancelToken, maze: &mut Maze) {
    for &(step, command) in &MOVES {
        let next = pos + step;
        if maze.area.contains_key(&next) {
            continue;
        }

        input.write(command, cancel).unwrap().unwrap();
        let status = output.read(cancel).unwrap().unwrap();
        let cell = Cell::from_status(status);
        maze.area.insert(next, cell);
        if cell == Cell::Oxygen {
            maze.oxygen = Some(next);
        }

        if cell.is_traversable() {
            dfs(next, input, output, cancel, maze);
            // Backtrack: move the droid back to `pos` before trying the next direction.
            input.write(opposite_command(command), cancel).unwrap().unwrap();
            output.read(cancel).unwrap().unwrap();
        }
    }
}

/// Breadth-first shortest-path distance from `source` to every reachable
/// cell in `area`.
#[must_use]
pub fn distances_from(area: &HashMap<Vec2, Cell>, source: Vec2) -> HashMap<Vec2, u32> {
    let mut distances = HashMap::new();
    distances.insert(source, 0);
    let mut queue = VecDeque::from([source]);

    while let Some(pos) = queue.pop_front() {
        let current = distances[&pos];
        for &(step, _) in &MOVES {
            let next = pos + step;
            if distances.contains_key(&next) {
                continue;
            }
            if !area.get(&next).is_some_and(|&cell| cell.is_traversable()) {
                continue;
            }
            distances.insert(next, current + 1);
            queue.push_back(next);
        }
    }
    distances
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distances_expand_outward_through_open_cells() {
        let mut area = HashMap::new();
        area.insert(Vec2::new(0, 0), Cell::Open);
        area.insert(Vec2::new(1, 0), Cell::Open);
        area.insert(Vec2::new(2, 0), Cell::Oxygen);

        let distances = distances_from(&area, Vec2::new(0, 0));
        assert_eq!(distances[&Vec2::new(0, 0)], 0);
        assert_eq!(distances[&Vec2::new(1, 0)], 1);
        assert_eq!(distances[&Vec2::new(2, 0)], 2);
    }

    #[test]
    fn walls_block_the_search() {
        let mut area = HashMap::new();
        area.insert(Vec2::new(0, 0), Cell::Open);
        area.insert(Vec2::new(1, 0), Cell::Wall);

        let distances = distances_from(&area, Vec2::new(0, 0));
        assert!(!distances.contains_key(&Vec2::new(1, 0)));
    }

    #[test]
    fn explore_reports_a_fully_walled_origin() {
        // Droid program: read a command, always reply "wall" (0), loop.
        let image = vec![3, 0, 104, 0, 1105, 1, 0];
        let maze = explore(&image);
        assert_eq!(maze.oxygen, None);
        assert_eq!(maze.area[&Vec2::new(0, 1)], Cell::Wall);
        assert_eq!(maze.area[&Vec2::new(0, -1)], Cell::Wall);
        assert_eq!(maze.area[&Vec2::new(-1, 0)], Cell::Wall);
        assert_eq!(maze.area[&Vec2::new(1, 0)], Cell::Wall);
        assert_eq!(distances_from(&maze.area, Vec2::new(0, 0)).len(), 1);
    }
}
