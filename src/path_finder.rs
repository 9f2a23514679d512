// Shortest paths, move budgets and target lookup over a `Board`.
//
// Results are cached per query. The caches are stamped with the board's
// revision and dropped before any lookup that sees a newer revision, so a
// cached answer is never served after the board has changed.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use tracing::trace;

use crate::board::Board;
use crate::coordinates::Coordinates;
use crate::distance::manhattan_distance;
use crate::entity::{EntityId, EntityKind};

const ORTHOGONAL: [(i32, i32); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

type PathKey = (Coordinates, Coordinates, Option<u32>);

#[derive(Clone, Debug, Default)]
pub struct PathFinder {
    revision: Option<u64>,
    path_cache: HashMap<PathKey, Option<Vec<Coordinates>>>,
    moves_cache: HashMap<(Coordinates, u32), Vec<Coordinates>>,
}

impl PathFinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every cached result.
    pub fn invalidate(&mut self) {
        self.path_cache.clear();
        self.moves_cache.clear();
        self.revision = None;
    }

    pub fn cached_paths(&self) -> usize {
        self.path_cache.len()
    }

    fn sync(&mut self, board: &Board) {
        if self.revision != Some(board.revision()) {
            if !self.path_cache.is_empty() || !self.moves_cache.is_empty() {
                trace!(revision = board.revision(), "path caches invalidated");
            }
            self.path_cache.clear();
            self.moves_cache.clear();
            self.revision = Some(board.revision());
        }
    }

    /// In-bounds vacant cells within Manhattan distance `speed` of `origin`,
    /// sorted by `(x, y)`. This is a budget, not a reachability guarantee.
    pub fn get_available_moves(
        &mut self,
        board: &Board,
        origin: Coordinates,
        speed: u32,
    ) -> Vec<Coordinates> {
        self.sync(board);
        if let Some(moves) = self.moves_cache.get(&(origin, speed)) {
            return moves.clone();
        }

        let reach = speed as i32;
        let mut moves = Vec::new();
        for dx in -reach..=reach {
            let span = reach - dx.abs();
            for dy in -span..=span {
                let c = origin.offset(dx, dy);
                if board.is_valid_coordinates(c) && board.is_position_vacant(c) {
                    moves.push(c);
                }
            }
        }
        moves.sort();

        self.moves_cache.insert((origin, speed), moves.clone());
        moves
    }

    /// A* over the 4-neighbourhood with unit steps. Every occupied cell
    /// except `end` blocks. The returned path starts at `start` and ends at
    /// `end`; its step count is `len - 1`. Paths longer than `max_distance`
    /// steps count as unreachable.
    pub fn find_path(
        &mut self,
        board: &Board,
        start: Coordinates,
        end: Coordinates,
        max_distance: Option<u32>,
    ) -> Option<Vec<Coordinates>> {
        self.sync(board);
        let key = (start, end, max_distance);
        if let Some(cached) = self.path_cache.get(&key) {
            return cached.clone();
        }

        let path = a_star(board, start, end, max_distance);
        self.path_cache.insert(key, path.clone());
        path
    }

    /// Nearest reachable entity of `kind` from `start`.
    ///
    /// Candidates are ranked by Manhattan distance (placement order breaks
    /// ties) and checked with [`find_path`](Self::find_path) in that order.
    /// Creatures with no hp left are skipped.
    pub fn find_nearest_target(
        &mut self,
        board: &Board,
        start: Coordinates,
        kind: EntityKind,
        max_distance: Option<u32>,
    ) -> Option<(EntityId, Vec<Coordinates>)> {
        let mut candidates: Vec<(EntityId, Coordinates, u32)> = board
            .get_entities_by_type(kind)
            .into_iter()
            .filter(|id| board.get(*id).is_some_and(|e| e.is_alive()))
            .filter_map(|id| board.position_of(id).map(|pos| (id, pos)))
            .filter(|(_, pos)| *pos != start)
            .map(|(id, pos)| (id, pos, manhattan_distance(start, pos)))
            .filter(|(_, _, d)| max_distance.map_or(true, |max| *d <= max))
            .collect();
        candidates.sort_by_key(|(_, _, d)| *d);

        candidates
            .into_iter()
            .find_map(|(id, pos, _)| self.find_path(board, start, pos, max_distance).map(|p| (id, p)))
    }
}

fn a_star(
    board: &Board,
    start: Coordinates,
    end: Coordinates,
    max_distance: Option<u32>,
) -> Option<Vec<Coordinates>> {
    if !board.is_valid_coordinates(start) || !board.is_valid_coordinates(end) {
        return None;
    }

    // (f, insertion counter, cell); the counter keeps pops deterministic.
    let mut open: BinaryHeap<Reverse<(u32, u64, Coordinates)>> = BinaryHeap::new();
    let mut came_from: HashMap<Coordinates, Coordinates> = HashMap::new();
    let mut g_score: HashMap<Coordinates, u32> = HashMap::new();
    let mut counter = 0u64;

    g_score.insert(start, 0);
    open.push(Reverse((manhattan_distance(start, end), counter, start)));

    while let Some(Reverse((f, _, current))) = open.pop() {
        let g = g_score[&current];
        if f > g + manhattan_distance(current, end) {
            continue; // stale entry
        }

        if current == end {
            let path = reconstruct_path(&came_from, current);
            let steps = (path.len() - 1) as u32;
            return match max_distance {
                Some(max) if steps > max => None,
                _ => Some(path),
            };
        }

        if max_distance.is_some_and(|max| g >= max) {
            continue;
        }

        for (dx, dy) in ORTHOGONAL {
            let next = current.offset(dx, dy);
            if !board.is_valid_coordinates(next) {
                continue;
            }
            if next != end && !board.is_position_vacant(next) {
                continue;
            }
            let tentative = g + 1;
            if g_score.get(&next).map_or(true, |&known| tentative < known) {
                came_from.insert(next, current);
                g_score.insert(next, tentative);
                counter += 1;
                open.push(Reverse((tentative + manhattan_distance(next, end), counter, next)));
            }
        }
    }

    None
}

fn reconstruct_path(
    came_from: &HashMap<Coordinates, Coordinates>,
    mut current: Coordinates,
) -> Vec<Coordinates> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        current = prev;
        path.push(current);
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpeciesConfig;
    use crate::creature::{Creature, Species};
    use crate::entity::Entity;

    fn c(x: i32, y: i32) -> Coordinates {
        Coordinates::new(x, y)
    }

    fn herbivore() -> Entity {
        Entity::Creature(Creature::new(Species::Herbivore, 1, &SpeciesConfig::herbivore()))
    }

    #[test]
    fn open_board_path_has_manhattan_length() {
        let board = Board::new(8, 8).unwrap();
        let mut finder = PathFinder::new();
        for (a, b) in [(c(1, 1), c(8, 8)), (c(5, 2), c(2, 6)), (c(3, 3), c(3, 3))] {
            let path = finder.find_path(&board, a, b, None).expect("open board is connected");
            assert_eq!(path.len() as u32 - 1, manhattan_distance(a, b));
            assert_eq!(path.first(), Some(&a));
            assert_eq!(path.last(), Some(&b));
            for pair in path.windows(2) {
                assert_eq!(manhattan_distance(pair[0], pair[1]), 1);
            }
        }
    }

    #[test]
    fn occupied_target_cell_is_still_reachable() {
        let mut board = Board::new(4, 4).unwrap();
        board.place_entity(c(4, 4), Entity::Grass).unwrap();
        let mut finder = PathFinder::new();
        assert!(finder.find_path(&board, c(1, 1), c(4, 4), None).is_some());
    }

    #[test]
    fn enclosed_target_is_unreachable() {
        let mut board = Board::new(5, 5).unwrap();
        for p in [c(3, 2), c(2, 3), c(4, 3), c(3, 4)] {
            board.place_entity(p, Entity::Stone).unwrap();
        }
        let mut finder = PathFinder::new();
        assert!(finder.find_path(&board, c(1, 1), c(3, 3), None).is_none());
    }

    #[test]
    fn detours_around_walls_stay_optimal() {
        let mut board = Board::new(5, 5).unwrap();
        // Wall across x = 3 with a gap at y = 5.
        for y in 1..=4 {
            board.place_entity(c(3, y), Entity::Stone).unwrap();
        }
        let mut finder = PathFinder::new();
        let path = finder.find_path(&board, c(1, 1), c(5, 1), None).unwrap();
        assert_eq!(path.len() - 1, 12);
        assert!(path.contains(&c(3, 5)));
    }

    #[test]
    fn max_distance_bounds_path_steps() {
        let board = Board::new(6, 6).unwrap();
        let mut finder = PathFinder::new();
        assert!(finder.find_path(&board, c(1, 1), c(1, 5), Some(4)).is_some());
        assert!(finder.find_path(&board, c(1, 1), c(1, 5), Some(3)).is_none());
    }

    #[test]
    fn repeated_queries_return_identical_paths() {
        let board = Board::new(6, 6).unwrap();
        let mut finder = PathFinder::new();
        let first = finder.find_path(&board, c(1, 1), c(6, 6), None);
        let mut fresh = PathFinder::new();
        let second = fresh.find_path(&board, c(1, 1), c(6, 6), None);
        assert_eq!(first, second, "tie-breaking must not depend on cache state");
    }

    #[test]
    fn available_moves_form_a_diamond_of_vacant_cells() {
        let mut board = Board::new(5, 5).unwrap();
        let origin = c(3, 3);
        board.place_entity(origin, herbivore()).unwrap();
        board.place_entity(c(3, 4), Entity::Stone).unwrap();
        let mut finder = PathFinder::new();

        let moves = finder.get_available_moves(&board, origin, 2);
        // 13 cells in a radius-2 diamond, minus origin and the stone.
        assert_eq!(moves.len(), 11);
        assert!(moves.iter().all(|m| manhattan_distance(origin, *m) <= 2));
        assert!(!moves.contains(&origin));
        assert!(!moves.contains(&c(3, 4)));
        assert!(moves.contains(&c(3, 5)), "budget ignores connectivity");
    }

    #[test]
    fn caches_are_dropped_when_the_board_changes() {
        let mut board = Board::new(3, 1).unwrap();
        board.place_entity(c(1, 1), herbivore()).unwrap();
        let mut finder = PathFinder::new();
        assert!(finder.find_path(&board, c(1, 1), c(3, 1), None).is_some());
        assert_eq!(finder.cached_paths(), 1);
        assert_eq!(finder.get_available_moves(&board, c(1, 1), 1), vec![c(2, 1)]);

        board.place_entity(c(2, 1), Entity::Stone).unwrap();

        assert!(finder.get_available_moves(&board, c(1, 1), 1).is_empty());
        assert_eq!(finder.cached_paths(), 0, "old paths must not survive a board change");
        assert!(finder.find_path(&board, c(1, 1), c(3, 1), None).is_none());
        assert_eq!(finder.cached_paths(), 1);

        board.remove_entity(c(2, 1));
        assert!(finder.find_path(&board, c(1, 1), c(3, 1), None).is_some());
    }

    #[test]
    fn nearest_target_skips_unreachable_candidates() {
        let mut board = Board::new(6, 6).unwrap();
        let start = c(1, 1);
        board.place_entity(start, herbivore()).unwrap();
        // Closest grass is boxed in by stones.
        let boxed = c(3, 3);
        board.place_entity(boxed, Entity::Grass).unwrap();
        for p in [c(3, 2), c(2, 3), c(4, 3), c(3, 4)] {
            board.place_entity(p, Entity::Stone).unwrap();
        }
        let open = board.place_entity(c(6, 6), Entity::Grass).unwrap();

        let mut finder = PathFinder::new();
        let (found, path) = finder
            .find_nearest_target(&board, start, EntityKind::Grass, None)
            .expect("open grass is reachable");
        assert_eq!(found, open);
        assert_eq!(path.last(), Some(&c(6, 6)));
    }

    #[test]
    fn nearest_target_ties_follow_placement_order() {
        let mut board = Board::new(5, 5).unwrap();
        let start = c(3, 3);
        let first = board.place_entity(c(3, 5), Entity::Grass).unwrap();
        board.place_entity(c(1, 3), Entity::Grass).unwrap();

        let mut finder = PathFinder::new();
        let (found, _) = finder
            .find_nearest_target(&board, start, EntityKind::Grass, None)
            .unwrap();
        assert_eq!(found, first);
    }

    #[test]
    fn nearest_target_respects_max_distance() {
        let mut board = Board::new(8, 8).unwrap();
        board.place_entity(c(8, 8), Entity::Grass).unwrap();
        let mut finder = PathFinder::new();
        assert!(finder
            .find_nearest_target(&board, c(1, 1), EntityKind::Grass, Some(5))
            .is_none());
    }
}
