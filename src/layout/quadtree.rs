//! Point quadtree over the simulation bodies, stored as a flat arena.
//!
//! Each cell keeps the aggregates the force passes prune with: body count and
//! centroid for the many-body approximation, and the largest body radius for
//! collision queries.

use eframe::egui::{Pos2, Rect, Vec2, vec2};

/// Past this depth coincident or near-coincident bodies share a leaf.
const MAX_DEPTH: u8 = 12;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Body {
    pub(super) position: Vec2,
    pub(super) radius: f32,
}

/// What a body feels from one part of the tree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) enum Source {
    Body(usize),
    Cluster { centroid: Vec2, mass: f32 },
}

#[derive(Debug)]
struct Cell {
    region: Rect,
    /// Index of the first of four consecutive child cells, in quadrant order.
    children: Option<usize>,
    residents: Vec<usize>,
    mass: f32,
    centroid: Vec2,
    max_radius: f32,
}

impl Cell {
    fn empty(region: Rect) -> Self {
        Self {
            region,
            children: None,
            residents: Vec::new(),
            mass: 0.0,
            centroid: region.center().to_vec2(),
            max_radius: 0.0,
        }
    }
}

pub(super) struct Quadtree<'a> {
    bodies: &'a [Body],
    cells: Vec<Cell>,
}

impl<'a> Quadtree<'a> {
    /// Returns `None` when there is nothing to index or a body has a non-finite position.
    pub(super) fn build(bodies: &'a [Body]) -> Option<Self> {
        let region = square_around(bodies)?;
        let mut tree = Self {
            bodies,
            cells: vec![Cell::empty(region)],
        };
        for index in 0..bodies.len() {
            tree.insert(index);
        }
        tree.summarize();
        Some(tree)
    }

    pub(super) fn bodies(&self) -> &'a [Body] {
        self.bodies
    }

    fn insert(&mut self, index: usize) {
        let point = self.bodies[index].position;
        let mut cell = 0;
        let mut depth = 0;

        loop {
            if let Some(first) = self.cells[cell].children {
                cell = first + quadrant(self.cells[cell].region, point.to_pos2());
                depth += 1;
                continue;
            }

            let settle = depth >= MAX_DEPTH
                || self.cells[cell]
                    .residents
                    .iter()
                    .all(|&other| self.bodies[other].position == point);
            if settle {
                self.cells[cell].residents.push(index);
                return;
            }

            self.split(cell);
        }
    }

    fn split(&mut self, cell: usize) {
        let region = self.cells[cell].region;
        let first = self.cells.len();
        self.cells
            .extend((0..4).map(|slot| Cell::empty(child_region(region, slot))));

        for resident in std::mem::take(&mut self.cells[cell].residents) {
            let slot = quadrant(region, self.bodies[resident].position.to_pos2());
            self.cells[first + slot].residents.push(resident);
        }
        self.cells[cell].children = Some(first);
    }

    /// Children always live after their parent, so one reverse sweep fills every cell.
    fn summarize(&mut self) {
        for cell in (0..self.cells.len()).rev() {
            let (mass, weighted, max_radius) = match self.cells[cell].children {
                Some(first) => (first..first + 4).fold(
                    (0.0_f32, Vec2::ZERO, 0.0_f32),
                    |(mass, weighted, radius), child| {
                        let child = &self.cells[child];
                        (
                            mass + child.mass,
                            weighted + child.centroid * child.mass,
                            radius.max(child.max_radius),
                        )
                    },
                ),
                None => self.cells[cell].residents.iter().fold(
                    (0.0_f32, Vec2::ZERO, 0.0_f32),
                    |(mass, weighted, radius), &resident| {
                        let body = self.bodies[resident];
                        (mass + 1.0, weighted + body.position, radius.max(body.radius))
                    },
                ),
            };

            let target = &mut self.cells[cell];
            target.mass = mass;
            target.max_radius = max_radius;
            if mass > 0.0 {
                target.centroid = weighted / mass;
            }
        }
    }

    /// Barnes-Hut walk: distant cells narrower than `theta` times their distance are reported
    /// as a single cluster, everything else body by body.
    pub(super) fn visit_sources(&self, index: usize, theta: f32, mut visit: impl FnMut(Source)) {
        let point = self.bodies[index].position;
        let mut pending = vec![0];

        while let Some(cell) = pending.pop() {
            let cell = &self.cells[cell];
            if cell.mass <= 0.0 {
                continue;
            }

            match cell.children {
                None => cell
                    .residents
                    .iter()
                    .filter(|&&other| other != index)
                    .for_each(|&other| visit(Source::Body(other))),
                Some(first) => {
                    let distance = (point - cell.centroid).length();
                    let far = !cell.region.contains(point.to_pos2())
                        && cell.region.width() < theta * distance;
                    if far {
                        visit(Source::Cluster {
                            centroid: cell.centroid,
                            mass: cell.mass,
                        });
                    } else {
                        pending.extend(first..first + 4);
                    }
                }
            }
        }
    }

    /// Reports every body after `index` whose cell could overlap it, so each pair is seen once.
    pub(super) fn visit_overlaps(&self, index: usize, mut visit: impl FnMut(usize)) {
        let body = self.bodies[index];
        let point = body.position.to_pos2();
        let mut pending = vec![0];

        while let Some(cell) = pending.pop() {
            let cell = &self.cells[cell];
            if cell.mass <= 0.0 || !cell.region.expand(body.radius + cell.max_radius).contains(point) {
                continue;
            }

            match cell.children {
                None => cell
                    .residents
                    .iter()
                    .filter(|&&other| other > index)
                    .for_each(|&other| visit(other)),
                Some(first) => pending.extend(first..first + 4),
            }
        }
    }
}

fn square_around(bodies: &[Body]) -> Option<Rect> {
    let first = bodies.first()?.position;
    let mut bounds = Rect::from_min_max(first.to_pos2(), first.to_pos2());
    for body in bodies {
        if !body.position.is_finite() {
            return None;
        }
        bounds.extend_with(body.position.to_pos2());
    }

    let side = bounds.width().max(bounds.height()).max(1.0) + 2.0;
    Some(Rect::from_center_size(bounds.center(), vec2(side, side)))
}

fn quadrant(region: Rect, point: Pos2) -> usize {
    let center = region.center();
    usize::from(point.x >= center.x) + 2 * usize::from(point.y >= center.y)
}

fn child_region(region: Rect, slot: usize) -> Rect {
    let center = region.center();
    let x = if slot % 2 == 0 { region.min.x } else { center.x };
    let y = if slot < 2 { region.min.y } else { center.y };
    Rect::from_min_size(Pos2::new(x, y), region.size() * 0.5)
}
