//! Forward-only waypoint chain consumed by enemies.
//!
//! The path is authored elsewhere and handed to the simulation fully built.
//! A [`Waypoint`] is a borrowed cursor into a [`Path`]: it exposes the
//! waypoint's world position and the waypoint that follows it, or `None` at
//! the end of the chain.

use glam::Vec2;
use thiserror::Error;

/// Reasons a path may fail to build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum PathError {
    /// A path needs at least one waypoint to spawn enemies on.
    #[error("path has no waypoints")]
    Empty,
    /// A waypoint coordinate was NaN or infinite.
    #[error("waypoint {0} has a non-finite coordinate")]
    NonFinite(usize),
}

/// Immutable ordered chain of waypoint positions.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    points: Vec<Vec2>,
}

impl Path {
    /// Builds a path visiting `points` in order.
    pub fn new(points: Vec<Vec2>) -> Result<Self, PathError> {
        if points.is_empty() {
            return Err(PathError::Empty);
        }

        if let Some(index) = points.iter().position(|point| !point.is_finite()) {
            return Err(PathError::NonFinite(index));
        }

        Ok(Self { points })
    }

    /// Waypoint enemies spawn on.
    #[must_use]
    pub fn first(&self) -> Waypoint<'_> {
        Waypoint {
            path: self,
            index: 0,
        }
    }

    /// Waypoint at `index`, if the path is long enough.
    #[must_use]
    pub fn waypoint(&self, index: usize) -> Option<Waypoint<'_>> {
        (index < self.points.len()).then_some(Waypoint { path: self, index })
    }

    /// Number of waypoints in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; paths are never empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Sum of the straight segment lengths between consecutive waypoints.
    #[must_use]
    pub fn total_length(&self) -> f32 {
        self.points
            .windows(2)
            .map(|pair| pair[0].distance(pair[1]))
            .sum()
    }

    /// Iterator over every waypoint from spawn to exit.
    pub fn iter(&self) -> impl Iterator<Item = Waypoint<'_>> {
        (0..self.points.len()).map(move |index| Waypoint { path: self, index })
    }
}

/// Cursor pointing at a single waypoint of a [`Path`].
#[derive(Clone, Copy, Debug)]
pub struct Waypoint<'p> {
    path: &'p Path,
    index: usize,
}

impl<'p> Waypoint<'p> {
    /// World position of the waypoint.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.path.points[self.index]
    }

    /// Waypoint that follows this one, or `None` at the end of the path.
    #[must_use]
    pub fn next(&self) -> Option<Waypoint<'p>> {
        self.path.waypoint(self.index + 1)
    }

    /// Zero-based position of the waypoint within its path.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn l_shaped() -> Path {
        Path::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(64.0, 0.0),
            Vec2::new(64.0, 96.0),
        ])
        .expect("valid path")
    }

    #[test]
    fn empty_paths_are_rejected() {
        assert_eq!(Path::new(Vec::new()), Err(PathError::Empty));
    }

    #[test]
    fn non_finite_points_are_rejected() {
        let result = Path::new(vec![Vec2::ZERO, Vec2::new(f32::NAN, 1.0)]);
        assert_eq!(result, Err(PathError::NonFinite(1)));
    }

    #[test]
    fn next_walks_the_chain_to_the_end() {
        let path = l_shaped();
        let visited: Vec<Vec2> = std::iter::successors(Some(path.first()), Waypoint::next)
            .map(|waypoint| waypoint.position())
            .collect();
        assert_eq!(
            visited,
            vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(64.0, 0.0),
                Vec2::new(64.0, 96.0),
            ]
        );
    }

    #[test]
    fn last_waypoint_has_no_successor() {
        let path = l_shaped();
        let last = path.waypoint(2).expect("third waypoint");
        assert!(last.next().is_none());
        assert!(path.waypoint(3).is_none());
    }

    #[test]
    fn iter_visits_every_waypoint_in_order() {
        let path = l_shaped();
        let indices: Vec<usize> = path.iter().map(|waypoint| waypoint.index()).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(path.iter().count(), path.len());
        assert!(!path.is_empty());
    }

    #[test]
    fn total_length_sums_segments() {
        assert!((l_shaped().total_length() - 160.0).abs() < f32::EPSILON);
    }
}
