//! Interned pose values
//!
//! Positions and orientations are rounded to 4 decimals before interning, so
//! values that differ only in float noise share one index. Indices are handed
//! out in first-seen order and never change within an export run.

use glam::{Quat, Vec3};
use hashbrown::HashMap;

/// Decimal places kept for pose values
pub const POSE_DECIMALS: i32 = 4;

/// Round to `decimals` places, halves away from zero
pub fn round_decimals(value: f32, decimals: i32) -> f32 {
    let scale = 10f64.powi(decimals);
    ((value as f64 * scale).round() / scale) as f32
}

/// Fixed-point form of a pose value (value × 10^4, rounded)
fn fixed(value: f32) -> i64 {
    (value as f64 * 10f64.powi(POSE_DECIMALS)).round() as i64
}

/// A rounded pose component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolValue {
    Position([i64; 3]),
    Orientation([i64; 4]),
}

impl PoolValue {
    pub fn position(v: Vec3) -> Self {
        Self::Position(v.to_array().map(fixed))
    }

    /// Normalized, sign-canonicalized (w >= 0) orientation
    pub fn orientation(q: Quat) -> Self {
        let q = canonical_quat(q);
        Self::Orientation(q.to_array().map(fixed))
    }

    /// Rounded position as floats
    pub fn as_position(&self) -> Option<Vec3> {
        match self {
            Self::Position(p) => Some(Vec3::from_array(p.map(unfixed))),
            Self::Orientation(_) => None,
        }
    }

    /// Rounded orientation as a quaternion (not re-normalized)
    pub fn as_orientation(&self) -> Option<Quat> {
        match self {
            Self::Orientation(q) => Some(Quat::from_array(q.map(unfixed))),
            Self::Position(_) => None,
        }
    }
}

fn unfixed(value: i64) -> f32 {
    (value as f64 / 10f64.powi(POSE_DECIMALS)) as f32
}

/// Normalize and flip to the w >= 0 hemisphere so q and -q intern together
pub fn canonical_quat(q: Quat) -> Quat {
    let q = q.normalize();
    if q.w < 0.0 {
        -q
    } else {
        q
    }
}

/// Stable index of an interned value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolKey(pub u32);

/// First-seen-wins interning table
#[derive(Debug, Clone, Default)]
pub struct ValuePool {
    values: Vec<PoolValue>,
    index: HashMap<PoolValue, PoolKey>,
}

impl ValuePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `value`, adding it if unseen
    pub fn intern(&mut self, value: PoolValue) -> PoolKey {
        if let Some(&key) = self.index.get(&value) {
            return key;
        }
        let key = PoolKey(self.values.len() as u32);
        self.values.push(value);
        self.index.insert(value, key);
        key
    }

    /// Intern a (position, orientation) pair
    pub fn intern_pose(&mut self, position: Vec3, orientation: Quat) -> (PoolKey, PoolKey) {
        (
            self.intern(PoolValue::position(position)),
            self.intern(PoolValue::orientation(orientation)),
        )
    }

    pub fn get(&self, key: PoolKey) -> Option<&PoolValue> {
        self.values.get(key.0 as usize)
    }

    pub fn values(&self) -> &[PoolValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(round_decimals(0.125, 2), 0.13);
        assert_eq!(round_decimals(-0.125, 2), -0.13);
        assert_eq!(round_decimals(0.33333, 2), 0.33);
        assert_eq!(round_decimals(1.00004, 4), 1.0);
    }

    #[test]
    fn test_first_seen_wins() {
        let mut pool = ValuePool::new();
        let a = pool.intern(PoolValue::position(Vec3::X));
        let b = pool.intern(PoolValue::position(Vec3::Y));
        let again = pool.intern(PoolValue::position(Vec3::X));

        assert_eq!(a, PoolKey(0));
        assert_eq!(b, PoolKey(1));
        assert_eq!(again, a);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_float_noise_interns_together() {
        let mut pool = ValuePool::new();
        let a = pool.intern(PoolValue::position(Vec3::new(1.0, 2.0, 3.0)));
        let b = pool.intern(PoolValue::position(Vec3::new(1.00001, 1.99999, 3.0)));
        assert_eq!(a, b);
    }

    #[test]
    fn test_quaternion_sign_is_canonical() {
        let q = Quat::from_rotation_y(0.5);
        let mut pool = ValuePool::new();
        let a = pool.intern(PoolValue::orientation(q));
        let b = pool.intern(PoolValue::orientation(-q));
        assert_eq!(a, b);

        let stored = pool.get(a).and_then(PoolValue::as_orientation).unwrap();
        assert!(stored.w >= 0.0);
    }

    #[test]
    fn test_positions_and_orientations_are_distinct() {
        let mut pool = ValuePool::new();
        let (p, o) = pool.intern_pose(Vec3::ZERO, Quat::IDENTITY);
        assert_ne!(p, o);
        assert_eq!(pool.get(p).and_then(PoolValue::as_position), Some(Vec3::ZERO));
        assert_eq!(pool.get(o).and_then(PoolValue::as_orientation), Some(Quat::IDENTITY));
    }
}
