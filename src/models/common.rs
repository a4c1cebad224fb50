use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

use serde::{Deserialize, Serialize};

/// 到達判定に使用する近似一致の既定閾値（px）
pub const DEFAULT_EPSILON: f64 = 1.0;

/// 2次元の位置・変位を表す構造体
///
/// 厳密な比較は `PartialEq`、到達判定のような近似比較は [`Vector2::is_near`] を使用します。
/// 両者を混同しないこと（ハッシュや順序付けには使えません）。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f64, // px
    pub y: f64, // px
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// ベクトルの長さ（原点からの距離）
    pub fn magnitude(&self) -> f64 {
        (self.x.powi(2) + self.y.powi(2)).sqrt()
    }

    /// 2点間のユークリッド距離
    pub fn distance(&self, other: &Vector2) -> f64 {
        (*self - *other).magnitude()
    }

    /// 単位ベクトルに正規化
    ///
    /// 長さが0の場合はゼロベクトルを返すので、呼び出し側で明示的に扱うこと。
    pub fn normalize(&self) -> Self {
        let mag = self.magnitude();
        if mag > 0.0 {
            *self / mag
        } else {
            Self::ZERO
        }
    }

    /// 既定閾値での近似一致（到達判定）
    pub fn is_near(&self, other: &Vector2) -> bool {
        self.is_near_within(other, DEFAULT_EPSILON)
    }

    /// 指定閾値での近似一致
    pub fn is_near_within(&self, other: &Vector2, epsilon: f64) -> bool {
        self.distance(other) < epsilon
    }
}

impl Add for Vector2 {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Vector2 {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f64> for Vector2 {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar)
    }
}

impl Div<f64> for Vector2 {
    type Output = Self;

    fn div(self, scalar: f64) -> Self::Output {
        Self::new(self.x / scalar, self.y / scalar)
    }
}

impl fmt::Display for Vector2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// アリーナ内で一意なエンティティ識別子
///
/// 弾の追尾対象や目標への到達記録はこのハンドルで保持し、毎ティック
/// アリーナを通して生存確認を行います。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:04}", self.0)
    }
}

/// 中心位置と一辺の長さで表す正方形の当たり判定
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub center: Vector2,
    pub size: u32,
}

impl Bounds {
    pub fn new(center: Vector2, size: u32) -> Self {
        Self { center, size }
    }

    /// 矩形同士が重なっているか（辺が接するだけの場合は重ならない）
    pub fn intersects(&self, other: &Bounds) -> bool {
        let reach = (self.size as f64 + other.size as f64) / 2.0;
        (self.center.x - other.center.x).abs() < reach
            && (self.center.y - other.center.y).abs() < reach
    }

    /// 点が矩形内にあるか
    pub fn contains(&self, point: Vector2) -> bool {
        let half = self.size as f64 / 2.0;
        (point.x - self.center.x).abs() <= half && (point.y - self.center.y).abs() <= half
    }
}

/// 描画用の色（RGB）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub u8, pub u8, pub u8);

impl Color {
    pub const WHITE: Color = Color(255, 255, 255);
    pub const RED: Color = Color(255, 0, 0);
    pub const DARK_RED: Color = Color(139, 0, 0);
    pub const ORANGE: Color = Color(255, 140, 0);
    pub const BLUE: Color = Color(0, 0, 255);
    pub const PURPLE: Color = Color(160, 32, 240);
    pub const GREEN: Color = Color(0, 255, 0);
    pub const CYAN: Color = Color(0, 255, 255);
    pub const YELLOW: Color = Color(255, 255, 0);
    pub const MAGENTA: Color = Color(255, 0, 255);
}

/// エンティティの種類（描画側の見た目選択に使用）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityTag {
    Enemy,
    Tower,
    Shot,
    Objective,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_arithmetic() {
        let a = Vector2::new(3.0, 4.0);
        let b = Vector2::new(1.0, 1.0);
        assert_eq!(a + b, Vector2::new(4.0, 5.0));
        assert_eq!(a - b, Vector2::new(2.0, 3.0));
        assert_eq!(a * 2.0, Vector2::new(6.0, 8.0));
        assert_eq!(a / 2.0, Vector2::new(1.5, 2.0));
        assert_eq!(a.magnitude(), 5.0);
        assert_eq!(a.distance(&Vector2::ZERO), 5.0);
    }

    #[test]
    fn test_normalize_zero_vector() {
        assert_eq!(Vector2::ZERO.normalize(), Vector2::ZERO);
        let unit = Vector2::new(0.0, -7.0).normalize();
        assert_eq!(unit, Vector2::new(0.0, -1.0));
    }

    #[test]
    fn test_is_near_is_not_strict_equality() {
        let a = Vector2::new(10.0, 10.0);
        let b = Vector2::new(10.5, 10.0);
        assert!(a.is_near(&b));
        assert_ne!(a, b);
        assert!(!a.is_near(&Vector2::new(11.0, 10.0)));
        assert!(a.is_near_within(&Vector2::new(11.0, 10.0), 1.5));
    }

    #[test]
    fn test_bounds_intersection() {
        let shot = Bounds::new(Vector2::new(0.0, 0.0), 3);
        let enemy = Bounds::new(Vector2::new(8.0, 0.0), 15);
        assert!(shot.intersects(&enemy));
        let far = Bounds::new(Vector2::new(9.0, 0.0), 15);
        assert!(!shot.intersects(&far));
        assert!(enemy.contains(Vector2::new(15.0, 7.0)));
        assert!(!enemy.contains(Vector2::new(16.0, 0.0)));
    }
}
