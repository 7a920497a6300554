use nalgebra::{Point3, Vector3};

/// Axis-aligned extent of a point cloud.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl BoundingBox {
    pub fn sides(&self) -> Vector3<f64> {
        self.max - self.min
    }

    pub fn center(&self) -> Point3<f64> {
        Point3::from((self.min.coords + self.max.coords) * 0.5)
    }

    pub fn longest_side(&self) -> f64 {
        let sides = self.sides();
        sides.x.max(sides.y).max(sides.z)
    }
}

/// Loose enclosing sphere of a point cloud.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Point3<f64>,
    pub radius: f64,
}

pub fn bounding_box(points: &[Point3<f64>]) -> Option<BoundingBox> {
    let first = points.first()?;
    let mut min = *first;
    let mut max = *first;
    for point in &points[1..] {
        min.x = min.x.min(point.x);
        min.y = min.y.min(point.y);
        min.z = min.z.min(point.z);
        max.x = max.x.max(point.x);
        max.y = max.y.max(point.y);
        max.z = max.z.max(point.z);
    }
    Some(BoundingBox { min, max })
}

/// Ritter's construction: a diameter guess from two extremal points,
/// then one growth pass over everything left outside.
pub fn bounding_sphere(points: &[Point3<f64>]) -> Option<BoundingSphere> {
    let first = points.first()?;
    let p1 = farthest_from(points, first);
    let p2 = farthest_from(points, &p1);

    let mut center = Point3::from((p1.coords + p2.coords) * 0.5);
    let mut radius = (p2 - p1).norm() * 0.5;

    for point in points {
        let distance = (point - center).norm();
        if distance > radius {
            let excess = distance - radius;
            radius += excess * 0.5;
            center += (point - center) * (excess * 0.5 / distance);
        }
    }

    Some(BoundingSphere { center, radius })
}

fn farthest_from(points: &[Point3<f64>], origin: &Point3<f64>) -> Point3<f64> {
    points.iter().fold(*origin, |best, point| {
        if (point - origin).norm_squared() > (best - origin).norm_squared() {
            *point
        } else {
            best
        }
    })
}
