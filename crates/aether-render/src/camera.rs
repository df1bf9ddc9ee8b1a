//! Primary-ray generation.

use aether_math::{DVec3, Ray};

/// How pixels map to directions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Projection {
    /// Rectilinear projection.
    Pinhole {
        /// Vertical field of view in degrees.
        fov_degrees: f64,
    },
    /// Equal-area hemisphere around the camera up axis. Pixels outside the
    /// inscribed disk produce invalid rays.
    Fisheye,
}

/// Camera in model units, oriented by yaw and pitch about world `+Y`.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub position: DVec3,
    /// Rotation from `+X` towards `+Z`, in degrees.
    pub yaw_degrees: f64,
    /// Elevation above the horizontal plane, in degrees.
    pub pitch_degrees: f64,
    pub projection: Projection,
}

impl Camera {
    pub fn forward(&self) -> DVec3 {
        let (sin_yaw, cos_yaw) = self.yaw_degrees.to_radians().sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch_degrees.to_radians().sin_cos();
        DVec3::new(cos_yaw * cos_pitch, sin_pitch, sin_yaw * cos_pitch)
    }

    /// Right, up and forward unit vectors.
    ///
    /// Right is derived from yaw alone, so looking straight up or down is
    /// well defined.
    pub fn basis(&self) -> (DVec3, DVec3, DVec3) {
        let forward = self.forward();
        let (sin_yaw, cos_yaw) = self.yaw_degrees.to_radians().sin_cos();
        let right = DVec3::new(-sin_yaw, 0.0, cos_yaw);
        let up = right.cross(forward).normalize();
        (right, up, forward)
    }

    /// Ray through the centre of pixel `(x, y)` of a `width` by `height`
    /// image, row 0 at the top.
    pub fn ray(&self, x: u32, y: u32, width: u32, height: u32) -> Ray {
        let (right, up, forward) = self.basis();
        match self.projection {
            Projection::Pinhole { fov_degrees } => {
                let scale = (fov_degrees.to_radians() * 0.5).tan();
                let aspect = f64::from(width) / f64::from(height.max(1));
                let u = 2.0 * (f64::from(x) + 0.5) / f64::from(width.max(1)) - 1.0;
                let px = u * aspect * scale;
                let py = (1.0 - 2.0 * (f64::from(y) + 0.5) / f64::from(height.max(1))) * scale;
                Ray::new(self.position, right * px + up * py + forward)
            }
            Projection::Fisheye => {
                let cx = disk_coordinate(x, width);
                let cy = disk_coordinate(y, height);
                let r2 = cx * cx + cy * cy;
                if r2 > 1.0 {
                    return Ray::invalid();
                }
                let theta = (1.0 - r2).acos();
                let phi = cy.atan2(cx);
                let (sin_theta, cos_theta) = theta.sin_cos();
                let (sin_phi, cos_phi) = phi.sin_cos();
                let direction = right * (sin_theta * cos_phi) + up * cos_theta
                    - forward * (sin_theta * sin_phi);
                Ray::new(self.position, direction)
            }
        }
    }
}

/// Pixel index mapped to `[-1, 1]` across the image edge to edge.
fn disk_coordinate(i: u32, n: u32) -> f64 {
    if n > 1 {
        2.0 * f64::from(i) / f64::from(n - 1) - 1.0
    } else {
        0.0
    }
}
