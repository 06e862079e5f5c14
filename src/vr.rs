//! Conversions between VR runtime data types and `cgmath`.
//!
//! The structs below mirror the plain C data types of the headset runtime
//! (`ovrMatrix4f`, `ovrVector3f`, ...) field for field, so they can be filled
//! straight from the runtime's pose and field-of-view queries. Every
//! conversion is pure and stateless. The runtime stores matrices row-major,
//! `cgmath` column-major, so matrix conversions transpose.

use cgmath::{Matrix, Matrix4, Quaternion, Vector2, Vector3};

/// Default near plane for projections built from a field of view.
pub const DEFAULT_NEAR_PLANE: f32 = 0.01;
/// Default far plane for projections built from a field of view.
pub const DEFAULT_FAR_PLANE: f32 = 10000.0;

/// Row-major 4x4 matrix.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OvrMatrix4f {
    pub m: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OvrVector3f {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OvrVector2f {
    pub x: f32,
    pub y: f32,
}

/// Size of a render target in pixels.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OvrSizei {
    pub w: i32,
    pub h: i32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OvrQuatf {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for OvrQuatf {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
        }
    }
}

/// Orientation and position of a tracked device.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OvrPosef {
    pub orientation: OvrQuatf,
    pub position: OvrVector3f,
}

/// Field of view as tangents of the half angles in every direction.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OvrFovPort {
    pub up_tan: f32,
    pub down_tan: f32,
    pub left_tan: f32,
    pub right_tan: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Eye {
    Left,
    Right,
}

impl Eye {
    pub const ALL: [Eye; 2] = [Eye::Left, Eye::Right];
}

/// Run `f` once per eye, left first.
pub fn for_each_eye(mut f: impl FnMut(Eye)) {
    for eye in Eye::ALL {
        f(eye);
    }
}

impl OvrMatrix4f {
    /// Right-handed projection with OpenGL clip range (-1..1) for a field of view.
    ///
    /// The result is row-major, as the runtime returns it.
    pub fn projection(fov: &OvrFovPort, near: f32, far: f32) -> Self {
        let x_scale = 2.0 / (fov.left_tan + fov.right_tan);
        let x_offset = (fov.left_tan - fov.right_tan) * x_scale * 0.5;
        let y_scale = 2.0 / (fov.up_tan + fov.down_tan);
        let y_offset = (fov.up_tan - fov.down_tan) * y_scale * 0.5;
        // Right-handed: the camera looks down -z.
        let handedness = -1.0;

        let mut m = [[0.0; 4]; 4];
        m[0][0] = x_scale;
        m[0][2] = handedness * x_offset;
        m[1][1] = y_scale;
        m[1][2] = handedness * -y_offset;
        m[2][2] = -handedness * (far + near) / (near - far);
        m[2][3] = 2.0 * far * near / (near - far);
        m[3][2] = handedness;
        Self { m }
    }
}

impl From<OvrMatrix4f> for Matrix4<f32> {
    fn from(om: OvrMatrix4f) -> Self {
        Matrix4::from(om.m).transpose()
    }
}

impl From<Matrix4<f32>> for OvrMatrix4f {
    fn from(m: Matrix4<f32>) -> Self {
        Self {
            m: m.transpose().into(),
        }
    }
}

impl From<OvrVector3f> for Vector3<f32> {
    fn from(v: OvrVector3f) -> Self {
        Vector3::new(v.x, v.y, v.z)
    }
}

impl From<Vector3<f32>> for OvrVector3f {
    fn from(v: Vector3<f32>) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<OvrVector2f> for Vector2<f32> {
    fn from(v: OvrVector2f) -> Self {
        Vector2::new(v.x, v.y)
    }
}

impl From<Vector2<f32>> for OvrVector2f {
    fn from(v: Vector2<f32>) -> Self {
        Self { x: v.x, y: v.y }
    }
}

impl From<OvrSizei> for Vector2<u32> {
    fn from(size: OvrSizei) -> Self {
        Vector2::new(size.w as u32, size.h as u32)
    }
}

impl From<Vector2<u32>> for OvrSizei {
    fn from(v: Vector2<u32>) -> Self {
        Self {
            w: v.x as i32,
            h: v.y as i32,
        }
    }
}

impl From<OvrQuatf> for Quaternion<f32> {
    fn from(q: OvrQuatf) -> Self {
        Quaternion::new(q.w, q.x, q.y, q.z)
    }
}

impl From<Quaternion<f32>> for OvrQuatf {
    fn from(q: Quaternion<f32>) -> Self {
        Self {
            x: q.v.x,
            y: q.v.y,
            z: q.v.z,
            w: q.s,
        }
    }
}

/// Pose as a transform: translation after orientation.
impl From<OvrPosef> for Matrix4<f32> {
    fn from(pose: OvrPosef) -> Self {
        let orientation = Matrix4::from(Quaternion::from(pose.orientation));
        let translation = Matrix4::from_translation(Vector3::from(pose.position));
        translation * orientation
    }
}

/// Column-major projection for a field of view, with OpenGL clip range.
pub fn fov_to_matrix(fov: &OvrFovPort, near: f32, far: f32) -> Matrix4<f32> {
    OvrMatrix4f::projection(fov, near, far).into()
}

#[cfg(test)]
mod tests {
    use cgmath::{Deg, Rotation3, SquareMatrix, frustum};

    use super::*;

    fn assert_close(a: Matrix4<f32>, b: Matrix4<f32>) {
        let a: [[f32; 4]; 4] = a.into();
        let b: [[f32; 4]; 4] = b.into();
        for (col_a, col_b) in a.iter().zip(b.iter()) {
            for (x, y) in col_a.iter().zip(col_b.iter()) {
                assert!((x - y).abs() < 1e-4, "{:?} != {:?}", a, b);
            }
        }
    }

    #[test]
    fn matrix_conversion_transposes() {
        let mut om = OvrMatrix4f::default();
        // Row 0, column 3 holds the x translation in a row-major matrix.
        om.m[0][3] = 7.0;
        om.m[0][0] = 1.0;
        om.m[1][1] = 1.0;
        om.m[2][2] = 1.0;
        om.m[3][3] = 1.0;
        let m: Matrix4<f32> = om.into();
        assert_eq!(m, Matrix4::from_translation(Vector3::new(7.0, 0.0, 0.0)));
        assert_eq!(OvrMatrix4f::from(m), om);
    }

    #[test]
    fn vectors_and_sizes_convert_both_ways() {
        let v = OvrVector3f {
            x: 1.0,
            y: -2.0,
            z: 3.5,
        };
        assert_eq!(OvrVector3f::from(Vector3::from(v)), v);

        let uv = OvrVector2f { x: 0.25, y: 0.75 };
        assert_eq!(Vector2::from(uv), Vector2::new(0.25, 0.75));

        let size = OvrSizei { w: 1080, h: 1200 };
        let v: Vector2<u32> = size.into();
        assert_eq!(v, Vector2::new(1080, 1200));
        assert_eq!(OvrSizei::from(v), size);
    }

    #[test]
    fn quaternions_keep_component_order() {
        let q = OvrQuatf {
            x: 0.1,
            y: 0.2,
            z: 0.3,
            w: 0.9,
        };
        let cq = Quaternion::from(q);
        assert_eq!(cq.s, 0.9);
        assert_eq!(cq.v, Vector3::new(0.1, 0.2, 0.3));
        assert_eq!(OvrQuatf::from(cq), q);
    }

    #[test]
    fn pose_translates_after_rotating() {
        let rotation = Quaternion::from_angle_y(Deg(90.0));
        let pose = OvrPosef {
            orientation: rotation.into(),
            position: OvrVector3f {
                x: 0.0,
                y: 1.7,
                z: 0.0,
            },
        };
        let expected =
            Matrix4::from_translation(Vector3::new(0.0, 1.7, 0.0)) * Matrix4::from(rotation);
        assert_close(pose.into(), expected);
    }

    #[test]
    fn identity_pose_is_identity() {
        assert_close(OvrPosef::default().into(), Matrix4::identity());
    }

    #[test]
    fn symmetric_fov_matches_frustum() {
        let fov = OvrFovPort {
            up_tan: 1.0,
            down_tan: 1.0,
            left_tan: 1.0,
            right_tan: 1.0,
        };
        let (n, f) = (0.1, 100.0);
        assert_close(fov_to_matrix(&fov, n, f), frustum(-n, n, -n, n, n, f));
    }

    #[test]
    fn asymmetric_fov_matches_off_center_frustum() {
        let fov = OvrFovPort {
            up_tan: 0.8,
            down_tan: 1.2,
            left_tan: 1.0,
            right_tan: 0.5,
        };
        let (n, f) = (DEFAULT_NEAR_PLANE, DEFAULT_FAR_PLANE);
        let expected = frustum(
            -fov.left_tan * n,
            fov.right_tan * n,
            -fov.down_tan * n,
            fov.up_tan * n,
            n,
            f,
        );
        assert_close(fov_to_matrix(&fov, n, f), expected);
    }

    #[test]
    fn eyes_are_visited_left_to_right() {
        let mut eyes = Vec::new();
        for_each_eye(|eye| eyes.push(eye));
        assert_eq!(eyes, vec![Eye::Left, Eye::Right]);
    }
}
