use crate::math::Ray;
use glam::{Mat4, Vec3};

/// Fixed perspective camera framing the shape cluster.
///
/// It never moves at runtime; its job is producing the view-projection
/// matrix for rendering and turning pointer positions into world rays
/// for picking.
#[derive(Debug, Clone, Copy)]
pub struct SceneCamera {
    pub position: Vec3,
    pub fov_y_deg: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for SceneCamera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 25.0),
            fov_y_deg: 30.0,
            near: 1.0,
            far: 40.0,
        }
    }
}

impl SceneCamera {
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, Vec3::ZERO, Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_deg.to_radians(), aspect, self.near, self.far)
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection(aspect) * self.view()
    }

    /// World-space ray through the pixel at (`px`, `py`), origin top-left
    pub fn screen_ray(&self, px: f32, py: f32, width: f32, height: f32) -> Ray {
        let aspect = width / height.max(1.0);
        let ndc_x = 2.0 * px / width.max(1.0) - 1.0;
        let ndc_y = 1.0 - 2.0 * py / height.max(1.0);

        let tan_half = (self.fov_y_deg.to_radians() * 0.5).tan();
        let dir_camera = Vec3::new(ndc_x * tan_half * aspect, ndc_y * tan_half, -1.0);

        let camera_to_world = self.view().inverse();
        let dir = camera_to_world.transform_vector3(dir_camera).normalize();
        Ray::new(self.position, dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIDTH: f32 = 1280.0;
    const HEIGHT: f32 = 720.0;

    #[test]
    fn default_framing() {
        let camera = SceneCamera::default();
        assert_eq!(camera.position, Vec3::new(0.0, 0.0, 25.0));
        assert_eq!(camera.fov_y_deg, 30.0);
        assert_eq!(camera.near, 1.0);
        assert_eq!(camera.far, 40.0);
    }

    #[test]
    fn origin_projects_to_screen_center() {
        let camera = SceneCamera::default();
        let clip = camera.view_projection(WIDTH / HEIGHT).project_point3(Vec3::ZERO);

        assert!(clip.x.abs() < 1e-5);
        assert!(clip.y.abs() < 1e-5);
        assert!(clip.z > 0.0 && clip.z < 1.0);
    }

    #[test]
    fn far_plane_depth_is_one() {
        let camera = SceneCamera::default();
        // 40 units in front of the eye
        let point = Vec3::new(0.0, 0.0, -15.0);
        let clip = camera.view_projection(WIDTH / HEIGHT).project_point3(point);
        assert!((clip.z - 1.0).abs() < 1e-4);
    }

    #[test]
    fn center_pixel_ray_looks_down_negative_z() {
        let camera = SceneCamera::default();
        let ray = camera.screen_ray(WIDTH / 2.0, HEIGHT / 2.0, WIDTH, HEIGHT);

        assert_eq!(ray.origin, camera.position);
        assert!((ray.dir - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn edge_pixels_tilt_the_ray() {
        let camera = SceneCamera::default();

        let left = camera.screen_ray(0.0, HEIGHT / 2.0, WIDTH, HEIGHT);
        assert!(left.dir.x < 0.0);
        assert!(left.dir.y.abs() < 1e-5);

        let top = camera.screen_ray(WIDTH / 2.0, 0.0, WIDTH, HEIGHT);
        assert!(top.dir.y > 0.0);
    }

    #[test]
    fn ray_and_projection_agree() {
        let camera = SceneCamera::default();
        let world = Vec3::new(2.0, -1.5, 8.0);

        let clip = camera.view_projection(WIDTH / HEIGHT).project_point3(world);
        let px = (clip.x * 0.5 + 0.5) * WIDTH;
        let py = (0.5 - clip.y * 0.5) * HEIGHT;

        let ray = camera.screen_ray(px, py, WIDTH, HEIGHT);
        let t = (world - ray.origin).dot(ray.dir);
        let miss = (ray.at(t) - world).length();
        assert!(miss < 1e-2, "ray should pass through the projected point, off by {miss}");
    }
}
