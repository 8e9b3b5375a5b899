//! Camera: perspective projection, 3D view and the 2D overlay view.
//!
//! Cells are not square, so every matrix that depends on the screen aspect
//! uses the width in "square units" (`width * char_aspect`).
//!
//! Fields are public; call [`Camera::update`] after editing them directly.
//! [`Camera::recalc`] and [`Camera::apply_action`] update on their own.

use glam::{Mat4, Vec2, Vec3};

use crate::types::{CameraAction, Handedness, ScaleMode};

const TURN_STEP: f32 = 0.1;
const MOVE_STEP: f32 = 0.25;
const ZOOM_STEP: f32 = 1.25;
const PITCH_LIMIT: f32 = 1.55;
const ZOOM_MIN: f32 = 0.05;
const ZOOM_MAX: f32 = 50.0;

/// Pose restored by [`CameraAction::Reset`].
#[derive(Debug, Clone, Copy, PartialEq)]
struct Pose {
    position: Vec3,
    yaw: f32,
    pitch: f32,
    position_2d: Vec2,
    zoom: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub width: u16,
    pub height: u16,
    /// Vertical field of view in radians.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    /// Cell width divided by cell height.
    pub char_aspect: f32,
    pub zoom: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub position: Vec3,
    /// Top-left corner of the visible 2D region, in design units.
    pub position_2d: Vec2,
    /// Size of the 2D design region; `None` tracks the grid size.
    pub view_size_2d: Option<Vec2>,
    pub scale_mode: ScaleMode,
    pub handedness: Handedness,

    projection: Mat4,
    view_3d: Mat4,
    view_2d: Mat4,
    home: Pose,
}

impl Camera {
    pub fn new(width: u16, height: u16) -> Self {
        let mut camera = Self {
            width,
            height,
            fov: 60f32.to_radians(),
            near: 0.1,
            far: 100.0,
            char_aspect: 0.5,
            zoom: 1.0,
            yaw: 0.0,
            pitch: 0.0,
            position: Vec3::new(0.0, 0.0, 3.0),
            position_2d: Vec2::ZERO,
            view_size_2d: None,
            scale_mode: ScaleMode::default(),
            handedness: Handedness::default(),
            projection: Mat4::IDENTITY,
            view_3d: Mat4::IDENTITY,
            view_2d: Mat4::IDENTITY,
            home: Pose {
                position: Vec3::ZERO,
                yaw: 0.0,
                pitch: 0.0,
                position_2d: Vec2::ZERO,
                zoom: 1.0,
            },
        };
        camera.save_home();
        camera.update();
        camera
    }

    /// Place the eye and record the pose as the reset target.
    pub fn with_pose(mut self, position: Vec3, yaw: f32, pitch: f32) -> Self {
        self.position = position;
        self.yaw = yaw;
        self.pitch = pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.save_home();
        self.update();
        self
    }

    pub fn with_handedness(mut self, handedness: Handedness) -> Self {
        self.handedness = handedness;
        if handedness == Handedness::Left {
            // Keep the default eye in front of the origin.
            self.position.z = -self.position.z;
            self.save_home();
        }
        self.update();
        self
    }

    /// Record the current pose as the one [`CameraAction::Reset`] returns to.
    pub fn save_home(&mut self) {
        self.home = Pose {
            position: self.position,
            yaw: self.yaw,
            pitch: self.pitch,
            position_2d: self.position_2d,
            zoom: self.zoom,
        };
    }

    /// Resize and rebuild all matrices.
    pub fn recalc(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.update();
    }

    /// Rebuild the projection and both view matrices from the fields.
    pub fn update(&mut self) {
        let aspect = self.aspect();
        let forward = self.forward();
        match self.handedness {
            Handedness::Right => {
                self.projection = Mat4::perspective_rh(self.fov, aspect, self.near, self.far);
                self.view_3d = Mat4::look_to_rh(self.position, forward, Vec3::Y);
            }
            Handedness::Left => {
                self.projection = Mat4::perspective_lh(self.fov, aspect, self.near, self.far);
                self.view_3d = Mat4::look_to_lh(self.position, forward, Vec3::Y);
            }
        }
        self.view_2d = self.build_view_2d();
    }

    /// Screen aspect in square units.
    pub fn aspect(&self) -> f32 {
        let h = self.height.max(1) as f32;
        (self.width.max(1) as f32 * self.char_aspect / h).max(f32::EPSILON)
    }

    /// Unit view direction from yaw and pitch. Yaw 0 looks down -z (right
    /// handed) or +z (left handed).
    pub fn forward(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        match self.handedness {
            Handedness::Right => Vec3::new(sy * cp, sp, -cy * cp),
            Handedness::Left => Vec3::new(sy * cp, sp, cy * cp),
        }
    }

    pub fn right(&self) -> Vec3 {
        let f = self.forward();
        let r = match self.handedness {
            Handedness::Right => f.cross(Vec3::Y),
            Handedness::Left => Vec3::Y.cross(f),
        };
        r.normalize_or_zero()
    }

    fn build_view_2d(&self) -> Mat4 {
        let grid = Vec2::new(self.width.max(1) as f32, self.height.max(1) as f32);
        let size = self.view_size_2d.unwrap_or(grid).max(Vec2::splat(f32::EPSILON));
        let screen = Vec2::new(grid.x * self.char_aspect, grid.y);

        let fit = screen / size;
        let scale = match self.scale_mode {
            ScaleMode::Fit => Vec2::splat(fit.min_element()),
            ScaleMode::Fill => Vec2::splat(fit.max_element()),
            ScaleMode::Stretch => fit,
        };
        let k = 2.0 * scale * self.zoom / screen;
        let centre = self.position_2d + size * 0.5;
        // y is flipped: design space grows downwards like the grid.
        Mat4::from_scale(Vec3::new(k.x, -k.y, 1.0)) * Mat4::from_translation(-centre.extend(0.0))
    }

    pub fn apply_action(&mut self, action: CameraAction) {
        match action {
            CameraAction::YawLeft => self.yaw -= TURN_STEP,
            CameraAction::YawRight => self.yaw += TURN_STEP,
            CameraAction::PitchUp => {
                self.pitch = (self.pitch + TURN_STEP).min(PITCH_LIMIT);
            }
            CameraAction::PitchDown => {
                self.pitch = (self.pitch - TURN_STEP).max(-PITCH_LIMIT);
            }
            CameraAction::MoveForward => self.position += self.forward() * MOVE_STEP,
            CameraAction::MoveBack => self.position -= self.forward() * MOVE_STEP,
            CameraAction::StrafeLeft => self.position -= self.right() * MOVE_STEP,
            CameraAction::StrafeRight => self.position += self.right() * MOVE_STEP,
            CameraAction::ZoomIn => self.zoom = (self.zoom * ZOOM_STEP).min(ZOOM_MAX),
            CameraAction::ZoomOut => self.zoom = (self.zoom / ZOOM_STEP).max(ZOOM_MIN),
            CameraAction::CycleScaleMode => self.scale_mode = self.scale_mode.cycle(),
            CameraAction::Reset => {
                self.position = self.home.position;
                self.yaw = self.home.yaw;
                self.pitch = self.home.pitch;
                self.position_2d = self.home.position_2d;
                self.zoom = self.home.zoom;
            }
        }
        self.update();
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn view_3d(&self) -> Mat4 {
        self.view_3d
    }

    pub fn view_2d(&self) -> Mat4 {
        self.view_2d
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::pixel_space_2d;
    use glam::Vec4;

    fn ndc(m: Mat4, p: Vec3) -> Vec3 {
        let c = m * p.extend(1.0);
        c.truncate() / c.w
    }

    #[test]
    fn stretch_at_unit_zoom_matches_pixel_space() {
        let mut cam = Camera::new(40, 20);
        cam.scale_mode = ScaleMode::Stretch;
        cam.update();
        let expected = pixel_space_2d(40, 20);
        for p in [Vec4::new(0.0, 0.0, 0.5, 1.0), Vec4::new(40.0, 20.0, 0.0, 1.0)] {
            assert!((cam.view_2d() * p).abs_diff_eq(expected * p, 1e-5));
        }
    }

    #[test]
    fn fit_keeps_design_inside_the_screen() {
        let mut cam = Camera::new(80, 24);
        cam.view_size_2d = Some(Vec2::new(10.0, 10.0));
        cam.update();
        let tl = ndc(cam.view_2d(), Vec3::ZERO);
        let br = ndc(cam.view_2d(), Vec3::new(10.0, 10.0, 0.0));
        assert!(tl.x >= -1.0 - 1e-5 && br.x <= 1.0 + 1e-5);
        assert!((tl.y - 1.0).abs() < 1e-5 && (br.y + 1.0).abs() < 1e-5);
    }

    #[test]
    fn origin_in_front_of_eye_projects_to_centre() {
        for hand in [Handedness::Right, Handedness::Left] {
            let cam = Camera::new(80, 24).with_handedness(hand);
            let clip = cam.projection() * cam.view_3d() * Vec4::new(0.0, 0.0, 0.0, 1.0);
            assert!(clip.w > 0.0);
            let p = clip.truncate() / clip.w;
            assert!(p.x.abs() < 1e-5 && p.y.abs() < 1e-5);
            assert!(p.z > 0.0 && p.z < 1.0);
        }
    }

    #[test]
    fn actions_move_and_reset() {
        let mut cam = Camera::new(80, 24);
        let start = cam.position;
        cam.apply_action(CameraAction::MoveForward);
        assert!(cam.position.z < start.z);
        cam.apply_action(CameraAction::ZoomIn);
        cam.apply_action(CameraAction::CycleScaleMode);
        assert_eq!(cam.scale_mode, ScaleMode::Fill);
        for _ in 0..100 {
            cam.apply_action(CameraAction::PitchUp);
        }
        assert!(cam.pitch <= PITCH_LIMIT);

        cam.apply_action(CameraAction::Reset);
        assert_eq!(cam.position, start);
        assert_eq!(cam.zoom, 1.0);
        assert_eq!(cam.pitch, 0.0);
    }

    #[test]
    fn recalc_tracks_grid_size() {
        let mut cam = Camera::new(10, 10);
        let before = cam.projection();
        cam.recalc(20, 10);
        assert_ne!(cam.projection(), before);
        assert_eq!(cam.aspect(), 1.0);
    }
}
