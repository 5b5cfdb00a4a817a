use glam::{Quat, Vec3, Vec4};
use modelview_assets::{AnimationClip, Channel, Interpolation, Keyframes};
use modelview_common::Transform;

/// Frames per second used to convert between frame numbers and clip time.
pub const FRAME_RATE: f32 = 60.0;

/// Playback state of one animation clip bound to the scene's nodes.
///
/// Frames are measured at [`FRAME_RATE`]. The group never leaves the range
/// `[from_frame, to_frame]`.
#[derive(Debug, Clone)]
pub struct AnimationGroup {
    clip: AnimationClip,
    from_frame: f32,
    to_frame: f32,
    current_frame: f32,
    playing: bool,
    looping: bool,
    pub speed_ratio: f32,
}

impl AnimationGroup {
    pub fn new(clip: AnimationClip) -> Self {
        let to_frame = (clip.duration() * FRAME_RATE).round();
        Self {
            clip,
            from_frame: 0.0,
            to_frame,
            current_frame: 0.0,
            playing: false,
            looping: false,
            speed_ratio: 1.0,
        }
    }

    pub fn name(&self) -> &str {
        &self.clip.name
    }

    pub fn from_frame(&self) -> f32 {
        self.from_frame
    }

    pub fn to_frame(&self) -> f32 {
        self.to_frame
    }

    pub fn current_frame(&self) -> f32 {
        self.current_frame
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn play(&mut self, looping: bool) {
        self.playing = true;
        self.looping = looping;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Jump to `frame` (clamped into range) and pose the nodes for it.
    /// Playback state is unchanged.
    pub fn go_to_frame(&mut self, frame: f32, nodes: &mut [Transform]) {
        self.current_frame = frame.clamp(self.from_frame, self.to_frame);
        self.apply(nodes);
    }

    /// Advance a playing group by `dt` seconds. A non-looping group stops at
    /// its last frame.
    pub fn advance(&mut self, dt: f32, nodes: &mut [Transform]) {
        if !self.playing {
            return;
        }
        let range = self.to_frame - self.from_frame;
        let mut frame = self.current_frame + dt * FRAME_RATE * self.speed_ratio;
        if frame > self.to_frame {
            if self.looping && range > 0.0 {
                frame = self.from_frame + (frame - self.from_frame) % range;
            } else {
                frame = self.to_frame;
                self.playing = false;
            }
        }
        self.current_frame = frame;
        self.apply(nodes);
    }

    fn apply(&self, nodes: &mut [Transform]) {
        let time = self.current_frame / FRAME_RATE;
        for channel in &self.clip.channels {
            match nodes.get_mut(channel.node) {
                Some(target) => sample_channel(channel, time, target),
                None => tracing::debug!(
                    "animation {} targets missing node {}",
                    self.clip.name,
                    channel.node
                ),
            }
        }
    }
}

/// Key index and blend factor for `time` within `times`.
fn locate(times: &[f32], time: f32) -> (usize, usize, f32, f32) {
    let last = times.len() - 1;
    if time <= times[0] {
        return (0, 0, 0.0, 0.0);
    }
    if time >= times[last] {
        return (last, last, 0.0, 0.0);
    }
    let next = times.partition_point(|&t| t <= time);
    let prev = next - 1;
    let dt = times[next] - times[prev];
    let u = if dt > 0.0 { (time - times[prev]) / dt } else { 0.0 };
    (prev, next, u, dt)
}

/// Hermite blend of (value, out-tangent) at `a` with (value, in-tangent) at `b`.
fn hermite(v0: Vec4, out0: Vec4, v1: Vec4, in1: Vec4, u: f32, dt: f32) -> Vec4 {
    let u2 = u * u;
    let u3 = u2 * u;
    v0 * (2.0 * u3 - 3.0 * u2 + 1.0)
        + out0 * dt * (u3 - 2.0 * u2 + u)
        + v1 * (-2.0 * u3 + 3.0 * u2)
        + in1 * dt * (u3 - u2)
}

fn sample_vec3(values: &[Vec3], interp: Interpolation, key: (usize, usize, f32, f32)) -> Vec3 {
    let (a, b, u, dt) = key;
    match interp {
        Interpolation::Step => values[a],
        Interpolation::Linear => values[a].lerp(values[b], u),
        Interpolation::CubicSpline => {
            if a == b {
                return values[3 * a + 1];
            }
            hermite(
                values[3 * a + 1].extend(0.0),
                values[3 * a + 2].extend(0.0),
                values[3 * b + 1].extend(0.0),
                values[3 * b].extend(0.0),
                u,
                dt,
            )
            .truncate()
        }
    }
}

fn sample_quat(values: &[Quat], interp: Interpolation, key: (usize, usize, f32, f32)) -> Quat {
    let (a, b, u, dt) = key;
    match interp {
        Interpolation::Step => values[a],
        Interpolation::Linear => values[a].slerp(values[b], u),
        Interpolation::CubicSpline => {
            if a == b {
                return values[3 * a + 1].normalize();
            }
            let v = hermite(
                Vec4::from(values[3 * a + 1]),
                Vec4::from(values[3 * a + 2]),
                Vec4::from(values[3 * b + 1]),
                Vec4::from(values[3 * b]),
                u,
                dt,
            );
            Quat::from_vec4(v).normalize()
        }
    }
}

/// Write the value of `channel` at `time` seconds into `target`.
pub fn sample_channel(channel: &Channel, time: f32, target: &mut Transform) {
    if channel.times.is_empty() {
        return;
    }
    let stride = match channel.interpolation {
        Interpolation::CubicSpline => 3,
        _ => 1,
    };
    if channel.values.len() < channel.times.len() * stride {
        tracing::debug!(
            "channel for node {} has {} values for {} keys",
            channel.node,
            channel.values.len(),
            channel.times.len()
        );
        return;
    }
    let key = locate(&channel.times, time);
    match &channel.values {
        Keyframes::Translation(v) => target.position = sample_vec3(v, channel.interpolation, key),
        Keyframes::Scale(v) => target.scale = sample_vec3(v, channel.interpolation, key),
        Keyframes::Rotation(v) => target.rotation = sample_quat(v, channel.interpolation, key),
    }
}
