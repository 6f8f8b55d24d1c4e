/* Copyright 2020 @Yuchen Wong */

use nalgebra as na;

pub type Float = f32;
pub type Int = i32;
pub type UInt = u32;

pub type Vector2f = na::Vector2<Float>;
pub type Vector3f = na::Vector3<Float>;
pub type Vector4f = na::Vector4<Float>;
pub type Matrix3f = na::Matrix3<Float>;
pub type Matrix4f = na::Matrix4<Float>;
pub type Quaternionf = na::Quaternion<Float>;
pub type UnitQuaternionf = na::UnitQuaternion<Float>;

pub const EPSILON: Float = 1e-4;
pub const PI: Float = std::f32::consts::PI;
pub const TWO_PI: Float = 2.0 * std::f32::consts::PI;
pub const HALF_PI: Float = std::f32::consts::FRAC_PI_2;
pub const DEG_TO_RAD: Float = std::f32::consts::PI / 180.0;
pub const FLOAT_MIN: Float = std::f32::MIN;
pub const FLOAT_MAX: Float = std::f32::MAX;
