//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::core::error::{HeatmapError, Result};

/// Truncated Gaussian kernel.
///
/// `sigma = distance / 3`, contributions beyond `distance` are dropped without renormalization.
#[derive(PartialEq, Clone, Copy, Debug)]
pub struct KernelParameters {
    distance_x: f64,
    distance_y: f64,
    amplitude: f32,
    inv_var_x: f32,
    inv_var_y: f32,
}

impl KernelParameters {
    pub fn new(distance_x: f64, distance_y: f64) -> Result<KernelParameters> {
        for (axis, distance) in &[("x", distance_x), ("y", distance_y)] {
            if !(*distance > 0.0) || !distance.is_finite() {
                return Err(HeatmapError::KernelConfiguration(format!(
                    "distance_{} must be > 0, got {}",
                    axis, distance
                )));
            }
        }
        let sigma_x = (distance_x / 3.0) as f32;
        let sigma_y = (distance_y / 3.0) as f32;
        let inv_var_x = 1.0 / (2.0 * sigma_x * sigma_x);
        let inv_var_y = 1.0 / (2.0 * sigma_y * sigma_y);
        if !inv_var_x.is_finite() || !inv_var_y.is_finite() {
            return Err(HeatmapError::KernelConfiguration(format!(
                "distances {} / {} underflow single precision",
                distance_x, distance_y
            )));
        }
        Ok(KernelParameters {
            distance_x,
            distance_y,
            amplitude: 1.0,
            inv_var_x,
            inv_var_y,
        })
    }

    pub fn with_amplitude(mut self, amplitude: f32) -> Result<KernelParameters> {
        if !amplitude.is_finite() {
            return Err(HeatmapError::KernelConfiguration(format!(
                "invalid amplitude {}",
                amplitude
            )));
        }
        self.amplitude = amplitude;
        Ok(self)
    }

    pub fn distance_x(&self) -> f64 {
        self.distance_x
    }
    pub fn distance_y(&self) -> f64 {
        self.distance_y
    }
    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }
    pub fn sigma_x(&self) -> f64 {
        self.distance_x / 3.0
    }
    pub fn sigma_y(&self) -> f64 {
        self.distance_y / 3.0
    }

    /// Whether an offset lies within the kernel support
    #[inline]
    pub fn in_support(&self, dx: f64, dy: f64) -> bool {
        dx.abs() <= self.distance_x && dy.abs() <= self.distance_y
    }

    /// Kernel value for an offset from the point
    #[inline]
    pub fn weight(&self, dx: f64, dy: f64) -> f32 {
        let dx = dx as f32;
        let dy = dy as f32;
        self.amplitude * (-(dx * dx) * self.inv_var_x - (dy * dy) * self.inv_var_y).exp()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sigma() {
        let kernel = KernelParameters::new(3.0, 6.0).unwrap();
        assert_eq!(kernel.sigma_x(), 1.0);
        assert_eq!(kernel.sigma_y(), 2.0);
        assert_eq!(kernel.weight(0.0, 0.0), 1.0);
        // One sigma
        assert!((kernel.weight(1.0, 0.0) - (-0.5f32).exp()).abs() < 1e-6);
        assert!((kernel.weight(0.0, 2.0) - (-0.5f32).exp()).abs() < 1e-6);
        assert!(kernel.in_support(3.0, -6.0));
        assert!(!kernel.in_support(3.01, 0.0));
    }

    #[test]
    fn test_invalid_distances() {
        for &(dx, dy) in &[(0.0, 1.0), (1.0, -2.0), (std::f64::NAN, 1.0), (1.0, std::f64::INFINITY)] {
            match KernelParameters::new(dx, dy) {
                Err(HeatmapError::KernelConfiguration(_)) => {}
                _ => panic!("({}, {}) accepted", dx, dy),
            }
        }
        assert!(KernelParameters::new(1.0, 1.0)
            .unwrap()
            .with_amplitude(std::f32::NAN)
            .is_err());
    }

    #[test]
    fn test_amplitude() {
        let kernel = KernelParameters::new(1.0, 1.0)
            .unwrap()
            .with_amplitude(2.5)
            .unwrap();
        assert_eq!(kernel.weight(0.0, 0.0), 2.5);
    }
}
