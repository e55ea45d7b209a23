//! Potentiometer Passthrough
//!
//! Live sensor-to-servo control: raw readings smoothed by a moving
//! average, mapped onto the servo range, written (and logged) only when
//! the mapped angle changes.

use crate::hal::ports::{pot_to_angle, Axis, PotBank, ServoBank};
use tracing::info;

/// Moving-average window length per channel.
const WINDOW: usize = 5;

/// Rolling-window smoother for one ADC channel.
#[derive(Debug)]
struct Smoother {
    readings: [u16; WINDOW],
    index: usize,
    total: u32,
    primed: bool,
}

impl Smoother {
    fn new() -> Self {
        Self {
            readings: [0; WINDOW],
            index: 0,
            total: 0,
            primed: false,
        }
    }

    /// Seed the whole window with the first reading so startup does not
    /// ramp from zero.
    fn prime(&mut self, raw: u16) {
        self.readings = [raw; WINDOW];
        self.total = raw as u32 * WINDOW as u32;
        self.index = 0;
        self.primed = true;
    }

    /// Push a reading, return the window average.
    fn push(&mut self, raw: u16) -> u16 {
        if !self.primed {
            self.prime(raw);
            return raw;
        }
        self.total -= self.readings[self.index] as u32;
        self.readings[self.index] = raw;
        self.total += raw as u32;
        self.index = (self.index + 1) % WINDOW;
        (self.total / WINDOW as u32) as u16
    }
}

/// Smoothed pot-to-servo passthrough for both axes.
#[derive(Debug)]
pub struct Passthrough {
    smoother_y: Smoother,
    smoother_z: Smoother,
    prev_angle_y: Option<i32>,
    prev_angle_z: Option<i32>,
}

impl Passthrough {
    pub fn new() -> Self {
        Self {
            smoother_y: Smoother::new(),
            smoother_z: Smoother::new(),
            prev_angle_y: None,
            prev_angle_z: None,
        }
    }

    /// Last angle written per axis, if any.
    pub fn last_angles(&self) -> (Option<i32>, Option<i32>) {
        (self.prev_angle_y, self.prev_angle_z)
    }

    /// Read both channels, smooth, map, and write each axis only when its
    /// mapped angle differs from the previous one. Logs once per tick in
    /// which either axis changed. Returns the pose written, if any change
    /// happened.
    pub fn tick<P: PotBank, S: ServoBank>(
        &mut self,
        pots: &P,
        servos: &mut S,
    ) -> Option<(i32, i32)> {
        let avg_y = self.smoother_y.push(pots.read(Axis::Y));
        let avg_z = self.smoother_z.push(pots.read(Axis::Z));

        let angle_y = pot_to_angle(avg_y);
        let angle_z = pot_to_angle(avg_z);

        let mut changed = false;

        if self.prev_angle_y != Some(angle_y) {
            servos.write(Axis::Y, angle_y);
            self.prev_angle_y = Some(angle_y);
            changed = true;
        }

        if self.prev_angle_z != Some(angle_z) {
            servos.write(Axis::Z, angle_z);
            self.prev_angle_z = Some(angle_z);
            changed = true;
        }

        if changed {
            info!(y = angle_y, z = angle_z, "passthrough");
            Some((angle_y, angle_z))
        } else {
            None
        }
    }
}

impl Default for Passthrough {
    fn default() -> Self {
        Self::new()
    }
}
