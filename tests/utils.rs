//! Shared helpers for the integration tests, mirroring the float-range
//! generator `sensor_fusion`'s integration tests use to sweep continuous
//! parameters without hand-writing a step loop each time.

#![allow(dead_code)]

pub struct FloatRangeInclusive {
    current: f64,
    end: f64,
    step: f64,
}

impl FloatRangeInclusive {
    pub fn new(start: f64, end: f64, step: f64) -> Self {
        FloatRangeInclusive { current: start, end, step }
    }
}

impl Iterator for FloatRangeInclusive {
    type Item = f64;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current > self.end {
            None
        } else {
            let value = Some(self.current);
            self.current += self.step;
            value
        }
    }
}
