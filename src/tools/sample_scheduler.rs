use crate::config::GridShape;
use crate::error::SheetError;

/// 均勻分布的取樣時間點，第一個固定為 0
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSchedule {
    instants: Vec<f64>,
    interval: f64,
    duration: f64,
}

impl SampleSchedule {
    #[must_use]
    pub fn instants(&self) -> &[f64] {
        &self.instants
    }

    #[must_use]
    pub const fn interval(&self) -> f64 {
        self.interval
    }

    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.instants.len()
    }

    /// 固定頻率擷取時的每秒畫格數；長度為 0 時無法換算，回傳 `None`
    #[must_use]
    pub fn sampling_rate(&self) -> Option<f64> {
        sampling_rate(self.duration, self.instants.len())
    }
}

/// 依影片長度與網格配置計算取樣時間點
///
/// `schedule[i] = i * duration / tile_count`，長度為 0 時全部為 0。
pub fn schedule(duration: f64, shape: GridShape) -> Result<SampleSchedule, SheetError> {
    if !duration.is_finite() || duration < 0.0 {
        return Err(SheetError::InvalidDuration(duration));
    }

    let tile_count = shape.tile_count();
    if tile_count == 0 {
        return Err(SheetError::InvalidShape {
            rows: i64::from(shape.rows()),
            columns: i64::from(shape.columns()),
        });
    }

    let interval = duration / tile_count as f64;
    let instants = (0..tile_count).map(|i| i as f64 * interval).collect();

    Ok(SampleSchedule {
        instants,
        interval,
        duration,
    })
}

#[must_use]
pub fn sampling_rate(duration: f64, tile_count: usize) -> Option<f64> {
    (duration > 0.0 && duration.is_finite() && tile_count > 0)
        .then(|| tile_count as f64 / duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(rows: i64, columns: i64) -> GridShape {
        GridShape::new(rows, columns).unwrap()
    }

    #[test]
    fn test_schedule_even_spacing() {
        let result = schedule(160.0, shape(4, 4)).unwrap();
        assert_eq!(result.tile_count(), 16);
        assert!(result.instants()[0].abs() < f64::EPSILON);
        assert!((result.interval() - 10.0).abs() < 1e-9);
        for pair in result.instants().windows(2) {
            assert!((pair[1] - pair[0] - 10.0).abs() < 1e-9);
        }
        assert!(*result.instants().last().unwrap() < 160.0);
    }

    #[test]
    fn test_schedule_properties_across_inputs() {
        for duration in [0.0, 0.5, 1.0, 59.94, 3600.0, 12_345.678] {
            for (rows, columns) in [(1, 1), (1, 7), (3, 2), (6, 9)] {
                let s = shape(rows, columns);
                let result = schedule(duration, s).unwrap();
                assert_eq!(result.tile_count(), s.tile_count());
                assert!(result.instants()[0].abs() < f64::EPSILON);
                let step = duration / s.tile_count() as f64;
                for pair in result.instants().windows(2) {
                    assert!(pair[1] >= pair[0]);
                    assert!((pair[1] - pair[0] - step).abs() < 1e-6);
                }
                if duration > 0.0 {
                    assert!(result.instants().iter().all(|t| *t < duration));
                }
            }
        }
    }

    #[test]
    fn test_schedule_zero_duration() {
        let result = schedule(0.0, shape(2, 3)).unwrap();
        assert_eq!(result.instants(), &[0.0; 6]);
        assert!(result.sampling_rate().is_none());
    }

    #[test]
    fn test_schedule_rejects_invalid_duration() {
        assert!(matches!(
            schedule(-1.0, shape(1, 1)),
            Err(SheetError::InvalidDuration(_))
        ));
        assert!(schedule(f64::NAN, shape(1, 1)).is_err());
    }

    #[test]
    fn test_sampling_rate() {
        let result = schedule(32.0, shape(4, 4)).unwrap();
        assert!((result.sampling_rate().unwrap() - 0.5).abs() < 1e-9);
        assert!(sampling_rate(10.0, 0).is_none());
    }
}
