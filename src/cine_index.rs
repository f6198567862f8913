use crate::geometry::{GeometryError, self_slice_direction};
use crate::record::ImageRecord;

use log::debug;

/// Frames of a cine series grouped by slice location, then by trigger time.
///
/// Slices and phases are kept in the order they were first inserted. Keys
/// compare with `==`, so a frame only lands in an existing bucket if its
/// location is bit-for-bit equal (up to the sign of zero).
///
/// Lookups and inserts scan the buckets linearly, so building an index is
/// quadratic in the number of frames. That is fine for a cine series of a
/// few hundred frames, not for arbitrary large collections.
#[derive(Debug, Clone)]
pub struct CineIndex<R> {
    slices: Vec<SliceBucket<R>>,
}

/// All phases recorded at one slice location.
#[derive(Debug, Clone)]
pub struct SliceBucket<R> {
    location: f64,
    phases: Vec<(f64, R)>,
}

impl<R> Default for CineIndex<R> {
    fn default() -> Self {
        Self { slices: Vec::new() }
    }
}

impl<R> CineIndex<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `record` under (`location`, `trigger_time`).
    ///
    /// If the pair is already present the stored record is replaced in
    /// place and returned; the last insert wins.
    pub fn insert(&mut self, location: f64, trigger_time: f64, record: R) -> Option<R> {
        let bucket = match self.slices.iter().position(|b| b.location == location) {
            Some(i) => &mut self.slices[i],
            None => {
                self.slices.push(SliceBucket {
                    location,
                    phases: Vec::new(),
                });
                let last = self.slices.len() - 1;
                &mut self.slices[last]
            }
        };
        bucket.insert(trigger_time, record)
    }

    pub fn get(&self, location: f64, trigger_time: f64) -> Option<&R> {
        self.slice(location)?.get(trigger_time)
    }

    pub fn slice(&self, location: f64) -> Option<&SliceBucket<R>> {
        self.slices.iter().find(|b| b.location == location)
    }

    /// Slice buckets in insertion order.
    pub fn slices(&self) -> impl Iterator<Item = &SliceBucket<R>> {
        self.slices.iter()
    }

    pub fn sorted_slice_locations(&self) -> Vec<f64> {
        let mut locations: Vec<_> = self.slices.iter().map(|b| b.location).collect();
        locations.sort_by(f64::total_cmp);
        locations
    }

    pub fn slice_count(&self) -> usize {
        self.slices.len()
    }

    /// Number of stored frames.
    pub fn len(&self) -> usize {
        self.slices.iter().map(SliceBucket::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}

impl<R: ImageRecord> CineIndex<R> {
    /// Index decoded frames by (self slice direction, trigger time), in
    /// iteration order. Stops at the first frame whose geometry cannot be
    /// read.
    pub fn from_records(records: impl IntoIterator<Item = R>) -> Result<Self, GeometryError> {
        let mut index = Self::new();
        for record in records {
            index.insert_record(record)?;
        }
        Ok(index)
    }

    /// Insert a frame under its own slice location and trigger time.
    /// Returns the frame it replaced, if any.
    pub fn insert_record(&mut self, record: R) -> Result<Option<R>, GeometryError> {
        let location = self_slice_direction(&record)?;
        let trigger_time = record.trigger_time()?;
        let replaced = self.insert(location, trigger_time, record);
        if replaced.is_some() {
            debug!(
                "Replacing frame at slice location {location} and trigger time {trigger_time} ms"
            );
        }
        Ok(replaced)
    }
}

impl<R> SliceBucket<R> {
    pub fn location(&self) -> f64 {
        self.location
    }

    pub fn get(&self, trigger_time: f64) -> Option<&R> {
        self.phases
            .iter()
            .find(|(t, _)| *t == trigger_time)
            .map(|(_, record)| record)
    }

    /// (trigger time, frame) pairs in insertion order.
    pub fn phases(&self) -> impl Iterator<Item = (f64, &R)> {
        self.phases.iter().map(|(t, record)| (*t, record))
    }

    /// (trigger time, frame) pairs ordered by trigger time.
    pub fn sorted_phases(&self) -> Vec<(f64, &R)> {
        let mut phases: Vec<_> = self.phases().collect();
        phases.sort_by(|a, b| a.0.total_cmp(&b.0));
        phases
    }

    pub fn trigger_times(&self) -> impl Iterator<Item = f64> + '_ {
        self.phases.iter().map(|(t, _)| *t)
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    fn insert(&mut self, trigger_time: f64, record: R) -> Option<R> {
        match self.phases.iter_mut().find(|(t, _)| *t == trigger_time) {
            Some((_, slot)) => Some(std::mem::replace(slot, record)),
            None => {
                self.phases.push((trigger_time, record));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Orientation, Spacing};
    use nalgebra::Vector3;

    struct Frame {
        z: f64,
        trigger_time: Option<f64>,
    }

    impl ImageRecord for Frame {
        fn trigger_time(&self) -> Result<f64, GeometryError> {
            self.trigger_time.ok_or(GeometryError::AttributeNotFound {
                name: crate::record::TRIGGER_TIME.name,
                tag: crate::record::TRIGGER_TIME.tag,
            })
        }

        fn resp_signal(&self) -> Result<f64, GeometryError> {
            Ok(0.0)
        }

        fn orientation(&self) -> Result<Orientation, GeometryError> {
            Ok(Orientation::new(Vector3::x(), Vector3::y()))
        }

        fn position(&self) -> Result<Vector3<f64>, GeometryError> {
            Ok(Vector3::new(3.0, 4.0, self.z))
        }

        fn spacing(&self) -> Result<Spacing, GeometryError> {
            Ok(Spacing::new(1.0, 1.0, 1.0))
        }
    }

    #[test]
    fn from_records_keys_by_own_geometry() {
        let index = CineIndex::from_records([
            Frame { z: 0.0, trigger_time: Some(0.0) },
            Frame { z: 0.0, trigger_time: Some(100.0) },
            Frame { z: 8.0, trigger_time: Some(0.0) },
        ])
        .unwrap();
        assert_eq!(index.sorted_slice_locations(), vec![0.0, 8.0]);
        assert_eq!(index.get(8.0, 0.0).unwrap().z, 8.0);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn from_records_stops_at_unreadable_frame() {
        let result = CineIndex::from_records([
            Frame { z: 0.0, trigger_time: Some(0.0) },
            Frame { z: 4.0, trigger_time: None },
        ]);
        assert!(matches!(
            result,
            Err(GeometryError::AttributeNotFound { .. })
        ));
    }

    #[test]
    fn groups_by_location_then_trigger_time() {
        let mut index = CineIndex::new();
        assert!(index.insert(0.0, 0.0, "a").is_none());
        assert!(index.insert(0.0, 100.0, "b").is_none());
        assert!(index.insert(10.0, 0.0, "c").is_none());

        assert_eq!(index.slice_count(), 2);
        assert_eq!(index.len(), 3);
        assert_eq!(index.slice(0.0).unwrap().len(), 2);
        assert_eq!(index.slice(10.0).unwrap().len(), 1);
        assert_eq!(index.get(0.0, 100.0), Some(&"b"));
        assert_eq!(index.get(10.0, 100.0), None);
    }

    #[test]
    fn last_insert_wins_and_keeps_position() {
        let mut index = CineIndex::new();
        index.insert(5.0, 40.0, "first");
        index.insert(5.0, 0.0, "other");
        assert_eq!(index.insert(5.0, 40.0, "second"), Some("first"));

        let bucket = index.slice(5.0).unwrap();
        let phases: Vec<_> = bucket.phases().collect();
        assert_eq!(phases, vec![(40.0, &"second"), (0.0, &"other")]);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn keeps_insertion_order_and_sorts_on_request() {
        let mut index = CineIndex::new();
        index.insert(20.0, 300.0, 1);
        index.insert(-5.0, 0.0, 2);
        index.insert(20.0, 100.0, 3);

        let locations: Vec<_> = index.slices().map(SliceBucket::location).collect();
        assert_eq!(locations, vec![20.0, -5.0]);
        assert_eq!(index.sorted_slice_locations(), vec![-5.0, 20.0]);

        let bucket = index.slice(20.0).unwrap();
        assert_eq!(bucket.trigger_times().collect::<Vec<_>>(), vec![300.0, 100.0]);
        assert_eq!(bucket.sorted_phases(), vec![(100.0, &3), (300.0, &1)]);
    }

    #[test]
    fn signed_zero_shares_a_bucket() {
        let mut index = CineIndex::new();
        index.insert(0.0, 0.0, 'a');
        index.insert(-0.0, 10.0, 'b');
        assert_eq!(index.slice_count(), 1);
    }
}
