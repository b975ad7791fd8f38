use super::{Error, Result};

/// Selects the slice indices rendered into an animation
///
/// Volumes with at most `max_frames` slices keep every slice. Longer ones are
/// strided by `total_slices / max_frames` and truncated to `max_frames`
/// entries, so the last slices may never be shown.
pub fn sample_indices(total_slices: usize, max_frames: usize) -> Result<Vec<usize>> {
    if total_slices == 0 {
        return Err(Error::InvalidArgument(
            "cannot sample frames from an empty axis".into(),
        ));
    }
    if max_frames == 0 {
        return Err(Error::InvalidArgument(
            "maximum number of frames must be positive".into(),
        ));
    }
    if total_slices <= max_frames {
        return Ok((0..total_slices).collect());
    }
    let stride = total_slices / max_frames;
    Ok((0..total_slices).step_by(stride).take(max_frames).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn keeps_short_sequences() {
        assert_eq!(sample_indices(5, 40).unwrap(), vec![0, 1, 2, 3, 4]);
        assert_eq!(sample_indices(3, 3).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn downsamples_with_even_stride() {
        assert_eq!(sample_indices(5, 3).unwrap(), vec![0, 1, 2]);
        assert_eq!(sample_indices(100, 40).unwrap().len(), 40);
        assert_eq!(sample_indices(120, 40).unwrap()[..3], [0, 3, 6]);
        // stride 2 stops at 78: the tail of the volume is dropped
        assert_eq!(sample_indices(99, 40).unwrap().last(), Some(&78));
    }

    #[test]
    fn rejects_empty_inputs() {
        assert!(matches!(sample_indices(0, 40), Err(Error::InvalidArgument(_))));
        assert!(matches!(sample_indices(10, 0), Err(Error::InvalidArgument(_))));
    }

    proptest! {
        #[test]
        fn strictly_increasing_from_zero(total in 1usize..2000, max in 1usize..200) {
            let indices = sample_indices(total, max).unwrap();
            prop_assert_eq!(indices[0], 0);
            prop_assert!(indices.len() <= max);
            prop_assert!(indices.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(indices.iter().all(|&i| i < total));
        }

        #[test]
        fn full_range_when_it_fits(total in 1usize..200, extra in 0usize..50) {
            let indices = sample_indices(total, total + extra).unwrap();
            prop_assert_eq!(indices, (0..total).collect::<Vec<_>>());
        }
    }
}
